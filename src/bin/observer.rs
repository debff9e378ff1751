use patterns::prelude::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::process::ExitCode;
use std::rc::{Rc, Weak};

// =============================================================================
// Roles: Observer and Subject
// =============================================================================

/// Receives notifications from a [`Subject`]. Failures are reported to the
/// subject, which logs them and carries on with the remaining observers.
trait Observer {
    fn name(&self) -> String;
    fn update(&self, message: &str) -> Result<()>;
}

fn same_observer(a: &Rc<dyn Observer>, b: &Rc<dyn Observer>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// Subscriber list holding weak references, so an observer's lifetime is
/// decided by whoever created it and never by the subject.
struct Subject {
    observers: RefCell<Vec<Weak<dyn Observer>>>,
    out: Narrator,
}

impl Subject {
    fn new(out: &Narrator) -> Self {
        Self {
            observers: RefCell::new(Vec::new()),
            out: out.clone(),
        }
    }

    fn attach(&self, observer: &Rc<dyn Observer>) {
        self.observers.borrow_mut().push(Rc::downgrade(observer));
        narrate!(self.out, "Observer {} attached", observer.name());
    }

    /// Removes every entry for `observer`; detaching an unknown observer is fine.
    fn detach(&self, observer: &Rc<dyn Observer>) {
        self.observers.borrow_mut().retain(|weak| match weak.upgrade() {
            Some(live) => !same_observer(&live, observer),
            None => false,
        });
        narrate!(self.out, "Observer {} detached", observer.name());
    }

    fn notify(&self, message: &str) {
        self.prune();
        // Snapshot first: attach/detach from inside an update only affects
        // later notifications.
        let snapshot: Vec<Weak<dyn Observer>> = self.observers.borrow().clone();
        narrate!(self.out, "Notifying {} observers...", snapshot.len());

        for weak in &snapshot {
            let Some(observer) = weak.upgrade() else {
                continue;
            };
            if let Err(err) = observer.update(message) {
                tracing::warn!(observer = %observer.name(), %err, "observer update failed");
                narrate!(self.out, "⚠️ {} failed to process update: {err}", observer.name());
            }
        }

        self.prune();
    }

    fn prune(&self) {
        self.observers
            .borrow_mut()
            .retain(|weak| weak.strong_count() > 0);
    }

    fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }
}

// =============================================================================
// Concrete observers
// =============================================================================

/// Keeps every message it received, for assertions and the inbox display.
#[derive(Default)]
struct Inbox {
    received: RefCell<Vec<String>>,
}

impl Inbox {
    fn push(&self, message: &str) {
        self.received.borrow_mut().push(message.to_string());
    }

    fn messages(&self) -> Vec<String> {
        self.received.borrow().clone()
    }
}

enum Channel {
    Email(String),
    Sms(String),
    Push(String),
}

struct Notifier {
    channel: Channel,
    inbox: Inbox,
    out: Narrator,
}

impl Notifier {
    fn email(address: &str, out: &Narrator) -> Rc<Self> {
        Self::with_channel(Channel::Email(address.to_string()), out)
    }

    fn sms(phone: &str, out: &Narrator) -> Rc<Self> {
        Self::with_channel(Channel::Sms(phone.to_string()), out)
    }

    fn push(device: &str, out: &Narrator) -> Rc<Self> {
        Self::with_channel(Channel::Push(device.to_string()), out)
    }

    fn with_channel(channel: Channel, out: &Narrator) -> Rc<Self> {
        Rc::new(Self {
            channel,
            inbox: Inbox::default(),
            out: out.clone(),
        })
    }
}

impl Observer for Notifier {
    fn name(&self) -> String {
        match &self.channel {
            Channel::Email(address) => format!("EmailNotifier({address})"),
            Channel::Sms(phone) => format!("SMSNotifier({phone})"),
            Channel::Push(device) => format!("PushNotifier({device})"),
        }
    }

    fn update(&self, message: &str) -> Result<()> {
        self.inbox.push(message);
        match &self.channel {
            Channel::Email(address) => narrate!(self.out, "📧 Email to {address}: {message}"),
            Channel::Sms(phone) => narrate!(self.out, "📱 SMS to {phone}: {message}"),
            Channel::Push(device) => narrate!(self.out, "🔔 Push to {device}: {message}"),
        }
        Ok(())
    }
}

/// A pager whose gateway is down; every update fails.
struct OfflinePager {
    number: String,
}

impl Observer for OfflinePager {
    fn name(&self) -> String {
        format!("Pager({})", self.number)
    }

    fn update(&self, _message: &str) -> Result<()> {
        Err(PatternError::precondition("pager gateway unreachable"))
    }
}

// =============================================================================
// Coordinator: the news agency
// =============================================================================

struct NewsAgency {
    subject: Subject,
    latest: RefCell<Option<String>>,
    out: Narrator,
}

impl NewsAgency {
    fn new(out: &Narrator) -> Self {
        Self {
            subject: Subject::new(out),
            latest: RefCell::new(None),
            out: out.clone(),
        }
    }

    fn attach(&self, observer: &Rc<dyn Observer>) {
        self.subject.attach(observer);
    }

    fn detach(&self, observer: &Rc<dyn Observer>) {
        self.subject.detach(observer);
    }

    fn publish(&self, news: &str) {
        *self.latest.borrow_mut() = Some(news.to_string());
        self.out.blank();
        narrate!(self.out, "📰 Breaking News: {news}");
        self.subject.notify(&format!("Breaking News: {news}"));
    }

    fn latest(&self) -> Option<String> {
        self.latest.borrow().clone()
    }

    fn observer_count(&self) -> usize {
        self.subject.observer_count()
    }
}

// =============================================================================
// Typed events: stock market
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct StockQuote {
    symbol: String,
    price: f64,
    change: f64,
    percent_change: f64,
}

impl StockQuote {
    fn describe(&self) -> String {
        let sign = if self.change >= 0.0 { "+" } else { "" };
        format!(
            "{}: ${:.2} ({sign}{:.2}, {sign}{:.2}%)",
            self.symbol, self.price, self.change, self.percent_change
        )
    }
}

trait StockObserver {
    fn name(&self) -> String;
    fn on_price_update(&self, quote: &StockQuote);
    fn on_volume_alert(&self, symbol: &str, volume: u64);
}

struct StockMarket {
    observers: RefCell<Vec<Weak<dyn StockObserver>>>,
    quotes: RefCell<HashMap<String, StockQuote>>,
    out: Narrator,
}

impl StockMarket {
    fn new(out: &Narrator) -> Self {
        Self {
            observers: RefCell::new(Vec::new()),
            quotes: RefCell::new(HashMap::new()),
            out: out.clone(),
        }
    }

    fn subscribe(&self, observer: &Rc<dyn StockObserver>) {
        self.observers.borrow_mut().push(Rc::downgrade(observer));
        narrate!(self.out, "Stock observer {} subscribed", observer.name());
    }

    fn update_price(&self, symbol: &str, price: f64) {
        let quote = {
            let mut quotes = self.quotes.borrow_mut();
            let previous = quotes.get(symbol).map(|q| q.price).unwrap_or(0.0);
            let change = price - previous;
            let percent_change = if previous != 0.0 {
                change / previous * 100.0
            } else {
                0.0
            };
            let quote = StockQuote {
                symbol: symbol.to_string(),
                price,
                change,
                percent_change,
            };
            quotes.insert(symbol.to_string(), quote.clone());
            quote
        };
        self.each_observer(|observer| observer.on_price_update(&quote));
    }

    fn alert_volume(&self, symbol: &str, volume: u64) {
        self.each_observer(|observer| observer.on_volume_alert(symbol, volume));
    }

    fn each_observer(&self, mut deliver: impl FnMut(&dyn StockObserver)) {
        let snapshot: Vec<Weak<dyn StockObserver>> = self.observers.borrow().clone();
        for observer in snapshot.iter().filter_map(Weak::upgrade) {
            deliver(observer.as_ref());
        }
        self.observers
            .borrow_mut()
            .retain(|weak| weak.strong_count() > 0);
    }
}

struct Portfolio {
    name: String,
    holdings: HashMap<String, u32>,
    out: Narrator,
}

impl Portfolio {
    fn new(name: &str, holdings: &[(&str, u32)], out: &Narrator) -> Self {
        Self {
            name: name.to_string(),
            holdings: holdings
                .iter()
                .map(|(symbol, qty)| (symbol.to_string(), *qty))
                .collect(),
            out: out.clone(),
        }
    }
}

impl StockObserver for Portfolio {
    fn name(&self) -> String {
        format!("Portfolio({})", self.name)
    }

    fn on_price_update(&self, quote: &StockQuote) {
        if let Some(quantity) = self.holdings.get(&quote.symbol) {
            let value = f64::from(*quantity) * quote.price;
            narrate!(
                self.out,
                "💼 Portfolio {}: {} ({quantity} shares) = ${value:.2} [{}]",
                self.name,
                quote.symbol,
                quote.describe()
            );
        }
    }

    fn on_volume_alert(&self, symbol: &str, volume: u64) {
        if self.holdings.contains_key(symbol) {
            narrate!(
                self.out,
                "🔊 Portfolio {}: High volume alert for {symbol} - {volume} shares traded",
                self.name
            );
        }
    }
}

struct TradingBot {
    strategy: String,
    buy_threshold: f64,
    sell_threshold: f64,
    signals: RefCell<Vec<String>>,
    out: Narrator,
}

impl TradingBot {
    fn new(strategy: &str, buy_threshold: f64, sell_threshold: f64, out: &Narrator) -> Self {
        Self {
            strategy: strategy.to_string(),
            buy_threshold,
            sell_threshold,
            signals: RefCell::new(Vec::new()),
            out: out.clone(),
        }
    }
}

impl StockObserver for TradingBot {
    fn name(&self) -> String {
        format!("TradingBot({})", self.strategy)
    }

    fn on_price_update(&self, quote: &StockQuote) {
        let signal = if quote.percent_change <= self.buy_threshold {
            "BUY"
        } else if quote.percent_change >= self.sell_threshold {
            "SELL"
        } else {
            return;
        };
        self.signals
            .borrow_mut()
            .push(format!("{signal} {}", quote.symbol));
        narrate!(
            self.out,
            "🤖 TradingBot ({}): {signal} signal for {} at ${:.2}",
            self.strategy,
            quote.symbol,
            quote.price
        );
    }

    fn on_volume_alert(&self, symbol: &str, volume: u64) {
        narrate!(
            self.out,
            "🤖 TradingBot ({}): Analyzing volume spike for {symbol} - {volume} shares",
            self.strategy
        );
    }
}

// =============================================================================
// Closure subscribers: game session events
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum GameEvent {
    PlayerJoined(String),
    PlayerLeft(String),
    GameStarted,
    GameEnded,
    ScoreChanged { player: String, score: u32 },
}

impl GameEvent {
    fn describe(&self) -> String {
        match self {
            GameEvent::PlayerJoined(player) => format!("PLAYER_JOINED - Player: {player}"),
            GameEvent::PlayerLeft(player) => format!("PLAYER_LEFT - Player: {player}"),
            GameEvent::GameStarted => "GAME_STARTED".to_string(),
            GameEvent::GameEnded => "GAME_ENDED".to_string(),
            GameEvent::ScoreChanged { player, score } => {
                format!("SCORE_CHANGED - Player: {player} - Value: {score}")
            }
        }
    }
}

/// Publisher whose subscribers are plain closures it owns.
struct EventPublisher<E> {
    callbacks: Vec<Box<dyn Fn(&E)>>,
}

impl<E> EventPublisher<E> {
    fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    fn subscribe(&mut self, callback: impl Fn(&E) + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    fn publish(&self, event: &E) {
        for callback in &self.callbacks {
            callback(event);
        }
    }

    fn subscriber_count(&self) -> usize {
        self.callbacks.len()
    }
}

struct GameSession {
    events: EventPublisher<GameEvent>,
    scores: HashMap<String, u32>,
    active: bool,
}

impl GameSession {
    fn new() -> Self {
        Self {
            events: EventPublisher::new(),
            scores: HashMap::new(),
            active: false,
        }
    }

    fn subscribe(&mut self, callback: impl Fn(&GameEvent) + 'static) {
        self.events.subscribe(callback);
    }

    fn join(&mut self, player: &str) {
        self.scores.insert(player.to_string(), 0);
        self.events.publish(&GameEvent::PlayerJoined(player.to_string()));
    }

    fn leave(&mut self, player: &str) {
        self.scores.remove(player);
        self.events.publish(&GameEvent::PlayerLeft(player.to_string()));
    }

    fn start(&mut self) {
        self.active = true;
        self.events.publish(&GameEvent::GameStarted);
    }

    fn end(&mut self) {
        self.active = false;
        self.events.publish(&GameEvent::GameEnded);
    }

    /// Ignored unless the game is running and the player has joined.
    fn update_score(&mut self, player: &str, score: u32) -> bool {
        if !self.active {
            return false;
        }
        match self.scores.get_mut(player) {
            Some(current) => {
                *current = score;
                self.events.publish(&GameEvent::ScoreChanged {
                    player: player.to_string(),
                    score,
                });
                true
            }
            None => false,
        }
    }
}

// =============================================================================
// Demo (cargo run --bin observer)
// =============================================================================

fn news_agency_demo(out: &Narrator) {
    out.section(1, "Traditional Observer Pattern - News Agency");

    let agency = NewsAgency::new(out);
    let email: Rc<dyn Observer> = Notifier::email("user@example.com", out);
    let sms: Rc<dyn Observer> = Notifier::sms("+1-555-0123", out);
    let push: Rc<dyn Observer> = Notifier::push("device_12345", out);
    let pager: Rc<dyn Observer> = Rc::new(OfflinePager {
        number: "555-0199".to_string(),
    });

    agency.attach(&email);
    agency.attach(&sms);
    agency.attach(&push);
    agency.attach(&pager);

    agency.publish("Major earthquake hits California");
    agency.publish("New COVID variant discovered");

    out.blank();
    out.say("Detaching SMS notifier and pager...");
    agency.detach(&sms);
    agency.detach(&pager);
    agency.publish("Stock market reaches all-time high");

    if let Some(latest) = agency.latest() {
        narrate!(out, "Latest headline on record: {latest}");
    }
}

fn stock_market_demo(out: &Narrator) {
    out.section(2, "Stock Market Observer with Typed Events");

    let market = StockMarket::new(out);
    let retirement: Rc<dyn StockObserver> = Rc::new(Portfolio::new(
        "Retirement Fund",
        &[("AAPL", 100), ("GOOGL", 50)],
        out,
    ));
    let growth: Rc<dyn StockObserver> =
        Rc::new(Portfolio::new("Growth Fund", &[("AAPL", 200), ("TSLA", 30)], out));
    let bot: Rc<dyn StockObserver> = Rc::new(TradingBot::new("Momentum", -5.0, 5.0, out));

    market.subscribe(&retirement);
    market.subscribe(&growth);
    market.subscribe(&bot);

    out.blank();
    out.say("Simulating stock price updates:");
    market.update_price("AAPL", 150.00);
    market.update_price("AAPL", 142.50);
    market.update_price("GOOGL", 2800.00);
    market.update_price("TSLA", 800.00);
    market.update_price("TSLA", 840.00);

    out.blank();
    out.say("Simulating volume alerts:");
    market.alert_volume("AAPL", 10_000_000);
    market.alert_volume("TSLA", 5_000_000);
}

fn game_session_demo(out: &Narrator) {
    out.section(3, "Closure Subscribers - Game Session");

    let mut session = GameSession::new();

    let log = out.clone();
    session.subscribe(move |event| narrate!(log, "🎮 Game Log: {}", event.describe()));

    let leaderboard = out.clone();
    session.subscribe(move |event| {
        if let GameEvent::ScoreChanged { player, score } = event {
            narrate!(leaderboard, "🏆 Leaderboard Update: {player} scored {score} points!");
        }
    });

    let greeter = out.clone();
    session.subscribe(move |event| match event {
        GameEvent::PlayerJoined(player) => narrate!(greeter, "🎉 Welcome {player} to the game!"),
        GameEvent::PlayerLeft(player) => narrate!(greeter, "👋 {player} has left the game."),
        _ => {}
    });

    narrate!(out, "{} subscribers registered", session.events.subscriber_count());
    out.blank();
    out.say("Game session events:");
    session.join("Alice");
    session.join("Bob");
    session.start();
    session.update_score("Alice", 100);
    session.update_score("Bob", 150);
    session.update_score("Alice", 200);
    session.leave("Bob");
    session.end();
}

fn cleanup_demo(out: &Narrator) {
    out.section(4, "Automatic Observer Cleanup");

    let agency = NewsAgency::new(out);
    {
        let temporary: Rc<dyn Observer> = Notifier::email("temp@example.com", out);
        agency.attach(&temporary);
        narrate!(out, "Observer count: {}", agency.observer_count());
        agency.publish("Temporary observer active");
    }

    out.blank();
    out.say("After observer destruction:");
    agency.publish("Temporary observer should be cleaned up");
    narrate!(out, "Observer count after cleanup: {}", agency.observer_count());
}

fn main() -> ExitCode {
    patterns::runner::run("Observer", |out, _config| {
        news_agency_demo(out);
        stock_market_demo(out);
        game_session_demo(out);
        cleanup_demo(out);

        out.section(5, "Observer Pattern Benefits");
        out.checklist(&[
            "Loose coupling between subjects and observers",
            "Dynamic relationships - can add/remove observers at runtime",
            "Broadcast communication - one subject can notify many observers",
            "Weak references let observers go away without leaking",
            "Closure subscribers for lightweight event handling",
        ]);
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin observer)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Observer that records what it saw and optionally re-enters its subject.
    struct Recorder {
        name: String,
        seen: RefCell<Vec<String>>,
    }

    impl Recorder {
        fn new(name: &str) -> Rc<Self> {
            Rc::new(Self {
                name: name.to_string(),
                seen: RefCell::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<String> {
            self.seen.borrow().clone()
        }
    }

    impl Observer for Recorder {
        fn name(&self) -> String {
            self.name.clone()
        }

        fn update(&self, message: &str) -> Result<()> {
            self.seen.borrow_mut().push(message.to_string());
            Ok(())
        }
    }

    fn as_observer(recorder: &Rc<Recorder>) -> Rc<dyn Observer> {
        recorder.clone()
    }

    #[test]
    fn test_news_agency_detach_scenario() {
        let out = Narrator::capture();
        let subject = Subject::new(&out);
        let (a, b, c) = (Recorder::new("A"), Recorder::new("B"), Recorder::new("C"));

        subject.attach(&as_observer(&a));
        subject.attach(&as_observer(&b));
        subject.attach(&as_observer(&c));
        subject.notify("n1");
        subject.detach(&as_observer(&b));
        subject.notify("n2");

        assert_eq!(a.seen(), vec!["n1", "n2"]);
        assert_eq!(b.seen(), vec!["n1"]);
        assert_eq!(c.seen(), vec!["n1", "n2"]);
    }

    #[test]
    fn test_double_attach_delivers_twice_and_detach_removes_all() {
        let out = Narrator::capture();
        let subject = Subject::new(&out);
        let a = Recorder::new("A");
        subject.attach(&as_observer(&a));
        subject.attach(&as_observer(&a));
        subject.notify("m");
        assert_eq!(a.seen(), vec!["m", "m"]);

        subject.detach(&as_observer(&a));
        subject.notify("after");
        assert_eq!(a.seen().len(), 2);
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn test_detach_unknown_observer_is_harmless() {
        let out = Narrator::capture();
        let subject = Subject::new(&out);
        let a = Recorder::new("A");
        let stranger = Recorder::new("X");
        subject.attach(&as_observer(&a));
        subject.detach(&as_observer(&stranger));
        assert_eq!(subject.observer_count(), 1);
    }

    #[test]
    fn test_receives_exactly_the_messages_while_attached() {
        let out = Narrator::capture();
        let subject = Subject::new(&out);
        subject.notify("before");
        let a = Recorder::new("A");
        subject.attach(&as_observer(&a));
        let sent: Vec<String> = (0..5).map(|i| format!("m{i}")).collect();
        for message in &sent {
            subject.notify(message);
        }
        subject.detach(&as_observer(&a));
        subject.notify("after");
        assert_eq!(a.seen(), sent);
    }

    #[test]
    fn test_dropped_observers_are_skipped_and_pruned() {
        let out = Narrator::capture();
        let subject = Subject::new(&out);
        let keep = Recorder::new("keep");
        subject.attach(&as_observer(&keep));
        {
            let temporary = Recorder::new("temp");
            subject.attach(&as_observer(&temporary));
            assert_eq!(subject.observer_count(), 2);
        }
        subject.notify("hello");
        assert!(out.contains("Notifying 1 observers..."));
        assert!(!out.contains("Notifying 2 observers..."));
        assert_eq!(subject.observer_count(), 1);
        assert_eq!(keep.seen(), vec!["hello"]);
    }

    #[test]
    fn test_failing_observer_does_not_stop_the_loop() {
        let out = Narrator::capture();
        let subject = Subject::new(&out);
        let pager: Rc<dyn Observer> = Rc::new(OfflinePager {
            number: "1".to_string(),
        });
        let after = Recorder::new("after");
        subject.attach(&pager);
        subject.attach(&as_observer(&after));
        subject.notify("alert");
        assert_eq!(after.seen(), vec!["alert"]);
        assert!(out.contains("Pager(1) failed to process update"));
    }

    struct Reentrant {
        subject: Rc<Subject>,
        late: Rc<Recorder>,
        seen: RefCell<usize>,
    }

    impl Observer for Reentrant {
        fn name(&self) -> String {
            "reentrant".to_string()
        }

        fn update(&self, _message: &str) -> Result<()> {
            *self.seen.borrow_mut() += 1;
            let late: Rc<dyn Observer> = self.late.clone();
            self.subject.attach(&late);
            Ok(())
        }
    }

    #[test]
    fn test_attach_during_notify_applies_to_next_round() {
        let out = Narrator::capture();
        let subject = Rc::new(Subject::new(&out));
        let late = Recorder::new("late");
        let reentrant: Rc<dyn Observer> = Rc::new(Reentrant {
            subject: subject.clone(),
            late: late.clone(),
            seen: RefCell::new(0),
        });
        subject.attach(&reentrant);

        subject.notify("first");
        assert!(late.seen().is_empty());

        subject.notify("second");
        assert_eq!(late.seen(), vec!["second"]);
    }

    #[test]
    fn test_agency_narrates_headline_before_deliveries() {
        let out = Narrator::capture();
        let agency = NewsAgency::new(&out);
        let email: Rc<dyn Observer> = Notifier::email("a@b.c", &out);
        agency.attach(&email);
        agency.publish("Rust 2.0");

        let headline = out.position("📰 Breaking News: Rust 2.0").unwrap();
        let delivery = out.position("📧 Email to a@b.c").unwrap();
        assert!(headline < delivery);
        assert_eq!(agency.latest().as_deref(), Some("Rust 2.0"));
    }

    #[test]
    fn test_trading_bot_signals() {
        let out = Narrator::capture();
        let market = StockMarket::new(&out);
        let bot = Rc::new(TradingBot::new("Momentum", -5.0, 5.0, &out));
        let as_dyn: Rc<dyn StockObserver> = bot.clone();
        market.subscribe(&as_dyn);

        market.update_price("AAPL", 150.0);
        market.update_price("AAPL", 142.5);
        market.update_price("TSLA", 800.0);
        market.update_price("TSLA", 840.0);

        assert_eq!(*bot.signals.borrow(), vec!["BUY AAPL", "SELL TSLA"]);
    }

    #[test]
    fn test_portfolio_ignores_unheld_symbols() {
        let out = Narrator::capture();
        let market = StockMarket::new(&out);
        let portfolio: Rc<dyn StockObserver> =
            Rc::new(Portfolio::new("Fund", &[("AAPL", 10)], &out));
        market.subscribe(&portfolio);
        market.update_price("MSFT", 300.0);
        assert!(!out.contains("💼"));
        market.update_price("AAPL", 100.0);
        assert!(out.contains("💼 Portfolio Fund: AAPL (10 shares) = $1000.00"));
    }

    #[test]
    fn test_game_session_only_scores_while_active() {
        let mut session = GameSession::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        session.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        session.join("Alice");
        assert!(!session.update_score("Alice", 10));
        session.start();
        assert!(session.update_score("Alice", 10));
        assert!(!session.update_score("Nobody", 5));
        session.end();

        assert_eq!(
            *events.borrow(),
            vec![
                GameEvent::PlayerJoined("Alice".into()),
                GameEvent::GameStarted,
                GameEvent::ScoreChanged {
                    player: "Alice".into(),
                    score: 10
                },
                GameEvent::GameEnded,
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_observer_sees_exactly_the_window_it_was_attached_for(
            before in 0usize..5,
            during in 0usize..10,
            after in 0usize..5,
            others in 0usize..4,
        ) {
            let out = Narrator::capture();
            let subject = Subject::new(&out);
            let bystanders: Vec<Rc<dyn Observer>> =
                (0..others).map(|i| as_observer(&Recorder::new(&format!("B{i}")))).collect();
            for bystander in &bystanders {
                subject.attach(bystander);
            }
            let watched = Recorder::new("W");

            for i in 0..before {
                subject.notify(&format!("before {i}"));
            }
            subject.attach(&as_observer(&watched));
            let expected: Vec<String> = (0..during).map(|i| format!("during {i}")).collect();
            for message in &expected {
                subject.notify(message);
            }
            subject.detach(&as_observer(&watched));
            for i in 0..after {
                subject.notify(&format!("after {i}"));
            }

            prop_assert_eq!(watched.seen(), expected);
            prop_assert_eq!(subject.observer_count(), others);
        }
    }
}
