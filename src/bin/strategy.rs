use itertools::Itertools;
use lazy_static::lazy_static;
use patterns::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use regex::Regex;
use std::fmt;
use std::process::ExitCode;
use std::time::Instant;

// =============================================================================
// Sorting strategies
// =============================================================================

trait SortStrategy {
    fn name(&self) -> &'static str;
    fn sort(&self, data: &mut [i32]);
}

struct BubbleSort;

impl SortStrategy for BubbleSort {
    fn name(&self) -> &'static str {
        "Bubble Sort"
    }

    fn sort(&self, data: &mut [i32]) {
        let len = data.len();
        for pass in 0..len {
            let mut swapped = false;
            for i in 0..len - pass - 1 {
                if data[i] > data[i + 1] {
                    data.swap(i, i + 1);
                    swapped = true;
                }
            }
            if !swapped {
                break;
            }
        }
    }
}

struct QuickSort;

impl QuickSort {
    /// Lomuto partition around the last element.
    fn partition(data: &mut [i32]) -> usize {
        let pivot = data.len() - 1;
        let mut store = 0;
        for i in 0..pivot {
            if data[i] <= data[pivot] {
                data.swap(i, store);
                store += 1;
            }
        }
        data.swap(store, pivot);
        store
    }

    fn quick_sort(data: &mut [i32]) {
        if data.len() <= 1 {
            return;
        }
        let split = Self::partition(data);
        let (left, right) = data.split_at_mut(split);
        Self::quick_sort(left);
        Self::quick_sort(&mut right[1..]);
    }
}

impl SortStrategy for QuickSort {
    fn name(&self) -> &'static str {
        "Quick Sort"
    }

    fn sort(&self, data: &mut [i32]) {
        Self::quick_sort(data);
    }
}

struct StdSort;

impl SortStrategy for StdSort {
    fn name(&self) -> &'static str {
        "Standard Library Sort"
    }

    fn sort(&self, data: &mut [i32]) {
        data.sort_unstable();
    }
}

struct ParallelSort;

impl SortStrategy for ParallelSort {
    fn name(&self) -> &'static str {
        "Parallel Sort (rayon)"
    }

    fn sort(&self, data: &mut [i32]) {
        data.par_sort_unstable();
    }
}

struct SortContext {
    strategy: Option<Box<dyn SortStrategy>>,
    out: Narrator,
}

impl SortContext {
    fn new(out: &Narrator) -> Self {
        Self {
            strategy: None,
            out: out.clone(),
        }
    }

    fn set_strategy(&mut self, strategy: Box<dyn SortStrategy>) {
        self.strategy = Some(strategy);
    }

    fn sort(&self, data: &mut [i32]) -> Result<()> {
        let strategy = self
            .strategy
            .as_ref()
            .ok_or_else(|| PatternError::precondition("No sorting strategy set!"))?;
        narrate!(self.out, "Using strategy: {}", strategy.name());
        let started = Instant::now();
        strategy.sort(data);
        let micros = started.elapsed().as_micros() as u64;
        tracing::debug!(strategy = strategy.name(), micros, "sorted");
        narrate!(
            self.out,
            "{} completed in {} microseconds",
            strategy.name(),
            started.elapsed().as_micros()
        );
        Ok(())
    }
}

// =============================================================================
// Payment strategies (amounts in cents)
// =============================================================================

fn dollars(cents: u64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

fn last_four(digits: &str) -> &str {
    &digits[digits.len().saturating_sub(4)..]
}

lazy_static! {
    static ref CARD_NUMBER: Regex = Regex::new(r"^\d{16}$").expect("card number pattern");
    static ref EMAIL: Regex =
        Regex::new(r"^[\w.+-]+@[\w-]+(\.[\w-]+)+$").expect("email pattern");
    static ref ACCOUNT_NUMBER: Regex = Regex::new(r"^\d{8,12}$").expect("account pattern");
    static ref ROUTING_NUMBER: Regex = Regex::new(r"^\d{9}$").expect("routing pattern");
}

trait PaymentStrategy {
    fn method(&self) -> &'static str;
    fn fee(&self, amount: u64) -> u64;
    fn validate(&self) -> Result<()>;
    fn pay(&self, total: u64, out: &Narrator);
}

/// `rate` is in tenths of a percent; rounds to the nearest cent.
fn per_mille(amount: u64, rate: u64) -> u64 {
    (amount * rate + 500) / 1000
}

struct CreditCard {
    number: String,
    holder: String,
}

impl PaymentStrategy for CreditCard {
    fn method(&self) -> &'static str {
        "Credit Card"
    }

    fn fee(&self, amount: u64) -> u64 {
        per_mille(amount, 29)
    }

    fn validate(&self) -> Result<()> {
        if !CARD_NUMBER.is_match(&self.number) {
            return Err(PatternError::invalid_argument("card number must be 16 digits"));
        }
        if self.holder.trim().is_empty() {
            return Err(PatternError::invalid_argument("card holder is required"));
        }
        Ok(())
    }

    fn pay(&self, total: u64, out: &Narrator) {
        narrate!(out, "Processing credit card payment of {}", dollars(total));
        narrate!(out, "Card: ****{} ({})", last_four(&self.number), self.holder);
        out.pause_ms(500);
        out.say("Credit card payment successful!");
    }
}

struct PayPal {
    email: String,
}

impl PaymentStrategy for PayPal {
    fn method(&self) -> &'static str {
        "PayPal"
    }

    fn fee(&self, amount: u64) -> u64 {
        per_mille(amount, 34)
    }

    fn validate(&self) -> Result<()> {
        if EMAIL.is_match(&self.email) {
            Ok(())
        } else {
            Err(PatternError::invalid_argument(format!(
                "'{}' is not a valid PayPal email",
                self.email
            )))
        }
    }

    fn pay(&self, total: u64, out: &Narrator) {
        narrate!(out, "Processing PayPal payment of {}", dollars(total));
        narrate!(out, "PayPal account: {}", self.email);
        out.pause_ms(300);
        out.say("PayPal payment successful!");
    }
}

struct BankTransfer {
    account: String,
    routing: String,
}

impl PaymentStrategy for BankTransfer {
    fn method(&self) -> &'static str {
        "Bank Transfer"
    }

    fn fee(&self, _amount: u64) -> u64 {
        50
    }

    fn validate(&self) -> Result<()> {
        if !ACCOUNT_NUMBER.is_match(&self.account) {
            return Err(PatternError::invalid_argument("account number must be 8-12 digits"));
        }
        if !ROUTING_NUMBER.is_match(&self.routing) {
            return Err(PatternError::invalid_argument("routing number must be 9 digits"));
        }
        Ok(())
    }

    fn pay(&self, total: u64, out: &Narrator) {
        narrate!(out, "Processing bank transfer payment of {}", dollars(total));
        narrate!(out, "Account: ****{} (Routing: {})", last_four(&self.account), self.routing);
        out.pause_ms(1000);
        out.say("Bank transfer payment successful!");
    }
}

struct PaymentProcessor {
    strategy: Option<Box<dyn PaymentStrategy>>,
    out: Narrator,
}

impl PaymentProcessor {
    fn new(out: &Narrator) -> Self {
        Self {
            strategy: None,
            out: out.clone(),
        }
    }

    fn set_strategy(&mut self, strategy: Box<dyn PaymentStrategy>) {
        self.strategy = Some(strategy);
    }

    fn current_method(&self) -> &'static str {
        self.strategy.as_ref().map_or("None", |s| s.method())
    }

    /// Charges `amount` plus the method's fee; returns the total charged.
    fn process(&self, amount: u64) -> Result<u64> {
        let strategy = self
            .strategy
            .as_ref()
            .ok_or_else(|| PatternError::precondition("No payment method selected!"))?;
        if amount == 0 {
            return Err(PatternError::invalid_argument("payment amount must be positive"));
        }
        strategy.validate()?;

        let fee = strategy.fee(amount);
        let total = amount + fee;
        self.out.say("--- Payment Processing ---");
        narrate!(self.out, "Method: {}", strategy.method());
        narrate!(self.out, "Amount: {}", dollars(amount));
        narrate!(self.out, "Processing Fee: {}", dollars(fee));
        narrate!(self.out, "Total: {}", dollars(total));
        self.out.say("--------------------------");
        strategy.pay(total, &self.out);
        Ok(total)
    }
}

// =============================================================================
// Discount strategies as closures
// =============================================================================

/// (unit price in cents, quantity) -> discount in cents for that line.
type Discount = Box<dyn Fn(u64, u32) -> u64>;

fn percent_of(amount: u64, percent: u64) -> u64 {
    (amount * percent + 50) / 100
}

fn no_discount() -> Discount {
    Box::new(|_, _| 0)
}

fn percentage_discount(percent: u64) -> Discount {
    Box::new(move |price, quantity| percent_of(price * u64::from(quantity), percent))
}

fn bulk_discount(threshold: u32, off_each: u64) -> Discount {
    Box::new(move |_, quantity| {
        if quantity >= threshold {
            u64::from(quantity) * off_each
        } else {
            0
        }
    })
}

fn buy_two_get_one_free() -> Discount {
    Box::new(|price, quantity| u64::from(quantity / 3) * price)
}

fn tiered_discount() -> Discount {
    Box::new(|price, quantity| {
        let line = price * u64::from(quantity);
        if line >= 10_000 {
            percent_of(line, 15)
        } else if line >= 5_000 {
            percent_of(line, 10)
        } else if line >= 2_500 {
            percent_of(line, 5)
        } else {
            0
        }
    })
}

struct CartItem {
    name: String,
    price: u64,
    quantity: u32,
}

struct ShoppingCart {
    items: Vec<CartItem>,
    discount: Discount,
}

impl ShoppingCart {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            discount: no_discount(),
        }
    }

    fn add_item(&mut self, name: &str, price: u64, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(PatternError::invalid_argument(format!(
                "quantity of {name} must be positive"
            )));
        }
        self.items.push(CartItem {
            name: name.to_string(),
            price,
            quantity,
        });
        Ok(())
    }

    fn set_discount(&mut self, discount: Discount) {
        self.discount = discount;
    }

    /// A line's discount never exceeds the line itself.
    fn line_discount(&self, item: &CartItem) -> u64 {
        (self.discount)(item.price, item.quantity).min(item.price * u64::from(item.quantity))
    }

    fn subtotal(&self) -> u64 {
        self.items.iter().map(|item| item.price * u64::from(item.quantity)).sum()
    }

    fn total_discount(&self) -> u64 {
        self.items.iter().map(|item| self.line_discount(item)).sum()
    }

    fn total(&self) -> u64 {
        self.subtotal() - self.total_discount()
    }

    fn print_receipt(&self, out: &Narrator) {
        out.say("--- Shopping Cart Receipt ---");
        for item in &self.items {
            narrate!(
                out,
                "{} x{} @ {} = {}",
                item.name,
                item.quantity,
                dollars(item.price),
                dollars(item.price * u64::from(item.quantity))
            );
            let discount = self.line_discount(item);
            if discount > 0 {
                narrate!(out, "  Discount: -{}", dollars(discount));
            }
        }
        out.say("----------------------------");
        narrate!(out, "Subtotal: {}", dollars(self.subtotal()));
        narrate!(out, "Total Discount: -{}", dollars(self.total_discount()));
        narrate!(out, "TOTAL: {}", dollars(self.total()));
    }
}

// =============================================================================
// Game AI strategies
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GameState {
    player_hp: u32,
    enemy_hp: u32,
    resources: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AiMove {
    AttackStrongestEnemy,
    FortifyWeakestPosition,
    AttackOpportunityTarget,
    DefendKeyPosition,
    ExpandTerritory,
}

impl fmt::Display for AiMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AiMove::AttackStrongestEnemy => "ATTACK_STRONGEST_ENEMY",
            AiMove::FortifyWeakestPosition => "FORTIFY_WEAKEST_POSITION",
            AiMove::AttackOpportunityTarget => "ATTACK_OPPORTUNITY_TARGET",
            AiMove::DefendKeyPosition => "DEFEND_KEY_POSITION",
            AiMove::ExpandTerritory => "EXPAND_TERRITORY",
        };
        f.write_str(text)
    }
}

trait AiStrategy {
    fn name(&self) -> &'static str;
    fn difficulty(&self) -> u8;
    fn decide(&self, state: &GameState, rng: &mut StdRng, out: &Narrator) -> AiMove;
}

struct Aggressive;

impl AiStrategy for Aggressive {
    fn name(&self) -> &'static str {
        "Aggressive AI"
    }

    fn difficulty(&self) -> u8 {
        7
    }

    fn decide(&self, _state: &GameState, _rng: &mut StdRng, out: &Narrator) -> AiMove {
        out.say("AI thinking aggressively...");
        AiMove::AttackStrongestEnemy
    }
}

struct Defensive;

impl AiStrategy for Defensive {
    fn name(&self) -> &'static str {
        "Defensive AI"
    }

    fn difficulty(&self) -> u8 {
        5
    }

    fn decide(&self, _state: &GameState, _rng: &mut StdRng, out: &Narrator) -> AiMove {
        out.say("AI thinking defensively...");
        AiMove::FortifyWeakestPosition
    }
}

/// Weighs the board: finishes weak enemies, protects a weak player and
/// otherwise picks among the open options.
struct Balanced;

impl AiStrategy for Balanced {
    fn name(&self) -> &'static str {
        "Balanced AI"
    }

    fn difficulty(&self) -> u8 {
        8
    }

    fn decide(&self, state: &GameState, rng: &mut StdRng, out: &Narrator) -> AiMove {
        out.say("AI calculating balanced strategy...");
        if state.enemy_hp < 25 {
            return AiMove::AttackOpportunityTarget;
        }
        if state.player_hp < 25 {
            return AiMove::DefendKeyPosition;
        }
        let options = [
            AiMove::AttackOpportunityTarget,
            AiMove::DefendKeyPosition,
            AiMove::ExpandTerritory,
        ];
        let options = if state.resources < 20 { &options[..2] } else { &options[..] };
        options.choose(rng).copied().unwrap_or(AiMove::DefendKeyPosition)
    }
}

/// Picks the strategy suited to the player's health.
fn strategy_for(state: &GameState) -> Box<dyn AiStrategy> {
    match state.player_hp {
        0..=30 => Box::new(Defensive),
        31..=70 => Box::new(Balanced),
        _ => Box::new(Aggressive),
    }
}

struct GameEngine {
    strategy: Option<Box<dyn AiStrategy>>,
    rng: StdRng,
    turns: u32,
    out: Narrator,
}

impl GameEngine {
    fn new(config: &DemoConfig, out: &Narrator) -> Self {
        Self {
            strategy: None,
            rng: config.rng(),
            turns: 0,
            out: out.clone(),
        }
    }

    fn set_strategy(&mut self, strategy: Box<dyn AiStrategy>) {
        narrate!(
            self.out,
            "AI Strategy changed to: {} (Difficulty: {}/10)",
            strategy.name(),
            strategy.difficulty()
        );
        self.strategy = Some(strategy);
    }

    fn current_ai(&self) -> &'static str {
        self.strategy.as_ref().map_or("None", |s| s.name())
    }

    fn play_turn(&mut self, state: &GameState) -> Result<AiMove> {
        let strategy = self
            .strategy
            .as_ref()
            .ok_or_else(|| PatternError::precondition("No AI strategy set!"))?;
        self.turns += 1;
        narrate!(self.out, "--- AI Turn {} ---", self.turns);
        let decision = strategy.decide(state, &mut self.rng, &self.out);
        narrate!(self.out, "AI Decision: {decision}");
        Ok(decision)
    }
}

// =============================================================================
// Demo (cargo run --bin strategy)
// =============================================================================

fn all_sorts() -> Vec<Box<dyn SortStrategy>> {
    vec![
        Box::new(BubbleSort),
        Box::new(QuickSort),
        Box::new(StdSort),
        Box::new(ParallelSort),
    ]
}

fn sorting_demo(out: &Narrator, config: &DemoConfig) -> Result<()> {
    out.section(1, "Sorting Strategies");

    let data = vec![64, 34, 25, 12, 22, 11, 90, 5];
    narrate!(out, "Original data: {}", data.iter().join(" "));

    let mut context = SortContext::new(out);
    context.sort(&mut data.clone()).or_narrate(out)?;

    for strategy in all_sorts() {
        context.set_strategy(strategy);
        let mut copy = data.clone();
        context.sort(&mut copy)?;
        narrate!(out, "Sorted data: {}", copy.iter().join(" "));
        out.blank();
    }

    let mut rng = config.rng();
    let large: Vec<i32> = (0..2_000).map(|_| rng.gen_range(-10_000..10_000)).collect();
    let results: Vec<(&'static str, Vec<i32>)> = all_sorts()
        .iter()
        .map(|strategy| {
            let mut copy = large.clone();
            strategy.sort(&mut copy);
            (strategy.name(), copy)
        })
        .collect();
    let agree = results.iter().map(|(_, sorted)| sorted).all_equal();
    narrate!(
        out,
        "All {} strategies agree on {} random values: {}",
        results.len(),
        large.len(),
        if agree { "yes" } else { "no" }
    );
    Ok(())
}

fn payment_demo(out: &Narrator) -> Result<()> {
    out.section(2, "Payment Processing Strategies");

    let mut processor = PaymentProcessor::new(out);
    narrate!(out, "Current method: {}", processor.current_method());
    processor.process(10_000).or_narrate(out)?;

    let methods: Vec<Box<dyn PaymentStrategy>> = vec![
        Box::new(CreditCard {
            number: "1234567890123456".to_string(),
            holder: "John Doe".to_string(),
        }),
        Box::new(PayPal {
            email: "john.doe@example.com".to_string(),
        }),
        Box::new(BankTransfer {
            account: "9876543210".to_string(),
            routing: "123456789".to_string(),
        }),
    ];
    for method in methods {
        processor.set_strategy(method);
        processor.process(10_000)?;
        out.blank();
    }

    out.say("Rejected payment details:");
    processor.set_strategy(Box::new(PayPal {
        email: "not-an-email".to_string(),
    }));
    processor.process(10_000).or_narrate(out)?;
    processor.set_strategy(Box::new(CreditCard {
        number: "1234".to_string(),
        holder: "Jane Doe".to_string(),
    }));
    processor.process(10_000).or_narrate(out)?;
    Ok(())
}

fn discount_demo(out: &Narrator) -> Result<()> {
    out.section(3, "Shopping Cart with Discount Strategies");

    let mut cart = ShoppingCart::new();
    cart.add_item("Laptop", 99_999, 1)?;
    cart.add_item("Mouse", 2_999, 2)?;
    cart.add_item("Keyboard", 7_999, 1)?;
    cart.add_item("Cable", 999, 0).or_narrate(out)?;

    let strategies: Vec<(&str, Discount)> = vec![
        ("No discount", no_discount()),
        ("10% discount", percentage_discount(10)),
        ("Bulk discount (2+ items get $5 off each)", bulk_discount(2, 500)),
        ("Buy 2 get 1 free", buy_two_get_one_free()),
        ("Tiered discount (5%/10%/15% based on item total)", tiered_discount()),
    ];
    for (label, discount) in strategies {
        out.blank();
        narrate!(out, "{label}:");
        cart.set_discount(discount);
        cart.print_receipt(out);
    }
    Ok(())
}

fn game_ai_demo(out: &Narrator, config: &DemoConfig) -> Result<()> {
    out.section(4, "Game AI Strategies");

    let mut game = GameEngine::new(config, out);
    let state = GameState {
        player_hp: 75,
        enemy_hp: 60,
        resources: 80,
    };
    game.play_turn(&state).or_narrate(out)?;

    let strategies: Vec<Box<dyn AiStrategy>> =
        vec![Box::new(Aggressive), Box::new(Defensive), Box::new(Balanced)];
    for strategy in strategies {
        game.set_strategy(strategy);
        game.play_turn(&state)?;
        out.blank();
    }

    out.say("Dynamic AI Strategy Switching:");
    let timeline = [
        GameState { player_hp: 90, enemy_hp: 80, resources: 50 },
        GameState { player_hp: 20, enemy_hp: 70, resources: 30 },
        GameState { player_hp: 55, enemy_hp: 15, resources: 10 },
    ];
    for state in &timeline {
        narrate!(out, "Player health {}, enemy health {}", state.player_hp, state.enemy_hp);
        game.set_strategy(strategy_for(state));
        game.play_turn(state)?;
    }
    narrate!(out, "Final AI: {}", game.current_ai());
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Strategy", |out, config| {
        sorting_demo(out, config)?;
        payment_demo(out)?;
        discount_demo(out)?;
        game_ai_demo(out, config)?;

        out.section(5, "Strategy Pattern Benefits");
        out.checklist(&[
            "Algorithms can be swapped at runtime",
            "Easy to add new strategies without modifying existing code",
            "Eliminates conditional statements for algorithm selection",
            "Each strategy is testable independently",
            "Closures serve as lightweight strategies",
        ]);
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin strategy)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_cart() -> ShoppingCart {
        let mut cart = ShoppingCart::new();
        cart.add_item("Laptop", 99_999, 1).unwrap();
        cart.add_item("Mouse", 2_999, 2).unwrap();
        cart.add_item("Keyboard", 7_999, 1).unwrap();
        cart
    }

    #[test]
    fn test_sort_context_requires_strategy() {
        let out = Narrator::capture();
        let context = SortContext::new(&out);
        let err = context.sort(&mut [3, 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(err.to_string(), "No sorting strategy set!");
    }

    #[test]
    fn test_every_sort_handles_edge_cases() {
        for strategy in all_sorts() {
            let mut empty: [i32; 0] = [];
            strategy.sort(&mut empty);
            let mut single = [1];
            strategy.sort(&mut single);
            let mut dupes = [3, 1, 3, 1, 2];
            strategy.sort(&mut dupes);
            assert_eq!(dupes, [1, 1, 2, 3, 3], "{}", strategy.name());
        }
    }

    #[test]
    fn test_payment_fees_and_totals() {
        let out = Narrator::capture();
        let mut processor = PaymentProcessor::new(&out);
        processor.set_strategy(Box::new(CreditCard {
            number: "1234567890123456".to_string(),
            holder: "A".to_string(),
        }));
        assert_eq!(processor.process(10_000).unwrap(), 10_290);
        processor.set_strategy(Box::new(PayPal {
            email: "a@b.com".to_string(),
        }));
        assert_eq!(processor.process(10_000).unwrap(), 10_340);
        processor.set_strategy(Box::new(BankTransfer {
            account: "12345678".to_string(),
            routing: "123456789".to_string(),
        }));
        assert_eq!(processor.process(10_000).unwrap(), 10_050);
        assert!(out.contains("Account: ****5678 (Routing: 123456789)"));
    }

    #[test]
    fn test_invalid_payment_is_not_charged() {
        let out = Narrator::capture();
        let mut processor = PaymentProcessor::new(&out);
        assert_eq!(processor.process(100).unwrap_err().kind(), ErrorKind::PreconditionFailed);
        processor.set_strategy(Box::new(BankTransfer {
            account: "12".to_string(),
            routing: "123456789".to_string(),
        }));
        assert_eq!(processor.process(100).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert!(!out.contains("Bank transfer payment successful!"));
        processor.set_strategy(Box::new(PayPal {
            email: "a@b.com".to_string(),
        }));
        assert_eq!(processor.process(0).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_discount_strategies() {
        let mut cart = sample_cart();
        assert_eq!(cart.subtotal(), 113_996);
        assert_eq!(cart.total(), 113_996);
        cart.set_discount(percentage_discount(10));
        assert_eq!(cart.total_discount(), 11_400);
        cart.set_discount(bulk_discount(2, 500));
        assert_eq!(cart.total_discount(), 1_000);
        cart.set_discount(buy_two_get_one_free());
        assert_eq!(cart.total_discount(), 0);
        cart.set_discount(tiered_discount());
        assert_eq!(cart.total_discount(), 16_400);
    }

    #[test]
    fn test_discount_is_capped_at_line_total() {
        let mut cart = ShoppingCart::new();
        cart.add_item("Sticker", 100, 3).unwrap();
        cart.set_discount(bulk_discount(1, 1_000));
        assert_eq!(cart.total(), 0);
        cart.set_discount(buy_two_get_one_free());
        assert_eq!(cart.total(), 200);
    }

    #[test]
    fn test_ai_strategy_selection_by_health() {
        let low = GameState { player_hp: 10, enemy_hp: 50, resources: 50 };
        let mid = GameState { player_hp: 50, enemy_hp: 50, resources: 50 };
        let high = GameState { player_hp: 100, enemy_hp: 50, resources: 50 };
        assert_eq!(strategy_for(&low).name(), "Defensive AI");
        assert_eq!(strategy_for(&mid).name(), "Balanced AI");
        assert_eq!(strategy_for(&high).name(), "Aggressive AI");
    }

    #[test]
    fn test_balanced_ai_reacts_to_weak_sides() {
        let out = Narrator::capture();
        let mut rng = DemoConfig::for_tests().rng();
        let weak_enemy = GameState { player_hp: 80, enemy_hp: 10, resources: 50 };
        let weak_player = GameState { player_hp: 10, enemy_hp: 80, resources: 50 };
        assert_eq!(Balanced.decide(&weak_enemy, &mut rng, &out), AiMove::AttackOpportunityTarget);
        assert_eq!(Balanced.decide(&weak_player, &mut rng, &out), AiMove::DefendKeyPosition);
        let poor = GameState { player_hp: 50, enemy_hp: 50, resources: 0 };
        for _ in 0..20 {
            assert_ne!(Balanced.decide(&poor, &mut rng, &out), AiMove::ExpandTerritory);
        }
    }

    #[test]
    fn test_game_engine_is_deterministic_for_a_seed() {
        let decisions = || {
            let out = Narrator::capture();
            let mut game = GameEngine::new(&DemoConfig::for_tests(), &out);
            game.set_strategy(Box::new(Balanced));
            let state = GameState { player_hp: 60, enemy_hp: 60, resources: 60 };
            (0..10).map(|_| game.play_turn(&state).unwrap()).collect::<Vec<_>>()
        };
        assert_eq!(decisions(), decisions());
    }

    #[test]
    fn test_demo_runs() {
        let out = Narrator::capture();
        let config = DemoConfig::for_tests();
        sorting_demo(&out, &config).unwrap();
        payment_demo(&out).unwrap();
        discount_demo(&out).unwrap();
        game_ai_demo(&out, &config).unwrap();
        assert!(out.contains("❌ No sorting strategy set!"));
        assert_eq!(out.count("Sorted data: 5 11 12 22 25 34 64 90"), 4);
        assert!(out.contains("All 4 strategies agree on 2000 random values: yes"));
        assert!(out.contains("Total: $102.90"));
        assert!(out.contains("❌ Invalid argument: 'not-an-email' is not a valid PayPal email"));
        assert!(out.contains("TOTAL: $1025.96"));
        assert!(out.contains("AI Strategy changed to: Defensive AI (Difficulty: 5/10)"));
        assert!(out.contains("AI Decision: ATTACK_OPPORTUNITY_TARGET"));
    }

    proptest! {
        #[test]
        fn prop_all_sorts_match_std(values in prop::collection::vec(any::<i32>(), 0..200)) {
            let mut expected = values.clone();
            expected.sort();
            for strategy in all_sorts() {
                let mut copy = values.clone();
                strategy.sort(&mut copy);
                prop_assert_eq!(&copy, &expected);
            }
        }
    }
}
