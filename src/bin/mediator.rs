use patterns::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::process::ExitCode;

// =============================================================================
// Chat room: the room owns every participant
// =============================================================================

/// A colleague never holds the room. It answers deliveries with an optional
/// reply which the room then routes like any other message.
trait Participant {
    fn name(&self) -> &str;
    fn receive(&mut self, from: &str, message: &str, out: &Narrator) -> Option<String>;
    fn is_bot(&self) -> bool {
        false
    }
}

struct ChatUser {
    name: String,
}

impl ChatUser {
    fn boxed(name: &str) -> Box<dyn Participant> {
        Box::new(Self {
            name: name.to_string(),
        })
    }
}

impl Participant for ChatUser {
    fn name(&self) -> &str {
        &self.name
    }

    fn receive(&mut self, from: &str, message: &str, out: &Narrator) -> Option<String> {
        narrate!(out, "📱 {} receives from {from}: {message}", self.name);
        None
    }
}

const BOT_REPLIES: [&str; 5] = [
    "That's interesting!",
    "Can you tell me more?",
    "I understand.",
    "Thanks for sharing!",
    "How fascinating!",
];

/// Replies to any question it overhears.
struct ChatBot {
    name: String,
    rng: StdRng,
}

impl Participant for ChatBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn receive(&mut self, from: &str, message: &str, out: &Narrator) -> Option<String> {
        narrate!(out, "🤖 {} (bot) receives from {from}: {message}", self.name);
        if from == SYSTEM || !message.contains('?') {
            return None;
        }
        let reply = BOT_REPLIES.choose(&mut self.rng).copied().unwrap_or("I understand.");
        Some(format!("@{from} {reply}"))
    }

    fn is_bot(&self) -> bool {
        true
    }
}

const SYSTEM: &str = "System";

struct ChatRoom {
    members: Vec<Box<dyn Participant>>,
    history: Vec<String>,
    out: Narrator,
}

impl ChatRoom {
    fn new(out: &Narrator) -> Self {
        Self {
            members: Vec::new(),
            history: Vec::new(),
            out: out.clone(),
        }
    }

    fn join(&mut self, member: Box<dyn Participant>) -> Result<()> {
        if self.index_of(member.name()).is_some() {
            return Err(PatternError::invalid_argument(format!(
                "'{}' is already in the room",
                member.name()
            )));
        }
        let name = member.name().to_string();
        self.members.push(member);
        narrate!(self.out, "✅ {name} joined the chat room");
        self.broadcast(SYSTEM, &format!("{name} joined the room"), Some(name.as_str()));
        Ok(())
    }

    fn leave(&mut self, name: &str) -> Result<()> {
        let index = self
            .index_of(name)
            .ok_or_else(|| PatternError::not_found(format!("'{name}' in the chat room")))?;
        self.members.remove(index);
        narrate!(self.out, "👋 {name} left the chat room");
        self.broadcast(SYSTEM, &format!("{name} left the room"), None);
        Ok(())
    }

    /// Delivers to everyone but the sender and routes any replies the
    /// delivery provokes. Replies to a bot are dropped so bots cannot keep
    /// answering each other. Returns how many messages went out in total.
    fn send(&mut self, from: &str, message: &str) -> Result<usize> {
        let mut pending = VecDeque::from([(from.to_string(), message.to_string())]);
        let mut sent = 0;
        while let Some((sender, text)) = pending.pop_front() {
            let index = self
                .index_of(&sender)
                .ok_or_else(|| PatternError::not_found(format!("'{sender}' in the chat room")))?;
            let from_bot = self.members[index].is_bot();
            let icon = if from_bot { "🤖" } else { "👤" };
            narrate!(self.out, "{icon} {sender} sends: {text}");
            self.history.push(format!("{sender}: {text}"));
            let replies = self.broadcast(&sender, &text, Some(sender.as_str()));
            if !from_bot {
                pending.extend(replies);
            }
            sent += 1;
        }
        Ok(sent)
    }

    fn broadcast(
        &mut self,
        from: &str,
        message: &str,
        skip: Option<&str>,
    ) -> Vec<(String, String)> {
        let mut replies = Vec::new();
        for member in self.members.iter_mut().filter(|m| Some(m.name()) != skip) {
            if let Some(reply) = member.receive(from, message, &self.out) {
                replies.push((member.name().to_string(), reply));
            }
        }
        replies
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name() == name)
    }

    fn show_history(&self) {
        self.out.say("📜 Chat History:");
        for line in &self.history {
            narrate!(self.out, "   {line}");
        }
    }

    fn member_count(&self) -> usize {
        self.members.len()
    }
}

// =============================================================================
// Air traffic control: the tower owns the runway and the aircraft
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlightStatus {
    Parked,
    Holding,
    TakingOff,
    Airborne,
    Landing,
    Taxiing,
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FlightStatus::Parked => "Parked",
            FlightStatus::Holding => "Holding",
            FlightStatus::TakingOff => "Taking off",
            FlightStatus::Airborne => "Airborne",
            FlightStatus::Landing => "Landing",
            FlightStatus::Taxiing => "Taxiing",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AircraftKind {
    Commercial { passengers: u32 },
    PrivateJet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunwayUse {
    Takeoff,
    Landing,
}

struct Aircraft {
    call_sign: String,
    kind: AircraftKind,
    status: FlightStatus,
    instructions: Vec<String>,
}

struct ControlTower {
    aircraft: Vec<Aircraft>,
    runway: Option<(String, RunwayUse)>,
    queue: VecDeque<(String, RunwayUse)>,
    out: Narrator,
}

impl ControlTower {
    const RUNWAY: &'static str = "09L";

    fn new(out: &Narrator) -> Self {
        Self {
            aircraft: Vec::new(),
            runway: None,
            queue: VecDeque::new(),
            out: out.clone(),
        }
    }

    fn register(&mut self, call_sign: &str, kind: AircraftKind, status: FlightStatus) {
        self.aircraft.push(Aircraft {
            call_sign: call_sign.to_string(),
            kind,
            status,
            instructions: Vec::new(),
        });
        narrate!(self.out, "📝 {call_sign} registered with Control Tower");
    }

    fn aircraft(&self, call_sign: &str) -> Result<&Aircraft> {
        self.aircraft
            .iter()
            .find(|a| a.call_sign == call_sign)
            .ok_or_else(|| PatternError::not_found(format!("aircraft {call_sign}")))
    }

    fn aircraft_mut(&mut self, call_sign: &str) -> Result<&mut Aircraft> {
        self.aircraft
            .iter_mut()
            .find(|a| a.call_sign == call_sign)
            .ok_or_else(|| PatternError::not_found(format!("aircraft {call_sign}")))
    }

    fn instruct(&mut self, call_sign: &str, instruction: String) -> Result<()> {
        self.aircraft_mut(call_sign)?;
        narrate!(self.out, "📻 {call_sign} received: {instruction}");
        self.aircraft_mut(call_sign)?.instructions.push(instruction);
        Ok(())
    }

    fn set_status(&mut self, call_sign: &str, status: FlightStatus) -> Result<()> {
        self.aircraft_mut(call_sign)?.status = status;
        Ok(())
    }

    fn request_takeoff(&mut self, call_sign: &str) -> Result<()> {
        let aircraft = self.aircraft(call_sign)?;
        match aircraft.kind {
            AircraftKind::Commercial { passengers } => narrate!(
                self.out,
                "🛫 Commercial flight {call_sign} (PAX: {passengers}) requesting takeoff clearance"
            ),
            AircraftKind::PrivateJet => {
                narrate!(self.out, "🛩️ Private jet {call_sign} requesting takeoff clearance")
            }
        }
        if aircraft.status != FlightStatus::Parked && aircraft.status != FlightStatus::Taxiing {
            return Err(PatternError::precondition(format!(
                "{call_sign} cannot take off while {}",
                aircraft.status
            )));
        }
        self.request_runway(call_sign, RunwayUse::Takeoff)
    }

    fn request_landing(&mut self, call_sign: &str) -> Result<()> {
        narrate!(self.out, "🛬 {call_sign} requesting landing clearance");
        let status = self.aircraft(call_sign)?.status;
        if status != FlightStatus::Airborne && status != FlightStatus::Holding {
            return Err(PatternError::precondition(format!("{call_sign} is not in the air")));
        }
        self.request_runway(call_sign, RunwayUse::Landing)
    }

    fn request_runway(&mut self, call_sign: &str, usage: RunwayUse) -> Result<()> {
        narrate!(self.out, "🏢 Control Tower processing request from {call_sign}");
        if self.runway.is_none() {
            return self.clear(call_sign, usage);
        }
        // Landings jump the queue ahead of departures.
        match usage {
            RunwayUse::Landing => {
                let position =
                    self.queue.iter().take_while(|(_, u)| *u == RunwayUse::Landing).count();
                self.queue.insert(position, (call_sign.to_string(), usage));
                self.set_status(call_sign, FlightStatus::Holding)?;
                self.instruct(call_sign, "Hold at 3000ft, runway occupied".to_string())
            }
            RunwayUse::Takeoff => {
                self.queue.push_back((call_sign.to_string(), usage));
                let position = self.queue.len();
                self.instruct(
                    call_sign,
                    format!("Hold position, runway occupied. You are #{position} in queue"),
                )
            }
        }
    }

    fn clear(&mut self, call_sign: &str, usage: RunwayUse) -> Result<()> {
        self.runway = Some((call_sign.to_string(), usage));
        let (status, instruction) = match usage {
            RunwayUse::Takeoff => (FlightStatus::TakingOff, "Cleared for takeoff on runway"),
            RunwayUse::Landing => (FlightStatus::Landing, "Cleared to land on runway"),
        };
        self.set_status(call_sign, status)?;
        self.instruct(call_sign, format!("{instruction} {}", Self::RUNWAY))
    }

    /// The aircraft on the runway finishes; the next in line is cleared.
    fn runway_vacated(&mut self) -> Result<()> {
        let (call_sign, usage) = self
            .runway
            .take()
            .ok_or_else(|| PatternError::precondition("runway is already clear"))?;
        match usage {
            RunwayUse::Takeoff => {
                self.set_status(&call_sign, FlightStatus::Airborne)?;
                narrate!(self.out, "🛫 {call_sign} is airborne");
            }
            RunwayUse::Landing => {
                self.set_status(&call_sign, FlightStatus::Taxiing)?;
                narrate!(self.out, "🛬 {call_sign} has landed safely");
            }
        }
        if let Some((next, usage)) = self.queue.pop_front() {
            narrate!(self.out, "🏢 Processing next aircraft in queue: {next}");
            self.clear(&next, usage)?;
        }
        Ok(())
    }

    fn report_position(&mut self, call_sign: &str, position: &str) -> Result<()> {
        narrate!(self.out, "📍 {call_sign} reporting position: {position}");
        if position.contains("Final") {
            self.instruct(call_sign, "Continue approach, wind 090 at 8 knots".to_string())
        } else if position.contains("Downwind") {
            self.instruct(call_sign, "Turn base when ready".to_string())
        } else {
            self.aircraft(call_sign).map(|_| ())
        }
    }

    fn queue_len(&self) -> usize {
        self.queue.len()
    }
}

// =============================================================================
// Settings dialog: widgets talk only to the dialog
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum WidgetId {
    Notifications,
    Sound,
    Email,
    Save,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WidgetEvent {
    Checked,
    Unchecked,
    TextChanged,
    Click,
}

#[derive(Debug)]
enum WidgetKind {
    Button,
    CheckBox { checked: bool },
    TextBox { text: String },
}

#[derive(Debug)]
struct Widget {
    name: &'static str,
    enabled: bool,
    kind: WidgetKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    notifications: bool,
    sound: bool,
    email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DialogOutcome {
    Open,
    Saved(Settings),
    Cancelled,
}

struct SettingsDialog {
    widgets: HashMap<WidgetId, Widget>,
    outcome: DialogOutcome,
    out: Narrator,
}

impl SettingsDialog {
    fn new(out: &Narrator) -> Self {
        let widget = |name, enabled, kind| Widget { name, enabled, kind };
        let unchecked = || WidgetKind::CheckBox { checked: false };
        let empty_text = WidgetKind::TextBox { text: String::new() };
        let widgets = HashMap::from([
            (WidgetId::Notifications, widget("Enable Notifications", true, unchecked())),
            (WidgetId::Sound, widget("Enable Sound", false, unchecked())),
            (WidgetId::Email, widget("Email Address", false, empty_text)),
            (WidgetId::Save, widget("Save", false, WidgetKind::Button)),
            (WidgetId::Cancel, widget("Cancel", true, WidgetKind::Button)),
        ]);
        Self {
            widgets,
            outcome: DialogOutcome::Open,
            out: out.clone(),
        }
    }

    fn widget(&self, id: WidgetId) -> Result<&Widget> {
        self.widgets
            .get(&id)
            .ok_or_else(|| PatternError::fatal(format!("dialog lost widget {id:?}")))
    }

    fn widget_mut(&mut self, id: WidgetId) -> Result<&mut Widget> {
        self.widgets
            .get_mut(&id)
            .ok_or_else(|| PatternError::fatal(format!("dialog lost widget {id:?}")))
    }

    fn is_checked(&self, id: WidgetId) -> bool {
        matches!(
            self.widgets.get(&id),
            Some(Widget { kind: WidgetKind::CheckBox { checked: true }, .. })
        )
    }

    fn text(&self, id: WidgetId) -> &str {
        match self.widgets.get(&id) {
            Some(Widget { kind: WidgetKind::TextBox { text }, .. }) => text.as_str(),
            _ => "",
        }
    }

    fn is_enabled(&self, id: WidgetId) -> bool {
        self.widgets.get(&id).is_some_and(|w| w.enabled)
    }

    fn ensure_enabled(&self, id: WidgetId) -> Result<&'static str> {
        let widget = self.widget(id)?;
        if widget.enabled {
            Ok(widget.name)
        } else {
            Err(PatternError::precondition(format!("⚠️ {} is disabled", widget.name)))
        }
    }

    /// Buttons fire a click; check boxes toggle and report the new state.
    fn click(&mut self, id: WidgetId) -> Result<()> {
        let name = self.ensure_enabled(id)?;
        narrate!(self.out, "🖱️ {name} clicked");
        let event = match &mut self.widget_mut(id)?.kind {
            WidgetKind::CheckBox { checked } => {
                *checked = !*checked;
                if *checked {
                    WidgetEvent::Checked
                } else {
                    WidgetEvent::Unchecked
                }
            }
            WidgetKind::Button => WidgetEvent::Click,
            WidgetKind::TextBox { .. } => return Ok(()),
        };
        if event != WidgetEvent::Click {
            let label = if event == WidgetEvent::Checked { "checked" } else { "unchecked" };
            narrate!(self.out, "☑️ {name} {label}");
        }
        self.notify(id, event)
    }

    fn type_text(&mut self, id: WidgetId, input: &str) -> Result<()> {
        let name = self.ensure_enabled(id)?;
        match &mut self.widget_mut(id)?.kind {
            WidgetKind::TextBox { text } => *text = input.to_string(),
            _ => return Err(PatternError::unsupported(format!("typing into {name}"))),
        }
        narrate!(self.out, "📝 {name} text set to: '{input}'");
        self.notify(id, WidgetEvent::TextChanged)
    }

    fn set_enabled(&mut self, id: WidgetId, enabled: bool) -> Result<()> {
        let widget = self.widget_mut(id)?;
        if widget.enabled != enabled {
            widget.enabled = enabled;
            let name = widget.name;
            narrate!(self.out, "⚙️ {name} {}", if enabled { "enabled" } else { "disabled" });
        }
        Ok(())
    }

    fn can_save(&self) -> bool {
        self.is_checked(WidgetId::Notifications) && !self.text(WidgetId::Email).trim().is_empty()
    }

    fn notify(&mut self, sender: WidgetId, event: WidgetEvent) -> Result<()> {
        let name = self.widget(sender)?.name;
        narrate!(self.out, "🔔 Dialog received event: {event:?} from {name}");
        match (sender, event) {
            (WidgetId::Notifications, WidgetEvent::Checked | WidgetEvent::Unchecked) => {
                let on = event == WidgetEvent::Checked;
                self.set_enabled(WidgetId::Sound, on)?;
                self.set_enabled(WidgetId::Email, on)?;
                self.set_enabled(WidgetId::Save, self.can_save())
            }
            (WidgetId::Email, WidgetEvent::TextChanged) => {
                self.set_enabled(WidgetId::Save, self.can_save())
            }
            (WidgetId::Save, WidgetEvent::Click) => {
                let settings = Settings {
                    notifications: self.is_checked(WidgetId::Notifications),
                    sound: self.is_checked(WidgetId::Sound),
                    email: self.text(WidgetId::Email).to_string(),
                };
                self.out.say("💾 Saving settings:");
                narrate!(self.out, "   Notifications: {}", on_off(settings.notifications));
                narrate!(self.out, "   Sound: {}", on_off(settings.sound));
                narrate!(self.out, "   Email: {}", settings.email);
                self.outcome = DialogOutcome::Saved(settings);
                self.out.say("✅ Settings saved successfully!");
                Ok(())
            }
            (WidgetId::Cancel, WidgetEvent::Click) => {
                self.outcome = DialogOutcome::Cancelled;
                self.out.say("🚫 Settings cancelled");
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "On"
    } else {
        "Off"
    }
}

// =============================================================================
// Functional mediator: topic -> handlers
// =============================================================================

struct EventMediator<E> {
    subscribers: HashMap<String, Vec<Box<dyn Fn(&E)>>>,
}

impl<E> EventMediator<E> {
    fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
        }
    }

    fn subscribe(&mut self, topic: &str, handler: impl Fn(&E) + 'static) {
        self.subscribers.entry(topic.to_string()).or_default().push(Box::new(handler));
    }

    /// Returns the number of handlers that ran.
    fn publish(&self, topic: &str, event: &E) -> usize {
        let handlers = self.subscribers.get(topic).map(Vec::as_slice).unwrap_or_default();
        for handler in handlers {
            handler(event);
        }
        handlers.len()
    }

    fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers.get(topic).map_or(0, Vec::len)
    }
}

// =============================================================================
// Demo (cargo run --bin mediator)
// =============================================================================

fn chat_demo(out: &Narrator, config: &DemoConfig) -> Result<()> {
    out.section(1, "Chat Room Mediator");

    let mut room = ChatRoom::new(out);
    room.join(ChatUser::boxed("Alice"))?;
    room.join(ChatUser::boxed("Bob"))?;
    room.join(ChatUser::boxed("Charlie"))?;
    room.join(Box::new(ChatBot {
        name: "Assistant".to_string(),
        rng: config.rng(),
    }))?;
    room.join(ChatUser::boxed("Alice")).or_narrate(out)?;

    out.blank();
    out.say("Chat conversation:");
    room.send("Alice", "Hello everyone!")?;
    room.send("Bob", "Hey Alice, how are you?")?;
    room.send("Charlie", "Good morning all!")?;
    room.send("Alice", "I'm doing great, thanks for asking!")?;

    out.blank();
    out.say("Removing user:");
    room.leave("Charlie")?;
    room.send("Bob", "Where did Charlie go?")?;
    room.send("Charlie", "I'm still here!").or_narrate(out)?;
    narrate!(out, "Members in room: {}", room.member_count());

    out.blank();
    room.show_history();
    Ok(())
}

fn air_traffic_demo(out: &Narrator) -> Result<()> {
    out.section(2, "Air Traffic Control Mediator");

    let mut tower = ControlTower::new(out);
    tower.register("UA123", AircraftKind::Commercial { passengers: 180 }, FlightStatus::Parked);
    tower.register("DL456", AircraftKind::Commercial { passengers: 210 }, FlightStatus::Parked);
    tower.register("N123AB", AircraftKind::PrivateJet, FlightStatus::Parked);
    tower.register("BA789", AircraftKind::Commercial { passengers: 240 }, FlightStatus::Airborne);

    out.blank();
    out.say("Flight operations:");
    tower.request_takeoff("UA123")?;
    tower.request_takeoff("DL456")?;
    tower.request_takeoff("N123AB")?;
    tower.report_position("BA789", "Downwind")?;
    tower.report_position("BA789", "Final approach")?;
    tower.request_landing("BA789")?;
    narrate!(out, "Aircraft waiting: {}", tower.queue_len());

    out.blank();
    while tower.runway.is_some() {
        out.pause_ms(200);
        tower.runway_vacated()?;
    }
    tower.request_landing("UA123")?;
    tower.runway_vacated()?;
    tower.request_takeoff("ZZ999").or_narrate(out)?;

    out.blank();
    for aircraft in &tower.aircraft {
        narrate!(
            out,
            "{}: {} ({} instructions)",
            aircraft.call_sign,
            aircraft.status,
            aircraft.instructions.len()
        );
    }
    Ok(())
}

fn dialog_demo(out: &Narrator) -> Result<()> {
    out.section(3, "GUI Dialog Mediator");

    let mut dialog = SettingsDialog::new(out);
    out.say("User tries to type before enabling notifications:");
    dialog.type_text(WidgetId::Email, "user@example.com").or_narrate(out)?;

    out.blank();
    out.say("User clicks 'Enable Notifications':");
    dialog.click(WidgetId::Notifications)?;
    narrate!(out, "Save enabled: {}", dialog.is_enabled(WidgetId::Save));

    out.blank();
    out.say("User enters an email address and enables sound:");
    dialog.type_text(WidgetId::Email, "user@example.com")?;
    dialog.click(WidgetId::Sound)?;

    out.blank();
    out.say("User clicks Save:");
    dialog.click(WidgetId::Save)?;
    if let DialogOutcome::Saved(settings) = &dialog.outcome {
        narrate!(out, "Dialog closed with email {}", settings.email);
    }
    Ok(())
}

#[derive(Debug)]
struct GameEvent {
    data: String,
}

fn event_mediator_demo(out: &Narrator) {
    out.section(4, "Functional Event Mediator");

    let mut mediator = EventMediator::<GameEvent>::new();
    let handlers: [(&str, &str); 4] = [
        ("player_joined", "🎮 New player joined"),
        ("player_scored", "🏆 Player scored"),
        ("game_over", "🏁 Game over"),
        ("player_scored", "📊 Statistics updated for"),
    ];
    for (topic, label) in handlers {
        let out = out.clone();
        mediator.subscribe(topic, move |event: &GameEvent| {
            narrate!(out, "{label}: {}", event.data)
        });
    }

    out.say("Game events:");
    let events = [
        ("player_joined", "Alice"),
        ("player_joined", "Bob"),
        ("player_scored", "Alice - 100 points"),
        ("player_scored", "Bob - 150 points"),
        ("game_over", "Final Score - Alice: 100, Bob: 150"),
        ("chat", "nobody listens here"),
    ];
    let delivered: usize = events
        .iter()
        .map(|(topic, data)| mediator.publish(topic, &GameEvent { data: data.to_string() }))
        .sum();
    narrate!(out, "Handlers run: {delivered}");

    out.blank();
    out.say("Subscriber counts:");
    for topic in ["player_joined", "player_scored", "game_over", "chat"] {
        narrate!(out, "{topic}: {} subscribers", mediator.subscriber_count(topic));
    }
}

fn main() -> ExitCode {
    patterns::runner::run("Mediator", |out, config| {
        chat_demo(out, config)?;
        air_traffic_demo(out)?;
        dialog_demo(out)?;
        event_mediator_demo(out);

        out.section(5, "Mediator Pattern Benefits");
        out.checklist(&[
            "Decouples objects by preventing direct communication",
            "Centralizes control logic in mediator",
            "Promotes loose coupling between colleagues",
            "Makes object collaboration more explicit",
            "Supports many-to-many communication patterns",
        ]);
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin mediator)
// =============================================================================
