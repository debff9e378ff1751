use patterns::prelude::*;
use std::fmt;
use std::process::ExitCode;

// =============================================================================
// Vending machine: enum state machine
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MachineState {
    Idle,
    HasMoney,
    Dispensing { product: usize },
    OutOfOrder,
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MachineState::Idle => "Idle",
            MachineState::HasMoney => "Has Money",
            MachineState::Dispensing { .. } => "Dispensing",
            MachineState::OutOfOrder => "Out of Order",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
struct Product {
    name: String,
    price: u32,
}

fn dollars(cents: u32) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

/// Coordinator for the vending machine. Money is tracked in cents.
struct VendingMachine {
    state: MachineState,
    balance: u32,
    products: Vec<Product>,
    inventory: Vec<u32>,
    refunded: u32,
    out: Narrator,
}

impl VendingMachine {
    fn new(out: &Narrator) -> Self {
        let catalogue = [
            ("Coca Cola", 150, 5),
            ("Pepsi", 150, 5),
            ("Water", 100, 10),
            ("Chips", 125, 3),
            ("Candy", 75, 8),
        ];
        Self {
            state: MachineState::Idle,
            balance: 0,
            products: catalogue
                .iter()
                .map(|(name, price, _)| Product {
                    name: name.to_string(),
                    price: *price,
                })
                .collect(),
            inventory: catalogue.iter().map(|(_, _, stock)| *stock).collect(),
            refunded: 0,
            out: out.clone(),
        }
    }

    fn transition(&mut self, next: MachineState) {
        self.state = next;
        narrate!(self.out, "State changed to: {next}");
    }

    fn refund(&mut self, amount: u32) {
        self.refunded += amount;
        self.balance -= amount;
    }

    fn insert_coin(&mut self, coin: u32) -> Result<()> {
        match self.state {
            MachineState::OutOfOrder => Err(PatternError::precondition(format!(
                "Machine is out of order. Coin returned: {}",
                dollars(coin)
            ))),
            MachineState::Dispensing { .. } => {
                Err(PatternError::precondition("Please wait, dispensing product..."))
            }
            _ if coin == 0 => Err(PatternError::invalid_argument("coin amount must be positive")),
            _ if self.balance.checked_add(coin).is_none() => Err(PatternError::invalid_argument(
                format!("Coin of {} would overflow the balance", dollars(coin)),
            )),
            MachineState::Idle => {
                self.transition(MachineState::HasMoney);
                self.balance += coin;
                narrate!(self.out, "Coin inserted: {}", dollars(coin));
                Ok(())
            }
            MachineState::HasMoney => {
                self.balance += coin;
                narrate!(self.out, "Additional coin inserted: {}", dollars(coin));
                narrate!(self.out, "Total balance: {}", dollars(self.balance));
                Ok(())
            }
        }
    }

    fn select_product(&mut self, id: usize) -> Result<()> {
        match self.state {
            MachineState::Idle => Err(PatternError::precondition("Please insert money first")),
            MachineState::OutOfOrder => Err(PatternError::precondition("Machine is out of order")),
            MachineState::Dispensing { .. } => {
                Err(PatternError::precondition("Already dispensing a product"))
            }
            MachineState::HasMoney => {
                let product = self
                    .products
                    .get(id)
                    .ok_or_else(|| PatternError::invalid_argument(format!("no product {id}")))?;
                if self.inventory[id] == 0 {
                    return Err(PatternError::precondition(format!(
                        "Product out of stock: {}",
                        product.name
                    )));
                }
                if self.balance < product.price {
                    return Err(PatternError::precondition(format!(
                        "Insufficient funds. Need {} more",
                        dollars(product.price - self.balance)
                    )));
                }
                let name = product.name.clone();
                self.transition(MachineState::Dispensing { product: id });
                narrate!(self.out, "Product selected: {name}");
                Ok(())
            }
        }
    }

    fn dispense(&mut self) -> Result<()> {
        match self.state {
            MachineState::Dispensing { product } => {
                let Product { name, price } = self.products[product].clone();
                self.transition(MachineState::Idle);
                narrate!(self.out, "Dispensing {name}...");
                self.balance -= price;
                self.inventory[product] -= 1;
                narrate!(self.out, "Product dispensed!");
                let change = self.balance;
                if change > 0 {
                    self.refund(change);
                    narrate!(self.out, "Change returned: {}", dollars(change));
                }
                Ok(())
            }
            MachineState::OutOfOrder => Err(PatternError::precondition("Machine is out of order")),
            _ => Err(PatternError::precondition("Please select a product first")),
        }
    }

    fn cancel(&mut self) -> Result<()> {
        match self.state {
            MachineState::Idle => Err(PatternError::exhausted("cancel")),
            MachineState::HasMoney => {
                let refund = self.balance;
                self.transition(MachineState::Idle);
                self.refund(refund);
                narrate!(self.out, "Transaction cancelled. Refund: {}", dollars(refund));
                Ok(())
            }
            MachineState::Dispensing { .. } => {
                Err(PatternError::precondition("Cannot cancel while dispensing"))
            }
            MachineState::OutOfOrder => Err(PatternError::precondition("Machine is out of order")),
        }
    }

    /// Moves to OutOfOrder from any state, returning whatever was inserted.
    fn break_down(&mut self) {
        let refund = self.balance;
        self.transition(MachineState::OutOfOrder);
        if refund > 0 {
            self.refund(refund);
            narrate!(self.out, "Emergency refund: {}", dollars(refund));
        }
    }

    fn reset(&mut self) -> Result<()> {
        if self.state != MachineState::OutOfOrder {
            return Err(PatternError::precondition("Machine is not out of order"));
        }
        self.transition(MachineState::Idle);
        narrate!(self.out, "Machine repaired and back in service");
        Ok(())
    }

    fn display_status(&self) {
        self.out.say("--- Vending Machine Status ---");
        narrate!(self.out, "Current State: {}", self.state);
        narrate!(self.out, "Balance: {}", dollars(self.balance));
        self.out.say("Products:");
        for (index, (product, stock)) in self.products.iter().zip(&self.inventory).enumerate() {
            narrate!(
                self.out,
                "  {index}: {} - {} (Stock: {stock})",
                product.name,
                dollars(product.price)
            );
        }
        self.out.say("----------------------------");
    }
}

// =============================================================================
// Traffic light: cyclic states with durations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Light {
    Red,
    Green,
    Yellow,
}

impl Light {
    fn color(self) -> &'static str {
        match self {
            Light::Red => "RED",
            Light::Green => "GREEN",
            Light::Yellow => "YELLOW",
        }
    }

    fn duration(self) -> u32 {
        match self {
            Light::Red => 10,
            Light::Green => 15,
            Light::Yellow => 3,
        }
    }

    fn next(self) -> Light {
        match self {
            Light::Red => Light::Green,
            Light::Green => Light::Yellow,
            Light::Yellow => Light::Red,
        }
    }
}

struct TrafficLight {
    light: Light,
    remaining: u32,
    out: Narrator,
}

impl TrafficLight {
    fn new(out: &Narrator) -> Self {
        Self {
            light: Light::Red,
            remaining: Light::Red.duration(),
            out: out.clone(),
        }
    }

    /// One second of simulated time.
    fn tick(&mut self) {
        if self.remaining > 0 {
            self.remaining -= 1;
            narrate!(
                self.out,
                "Traffic light: {} ({}s remaining)",
                self.light.color(),
                self.remaining
            );
        } else {
            self.light = self.light.next();
            self.remaining = self.light.duration();
            narrate!(
                self.out,
                "Traffic light changed to: {} ({}s)",
                self.light.color(),
                self.remaining
            );
        }
    }
}

// =============================================================================
// Game character: open set of state objects
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Stats {
    health: u32,
    mana: u32,
    jumping: bool,
    attacking: bool,
}

impl Stats {
    fn set_mana(&mut self, mana: i64) {
        self.mana = mana.clamp(0, 100) as u32;
    }
}

/// A character state. Returning `Some(next)` asks the character to switch.
trait CharacterState {
    fn name(&self) -> &'static str;
    fn handle_input(&mut self, input: &str, stats: &mut Stats) -> Option<Box<dyn CharacterState>>;
    fn update(&mut self, stats: &mut Stats, out: &Narrator) -> Option<Box<dyn CharacterState>>;
}

struct Idle;
struct Moving {
    remaining: u32,
}
struct Jumping {
    remaining: u32,
}
struct Attacking {
    remaining: u32,
}
struct Dead;

impl CharacterState for Idle {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn handle_input(&mut self, input: &str, stats: &mut Stats) -> Option<Box<dyn CharacterState>> {
        match input {
            "move" => Some(Box::new(Moving { remaining: 3 })),
            "jump" => Some(Box::new(Jumping { remaining: 2 })),
            "attack" => Some(Box::new(Attacking { remaining: 2 })),
            "die" => {
                stats.health = 0;
                Some(Box::new(Dead))
            }
            _ => None,
        }
    }

    fn update(&mut self, stats: &mut Stats, _out: &Narrator) -> Option<Box<dyn CharacterState>> {
        stats.set_mana(i64::from(stats.mana) + 1);
        None
    }
}

impl CharacterState for Moving {
    fn name(&self) -> &'static str {
        "Moving"
    }

    fn handle_input(&mut self, input: &str, _stats: &mut Stats) -> Option<Box<dyn CharacterState>> {
        match input {
            "stop" => Some(Box::new(Idle)),
            "jump" => Some(Box::new(Jumping { remaining: 2 })),
            "attack" => Some(Box::new(Attacking { remaining: 2 })),
            _ => None,
        }
    }

    fn update(&mut self, _stats: &mut Stats, out: &Narrator) -> Option<Box<dyn CharacterState>> {
        self.remaining = self.remaining.saturating_sub(1);
        narrate!(out, "Moving... ({} seconds remaining)", self.remaining);
        (self.remaining == 0).then(|| Box::new(Idle) as Box<dyn CharacterState>)
    }
}

impl CharacterState for Jumping {
    fn name(&self) -> &'static str {
        "Jumping"
    }

    // Only an attack can interrupt a jump.
    fn handle_input(&mut self, input: &str, _stats: &mut Stats) -> Option<Box<dyn CharacterState>> {
        (input == "attack").then(|| Box::new(Attacking { remaining: 2 }) as Box<dyn CharacterState>)
    }

    fn update(&mut self, stats: &mut Stats, out: &Narrator) -> Option<Box<dyn CharacterState>> {
        stats.jumping = true;
        self.remaining = self.remaining.saturating_sub(1);
        narrate!(out, "Jumping... ({} seconds remaining)", self.remaining);
        if self.remaining == 0 {
            stats.jumping = false;
            return Some(Box::new(Idle));
        }
        None
    }
}

impl CharacterState for Attacking {
    fn name(&self) -> &'static str {
        "Attacking"
    }

    fn handle_input(
        &mut self,
        _input: &str,
        _stats: &mut Stats,
    ) -> Option<Box<dyn CharacterState>> {
        None
    }

    fn update(&mut self, stats: &mut Stats, out: &Narrator) -> Option<Box<dyn CharacterState>> {
        stats.attacking = true;
        stats.set_mana(i64::from(stats.mana) - 5);
        self.remaining = self.remaining.saturating_sub(1);
        narrate!(out, "Attacking... ({} seconds remaining)", self.remaining);
        if self.remaining == 0 {
            stats.attacking = false;
            return Some(Box::new(Idle));
        }
        None
    }
}

impl CharacterState for Dead {
    fn name(&self) -> &'static str {
        "Dead"
    }

    fn handle_input(&mut self, input: &str, stats: &mut Stats) -> Option<Box<dyn CharacterState>> {
        if input != "respawn" {
            return None;
        }
        stats.health = 100;
        stats.mana = 100;
        Some(Box::new(Idle))
    }

    fn update(&mut self, _stats: &mut Stats, _out: &Narrator) -> Option<Box<dyn CharacterState>> {
        None
    }
}

struct GameCharacter {
    state: Box<dyn CharacterState>,
    stats: Stats,
    out: Narrator,
}

impl GameCharacter {
    fn new(out: &Narrator) -> Self {
        Self {
            state: Box::new(Idle),
            stats: Stats {
                health: 100,
                mana: 100,
                jumping: false,
                attacking: false,
            },
            out: out.clone(),
        }
    }

    fn switch(&mut self, next: Option<Box<dyn CharacterState>>) {
        if let Some(next) = next {
            self.state = next;
            narrate!(self.out, "Character state: {}", self.state.name());
        }
    }

    fn handle_input(&mut self, input: &str) {
        narrate!(self.out, "Input: {input}");
        let next = self.state.handle_input(input, &mut self.stats);
        let respawned = next.is_some() && self.state.name() == "Dead";
        self.switch(next);
        if respawned {
            self.out.say("Character respawned!");
        }
    }

    fn update(&mut self) {
        let next = self.state.update(&mut self.stats, &self.out);
        self.switch(next);
    }

    fn state_name(&self) -> &'static str {
        self.state.name()
    }

    fn display_status(&self) {
        let yes_no = |flag: bool| if flag { "Yes" } else { "No" };
        narrate!(
            self.out,
            "Character Status - State: {}, Health: {}, Mana: {}, Jumping: {}, Attacking: {}",
            self.state.name(),
            self.stats.health,
            self.stats.mana,
            yes_no(self.stats.jumping),
            yes_no(self.stats.attacking)
        );
    }
}

// =============================================================================
// Demo (cargo run --bin state)
// =============================================================================

fn vending_machine_demo(out: &Narrator) -> Result<()> {
    out.section(1, "Vending Machine State Machine");
    let mut machine = VendingMachine::new(out);
    machine.display_status();

    out.blank();
    out.say("Testing vending machine operations:");
    machine.select_product(0).or_narrate(out)?;
    machine.insert_coin(100).or_narrate(out)?;
    machine.select_product(0).or_narrate(out)?;
    machine.insert_coin(75).or_narrate(out)?;
    machine.select_product(0).or_narrate(out)?;
    machine.cancel().or_narrate(out)?;
    machine.dispense().or_narrate(out)?;
    machine.display_status();

    out.blank();
    out.say("Testing cancellation:");
    machine.insert_coin(200).or_narrate(out)?;
    machine.cancel().or_narrate(out)?;
    machine.cancel().or_narrate(out)?;

    out.blank();
    out.say("Testing breakdown and repair:");
    machine.insert_coin(50).or_narrate(out)?;
    machine.break_down();
    machine.insert_coin(25).or_narrate(out)?;
    machine.reset().or_narrate(out)?;
    machine.display_status();
    Ok(())
}

fn traffic_light_demo(out: &Narrator) {
    out.section(2, "Traffic Light State Machine");
    let mut light = TrafficLight::new(out);
    out.say("Simulating traffic light for 30 seconds:");
    for _ in 0..30 {
        light.tick();
        out.pause_ms(100);
    }
}

fn game_character_demo(out: &Narrator) {
    out.section(3, "Game Character State Machine");
    let mut hero = GameCharacter::new(out);
    hero.display_status();

    out.blank();
    out.say("Simulating character actions:");
    hero.handle_input("move");
    hero.update();
    hero.handle_input("jump");
    hero.update();
    hero.update();
    hero.handle_input("attack");
    hero.update();
    hero.update();
    hero.display_status();

    out.blank();
    out.say("Killing character and respawning:");
    hero.handle_input("die");
    hero.update();
    hero.display_status();
    hero.handle_input("respawn");
    hero.display_status();
}

fn main() -> ExitCode {
    patterns::runner::run("State", |out, _config| {
        vending_machine_demo(out)?;
        traffic_light_demo(out);
        game_character_demo(out);

        out.section(4, "State Pattern Benefits");
        out.checklist(&[
            "Localizes state-specific behavior",
            "Makes state transitions explicit",
            "Eliminates large conditional statements",
            "Makes it easy to add new states",
            "Each state can maintain its own data",
        ]);
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin state)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_vending_machine_purchase_scenario() {
        let out = Narrator::capture();
        let mut machine = VendingMachine::new(&out);

        machine.insert_coin(100).unwrap();
        let rejected = machine.select_product(0).unwrap_err();
        assert_eq!(rejected.kind(), ErrorKind::PreconditionFailed);
        assert!(rejected.to_string().contains("Need $0.50 more"));
        assert_eq!(machine.state, MachineState::HasMoney);
        assert_eq!(machine.balance, 100);

        machine.insert_coin(75).unwrap();
        machine.select_product(0).unwrap();
        assert_eq!(machine.state, MachineState::Dispensing { product: 0 });
        machine.dispense().unwrap();

        assert_eq!(machine.state, MachineState::Idle);
        assert_eq!(machine.balance, 0);
        assert_eq!(machine.inventory[0], 4);
        assert_eq!(machine.refunded, 25);
        assert!(out.contains("Change returned: $0.25"));
    }

    #[test]
    fn test_state_change_line_precedes_effects() {
        let out = Narrator::capture();
        let mut machine = VendingMachine::new(&out);
        machine.insert_coin(200).unwrap();
        machine.select_product(2).unwrap();
        machine.dispense().unwrap();

        let lines = out.lines();
        let changed = lines
            .iter()
            .rposition(|line| line == "State changed to: Idle")
            .unwrap();
        let dispensing = out.position("Dispensing Water...").unwrap();
        assert!(changed < dispensing);
        let has_money = out.position("State changed to: Has Money").unwrap();
        assert!(has_money < out.position("Coin inserted").unwrap());
    }

    #[test]
    fn test_out_of_stock_never_dispenses() {
        let out = Narrator::capture();
        let mut machine = VendingMachine::new(&out);
        machine.inventory[3] = 0;
        machine.insert_coin(500).unwrap();
        let err = machine.select_product(3).unwrap_err();
        assert!(err.to_string().contains("Product out of stock: Chips"));
        assert_eq!(machine.state, MachineState::HasMoney);
    }

    #[test]
    fn test_cancel_rejections() {
        let out = Narrator::capture();
        let mut machine = VendingMachine::new(&out);
        assert_eq!(machine.cancel().unwrap_err().to_string(), "Nothing to cancel");

        machine.insert_coin(150).unwrap();
        machine.select_product(1).unwrap();
        let err = machine.cancel().unwrap_err();
        assert_eq!(err.to_string(), "Cannot cancel while dispensing");
        assert_eq!(machine.state, MachineState::Dispensing { product: 1 });
    }

    #[test]
    fn test_cancel_refunds_balance() {
        let out = Narrator::capture();
        let mut machine = VendingMachine::new(&out);
        machine.insert_coin(200).unwrap();
        machine.cancel().unwrap();
        assert_eq!(machine.state, MachineState::Idle);
        assert_eq!(machine.balance, 0);
        assert_eq!(machine.refunded, 200);
        assert!(out.contains("Transaction cancelled. Refund: $2.00"));
    }

    #[test]
    fn test_zero_coin_is_invalid_argument() {
        let out = Narrator::capture();
        let mut machine = VendingMachine::new(&out);
        let err = machine.insert_coin(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(machine.state, MachineState::Idle);
    }

    #[test]
    fn test_overflowing_coin_is_rejected() {
        let out = Narrator::capture();
        let mut machine = VendingMachine::new(&out);
        machine.insert_coin(u32::MAX - 10).unwrap();
        let err = machine.insert_coin(11).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(machine.balance, u32::MAX - 10);
        assert_eq!(machine.state, MachineState::HasMoney);
        machine.insert_coin(10).unwrap();
        assert_eq!(machine.balance, u32::MAX);
    }

    #[test]
    fn test_out_of_order_absorbs_until_reset() {
        let out = Narrator::capture();
        let mut machine = VendingMachine::new(&out);
        machine.insert_coin(50).unwrap();
        machine.break_down();
        assert_eq!(machine.refunded, 50);
        assert!(machine.insert_coin(25).is_err());
        assert!(machine.select_product(0).is_err());
        assert!(machine.dispense().is_err());
        assert_eq!(machine.state, MachineState::OutOfOrder);

        machine.reset().unwrap();
        assert_eq!(machine.state, MachineState::Idle);
        assert!(machine.reset().is_err());
    }

    #[test]
    fn test_traffic_light_cycle() {
        let out = Narrator::capture();
        let mut light = TrafficLight::new(&out);
        for _ in 0..11 {
            light.tick();
        }
        assert_eq!(light.light, Light::Green);
        assert_eq!(light.remaining, 15);
        for _ in 0..16 {
            light.tick();
        }
        assert_eq!(light.light, Light::Yellow);
        for _ in 0..4 {
            light.tick();
        }
        assert_eq!(light.light, Light::Red);
        assert!(out.contains("Traffic light changed to: YELLOW (3s)"));
    }

    #[test]
    fn test_character_transitions() {
        let out = Narrator::capture();
        let mut hero = GameCharacter::new(&out);
        hero.handle_input("jump");
        assert_eq!(hero.state_name(), "Jumping");
        hero.handle_input("move");
        assert_eq!(hero.state_name(), "Jumping");
        hero.update();
        assert!(hero.stats.jumping);
        hero.update();
        assert_eq!(hero.state_name(), "Idle");
        assert!(!hero.stats.jumping);

        hero.handle_input("attack");
        hero.handle_input("stop");
        assert_eq!(hero.state_name(), "Attacking");
        hero.update();
        hero.update();
        assert_eq!(hero.stats.mana, 90);
        assert_eq!(hero.state_name(), "Idle");
    }

    #[test]
    fn test_character_death_and_respawn() {
        let out = Narrator::capture();
        let mut hero = GameCharacter::new(&out);
        hero.handle_input("die");
        assert_eq!(hero.stats.health, 0);
        hero.handle_input("move");
        assert_eq!(hero.state_name(), "Dead");
        hero.handle_input("respawn");
        assert_eq!(hero.state_name(), "Idle");
        assert_eq!(hero.stats.health, 100);
        assert!(out.contains("Character respawned!"));
    }

    #[derive(Debug, Clone)]
    enum Event {
        Coin(u32),
        Select(usize),
        Dispense,
        Cancel,
    }

    fn event() -> impl Strategy<Value = Event> {
        prop_oneof![
            (0u32..300).prop_map(Event::Coin),
            (0usize..6).prop_map(Event::Select),
            Just(Event::Dispense),
            Just(Event::Cancel),
        ]
    }

    fn replay(events: &[Event]) -> (MachineState, u32, Vec<u32>, u32) {
        let out = Narrator::capture();
        let mut machine = VendingMachine::new(&out);
        for event in events {
            let _ = match event {
                Event::Coin(amount) => machine.insert_coin(*amount),
                Event::Select(id) => machine.select_product(*id),
                Event::Dispense => machine.dispense(),
                Event::Cancel => machine.cancel(),
            };
        }
        (machine.state, machine.balance, machine.inventory, machine.refunded)
    }

    proptest! {
        #[test]
        fn prop_final_state_depends_only_on_events(
            events in prop::collection::vec(event(), 0..40),
        ) {
            prop_assert_eq!(replay(&events), replay(&events));
        }

        #[test]
        fn prop_money_is_conserved(events in prop::collection::vec(event(), 0..40)) {
            let (_, balance, inventory, refunded) = replay(&events);
            let inserted: u32 = events
                .iter()
                .map(|e| if let Event::Coin(c) = e { *c } else { 0 })
                .sum();
            let out = Narrator::capture();
            let fresh = VendingMachine::new(&out);
            let sales: u32 = fresh
                .products
                .iter()
                .zip(fresh.inventory.iter().zip(&inventory))
                .map(|(product, (before, after))| product.price * (before - after))
                .sum();
            // Coins that were rejected never entered the machine.
            prop_assert!(balance + refunded + sales <= inserted);
        }
    }
}
