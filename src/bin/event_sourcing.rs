use patterns::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::process::ExitCode;
use uuid::Uuid;

/// Money in cents.
type Cents = i64;

fn dollars(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    format!("{sign}${}.{:02}", cents.abs() / 100, cents.abs() % 100)
}

// =============================================================================
// Events: immutable facts
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct AccountId(String);

impl AccountId {
    fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
enum EventKind {
    AccountOpened { owner: String, initial_balance: Cents },
    MoneyDeposited { amount: Cents },
    MoneyWithdrawn { amount: Cents },
    AccountClosed { final_balance: Cents },
}

impl EventKind {
    fn name(&self) -> &'static str {
        match self {
            EventKind::AccountOpened { .. } => "AccountOpened",
            EventKind::MoneyDeposited { .. } => "MoneyDeposited",
            EventKind::MoneyWithdrawn { .. } => "MoneyWithdrawn",
            EventKind::AccountClosed { .. } => "AccountClosed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Event {
    id: Uuid,
    aggregate_id: AccountId,
    timestamp: Timestamp,
    #[serde(flatten)]
    kind: EventKind,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EventKind::AccountOpened {
                owner,
                initial_balance,
            } => write!(
                f,
                "AccountOpened{{accountId={}, owner={owner}, balance={}}}",
                self.aggregate_id,
                dollars(*initial_balance)
            ),
            EventKind::MoneyDeposited { amount } => write!(
                f,
                "MoneyDeposited{{accountId={}, amount={}}}",
                self.aggregate_id,
                dollars(*amount)
            ),
            EventKind::MoneyWithdrawn { amount } => write!(
                f,
                "MoneyWithdrawn{{accountId={}, amount={}}}",
                self.aggregate_id,
                dollars(*amount)
            ),
            EventKind::AccountClosed { final_balance } => write!(
                f,
                "AccountClosed{{accountId={}, finalBalance={}}}",
                self.aggregate_id,
                dollars(*final_balance)
            ),
        }
    }
}

// =============================================================================
// Event store: append-only log
// =============================================================================

trait EventStore {
    fn append(&mut self, aggregate_id: &AccountId, events: Vec<Event>);

    /// Events for one aggregate in the order they were appended.
    fn events(&self, aggregate_id: &AccountId) -> Vec<Event>;

    /// Every stored event, ordered by timestamp; ties keep append order.
    fn all_events(&self) -> Vec<Event>;

    fn count(&self) -> usize;
}

#[derive(Default)]
struct InMemoryEventStore {
    log: Vec<Event>,
    by_aggregate: HashMap<AccountId, Vec<usize>>,
}

impl EventStore for InMemoryEventStore {
    fn append(&mut self, aggregate_id: &AccountId, events: Vec<Event>) {
        let positions = self.by_aggregate.entry(aggregate_id.clone()).or_default();
        for event in events {
            positions.push(self.log.len());
            self.log.push(event);
        }
    }

    fn events(&self, aggregate_id: &AccountId) -> Vec<Event> {
        self.by_aggregate
            .get(aggregate_id)
            .map(|positions| positions.iter().map(|&i| self.log[i].clone()).collect())
            .unwrap_or_default()
    }

    fn all_events(&self) -> Vec<Event> {
        let mut events = self.log.clone();
        events.sort_by_key(|event| event.timestamp);
        events
    }

    fn count(&self) -> usize {
        self.log.len()
    }
}

// =============================================================================
// Aggregate and projection
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
struct BankAccount {
    id: Option<AccountId>,
    owner: String,
    balance: Cents,
    closed: bool,
    version: usize,
}

impl BankAccount {
    fn apply(&mut self, event: &Event) {
        match &event.kind {
            EventKind::AccountOpened {
                owner,
                initial_balance,
            } => {
                self.id = Some(event.aggregate_id.clone());
                self.owner = owner.clone();
                self.balance = *initial_balance;
                self.closed = false;
            }
            EventKind::MoneyDeposited { amount } => self.balance += amount,
            EventKind::MoneyWithdrawn { amount } => self.balance -= amount,
            EventKind::AccountClosed { .. } => self.closed = true,
        }
        self.version += 1;
    }

    fn from_events<'a>(events: impl IntoIterator<Item = &'a Event>) -> Self {
        events.into_iter().fold(Self::default(), |mut account, event| {
            account.apply(event);
            account
        })
    }
}

impl fmt::Display for BankAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id.as_ref().map(ToString::to_string).unwrap_or_default();
        write!(
            f,
            "BankAccount{{id={id}, owner={}, balance={}, closed={}, version={}}}",
            self.owner,
            dollars(self.balance),
            self.closed,
            self.version
        )
    }
}

/// Read model built from the same events as the aggregate.
#[derive(Debug, Clone, Default, PartialEq)]
struct AccountSummary {
    owner: String,
    balance: Cents,
    total_deposits: Cents,
    total_withdrawals: Cents,
    transactions: usize,
    closed: bool,
}

impl AccountSummary {
    fn from_events(events: &[Event]) -> Self {
        let mut summary = Self::default();
        for event in events {
            match &event.kind {
                EventKind::AccountOpened {
                    owner,
                    initial_balance,
                } => {
                    summary.owner = owner.clone();
                    summary.balance = *initial_balance;
                    summary.total_deposits = *initial_balance;
                }
                EventKind::MoneyDeposited { amount } => {
                    summary.balance += amount;
                    summary.total_deposits += amount;
                }
                EventKind::MoneyWithdrawn { amount } => {
                    summary.balance -= amount;
                    summary.total_withdrawals += amount;
                }
                EventKind::AccountClosed { .. } => summary.closed = true,
            }
            summary.transactions += 1;
        }
        summary
    }
}

// =============================================================================
// Commands and the command handler
// =============================================================================

#[derive(Debug, Clone)]
enum AccountCommand {
    Open {
        id: AccountId,
        owner: String,
        initial_balance: Cents,
    },
    Deposit {
        id: AccountId,
        amount: Cents,
    },
    Withdraw {
        id: AccountId,
        amount: Cents,
    },
    Close {
        id: AccountId,
    },
}

impl AccountCommand {
    fn account_id(&self) -> &AccountId {
        match self {
            AccountCommand::Open { id, .. }
            | AccountCommand::Deposit { id, .. }
            | AccountCommand::Withdraw { id, .. }
            | AccountCommand::Close { id } => id,
        }
    }
}

/// Loads the aggregate, validates the command against it, and appends the
/// resulting events. A rejected command appends nothing.
struct CommandHandler<S: EventStore, C: Clock> {
    store: S,
    clock: C,
}

impl<S: EventStore, C: Clock> CommandHandler<S, C> {
    fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    fn handle(&mut self, command: &AccountCommand) -> Result<Vec<Event>> {
        let id = command.account_id();
        let history = self.store.events(id);
        let account = BankAccount::from_events(&history);
        let kinds = Self::decide(&account, !history.is_empty(), command)?;

        let events: Vec<Event> = kinds
            .into_iter()
            .map(|kind| Event {
                id: Uuid::new_v4(),
                aggregate_id: id.clone(),
                timestamp: self.clock.now(),
                kind,
            })
            .collect();
        tracing::debug!(account = %id, count = events.len(), "appending events");
        self.store.append(id, events.clone());
        Ok(events)
    }

    /// Business rules. Pure: given the current state, which events follow.
    fn decide(
        account: &BankAccount,
        exists: bool,
        command: &AccountCommand,
    ) -> Result<Vec<EventKind>> {
        match command {
            AccountCommand::Open {
                owner,
                initial_balance,
                ..
            } => {
                if *initial_balance < 0 {
                    return Err(PatternError::invalid_argument(
                        "Initial balance cannot be negative",
                    ));
                }
                if exists {
                    return Err(PatternError::precondition("Account already exists"));
                }
                Ok(vec![EventKind::AccountOpened {
                    owner: owner.clone(),
                    initial_balance: *initial_balance,
                }])
            }
            AccountCommand::Deposit { amount, .. } => {
                if *amount <= 0 {
                    return Err(PatternError::invalid_argument("Deposit amount must be positive"));
                }
                Self::ensure_open(account, exists, "deposit to")?;
                Ok(vec![EventKind::MoneyDeposited { amount: *amount }])
            }
            AccountCommand::Withdraw { amount, .. } => {
                if *amount <= 0 {
                    return Err(PatternError::invalid_argument(
                        "Withdrawal amount must be positive",
                    ));
                }
                Self::ensure_open(account, exists, "withdraw from")?;
                if account.balance < *amount {
                    return Err(PatternError::precondition("Insufficient funds"));
                }
                Ok(vec![EventKind::MoneyWithdrawn { amount: *amount }])
            }
            AccountCommand::Close { .. } => {
                if !exists {
                    return Err(PatternError::not_found("Account does not exist"));
                }
                if account.closed {
                    return Err(PatternError::precondition("Account is already closed"));
                }
                Ok(vec![EventKind::AccountClosed {
                    final_balance: account.balance,
                }])
            }
        }
    }

    fn ensure_open(account: &BankAccount, exists: bool, action: &str) -> Result<()> {
        if !exists {
            return Err(PatternError::not_found("Account does not exist"));
        }
        if account.closed {
            return Err(PatternError::precondition(format!(
                "Cannot {action} closed account"
            )));
        }
        Ok(())
    }

    fn account(&self, id: &AccountId) -> Option<BankAccount> {
        let events = self.store.events(id);
        (!events.is_empty()).then(|| BankAccount::from_events(&events))
    }

    /// State as it was after the first `version` events.
    fn account_at(&self, id: &AccountId, version: usize) -> Option<BankAccount> {
        let events = self.store.events(id);
        (version > 0 && version <= events.len())
            .then(|| BankAccount::from_events(&events[..version]))
    }

    fn summary(&self, id: &AccountId) -> AccountSummary {
        AccountSummary::from_events(&self.store.events(id))
    }

    fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.store.all_events())?)
    }
}

// =============================================================================
// Demo (cargo run --bin event_sourcing)
// =============================================================================

fn run_command<S: EventStore, C: Clock>(
    handler: &mut CommandHandler<S, C>,
    command: AccountCommand,
    success: &str,
    out: &Narrator,
) -> Result<()> {
    match handler.handle(&command) {
        Ok(_) => narrate!(out, "✓ {success}"),
        Err(err) if err.is_fatal() => return Err(err),
        Err(err) => {
            tracing::debug!(?command, %err, "command rejected");
            narrate!(out, "✗ {success} failed: {err}");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Event Sourcing", |out, _config| {
        let mut bank = CommandHandler::new(InMemoryEventStore::default(), SystemClock);
        let alice = AccountId::generate();
        let bob = AccountId::generate();

        out.section(1, "Opening bank accounts");
        run_command(
            &mut bank,
            AccountCommand::Open {
                id: alice.clone(),
                owner: "Alice Johnson".to_string(),
                initial_balance: 100_000,
            },
            &format!("Account opened for Alice Johnson (ID: {alice})"),
            out,
        )?;
        run_command(
            &mut bank,
            AccountCommand::Open {
                id: bob.clone(),
                owner: "Bob Smith".to_string(),
                initial_balance: 50_000,
            },
            &format!("Account opened for Bob Smith (ID: {bob})"),
            out,
        )?;

        out.section(2, "Performing transactions");
        let transactions = [
            (AccountCommand::Deposit { id: alice.clone(), amount: 25_000 }, "Alice deposited $250"),
            (AccountCommand::Withdraw { id: bob.clone(), amount: 10_000 }, "Bob withdrew $100"),
            (AccountCommand::Deposit { id: alice.clone(), amount: 50_000 }, "Alice deposited $500"),
        ];
        for (command, success) in transactions {
            run_command(&mut bank, command, success, out)?;
            out.pause_ms(10);
        }

        out.section(3, "Current account states");
        for (label, id) in [("Alice", &alice), ("Bob", &bob)] {
            if let Some(account) = bank.account(id) {
                narrate!(out, "{label}'s account: {}", dollars(account.balance));
                narrate!(out, "  {account}");
            }
        }

        out.section(4, "Event history (Alice's account)");
        for (index, event) in bank.store.events(&alice).iter().enumerate() {
            narrate!(out, "Event {}: {}", index + 1, event.kind.name());
            narrate!(out, "  {event}");
        }

        out.section(5, "Account summary (projection)");
        let summary = bank.summary(&alice);
        out.say("Alice's Summary:");
        narrate!(out, "  Total deposits: {}", dollars(summary.total_deposits));
        narrate!(out, "  Total withdrawals: {}", dollars(summary.total_withdrawals));
        narrate!(out, "  Transaction count: {}", summary.transactions);
        narrate!(out, "  Current balance: {}", dollars(summary.balance));

        out.section(6, "Testing business rules");
        run_command(
            &mut bank,
            AccountCommand::Withdraw { id: alice.clone(), amount: 1_000_000 },
            "Large withdrawal",
            out,
        )?;
        run_command(
            &mut bank,
            AccountCommand::Close { id: bob.clone() },
            "Bob's account closed",
            out,
        )?;
        run_command(
            &mut bank,
            AccountCommand::Deposit { id: bob.clone(), amount: 5_000 },
            "Deposit to closed account",
            out,
        )?;
        run_command(
            &mut bank,
            AccountCommand::Open {
                id: alice.clone(),
                owner: "Mallory".to_string(),
                initial_balance: 0,
            },
            "Reopening Alice's account",
            out,
        )?;
        run_command(
            &mut bank,
            AccountCommand::Deposit { id: AccountId::new("ghost"), amount: 100 },
            "Deposit to unknown account",
            out,
        )?;

        out.section(7, "Time travel");
        for version in 1..=3 {
            if let Some(account) = bank.account_at(&alice, version) {
                narrate!(out, "Alice after {version} event(s): {}", dollars(account.balance));
            }
        }

        out.section(8, "All events in chronological order");
        let all = bank.store.all_events();
        let origin = all.first().map(|event| event.timestamp).unwrap_or_default();
        for (index, event) in all.iter().enumerate() {
            narrate!(
                out,
                "{}. +{}ms - {}",
                index + 1,
                event.timestamp - origin,
                event.kind.name()
            );
        }
        narrate!(out, "Total events stored: {}", bank.store.count());

        out.section(9, "Exported event log (JSON)");
        let json = bank.export_json()?;
        narrate!(out, "{} bytes of JSON; first event:", json.len());
        if let Some(first) = all.first() {
            out.say(serde_json::to_string(first)?);
        }

        out.blank();
        out.say("✅ Event Sourcing provides a complete audit trail and allows");
        out.say("   reconstruction of state at any point in time!");
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin event_sourcing)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bank() -> (CommandHandler<InMemoryEventStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new(1_000);
        (
            CommandHandler::new(InMemoryEventStore::default(), clock.clone()),
            clock,
        )
    }

    fn acc1() -> AccountId {
        AccountId::new("acc1")
    }

    fn open(id: AccountId, owner: &str, initial_balance: Cents) -> AccountCommand {
        AccountCommand::Open {
            id,
            owner: owner.to_string(),
            initial_balance,
        }
    }

    #[test]
    fn test_bank_account_scenario() {
        let (mut bank, clock) = bank();
        let id = acc1();
        let commands = vec![
            AccountCommand::Open { id: id.clone(), owner: "Alice".into(), initial_balance: 1000 },
            AccountCommand::Deposit { id: id.clone(), amount: 250 },
            AccountCommand::Deposit { id: id.clone(), amount: 500 },
            AccountCommand::Withdraw { id: id.clone(), amount: 1000 },
            AccountCommand::Withdraw { id: id.clone(), amount: 1000 },
            AccountCommand::Close { id: id.clone() },
            AccountCommand::Deposit { id: id.clone(), amount: 50 },
        ];
        let outcomes: Vec<Result<Vec<Event>>> = commands
            .iter()
            .map(|command| {
                clock.advance(10);
                bank.handle(command)
            })
            .collect();

        let accepted: Vec<bool> = outcomes.iter().map(|outcome| outcome.is_ok()).collect();
        assert_eq!(accepted, vec![true, true, true, true, false, true, false]);
        match &outcomes[4] {
            Err(err) => assert_eq!(err.to_string(), "Insufficient funds"),
            Ok(_) => panic!("overdraft accepted"),
        }
        match &outcomes[6] {
            Err(err) => assert_eq!(err.to_string(), "Cannot deposit to closed account"),
            Ok(_) => panic!("deposit to closed account accepted"),
        }

        let account = bank.account(&id).unwrap();
        assert_eq!(account.balance, 750);
        assert!(account.closed);
        assert_eq!(bank.store.count(), 5);
    }

    #[test]
    fn test_withdrawing_exact_balance_leaves_zero() {
        let (mut bank, _) = bank();
        bank.handle(&open(acc1(), "A", 300)).unwrap();
        bank.handle(&AccountCommand::Withdraw { id: acc1(), amount: 300 }).unwrap();
        assert_eq!(bank.account(&acc1()).unwrap().balance, 0);
    }

    #[test]
    fn test_rule_violations_append_nothing() {
        let (mut bank, _) = bank();
        let negative = bank
            .handle(&open(acc1(), "A", -1))
            .unwrap_err();
        assert_eq!(negative.kind(), ErrorKind::InvalidArgument);
        assert_eq!(bank.store.count(), 0);

        bank.handle(&open(acc1(), "A", 0)).unwrap();
        assert!(bank
            .handle(&open(acc1(), "B", 0))
            .is_err());
        assert!(bank.handle(&AccountCommand::Deposit { id: acc1(), amount: 0 }).is_err());
        assert_eq!(
            bank.handle(&AccountCommand::Close { id: AccountId::new("nope") })
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(bank.store.count(), 1);
    }

    #[test]
    fn test_events_are_returned_in_append_order_per_aggregate() {
        let (mut bank, clock) = bank();
        let a = AccountId::new("a");
        let b = AccountId::new("b");
        bank.handle(&open(a.clone(), "A", 1)).unwrap();
        clock.advance(5);
        bank.handle(&open(b.clone(), "B", 1)).unwrap();
        clock.advance(5);
        bank.handle(&AccountCommand::Deposit { id: a.clone(), amount: 2 }).unwrap();

        let names: Vec<&str> = bank.store.events(&a).iter().map(|e| e.kind.name()).collect();
        assert_eq!(names, vec!["AccountOpened", "MoneyDeposited"]);

        let order: Vec<String> = bank
            .store
            .all_events()
            .iter()
            .map(|e| e.aggregate_id.to_string())
            .collect();
        assert_eq!(order, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_all_events_sorted_by_timestamp_with_stable_ties() {
        let mut store = InMemoryEventStore::default();
        let event = |id: &str, timestamp, amount| Event {
            id: Uuid::new_v4(),
            aggregate_id: AccountId::new(id),
            timestamp,
            kind: EventKind::MoneyDeposited { amount },
        };
        store.append(&AccountId::new("x"), vec![event("x", 30, 1), event("x", 10, 2)]);
        store.append(&AccountId::new("y"), vec![event("y", 10, 3)]);

        let amounts: Vec<Cents> = store
            .all_events()
            .iter()
            .map(|e| match e.kind {
                EventKind::MoneyDeposited { amount } => amount,
                _ => 0,
            })
            .collect();
        assert_eq!(amounts, vec![2, 3, 1]);
    }

    #[test]
    fn test_projection_and_time_travel() {
        let (mut bank, _) = bank();
        bank.handle(&open(acc1(), "Alice", 1000)).unwrap();
        bank.handle(&AccountCommand::Deposit { id: acc1(), amount: 250 }).unwrap();
        bank.handle(&AccountCommand::Withdraw { id: acc1(), amount: 100 }).unwrap();

        let summary = bank.summary(&acc1());
        assert_eq!(summary.total_deposits, 1250);
        assert_eq!(summary.total_withdrawals, 100);
        assert_eq!(summary.transactions, 3);
        assert_eq!(summary.balance, bank.account(&acc1()).unwrap().balance);

        assert_eq!(bank.account_at(&acc1(), 2).unwrap().balance, 1250);
        assert!(bank.account_at(&acc1(), 0).is_none());
        assert!(bank.account_at(&acc1(), 4).is_none());
    }

    #[test]
    fn test_json_export_round_trips() {
        let (mut bank, _) = bank();
        bank.handle(&open(acc1(), "Alice", 10)).unwrap();
        bank.handle(&AccountCommand::Close { id: acc1() }).unwrap();

        let json = bank.export_json().unwrap();
        assert!(json.contains("\"type\": \"AccountClosed\""));
        let decoded: Vec<Event> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, bank.store.all_events());
    }

    fn command() -> impl Strategy<Value = AccountCommand> {
        let id = || prop_oneof![Just(AccountId::new("a")), Just(AccountId::new("b"))];
        prop_oneof![
            (id(), -50i64..500).prop_map(|(id, initial_balance)| AccountCommand::Open {
                id,
                owner: "owner".into(),
                initial_balance
            }),
            (id(), -50i64..500).prop_map(|(id, amount)| AccountCommand::Deposit { id, amount }),
            (id(), -50i64..500).prop_map(|(id, amount)| AccountCommand::Withdraw { id, amount }),
            id().prop_map(|id| AccountCommand::Close { id }),
        ]
    }

    proptest! {
        #[test]
        fn prop_replay_matches_write_model(commands in prop::collection::vec(command(), 0..40)) {
            let (mut bank, clock) = bank();
            for command in &commands {
                let id = command.account_id().clone();
                let before = bank.account(&id).unwrap_or_default();
                clock.advance(1);
                if let Ok(events) = bank.handle(command) {
                    let mut expected = before;
                    for event in &events {
                        expected.apply(event);
                    }
                    prop_assert_eq!(bank.account(&id), Some(expected));
                }
                if let Some(account) = bank.account(&id) {
                    prop_assert!(account.balance >= 0);
                }
            }
        }
    }
}
