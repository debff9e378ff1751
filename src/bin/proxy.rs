use patterns::prelude::*;
use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashMap;
use std::process::ExitCode;
use std::rc::Rc;

fn dollars(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{sign}${}.{:02}", cents / 100, cents % 100)
}

// =============================================================================
// 1. Virtual proxy: lazy image loading
// =============================================================================

trait Image {
    fn file_name(&self) -> &str;
    fn file_size(&self) -> u64;
    fn display(&self);
}

struct RealImage {
    file_name: String,
    file_size: u64,
    out: Narrator,
}

impl RealImage {
    /// The expensive part: reading the file.
    fn load(file_name: &str, out: &Narrator) -> Self {
        narrate!(out, "Loading image from disk: {file_name}");
        out.pause_ms(300);
        let file_size = file_name.bytes().map(u64::from).sum::<u64>() * 100;
        narrate!(out, "Image loaded: {file_name} ({file_size} bytes)");
        Self {
            file_name: file_name.to_string(),
            file_size,
            out: out.clone(),
        }
    }
}

impl Image for RealImage {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn file_size(&self) -> u64 {
        self.file_size
    }

    fn display(&self) {
        narrate!(self.out, "Displaying image: {} ({} bytes)", self.file_name, self.file_size);
    }
}

struct ImageProxy {
    file_name: String,
    real: OnceCell<RealImage>,
    out: Narrator,
}

impl ImageProxy {
    fn new(file_name: &str, out: &Narrator) -> Self {
        Self {
            file_name: file_name.to_string(),
            real: OnceCell::new(),
            out: out.clone(),
        }
    }

    fn is_loaded(&self) -> bool {
        self.real.get().is_some()
    }
}

impl Image for ImageProxy {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Metadata only: answers from an estimate until the image is loaded.
    fn file_size(&self) -> u64 {
        match self.real.get() {
            Some(real) => real.file_size(),
            None => self.file_name.len() as u64 * 1024,
        }
    }

    fn display(&self) {
        let real = self.real.get_or_init(|| {
            self.out.say("Proxy: Creating real image on first access");
            RealImage::load(&self.file_name, &self.out)
        });
        real.display();
    }
}

// =============================================================================
// 2. Protection proxy: role-based access to an account
// =============================================================================

trait BankAccount {
    fn deposit(&mut self, cents: i64) -> bool;
    fn withdraw(&mut self, cents: i64) -> bool;
    fn balance(&self) -> i64;
    fn account_number(&self) -> String;
}

struct RealBankAccount {
    number: String,
    balance: i64,
    out: Narrator,
}

impl RealBankAccount {
    fn new(number: &str, balance: i64, out: &Narrator) -> Self {
        Self {
            number: number.to_string(),
            balance,
            out: out.clone(),
        }
    }
}

impl BankAccount for RealBankAccount {
    fn deposit(&mut self, cents: i64) -> bool {
        if cents <= 0 {
            narrate!(self.out, "❌ Invalid argument: deposit must be positive");
            return false;
        }
        self.balance += cents;
        narrate!(self.out, "Deposited {}. New balance: {}", dollars(cents), dollars(self.balance));
        true
    }

    fn withdraw(&mut self, cents: i64) -> bool {
        if cents <= 0 || cents > self.balance {
            narrate!(self.out, "Insufficient funds. Current balance: {}", dollars(self.balance));
            return false;
        }
        self.balance -= cents;
        narrate!(self.out, "Withdrew {}. New balance: {}", dollars(cents), dollars(self.balance));
        true
    }

    fn balance(&self) -> i64 {
        self.balance
    }

    fn account_number(&self) -> String {
        self.number.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Customer,
    Employee,
    Administrator,
    Auditor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Deposit,
    Withdraw,
    ViewBalance,
    ViewAccountNumber,
}

impl Operation {
    fn describe(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdrawal",
            Self::ViewBalance => "view balance",
            Self::ViewAccountNumber => "view account number",
        }
    }
}

/// The access policy, kept apart from the proxy that enforces it.
fn permits(role: Role, operation: Operation) -> bool {
    use Operation::*;
    match role {
        Role::Administrator => true,
        Role::Customer => matches!(operation, Deposit | Withdraw | ViewBalance),
        Role::Employee => matches!(operation, Deposit | ViewBalance | ViewAccountNumber),
        Role::Auditor => matches!(operation, ViewAccountNumber),
    }
}

const BALANCE_DENIED: i64 = -1;
const NUMBER_HIDDEN: &str = "***HIDDEN***";

struct ProtectionProxy<A: BankAccount> {
    real: A,
    role: Role,
    user: String,
    out: Narrator,
}

impl<A: BankAccount> ProtectionProxy<A> {
    fn new(real: A, role: Role, user: &str, out: &Narrator) -> Self {
        Self {
            real,
            role,
            user: user.to_string(),
            out: out.clone(),
        }
    }

    fn check(&self, operation: Operation) -> Result<()> {
        narrate!(
            self.out,
            "[Security] Checking permission for {} ({:?}) to perform: {}",
            self.user,
            self.role,
            operation.describe()
        );
        if permits(self.role, operation) {
            return Ok(());
        }
        let err = PatternError::access_denied(format!(
            "Insufficient permissions for {}",
            operation.describe()
        ));
        tracing::warn!(user = %self.user, role = ?self.role, ?operation, "access denied");
        narrate!(self.out, "❌ {err}");
        Err(err)
    }
}

impl<A: BankAccount> BankAccount for ProtectionProxy<A> {
    fn deposit(&mut self, cents: i64) -> bool {
        self.check(Operation::Deposit).is_ok() && self.real.deposit(cents)
    }

    fn withdraw(&mut self, cents: i64) -> bool {
        self.check(Operation::Withdraw).is_ok() && self.real.withdraw(cents)
    }

    fn balance(&self) -> i64 {
        match self.check(Operation::ViewBalance) {
            Ok(()) => self.real.balance(),
            Err(_) => BALANCE_DENIED,
        }
    }

    fn account_number(&self) -> String {
        match self.check(Operation::ViewAccountNumber) {
            Ok(()) => self.real.account_number(),
            Err(_) => NUMBER_HIDDEN.to_string(),
        }
    }
}

// =============================================================================
// 3. Caching proxy: TTL cache in front of a slow service
// =============================================================================

trait WebService {
    fn fetch(&mut self, url: &str) -> String;
}

struct RealWebService {
    calls: u32,
    out: Narrator,
}

impl WebService for RealWebService {
    fn fetch(&mut self, url: &str) -> String {
        self.calls += 1;
        narrate!(self.out, "Fetching data from: {url}");
        self.out.pause_ms(500);
        format!("Data from {url} (request #{})", self.calls)
    }
}

struct CacheEntry {
    body: String,
    stored_at: Timestamp,
}

struct CachingProxy<S, C> {
    real: S,
    clock: C,
    ttl_ms: u64,
    cache: HashMap<String, CacheEntry>,
    out: Narrator,
}

impl<S: WebService, C: Clock> CachingProxy<S, C> {
    fn new(real: S, clock: C, ttl_ms: u64, out: &Narrator) -> Self {
        Self {
            real,
            clock,
            ttl_ms,
            cache: HashMap::new(),
            out: out.clone(),
        }
    }

    fn clear_cache(&mut self) {
        self.cache.clear();
        self.out.say("Cache cleared");
    }

    fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

impl<S: WebService, C: Clock> WebService for CachingProxy<S, C> {
    fn fetch(&mut self, url: &str) -> String {
        let now = self.clock.now();
        if let Some(entry) = self.cache.get(url) {
            if now.saturating_sub(entry.stored_at) < self.ttl_ms {
                tracing::debug!(url, "cache hit");
                narrate!(self.out, "Cache hit! Returning cached data for: {url}");
                return entry.body.clone();
            }
            tracing::debug!(url, "cache entry expired");
        }

        self.out.say("Cache miss. Fetching fresh data...");
        let body = self.real.fetch(url);
        self.cache.insert(
            url.to_string(),
            CacheEntry {
                body: body.clone(),
                stored_at: now,
            },
        );
        body
    }
}

// =============================================================================
// 4. Remote proxy: lazy connection, one retry, idempotent disconnect
// =============================================================================

trait Database {
    fn connect(&mut self) -> Result<()>;
    fn disconnect(&mut self) -> bool;
    fn query(&mut self, sql: &str) -> Result<String>;
}

/// Injected misbehaviour of the simulated server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    None,
    /// The connection drops after this many successful queries.
    DropAfter(u32),
    /// Every query fails.
    Down,
}

struct RemoteDatabase {
    address: String,
    connected: bool,
    fault: Fault,
    served: u32,
    attempts: u32,
    connections: u32,
    out: Narrator,
}

impl RemoteDatabase {
    fn new(address: &str, fault: Fault, out: &Narrator) -> Self {
        Self {
            address: address.to_string(),
            connected: false,
            fault,
            served: 0,
            attempts: 0,
            connections: 0,
            out: out.clone(),
        }
    }
}

impl Database for RemoteDatabase {
    fn connect(&mut self) -> Result<()> {
        narrate!(self.out, "Connecting to database server: {}", self.address);
        self.out.pause_ms(1500);
        self.connected = true;
        self.connections += 1;
        self.out.say("Connected successfully!");
        Ok(())
    }

    fn disconnect(&mut self) -> bool {
        if !self.connected {
            return false;
        }
        self.connected = false;
        self.out.say("Disconnecting from database server");
        true
    }

    fn query(&mut self, sql: &str) -> Result<String> {
        self.attempts += 1;
        if !self.connected {
            return Err(PatternError::precondition("Not connected to database"));
        }
        match self.fault {
            Fault::Down => return Err(PatternError::precondition("Server unavailable")),
            Fault::DropAfter(limit) if self.served >= limit => {
                self.connected = false;
                self.fault = Fault::None;
                return Err(PatternError::precondition("Connection reset by server"));
            }
            _ => {}
        }
        narrate!(self.out, "Executing query: {sql}");
        self.out.pause_ms(800);
        self.served += 1;
        Ok(format!("Query result for: {sql}"))
    }
}

struct DatabaseProxy {
    address: String,
    fault: Fault,
    auto_connect: bool,
    remote: Option<RemoteDatabase>,
    out: Narrator,
}

impl DatabaseProxy {
    fn new(address: &str, auto_connect: bool, out: &Narrator) -> Self {
        Self {
            address: address.to_string(),
            fault: Fault::None,
            auto_connect,
            remote: None,
            out: out.clone(),
        }
    }

    fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = fault;
        self
    }

    fn remote(&mut self) -> &mut RemoteDatabase {
        let (address, fault, out) = (&self.address, self.fault, &self.out);
        self.remote
            .get_or_insert_with(|| RemoteDatabase::new(address, fault, out))
    }

    fn is_connected(&self) -> bool {
        self.remote.as_ref().is_some_and(|remote| remote.connected)
    }
}

impl Database for DatabaseProxy {
    fn connect(&mut self) -> Result<()> {
        self.remote().connect()
    }

    /// Safe to call any number of times; only a live connection is closed.
    fn disconnect(&mut self) -> bool {
        match self.remote.as_mut() {
            Some(remote) => remote.disconnect(),
            None => false,
        }
    }

    fn query(&mut self, sql: &str) -> Result<String> {
        if !self.is_connected() {
            if !self.auto_connect {
                return Err(PatternError::precondition("Not connected to database"));
            }
            self.out.say("Proxy: Auto-connecting to database...");
            self.connect()?;
        }

        match self.remote().query(sql) {
            Ok(result) => Ok(result),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                tracing::warn!(%err, sql, "query failed, retrying once");
                narrate!(self.out, "Proxy: Query failed ({err}), attempting to reconnect...");
                self.remote().disconnect();
                self.connect()?;
                self.remote().query(sql)
            }
        }
    }
}

// =============================================================================
// 5. Smart proxy: intrusive reference count
// =============================================================================

struct Shared<T> {
    refs: Cell<usize>,
    value: RefCell<Option<(T, Lifeline)>>,
    out: Narrator,
}

/// Handle whose clones share one count; the last drop frees the target.
struct SmartProxy<T> {
    shared: Rc<Shared<T>>,
}

impl<T> SmartProxy<T> {
    fn new(value: T, census: &Census, out: &Narrator) -> Self {
        let lifeline = census.enroll("smart proxy target");
        let proxy = Self {
            shared: Rc::new(Shared {
                refs: Cell::new(1),
                value: RefCell::new(Some((value, lifeline))),
                out: out.clone(),
            }),
        };
        narrate!(out, "SmartProxy created, ref count: 1");
        proxy
    }

    fn ref_count(&self) -> usize {
        self.shared.refs.get()
    }

    fn with<R>(&self, read: impl FnOnce(&T) -> R) -> Result<R> {
        match self.shared.value.borrow().as_ref() {
            Some((value, _)) => Ok(read(value)),
            None => Err(PatternError::fatal("smart proxy used after release")),
        }
    }
}

impl<T> Clone for SmartProxy<T> {
    fn clone(&self) -> Self {
        let refs = self.shared.refs.get() + 1;
        self.shared.refs.set(refs);
        narrate!(self.shared.out, "SmartProxy copied, ref count: {refs}");
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T> Drop for SmartProxy<T> {
    fn drop(&mut self) {
        let refs = self.shared.refs.get().saturating_sub(1);
        self.shared.refs.set(refs);
        narrate!(self.shared.out, "SmartProxy released, ref count: {refs}");
        if refs == 0 {
            if let Some(target) = self.shared.value.borrow_mut().take() {
                drop(target);
                self.shared.out.say("Object deleted");
            }
        }
    }
}

// =============================================================================
// Demo (cargo run --bin proxy)
// =============================================================================

fn virtual_demo(out: &Narrator) {
    out.section(1, "Virtual Proxy - Lazy Loading Images");

    let images: Vec<Box<dyn Image>> = ["photo1.jpg", "photo2.jpg", "photo3.jpg"]
        .into_iter()
        .map(|name| Box::new(ImageProxy::new(name, out)) as Box<dyn Image>)
        .collect();

    out.blank();
    out.say("Images created (but not loaded yet)");
    out.blank();
    out.say("Displaying first image:");
    images[0].display();
    out.blank();
    out.say("Displaying first image again (already loaded):");
    images[0].display();

    out.blank();
    out.say("Checking file sizes:");
    for image in &images {
        narrate!(out, "{}: {} bytes", image.file_name(), image.file_size());
    }
}

fn protection_demo(out: &Narrator) {
    out.section(2, "Protection Proxy - Bank Account Security");

    out.blank();
    out.say("Customer Access:");
    let mut customer = ProtectionProxy::new(
        RealBankAccount::new("ACC-123456", 100_000, out),
        Role::Customer,
        "john_doe",
        out,
    );
    narrate!(out, "Balance: {}", dollars(customer.balance()));
    customer.deposit(10_000);
    customer.withdraw(5_000);
    narrate!(out, "Account Number: {}", customer.account_number());

    out.blank();
    out.say("Employee Access:");
    let mut employee = ProtectionProxy::new(
        RealBankAccount::new("ACC-789012", 200_000, out),
        Role::Employee,
        "jane_smith",
        out,
    );
    narrate!(out, "Balance: {}", dollars(employee.balance()));
    employee.deposit(20_000);
    employee.withdraw(10_000);
    narrate!(out, "Account Number: {}", employee.account_number());

    out.blank();
    out.say("Auditor Access:");
    let auditor = ProtectionProxy::new(
        RealBankAccount::new("ACC-345678", 50_000, out),
        Role::Auditor,
        "audit_bot",
        out,
    );
    narrate!(out, "Balance (raw sentinel): {}", auditor.balance());
    narrate!(out, "Account Number: {}", auditor.account_number());
}

fn caching_demo(out: &Narrator) {
    out.section(3, "Caching Proxy - Web Service");

    let clock = ManualClock::new(0);
    let real = RealWebService {
        calls: 0,
        out: out.clone(),
    };
    let mut proxy = CachingProxy::new(real, clock.clone(), 5_000, out);

    out.blank();
    out.say("First request:");
    proxy.fetch("https://api.example.com/users");
    out.blank();
    out.say("Second request (should hit cache):");
    proxy.fetch("https://api.example.com/users");
    out.blank();
    out.say("Different URL:");
    proxy.fetch("https://api.example.com/posts");

    out.blank();
    out.say("Six seconds later (entry expired):");
    clock.advance(6_000);
    let body = proxy.fetch("https://api.example.com/users");
    narrate!(out, "Received: {body}");

    out.blank();
    narrate!(out, "Cache size: {}", proxy.cache_size());
    narrate!(out, "Real service calls: {}", proxy.real.calls);
    proxy.clear_cache();
}

fn remote_demo(out: &Narrator) -> Result<()> {
    out.section(4, "Remote Proxy - Database Connection");

    let db = RefCell::new(
        DatabaseProxy::new("db.example.com:5432", true, out).with_fault(Fault::DropAfter(1)),
    );
    // Whatever happens below, the connection is closed on the way out.
    let _hang_up = ScopeGuard::new(|| {
        if db.borrow_mut().disconnect() {
            tracing::debug!("connection closed by scope guard");
        }
    });

    out.blank();
    out.say("Executing queries through proxy:");
    let first = db.borrow_mut().query("SELECT * FROM users")?;
    narrate!(out, "Result: {first}");
    let second = db.borrow_mut().query("SELECT * FROM orders WHERE user_id = 1")?;
    narrate!(out, "Result: {second}");

    out.blank();
    out.say("Disconnecting twice:");
    let closed = db.borrow_mut().disconnect();
    let closed_again = db.borrow_mut().disconnect();
    narrate!(out, "First disconnect closed a connection: {closed}");
    narrate!(out, "Second disconnect closed a connection: {closed_again}");

    out.blank();
    out.say("Proxy without auto-connect:");
    let mut manual = DatabaseProxy::new("replica.example.com:5432", false, out);
    manual.query("SELECT 1").or_narrate(out)?;
    Ok(())
}

fn smart_demo(out: &Narrator) -> Result<()> {
    out.section(5, "Smart Proxy - Reference Counting");

    let census = Census::new();
    {
        let first = SmartProxy::new(String::from("Hello, World!"), &census, out);
        narrate!(out, "proxy1 content: {}", first.with(|text| text.clone())?);
        {
            let second = first.clone();
            narrate!(out, "proxy2 content: {}", second.with(|text| text.clone())?);
            narrate!(out, "Reference count: {}", second.ref_count());
        }
        narrate!(out, "After proxy2 destruction, ref count: {}", first.ref_count());
    }
    census.ensure_all_released()?;
    narrate!(out, "Targets freed: {} of {}", census.released(), census.allocated());
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Proxy", |out, _config| {
        virtual_demo(out);
        protection_demo(out);
        caching_demo(out);
        remote_demo(out)?;
        smart_demo(out)?;

        out.section(6, "Proxy Pattern Benefits");
        out.checklist(&[
            "Virtual Proxy: Lazy loading saves memory and startup time",
            "Protection Proxy: Controls access based on user permissions",
            "Caching Proxy: Improves performance by avoiding redundant operations",
            "Remote Proxy: Hides complexity of remote communication",
            "Smart Proxy: Adds automatic memory management",
        ]);
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin proxy)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_does_not_force_loading() {
        let out = Narrator::capture();
        let image = ImageProxy::new("cat.png", &out);
        assert_eq!(image.file_name(), "cat.png");
        assert_eq!(image.file_size(), 7 * 1024);
        assert!(!image.is_loaded());
        assert!(out.is_empty());
    }

    #[test]
    fn test_display_loads_exactly_once() {
        let out = Narrator::capture();
        let image = ImageProxy::new("cat.png", &out);
        image.display();
        image.display();
        assert!(image.is_loaded());
        assert_eq!(out.count("Loading image from disk: cat.png"), 1);
        assert_eq!(out.count("Displaying image: cat.png"), 2);
        assert_ne!(image.file_size(), 7 * 1024);
    }

    #[test]
    fn test_policy_table() {
        assert!(permits(Role::Customer, Operation::Withdraw));
        assert!(!permits(Role::Customer, Operation::ViewAccountNumber));
        assert!(!permits(Role::Employee, Operation::Withdraw));
        assert!(permits(Role::Employee, Operation::ViewAccountNumber));
        assert!(!permits(Role::Auditor, Operation::ViewBalance));
        assert!(permits(Role::Administrator, Operation::Withdraw));
    }

    #[test]
    fn test_denied_operations_return_sentinels() {
        let out = Narrator::capture();
        let mut auditor = ProtectionProxy::new(
            RealBankAccount::new("ACC-1", 5_000, &out),
            Role::Auditor,
            "bot",
            &out,
        );
        assert_eq!(auditor.balance(), BALANCE_DENIED);
        assert!(!auditor.deposit(100));
        assert!(!auditor.withdraw(100));
        assert_eq!(auditor.real.balance(), 5_000);
        assert_eq!(auditor.account_number(), "ACC-1");
        assert!(out.contains("❌ Access denied: Insufficient permissions for view balance"));
        assert!(out.contains("❌ Access denied: Insufficient permissions for deposit"));
    }

    #[test]
    fn test_allowed_operations_delegate() {
        let out = Narrator::capture();
        let mut customer = ProtectionProxy::new(
            RealBankAccount::new("ACC-2", 10_000, &out),
            Role::Customer,
            "ann",
            &out,
        );
        assert!(customer.deposit(2_500));
        assert!(customer.withdraw(12_500));
        assert_eq!(customer.balance(), 0);
        assert!(!customer.withdraw(1));
        assert_eq!(customer.account_number(), NUMBER_HIDDEN);
        assert!(out.contains("Insufficient funds. Current balance: $0.00"));
    }

    #[test]
    fn test_cache_calls_real_service_once_within_ttl() {
        let out = Narrator::capture();
        let clock = ManualClock::new(1_000);
        let real = RealWebService {
            calls: 0,
            out: out.clone(),
        };
        let mut proxy = CachingProxy::new(real, clock.clone(), 5_000, &out);

        let first = proxy.fetch("u");
        clock.advance(4_999);
        let second = proxy.fetch("u");
        assert_eq!(first, second);
        assert_eq!(proxy.real.calls, 1);

        clock.advance(1);
        let third = proxy.fetch("u");
        assert_ne!(first, third);
        assert_eq!(proxy.real.calls, 2);
        assert_eq!(proxy.cache_size(), 1);
    }

    #[test]
    fn test_clear_cache_forces_refetch() {
        let out = Narrator::capture();
        let real = RealWebService {
            calls: 0,
            out: out.clone(),
        };
        let mut proxy = CachingProxy::new(real, ManualClock::new(0), 60_000, &out);
        proxy.fetch("a");
        proxy.clear_cache();
        proxy.fetch("a");
        assert_eq!(proxy.real.calls, 2);
    }

    #[test]
    fn test_remote_connects_lazily() {
        let out = Narrator::capture();
        let mut db = DatabaseProxy::new("h:1", true, &out);
        assert!(db.remote.is_none());
        assert_eq!(db.query("SELECT 1").unwrap(), "Query result for: SELECT 1");
        assert_eq!(db.remote.as_ref().map(|r| r.connections), Some(1));
        db.query("SELECT 2").unwrap();
        assert_eq!(db.remote.as_ref().map(|r| r.connections), Some(1));
    }

    #[test]
    fn test_remote_retries_once_after_drop() {
        let out = Narrator::capture();
        let mut db = DatabaseProxy::new("h:1", true, &out).with_fault(Fault::DropAfter(1));
        db.query("q1").unwrap();
        assert_eq!(db.query("q2").unwrap(), "Query result for: q2");
        let remote = db.remote.as_ref().unwrap();
        assert_eq!(remote.connections, 2);
        assert_eq!(remote.attempts, 3);
        assert!(out.contains("attempting to reconnect"));
    }

    #[test]
    fn test_remote_gives_up_after_one_retry() {
        let out = Narrator::capture();
        let mut db = DatabaseProxy::new("h:1", true, &out).with_fault(Fault::Down);
        let err = db.query("q").unwrap_err();
        assert_eq!(err.to_string(), "Server unavailable");
        assert_eq!(db.remote.as_ref().unwrap().attempts, 2);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let out = Narrator::capture();
        let mut db = DatabaseProxy::new("h:1", true, &out);
        assert!(!db.disconnect());
        db.query("q").unwrap();
        assert!(db.disconnect());
        assert!(!db.disconnect());
        assert_eq!(out.count("Disconnecting from database server"), 1);
    }

    #[test]
    fn test_without_auto_connect_query_is_rejected() {
        let out = Narrator::capture();
        let mut db = DatabaseProxy::new("h:1", false, &out);
        let err = db.query("q").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert!(db.remote.is_none());
    }

    #[test]
    fn test_scope_guard_disconnects_on_early_exit() {
        let out = Narrator::capture();
        let db = RefCell::new(DatabaseProxy::new("h:1", true, &out).with_fault(Fault::Down));
        let attempt = || -> Result<String> {
            let _hang_up = ScopeGuard::new(|| {
                db.borrow_mut().disconnect();
            });
            // Bind first so the borrow ends before the guard runs.
            let result = db.borrow_mut().query("q");
            result
        };
        assert!(attempt().is_err());
        assert!(!db.borrow().is_connected());
        assert_eq!(out.count("Disconnecting from database server"), 2);
    }

    #[test]
    fn test_smart_proxy_frees_once_on_last_release() {
        let out = Narrator::capture();
        let census = Census::new();
        let first = SmartProxy::new(vec![1, 2, 3], &census, &out);
        let second = first.clone();
        let third = second.clone();
        assert_eq!(first.ref_count(), 3);
        assert_eq!(third.with(|v| v.len()).unwrap(), 3);

        drop(first);
        drop(third);
        assert_eq!(census.live(), 1);
        assert!(!out.contains("Object deleted"));

        drop(second);
        assert_eq!(census.released(), 1);
        assert!(census.ensure_all_released().is_ok());
        assert_eq!(out.count("Object deleted"), 1);
    }

    #[test]
    fn test_demo_runs() {
        let out = Narrator::capture();
        virtual_demo(&out);
        protection_demo(&out);
        caching_demo(&out);
        remote_demo(&out).unwrap();
        smart_demo(&out).unwrap();
        assert!(out.contains("Balance (raw sentinel): -1"));
        assert!(out.contains("Real service calls: 3"));
        assert!(out.contains("Second disconnect closed a connection: false"));
        assert!(out.contains("❌ Not connected to database"));
        assert!(out.contains("Targets freed: 1 of 1"));
    }
}
