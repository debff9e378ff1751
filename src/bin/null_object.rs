use patterns::prelude::*;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

// =============================================================================
// Customers
// =============================================================================

trait Customer {
    fn greet(&self, out: &Narrator);
    fn purchase(&self, out: &Narrator, item: &str);
    /// Percentage taken off the list price.
    fn discount_rate(&self) -> u64;
    fn name(&self) -> &str;
    fn is_null(&self) -> bool {
        false
    }
}

struct RealCustomer {
    id: u32,
    name: String,
    email: String,
    loyalty_points: Cell<u32>,
}

impl RealCustomer {
    fn new(id: u32, name: &str, email: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(PatternError::invalid_argument("Customer name cannot be empty"));
        }
        if !email.contains('@') {
            return Err(PatternError::invalid_argument(format!("Invalid email address: {email}")));
        }
        Ok(Self {
            id,
            name: name.to_string(),
            email: email.to_string(),
            loyalty_points: Cell::new(0),
        })
    }
}

impl Customer for RealCustomer {
    fn greet(&self, out: &Narrator) {
        narrate!(out, "Hello {}! Welcome back!", self.name);
    }

    fn purchase(&self, out: &Narrator, item: &str) {
        let points = self.loyalty_points.get() + 10;
        self.loyalty_points.set(points);
        narrate!(out, "{} purchased: {item}", self.name);
        narrate!(out, "Loyalty points: {points}");
    }

    fn discount_rate(&self) -> u64 {
        match self.loyalty_points.get() {
            points if points > 100 => 15,
            points if points > 50 => 10,
            _ => 5,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Stateless stand-in for "no such customer".
struct NullCustomer;

static NULL_CUSTOMER: NullCustomer = NullCustomer;

impl Customer for NullCustomer {
    fn greet(&self, out: &Narrator) {
        out.say("Welcome, guest!");
    }

    fn purchase(&self, out: &Narrator, item: &str) {
        narrate!(out, "Please register to purchase: {item}");
    }

    fn discount_rate(&self) -> u64 {
        0
    }

    fn name(&self) -> &str {
        "Guest"
    }

    fn is_null(&self) -> bool {
        true
    }
}

#[derive(Default)]
struct CustomerRepository {
    customers: BTreeMap<u32, RealCustomer>,
}

impl CustomerRepository {
    fn add(&mut self, customer: RealCustomer) -> Result<()> {
        if self.customers.contains_key(&customer.id) {
            return Err(PatternError::precondition(format!(
                "Customer {} already exists",
                customer.id
            )));
        }
        self.customers.insert(customer.id, customer);
        Ok(())
    }

    /// Never absent: unknown ids yield the shared null customer.
    fn find(&self, id: u32) -> &dyn Customer {
        match self.customers.get(&id) {
            Some(customer) => customer as &dyn Customer,
            None => &NULL_CUSTOMER,
        }
    }

    fn len(&self) -> usize {
        self.customers.len()
    }

    fn emails(&self) -> Vec<&str> {
        self.customers.values().map(|customer| customer.email.as_str()).collect()
    }
}

fn dollars(cents: u64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

#[derive(Default)]
struct CustomerService {
    repository: CustomerRepository,
}

impl CustomerService {
    fn add_customer(&mut self, id: u32, name: &str, email: &str) -> Result<()> {
        self.repository.add(RealCustomer::new(id, name, email)?)
    }

    /// Returns the charged amount in cents. No branch on customer presence is
    /// needed for pricing; the null customer simply has no discount.
    fn process_order(&self, out: &Narrator, customer_id: u32, item: &str, price_cents: u64) -> u64 {
        let customer = self.repository.find(customer_id);
        customer.greet(out);
        let discount = customer.discount_rate();
        let final_cents = price_cents * (100 - discount) / 100;
        narrate!(out, "Processing order for customer ID {customer_id} ({})", customer.name());
        narrate!(out, "Item: {item}, Original price: {}", dollars(price_cents));
        narrate!(out, "Discount: {discount}%, Final price: {}", dollars(final_cents));
        customer.purchase(out, item);
        if customer.is_null() {
            out.say("Note: This was a guest purchase");
        }
        out.say("---");
        final_cents
    }

    fn customer_count(&self) -> usize {
        self.repository.len()
    }
}

// =============================================================================
// Loggers
// =============================================================================

trait Logger {
    fn log(&self, level: Level, message: &str) -> Result<()>;
    fn name(&self) -> String;
    fn is_null(&self) -> bool {
        false
    }
}

struct ConsoleLogger {
    out: Narrator,
}

impl Logger for ConsoleLogger {
    fn log(&self, level: Level, message: &str) -> Result<()> {
        narrate!(self.out, "[{level}] {message}");
        Ok(())
    }

    fn name(&self) -> String {
        "ConsoleLogger".to_string()
    }
}

/// Appends one `[LEVEL] message` line per call; the file is truncated when
/// the logger is created.
struct FileLogger {
    out: Narrator,
    path: PathBuf,
}

impl FileLogger {
    fn create(out: &Narrator, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        File::create(&path)?;
        Ok(Self { out: out.clone(), path })
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl Logger for FileLogger {
    fn log(&self, level: Level, message: &str) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "[{level}] {message}")?;
        narrate!(self.out, "[FILE LOG to {}] [{level}] {message}", self.file_name());
        Ok(())
    }

    fn name(&self) -> String {
        format!("FileLogger({})", self.file_name())
    }
}

struct NullLogger;

static NULL_LOGGER: NullLogger = NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: Level, _message: &str) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> String {
        "NullLogger".to_string()
    }

    fn is_null(&self) -> bool {
        true
    }
}

struct Application<'a> {
    name: String,
    logger: &'a dyn Logger,
}

impl<'a> Application<'a> {
    /// Without a logger the application logs into the null logger.
    fn new(name: &str, logger: Option<&'a dyn Logger>) -> Self {
        Self {
            name: name.to_string(),
            logger: logger.unwrap_or(&NULL_LOGGER),
        }
    }

    fn run(&self, out: &Narrator) -> Result<usize> {
        let mut steps = 0;
        self.logger.log(Level::INFO, &format!("{} application starting", self.name))?;
        self.logger.log(Level::DEBUG, "Processing data")?;
        for step in 1..=3 {
            self.logger.log(Level::DEBUG, &format!("Processing step {step}"))?;
            steps += 1;
        }
        self.logger.log(Level::INFO, &format!("{} application finished", self.name))?;
        if self.logger.is_null() {
            narrate!(out, "(Logging was disabled for {})", self.name);
        }
        Ok(steps)
    }
}

// =============================================================================
// Database connections
// =============================================================================

trait DatabaseConnection {
    fn execute_query(&self, out: &Narrator, query: &str) -> Vec<String>;
    fn is_connected(&self) -> bool;
    fn connection_info(&self) -> String;
    fn is_null(&self) -> bool {
        false
    }
}

struct PostgresConnection {
    connection_string: String,
}

impl PostgresConnection {
    fn connect(out: &Narrator, connection_string: &str) -> Self {
        narrate!(out, "Connected to PostgreSQL: {connection_string}");
        Self { connection_string: connection_string.to_string() }
    }
}

impl DatabaseConnection for PostgresConnection {
    fn execute_query(&self, out: &Narrator, query: &str) -> Vec<String> {
        narrate!(out, "Executing query on PostgreSQL: {query}");
        vec![format!("Result for: {query}")]
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn connection_info(&self) -> String {
        format!("PostgreSQL: {}", self.connection_string)
    }
}

struct NullDatabaseConnection;

static NULL_DATABASE: NullDatabaseConnection = NullDatabaseConnection;

impl DatabaseConnection for NullDatabaseConnection {
    fn execute_query(&self, out: &Narrator, query: &str) -> Vec<String> {
        narrate!(out, "Database not available. Query ignored: {query}");
        vec!["No database connection available".to_string()]
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn connection_info(&self) -> String {
        "No Database Connection".to_string()
    }

    fn is_null(&self) -> bool {
        true
    }
}

struct DatabaseService<'a> {
    connection: &'a dyn DatabaseConnection,
}

impl<'a> DatabaseService<'a> {
    fn new(connection: Option<&'a dyn DatabaseConnection>) -> Self {
        Self { connection: connection.unwrap_or(&NULL_DATABASE) }
    }

    fn fetch_users(&self, out: &Narrator) -> Vec<String> {
        self.connection.execute_query(out, "SELECT * FROM users")
    }

    fn is_available(&self) -> bool {
        self.connection.is_connected() && !self.connection.is_null()
    }
}

// =============================================================================
// Demo (cargo run --bin null_object)
// =============================================================================

fn customers_demo(out: &Narrator) -> Result<()> {
    out.section(1, "Customer Service");
    let mut service = CustomerService::default();
    service.add_customer(1, "Alice Johnson", "alice@example.com")?;
    service.add_customer(2, "Bob Smith", "bob@example.com")?;
    service.add_customer(2, "Bob Again", "bob2@example.com").or_narrate(out)?;
    service.add_customer(3, "Carol", "carol-at-example").or_narrate(out)?;
    narrate!(
        out,
        "Total customers: {} ({})",
        service.customer_count(),
        service.repository.emails().join(", ")
    );
    out.blank();

    service.process_order(out, 1, "Laptop", 100_000);
    service.process_order(out, 2, "Mouse", 5_000);
    service.process_order(out, 999, "Keyboard", 10_000);

    // Loyalty grows with every purchase and lifts the discount tier.
    for _ in 0..5 {
        service.repository.find(1).purchase(&Narrator::capture(), "Accessory");
    }
    let discount = service.repository.find(1).discount_rate();
    narrate!(out, "Alice's discount after six purchases: {discount}%");
    Ok(())
}

fn loggers_demo(out: &Narrator, config: &DemoConfig) -> Result<()> {
    out.section(2, "Logger");
    out.say("With console logger:");
    let console = ConsoleLogger { out: out.clone() };
    Application::new("MyApp", Some(&console)).run(out)?;

    out.blank();
    out.say("With null logger (silent):");
    let before = out.len();
    Application::new("SilentApp", None).run(out)?;
    narrate!(out, "Lines produced by the silent run: {}", out.len() - before);

    out.section(3, "Polymorphic Null Object Usage");
    let file = FileLogger::create(out, config.file_path("app.log"))?;
    let loggers: [&dyn Logger; 3] = [&console, &file, &NULL_LOGGER];
    for (index, logger) in loggers.iter().enumerate() {
        narrate!(out, "Logger {} ({}):", index + 1, logger.name());
        logger.log(Level::INFO, "This is a test message")?;
        if logger.is_null() {
            out.say("  ^ This logger is null (silent)");
        }
    }
    Ok(())
}

fn database_demo(out: &Narrator) {
    out.section(4, "Database");
    let postgres = PostgresConnection::connect(out, "postgresql://localhost:5432/mydb");
    for (label, service) in [
        ("Online service", DatabaseService::new(Some(&postgres))),
        ("Offline service", DatabaseService::new(None)),
    ] {
        out.blank();
        narrate!(out, "{label}:");
        narrate!(out, "Database info: {}", service.connection.connection_info());
        narrate!(out, "Database available: {}", service.is_available());
        let users = service.fetch_users(out);
        narrate!(out, "Users fetched: {}", users.len());
        for user in users {
            narrate!(out, "  - {user}");
        }
    }
}

fn main() -> ExitCode {
    patterns::runner::run("Null Object", |out, config| {
        customers_demo(out)?;
        loggers_demo(out, config)?;
        database_demo(out);
        out.blank();
        out.say("✅ Null Object pattern prevents null pointer errors");
        out.say("   and provides graceful default behavior!");
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin null_object)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_customer_is_null_object() {
        let repository = CustomerRepository::default();
        let customer = repository.find(42);
        assert!(customer.is_null());
        assert_eq!(customer.name(), "Guest");
        assert_eq!(customer.discount_rate(), 0);
        assert!(std::ptr::eq(
            customer as *const dyn Customer as *const (),
            &NULL_CUSTOMER as *const NullCustomer as *const ()
        ));
    }

    #[test]
    fn test_discount_tiers() {
        let customer = RealCustomer::new(1, "Ann", "ann@example.com").unwrap();
        let out = Narrator::capture();
        assert_eq!(customer.discount_rate(), 5);
        for _ in 0..6 {
            customer.purchase(&out, "x");
        }
        assert_eq!(customer.discount_rate(), 10);
        for _ in 0..5 {
            customer.purchase(&out, "x");
        }
        assert_eq!(customer.discount_rate(), 15);
        assert!(out.contains("Loyalty points: 110"));
    }

    #[test]
    fn test_order_pricing() {
        let mut service = CustomerService::default();
        service.add_customer(1, "Alice", "alice@example.com").unwrap();
        let out = Narrator::capture();
        assert_eq!(service.process_order(&out, 1, "Laptop", 100_000), 95_000);
        assert_eq!(service.process_order(&out, 7, "Keyboard", 10_000), 10_000);
        assert!(out.contains("Discount: 5%, Final price: $950.00"));
        assert!(out.contains("Please register to purchase: Keyboard"));
        assert_eq!(out.count("Note: This was a guest purchase"), 1);
    }

    #[test]
    fn test_customer_validation() {
        let mut service = CustomerService::default();
        assert!(service.add_customer(1, "", "a@b").is_err());
        assert!(service.add_customer(1, "A", "nope").is_err());
        service.add_customer(1, "A", "a@b").unwrap();
        let dup = service.add_customer(1, "B", "b@c").unwrap_err();
        assert_eq!(dup.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(service.customer_count(), 1);
    }

    #[test]
    fn test_null_logger_is_silent() {
        let out = Narrator::capture();
        let steps = Application::new("Quiet", None).run(&out).unwrap();
        assert_eq!(steps, 3);
        assert_eq!(out.lines(), vec!["(Logging was disabled for Quiet)"]);
    }

    #[test]
    fn test_file_logger_writes_app_log() {
        let dir = TempDir::new().unwrap();
        let out = Narrator::capture();
        let logger = FileLogger::create(&out, dir.path().join("app.log")).unwrap();
        Application::new("Disk", Some(&logger)).run(&out).unwrap();
        let text = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert_eq!(text.lines().count(), 6);
        assert!(text.starts_with("[INFO] Disk application starting\n"));
        assert!(text.contains("[DEBUG] Processing step 2\n"));
        assert_eq!(logger.name(), "FileLogger(app.log)");

        FileLogger::create(&out, dir.path().join("app.log")).unwrap();
        assert!(std::fs::read_to_string(dir.path().join("app.log")).unwrap().is_empty());
    }

    #[test]
    fn test_null_database() {
        let out = Narrator::capture();
        let service = DatabaseService::new(None);
        assert!(!service.is_available());
        assert_eq!(service.fetch_users(&out), vec!["No database connection available"]);
        assert!(out.contains("Database not available. Query ignored: SELECT * FROM users"));

        let postgres = PostgresConnection::connect(&out, "postgresql://x");
        let online = DatabaseService::new(Some(&postgres));
        assert!(online.is_available());
        assert_eq!(online.fetch_users(&out), vec!["Result for: SELECT * FROM users"]);
    }

    #[test]
    fn test_demo_runs() {
        let dir = TempDir::new().unwrap();
        let config = DemoConfig::for_tests().with_workdir(dir.path());
        let out = Narrator::capture();
        customers_demo(&out).unwrap();
        loggers_demo(&out, &config).unwrap();
        database_demo(&out);
        assert!(out.contains("Total customers: 2 (alice@example.com, bob@example.com)"));
        assert!(out.contains("❌ Customer 2 already exists"));
        assert!(out.contains("Welcome, guest!"));
        assert!(out.contains("Alice's discount after six purchases: 10%"));
        assert!(out.contains("Lines produced by the silent run: 1"));
        assert!(out.contains("  ^ This logger is null (silent)"));
        assert!(out.contains("[FILE LOG to app.log] [INFO] This is a test message"));
        assert!(out.contains("Database info: No Database Connection"));
        assert!(out.contains("Database available: false"));
        assert!(config.file_path("app.log").exists());
    }
}
