use patterns::prelude::*;
use rustc_hash::FxHasher;
use std::any::{type_name, Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::process::ExitCode;
use std::rc::Rc;
use std::str::FromStr;

// =============================================================================
// Service roles
// =============================================================================

trait Logger {
    fn log(&self, message: &str);
    fn name(&self) -> String;
}

trait Database {
    fn save(&self, data: &str) -> Result<String>;
    fn find(&self, id: &str) -> Option<String>;
    fn is_connected(&self) -> bool;
}

trait EmailService {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
    fn provider(&self) -> String;
}

// =============================================================================
// Implementations
// =============================================================================

struct ConsoleLogger {
    out: Narrator,
}

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        narrate!(self.out, "[CONSOLE LOG] {message}");
    }

    fn name(&self) -> String {
        "ConsoleLogger".to_string()
    }
}

struct FileLogger {
    out: Narrator,
    filename: String,
}

impl Logger for FileLogger {
    fn log(&self, message: &str) {
        narrate!(self.out, "[FILE LOG to {}] {message}", self.filename);
    }

    fn name(&self) -> String {
        format!("FileLogger({})", self.filename)
    }
}

#[derive(Default)]
struct InMemoryDatabase {
    rows: RefCell<BTreeMap<String, String>>,
    next_id: Cell<u32>,
}

impl Database for InMemoryDatabase {
    fn save(&self, data: &str) -> Result<String> {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let key = format!("ID{id}");
        self.rows.borrow_mut().insert(key.clone(), data.to_string());
        Ok(key)
    }

    fn find(&self, id: &str) -> Option<String> {
        self.rows.borrow().get(id).cloned()
    }

    fn is_connected(&self) -> bool {
        true
    }
}

/// Stand-in for a remote database: keys are derived from the payload hash.
struct PostgresDatabase {
    out: Narrator,
    connected: bool,
}

impl PostgresDatabase {
    fn connect(out: &Narrator, connection_string: &str) -> Self {
        narrate!(out, "Connected to PostgreSQL: {connection_string}");
        Self { out: out.clone(), connected: true }
    }
}

impl Database for PostgresDatabase {
    fn save(&self, data: &str) -> Result<String> {
        if !self.connected {
            return Err(PatternError::precondition("PostgreSQL connection is closed"));
        }
        narrate!(self.out, "Saving to PostgreSQL: {data}");
        let mut hasher = FxHasher::default();
        data.hash(&mut hasher);
        Ok(format!("POSTGRES_ID_{}", hasher.finish() % 1000))
    }

    fn find(&self, id: &str) -> Option<String> {
        self.connected.then(|| format!("PostgreSQL data for {id}"))
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

fn check_recipient(to: &str) -> Result<()> {
    if to.contains('@') {
        Ok(())
    } else {
        Err(PatternError::invalid_argument(format!("Invalid email address: {to}")))
    }
}

struct MockEmailService {
    out: Narrator,
    sent: Cell<usize>,
}

impl MockEmailService {
    fn new(out: &Narrator) -> Self {
        Self { out: out.clone(), sent: Cell::new(0) }
    }
}

impl EmailService for MockEmailService {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        check_recipient(to)?;
        self.sent.set(self.sent.get() + 1);
        narrate!(self.out, "[MOCK EMAIL] To: {to}, Subject: {subject}, Body: {body}");
        Ok(())
    }

    fn provider(&self) -> String {
        "MockEmailService".to_string()
    }
}

struct SmtpEmailService {
    out: Narrator,
    server: String,
}

impl EmailService for SmtpEmailService {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        check_recipient(to)?;
        narrate!(self.out, "[SMTP via {}] To: {to}, Subject: {subject}, Body: {body}", self.server);
        Ok(())
    }

    fn provider(&self) -> String {
        format!("SMTP({})", self.server)
    }
}

// =============================================================================
// Business service
// =============================================================================

/// Receives every collaborator through its constructor.
struct UserService {
    logger: Rc<dyn Logger>,
    database: Rc<dyn Database>,
    email: Rc<dyn EmailService>,
}

impl UserService {
    fn new(
        logger: Rc<dyn Logger>,
        database: Rc<dyn Database>,
        email: Rc<dyn EmailService>,
    ) -> Self {
        Self { logger, database, email }
    }

    fn create_user(&self, name: &str, email: &str) -> Result<String> {
        self.logger.log(&format!("Creating user: {name}"));
        if !self.database.is_connected() {
            self.logger.log("Database connection failed");
            return Err(PatternError::precondition("Database is not connected"));
        }
        let record = serde_json::json!({ "name": name, "email": email }).to_string();
        let id = self.database.save(&record)?;
        self.logger.log(&format!("User created with ID: {id}"));
        self.email.send(email, "Welcome!", &format!("Hello {name}, welcome to our service!"))?;
        Ok(id)
    }

    fn get_user(&self, id: &str) -> Result<String> {
        self.logger.log(&format!("Retrieving user with ID: {id}"));
        self.database
            .find(id)
            .ok_or_else(|| PatternError::not_found(format!("user '{id}'")))
    }

    fn describe(&self, out: &Narrator) {
        out.say("UserService Configuration:");
        narrate!(out, "  Logger: {}", self.logger.name());
        narrate!(out, "  Database: Connected={}", self.database.is_connected());
        narrate!(out, "  Email: {}", self.email.provider());
    }
}

#[derive(Default)]
struct UserServiceBuilder {
    logger: Option<Rc<dyn Logger>>,
    database: Option<Rc<dyn Database>>,
    email: Option<Rc<dyn EmailService>>,
}

impl UserServiceBuilder {
    fn logger(mut self, logger: Rc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    fn database(mut self, database: Rc<dyn Database>) -> Self {
        self.database = Some(database);
        self
    }

    fn email(mut self, email: Rc<dyn EmailService>) -> Self {
        self.email = Some(email);
        self
    }

    fn build(self) -> Result<UserService> {
        match (self.logger, self.database, self.email) {
            (Some(logger), Some(database), Some(email)) => {
                Ok(UserService::new(logger, database, email))
            }
            (logger, database, email) => {
                let missing: Vec<&str> = [
                    (logger.is_none(), "logger"),
                    (database.is_none(), "database"),
                    (email.is_none(), "email service"),
                ]
                .into_iter()
                .filter_map(|(absent, name)| absent.then_some(name))
                .collect();
                Err(PatternError::precondition(format!(
                    "All dependencies must be provided (missing: {})",
                    missing.join(", ")
                )))
            }
        }
    }
}

// =============================================================================
// Container
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifetime {
    /// One shared instance, built on first resolve.
    Singleton,
    /// A fresh instance per resolve.
    Transient,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Transient => "transient",
        })
    }
}

type AnyFactory = Rc<dyn Fn(&Container) -> Result<Box<dyn Any>>>;

struct Registration {
    label: &'static str,
    lifetime: Lifetime,
    factory: AnyFactory,
    instance: RefCell<Option<Box<dyn Any>>>,
}

/// Type-keyed service container. `T` is usually a trait object such as
/// `dyn Logger`; the stored value is always an `Rc<T>`.
#[derive(Default)]
struct Container {
    registrations: HashMap<TypeId, Registration>,
    resolving: RefCell<Vec<&'static str>>,
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let bare = full.strip_prefix("dyn ").unwrap_or(full);
    bare.rsplit("::").next().unwrap_or(bare)
}

impl Container {
    /// Returns whether an earlier registration for `T` was replaced.
    fn register<T, F>(&mut self, lifetime: Lifetime, factory: F) -> bool
    where
        T: ?Sized + 'static,
        F: Fn(&Container) -> Result<Rc<T>> + 'static,
    {
        let registration = Registration {
            label: short_type_name::<T>(),
            lifetime,
            factory: Rc::new(move |container: &Container| -> Result<Box<dyn Any>> {
                Ok(Box::new(factory(container)?))
            }),
            instance: RefCell::new(None),
        };
        tracing::debug!(service = registration.label, %lifetime, "service registered");
        self.registrations.insert(TypeId::of::<T>(), registration).is_some()
    }

    fn singleton<T, F>(&mut self, factory: F) -> bool
    where
        T: ?Sized + 'static,
        F: Fn(&Container) -> Result<Rc<T>> + 'static,
    {
        self.register(Lifetime::Singleton, factory)
    }

    fn transient<T, F>(&mut self, factory: F) -> bool
    where
        T: ?Sized + 'static,
        F: Fn(&Container) -> Result<Rc<T>> + 'static,
    {
        self.register(Lifetime::Transient, factory)
    }

    fn has<T: ?Sized + 'static>(&self) -> bool {
        self.registrations.contains_key(&TypeId::of::<T>())
    }

    fn resolve<T: ?Sized + 'static>(&self) -> Result<Rc<T>> {
        let registration = self
            .registrations
            .get(&TypeId::of::<T>())
            .ok_or_else(|| PatternError::not_found(format!("service {}", short_type_name::<T>())))?;

        if let Some(cached) = registration.instance.borrow().as_ref() {
            return downcast::<T>(cached.as_ref(), registration.label);
        }

        let built = self.build(registration)?;
        let service = downcast::<T>(built.as_ref(), registration.label)?;
        if registration.lifetime == Lifetime::Singleton {
            *registration.instance.borrow_mut() = Some(built);
        }
        Ok(service)
    }

    fn build(&self, registration: &Registration) -> Result<Box<dyn Any>> {
        {
            let mut stack = self.resolving.borrow_mut();
            if stack.contains(&registration.label) {
                let mut chain = stack.clone();
                chain.push(registration.label);
                return Err(PatternError::precondition(format!(
                    "Circular dependency: {}",
                    chain.join(" -> ")
                )));
            }
            stack.push(registration.label);
        }
        let built = (registration.factory)(self);
        self.resolving.borrow_mut().pop();
        built
    }

    /// `label (lifetime)` for every registration, sorted by label.
    fn registrations(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .registrations
            .values()
            .map(|registration| format!("{} ({})", registration.label, registration.lifetime))
            .collect();
        names.sort();
        names
    }
}

fn downcast<T: ?Sized + 'static>(value: &dyn Any, label: &str) -> Result<Rc<T>> {
    value
        .downcast_ref::<Rc<T>>()
        .cloned()
        .ok_or_else(|| {
            PatternError::fatal(format!("registration for {label} holds the wrong type"))
        })
}

// =============================================================================
// Environment-driven wiring
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Environment {
    Development,
    Production,
    Test,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Environment::Development => "Development",
            Environment::Production => "Production",
            Environment::Test => "Test",
        })
    }
}

impl FromStr for Environment {
    type Err = PatternError;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            _ => Err(PatternError::invalid_argument(format!("Unknown environment: {name}"))),
        }
    }
}

/// Development and test share instances; production builds fresh
/// connections per resolve.
struct ApplicationContext {
    environment: Environment,
    container: Container,
}

impl ApplicationContext {
    fn new(environment: Environment, out: &Narrator) -> Self {
        let mut container = Container::default();
        let out = out.clone();
        match environment {
            Environment::Development => {
                let log_out = out.clone();
                container.singleton::<dyn Logger, _>(move |_| {
                    Ok(Rc::new(ConsoleLogger { out: log_out.clone() }))
                });
                container
                    .singleton::<dyn Database, _>(|_| Ok(Rc::new(InMemoryDatabase::default())));
                let mail_out = out.clone();
                container.singleton::<dyn EmailService, _>(move |_| {
                    Ok(Rc::new(MockEmailService::new(&mail_out)))
                });
            }
            Environment::Production => {
                let log_out = out.clone();
                container.transient::<dyn Logger, _>(move |_| {
                    Ok(Rc::new(FileLogger {
                        out: log_out.clone(),
                        filename: "production.log".to_string(),
                    }))
                });
                let db_out = out.clone();
                container.transient::<dyn Database, _>(move |_| {
                    Ok(Rc::new(PostgresDatabase::connect(&db_out, "postgresql://prod:5432/app")))
                });
                let mail_out = out.clone();
                container.transient::<dyn EmailService, _>(move |_| {
                    Ok(Rc::new(SmtpEmailService {
                        out: mail_out.clone(),
                        server: "smtp.company.com".to_string(),
                    }))
                });
            }
            Environment::Test => {
                let log_out = out.clone();
                container.singleton::<dyn Logger, _>(move |_| {
                    Ok(Rc::new(FileLogger {
                        out: log_out.clone(),
                        filename: "test.log".to_string(),
                    }))
                });
                container
                    .singleton::<dyn Database, _>(|_| Ok(Rc::new(InMemoryDatabase::default())));
                let mail_out = out.clone();
                container.singleton::<dyn EmailService, _>(move |_| {
                    Ok(Rc::new(MockEmailService::new(&mail_out)))
                });
            }
        }
        container.transient::<UserService, _>(|c| {
            Ok(Rc::new(UserService::new(c.resolve()?, c.resolve()?, c.resolve()?)))
        });
        Self { environment, container }
    }

    fn user_service(&self) -> Result<Rc<UserService>> {
        self.container.resolve()
    }
}

// =============================================================================
// Demo (cargo run --bin dependency_injection)
// =============================================================================

fn manual_demo(out: &Narrator) -> Result<()> {
    out.section(1, "Manual Dependency Injection");
    let service = UserService::new(
        Rc::new(ConsoleLogger { out: out.clone() }),
        Rc::new(InMemoryDatabase::default()),
        Rc::new(MockEmailService::new(out)),
    );
    service.describe(out);
    let id = service.create_user("Alice Johnson", "alice@example.com")?;
    narrate!(out, "Created user with ID: {id}");
    narrate!(out, "Retrieved user data: {}", service.get_user(&id)?);
    service.get_user("ID99").map(|_| ()).or_narrate(out)?;
    service.create_user("Mallory", "not-an-address").map(|_| ()).or_narrate(out)?;
    Ok(())
}

fn builder_demo(out: &Narrator) -> Result<()> {
    out.section(2, "Builder Pattern for DI");
    let service = UserServiceBuilder::default()
        .logger(Rc::new(FileLogger { out: out.clone(), filename: "users.log".to_string() }))
        .database(Rc::new(InMemoryDatabase::default()))
        .email(Rc::new(MockEmailService::new(out)))
        .build()?;
    service.describe(out);
    service.create_user("Bob Smith", "bob@example.com")?;

    let incomplete = UserServiceBuilder::default()
        .database(Rc::new(InMemoryDatabase::default()))
        .build();
    incomplete.map(|_| ()).or_narrate(out)?;
    Ok(())
}

fn container_demo(out: &Narrator) -> Result<()> {
    out.section(3, "DI Container");
    let mut container = Container::default();
    let log_out = out.clone();
    container.singleton::<dyn Logger, _>(move |_| {
        Ok(Rc::new(ConsoleLogger { out: log_out.clone() }))
    });
    container.singleton::<dyn Database, _>(|_| Ok(Rc::new(InMemoryDatabase::default())));
    let mail_out = out.clone();
    container.transient::<dyn EmailService, _>(move |_| {
        Ok(Rc::new(SmtpEmailService {
            out: mail_out.clone(),
            server: "smtp.example.com".to_string(),
        }))
    });

    out.say("Registered services:");
    for name in container.registrations() {
        narrate!(out, "  - {name}");
    }

    if let Some(service) = container.resolve::<UserService>().or_narrate(out)? {
        service.describe(out);
    }
    container.transient::<UserService, _>(|c| {
        Ok(Rc::new(UserService::new(c.resolve()?, c.resolve()?, c.resolve()?)))
    });

    let first = container.resolve::<UserService>()?;
    let second = container.resolve::<UserService>()?;
    out.blank();
    out.say("Container-resolved service:");
    first.describe(out);
    let id = first.create_user("Eve Adams", "eve@example.com")?;
    narrate!(
        out,
        "Second resolve sees Eve through the shared database: {}",
        second.get_user(&id).is_ok()
    );
    narrate!(
        out,
        "Logger shared: {}, email shared: {}",
        Rc::ptr_eq(&container.resolve::<dyn Logger>()?, &container.resolve::<dyn Logger>()?),
        Rc::ptr_eq(
            &container.resolve::<dyn EmailService>()?,
            &container.resolve::<dyn EmailService>()?
        )
    );
    Ok(())
}

fn environment_demo(out: &Narrator) -> Result<()> {
    out.section(4, "Environment-based Configuration");
    for name in ["development", "production", "test", "staging"] {
        let Some(environment) = name.parse::<Environment>().or_narrate(out)? else {
            continue;
        };
        out.blank();
        narrate!(out, "{environment} Environment:");
        let context = ApplicationContext::new(environment, out);
        let service = context.user_service()?;
        service.describe(out);
        service.create_user(
            &format!("User {}", context.environment),
            &format!("user@{}.com", name),
        )?;
    }
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Dependency Injection", |out, _config| {
        manual_demo(out)?;
        builder_demo(out)?;
        container_demo(out)?;
        environment_demo(out)?;
        out.blank();
        out.say("✅ Dependency Injection provides flexibility, testability,");
        out.say("   and loose coupling between components!");
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin dependency_injection)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    trait Ticker {
        fn tick(&self) -> u32;
    }

    struct Counter(Cell<u32>);

    impl Ticker for Counter {
        fn tick(&self) -> u32 {
            self.0.set(self.0.get() + 1);
            self.0.get()
        }
    }

    #[test]
    fn test_singleton_is_shared_and_transient_is_fresh() {
        let mut container = Container::default();
        container.singleton::<dyn Ticker, _>(|_| Ok(Rc::new(Counter(Cell::new(0)))));
        let a = container.resolve::<dyn Ticker>().unwrap();
        let b = container.resolve::<dyn Ticker>().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        a.tick();
        assert_eq!(b.tick(), 2);

        container.transient::<dyn Ticker, _>(|_| Ok(Rc::new(Counter(Cell::new(0)))));
        let c = container.resolve::<dyn Ticker>().unwrap();
        let d = container.resolve::<dyn Ticker>().unwrap();
        assert!(!Rc::ptr_eq(&c, &d));
        c.tick();
        assert_eq!(d.tick(), 1);
    }

    #[test]
    fn test_missing_registration_is_not_found() {
        let container = Container::default();
        assert!(!container.has::<dyn Logger>());
        let err = container.resolve::<dyn Logger>().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Not found: service Logger");
    }

    #[test]
    fn test_nested_resolution_reports_missing_dependency() {
        let mut container = Container::default();
        container.singleton::<dyn Database, _>(|_| Ok(Rc::new(InMemoryDatabase::default())));
        container.transient::<UserService, _>(|c| {
            Ok(Rc::new(UserService::new(c.resolve()?, c.resolve()?, c.resolve()?)))
        });
        let err = container.resolve::<UserService>().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(container.resolving.borrow().is_empty());
    }

    struct Left(#[allow(dead_code)] Rc<Right>);
    struct Right(#[allow(dead_code)] Rc<Left>);

    #[test]
    fn test_circular_dependency_is_rejected() {
        let mut container = Container::default();
        container.singleton::<Left, _>(|c| Ok(Rc::new(Left(c.resolve()?))));
        container.singleton::<Right, _>(|c| Ok(Rc::new(Right(c.resolve()?))));
        let err = container.resolve::<Left>().err().unwrap();
        assert_eq!(err.to_string(), "Circular dependency: Left -> Right -> Left");
        assert!(container.resolving.borrow().is_empty());
    }

    #[test]
    fn test_registration_listing() {
        let out = Narrator::capture();
        let mut container = Container::default();
        let fresh_database = |_: &Container| -> Result<Rc<dyn Database>> {
            Ok(Rc::new(InMemoryDatabase::default()))
        };
        assert!(!container.singleton::<dyn Logger, _>(move |_| {
            Ok(Rc::new(ConsoleLogger { out: out.clone() }))
        }));
        assert!(!container.transient::<dyn Database, _>(fresh_database));
        assert!(container.singleton::<dyn Database, _>(fresh_database));
        assert_eq!(container.registrations(), vec!["Database (singleton)", "Logger (singleton)"]);
    }

    #[test]
    fn test_user_service_flow() {
        let out = Narrator::capture();
        let email = Rc::new(MockEmailService::new(&out));
        let service = UserService::new(
            Rc::new(ConsoleLogger { out: out.clone() }),
            Rc::new(InMemoryDatabase::default()),
            email.clone(),
        );
        let id = service.create_user("Ann", "ann@example.com").unwrap();
        assert_eq!(id, "ID1");
        assert_eq!(service.get_user("ID1").unwrap(), r#"{"email":"ann@example.com","name":"Ann"}"#);
        assert_eq!(email.sent.get(), 1);
        assert!(out.contains("[MOCK EMAIL] To: ann@example.com, Subject: Welcome!"));
        assert!(service.create_user("Bad", "nope").is_err());
        assert_eq!(email.sent.get(), 1);
    }

    #[test]
    fn test_builder_reports_missing_parts() {
        let err = UserServiceBuilder::default()
            .database(Rc::new(InMemoryDatabase::default()))
            .build()
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "All dependencies must be provided (missing: logger, email service)"
        );
    }

    #[test]
    fn test_postgres_ids_are_stable() {
        let out = Narrator::capture();
        let db = PostgresDatabase::connect(&out, "postgresql://x");
        let first = db.save("payload").unwrap();
        assert_eq!(first, db.save("payload").unwrap());
        assert!(first.starts_with("POSTGRES_ID_"));
        assert_eq!(db.find("7").unwrap(), "PostgreSQL data for 7");
    }

    #[test]
    fn test_environment_wiring() {
        let out = Narrator::capture();
        let dev = ApplicationContext::new(Environment::Development, &out);
        assert_eq!(dev.user_service().unwrap().logger.name(), "ConsoleLogger");
        let prod = ApplicationContext::new("PROD".parse().unwrap(), &out);
        let a = prod.user_service().unwrap();
        let b = prod.user_service().unwrap();
        assert!(!Rc::ptr_eq(&a.database, &b.database));
        assert_eq!(a.email.provider(), "SMTP(smtp.company.com)");
        assert_eq!(out.count("Connected to PostgreSQL"), 2);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_demo_runs() {
        let out = Narrator::capture();
        manual_demo(&out).unwrap();
        builder_demo(&out).unwrap();
        container_demo(&out).unwrap();
        environment_demo(&out).unwrap();
        assert!(out.contains(
            r#"Retrieved user data: {"email":"alice@example.com","name":"Alice Johnson"}"#
        ));
        assert!(out.contains("❌ Not found: user 'ID99'"));
        assert!(out.contains("❌ Invalid argument: Invalid email address: not-an-address"));
        assert!(out.contains("❌ Not found: service UserService"));
        assert!(out.contains("Second resolve sees Eve through the shared database: true"));
        assert!(out.contains("Logger shared: true, email shared: false"));
        assert!(out.contains("[SMTP via smtp.company.com] To: user@production.com"));
        assert!(out.contains("❌ Invalid argument: Unknown environment: staging"));
    }
}
