use lazy_static::lazy_static;
use patterns::prelude::*;
use std::collections::BTreeMap;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

// =============================================================================
// Process-wide instances
// =============================================================================

static DATABASE_INITS: AtomicUsize = AtomicUsize::new(0);

lazy_static! {
    static ref DATABASE: Mutex<DatabaseConnection> = Mutex::new(DatabaseConnection::open());
    static ref LOGGER: Logger = Logger::default();
    static ref SETTINGS: Mutex<AppSettings> = Mutex::new(AppSettings::defaults());
}

/// A poisoned lock only means another thread panicked mid-update; the data
/// itself is still usable for a demo.
fn lock<T>(mutex: &'static Mutex<T>) -> MutexGuard<'static, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Database connection
// =============================================================================

#[derive(Debug)]
struct DatabaseConnection {
    connection_string: String,
    queries_executed: usize,
}

impl DatabaseConnection {
    fn open() -> Self {
        DATABASE_INITS.fetch_add(1, Ordering::SeqCst);
        tracing::info!("database connection established");
        Self {
            connection_string: "database://localhost:5432".to_string(),
            queries_executed: 0,
        }
    }

    fn instance() -> &'static Mutex<DatabaseConnection> {
        &DATABASE
    }

    fn execute_query(&mut self, query: &str) -> String {
        self.queries_executed += 1;
        format!("Executing query: {query} on {}", self.connection_string)
    }

    fn set_connection_string(&mut self, connection_string: &str) {
        self.connection_string = connection_string.to_string();
    }
}

fn database_initializations() -> usize {
    DATABASE_INITS.load(Ordering::SeqCst)
}

// =============================================================================
// Logger
// =============================================================================

/// Append-only log shared by every thread.
#[derive(Debug, Default)]
struct Logger {
    entries: Mutex<Vec<String>>,
}

impl Logger {
    fn instance() -> &'static Logger {
        &LOGGER
    }

    fn log(&self, message: &str) -> String {
        let line = format!("[LOG] {message}");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.clone());
        tracing::debug!(message, "logged");
        line
    }

    fn entries_containing(&self, needle: &str) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| entry.contains(needle))
            .count()
    }
}

// =============================================================================
// Application settings
// =============================================================================

#[derive(Debug, Clone)]
struct AppSettings {
    values: BTreeMap<String, String>,
}

impl AppSettings {
    fn defaults() -> Self {
        let values = [("app.name", "PatternShop"), ("app.version", "1.0.0"), ("db.pool_size", "10")]
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Self { values }
    }

    fn instance() -> &'static Mutex<AppSettings> {
        &SETTINGS
    }

    fn get(&self, key: &str) -> Result<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| PatternError::not_found(format!("setting '{key}'")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<Option<String>> {
        if key.trim().is_empty() {
            return Err(PatternError::invalid_argument("Setting key cannot be empty"));
        }
        Ok(self.values.insert(key.to_string(), value.to_string()))
    }
}

fn yes_no(same: bool) -> &'static str {
    if same {
        "Yes"
    } else {
        "No"
    }
}

// =============================================================================
// Demo (cargo run --bin singleton)
// =============================================================================

fn database_demo(out: &Narrator) {
    let db1 = DatabaseConnection::instance();
    let db2 = DatabaseConnection::instance();
    narrate!(
        out,
        "Database connection established ({} initialisation)",
        database_initializations()
    );
    narrate!(out, "Are both instances the same? {}", yes_no(std::ptr::eq(db1, db2)));

    out.say(lock(db1).execute_query("SELECT * FROM products"));
    lock(db2).set_connection_string("database://remote:5432");
    out.say(lock(db1).execute_query("SELECT * FROM orders"));
}

/// Each worker returns its lines; the narrator itself never leaves this thread.
fn worker(id: usize) -> Vec<String> {
    let query = lock(DatabaseConnection::instance())
        .execute_query(&format!("SELECT * FROM users WHERE id = {id}"));
    let logged = Logger::instance().log(&format!("Worker thread {id} completed"));
    vec![query, logged]
}

fn threads_demo(out: &Narrator) -> Result<()> {
    out.blank();
    out.say("Testing thread safety:");
    let results: Vec<thread::Result<Vec<String>>> = thread::scope(|scope| {
        let handles: Vec<_> = (1..=5).map(|id| scope.spawn(move || worker(id))).collect();
        handles.into_iter().map(|handle| handle.join()).collect()
    });
    for result in results {
        let lines = result.map_err(|_| PatternError::fatal("worker thread panicked"))?;
        for line in lines {
            out.say(line);
        }
    }
    narrate!(out, "Connection opened {} time(s) across all threads", database_initializations());
    Ok(())
}

fn logger_demo(out: &Narrator) {
    out.blank();
    out.say("Testing Logger singleton:");
    let logger1 = Logger::instance();
    let logger2 = Logger::instance();
    narrate!(out, "Are both logger instances the same? {}", yes_no(std::ptr::eq(logger1, logger2)));
    out.say(logger1.log("Application started"));
    out.say(logger2.log("Application running"));
    narrate!(out, "Worker entries in shared log: {}", logger1.entries_containing("Worker thread"));
}

fn settings_demo(out: &Narrator) -> Result<()> {
    out.blank();
    out.say("Testing configuration singleton:");
    {
        let settings = lock(AppSettings::instance());
        narrate!(out, "{} v{}", settings.get("app.name")?, settings.get("app.version")?);
    }
    // A change made through one access is visible through every other.
    lock(AppSettings::instance()).set("db.pool_size", "25")?;
    let settings = lock(AppSettings::instance());
    narrate!(out, "Pool size seen elsewhere: {}", settings.get("db.pool_size")?);
    settings.get("feature.dark_mode").map(|_| ()).or_narrate(out)?;
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Singleton", |out, _config| {
        database_demo(out);
        threads_demo(out)?;
        logger_demo(out);
        settings_demo(out)?;
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin singleton)
// =============================================================================

// Tests share the process-wide instances and run in parallel, so they assert
// only on facts that hold under any interleaving.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_instance_every_access() {
        assert!(std::ptr::eq(DatabaseConnection::instance(), DatabaseConnection::instance()));
        assert!(std::ptr::eq(Logger::instance(), Logger::instance()));
        assert!(std::ptr::eq(AppSettings::instance(), AppSettings::instance()));
    }

    #[test]
    fn test_initialised_once_across_threads() {
        thread::scope(|scope| {
            for id in 0..8 {
                scope.spawn(move || worker(100 + id));
            }
        });
        assert_eq!(database_initializations(), 1);
        assert!(lock(DatabaseConnection::instance()).queries_executed >= 8);
    }

    #[test]
    fn test_logger_collects_from_every_thread() {
        thread::scope(|scope| {
            for id in 0..4 {
                scope.spawn(move || Logger::instance().log(&format!("collector {id}")));
            }
        });
        assert_eq!(Logger::instance().entries_containing("collector "), 4);
        assert_eq!(Logger::instance().log("hello"), "[LOG] hello");
    }

    #[test]
    fn test_settings_lookup_and_update() {
        let mut settings = AppSettings::defaults();
        assert_eq!(settings.get("app.version").unwrap(), "1.0.0");
        assert_eq!(settings.set("app.version", "1.1.0").unwrap().as_deref(), Some("1.0.0"));
        assert_eq!(settings.set("theme", "dark").unwrap(), None);
        assert_eq!(settings.get("missing").unwrap_err().kind(), ErrorKind::NotFound);
        assert!(settings.set(" ", "x").is_err());
    }

    #[test]
    fn test_query_narration() {
        let mut connection = DatabaseConnection {
            connection_string: "database://test".to_string(),
            queries_executed: 0,
        };
        assert_eq!(
            connection.execute_query("SELECT 1"),
            "Executing query: SELECT 1 on database://test"
        );
        assert_eq!(connection.queries_executed, 1);
    }

    #[test]
    fn test_demo_runs() {
        let out = Narrator::capture();
        database_demo(&out);
        threads_demo(&out).unwrap();
        logger_demo(&out);
        settings_demo(&out).unwrap();
        assert!(out.contains("Are both instances the same? Yes"));
        assert!(out.contains("Are both logger instances the same? Yes"));
        assert_eq!(out.count("Executing query: SELECT * FROM users WHERE id = "), 5);
        assert!(out.contains("[LOG] Worker thread 5 completed"));
        assert!(out.contains("Connection opened 1 time(s) across all threads"));
        assert!(out.contains("Pool size seen elsewhere: 25"));
        assert!(out.contains("❌ Not found: setting 'feature.dark_mode'"));
        let first = out.position("WHERE id = 1 ").unwrap_or(usize::MAX);
        let fifth = out.position("WHERE id = 5 ").unwrap_or(0);
        assert!(first < fifth);
    }
}
