use patterns::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::process::ExitCode;

// =============================================================================
// Role: Handler, and the chain that drives it
// =============================================================================

/// What a handler decided after acting on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Stop,
    Forward,
}

trait Handler<R> {
    fn name(&self) -> String;

    /// Pure routing predicate; never has effects.
    fn accepts(&self, request: &R) -> bool;

    fn handle(&mut self, request: &R, out: &Narrator) -> Result<Disposition>;
}

/// Ordered handler list. The order is the order of construction and nothing
/// else; there is no `set_next` to overwrite.
struct Chain<R> {
    handlers: Vec<Box<dyn Handler<R>>>,
    forward_note: String,
    out: Narrator,
}

impl<R: fmt::Display> Chain<R> {
    fn new(out: &Narrator) -> Self {
        Self {
            handlers: Vec::new(),
            forward_note: "Passing request to next handler...".to_string(),
            out: out.clone(),
        }
    }

    fn with(mut self, handler: impl Handler<R> + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    fn forward_note(mut self, note: &str) -> Self {
        self.forward_note = note.to_string();
        self
    }

    /// Names of the handlers that would act on `request`, in chain order.
    fn route(&self, request: &R) -> Vec<String> {
        self.handlers
            .iter()
            .filter(|handler| handler.accepts(request))
            .map(|handler| handler.name())
            .collect()
    }

    /// Walks the chain and returns the names of the handlers that acted.
    fn process(&mut self, request: &R) -> Result<Vec<String>> {
        let mut acted = Vec::new();
        let last = self.handlers.len().saturating_sub(1);

        for (index, handler) in self.handlers.iter_mut().enumerate() {
            if handler.accepts(request) {
                acted.push(handler.name());
                if handler.handle(request, &self.out)? == Disposition::Stop {
                    return Ok(acted);
                }
            } else if index < last {
                self.out.say(&self.forward_note);
            }
        }

        if acted.is_empty() {
            tracing::debug!(%request, "chain exhausted");
            narrate!(self.out, "❌ No handler found for request: {request}");
        }
        Ok(acted)
    }

    fn len(&self) -> usize {
        self.handlers.len()
    }
}

// =============================================================================
// Example 1: string requests (authentication, authorization, validation)
// =============================================================================

struct Authentication {
    user: String,
    password: String,
}

impl Handler<String> for Authentication {
    fn name(&self) -> String {
        "Authentication Handler".to_string()
    }

    fn accepts(&self, request: &String) -> bool {
        request.starts_with("auth:")
    }

    fn handle(&mut self, request: &String, out: &Narrator) -> Result<Disposition> {
        narrate!(out, "🔐 {} processing: {request}", self.name());
        match request["auth:".len()..].split_once(':') {
            Some((user, password)) if user == self.user && password == self.password => {
                narrate!(out, "✅ Authentication successful for user: {user}")
            }
            Some(_) => out.say("❌ Authentication failed!"),
            None => out.say("❌ Invalid credentials format!"),
        }
        Ok(Disposition::Stop)
    }
}

struct Authorization {
    allowed: Vec<&'static str>,
}

impl Handler<String> for Authorization {
    fn name(&self) -> String {
        "Authorization Handler".to_string()
    }

    fn accepts(&self, request: &String) -> bool {
        request.starts_with("authorize:")
    }

    fn handle(&mut self, request: &String, out: &Narrator) -> Result<Disposition> {
        narrate!(out, "🛡️ {} processing: {request}", self.name());
        let action = &request["authorize:".len()..];
        if self.allowed.iter().any(|allowed| *allowed == action) {
            narrate!(out, "✅ Action '{action}' is authorized");
        } else {
            narrate!(out, "❌ Action '{action}' is not authorized!");
        }
        Ok(Disposition::Stop)
    }
}

struct Validation;

impl Validation {
    fn check(data: &str) -> std::result::Result<(), &'static str> {
        if data.is_empty() {
            Err("Empty data!")
        } else if data.len() < 3 {
            Err("Data too short!")
        } else if data.contains(|c: char| "!@#$%^&*".contains(c)) {
            Err("Invalid characters!")
        } else {
            Ok(())
        }
    }
}

impl Handler<String> for Validation {
    fn name(&self) -> String {
        "Validation Handler".to_string()
    }

    fn accepts(&self, request: &String) -> bool {
        request.starts_with("validate:")
    }

    fn handle(&mut self, request: &String, out: &Narrator) -> Result<Disposition> {
        narrate!(out, "✔️ {} processing: {request}", self.name());
        let data = &request["validate:".len()..];
        match Self::check(data) {
            Ok(()) => narrate!(out, "✅ Validation successful for: {data}"),
            Err(reason) => narrate!(out, "❌ Validation failed: {reason}"),
        }
        Ok(Disposition::Stop)
    }
}

// =============================================================================
// Example 2: support tickets
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    General,
    Account,
    Technical,
    Software,
    Security,
    Infrastructure,
}

#[derive(Debug, Clone)]
struct Ticket {
    id: u32,
    description: String,
    priority: Priority,
    category: Category,
}

impl Ticket {
    fn new(id: u32, description: &str, priority: Priority, category: Category) -> Self {
        Self {
            id,
            description: description.to_string(),
            priority,
            category,
        }
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ticket #{} [{}] {:?}: {}",
            self.id,
            format!("{:?}", self.priority).to_uppercase(),
            self.category,
            self.description
        )
    }
}

/// Which tickets a support tier takes on.
enum Coverage {
    /// Priority at most the bound and category in the set.
    UpTo(Priority, &'static [Category]),
    /// Critical priority, or any ticket in the set.
    CriticalOr(&'static [Category]),
}

struct SupportTier {
    name: &'static str,
    icon: &'static str,
    action: &'static str,
    resolution: &'static str,
    coverage: Coverage,
    resolved: Vec<u32>,
}

impl SupportTier {
    fn level1() -> Self {
        Self {
            name: "Level 1 Support",
            icon: "🎧",
            action: "Providing basic troubleshooting steps...",
            resolution: "Ticket resolved by Level 1 Support",
            coverage: Coverage::UpTo(Priority::Medium, &[Category::General, Category::Account]),
            resolved: Vec::new(),
        }
    }

    fn level2() -> Self {
        Self {
            name: "Level 2 Support",
            icon: "🔧",
            action: "Performing advanced diagnostics...",
            resolution: "Ticket resolved by Level 2 Support",
            coverage: Coverage::UpTo(Priority::High, &[Category::Technical, Category::Software]),
            resolved: Vec::new(),
        }
    }

    fn level3() -> Self {
        Self {
            name: "Level 3 Support",
            icon: "🚨",
            action: "Engaging senior engineers...",
            resolution: "Critical issue handled by Level 3 Support",
            coverage: Coverage::CriticalOr(&[Category::Security, Category::Infrastructure]),
            resolved: Vec::new(),
        }
    }
}

impl Handler<Ticket> for SupportTier {
    fn name(&self) -> String {
        self.name.to_string()
    }

    fn accepts(&self, ticket: &Ticket) -> bool {
        match self.coverage {
            Coverage::UpTo(max, categories) => {
                ticket.priority <= max && categories.contains(&ticket.category)
            }
            Coverage::CriticalOr(categories) => {
                ticket.priority == Priority::Critical || categories.contains(&ticket.category)
            }
        }
    }

    fn handle(&mut self, ticket: &Ticket, out: &Narrator) -> Result<Disposition> {
        narrate!(out, "{} {} handling: {ticket}", self.icon, self.name);
        narrate!(out, "   {}", self.action);
        narrate!(out, "   ✅ {}", self.resolution);
        self.resolved.push(ticket.id);
        Ok(Disposition::Stop)
    }
}

fn support_chain(out: &Narrator) -> Chain<Ticket> {
    Chain::new(out)
        .forward_note("Escalating to next level...")
        .with(SupportTier::level1())
        .with(SupportTier::level2())
        .with(SupportTier::level3())
}

// =============================================================================
// Example 3: HTTP middleware (handle-and-forward)
// =============================================================================

#[derive(Debug, Clone)]
struct HttpRequest {
    method: String,
    path: String,
    client_ip: String,
    headers: HashMap<String, String>,
}

impl HttpRequest {
    fn new(method: &str, path: &str, client_ip: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            client_ip: client_ip.to_string(),
            headers: HashMap::new(),
        }
    }

    fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }
}

impl fmt::Display for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} from {}", self.method, self.path, self.client_ip)
    }
}

struct RateLimiter {
    max_per_minute: u32,
    counts: HashMap<String, u32>,
}

impl RateLimiter {
    fn new(max_per_minute: u32) -> Self {
        Self {
            max_per_minute,
            counts: HashMap::new(),
        }
    }
}

impl Handler<HttpRequest> for RateLimiter {
    fn name(&self) -> String {
        "Rate Limit Handler".to_string()
    }

    fn accepts(&self, _request: &HttpRequest) -> bool {
        true
    }

    fn handle(&mut self, request: &HttpRequest, out: &Narrator) -> Result<Disposition> {
        narrate!(out, "🚦 {} checking: {request}", self.name());
        let count = self.counts.entry(request.client_ip.clone()).or_insert(0);
        *count += 1;
        if *count > self.max_per_minute {
            narrate!(out, "   ❌ Rate limit exceeded for IP: {}", request.client_ip);
            return Ok(Disposition::Stop);
        }
        narrate!(out, "   ✅ Rate limit OK ({count}/{})", self.max_per_minute);
        Ok(Disposition::Forward)
    }
}

struct TokenAuth {
    valid_token: String,
}

impl Handler<HttpRequest> for TokenAuth {
    fn name(&self) -> String {
        "Authentication Handler".to_string()
    }

    fn accepts(&self, request: &HttpRequest) -> bool {
        request.path.starts_with("/api/") || request.path.starts_with("/admin/")
    }

    fn handle(&mut self, request: &HttpRequest, out: &Narrator) -> Result<Disposition> {
        narrate!(out, "🔑 {} checking: {request}", self.name());
        match request.headers.get("Authorization") {
            None => {
                out.say("   ❌ Missing Authorization header");
                Ok(Disposition::Stop)
            }
            Some(token) if *token == self.valid_token => {
                out.say("   ✅ Authentication successful");
                Ok(Disposition::Forward)
            }
            Some(_) => {
                out.say("   ❌ Invalid authentication token");
                Ok(Disposition::Stop)
            }
        }
    }
}

#[derive(Default)]
struct ResponseCache {
    entries: HashMap<String, String>,
}

impl Handler<HttpRequest> for ResponseCache {
    fn name(&self) -> String {
        "Cache Handler".to_string()
    }

    fn accepts(&self, request: &HttpRequest) -> bool {
        request.method == "GET"
    }

    fn handle(&mut self, request: &HttpRequest, out: &Narrator) -> Result<Disposition> {
        narrate!(out, "💾 {} checking: {request}", self.name());
        if let Some(response) = self.entries.get(&request.path) {
            narrate!(out, "   ✅ Cache hit for: {}", request.path);
            narrate!(out, "   Returning cached response: {response}");
            return Ok(Disposition::Stop);
        }
        narrate!(out, "   ❌ Cache miss for: {}", request.path);
        self.entries.insert(
            request.path.clone(),
            format!("Cached response for {}", request.path),
        );
        Ok(Disposition::Forward)
    }
}

struct Router;

impl Handler<HttpRequest> for Router {
    fn name(&self) -> String {
        "Route Handler".to_string()
    }

    fn accepts(&self, _request: &HttpRequest) -> bool {
        true
    }

    fn handle(&mut self, request: &HttpRequest, out: &Narrator) -> Result<Disposition> {
        narrate!(out, "🛣️ {} processing: {request}", self.name());
        let path = request.path.as_str();
        if path == "/" {
            out.say("   📄 Serving home page");
        } else if path.starts_with("/api/") {
            out.say("   🔌 Processing API request");
        } else if path.starts_with("/static/") {
            out.say("   📁 Serving static file");
        } else {
            out.say("   ❌ 404 - Page not found");
            return Ok(Disposition::Stop);
        }
        out.say("   ✅ Request processed successfully");
        Ok(Disposition::Stop)
    }
}

fn http_chain(out: &Narrator, max_per_minute: u32) -> Chain<HttpRequest> {
    Chain::new(out)
        .with(RateLimiter::new(max_per_minute))
        .with(TokenAuth {
            valid_token: "Bearer valid_token".to_string(),
        })
        .with(ResponseCache::default())
        .with(Router)
}

// =============================================================================
// Example 4: closure handlers
// =============================================================================

struct FnHandler<R> {
    name: String,
    accepts: Box<dyn Fn(&R) -> bool>,
    handle: Box<dyn FnMut(&R, &Narrator) -> Disposition>,
}

impl<R> FnHandler<R> {
    fn new(
        name: &str,
        accepts: impl Fn(&R) -> bool + 'static,
        handle: impl FnMut(&R, &Narrator) -> Disposition + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            accepts: Box::new(accepts),
            handle: Box::new(handle),
        }
    }
}

impl<R> Handler<R> for FnHandler<R> {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn accepts(&self, request: &R) -> bool {
        (self.accepts)(request)
    }

    fn handle(&mut self, request: &R, out: &Narrator) -> Result<Disposition> {
        Ok((self.handle)(request, out))
    }
}

fn contact_chain(out: &Narrator) -> Chain<String> {
    Chain::new(out)
        .with(FnHandler::new(
            "Email handler",
            |request: &String| request.starts_with("email:"),
            |request: &String, out: &Narrator| {
                let email = &request["email:".len()..];
                narrate!(out, "📧 Email handler processing: {email}");
                if email.contains('@') {
                    out.say("   ✅ Valid email format");
                } else {
                    out.say("   ❌ Invalid email format");
                }
                Disposition::Stop
            },
        ))
        .with(FnHandler::new(
            "Phone handler",
            |request: &String| request.starts_with("phone:"),
            |request: &String, out: &Narrator| {
                let phone = &request["phone:".len()..];
                narrate!(out, "📞 Phone handler processing: {phone}");
                if phone.len() >= 10 {
                    out.say("   ✅ Valid phone number");
                } else {
                    out.say("   ❌ Invalid phone number");
                }
                Disposition::Stop
            },
        ))
}

// =============================================================================
// Demo (cargo run --bin chain_of_responsibility)
// =============================================================================

fn request_chain(out: &Narrator) -> Chain<String> {
    Chain::new(out)
        .with(Authentication {
            user: "admin".to_string(),
            password: "password123".to_string(),
        })
        .with(Authorization {
            allowed: vec!["read", "write", "delete"],
        })
        .with(Validation)
}

fn main() -> ExitCode {
    patterns::runner::run("Chain of Responsibility", |out, _config| {
        out.section(1, "Authentication and Authorization Chain");
        let mut chain = request_chain(out);
        for request in [
            "auth:admin:password123",
            "auth:user:wrongpassword",
            "authorize:read",
            "authorize:execute",
            "validate:ValidData123",
            "validate:x",
            "validate:",
            "unknown:request",
        ] {
            out.blank();
            narrate!(out, "Processing request: {request}");
            chain.process(&request.to_string())?;
        }

        out.section(2, "Support Ticket System");
        let mut support = support_chain(out);
        let tickets = [
            Ticket::new(1, "Password reset request", Priority::Low, Category::Account),
            Ticket::new(2, "Software installation issue", Priority::Medium, Category::Technical),
            Ticket::new(3, "Server down", Priority::Critical, Category::Infrastructure),
            Ticket::new(4, "Security breach detected", Priority::Critical, Category::Security),
            Ticket::new(5, "General inquiry", Priority::Low, Category::General),
            Ticket::new(6, "Refund dispute", Priority::High, Category::Account),
        ];
        for ticket in &tickets {
            out.blank();
            narrate!(out, "New ticket: {ticket}");
            support.process(ticket)?;
        }

        out.section(3, "HTTP Request Processing Chain");
        let mut middleware = http_chain(out, 2);
        let requests = [
            HttpRequest::new("GET", "/", "192.168.1.1"),
            HttpRequest::new("GET", "/api/users", "192.168.1.2")
                .header("Authorization", "Bearer valid_token"),
            HttpRequest::new("GET", "/api/users", "192.168.1.3")
                .header("Authorization", "Bearer valid_token"),
            HttpRequest::new("GET", "/api/data", "192.168.1.3"),
            HttpRequest::new("POST", "/api/upload", "192.168.1.1")
                .header("Authorization", "Bearer invalid_token"),
            HttpRequest::new("GET", "/static/style.css", "192.168.1.4"),
            HttpRequest::new("GET", "/missing", "192.168.1.4"),
            HttpRequest::new("GET", "/", "192.168.1.1"),
        ];
        for request in &requests {
            out.blank();
            narrate!(out, "Processing HTTP request: {request}");
            middleware.process(request)?;
        }

        out.section(4, "Functional Chain of Responsibility");
        let mut contacts = contact_chain(out);
        for request in [
            "email:user@example.com",
            "email:invalid-email",
            "phone:1234567890",
            "phone:123",
            "unknown:request",
        ] {
            out.blank();
            narrate!(out, "Processing: {request}");
            contacts.process(&request.to_string())?;
        }

        out.blank();
        out.say("Processing with an empty chain:");
        let mut empty: Chain<String> = Chain::new(out);
        narrate!(out, "Chain length: {}", empty.len());
        empty.process(&"anything".to_string())?;

        out.section(5, "Chain of Responsibility Benefits");
        out.checklist(&[
            "Decouples sender from receivers",
            "Easy to add or change handlers",
            "Routing is testable apart from handling",
            "Handlers can act and forward, or stop the chain",
        ]);
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin chain_of_responsibility)
// =============================================================================
