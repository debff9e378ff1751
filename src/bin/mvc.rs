use patterns::prelude::*;
use serde::Serialize;
use std::process::ExitCode;

// =============================================================================
// Model
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct User {
    id: u32,
    name: String,
    email: String,
}

fn check_email(email: &str) -> Result<()> {
    if email.contains('@') {
        Ok(())
    } else {
        Err(PatternError::invalid_argument(format!("'{email}' is not an email address")))
    }
}

/// Owns the users and enforces their invariants; knows nothing about display.
#[derive(Debug, Default)]
struct UserModel {
    users: Vec<User>,
}

impl UserModel {
    fn add_user(&mut self, id: u32, name: &str, email: &str) -> Result<()> {
        if name.trim().is_empty() || email.trim().is_empty() {
            return Err(PatternError::invalid_argument("Name and email cannot be empty"));
        }
        check_email(email)?;
        if self.user(id).is_some() {
            return Err(PatternError::precondition(format!("User with ID {id} already exists")));
        }
        self.users.push(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
        });
        Ok(())
    }

    fn user(&self, id: u32) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    fn users(&self) -> &[User] {
        &self.users
    }

    fn update_email(&mut self, id: u32, email: &str) -> Result<()> {
        check_email(email)?;
        let user = self
            .users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or_else(|| PatternError::not_found(format!("user {id}")))?;
        user.email = email.to_string();
        Ok(())
    }

    fn remove_user(&mut self, id: u32) -> bool {
        let before = self.users.len();
        self.users.retain(|user| user.id != id);
        self.users.len() != before
    }

    fn user_count(&self) -> usize {
        self.users.len()
    }
}

// =============================================================================
// Views
// =============================================================================

/// Rendering only. The provided methods give a plain-text look that
/// concrete views override piecemeal.
trait UserView {
    fn out(&self) -> &Narrator;

    fn display_user(&self, user: &User) -> Result<()> {
        let out = self.out();
        narrate!(out, "User ID: {}", user.id);
        narrate!(out, "Name: {}", user.name);
        narrate!(out, "Email: {}", user.email);
        out.say("---");
        Ok(())
    }

    fn display_all(&self, users: &[User]) -> Result<()> {
        self.out().say("=== All Users ===");
        for user in users {
            self.display_user(user)?;
        }
        Ok(())
    }

    fn display_message(&self, message: &str) {
        narrate!(self.out(), "Message: {message}");
    }

    fn display_error(&self, error: &str) {
        narrate!(self.out(), "Error: {error}");
    }

    fn display_not_found(&self, id: u32) {
        narrate!(self.out(), "User with ID {id} not found");
    }
}

struct PlainUserView {
    out: Narrator,
}

impl UserView for PlainUserView {
    fn out(&self) -> &Narrator {
        &self.out
    }
}

struct ConsoleUserView {
    out: Narrator,
}

impl UserView for ConsoleUserView {
    fn out(&self) -> &Narrator {
        &self.out
    }

    fn display_user(&self, user: &User) -> Result<()> {
        let rule = "─".repeat(25);
        narrate!(self.out, "┌{rule}");
        narrate!(self.out, "│ User ID: {}", user.id);
        narrate!(self.out, "│ Name: {}", user.name);
        narrate!(self.out, "│ Email: {}", user.email);
        narrate!(self.out, "└{rule}");
        Ok(())
    }
}

struct JsonUserView {
    out: Narrator,
}

impl UserView for JsonUserView {
    fn out(&self) -> &Narrator {
        &self.out
    }

    fn display_user(&self, user: &User) -> Result<()> {
        self.out.say(serde_json::to_string_pretty(user)?);
        Ok(())
    }

    /// One JSON array rather than a sequence of objects.
    fn display_all(&self, users: &[User]) -> Result<()> {
        self.out.say(serde_json::to_string_pretty(users)?);
        Ok(())
    }

    fn display_message(&self, message: &str) {
        self.out.say(serde_json::json!({ "message": message }).to_string());
    }

    fn display_error(&self, error: &str) {
        self.out.say(serde_json::json!({ "error": error }).to_string());
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Translates requests into model calls and picks what the view shows.
/// Rejected requests are shown as errors; only fatal failures propagate.
struct UserController {
    model: UserModel,
    view: Box<dyn UserView>,
}

impl UserController {
    fn new(model: UserModel, view: Box<dyn UserView>) -> Self {
        Self { model, view }
    }

    fn reject(&self, err: PatternError) -> Result<bool> {
        if err.is_fatal() {
            return Err(err);
        }
        tracing::debug!(kind = ?err.kind(), %err, "request rejected");
        self.view.display_error(&err.to_string());
        Ok(false)
    }

    fn add_user(&mut self, id: u32, name: &str, email: &str) -> Result<bool> {
        match self.model.add_user(id, name, email) {
            Ok(()) => {
                self.view.display_message("User added successfully");
                Ok(true)
            }
            Err(err) => self.reject(err),
        }
    }

    fn show_user(&self, id: u32) -> Result<bool> {
        match self.model.user(id) {
            Some(user) => {
                self.view.display_user(user)?;
                Ok(true)
            }
            None => {
                self.view.display_not_found(id);
                Ok(false)
            }
        }
    }

    fn show_all_users(&self) -> Result<()> {
        let users = self.model.users();
        if users.is_empty() {
            self.view.display_message("No users found");
            Ok(())
        } else {
            self.view.display_all(users)
        }
    }

    fn change_email(&mut self, id: u32, email: &str) -> Result<bool> {
        match self.model.update_email(id, email) {
            Ok(()) => {
                self.view.display_message("Email updated");
                Ok(true)
            }
            Err(err) => self.reject(err),
        }
    }

    fn remove_user(&mut self, id: u32) -> bool {
        let removed = self.model.remove_user(id);
        if removed {
            self.view.display_message("User removed successfully");
        } else {
            self.view.display_not_found(id);
        }
        removed
    }

    fn show_user_count(&self) {
        self.view
            .display_message(&format!("Total users: {}", self.model.user_count()));
    }

    /// Same model, different presentation.
    fn set_view(&mut self, view: Box<dyn UserView>) {
        self.view = view;
    }
}

// =============================================================================
// Demo (cargo run --bin mvc)
// =============================================================================

fn console_demo(out: &Narrator) -> Result<UserController> {
    let view = Box::new(ConsoleUserView { out: out.clone() });
    let mut controller = UserController::new(UserModel::default(), view);
    controller.add_user(1, "Alice Johnson", "alice@example.com")?;
    controller.add_user(2, "Bob Smith", "bob@example.com")?;
    controller.add_user(3, "Charlie Brown", "charlie@example.com")?;
    out.blank();
    controller.show_user_count();

    out.blank();
    out.say("Showing user with ID 2:");
    controller.show_user(2)?;

    out.blank();
    out.say("Showing all users:");
    controller.show_all_users()?;

    out.blank();
    out.say("Trying to show user with ID 999:");
    controller.show_user(999)?;

    out.blank();
    out.say("Testing error handling:");
    controller.add_user(4, "", "invalid@example.com")?;
    controller.add_user(1, "Duplicate", "duplicate@example.com")?;
    controller.add_user(5, "Eve", "eve.example.com")?;
    controller.change_email(42, "ghost@example.com")?;

    out.blank();
    out.say("Removing user with ID 2:");
    controller.remove_user(2);
    controller.show_user_count();
    Ok(controller)
}

fn views_demo(out: &Narrator, mut controller: UserController) -> Result<()> {
    out.blank();
    out.say("=== Switching to the plain view ===");
    controller.set_view(Box::new(PlainUserView { out: out.clone() }));
    controller.change_email(3, "charlie.brown@example.com")?;
    controller.show_user(3)?;

    out.blank();
    out.say("=== Using JSON View ===");
    controller.set_view(Box::new(JsonUserView { out: out.clone() }));
    controller.add_user(6, "John Doe", "john@example.com")?;
    controller.show_user(6)?;
    controller.show_all_users()?;
    controller.add_user(6, "John Again", "john2@example.com")?;
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("MVC", |out, _config| {
        let controller = console_demo(out)?;
        views_demo(out, controller)
    })
}

// =============================================================================
// Tests (cargo test --bin mvc)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_invariants() {
        let mut model = UserModel::default();
        model.add_user(1, "Ann", "ann@example.com").unwrap();
        let duplicate = model.add_user(1, "Dup", "d@example.com").unwrap_err();
        assert_eq!(duplicate.kind(), ErrorKind::PreconditionFailed);
        let blank = model.add_user(2, " ", "x@example.com").unwrap_err();
        assert_eq!(blank.kind(), ErrorKind::InvalidArgument);
        assert!(model.add_user(3, "Bo", "bo-at-example").is_err());
        assert_eq!(model.user_count(), 1);

        assert_eq!(model.update_email(9, "a@b").unwrap_err().kind(), ErrorKind::NotFound);
        model.update_email(1, "ann@new.example").unwrap();
        assert_eq!(model.user(1).unwrap().email, "ann@new.example");

        assert!(model.remove_user(1));
        assert!(!model.remove_user(1));
        assert!(model.users().is_empty());
    }

    #[test]
    fn test_controller_routes_errors_to_view() {
        let out = Narrator::capture();
        let view = Box::new(PlainUserView { out: out.clone() });
        let mut controller = UserController::new(UserModel::default(), view);
        assert!(controller.add_user(1, "Ann", "ann@example.com").unwrap());
        assert!(!controller.add_user(1, "Ann", "ann@example.com").unwrap());
        assert!(!controller.show_user(2).unwrap());
        assert_eq!(
            out.lines(),
            vec![
                "Message: User added successfully",
                "Error: User with ID 1 already exists",
                "User with ID 2 not found",
            ]
        );
    }

    #[test]
    fn test_console_view_box() {
        let out = Narrator::capture();
        let view = ConsoleUserView { out: out.clone() };
        view.display_user(&User { id: 7, name: "Kim".into(), email: "kim@example.com".into() })
            .unwrap();
        let lines = out.lines();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with('┌'));
        assert_eq!(lines[2], "│ Name: Kim");
        assert!(lines[4].starts_with('└'));
    }

    #[test]
    fn test_json_view() {
        let out = Narrator::capture();
        let view = JsonUserView { out: out.clone() };
        let user = User { id: 1, name: "John \"JD\" Doe".into(), email: "john@example.com".into() };
        view.display_user(&user).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out.transcript()).unwrap();
        assert_eq!(parsed["id"], 1);
        assert_eq!(parsed["name"], "John \"JD\" Doe");

        let out = Narrator::capture();
        let view = JsonUserView { out: out.clone() };
        view.display_error("boom");
        view.display_not_found(3);
        assert_eq!(out.lines(), vec![r#"{"error":"boom"}"#, "User with ID 3 not found"]);
    }

    #[test]
    fn test_empty_listing() {
        let out = Narrator::capture();
        let view = Box::new(PlainUserView { out: out.clone() });
        let controller = UserController::new(UserModel::default(), view);
        controller.show_all_users().unwrap();
        assert_eq!(out.lines(), vec!["Message: No users found"]);
    }

    #[test]
    fn test_demo_runs() {
        let out = Narrator::capture();
        let controller = console_demo(&out).unwrap();
        assert_eq!(controller.model.user_count(), 2);
        views_demo(&out, controller).unwrap();
        assert_eq!(out.count("Message: User added successfully"), 3);
        assert!(out.contains("Message: Total users: 3"));
        assert!(out.contains("Message: Total users: 2"));
        assert!(out.contains("User with ID 999 not found"));
        assert!(out.contains("Error: Invalid argument: Name and email cannot be empty"));
        assert!(out.contains("Error: User with ID 1 already exists"));
        assert!(out.contains("Error: Not found: user 42"));
        assert!(out.contains("Email: charlie.brown@example.com"));
        assert!(out.contains(r#"{"message":"User added successfully"}"#));
        assert!(out.contains(r#"  "email": "john@example.com""#));
        assert!(out.contains(r#"{"error":"User with ID 6 already exists"}"#));
    }
}
