use patterns::prelude::*;
use std::fmt;
use std::process::ExitCode;
use std::str::FromStr;

// =============================================================================
// Widget roles
// =============================================================================

trait Button {
    fn render(&self) -> String;
    fn click(&self) -> String;
    fn theme(&self) -> Theme;
}

trait TextField {
    fn render(&self) -> String;
    fn set_value(&mut self, value: &str);
    fn value(&self) -> &str;
    fn theme(&self) -> Theme;
}

trait Checkbox {
    fn render(&self) -> String;
    fn set_checked(&mut self, checked: bool);
    fn is_checked(&self) -> bool;
    fn theme(&self) -> Theme;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Theme {
    Windows,
    Mac,
    Linux,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theme::Windows => "Windows",
            Theme::Mac => "macOS",
            Theme::Linux => "Linux",
        };
        f.write_str(name)
    }
}

impl FromStr for Theme {
    type Err = PatternError;

    fn from_str(os: &str) -> Result<Self> {
        match os {
            "Windows" => Ok(Theme::Windows),
            "macOS" => Ok(Theme::Mac),
            "Linux" => Ok(Theme::Linux),
            other => Err(PatternError::invalid_argument(format!("Unsupported OS: {other}"))),
        }
    }
}

// =============================================================================
// Windows family
// =============================================================================

struct WindowsButton {
    text: String,
}

impl Button for WindowsButton {
    fn render(&self) -> String {
        format!("[Windows Button: {}]", self.text)
    }

    fn click(&self) -> String {
        format!("Windows button '{}' clicked with mouse", self.text)
    }

    fn theme(&self) -> Theme {
        Theme::Windows
    }
}

#[derive(Default)]
struct WindowsTextField {
    value: String,
}

impl TextField for WindowsTextField {
    fn render(&self) -> String {
        format!("[Windows TextField: {}]", self.value)
    }

    fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn theme(&self) -> Theme {
        Theme::Windows
    }
}

#[derive(Default)]
struct WindowsCheckbox {
    checked: bool,
}

impl Checkbox for WindowsCheckbox {
    fn render(&self) -> String {
        format!("[Windows Checkbox: {}]", if self.checked { "☑" } else { "☐" })
    }

    fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    fn is_checked(&self) -> bool {
        self.checked
    }

    fn theme(&self) -> Theme {
        Theme::Windows
    }
}

// =============================================================================
// macOS family
// =============================================================================

struct MacButton {
    text: String,
}

impl Button for MacButton {
    fn render(&self) -> String {
        format!("( {} )", self.text)
    }

    fn click(&self) -> String {
        format!("Mac button '{}' clicked with trackpad", self.text)
    }

    fn theme(&self) -> Theme {
        Theme::Mac
    }
}

#[derive(Default)]
struct MacTextField {
    value: String,
}

impl TextField for MacTextField {
    fn render(&self) -> String {
        format!("│ {} │", self.value)
    }

    fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn theme(&self) -> Theme {
        Theme::Mac
    }
}

#[derive(Default)]
struct MacCheckbox {
    checked: bool,
}

impl Checkbox for MacCheckbox {
    fn render(&self) -> String {
        format!("{} Mac checkbox", if self.checked { "✓" } else { "○" })
    }

    fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    fn is_checked(&self) -> bool {
        self.checked
    }

    fn theme(&self) -> Theme {
        Theme::Mac
    }
}

// =============================================================================
// Linux family
// =============================================================================

struct LinuxButton {
    text: String,
}

impl Button for LinuxButton {
    fn render(&self) -> String {
        format!("< {} >", self.text)
    }

    fn click(&self) -> String {
        format!("Linux button '{}' clicked", self.text)
    }

    fn theme(&self) -> Theme {
        Theme::Linux
    }
}

#[derive(Default)]
struct LinuxTextField {
    value: String,
}

impl TextField for LinuxTextField {
    fn render(&self) -> String {
        format!("[ {} ]", self.value)
    }

    fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn theme(&self) -> Theme {
        Theme::Linux
    }
}

#[derive(Default)]
struct LinuxCheckbox {
    checked: bool,
}

impl Checkbox for LinuxCheckbox {
    fn render(&self) -> String {
        format!("[{}] Linux checkbox", if self.checked { "x" } else { " " })
    }

    fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    fn is_checked(&self) -> bool {
        self.checked
    }

    fn theme(&self) -> Theme {
        Theme::Linux
    }
}

// =============================================================================
// Factories
// =============================================================================

/// One factory per platform; every widget it makes belongs to the same family.
trait UiFactory {
    fn create_button(&self, text: &str) -> Box<dyn Button>;
    fn create_text_field(&self) -> Box<dyn TextField>;
    fn create_checkbox(&self) -> Box<dyn Checkbox>;
    fn theme(&self) -> Theme;
}

struct WindowsUiFactory;

impl UiFactory for WindowsUiFactory {
    fn create_button(&self, text: &str) -> Box<dyn Button> {
        Box::new(WindowsButton { text: text.to_string() })
    }

    fn create_text_field(&self) -> Box<dyn TextField> {
        Box::new(WindowsTextField::default())
    }

    fn create_checkbox(&self) -> Box<dyn Checkbox> {
        Box::new(WindowsCheckbox::default())
    }

    fn theme(&self) -> Theme {
        Theme::Windows
    }
}

struct MacUiFactory;

impl UiFactory for MacUiFactory {
    fn create_button(&self, text: &str) -> Box<dyn Button> {
        Box::new(MacButton { text: text.to_string() })
    }

    fn create_text_field(&self) -> Box<dyn TextField> {
        Box::new(MacTextField::default())
    }

    fn create_checkbox(&self) -> Box<dyn Checkbox> {
        Box::new(MacCheckbox::default())
    }

    fn theme(&self) -> Theme {
        Theme::Mac
    }
}

struct LinuxUiFactory;

impl UiFactory for LinuxUiFactory {
    fn create_button(&self, text: &str) -> Box<dyn Button> {
        Box::new(LinuxButton { text: text.to_string() })
    }

    fn create_text_field(&self) -> Box<dyn TextField> {
        Box::new(LinuxTextField::default())
    }

    fn create_checkbox(&self) -> Box<dyn Checkbox> {
        Box::new(LinuxCheckbox::default())
    }

    fn theme(&self) -> Theme {
        Theme::Linux
    }
}

fn factory_for(theme: Theme) -> Box<dyn UiFactory> {
    match theme {
        Theme::Windows => Box::new(WindowsUiFactory),
        Theme::Mac => Box::new(MacUiFactory),
        Theme::Linux => Box::new(LinuxUiFactory),
    }
}

fn create_ui_factory(os: &str) -> Result<Box<dyn UiFactory>> {
    Ok(factory_for(os.parse()?))
}

// =============================================================================
// Client
// =============================================================================

/// Knows only the abstract roles; the factory decides the look.
struct Application {
    factory: Box<dyn UiFactory>,
    buttons: Vec<Box<dyn Button>>,
    text_fields: Vec<Box<dyn TextField>>,
    checkboxes: Vec<Box<dyn Checkbox>>,
}

impl Application {
    fn new(factory: Box<dyn UiFactory>) -> Self {
        Self {
            factory,
            buttons: Vec::new(),
            text_fields: Vec::new(),
            checkboxes: Vec::new(),
        }
    }

    fn create_ui(&mut self, out: &Narrator) {
        narrate!(out, "Creating UI with {} theme:", self.factory.theme());
        self.buttons.push(self.factory.create_button("OK"));
        self.buttons.push(self.factory.create_button("Cancel"));

        for (label, checked) in [("Username", true), ("Password", false)] {
            let mut field = self.factory.create_text_field();
            field.set_value(label);
            self.text_fields.push(field);

            let mut checkbox = self.factory.create_checkbox();
            checkbox.set_checked(checked);
            self.checkboxes.push(checkbox);
        }
    }

    fn render_ui(&self, out: &Narrator) {
        out.blank();
        narrate!(out, "Rendering {} UI:", self.factory.theme());
        out.say("-".repeat(24));
        for field in &self.text_fields {
            out.say(field.render());
        }
        for checkbox in &self.checkboxes {
            out.say(checkbox.render());
        }
        for button in &self.buttons {
            out.say(button.render());
        }
    }

    fn simulate_interaction(&mut self, out: &Narrator) {
        out.blank();
        out.say("Simulating user interaction:");
        if let Some(button) = self.buttons.first() {
            out.say(button.click());
        }
        if let Some(field) = self.text_fields.first_mut() {
            field.set_value("john_doe");
            narrate!(out, "Text field updated to: {}", field.value());
        }
        if let Some(checkbox) = self.checkboxes.get_mut(1) {
            checkbox.set_checked(true);
            let state = if checkbox.is_checked() { "checked" } else { "unchecked" };
            narrate!(out, "Checkbox 2 is now: {state}");
        }
    }

    /// True when every widget came from the application's own family.
    fn is_consistent(&self) -> bool {
        let theme = self.factory.theme();
        self.buttons.iter().all(|w| w.theme() == theme)
            && self.text_fields.iter().all(|w| w.theme() == theme)
            && self.checkboxes.iter().all(|w| w.theme() == theme)
    }

    fn widget_count(&self) -> usize {
        self.buttons.len() + self.text_fields.len() + self.checkboxes.len()
    }
}

// =============================================================================
// Demo (cargo run --bin abstract_factory)
// =============================================================================

fn platforms_demo(out: &Narrator) -> Result<()> {
    for os in ["Windows", "macOS", "Linux", "BeOS"] {
        out.blank();
        out.say("=".repeat(50));
        let Some(factory) = create_ui_factory(os).or_narrate(out)? else {
            continue;
        };
        let mut app = Application::new(factory);
        app.create_ui(out);
        app.render_ui(out);
        app.simulate_interaction(out);
        if !app.is_consistent() {
            return Err(PatternError::fatal(format!("{os} UI mixes widget families")));
        }
        narrate!(
            out,
            "{} widgets, all from the {} family",
            app.widget_count(),
            app.factory.theme()
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Abstract Factory", |out, _config| platforms_demo(out))
}

// =============================================================================
// Tests (cargo test --bin abstract_factory)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_selection() {
        assert_eq!(create_ui_factory("Windows").unwrap().theme(), Theme::Windows);
        assert_eq!(create_ui_factory("macOS").unwrap().theme(), Theme::Mac);
        assert_eq!(create_ui_factory("Linux").unwrap().theme(), Theme::Linux);
        let err = create_ui_factory("linux").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.to_string(), "Invalid argument: Unsupported OS: linux");
    }

    #[test]
    fn test_each_factory_builds_one_family() {
        for theme in [Theme::Windows, Theme::Mac, Theme::Linux] {
            let factory = factory_for(theme);
            assert_eq!(factory.create_button("x").theme(), theme);
            assert_eq!(factory.create_text_field().theme(), theme);
            assert_eq!(factory.create_checkbox().theme(), theme);
        }
    }

    #[test]
    fn test_widget_rendering() {
        let mac = MacUiFactory;
        let mut checkbox = mac.create_checkbox();
        assert_eq!(checkbox.render(), "○ Mac checkbox");
        checkbox.set_checked(true);
        assert_eq!(checkbox.render(), "✓ Mac checkbox");

        let mut field = LinuxUiFactory.create_text_field();
        field.set_value("abc");
        assert_eq!(field.render(), "[ abc ]");
        assert_eq!(WindowsUiFactory.create_button("Go").render(), "[Windows Button: Go]");
    }

    #[test]
    fn test_application_lifecycle() {
        let out = Narrator::capture();
        let mut app = Application::new(factory_for(Theme::Linux));
        app.create_ui(&out);
        assert_eq!(app.widget_count(), 6);
        assert!(app.is_consistent());
        assert_eq!(app.text_fields[1].value(), "Password");

        app.simulate_interaction(&out);
        assert_eq!(app.text_fields[0].value(), "john_doe");
        assert!(app.checkboxes[1].is_checked());
        assert!(out.contains("Linux button 'OK' clicked"));
        assert!(out.contains("Checkbox 2 is now: checked"));
    }

    #[test]
    fn test_render_order() {
        let out = Narrator::capture();
        let mut app = Application::new(factory_for(Theme::Windows));
        app.create_ui(&out);
        app.render_ui(&out);
        let field = out.position("[Windows TextField: Username]").unwrap();
        let checkbox = out.position("[Windows Checkbox: ☑]").unwrap();
        let button = out.position("[Windows Button: OK]").unwrap();
        assert!(field < checkbox && checkbox < button);
    }

    #[test]
    fn test_demo_runs() {
        let out = Narrator::capture();
        platforms_demo(&out).unwrap();
        assert_eq!(out.count("widgets, all from the"), 3);
        assert!(out.contains("Mac button 'OK' clicked with trackpad"));
        assert!(out.contains("❌ Invalid argument: Unsupported OS: BeOS"));
    }
}
