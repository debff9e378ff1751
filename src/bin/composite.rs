use patterns::prelude::*;
use std::process::ExitCode;

// =============================================================================
// File system: open component set behind a trait
// =============================================================================

/// Role shared by files and directories. Structural operations default to
/// "not supported" so a leaf rejects them without any extra code.
trait FileSystemNode {
    fn name(&self) -> &str;
    fn size(&self) -> u64;
    fn display(&self, depth: usize, out: &Narrator);

    fn is_composite(&self) -> bool {
        false
    }

    fn add(&mut self, _child: Box<dyn FileSystemNode>) -> Result<()> {
        Err(PatternError::unsupported(format!("add on file '{}'", self.name())))
    }

    fn remove(&mut self, _name: &str) -> Result<Box<dyn FileSystemNode>> {
        Err(PatternError::unsupported(format!("remove on file '{}'", self.name())))
    }

    /// Depth-first search; the first match wins.
    fn find(&self, name: &str) -> Option<&dyn FileSystemNode>;
}

#[cfg(test)]
impl std::fmt::Debug for dyn FileSystemNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSystemNode").field("name", &self.name()).finish()
    }
}

struct File {
    name: String,
    content: String,
    size: u64,
}

impl File {
    fn new(name: &str, size: u64) -> Self {
        Self {
            name: name.to_string(),
            content: String::new(),
            size,
        }
    }

    fn with_content(name: &str, content: &str) -> Self {
        Self {
            name: name.to_string(),
            content: content.to_string(),
            size: content.len() as u64,
        }
    }

    fn set_content(&mut self, content: &str) {
        self.content = content.to_string();
        self.size = content.len() as u64;
    }
}

impl FileSystemNode for File {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn display(&self, depth: usize, out: &Narrator) {
        narrate!(out, "{}📄 {} ({} bytes)", "  ".repeat(depth), self.name, self.size);
    }

    fn find(&self, name: &str) -> Option<&dyn FileSystemNode> {
        (self.name == name).then_some(self as &dyn FileSystemNode)
    }
}

struct Directory {
    name: String,
    children: Vec<Box<dyn FileSystemNode>>,
}

impl Directory {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: Vec::new(),
        }
    }

    /// Builder-style `add` for assembling trees in one expression.
    fn with(mut self, child: impl FileSystemNode + 'static) -> Self {
        self.children.push(Box::new(child));
        self
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }
}

impl FileSystemNode for Directory {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.children.iter().map(|child| child.size()).sum()
    }

    fn display(&self, depth: usize, out: &Narrator) {
        narrate!(out, "{}📁 {}/", "  ".repeat(depth), self.name);
        for child in &self.children {
            child.display(depth + 1, out);
        }
    }

    fn is_composite(&self) -> bool {
        true
    }

    fn add(&mut self, child: Box<dyn FileSystemNode>) -> Result<()> {
        self.children.push(child);
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<Box<dyn FileSystemNode>> {
        let index = self
            .children
            .iter()
            .position(|child| child.name() == name)
            .ok_or_else(|| PatternError::not_found(format!("'{name}' in {}/", self.name)))?;
        Ok(self.children.remove(index))
    }

    fn find(&self, name: &str) -> Option<&dyn FileSystemNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }
}

// =============================================================================
// UI components
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl Bounds {
    fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        (self.x..=self.x + self.width).contains(&x) && (self.y..=self.y + self.height).contains(&y)
    }
}

trait Widget {
    fn kind(&self) -> &'static str;
    fn render(&self, out: &Narrator);

    /// Returns the labels of the widgets that reacted to the click.
    fn handle_click(&self, x: i32, y: i32, out: &Narrator) -> Vec<String>;

    fn add(&mut self, _child: Box<dyn Widget>) -> Result<()> {
        Err(PatternError::unsupported(format!("add on {}", self.kind())))
    }
}

struct Button {
    text: String,
    bounds: Bounds,
}

impl Widget for Button {
    fn kind(&self) -> &'static str {
        "Button"
    }

    fn render(&self, out: &Narrator) {
        let b = self.bounds;
        narrate!(out, "  [{}] at ({},{}) size {}x{}", self.text, b.x, b.y, b.width, b.height);
    }

    fn handle_click(&self, x: i32, y: i32, out: &Narrator) -> Vec<String> {
        if self.bounds.contains(x, y) {
            narrate!(out, "Button '{}' clicked!", self.text);
            vec![self.text.clone()]
        } else {
            Vec::new()
        }
    }
}

struct Label {
    text: String,
    x: i32,
    y: i32,
}

impl Widget for Label {
    fn kind(&self) -> &'static str {
        "Label"
    }

    fn render(&self, out: &Narrator) {
        narrate!(out, "  Label: \"{}\" at ({},{})", self.text, self.x, self.y);
    }

    fn handle_click(&self, _x: i32, _y: i32, _out: &Narrator) -> Vec<String> {
        Vec::new()
    }
}

struct Panel {
    name: String,
    bounds: Bounds,
    children: Vec<Box<dyn Widget>>,
}

impl Panel {
    fn new(name: &str, bounds: Bounds) -> Self {
        Self {
            name: name.to_string(),
            bounds,
            children: Vec::new(),
        }
    }

    fn button(mut self, text: &str, bounds: Bounds) -> Self {
        self.children.push(Box::new(Button {
            text: text.to_string(),
            bounds,
        }));
        self
    }

    fn label(mut self, text: &str, x: i32, y: i32) -> Self {
        self.children.push(Box::new(Label {
            text: text.to_string(),
            x,
            y,
        }));
        self
    }

    fn panel(mut self, panel: Panel) -> Self {
        self.children.push(Box::new(panel));
        self
    }
}

impl Widget for Panel {
    fn kind(&self) -> &'static str {
        "Panel"
    }

    fn render(&self, out: &Narrator) {
        let b = self.bounds;
        narrate!(out, "Panel '{}' at ({},{}) size {}x{}:", self.name, b.x, b.y, b.width, b.height);
        for child in &self.children {
            child.render(out);
        }
    }

    /// Clicks outside the panel never reach its children.
    fn handle_click(&self, x: i32, y: i32, out: &Narrator) -> Vec<String> {
        if !self.bounds.contains(x, y) {
            return Vec::new();
        }
        narrate!(out, "Click at ({x},{y}) in panel '{}'", self.name);
        self.children
            .iter()
            .flat_map(|child| child.handle_click(x, y, out))
            .collect()
    }

    fn add(&mut self, child: Box<dyn Widget>) -> Result<()> {
        self.children.push(child);
        Ok(())
    }
}

// =============================================================================
// Organisation chart: closed set, so a tagged variant
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Person {
    name: String,
    title: String,
    salary: u32,
}

#[derive(Debug, Clone, PartialEq)]
enum OrgNode {
    Individual(Person),
    Manager { person: Person, reports: Vec<OrgNode> },
}

impl OrgNode {
    fn individual(name: &str, title: &str, salary: u32) -> Self {
        Self::Individual(Person {
            name: name.to_string(),
            title: title.to_string(),
            salary,
        })
    }

    fn manager(name: &str, title: &str, salary: u32) -> Self {
        Self::Manager {
            person: Person {
                name: name.to_string(),
                title: title.to_string(),
                salary,
            },
            reports: Vec::new(),
        }
    }

    fn person(&self) -> &Person {
        match self {
            Self::Individual(person) | Self::Manager { person, .. } => person,
        }
    }

    fn add_report(&mut self, report: OrgNode) -> Result<()> {
        match self {
            Self::Manager { reports, .. } => {
                reports.push(report);
                Ok(())
            }
            Self::Individual(person) => Err(PatternError::unsupported(format!(
                "add subordinate to non-manager {}",
                person.name
            ))),
        }
    }

    /// Headcount including this node.
    fn team_size(&self) -> usize {
        match self {
            Self::Individual(_) => 1,
            Self::Manager { reports, .. } => {
                1 + reports.iter().map(OrgNode::team_size).sum::<usize>()
            }
        }
    }

    fn payroll(&self) -> u64 {
        match self {
            Self::Individual(person) => u64::from(person.salary),
            Self::Manager { person, reports } => {
                u64::from(person.salary) + reports.iter().map(OrgNode::payroll).sum::<u64>()
            }
        }
    }

    fn show(&self, depth: usize, out: &Narrator) {
        let indent = "  ".repeat(depth);
        match self {
            Self::Individual(p) => {
                narrate!(out, "{indent}Employee: {} ({}) - ${}", p.name, p.title, p.salary)
            }
            Self::Manager { person: p, reports } => {
                narrate!(
                    out,
                    "{indent}Manager: {} ({}) - ${} [Team size: {}]",
                    p.name,
                    p.title,
                    p.salary,
                    self.team_size()
                );
                for report in reports {
                    report.show(depth + 1, out);
                }
            }
        }
    }
}

// =============================================================================
// Demo (cargo run --bin composite)
// =============================================================================

fn sample_tree() -> Directory {
    let projects = Directory::new("projects")
        .with(File::with_content("main.rs", "fn main() {}"))
        .with(File::new("Cargo.toml", 256));
    let user = Directory::new("user")
        .with(File::new("document.txt", 1024))
        .with(File::new("image.jpg", 2048))
        .with(projects);
    Directory::new("root")
        .with(Directory::new("home").with(user))
        .with(Directory::new("var"))
        .with(File::new("config.ini", 128))
}

fn file_system_demo(out: &Narrator) -> Result<()> {
    out.section(1, "File System Composite");

    let mut root = sample_tree();
    out.say("File system structure:");
    root.display(0, out);

    out.blank();
    narrate!(out, "Total size: {} bytes", root.size());

    match root.find("main.rs") {
        Some(found) => narrate!(out, "Found: {} ({} bytes)", found.name(), found.size()),
        None => out.say("main.rs not found"),
    }
    if root.find("missing.txt").is_none() {
        out.say("Search for 'missing.txt': no match");
    }

    out.blank();
    out.say("Structural operations:");
    let mut notes = File::new("notes.md", 64);
    notes.add(Box::new(File::new("inner.txt", 1))).or_narrate(out)?;
    notes.set_content("# Notes\nremember the milk");
    narrate!(
        out,
        "notes.md rewritten: now {} bytes, first line {:?}",
        notes.size(),
        notes.content.lines().next().unwrap_or_default()
    );

    root.add(Box::new(notes))?;
    narrate!(
        out,
        "Added notes.md; root has {} entries, total {} bytes",
        root.child_count(),
        root.size()
    );
    if let Some(removed) = root.remove("var").or_narrate(out)? {
        narrate!(out, "Removed {}/ (composite: {})", removed.name(), removed.is_composite());
    }
    root.remove("var").or_narrate(out)?;
    Ok(())
}

fn ui_demo(out: &Narrator) -> Result<()> {
    out.section(2, "UI Component System");

    let header = Panel::new("HeaderPanel", Bounds::new(0, 0, 800, 100))
        .label("Application Title", 10, 10)
        .button("Settings", Bounds::new(700, 10, 80, 30));
    let content = Panel::new("ContentPanel", Bounds::new(0, 100, 800, 400))
        .label("Welcome!", 50, 150)
        .button("Start", Bounds::new(50, 200, 100, 40))
        .button("Exit", Bounds::new(200, 200, 100, 40));
    let footer =
        Panel::new("FooterPanel", Bounds::new(0, 500, 800, 100)).label("Status: Ready", 10, 510);

    let mut main_panel = Panel::new("MainPanel", Bounds::new(0, 0, 800, 600))
        .panel(header)
        .panel(content);
    main_panel.add(Box::new(footer))?;

    out.say("UI Layout:");
    main_panel.render(out);

    out.blank();
    out.say("Simulating clicks:");
    for (x, y) in [(750, 25), (100, 220), (250, 220), (400, 550)] {
        let hits = main_panel.handle_click(x, y, out);
        if hits.is_empty() {
            narrate!(out, "Nothing clickable at ({x},{y})");
        }
    }

    let mut label = Label {
        text: "Status".to_string(),
        x: 0,
        y: 0,
    };
    label.add(Box::new(Panel::new("Nested", Bounds::new(0, 0, 1, 1)))).or_narrate(out)?;
    Ok(())
}

fn org_chart_demo(out: &Narrator) -> Result<()> {
    out.section(3, "Organization Structure");

    let mut ceo = OrgNode::manager("Alice Johnson", "CEO", 200_000);
    let mut cto = OrgNode::manager("Bob Smith", "CTO", 150_000);
    cto.add_report(OrgNode::individual("Charlie Brown", "Senior Developer", 90_000))?;
    cto.add_report(OrgNode::individual("Diana Prince", "Developer", 75_000))?;

    let mut dev_manager = OrgNode::manager("Eve Wilson", "Dev Manager", 120_000);
    dev_manager.add_report(OrgNode::individual("Frank Miller", "Junior Developer", 60_000))?;
    dev_manager.add_report(OrgNode::individual("Grace Lee", "QA Engineer", 65_000))?;
    cto.add_report(dev_manager)?;

    let mut cfo = OrgNode::manager("Henry Davis", "CFO", 140_000);
    cfo.add_report(OrgNode::individual("Iris Taylor", "Accountant", 55_000))?;
    cfo.add_report(OrgNode::individual("Jack Wilson", "Financial Analyst", 60_000))?;

    ceo.add_report(cto)?;
    ceo.add_report(cfo)?;

    out.say("Organization Chart:");
    ceo.show(0, out);

    out.blank();
    narrate!(out, "Total team size: {}", ceo.team_size());
    narrate!(out, "Total payroll: ${}", ceo.payroll());

    let mut intern = OrgNode::individual("Kim Park", "Intern", 30_000);
    intern.add_report(OrgNode::individual("Lee Chen", "Intern", 30_000)).or_narrate(out)?;
    narrate!(
        out,
        "{} still reports alone (team size {})",
        intern.person().name,
        intern.team_size()
    );
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Composite", |out, _config| {
        file_system_demo(out)?;
        ui_demo(out)?;
        org_chart_demo(out)?;

        out.section(4, "Composite Pattern Benefits");
        out.checklist(&[
            "Clients treat leaves and containers uniformly",
            "Aggregates are computed by recursive delegation",
            "Leaves reject structural operations with a clear error",
            "New component kinds plug in without touching clients",
        ]);
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin composite)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_size_aggregates_children() {
        let root = sample_tree();
        // 12 ("fn main() {}") + 256 + 1024 + 2048 + 128
        assert_eq!(root.size(), 3468);
        assert_eq!(Directory::new("empty").size(), 0);
    }

    #[test]
    fn test_find_is_depth_first_and_matches_self() {
        let root = sample_tree();
        let found = root.find("Cargo.toml").unwrap();
        assert_eq!(found.size(), 256);
        assert!(!found.is_composite());

        assert_eq!(root.find("root").map(|node| node.name()), Some("root"));
        assert!(root.find("projects").unwrap().is_composite());
        assert!(root.find("nope").is_none());

        let leaf = File::new("a.txt", 1);
        assert!(leaf.find("a.txt").is_some());
        assert!(leaf.find("b.txt").is_none());
    }

    #[test]
    fn test_find_returns_first_match_in_order() {
        let root = Directory::new("root")
            .with(Directory::new("a").with(File::new("dup", 1)))
            .with(File::new("dup", 2));
        assert_eq!(root.find("dup").unwrap().size(), 1);
    }

    #[test]
    fn test_leaf_rejects_structural_operations() {
        let mut file = File::new("leaf.txt", 10);
        let err = file.add(Box::new(File::new("x", 1))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert!(err.to_string().starts_with("Operation not supported"));
        assert!(file.remove("x").is_err());
        assert_eq!(file.size(), 10);
    }

    #[test]
    fn test_directory_add_and_remove() {
        let mut dir = Directory::new("docs");
        dir.add(Box::new(File::new("a", 5))).unwrap();
        dir.add(Box::new(File::new("b", 7))).unwrap();
        assert_eq!(dir.size(), 12);

        let removed = dir.remove("a").unwrap();
        assert_eq!(removed.name(), "a");
        assert_eq!(dir.size(), 7);
        assert_eq!(dir.remove("a").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_display_indents_by_depth() {
        let out = Narrator::capture();
        Directory::new("top")
            .with(Directory::new("mid").with(File::new("f", 3)))
            .display(0, &out);
        assert_eq!(out.lines(), vec!["📁 top/", "  📁 mid/", "    📄 f (3 bytes)"]);
    }

    #[test]
    fn test_clicks_route_to_buttons_inside_bounds() {
        let out = Narrator::capture();
        let panel = Panel::new("Main", Bounds::new(0, 0, 100, 100))
            .button("Ok", Bounds::new(10, 10, 20, 20))
            .label("Hint", 50, 50)
            .panel(
                Panel::new("Side", Bounds::new(60, 60, 40, 40))
                    .button("Help", Bounds::new(70, 70, 10, 10)),
            );

        assert_eq!(panel.handle_click(15, 15, &out), vec!["Ok"]);
        assert_eq!(panel.handle_click(75, 75, &out), vec!["Help"]);
        assert!(panel.handle_click(50, 50, &out).is_empty());
        assert!(panel.handle_click(500, 500, &out).is_empty());
        assert!(out.contains("Button 'Help' clicked!"));
    }

    #[test]
    fn test_label_rejects_children() {
        let mut label = Label {
            text: "x".into(),
            x: 0,
            y: 0,
        };
        let err = label
            .add(Box::new(Panel::new("p", Bounds::new(0, 0, 1, 1))))
            .unwrap_err();
        assert_eq!(err.to_string(), "Operation not supported: add on Label");
    }

    #[test]
    fn test_org_chart_totals() {
        let mut ceo = OrgNode::manager("A", "CEO", 100);
        let mut lead = OrgNode::manager("B", "Lead", 50);
        lead.add_report(OrgNode::individual("C", "Dev", 30)).unwrap();
        lead.add_report(OrgNode::individual("D", "Dev", 20)).unwrap();
        ceo.add_report(lead).unwrap();
        ceo.add_report(OrgNode::individual("E", "Ops", 10)).unwrap();

        assert_eq!(ceo.team_size(), 5);
        assert_eq!(ceo.payroll(), 210);
    }

    #[test]
    fn test_individual_cannot_take_reports() {
        let mut dev = OrgNode::individual("C", "Dev", 30);
        let err = dev.add_report(OrgNode::individual("D", "Dev", 20)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(dev.team_size(), 1);
    }

    #[test]
    fn test_demo_narrates_rejections() {
        let out = Narrator::capture();
        file_system_demo(&out).unwrap();
        ui_demo(&out).unwrap();
        org_chart_demo(&out).unwrap();

        assert!(out.contains("Total size: 3468 bytes"));
        assert!(out.contains("Found: main.rs (12 bytes)"));
        assert!(out.contains("❌ Operation not supported: add on file 'notes.md'"));
        assert!(out.contains("❌ Not found: 'var' in root/"));
        assert!(out.contains("Total team size: 10"));
        assert!(out.contains("Total payroll: $1015000"));
        assert!(out.contains("Button 'Settings' clicked!"));
    }
}
