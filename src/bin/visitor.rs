use patterns::prelude::*;
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::process::ExitCode;

// =============================================================================
// Shapes: one visitor method per concrete element
// =============================================================================

trait ShapeVisitor {
    fn visit_circle(&mut self, circle: &Circle);
    fn visit_rectangle(&mut self, rectangle: &Rectangle);
    fn visit_triangle(&mut self, triangle: &Triangle);
}

trait Shape {
    fn accept(&self, visitor: &mut dyn ShapeVisitor);
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

impl Point {
    fn distance(self, other: Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

struct Circle {
    center: Point,
    radius: f64,
}

struct Rectangle {
    origin: Point,
    width: f64,
    height: f64,
}

struct Triangle {
    a: Point,
    b: Point,
    c: Point,
}

impl Shape for Circle {
    fn accept(&self, visitor: &mut dyn ShapeVisitor) {
        visitor.visit_circle(self);
    }
}

impl Shape for Rectangle {
    fn accept(&self, visitor: &mut dyn ShapeVisitor) {
        visitor.visit_rectangle(self);
    }
}

impl Shape for Triangle {
    fn accept(&self, visitor: &mut dyn ShapeVisitor) {
        visitor.visit_triangle(self);
    }
}

struct AreaCalculator {
    total: f64,
    out: Narrator,
}

impl ShapeVisitor for AreaCalculator {
    fn visit_circle(&mut self, circle: &Circle) {
        let area = PI * circle.radius * circle.radius;
        narrate!(self.out, "Circle area: {area:.2}");
        self.total += area;
    }

    fn visit_rectangle(&mut self, rectangle: &Rectangle) {
        let area = rectangle.width * rectangle.height;
        narrate!(self.out, "Rectangle area: {area:.2}");
        self.total += area;
    }

    /// Shoelace formula.
    fn visit_triangle(&mut self, t: &Triangle) {
        let area = 0.5
            * (t.a.x * (t.b.y - t.c.y) + t.b.x * (t.c.y - t.a.y) + t.c.x * (t.a.y - t.b.y)).abs();
        narrate!(self.out, "Triangle area: {area:.2}");
        self.total += area;
    }
}

struct PerimeterCalculator {
    total: f64,
    out: Narrator,
}

impl ShapeVisitor for PerimeterCalculator {
    fn visit_circle(&mut self, circle: &Circle) {
        let perimeter = 2.0 * PI * circle.radius;
        narrate!(self.out, "Circle perimeter: {perimeter:.2}");
        self.total += perimeter;
    }

    fn visit_rectangle(&mut self, rectangle: &Rectangle) {
        let perimeter = 2.0 * (rectangle.width + rectangle.height);
        narrate!(self.out, "Rectangle perimeter: {perimeter:.2}");
        self.total += perimeter;
    }

    fn visit_triangle(&mut self, t: &Triangle) {
        let perimeter = t.a.distance(t.b) + t.b.distance(t.c) + t.c.distance(t.a);
        narrate!(self.out, "Triangle perimeter: {perimeter:.2}");
        self.total += perimeter;
    }
}

/// Collects drawing instructions instead of computing a number.
struct Renderer {
    instructions: Vec<String>,
    out: Narrator,
}

impl ShapeVisitor for Renderer {
    fn visit_circle(&mut self, c: &Circle) {
        self.instructions.push(format!(
            "circle r={} at ({},{})",
            c.radius, c.center.x, c.center.y
        ));
        narrate!(
            self.out,
            "🔴 Circle drawn at ({},{}) with radius {}",
            c.center.x,
            c.center.y,
            c.radius
        );
    }

    fn visit_rectangle(&mut self, r: &Rectangle) {
        self.instructions.push(format!(
            "rect {}x{} at ({},{})",
            r.width, r.height, r.origin.x, r.origin.y
        ));
        narrate!(
            self.out,
            "🟦 Rectangle drawn at ({},{}) size {}x{}",
            r.origin.x,
            r.origin.y,
            r.width,
            r.height
        );
    }

    fn visit_triangle(&mut self, t: &Triangle) {
        self.instructions.push(format!(
            "triangle ({},{}) ({},{}) ({},{})",
            t.a.x, t.a.y, t.b.x, t.b.y, t.c.x, t.c.y
        ));
        narrate!(
            self.out,
            "🔺 Triangle drawn with vertices ({},{}), ({},{}), ({},{})",
            t.a.x,
            t.a.y,
            t.b.x,
            t.b.y,
            t.c.x,
            t.c.y
        );
    }
}

fn visit_all(shapes: &[Box<dyn Shape>], visitor: &mut dyn ShapeVisitor) {
    for shape in shapes {
        shape.accept(visitor);
    }
}

// =============================================================================
// File system: pre-order traversal driven by the elements
// =============================================================================

trait FsVisitor {
    fn visit_file(&mut self, file: &FsFile);
    fn visit_directory(&mut self, directory: &FsDirectory);
}

enum FsNode {
    File(FsFile),
    Directory(FsDirectory),
}

struct FsFile {
    name: String,
    extension: String,
    size: u64,
}

struct FsDirectory {
    name: String,
    children: Vec<FsNode>,
}

impl FsFile {
    fn full_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }
}

impl FsNode {
    fn file(name: &str, size: u64, extension: &str) -> Self {
        Self::File(FsFile {
            name: name.to_string(),
            extension: extension.to_string(),
            size,
        })
    }

    fn directory(name: &str, children: Vec<FsNode>) -> Self {
        Self::Directory(FsDirectory {
            name: name.to_string(),
            children,
        })
    }

    /// A directory is visited before its children.
    fn accept(&self, visitor: &mut dyn FsVisitor) {
        match self {
            Self::File(file) => visitor.visit_file(file),
            Self::Directory(directory) => {
                visitor.visit_directory(directory);
                for child in &directory.children {
                    child.accept(visitor);
                }
            }
        }
    }
}

#[derive(Default)]
struct SizeCalculator {
    total: u64,
    files: usize,
    directories: usize,
    out: Option<Narrator>,
}

impl FsVisitor for SizeCalculator {
    fn visit_file(&mut self, file: &FsFile) {
        self.total += file.size;
        self.files += 1;
        if let Some(out) = &self.out {
            narrate!(out, "📄 {} ({} bytes)", file.full_name(), file.size);
        }
    }

    fn visit_directory(&mut self, directory: &FsDirectory) {
        self.directories += 1;
        if let Some(out) = &self.out {
            narrate!(out, "📁 {}/", directory.name);
        }
    }
}

struct SearchVisitor {
    term: String,
    results: Vec<String>,
}

impl SearchVisitor {
    fn new(term: &str) -> Self {
        Self {
            term: term.to_string(),
            results: Vec::new(),
        }
    }

    fn reset(&mut self, term: &str) {
        self.term = term.to_string();
        self.results.clear();
    }
}

impl FsVisitor for SearchVisitor {
    fn visit_file(&mut self, file: &FsFile) {
        if file.name.contains(&self.term) || file.extension.contains(&self.term) {
            self.results.push(format!("📄 {}", file.full_name()));
        }
    }

    fn visit_directory(&mut self, directory: &FsDirectory) {
        if directory.name.contains(&self.term) {
            self.results.push(format!("📁 {}/", directory.name));
        }
    }
}

/// Bytes per extension. A new operation, and no element changed for it.
#[derive(Default)]
struct ExtensionReport {
    by_extension: BTreeMap<String, u64>,
}

impl FsVisitor for ExtensionReport {
    fn visit_file(&mut self, file: &FsFile) {
        *self.by_extension.entry(file.extension.clone()).or_default() += file.size;
    }

    fn visit_directory(&mut self, _directory: &FsDirectory) {}
}

// =============================================================================
// Expression tree: post-order visits with fallible visitors
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
        }
    }
}

trait ExpressionVisitor {
    fn visit_number(&mut self, value: f64) -> Result<()>;
    fn visit_binary(&mut self, operator: Operator) -> Result<()>;
}

enum Expr {
    Number(f64),
    Binary {
        left: Box<Expr>,
        operator: Operator,
        right: Box<Expr>,
    },
}

impl Expr {
    fn num(value: f64) -> Self {
        Self::Number(value)
    }

    fn binary(left: Expr, operator: Operator, right: Expr) -> Self {
        Self::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    /// Children first, then the operator.
    fn accept(&self, visitor: &mut dyn ExpressionVisitor) -> Result<()> {
        match self {
            Self::Number(value) => visitor.visit_number(*value),
            Self::Binary {
                left,
                operator,
                right,
            } => {
                left.accept(visitor)?;
                right.accept(visitor)?;
                visitor.visit_binary(*operator)
            }
        }
    }
}

fn pop_pair<T>(stack: &mut Vec<T>) -> Result<(T, T)> {
    match (stack.pop(), stack.pop()) {
        (Some(right), Some(left)) => Ok((left, right)),
        _ => Err(PatternError::fatal("operator visited with fewer than two operands")),
    }
}

fn single<T: Clone>(stack: &[T]) -> Result<T> {
    match stack {
        [only] => Ok(only.clone()),
        _ => Err(PatternError::fatal(format!(
            "expression left {} values on the stack",
            stack.len()
        ))),
    }
}

struct Evaluator {
    stack: Vec<f64>,
    out: Option<Narrator>,
}

impl Evaluator {
    fn new(out: Option<&Narrator>) -> Self {
        Self {
            stack: Vec::new(),
            out: out.cloned(),
        }
    }

    fn result(&self) -> Result<f64> {
        single(&self.stack)
    }
}

impl ExpressionVisitor for Evaluator {
    fn visit_number(&mut self, value: f64) -> Result<()> {
        if let Some(out) = &self.out {
            narrate!(out, "Push {value}");
        }
        self.stack.push(value);
        Ok(())
    }

    fn visit_binary(&mut self, operator: Operator) -> Result<()> {
        let (left, right) = pop_pair(&mut self.stack)?;
        let result = match operator {
            Operator::Add => left + right,
            Operator::Subtract => left - right,
            Operator::Multiply => left * right,
            Operator::Divide if right == 0.0 => {
                return Err(PatternError::invalid_argument("Division by zero"))
            }
            Operator::Divide => left / right,
        };
        if let Some(out) = &self.out {
            narrate!(out, "{left} {} {right} = {result}", operator.symbol());
        }
        self.stack.push(result);
        Ok(())
    }
}

#[derive(Default)]
struct Printer {
    stack: Vec<String>,
}

impl ExpressionVisitor for Printer {
    fn visit_number(&mut self, value: f64) -> Result<()> {
        self.stack.push(value.to_string());
        Ok(())
    }

    fn visit_binary(&mut self, operator: Operator) -> Result<()> {
        let (left, right) = pop_pair(&mut self.stack)?;
        self.stack.push(format!("({left} {} {right})", operator.symbol()));
        Ok(())
    }
}

fn render(expr: &Expr) -> Result<String> {
    let mut printer = Printer::default();
    expr.accept(&mut printer)?;
    single(&printer.stack)
}

fn evaluate(expr: &Expr, out: Option<&Narrator>) -> Result<f64> {
    let mut evaluator = Evaluator::new(out);
    expr.accept(&mut evaluator)?;
    evaluator.result()
}

// =============================================================================
// Demo (cargo run --bin visitor)
// =============================================================================

fn sample_shapes() -> Vec<Box<dyn Shape>> {
    vec![
        Box::new(Circle {
            center: Point { x: 0.0, y: 0.0 },
            radius: 5.0,
        }),
        Box::new(Rectangle {
            origin: Point { x: 10.0, y: 10.0 },
            width: 4.0,
            height: 6.0,
        }),
        Box::new(Triangle {
            a: Point { x: 0.0, y: 0.0 },
            b: Point { x: 3.0, y: 0.0 },
            c: Point { x: 0.0, y: 4.0 },
        }),
    ]
}

fn sample_file_system() -> FsNode {
    FsNode::directory(
        "root",
        vec![
            FsNode::directory(
                "documents",
                vec![
                    FsNode::file("resume", 1024, "pdf"),
                    FsNode::file("letter", 512, "txt"),
                ],
            ),
            FsNode::directory(
                "photos",
                vec![
                    FsNode::file("vacation1", 2_048_000, "jpg"),
                    FsNode::file("vacation2", 1_856_000, "jpg"),
                ],
            ),
            FsNode::file("readme", 256, "txt"),
        ],
    )
}

fn shapes_demo(out: &Narrator) {
    out.section(1, "Shape Processing with Visitor Pattern");
    let shapes = sample_shapes();

    out.blank();
    out.say("Calculating areas:");
    let mut areas = AreaCalculator {
        total: 0.0,
        out: out.clone(),
    };
    visit_all(&shapes, &mut areas);
    narrate!(out, "Total area: {:.2}", areas.total);

    out.blank();
    out.say("Calculating perimeters:");
    let mut perimeters = PerimeterCalculator {
        total: 0.0,
        out: out.clone(),
    };
    visit_all(&shapes, &mut perimeters);
    narrate!(out, "Total perimeter: {:.2}", perimeters.total);

    out.blank();
    out.say("Drawing shapes:");
    let mut renderer = Renderer {
        instructions: Vec::new(),
        out: out.clone(),
    };
    visit_all(&shapes, &mut renderer);
    narrate!(out, "Drawing instructions recorded: {}", renderer.instructions.len());
}

fn file_system_demo(out: &Narrator) {
    out.section(2, "File System Processing");
    let root = sample_file_system();

    out.blank();
    out.say("Calculating file system size:");
    let mut sizes = SizeCalculator {
        out: Some(out.clone()),
        ..SizeCalculator::default()
    };
    root.accept(&mut sizes);
    out.blank();
    narrate!(out, "Total size: {} bytes", sizes.total);
    narrate!(out, "Files: {}", sizes.files);
    narrate!(out, "Directories: {}", sizes.directories);

    let mut search = SearchVisitor::new("vacation");
    for term in ["vacation", "txt", "music"] {
        search.reset(term);
        root.accept(&mut search);
        out.blank();
        narrate!(out, "Searching for '{term}':");
        if search.results.is_empty() {
            out.say("No matches");
        }
        for result in &search.results {
            narrate!(out, "Found: {result}");
        }
    }

    out.blank();
    out.say("Bytes by extension:");
    let mut report = ExtensionReport::default();
    root.accept(&mut report);
    for (extension, bytes) in &report.by_extension {
        narrate!(out, "  .{extension}: {bytes} bytes");
    }
}

fn expression_demo(out: &Narrator) -> Result<()> {
    out.section(3, "Expression Tree Processing");

    let expr = Expr::binary(
        Expr::binary(Expr::num(3.0), Operator::Add, Expr::num(4.0)),
        Operator::Multiply,
        Expr::binary(Expr::num(2.0), Operator::Subtract, Expr::num(1.0)),
    );

    out.blank();
    out.say("Expression structure:");
    narrate!(out, "Expression: {}", render(&expr)?);

    out.blank();
    out.say("Evaluating expression:");
    narrate!(out, "Result: {}", evaluate(&expr, Some(out))?);

    out.blank();
    let broken = Expr::binary(
        Expr::num(1.0),
        Operator::Divide,
        Expr::binary(Expr::num(2.0), Operator::Subtract, Expr::num(2.0)),
    );
    narrate!(out, "Evaluating {}:", render(&broken)?);
    evaluate(&broken, None).or_narrate(out)?;
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Visitor", |out, _config| {
        shapes_demo(out);
        file_system_demo(out);
        expression_demo(out)?;

        out.section(4, "Visitor Pattern Benefits");
        out.checklist(&[
            "Separates algorithms from object structure",
            "Easy to add new operations without modifying classes",
            "Gathers related operations in one class",
            "Can accumulate state during traversal",
        ]);

        out.section(5, "Visitor Pattern Drawbacks");
        out.say("⚠️ Hard to add new element types (breaks existing visitors)");
        out.say("⚠️ Visitors need access to element internals");
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin visitor)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Records which visit method ran, to check double dispatch.
    #[derive(Default)]
    struct Trace(Vec<&'static str>);

    impl ShapeVisitor for Trace {
        fn visit_circle(&mut self, _: &Circle) {
            self.0.push("circle");
        }
        fn visit_rectangle(&mut self, _: &Rectangle) {
            self.0.push("rectangle");
        }
        fn visit_triangle(&mut self, _: &Triangle) {
            self.0.push("triangle");
        }
    }

    #[test]
    fn test_double_dispatch_reaches_concrete_method() {
        let mut trace = Trace::default();
        visit_all(&sample_shapes(), &mut trace);
        assert_eq!(trace.0, vec!["circle", "rectangle", "triangle"]);
    }

    #[test]
    fn test_area_and_perimeter_totals() {
        let out = Narrator::capture();
        let shapes = sample_shapes();
        let mut areas = AreaCalculator {
            total: 0.0,
            out: out.clone(),
        };
        visit_all(&shapes, &mut areas);
        let expected = PI * 25.0 + 24.0 + 6.0;
        assert!((areas.total - expected).abs() < 1e-9);

        let mut perimeters = PerimeterCalculator {
            total: 0.0,
            out: out.clone(),
        };
        visit_all(&shapes, &mut perimeters);
        let expected = 10.0 * PI + 20.0 + 12.0;
        assert!((perimeters.total - expected).abs() < 1e-9);
        assert!(out.contains("Triangle area: 6.00"));
    }

    #[test]
    fn test_size_visitor_counts_everything() {
        let mut sizes = SizeCalculator::default();
        sample_file_system().accept(&mut sizes);
        assert_eq!(sizes.total, 1024 + 512 + 2_048_000 + 1_856_000 + 256);
        assert_eq!(sizes.files, 5);
        assert_eq!(sizes.directories, 3);
    }

    #[test]
    fn test_directory_visited_before_children() {
        let out = Narrator::capture();
        let mut sizes = SizeCalculator {
            out: Some(out.clone()),
            ..SizeCalculator::default()
        };
        sample_file_system().accept(&mut sizes);
        assert!(out.position("📁 photos/").unwrap() < out.position("vacation1.jpg").unwrap());
        assert_eq!(out.lines()[0], "📁 root/");
    }

    #[test]
    fn test_search_matches_name_or_extension() {
        let root = sample_file_system();
        let mut search = SearchVisitor::new("txt");
        root.accept(&mut search);
        assert_eq!(search.results, vec!["📄 letter.txt", "📄 readme.txt"]);

        search.reset("photo");
        root.accept(&mut search);
        assert_eq!(search.results, vec!["📁 photos/"]);
    }

    #[test]
    fn test_extension_report() {
        let mut report = ExtensionReport::default();
        sample_file_system().accept(&mut report);
        assert_eq!(report.by_extension.get("txt"), Some(&768));
        assert_eq!(report.by_extension.len(), 3);
    }

    #[test]
    fn test_print_and_evaluate() {
        let expr = Expr::binary(
            Expr::binary(Expr::num(3.0), Operator::Add, Expr::num(4.0)),
            Operator::Multiply,
            Expr::binary(Expr::num(2.0), Operator::Subtract, Expr::num(1.0)),
        );
        assert_eq!(render(&expr).unwrap(), "((3 + 4) * (2 - 1))");
        assert_eq!(evaluate(&expr, None).unwrap(), 7.0);
    }

    #[test]
    fn test_division_by_zero_is_reported() {
        let expr = Expr::binary(Expr::num(1.0), Operator::Divide, Expr::num(0.0));
        let err = evaluate(&expr, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.to_string(), "Invalid argument: Division by zero");
    }

    #[test]
    fn test_evaluator_trace_is_post_order() {
        let out = Narrator::capture();
        let expr = Expr::binary(Expr::num(6.0), Operator::Divide, Expr::num(4.0));
        evaluate(&expr, Some(&out)).unwrap();
        assert_eq!(out.lines(), vec!["Push 6", "Push 4", "6 / 4 = 1.5"]);
    }

    #[test]
    fn test_demo_runs() {
        let out = Narrator::capture();
        shapes_demo(&out);
        file_system_demo(&out);
        expression_demo(&out).unwrap();
        assert!(out.contains("Total size: 3905792 bytes"));
        assert!(out.contains("Result: 7"));
        assert!(out.contains("❌ Invalid argument: Division by zero"));
        assert!(out.contains("No matches"));
    }
}
