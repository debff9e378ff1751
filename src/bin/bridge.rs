use patterns::prelude::*;
use std::process::ExitCode;

// =============================================================================
// Implementor: drawing back ends
// =============================================================================

/// The implementation side of the bridge. Shapes only ever talk to this.
trait DrawingApi {
    fn name(&self) -> &'static str;
    fn set_color(&mut self, color: &str, out: &Narrator);
    fn draw_line(&mut self, from: (f64, f64), to: (f64, f64), out: &Narrator);
    fn draw_circle(&mut self, center: (f64, f64), radius: f64, out: &Narrator);
    fn draw_rectangle(&mut self, origin: (f64, f64), width: f64, height: f64, out: &Narrator);

    /// Rendered document, for back ends that produce one.
    fn export(&self) -> Option<String> {
        None
    }
}

struct OpenGlRenderer {
    color: String,
}

impl Default for OpenGlRenderer {
    fn default() -> Self {
        Self { color: "white".into() }
    }
}

impl DrawingApi for OpenGlRenderer {
    fn name(&self) -> &'static str {
        "OpenGL"
    }

    fn set_color(&mut self, color: &str, out: &Narrator) {
        self.color = color.to_string();
        narrate!(out, "[OpenGL] Color set to {color}");
    }

    fn draw_line(&mut self, (x1, y1): (f64, f64), (x2, y2): (f64, f64), out: &Narrator) {
        narrate!(out, "[OpenGL] Drawing line from ({x1},{y1}) to ({x2},{y2}) in {}", self.color);
    }

    fn draw_circle(&mut self, (x, y): (f64, f64), radius: f64, out: &Narrator) {
        narrate!(
            out,
            "[OpenGL] Drawing circle at ({x},{y}) with radius {radius} in {}",
            self.color
        );
    }

    fn draw_rectangle(&mut self, (x, y): (f64, f64), width: f64, height: f64, out: &Narrator) {
        narrate!(
            out,
            "[OpenGL] Drawing rectangle at ({x},{y}) size {width}x{height} in {}",
            self.color
        );
    }
}

struct DirectXRenderer {
    color: String,
}

impl Default for DirectXRenderer {
    fn default() -> Self {
        Self { color: "white".into() }
    }
}

impl DrawingApi for DirectXRenderer {
    fn name(&self) -> &'static str {
        "DirectX"
    }

    fn set_color(&mut self, color: &str, out: &Narrator) {
        self.color = color.to_string();
        narrate!(out, "[DirectX] Color changed to {color}");
    }

    fn draw_line(&mut self, (x1, y1): (f64, f64), (x2, y2): (f64, f64), out: &Narrator) {
        narrate!(out, "[DirectX] Rendering line: ({x1},{y1})->({x2},{y2}) color={}", self.color);
    }

    fn draw_circle(&mut self, (x, y): (f64, f64), radius: f64, out: &Narrator) {
        narrate!(
            out,
            "[DirectX] Rendering circle: center=({x},{y}) r={radius} color={}",
            self.color
        );
    }

    fn draw_rectangle(&mut self, (x, y): (f64, f64), width: f64, height: f64, out: &Narrator) {
        narrate!(
            out,
            "[DirectX] Rendering rectangle: pos=({x},{y}) size={width}x{height} color={}",
            self.color
        );
    }
}

/// Accumulates SVG elements instead of drawing.
struct SvgRenderer {
    color: String,
    elements: Vec<String>,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            color: "black".into(),
            elements: Vec::new(),
        }
    }
}

impl SvgRenderer {
    fn paint(&self) -> String {
        html_escape::encode_double_quoted_attribute(&self.color).into_owned()
    }
}

impl DrawingApi for SvgRenderer {
    fn name(&self) -> &'static str {
        "SVG"
    }

    fn set_color(&mut self, color: &str, out: &Narrator) {
        self.color = color.to_string();
        narrate!(out, "[SVG] Color set to {color}");
    }

    fn draw_line(&mut self, (x1, y1): (f64, f64), (x2, y2): (f64, f64), out: &Narrator) {
        let paint = self.paint();
        self.elements.push(format!(
            r#"<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="{paint}"/>"#
        ));
        out.say("[SVG] Added line element");
    }

    fn draw_circle(&mut self, (x, y): (f64, f64), radius: f64, out: &Narrator) {
        let paint = self.paint();
        self.elements.push(format!(r#"<circle cx="{x}" cy="{y}" r="{radius}" fill="{paint}"/>"#));
        out.say("[SVG] Added circle element");
    }

    fn draw_rectangle(&mut self, (x, y): (f64, f64), width: f64, height: f64, out: &Narrator) {
        let paint = self.paint();
        self.elements.push(format!(
            r#"<rect x="{x}" y="{y}" width="{width}" height="{height}" fill="{paint}"/>"#
        ));
        out.say("[SVG] Added rectangle element");
    }

    fn export(&self) -> Option<String> {
        let mut document = String::from("<svg>\n");
        for element in &self.elements {
            document.push_str(element);
            document.push('\n');
        }
        document.push_str("</svg>");
        Some(document)
    }
}

// =============================================================================
// Abstraction: shapes
// =============================================================================

/// State every shape shares: where it is and which back end draws it.
struct Placement {
    api: Box<dyn DrawingApi>,
    x: f64,
    y: f64,
}

impl Placement {
    fn new(api: Box<dyn DrawingApi>, x: f64, y: f64) -> Self {
        Self { api, x, y }
    }
}

trait Shape {
    fn placement(&self) -> &Placement;
    fn placement_mut(&mut self) -> &mut Placement;
    fn draw(&mut self, out: &Narrator);

    fn move_to(&mut self, x: f64, y: f64) {
        let placement = self.placement_mut();
        placement.x = x;
        placement.y = y;
    }

    fn set_color(&mut self, color: &str, out: &Narrator) {
        self.placement_mut().api.set_color(color, out);
    }

    fn renderer_name(&self) -> &'static str {
        self.placement().api.name()
    }

    /// Swaps the back end at runtime and hands back the previous one.
    fn set_renderer(&mut self, api: Box<dyn DrawingApi>) -> Box<dyn DrawingApi> {
        std::mem::replace(&mut self.placement_mut().api, api)
    }

    fn export(&self) -> Option<String> {
        self.placement().api.export()
    }
}

fn positive(what: &str, value: f64) -> Result<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(PatternError::invalid_argument(format!("{what} must be positive, got {value}")))
    }
}

struct Circle {
    placement: Placement,
    radius: f64,
}

impl Circle {
    fn new(api: Box<dyn DrawingApi>, x: f64, y: f64, radius: f64) -> Result<Self> {
        Ok(Self {
            placement: Placement::new(api, x, y),
            radius: positive("Radius", radius)?,
        })
    }
}

impl Shape for Circle {
    fn placement(&self) -> &Placement {
        &self.placement
    }

    fn placement_mut(&mut self) -> &mut Placement {
        &mut self.placement
    }

    fn draw(&mut self, out: &Narrator) {
        let Placement { api, x, y } = &mut self.placement;
        api.draw_circle((*x, *y), self.radius, out);
    }
}

struct Rect {
    placement: Placement,
    width: f64,
    height: f64,
}

impl Rect {
    fn new(api: Box<dyn DrawingApi>, x: f64, y: f64, width: f64, height: f64) -> Result<Self> {
        Ok(Self {
            placement: Placement::new(api, x, y),
            width: positive("Width", width)?,
            height: positive("Height", height)?,
        })
    }
}

impl Shape for Rect {
    fn placement(&self) -> &Placement {
        &self.placement
    }

    fn placement_mut(&mut self) -> &mut Placement {
        &mut self.placement
    }

    fn draw(&mut self, out: &Narrator) {
        let Placement { api, x, y } = &mut self.placement;
        api.draw_rectangle((*x, *y), self.width, self.height, out);
    }
}

struct Line {
    placement: Placement,
    end: (f64, f64),
}

impl Shape for Line {
    fn placement(&self) -> &Placement {
        &self.placement
    }

    fn placement_mut(&mut self) -> &mut Placement {
        &mut self.placement
    }

    fn draw(&mut self, out: &Narrator) {
        let Placement { api, x, y } = &mut self.placement;
        api.draw_line((*x, *y), self.end, out);
    }
}

/// Composite figure drawn entirely through the shared back end.
struct House {
    placement: Placement,
}

impl Shape for House {
    fn placement(&self) -> &Placement {
        &self.placement
    }

    fn placement_mut(&mut self) -> &mut Placement {
        &mut self.placement
    }

    fn draw(&mut self, out: &Narrator) {
        let Placement { api, x, y } = &mut self.placement;
        let (x, y) = (*x, *y);
        narrate!(out, "Drawing house at ({x},{y}) using {}", api.name());
        api.set_color("brown", out);
        api.draw_rectangle((x, y), 100.0, 80.0, out);
        api.set_color("red", out);
        api.draw_rectangle((x - 10.0, y + 80.0), 120.0, 40.0, out);
        api.set_color("darkbrown", out);
        api.draw_rectangle((x + 40.0, y), 20.0, 50.0, out);
        api.set_color("lightblue", out);
        api.draw_circle((x + 20.0, y + 60.0), 8.0, out);
        api.draw_circle((x + 80.0, y + 60.0), 8.0, out);
    }
}

// =============================================================================
// Second bridge: notifications x senders
// =============================================================================

trait NotificationSender {
    fn channel(&self) -> &'static str;
    fn deliver(&mut self, title: &str, message: &str, out: &Narrator) -> Result<()>;
}

struct EmailSender {
    recipient: String,
}

impl NotificationSender for EmailSender {
    fn channel(&self) -> &'static str {
        "Email"
    }

    fn deliver(&mut self, title: &str, message: &str, out: &Narrator) -> Result<()> {
        if !self.recipient.contains('@') {
            return Err(PatternError::invalid_argument(format!(
                "'{}' is not an email address",
                self.recipient
            )));
        }
        narrate!(out, "[EMAIL] To: {}", self.recipient);
        narrate!(out, "[EMAIL] Subject: {title}");
        narrate!(out, "[EMAIL] Body: {message}");
        Ok(())
    }
}

#[derive(Default)]
struct SmsSender {
    segments_sent: usize,
}

impl SmsSender {
    const LIMIT: usize = 160;
}

impl NotificationSender for SmsSender {
    fn channel(&self) -> &'static str {
        "SMS"
    }

    fn deliver(&mut self, title: &str, message: &str, out: &Narrator) -> Result<()> {
        let text = format!("{title}: {message}");
        let text = if text.chars().count() > Self::LIMIT {
            let mut cut: String = text.chars().take(Self::LIMIT - 3).collect();
            cut.push_str("...");
            cut
        } else {
            text
        };
        self.segments_sent += 1;
        narrate!(out, "[SMS] {text} ({} chars)", text.chars().count());
        Ok(())
    }
}

struct PushSender;

impl NotificationSender for PushSender {
    fn channel(&self) -> &'static str {
        "Push Notification"
    }

    fn deliver(&mut self, title: &str, message: &str, out: &Narrator) -> Result<()> {
        narrate!(out, "[PUSH] 📱 {title}");
        narrate!(out, "[PUSH] {message}");
        Ok(())
    }
}

/// Abstraction side; refined by how the content is framed.
trait Notification {
    fn sender(&mut self) -> &mut dyn NotificationSender;
    fn content(&self) -> (String, String);

    fn channel(&mut self) -> &'static str {
        self.sender().channel()
    }

    fn send(&mut self, out: &Narrator) -> Result<()> {
        let (title, message) = self.content();
        if title.trim().is_empty() {
            return Err(PatternError::invalid_argument("Notification title is empty"));
        }
        self.sender().deliver(&title, &message, out)
    }
}

struct SimpleNotification {
    sender: Box<dyn NotificationSender>,
    title: String,
    message: String,
}

impl Notification for SimpleNotification {
    fn sender(&mut self) -> &mut dyn NotificationSender {
        self.sender.as_mut()
    }

    fn content(&self) -> (String, String) {
        (self.title.clone(), self.message.clone())
    }
}

struct UrgentNotification {
    sender: Box<dyn NotificationSender>,
    title: String,
    message: String,
}

impl Notification for UrgentNotification {
    fn sender(&mut self) -> &mut dyn NotificationSender {
        self.sender.as_mut()
    }

    fn content(&self) -> (String, String) {
        (format!("🚨 URGENT: {}", self.title), format!("⚠️ {} ⚠️", self.message))
    }
}

fn simple(
    sender: Box<dyn NotificationSender>,
    title: &str,
    message: &str,
) -> Box<dyn Notification> {
    Box::new(SimpleNotification { sender, title: title.into(), message: message.into() })
}

fn urgent(
    sender: Box<dyn NotificationSender>,
    title: &str,
    message: &str,
) -> Box<dyn Notification> {
    Box::new(UrgentNotification { sender, title: title.into(), message: message.into() })
}

fn email() -> Box<dyn NotificationSender> {
    Box::new(EmailSender { recipient: "user@example.com".into() })
}

// =============================================================================
// Demo (cargo run --bin bridge)
// =============================================================================

fn shapes_demo(out: &Narrator) -> Result<()> {
    out.section(1, "Graphics Rendering Bridge");
    let mut shapes: Vec<Box<dyn Shape>> = vec![
        Box::new(Circle::new(Box::<OpenGlRenderer>::default(), 10.0, 10.0, 5.0)?),
        Box::new(Rect::new(Box::<DirectXRenderer>::default(), 20.0, 20.0, 15.0, 10.0)?),
        Box::new(Line {
            placement: Placement::new(Box::<SvgRenderer>::default(), 0.0, 0.0),
            end: (50.0, 50.0),
        }),
    ];
    for shape in shapes.iter_mut() {
        out.blank();
        narrate!(out, "Using {}:", shape.renderer_name());
        shape.set_color("blue", out);
        shape.draw(out);
    }
    Circle::new(Box::<OpenGlRenderer>::default(), 0.0, 0.0, -1.0)
        .map(|_| ())
        .or_narrate(out)?;

    out.section(2, "Complex Shape (House)");
    let mut houses = [
        House { placement: Placement::new(Box::<OpenGlRenderer>::default(), 100.0, 100.0) },
        House { placement: Placement::new(Box::<DirectXRenderer>::default(), 200.0, 100.0) },
    ];
    for house in houses.iter_mut() {
        house.draw(out);
        out.blank();
    }

    out.section(3, "SVG Content Generation");
    let mut svg_circle = Circle::new(Box::<SvgRenderer>::default(), 50.0, 50.0, 25.0)?;
    svg_circle.set_color("red", out);
    svg_circle.draw(out);
    out.blank();
    out.say("Generated SVG:");
    if let Some(document) = svg_circle.export() {
        out.say(document);
    }
    Ok(())
}

fn notifications_demo(out: &Narrator) -> Result<()> {
    out.section(4, "Notification System Bridge");
    let mut notifications = vec![
        simple(email(), "Welcome", "Thank you for signing up!"),
        urgent(Box::<SmsSender>::default(), "Security Alert", "Suspicious login detected"),
        simple(Box::new(PushSender), "New Message", "You have 3 unread messages"),
        urgent(email(), "System Maintenance", "Service will be down for 2 hours"),
        simple(Box::new(EmailSender { recipient: "nobody".into() }), "Bounce", "Never delivered"),
        simple(Box::new(PushSender), "  ", "No title"),
    ];
    let mut delivered = 0;
    for notification in notifications.iter_mut() {
        out.blank();
        narrate!(out, "Sending via {}:", notification.channel());
        if notification.send(out).or_narrate(out)?.is_some() {
            delivered += 1;
        }
    }
    out.blank();
    narrate!(out, "Delivered {delivered} of {} notifications", notifications.len());
    Ok(())
}

fn switching_demo(out: &Narrator) -> Result<()> {
    out.section(5, "Runtime Renderer Switching");
    let mut circle = Circle::new(Box::<OpenGlRenderer>::default(), 25.0, 25.0, 10.0)?;
    out.say("Original renderer:");
    circle.set_color("green", out);
    circle.draw(out);

    out.blank();
    out.say("Switching to DirectX renderer:");
    let previous = circle.set_renderer(Box::<DirectXRenderer>::default());
    narrate!(out, "Detached {} renderer", previous.name());
    circle.set_color("green", out);
    circle.move_to(30.0, 30.0);
    circle.draw(out);
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Bridge", |out, _config| {
        shapes_demo(out)?;
        notifications_demo(out)?;
        switching_demo(out)?;

        out.section(6, "Bridge Pattern Benefits");
        out.checklist(&[
            "Abstractions and implementations vary independently",
            "Back ends can be swapped at runtime",
            "New shapes need no renderer changes",
            "New renderers need no shape changes",
        ]);
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin bridge)
// =============================================================================
