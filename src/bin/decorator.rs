use patterns::prelude::*;
use std::process::ExitCode;

fn dollars(cents: u32) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

// =============================================================================
// Coffee orders: additive decorators
// =============================================================================

trait Coffee {
    fn description(&self) -> String;
    fn cost(&self) -> u32;

    fn size(&self) -> Size {
        Size::Regular
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Size {
    Small,
    Regular,
    Large,
}

impl Size {
    fn label(self) -> &'static str {
        match self {
            Self::Small => "Small",
            Self::Regular => "Regular",
            Self::Large => "Large",
        }
    }
}

struct BasicCoffee {
    size: Size,
}

impl Coffee for BasicCoffee {
    fn description(&self) -> String {
        format!("{} Coffee", self.size.label())
    }

    fn cost(&self) -> u32 {
        match self.size {
            Size::Small => 250,
            Size::Regular => 350,
            Size::Large => 450,
        }
    }

    fn size(&self) -> Size {
        self.size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extra {
    Milk,
    Sugar,
    Vanilla,
    Chocolate,
    WhippedCream,
}

impl Extra {
    fn name(self) -> &'static str {
        match self {
            Self::Milk => "Milk",
            Self::Sugar => "Sugar",
            Self::Vanilla => "Vanilla",
            Self::Chocolate => "Chocolate",
            Self::WhippedCream => "Whipped Cream",
        }
    }

    fn price(self) -> u32 {
        match self {
            Self::Milk => 60,
            Self::Sugar => 25,
            Self::Vanilla => 80,
            Self::Chocolate => 120,
            Self::WhippedCream => 90,
        }
    }
}

/// Wraps a coffee and adds one extra on top of it.
struct WithExtra {
    inner: Box<dyn Coffee>,
    extra: Extra,
}

impl Coffee for WithExtra {
    fn description(&self) -> String {
        format!("{} + {}", self.inner.description(), self.extra.name())
    }

    fn cost(&self) -> u32 {
        self.inner.cost() + self.extra.price()
    }

    fn size(&self) -> Size {
        self.inner.size()
    }
}

/// Percentage off whatever it wraps. Placement matters: extras added
/// outside the discount are charged in full.
struct Discounted {
    inner: Box<dyn Coffee>,
    percent: u32,
}

impl Coffee for Discounted {
    fn description(&self) -> String {
        format!("{} ({}% off)", self.inner.description(), self.percent)
    }

    fn cost(&self) -> u32 {
        self.inner.cost() * (100 - self.percent) / 100
    }

    fn size(&self) -> Size {
        self.inner.size()
    }
}

/// Fluent wrapper around the decorators.
struct CoffeeOrder {
    coffee: Box<dyn Coffee>,
}

impl CoffeeOrder {
    fn new(size: Size) -> Self {
        Self {
            coffee: Box::new(BasicCoffee { size }),
        }
    }

    fn add(self, extra: Extra) -> Self {
        Self {
            coffee: Box::new(WithExtra {
                inner: self.coffee,
                extra,
            }),
        }
    }

    fn discount(self, percent: u32) -> Result<Self> {
        if percent > 100 {
            return Err(PatternError::invalid_argument(format!(
                "discount of {percent}% exceeds 100%"
            )));
        }
        Ok(Self {
            coffee: Box::new(Discounted {
                inner: self.coffee,
                percent,
            }),
        })
    }

    fn build(self) -> Box<dyn Coffee> {
        self.coffee
    }
}

fn print_order(out: &Narrator, coffee: &dyn Coffee) {
    narrate!(out, "Order: {}", coffee.description());
    narrate!(out, "Cost: {}", dollars(coffee.cost()));
    narrate!(out, "Size: {}", coffee.size().label());
    out.say("-".repeat(40));
}

// =============================================================================
// Text styling: markup decorators over escaped text
// =============================================================================

trait Text {
    fn html(&self) -> String;

    /// Characters a reader sees; markup never counts.
    fn visible_len(&self) -> usize;
}

struct PlainText {
    text: String,
}

impl PlainText {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

impl Text for PlainText {
    fn html(&self) -> String {
        html_escape::encode_text(&self.text).into_owned()
    }

    fn visible_len(&self) -> usize {
        self.text.chars().count()
    }
}

struct Tagged {
    inner: Box<dyn Text>,
    tag: &'static str,
}

impl Text for Tagged {
    fn html(&self) -> String {
        format!("<{tag}>{}</{tag}>", self.inner.html(), tag = self.tag)
    }

    fn visible_len(&self) -> usize {
        self.inner.visible_len()
    }
}

struct Colored {
    inner: Box<dyn Text>,
    color: String,
}

impl Text for Colored {
    fn html(&self) -> String {
        format!(
            "<span style=\"color:{}\">{}</span>",
            html_escape::encode_double_quoted_attribute(&self.color),
            self.inner.html()
        )
    }

    fn visible_len(&self) -> usize {
        self.inner.visible_len()
    }
}

fn bold(inner: impl Text + 'static) -> Tagged {
    Tagged {
        inner: Box::new(inner),
        tag: "b",
    }
}

fn italic(inner: impl Text + 'static) -> Tagged {
    Tagged {
        inner: Box::new(inner),
        tag: "i",
    }
}

fn underline(inner: impl Text + 'static) -> Tagged {
    Tagged {
        inner: Box::new(inner),
        tag: "u",
    }
}

fn colored(inner: impl Text + 'static, color: &str) -> Colored {
    Colored {
        inner: Box::new(inner),
        color: color.to_string(),
    }
}

// =============================================================================
// Data streams: transformative decorators
// =============================================================================

trait DataStream {
    fn read(&mut self) -> Result<Vec<u8>>;
    fn write(&mut self, data: &[u8]) -> Result<()>;
    fn info(&self) -> String;
}

/// In-memory stand-in for a file; keeps whatever bytes reach it.
struct MemoryFile {
    name: String,
    stored: Vec<u8>,
}

impl MemoryFile {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stored: format!("Sample file content: {name}").into_bytes(),
        }
    }
}

impl DataStream for MemoryFile {
    fn read(&mut self) -> Result<Vec<u8>> {
        Ok(self.stored.clone())
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.stored = data.to_vec();
        Ok(())
    }

    fn info(&self) -> String {
        format!("File: {}", self.name)
    }
}

/// Repeating-key XOR. Its own inverse.
struct Encryption<S> {
    inner: S,
    key: Vec<u8>,
}

impl<S: DataStream> Encryption<S> {
    fn new(inner: S, key: &[u8]) -> Result<Self> {
        if key.is_empty() {
            return Err(PatternError::invalid_argument("encryption key must not be empty"));
        }
        Ok(Self {
            inner,
            key: key.to_vec(),
        })
    }

    fn apply(&self, data: &[u8]) -> Vec<u8> {
        data.iter()
            .zip(self.key.iter().cycle())
            .map(|(byte, key)| byte ^ key)
            .collect()
    }
}

impl<S: DataStream> DataStream for Encryption<S> {
    fn read(&mut self) -> Result<Vec<u8>> {
        let raw = self.inner.read()?;
        Ok(self.apply(&raw))
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let sealed = self.apply(data);
        self.inner.write(&sealed)
    }

    fn info(&self) -> String {
        format!("{} [Encrypted]", self.inner.info())
    }
}

/// Run-length encoding as `(count, byte)` pairs, runs capped at 255.
struct Compression<S> {
    inner: S,
}

fn rle_encode(data: &[u8]) -> Vec<u8> {
    let mut encoded = Vec::new();
    let mut iter = data.iter().peekable();
    while let Some(&byte) = iter.next() {
        let mut run: u8 = 1;
        while run < u8::MAX && iter.peek() == Some(&&byte) {
            iter.next();
            run += 1;
        }
        encoded.push(run);
        encoded.push(byte);
    }
    encoded
}

fn rle_decode(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() % 2 != 0 {
        return Err(PatternError::precondition(
            "corrupt run-length data: odd number of bytes",
        ));
    }
    let mut decoded = Vec::with_capacity(data.len());
    for pair in data.chunks_exact(2) {
        let (run, byte) = (pair[0], pair[1]);
        if run == 0 {
            return Err(PatternError::precondition("corrupt run-length data: empty run"));
        }
        decoded.extend(std::iter::repeat(byte).take(usize::from(run)));
    }
    Ok(decoded)
}

impl<S: DataStream> DataStream for Compression<S> {
    fn read(&mut self) -> Result<Vec<u8>> {
        let raw = self.inner.read()?;
        rle_decode(&raw)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write(&rle_encode(data))
    }

    fn info(&self) -> String {
        format!("{} [Compressed]", self.inner.info())
    }
}

struct Logging<S> {
    inner: S,
    out: Narrator,
}

impl<S: DataStream> DataStream for Logging<S> {
    fn read(&mut self) -> Result<Vec<u8>> {
        narrate!(self.out, "[LOG] Reading from {}", self.inner.info());
        let data = self.inner.read()?;
        tracing::debug!(bytes = data.len(), "stream read");
        Ok(data)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        narrate!(self.out, "[LOG] Writing to {}: {} bytes", self.inner.info(), data.len());
        self.inner.write(data)
    }

    fn info(&self) -> String {
        format!("{} [Logged]", self.inner.info())
    }
}

fn hex_preview(bytes: &[u8]) -> String {
    let shown: Vec<String> = bytes.iter().take(12).map(|b| format!("{b:02x}")).collect();
    let more = if bytes.len() > 12 { " ..." } else { "" };
    format!("{}{more}", shown.join(" "))
}

// =============================================================================
// Demo (cargo run --bin decorator)
// =============================================================================

fn coffee_demo(out: &Narrator) -> Result<()> {
    out.section(1, "Coffee Shop Orders");

    print_order(out, &BasicCoffee { size: Size::Large });
    print_order(out, CoffeeOrder::new(Size::Regular).add(Extra::Milk).build().as_ref());

    let complex = CoffeeOrder::new(Size::Large)
        .add(Extra::Sugar)
        .add(Extra::Milk)
        .add(Extra::Vanilla)
        .add(Extra::Chocolate)
        .add(Extra::WhippedCream)
        .build();
    print_order(out, complex.as_ref());

    out.blank();
    out.say("Discount placement changes the bill:");
    let inside = CoffeeOrder::new(Size::Regular)
        .add(Extra::Chocolate)
        .discount(50)?
        .build();
    let outside = CoffeeOrder::new(Size::Regular)
        .discount(50)?
        .add(Extra::Chocolate)
        .build();
    print_order(out, inside.as_ref());
    print_order(out, outside.as_ref());

    CoffeeOrder::new(Size::Small).discount(150).or_narrate(out)?;
    Ok(())
}

fn text_demo(out: &Narrator) {
    out.section(2, "Text Formatting");

    let plain = PlainText::new("Hello World");
    narrate!(out, "Plain: {} (length: {})", plain.html(), plain.visible_len());

    let bolded = bold(PlainText::new("Hello World"));
    narrate!(out, "Bold: {} (length: {})", bolded.html(), bolded.visible_len());

    let styled = colored(underline(italic(bold(PlainText::new("Styled Text")))), "red");
    narrate!(out, "Styled: {}", styled.html());
    narrate!(
        out,
        "Visible length: {}, markup length: {}",
        styled.visible_len(),
        styled.html().len()
    );

    let hostile = bold(PlainText::new("<script>alert('x')</script> & more"));
    narrate!(out, "Escaped: {}", hostile.html());
}

fn stream_demo(out: &Narrator) -> Result<()> {
    out.section(3, "Data Stream Processing");

    let mut file = MemoryFile::new("data.txt");
    narrate!(out, "Basic stream info: {}", file.info());
    narrate!(out, "Content: {}", String::from_utf8_lossy(&file.read()?));

    out.blank();
    out.say("Logged stream:");
    let mut logged = Logging {
        inner: MemoryFile::new("logged_data.txt"),
        out: out.clone(),
    };
    narrate!(out, "Info: {}", logged.info());
    let content = logged.read()?;
    narrate!(out, "Content: {}", String::from_utf8_lossy(&content));

    out.blank();
    out.say("Complex stream (File -> Compression -> Encryption -> Logging):");
    let mut secure = Logging {
        inner: Encryption::new(
            Compression {
                inner: MemoryFile::new("secure_data.txt"),
            },
            b"k3y",
        )?,
        out: out.clone(),
    };
    narrate!(out, "Info: {}", secure.info());
    let message = b"AAAAAAAAaaaa This is sensitive data that needs protection";
    secure.write(message)?;
    narrate!(out, "Stored bytes: {}", hex_preview(&secure.inner.inner.inner.stored));
    let recovered = secure.read()?;
    narrate!(out, "Retrieved content: {}", String::from_utf8_lossy(&recovered));
    narrate!(out, "Round trip intact: {}", recovered == message);

    out.blank();
    out.say("Tampered storage is detected on read:");
    let mut compressed = Compression {
        inner: MemoryFile::new("broken.bin"),
    };
    compressed.inner.stored = vec![3, b'x', 9];
    compressed.read().or_narrate(out)?;
    Ok(())
}

fn menu_demo(out: &Narrator) {
    out.section(4, "Coffee Shop Menu Simulation");

    let orders = vec![
        CoffeeOrder::new(Size::Small).add(Extra::Sugar).build(),
        CoffeeOrder::new(Size::Regular).add(Extra::Milk).add(Extra::Vanilla).build(),
        CoffeeOrder::new(Size::Large)
            .add(Extra::Chocolate)
            .add(Extra::WhippedCream)
            .build(),
        CoffeeOrder::new(Size::Regular)
            .add(Extra::Milk)
            .add(Extra::Sugar)
            .add(Extra::Vanilla)
            .add(Extra::Chocolate)
            .add(Extra::WhippedCream)
            .build(),
    ];

    for (index, order) in orders.iter().enumerate() {
        narrate!(out, "Order #{}:", index + 1);
        narrate!(out, "  {}", order.description());
        narrate!(out, "  Cost: {}", dollars(order.cost()));
    }
    let revenue: u32 = orders.iter().map(|order| order.cost()).sum();
    out.blank();
    narrate!(out, "Total Revenue: {}", dollars(revenue));
}

fn main() -> ExitCode {
    patterns::runner::run("Decorator", |out, _config| {
        coffee_demo(out)?;
        text_demo(out);
        stream_demo(out)?;
        menu_demo(out);
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin decorator)
// =============================================================================
