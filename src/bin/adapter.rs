use patterns::prelude::*;
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::process::ExitCode;
use std::str::FromStr;

// =============================================================================
// Media players: incompatible adaptees behind one target interface
// =============================================================================

/// Target interface the client code is written against.
trait MediaPlayer {
    fn play(&self, format: &str, file: &str, out: &Narrator) -> Result<()>;

    /// Derives the format from the file extension.
    fn play_file(&self, file: &str, out: &Narrator) -> Result<()> {
        let format = Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| PatternError::invalid_argument(format!("'{file}' has no extension")))?;
        self.play(&format.to_ascii_lowercase(), file, out)
    }
}

struct Mp3Player;

impl Mp3Player {
    fn play_mp3(&self, file: &str, out: &Narrator) {
        narrate!(out, "Playing MP3 file: {file}");
    }
}

struct VlcPlayer;

impl VlcPlayer {
    fn play_vlc(&self, file: &str, out: &Narrator) {
        narrate!(out, "Playing VLC file: {file}");
    }
}

struct Mp4Player;

impl Mp4Player {
    fn play_mp4(&self, file: &str, out: &Narrator) {
        narrate!(out, "Playing MP4 file: {file}");
    }
}

struct FlacPlayer;

impl FlacPlayer {
    fn load_lossless(&self, file: &str) -> String {
        format!("{file} (lossless)")
    }

    fn start(&self, track: String, out: &Narrator) {
        narrate!(out, "Playing FLAC file: {track}");
    }
}

/// Adapts the advanced players' varied APIs to `MediaPlayer`.
struct AdvancedMediaAdapter {
    vlc: VlcPlayer,
    mp4: Mp4Player,
    flac: FlacPlayer,
}

impl AdvancedMediaAdapter {
    fn new() -> Self {
        Self {
            vlc: VlcPlayer,
            mp4: Mp4Player,
            flac: FlacPlayer,
        }
    }
}

impl MediaPlayer for AdvancedMediaAdapter {
    fn play(&self, format: &str, file: &str, out: &Narrator) -> Result<()> {
        match format {
            "vlc" => self.vlc.play_vlc(file, out),
            "mp4" => self.mp4.play_mp4(file, out),
            "flac" => self.flac.start(self.flac.load_lossless(file), out),
            other => {
                return Err(PatternError::unsupported(format!(
                    "{other} format by advanced adapter"
                )))
            }
        }
        Ok(())
    }
}

/// Plays mp3 natively and hands everything else to the adapter.
struct AudioPlayer {
    mp3: Mp3Player,
    adapter: AdvancedMediaAdapter,
}

impl AudioPlayer {
    fn new() -> Self {
        Self {
            mp3: Mp3Player,
            adapter: AdvancedMediaAdapter::new(),
        }
    }
}

impl MediaPlayer for AudioPlayer {
    fn play(&self, format: &str, file: &str, out: &Narrator) -> Result<()> {
        if format == "mp3" {
            self.mp3.play_mp3(file, out);
            Ok(())
        } else {
            self.adapter.play(format, file, out)
        }
    }
}

struct VideoPlayer;

impl VideoPlayer {
    fn play_video(&self, file: &str, quality: &str, out: &Narrator) {
        narrate!(out, "Playing video: {file} in {quality} quality");
    }
}

struct VideoAdapter {
    video: VideoPlayer,
}

impl MediaPlayer for VideoAdapter {
    fn play(&self, format: &str, file: &str, out: &Narrator) -> Result<()> {
        match format {
            "avi" | "mkv" => {
                self.video.play_video(file, "HD", out);
                Ok(())
            }
            other => Err(PatternError::unsupported(format!("video format {other}"))),
        }
    }
}

/// Routes each format to whichever adapter understands it.
struct UniversalPlayer {
    audio: AudioPlayer,
    video: VideoAdapter,
}

impl UniversalPlayer {
    fn new() -> Self {
        Self {
            audio: AudioPlayer::new(),
            video: VideoAdapter { video: VideoPlayer },
        }
    }
}

impl MediaPlayer for UniversalPlayer {
    fn play(&self, format: &str, file: &str, out: &Narrator) -> Result<()> {
        match format {
            "mp3" | "vlc" | "mp4" | "flac" => self.audio.play(format, file, out),
            "avi" | "mkv" => self.video.play(format, file, out),
            other => Err(PatternError::unsupported(format!("media type {other}"))),
        }
    }
}

// =============================================================================
// Payments: integer minor units in front of a dollars-as-float legacy API
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
}

impl Currency {
    /// US cents per 1000 minor units of this currency.
    fn usd_cents_per_mille(self) -> u64 {
        match self {
            Currency::Usd => 1000,
            Currency::Eur => 1100,
            Currency::Gbp => 1300,
            Currency::Jpy => 900,
        }
    }

    fn decimals(self) -> u32 {
        match self {
            Currency::Jpy => 0,
            _ => 2,
        }
    }

    fn to_usd_cents(self, minor: u64) -> u64 {
        (minor * self.usd_cents_per_mille() + 500) / 1000
    }

    fn format(self, minor: u64) -> String {
        match self.decimals() {
            0 => format!("{minor} {self}"),
            _ => format!("{}.{:02} {self}", minor / 100, minor % 100),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
        };
        f.write_str(code)
    }
}

impl FromStr for Currency {
    type Err = PatternError;

    fn from_str(code: &str) -> Result<Self> {
        match code.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "JPY" => Ok(Currency::Jpy),
            _ => Err(PatternError::invalid_argument(format!("Unknown currency '{code}'"))),
        }
    }
}

/// Adaptee: only knows US dollars as floating point.
struct LegacyPaymentSystem {
    processed: f64,
}

impl LegacyPaymentSystem {
    const LIMIT: f64 = 10_000.0;

    fn make_payment(&mut self, amount: f64, out: &Narrator) -> bool {
        if amount <= 0.0 || amount > Self::LIMIT {
            return false;
        }
        self.processed += amount;
        narrate!(out, "Legacy payment: ${amount:.2} processed");
        true
    }

    fn total_processed(&self) -> f64 {
        self.processed
    }
}

/// Target interface: amounts in minor units of an explicit currency.
trait PaymentProcessor {
    fn process_payment(&mut self, currency: Currency, minor: u64, method: &str, out: &Narrator)
        -> Result<String>;

    fn total_processed_usd_cents(&self) -> u64;
}

struct LegacyPaymentAdapter {
    legacy: LegacyPaymentSystem,
    transactions: u32,
}

impl LegacyPaymentAdapter {
    fn new() -> Self {
        Self {
            legacy: LegacyPaymentSystem { processed: 0.0 },
            transactions: 0,
        }
    }
}

impl PaymentProcessor for LegacyPaymentAdapter {
    fn process_payment(
        &mut self,
        currency: Currency,
        minor: u64,
        method: &str,
        out: &Narrator,
    ) -> Result<String> {
        if minor == 0 {
            return Err(PatternError::invalid_argument("Payment amount must be positive"));
        }
        let usd_cents = currency.to_usd_cents(minor);
        let dollars = usd_cents as f64 / 100.0;

        out.say("Adapting modern payment request:");
        narrate!(out, "  Original: {} via {method}", currency.format(minor));
        narrate!(out, "  Converted: ${dollars:.2} USD");

        if !self.legacy.make_payment(dollars, out) {
            return Err(PatternError::precondition(format!(
                "Legacy system declined ${dollars:.2}"
            )));
        }
        self.transactions += 1;
        Ok(format!("TXN_{}_{currency}", self.transactions))
    }

    fn total_processed_usd_cents(&self) -> u64 {
        (self.legacy.total_processed() * 100.0).round() as u64
    }
}

struct PaymentService {
    processors: Vec<Box<dyn PaymentProcessor>>,
}

impl PaymentService {
    fn process_all(
        &mut self,
        currency: &str,
        minor: u64,
        method: &str,
        out: &Narrator,
    ) -> Result<usize> {
        let currency: Currency = currency.parse()?;
        let mut succeeded = 0;
        for processor in self.processors.iter_mut() {
            out.blank();
            out.say("Processing payment...");
            let receipt = processor
                .process_payment(currency, minor, method, out)
                .or_narrate(out)?;
            if let Some(id) = receipt {
                narrate!(out, "Payment successful! Transaction ID: {id}");
                succeeded += 1;
            }
        }
        Ok(succeeded)
    }
}

// =============================================================================
// Rectangles: origin + size in front of a corner-to-corner API
// =============================================================================

trait Rectangle {
    fn draw(&self, x: i32, y: i32, width: i32, height: i32, out: &Narrator) -> Result<Corners>;
}

type Corners = ((i32, i32), (i32, i32));

struct LegacyRectangle;

impl LegacyRectangle {
    fn draw_rectangle(&self, x1: i32, y1: i32, x2: i32, y2: i32, out: &Narrator) {
        narrate!(out, "Legacy Rectangle drawn from ({x1},{y1}) to ({x2},{y2})");
    }
}

struct RectangleAdapter {
    legacy: LegacyRectangle,
}

impl Rectangle for RectangleAdapter {
    fn draw(&self, x: i32, y: i32, width: i32, height: i32, out: &Narrator) -> Result<Corners> {
        if width < 0 || height < 0 {
            return Err(PatternError::invalid_argument(format!(
                "Rectangle size {width}x{height} is negative"
            )));
        }
        let (x2, y2) = x
            .checked_add(width)
            .zip(y.checked_add(height))
            .ok_or_else(|| {
                PatternError::invalid_argument("Rectangle extends past the coordinate space")
            })?;
        self.legacy.draw_rectangle(x, y, x2, y2, out);
        Ok(((x, y), (x2, y2)))
    }
}

// =============================================================================
// Container adapter: a stack over any back-insertable sequence
// =============================================================================

trait BackSequence {
    type Item;
    fn push_back(&mut self, item: Self::Item);
    fn pop_back(&mut self) -> Option<Self::Item>;
    fn back(&self) -> Option<&Self::Item>;
    fn len(&self) -> usize;
}

impl<T> BackSequence for Vec<T> {
    type Item = T;

    fn push_back(&mut self, item: T) {
        self.push(item);
    }

    fn pop_back(&mut self) -> Option<T> {
        self.pop()
    }

    fn back(&self) -> Option<&T> {
        self.last()
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl<T> BackSequence for VecDeque<T> {
    type Item = T;

    fn push_back(&mut self, item: T) {
        VecDeque::push_back(self, item);
    }

    fn pop_back(&mut self) -> Option<T> {
        VecDeque::pop_back(self)
    }

    fn back(&self) -> Option<&T> {
        VecDeque::back(self)
    }

    fn len(&self) -> usize {
        VecDeque::len(self)
    }
}

#[derive(Default)]
struct Stack<C> {
    container: C,
}

impl<C: BackSequence> Stack<C> {
    fn push(&mut self, item: C::Item) {
        self.container.push_back(item);
    }

    fn pop(&mut self) -> Result<C::Item> {
        self.container
            .pop_back()
            .ok_or_else(|| PatternError::exhausted("pop from an empty stack"))
    }

    fn top(&self) -> Option<&C::Item> {
        self.container.back()
    }

    fn len(&self) -> usize {
        self.container.len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Demo (cargo run --bin adapter)
// =============================================================================

fn media_demo(out: &Narrator) -> Result<()> {
    out.section(1, "Media Player Adapter");
    let player = AudioPlayer::new();
    for (format, file) in [
        ("mp3", "song.mp3"),
        ("vlc", "movie.vlc"),
        ("mp4", "video.mp4"),
        ("flac", "highquality.flac"),
        ("wav", "unsupported.wav"),
    ] {
        player.play(format, file, out).or_narrate(out)?;
    }
    Ok(())
}

fn payment_demo(out: &Narrator) -> Result<()> {
    out.section(2, "Payment System Adapter");
    let mut service = PaymentService {
        processors: vec![Box::new(LegacyPaymentAdapter::new())],
    };
    let payments = [
        ("USD", 10_050, "Credit Card"),
        ("EUR", 8_575, "PayPal"),
        ("GBP", 7_525, "Bank Transfer"),
        ("JPY", 12_000, "Konbini"),
        ("USD", 2_000_000, "Wire"),
        ("CHF", 100, "Card"),
    ];
    let mut succeeded = 0;
    for (currency, minor, method) in payments {
        if let Some(count) = service.process_all(currency, minor, method, out).or_narrate(out)? {
            succeeded += count;
        }
    }
    out.blank();
    narrate!(out, "Successful payments: {succeeded}/{}", payments.len());
    let total: u64 = service.processors.iter().map(|p| p.total_processed_usd_cents()).sum();
    narrate!(out, "Legacy ledger total: ${}.{:02}", total / 100, total % 100);
    Ok(())
}

fn rectangle_demo(out: &Narrator) -> Result<()> {
    out.section(3, "Rectangle Adapter");
    let rectangle: Box<dyn Rectangle> = Box::new(RectangleAdapter { legacy: LegacyRectangle });
    rectangle.draw(10, 20, 100, 50, out).or_narrate(out)?;
    rectangle.draw(0, 0, -5, 5, out).or_narrate(out)?;
    Ok(())
}

fn stack_demo(out: &Narrator) -> Result<()> {
    out.section(4, "Container Adapter (Stack)");
    let mut vec_stack: Stack<Vec<i32>> = Stack::default();
    let mut deque_stack: Stack<VecDeque<i32>> = Stack::default();
    for i in 1..=5 {
        vec_stack.push(i);
        deque_stack.push(i * 10);
    }
    narrate!(out, "Pushing elements: 1 2 3 4 5");
    narrate!(out, "Stack size: {}", vec_stack.len());
    if let Some(top) = deque_stack.top() {
        narrate!(out, "Deque-backed stack top: {top}");
    }

    let mut popped = Vec::new();
    while !vec_stack.is_empty() {
        popped.push(vec_stack.pop()?.to_string());
    }
    narrate!(out, "Popping elements: {}", popped.join(" "));
    vec_stack.pop().or_narrate(out)?;
    Ok(())
}

fn universal_demo(out: &Narrator) -> Result<()> {
    out.section(5, "Multiple Media Adapters");
    let player = UniversalPlayer::new();
    for file in ["audio.mp3", "movie.avi", "series.MKV", "unsupported.wmv", "README"] {
        player.play_file(file, out).or_narrate(out)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Adapter", |out, _config| {
        media_demo(out)?;
        payment_demo(out)?;
        rectangle_demo(out)?;
        stack_demo(out)?;
        universal_demo(out)?;
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin adapter)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_player_delegates_to_adapter() {
        let out = Narrator::capture();
        let player = AudioPlayer::new();
        player.play("mp3", "a.mp3", &out).unwrap();
        player.play("flac", "b.flac", &out).unwrap();
        assert_eq!(
            out.lines(),
            vec!["Playing MP3 file: a.mp3", "Playing FLAC file: b.flac (lossless)"]
        );

        let err = player.play("wav", "c.wav", &out).unwrap_err();
        assert_eq!(err.to_string(), "Operation not supported: wav format by advanced adapter");
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_universal_player_routes_by_extension() {
        let out = Narrator::capture();
        let player = UniversalPlayer::new();
        player.play_file("clip.MKV", &out).unwrap();
        player.play_file("song.vlc", &out).unwrap();
        assert!(out.contains("Playing video: clip.MKV in HD quality"));
        assert!(out.contains("Playing VLC file: song.vlc"));
        assert_eq!(player.play_file("noext", &out).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            player.play_file("x.wmv", &out).unwrap_err().kind(),
            ErrorKind::PreconditionFailed
        );
    }

    #[test]
    fn test_currency_conversion_rounds_to_nearest_cent() {
        assert_eq!(Currency::Usd.to_usd_cents(10_050), 10_050);
        assert_eq!(Currency::Eur.to_usd_cents(8_575), 9_433);
        assert_eq!(Currency::Gbp.to_usd_cents(7_525), 9_783);
        assert_eq!(Currency::Jpy.to_usd_cents(12_000), 10_800);
        assert_eq!(Currency::Jpy.format(12_000), "12000 JPY");
        assert_eq!(Currency::Eur.format(8_575), "85.75 EUR");
        assert_eq!("gbp".parse::<Currency>().unwrap(), Currency::Gbp);
        assert!("XYZ".parse::<Currency>().is_err());
    }

    #[test]
    fn test_adapter_round_trips_cents_through_legacy_dollars() {
        let out = Narrator::capture();
        let mut adapter = LegacyPaymentAdapter::new();
        let usd = adapter.process_payment(Currency::Usd, 10_050, "Card", &out).unwrap();
        assert_eq!(usd, "TXN_1_USD");
        let eur = adapter.process_payment(Currency::Eur, 8_575, "PayPal", &out).unwrap();
        assert_eq!(eur, "TXN_2_EUR");
        assert_eq!(adapter.total_processed_usd_cents(), 10_050 + 9_433);
        assert!(out.contains("  Converted: $94.33 USD"));
        assert!(out.contains("Legacy payment: $100.50 processed"));
    }

    #[test]
    fn test_declined_payment_does_not_consume_transaction_id() {
        let out = Narrator::capture();
        let mut adapter = LegacyPaymentAdapter::new();
        let err = adapter.process_payment(Currency::Usd, 2_000_000, "Wire", &out).unwrap_err();
        assert_eq!(err.to_string(), "Legacy system declined $20000.00");
        assert!(adapter.process_payment(Currency::Usd, 0, "Card", &out).is_err());
        assert_eq!(adapter.process_payment(Currency::Usd, 100, "Card", &out).unwrap(), "TXN_1_USD");
        assert_eq!(adapter.total_processed_usd_cents(), 100);
    }

    #[test]
    fn test_rectangle_adapter_converts_size_to_corners() {
        let out = Narrator::capture();
        let adapter = RectangleAdapter { legacy: LegacyRectangle };
        assert_eq!(adapter.draw(10, 20, 100, 50, &out).unwrap(), ((10, 20), (110, 70)));
        assert!(out.contains("Legacy Rectangle drawn from (10,20) to (110,70)"));
        assert!(adapter.draw(0, 0, 1, -1, &out).is_err());
        assert!(adapter.draw(i32::MAX, 0, 1, 1, &out).is_err());
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_stack_over_either_backend() {
        let mut stack: Stack<VecDeque<&str>> = Stack::default();
        stack.push("a");
        stack.push("b");
        assert_eq!(stack.top(), Some(&"b"));
        assert_eq!(stack.pop().unwrap(), "b");
        assert_eq!(stack.pop().unwrap(), "a");
        assert_eq!(stack.pop().unwrap_err().to_string(), "Nothing to pop from an empty stack");

        let mut stack: Stack<Vec<u8>> = Stack::default();
        stack.push(1);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_demo_runs() {
        let out = Narrator::capture();
        media_demo(&out).unwrap();
        payment_demo(&out).unwrap();
        rectangle_demo(&out).unwrap();
        stack_demo(&out).unwrap();
        universal_demo(&out).unwrap();
        assert!(out.contains("❌ Operation not supported: wav format by advanced adapter"));
        assert!(out.contains("Payment successful! Transaction ID: TXN_4_JPY"));
        assert!(out.contains("Successful payments: 4/6"));
        assert!(out.contains("Legacy ledger total: $400.66"));
        assert!(out.contains("❌ Invalid argument: Unknown currency 'CHF'"));
        assert!(out.contains("Popping elements: 5 4 3 2 1"));
        assert!(out.contains("❌ Nothing to pop from an empty stack"));
        assert!(out.contains("❌ Operation not supported: media type wmv"));
    }
}
