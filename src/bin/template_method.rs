use patterns::prelude::*;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;

// =============================================================================
// Data processing pipeline
// =============================================================================

/// Fixed pipeline with required steps and optional hooks. Implementors
/// supply the steps; `process` owns the order and should not be overridden.
trait DataProcessor {
    fn kind(&self) -> &'static str;

    fn load(&mut self, out: &Narrator) -> Result<()>;
    fn validate(&mut self, out: &Narrator) -> Result<()>;
    fn transform(&mut self, out: &Narrator);
    fn save(&mut self, out: &Narrator) -> Result<()>;

    fn has_additional_processing(&self) -> bool {
        false
    }

    fn additional_processing(&mut self, out: &Narrator) {
        out.say("No additional processing needed");
    }

    fn on_validation_error(&mut self, error: &PatternError, out: &Narrator) {
        narrate!(out, "Default validation error handling: {error}");
    }

    fn cleanup(&mut self, out: &Narrator) {
        out.say("Performing default cleanup");
    }

    /// Returns whether the data made it through validation and was saved.
    /// Cleanup runs on every path, including a failed load or save.
    fn process(&mut self, out: &Narrator) -> Result<bool> {
        out.say("Starting data processing...");
        let outcome = self.load(out).and_then(|()| match self.validate(out) {
            Ok(()) => {
                self.transform(out);
                if self.has_additional_processing() {
                    self.additional_processing(out);
                }
                self.save(out).map(|()| true)
            }
            Err(error) if !error.is_fatal() => {
                out.say("Data validation failed!");
                self.on_validation_error(&error, out);
                Ok(false)
            }
            Err(error) => Err(error),
        });
        self.cleanup(out);
        out.say("Data processing completed.");
        outcome
    }
}

/// Reads rows without a header and writes the processed rows beside the
/// configured work directory.
struct CsvProcessor {
    source: String,
    raw: String,
    rows: Vec<csv::StringRecord>,
    output: PathBuf,
}

impl CsvProcessor {
    fn new(source: &str, raw: &str, config: &DemoConfig) -> Self {
        let stem = source.trim_end_matches(".csv");
        Self {
            source: source.to_string(),
            raw: raw.to_string(),
            rows: Vec::new(),
            output: config.file_path(format!("{stem}_processed.csv")),
        }
    }
}

impl DataProcessor for CsvProcessor {
    fn kind(&self) -> &'static str {
        "CSV Data Processor"
    }

    fn load(&mut self, out: &Narrator) -> Result<()> {
        narrate!(out, "Loading CSV data from: {}", self.source);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(self.raw.as_bytes());
        self.rows = reader.records().collect::<std::result::Result<_, _>>()?;
        out.pause_ms(500);
        narrate!(out, "Loaded {} rows", self.rows.len());
        Ok(())
    }

    fn validate(&mut self, out: &Narrator) -> Result<()> {
        out.say("Validating CSV data...");
        let header = self
            .rows
            .first()
            .ok_or_else(|| PatternError::invalid_argument("No data to validate"))?;
        if let Some((index, row)) = self
            .rows
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| row.len() != header.len())
        {
            return Err(PatternError::invalid_argument(format!(
                "Row {index} has {} columns, expected {}",
                row.len(),
                header.len()
            )));
        }
        out.say("CSV data validation successful");
        Ok(())
    }

    fn transform(&mut self, out: &Narrator) {
        out.say("Transforming CSV data...");
        self.rows = self
            .rows
            .iter()
            .map(|row| row.iter().map(str::to_uppercase).collect())
            .collect();
        out.say("CSV transformation completed");
    }

    fn save(&mut self, out: &Narrator) -> Result<()> {
        narrate!(out, "Saving processed CSV data to: {}", self.output.display());
        let mut writer = csv::Writer::from_path(&self.output)?;
        for row in &self.rows {
            writer.write_record(row)?;
            narrate!(out, "  {}", row.iter().collect::<Vec<_>>().join(","));
        }
        writer.flush()?;
        out.pause_ms(300);
        out.say("CSV data saved successfully");
        Ok(())
    }

    fn has_additional_processing(&self) -> bool {
        true
    }

    fn additional_processing(&mut self, out: &Narrator) {
        out.say("Performing CSV-specific formatting...");
        for row in &self.rows {
            narrate!(out, "  Formatted: \"{}\"", row.iter().collect::<Vec<_>>().join("\", \""));
        }
    }
}

struct JsonProcessor {
    endpoint: String,
    raw: String,
    processed_at: String,
    document: Value,
    saved: Option<String>,
}

impl JsonProcessor {
    fn new(endpoint: &str, raw: &str, processed_at: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            raw: raw.to_string(),
            processed_at: processed_at.to_string(),
            document: Value::Null,
            saved: None,
        }
    }
}

impl DataProcessor for JsonProcessor {
    fn kind(&self) -> &'static str {
        "JSON Data Processor"
    }

    fn load(&mut self, out: &Narrator) -> Result<()> {
        narrate!(out, "Loading JSON data from API: {}", self.endpoint);
        out.pause_ms(800);
        out.say("JSON data loaded");
        Ok(())
    }

    fn validate(&mut self, out: &Narrator) -> Result<()> {
        out.say("Validating JSON data...");
        let document: Value = serde_json::from_str(&self.raw)
            .map_err(|e| PatternError::invalid_argument(format!("Invalid JSON format: {e}")))?;
        if !document.is_object() {
            return Err(PatternError::invalid_argument("Invalid JSON format: expected an object"));
        }
        self.document = document;
        out.say("JSON validation successful");
        Ok(())
    }

    fn transform(&mut self, out: &Narrator) {
        out.say("Transforming JSON data...");
        if let Some(object) = self.document.as_object_mut() {
            object.insert("processed_at".to_string(), json!(self.processed_at));
        }
        out.say("JSON transformation completed");
    }

    fn save(&mut self, out: &Narrator) -> Result<()> {
        out.say("Saving processed JSON data...");
        let text = serde_json::to_string(&self.document)?;
        narrate!(out, "  {text}");
        self.saved = Some(text);
        out.pause_ms(400);
        out.say("JSON data saved to database");
        Ok(())
    }

    fn on_validation_error(&mut self, error: &PatternError, out: &Narrator) {
        narrate!(out, "JSON validation error ({error}) - sending alert to admin");
    }
}

// =============================================================================
// Game levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelOutcome {
    Won,
    Lost { retry_offered: bool },
}

trait GameLevel {
    const MAX_FRAMES: u32 = 100;

    fn name(&self) -> &'static str;
    fn initialize(&mut self, out: &Narrator);
    fn process_input(&mut self, out: &Narrator);
    fn update(&mut self, out: &Narrator);
    fn render(&self, out: &Narrator);
    fn is_complete(&self) -> bool;
    fn is_successful(&self) -> bool;

    fn introduction(&self, out: &Narrator) {
        narrate!(out, "Welcome to {}!", self.name());
    }

    fn should_show_hint(&self) -> bool {
        false
    }

    fn hint(&self, out: &Narrator) {
        out.say("Hint: Keep trying!");
    }

    fn success_message(&self, out: &Narrator) {
        out.say("🎉 Level completed successfully!");
    }

    fn failure_message(&self, out: &Narrator) {
        out.say("💀 Level failed!");
    }

    fn unlock_next_level(&self, out: &Narrator) {
        out.say("🔓 Next level unlocked!");
    }

    fn allow_retry(&self) -> bool {
        true
    }

    fn cleanup(&mut self, out: &Narrator) {
        out.say("Cleaning up level resources");
    }

    fn play(&mut self, out: &Narrator) -> Result<LevelOutcome> {
        narrate!(out, "=== Starting Level: {} ===", self.name());
        self.initialize(out);
        self.introduction(out);

        let mut frames = 0;
        while !self.is_complete() {
            if frames == Self::MAX_FRAMES {
                self.cleanup(out);
                return Err(PatternError::fatal(format!(
                    "level '{}' did not finish within {} frames",
                    self.name(),
                    Self::MAX_FRAMES
                )));
            }
            self.process_input(out);
            self.update(out);
            self.render(out);
            if self.should_show_hint() {
                self.hint(out);
            }
            frames += 1;
        }

        let outcome = if self.is_successful() {
            self.success_message(out);
            self.unlock_next_level(out);
            LevelOutcome::Won
        } else {
            self.failure_message(out);
            let retry_offered = self.allow_retry();
            if retry_offered {
                out.say("🔄 Press R to retry");
            }
            LevelOutcome::Lost { retry_offered }
        };
        self.cleanup(out);
        out.say("=== Level Complete ===");
        Ok(outcome)
    }
}

#[derive(Default)]
struct TutorialLevel {
    actions: u32,
}

impl GameLevel for TutorialLevel {
    fn name(&self) -> &'static str {
        "Tutorial"
    }

    fn initialize(&mut self, out: &Narrator) {
        out.say("Setting up tutorial environment...");
        self.actions = 0;
    }

    fn process_input(&mut self, out: &Narrator) {
        out.say("Processing tutorial input...");
        self.actions += 1;
    }

    fn update(&mut self, out: &Narrator) {
        narrate!(out, "Updating tutorial state (action {})", self.actions);
    }

    fn render(&self, out: &Narrator) {
        out.say("Rendering tutorial frame");
        out.pause_ms(100);
    }

    fn is_complete(&self) -> bool {
        self.actions >= 3
    }

    fn is_successful(&self) -> bool {
        self.is_complete()
    }

    fn introduction(&self, out: &Narrator) {
        out.say("🎮 Welcome to the tutorial! Learn the basics here.");
    }

    fn should_show_hint(&self) -> bool {
        self.actions == 1
    }

    fn hint(&self, out: &Narrator) {
        out.say("💡 Hint: Try moving around and interacting with objects!");
    }
}

struct BossLevel {
    player_attack: i32,
    boss_attack: i32,
    boss_hp: i32,
    player_hp: i32,
    turn: u32,
    retries_left: u32,
}

impl BossLevel {
    fn new(player_attack: i32, boss_attack: i32, retries_left: u32) -> Self {
        Self {
            player_attack,
            boss_attack,
            boss_hp: 100,
            player_hp: 100,
            turn: 0,
            retries_left,
        }
    }
}

impl GameLevel for BossLevel {
    fn name(&self) -> &'static str {
        "Boss Battle"
    }

    fn initialize(&mut self, out: &Narrator) {
        out.say("Initializing boss arena...");
        self.boss_hp = 100;
        self.player_hp = 100;
        self.turn = 0;
    }

    fn process_input(&mut self, out: &Narrator) {
        out.say("Player attacks boss!");
        self.boss_hp -= self.player_attack;
        self.turn += 1;
    }

    fn update(&mut self, out: &Narrator) {
        if self.boss_hp > 0 && self.player_hp > 0 {
            out.say("Boss attacks player!");
            self.player_hp -= self.boss_attack;
        }
        narrate!(out, "Boss HP: {}, Player HP: {}", self.boss_hp.max(0), self.player_hp.max(0));
    }

    fn render(&self, out: &Narrator) {
        out.say("Rendering epic boss battle!");
        out.pause_ms(200);
    }

    fn is_complete(&self) -> bool {
        self.boss_hp <= 0 || self.player_hp <= 0
    }

    fn is_successful(&self) -> bool {
        self.boss_hp <= 0 && self.player_hp > 0
    }

    fn introduction(&self, out: &Narrator) {
        out.say("⚔️ A mighty boss appears! Prepare for battle!");
    }

    fn should_show_hint(&self) -> bool {
        self.turn == 2 && self.boss_hp > 60
    }

    fn hint(&self, out: &Narrator) {
        out.say("💡 Hint: Try using special attacks for more damage!");
    }

    fn success_message(&self, out: &Narrator) {
        out.say("🏆 Boss defeated! You are victorious!");
    }

    fn failure_message(&self, out: &Narrator) {
        out.say("💀 You have been defeated by the boss!");
    }

    fn allow_retry(&self) -> bool {
        self.retries_left > 0
    }

    fn cleanup(&mut self, out: &Narrator) {
        if !self.is_successful() {
            self.retries_left = self.retries_left.saturating_sub(1);
        }
        narrate!(out, "Cleaning up arena ({} retries left)", self.retries_left);
    }
}

// =============================================================================
// Recipes
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CookingStep {
    Prepare,
    Preheat,
    CookMain,
    SideDish,
    Garnish,
    Plate,
}

trait Recipe {
    fn dish_name(&self) -> &'static str;
    fn estimated_minutes(&self) -> u32;
    fn prepare_ingredients(&self, out: &Narrator);
    fn cook_main_dish(&self, out: &Narrator);
    fn plate(&self, out: &Narrator);

    fn requires_preparation(&self) -> bool {
        true
    }

    fn needs_side_dish(&self) -> bool {
        false
    }

    fn requires_garnish(&self) -> bool {
        false
    }

    fn preheat(&self, out: &Narrator) {
        out.say("🔥 Preheating oven to 350°F");
    }

    fn prepare_side_dish(&self, out: &Narrator) {
        out.say("🥗 Preparing side dish");
    }

    fn add_garnish(&self, out: &Narrator) {
        out.say("🌿 Adding garnish");
    }

    /// Returns the steps performed, in order.
    fn cook(&self, out: &Narrator) -> Vec<CookingStep> {
        narrate!(out, "🍳 Cooking: {}", self.dish_name());
        narrate!(out, "Estimated time: {} minutes", self.estimated_minutes());
        let mut steps = Vec::new();
        if self.requires_preparation() {
            self.prepare_ingredients(out);
            steps.push(CookingStep::Prepare);
        }
        self.preheat(out);
        steps.push(CookingStep::Preheat);
        self.cook_main_dish(out);
        steps.push(CookingStep::CookMain);
        if self.needs_side_dish() {
            self.prepare_side_dish(out);
            steps.push(CookingStep::SideDish);
        }
        if self.requires_garnish() {
            self.add_garnish(out);
            steps.push(CookingStep::Garnish);
        }
        self.plate(out);
        steps.push(CookingStep::Plate);
        narrate!(out, "✅ {} is ready to serve!", self.dish_name());
        steps
    }
}

struct Carbonara;

impl Recipe for Carbonara {
    fn dish_name(&self) -> &'static str {
        "Spaghetti Carbonara"
    }

    fn estimated_minutes(&self) -> u32 {
        20
    }

    fn prepare_ingredients(&self, out: &Narrator) {
        out.say("🧄 Chopping garlic, dicing bacon, grating cheese");
        out.pause_ms(300);
    }

    fn cook_main_dish(&self, out: &Narrator) {
        out.say("🍝 Boiling pasta and cooking bacon");
        out.say("🥚 Creating egg and cheese mixture");
        out.say("🍳 Combining all ingredients");
        out.pause_ms(500);
    }

    fn plate(&self, out: &Narrator) {
        out.say("🍽️ Plating pasta with fresh black pepper");
    }

    fn requires_garnish(&self) -> bool {
        true
    }

    fn add_garnish(&self, out: &Narrator) {
        out.say("🌿 Adding fresh parsley and extra parmesan");
    }
}

struct RibeyeSteak;

impl Recipe for RibeyeSteak {
    fn dish_name(&self) -> &'static str {
        "Grilled Ribeye Steak"
    }

    fn estimated_minutes(&self) -> u32 {
        25
    }

    fn prepare_ingredients(&self, out: &Narrator) {
        out.say("🧂 Seasoning steak with salt and pepper");
        out.say("🌿 Preparing herb butter");
        out.pause_ms(200);
    }

    fn cook_main_dish(&self, out: &Narrator) {
        out.say("🔥 Grilling steak to medium-rare");
        out.say("🧈 Basting with herb butter");
        out.pause_ms(400);
    }

    fn plate(&self, out: &Narrator) {
        out.say("🍽️ Plating steak with mashed potatoes");
    }

    fn needs_side_dish(&self) -> bool {
        true
    }

    fn prepare_side_dish(&self, out: &Narrator) {
        out.say("🥔 Preparing creamy mashed potatoes and grilled vegetables");
    }

    fn preheat(&self, out: &Narrator) {
        out.say("🔥 Preheating grill to high heat");
    }
}

struct Toast;

impl Recipe for Toast {
    fn dish_name(&self) -> &'static str {
        "Buttered Toast"
    }

    fn estimated_minutes(&self) -> u32 {
        3
    }

    fn prepare_ingredients(&self, _out: &Narrator) {}

    fn cook_main_dish(&self, out: &Narrator) {
        out.say("🍞 Toasting bread until golden");
    }

    fn plate(&self, out: &Narrator) {
        out.say("🧈 Spreading butter and serving");
    }

    fn requires_preparation(&self) -> bool {
        false
    }

    fn preheat(&self, out: &Narrator) {
        out.say("🔥 Warming up the toaster");
    }
}

// =============================================================================
// Demo (cargo run --bin template_method)
// =============================================================================

const SALES_CSV: &str = "region,product,units\nnorth,widget,12\nsouth,gadget,7\n";
const BROKEN_CSV: &str = "region,product,units\nnorth,widget\n";
const USERS_JSON: &str = r#"{"users": [{"name": "John", "age": 30}, {"name": "Jane", "age": 25}]}"#;

fn processing_demo(out: &Narrator, config: &DemoConfig) -> Result<()> {
    out.section(1, "Data Processing Framework");

    let mut processors: Vec<Box<dyn DataProcessor>> = vec![
        Box::new(CsvProcessor::new("sales_data.csv", SALES_CSV, config)),
        Box::new(CsvProcessor::new("broken.csv", BROKEN_CSV, config)),
        Box::new(JsonProcessor::new(
            "https://api.example.com/users",
            USERS_JSON,
            "2024-01-01T10:00:00Z",
        )),
        Box::new(JsonProcessor::new(
            "https://api.example.com/broken",
            "[1, 2",
            "2024-01-01T10:00:00Z",
        )),
    ];
    let mut saved = 0;
    for processor in processors.iter_mut() {
        out.blank();
        narrate!(out, "Using: {}", processor.kind());
        if processor.process(out)? {
            saved += 1;
        }
    }
    narrate!(out, "{saved} of {} sources processed", processors.len());
    Ok(())
}

fn levels_demo(out: &Narrator) -> Result<()> {
    out.section(2, "Game Level Framework");

    let mut levels: Vec<Box<dyn PlayableLevel>> = vec![
        Box::new(TutorialLevel::default()),
        Box::new(BossLevel::new(20, 15, 3)),
        Box::new(BossLevel::new(10, 40, 1)),
    ];
    for level in levels.iter_mut() {
        out.blank();
        let outcome = level.play_level(out)?;
        narrate!(out, "Outcome: {outcome:?}");
    }
    Ok(())
}

/// Object-safe face of `GameLevel`, whose associated const keeps it from
/// being used as `dyn` directly.
trait PlayableLevel {
    fn play_level(&mut self, out: &Narrator) -> Result<LevelOutcome>;
}

impl<L: GameLevel> PlayableLevel for L {
    fn play_level(&mut self, out: &Narrator) -> Result<LevelOutcome> {
        self.play(out)
    }
}

fn recipes_demo(out: &Narrator) {
    out.section(3, "Cooking Recipe Framework");

    let recipes: Vec<Box<dyn Recipe>> =
        vec![Box::new(Carbonara), Box::new(RibeyeSteak), Box::new(Toast)];
    let total: u32 = recipes.iter().map(|r| r.estimated_minutes()).sum();
    for recipe in &recipes {
        out.blank();
        let steps = recipe.cook(out);
        narrate!(out, "{} steps performed", steps.len());
    }
    narrate!(out, "Total kitchen time: {total} minutes");
}

fn main() -> ExitCode {
    patterns::runner::run("Template Method", |out, config| {
        processing_demo(out, config)?;
        levels_demo(out)?;
        recipes_demo(out);

        out.section(4, "Template Method Pattern Benefits");
        out.checklist(&[
            "Defines algorithm skeleton in one place",
            "Implementors supply only the specific steps",
            "Hook methods provide optional customization",
            "Inversion of control - framework calls user code",
            "Easy to add new implementations",
        ]);
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin template_method)
// =============================================================================
