use patterns::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::process::ExitCode;

// =============================================================================
// Text editor: originator and opaque snapshot
// =============================================================================

/// Only this module can build or read a snapshot; callers merely hold one.
mod editor {
    use patterns::prelude::*;

    #[derive(Debug, Clone)]
    pub struct TextMemento {
        content: String,
        cursor: usize,
        revision: u64,
    }

    impl TextMemento {
        pub fn revision(&self) -> u64 {
            self.revision
        }
    }

    /// Cursor positions are byte offsets kept on character boundaries.
    pub struct TextEditor {
        content: String,
        cursor: usize,
        revision: u64,
        out: Narrator,
    }

    impl TextEditor {
        pub fn new(out: &Narrator) -> Self {
            Self {
                content: String::new(),
                cursor: 0,
                revision: 0,
                out: out.clone(),
            }
        }

        pub fn content(&self) -> &str {
            &self.content
        }

        pub fn cursor(&self) -> usize {
            self.cursor
        }

        fn touch(&mut self) {
            self.revision += 1;
        }

        pub fn write(&mut self, text: &str) {
            self.content.insert_str(self.cursor, text);
            self.cursor += text.len();
            self.touch();
            narrate!(self.out, "📝 Wrote: '{text}'");
        }

        /// Deletes up to `count` characters before the cursor.
        pub fn delete_previous(&mut self, count: usize) -> Result<String> {
            if self.cursor == 0 || count == 0 {
                return Err(PatternError::exhausted("delete before the cursor"));
            }
            let start = self.content[..self.cursor]
                .char_indices()
                .rev()
                .take(count)
                .last()
                .map_or(self.cursor, |(index, _)| index);
            let deleted: String = self.content.drain(start..self.cursor).collect();
            self.cursor = start;
            self.touch();
            narrate!(self.out, "🗑️ Deleted: '{deleted}'");
            Ok(deleted)
        }

        /// Clamps to the end of the text.
        pub fn move_cursor(&mut self, position: usize) -> Result<()> {
            let position = position.min(self.content.len());
            if !self.content.is_char_boundary(position) {
                return Err(PatternError::invalid_argument(format!(
                    "cursor position {position} splits a character"
                )));
            }
            self.cursor = position;
            narrate!(self.out, "👆 Cursor moved to position: {position}");
            Ok(())
        }

        pub fn replace(&mut self, start: usize, len: usize, text: &str) -> Result<String> {
            if start >= self.content.len() {
                return Err(PatternError::invalid_argument(format!(
                    "replace start {start} is past the end ({})",
                    self.content.len()
                )));
            }
            let end = (start + len).min(self.content.len());
            if !self.content.is_char_boundary(start) || !self.content.is_char_boundary(end) {
                return Err(PatternError::invalid_argument("replace range splits a character"));
            }
            let replaced = self.content[start..end].to_string();
            self.content.replace_range(start..end, text);
            self.cursor = start + text.len();
            self.touch();
            narrate!(self.out, "🔄 Replaced '{replaced}' with '{text}'");
            Ok(replaced)
        }

        pub fn create_memento(&self) -> TextMemento {
            TextMemento {
                content: self.content.clone(),
                cursor: self.cursor,
                revision: self.revision,
            }
        }

        pub fn restore(&mut self, memento: TextMemento) {
            self.content = memento.content;
            self.cursor = memento.cursor;
            self.revision = memento.revision;
            narrate!(self.out, "↩️ Restored revision {}", memento.revision);
        }

        pub fn display(&self) {
            narrate!(self.out, "📄 Content: \"{}\"", self.content);
            narrate!(self.out, "   Cursor at position: {}", self.cursor);
            narrate!(self.out, "   Length: {} characters", self.content.chars().count());
        }
    }
}

use editor::{TextEditor, TextMemento};

const MAX_HISTORY: usize = 50;

/// Caretaker for the editor. Checkpoint before each edit; undo and redo
/// swap the editor's current state with the stored one.
struct EditorHistory {
    history: History<TextMemento>,
    out: Narrator,
}

impl EditorHistory {
    fn new(out: &Narrator) -> Self {
        Self {
            history: History::bounded(MAX_HISTORY),
            out: out.clone(),
        }
    }

    fn checkpoint(&mut self, editor: &TextEditor) {
        if let Some(evicted) = self.history.record(editor.create_memento()) {
            tracing::debug!(revision = evicted.revision(), "evicted oldest snapshot");
        }
        narrate!(self.out, "💾 State saved (history size: {})", self.history.undo_len());
    }

    fn undo(&mut self, editor: &mut TextEditor) -> Result<()> {
        let snapshot = self.history.pop_undo().ok_or_else(|| PatternError::exhausted("undo"))?;
        self.history.push_redo(editor.create_memento());
        editor.restore(snapshot);
        Ok(())
    }

    fn redo(&mut self, editor: &mut TextEditor) -> Result<()> {
        let snapshot = self.history.pop_redo().ok_or_else(|| PatternError::exhausted("redo"))?;
        self.history.push_undo(editor.create_memento());
        editor.restore(snapshot);
        Ok(())
    }

    fn show(&self) {
        self.out.say("📚 History:");
        narrate!(self.out, "   Undo stack: {} states", self.history.undo_len());
        narrate!(self.out, "   Redo stack: {} states", self.history.redo_len());
        if let Some(limit) = self.history.capacity() {
            narrate!(self.out, "   Limit: {limit} states");
        }
    }
}

// =============================================================================
// Game saves: binary snapshots in numbered slots
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct GameState {
    player: String,
    level: u32,
    score: u64,
    lives: u32,
    inventory: BTreeMap<String, u32>,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level {}, Score {}, Lives {}", self.level, self.score, self.lives)
    }
}

/// Encoded bytes plus a one-line label; the slot holder sees nothing else.
#[derive(Debug, Clone)]
struct GameSave {
    bytes: Vec<u8>,
    label: String,
}

impl GameSave {
    fn label(&self) -> &str {
        &self.label
    }

    fn size(&self) -> usize {
        self.bytes.len()
    }
}

struct Game {
    state: GameState,
    out: Narrator,
}

impl Game {
    fn new(player: &str, out: &Narrator) -> Self {
        Self {
            state: GameState {
                player: player.to_string(),
                level: 1,
                score: 0,
                lives: 3,
                inventory: BTreeMap::new(),
            },
            out: out.clone(),
        }
    }

    fn level_up(&mut self) {
        self.state.level += 1;
        narrate!(self.out, "🎮 Level up! Now at {}", self.state);
    }

    fn score_points(&mut self, points: u64) {
        self.state.score += points;
        narrate!(self.out, "⭐ Scored {points} points! Total: {}", self.state.score);
    }

    fn lose_life(&mut self) -> Result<()> {
        if self.state.lives == 0 {
            return Err(PatternError::precondition("💀 No lives left to lose"));
        }
        self.state.lives -= 1;
        narrate!(self.out, "💔 Lost a life! Lives remaining: {}", self.state.lives);
        Ok(())
    }

    fn collect_item(&mut self, item: &str, quantity: u32) {
        let total = self.state.inventory.entry(item.to_string()).or_default();
        *total += quantity;
        narrate!(self.out, "💎 Collected {quantity} {item} (total: {total})");
    }

    fn save(&self) -> Result<GameSave> {
        let save = GameSave {
            bytes: bincode::serialize(&self.state)?,
            label: self.state.to_string(),
        };
        narrate!(self.out, "💾 Game saved at {} ({} bytes)", save.label, save.size());
        Ok(save)
    }

    fn load(&mut self, save: &GameSave) -> Result<()> {
        self.state = bincode::deserialize(&save.bytes)?;
        narrate!(self.out, "📂 Game loaded: {}", self.state);
        Ok(())
    }

    fn display(&self) {
        narrate!(self.out, "🎮 {} - {}", self.state.player, self.state);
        let items: Vec<String> = self
            .state
            .inventory
            .iter()
            .map(|(item, count)| format!("{item}:{count}"))
            .collect();
        narrate!(self.out, "   Inventory: {}", items.join(" "));
    }
}

const SAVE_SLOTS: usize = 5;

struct SaveManager {
    slots: [Option<GameSave>; SAVE_SLOTS],
    out: Narrator,
}

impl SaveManager {
    fn new(out: &Narrator) -> Self {
        Self {
            slots: Default::default(),
            out: out.clone(),
        }
    }

    fn slot_mut(&mut self, slot: usize) -> Result<&mut Option<GameSave>> {
        self.slots
            .get_mut(slot)
            .ok_or_else(|| PatternError::invalid_argument(format!("Invalid save slot: {slot}")))
    }

    /// Overwrites whatever the slot held.
    fn save_to_slot(&mut self, slot: usize, save: GameSave) -> Result<()> {
        let previous = self.slot_mut(slot)?.replace(save);
        match previous {
            Some(old) => {
                narrate!(self.out, "💾 Game saved to slot {slot} (overwrote {})", old.label())
            }
            None => narrate!(self.out, "💾 Game saved to slot {slot}"),
        }
        Ok(())
    }

    fn load_from_slot(&self, slot: usize) -> Result<&GameSave> {
        let save = self
            .slots
            .get(slot)
            .ok_or_else(|| PatternError::invalid_argument(format!("Invalid save slot: {slot}")))?
            .as_ref()
            .ok_or_else(|| PatternError::not_found(format!("save in slot {slot}")))?;
        narrate!(self.out, "📂 Loading from slot {slot}");
        Ok(save)
    }

    fn delete_slot(&mut self, slot: usize) -> Result<()> {
        self.slot_mut(slot)?
            .take()
            .ok_or_else(|| PatternError::not_found(format!("save in slot {slot}")))?;
        narrate!(self.out, "🗑️ Deleted save slot {slot}");
        Ok(())
    }

    fn show_slots(&self) {
        self.out.say("💾 Save Slots:");
        for (index, slot) in self.slots.iter().enumerate() {
            let label = slot.as_ref().map_or("Empty", GameSave::label);
            narrate!(self.out, "   Slot {index}: {label}");
        }
    }

    fn used(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}

// =============================================================================
// Configuration snapshots and named presets
// =============================================================================

mod settings {
    use patterns::prelude::*;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone)]
    pub struct ConfigSnapshot {
        settings: BTreeMap<String, String>,
        description: String,
    }

    impl ConfigSnapshot {
        pub fn description(&self) -> &str {
            &self.description
        }

        pub fn setting_count(&self) -> usize {
            self.settings.len()
        }
    }

    pub struct Configuration {
        settings: BTreeMap<String, String>,
        out: Narrator,
    }

    impl Configuration {
        pub fn new(out: &Narrator) -> Self {
            Self {
                settings: BTreeMap::new(),
                out: out.clone(),
            }
        }

        pub fn set(&mut self, key: &str, value: &str) {
            self.settings.insert(key.to_string(), value.to_string());
            narrate!(self.out, "⚙️ Setting {key} = {value}");
        }

        pub fn get(&self, key: &str) -> Option<&str> {
            self.settings.get(key).map(String::as_str)
        }

        pub fn setting_count(&self) -> usize {
            self.settings.len()
        }

        pub fn reset(&mut self) {
            self.settings.clear();
            self.out.say("🔄 Configuration reset");
        }

        pub fn snapshot(&self, description: &str) -> ConfigSnapshot {
            narrate!(self.out, "📸 Creating configuration snapshot: {description}");
            ConfigSnapshot {
                settings: self.settings.clone(),
                description: description.to_string(),
            }
        }

        pub fn restore(&mut self, snapshot: ConfigSnapshot) {
            self.settings = snapshot.settings;
            narrate!(self.out, "🔄 Restored configuration: {}", snapshot.description);
        }

        pub fn display(&self) {
            self.out.say("⚙️ Current Configuration:");
            for (key, value) in &self.settings {
                narrate!(self.out, "   {key} = {value}");
            }
        }
    }
}

use settings::{ConfigSnapshot, Configuration};

struct PresetManager {
    presets: BTreeMap<String, ConfigSnapshot>,
    out: Narrator,
}

impl PresetManager {
    fn new(out: &Narrator) -> Self {
        Self {
            presets: BTreeMap::new(),
            out: out.clone(),
        }
    }

    fn save(&mut self, name: &str, snapshot: ConfigSnapshot) {
        self.presets.insert(name.to_string(), snapshot);
        narrate!(self.out, "💾 Preset '{name}' saved");
    }

    /// Hands out a copy so the stored preset can be loaded again later.
    fn load(&self, name: &str) -> Result<ConfigSnapshot> {
        let snapshot = self
            .presets
            .get(name)
            .ok_or_else(|| PatternError::not_found(format!("preset '{name}'")))?;
        narrate!(self.out, "📂 Loading preset '{name}'");
        Ok(snapshot.clone())
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        self.presets
            .remove(name)
            .ok_or_else(|| PatternError::not_found(format!("preset '{name}'")))?;
        narrate!(self.out, "🗑️ Preset '{name}' deleted");
        Ok(())
    }

    fn list(&self) {
        self.out.say("📋 Available Presets:");
        for (name, snapshot) in &self.presets {
            narrate!(
                self.out,
                "   {name}: {} ({} settings)",
                snapshot.description(),
                snapshot.setting_count()
            );
        }
    }
}

// =============================================================================
// Demo (cargo run --bin memento)
// =============================================================================

fn editor_demo(out: &Narrator) -> Result<()> {
    out.section(1, "Text Editor with Undo/Redo");

    let mut editor = TextEditor::new(out);
    let mut history = EditorHistory::new(out);
    editor.display();

    for text in ["Hello", " World", "!"] {
        history.checkpoint(&editor);
        editor.write(text);
        editor.display();
    }

    out.blank();
    out.say("Testing undo operations:");
    history.undo(&mut editor)?;
    editor.display();
    history.undo(&mut editor)?;
    editor.display();

    out.blank();
    out.say("Testing redo operations:");
    history.redo(&mut editor)?;
    editor.display();
    history.redo(&mut editor)?;
    history.redo(&mut editor).or_narrate(out)?;

    out.blank();
    out.say("Editing after undo discards the redo stack:");
    history.undo(&mut editor)?;
    history.checkpoint(&editor);
    editor.move_cursor(0)?;
    editor.write(">> ");
    history.checkpoint(&editor);
    editor.replace(3, 5, "Howdy")?;
    history.checkpoint(&editor);
    editor.delete_previous(2)?;
    editor.display();
    editor.replace(99, 1, "?").or_narrate(out)?;
    history.show();
    Ok(())
}

fn game_demo(out: &Narrator) -> Result<()> {
    out.section(2, "Game Save System");

    let mut game = Game::new("Player1", out);
    let mut saves = SaveManager::new(out);
    game.display();

    game.score_points(500);
    game.collect_item("coins", 10);
    game.collect_item("keys", 2);
    saves.save_to_slot(0, game.save()?)?;

    game.level_up();
    game.score_points(750);
    game.collect_item("coins", 15);
    saves.save_to_slot(1, game.save()?)?;

    game.lose_life()?;
    game.lose_life()?;
    game.display();
    saves.save_to_slot(2, game.save()?)?;
    saves.save_to_slot(7, game.save()?).or_narrate(out)?;

    out.blank();
    saves.show_slots();

    out.blank();
    out.say("Loading earlier save:");
    let earlier = saves.load_from_slot(1)?.clone();
    game.load(&earlier)?;
    game.display();
    saves.load_from_slot(4).or_narrate(out)?;

    out.blank();
    saves.save_to_slot(0, game.save()?)?;
    saves.delete_slot(2)?;
    saves.delete_slot(2).or_narrate(out)?;
    narrate!(out, "Slots in use: {}/{SAVE_SLOTS}", saves.used());
    Ok(())
}

fn configuration_demo(out: &Narrator) -> Result<()> {
    out.section(3, "Configuration Management");

    let mut config = Configuration::new(out);
    let mut presets = PresetManager::new(out);

    config.set("theme", "dark");
    config.set("language", "english");
    config.set("notifications", "enabled");
    config.display();
    presets.save("default", config.snapshot("Default settings"));

    config.set("theme", "light");
    config.set("language", "spanish");
    config.set("sound", "enabled");
    presets.save("spanish_light", config.snapshot("Spanish light theme"));

    config.reset();
    for (key, value) in [
        ("theme", "dark"),
        ("language", "english"),
        ("sound", "enabled"),
        ("graphics", "high"),
        ("fps", "60"),
    ] {
        config.set(key, value);
    }
    presets.save("gaming", config.snapshot("Gaming optimized"));

    out.blank();
    presets.list();

    out.blank();
    out.say("Loading default preset:");
    config.restore(presets.load("default")?);
    config.display();
    narrate!(out, "Theme is now {}", config.get("theme").unwrap_or("unset"));

    presets.delete("spanish_light")?;
    presets.load("spanish_light").or_narrate(out)?;
    narrate!(out, "Settings in effect: {}", config.setting_count());
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Memento", |out, _config| {
        editor_demo(out)?;
        game_demo(out)?;
        configuration_demo(out)?;

        out.section(4, "Memento Pattern Benefits");
        out.checklist(&[
            "Preserves encapsulation boundaries",
            "Simplifies originator by delegating state management",
            "State snapshots are immutable",
            "Easy to implement save/restore functionality",
        ]);
        out.blank();
        out.say("Considerations:");
        out.say("⚠️ Can be memory intensive for large states");
        out.say("⚠️ Caretaker must manage memento lifecycle");
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin memento)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_undo_redo_scenario() {
        let out = Narrator::capture();
        let mut editor = TextEditor::new(&out);
        let mut history = EditorHistory::new(&out);
        for text in ["Hello", " World", "!"] {
            history.checkpoint(&editor);
            editor.write(text);
        }
        history.undo(&mut editor).unwrap();
        history.undo(&mut editor).unwrap();
        history.redo(&mut editor).unwrap();
        assert_eq!(editor.content(), "Hello World");
        assert_eq!(editor.cursor(), 11);
    }

    #[test]
    fn test_empty_stacks_are_exhausted() {
        let out = Narrator::capture();
        let mut editor = TextEditor::new(&out);
        let mut history = EditorHistory::new(&out);
        assert_eq!(history.undo(&mut editor).unwrap_err().to_string(), "Nothing to undo");
        assert_eq!(history.redo(&mut editor).unwrap_err().to_string(), "Nothing to redo");
        assert_eq!(editor.content(), "");
    }

    #[test]
    fn test_checkpoint_clears_redo() {
        let out = Narrator::capture();
        let mut editor = TextEditor::new(&out);
        let mut history = EditorHistory::new(&out);
        history.checkpoint(&editor);
        editor.write("a");
        history.undo(&mut editor).unwrap();
        history.checkpoint(&editor);
        editor.write("b");
        assert!(history.redo(&mut editor).is_err());
        assert_eq!(editor.content(), "b");
    }

    #[test]
    fn test_history_is_bounded() {
        let out = Narrator::capture();
        let mut editor = TextEditor::new(&out);
        let mut history = EditorHistory::new(&out);
        for _ in 0..60 {
            history.checkpoint(&editor);
            editor.write("x");
        }
        let mut undone = 0;
        while history.undo(&mut editor).is_ok() {
            undone += 1;
        }
        assert_eq!(undone, MAX_HISTORY);
        assert_eq!(editor.content().len(), 10);
    }

    #[test]
    fn test_editor_edits() {
        let out = Narrator::capture();
        let mut editor = TextEditor::new(&out);
        editor.write("héllo");
        assert_eq!(editor.delete_previous(2).unwrap(), "lo");
        assert_eq!(editor.content(), "hél");
        assert_eq!(editor.move_cursor(2).unwrap_err().kind(), ErrorKind::InvalidArgument);
        editor.move_cursor(100).unwrap();
        assert_eq!(editor.cursor(), 4);
        assert_eq!(editor.replace(0, 1, "H").unwrap(), "h");
        assert_eq!(editor.content(), "Hél");
        assert!(editor.replace(4, 1, "x").is_err());
        editor.move_cursor(0).unwrap();
        assert_eq!(editor.delete_previous(1).unwrap_err().kind(), ErrorKind::Exhausted);
    }

    #[test]
    fn test_game_save_round_trip() {
        let out = Narrator::capture();
        let mut game = Game::new("P", &out);
        game.collect_item("gems", 3);
        game.score_points(10);
        let save = game.save().unwrap();
        let before = game.state.clone();
        game.level_up();
        game.lose_life().unwrap();
        game.collect_item("gems", 1);
        game.load(&save).unwrap();
        assert_eq!(game.state, before);
    }

    #[test]
    fn test_corrupt_save_is_rejected() {
        let out = Narrator::capture();
        let mut game = Game::new("P", &out);
        let mut save = game.save().unwrap();
        save.bytes.truncate(3);
        let err = game.load(&save).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(game.state.player, "P");
    }

    #[test]
    fn test_save_slots() {
        let out = Narrator::capture();
        let game = Game::new("P", &out);
        let mut saves = SaveManager::new(&out);
        let err = saves.save_to_slot(5, game.save().unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(saves.load_from_slot(0).unwrap_err().kind(), ErrorKind::NotFound);
        saves.save_to_slot(4, game.save().unwrap()).unwrap();
        saves.save_to_slot(4, game.save().unwrap()).unwrap();
        assert_eq!(saves.used(), 1);
        assert!(out.contains("💾 Game saved to slot 4 (overwrote Level 1, Score 0, Lives 3)"));
        saves.delete_slot(4).unwrap();
        assert_eq!(saves.delete_slot(4).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_no_lives_left() {
        let out = Narrator::capture();
        let mut game = Game::new("P", &out);
        for _ in 0..3 {
            game.lose_life().unwrap();
        }
        assert_eq!(game.lose_life().unwrap_err().kind(), ErrorKind::PreconditionFailed);
    }

    #[test]
    fn test_presets_are_copied_out() {
        let out = Narrator::capture();
        let mut config = Configuration::new(&out);
        let mut presets = PresetManager::new(&out);
        config.set("theme", "dark");
        presets.save("base", config.snapshot("Base"));
        config.set("theme", "light");
        config.restore(presets.load("base").unwrap());
        assert_eq!(config.get("theme"), Some("dark"));
        config.set("theme", "blue");
        config.restore(presets.load("base").unwrap());
        assert_eq!(config.get("theme"), Some("dark"));
        assert_eq!(presets.load("nope").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_demo_runs() {
        let out = Narrator::capture();
        editor_demo(&out).unwrap();
        game_demo(&out).unwrap();
        configuration_demo(&out).unwrap();
        assert!(out.contains("❌ Nothing to redo"));
        assert!(out.contains("📄 Content: \">> How World\""));
        assert!(out.contains("❌ Invalid argument: Invalid save slot: 7"));
        assert!(out.contains("Slot 3: Empty"));
        assert!(out.contains("📂 Game loaded: Level 2, Score 1250, Lives 3"));
        assert!(out.contains("❌ Not found: save in slot 4"));
        assert!(out.contains("Slots in use: 2/5"));
        assert!(out.contains("   gaming: Gaming optimized (5 settings)"));
        assert!(out.contains("Theme is now dark"));
        assert!(out.contains("❌ Not found: preset 'spanish_light'"));
        assert!(out.contains("Settings in effect: 3"));
    }

    proptest! {
        #[test]
        fn prop_restore_returns_to_saved_state(
            prefix in "[a-z ]{0,12}",
            edits in prop::collection::vec("[a-z]{1,4}", 1..8),
        ) {
            let out = Narrator::capture();
            let mut editor = TextEditor::new(&out);
            editor.write(&prefix);
            let saved = editor.create_memento();
            for edit in &edits {
                editor.write(edit);
            }
            editor.restore(saved);
            prop_assert_eq!(editor.content(), prefix.as_str());
            prop_assert_eq!(editor.cursor(), prefix.len());
        }
    }
}
