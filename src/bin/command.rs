use patterns::prelude::*;
use std::collections::{HashMap, VecDeque};
use std::process::ExitCode;

// =============================================================================
// Role: Command over a receiver `R`
// =============================================================================

/// A reversible request against a receiver. Commands never hold the receiver;
/// the invoker lends it for each call.
trait Command<R> {
    fn execute(&mut self, target: &mut R, out: &Narrator) -> Result<()>;
    fn undo(&mut self, target: &mut R, out: &Narrator) -> Result<()>;
    fn description(&self) -> String;

    fn undoable(&self) -> bool {
        true
    }
}

// =============================================================================
// Receiver: text editor
// =============================================================================

struct TextEditor {
    content: String,
    cursor: usize,
}

impl TextEditor {
    fn new() -> Self {
        Self {
            content: String::new(),
            cursor: 0,
        }
    }

    fn check_position(&self, position: usize, allow_end: bool) -> Result<()> {
        let in_range = if allow_end {
            position <= self.content.len()
        } else {
            position < self.content.len()
        };
        if in_range && self.content.is_char_boundary(position) {
            Ok(())
        } else {
            Err(PatternError::invalid_argument(format!(
                "invalid cursor position {position} (length {})",
                self.content.len()
            )))
        }
    }

    /// Clamp `length` to the content and make sure the span ends on a boundary.
    fn span(&self, position: usize, length: usize) -> Result<usize> {
        let end = position + length.min(self.content.len() - position);
        if self.content.is_char_boundary(end) {
            Ok(end)
        } else {
            Err(PatternError::invalid_argument(format!(
                "span {position}..{end} splits a character"
            )))
        }
    }

    fn insert_text(&mut self, text: &str, position: usize, out: &Narrator) -> Result<()> {
        self.check_position(position, true)?;
        self.content.insert_str(position, text);
        self.cursor = position + text.len();
        narrate!(out, "Inserted '{text}' at position {position}");
        Ok(())
    }

    /// Returns the removed text.
    fn delete_text(&mut self, position: usize, length: usize, out: &Narrator) -> Result<String> {
        // An empty span may sit at the end; undoing an empty insert there lands on it.
        self.check_position(position, length == 0)?;
        let end = self.span(position, length)?;
        let removed: String = self.content.drain(position..end).collect();
        self.cursor = position;
        narrate!(out, "Deleted {} characters at position {position}", removed.len());
        Ok(removed)
    }

    /// Returns the replaced text.
    fn replace_text(
        &mut self,
        position: usize,
        length: usize,
        text: &str,
        out: &Narrator,
    ) -> Result<String> {
        self.check_position(position, length == 0)?;
        let end = self.span(position, length)?;
        let old = self.content[position..end].to_string();
        self.content.replace_range(position..end, text);
        self.cursor = position + text.len();
        narrate!(
            out,
            "Replaced {} characters with '{text}' at position {position}",
            old.len()
        );
        Ok(old)
    }

    fn display(&self, out: &Narrator) {
        narrate!(out, "Content: \"{}\"", self.content);
        narrate!(out, "Cursor at position: {}", self.cursor);
    }
}

// =============================================================================
// Editor commands
// =============================================================================

struct InsertText {
    text: String,
    position: usize,
}

impl InsertText {
    fn boxed(text: &str, position: usize) -> Box<dyn Command<TextEditor>> {
        Box::new(Self {
            text: text.to_string(),
            position,
        })
    }
}

impl Command<TextEditor> for InsertText {
    fn execute(&mut self, editor: &mut TextEditor, out: &Narrator) -> Result<()> {
        editor.insert_text(&self.text, self.position, out)
    }

    fn undo(&mut self, editor: &mut TextEditor, out: &Narrator) -> Result<()> {
        editor.delete_text(self.position, self.text.len(), out)?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Insert '{}' at position {}", self.text, self.position)
    }
}

struct DeleteText {
    position: usize,
    length: usize,
    deleted: Option<String>,
}

impl DeleteText {
    fn boxed(position: usize, length: usize) -> Box<dyn Command<TextEditor>> {
        Box::new(Self {
            position,
            length,
            deleted: None,
        })
    }
}

impl Command<TextEditor> for DeleteText {
    fn execute(&mut self, editor: &mut TextEditor, out: &Narrator) -> Result<()> {
        self.deleted = Some(editor.delete_text(self.position, self.length, out)?);
        Ok(())
    }

    fn undo(&mut self, editor: &mut TextEditor, out: &Narrator) -> Result<()> {
        match &self.deleted {
            Some(text) if !text.is_empty() => editor.insert_text(text, self.position, out),
            _ => Ok(()),
        }
    }

    fn description(&self) -> String {
        format!(
            "Delete {} characters at position {}",
            self.length, self.position
        )
    }
}

struct ReplaceText {
    position: usize,
    length: usize,
    text: String,
    replaced: Option<String>,
}

impl ReplaceText {
    fn boxed(position: usize, length: usize, text: &str) -> Box<dyn Command<TextEditor>> {
        Box::new(Self {
            position,
            length,
            text: text.to_string(),
            replaced: None,
        })
    }
}

impl Command<TextEditor> for ReplaceText {
    fn execute(&mut self, editor: &mut TextEditor, out: &Narrator) -> Result<()> {
        self.replaced = Some(editor.replace_text(self.position, self.length, &self.text, out)?);
        Ok(())
    }

    fn undo(&mut self, editor: &mut TextEditor, out: &Narrator) -> Result<()> {
        let Some(old) = &self.replaced else {
            return Ok(());
        };
        editor.replace_text(self.position, self.text.len(), old, out)?;
        Ok(())
    }

    fn description(&self) -> String {
        format!(
            "Replace {} characters with '{}' at position {}",
            self.length, self.text, self.position
        )
    }
}

// =============================================================================
// Macro command: all-or-nothing composite
// =============================================================================

struct Macro<R> {
    name: String,
    commands: Vec<Box<dyn Command<R>>>,
}

impl<R> Macro<R> {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            commands: Vec::new(),
        }
    }

    fn with(mut self, command: Box<dyn Command<R>>) -> Self {
        self.commands.push(command);
        self
    }
}

impl<R> Command<R> for Macro<R> {
    /// Runs children in order. If one fails, the ones already run are undone
    /// in reverse so the receiver is left as it was.
    fn execute(&mut self, target: &mut R, out: &Narrator) -> Result<()> {
        narrate!(out, "Executing macro: {}", self.name);
        for index in 0..self.commands.len() {
            if let Err(err) = self.commands[index].execute(target, out) {
                tracing::warn!(name = %self.name, index, %err, "macro child failed, rolling back");
                for done in self.commands[..index].iter_mut().rev() {
                    done.undo(target, out)?;
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Undoes children in reverse. If one fails, the ones already undone are
    /// re-applied so either every child is undone or none is.
    fn undo(&mut self, target: &mut R, out: &Narrator) -> Result<()> {
        narrate!(out, "Undoing macro: {}", self.name);
        for index in (0..self.commands.len()).rev() {
            if let Err(err) = self.commands[index].undo(target, out) {
                tracing::warn!(
                    name = %self.name,
                    index,
                    %err,
                    "macro child undo failed, re-applying"
                );
                for undone in self.commands[index + 1..].iter_mut() {
                    undone.execute(target, out)?;
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!("Macro: {} ({} commands)", self.name, self.commands.len())
    }

    fn undoable(&self) -> bool {
        self.commands.iter().all(|command| command.undoable())
    }
}

// =============================================================================
// Invoker: command manager with undo/redo
// =============================================================================

struct CommandManager<R> {
    history: History<Box<dyn Command<R>>>,
    out: Narrator,
}

impl<R> CommandManager<R> {
    fn new(out: &Narrator) -> Self {
        Self {
            history: History::new(),
            out: out.clone(),
        }
    }

    fn execute(&mut self, mut command: Box<dyn Command<R>>, target: &mut R) -> Result<()> {
        narrate!(self.out, "Executing: {}", command.description());
        command.execute(target, &self.out)?;
        if command.undoable() {
            self.history.record(command);
        } else {
            self.history.clear_redo();
        }
        Ok(())
    }

    fn undo(&mut self, target: &mut R) -> Result<()> {
        let mut command = self
            .history
            .pop_undo()
            .ok_or_else(|| PatternError::exhausted("undo"))?;
        narrate!(self.out, "Undoing: {}", command.description());
        match command.undo(target, &self.out) {
            Ok(()) => {
                self.history.push_redo(command);
                Ok(())
            }
            Err(err) => {
                self.history.push_undo(command);
                Err(err)
            }
        }
    }

    fn redo(&mut self, target: &mut R) -> Result<()> {
        let mut command = self
            .history
            .pop_redo()
            .ok_or_else(|| PatternError::exhausted("redo"))?;
        narrate!(self.out, "Redoing: {}", command.description());
        match command.execute(target, &self.out) {
            Ok(()) => {
                self.history.push_undo(command);
                Ok(())
            }
            Err(err) => {
                self.history.push_redo(command);
                Err(err)
            }
        }
    }

    fn can_undo(&self) -> bool {
        self.history.undo_len() > 0
    }

    fn can_redo(&self) -> bool {
        self.history.redo_len() > 0
    }

    fn clear(&mut self) {
        self.history.clear();
        self.out.say("Command history cleared");
    }
}

// =============================================================================
// Remote control: devices owned by the home, commands address them by room
// =============================================================================

struct Light {
    on: bool,
    brightness: u8,
}

struct Fan {
    speed: u8,
}

fn fan_speed_label(speed: u8) -> &'static str {
    match speed {
        0 => "OFF",
        1 => "LOW",
        2 => "MEDIUM",
        _ => "HIGH",
    }
}

#[derive(Default)]
struct Home {
    lights: HashMap<String, Light>,
    fans: HashMap<String, Fan>,
}

impl Home {
    fn add_light(&mut self, room: &str) {
        self.lights.insert(
            room.to_string(),
            Light {
                on: false,
                brightness: 0,
            },
        );
    }

    fn add_fan(&mut self, room: &str) {
        self.fans.insert(room.to_string(), Fan { speed: 0 });
    }

    fn light(&mut self, room: &str) -> Result<&mut Light> {
        self.lights
            .get_mut(room)
            .ok_or_else(|| PatternError::not_found(format!("{room} light")))
    }

    fn fan(&mut self, room: &str) -> Result<&mut Fan> {
        self.fans
            .get_mut(room)
            .ok_or_else(|| PatternError::not_found(format!("{room} fan")))
    }

    fn switch_light(&mut self, room: &str, on: bool, out: &Narrator) -> Result<()> {
        let light = self.light(room)?;
        light.on = on;
        light.brightness = if on { 100 } else { 0 };
        if on {
            narrate!(out, "{room} light is ON (brightness: {}%)", light.brightness);
        } else {
            narrate!(out, "{room} light is OFF");
        }
        Ok(())
    }

    /// Returns the previous speed.
    fn set_fan_speed(&mut self, room: &str, speed: u8, out: &Narrator) -> Result<u8> {
        let fan = self.fan(room)?;
        let previous = fan.speed;
        fan.speed = speed.min(3);
        narrate!(
            out,
            "{room} fan speed set to {} ({})",
            fan.speed,
            fan_speed_label(fan.speed)
        );
        Ok(previous)
    }
}

struct LightSwitch {
    room: String,
    on: bool,
}

impl Command<Home> for LightSwitch {
    fn execute(&mut self, home: &mut Home, out: &Narrator) -> Result<()> {
        home.switch_light(&self.room, self.on, out)
    }

    fn undo(&mut self, home: &mut Home, out: &Narrator) -> Result<()> {
        home.switch_light(&self.room, !self.on, out)
    }

    fn description(&self) -> String {
        let verb = if self.on { "on" } else { "off" };
        format!("Turn {verb} {} light", self.room)
    }
}

struct FanSpeed {
    room: String,
    speed: u8,
    previous: u8,
}

impl Command<Home> for FanSpeed {
    fn execute(&mut self, home: &mut Home, out: &Narrator) -> Result<()> {
        self.previous = home.set_fan_speed(&self.room, self.speed, out)?;
        Ok(())
    }

    fn undo(&mut self, home: &mut Home, out: &Narrator) -> Result<()> {
        home.set_fan_speed(&self.room, self.previous, out)?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Set {} fan speed to {}", self.room, self.speed)
    }
}

/// Empty slot filler so the remote never has to check for a missing command.
struct NoCommand;

impl<R> Command<R> for NoCommand {
    fn execute(&mut self, _target: &mut R, out: &Narrator) -> Result<()> {
        out.say("No operation");
        Ok(())
    }

    fn undo(&mut self, _target: &mut R, out: &Narrator) -> Result<()> {
        out.say("No operation to undo");
        Ok(())
    }

    fn description(&self) -> String {
        "No Command".to_string()
    }

    fn undoable(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Button {
    On,
    Off,
}

struct RemoteControl {
    on_slots: Vec<Box<dyn Command<Home>>>,
    off_slots: Vec<Box<dyn Command<Home>>>,
    last: Option<(usize, Button)>,
    out: Narrator,
}

impl RemoteControl {
    const SLOT_COUNT: usize = 7;

    fn new(out: &Narrator) -> Self {
        let empty = || -> Vec<Box<dyn Command<Home>>> {
            (0..Self::SLOT_COUNT)
                .map(|_| Box::new(NoCommand) as Box<dyn Command<Home>>)
                .collect()
        };
        Self {
            on_slots: empty(),
            off_slots: empty(),
            last: None,
            out: out.clone(),
        }
    }

    fn check_slot(slot: usize) -> Result<()> {
        if slot < Self::SLOT_COUNT {
            Ok(())
        } else {
            Err(PatternError::invalid_argument(format!(
                "slot {slot} (remote has {} slots)",
                Self::SLOT_COUNT
            )))
        }
    }

    fn set_command(
        &mut self,
        slot: usize,
        on: Box<dyn Command<Home>>,
        off: Box<dyn Command<Home>>,
    ) -> Result<()> {
        Self::check_slot(slot)?;
        self.on_slots[slot] = on;
        self.off_slots[slot] = off;
        Ok(())
    }

    fn press(&mut self, slot: usize, button: Button, home: &mut Home) -> Result<()> {
        Self::check_slot(slot)?;
        let command = match button {
            Button::On => &mut self.on_slots[slot],
            Button::Off => &mut self.off_slots[slot],
        };
        command.execute(home, &self.out)?;
        if command.undoable() {
            self.last = Some((slot, button));
        }
        Ok(())
    }

    /// Undoes the last button pressed; pressing undo twice undoes it twice.
    fn undo_last(&mut self, home: &mut Home) -> Result<()> {
        let (slot, button) = self.last.ok_or_else(|| PatternError::exhausted("undo"))?;
        let command = match button {
            Button::On => &mut self.on_slots[slot],
            Button::Off => &mut self.off_slots[slot],
        };
        narrate!(self.out, "Undoing: {}", command.description());
        command.undo(home, &self.out)
    }

    fn display_status(&self) {
        self.out.blank();
        self.out.say("--- Remote Control Status ---");
        for (slot, (on, off)) in self.on_slots.iter().zip(&self.off_slots).enumerate() {
            narrate!(
                self.out,
                "Slot {slot}: {} | {}",
                on.description(),
                off.description()
            );
        }
        let last = match self.last {
            Some((slot, Button::On)) => self.on_slots[slot].description(),
            Some((slot, Button::Off)) => self.off_slots[slot].description(),
            None => "No Command".to_string(),
        };
        narrate!(self.out, "Last command: {last}");
        self.out.say("----------------------------");
    }
}

// =============================================================================
// Closure commands
// =============================================================================

type Action<R> = Box<dyn FnMut(&mut R, &Narrator)>;

struct FnCommand<R> {
    description: String,
    run: Action<R>,
    revert: Action<R>,
}

impl<R> FnCommand<R> {
    fn boxed(
        description: &str,
        run: impl FnMut(&mut R, &Narrator) + 'static,
        revert: impl FnMut(&mut R, &Narrator) + 'static,
    ) -> Box<dyn Command<R>>
    where
        R: 'static,
    {
        Box::new(Self {
            description: description.to_string(),
            run: Box::new(run),
            revert: Box::new(revert),
        })
    }
}

impl<R> Command<R> for FnCommand<R> {
    fn execute(&mut self, target: &mut R, out: &Narrator) -> Result<()> {
        (self.run)(target, out);
        Ok(())
    }

    fn undo(&mut self, target: &mut R, out: &Narrator) -> Result<()> {
        (self.revert)(target, out);
        Ok(())
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

// =============================================================================
// Command queue: FIFO processing
// =============================================================================

struct CommandQueue<R> {
    pending: VecDeque<Box<dyn Command<R>>>,
    out: Narrator,
}

impl<R> CommandQueue<R> {
    fn new(out: &Narrator) -> Self {
        Self {
            pending: VecDeque::new(),
            out: out.clone(),
        }
    }

    fn add(&mut self, command: Box<dyn Command<R>>) {
        self.pending.push_back(command);
        narrate!(
            self.out,
            "Command added to queue. Queue size: {}",
            self.pending.len()
        );
    }

    /// Drains the queue in arrival order. A rejected command is narrated and
    /// skipped; returns how many commands ran.
    fn process_all(&mut self, target: &mut R) -> Result<usize> {
        narrate!(self.out, "Processing {} commands...", self.pending.len());
        let mut completed = 0;
        while let Some(mut command) = self.pending.pop_front() {
            narrate!(self.out, "Processing: {}", command.description());
            if command.execute(target, &self.out).or_narrate(&self.out)?.is_some() {
                completed += 1;
            }
            self.out.pause_ms(200);
        }
        self.out.say("All commands processed.");
        Ok(completed)
    }

    fn len(&self) -> usize {
        self.pending.len()
    }
}

// =============================================================================
// Demo (cargo run --bin command)
// =============================================================================

fn text_editor_demo(out: &Narrator) -> Result<()> {
    out.section(1, "Text Editor with Command Pattern");
    let mut editor = TextEditor::new();
    let mut manager = CommandManager::new(out);

    for (text, position) in [("Hello", 0), (" World", 5), ("!", 11)] {
        manager
            .execute(InsertText::boxed(text, position), &mut editor)
            .or_narrate(out)?;
        editor.display(out);
    }

    out.blank();
    out.say("Testing undo operations:");
    manager.undo(&mut editor).or_narrate(out)?;
    editor.display(out);
    manager.undo(&mut editor).or_narrate(out)?;
    editor.display(out);

    out.blank();
    out.say("Testing redo operations:");
    manager.redo(&mut editor).or_narrate(out)?;
    editor.display(out);
    manager.redo(&mut editor).or_narrate(out)?;
    manager.redo(&mut editor).or_narrate(out)?;

    out.blank();
    out.say("Testing replace:");
    manager
        .execute(ReplaceText::boxed(6, 5, "Rust"), &mut editor)
        .or_narrate(out)?;
    editor.display(out);
    manager.undo(&mut editor).or_narrate(out)?;
    editor.display(out);

    out.blank();
    out.say("Testing macro command:");
    let format_text = Macro::new("Format Text")
        .with(DeleteText::boxed(0, editor.content.len()))
        .with(InsertText::boxed("Welcome to", 0))
        .with(InsertText::boxed(" Command Pattern!", 10));
    manager
        .execute(Box::new(format_text), &mut editor)
        .or_narrate(out)?;
    editor.display(out);
    manager.undo(&mut editor).or_narrate(out)?;
    editor.display(out);

    out.blank();
    out.say("Testing invalid position:");
    manager
        .execute(InsertText::boxed("?", 99), &mut editor)
        .or_narrate(out)?;
    narrate!(
        out,
        "Undo available: {}, redo available: {}",
        manager.can_undo(),
        manager.can_redo()
    );
    manager.clear();
    manager.undo(&mut editor).or_narrate(out)?;
    Ok(())
}

fn remote_control_demo(out: &Narrator) -> Result<()> {
    out.section(2, "Remote Control with Command Pattern");
    let mut home = Home::default();
    home.add_light("Living Room");
    home.add_light("Bedroom");
    home.add_fan("Ceiling");

    let mut remote = RemoteControl::new(out);
    for (slot, room) in [(0, "Living Room"), (1, "Bedroom")] {
        remote.set_command(
            slot,
            Box::new(LightSwitch {
                room: room.to_string(),
                on: true,
            }),
            Box::new(LightSwitch {
                room: room.to_string(),
                on: false,
            }),
        )?;
    }
    remote.set_command(
        2,
        Box::new(FanSpeed {
            room: "Ceiling".to_string(),
            speed: 3,
            previous: 0,
        }),
        Box::new(FanSpeed {
            room: "Ceiling".to_string(),
            speed: 0,
            previous: 0,
        }),
    )?;
    remote.display_status();

    out.blank();
    out.say("Testing remote control:");
    remote.press(0, Button::On, &mut home).or_narrate(out)?;
    remote.press(1, Button::On, &mut home).or_narrate(out)?;
    remote.press(2, Button::On, &mut home).or_narrate(out)?;
    remote.press(5, Button::On, &mut home).or_narrate(out)?;

    out.blank();
    out.say("Turning things off:");
    remote.press(0, Button::Off, &mut home).or_narrate(out)?;
    remote.press(2, Button::Off, &mut home).or_narrate(out)?;

    out.blank();
    out.say("Testing undo:");
    remote.undo_last(&mut home).or_narrate(out)?;
    remote.press(9, Button::On, &mut home).or_narrate(out)?;
    remote.display_status();
    Ok(())
}

fn functional_demo(out: &Narrator) -> Result<()> {
    out.section(3, "Functional Commands");
    let mut counter: i64 = 0;
    let mut manager = CommandManager::new(out);

    manager.execute(
        FnCommand::boxed(
            "Increment counter by 5",
            |counter: &mut i64, out| {
                *counter += 5;
                narrate!(out, "Counter incremented by 5, now: {counter}");
            },
            |counter: &mut i64, out| {
                *counter -= 5;
                narrate!(out, "Counter decremented by 5, now: {counter}");
            },
        ),
        &mut counter,
    )?;
    manager.execute(
        FnCommand::boxed(
            "Double counter",
            |counter: &mut i64, out| {
                *counter *= 2;
                narrate!(out, "Counter doubled, now: {counter}");
            },
            |counter: &mut i64, out| {
                *counter /= 2;
                narrate!(out, "Counter halved, now: {counter}");
            },
        ),
        &mut counter,
    )?;

    out.blank();
    out.say("Testing functional undo/redo:");
    manager.undo(&mut counter).or_narrate(out)?;
    manager.undo(&mut counter).or_narrate(out)?;
    manager.redo(&mut counter).or_narrate(out)?;
    narrate!(out, "Final counter: {counter}");
    Ok(())
}

fn queue_demo(out: &Narrator) -> Result<()> {
    out.section(4, "Command Queue Processing");
    let mut queue = CommandQueue::new(out);
    let mut editor = TextEditor::new();

    queue.add(InsertText::boxed("First ", 0));
    queue.add(InsertText::boxed("Second ", 6));
    queue.add(InsertText::boxed("Third", 13));

    out.say("Editor before processing:");
    editor.display(out);
    let completed = queue.process_all(&mut editor)?;
    out.say("Editor after processing:");
    editor.display(out);
    narrate!(out, "{completed} commands completed, {} left in queue", queue.len());
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Command", |out, _config| {
        text_editor_demo(out)?;
        remote_control_demo(out)?;
        functional_demo(out)?;
        queue_demo(out)?;

        out.section(5, "Command Pattern Benefits");
        out.checklist(&[
            "Decouples invoker from receiver",
            "Supports undo/redo operations",
            "Supports macro commands (composite)",
            "Supports queuing and scheduling commands",
            "Closures work as lightweight commands",
        ]);
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin command)
// =============================================================================
