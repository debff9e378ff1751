use patterns::prelude::*;
use std::collections::HashMap;
use std::process::ExitCode;

fn dollars(cents: u64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

// =============================================================================
// Home theater subsystems
// =============================================================================

#[derive(Default)]
struct AudioSystem {
    on: bool,
    volume: u8,
    surround: bool,
}

impl AudioSystem {
    const MAX_VOLUME: u8 = 10;

    fn power_on(&mut self, out: &Narrator) {
        self.on = true;
        out.say("[Audio] Powering on audio system...");
    }

    fn power_off(&mut self, out: &Narrator) {
        self.on = false;
        out.say("[Audio] Powering off audio system...");
    }

    fn set_volume(&mut self, volume: u8, out: &Narrator) -> Result<()> {
        if volume > Self::MAX_VOLUME {
            return Err(PatternError::invalid_argument(format!(
                "Volume {volume} is above {}",
                Self::MAX_VOLUME
            )));
        }
        self.volume = volume;
        narrate!(out, "[Audio] Setting volume to {volume}");
        Ok(())
    }

    fn set_surround(&mut self, enabled: bool, out: &Narrator) {
        self.surround = enabled;
        narrate!(out, "[Audio] Surround sound {}", if enabled { "enabled" } else { "disabled" });
    }

    fn play(&self, source: &str, out: &Narrator) -> Result<()> {
        if !self.on {
            return Err(PatternError::precondition("Audio system is powered off"));
        }
        narrate!(out, "[Audio] Playing audio from {source}");
        Ok(())
    }
}

#[derive(Default)]
struct VideoSystem {
    on: bool,
    resolution: String,
    hdr: bool,
}

impl VideoSystem {
    fn power_on(&mut self, out: &Narrator) {
        self.on = true;
        out.say("[Video] Powering on video system...");
    }

    fn power_off(&mut self, out: &Narrator) {
        self.on = false;
        out.say("[Video] Powering off video system...");
    }

    fn set_resolution(&mut self, resolution: &str, out: &Narrator) {
        self.resolution = resolution.to_string();
        narrate!(out, "[Video] Setting resolution to {resolution}");
    }

    fn set_hdr(&mut self, enabled: bool, out: &Narrator) {
        self.hdr = enabled;
        narrate!(out, "[Video] HDR {}", if enabled { "enabled" } else { "disabled" });
    }

    fn play(&self, source: &str, out: &Narrator) -> Result<()> {
        if !self.on {
            return Err(PatternError::precondition("Video system is powered off"));
        }
        narrate!(out, "[Video] Playing video from {source}");
        Ok(())
    }
}

struct LightingSystem {
    level: u8,
    mood: Option<String>,
}

impl LightingSystem {
    fn dim(&mut self, percentage: u8, out: &Narrator) -> Result<()> {
        if percentage > 100 {
            return Err(PatternError::invalid_argument(format!(
                "Lighting level {percentage}% is above 100%"
            )));
        }
        self.level = percentage;
        narrate!(out, "[Lighting] Dimming lights to {percentage}%");
        Ok(())
    }

    fn set_ambient(&mut self, mood: &str, out: &Narrator) {
        self.mood = Some(mood.to_string());
        narrate!(out, "[Lighting] Setting ambient lighting to {mood} mode");
    }

    fn turn_off(&mut self, out: &Narrator) {
        self.level = 0;
        self.mood = None;
        out.say("[Lighting] Turning off all lights");
    }
}

#[derive(Default)]
struct ClimateControl {
    target_f: Option<u8>,
    fan: u8,
}

impl ClimateControl {
    fn set_temperature(&mut self, fahrenheit: u8, out: &Narrator) {
        self.target_f = Some(fahrenheit);
        narrate!(out, "[Climate] Setting temperature to {fahrenheit}°F");
    }

    fn set_fan_speed(&mut self, speed: u8, out: &Narrator) {
        self.fan = speed;
        narrate!(out, "[Climate] Setting fan speed to {speed}");
    }

    fn turn_off(&mut self, out: &Narrator) {
        self.target_f = None;
        self.fan = 0;
        out.say("[Climate] Turning off climate control");
    }
}

struct SecuritySystem {
    armed: bool,
    locked: bool,
}

impl SecuritySystem {
    fn disarm(&mut self, out: &Narrator) {
        self.armed = false;
        out.say("[Security] Disarming security system");
    }

    fn arm(&mut self, out: &Narrator) {
        self.armed = true;
        out.say("[Security] Arming security system");
    }

    fn lock_doors(&mut self, out: &Narrator) {
        self.locked = true;
        out.say("[Security] Locking all doors");
    }

    fn unlock_doors(&mut self, out: &Narrator) {
        self.locked = false;
        out.say("[Security] Unlocking doors");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Activity {
    Idle,
    Movie(String),
    Music(String),
    Party,
    Night,
}

/// One call per scenario instead of fifteen across five subsystems.
struct HomeTheaterFacade {
    audio: AudioSystem,
    video: VideoSystem,
    lights: LightingSystem,
    climate: ClimateControl,
    security: SecuritySystem,
    activity: Activity,
}

impl HomeTheaterFacade {
    fn new() -> Self {
        Self {
            audio: AudioSystem::default(),
            video: VideoSystem::default(),
            lights: LightingSystem { level: 100, mood: None },
            climate: ClimateControl::default(),
            security: SecuritySystem { armed: true, locked: true },
            activity: Activity::Idle,
        }
    }

    fn watch_movie(&mut self, movie: &str, out: &Narrator) -> Result<()> {
        narrate!(out, "=== Starting Movie: {movie} ===");
        self.security.disarm(out);
        self.security.lock_doors(out);
        self.lights.dim(20, out)?;
        self.lights.set_ambient("movie", out);
        self.climate.set_temperature(72, out);
        self.climate.set_fan_speed(2, out);
        self.audio.power_on(out);
        self.audio.set_volume(8, out)?;
        self.audio.set_surround(true, out);
        self.video.power_on(out);
        self.video.set_resolution("4K", out);
        self.video.set_hdr(true, out);

        narrate!(out, "🎬 Now playing: {movie}");
        self.audio.play("Blu-ray", out)?;
        self.video.play("Blu-ray", out)?;
        self.activity = Activity::Movie(movie.to_string());
        out.say("🍿 Enjoy your movie!");
        Ok(())
    }

    fn end_movie(&mut self, out: &Narrator) -> Result<()> {
        let Activity::Movie(movie) = &self.activity else {
            return Err(PatternError::precondition("No movie is playing"));
        };
        narrate!(out, "=== Ending Movie Session: {movie} ===");
        self.audio.power_off(out);
        self.video.power_off(out);
        self.lights.dim(100, out)?;
        self.climate.turn_off(out);
        self.security.unlock_doors(out);
        self.security.arm(out);
        self.activity = Activity::Idle;
        out.say("Movie session ended. All systems reset.");
        Ok(())
    }

    fn listen_to_music(&mut self, playlist: &str, out: &Narrator) -> Result<()> {
        narrate!(out, "=== Starting Music: {playlist} ===");
        self.audio.power_on(out);
        self.audio.set_volume(6, out)?;
        self.audio.set_surround(false, out);
        self.lights.set_ambient("relaxing", out);
        self.lights.dim(60, out)?;
        self.climate.set_temperature(70, out);
        self.audio.play("Streaming", out)?;
        self.activity = Activity::Music(playlist.to_string());
        narrate!(out, "🎵 Now playing: {playlist}");
        Ok(())
    }

    fn party_mode(&mut self, out: &Narrator) -> Result<()> {
        out.say("=== Activating Party Mode ===");
        self.security.disarm(out);
        self.security.unlock_doors(out);
        self.audio.power_on(out);
        self.audio.set_volume(10, out)?;
        self.audio.set_surround(true, out);
        self.lights.set_ambient("party", out);
        self.lights.dim(80, out)?;
        self.climate.set_temperature(68, out);
        self.climate.set_fan_speed(3, out);
        self.audio.play("Streaming", out)?;
        self.activity = Activity::Party;
        out.say("🎉 Party mode activated! Let's dance!");
        Ok(())
    }

    fn good_night(&mut self, out: &Narrator) {
        out.say("=== Good Night Mode ===");
        self.audio.power_off(out);
        self.video.power_off(out);
        self.lights.turn_off(out);
        self.climate.set_temperature(65, out);
        self.climate.set_fan_speed(1, out);
        self.security.lock_doors(out);
        self.security.arm(out);
        self.activity = Activity::Night;
        out.say("😴 Good night! All systems secured.");
    }
}

// =============================================================================
// Computer boot subsystems
// =============================================================================

#[derive(Default)]
struct Cpu {
    running: bool,
}

impl Cpu {
    fn boot(&mut self, out: &Narrator) {
        self.running = true;
        out.say("[CPU] Booting processor...");
    }

    fn shutdown(&mut self, out: &Narrator) {
        self.running = false;
        out.say("[CPU] Shutting down processor...");
    }

    fn execute(&self, instruction: &str, out: &Narrator) {
        narrate!(out, "[CPU] Executing: {instruction}");
    }
}

#[derive(Default)]
struct Memory {
    loaded: Vec<String>,
}

impl Memory {
    fn load(&mut self, program: &str, out: &Narrator) {
        self.loaded.push(program.to_string());
        narrate!(out, "[Memory] Loading {program} into memory");
    }

    fn clear(&mut self, out: &Narrator) {
        self.loaded.clear();
        out.say("[Memory] Clearing memory");
    }
}

struct HardDrive {
    spinning: bool,
    files: Vec<&'static str>,
}

impl HardDrive {
    fn spin_up(&mut self, out: &Narrator) {
        self.spinning = true;
        out.say("[HDD] Spinning up hard drive...");
    }

    fn spin_down(&mut self, out: &Narrator) {
        self.spinning = false;
        out.say("[HDD] Spinning down hard drive...");
    }

    fn read(&self, file: &str, out: &Narrator) -> Result<()> {
        if !self.files.contains(&file) {
            return Err(PatternError::not_found(format!("'{file}' on disk")));
        }
        narrate!(out, "[HDD] Reading {file} from disk");
        Ok(())
    }
}

#[derive(Default)]
struct GraphicsCard;

impl GraphicsCard {
    fn initialize(&mut self, out: &Narrator) {
        out.say("[GPU] Initializing graphics card...");
    }

    fn shutdown(&mut self, out: &Narrator) {
        out.say("[GPU] Shutting down graphics card...");
    }

    fn render(&self, scene: &str, out: &Narrator) {
        narrate!(out, "[GPU] Rendering {scene}");
    }
}

struct ComputerFacade {
    cpu: Cpu,
    memory: Memory,
    disk: HardDrive,
    gpu: GraphicsCard,
}

impl ComputerFacade {
    fn new(installed: Vec<&'static str>) -> Self {
        Self {
            cpu: Cpu::default(),
            memory: Memory::default(),
            disk: HardDrive { spinning: false, files: installed },
            gpu: GraphicsCard,
        }
    }

    fn start(&mut self, out: &Narrator) -> Result<()> {
        if self.cpu.running {
            return Err(PatternError::precondition("Computer is already running"));
        }
        out.say("=== Starting Computer ===");
        self.cpu.boot(out);
        self.memory.load("Operating System", out);
        self.disk.spin_up(out);
        self.gpu.initialize(out);
        self.cpu.execute("system_startup", out);
        out.say("💻 Computer ready!");
        Ok(())
    }

    fn run_game(&mut self, game: &str, out: &Narrator) -> Result<()> {
        if !self.cpu.running || !self.disk.spinning {
            return Err(PatternError::precondition("Computer is not running"));
        }
        narrate!(out, "=== Running Game: {game} ===");
        self.disk.read(game, out)?;
        self.memory.load(game, out);
        self.cpu.execute("launch_game", out);
        self.gpu.render("game_scene", out);
        narrate!(out, "🎮 {game} is now running!");
        Ok(())
    }

    fn shutdown(&mut self, out: &Narrator) -> Result<()> {
        if !self.cpu.running {
            return Err(PatternError::precondition("Computer is already off"));
        }
        out.say("=== Shutting Down Computer ===");
        self.cpu.execute("save_state", out);
        self.memory.clear(out);
        self.gpu.shutdown(out);
        self.disk.spin_down(out);
        self.cpu.shutdown(out);
        out.say("💤 Computer shut down safely.");
        Ok(())
    }
}

// =============================================================================
// Banking subsystems
// =============================================================================

struct AccountManager {
    balances: HashMap<String, u64>,
}

impl AccountManager {
    fn verify(&self, account: &str, out: &Narrator) -> Result<()> {
        narrate!(out, "[Account] Verifying account: {account}");
        if self.balances.contains_key(account) {
            Ok(())
        } else {
            Err(PatternError::not_found(format!("account {account}")))
        }
    }

    fn balance(&self, account: &str, out: &Narrator) -> Result<u64> {
        narrate!(out, "[Account] Retrieving balance for: {account}");
        self.balances
            .get(account)
            .copied()
            .ok_or_else(|| PatternError::not_found(format!("account {account}")))
    }

    /// Moves funds between two verified accounts; nothing changes on error.
    fn transfer(&mut self, from: &str, to: &str, cents: u64, out: &Narrator) -> Result<()> {
        let available = self.balance(from, out)?;
        if available < cents {
            return Err(PatternError::precondition(format!(
                "Insufficient funds: {} available, {} requested",
                dollars(available),
                dollars(cents)
            )));
        }
        let target = self
            .balances
            .get_mut(to)
            .ok_or_else(|| PatternError::not_found(format!("account {to}")))?;
        *target += cents;
        if let Some(source) = self.balances.get_mut(from) {
            *source -= cents;
        }
        narrate!(
            out,
            "[Account] Updated {from} by -{} and {to} by +{}",
            dollars(cents),
            dollars(cents)
        );
        Ok(())
    }
}

struct SecurityManager {
    credentials: HashMap<String, (String, Vec<String>)>,
    transfer_limit: u64,
}

impl SecurityManager {
    fn authenticate(&self, user: &str, password: &str, out: &Narrator) -> Result<()> {
        narrate!(out, "[Security] Authenticating user: {user}");
        match self.credentials.get(user) {
            Some((expected, _)) if expected == password => Ok(()),
            _ => Err(PatternError::access_denied(format!("authentication failed for {user}"))),
        }
    }

    fn authorize(&self, user: &str, account: &str, cents: u64, out: &Narrator) -> Result<()> {
        narrate!(out, "[Security] Authorizing transaction of {} for {user}", dollars(cents));
        let owns = self
            .credentials
            .get(user)
            .is_some_and(|(_, accounts)| accounts.iter().any(|a| a == account));
        if !owns {
            return Err(PatternError::access_denied(format!(
                "{user} does not own account {account}"
            )));
        }
        if cents > self.transfer_limit {
            return Err(PatternError::access_denied(format!(
                "{} exceeds the {} transfer limit",
                dollars(cents),
                dollars(self.transfer_limit)
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LedgerEntry {
    kind: &'static str,
    account: String,
    cents: u64,
}

#[derive(Default)]
struct TransactionLogger {
    entries: Vec<LedgerEntry>,
}

impl TransactionLogger {
    fn record(&mut self, kind: &'static str, account: &str, cents: u64, out: &Narrator) {
        tracing::info!(kind, account, cents, "transaction recorded");
        narrate!(out, "[Logger] Recording {kind} of {} for account {account}", dollars(cents));
        self.entries.push(LedgerEntry { kind, account: account.to_string(), cents });
    }
}

struct NotificationService;

impl NotificationService {
    fn send(&self, user: &str, message: &str, out: &Narrator) {
        narrate!(out, "[Notification] Sending to {user}: {message}");
    }
}

struct BankingFacade {
    accounts: AccountManager,
    security: SecurityManager,
    logger: TransactionLogger,
    notifications: NotificationService,
}

impl BankingFacade {
    fn new() -> Self {
        let balances = [("12345", 100_000), ("67890", 50_000), ("55555", 20_000)]
            .into_iter()
            .map(|(id, cents)| (id.to_string(), cents))
            .collect();
        let credentials = [
            ("john_doe", "password123", vec!["12345"]),
            ("jane_roe", "hunter2", vec!["67890", "55555"]),
        ]
        .into_iter()
        .map(|(user, password, accounts)| {
            let accounts: Vec<String> = accounts.into_iter().map(String::from).collect();
            (user.to_string(), (password.to_string(), accounts))
        })
        .collect();
        Self {
            accounts: AccountManager { balances },
            security: SecurityManager { credentials, transfer_limit: 500_000 },
            logger: TransactionLogger::default(),
            notifications: NotificationService,
        }
    }

    /// Runs every check before any balance moves, and reports success only
    /// after the ledger has been written.
    fn transfer(
        &mut self,
        from: &str,
        to: &str,
        cents: u64,
        (user, password): (&str, &str),
        out: &Narrator,
    ) -> Result<()> {
        out.say("=== Processing Money Transfer ===");
        if cents == 0 || from == to {
            return Err(PatternError::invalid_argument(
                "Transfer needs a positive amount between two accounts",
            ));
        }
        self.security.authenticate(user, password, out)?;
        self.accounts.verify(from, out)?;
        self.accounts.verify(to, out)?;
        self.security.authorize(user, from, cents, out)?;
        self.accounts.transfer(from, to, cents, out)?;
        self.logger.record("TRANSFER", from, cents, out);
        let notice = format!("Transfer of {} completed successfully", dollars(cents));
        self.notifications.send(user, &notice, out);
        out.say("✅ Transfer completed successfully!");
        Ok(())
    }

    fn check_balance(
        &mut self,
        account: &str,
        (user, password): (&str, &str),
        out: &Narrator,
    ) -> Result<u64> {
        out.say("=== Checking Account Balance ===");
        self.security.authenticate(user, password, out)?;
        self.accounts.verify(account, out)?;
        let balance = self.accounts.balance(account, out)?;
        self.logger.record("BALANCE_INQUIRY", account, 0, out);
        narrate!(out, "💰 Current balance: {}", dollars(balance));
        Ok(balance)
    }
}

// =============================================================================
// Demo (cargo run --bin facade)
// =============================================================================

fn theater_demo(out: &Narrator) -> Result<()> {
    out.section(1, "Home Theater System Facade");
    let mut theater = HomeTheaterFacade::new();
    theater.watch_movie("The Matrix", out)?;
    out.pause_ms(2000);
    out.blank();
    theater.end_movie(out)?;
    out.blank();
    theater.end_movie(out).or_narrate(out)?;
    out.pause_ms(1000);
    out.blank();
    theater.listen_to_music("Chill Vibes Playlist", out)?;
    out.blank();
    theater.party_mode(out)?;
    out.blank();
    theater.good_night(out);
    narrate!(out, "Activity: {:?}", theater.activity);
    Ok(())
}

fn computer_demo(out: &Narrator) -> Result<()> {
    out.section(2, "Computer System Facade");
    let mut computer = ComputerFacade::new(vec!["Cyberpunk 2077", "Factorio"]);
    computer.run_game("Factorio", out).or_narrate(out)?;
    computer.start(out)?;
    out.pause_ms(1000);
    out.blank();
    computer.run_game("Cyberpunk 2077", out)?;
    out.blank();
    computer.run_game("Half-Life 3", out).or_narrate(out)?;
    narrate!(out, "Programs in memory: {}", computer.memory.loaded.join(", "));
    out.blank();
    computer.shutdown(out)?;
    Ok(())
}

fn banking_demo(out: &Narrator) -> Result<()> {
    out.section(3, "Banking System Facade");
    let mut bank = BankingFacade::new();
    let john = ("john_doe", "password123");

    bank.check_balance("12345", john, out)?;
    out.blank();
    bank.transfer("12345", "67890", 25_000, john, out)?;
    out.blank();
    bank.check_balance("12345", john, out)?;

    out.blank();
    out.say("Trying large transfer:");
    bank.transfer("12345", "67890", 1_000_000, john, out).or_narrate(out)?;
    out.blank();
    out.say("Trying someone else's account:");
    bank.transfer("55555", "12345", 1_000, john, out).or_narrate(out)?;
    out.blank();
    out.say("Trying a wrong password:");
    bank.check_balance("12345", ("john_doe", "letmein"), out).or_narrate(out)?;
    out.blank();
    out.say("Overdrawing:");
    bank.transfer("55555", "12345", 30_000, ("jane_roe", "hunter2"), out).or_narrate(out)?;

    narrate!(out, "Ledger entries: {}", bank.logger.entries.len());
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Facade", |out, _config| {
        theater_demo(out)?;
        computer_demo(out)?;
        banking_demo(out)?;

        out.section(4, "Complexity Hidden by Facade");
        out.say("Without facade, a simple 'watch movie' operation would require:");
        out.say("- 15+ individual method calls across 5 different subsystems");
        out.say("- Knowledge of the correct sequence of operations");
        out.say("- Understanding of each subsystem's API");
        out.say("- Error handling for each subsystem");
        out.blank();
        out.say("With facade: theater.watch_movie(\"Movie Name\") - Simple!");
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin facade)
// =============================================================================
