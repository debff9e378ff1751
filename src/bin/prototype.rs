use patterns::prelude::*;
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::BTreeMap;
use std::fmt;
use std::process::ExitCode;

// =============================================================================
// Prototypes
// =============================================================================

/// Every prototype carries a lifeline, so each clone is counted as a new
/// participant by the census.
#[derive(Debug, Clone)]
struct Enemy {
    name: String,
    health: i32,
    attack: i32,
    defense: i32,
    abilities: Vec<String>,
    _life: Lifeline,
}

impl Enemy {
    fn new(census: &Census, name: &str, health: i32, attack: i32, defense: i32) -> Self {
        Self {
            name: name.to_string(),
            health,
            attack,
            defense,
            abilities: Vec::new(),
            _life: census.enroll(format!("enemy:{name}")),
        }
    }

    fn with_ability(mut self, ability: &str) -> Self {
        self.abilities.push(ability.to_string());
        self
    }

    fn modify_stats(&mut self, health: i32, attack: i32, defense: i32) {
        self.health += health;
        self.attack += attack;
        self.defense += defense;
    }
}

impl fmt::Display for Enemy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Enemy: {} (HP: {}, ATK: {}, DEF: {})",
            self.name, self.health, self.attack, self.defense
        )?;
        if !self.abilities.is_empty() {
            write!(f, " - Abilities: {}", self.abilities.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Weapon {
    name: String,
    damage: i32,
    kind: String,
    enchantments: Vec<String>,
    upgraded: bool,
    _life: Lifeline,
}

impl Weapon {
    fn new(census: &Census, name: &str, damage: i32, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            damage,
            kind: kind.to_string(),
            enchantments: Vec::new(),
            upgraded: false,
            _life: census.enroll(format!("weapon:{name}")),
        }
    }

    fn with_enchantment(mut self, enchantment: &str) -> Self {
        self.enchantments.push(enchantment.to_string());
        self
    }

    /// Damage grows by half, rounded down.
    fn upgrade(&mut self) {
        self.upgraded = true;
        self.damage = self.damage * 3 / 2;
    }
}

impl fmt::Display for Weapon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Weapon: {} ({}) - Damage: {}", self.name, self.kind, self.damage)?;
        if self.upgraded {
            write!(f, " [UPGRADED]")?;
        }
        if !self.enchantments.is_empty() {
            write!(f, " - Enchantments: {}", self.enchantments.join(", "))?;
        }
        Ok(())
    }
}

/// Cloning a character deep-copies its equipped weapon.
#[derive(Debug, Clone)]
struct Character {
    name: String,
    class: String,
    level: u32,
    weapon: Option<Box<Weapon>>,
    skills: Vec<String>,
    _life: Lifeline,
}

impl Character {
    fn new(census: &Census, name: &str, class: &str, level: u32) -> Self {
        Self {
            name: name.to_string(),
            class: class.to_string(),
            level,
            weapon: None,
            skills: Vec::new(),
            _life: census.enroll(format!("character:{class}")),
        }
    }

    fn with_skill(mut self, skill: &str) -> Self {
        self.skills.push(skill.to_string());
        self
    }

    fn equip(&mut self, weapon: Weapon) -> Option<Box<Weapon>> {
        self.weapon.replace(Box::new(weapon))
    }

    fn level_up(&mut self) {
        self.level += 1;
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Character: {} (Class: {}, Level: {})", self.name, self.class, self.level)?;
        if let Some(weapon) = &self.weapon {
            write!(f, "\n  Equipped: {weapon}")?;
        }
        if !self.skills.is_empty() {
            write!(f, "\n  Skills: {}", self.skills.join(", "))?;
        }
        Ok(())
    }
}

/// The closed set of things the registry can hold.
#[derive(Debug, Clone)]
enum GameObject {
    Enemy(Enemy),
    Weapon(Weapon),
    Character(Character),
}

impl GameObject {
    fn kind(&self) -> &'static str {
        match self {
            GameObject::Enemy(_) => "Enemy",
            GameObject::Weapon(_) => "Weapon",
            GameObject::Character(_) => "Character",
        }
    }
}

impl fmt::Display for GameObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameObject::Enemy(enemy) => enemy.fmt(f),
            GameObject::Weapon(weapon) => weapon.fmt(f),
            GameObject::Character(character) => character.fmt(f),
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

#[derive(Debug, Default)]
struct PrototypeRegistry {
    prototypes: BTreeMap<String, GameObject>,
}

impl PrototypeRegistry {
    /// Returns the prototype previously stored under `key`, if any.
    fn register(&mut self, key: &str, prototype: GameObject) -> Option<GameObject> {
        self.prototypes.insert(key.to_string(), prototype)
    }

    fn create(&self, key: &str) -> Result<GameObject> {
        self.prototypes
            .get(key)
            .cloned()
            .ok_or_else(|| PatternError::not_found(format!("prototype '{key}'")))
    }

    fn entries(&self) -> impl Iterator<Item = (&str, &'static str)> {
        self.prototypes.iter().map(|(key, proto)| (key.as_str(), proto.kind()))
    }

    fn len(&self) -> usize {
        self.prototypes.len()
    }
}

fn wrong_kind(key: &str, expected: &str, found: &GameObject) -> PatternError {
    PatternError::invalid_argument(format!(
        "Prototype '{key}' is {}, not {expected}",
        found.kind()
    ))
}

/// Hands out tweaked copies of registered prototypes. Enemy stats are
/// jittered by up to five points in either direction.
struct GameObjectFactory {
    registry: PrototypeRegistry,
    rng: StdRng,
}

impl GameObjectFactory {
    fn new(census: &Census, rng: StdRng) -> Self {
        let mut registry = PrototypeRegistry::default();
        let enemies = [
            Enemy::new(census, "Goblin", 30, 8, 3).with_ability("Stealth"),
            Enemy::new(census, "Orc", 80, 15, 8).with_ability("Rage").with_ability("Intimidate"),
            Enemy::new(census, "Dragon", 500, 50, 25)
                .with_ability("Fire Breath")
                .with_ability("Flight")
                .with_ability("Magic Resistance"),
        ];
        for (key, enemy) in ["goblin", "orc", "dragon"].into_iter().zip(enemies) {
            registry.register(key, GameObject::Enemy(enemy));
        }

        registry.register(
            "iron_sword",
            GameObject::Weapon(Weapon::new(census, "Iron Sword", 20, "Sword")),
        );
        registry.register(
            "elven_bow",
            GameObject::Weapon(
                Weapon::new(census, "Elven Bow", 18, "Bow").with_enchantment("Precision"),
            ),
        );
        registry.register(
            "magic_staff",
            GameObject::Weapon(
                Weapon::new(census, "Magic Staff", 25, "Staff")
                    .with_enchantment("Mana Boost")
                    .with_enchantment("Spell Power"),
            ),
        );

        registry.register(
            "warrior",
            GameObject::Character(
                Character::new(census, "Template Warrior", "Warrior", 1)
                    .with_skill("Sword Mastery")
                    .with_skill("Shield Block"),
            ),
        );
        registry.register(
            "mage",
            GameObject::Character(
                Character::new(census, "Template Mage", "Mage", 1)
                    .with_skill("Fireball")
                    .with_skill("Magic Shield"),
            ),
        );

        Self { registry, rng }
    }

    fn create_enemy(&mut self, key: &str) -> Result<Enemy> {
        match self.registry.create(key)? {
            GameObject::Enemy(mut enemy) => {
                let (health, attack, defense) = (
                    self.rng.gen_range(-5..=5),
                    self.rng.gen_range(-5..=5),
                    self.rng.gen_range(-5..=5),
                );
                enemy.modify_stats(health, attack, defense);
                tracing::debug!(key, health, attack, defense, "enemy jittered");
                Ok(enemy)
            }
            other => Err(wrong_kind(key, "an enemy", &other)),
        }
    }

    fn create_weapon(&self, key: &str) -> Result<Weapon> {
        match self.registry.create(key)? {
            GameObject::Weapon(weapon) => Ok(weapon),
            other => Err(wrong_kind(key, "a weapon", &other)),
        }
    }

    fn create_character(&self, key: &str, name: &str) -> Result<Character> {
        match self.registry.create(key)? {
            GameObject::Character(mut character) => {
                character.name = name.to_string();
                Ok(character)
            }
            other => Err(wrong_kind(key, "a character", &other)),
        }
    }

    fn list(&self, out: &Narrator) {
        out.say("Registered prototypes:");
        for (key, kind) in self.registry.entries() {
            narrate!(out, "  {key} ({kind})");
        }
    }
}

// =============================================================================
// Demo (cargo run --bin prototype)
// =============================================================================

fn enemies_demo(factory: &mut GameObjectFactory, out: &Narrator) -> Result<Vec<Enemy>> {
    out.blank();
    out.say("=".repeat(50));
    out.say("Creating enemies using prototypes:");

    let mut enemies = Vec::new();
    for (key, count, label) in [("goblin", 3, "Goblin #"), ("orc", 2, "Orc Warrior #")] {
        for i in 1..=count {
            let mut enemy = factory.create_enemy(key)?;
            enemy.name = format!("{label}{i}");
            enemies.push(enemy);
        }
    }
    let mut dragon = factory.create_enemy("dragon")?;
    dragon.name = "Ancient Red Dragon".to_string();
    enemies.push(dragon);

    out.blank();
    out.say("Generated enemies:");
    for enemy in &enemies {
        out.say(enemy.to_string());
    }
    Ok(enemies)
}

fn weapons_demo(factory: &GameObjectFactory, out: &Narrator) -> Result<()> {
    out.blank();
    out.say("=".repeat(50));
    out.say("Creating weapons using prototypes:");

    let mut knights = factory.create_weapon("iron_sword")?;
    let mut rusty = factory.create_weapon("iron_sword")?;
    knights.name = "Knight's Sword".to_string();
    rusty.name = "Rusty Sword".to_string();
    rusty.enchantments.push("Poison".to_string());
    out.say("Original and modified swords:");
    out.say(knights.to_string());
    out.say(rusty.to_string());

    let mut staff = factory.create_weapon("magic_staff")?;
    staff.upgrade();
    staff.name = "Archmage's Staff".to_string();
    out.blank();
    out.say("Upgraded staff:");
    out.say(staff.to_string());
    narrate!(out, "Prototype untouched: {}", factory.create_weapon("magic_staff")?);
    Ok(())
}

fn characters_demo(factory: &GameObjectFactory, out: &Narrator) -> Result<()> {
    out.blank();
    out.say("=".repeat(50));
    out.say("Creating characters using prototypes:");

    let mut warrior = factory.create_character("warrior", "Sir Galahad")?;
    let mut excalibur = factory.create_weapon("iron_sword")?;
    excalibur.name = "Excalibur".to_string();
    excalibur.enchantments.push("Holy Strike".to_string());
    warrior.equip(excalibur);
    warrior.level_up();
    warrior.skills.push("Battle Cry".to_string());
    out.blank();
    out.say("Customized warrior:");
    out.say(warrior.to_string());

    let mut mage = factory.create_character("mage", "Merlin")?;
    let mut staff = factory.create_weapon("magic_staff")?;
    staff.name = "Staff of Wisdom".to_string();
    mage.equip(staff);
    mage.level_up();
    mage.level_up();
    mage.skills.extend(["Teleport", "Lightning Bolt"].map(String::from));
    out.blank();
    out.say("Customized mage:");
    out.say(mage.to_string());

    // A clone of an equipped character owns its own weapon.
    let mut apprentice = mage.clone();
    apprentice.name = "Apprentice".to_string();
    if let Some(weapon) = apprentice.weapon.as_mut() {
        weapon.upgrade();
    }
    out.blank();
    out.say("Cloned apprentice (weapon upgraded on the copy only):");
    out.say(apprentice.to_string());
    let untouched = mage.weapon.as_ref().map_or(false, |weapon| !weapon.upgraded);
    narrate!(out, "Merlin's staff still plain: {untouched}");
    Ok(())
}

fn lookup_errors_demo(factory: &mut GameObjectFactory, out: &Narrator) -> Result<()> {
    out.blank();
    out.say("Lookup errors:");
    factory.create_enemy("lich").map(|_| ()).or_narrate(out)?;
    factory.create_weapon("goblin").map(|_| ()).or_narrate(out)?;
    Ok(())
}

fn run_demo(out: &Narrator, config: &DemoConfig) -> Result<()> {
    let census = Census::new();
    {
        let mut factory = GameObjectFactory::new(&census, config.rng());
        out.blank();
        out.say("Available prototypes:");
        factory.list(out);

        let enemies = enemies_demo(&mut factory, out)?;
        weapons_demo(&factory, out)?;
        characters_demo(&factory, out)?;
        lookup_errors_demo(&mut factory, out)?;

        out.blank();
        narrate!(
            out,
            "Census: {} prototypes registered, {} objects live, {} allocated in total",
            factory.registry.len(),
            census.live(),
            census.allocated()
        );
        drop(enemies);
    }
    census.ensure_all_released()?;
    narrate!(out, "All {} game objects released", census.released());
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Prototype", run_demo)
}

// =============================================================================
// Tests (cargo test --bin prototype)
// =============================================================================
