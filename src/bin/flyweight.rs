use itertools::Itertools;
use patterns::prelude::*;
use rand::Rng;
use rustc_hash::FxHashMap;
use std::hash::Hash;
use std::mem;
use std::process::ExitCode;
use std::rc::Rc;

// =============================================================================
// Flyweight pool: intrinsic key -> shared immutable value
// =============================================================================

/// Sole owner and mutator of a flyweight cache. Contexts hold `Rc` handles,
/// so an entry lives as long as the pool or its last context.
struct FlyweightPool<K, V> {
    entries: FxHashMap<K, Rc<V>>,
}

impl<K: Eq + Hash + Clone, V> FlyweightPool<K, V> {
    fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    /// Returns the shared value for `key` and whether it was created now.
    fn get_or_create(&mut self, key: &K, create: impl FnOnce() -> V) -> (Rc<V>, bool) {
        if let Some(existing) = self.entries.get(key) {
            return (Rc::clone(existing), false);
        }
        let created = Rc::new(create());
        self.entries.insert(key.clone(), Rc::clone(&created));
        (created, true)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }
}

// =============================================================================
// Text document: glyph flyweights with per-character placement
// =============================================================================

/// Intrinsic state of a character: the symbol and its font.
#[derive(Debug, PartialEq, Eq)]
struct Glyph {
    symbol: char,
    font: String,
}

impl Glyph {
    fn render(&self, placement: &Placement) -> String {
        format!(
            "Rendering '{}' at ({},{}) size={} color={} font={}",
            self.symbol, placement.x, placement.y, placement.size, placement.color, self.font
        )
    }
}

/// Extrinsic state, owned by the context and passed in on every render.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Placement {
    x: i32,
    y: i32,
    size: u32,
    color: String,
}

struct GlyphFactory {
    pool: FlyweightPool<String, Glyph>,
    out: Narrator,
}

impl GlyphFactory {
    fn new(out: &Narrator) -> Self {
        Self {
            pool: FlyweightPool::new(),
            out: out.clone(),
        }
    }

    fn key(symbol: char, font: &str) -> String {
        format!("{symbol}_{font}")
    }

    fn glyph(&mut self, symbol: char, font: &str) -> Rc<Glyph> {
        let (glyph, created) = self.pool.get_or_create(&Self::key(symbol, font), || Glyph {
            symbol,
            font: font.to_string(),
        });
        if created {
            narrate!(self.out, "Creating new flyweight for '{symbol}' ({font})");
        } else {
            narrate!(self.out, "Reusing existing flyweight for '{symbol}' ({font})");
        }
        glyph
    }

    fn flyweight_count(&self) -> usize {
        self.pool.len()
    }

    fn list_flyweights(&self) {
        narrate!(self.out, "Total flyweights created: {}", self.pool.len());
        for key in self.pool.keys().sorted() {
            narrate!(self.out, "  {key}");
        }
    }
}

/// Context object: a shared glyph plus its own placement.
struct TextCharacter {
    glyph: Rc<Glyph>,
    placement: Placement,
}

impl TextCharacter {
    fn render(&self) -> String {
        self.glyph.render(&self.placement)
    }

    fn move_to(&mut self, x: i32, y: i32) {
        self.placement.x = x;
        self.placement.y = y;
    }

    fn resize(&mut self, size: u32) {
        self.placement.size = size;
    }

    fn recolor(&mut self, color: &str) {
        self.placement.color = color.to_string();
    }
}

struct Document {
    characters: Vec<TextCharacter>,
    out: Narrator,
}

impl Document {
    fn new(out: &Narrator) -> Self {
        Self {
            characters: Vec::new(),
            out: out.clone(),
        }
    }

    fn add_character(
        &mut self,
        factory: &mut GlyphFactory,
        symbol: char,
        font: &str,
        placement: Placement,
    ) {
        let glyph = factory.glyph(symbol, font);
        self.characters.push(TextCharacter { glyph, placement });
    }

    /// Lays `text` out on one line, ten units per character.
    fn add_text(
        &mut self,
        factory: &mut GlyphFactory,
        text: &str,
        font: &str,
        size: u32,
        color: &str,
    ) {
        for (index, symbol) in text.chars().enumerate() {
            let placement = Placement {
                x: index as i32 * 10,
                y: 10,
                size,
                color: color.to_string(),
            };
            self.add_character(factory, symbol, font, placement);
        }
    }

    fn render(&self) {
        self.out.blank();
        narrate!(self.out, "Rendering document with {} characters:", self.characters.len());
        for character in &self.characters {
            self.out.say(character.render());
        }
    }

    fn character_count(&self) -> usize {
        self.characters.len()
    }
}

// =============================================================================
// Particle system: a closed set of particle kinds
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ParticleKind {
    Fire,
    Smoke,
    Spark,
}

impl ParticleKind {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "Fire" => Ok(Self::Fire),
            "Smoke" => Ok(Self::Smoke),
            "Spark" => Ok(Self::Spark),
            other => Err(PatternError::invalid_argument(format!(
                "unknown particle type '{other}'"
            ))),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Fire => "Fire",
            Self::Smoke => "Smoke",
            Self::Spark => "Spark",
        }
    }
}

/// Shared appearance of a particle kind.
#[derive(Debug)]
struct ParticleStyle {
    kind: ParticleKind,
    icon: &'static str,
    sprite: &'static str,
}

impl ParticleStyle {
    fn for_kind(kind: ParticleKind) -> Self {
        let (icon, sprite) = match kind {
            ParticleKind::Fire => ("🔥", "fire_sheet.png"),
            ParticleKind::Smoke => ("💨", "smoke_sheet.png"),
            ParticleKind::Spark => ("✨", "spark_sheet.png"),
        };
        Self { kind, icon, sprite }
    }

    fn describe(&self, particle: &Particle) -> String {
        format!(
            "{} {} particle at ({:.1},{:.1}) vel=({:.1},{:.1}) life={:.1}",
            self.icon,
            self.kind.name(),
            particle.x,
            particle.y,
            particle.vx,
            particle.vy,
            particle.life
        )
    }
}

struct Particle {
    style: Rc<ParticleStyle>,
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    life: f64,
}

impl Particle {
    fn step(&mut self, dt: f64) {
        self.x += self.vx * dt;
        self.y += self.vy * dt;
        self.life -= dt;
    }

    fn is_alive(&self) -> bool {
        self.life > 0.0
    }
}

struct ParticleSystem<R: Rng> {
    styles: FlyweightPool<ParticleKind, ParticleStyle>,
    particles: Vec<Particle>,
    rng: R,
    out: Narrator,
}

impl<R: Rng> ParticleSystem<R> {
    fn new(rng: R, out: &Narrator) -> Self {
        Self {
            styles: FlyweightPool::new(),
            particles: Vec::new(),
            rng,
            out: out.clone(),
        }
    }

    fn emit(&mut self, kind_name: &str, count: usize, x: f64, y: f64) -> Result<()> {
        let kind = ParticleKind::parse(kind_name)?;
        let (style, created) = self
            .styles
            .get_or_create(&kind, || ParticleStyle::for_kind(kind));
        if created {
            narrate!(
                self.out,
                "Created new {} particle flyweight ({})",
                kind.name(),
                style.sprite
            );
        }

        for _ in 0..count {
            let particle = Particle {
                style: Rc::clone(&style),
                x,
                y,
                vx: self.rng.gen_range(-5.0..5.0),
                vy: self.rng.gen_range(-5.0..5.0),
                life: self.rng.gen_range(1.0..3.0),
            };
            self.particles.push(particle);
        }
        Ok(())
    }

    /// Advances every particle, narrates it, then drops the expired ones.
    fn update(&mut self, dt: f64) {
        self.out.blank();
        narrate!(self.out, "Updating {} particles:", self.particles.len());
        for particle in &mut self.particles {
            particle.step(dt);
            self.out.say(particle.style.describe(particle));
        }
        let before = self.particles.len();
        self.particles.retain(Particle::is_alive);
        let expired = before - self.particles.len();
        if expired > 0 {
            narrate!(self.out, "{expired} particle(s) expired");
        }
    }

    fn particle_count(&self) -> usize {
        self.particles.len()
    }

    fn flyweight_count(&self) -> usize {
        self.styles.len()
    }
}

// =============================================================================
// Forest: tree species shared by many planted trees
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Species {
    Oak,
    Pine,
    Birch,
}

impl Species {
    const ALL: [Species; 3] = [Species::Oak, Species::Pine, Species::Birch];

    fn icon(self) -> &'static str {
        match self {
            Self::Oak => "🌳",
            Self::Pine => "🌲",
            Self::Birch => "🌿",
        }
    }
}

#[derive(Debug)]
struct TreeType {
    species: Species,
}

struct Tree {
    kind: Rc<TreeType>,
    x: f64,
    y: f64,
    scale: f64,
}

struct Forest {
    types: FlyweightPool<Species, TreeType>,
    trees: Vec<Tree>,
    out: Narrator,
}

impl Forest {
    fn new(out: &Narrator) -> Self {
        Self {
            types: FlyweightPool::new(),
            trees: Vec::new(),
            out: out.clone(),
        }
    }

    fn plant(&mut self, species: Species, x: f64, y: f64, scale: f64) {
        let (kind, created) = self.types.get_or_create(&species, || TreeType { species });
        if created {
            narrate!(self.out, "Created new {species:?} tree type flyweight");
        }
        self.trees.push(Tree { kind, x, y, scale });
    }

    fn render(&self, season: &str) {
        self.out.blank();
        narrate!(self.out, "Rendering forest in {season} with {} trees:", self.trees.len());
        for tree in &self.trees {
            narrate!(
                self.out,
                "{} {:?} tree at ({:.1},{:.1}) scale={:.2} season={season}",
                tree.kind.species.icon(),
                tree.kind.species,
                tree.x,
                tree.y,
                tree.scale
            );
        }
    }

    fn species_counts(&self) -> Vec<(Species, usize)> {
        self.trees
            .iter()
            .map(|tree| tree.kind.species)
            .counts()
            .into_iter()
            .sorted()
            .collect()
    }

    fn statistics(&self) {
        self.out.blank();
        self.out.say("Forest Statistics:");
        narrate!(self.out, "Total trees: {}", self.trees.len());
        narrate!(self.out, "Tree types (flyweights): {}", self.types.len());
        self.out.say("Species distribution:");
        for (species, count) in self.species_counts() {
            narrate!(self.out, "  {species:?}: {count} trees");
        }
    }

    fn tree_count(&self) -> usize {
        self.trees.len()
    }

    fn type_count(&self) -> usize {
        self.types.len()
    }
}

// =============================================================================
// Demo (cargo run --bin flyweight)
// =============================================================================

const FONTS: [&str; 3] = ["Arial", "Times", "Courier"];
const COLORS: [&str; 4] = ["red", "blue", "green", "black"];

fn text_demo(out: &Narrator, config: &DemoConfig) -> (usize, usize) {
    out.section(1, "Text Document System");

    let mut factory = GlyphFactory::new(out);
    let mut document = Document::new(out);
    let mut rng = config.rng();

    for (index, symbol) in "Hello World!".chars().enumerate() {
        let font = FONTS[rng.gen_range(0..FONTS.len())];
        let placement = Placement {
            x: index as i32 * 10,
            y: 10,
            size: rng.gen_range(12..=24),
            color: COLORS[rng.gen_range(0..COLORS.len())].to_string(),
        };
        document.add_character(&mut factory, symbol, font, placement);
    }

    out.blank();
    narrate!(out, "Document created with {} characters", document.character_count());
    factory.list_flyweights();
    document.render();

    out.blank();
    out.say("Editing extrinsic state leaves the shared glyph untouched:");
    if let Some(first) = document.characters.first_mut() {
        first.move_to(0, 40);
        first.resize(32);
        first.recolor("purple");
        out.say(first.render());
    }

    (factory.flyweight_count(), document.character_count())
}

fn particle_demo(out: &Narrator, config: &DemoConfig) -> Result<(usize, usize)> {
    out.section(2, "Game Particle System");

    let mut system = ParticleSystem::new(config.rng(), out);
    system.emit("Fire", 3, 100.0, 50.0)?;
    system.emit("Smoke", 2, 110.0, 60.0)?;
    system.emit("Spark", 4, 90.0, 40.0)?;
    system.emit("Fire", 2, 105.0, 55.0)?;
    system.emit("Plasma", 1, 0.0, 0.0).or_narrate(out)?;

    out.blank();
    narrate!(
        out,
        "Particle system created with {} particles using {} flyweights",
        system.particle_count(),
        system.flyweight_count()
    );

    system.update(0.5);
    system.update(1.5);
    narrate!(out, "Particles still alive: {}", system.particle_count());

    Ok((system.flyweight_count(), system.particle_count()))
}

fn forest_demo(out: &Narrator, config: &DemoConfig) -> (usize, usize) {
    out.section(3, "Forest Simulation");

    let mut forest = Forest::new(out);
    let mut rng = config.rng();
    for _ in 0..20 {
        let species = Species::ALL[rng.gen_range(0..Species::ALL.len())];
        forest.plant(
            species,
            rng.gen_range(0.0..100.0),
            rng.gen_range(0.0..100.0),
            rng.gen_range(0.5..2.0),
        );
    }

    forest.statistics();
    forest.render("Spring");

    (forest.type_count(), forest.tree_count())
}

fn main() -> ExitCode {
    patterns::runner::run("Flyweight", |out, config| {
        let (glyphs, characters) = text_demo(out, config);
        let (styles, particles) = particle_demo(out, config)?;
        let (types, trees) = forest_demo(out, config);

        out.section(4, "Memory Efficiency Demonstration");
        let unshared = mem::size_of::<Glyph>() + mem::size_of::<Placement>();
        let shared = mem::size_of::<Rc<Glyph>>() + mem::size_of::<Placement>();
        out.say("Without Flyweight Pattern:");
        out.say("- Each character object would store font, character, position, size and color");
        narrate!(
            out,
            "- For {characters} characters: {} bytes of inline state",
            characters * unshared
        );
        out.blank();
        out.say("With Flyweight Pattern:");
        narrate!(out, "- Character flyweights: {glyphs} objects");
        narrate!(
            out,
            "- Context objects: {characters} objects ({} bytes inline)",
            characters * shared
        );
        out.say("- Memory saved by sharing intrinsic state across similar characters");
        out.blank();
        out.say("Same principle applies to:");
        narrate!(out, "- Particle system: {styles} flyweights for {particles} particles");
        narrate!(out, "- Forest simulation: {types} tree types for {trees} trees");
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin flyweight)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_banana_shares_three_glyphs() {
        let out = Narrator::capture();
        let mut factory = GlyphFactory::new(&out);
        let mut document = Document::new(&out);

        document.add_text(&mut factory, "banana", "Arial", 12, "black");

        assert_eq!(factory.flyweight_count(), 3);
        assert_eq!(document.character_count(), 6);
        assert_eq!(out.count("Creating new flyweight"), 3);
        assert_eq!(out.count("Reusing existing flyweight"), 3);
        assert!(out.contains("Creating new flyweight for 'b' (Arial)"));
    }

    #[test]
    fn test_same_symbol_in_two_fonts_is_two_flyweights() {
        let out = Narrator::capture();
        let mut factory = GlyphFactory::new(&out);
        let arial = factory.glyph('a', "Arial");
        let times = factory.glyph('a', "Times");
        let again = factory.glyph('a', "Arial");

        assert!(!Rc::ptr_eq(&arial, &times));
        assert!(Rc::ptr_eq(&arial, &again));
        assert_eq!(factory.flyweight_count(), 2);
    }

    #[test]
    fn test_contexts_keep_glyph_alive_and_own_placement() {
        let out = Narrator::capture();
        let mut factory = GlyphFactory::new(&out);
        let mut document = Document::new(&out);
        document.add_text(&mut factory, "aa", "Courier", 10, "red");

        let glyph = Rc::clone(&document.characters[0].glyph);
        // Pool + two contexts + this handle.
        assert_eq!(Rc::strong_count(&glyph), 4);

        document.characters[0].recolor("blue");
        assert_eq!(document.characters[0].placement.color, "blue");
        assert_eq!(document.characters[1].placement.color, "red");
        assert_eq!(
            document.characters[1].render(),
            "Rendering 'a' at (10,10) size=10 color=red font=Courier"
        );
    }

    #[test]
    fn test_list_flyweights_is_sorted() {
        let out = Narrator::capture();
        let mut factory = GlyphFactory::new(&out);
        factory.glyph('z', "Arial");
        factory.glyph('a', "Arial");
        factory.list_flyweights();

        let first = out.position("  a_Arial").unwrap();
        let second = out.position("  z_Arial").unwrap();
        assert!(first < second);
        assert!(out.contains("Total flyweights created: 2"));
    }

    #[test]
    fn test_particles_share_styles_per_kind() {
        let out = Narrator::capture();
        let config = DemoConfig::for_tests();
        let mut system = ParticleSystem::new(config.rng(), &out);
        system.emit("Fire", 3, 0.0, 0.0).unwrap();
        system.emit("Fire", 2, 1.0, 1.0).unwrap();
        system.emit("Spark", 1, 2.0, 2.0).unwrap();

        assert_eq!(system.particle_count(), 6);
        assert_eq!(system.flyweight_count(), 2);
        assert_eq!(out.count("Created new Fire particle flyweight"), 1);
    }

    #[test]
    fn test_unknown_particle_kind_is_rejected() {
        let out = Narrator::capture();
        let mut system = ParticleSystem::new(DemoConfig::for_tests().rng(), &out);
        let err = system.emit("Plasma", 2, 0.0, 0.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(system.particle_count(), 0);
        assert_eq!(system.flyweight_count(), 0);
    }

    #[test]
    fn test_expired_particles_are_removed() {
        let out = Narrator::capture();
        let mut system = ParticleSystem::new(DemoConfig::for_tests().rng(), &out);
        system.emit("Smoke", 5, 0.0, 0.0).unwrap();
        // Lifetimes are drawn from [1, 3).
        system.update(3.0);
        assert_eq!(system.particle_count(), 0);
        assert!(out.contains("5 particle(s) expired"));
        assert_eq!(out.count("💨 Smoke particle at"), 5);
    }

    #[test]
    fn test_seeded_particle_runs_are_identical() {
        let run = || {
            let out = Narrator::capture();
            let mut system = ParticleSystem::new(DemoConfig::for_tests().rng(), &out);
            system.emit("Spark", 4, 10.0, 10.0).unwrap();
            system.update(0.5);
            out.lines()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_forest_counts_species() {
        let out = Narrator::capture();
        let mut forest = Forest::new(&out);
        forest.plant(Species::Oak, 1.0, 1.0, 1.0);
        forest.plant(Species::Pine, 2.0, 2.0, 1.0);
        forest.plant(Species::Oak, 3.0, 3.0, 1.5);

        assert_eq!(forest.tree_count(), 3);
        assert_eq!(forest.type_count(), 2);
        assert_eq!(
            forest.species_counts(),
            vec![(Species::Oak, 2), (Species::Pine, 1)]
        );
        forest.statistics();
        assert!(out.contains("  Oak: 2 trees"));
    }

    #[test]
    fn test_demo_reports_flyweights_vs_contexts() {
        let out = Narrator::capture();
        let config = DemoConfig::for_tests();
        let (glyphs, characters) = text_demo(&out, &config);
        assert_eq!(characters, 12);
        assert!(glyphs <= characters);

        let (styles, _) = particle_demo(&out, &config).unwrap();
        assert_eq!(styles, 3);
        assert!(out.contains("❌ Invalid argument: unknown particle type 'Plasma'"));

        let (types, trees) = forest_demo(&out, &config);
        assert_eq!(trees, 20);
        assert!(types <= 3);
    }

    proptest! {
        #[test]
        fn prop_flyweight_count_equals_distinct_keys(
            text in "[a-e]{0,40}",
            fonts in prop::collection::vec(0usize..3, 40),
        ) {
            let out = Narrator::capture();
            let mut factory = GlyphFactory::new(&out);
            let mut document = Document::new(&out);
            let mut distinct = HashSet::new();

            for (index, symbol) in text.chars().enumerate() {
                let font = FONTS[fonts[index]];
                distinct.insert((symbol, font));
                let placement = Placement {
                    x: index as i32,
                    y: 0,
                    size: 12,
                    color: "black".into(),
                };
                document.add_character(&mut factory, symbol, font, placement);
            }

            prop_assert_eq!(factory.flyweight_count(), distinct.len());
            prop_assert_eq!(document.character_count(), text.chars().count());
        }
    }
}
