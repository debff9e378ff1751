use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Whether legibility sleeps actually block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    RealTime,
    Instant,
}

/// Settings for one demo run. Built in code; nothing is read from the
/// command line or the environment.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub pacing: Pacing,
    pub seed: u64,
    pub color: bool,
    pub log_level: Level,
    pub workdir: PathBuf,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            pacing: Pacing::RealTime,
            seed: 42,
            color: true,
            log_level: Level::WARN,
            workdir: PathBuf::from("."),
        }
    }
}

impl DemoConfig {
    pub fn for_tests() -> Self {
        Self {
            pacing: Pacing::Instant,
            seed: 7,
            color: false,
            ..Self::default()
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = dir.into();
        self
    }

    /// Fresh generator seeded from `seed`; two calls yield identical streams.
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    pub fn file_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.workdir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_defaults() {
        let config = DemoConfig::default();
        assert_eq!(config.pacing, Pacing::RealTime);
        assert_eq!(config.seed, 42);
        assert!(config.color);
        assert_eq!(config.log_level, Level::WARN);
    }

    #[test]
    fn test_for_tests_is_instant_and_plain() {
        let config = DemoConfig::for_tests();
        assert_eq!(config.pacing, Pacing::Instant);
        assert!(!config.color);
    }

    #[test]
    fn test_rng_is_reproducible() {
        let config = DemoConfig::for_tests().with_seed(99);
        let mut first = config.rng();
        let mut second = config.rng();
        for _ in 0..5 {
            assert_eq!(first.gen::<u32>(), second.gen::<u32>());
        }
    }

    #[test]
    fn test_file_path_joins_workdir() {
        let config = DemoConfig::for_tests().with_workdir("/tmp/demo");
        assert_eq!(config.file_path("app.log"), PathBuf::from("/tmp/demo/app.log"));
    }
}
