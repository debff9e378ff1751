use crate::config::DemoConfig;
use crate::error::Result;
use crate::logging;
use crate::narration::Narrator;
use std::process::ExitCode;

/// Entry point shared by every pattern binary.
///
/// Errors that reach this level are fatal by construction: non-fatal ones
/// are narrated where they happen.
pub fn run<F>(pattern: &str, demo: F) -> ExitCode
where
    F: FnOnce(&Narrator, &DemoConfig) -> Result<()>,
{
    let config = DemoConfig::default();
    logging::init(&config);

    let out = Narrator::new(&config);
    out.title(pattern);

    finish(pattern, demo(&out, &config))
}

fn finish(pattern: &str, outcome: Result<()>) -> ExitCode {
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(pattern, kind = ?err.kind(), "demo aborted");
            eprintln!("Fatal: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PatternError;

    fn same(a: ExitCode, b: ExitCode) -> bool {
        format!("{a:?}") == format!("{b:?}")
    }

    #[test]
    fn test_success_maps_to_zero() {
        assert!(same(finish("Test", Ok(())), ExitCode::SUCCESS));
    }

    #[test]
    fn test_error_maps_to_failure() {
        let outcome = Err(PatternError::fatal("invariant broken"));
        assert!(same(finish("Test", outcome), ExitCode::FAILURE));
    }
}
