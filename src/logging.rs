use crate::config::DemoConfig;

/// Install the stderr diagnostic subscriber. Narration never goes through
/// here; a second call keeps the first subscriber.
pub fn init(config: &DemoConfig) {
    let installed = tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();

    if installed.is_err() {
        tracing::trace!("diagnostic subscriber already installed");
    }
}
