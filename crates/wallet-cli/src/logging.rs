use tracing_subscriber::{fmt, EnvFilter};

/// Env var switching log output to JSON lines.
pub const LOG_JSON_VAR: &str = "WALLET_LOG_JSON";

pub fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    });
    let use_json = std::env::var(LOG_JSON_VAR)
        .map(|value| value == "1")
        .unwrap_or(false);

    // Logs go to stderr so command output on stdout stays pipeable.
    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
