use tracing_subscriber::EnvFilter;

use crate::config::{LoggingConfig, LoggingLevel};

/// Install the global subscriber. A non-empty `RUST_LOG` is used as-is;
/// otherwise the configured level applies to this crate.
pub fn init(config: &LoggingConfig) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = directives(rust_log.as_deref(), config.level);
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("ignoring invalid log filter {directives:?}: {e}");
        EnvFilter::new(default_directive(config.level))
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn directives(rust_log: Option<&str>, level: LoggingLevel) -> String {
    match rust_log.map(str::trim) {
        Some(env) if !env.is_empty() => env.to_string(),
        _ => default_directive(level),
    }
}

fn default_directive(level: LoggingLevel) -> String {
    format!("memindex={}", level.as_str())
}
