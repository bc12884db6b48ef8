use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Environment;

/// Default log filter when `RUST_LOG` is not set.
pub fn default_filter(environment: Environment) -> &'static str {
    if environment.is_production() {
        "info"
    } else {
        "debug"
    }
}

/// Installs the global subscriber: JSON lines in production, human-readable
/// output elsewhere. `RUST_LOG` overrides the level.
pub fn init(environment: Environment) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(environment)));

    let result = if environment.is_production() {
        fmt().json().with_env_filter(filter).with_current_span(false).try_init()
    } else {
        fmt().with_env_filter(filter).with_target(false).try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
}

/// Logs every panic through `tracing` before the default hook runs.
/// Panics inside request handlers are answered with a 500 and do not stop
/// the process.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        tracing::error!(location = %location, "Panic: {}", info);
        default_hook(info);
    }));
}
