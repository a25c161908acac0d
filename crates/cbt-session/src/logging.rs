use std::io;

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub fn fallback_directive(verbosity: u8, config_filter: Option<&str>) -> String {
    if let Some(filter) = config_filter {
        return filter.to_string();
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
    .to_string()
}

/// Installs the stderr subscriber. A second call is ignored.
pub fn init(verbosity: u8, config_filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = fallback_directive(verbosity, config_filter);
        EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"))
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
