//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::NodeError;

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise the filter comes from the Tendermint
/// `log_level`.
pub fn init_tracing(log_level: &str) -> Result<(), NodeError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level_directives(log_level))
            .map_err(|err| NodeError::Logging(err.to_string()))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init()
        .map_err(|err| NodeError::Logging(err.to_string()))
}

/// Translates a Tendermint log level (`info` or `main:info,state:debug,*:error`)
/// into `EnvFilter` directives.
pub fn log_level_directives(log_level: &str) -> String {
    let mut default = "info";
    let mut modules = Vec::new();
    for entry in log_level.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        match entry.split_once(':') {
            Some(("*", level)) => default = level_name(level),
            Some((module, level)) => modules.push(format!("{}={}", module.trim(), level_name(level))),
            None => default = level_name(entry),
        }
    }
    std::iter::once(default.to_string()).chain(modules).collect::<Vec<_>>().join(",")
}

// Tendermint spells `off` as `none`.
fn level_name(level: &str) -> &str {
    match level.trim() {
        "none" => "off",
        level => level,
    }
}
