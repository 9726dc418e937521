//! Log output for study-core hosts.
//!
//! Development builds get pretty, source-located logs with the study crates
//! at `debug`. Production gets flattened JSON events with the study crates at
//! `info` and everything else at `warn`. `RUST_LOG` replaces the defaults.

use tracing_subscriber::{
    EnvFilter, Layer,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

use crate::config::Environment;

/// Default directives in development.
pub const DEVELOPMENT_DIRECTIVES: &str =
    "info,medora_core=debug,medora_store=debug,medora_srs=debug,study_sim=debug";

/// Default directives in production.
pub const PRODUCTION_DIRECTIVES: &str =
    "warn,medora_core=info,medora_store=info,medora_srs=info,study_sim=info";

/// Directives used when `RUST_LOG` is unset or unparsable.
pub const fn default_directives(env: &Environment) -> &'static str {
    if env.is_development() {
        DEVELOPMENT_DIRECTIVES
    } else {
        PRODUCTION_DIRECTIVES
    }
}

fn env_filter(env: &Environment) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(env)))
}

/// Install the global subscriber for `env`.
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(env: &Environment) -> Result<(), TryInitError> {
    let filter = env_filter(env);

    if env.is_development() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .pretty()
                    .with_filter(filter),
            )
            .try_init()?;
    } else {
        // Session, course and material ids land as top-level JSON keys
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .flatten_event(true)
                    .with_target(true)
                    .with_filter(filter),
            )
            .try_init()?;
    }

    tracing::info!(environment = ?env, "Tracing initialized");
    Ok(())
}
