use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::pravasi::registry::error::{RegistryError, Result};

/// Installs the global tracing subscriber. `RUST_LOG` takes precedence over the
/// verbosity flag.
pub fn init_logger(verbose: bool) -> Result<()> {
    let default_directive = if verbose {
        "pravasi_registry=debug,info"
    } else {
        "pravasi_registry=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .map_err(|e| RegistryError::Logging(e.to_string()))
}
