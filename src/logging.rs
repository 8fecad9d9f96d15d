//! Tracing subscriber setup for binaries and tests embedding the crate.

use std::sync::OnceLock;

use anyhow::{Result, bail};
use tracing_subscriber::EnvFilter;

static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Installs a compact fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; only the first call installs anything. Fails
/// if the host process already installed a global subscriber of its own.
pub fn init_tracing() -> Result<()> {
    let installed = *INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .compact()
            .try_init()
            .is_ok()
    });

    if !installed {
        bail!("a global tracing subscriber was already installed");
    }
    tracing::debug!("tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing().unwrap();
        init_tracing().unwrap();
    }
}
