//! Ledger anchoring.
//!
//! Two interchangeable strategies behind [`LedgerClient`]:
//! - [`SimulatedLedger`]: in-memory, for development and tests
//! - [`LiveLedger`]: Constellation network over HTTP
//!
//! The strategy is chosen once, from [`LedgerConfig::mode`].

pub mod live;
pub mod simulated;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

use crate::config::LedgerConfig;

pub use live::LiveLedger;
pub use simulated::SimulatedLedger;
pub use traits::{LedgerClient, LedgerError, LedgerMessage, LedgerMode};

/// Build the ledger client selected by the configuration.
pub fn ledger_from_config(config: &LedgerConfig) -> Result<Arc<dyn LedgerClient>, LedgerError> {
    let ledger: Arc<dyn LedgerClient> = match config.mode {
        LedgerMode::Simulated => Arc::new(SimulatedLedger::with_latency(Duration::from_millis(
            config.simulated_latency_ms,
        ))),
        LedgerMode::Live => Arc::new(LiveLedger::new(config)?),
    };

    tracing::info!(mode = %config.mode.as_str(), "Ledger client initialized");
    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_follows_mode() {
        let simulated = ledger_from_config(&LedgerConfig::default()).unwrap();
        assert_eq!(simulated.mode(), LedgerMode::Simulated);

        let live = ledger_from_config(&LedgerConfig {
            mode: LedgerMode::Live,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(live.mode(), LedgerMode::Live);
    }
}
