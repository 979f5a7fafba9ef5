//! etisgrade-portal — ETIS student portal integration.
//!
//! Logs into the portal, discovers the available terms and scrapes the
//! per-subject grade tables, implementing the `PortalConnector` and
//! `PortalSession` traits from `etisgrade-core`.

pub mod config;
pub mod grades;
pub mod mock;
pub mod session;
pub mod terms;

pub use config::{load_config, load_config_from, EtisConfig, PortalSettings};
pub use mock::MockPortal;
pub use session::{EtisPortal, EtisSession};
