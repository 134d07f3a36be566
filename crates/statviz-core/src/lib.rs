//! Session and service wiring for StatViz.
//!
//! [`ServiceConfig`] resolves settings, [`ServiceRegistry`] builds the
//! clients once, and [`Wizard`] drives the four-step analysis session.

pub mod config;
pub mod error;
pub mod registry;
pub mod wizard;

pub use config::{
    BackendConfig, BackendMode, ConfigOverrides, DEFAULT_CONFIG_FILE, HttpConfig, LlmConfig,
    ServiceConfig, ServiceUrls, UploadConfig, mask_secret,
};
pub use error::{CoreError, Result};
pub use registry::{ServiceRegistry, SharedBackend};
pub use wizard::{PendingAnalysis, TOTAL_STEPS, Wizard, WizardStep};
