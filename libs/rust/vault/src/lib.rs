//! HashiCorp Vault session for long-running services.
//!
//! Keeps a bootstrap token alive on a fixed schedule and, separately,
//! exchanges an AppRole for a client token used to read a KV v2 secret.

pub mod approle;
pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod lifecycle;
pub mod provider;
pub mod scheduler;
pub mod secrets;
pub mod session;
pub mod source;

pub use approle::AppRoleExchanger;
pub use client::VaultTransport;
pub use config::VaultSettings;
pub use error::{VaultError, VaultResult};
pub use fetcher::SecretFetcher;
pub use lifecycle::TokenLifecycleController;
pub use provider::{TokenLifecycle, TtlStatus};
pub use scheduler::{Scheduler, TickOutcome};
pub use secrets::DatabaseSecret;
pub use session::{AppRoleLineage, VaultSession};
pub use source::{ConfigSource, EnvSource, JsonFileSource, LayeredSource, MapSource};
