pub mod config;
pub mod credentials;
pub mod paths;
pub mod preferences;

pub use config::{ApiConfig, Config, LoggingConfig, ViewConfig};
pub use credentials::CredentialStore;
pub use paths::{container_base_path, PathManager};
pub use preferences::{PreferenceStore, VIEW_PREFERENCES_KEY};
