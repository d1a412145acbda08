use chrono::Utc;
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use movielist_api::{ApiClient, TokenPair};
use movielist_config::{container_base_path, Config, CredentialStore, PathManager, PreferenceStore};
use movielist_core::{ListContext, Mutations, RecordStore};
use std::sync::Arc;
use tracing::{debug, info};

use crate::output::{Output, OutputNotifier};

/// Paths rooted at MOVIELIST_BASE_PATH when set (containers), the user's
/// config directory otherwise.
pub fn path_manager() -> Result<PathManager> {
    if std::env::var_os("MOVIELIST_BASE_PATH").is_some() {
        return Ok(PathManager::with_base(container_base_path()));
    }
    PathManager::new().map_err(|e| eyre!("{}", e))
}

pub fn load_config(paths: &PathManager) -> Result<Config> {
    let config_file = paths.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .map_err(|e| eyre!("Invalid config {}: {}", config_file.display(), e))?;
    Ok(config)
}

/// Config, stored credentials and an API client primed with them.
pub struct Session {
    pub paths: PathManager,
    pub config: Config,
    pub client: Arc<ApiClient>,
    credentials: CredentialStore,
}

impl Session {
    pub async fn open() -> Result<Self> {
        let paths = path_manager()?;
        let config = load_config(&paths)?;

        let mut credentials = CredentialStore::new(paths.credentials_file());
        credentials
            .load()
            .map_err(|e| eyre!("Failed to read credentials: {}", e))?;

        let client = ApiClient::from_config(&config.api).wrap_err("Failed to create API client")?;
        if let (Some(access), Some(refresh)) = (credentials.get_access_token(), credentials.get_refresh_token()) {
            client
                .set_tokens(Some(TokenPair {
                    access: access.clone(),
                    refresh: refresh.clone(),
                }))
                .await;
        }

        Ok(Self {
            paths,
            config,
            client: Arc::new(client),
            credentials,
        })
    }

    pub fn username(&self) -> Option<&String> {
        self.credentials.get_username()
    }

    pub async fn require_login(&self) -> Result<()> {
        if self.client.is_authenticated().await {
            return Ok(());
        }
        Err(eyre!("Not logged in. Run 'movielist login' first"))
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.client.login(username, password).await?;
        self.credentials.set_username(username.to_string());
        self.credentials.set_logged_in_at(Utc::now());
        self.save_tokens().await
    }

    /// Write tokens refreshed (or dropped) during this run back to disk.
    pub async fn save_tokens(&mut self) -> Result<()> {
        let current = self.client.tokens().await;
        let stored = self
            .credentials
            .get_access_token()
            .cloned()
            .zip(self.credentials.get_refresh_token().cloned());

        match current {
            Some(pair) if stored.as_ref() != Some(&(pair.access.clone(), pair.refresh.clone())) => {
                debug!("Storing refreshed tokens");
                self.credentials.set_access_token(pair.access);
                self.credentials.set_refresh_token(pair.refresh);
            }
            None if stored.is_some() => {
                info!("Session expired, removing stored tokens");
                self.credentials.clear_tokens();
            }
            _ => return Ok(()),
        }

        self.credentials
            .save()
            .map_err(|e| eyre!("Failed to save credentials: {}", e))
    }

    pub fn preferences(&self) -> PreferenceStore {
        PreferenceStore::open(self.paths.state_file())
    }

    /// Record store loaded with the user's own records, plus mutations
    /// reporting through `output`.
    pub async fn own_records(&mut self, output: &Output) -> Result<Mutations> {
        self.require_login().await?;
        let store = RecordStore::new(self.client.clone());
        let loaded = store.load(ListContext::Own).await;
        if loaded.is_err() {
            self.save_tokens().await?;
        }
        loaded.wrap_err("Failed to load records")?;
        Ok(Mutations::new(store, Arc::new(OutputNotifier::new(*output))))
    }
}
