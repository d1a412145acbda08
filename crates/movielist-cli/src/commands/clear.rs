use crate::output::Output;
use crate::session;
use color_eyre::Result;
use movielist_config::{CredentialStore, PathManager, PreferenceStore, VIEW_PREFERENCES_KEY};

pub async fn run_clear(all: bool, credentials: bool, preferences: bool, output: &Output) -> Result<()> {
    let path_manager = session::path_manager()?;

    if all {
        clear_credentials(&path_manager, output)?;
        clear_preferences(&path_manager, output)?;
        output.success("Credentials and preferences cleared");
        return Ok(());
    }

    if !credentials && !preferences {
        output.warn("No clear option specified. Use --credentials, --preferences, or --all");
        output.info("\nExample: movielist clear --credentials");
        return Ok(());
    }

    if credentials {
        clear_credentials(&path_manager, output)?;
    }
    if preferences {
        clear_preferences(&path_manager, output)?;
    }
    Ok(())
}

fn clear_credentials(path_manager: &PathManager, output: &Output) -> Result<()> {
    let credentials_file = path_manager.credentials_file();
    if !credentials_file.exists() {
        output.info("No credentials file found to clear");
        return Ok(());
    }

    let mut store = CredentialStore::new(credentials_file.clone());
    store
        .load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials: {}", e))?;
    store.clear();
    store
        .save()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save credentials: {}", e))?;
    output.success(format!("Logged out, cleared {}", credentials_file.display()));
    Ok(())
}

fn clear_preferences(path_manager: &PathManager, output: &Output) -> Result<()> {
    let state_file = path_manager.state_file();
    if !state_file.exists() {
        output.info("No saved preferences found to clear");
        return Ok(());
    }

    let mut store = PreferenceStore::open(state_file);
    store
        .remove(VIEW_PREFERENCES_KEY)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to clear view preferences: {}", e))?;
    output.success("List view preferences reset to defaults");
    Ok(())
}
