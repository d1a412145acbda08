use super::prompts;
use crate::output::Output;
use crate::session;
use crate::ConfigCommands;
use color_eyre::Result;
use comfy_table::{presets, Attribute, Cell, Color, Table};
use movielist_config::{Config, CredentialStore, PreferenceStore};
use serde_json::json;

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(output),
        ConfigCommands::Init { base_url, force } => init_config(base_url, force, output),
    }
}

fn show_config(output: &Output) -> Result<()> {
    let paths = session::path_manager()?;
    let config_file = paths.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Defaults are used. Run 'movielist config init' to create one.");
    }
    let config = session::load_config(&paths)?;

    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read credentials: {}", e))?;
    let username = credentials.get_username().cloned();
    let logged_in = credentials.get_access_token().is_some();
    let preferences = PreferenceStore::open(paths.state_file()).load_view_preferences();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Setting").add_attribute(Attribute::Bold).fg(Color::Cyan),
        Cell::new("Value").add_attribute(Attribute::Bold).fg(Color::Cyan),
    ]);
    table.add_row(vec!["Config file".to_string(), config_file.display().to_string()]);
    table.add_row(vec!["API base URL".to_string(), config.api.base_url.clone()]);
    table.add_row(vec!["Timeout".to_string(), format!("{}s", config.api.timeout_secs)]);
    table.add_row(vec!["Items per page".to_string(), config.view.items_per_page.to_string()]);
    table.add_row(vec![
        "Log file".to_string(),
        config
            .logging
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<stderr>".to_string()),
    ]);
    table.add_row(vec![
        "Logged in".to_string(),
        match (&username, logged_in) {
            (Some(name), true) => format!("yes ({})", name),
            _ => "no".to_string(),
        },
    ]);
    table.add_row(vec!["View mode".to_string(), format!("{:?}", preferences.mode).to_lowercase()]);
    table.add_row(vec!["Sort".to_string(), preferences.sort.to_string()]);

    output.table(
        &table,
        &json!({
            "configFile": config_file,
            "api": {
                "baseUrl": config.api.base_url,
                "timeoutSecs": config.api.timeout_secs,
            },
            "view": {
                "itemsPerPage": config.view.items_per_page,
            },
            "logging": {
                "file": config.logging.file,
                "json": config.logging.json,
            },
            "username": username,
            "loggedIn": logged_in,
            "viewPreferences": preferences,
        }),
    );
    Ok(())
}

fn init_config(base_url: Option<String>, force: bool, output: &Output) -> Result<()> {
    let paths = session::path_manager()?;
    paths
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create directories: {}", e))?;
    let config_file = paths.config_file();

    if config_file.exists() && !force {
        let overwrite = prompts::prompt_yes_no(
            &format!("{} already exists. Overwrite?", config_file.display()),
            Some(false),
        )?;
        if !overwrite {
            output.info("Keeping the existing configuration");
            return Ok(());
        }
    }

    let mut config = Config::default();
    if let Some(base_url) = base_url {
        config.api.base_url = base_url;
    }
    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Invalid configuration: {}", e))?;
    config
        .save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to write {}: {}", config_file.display(), e))?;

    output.success(format!("Configuration written to {}", config_file.display()));
    Ok(())
}
