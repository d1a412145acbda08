use super::prompts;
use crate::output::Output;
use crate::session::Session;
use color_eyre::Result;
use serde_json::json;

pub async fn run_login(username: Option<String>, output: &Output) -> Result<()> {
    let mut session = Session::open().await?;

    let username = match username {
        Some(username) => username,
        None => {
            let previous = session.username().cloned();
            prompts::prompt_string("Username", previous.as_deref())?
        }
    };
    let username = username.trim().to_string();
    if username.is_empty() {
        return Err(color_eyre::eyre::eyre!("Username cannot be empty"));
    }
    let password = prompts::prompt_password("Password")?;

    if let Err(e) = session.login(&username, &password).await {
        output.error(format!("Login failed for {}", username));
        return Err(e);
    }

    if output.is_human() {
        output.success(format!("Logged in as {}", username));
    } else {
        output.json(&json!({
            "type": "success",
            "username": username,
            "baseUrl": session.config.api.base_url,
        }));
    }
    Ok(())
}
