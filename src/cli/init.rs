//! Init command implementation

use colored::Colorize;
use dialoguer::{Input, Password, theme::ColorfulTheme};

use crate::cli::args::GlobalOptions;
use crate::client::{HypernativeApi, HypernativeClient};
use crate::config::Config;
use crate::error::{ConfigError, Error, Result};

/// Prompt for credentials, verify them against the API and save the config.
///
/// Existing fetch, cache and channel settings are preserved.
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}", "Welcome to hnmon!".bold().green());
    println!("Let's set up your Hypernative API credentials.\n");

    let mut config = match Config::load_at(opts.config_path()) {
        Ok(config) => config,
        Err(Error::Config(ConfigError::NotFound)) => Config::default(),
        Err(e) => return Err(e),
    };

    let theme = ColorfulTheme::default();
    let mut client_id = Input::<String>::with_theme(&theme).with_prompt("Client ID");
    if let Some(existing) = &config.client_id {
        client_id = client_id.default(existing.clone());
    }
    let client_id = client_id.interact_text()?;

    let client_secret: String = Password::with_theme(&theme)
        .with_prompt("Client secret")
        .interact()?;

    config.client_id = Some(client_id.trim().to_string());
    config.client_secret = Some(client_secret.trim().to_string());
    if let Some(host) = opts.api_host.as_deref() {
        config.api_host = Some(host.to_string());
    }
    config.validate()?;

    println!("\n{}", "Verifying credentials...".cyan());
    let client = HypernativeClient::new(
        config.api_host(),
        config.credentials()?,
        config.transport_settings(),
    )?;
    let suits = client
        .list_suits()
        .await
        .map_err(|e| Error::Other(format!("Credential check failed: {}", e)))?;
    println!(
        "{} Credentials accepted ({} security suits visible)",
        "✓".green(),
        suits.len()
    );

    config.save_at(opts.config_path())?;

    let config_path = Config::resolve_path(opts.config_path())?;
    println!(
        "\n{} Configuration saved to: {}",
        "✓".green(),
        config_path.display()
    );

    println!("\n{}", "You're all set! Try running:".bold());
    println!("  {} - Show configuration status", "hnmon status".cyan());
    println!("  {} - List monitors", "hnmon monitors list".cyan());

    Ok(())
}
