//! Configuration view and validation commands — `retroboard config`.

use anyhow::Result;
use retroboard::config::{API_URL_ENV, BoardConfig, RetroToml, WS_URL_ENV};

use super::super::ConfigCommands;

pub fn cmd_config(config: &BoardConfig, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = config.config_file();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Retroboard Configuration");
            println!("========================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No retroboard.toml found at {}", config_path.display());
                println!("Using default configuration.");
            }
            println!();

            let toml = &config.toml;
            println!("[server]");
            println!("  api_url = \"{}\"", toml.server.api_url);
            if let Some(ws_url) = &toml.server.ws_url {
                println!("  ws_url = \"{}\"", ws_url);
            }
            println!("  request_timeout_secs = {}", toml.server.request_timeout_secs);
            println!();
            println!("[sync]");
            println!("  reconnect_base_ms = {}", toml.sync.reconnect_base_ms);
            println!("  reconnect_ceiling_ms = {}", toml.sync.reconnect_ceiling_ms);
            println!();

            println!("Effective values (with {API_URL_ENV}/{WS_URL_ENV} and CLI overrides):");
            println!("  api_url = \"{}\"", config.api_url());
            println!("  ws_url = \"{}\"", config.ws_url());
            let logged_in = config.credentials().load()?;
            match logged_in {
                Some(credentials) => println!(
                    "  user = \"{}\" (id {})",
                    credentials.user_name, credentials.user_id
                ),
                None => println!("  user = (not logged in)"),
            }
            println!();

            let warnings = config.validate();
            if !warnings.is_empty() {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("retroboard.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            RetroToml::default().save(&config_path)?;

            println!("Created retroboard.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [server] api_url, ws_url, request_timeout_secs");
            println!("  - [sync] reconnect_base_ms, reconnect_ceiling_ms");
            println!();
        }
    }

    Ok(())
}
