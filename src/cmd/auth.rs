//! Authentication commands — `retroboard login`, `signup`, `logout`.

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Password};
use retroboard::config::BoardConfig;
use retroboard::ui::icons::CHECK;
use tracing::info;

use super::anonymous_api;

pub async fn cmd_login(config: &BoardConfig, username: Option<String>, signup: bool) -> Result<()> {
    let username = match username {
        Some(name) => name,
        None => Input::<String>::new()
            .with_prompt("Username")
            .interact_text()
            .context("Failed to read username")?,
    };
    let mut prompt = Password::new().with_prompt("Password");
    if signup {
        prompt = prompt.with_confirmation("Repeat password", "Passwords do not match");
    }
    let password = prompt.interact().context("Failed to read password")?;

    let api = anonymous_api(config)?;
    let credentials = if signup {
        api.signup(&username, &password).await?
    } else {
        api.login(&username, &password).await?
    };

    let store = config.credentials();
    store.save(&credentials)?;
    info!(user = %credentials.user_id, "stored credentials");

    println!(
        "{}{} as {}",
        CHECK,
        if signup { "Signed up" } else { "Logged in" },
        style(&credentials.user_name).bold()
    );
    Ok(())
}

pub fn cmd_logout(config: &BoardConfig) -> Result<()> {
    let store = config.credentials();
    if store.clear()? {
        println!("{}Logged out", CHECK);
    } else {
        println!("Not logged in");
    }
    Ok(())
}
