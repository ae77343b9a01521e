//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module      | Commands handled                    |
//! |-------------|-------------------------------------|
//! | `auth`      | `Login`, `Signup`, `Logout`         |
//! | `templates` | `Templates`                         |
//! | `retros`    | `Retros`                            |
//! | `post`      | `Post`                              |
//! | `watch`     | `Watch`                             |
//! | `config`    | `Config`                            |

pub mod auth;
pub mod config;
pub mod post;
pub mod retros;
pub mod templates;
pub mod watch;

pub use auth::{cmd_login, cmd_logout};
pub use config::cmd_config;
pub use post::cmd_post;
pub use retros::cmd_retros;
pub use templates::cmd_templates;
pub use watch::cmd_watch;

use anyhow::{Context, Result};
use dialoguer::Confirm;
use retroboard::board::HttpRetroApi;
use retroboard::config::BoardConfig;
use retroboard::credentials::Credentials;
use retroboard::errors::ClientError;

/// API client without credentials, for the auth endpoints.
fn anonymous_api(config: &BoardConfig) -> Result<HttpRetroApi> {
    HttpRetroApi::new(config.api_url(), config.request_timeout())
        .context("Failed to build HTTP client")
}

/// API client carrying the stored bearer token.
fn authed_api(config: &BoardConfig) -> Result<(HttpRetroApi, Credentials)> {
    let credentials = config
        .credentials()
        .load()?
        .ok_or(ClientError::MissingCredentials)?;
    let api = anonymous_api(config)?.with_token(credentials.token.clone());
    Ok((api, credentials))
}

/// Ask before a destructive action unless `--yes` was given.
fn confirm(prompt: &str, yes: bool) -> bool {
    if yes {
        return true;
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}
