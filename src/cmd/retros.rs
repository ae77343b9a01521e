//! Retro commands — `retroboard retros`.

use anyhow::Result;
use console::style;
use retroboard::board::RetroApi;
use retroboard::board::api::NewRetro;
use retroboard::config::BoardConfig;
use retroboard::ui::board::{render_board, render_retros};
use retroboard::ui::icons::CHECK;
use retroboard_common::{RetroId, TemplateId};

use super::super::RetrosCommands;
use super::{authed_api, confirm};

pub async fn cmd_retros(config: &BoardConfig, command: RetrosCommands, yes: bool) -> Result<()> {
    let (api, credentials) = authed_api(config)?;

    match command {
        RetrosCommands::List => {
            let retros = api.list_retros().await?;
            print!("{}", render_retros(&retros));
        }
        RetrosCommands::Show { id } => {
            let retro = api.get_retro(&RetroId::new(id)).await?;
            let title = retro.name.clone();
            print!(
                "{}",
                render_board(&title, &retro.into_session_state(), &credentials.user_id)
            );
        }
        RetrosCommands::Create { name, template } => {
            let request = NewRetro::new(&name, TemplateId::new(template))?;
            let retro = api.create_retro(&request).await?;
            println!(
                "{}Created retro {} {}",
                CHECK,
                style(&retro.name).bold(),
                style(format!("[{}]", retro.id)).dim()
            );
        }
        RetrosCommands::Delete { id } => {
            let id = RetroId::new(id);
            if !confirm(&format!("Delete retro {id} and all its post-its?"), yes) {
                println!("Delete cancelled");
                return Ok(());
            }
            api.delete_retro(&id).await?;
            println!("{}Deleted retro {}", CHECK, id);
        }
    }
    Ok(())
}
