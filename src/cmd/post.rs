//! One-shot post-it commands — `retroboard post <retro> ...`.
//!
//! Each command fetches the retro, runs a single intent through the
//! dispatcher and prints the resulting board.

use std::sync::Arc;

use anyhow::Result;
use console::style;
use retroboard::board::{Dispatcher, Outcome, RetroApi, StateStore};
use retroboard::config::BoardConfig;
use retroboard::ui::board::render_board;
use retroboard::ui::icons::WARN;
use retroboard_common::RetroId;
use tokio_util::sync::CancellationToken;

use super::super::PostCommands;
use super::{authed_api, confirm};

pub async fn cmd_post(
    config: &BoardConfig,
    retro: String,
    command: PostCommands,
    yes: bool,
) -> Result<()> {
    let (api, credentials) = authed_api(config)?;
    let api: Arc<dyn RetroApi> = Arc::new(api);
    let retro = api.get_retro(&RetroId::new(retro)).await?;
    let title = retro.name.clone();

    let store = StateStore::with_state(retro.into_session_state());
    let dispatcher = Dispatcher::new(
        api,
        store.clone(),
        credentials.user_id.clone(),
        CancellationToken::new(),
    );

    let outcome = match command {
        PostCommands::Add { question, content } => {
            dispatcher.create_post_it(&question.into(), &content).await?
        }
        PostCommands::Edit {
            question,
            post_it,
            content,
        } => {
            dispatcher
                .edit_post_it(&question.into(), &post_it.into(), &content)
                .await?
        }
        PostCommands::Toggle { question, post_it } => {
            dispatcher
                .toggle_visibility(&question.into(), &post_it.into())
                .await?
        }
        PostCommands::Delete { question, post_it } => {
            dispatcher
                .delete_post_it(&question.into(), &post_it.into(), |p| {
                    confirm(&format!("Delete post-it \"{}\"?", p.content), yes)
                })
                .await?
        }
        PostCommands::Vote { question, post_it } => {
            dispatcher.vote(&question.into(), &post_it.into()).await?
        }
    };

    match outcome {
        Outcome::Applied | Outcome::Detached => {}
        Outcome::Ignored => println!(
            "{}{}",
            WARN,
            style("Nothing to do: no such question or post-it, or no change").yellow()
        ),
        Outcome::Cancelled => {
            println!("Delete cancelled");
            return Ok(());
        }
    }

    print!(
        "{}",
        render_board(&title, &store.snapshot(), &credentials.user_id)
    );
    Ok(())
}
