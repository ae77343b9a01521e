//! Live board — `retroboard watch <retro>`.

use std::sync::Arc;

use anyhow::Result;
use console::{Term, style};
use retroboard::board::{
    RetroApi, RetroSession, SessionStatus, SyncChannel, WsConnector,
};
use retroboard::config::BoardConfig;
use retroboard::ui::board::{connection_badge, render_board};
use retroboard_common::RetroId;
use tracing::{debug, info};

use super::authed_api;

pub async fn cmd_watch(config: &BoardConfig, retro: String) -> Result<()> {
    let (api, credentials) = authed_api(config)?;
    let api: Arc<dyn RetroApi> = Arc::new(api);
    let retro_id = RetroId::new(retro);
    let title = api.get_retro(&retro_id).await?.name;

    let connector = Arc::new(WsConnector::new(config.ws_url()));
    info!(url = connector.url(), "opening sync channel");
    let channel = Arc::new(SyncChannel::spawn(connector, config.reconnect_policy()));

    let session = RetroSession::enter(
        retro_id.clone(),
        api,
        channel.clone(),
        credentials.user_id.clone(),
    )
    .await?;

    let term = Term::stdout();
    let mut states = session.store().subscribe();
    let mut connection = channel.watch_state();
    let mut status = session.watch_status();

    let draw = |connection: retroboard::board::ConnectionState| {
        let _ = term.clear_screen();
        let board = session.store().snapshot();
        println!("{}", connection_badge(connection));
        print!("{}", render_board(&title, &board, &credentials.user_id));
        println!("\n{}", style("Ctrl+C to stop watching").dim());
    };
    draw(channel.state());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                draw(channel.state());
            }
            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *connection.borrow_and_update();
                draw(current);
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                if *status.borrow_and_update() == SessionStatus::Ended {
                    println!("{}", style(format!("Retro {retro_id} was deleted.")).red());
                    break;
                }
            }
        }
    }

    session.leave().await;
    channel.close().await;
    Ok(())
}
