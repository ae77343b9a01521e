//! Template commands — `retroboard templates`.

use anyhow::Result;
use console::style;
use retroboard::board::RetroApi;
use retroboard::board::api::NewTemplate;
use retroboard::config::BoardConfig;
use retroboard::ui::board::{render_template, render_templates};
use retroboard::ui::icons::CHECK;
use retroboard_common::TemplateId;

use super::super::TemplatesCommands;
use super::{authed_api, confirm};

pub async fn cmd_templates(config: &BoardConfig, command: TemplatesCommands, yes: bool) -> Result<()> {
    let (api, _) = authed_api(config)?;

    match command {
        TemplatesCommands::List => {
            let templates = api.list_templates().await?;
            print!("{}", render_templates(&templates));
        }
        TemplatesCommands::Show { id } => {
            let template = api.get_template(&TemplateId::new(id)).await?;
            print!("{}", render_template(&template));
        }
        TemplatesCommands::Create { name, questions } => {
            let request = NewTemplate::new(&name, &questions)?;
            let template = api.create_template(&request).await?;
            println!(
                "{}Created template {} {}",
                CHECK,
                style(&template.name).bold(),
                style(format!("[{}]", template.id)).dim()
            );
        }
        TemplatesCommands::Delete { id } => {
            let id = TemplateId::new(id);
            if !confirm(&format!("Delete template {id}?"), yes) {
                println!("Delete cancelled");
                return Ok(());
            }
            api.delete_template(&id).await?;
            println!("{}Deleted template {}", CHECK, id);
        }
    }
    Ok(())
}
