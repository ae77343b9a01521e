//! Plain-text rendering of templates, retros and the board itself.

use std::fmt::Write;

use chrono::Local;
use console::style;
use retroboard_common::{PostIt, Retro, SessionState, Template, UserId};

use super::icons::{HIDDEN, LIVE, NOTE, OFFLINE, QUESTION, RECONNECT, VOTE};
use crate::board::ConnectionState;

const HIDDEN_PLACEHOLDER: &str = "(hidden)";

/// One post-it line. Hidden content is only shown to its owner.
pub fn render_post_it(post_it: &PostIt, viewer: &UserId) -> String {
    let mine = post_it.is_owned_by(viewer);
    let (icon, body) = if post_it.hidden {
        let body = if mine {
            format!("{} {}", style(&post_it.content).dim(), style(HIDDEN_PLACEHOLDER).italic())
        } else {
            style(HIDDEN_PLACEHOLDER).dim().italic().to_string()
        };
        (HIDDEN, body)
    } else {
        (NOTE, post_it.content.clone())
    };

    let mut line = format!("  {}{} {}", icon, style(format!("[{}]", post_it.id)).dim(), body);
    if post_it.votes > 0 {
        let _ = write!(line, "  {}{}", VOTE, style(post_it.votes).yellow());
    }
    if mine {
        let _ = write!(line, " {}", style("(you)").cyan());
    }
    line
}

pub fn render_board(title: &str, state: &SessionState, viewer: &UserId) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", style(title).bold().underlined());
    if state.questions.is_empty() {
        let _ = writeln!(out, "{}", style("No questions on this board.").dim());
        return out;
    }
    for question in &state.questions {
        let _ = writeln!(
            out,
            "\n{}{} {}",
            QUESTION,
            style(&question.content).bold(),
            style(format!("[{}]", question.id)).dim()
        );
        if question.post_its.is_empty() {
            let _ = writeln!(out, "  {}", style("no post-its yet").dim());
        }
        for post_it in &question.post_its {
            let _ = writeln!(out, "{}", render_post_it(post_it, viewer));
        }
    }
    out
}

pub fn connection_badge(state: ConnectionState) -> String {
    let icon = match state {
        ConnectionState::Connected => LIVE,
        ConnectionState::Connecting => RECONNECT,
        ConnectionState::Disconnected | ConnectionState::Closed => OFFLINE,
    };
    format!("{}{}", icon, style(state).dim())
}

pub fn render_templates(templates: &[Template]) -> String {
    if templates.is_empty() {
        return format!("{}\n", style("No templates.").dim());
    }
    let mut out = String::new();
    for template in templates {
        let _ = writeln!(
            out,
            "{:>6}  {}  {}",
            style(&template.id).cyan(),
            template.name,
            style(format!("({} questions)", template.questions.len())).dim()
        );
    }
    out
}

pub fn render_template(template: &Template) -> String {
    let mut out = format!("{}\n", style(&template.name).bold());
    for (index, question) in template.questions.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", index + 1, question.content);
    }
    out
}

pub fn render_retros(retros: &[Retro]) -> String {
    if retros.is_empty() {
        return format!("{}\n", style("No retros.").dim());
    }
    let mut out = String::new();
    for retro in retros {
        let created = retro
            .created_at
            .map(|at| at.with_timezone(&Local).format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:>6}  {}  {}",
            style(&retro.id).cyan(),
            retro.name,
            style(created).dim()
        );
    }
    out
}
