pub mod board;
pub mod icons;

pub use board::{connection_badge, render_board, render_post_it, render_retros, render_templates};
