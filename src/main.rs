use anyhow::Result;
use clap::{Parser, Subcommand};
use retroboard::config::{BoardConfig, CliOverrides};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "retroboard")]
#[command(version, about = "Terminal client for collaborative retrospective boards")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip confirmation prompts
    #[arg(long, global = true)]
    pub yes: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Directory holding retroboard.toml and credentials.toml
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// REST base URL. Overrides retroboard.toml and RETROBOARD_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// WebSocket URL. Overrides retroboard.toml and RETROBOARD_WS_URL.
    #[arg(long, global = true)]
    pub ws_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store credentials
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Create an account and store credentials
    Signup {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Forget stored credentials
    Logout,
    /// List, show, create or delete templates
    Templates {
        #[command(subcommand)]
        command: TemplatesCommands,
    },
    /// List, show, create or delete retros
    Retros {
        #[command(subcommand)]
        command: RetrosCommands,
    },
    /// Change post-its on a retro
    Post {
        /// Retro id
        retro: String,
        #[command(subcommand)]
        command: PostCommands,
    },
    /// Follow a retro live until it is deleted or Ctrl+C
    Watch {
        /// Retro id
        retro: String,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum TemplatesCommands {
    List,
    Show {
        id: String,
    },
    Create {
        name: String,
        /// Question text; repeat for each question
        #[arg(short = 'q', long = "question", required = true)]
        questions: Vec<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Clone)]
pub enum RetrosCommands {
    List,
    Show {
        id: String,
    },
    Create {
        name: String,
        /// Template id to seed the questions from
        #[arg(short, long)]
        template: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Clone)]
pub enum PostCommands {
    /// Add a post-it under a question
    Add { question: String, content: String },
    /// Replace the content of one of your post-its
    Edit {
        question: String,
        post_it: String,
        content: String,
    },
    /// Hide or reveal one of your post-its
    Toggle { question: String, post_it: String },
    /// Delete one of your post-its
    Delete { question: String, post_it: String },
    /// Vote for a post-it
    Vote { question: String, post_it: String },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    Show,
    Validate,
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    retroboard::logging::init(cli.verbose, cli.log_json);

    let config = BoardConfig::load(CliOverrides {
        config_dir: cli.config_dir.clone(),
        api_url: cli.api_url.clone(),
        ws_url: cli.ws_url.clone(),
    })?;

    match cli.command {
        Commands::Login { username } => cmd::cmd_login(&config, username, false).await?,
        Commands::Signup { username } => cmd::cmd_login(&config, username, true).await?,
        Commands::Logout => cmd::cmd_logout(&config)?,
        Commands::Templates { command } => cmd::cmd_templates(&config, command, cli.yes).await?,
        Commands::Retros { command } => cmd::cmd_retros(&config, command, cli.yes).await?,
        Commands::Post { retro, command } => {
            cmd::cmd_post(&config, retro, command, cli.yes).await?
        }
        Commands::Watch { retro } => cmd::cmd_watch(&config, retro).await?,
        Commands::Config { command } => cmd::cmd_config(&config, command)?,
    }

    Ok(())
}
