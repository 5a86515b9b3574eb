use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "memindex", version, about = "Keyword-indexed stickers, photos and GIFs for Telegram")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot and the caption endpoint.
    Serve(ServeOpts),
    Config(ConfigOpts),
    /// Inspect the persisted keyword indexes.
    Index(IndexOpts),
    Version,
}

#[derive(clap::Args)]
pub struct ServeOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[arg(short, long)]
    pub port: Option<u16>,
    #[arg(short, long)]
    pub bind: Option<String>,
}

#[derive(clap::Args)]
pub struct ConfigOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Show,
    Validate,
    Init,
}

#[derive(clap::Args)]
pub struct IndexOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub action: IndexAction,
}

#[derive(Subcommand)]
pub enum IndexAction {
    /// Keyword and reference counts per kind.
    Stats,
    /// Resolve an inline query against the files on disk.
    Lookup { query: String },
}
