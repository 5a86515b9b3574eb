use clap::Parser;
use memindex::cli::{Cli, Commands, ConfigAction, IndexAction};
use memindex::config::{validate_config_object, Config};
use memindex::gateway::GatewayServer;
use memindex::index::IndexStore;
use memindex::logging;
use memindex::query::QueryResolver;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(opts) => {
            let config = Config::load(opts.config.as_deref())?;
            logging::init(&config.logging);
            info!("Starting memindex");
            let server = GatewayServer::start(config, opts).await?;
            server.run_until_shutdown().await?;
        }
        Commands::Config(opts) => {
            let config = Config::load(opts.config.as_deref())?;
            logging::init(&config.logging);
            match opts.action {
                ConfigAction::Show => {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
                ConfigAction::Validate => {
                    validate_config_object(&config)?;
                    info!("Configuration is valid");
                }
                ConfigAction::Init => {
                    let path = opts
                        .config
                        .as_deref()
                        .unwrap_or(memindex::config::DEFAULT_CONFIG_FILE);
                    Config::write_default(path)?;
                    info!("Configuration file created at {path}");
                }
            }
        }
        Commands::Index(opts) => {
            let config = Config::load(opts.config.as_deref())?;
            logging::init(&config.logging);
            let store = Arc::new(IndexStore::open_read_only(config.index.files()));
            match opts.action {
                IndexAction::Stats => {
                    println!("{}", serde_json::to_string_pretty(&store.stats())?);
                }
                IndexAction::Lookup { query } => {
                    let resolver = QueryResolver::new(store, config.resolver_settings()?);
                    println!("{}", serde_json::to_string_pretty(&resolver.resolve(&query))?);
                }
            }
        }
        Commands::Version => {
            println!("memindex {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
