// src/bin/lendlink-node.rs
use clap::{Parser, Subcommand};
use lendlink_node::config::{validate_config, Config};
use lendlink_node::storage::StorageMode;
use tracing_subscriber::EnvFilter;
use yansi::Paint;

#[derive(Parser)]
#[command(name = "lendlink-node", about = "Aave V3 deep-link service", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the link API
    Start {
        /// API port (overrides the port in API_ADDR)
        #[arg(long)]
        api_port: Option<u16>,

        /// sled database path
        #[arg(long)]
        sled_path: Option<String>,

        /// Keep links in memory only
        #[arg(long)]
        memory: bool,

        /// Public origin used in generated page URLs
        #[arg(long)]
        base_url: Option<String>,
    },
}

fn banner() {
    let name = r#"
 _                _ _ _       _
| | ___ _ __   __| | (_)_ __ | | __
| |/ _ \ '_ \ / _` | | | '_ \| |/ /
| |  __/ | | | (_| | | | | | |   <
|_|\___|_| |_|\__,_|_|_|_| |_|_|\_\
"#;
    println!("{}", Paint::cyan(name).bold());
    println!(
        "{} {}",
        Paint::green("LendLink Node").bold(),
        Paint::white("unsigned Aave V3 transactions behind a short link").dimmed()
    );
    println!();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // load .env for local development (if present)
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    banner();

    match cli.command {
        Commands::Start {
            api_port,
            sled_path,
            memory,
            base_url,
        } => {
            let mut config = Config::from_env();
            if let Some(port) = api_port {
                let host = config
                    .api_addr
                    .rsplit_once(':')
                    .map(|(h, _)| h.to_string())
                    .unwrap_or_else(|| "0.0.0.0".into());
                config.api_addr = format!("{}:{}", host, port);
            }
            if let Some(p) = sled_path {
                config.sled_path = p;
            }
            if memory {
                config.storage_mode = StorageMode::Memory;
            }
            if let Some(url) = base_url {
                config.public_base_url = url.trim_end_matches('/').to_string();
            }

            let validation = validate_config(&config);
            validation.print_summary();
            if !validation.valid {
                println!("{}", Paint::red("[err] configuration is invalid, refusing to start"));
                std::process::exit(1);
            }

            println!(
                "{} API -> {}   storage -> {:?}",
                Paint::blue("[starting]").bold(),
                config.api_addr,
                config.storage_mode
            );
            lendlink_node::run(config).await?;
        }
    }

    Ok(())
}
