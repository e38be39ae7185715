use anyhow::Result;
use clap::Parser;
use inkpage::gallery::Gallery;
use inkpage::models::Config;
use inkpage::server::run_server;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "inkpage")]
#[command(about = "Serve the handwritten page API")]
struct CliArgs {
    /// Address to listen on, overrides BIND_ADDR.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkpage=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    let bind_addr = args.bind.unwrap_or_else(|| config.bind_addr.clone());

    info!("Starting inkpage");

    let gallery = match Gallery::new(&config).await {
        Ok(gallery) => gallery,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    run_server(gallery, &bind_addr, config.max_body_bytes).await
}
