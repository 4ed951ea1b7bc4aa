use anyhow::Context;
use clap::{Parser, Subcommand};
use market_proxy::server::{create_router, AppState};
use market_proxy::{CoingeckoApi, Config, FetchClient, PriceService, ProxyService};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Caching proxy for cryptocurrency market data", version)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the proxy endpoints over HTTP (default)
    Serve,
    /// Interactive terminal views over the same endpoints
    Console,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let client = config.http_client().context("building HTTP client")?;
    let fetch = FetchClient::new(client, config.upstream_url.clone(), config.retry_policy());
    let proxy = Arc::new(ProxyService::new(CoingeckoApi::new(fetch), config.cache_ttl()));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, proxy).await,
        Command::Console => console(proxy).await,
    }
}

async fn serve(config: &Config, proxy: Arc<ProxyService>) -> anyhow::Result<()> {
    info!(upstream = %config.upstream_url, "Starting market data proxy");
    let app = create_router(AppState::new(proxy));

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    info!("Listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
    }
    info!("Shutting down");
}

async fn console(proxy: Arc<ProxyService>) -> anyhow::Result<()> {
    let price_service = PriceService::new(proxy);

    println!("=== Cryptocurrency Market Console ===");
    println!("Commands:");
    println!("  markets [page] - Top coins by market cap");
    println!("  categories     - Top categories");
    println!("  trending       - Trending coins");
    println!("  <coin symbol>  - Show market rows for a symbol");
    println!("  list           - Show supported coins");
    println!("  exit           - Exit the program");

    let mut input = String::new();
    loop {
        input.clear();
        print!("> ");
        io::stdout().flush()?;
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let mut words = input.split_whitespace();
        let result = match words.next() {
            None => continue,
            Some("exit") => {
                debug!("Received exit command");
                break;
            }
            Some("markets") => {
                let page = words.next().and_then(|p| p.parse().ok()).unwrap_or(1);
                price_service.markets_page(page).await
            }
            Some("categories") => price_service.categories().await,
            Some("trending") => price_service.trending().await,
            Some("list") => price_service.supported_coins().await.map(|coins| {
                let mut symbols: Vec<_> = coins.into_iter().collect();
                symbols.sort();
                symbols
                    .iter()
                    .map(|(symbol, ids)| format!("{:<6} -> {}", symbol, ids.join(", ")))
                    .collect::<Vec<_>>()
                    .join("\n")
            }),
            Some(symbol) => price_service.symbol_summary(symbol).await,
        };

        match result {
            Ok(output) => println!("{}", output),
            Err(e) => error!("{}", e),
        }
    }

    info!("Shutting down");
    Ok(())
}
