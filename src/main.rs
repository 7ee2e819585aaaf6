use algo_exec::cli::{Cli, Commands};
use algo_exec::config::Config;
use algo_exec::execution::PaperExchange;
use algo_exec::manager::OrderManager;
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    let _telemetry = algo_exec::telemetry::init_telemetry(&config.telemetry)?;

    let exchange = Arc::new(PaperExchange::from_config(&config.paper));
    let manager = OrderManager::new(exchange, &config.strategy);

    match cli.command {
        Commands::Market(args) => args.execute(&manager).await?,
        Commands::Limit(args) => args.execute(&manager).await?,
        Commands::Stop(args) => args.execute(&manager).await?,
        Commands::Oco(args) => args.execute(&manager).await?,
        Commands::Twap(args) => {
            tracing::info!("Starting TWAP");
            args.execute(&manager).await?;
        }
        Commands::Grid(args) => {
            tracing::info!("Starting grid");
            args.execute(&manager).await?;
        }
        Commands::Balance(args) => args.execute(&manager).await?,
        Commands::Config => {
            println!("Current configuration:");
            println!("  Paper fee rate: {}", config.paper.fee_rate);
            let mut symbols: Vec<_> = config.paper.prices.iter().collect();
            symbols.sort();
            for (symbol, price) in symbols {
                println!("  Price {}: {}", symbol, price);
            }
            println!(
                "  TWAP default interval: {}s",
                config.strategy.default_twap_interval_secs
            );
            println!("  Grid max levels: {}", config.strategy.max_grid_levels);
            println!(
                "  Telemetry: level={}, format={:?}, metrics_port={:?}",
                config.telemetry.log_level,
                config.telemetry.log_format,
                config.telemetry.metrics_port
            );
        }
    }

    Ok(())
}
