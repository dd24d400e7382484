//! dashboard: terminal front end over the stock API.
//!
//! Usage:
//!   dashboard trending --limit 10
//!   dashboard trending --provider
//!   dashboard top day_gainers --count 5
//!   dashboard quote AAPL MSFT NVDA
//!   dashboard history AAPL --period 3mo
//!   dashboard watchlist add TSLA
//!   dashboard theme toggle

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_state::{EnvAppearance, FileStore, KeyValueStore, Theme, ThemeStore, WatchlistStore};
use market_core::{history_to_chart, quote_to_stock, quotes_to_stocks, HistoryPeriod, ScreenerType};
use quote_client::{settle_quotes, CancellationToken, QuoteClient};
use trending_ranker::TrendingFeed;

mod config;
mod render;

use config::DashboardConfig;

#[derive(Parser, Debug)]
#[command(name = "dashboard")]
#[command(about = "Trending stocks, quotes and a persistent watchlist", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank the combined screener lists by composite score
    Trending {
        /// Show only the first N ranked stocks
        #[arg(long)]
        limit: Option<usize>,
        /// Show the provider's own trending list, unscored
        #[arg(long)]
        provider: bool,
    },
    /// One screener list as the provider ranks it
    Top {
        #[arg(value_enum, default_value = "most_actives")]
        screener: ScreenerArg,
        #[arg(long, default_value_t = 5)]
        count: u8,
    },
    /// Quotes for several symbols; unavailable ones are listed separately
    Quote {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Price history as chart points
    History {
        symbol: String,
        /// 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd or max
        #[arg(long, default_value = "1mo")]
        period: HistoryPeriod,
    },
    /// Ask the backend for a written briefing on a ticker
    Briefing {
        ticker: String,
        #[arg(long, value_enum, default_value = "most_actives")]
        screener: ScreenerArg,
    },
    /// Manage tracked stocks
    Watchlist {
        #[command(subcommand)]
        action: WatchlistCommands,
    },
    /// Show or change the colour theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeCommands>,
    },
}

#[derive(Subcommand, Debug)]
enum WatchlistCommands {
    /// Snapshot a ticker's current quote into the watchlist
    Add { ticker: String },
    /// Stop tracking a symbol
    Remove { symbol: String },
    /// Tracked stocks in insertion order
    List,
}

#[derive(Subcommand, Debug)]
enum ThemeCommands {
    Show,
    Toggle,
    Set {
        #[arg(value_enum)]
        theme: ThemeArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[value(rename_all = "snake_case")]
enum ScreenerArg {
    MostActives,
    DayGainers,
    DayLosers,
}

impl From<ScreenerArg> for ScreenerType {
    fn from(arg: ScreenerArg) -> Self {
        match arg {
            ScreenerArg::MostActives => ScreenerType::MostActives,
            ScreenerArg::DayGainers => ScreenerType::DayGainers,
            ScreenerArg::DayLosers => ScreenerType::DayLosers,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = DashboardConfig::from_env()?;
    tracing::debug!(
        "API {} state dir {}",
        config.client.base_url,
        config.state_dir.display()
    );

    let client = Arc::new(QuoteClient::new(&config.client).context("Failed to build quote client")?);
    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.state_dir.clone()));

    match cli.command {
        Commands::Trending {
            limit,
            provider: true,
        } => {
            let mut quotes = client
                .fetch_trending()
                .await
                .context("Could not load trending stocks, try again")?;
            if let Some(limit) = limit {
                quotes.truncate(limit);
            }
            println!("{}", render::stock_table(&quotes_to_stocks(&quotes)));
        }
        Commands::Trending {
            limit,
            provider: false,
        } => {
            let feed = TrendingFeed::new(Arc::clone(&client)).with_list_size(config.trending_count);
            let ranked = feed
                .refresh(limit)
                .await
                .context("Could not load trending stocks, try again")?;
            println!("{}", render::stock_table(&ranked));
        }
        Commands::Top { screener, count } => {
            let screener = ScreenerType::from(screener);
            let mut ranked = client.fetch_top_stocks(screener, count).await?;
            ranked.sort_by_key(|r| r.rank);
            let stocks: Vec<_> = ranked.iter().map(|r| quote_to_stock(&r.quote, r.rank)).collect();
            println!("{}\n{}", screener.title(), render::stock_table(&stocks));
        }
        Commands::Quote { symbols } => {
            let symbols: Vec<String> = symbols.iter().map(|s| s.to_ascii_uppercase()).collect();

            // Ctrl-C abandons whatever is still in flight
            let cancel = CancellationToken::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    trigger.cancel();
                }
            });

            let outcomes = settle_quotes(client.as_ref(), &symbols, Some(&cancel)).await;
            let mut quotes = Vec::new();
            let mut unavailable = Vec::new();
            for outcome in outcomes {
                match outcome.result {
                    Ok(quote) => quotes.push(quote),
                    Err(e) => {
                        tracing::debug!("{} unavailable: {}", outcome.symbol, e);
                        unavailable.push(outcome.symbol);
                    }
                }
            }

            println!("{}", render::stock_table(&quotes_to_stocks(&quotes)));
            if !unavailable.is_empty() {
                println!("unavailable: {}", unavailable.join(", "));
            }
        }
        Commands::History { symbol, period } => {
            let symbol = symbol.to_ascii_uppercase();
            let history = client.fetch_history(&symbol, period).await?;
            let points = history_to_chart(&history);
            println!("{} {} ({} points)", history.symbol, history.period, points.len());
            println!("{}", render::chart_table(&points));
        }
        Commands::Briefing { ticker, screener } => {
            let response = client
                .generate_briefing(&ticker, screener.into())
                .await
                .context("Briefing generation failed")?;
            println!("{}", render::briefing(&response));
        }
        Commands::Watchlist { action } => {
            let mut watchlist = WatchlistStore::init(storage);
            match action {
                WatchlistCommands::Add { ticker } => {
                    let quote = client
                        .fetch_stock_by_ticker(&ticker)
                        .await
                        .with_context(|| format!("Could not look up {}", ticker))?;
                    let stock = quote_to_stock(&quote, 0);
                    let symbol = stock.symbol.clone();
                    if watchlist.add(stock) {
                        println!("Added {}", symbol);
                    } else {
                        println!("{} is already on the watchlist", symbol);
                    }
                }
                WatchlistCommands::Remove { symbol } => {
                    let symbol = symbol.to_ascii_uppercase();
                    if watchlist.remove(&symbol) {
                        println!("Removed {}", symbol);
                    } else {
                        println!("{} is not on the watchlist", symbol);
                    }
                }
                WatchlistCommands::List => {
                    println!("{}", render::stock_table(&render::numbered(watchlist.list())));
                }
            }
        }
        Commands::Theme { action } => {
            let mut themes = ThemeStore::init(storage, &EnvAppearance::from_env());
            match action.unwrap_or(ThemeCommands::Show) {
                ThemeCommands::Show => {
                    let origin = if themes.is_explicit() { "saved" } else { "system" };
                    println!("{} ({})", themes.theme(), origin);
                }
                ThemeCommands::Toggle => println!("{}", themes.toggle()),
                ThemeCommands::Set { theme } => {
                    let theme = Theme::from(theme);
                    themes.set(theme);
                    println!("{}", theme);
                }
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // logs go to stderr so command output stays pipeable
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
