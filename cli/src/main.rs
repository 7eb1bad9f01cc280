use clap::{Parser, Subcommand};
use std::path::PathBuf;

use finreport::{
    ask_ai::{handle_prompt_request, AskAIRequest, ContextConfig, Language, NarrativeContext},
    charts::{export_charts, indicator_charts, RenderConfig},
    models::{StatementKind, TidyTable},
    services::{ArtifactStore, SheetService},
    utils::{indicators::IndicatorSet, init_logger, parse_iso_date, reshape},
};

#[derive(Parser)]
#[command(name = "finreport")]
#[command(about = "Offline tools for Vietnamese equity reports: statement reshaping, indicators and prompts")]
pub struct Cli {
    /// Directory holding the statement workbooks and reference sheets
    #[arg(long, global = true, default_value = "Data")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reshape the three financial statements of a ticker into year tables
    Reshape {
        #[arg(short, long)]
        ticker: String,
        /// Write the tables as dated CSV artifacts into this directory
        #[arg(long)]
        store_dir: Option<PathBuf>,
    },
    /// Compute technical indicators from the close price sheet
    Indicators {
        #[arg(short, long)]
        ticker: String,
        #[arg(long, default_value = "2023-01-03")]
        start: String,
        #[arg(long, default_value = "2025-03-04")]
        end: String,
        /// Export the indicator charts as SVG into this directory
        #[arg(long)]
        store_dir: Option<PathBuf>,
    },
    /// List tickers whose code or company name starts with the query
    Search {
        query: String,
    },
    /// Print a narrative prompt for a ticker
    Prompt {
        #[arg(short, long)]
        ticker: String,
        /// Template ID (introduction, macro-news, valuation-review, technical-review)
        #[arg(short = 'p', long, default_value = "introduction")]
        template_id: String,
        /// Language for the prompt (en/vn)
        #[arg(short, long, default_value = "vn")]
        language: String,
        /// Trailing trading days of closes to append
        #[arg(long, default_value_t = 0)]
        price_days: usize,
    },
}

fn print_table(title: &str, table: &TidyTable) {
    println!("\n📋 {} ({})", title, table.ticker);
    println!("{}", table.header("Chỉ tiêu").join(" | "));
    for row in &table.rows {
        let cells: Vec<&str> = row.cells.iter().map(|c| c.as_deref().unwrap_or("")).collect();
        println!("{} | {}", row.label, cells.join(" | "));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger()?;

    let cli = Cli::parse();
    let sheets = SheetService::new(&cli.data_dir);

    match cli.command {
        Commands::Reshape { ticker, store_dir } => {
            let ticker = ticker.to_uppercase();
            let store = store_dir.map(ArtifactStore::new).transpose()?;
            for kind in StatementKind::all() {
                let record = sheets.load_wide_record(kind, &ticker)?;
                let table = reshape(&record, kind.line_items());
                print_table(kind.title_vn(), &table);
                if let Some(store) = &store {
                    let path = store.write_statement(&ticker, kind, &table)?;
                    println!("💾 {}", path.display());
                }
            }
        }
        Commands::Indicators {
            ticker,
            start,
            end,
            store_dir,
        } => {
            let ticker = ticker.to_uppercase();
            let points = sheets.close_prices(&ticker, parse_iso_date(&start)?, parse_iso_date(&end)?)?;
            let indicators = IndicatorSet::compute(&points)?;
            if indicators.is_empty() {
                println!("❌ No close prices for {} between {} and {}", ticker, start, end);
                return Ok(());
            }
            println!("📊 {} sessions for {}", indicators.dates.len(), ticker);
            let last = |values: &[Option<f64>]| {
                values
                    .last()
                    .copied()
                    .flatten()
                    .map(|v| format!("{:.3}", v))
                    .unwrap_or_else(|| "-".to_string())
            };
            println!("  SMA20: {}", last(&indicators.sma_short.values));
            println!("  SMA50: {}", last(&indicators.sma_long.values));
            println!("  Bollinger upper: {}", last(&indicators.bollinger.upper));
            println!("  Bollinger lower: {}", last(&indicators.bollinger.lower));
            println!("  RSI14: {}", last(&indicators.rsi.values));
            if let (Some(macd), Some(signal)) = (indicators.macd.macd.last(), indicators.macd.signal.last()) {
                println!("  MACD: {:.3} (signal {:.3})", macd, signal);
            }
            if let Some(dir) = store_dir {
                let store = ArtifactStore::new(dir)?;
                let charts = indicator_charts(&indicators);
                let config = RenderConfig {
                    headless: false,
                    ..RenderConfig::default()
                };
                for path in export_charts(&store, &ticker, &charts, &config)? {
                    println!("💾 {}", path.display());
                }
            }
        }
        Commands::Search { query } => {
            let matches = sheets.search_tickers(&query)?;
            if matches.is_empty() {
                println!("❌ No ticker matches '{}'", query);
            }
            for company in matches {
                println!("{} - {} ({}) - {}", company.ticker, company.company_name, company.exchange, company.icb_level2);
            }
        }
        Commands::Prompt {
            ticker,
            template_id,
            language,
            price_days,
        } => {
            let ticker = ticker.to_uppercase();
            let mut context = NarrativeContext {
                classification: sheets.industry_classification(&ticker).ok().flatten(),
                ..Default::default()
            };
            if price_days > 0 {
                let start = parse_iso_date("2023-01-03")?;
                let end = parse_iso_date("2025-03-04")?;
                context.prices = sheets.close_prices(&ticker, start, end).unwrap_or_default();
            }
            let request = AskAIRequest {
                ticker,
                template_id,
                language: Language::parse(&language),
                config: ContextConfig {
                    price_context_days: price_days,
                    include_company: context.classification.is_some(),
                    include_ratios: false,
                },
            };
            handle_prompt_request(&request, &context)?;
        }
    }

    Ok(())
}
