//! TierPrice CLI - Price list tooling for the website backend
//!
//! Commands: tiers, validate, quote, per-seat
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on an invalid table or selection

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use tierprice_core::{
    format_tier_price, per_seat_monthly, validation::Validator, Locale, PricingConfig,
    PricingEngine, PricingError, SeatAllowance, TierPrice,
};

#[derive(Parser)]
#[command(name = "tierprice-cli")]
#[command(about = "TierPrice CLI - two-axis plan pricing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the pricing table (reference table if absent)
    #[arg(short, long, default_value = "config/pricing.json")]
    config: PathBuf,

    /// Display locale for formatted prices (en, de)
    #[arg(short, long, default_value = "en")]
    locale: Locale,
}

#[derive(Subcommand)]
enum Commands {
    /// List axes and plans
    Tiers,

    /// Validate the pricing table
    Validate,

    /// Price all plans for one selection
    Quote {
        /// Data amount tier index
        #[arg(short, long)]
        data_amount: usize,

        /// Perspectives tier index
        #[arg(short, long)]
        perspectives: usize,
    },

    /// Per-seat monthly price for an annual amount
    PerSeat {
        /// Annual price
        #[arg(long)]
        price: u64,

        /// Seat description, e.g. "3 Power-User"
        #[arg(long, default_value = "1")]
        seats: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(out) => println!("{}", out),
        Err(e) => eprintln!("failed to render output: {}", e),
    }
}

fn error_json(e: &PricingError) -> serde_json::Value {
    serde_json::json!({ "success": false, "error": e.to_string() })
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = match PricingConfig::load_or_reference(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            print_json(&error_json(&e));
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Tiers => {
            print_json(&serde_json::json!({
                "configVersion": config.config_version,
                "currency": config.currency,
                "dataAmount": config.data_amount,
                "perspectives": config.perspectives,
                "products": config.products,
            }));
            ExitCode::SUCCESS
        }

        Commands::Validate => {
            let result = Validator::new().validate(&config);
            match serde_json::to_value(&result) {
                Ok(v) => print_json(&v),
                Err(e) => print_json(&error_json(&PricingError::from(e))),
            }
            if result.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }

        Commands::Quote { data_amount, perspectives } => {
            let engine = match PricingEngine::new(config) {
                Ok(e) => e,
                Err(e) => {
                    print_json(&error_json(&e));
                    return ExitCode::from(2);
                }
            };

            match engine.quote(data_amount, perspectives) {
                Ok(quote) => {
                    let currency = &quote.currency;
                    let display: serde_json::Map<String, serde_json::Value> = quote
                        .prices
                        .iter()
                        .map(|(tier, price)| {
                            (tier.to_string(), format_tier_price(&price, currency, cli.locale).into())
                        })
                        .collect();
                    print_json(&serde_json::json!({
                        "success": true,
                        "quote": quote,
                        "display": display,
                        "tableWarnings": engine.validation().violations,
                    }));
                    ExitCode::SUCCESS
                }
                Err(e @ PricingError::InvalidSelection { .. }) => {
                    print_json(&error_json(&e));
                    ExitCode::from(2)
                }
                Err(e) => {
                    print_json(&error_json(&e));
                    ExitCode::FAILURE
                }
            }
        }

        Commands::PerSeat { price, seats } => {
            let seats = SeatAllowance::parse(&seats);
            let monthly = per_seat_monthly(TierPrice::Amount(price), seats.count);
            print_json(&serde_json::json!({
                "annual": price,
                "seats": seats,
                "perSeatMonthly": monthly,
                "display": format_tier_price(&monthly, &config.currency, cli.locale),
            }));
            ExitCode::SUCCESS
        }
    }
}
