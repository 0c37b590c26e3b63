use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use hima::config::AppConfig;
use hima::dtos::auth_dtos::MotorcycleForm;
use hima::events::{UiEvent, UiEvents};
use hima::handlers::auth::{self, AuthMode};
use hima::handlers::policies::{self, PolicyTab};
use hima::handlers::purchase::PurchaseScreen;
use hima::handlers::{payments, premiums, profile};
use hima::models::premium::Frequency;
use hima::services::hima_api::HttpHimaApi;
use hima::services::storage::FileStore;
use hima::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "hima")]
#[command(version, about = "Micro-insurance for boda boda riders", long_about = None)]
struct Cli {
    /// Session store file (overrides HIMA_STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a one-time password to a phone number
    RequestOtp {
        /// e.g. 0712345678, 712345678 or +254712345678
        phone: String,
    },
    /// Verify the one-time password and start a session
    VerifyOtp {
        phone: String,
        otp: String,
        /// Existing rider; go straight to premiums
        #[arg(long)]
        login: bool,
    },
    /// Register the rider's motorcycle and create their wallet
    Register {
        phone: String,
        #[arg(long, default_value = "motorcycle")]
        kind: String,
        #[arg(long)]
        plate: String,
        /// under50, 50-125, 126-250, 251-500 or over500
        #[arg(long, default_value = "50-125")]
        engine: String,
        #[arg(long, default_value = "")]
        model: String,
        #[arg(long, default_value = "")]
        year: String,
    },
    /// Show the signed-in rider
    Whoami,
    /// List premium plans priced for a billing frequency
    Premiums {
        #[arg(short, long, default_value = "weekly")]
        frequency: Frequency,
    },
    /// Select a plan for purchase
    Select {
        premium_id: String,
        #[arg(short, long, default_value = "weekly")]
        frequency: Frequency,
    },
    /// Buy the selected plan and wait for the M-Pesa payment to settle
    Buy,
    /// List policies
    Policies {
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long, default_value = "all")]
        tab: PolicyTab,
    },
    /// Show payment history
    Payments,
    /// Show loyalty and milestone benefits
    Benefits,
    /// End the session
    Logout,
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting hima client");

    let store = FileStore::open(&config.store_path)
        .with_context(|| format!("opening store {}", config.store_path.display()))?;
    let api = HttpHimaApi::new(config.clone())?;

    let (events, rx) = UiEvents::channel();
    let printer = tokio::spawn(print_events(rx));

    let state = AppState::new(config, Arc::new(api), Arc::new(store), events);
    let result = run(cli.command, state).await;

    // Every sender is gone once `run` returns, which ends the printer.
    printer.await.ok();
    result
}

async fn print_events(mut rx: UnboundedReceiver<UiEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            UiEvent::Notice(notice) => println!("{}", notice),
            UiEvent::Navigate(route) => println!("-> {}", route),
        }
    }
}

async fn run(command: Command, state: AppState) -> anyhow::Result<()> {
    match command {
        Command::RequestOtp { phone } => {
            let msisdn = auth::request_otp(&state, &phone).await?;
            println!("OTP sent to +{}", msisdn);
        }
        Command::VerifyOtp { phone, otp, login } => {
            let mode = if login { AuthMode::Login } else { AuthMode::Signup };
            auth::verify_otp(&state, &phone, &otp, mode).await?;
            println!("Verified");
        }
        Command::Register {
            phone,
            kind,
            plate,
            engine,
            model,
            year,
        } => {
            let form = MotorcycleForm {
                kind,
                model,
                license_plate: plate,
                year,
                engine_capacity: engine,
            };
            let wallet = auth::register_motorcycle(&state, &phone, &form).await?;
            println!("Wallet: {}", wallet);
        }
        Command::Whoami => {
            let profile = profile::fetch_profile(&state).await?;
            println!("Phone:  {}", profile.phone);
            println!("Wallet: {}", profile.wallet_display());
            if let Some(motorcycle) = &profile.motorcycle {
                println!(
                    "Motorcycle: {} {} ({}cc) {}",
                    motorcycle.display_kind(),
                    motorcycle.model,
                    motorcycle.engine_capacity,
                    motorcycle.license_plate
                );
            }
        }
        Command::Premiums { frequency } => {
            for quote in premiums::list_premiums(&state, frequency).await? {
                print!(
                    "{:<16} {:<24} KES {} {}",
                    quote.premium.id,
                    quote.premium.name,
                    quote.price,
                    frequency.per_unit()
                );
                match quote.savings_badge() {
                    Some(badge) => println!("  ({})", badge),
                    None => println!(),
                }
            }
        }
        Command::Select {
            premium_id,
            frequency,
        } => {
            let selected = premiums::select_premium_by_id(&state, &premium_id, frequency).await?;
            println!("Selected {} at KES {} ({})", selected.name, selected.price, selected.period);
        }
        Command::Buy => {
            let Some(screen) = PurchaseScreen::open(state).await? else {
                return Ok(());
            };
            let cancel = screen.cancel_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            });
            let confirmation = screen.buy().await?;
            if let Some(link) = &confirmation.policy.explorer_link {
                println!("Receipt: {}", link);
            }
        }
        Command::Policies { search, tab } => {
            for view in policies::list_policies(&state, search.as_deref(), tab)? {
                println!(
                    "{:<12} {:<20} {:<14} {:<8} KES {:>8.2}  cover {:>7}  expires {}",
                    view.record.id,
                    view.record.name,
                    view.kind,
                    view.status,
                    view.record.price,
                    view.coverage_amount,
                    view.expiry_date.format("%Y-%m-%d")
                );
            }
        }
        Command::Payments => {
            for payment in payments::payment_history(&state)? {
                println!(
                    "{}  {:<20} KES {:>8.2}  {:?}  {}",
                    payment.date.format("%Y-%m-%d %H:%M"),
                    payment.policy_name,
                    payment.amount,
                    payment.status,
                    payment.method
                );
            }
        }
        Command::Benefits => {
            let stats = payments::benefits(&state)?;
            println!("Total paid:          KES {:.2}", stats.total_paid);
            println!("Long-term savings:   KES {:.2}", stats.savings_from_long_term);
            println!("Loyalty bonus:       KES {:.2}", stats.loyalty_bonus);
            println!("Coverage increase:   {}%", stats.coverage_increase);
            println!(
                "Next milestone:      KES {:.0} ({:.0}%), {}",
                stats.next_milestone.amount,
                stats.next_milestone.progress,
                stats.next_milestone.benefit
            );
        }
        Command::Logout => {
            auth::logout(&state).await?;
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&state.config.get_config_info())?);
        }
    }
    Ok(())
}
