//! `benessere-kiosk` -- operator CLI for the campus loyalty program.
//!
//! Runs one customer interaction per invocation against the JSON record
//! store: login, daily challenges, the prize wheel, redemptions, purchases
//! and the leaderboard.
//!
//! # Environment variables
//!
//! | Variable                     | Default             | Description                          |
//! |------------------------------|---------------------|--------------------------------------|
//! | `BENESSERE_DATA_PATH`        | `data/loyalty.json` | Record-store file                    |
//! | `BENESSERE_UTC_OFFSET_HOURS` | `-4`                | Business-day UTC offset              |
//! | `BENESSERE_CHECKIN_CODE`     | `BENESSERE`         | Kiosk check-in code                  |
//! | `BENESSERE_CATALOG_PATH`     | --                  | JSON catalog override                |
//! | `PHOTO_VERIFY_TIMEOUT_SECS`  | `10`                | Photo verification timeout           |

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use benessere_core::photo::PhotoKind;
use benessere_kiosk::config::KioskConfig;
use benessere_kiosk::kiosk::Kiosk;

#[derive(Parser)]
#[command(name = "benessere-kiosk")]
#[command(about = "Benessere campus kiosk - loyalty points, challenges and rewards")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Record-store file (overrides BENESSERE_DATA_PATH)
    #[arg(short, long)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in (creating the account on first use)
    Login {
        handle: String,
        /// Display name, kept from the first login
        #[arg(short, long)]
        name: Option<String>,
        /// Invite code of the friend who referred you
        #[arg(short, long)]
        ref_code: Option<String>,
    },
    /// Show points, today's challenges and wheel availability
    Status { handle: String },
    /// Claim the daily steps challenge
    Steps { handle: String, count: u32 },
    /// Claim the daily water challenge
    Water { handle: String, liters: f64 },
    /// Claim the kiosk check-in
    Checkin { handle: String, code: String },
    /// Claim the gym or food photo challenge
    Photo {
        handle: String,
        /// `gym` or `food`
        kind: String,
        /// Photo file to submit
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Spin the daily prize wheel
    Spin { handle: String },
    /// Exchange points for a catalog item
    Redeem { handle: String, item: String },
    /// Record a purchase (two identical purchases in a row earn a coupon)
    Purchase { handle: String, product: String },
    /// Show the top accounts by points
    Leaderboard {
        #[arg(short, long, default_value_t = 10)]
        top: usize,
    },
    /// Show an account's point history
    History { handle: String },
    /// List wheel prizes and redeemable items
    Catalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "benessere_kiosk=info,benessere_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = KioskConfig::from_env()?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    tracing::debug!(
        data_path = %config.data_path.display(),
        utc_offset_hours = config.utc_offset_hours,
        "Loaded kiosk configuration",
    );

    let kiosk = Kiosk::from_config(&config)?;

    if let Err(e) = run(&kiosk, cli.command).await {
        // Business-rule rejections are normal outcomes for the customer.
        match e.downcast_ref::<benessere_kiosk::error::KioskError>() {
            Some(k) if k.is_business_rule() => {
                println!("✗ {k}");
                std::process::exit(2);
            }
            _ => return Err(e),
        }
    }
    Ok(())
}

async fn run(kiosk: &Kiosk, command: Commands) -> Result<()> {
    match command {
        Commands::Login {
            handle,
            name,
            ref_code,
        } => {
            let outcome = kiosk.login(&handle, name.as_deref(), ref_code.as_deref())?;
            let s = &outcome.summary;
            println!("Welcome, {}! You have {} points.", s.name, s.points);
            println!("Your invite code: {}", s.ref_code);
            if outcome.referred_by.is_some() {
                println!("Referral applied: +50 points for you and your friend.");
            }
        }
        Commands::Status { handle } => {
            let s = kiosk.status(&handle)?;
            println!("{} ({}) - {} points", s.name, s.ref_code, s.points);
            let mark = |done: bool| if done { "done" } else { "pending" };
            println!("  steps:      {}", mark(s.today.steps_done));
            println!("  water:      {}", mark(s.today.water_done));
            println!("  check-in:   {}", mark(s.today.checkin_done));
            println!("  gym photo:  {}", mark(s.today.gym_photo_done));
            println!("  food photo: {}", mark(s.today.food_photo_done));
            println!("  wheel:      {}", if s.can_spin { "available" } else { "used today" });
            println!("  coupons:    {}", s.coupon_count);
        }
        Commands::Steps { handle, count } => {
            let balance = kiosk.claim_steps(&handle, count)?;
            println!("✓ Steps challenge complete. Balance: {balance}");
        }
        Commands::Water { handle, liters } => {
            let balance = kiosk.claim_water(&handle, liters)?;
            println!("✓ Water challenge complete. Balance: {balance}");
        }
        Commands::Checkin { handle, code } => {
            let balance = kiosk.claim_checkin(&handle, &code)?;
            println!("✓ Checked in. Balance: {balance}");
        }
        Commands::Photo { handle, kind, file } => {
            let kind = PhotoKind::from_name(&kind)
                .with_context(|| format!("Unknown photo challenge '{kind}', expected gym or food"))?;
            let photo = match file {
                Some(path) => Some(
                    std::fs::read(&path)
                        .with_context(|| format!("Failed to read photo {}", path.display()))?,
                ),
                None => None,
            };
            let balance = kiosk.claim_photo(&handle, kind, photo.as_deref()).await?;
            println!("✓ {} challenge complete. Balance: {balance}", kind.as_str());
        }
        Commands::Spin { handle } => {
            let prize = kiosk.spin(&handle)?;
            println!("🎡 {}", prize.label);
            if let Some(code) = prize.coupon {
                println!("Coupon: {code}");
            }
        }
        Commands::Redeem { handle, item } => {
            let code = kiosk.redeem(&handle, &item)?;
            println!("✓ Redeemed {item}. Show this coupon at the kiosk: {code}");
        }
        Commands::Purchase { handle, product } => match kiosk.purchase(&handle, &product)? {
            Some(code) => println!("🔥 Streak bonus! Coupon: {code}"),
            None => println!("✓ Purchase recorded."),
        },
        Commands::Leaderboard { top } => {
            for row in kiosk.leaderboard(top)? {
                println!("{:>3}. {:<24} {:>6}", row.rank, row.name, row.points);
            }
        }
        Commands::History { handle } => {
            for entry in kiosk.history(&handle)? {
                println!(
                    "{}  {:>+6}  {}",
                    entry.ts.format("%Y-%m-%d %H:%M"),
                    entry.delta,
                    entry.reason
                );
            }
        }
        Commands::Catalog => {
            let catalog = kiosk.catalog();
            println!("Wheel prizes:");
            for r in &catalog.spin_rewards {
                println!("  {:<24} weight {}", r.label, r.weight);
            }
            println!("Redeemable items:");
            for item in &catalog.redeem_items {
                println!("  {:<24} {:>5} pts", item.name, item.cost);
            }
        }
    }
    Ok(())
}
