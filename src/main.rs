//! Binary entrypoint for the luxhouse operator CLI.
//!
//! Commands:
//! - `init` - create a starter `config.toml`
//! - `houses` - list the house catalog
//! - `players` - list players holding a house record
//! - `status --player <name> --house <id>` - show a player's lease on a house
//! - `buy --player <name> --house <id> --funds <n>` - buy a house with the given funds
//! - `pay --player <name> --house <id> --days <n> --funds <n>` - prepay fees (capped)
//! - `exit-check --player <name> --house <id> --funds <n>` - run the guarded exit check
//! - `depart` / `return` - hub travel using the last house visited
//! - `last-house --player <name> [--set <value>]` - read or write the scratch slot
//!
//! The CLI stands in for the game host: `--funds` seeds a purse for the call and the
//! resulting balance is printed instead of being written back anywhere.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use luxhouse::config::Config;
use luxhouse::housing::{
    buy_house, check_exit_fees, depart_to_hub, leave_house, prepay_fees, return_from_hub,
    CoinPurse, FeeCheck, HouseCatalog, LeaseStore, Ledger, Prepay, Purchase, Purse, SystemClock,
    PLAYER_INFO_TAG,
};

#[derive(Parser)]
#[command(name = "luxhouse")]
#[command(about = "Luxury house leases and occupancy fees")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// List the houses in the catalog
    Houses,
    /// List players holding a house record
    Players,
    /// Show a player's lease on a house
    Status {
        #[arg(short, long)]
        player: String,
        #[arg(long)]
        house: String,
    },
    /// Buy a house
    Buy {
        #[arg(short, long)]
        player: String,
        #[arg(long)]
        house: String,
        /// Money the player has available
        #[arg(short, long)]
        funds: i64,
    },
    /// Prepay fees, capped at the house's maximum prepaid days
    Pay {
        #[arg(short, long)]
        player: String,
        #[arg(long)]
        house: String,
        #[arg(short, long)]
        days: u32,
        #[arg(short, long)]
        funds: i64,
    },
    /// Run the fee check performed by guarded house exits
    ExitCheck {
        #[arg(short, long)]
        player: String,
        #[arg(long)]
        house: String,
        #[arg(short, long)]
        funds: i64,
    },
    /// Leave a house for the hub, remembering the house
    Depart {
        #[arg(short, long)]
        player: String,
        #[arg(long)]
        house: String,
    },
    /// Return from the hub to the house last left
    Return {
        #[arg(short, long)]
        player: String,
    },
    /// Read or overwrite the last house visited
    LastHouse {
        #[arg(short, long)]
        player: String,
        #[arg(long)]
        set: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        info!("Initializing new luxhouse configuration");
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let config = Config::load(&cli.config).await?;
    init_logging(&Some(config.clone()), cli.verbose);
    let catalog = config.catalog()?;

    if let Commands::Houses = cli.command {
        print_catalog(&catalog);
        return Ok(());
    }

    let store = LeaseStore::open(config.store_path())?;
    let clock = SystemClock;

    match cli.command {
        Commands::Init | Commands::Houses => {}
        Commands::Players => {
            let players = store.list_players(PLAYER_INFO_TAG)?;
            if players.is_empty() {
                println!("No house records.");
            }
            for player in players {
                let mut ledger = Ledger::new(&catalog, &store, &clock, &player, "");
                let owned: Vec<_> = ledger
                    .owned_houses()?
                    .iter()
                    .map(|h| h.house_id.clone())
                    .collect();
                println!("{:<16} {}", player, owned.join(", "));
            }
        }
        Commands::Status { player, house } => {
            let mut ledger = Ledger::new(&catalog, &store, &clock, &player, &house);
            let definition = ledger.definition()?;
            println!("{} ({})", definition.display_name, definition.id);
            if !ledger.has_house()? {
                println!("{} does not own this house.", player);
                return Ok(());
            }
            println!(
                "Fees paid until {}",
                ledger.expiry_date_label()?.unwrap_or_default()
            );
            println!("Days left: {}", ledger.days_remaining()?.unwrap_or(0));
            if ledger.is_fee_expired()?.unwrap_or(false) {
                println!("Fees have expired.");
            }
            let owned: Vec<_> = ledger
                .owned_houses()?
                .iter()
                .map(|h| h.house_id.clone())
                .collect();
            println!("Owned houses: {}", owned.join(", "));
        }
        Commands::Buy {
            player,
            house,
            funds,
        } => {
            let mut ledger = Ledger::new(&catalog, &store, &clock, &player, &house);
            let mut purse = CoinPurse::new(funds);
            match buy_house(&mut ledger, &mut purse)? {
                Purchase::AlreadyOwned => println!("{} already owns {}.", player, house),
                Purchase::InsufficientFunds { cost } => {
                    println!("{} costs {}; only {} available.", house, cost, funds)
                }
                Purchase::Bought { cost, .. } => {
                    println!(
                        "Bought {} for {}. Fees paid until {}. Balance {}.",
                        house,
                        cost,
                        ledger.expiry_date_label()?.unwrap_or_default(),
                        purse.balance()
                    );
                    println!("Enter at {}", ledger.definition()?.house_portal);
                }
            }
        }
        Commands::Pay {
            player,
            house,
            days,
            funds,
        } => {
            let mut ledger = Ledger::new(&catalog, &store, &clock, &player, &house);
            let mut purse = CoinPurse::new(funds);
            match prepay_fees(&mut ledger, &mut purse, days)? {
                Prepay::NotOwned => println!("{} does not own {}.", player, house),
                Prepay::CapReached { max_days } => {
                    println!("Already {} days of fees paid in advance.", max_days)
                }
                Prepay::InsufficientFunds { days, cost } => {
                    println!("{} days cost {}; only {} available.", days, cost, funds)
                }
                Prepay::Paid { days, cost } => println!(
                    "Paid {} for {} days. Fees paid until {}. Balance {}.",
                    cost,
                    days,
                    ledger.expiry_date_label()?.unwrap_or_default(),
                    purse.balance()
                ),
            }
        }
        Commands::ExitCheck {
            player,
            house,
            funds,
        } => {
            let mut ledger = Ledger::new(&catalog, &store, &clock, &player, &house);
            let mut purse = CoinPurse::new(funds);
            match check_exit_fees(&mut ledger, &mut purse)? {
                FeeCheck::NotOwned => println!("{} does not own {}.", player, house),
                FeeCheck::Current => {
                    println!("Fees current. Exit to {}", leave_house(&ledger)?)
                }
                FeeCheck::Charged { cost } => println!(
                    "You have paid {} for your daily house fees. Balance {}.",
                    cost,
                    purse.balance()
                ),
                FeeCheck::Unpaid { cost, relocate_to } => println!(
                    "Your prepaid fees have expired and you do not have {} to pay for one more day. Moved to {}.",
                    cost, relocate_to
                ),
            }
        }
        Commands::Depart { player, house } => {
            let mut ledger = Ledger::new(&catalog, &store, &clock, &player, &house);
            println!("Teleport to {}", depart_to_hub(&mut ledger)?);
        }
        Commands::Return { player } => {
            let mut ledger = Ledger::new(&catalog, &store, &clock, &player, "");
            match return_from_hub(&mut ledger)? {
                Some(portal) => println!("Teleport to {} in {}", portal, ledger.house()),
                None => println!("{} has no house to return to.", player),
            }
        }
        Commands::LastHouse { player, set } => {
            let mut ledger = Ledger::new(&catalog, &store, &clock, &player, "");
            match set {
                Some(value) => {
                    if ledger.set_last_house_visited(&value)? {
                        println!("Last house set to {}", value);
                    } else {
                        println!("{} has no house record; nothing stored.", player);
                    }
                }
                None => println!(
                    "{}",
                    ledger
                        .last_house_visited()?
                        .unwrap_or_else(|| "(none)".to_string())
                ),
            }
        }
    }

    Ok(())
}

fn print_catalog(catalog: &HouseCatalog) {
    for house in catalog.definitions() {
        println!(
            "{:<12} {:<24} cost {:>9}  fee/day {:>6}  prepaid {:>3}/{:<3} days",
            house.id,
            house.display_name,
            house.purchase_cost,
            house.daily_fee,
            house.prepaid_days_on_purchase,
            house.max_prepaid_days
        );
    }
    println!("Hub: {}", catalog.hub_waypoint());
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides config
    let base_level = match (verbosity, config) {
        (0, Some(cfg)) => cfg.logging.level_filter(),
        (0, None) => log::LevelFilter::Info,
        (1, _) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });
    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Mirror to the console only when someone is watching it
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
