use clap::{
    Parser,
    Subcommand,
    ValueEnum,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use itertools::Itertools;
use lootcase::{
    App,
    CaseId,
    Catalog,
    EngineConfig,
    ItemId,
    Rarity,
    RngDraws,
    SystemClock,
    storage::{
        JsonFileSnapshotStorage,
        SledSnapshotStorage,
        SnapshotStorage,
    },
};
use rand::rngs::StdRng;
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
    prelude::*,
};

const DEFAULT_DATA_DIR: &str = "~/.lootcase";
const SLED_DIR: &str = "profile.sled";

#[derive(Parser, Debug)]
#[command(version, about = "Open cases, sell and upgrade items", long_about = None)]
struct Args {
    /// Where the profile and logs live
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    data_dir: String,

    /// Engine configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog JSON replacing the built-in cases
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = StorageKind::Json)]
    storage: StorageKind,

    /// Seed the random source for reproducible rolls
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the reveal pause
    #[arg(long)]
    instant: bool,

    /// Mirror logs to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StorageKind {
    Json,
    Sled,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available cases
    Cases,
    /// Show balance, progression and the free case timer
    Status,
    /// List owned items, newest first
    Inventory,
    /// Open one or more cases
    Open {
        case: u32,
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
    /// Claim the free case
    Claim,
    /// Sell an owned item for its value
    Sell { item: u64 },
    /// List upgrade targets for an owned item with their prices
    Targets { item: u64 },
    /// Gamble an owned item for a more valuable one
    Upgrade {
        item: u64,
        target: String,
        #[arg(short, long, default_value_t = 50)]
        chance: u8,
    },
}

fn resolve_data_dir(raw: &str) -> Result<PathBuf> {
    let dir = PathBuf::from(shellexpand::tilde(raw).into_owned());
    fs::create_dir_all(&dir)
        .wrap_err_with(|| format!("Failed to create data directory {}", dir.display()))?;
    Ok(dir)
}

fn init_tracing(log_dir: &Path, verbose: bool) -> WorkerGuard {
    let file_appender = rolling::daily(log_dir, "lootcase.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lootcase=info"));
    let stderr = verbose.then(|| fmt::layer().with_writer(std::io::stderr));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(stderr)
        .init();
    guard
}

fn report(err: anyhow::Error) -> color_eyre::eyre::Report {
    eyre!("{err:#}")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let data_dir = resolve_data_dir(&args.data_dir)?;
    let _log_guard = init_tracing(&data_dir.join("logs"), args.verbose);

    let catalog = match &args.catalog {
        Some(path) => Catalog::load(path),
        None => Catalog::builtin(),
    }
    .map_err(report)?;
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path).map_err(report)?,
        None => EngineConfig::default(),
    };
    if args.instant {
        config = config.instant();
    }
    let draws = match args.seed {
        Some(seed) => RngDraws::seeded(seed),
        None => RngDraws::from_os_rng(),
    };
    tracing::debug!(data_dir = %data_dir.display(), storage = ?args.storage, "starting");

    match args.storage {
        StorageKind::Json => {
            let storage = JsonFileSnapshotStorage::in_dir(&data_dir).map_err(report)?;
            let app = App::load(catalog, config, storage, draws, SystemClock)
                .map_err(report)?;
            run(app, args.command).await
        }
        StorageKind::Sled => {
            let storage =
                SledSnapshotStorage::open(data_dir.join(SLED_DIR)).map_err(report)?;
            let app = App::load(catalog, config, storage, draws, SystemClock)
                .map_err(report)?;
            run(app, args.command).await
        }
    }
}

async fn run<S: SnapshotStorage>(
    mut app: App<S, RngDraws<StdRng>, SystemClock>,
    command: Command,
) -> Result<()> {
    match command {
        Command::Cases => {
            let status = app.free_case_status();
            for case in app.session().catalog().cases() {
                let price = if case.is_free() {
                    if status.ready {
                        "free, ready".to_string()
                    } else {
                        format!("free, ready in {}s", status.remaining_ms.div_ceil(1000))
                    }
                } else {
                    case.price.to_string()
                };
                println!(
                    "[{}] {:<24} {:<10} {:>4} items  {}",
                    case.id,
                    case.name,
                    case.rarity,
                    case.drop_table.len(),
                    price
                );
                let missing = case.drop_table.missing_rarities();
                if !missing.is_empty() {
                    let missing = missing.into_iter().map(Rarity::as_str).join(", ");
                    println!("     no {missing} drops; those rolls pay the first item");
                }
            }
        }
        Command::Status => {
            let ledger = app.session().ledger();
            let inventory = app.session().inventory();
            let status = app.free_case_status();
            println!("balance      {}", ledger.balance);
            println!("level        {} ({}/100 exp)", ledger.level, ledger.exp);
            println!("opened       {}", ledger.total_opened);
            println!("spent        {}", ledger.total_spent);
            println!("won          {}", ledger.total_won);
            println!("net          {}", ledger.net_result());
            println!(
                "inventory    {} items worth {}",
                inventory.len(),
                inventory.total_value()
            );
            let counts = inventory.count_by_rarity();
            for rarity in Rarity::ALL {
                let held = counts.get(&rarity).copied().unwrap_or(0);
                println!("  {rarity:<10} {held}");
            }
            if status.ready {
                println!("free case    ready");
            } else {
                println!(
                    "free case    ready in {}s",
                    status.remaining_ms.div_ceil(1000)
                );
            }
        }
        Command::Inventory => {
            let inventory = app.session().inventory();
            if inventory.is_empty() {
                println!("inventory is empty");
            }
            for item in inventory.newest_first() {
                println!(
                    "{:>6} {:<32} {:<10} {:>6}",
                    item.id.to_string(),
                    item.name(),
                    item.rarity(),
                    item.value()
                );
            }
        }
        Command::Open { case, count } => open(&mut app, CaseId(case), count).await?,
        Command::Claim => {
            let free = app
                .session()
                .catalog()
                .free_case()
                .map(|case| case.id)
                .ok_or_else(|| eyre!("the catalog has no free case"))?;
            open(&mut app, free, 1).await?;
        }
        Command::Sell { item } => {
            let receipt = app.sell_item(ItemId(item))?;
            println!(
                "sold {} {} for {}, balance {}",
                receipt.item.id,
                receipt.item.name(),
                receipt.item.value(),
                receipt.ledger.balance
            );
        }
        Command::Targets { item } => {
            let source = ItemId(item);
            let rules = app.session().config().upgrade.clone();
            let targets = app.upgrade_targets(source)?;
            if targets.is_empty() {
                println!("no upgrade targets for {source}");
            }
            for target in targets {
                println!("{:<32} {:<10} {:>6}", target.name, target.rarity, target.value);
            }
            for chance in rules.chances() {
                println!("{chance:>3}% costs {}", app.upgrade_quote(source, chance)?);
            }
        }
        Command::Upgrade {
            item,
            target,
            chance,
        } => {
            let target = app
                .session()
                .catalog()
                .item_named(&target)
                .cloned()
                .ok_or_else(|| eyre!("no catalog item named {target:?}"))?;
            let receipt = app
                .attempt_upgrade_revealing(ItemId(item), &target, chance, |reveal| {
                    println!(
                        "upgrading {} into {} at {}% for {}...",
                        reveal.source.name(),
                        reveal.target.name,
                        reveal.chance,
                        reveal.cost
                    );
                })
                .await?;
            match receipt.awarded {
                Some(awarded) => println!("success: {} {}", awarded.id, awarded.name()),
                None => println!("failed: {} was lost", receipt.consumed.name()),
            }
            println!("balance {}", receipt.ledger.balance);
        }
    }
    Ok(())
}

async fn open<S: SnapshotStorage>(
    app: &mut App<S, RngDraws<StdRng>, SystemClock>,
    case: CaseId,
    count: u32,
) -> Result<()> {
    let receipt = app
        .open_case_revealing(case, count, |reveal| {
            println!(
                "opening {} x case {} for {}...",
                reveal.count, reveal.case_id, reveal.cost
            );
        })
        .await?;
    for item in &receipt.items {
        println!(
            "{:>6} {:<32} {:<10} {:>6}",
            item.id.to_string(),
            item.name(),
            item.rarity(),
            item.value()
        );
    }
    println!(
        "won {} for {}, balance {}",
        receipt.awarded_value, receipt.cost, receipt.ledger.balance
    );
    if receipt.levels_gained > 0 {
        println!("level up! now level {}", receipt.ledger.level);
    }
    Ok(())
}
