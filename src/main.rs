// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::path::PathBuf;

// Use library instead of local modules
use sales_bands::db::reset_database;
use sales_bands::report::{render_text, write_csv};
use sales_bands::{
    build_report, create_dummy_sales, parse_period_bound, AppConfig, BandingConfig,
    PriceBandReport, SqliteStore,
};

#[derive(Parser)]
#[command(name = "sales-bands", version, about = "Book sales by price band and genre")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "SALES_BANDS_DB", global = true)]
    db: Option<PathBuf>,

    /// JSON config file (database_path, banding.rounding_unit, banding.max_num_bands)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the schema
    Init {
        /// Drop existing tables first
        #[arg(long)]
        reset: bool,
    },
    /// Generate dummy genres, books and sales
    Seed {
        #[command(flatten)]
        period: PeriodArgs,

        /// RNG seed, for repeatable data
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
    /// Print sales by price band and genre
    Report {
        #[command(flatten)]
        period: PeriodArgs,

        #[command(flatten)]
        banding: BandingArgs,

        /// Emit CSV instead of text
        #[arg(long)]
        csv: bool,

        /// Run the whole pipeline inside SQLite
        #[arg(long)]
        sql: bool,
    },
    /// Browse the report in the terminal
    #[cfg(feature = "tui")]
    Ui {
        #[command(flatten)]
        period: PeriodArgs,

        #[command(flatten)]
        banding: BandingArgs,
    },
}

#[derive(Args)]
struct PeriodArgs {
    /// First day (YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS"), inclusive
    #[arg(long, default_value = "2016-01-01")]
    from: String,

    /// Last day, inclusive
    #[arg(long, default_value = "2016-12-31")]
    to: String,
}

impl PeriodArgs {
    fn bounds(&self) -> Result<(chrono::NaiveDateTime, chrono::NaiveDateTime)> {
        let start = parse_period_bound(&self.from, false).context("Invalid --from")?;
        let end = parse_period_bound(&self.to, true).context("Invalid --to")?;
        Ok((start, end))
    }
}

#[derive(Args)]
struct BandingArgs {
    /// Band widths are rounded up to a multiple of this (pence)
    #[arg(long)]
    rounding_unit: Option<i64>,

    /// Maximum number of bands
    #[arg(long)]
    max_bands: Option<i64>,
}

impl BandingArgs {
    fn resolve(&self, base: &BandingConfig) -> Result<BandingConfig> {
        Ok(base.with_overrides(self.rounding_unit, self.max_bands)?)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.database_path = db.clone();
    }

    match &cli.command {
        Command::Init { reset } => run_init(&config, *reset),
        Command::Seed { period, seed } => run_seed(&config, period, *seed),
        Command::Report {
            period,
            banding,
            csv,
            sql,
        } => run_report(&config, period, banding, *csv, *sql),
        #[cfg(feature = "tui")]
        Command::Ui { period, banding } => run_ui_mode(&config, period, banding),
    }
}

fn run_init(config: &AppConfig, reset: bool) -> Result<()> {
    println!("🔧 Setting up database {:?}...", config.database_path);

    let store = SqliteStore::open(&config.database_path)?;
    if reset {
        reset_database(store.connection())?;
        println!("✓ Dropped and recreated all tables");
    }

    println!("✓ Database initialized with WAL mode");
    Ok(())
}

fn run_seed(config: &AppConfig, period: &PeriodArgs, seed: u64) -> Result<()> {
    let (start, end) = period.bounds()?;
    println!("🌱 Seeding dummy sales between {} and {}", start, end);

    let mut store = SqliteStore::open(&config.database_path)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let summary = store.batch(|s| create_dummy_sales(s, start, end, &mut rng))?;

    println!("✓ {} genres, {} books", summary.genres, summary.books);
    println!(
        "✓ {} transactions, {} book sales",
        summary.transactions, summary.book_sales
    );
    println!("✓ Database now holds {} book sales", store.book_sale_count()?);

    Ok(())
}

fn load_report(
    store: &SqliteStore,
    config: &AppConfig,
    period: &PeriodArgs,
    banding: &BandingArgs,
) -> Result<PriceBandReport> {
    let (start, end) = period.bounds()?;
    let banding = banding.resolve(&config.banding)?;

    build_report(store, start, end, &banding)
        .with_context(|| format!("Failed to compute price bands for {} to {}", start, end))
}

fn run_report(
    config: &AppConfig,
    period: &PeriodArgs,
    banding: &BandingArgs,
    csv: bool,
    sql: bool,
) -> Result<()> {
    let store = SqliteStore::open(&config.database_path)?;
    let genres = store.genre_names()?;

    let rows = if sql {
        let (start, end) = period.bounds()?;
        store.sales_by_price_band(start, end, &banding.resolve(&config.banding)?)?
    } else {
        load_report(&store, config, period, banding)?.rows
    };

    if csv {
        return write_csv(&rows, &genres, io::stdout().lock());
    }

    if rows.is_empty() {
        println!("No sales in this period.");
        return Ok(());
    }

    println!("{}", render_text(&rows, &genres));
    println!();
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig, period: &PeriodArgs, banding: &BandingArgs) -> Result<()> {
    println!("🖥️  Loading price band report...\n");

    let store = SqliteStore::open(&config.database_path)?;
    let report = load_report(&store, config, period, banding)?;
    let genres = store.genre_names()?;

    println!("✓ {} rows from {} sales\n", report.rows.len(), report.sales_in_period);

    let mut app = ui::App::new(report, genres);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}
