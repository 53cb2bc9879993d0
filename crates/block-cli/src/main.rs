//! `blocks` CLI — manage schedule blocks and check booking conflicts from the
//! command line.
//!
//! ## Usage
//!
//! ```sh
//! # Close the whole shop for a week
//! blocks --tenant shop-1 create --kind vacation --from 2025-06-01 --to 2025-06-05 \
//!     --reason "Summer closing"
//!
//! # Block one barber for an afternoon
//! blocks --tenant shop-1 create --kind other --from 2025-07-01 --staff B1 \
//!     --start-time 14:00 --end-time 16:00 --reason Dentist
//!
//! # Is B1 bookable at 15:00?
//! blocks --tenant shop-1 check 2025-07-01 --time 15:00 --staff B1
//!
//! # Calendar view for June, as JSON
//! blocks --tenant shop-1 --json range 2025-06-01 2025-06-30
//!
//! # Soft delete and restore
//! blocks --tenant shop-1 delete <id>
//! blocks --tenant shop-1 reactivate <id>
//! ```
//!
//! Configuration falls back to the environment: `BLOCKS_STORE`,
//! `BLOCKS_TENANT`, `BLOCKS_KNOWN_TENANTS`, `BLOCKS_ACTOR`. Log verbosity
//! follows `RUST_LOG`.

use std::process::ExitCode;

use anyhow::{Context, Result};
use block_engine::{
    parse_date, parse_time, BlockError, BlockFilter, BlockId, BlockKind, BlockLifecycleManager,
    BlockPatch, BlockRecord, Coverage, ErrorKind, FileBlockRepository, NewBlock, StaffId,
    StaticTenantDirectory,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

type Manager = BlockLifecycleManager<FileBlockRepository, StaticTenantDirectory>;

#[derive(Parser)]
#[command(
    name = "blocks",
    version,
    about = "Manage schedule blocks (vacations, holidays, closures) per tenant"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path of the JSON block store
    #[arg(long, env = "BLOCKS_STORE", default_value = "blocks.json", global = true)]
    store: String,

    /// Tenant (business) every command is scoped to
    #[arg(long, env = "BLOCKS_TENANT", global = true)]
    tenant: Option<String>,

    /// Comma-separated tenants that exist; defaults to the --tenant value
    #[arg(long, env = "BLOCKS_KNOWN_TENANTS", value_delimiter = ',', global = true)]
    known_tenants: Vec<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new block
    Create(CreateArgs),
    /// Change fields of an existing block
    Update(UpdateArgs),
    /// Soft-delete a block (it stays listed as inactive)
    Delete {
        /// Block id
        id: String,
    },
    /// Re-enable a soft-deleted block
    Reactivate {
        /// Block id
        id: String,
    },
    /// Show one block
    Show {
        /// Block id
        id: String,
    },
    /// List the tenant's blocks
    List(ListArgs),
    /// Active blocks overlapping a date range (calendar view)
    Range {
        /// First day (YYYY-MM-DD)
        from: String,
        /// Last day, inclusive (YYYY-MM-DD)
        to: String,
        /// Only this staff member's blocks plus shop-wide blocks
        #[arg(long)]
        staff: Option<String>,
    },
    /// Active blocks on a single day
    On {
        /// Day (YYYY-MM-DD)
        date: String,
        /// Only this staff member's blocks plus shop-wide blocks
        #[arg(long)]
        staff: Option<String>,
    },
    /// Check whether a date (and time) is blocked
    Check {
        /// Day (YYYY-MM-DD)
        date: String,
        /// Time of day (HH:MM); without it the whole day is checked
        #[arg(long)]
        time: Option<String>,
        /// Staff member; without it only shop-wide blocks count
        #[arg(long)]
        staff: Option<String>,
    },
}

#[derive(Args)]
struct CreateArgs {
    /// VACATION, HOLIDAY, EMERGENCY or OTHER
    #[arg(long)]
    kind: String,
    /// First day (YYYY-MM-DD)
    #[arg(long)]
    from: String,
    /// Last day, inclusive (defaults to --from)
    #[arg(long)]
    to: Option<String>,
    /// Restrict the block to one staff member
    #[arg(long)]
    staff: Option<String>,
    /// Start of the daily window (HH:MM); makes the block partial-day
    #[arg(long, requires = "end_time")]
    start_time: Option<String>,
    /// End of the daily window (HH:MM), exclusive
    #[arg(long, requires = "start_time")]
    end_time: Option<String>,
    /// Why the period is closed
    #[arg(long)]
    reason: String,
    /// Actor recorded as the creator
    #[arg(long, env = "BLOCKS_ACTOR", default_value = "cli")]
    created_by: String,
}

#[derive(Args)]
struct UpdateArgs {
    /// Block id
    id: String,
    #[arg(long)]
    kind: Option<String>,
    #[arg(long)]
    from: Option<String>,
    #[arg(long)]
    to: Option<String>,
    /// Assign the block to a staff member
    #[arg(long, conflicts_with = "shop_wide")]
    staff: Option<String>,
    /// Make the block apply to the whole shop
    #[arg(long)]
    shop_wide: bool,
    /// Make the block cover whole days again
    #[arg(long, conflicts_with_all = ["start_time", "end_time"])]
    full_day: bool,
    #[arg(long)]
    start_time: Option<String>,
    #[arg(long)]
    end_time: Option<String>,
    #[arg(long)]
    reason: Option<String>,
}

#[derive(Args)]
struct ListArgs {
    /// Only active blocks
    #[arg(long, conflicts_with = "inactive")]
    active: bool,
    /// Only soft-deleted blocks
    #[arg(long)]
    inactive: bool,
    /// Only blocks of this kind
    #[arg(long)]
    kind: Option<String>,
    /// Only blocks assigned to this staff member
    #[arg(long)]
    staff: Option<String>,
    /// Print only the number of matching blocks
    #[arg(long)]
    count: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Exit status by engine error kind: validation 2, not found 3,
/// tenant isolation 4, anything else 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<BlockError>().map(BlockError::kind) {
        Some(ErrorKind::Validation) => 2,
        Some(ErrorKind::NotFound) => 3,
        Some(ErrorKind::TenantIsolation) => 4,
        Some(ErrorKind::Storage) | None => 1,
    }
}

fn run(cli: Cli) -> Result<()> {
    let tenant = cli.tenant.clone().unwrap_or_default();
    let manager = open_manager(&cli, &tenant)?;
    let json = cli.json;

    match cli.command {
        Commands::Create(args) => {
            let input = new_block(&tenant, args)?;
            let record = manager.create(input)?;
            print_record(&record, json)?;
        }
        Commands::Update(args) => {
            let id = parse_id(&args.id)?;
            let patch = patch(args)?;
            let record = manager.update(&tenant, id, patch)?;
            print_record(&record, json)?;
        }
        Commands::Delete { id } => {
            let id = parse_id(&id)?;
            manager.delete(&tenant, id)?;
            if json {
                println!("{}", serde_json::json!({ "id": id, "active": false }));
            } else {
                println!("deactivated {id}");
            }
        }
        Commands::Reactivate { id } => {
            let record = manager.reactivate(&tenant, parse_id(&id)?)?;
            print_record(&record, json)?;
        }
        Commands::Show { id } => {
            let record = manager.get(&tenant, parse_id(&id)?)?;
            print_record(&record, json)?;
        }
        Commands::List(args) => {
            let count_only = args.count;
            let filter = filter(args)?;
            if count_only {
                let count = manager.count(&tenant, &filter)?;
                if json {
                    println!("{}", serde_json::json!({ "count": count }));
                } else {
                    println!("{count}");
                }
            } else {
                print_records(&manager.list(&tenant, &filter)?, json)?;
            }
        }
        Commands::Range { from, to, staff } => {
            let records = manager.list_by_date_range(
                &tenant,
                date_arg(&from)?,
                date_arg(&to)?,
                staff.as_deref(),
            )?;
            print_records(&records, json)?;
        }
        Commands::On { date, staff } => {
            let records = manager.list_active_on_date(&tenant, date_arg(&date)?, staff.as_deref())?;
            print_records(&records, json)?;
        }
        Commands::Check { date, time, staff } => {
            let time = time.as_deref().map(parse_time).transpose()?;
            let blocking =
                manager.blocking_record(&tenant, staff.as_deref(), date_arg(&date)?, time)?;
            print_check(blocking.as_ref(), json)?;
        }
    }

    Ok(())
}

fn open_manager(cli: &Cli, tenant: &str) -> Result<Manager> {
    let repository = FileBlockRepository::open(&cli.store)
        .with_context(|| format!("Failed to open block store: {}", cli.store))?;
    let tenants = if cli.known_tenants.is_empty() {
        StaticTenantDirectory::new([tenant])
    } else {
        StaticTenantDirectory::new(&cli.known_tenants)
    };
    Ok(BlockLifecycleManager::new(repository, tenants))
}

fn parse_id(raw: &str) -> Result<BlockId> {
    Ok(raw.parse::<BlockId>()?)
}

fn date_arg(raw: &str) -> Result<NaiveDate> {
    Ok(parse_date(raw)?)
}

fn kind_arg(raw: &str) -> Result<BlockKind> {
    Ok(raw.parse::<BlockKind>()?)
}

fn new_block(tenant: &str, args: CreateArgs) -> Result<NewBlock> {
    let start = date_arg(&args.from)?;
    let end = match args.to.as_deref() {
        Some(to) => date_arg(to)?,
        None => start,
    };
    let mut input = NewBlock::full_day(
        tenant,
        kind_arg(&args.kind)?,
        start,
        end,
        args.reason,
        args.created_by,
    );
    input.staff_id = args.staff;
    if let (Some(start_time), Some(end_time)) = (args.start_time, args.end_time) {
        input = input.between(start_time, end_time);
    }
    Ok(input)
}

fn patch(args: UpdateArgs) -> Result<BlockPatch> {
    let staff_id = if args.shop_wide {
        Some(None)
    } else {
        args.staff.map(Some)
    };
    let is_full_day = if args.full_day {
        Some(true)
    } else if args.start_time.is_some() || args.end_time.is_some() {
        Some(false)
    } else {
        None
    };
    Ok(BlockPatch {
        staff_id,
        kind: args.kind.as_deref().map(kind_arg).transpose()?,
        start_date: args.from.as_deref().map(date_arg).transpose()?,
        end_date: args.to.as_deref().map(date_arg).transpose()?,
        is_full_day,
        start_time: args.start_time,
        end_time: args.end_time,
        reason: args.reason,
    })
}

fn filter(args: ListArgs) -> Result<BlockFilter> {
    let active = match (args.active, args.inactive) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    Ok(BlockFilter {
        active,
        kind: args.kind.as_deref().map(kind_arg).transpose()?,
        staff_id: StaffId::from_optional(args.staff.as_deref()),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn describe(record: &BlockRecord) -> String {
    let hours = match record.coverage {
        Coverage::FullDay => "full day".to_string(),
        Coverage::Partial {
            start_time,
            end_time,
        } => format!("{start_time}-{end_time}"),
    };
    let scope = match &record.staff_id {
        Some(staff) => format!("staff {staff}"),
        None => "shop-wide".to_string(),
    };
    let status = if record.active { "active" } else { "inactive" };
    format!(
        "{}  {:<9}  {}..{}  {:<11}  {:<14}  {:<8}  {}",
        record.id,
        record.kind.as_str(),
        record.start_date,
        record.end_date,
        hours,
        scope,
        status,
        record.reason
    )
}

fn print_record(record: &BlockRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        println!("{}", describe(record));
    }
    Ok(())
}

fn print_records(records: &[BlockRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else if records.is_empty() {
        println!("no blocks");
    } else {
        for record in records {
            println!("{}", describe(record));
        }
    }
    Ok(())
}

fn print_check(blocking: Option<&BlockRecord>, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "blocked": blocking.is_some(),
            "block": blocking,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    match blocking {
        Some(record) => {
            println!("blocked");
            println!("{}", describe(record));
        }
        None => println!("open"),
    }
    Ok(())
}
