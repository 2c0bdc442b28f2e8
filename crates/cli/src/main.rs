use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};
use olr_core::constants::{DEFAULT_ORDER_TABLE, ORDER_BUSINESS_CODE};
use olr_core::{
    order_timestamp, CoreConfig, LedgerService, QueryOutcome, BUSINESS_MIN_LEN, PRIMARY_MIN_LEN,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "olr")]
#[command(about = "OLR order ledger utilities")]
struct Cli {
    /// Logical order table name
    #[arg(long, global = true, default_value = DEFAULT_ORDER_TABLE)]
    table: String,
    /// Requested length for allocated row ids
    #[arg(long, global = true)]
    min_len: Option<usize>,
    /// Emit results as JSON envelopes
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate primary-series row ids
    NewId {
        /// How many ids to allocate
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// Business code to append to each id
        #[arg(long)]
        code: Option<String>,
    },
    /// Allocate a business-series order reference
    BusinessId {
        /// Business code to stamp
        #[arg(default_value = ORDER_BUSINESS_CODE)]
        code: String,
        /// Requested reference length
        #[arg(long)]
        len: Option<usize>,
    },
    /// Resolve the physical table for an order number
    Table {
        /// Order number with an embedded creation timestamp
        order: String,
    },
    /// Resolve the physical table for a date
    TableAt {
        /// Date as YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS"
        date: String,
    },
    /// List the tables covering a date range
    Tables {
        /// Start date (YYYY-MM-DD)
        start: String,
        /// End date (YYYY-MM-DD)
        end: String,
    },
    /// Show the timestamp embedded in an order number
    Inspect {
        /// Order number to decode
        order: String,
    },
}

/// Accepts a bare date or a date with a time of day.
fn parse_date_input(input: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S").or_else(|_| {
        NaiveDate::parse_from_str(input, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN))
    })
}

fn print_success<T: serde::Serialize>(json: bool, data: T, plain: impl FnOnce(&T)) {
    if json {
        match serde_json::to_string_pretty(&QueryOutcome::success(data)) {
            Ok(body) => println!("{}", body),
            Err(e) => eprintln!("Error encoding JSON: {}", e),
        }
    } else {
        plain(&data);
    }
}

fn print_failure(json: bool, context: &str, message: String) {
    if json {
        match serde_json::to_string_pretty(&QueryOutcome::<()>::failure(message)) {
            Ok(body) => println!("{}", body),
            Err(e) => eprintln!("Error encoding JSON: {}", e),
        }
    } else {
        eprintln!("Error {}: {}", context, message);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("olr=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let cfg = CoreConfig::new(cli.table, cli.min_len.unwrap_or(PRIMARY_MIN_LEN))?;
    let service = LedgerService::new(Arc::new(cfg));

    match cli.command {
        Some(Commands::NewId { count, code }) => {
            let ids: Vec<String> = (0..count)
                .map(|_| match &code {
                    Some(code) => service.key_factory().next_id_with_code(code),
                    None => service.allocate_row_id(),
                })
                .collect();
            print_success(cli.json, ids, |ids| {
                for id in ids {
                    println!("{}", id);
                }
            });
        }
        Some(Commands::BusinessId { code, len }) => {
            let reference = service
                .key_factory()
                .next_business_id(&code, len.unwrap_or(BUSINESS_MIN_LEN));
            print_success(cli.json, reference, |reference| println!("{}", reference));
        }
        Some(Commands::Table { order }) => match service.order_table_for(&order) {
            Ok(table) => print_success(cli.json, table, |table| println!("{}", table)),
            Err(e) => print_failure(cli.json, "resolving table", e.to_string()),
        },
        Some(Commands::TableAt { date }) => match parse_date_input(&date) {
            Ok(at) => {
                let table = service.order_table_on(at);
                print_success(cli.json, table, |table| println!("{}", table));
            }
            Err(e) => print_failure(cli.json, "parsing date", e.to_string()),
        },
        Some(Commands::Tables { start, end }) => {
            let range = NaiveDate::parse_from_str(&start, "%Y-%m-%d")
                .and_then(|s| NaiveDate::parse_from_str(&end, "%Y-%m-%d").map(|e| (s, e)));
            match range {
                Ok((start, end)) => {
                    let names = service.order_tables_between(start, end);
                    print_success(cli.json, names, |names| {
                        for name in names {
                            println!("{}", name);
                        }
                    });
                }
                Err(e) => print_failure(cli.json, "parsing date range", e.to_string()),
            }
        }
        Some(Commands::Inspect { order }) => {
            match order_timestamp(&order, Local::now().naive_local()) {
                Ok(at) => {
                    let table = service.order_table_on(at);
                    let details = serde_json::json!({ "created_at": at, "table": &table });
                    print_success(cli.json, details, |_| {
                        println!("Created: {}", at);
                        println!("Table: {}", table);
                    });
                }
                Err(e) => print_failure(cli.json, "inspecting order number", e.to_string()),
            }
        }
        None => {
            println!("Use 'olr --help' for commands");
        }
    }

    Ok(())
}
