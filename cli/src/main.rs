//! courseindex CLI — inspect pipeline state and event selectors.
//!
//! Usage:
//! ```bash
//! courseindex info
//! courseindex selectors
//! courseindex cursor --db ./courseindex.db --id courseindex
//! courseindex init-config courseindex.json
//! ```

use std::env;
use std::process;

use courseindex_core::EventKind;
use courseindex_pipeline::PipelineConfig;
use courseindex_store::{CourseStore, SqliteStore};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "info" => {
            cmd_info();
            Ok(())
        }
        "selectors" => {
            cmd_selectors();
            Ok(())
        }
        "cursor" => cmd_cursor(&args[2..]).await,
        "init-config" => cmd_init_config(&args[2..]),
        "version" | "--version" | "-V" => {
            println!("courseindex {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("courseindex {}", env!("CARGO_PKG_VERSION"));
    println!("Course-registry event pipeline for Starknet contracts\n");
    println!("USAGE:");
    println!("    courseindex <COMMAND>\n");
    println!("COMMANDS:");
    println!("    info                     Show pipeline defaults");
    println!("    selectors                Print the event selector table");
    println!("    cursor --db <PATH> [--id <ID>]");
    println!("                             Show the stored cursor of a pipeline");
    println!("    init-config <PATH>       Write a default configuration file");
    println!("    version                  Print version");
    println!("    help                     Print this help");
}

fn cmd_info() {
    let config = PipelineConfig::default();
    println!("CourseIndex v{}", env!("CARGO_PKG_VERSION"));
    println!("  Contract:       {}", config.contract_address);
    println!("  Starting block: {}", config.starting_block);
    println!("  Database:       {}", config.database_url);
    println!("  Event kinds:    {}", EventKind::ALL.len());
    println!("  Storage backends: SQLite, PostgreSQL (feature: postgres)");
}

fn cmd_selectors() {
    for kind in EventKind::ALL {
        println!("{:<66}  {}", kind.selector(), kind.name());
    }
}

async fn cmd_cursor(args: &[String]) -> Result<(), String> {
    let db = flag_value(args, "--db").ok_or("cursor requires --db <PATH>")?;
    let id = flag_value(args, "--id").unwrap_or_else(|| "courseindex".to_string());

    let store = SqliteStore::open(&db).await.map_err(|e| e.to_string())?;
    match store.load_cursor(&id).await.map_err(|e| e.to_string())? {
        Some(cursor) => {
            println!("pipeline:   {id}");
            println!("order_key:  {}", cursor.order_key);
            println!("unique_key: {}", cursor.unique_key);
        }
        None => println!("No cursor stored for pipeline '{id}'"),
    }
    store.close().await;
    Ok(())
}

fn cmd_init_config(args: &[String]) -> Result<(), String> {
    let path = args.first().ok_or("init-config requires a target path")?;
    let config = PipelineConfig::default();
    let json = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
    std::fs::write(path, json + "\n").map_err(|e| e.to_string())?;
    println!("Wrote default configuration to {path}");
    Ok(())
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
