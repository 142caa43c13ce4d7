mod config;
mod db;
mod engine;
mod models;
mod run;
mod transfer;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().collect();
    let db_override = config::take_db_flag(&mut args)?;

    if args.len() < 2 {
        run::print_usage();
        return Ok(());
    }

    let db_path = config::get_db_path(db_override)?;
    let db = db::Database::open(&db_path)?;
    run::as_cli(&args, db)
}
