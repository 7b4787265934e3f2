use anyhow::{bail, Result};
use clap::Parser;
use shopreport::{
    catalog,
    config::Config,
    logging,
    report::{explore::run_queries, failures},
    source::DataSource,
};
use tracing::info;

/// Run catalog queries and print a preview of each result.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Query names; the exploratory batch when omitted.
    names: Vec<String>,
    /// List every catalog query name and exit.
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    if args.list {
        for name in catalog::names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let config = Config::from_env();
    let ds = DataSource::open(&config)?;

    let names: Vec<String> = if args.names.is_empty() {
        catalog::EXPLORATORY.iter().map(|s| s.to_string()).collect()
    } else {
        args.names
    };
    let outcomes = run_queries(&ds, &names);
    ds.close()?;

    let failed = failures(&outcomes);
    info!(queries = outcomes.len(), failed, "exploration done");
    if failed > 0 {
        bail!("{} of {} queries failed", failed, outcomes.len());
    }
    Ok(())
}
