use anyhow::Result;
use clap::Parser;
use shopreport::{
    config::Config,
    logging,
    source::{schema, DataSource},
};

/// Show the tables of the shop database, or the columns of one table.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Describe only this table.
    #[arg(short, long)]
    table: Option<String>,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let config = Config::from_env();
    let ds = DataSource::open(&config)?;

    match args.table {
        Some(table) => {
            let columns = schema::describe_table(&ds, &table)?;
            if columns.is_empty() {
                println!("no table `{}` in schema `{}`", table, ds.default_schema());
            } else {
                columns.preview(usize::MAX).printstd();
            }
        }
        None => schema::print_schema(&ds)?,
    }

    ds.close()
}
