use anyhow::Result;
use clap::Parser;
use shopreport::{
    config::Config,
    logging,
    source::{
        demo::{insert_demo_order, DemoOrder},
        DataSource,
    },
};

/// Insert one synthetic order with a single line item, atomically.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value_t = 1)]
    customer_id: i64,
    #[arg(long, default_value_t = 1)]
    product_id: i64,
    #[arg(long, default_value_t = 1)]
    quantity: i64,
    #[arg(long, default_value_t = 100.0)]
    price: f64,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let config = Config::from_env();
    let ds = DataSource::open(&config)?;

    let demo = DemoOrder {
        customer_id: args.customer_id,
        product_id: args.product_id,
        quantity: args.quantity,
        price: args.price,
    };
    let order_id = insert_demo_order(&ds, &demo)?;
    println!("[OK] inserted demo order_id={}", order_id);

    ds.close()
}
