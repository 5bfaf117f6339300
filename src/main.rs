//! pos-ledger - command line front end for the order ledger
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────────┐
//! │  Config  │───▶│  Ledger  │───▶│ orders.csv   │
//! │  (YAML)  │    │ (handle) │    │ (data_dir)   │
//! └──────────┘    └──────────┘    └──────────────┘
//! ```
//!
//! Usage:
//!   pos-ledger place --item "Flat white:2:4.35" --item "Croissant:1:2.50"
//!   pos-ledger list --from 2024-01-01 --to 2024-01-31
//!   pos-ledger remove <ORDER_ID> 2024-01-05
//!   pos-ledger report --from 2024-01-01 --to 2024-01-31

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use pos_ledger::report;
use pos_ledger::{Amount, AppConfig, Ledger, LineItem, Order, Quantity};
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(name = "pos-ledger")]
#[command(about = "Record, browse and remove point-of-sale orders")]
struct Args {
    /// Config environment (reads config/<env>.yaml)
    #[arg(long, short, default_value = "dev")]
    env: String,

    /// Override the ledger data directory from the config
    #[arg(long, env = "POS_LEDGER_DATA_DIR")]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a completed order
    Place {
        /// Line item as NAME:QTY:UNIT_PRICE (repeatable)
        #[arg(long = "item", required = true)]
        items: Vec<String>,
    },
    /// List orders, newest first
    List {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Print JSON instead of a table
        #[arg(long, default_value = "false")]
        json: bool,
    },
    /// Print one order as JSON
    Show { order_id: String },
    /// Remove an order (same-day orders only unless --any-day)
    Remove {
        order_id: String,
        date: NaiveDate,
        #[arg(long, default_value = "false")]
        any_day: bool,
    },
    /// Totals for a date range
    Report {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
}

/// Parse `NAME:QTY:UNIT_PRICE`. The name may itself contain ':'.
fn parse_item(raw: &str) -> Result<LineItem> {
    let mut parts = raw.rsplitn(3, ':');
    let (Some(price), Some(qty), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("Item '{}' must look like NAME:QTY:UNIT_PRICE", raw);
    };
    let quantity = qty
        .trim()
        .parse::<Quantity>()
        .with_context(|| format!("Invalid quantity in item '{}'", raw))?;
    let unit_price = Amount::from_str(price.trim())
        .with_context(|| format!("Invalid unit price in item '{}'", raw))?;
    Ok(LineItem::new(name.trim(), quantity, unit_price))
}

fn print_orders(orders: &[Order]) {
    for order in orders {
        println!(
            "{}  {}  {:>10}  ({} items)",
            order.created_at.format("%Y-%m-%d %H:%M:%S"),
            order.id,
            order.total(),
            order.items.len()
        );
        for item in &order.items {
            println!(
                "    {:>3} x {:<24} @ {:>8} = {:>10}",
                item.quantity(),
                item.name,
                item.unit_price(),
                item.line_total()
            );
        }
    }
}

fn run(args: Args, ledger: &Ledger) -> Result<()> {
    match args.command {
        Command::Place { items } => {
            let items = items
                .iter()
                .map(|s| parse_item(s))
                .collect::<Result<Vec<_>>>()?;
            let order = Order::new(items);
            ledger.append(&order)?;
            println!("{}", order.id);
        }
        Command::List { from, to, json } => {
            let orders: Vec<Order> = ledger
                .load_all()?
                .into_iter()
                .filter(|o| from.is_none_or(|d| o.date() >= d))
                .filter(|o| to.is_none_or(|d| o.date() <= d))
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&orders)?);
            } else {
                print_orders(&orders);
            }
        }
        Command::Show { order_id } => match ledger.find(&order_id)? {
            Some(order) => println!("{}", serde_json::to_string_pretty(&order)?),
            None => bail!("Order {} not found", order_id),
        },
        Command::Remove {
            order_id,
            date,
            any_day,
        } => {
            let today = Local::now().date_naive();
            if !any_day && date != today {
                bail!(
                    "Only orders placed today ({}) can be removed; pass --any-day to override",
                    today
                );
            }
            if ledger.remove(&order_id, date)? {
                println!("Removed {}", order_id);
            } else {
                println!("Order {} not found", order_id);
            }
        }
        Command::Report { from, to } => {
            let orders = ledger.load_all()?;
            let summary = report::sum_totals_in_range(&orders, from, to)?;
            for day in report::daily_summaries(&orders, from, to)? {
                println!("{}  {:>4} orders  {:>12}", day.date, day.order_count, day.total);
            }
            println!("Total {} .. {}: {} orders, {}", from, to, summary.count, summary.total);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut app_config = AppConfig::load(&args.env)?;
    if let Some(dir) = &args.data_dir {
        app_config.ledger.data_dir = dir.clone();
    }
    let _log_guard = pos_ledger::logging::init_logging(&app_config);

    let ledger = Ledger::open(&app_config.ledger);
    tracing::info!(env = %args.env, path = %ledger.path().display(), "Using order ledger");

    run(args, &ledger)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item() {
        let item = parse_item("Flat white:2:4.35").unwrap();
        assert_eq!(item.name, "Flat white");
        assert_eq!(item.quantity(), 2);
        assert_eq!(item.unit_price(), Amount::from_str("4.35").unwrap());

        let item = parse_item("Menu: breakfast:1:12").unwrap();
        assert_eq!(item.name, "Menu: breakfast");

        assert!(parse_item("Tea:1").is_err());
        assert!(parse_item("Tea:x:1").is_err());
        assert!(parse_item("Tea:1:free").is_err());
    }
}
