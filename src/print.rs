use clap::Args;
use colored::Colorize;

use crate::model::*;
use crate::resolve::Snapshot;
use crate::store::Ledger;

#[derive(Debug, Args)]
pub struct Command {
    /// Only show the most recent transactions.
    #[arg(short, long)]
    pub last: Option<usize>,
}

struct Names<'s> {
    symbol: &'s str,
    storage: &'s str,
    category: &'s str,
}

impl<'s> Names<'s> {
    fn lookup(
        snapshot: &'s Snapshot,
        currency: CurrencyId,
        storage: StorageId,
        category: CategoryId,
    ) -> Self {
        Self {
            symbol: snapshot.currency(currency).map_or("?", |c| c.symbol.as_str()),
            storage: snapshot.storage(storage).map_or("?", |s| s.name.as_str()),
            category: snapshot.category(category).map_or("?", |c| c.name.as_str()),
        }
    }
}

pub fn format_record(record: &TransactionRecord, snapshot: &Snapshot) -> String {
    let names = Names::lookup(snapshot, record.currency, record.storage, record.category);
    format!(
        "{} | {} {} | {} | ({})",
        record.timestamp.format("%m.%d %H:%M"),
        record.amount,
        names.symbol,
        names.storage,
        names.category
    )
}

pub fn format_template(template: &RecurrentTemplate, snapshot: &Snapshot) -> String {
    let names = Names::lookup(
        snapshot,
        template.currency,
        template.storage,
        template.category,
    );
    format!(
        "{}. {}: {} {} [{}] | {} | ({}) next {}",
        template.id,
        template.name,
        template.amount,
        names.symbol,
        template.period,
        names.storage,
        names.category,
        template.next_occurrence.format("%Y-%m-%d %H:%M")
    )
}

pub fn print_record(record: &TransactionRecord, snapshot: &Snapshot) {
    let line = format_record(record, snapshot);
    if record.amount.is_negative() {
        println!("{}", line.red());
    } else {
        println!("{}", line.green());
    }
}

pub fn execute_command(store: &impl Ledger, user: UserId, cmd: &Command) -> anyhow::Result<()> {
    let snapshot = store.snapshot(user)?;
    let mut transactions = store.transactions(user)?;
    transactions.sort_by_key(|t| (t.record.timestamp, t.id));

    let skip = cmd
        .last
        .map_or(0, |last| transactions.len().saturating_sub(last));

    if transactions.is_empty() {
        println!("No transactions yet.");
    }

    for tx in transactions.iter().skip(skip) {
        print_record(&tx.record, &snapshot);
    }

    Ok(())
}
