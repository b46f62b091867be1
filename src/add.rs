use chrono::NaiveDateTime;
use clap::Args;
use tracing::info;

use crate::assemble::assemble_transactions;
use crate::model::UserId;
use crate::parsing::parse_command;
use crate::print::print_record;
use crate::store::Ledger;

#[derive(Debug, Args)]
pub struct Command {
    /// The transaction, e.g. `-15.50 USD Groceries` or `+200/4`.
    #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
    pub line: Vec<String>,
    /// Resolve and print without storing anything.
    #[arg(long)]
    pub dry_run: bool,
}

pub fn execute_command(
    store: &mut impl Ledger,
    user: UserId,
    now: NaiveDateTime,
    cmd: &Command,
) -> anyhow::Result<()> {
    let line = cmd.line.join(" ");
    let parsed = parse_command(&line)?;
    let records = assemble_transactions(&*store, &parsed, user, now)?;

    if !cmd.dry_run {
        let ids = store.persist_transactions(records.clone())?;
        info!(%user, ?ids, "added");
    }

    let snapshot = store.snapshot(user)?;
    for record in records.iter() {
        print_record(record, &snapshot);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::at;
    use crate::store::{fixtures, BookStore};
    use anyhow::Result;

    fn command(line: &str, dry_run: bool) -> Command {
        Command {
            line: line.split_whitespace().map(|s| s.to_owned()).collect(),
            dry_run,
        }
    }

    #[test]
    fn test_add_persists_installments() -> Result<()> {
        let mut store = BookStore::in_memory(fixtures::book())?;
        execute_command(&mut store, fixtures::USER, at(2024, 1, 31), &command("+200/4", false))?;
        assert_eq!(store.transactions(fixtures::USER)?.len(), 4);

        Ok(())
    }

    #[test]
    fn test_add_dry_run_stores_nothing() -> Result<()> {
        let mut store = BookStore::in_memory(fixtures::book())?;
        execute_command(
            &mut store,
            fixtures::USER,
            at(2024, 1, 31),
            &command("-15.50 USD Groceries", true),
        )?;
        assert!(store.transactions(fixtures::USER)?.is_empty());

        Ok(())
    }

    #[test]
    fn test_add_failure_stores_nothing() -> Result<()> {
        let mut store = BookStore::in_memory(fixtures::book())?;
        let result = execute_command(
            &mut store,
            fixtures::USER,
            at(2024, 1, 31),
            &command("10 Card nonsense", false),
        );
        assert!(result.is_err());
        assert!(store.transactions(fixtures::USER)?.is_empty());

        Ok(())
    }
}
