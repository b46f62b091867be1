use chrono::NaiveDateTime;
use clap::Args;

use crate::recurrent::sweep;
use crate::store::Ledger;

#[derive(Debug, Args)]
pub struct Command {
    /// Materialize occurrences up to this time, e.g. `2024-03-15T00:00:00`. Defaults to now.
    #[arg(long)]
    pub horizon: Option<NaiveDateTime>,
}

pub fn execute_command(
    store: &mut impl Ledger,
    now: NaiveDateTime,
    cmd: &Command,
) -> anyhow::Result<()> {
    let generated = sweep(store, cmd.horizon.unwrap_or(now))?;

    println!("Generated {} recurrent transactions.", generated);

    Ok(())
}
