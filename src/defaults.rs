use clap::{Args, Subcommand};
use tracing::info;

use crate::error::Result;
use crate::model::{AliasTarget, EntityKind, UserId};
use crate::store::{Book, BookStore};

#[derive(Debug, Args)]
pub struct Command {
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Debug, Subcommand)]
pub enum Action {
    Show,
    /// Used whenever a line leaves that role out, e.g. `default set storage Wallet`.
    Set { kind: EntityKind, name: String },
}

pub fn format_defaults(book: &Book, user: UserId) -> Result<Vec<String>> {
    let defaults = book.user(user)?.defaults;
    let roles = [
        (EntityKind::Currency, defaults.currency.map(AliasTarget::Currency)),
        (EntityKind::Storage, defaults.storage.map(AliasTarget::Storage)),
        (EntityKind::Category, defaults.category.map(AliasTarget::Category)),
    ];

    Ok(roles
        .iter()
        .map(|(kind, target)| {
            let name = target
                .as_ref()
                .and_then(|t| book.name_of(t))
                .unwrap_or("-");
            format!("{}: {}", kind, name)
        })
        .collect())
}

pub fn execute_command(store: &mut BookStore, user: UserId, cmd: &Command) -> anyhow::Result<()> {
    match &cmd.action {
        Action::Show => {
            for line in format_defaults(store.book(), user)?.iter() {
                println!("{}", line);
            }
        }
        Action::Set { kind, name } => {
            let target = store.edit(|book| book.set_default(user, *kind, name))?;
            info!(%user, ?target, "default set");
            println!(
                "{} {} is now default.",
                kind,
                store.book().name_of(&target).unwrap_or(name)
            );
        }
    }

    Ok(())
}
