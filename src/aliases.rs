use clap::{Args, Subcommand};
use tracing::info;

use crate::model::{EntityKind, UserId};
use crate::store::{Book, BookStore};

#[derive(Debug, Args)]
pub struct Command {
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Debug, Subcommand)]
pub enum Action {
    List,
    /// e.g. `alias add category Groceries gr`.
    Add {
        kind: EntityKind,
        target: String,
        name: String,
    },
    Delete {
        name: String,
        #[arg(long)]
        kind: Option<EntityKind>,
    },
}

pub fn format_aliases(book: &Book, user: UserId) -> Vec<String> {
    book.aliases
        .iter()
        .filter(|a| a.user == user)
        .enumerate()
        .map(|(i, alias)| {
            format!(
                "{}. {} ← {} ({})",
                i + 1,
                alias.name,
                book.name_of(&alias.target).unwrap_or("?"),
                alias.target.kind()
            )
        })
        .collect()
}

pub fn execute_command(store: &mut BookStore, user: UserId, cmd: &Command) -> anyhow::Result<()> {
    match &cmd.action {
        Action::List => {
            let lines = format_aliases(store.book(), user);
            if lines.is_empty() {
                println!("No aliases yet.");
            }
            for line in lines.iter() {
                println!("{}", line);
            }
        }
        Action::Add { kind, target, name } => {
            let id = store.edit(|book| book.add_alias(user, *kind, target, name))?;
            info!(%user, %id, "added alias");
            println!("Alias {:?} created.", name);
        }
        Action::Delete { name, kind } => {
            let removed = store.edit(|book| book.remove_alias(user, name, *kind))?;
            info!(%user, id = %removed.id, "deleted alias");
            println!("Alias {:?} deleted.", removed.name);
        }
    }

    Ok(())
}
