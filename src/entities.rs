use clap::{Args, Subcommand};
use tracing::info;

use crate::model::{AliasTarget, EntityKind, UserId};
use crate::store::{Book, BookStore};

#[derive(Debug, Args)]
pub struct Command {
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Debug, Subcommand)]
pub enum Action {
    List,
    Add {
        name: String,
    },
    Rename {
        name: String,
        new_name: String,
    },
    /// Refused while any transaction or recurrent transaction uses it.
    Delete {
        name: String,
    },
}

pub fn format_entities(book: &Book, user: UserId, kind: EntityKind) -> Vec<String> {
    let defaults = book.user(user).map(|u| u.defaults).unwrap_or_default();
    let entries: Vec<(AliasTarget, &str)> = match kind {
        EntityKind::Currency => book
            .currencies
            .iter()
            .map(|c| (AliasTarget::Currency(c.id), c.alpha_code.as_str()))
            .collect(),
        EntityKind::Storage => book
            .storages
            .iter()
            .filter(|s| s.user == user)
            .map(|s| (AliasTarget::Storage(s.id), s.name.as_str()))
            .collect(),
        EntityKind::Category => book
            .categories
            .iter()
            .filter(|c| c.user == user)
            .map(|c| (AliasTarget::Category(c.id), c.name.as_str()))
            .collect(),
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(i, (target, name))| {
            let default = match target {
                AliasTarget::Currency(id) => defaults.currency == Some(id),
                AliasTarget::Storage(id) => defaults.storage == Some(id),
                AliasTarget::Category(id) => defaults.category == Some(id),
            };
            format!(
                "{}. {}{}",
                i + 1,
                name,
                if default { " [default]" } else { "" }
            )
        })
        .collect()
}

pub fn execute_command(
    store: &mut BookStore,
    user: UserId,
    kind: EntityKind,
    cmd: &Command,
) -> anyhow::Result<()> {
    match &cmd.action {
        Action::List => {
            let lines = format_entities(store.book(), user, kind);
            if lines.is_empty() {
                println!("No {} entries yet.", kind);
            }
            for line in lines.iter() {
                println!("{}", line);
            }
        }
        Action::Add { name } => {
            let added = store.edit(|book| book.add_entity(user, kind, name))?;
            info!(%user, ?added, "added");
            println!("Created {} {:?}.", kind, name);
        }
        Action::Rename { name, new_name } => {
            let renamed = store.edit(|book| book.rename_entity(user, kind, name, new_name))?;
            info!(%user, ?renamed, "renamed");
            println!("Renamed {} {:?} to {:?}.", kind, name, new_name);
        }
        Action::Delete { name } => {
            let removed = store.edit(|book| book.remove_entity(user, kind, name))?;
            info!(%user, ?removed, "deleted");
            println!("Deleted {} {:?}.", kind, name);
        }
    }

    Ok(())
}
