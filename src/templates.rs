use chrono::NaiveDateTime;
use clap::{Args, Subcommand};

use crate::error::Error;
use crate::model::{AliasTarget, EntityKind, RecurrentTemplate, TemplateId, UserId};
use crate::parsing::{parse_amount, parse_period};
use crate::print::format_template;
use crate::recurrent::{delete_template, edit_template, TemplateEdit};
use crate::resolve::{resolve, Snapshot};
use crate::store::Ledger;

#[derive(Debug, Args)]
pub struct Command {
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Debug, Subcommand)]
pub enum Action {
    List,
    /// Changes a recurrent transaction after catching it up to now.
    Edit {
        id: u32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<String>,
        /// e.g. `1month` or `2weeks`.
        #[arg(long)]
        every: Option<String>,
        #[arg(long)]
        storage: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        currency: Option<String>,
    },
    /// Catches a recurrent transaction up to now and removes it.
    Delete { id: u32 },
}

fn owned_template(
    store: &impl Ledger,
    user: UserId,
    id: TemplateId,
) -> crate::error::Result<RecurrentTemplate> {
    let template = store.template(id)?;
    if template.user != user {
        return Err(Error::UnknownTemplate(id));
    }
    Ok(template)
}

fn lookup<T>(
    snapshot: &Snapshot,
    text: Option<&str>,
    kind: EntityKind,
    user: UserId,
    pick: impl Fn(&AliasTarget) -> Option<T>,
) -> crate::error::Result<Option<T>> {
    let Some(text) = text else {
        return Ok(None);
    };

    resolve(snapshot, text, kind, user)
        .and_then(|target| pick(&target))
        .map(Some)
        .ok_or_else(|| Error::UnresolvedParameter {
            text: text.to_owned(),
            tried: vec![kind],
        })
}

pub fn execute_command(
    store: &mut impl Ledger,
    user: UserId,
    now: NaiveDateTime,
    cmd: &Command,
) -> anyhow::Result<()> {
    let snapshot = store.snapshot(user)?;

    match &cmd.action {
        Action::List => {
            let templates = store
                .templates()?
                .into_iter()
                .filter(|t| t.user == user)
                .collect::<Vec<_>>();

            if templates.is_empty() {
                println!("No recurrent transactions yet.");
            }

            for template in templates.iter() {
                println!("{}", format_template(template, &snapshot));
            }
        }
        Action::Edit {
            id,
            name,
            amount,
            every,
            storage,
            category,
            currency,
        } => {
            let id = owned_template(&*store, user, TemplateId(*id))?.id;

            let edit = TemplateEdit {
                name: name.clone(),
                amount: amount.as_deref().map(parse_amount).transpose()?,
                period: every.as_deref().map(parse_period).transpose()?,
                storage: lookup(
                    &snapshot,
                    storage.as_deref(),
                    EntityKind::Storage,
                    user,
                    |t| t.storage(),
                )?,
                category: lookup(
                    &snapshot,
                    category.as_deref(),
                    EntityKind::Category,
                    user,
                    |t| t.category(),
                )?,
                currency: lookup(
                    &snapshot,
                    currency.as_deref(),
                    EntityKind::Currency,
                    user,
                    |t| t.currency(),
                )?,
            };

            let edited = edit_template(store, id, edit, now)?;
            println!("{}", format_template(&edited, &snapshot));
        }
        Action::Delete { id } => {
            let id = owned_template(&*store, user, TemplateId(*id))?.id;
            let removed = delete_template(store, id, now)?;
            println!("Deleted {}.", removed.name);
        }
    }

    Ok(())
}
