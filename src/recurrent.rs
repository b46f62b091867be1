use chrono::NaiveDateTime;
use tracing::{info, span, Level};

use crate::calendar::advance;
use crate::error::Result;
use crate::model::{
    CategoryId, CurrencyId, MinorUnits, Period, RecurrentTemplate, StorageId, TemplateId,
    TransactionRecord,
};
use crate::store::Ledger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchUp {
    pub occurrences: Vec<NaiveDateTime>,
    pub cursor: NaiveDateTime,
}

impl CatchUp {
    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    pub fn materialize(&self, template: &RecurrentTemplate) -> Vec<TransactionRecord> {
        self.occurrences
            .iter()
            .map(|timestamp| TransactionRecord {
                user: template.user,
                currency: template.currency,
                storage: template.storage,
                category: template.category,
                timestamp: *timestamp,
                amount: template.amount,
                installments: 1,
            })
            .collect()
    }
}

pub fn catch_up(template: &RecurrentTemplate, horizon: NaiveDateTime) -> Result<CatchUp> {
    let mut occurrences = Vec::new();
    let mut cursor = template.next_occurrence;

    while cursor <= horizon {
        occurrences.push(cursor);
        cursor = advance(cursor, &template.period)?;
    }

    Ok(CatchUp {
        occurrences,
        cursor,
    })
}

pub fn catch_up_template(
    store: &mut impl Ledger,
    id: TemplateId,
    horizon: NaiveDateTime,
) -> Result<CatchUp> {
    let template = store.template(id)?;
    let due = catch_up(&template, horizon)?;

    if !due.is_empty() {
        store.advance_cursor(
            id,
            template.next_occurrence,
            due.cursor,
            due.materialize(&template),
        )?;

        info!(%id, name = %template.name, count = due.occurrences.len(), "caught up");
    }

    Ok(due)
}

pub fn sweep(store: &mut impl Ledger, horizon: NaiveDateTime) -> Result<usize> {
    let _span = span!(Level::INFO, "sweep", %horizon).entered();

    let mut generated = 0;
    for template in store.templates()? {
        generated += catch_up_template(store, template.id, horizon)?
            .occurrences
            .len();
    }

    info!(generated, "swept");

    Ok(generated)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateEdit {
    pub name: Option<String>,
    pub amount: Option<MinorUnits>,
    pub period: Option<Period>,
    pub storage: Option<StorageId>,
    pub category: Option<CategoryId>,
    pub currency: Option<CurrencyId>,
}

impl TemplateEdit {
    fn apply(self, template: &mut RecurrentTemplate) {
        if let Some(name) = self.name {
            template.name = name;
        }
        if let Some(amount) = self.amount {
            template.amount = amount;
        }
        if let Some(period) = self.period {
            template.period = period;
        }
        if let Some(storage) = self.storage {
            template.storage = storage;
        }
        if let Some(category) = self.category {
            template.category = category;
        }
        if let Some(currency) = self.currency {
            template.currency = currency;
        }
    }
}

/// Edits only ever affect occurrences after `now`, so everything due is materialized first.
pub fn edit_template(
    store: &mut impl Ledger,
    id: TemplateId,
    edit: TemplateEdit,
    now: NaiveDateTime,
) -> Result<RecurrentTemplate> {
    catch_up_template(store, id, now)?;

    let mut template = store.template(id)?;
    edit.apply(&mut template);
    store.replace_template(template.clone())?;

    info!(%id, "edited recurrent");

    Ok(template)
}

pub fn delete_template(
    store: &mut impl Ledger,
    id: TemplateId,
    now: NaiveDateTime,
) -> Result<RecurrentTemplate> {
    catch_up_template(store, id, now)?;

    let removed = store.remove_template(id)?;

    info!(%id, name = %removed.name, "deleted recurrent");

    Ok(removed)
}
