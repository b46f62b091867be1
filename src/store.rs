use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::*;
use crate::resolve::{same_name, Snapshot};

/// Storage side of the core. Every `&mut self` method either applies completely or not at all.
pub trait Ledger {
    fn user_defaults(&self, user: UserId) -> Result<UserDefaults>;

    fn snapshot(&self, user: UserId) -> Result<Snapshot>;

    fn persist_transactions(&mut self, records: Vec<TransactionRecord>)
        -> Result<Vec<TransactionId>>;

    fn transactions(&self, user: UserId) -> Result<Vec<Transaction>>;

    fn templates(&self) -> Result<Vec<RecurrentTemplate>>;

    fn template(&self, id: TemplateId) -> Result<RecurrentTemplate>;

    /// Moves the template's cursor from `expected` to `cursor` and stores `generated` with it.
    /// Fails with `StaleCursor` if the stored cursor is no longer `expected`.
    fn advance_cursor(
        &mut self,
        id: TemplateId,
        expected: NaiveDateTime,
        cursor: NaiveDateTime,
        generated: Vec<TransactionRecord>,
    ) -> Result<()>;

    fn replace_template(&mut self, template: RecurrentTemplate) -> Result<()>;

    fn remove_template(&mut self, id: TemplateId) -> Result<RecurrentTemplate>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub currencies: Vec<Currency>,
    #[serde(default)]
    pub storages: Vec<Storage>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub aliases: Vec<Alias>,
    #[serde(default)]
    pub recurrent: Vec<RecurrentTemplate>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

fn ensure_unique<T: std::hash::Hash + Eq>(what: &str, ids: impl Iterator<Item = T>) -> Result<()> {
    let ids = ids.collect::<Vec<_>>();
    if ids.iter().unique().count() != ids.len() {
        return Err(Error::InvalidBook(format!("duplicate {} id", what)));
    }
    Ok(())
}

impl Book {
    pub fn user(&self, user: UserId) -> Result<&User> {
        self.users
            .iter()
            .find(|u| u.id == user)
            .ok_or(Error::UnknownUser(user))
    }

    pub fn snapshot(&self, user: UserId) -> Snapshot {
        Snapshot {
            currencies: self.currencies.clone(),
            storages: self
                .storages
                .iter()
                .filter(|s| s.user == user)
                .cloned()
                .collect(),
            categories: self
                .categories
                .iter()
                .filter(|c| c.user == user)
                .cloned()
                .collect(),
            aliases: self
                .aliases
                .iter()
                .filter(|a| a.user == user)
                .cloned()
                .collect(),
        }
    }

    fn has_target(&self, user: UserId, target: &AliasTarget) -> bool {
        match target {
            AliasTarget::Currency(id) => self.currencies.iter().any(|c| c.id == *id),
            AliasTarget::Storage(id) => self.storages.iter().any(|s| s.id == *id && s.user == user),
            AliasTarget::Category(id) => {
                self.categories.iter().any(|c| c.id == *id && c.user == user)
            }
        }
    }

    fn check_targets(&self, user: UserId, targets: &[AliasTarget], owner: &str) -> Result<()> {
        match targets.iter().find(|t| !self.has_target(user, t)) {
            Some(missing) => Err(Error::InvalidBook(format!(
                "{} refers to unknown {} {:?}",
                owner,
                missing.kind(),
                missing
            ))),
            None => Ok(()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_unique("user", self.users.iter().map(|u| u.id))?;
        ensure_unique("currency", self.currencies.iter().map(|c| c.id))?;
        ensure_unique("storage", self.storages.iter().map(|s| s.id))?;
        ensure_unique("category", self.categories.iter().map(|c| c.id))?;
        ensure_unique("alias", self.aliases.iter().map(|a| a.id))?;
        ensure_unique("recurrent", self.recurrent.iter().map(|t| t.id))?;
        ensure_unique("transaction", self.transactions.iter().map(|t| t.id))?;

        for user in self.users.iter() {
            let defaults = &user.defaults;
            let targets = defaults
                .currency
                .map(AliasTarget::Currency)
                .into_iter()
                .chain(defaults.storage.map(AliasTarget::Storage))
                .chain(defaults.category.map(AliasTarget::Category))
                .collect::<Vec<_>>();
            self.check_targets(user.id, &targets, &format!("defaults of user {}", user.id))?;
        }

        for entity_user in self
            .storages
            .iter()
            .map(|s| s.user)
            .chain(self.categories.iter().map(|c| c.user))
            .chain(self.aliases.iter().map(|a| a.user))
            .chain(self.recurrent.iter().map(|t| t.user))
        {
            self.user(entity_user)?;
        }

        for alias in self.aliases.iter() {
            self.check_targets(alias.user, &[alias.target], &format!("alias {}", alias.name))?;
        }

        for (a, b) in self.storages.iter().tuple_combinations() {
            if a.user == b.user && same_name(&a.name, &b.name) {
                return Err(Error::InvalidBook(format!(
                    "storage {:?} defined twice for user {}",
                    a.name, a.user
                )));
            }
        }

        for (a, b) in self.categories.iter().tuple_combinations() {
            if a.user == b.user && same_name(&a.name, &b.name) {
                return Err(Error::InvalidBook(format!(
                    "category {:?} defined twice for user {}",
                    a.name, a.user
                )));
            }
        }

        // Names only need to be unique within a kind, resolution never crosses kinds.
        for (a, b) in self.aliases.iter().tuple_combinations() {
            if a.user == b.user && a.target.kind() == b.target.kind() && same_name(&a.name, &b.name)
            {
                return Err(Error::InvalidBook(format!(
                    "alias {:?} defined twice for {} of user {}",
                    a.name,
                    a.target.kind(),
                    a.user
                )));
            }
        }

        for template in self.recurrent.iter() {
            if template.period.count == 0 {
                return Err(Error::InvalidPeriod(template.period.count));
            }
            self.check_targets(
                template.user,
                &[
                    AliasTarget::Currency(template.currency),
                    AliasTarget::Storage(template.storage),
                    AliasTarget::Category(template.category),
                ],
                &format!("recurrent {}", template.name),
            )?;
        }

        Ok(())
    }

    fn next_transaction_id(&self) -> u32 {
        self.transactions
            .iter()
            .map(|t| t.id.0)
            .max()
            .map_or(1, |max| max + 1)
    }

    fn append(&mut self, records: Vec<TransactionRecord>) -> Vec<TransactionId> {
        let first = self.next_transaction_id();
        records
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                let id = TransactionId(first + i as u32);
                self.transactions.push(Transaction { id, record });
                id
            })
            .collect()
    }

    fn template_mut(&mut self, id: TemplateId) -> Result<&mut RecurrentTemplate> {
        self.recurrent
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(Error::UnknownTemplate(id))
    }
}

#[derive(Debug)]
pub struct BookStore {
    path: Option<PathBuf>,
    book: Book,
}

impl BookStore {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let book: Book = serde_json::from_reader(std::io::BufReader::new(file))?;
        book.validate()?;

        info!(
            path = %path.display(),
            transactions = book.transactions.len(),
            recurrent = book.recurrent.len(),
            "opened"
        );

        Ok(Self {
            path: Some(path.to_owned()),
            book,
        })
    }

    pub fn in_memory(book: Book) -> Result<Self> {
        book.validate()?;
        Ok(Self { path: None, book })
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    fn write_staging(staging: &Path, book: &Book) -> Result<()> {
        let mut writer = BufWriter::new(File::create(staging)?);
        serde_json::to_writer_pretty(&mut writer, book)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }

    fn write(path: &Path, book: &Book) -> Result<()> {
        let staging = path.with_extension("json.tmp");

        // Rename is atomic, readers see either the old book or the new one.
        let written = Self::write_staging(&staging, book)
            .and_then(|_| fs::rename(&staging, path).map_err(Error::from));

        if let Err(e) = written {
            if staging.exists() {
                if let Err(removing) = fs::remove_file(&staging) {
                    warn!(path = %staging.display(), "{}", removing);
                }
            }
            return Err(e);
        }

        debug!(path = %path.display(), "written");

        Ok(())
    }

    /// Applies `change` and keeps it only if the resulting book is still valid.
    pub fn edit<T>(&mut self, change: impl FnOnce(&mut Book) -> Result<T>) -> Result<T> {
        self.commit(|book| {
            let value = change(book)?;
            book.validate()?;
            Ok(value)
        })
    }

    fn commit<T>(&mut self, change: impl FnOnce(&mut Book) -> Result<T>) -> Result<T> {
        let mut staged = self.book.clone();
        let value = change(&mut staged)?;
        if let Some(path) = &self.path {
            Self::write(path, &staged)?;
        }
        self.book = staged;
        Ok(value)
    }
}

impl Ledger for BookStore {
    fn user_defaults(&self, user: UserId) -> Result<UserDefaults> {
        Ok(self.book.user(user)?.defaults)
    }

    fn snapshot(&self, user: UserId) -> Result<Snapshot> {
        self.book.user(user)?;
        Ok(self.book.snapshot(user))
    }

    fn persist_transactions(
        &mut self,
        records: Vec<TransactionRecord>,
    ) -> Result<Vec<TransactionId>> {
        let ids = self.commit(|book| Ok(book.append(records)))?;
        info!(count = ids.len(), "persisted transactions");
        Ok(ids)
    }

    fn transactions(&self, user: UserId) -> Result<Vec<Transaction>> {
        self.book.user(user)?;
        Ok(self
            .book
            .transactions
            .iter()
            .filter(|t| t.record.user == user)
            .cloned()
            .collect())
    }

    fn templates(&self) -> Result<Vec<RecurrentTemplate>> {
        Ok(self.book.recurrent.clone())
    }

    fn template(&self, id: TemplateId) -> Result<RecurrentTemplate> {
        self.book
            .recurrent
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(Error::UnknownTemplate(id))
    }

    fn advance_cursor(
        &mut self,
        id: TemplateId,
        expected: NaiveDateTime,
        cursor: NaiveDateTime,
        generated: Vec<TransactionRecord>,
    ) -> Result<()> {
        self.commit(|book| {
            let template = book.template_mut(id)?;
            if template.next_occurrence != expected || cursor <= expected {
                return Err(Error::StaleCursor(id));
            }
            template.next_occurrence = cursor;
            book.append(generated);
            Ok(())
        })?;

        info!(%id, %cursor, "advanced cursor");

        Ok(())
    }

    fn replace_template(&mut self, template: RecurrentTemplate) -> Result<()> {
        let id = template.id;
        self.commit(|book| {
            *book.template_mut(id)? = template;
            book.validate()
        })
    }

    fn remove_template(&mut self, id: TemplateId) -> Result<RecurrentTemplate> {
        self.commit(|book| {
            let index = book
                .recurrent
                .iter()
                .position(|t| t.id == id)
                .ok_or(Error::UnknownTemplate(id))?;
            Ok(book.recurrent.remove(index))
        })
    }
}

#[cfg(test)]
pub mod fixtures {
    use super::*;
    use crate::calendar::at;

    pub const USER: UserId = UserId(1);

    pub const USD: CurrencyId = CurrencyId(1);
    pub const EUR: CurrencyId = CurrencyId(2);

    pub const WALLET: StorageId = StorageId(1);
    pub const CARD: StorageId = StorageId(2);

    pub const GROCERIES: CategoryId = CategoryId(1);
    pub const CAFE: CategoryId = CategoryId(2);
    pub const PRODUCE: CategoryId = CategoryId(3);
    pub const HOUSING: CategoryId = CategoryId(4);

    pub const RENT: TemplateId = TemplateId(1);

    pub fn defaults() -> UserDefaults {
        UserDefaults {
            currency: Some(EUR),
            storage: Some(WALLET),
            category: Some(CAFE),
        }
    }

    fn currency(id: CurrencyId, name: &str, symbol: &str, alpha_code: &str) -> Currency {
        Currency {
            id,
            name: name.into(),
            symbol: symbol.into(),
            alpha_code: alpha_code.into(),
        }
    }

    fn category(id: CategoryId, name: &str) -> Category {
        Category {
            id,
            user: USER,
            name: name.into(),
        }
    }

    pub fn rent() -> RecurrentTemplate {
        RecurrentTemplate {
            id: RENT,
            user: USER,
            storage: CARD,
            category: HOUSING,
            currency: EUR,
            name: "Rent".into(),
            amount: MinorUnits(-50000),
            period: Period::new(1, PeriodUnit::Month),
            next_occurrence: at(2024, 1, 1),
        }
    }

    pub fn book() -> Book {
        Book {
            users: vec![User {
                id: USER,
                name: "alice".into(),
                defaults: defaults(),
            }],
            currencies: vec![
                currency(USD, "US Dollar", "$", "USD"),
                currency(EUR, "Euro", "€", "EUR"),
            ],
            storages: vec![
                Storage {
                    id: WALLET,
                    user: USER,
                    name: "Wallet".into(),
                },
                Storage {
                    id: CARD,
                    user: USER,
                    name: "Card".into(),
                },
            ],
            categories: vec![
                category(GROCERIES, "Groceries"),
                category(CAFE, "Cafe"),
                category(PRODUCE, "Продукты"),
                category(HOUSING, "Housing"),
            ],
            aliases: vec![
                Alias {
                    id: AliasId(1),
                    user: USER,
                    name: "gr".into(),
                    target: AliasTarget::Category(GROCERIES),
                },
                Alias {
                    id: AliasId(2),
                    user: USER,
                    name: "bucks".into(),
                    target: AliasTarget::Currency(USD),
                },
            ],
            recurrent: vec![rent()],
            transactions: Vec::new(),
        }
    }

    pub fn snapshot() -> Snapshot {
        book().snapshot(USER)
    }
}
