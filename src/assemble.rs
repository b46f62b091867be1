use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::{Error, Result};
use crate::installments::split;
use crate::model::{
    AliasTarget, CategoryId, CurrencyId, EntityKind, MinorUnits, StorageId, TransactionRecord,
    UserDefaults, UserId,
};
use crate::parsing::ParsedCommand;
use crate::resolve::{resolve, Directory};
use crate::store::Ledger;

/// Fully resolved command, ready to be split into installments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTransaction {
    pub currency: CurrencyId,
    pub storage: StorageId,
    pub category: CategoryId,
    pub amount: MinorUnits,
    pub installments: u32,
}

impl ResolvedTransaction {
    pub fn records(&self, user: UserId, start: NaiveDateTime) -> Result<Vec<TransactionRecord>> {
        Ok(split(self.amount, self.installments, start)?
            .into_iter()
            .map(|installment| TransactionRecord {
                user,
                currency: self.currency,
                storage: self.storage,
                category: self.category,
                timestamp: installment.timestamp,
                amount: installment.amount,
                installments: self.installments,
            })
            .collect())
    }
}

type Alternatives = &'static [&'static [EntityKind]];

// What the slots left after the currency step may mean, best guess first.
const NO_TOKENS: Alternatives = &[&[]];
const ONE_TOKEN: Alternatives = &[&[EntityKind::Category], &[EntityKind::Storage]];
const TWO_TOKENS: Alternatives = &[&[EntityKind::Storage, EntityKind::Category]];

fn alternatives(remaining: usize) -> Result<Alternatives> {
    match remaining {
        0 => Ok(NO_TOKENS),
        1 => Ok(ONE_TOKEN),
        2 => Ok(TWO_TOKENS),
        _ => Err(Error::AmbiguousParameters),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Picked {
    currency: Option<CurrencyId>,
    storage: Option<StorageId>,
    category: Option<CategoryId>,
}

impl Picked {
    fn bind(&mut self, target: AliasTarget) {
        match target {
            AliasTarget::Currency(id) => self.currency = Some(id),
            AliasTarget::Storage(id) => self.storage = Some(id),
            AliasTarget::Category(id) => self.category = Some(id),
        }
    }

    fn with_defaults(self, defaults: &UserDefaults) -> Result<(CurrencyId, StorageId, CategoryId)> {
        Ok((
            self.currency
                .or(defaults.currency)
                .ok_or(Error::MissingDefault(EntityKind::Currency))?,
            self.storage
                .or(defaults.storage)
                .ok_or(Error::MissingDefault(EntityKind::Storage))?,
            self.category
                .or(defaults.category)
                .ok_or(Error::MissingDefault(EntityKind::Category))?,
        ))
    }
}

fn currency_step<'s>(
    directory: &impl Directory,
    slots: &'s [&'s str],
    user: UserId,
    picked: &mut Picked,
) -> Result<&'s [&'s str]> {
    let Some(first) = slots.first() else {
        return Ok(slots);
    };

    match resolve(directory, first, EntityKind::Currency, user) {
        Some(target) => {
            picked.bind(target);
            Ok(&slots[1..])
        }
        // Nothing can take three slots without a currency.
        None if slots.len() > 2 => Err(Error::AmbiguousParameters),
        None => Ok(slots),
    }
}

fn role_step(
    directory: &impl Directory,
    remaining: &[&str],
    user: UserId,
    picked: &mut Picked,
) -> Result<()> {
    let mut failures: Vec<(&str, EntityKind)> = Vec::new();

    for roles in alternatives(remaining.len())? {
        let attempt = remaining
            .iter()
            .zip(roles.iter())
            .map(|(text, kind)| resolve(directory, text, *kind, user).ok_or((*text, *kind)))
            .collect::<std::result::Result<Vec<_>, _>>();

        match attempt {
            Ok(targets) => {
                debug!(?roles, "bound");
                for target in targets {
                    picked.bind(target);
                }
                return Ok(());
            }
            Err(failure) => failures.push(failure),
        }
    }

    let text = failures.last().map(|(text, _)| *text).unwrap_or_default();

    Err(Error::UnresolvedParameter {
        text: text.to_owned(),
        tried: failures
            .iter()
            .filter(|(t, _)| *t == text)
            .map(|(_, kind)| *kind)
            .collect(),
    })
}

/// Decides which slot is the currency, the storage and the category, falling back to the
/// user's defaults for whatever was not given.
pub fn assemble(
    parsed: &ParsedCommand,
    directory: &impl Directory,
    defaults: &UserDefaults,
    user: UserId,
) -> Result<ResolvedTransaction> {
    let slots = parsed.filled_slots();
    let mut picked = Picked::default();

    let remaining = currency_step(directory, &slots, user, &mut picked)?;
    role_step(directory, remaining, user, &mut picked)?;

    let (currency, storage, category) = picked.with_defaults(defaults)?;

    Ok(ResolvedTransaction {
        currency,
        storage,
        category,
        amount: parsed.amount,
        installments: parsed.installments,
    })
}

pub fn assemble_transactions(
    store: &impl Ledger,
    parsed: &ParsedCommand,
    user: UserId,
    now: NaiveDateTime,
) -> Result<Vec<TransactionRecord>> {
    let defaults = store.user_defaults(user)?;
    let snapshot = store.snapshot(user)?;

    assemble(parsed, &snapshot, &defaults, user)?.records(user, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::at;
    use crate::model::{Storage, StorageId};
    use crate::parsing::parse_command;
    use crate::store::{fixtures, BookStore};
    use anyhow::Result;

    fn assemble_line(line: &str) -> crate::error::Result<ResolvedTransaction> {
        assemble_line_with(line, &fixtures::defaults())
    }

    fn assemble_line_with(
        line: &str,
        defaults: &UserDefaults,
    ) -> crate::error::Result<ResolvedTransaction> {
        let parsed = parse_command(line)?;
        assemble(&parsed, &fixtures::snapshot(), defaults, fixtures::USER)
    }

    #[test]
    fn test_assemble_all_defaults() -> Result<()> {
        assert_eq!(
            assemble_line("25")?,
            ResolvedTransaction {
                currency: fixtures::EUR,
                storage: fixtures::WALLET,
                category: fixtures::CAFE,
                amount: MinorUnits(-2500),
                installments: 1,
            }
        );

        Ok(())
    }

    #[test]
    fn test_assemble_currency_then_category() -> Result<()> {
        let resolved = assemble_line("-15.50 USD Groceries")?;
        assert_eq!(resolved.currency, fixtures::USD);
        assert_eq!(resolved.storage, fixtures::WALLET);
        assert_eq!(resolved.category, fixtures::GROCERIES);
        assert_eq!(resolved.amount, MinorUnits(-1550));

        Ok(())
    }

    #[test]
    fn test_assemble_currency_only() -> Result<()> {
        let resolved = assemble_line("10 usd")?;
        assert_eq!(resolved.currency, fixtures::USD);
        assert_eq!(resolved.storage, fixtures::WALLET);
        assert_eq!(resolved.category, fixtures::CAFE);

        Ok(())
    }

    #[test]
    fn test_assemble_currency_storage_category() -> Result<()> {
        let resolved = assemble_line("10 USD Card Groceries")?;
        assert_eq!(resolved.currency, fixtures::USD);
        assert_eq!(resolved.storage, fixtures::CARD);
        assert_eq!(resolved.category, fixtures::GROCERIES);

        Ok(())
    }

    #[test]
    fn test_assemble_single_token_category() -> Result<()> {
        let resolved = assemble_line("10 gr")?;
        assert_eq!(resolved.currency, fixtures::EUR);
        assert_eq!(resolved.storage, fixtures::WALLET);
        assert_eq!(resolved.category, fixtures::GROCERIES);

        Ok(())
    }

    #[test]
    fn test_assemble_single_token_storage() -> Result<()> {
        let resolved = assemble_line("10 card")?;
        assert_eq!(resolved.currency, fixtures::EUR);
        assert_eq!(resolved.storage, fixtures::CARD);
        assert_eq!(resolved.category, fixtures::CAFE);

        Ok(())
    }

    #[test]
    fn test_assemble_single_token_prefers_category() -> Result<()> {
        let mut snapshot = fixtures::snapshot();
        snapshot.storages.push(Storage {
            id: StorageId(50),
            user: fixtures::USER,
            name: "Groceries".into(),
        });
        let parsed = parse_command("10 Groceries")?;
        let resolved = assemble(&parsed, &snapshot, &fixtures::defaults(), fixtures::USER)?;
        assert_eq!(resolved.storage, fixtures::WALLET);
        assert_eq!(resolved.category, fixtures::GROCERIES);

        Ok(())
    }

    #[test]
    fn test_assemble_shifted_storage_category() -> Result<()> {
        let resolved = assemble_line("10 Card Groceries")?;
        assert_eq!(resolved.currency, fixtures::EUR);
        assert_eq!(resolved.storage, fixtures::CARD);
        assert_eq!(resolved.category, fixtures::GROCERIES);

        Ok(())
    }

    #[test]
    fn test_assemble_three_slots_without_currency() {
        assert!(matches!(
            assemble_line("10 Card Wallet Groceries"),
            Err(Error::AmbiguousParameters)
        ));
    }

    #[test]
    fn test_assemble_single_token_unresolved() {
        match assemble_line("10 nonsense") {
            Err(Error::UnresolvedParameter { text, tried }) => {
                assert_eq!(text, "nonsense");
                assert_eq!(tried, vec![EntityKind::Category, EntityKind::Storage]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_assemble_two_tokens_storage_unresolved() {
        match assemble_line("10 USD Groceries Card") {
            Err(Error::UnresolvedParameter { text, tried }) => {
                assert_eq!(text, "Groceries");
                assert_eq!(tried, vec![EntityKind::Storage]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_assemble_two_tokens_category_unresolved() {
        match assemble_line("10 Card nonsense") {
            Err(Error::UnresolvedParameter { text, tried }) => {
                assert_eq!(text, "nonsense");
                assert_eq!(tried, vec![EntityKind::Category]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_assemble_missing_defaults() {
        let none = UserDefaults::default();
        assert!(matches!(
            assemble_line_with("10", &none),
            Err(Error::MissingDefault(EntityKind::Currency))
        ));
        assert!(matches!(
            assemble_line_with("10 USD", &none),
            Err(Error::MissingDefault(EntityKind::Storage))
        ));
        assert!(matches!(
            assemble_line_with("10 USD Card", &none),
            Err(Error::MissingDefault(EntityKind::Category))
        ));
        assert!(assemble_line_with("10 USD Card Groceries", &none).is_ok());
    }

    #[test]
    fn test_assemble_transactions_single() -> Result<()> {
        let store = BookStore::in_memory(fixtures::book())?;
        let now = at(2024, 5, 10);
        let records = assemble_transactions(
            &store,
            &parse_command("-15.50 USD Groceries")?,
            fixtures::USER,
            now,
        )?;
        assert_eq!(
            records,
            vec![TransactionRecord {
                user: fixtures::USER,
                currency: fixtures::USD,
                storage: fixtures::WALLET,
                category: fixtures::GROCERIES,
                timestamp: now,
                amount: MinorUnits(-1550),
                installments: 1,
            }]
        );

        Ok(())
    }

    #[test]
    fn test_assemble_transactions_installments() -> Result<()> {
        let store = BookStore::in_memory(fixtures::book())?;
        let now = at(2024, 1, 31);
        let records =
            assemble_transactions(&store, &parse_command("+200/4")?, fixtures::USER, now)?;

        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.currency == fixtures::EUR
            && r.storage == fixtures::WALLET
            && r.category == fixtures::CAFE
            && r.installments == 4));
        assert_eq!(
            records.iter().map(|r| r.amount).sum::<MinorUnits>(),
            MinorUnits(20000)
        );
        assert_eq!(
            records.iter().map(|r| r.timestamp).collect::<Vec<_>>(),
            vec![at(2024, 1, 31), at(2024, 2, 29), at(2024, 3, 31), at(2024, 4, 30)]
        );

        Ok(())
    }

    #[test]
    fn test_assemble_transactions_unknown_user() -> Result<()> {
        let store = BookStore::in_memory(fixtures::book())?;
        assert!(matches!(
            assemble_transactions(&store, &parse_command("10")?, UserId(404), at(2024, 1, 1)),
            Err(Error::UnknownUser(UserId(404)))
        ));

        Ok(())
    }
}
