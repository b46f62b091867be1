use tracing::debug;
use unicase::UniCase;

use crate::model::{
    Alias, AliasTarget, Category, CategoryId, Currency, CurrencyId, EntityKind, Storage, StorageId,
    UserId,
};

pub trait Directory {
    /// Entity of `kind` whose canonical identifier equals `text`, ignoring case. For currencies
    /// that is the alpha code, otherwise the name.
    fn find_by_canonical_name(&self, kind: EntityKind, text: &str, user: UserId)
        -> Option<AliasTarget>;

    fn find_alias(&self, name: &str, kind: EntityKind, user: UserId) -> Option<AliasTarget>;
}

pub fn resolve(
    directory: &impl Directory,
    text: &str,
    kind: EntityKind,
    user: UserId,
) -> Option<AliasTarget> {
    if let Some(found) = directory.find_by_canonical_name(kind, text, user) {
        debug!(%text, %kind, ?found, "canonical");
        return Some(found);
    }

    if let Some(found) = directory.find_alias(text, kind, user) {
        debug!(%text, %kind, ?found, "alias");
        return Some(found);
    }

    debug!(%text, %kind, "unresolved");

    None
}

pub(crate) fn same_name(a: &str, b: &str) -> bool {
    UniCase::new(a) == UniCase::new(b)
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub currencies: Vec<Currency>,
    pub storages: Vec<Storage>,
    pub categories: Vec<Category>,
    pub aliases: Vec<Alias>,
}

impl Snapshot {
    pub fn currency(&self, id: CurrencyId) -> Option<&Currency> {
        self.currencies.iter().find(|c| c.id == id)
    }

    pub fn storage(&self, id: StorageId) -> Option<&Storage> {
        self.storages.iter().find(|s| s.id == id)
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }
}

impl Directory for Snapshot {
    fn find_by_canonical_name(
        &self,
        kind: EntityKind,
        text: &str,
        user: UserId,
    ) -> Option<AliasTarget> {
        match kind {
            EntityKind::Currency => self
                .currencies
                .iter()
                .find(|c| same_name(&c.alpha_code, text))
                .map(|c| AliasTarget::Currency(c.id)),
            EntityKind::Storage => self
                .storages
                .iter()
                .find(|s| s.user == user && same_name(&s.name, text))
                .map(|s| AliasTarget::Storage(s.id)),
            EntityKind::Category => self
                .categories
                .iter()
                .find(|c| c.user == user && same_name(&c.name, text))
                .map(|c| AliasTarget::Category(c.id)),
        }
    }

    fn find_alias(&self, name: &str, kind: EntityKind, user: UserId) -> Option<AliasTarget> {
        self.aliases
            .iter()
            .filter(|a| a.user == user && a.target.kind() == kind)
            .find(|a| same_name(&a.name, name))
            .map(|a| a.target)
    }
}
