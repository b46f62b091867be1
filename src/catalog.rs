use crate::error::{Error, Result};
use crate::model::*;
use crate::parsing::parse_name;
use crate::resolve::{resolve, same_name};
use crate::store::Book;

fn next_id(ids: impl Iterator<Item = u32>) -> u32 {
    ids.max().map_or(1, |max| max + 1)
}

impl Book {
    pub fn find(&self, user: UserId, kind: EntityKind, text: &str) -> Result<AliasTarget> {
        resolve(&self.snapshot(user), text, kind, user).ok_or_else(|| {
            Error::UnresolvedParameter {
                text: text.to_owned(),
                tried: vec![kind],
            }
        })
    }

    pub fn name_of(&self, target: &AliasTarget) -> Option<&str> {
        match target {
            AliasTarget::Currency(id) => self
                .currencies
                .iter()
                .find(|c| c.id == *id)
                .map(|c| c.alpha_code.as_str()),
            AliasTarget::Storage(id) => self
                .storages
                .iter()
                .find(|s| s.id == *id)
                .map(|s| s.name.as_str()),
            AliasTarget::Category(id) => self
                .categories
                .iter()
                .find(|c| c.id == *id)
                .map(|c| c.name.as_str()),
        }
    }

    // Canonical names and aliases of one kind share a namespace.
    fn name_taken(&self, user: UserId, kind: EntityKind, name: &str) -> bool {
        let canonical = match kind {
            EntityKind::Currency => self.currencies.iter().any(|c| same_name(&c.alpha_code, name)),
            EntityKind::Storage => self
                .storages
                .iter()
                .any(|s| s.user == user && same_name(&s.name, name)),
            EntityKind::Category => self
                .categories
                .iter()
                .any(|c| c.user == user && same_name(&c.name, name)),
        };

        canonical
            || self
                .aliases
                .iter()
                .any(|a| a.user == user && a.target.kind() == kind && same_name(&a.name, name))
    }

    fn user_mut(&mut self, user: UserId) -> Result<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.id == user)
            .ok_or(Error::UnknownUser(user))
    }

    fn is_used(&self, user: UserId, target: &AliasTarget) -> bool {
        let refers = |currency: CurrencyId, storage: StorageId, category: CategoryId| match target {
            AliasTarget::Currency(id) => currency == *id,
            AliasTarget::Storage(id) => storage == *id,
            AliasTarget::Category(id) => category == *id,
        };

        self.transactions.iter().any(|t| {
            t.record.user == user && refers(t.record.currency, t.record.storage, t.record.category)
        }) || self
            .recurrent
            .iter()
            .any(|t| t.user == user && refers(t.currency, t.storage, t.category))
    }

    pub fn add_entity(&mut self, user: UserId, kind: EntityKind, name: &str) -> Result<AliasTarget> {
        self.user(user)?;
        let name = parse_name(name)?;
        if self.name_taken(user, kind, &name) {
            return Err(Error::DuplicateName { kind, name });
        }

        match kind {
            EntityKind::Currency => Err(Error::SharedCurrency),
            EntityKind::Storage => {
                let id = StorageId(next_id(self.storages.iter().map(|s| s.id.0)));
                self.storages.push(Storage { id, user, name });
                Ok(AliasTarget::Storage(id))
            }
            EntityKind::Category => {
                let id = CategoryId(next_id(self.categories.iter().map(|c| c.id.0)));
                self.categories.push(Category { id, user, name });
                Ok(AliasTarget::Category(id))
            }
        }
    }

    pub fn rename_entity(
        &mut self,
        user: UserId,
        kind: EntityKind,
        text: &str,
        new_name: &str,
    ) -> Result<AliasTarget> {
        let target = self.find(user, kind, text)?;
        let new_name = parse_name(new_name)?;

        let unchanged = self.name_of(&target).is_some_and(|n| same_name(n, &new_name));
        if !unchanged && self.name_taken(user, kind, &new_name) {
            return Err(Error::DuplicateName {
                kind,
                name: new_name,
            });
        }

        let slot = match target {
            AliasTarget::Currency(_) => return Err(Error::SharedCurrency),
            AliasTarget::Storage(id) => self
                .storages
                .iter_mut()
                .find(|s| s.id == id)
                .map(|s| &mut s.name),
            AliasTarget::Category(id) => self
                .categories
                .iter_mut()
                .find(|c| c.id == id)
                .map(|c| &mut c.name),
        };

        match slot {
            Some(name) => *name = new_name,
            None => {
                return Err(Error::UnresolvedParameter {
                    text: text.to_owned(),
                    tried: vec![kind],
                })
            }
        }

        Ok(target)
    }

    /// Also drops the entity's aliases and unsets it as the user's default.
    pub fn remove_entity(&mut self, user: UserId, kind: EntityKind, text: &str) -> Result<AliasTarget> {
        self.user(user)?;
        let target = self.find(user, kind, text)?;
        if kind == EntityKind::Currency {
            return Err(Error::SharedCurrency);
        }
        if self.is_used(user, &target) {
            return Err(Error::EntityInUse {
                kind,
                name: self.name_of(&target).unwrap_or(text).to_owned(),
            });
        }

        self.aliases.retain(|a| a.target != target);
        match target {
            AliasTarget::Storage(id) => self.storages.retain(|s| s.id != id),
            AliasTarget::Category(id) => self.categories.retain(|c| c.id != id),
            AliasTarget::Currency(_) => {}
        }

        let defaults = &mut self.user_mut(user)?.defaults;
        if target.storage().is_some() && defaults.storage == target.storage() {
            defaults.storage = None;
        }
        if target.category().is_some() && defaults.category == target.category() {
            defaults.category = None;
        }

        Ok(target)
    }

    pub fn add_alias(
        &mut self,
        user: UserId,
        kind: EntityKind,
        target_text: &str,
        name: &str,
    ) -> Result<AliasId> {
        let target = self.find(user, kind, target_text)?;
        let name = parse_name(name)?;
        if self.name_taken(user, kind, &name) {
            return Err(Error::DuplicateName { kind, name });
        }

        let id = AliasId(next_id(self.aliases.iter().map(|a| a.id.0)));
        self.aliases.push(Alias {
            id,
            user,
            name,
            target,
        });

        Ok(id)
    }

    pub fn remove_alias(
        &mut self,
        user: UserId,
        name: &str,
        kind: Option<EntityKind>,
    ) -> Result<Alias> {
        let matching = self
            .aliases
            .iter()
            .enumerate()
            .filter(|(_, a)| a.user == user && same_name(&a.name, name))
            .filter(|(_, a)| kind.map_or(true, |k| a.target.kind() == k))
            .map(|(i, _)| i)
            .collect::<Vec<_>>();

        match matching.as_slice() {
            [] => Err(Error::UnknownAlias(name.to_owned())),
            [index] => Ok(self.aliases.remove(*index)),
            _ => Err(Error::AmbiguousAlias(name.to_owned())),
        }
    }

    pub fn set_default(&mut self, user: UserId, kind: EntityKind, text: &str) -> Result<AliasTarget> {
        self.user(user)?;
        let target = self.find(user, kind, text)?;
        let defaults = &mut self.user_mut(user)?.defaults;
        match target {
            AliasTarget::Currency(id) => defaults.currency = Some(id),
            AliasTarget::Storage(id) => defaults.storage = Some(id),
            AliasTarget::Category(id) => defaults.category = Some(id),
        }

        Ok(target)
    }
}
