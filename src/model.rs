use serde::{Deserialize, Serialize};

pub use chrono::NaiveDateTime;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(UserId);
id_type!(CurrencyId);
id_type!(StorageId);
id_type!(CategoryId);
id_type!(AliasId);
id_type!(TemplateId);
id_type!(TransactionId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinorUnits(pub i64);

impl MinorUnits {
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl std::iter::Sum for MinorUnits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        MinorUnits(iter.map(|m| m.0).sum())
    }
}

impl std::fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        f.pad(&format!("{}{}.{:02}", sign, cents / 100, cents % 100))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Currency,
    Storage,
    Category,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Currency => f.pad("currency"),
            EntityKind::Storage => f.pad("storage"),
            EntityKind::Category => f.pad("category"),
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "currency" => Ok(EntityKind::Currency),
            "storage" => Ok(EntityKind::Storage),
            "category" => Ok(EntityKind::Category),
            _ => Err(format!("expected currency, storage or category: {}", s)),
        }
    }
}

/// What an alias points at. The three kinds share no identity space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum AliasTarget {
    Currency(CurrencyId),
    Storage(StorageId),
    Category(CategoryId),
}

impl AliasTarget {
    pub fn kind(&self) -> EntityKind {
        match self {
            AliasTarget::Currency(_) => EntityKind::Currency,
            AliasTarget::Storage(_) => EntityKind::Storage,
            AliasTarget::Category(_) => EntityKind::Category,
        }
    }

    pub fn currency(&self) -> Option<CurrencyId> {
        match self {
            AliasTarget::Currency(id) => Some(*id),
            _ => None,
        }
    }

    pub fn storage(&self) -> Option<StorageId> {
        match self {
            AliasTarget::Storage(id) => Some(*id),
            _ => None,
        }
    }

    pub fn category(&self) -> Option<CategoryId> {
        match self {
            AliasTarget::Category(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: CurrencyId,
    pub name: String,
    pub symbol: String,
    pub alpha_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    pub id: StorageId,
    pub user: UserId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub user: UserId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub id: AliasId,
    pub user: UserId,
    pub name: String,
    pub target: AliasTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserDefaults {
    #[serde(default)]
    pub currency: Option<CurrencyId>,
    #[serde(default)]
    pub storage: Option<StorageId>,
    #[serde(default)]
    pub category: Option<CategoryId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub defaults: UserDefaults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
    Year,
}

impl std::fmt::Display for PeriodUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodUnit::Day => f.pad("day"),
            PeriodUnit::Week => f.pad("week"),
            PeriodUnit::Month => f.pad("month"),
            PeriodUnit::Year => f.pad("year"),
        }
    }
}

impl std::str::FromStr for PeriodUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        match lowered.strip_suffix('s').unwrap_or(&lowered) {
            "day" => Ok(PeriodUnit::Day),
            "week" => Ok(PeriodUnit::Week),
            "month" => Ok(PeriodUnit::Month),
            "year" => Ok(PeriodUnit::Year),
            _ => Err(format!("unknown period unit: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub count: u32,
    pub unit: PeriodUnit,
}

impl Period {
    pub fn new(count: u32, unit: PeriodUnit) -> Self {
        Self { count, unit }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&format!("{}{}", self.count, self.unit))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrentTemplate {
    pub id: TemplateId,
    pub user: UserId,
    pub storage: StorageId,
    pub category: CategoryId,
    pub currency: CurrencyId,
    pub name: String,
    pub amount: MinorUnits,
    pub period: Period,
    pub next_occurrence: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub user: UserId,
    pub currency: CurrencyId,
    pub storage: StorageId,
    pub category: CategoryId,
    pub timestamp: NaiveDateTime,
    pub amount: MinorUnits,
    pub installments: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(flatten)]
    pub record: TransactionRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units_display() {
        assert_eq!(MinorUnits(-1550).to_string(), "-15.50");
        assert_eq!(MinorUnits(20000).to_string(), "200.00");
        assert_eq!(MinorUnits(5).to_string(), "0.05");
        assert_eq!(MinorUnits(0).to_string(), "0.00");
        assert_eq!(MinorUnits(-7).to_string(), "-0.07");
        assert_eq!(MinorUnits(i64::MIN).to_string(), "-92233720368547758.08");
        assert_eq!(format!("{:>8}", MinorUnits(100)), "    1.00");
    }

    #[test]
    fn test_minor_units_sum() {
        let total: MinorUnits = [MinorUnits(-334), MinorUnits(-333), MinorUnits(-333)]
            .into_iter()
            .sum();
        assert_eq!(total, MinorUnits(-1000));
    }

    #[test]
    fn test_period_display() {
        assert_eq!(Period::new(1, PeriodUnit::Month).to_string(), "1month");
        assert_eq!(Period::new(2, PeriodUnit::Week).to_string(), "2week");
    }

    #[test]
    fn test_period_unit_from_str() {
        assert_eq!("Months".parse::<PeriodUnit>(), Ok(PeriodUnit::Month));
        assert_eq!("day".parse::<PeriodUnit>(), Ok(PeriodUnit::Day));
        assert!("fortnight".parse::<PeriodUnit>().is_err());
        assert!("dayss".parse::<PeriodUnit>().is_err());
    }

    #[test]
    fn test_entity_kind_from_str() {
        assert_eq!("Storage".parse::<EntityKind>(), Ok(EntityKind::Storage));
        assert_eq!("category".parse::<EntityKind>(), Ok(EntityKind::Category));
        assert!("wallet".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_alias_target_serialization() -> anyhow::Result<()> {
        let target = AliasTarget::Storage(StorageId(3));
        let json = serde_json::to_string(&target)?;
        assert_eq!(json, r#"{"kind":"storage","id":3}"#);
        assert_eq!(serde_json::from_str::<AliasTarget>(&json)?, target);
        assert_eq!(target.kind(), EntityKind::Storage);
        assert_eq!(target.currency(), None);

        Ok(())
    }
}
