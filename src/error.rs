use itertools::Itertools;
use thiserror::Error;

use crate::model::{EntityKind, TemplateId, UserId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("message does not conform to pattern: {0:?}")]
    GrammarMismatch(String),

    #[error("currency could not be identified or too many parameters were specified")]
    AmbiguousParameters,

    #[error("failed to identify {text:?} as {}", tried.iter().join(" or "))]
    UnresolvedParameter { text: String, tried: Vec<EntityKind> },

    #[error("no {0} given and no default {0} configured")]
    MissingDefault(EntityKind),

    #[error("installment count must be positive, got {0}")]
    InvalidInstallmentCount(u32),

    #[error("period count must be positive, got {0}")]
    InvalidPeriod(u32),

    #[error("timestamp out of range")]
    TimestampOverflow,

    #[error("unknown user: {0}")]
    UnknownUser(UserId),

    #[error("unknown recurrent transaction: {0}")]
    UnknownTemplate(TemplateId),

    #[error("cursor of recurrent transaction {0} moved concurrently")]
    StaleCursor(TemplateId),

    #[error("{kind} {name:?} already exists")]
    DuplicateName { kind: EntityKind, name: String },

    #[error("{kind} {name:?} is still used by transactions or recurrent transactions")]
    EntityInUse { kind: EntityKind, name: String },

    #[error("currencies are shared by every user and cannot be changed")]
    SharedCurrency,

    #[error("no alias named {0:?}")]
    UnknownAlias(String),

    #[error("alias {0:?} exists for more than one kind, pick one with --kind")]
    AmbiguousAlias(String),

    #[error("invalid book: {0}")]
    InvalidBook(String),

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
