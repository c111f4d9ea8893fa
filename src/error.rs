//! Error types shared across the game core

use thiserror::Error;

use crate::carousel::SlotId;

/// Faults and caller-visible conditions raised by game operations.
///
/// Expected outcomes (a failed spend, a surface still being scratched) are
/// plain `bool`/`Option` results; this type is for conditions a caller has
/// to react to.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("insufficient funds (balance={balance}, price={price})")]
    InsufficientFunds { balance: i64, price: i64 },
    #[error("every ticket config is hidden")]
    AllConfigsHidden,
    #[error("config {index} is the last visible config and cannot be hidden")]
    LastVisibleConfig { index: usize },
    #[error("config index out of range (index={index}, len={len})")]
    ConfigOutOfRange { index: usize, len: usize },
    #[error("carousel supports 3 or 5 visible slots, got {0}")]
    InvalidSlotCount(usize),
    #[error("carousel has no ticket configs")]
    EmptyCarousel,
    #[error("slot {0:?} is not present in the carousel")]
    MissingSlot(SlotId),
    #[error("preferences: {0}")]
    Preferences(String),
}

pub type Result<T> = std::result::Result<T, GameError>;
