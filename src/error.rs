use std::fmt;
use thiserror::Error;

/// A sleep/wake request that had nothing to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoOp {
    AlreadySleeping,
    NotSleeping,
}

impl fmt::Display for NoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoOp::AlreadySleeping => f.write_str("already sleeping"),
            NoOp::NotSleeping => f.write_str("not sleeping"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum PetError {
    #[error("invalid feed amount {0}: must be above 0 and at most 100")]
    InvalidAmount(f64),

    #[error("invalid pet name: {0}")]
    InvalidName(String),

    #[error("malformed save: {0}")]
    MalformedSave(String),

    #[error("{0}")]
    NoOpTransition(NoOp),
}

pub type PetResult<T> = Result<T, PetError>;
