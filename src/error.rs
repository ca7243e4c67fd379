use thiserror::Error;

/// Errors surfaced to callers of the group and topology APIs.
/// Contract violations on hot paths (e.g. testing membership of a permutation of the wrong
/// degree) are assertions instead.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    #[error("permutation groups must act on at least one point")]
    ZeroDegree,
    #[error("generator of degree {found} does not match group degree {expected}")]
    DegreeMismatch { expected: usize, found: usize },
    #[error("{0} is not implemented for this topology")]
    NotImplemented(&'static str),
    #[error("automorphism backend failed: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, Error>;
