use thiserror::Error;

/// Matching ran out of its resource budget. The algebra itself can't fail; these only arise when
/// a [`Config`](crate::Config) limit is set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("term grew to {size} nodes after input position {position} (limit {limit})")]
    TermTooLarge {
        position: usize,
        size: usize,
        limit: usize,
    },
    #[error("more than {limit} distinct terms after input position {position}")]
    TooManyStates { position: usize, limit: usize },
}
