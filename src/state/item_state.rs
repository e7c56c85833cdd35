/// Item state definitions for tracking feed progress within a run
///
/// A feed moves `Pending -> Fetching -> Fetched` on success, or back to
/// `Pending` when an attempt fails in an expected way and the item is
/// requeued.
use std::fmt;

/// Represents the current state of a feed item during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    /// Waiting in the fetch queue
    Pending,

    /// An attempt is in flight
    Fetching,

    /// Content stored and recorded in the manifest
    Fetched,
}

impl ItemState {
    /// Returns true if no further processing is needed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Fetched)
    }

    /// Returns true if the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: ItemState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::Fetched)
                | (Self::Fetching, Self::Pending)
        )
    }

    /// Short lowercase label used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Fetched => "fetched",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
