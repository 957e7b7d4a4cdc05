/// Board scan state definitions
///
/// Every configured board moves through these states while its pages are
/// walked in order. `Scanning` is the only active state.
use std::fmt;

/// Represents the current state of one board in the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardState {
    // ===== Active States =====
    /// More pages may still be fetched
    Scanning,

    // ===== Terminal States =====
    /// The first page produced no posts (or could not be fetched)
    StoppedEmpty,

    /// A page held only posts older than the cutoff
    StoppedStale,

    /// The page limit was reached or the board ran out of pages
    Exhausted,
}

impl BoardState {
    /// Returns true while the board is still being scanned
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Scanning)
    }

    /// Short machine-friendly name, used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scanning => "scanning",
            Self::StoppedEmpty => "stopped_empty",
            Self::StoppedStale => "stopped_stale",
            Self::Exhausted => "exhausted",
        }
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
