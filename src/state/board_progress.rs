use crate::model::BoardId;
use crate::state::BoardState;
use chrono::NaiveDateTime;

/// What one fetched page contributed to its board
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSummary {
    /// Posts parsed from the page
    pub total: usize,

    /// Posts at or after the cutoff
    pub accepted: usize,

    /// Oldest post date on the page
    pub oldest: Option<NaiveDateTime>,
}

impl PageSummary {
    /// Summarises the post dates of one page against the cutoff
    pub fn from_dates<I>(dates: I, cutoff: NaiveDateTime) -> Self
    where
        I: IntoIterator<Item = NaiveDateTime>,
    {
        let mut summary = Self::default();
        for date in dates {
            summary.total += 1;
            if date >= cutoff {
                summary.accepted += 1;
            }
            summary.oldest = Some(match summary.oldest {
                Some(oldest) if oldest <= date => oldest,
                _ => date,
            });
        }
        summary
    }
}

/// Tracks the scan of a single board
///
/// The progress owns the state transitions; the crawl loop only reports what
/// each page produced and asks for the next page.
#[derive(Debug, Clone)]
pub struct BoardProgress {
    pub board_id: BoardId,

    /// Current state of the board
    pub state: BoardState,

    /// Next page to request while scanning
    pub next_page: u32,

    /// Pages fetched successfully
    pub pages_fetched: u32,

    /// Pages whose fetch failed
    pub pages_failed: u32,

    /// Posts accepted so far
    pub posts_accepted: usize,

    page_limit: u32,
    cutoff: NaiveDateTime,
}

impl BoardProgress {
    /// Creates progress for a board that has not been scanned yet
    ///
    /// # Arguments
    ///
    /// * `board_id` - The board being scanned
    /// * `page_limit` - Maximum number of pages to visit
    /// * `cutoff` - Posts older than this are stale
    pub fn new(board_id: BoardId, page_limit: u32, cutoff: NaiveDateTime) -> Self {
        Self {
            board_id,
            state: if page_limit == 0 {
                BoardState::Exhausted
            } else {
                BoardState::Scanning
            },
            next_page: 1,
            pages_fetched: 0,
            pages_failed: 0,
            posts_accepted: 0,
            page_limit,
            cutoff,
        }
    }

    /// Returns whether a post date is recent enough to keep
    pub fn accepts(&self, date: NaiveDateTime) -> bool {
        date >= self.cutoff
    }

    /// The page to fetch next, or `None` once the board is done
    pub fn pending_page(&self) -> Option<u32> {
        self.state.is_active().then_some(self.next_page)
    }

    /// Records a successfully fetched and parsed page
    ///
    /// # Returns
    ///
    /// The state after the transition
    pub fn record_page(&mut self, page: u32, summary: &PageSummary) -> BoardState {
        self.pages_fetched += 1;
        self.posts_accepted += summary.accepted;

        self.state = if summary.total == 0 {
            if page == 1 {
                BoardState::StoppedEmpty
            } else {
                BoardState::Exhausted
            }
        } else if summary.accepted == 0
            && summary.oldest.map(|d| d < self.cutoff).unwrap_or(false)
        {
            BoardState::StoppedStale
        } else {
            self.advance(page)
        };

        self.state
    }

    /// Records a page whose fetch failed
    ///
    /// A failed first page ends the board; later failures skip the page.
    pub fn record_failure(&mut self, page: u32) -> BoardState {
        self.pages_failed += 1;

        self.state = if page == 1 {
            BoardState::StoppedEmpty
        } else {
            self.advance(page)
        };

        self.state
    }

    fn advance(&mut self, page: u32) -> BoardState {
        if page >= self.page_limit {
            BoardState::Exhausted
        } else {
            self.next_page = page + 1;
            BoardState::Scanning
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn progress(limit: u32) -> BoardProgress {
        BoardProgress::new(BoardId::new("9"), limit, day(10))
    }

    #[test]
    fn test_page_summary() {
        let summary = PageSummary::from_dates(vec![day(12), day(8), day(11), day(9)], day(10));
        assert_eq!(summary.total, 4);
        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.oldest, Some(day(8)));

        assert_eq!(PageSummary::from_dates(vec![], day(10)), PageSummary::default());
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let p = progress(2);
        assert!(p.accepts(day(10)));
        assert!(!p.accepts(day(9)));
    }

    #[test]
    fn test_empty_first_page_stops() {
        let mut p = progress(3);
        assert_eq!(p.pending_page(), Some(1));
        assert_eq!(p.record_page(1, &PageSummary::default()), BoardState::StoppedEmpty);
        assert_eq!(p.pending_page(), None);
    }

    #[test]
    fn test_failed_first_page_stops() {
        let mut p = progress(3);
        assert_eq!(p.record_failure(1), BoardState::StoppedEmpty);
        assert_eq!(p.pages_failed, 1);
    }

    #[test]
    fn test_stale_page_stops() {
        let mut p = progress(5);
        let fresh = PageSummary::from_dates(vec![day(12), day(9)], day(10));
        assert_eq!(p.record_page(1, &fresh), BoardState::Scanning);
        assert_eq!(p.pending_page(), Some(2));

        let stale = PageSummary::from_dates(vec![day(8), day(7)], day(10));
        assert_eq!(p.record_page(2, &stale), BoardState::StoppedStale);
        assert_eq!(p.pending_page(), None);
        assert_eq!(p.posts_accepted, 1);
    }

    #[test]
    fn test_page_limit_exhausts() {
        let mut p = progress(2);
        let fresh = PageSummary::from_dates(vec![day(12)], day(10));
        assert_eq!(p.record_page(1, &fresh), BoardState::Scanning);
        assert_eq!(p.record_page(2, &fresh), BoardState::Exhausted);
        assert_eq!(p.pages_fetched, 2);
    }

    #[test]
    fn test_later_failure_moves_on() {
        let mut p = progress(3);
        let fresh = PageSummary::from_dates(vec![day(12)], day(10));
        p.record_page(1, &fresh);
        assert_eq!(p.record_failure(2), BoardState::Scanning);
        assert_eq!(p.pending_page(), Some(3));
        assert_eq!(p.record_failure(3), BoardState::Exhausted);
    }

    #[test]
    fn test_empty_later_page_exhausts() {
        let mut p = progress(5);
        let fresh = PageSummary::from_dates(vec![day(12)], day(10));
        p.record_page(1, &fresh);
        assert_eq!(p.record_page(2, &PageSummary::default()), BoardState::Exhausted);
    }

    #[test]
    fn test_zero_page_limit() {
        let p = progress(0);
        assert_eq!(p.pending_page(), None);
        assert_eq!(p.state, BoardState::Exhausted);
    }
}
