/// Monotonic ticket handed out for each issued request (viewport query,
/// route fetch, ...).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

/// Last-writer-wins guard for asynchronously resolved work.
///
/// Every new request supersedes all earlier ones. A resolution is accepted
/// only when it belongs to the most recently issued ticket and that ticket
/// has not been applied yet, so a late answer for an older request can never
/// overwrite a newer one regardless of arrival order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LatestWins {
    issued: u64,
    applied: u64,
}

impl LatestWins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    pub fn latest(&self) -> Option<Ticket> {
        (self.issued > 0).then_some(Ticket(self.issued))
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued && ticket.0 > 0
    }

    /// Marks `ticket` as applied if it is still current.
    ///
    /// Returns `false` for superseded or already-applied tickets.
    pub fn try_apply(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) || ticket.0 <= self.applied {
            return false;
        }
        self.applied = ticket.0;
        true
    }

    /// Invalidates every outstanding ticket without issuing a new one.
    pub fn invalidate(&mut self) {
        self.issued += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{LatestWins, Ticket};

    #[test]
    fn only_newest_ticket_applies() {
        let mut lw = LatestWins::new();
        let a = lw.issue();
        let b = lw.issue();
        assert!(!lw.try_apply(a));
        assert!(lw.try_apply(b));
        // A late duplicate of the same resolution is ignored.
        assert!(!lw.try_apply(b));
    }

    #[test]
    fn out_of_order_arrival_keeps_newest() {
        let mut lw = LatestWins::new();
        let a = lw.issue();
        let b = lw.issue();
        assert!(lw.try_apply(b));
        assert!(!lw.try_apply(a));
    }

    #[test]
    fn invalidate_discards_outstanding() {
        let mut lw = LatestWins::new();
        let a = lw.issue();
        lw.invalidate();
        assert!(!lw.try_apply(a));
        assert_eq!(lw.latest(), Some(Ticket(2)));
    }

    #[test]
    fn fresh_guard_has_no_ticket() {
        let lw = LatestWins::new();
        assert_eq!(lw.latest(), None);
        assert!(!lw.is_current(Ticket(0)));
    }
}
