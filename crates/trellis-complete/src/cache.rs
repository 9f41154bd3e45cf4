//! Time-boxed cache of the template index.
//!
//! Each controller owns one. Fetches are issued through tickets that
//! carry a sequence number, so a slow response can never overwrite an
//! index stored by a later fetch.

use std::time::{Duration, Instant};
use tracing::debug;
use trellis_core::TemplateEntry;

/// Default freshness window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Handle for one fetch of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    issued_at: Instant,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug)]
struct Stored {
    entries: Vec<TemplateEntry>,
    fetched_at: Instant,
    seq: u64,
}

/// The cached index and the bookkeeping for in-flight fetches.
#[derive(Debug)]
pub struct IndexCache {
    ttl: Duration,
    stored: Option<Stored>,
    in_flight: Option<FetchTicket>,
    next_seq: u64,
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl IndexCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            stored: None,
            in_flight: None,
            next_seq: 1,
        }
    }

    /// The cached entries if they are still inside the window.
    pub fn fresh(&self, now: Instant) -> Option<&[TemplateEntry]> {
        self.stored
            .as_ref()
            .filter(|stored| now.saturating_duration_since(stored.fetched_at) < self.ttl)
            .map(|stored| stored.entries.as_slice())
    }

    /// The cached entries regardless of age.
    pub fn entries(&self) -> Option<&[TemplateEntry]> {
        self.stored.as_ref().map(|stored| stored.entries.as_slice())
    }

    /// Whether a fetch is outstanding at `now`.
    pub fn is_fetching(&self, now: Instant) -> bool {
        self.in_flight
            .is_some_and(|ticket| now.saturating_duration_since(ticket.issued_at) < self.ttl)
    }

    /// Issues a ticket for a new fetch.
    ///
    /// Returns `None` while another fetch is outstanding, so concurrent
    /// triggers share one request. A fetch that has been outstanding for
    /// a whole window is treated as abandoned.
    pub fn begin_fetch(&mut self, now: Instant) -> Option<FetchTicket> {
        if self.is_fetching(now) {
            return None;
        }

        let ticket = FetchTicket {
            seq: self.next_seq,
            issued_at: now,
        };
        self.next_seq += 1;
        self.in_flight = Some(ticket);
        debug!("Issued index fetch #{}", ticket.seq);
        Some(ticket)
    }

    /// Whether `ticket` is the most recent fetch issued. Results of
    /// older tickets may still fill the cache but should not be shown.
    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.seq + 1 == self.next_seq
    }

    /// Stores the result of a fetch.
    ///
    /// Returns false when a later fetch already populated the cache, in
    /// which case `entries` is dropped.
    pub fn complete(&mut self, ticket: FetchTicket, entries: Vec<TemplateEntry>) -> bool {
        self.settle(ticket);

        if self.stored.as_ref().is_some_and(|stored| stored.seq > ticket.seq) {
            debug!("Discarding stale index fetch #{}", ticket.seq);
            return false;
        }

        self.stored = Some(Stored {
            entries,
            fetched_at: ticket.issued_at,
            seq: ticket.seq,
        });
        true
    }

    /// Records a failed fetch. Whatever was cached stays.
    pub fn fail(&mut self, ticket: FetchTicket) {
        self.settle(ticket);
    }

    fn settle(&mut self, ticket: FetchTicket) {
        if self.in_flight.is_some_and(|pending| pending.seq <= ticket.seq) {
            self.in_flight = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(paths: &[&str]) -> Vec<TemplateEntry> {
        paths.iter().map(|p| TemplateEntry::file(*p, None)).collect()
    }

    #[test]
    fn test_fresh_within_window() {
        let start = Instant::now();
        let mut cache = IndexCache::default();
        assert!(cache.fresh(start).is_none());

        let ticket = cache.begin_fetch(start).unwrap();
        assert!(cache.complete(ticket, entries(&["index"])));

        assert_eq!(cache.fresh(start + Duration::from_secs(59)).unwrap().len(), 1);
        assert!(cache.fresh(start + Duration::from_secs(60)).is_none());
        assert!(cache.entries().is_some());
    }

    #[test]
    fn test_concurrent_triggers_share_a_fetch() {
        let start = Instant::now();
        let mut cache = IndexCache::default();

        let first = cache.begin_fetch(start);
        assert!(first.is_some());
        assert!(cache.begin_fetch(start + Duration::from_millis(5)).is_none());

        cache.complete(first.unwrap(), Vec::new());
        assert!(!cache.is_fetching(start + Duration::from_millis(10)));
    }

    #[test]
    fn test_abandoned_fetch_is_replaced() {
        let start = Instant::now();
        let mut cache = IndexCache::new(Duration::from_secs(1));

        let first = cache.begin_fetch(start).unwrap();
        let second = cache.begin_fetch(start + Duration::from_secs(2)).unwrap();
        assert!(second.seq() > first.seq());
        assert!(!cache.is_current(first));
        assert!(cache.is_current(second));
    }

    #[test]
    fn test_stale_response_does_not_win() {
        let start = Instant::now();
        let mut cache = IndexCache::new(Duration::from_secs(1));

        let old = cache.begin_fetch(start).unwrap();
        let new = cache.begin_fetch(start + Duration::from_secs(2)).unwrap();

        assert!(cache.complete(new, entries(&["fresh"])));
        assert!(!cache.complete(old, entries(&["stale"])));
        assert_eq!(cache.entries().unwrap()[0].path, "fresh");
    }

    #[test]
    fn test_out_of_order_older_first_is_superseded() {
        let start = Instant::now();
        let mut cache = IndexCache::new(Duration::from_secs(1));

        let old = cache.begin_fetch(start).unwrap();
        let new = cache.begin_fetch(start + Duration::from_secs(2)).unwrap();

        assert!(cache.complete(old, entries(&["stale"])));
        assert!(cache.complete(new, entries(&["fresh"])));
        assert_eq!(cache.entries().unwrap()[0].path, "fresh");
    }

    #[test]
    fn test_failure_keeps_previous_entries() {
        let start = Instant::now();
        let mut cache = IndexCache::default();

        let first = cache.begin_fetch(start).unwrap();
        cache.complete(first, entries(&["index"]));

        let later = start + Duration::from_secs(120);
        let retry = cache.begin_fetch(later).unwrap();
        cache.fail(retry);

        assert!(cache.fresh(later).is_none());
        assert_eq!(cache.entries().unwrap()[0].path, "index");
        assert!(cache.begin_fetch(later).is_some());
    }
}
