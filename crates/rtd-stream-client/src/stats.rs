/*
[INPUT]:  Dispatch loop events (pulls, rows, reconnects)
[OUTPUT]: Counters reported at shutdown and inspected by tests
[POS]:    Runtime statistics owned by the dispatch loop
[UPDATE]: When adding/removing dispatch-level runtime signals
*/

use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub pulls: u64,
    pub empty_pulls: u64,
    pub failed_pulls: u64,
    pub rows_seen: u64,
    pub rows_emitted: u64,
    pub reconnects: u64,
    pub reconnect_failures: u64,
    pub last_update: Option<Instant>,
}

impl DispatchStats {
    pub fn record_pull(&mut self) {
        self.pulls += 1;
    }

    pub fn record_empty_pull(&mut self) {
        self.empty_pulls += 1;
    }

    pub fn record_failed_pull(&mut self) {
        self.failed_pulls += 1;
    }

    pub fn record_rows_seen(&mut self, rows: usize) {
        self.rows_seen += rows as u64;
    }

    pub fn record_emitted(&mut self) {
        self.rows_emitted += 1;
        self.last_update = Some(Instant::now());
    }

    pub fn record_reconnect(&mut self) {
        self.reconnects += 1;
    }

    pub fn record_reconnect_failure(&mut self) {
        self.reconnect_failures += 1;
    }
}
