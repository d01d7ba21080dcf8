//! Per-session crawl statistics
//!
//! Counters are updated by the orchestrator loop as transfers complete and
//! frozen into the task report when the session drains.

use crate::state::TransferState;

/// Counters of one action's crawl session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Name of the action crawled
    pub action: String,

    /// Transfers created, seed included
    pub transfers_started: u64,

    pub succeeded: u64,

    /// Transport errors, non-2xx responses and abandoned transfers
    pub failed: u64,

    /// Payloads kept because their type is selected
    pub files_kept: u64,

    /// HTML written only to extract links, then removed
    pub files_discarded: u64,

    pub bytes_written: u64,

    /// Filesystem failures while writing or deleting payloads
    pub write_errors: u64,

    /// Raw links yielded by the extractor
    pub links_seen: u64,

    /// Links new to the frontier tree, scheduled for transfer
    pub links_scheduled: u64,

    /// Deepest depth at which a transfer completed
    pub max_depth_reached: u32,
}

impl SessionStats {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    /// Counts a transfer reaching a terminal state
    pub fn record_terminal(&mut self, state: TransferState, depth: i32) {
        match state {
            TransferState::Succeeded => {
                self.succeeded += 1;
                if depth >= 0 {
                    self.max_depth_reached = self.max_depth_reached.max(depth as u32);
                }
            }
            TransferState::Failed => self.failed += 1,
            TransferState::Queued | TransferState::InFlight => {}
        }
    }

    /// Transfers that reached a terminal state
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed
    }

    /// Percentage of completed transfers that succeeded
    pub fn success_rate(&self) -> f64 {
        let completed = self.completed();
        if completed == 0 {
            0.0
        } else {
            (self.succeeded as f64 / completed as f64) * 100.0
        }
    }

    /// Adds the counters of `other` into `self`
    pub fn absorb(&mut self, other: &SessionStats) {
        self.transfers_started += other.transfers_started;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.files_kept += other.files_kept;
        self.files_discarded += other.files_discarded;
        self.bytes_written += other.bytes_written;
        self.write_errors += other.write_errors;
        self.links_seen += other.links_seen;
        self.links_scheduled += other.links_scheduled;
        self.max_depth_reached = self.max_depth_reached.max(other.max_depth_reached);
    }
}
