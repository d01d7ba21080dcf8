//! Transfer orchestration for the sessions of one task
//!
//! The orchestrator owns every frontier tree of a task. Transfers run as
//! spawned tokio tasks and report back over a channel; only the loop in
//! [`Orchestrator::run_until_drained`] reads or mutates the trees, so they
//! need no locking.

use crate::config::{validate_seed_url, Action, CrawlerConfig};
use crate::crawler::fetcher::{fetch_url, FetchResult};
use crate::crawler::scheduler::{QueuedTransfer, ScheduledTransfer, Scheduler};
use crate::frontier::FrontierTree;
use crate::link::{extract_links, resolve_link, strip_scheme, Link};
use crate::output::SessionStats;
use crate::state::TransferState;
use crate::storage::ContentWriter;
use crate::Result;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Index of a session within its orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(usize);

/// One action's live crawl
#[derive(Debug)]
pub struct Session {
    action: Arc<Action>,
    tree: FrontierTree,
    stats: SessionStats,
    /// Transfers queued or in flight
    outstanding: usize,
    finished: bool,
}

impl Session {
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// The session's frontier tree; empty once the session has finished
    pub fn tree(&self) -> &FrontierTree {
        &self.tree
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// A running transfer
struct InFlight {
    session: usize,
    link: Link,
    depth: i32,
    state: TransferState,
    handle: JoinHandle<()>,
}

/// Message sent by a transfer task when it ends
struct TransferOutcome {
    id: u64,
    result: FetchResult,
}

/// Runs the transfers of every session of a task
pub struct Orchestrator {
    client: Client,
    writer: Arc<ContentWriter>,
    scheduler: Scheduler,
    sessions: Vec<Session>,
    in_flight: HashMap<u64, InFlight>,
    outcomes_tx: mpsc::UnboundedSender<TransferOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<TransferOutcome>,
    poll_interval: Duration,
    crawl_timeout: Option<Duration>,
    next_id: u64,
    timed_out: bool,
}

impl Orchestrator {
    /// Creates an orchestrator allowing `capacity` transfers in flight
    pub fn new(
        client: Client,
        writer: Arc<ContentWriter>,
        config: &CrawlerConfig,
        capacity: usize,
    ) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();

        Self {
            client,
            writer,
            scheduler: Scheduler::new(capacity),
            sessions: Vec::new(),
            in_flight: HashMap::new(),
            outcomes_tx,
            outcomes_rx,
            poll_interval: Duration::from_millis(config.poll_interval_ms.clamp(1, 1000)),
            crawl_timeout: config.crawl_timeout_secs.map(Duration::from_secs),
            next_id: 0,
            timed_out: false,
        }
    }

    /// Starts crawling `action`: builds its tree and queues the seed at depth 0
    ///
    /// # Errors
    ///
    /// Fails when the seed URL is not an absolute http(s) URL; no session is
    /// created in that case.
    pub fn start_session(&mut self, action: Arc<Action>) -> Result<SessionId> {
        let seed = validate_seed_url(&action.url)?;
        let link = Link {
            scheme: seed.scheme().to_string(),
            key: strip_scheme(&action.url).to_string(),
        };

        let mut tree = FrontierTree::new(&action.url);
        tree.insert(&link.key, 0);

        let index = self.sessions.len();
        tracing::info!(
            "Starting session '{}' from {} (max depth {})",
            action.name,
            action.url,
            action.max_depth()
        );

        self.sessions.push(Session {
            stats: SessionStats::new(action.name.clone()),
            action,
            tree,
            outstanding: 0,
            finished: false,
        });
        self.enqueue(index, link, 0);

        Ok(SessionId(index))
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(id.0)
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// True when the crawl timeout ended the last run
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Drives every session until no transfer is queued or in flight
    ///
    /// Each iteration starts as many queued transfers as the cap allows, then
    /// waits at most one poll interval for a completion and handles every
    /// completion available. Sessions are finished (hyperlink index written,
    /// tree released) as soon as they drain. Returns the statistics of every
    /// session, in start order.
    pub async fn run_until_drained(&mut self) -> Vec<SessionStats> {
        // A timeout too large to represent as an instant means no deadline
        let deadline = self
            .crawl_timeout
            .and_then(|timeout| Instant::now().checked_add(timeout));
        self.timed_out = false;

        loop {
            self.dispatch();
            self.finish_drained_sessions().await;

            if self.in_flight.is_empty() && self.scheduler.is_empty() {
                break;
            }

            let mut wait = self.poll_interval;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    self.abandon_remaining();
                    break;
                }
                wait = wait.min(deadline - now);
            }

            if let Ok(Some(outcome)) =
                tokio::time::timeout(wait, self.outcomes_rx.recv()).await
            {
                self.handle_outcome(outcome).await;
            }

            // A finished task has already sent its outcome, so anything still
            // unreported after this drain ended without reporting.
            let finished: Vec<u64> = self
                .in_flight
                .iter()
                .filter(|(_, transfer)| transfer.handle.is_finished())
                .map(|(id, _)| *id)
                .collect();

            while let Ok(outcome) = self.outcomes_rx.try_recv() {
                self.handle_outcome(outcome).await;
            }

            for id in finished {
                if let Some(transfer) = self.in_flight.remove(&id) {
                    tracing::error!(
                        "Transfer of {} ended without reporting",
                        transfer.link.fetch_url()
                    );
                    self.close_in_flight(transfer, TransferState::Failed);
                }
            }

            tracing::debug!(
                "{} transfers in flight, {} queued",
                self.in_flight.len(),
                self.scheduler.pending_len()
            );
        }

        self.finish_drained_sessions().await;

        self.sessions
            .iter()
            .map(|session| session.stats.clone())
            .collect()
    }

    fn enqueue(&mut self, session: usize, link: Link, depth: i32) {
        let id = self.next_id;
        self.next_id += 1;

        let entry = &mut self.sessions[session];
        entry.outstanding += 1;
        entry.stats.transfers_started += 1;

        tracing::trace!("Queued {} at depth {}", link.key, depth);
        self.scheduler.enqueue(QueuedTransfer {
            id,
            session,
            link,
            depth,
            state: TransferState::Queued,
        });
    }

    /// Spawns queued transfers while slots are free
    fn dispatch(&mut self) {
        while let Some(ScheduledTransfer {
            mut transfer,
            permit,
        }) = self.scheduler.try_next()
        {
            if let Err(e) = transfer.state.transition(TransferState::InFlight) {
                tracing::error!("{}: {}", transfer.link.key, e);
            }

            let client = self.client.clone();
            let writer = Arc::clone(&self.writer);
            let action = Arc::clone(&self.sessions[transfer.session].action);
            let outcomes = self.outcomes_tx.clone();
            let url = transfer.link.fetch_url();
            let (id, depth) = (transfer.id, transfer.depth);

            tracing::debug!("Fetching {} (depth {})", url, depth);
            let handle = tokio::spawn(async move {
                let _permit = permit;
                let result = fetch_url(&client, &writer, &action, &url, depth).await;
                let _ = outcomes.send(TransferOutcome { id, result });
            });

            self.in_flight.insert(
                id,
                InFlight {
                    session: transfer.session,
                    link: transfer.link,
                    depth,
                    state: transfer.state,
                    handle,
                },
            );
        }
    }

    /// Completion handler
    async fn handle_outcome(&mut self, outcome: TransferOutcome) {
        let Some(transfer) = self.in_flight.remove(&outcome.id) else {
            tracing::trace!("Outcome for unknown transfer {}", outcome.id);
            return;
        };

        match outcome.result {
            FetchResult::Success {
                final_url,
                status_code,
                content_type,
                plan,
                payload,
                body,
                bytes_written,
                write_error,
                ..
            } => {
                let index = transfer.session;
                // The tree recorded this depth when the transfer was scheduled
                let depth = transfer.depth;

                tracing::debug!(
                    "{} {} [{}] depth {}, {} bytes saved",
                    status_code,
                    final_url,
                    content_type,
                    depth,
                    bytes_written
                );

                let stats = &mut self.sessions[index].stats;
                stats.bytes_written += bytes_written;
                if let Some(e) = write_error {
                    tracing::warn!("Could not save {}: {}", final_url, e);
                    stats.write_errors += 1;
                }

                if let Some(body) = body.filter(|_| plan.extract) {
                    let discovered = self.extract_from(index, &body, &final_url, depth);
                    for (link, link_depth) in discovered {
                        self.enqueue(index, link, link_depth);
                    }
                }

                if let Some(path) = payload {
                    if plan.is_extraction_only() {
                        let deleted = self.writer.delete(&path).await;
                        let stats = &mut self.sessions[index].stats;
                        if deleted {
                            stats.files_discarded += 1;
                        } else {
                            stats.write_errors += 1;
                        }
                    } else {
                        self.sessions[index].stats.files_kept += 1;
                    }
                }

                self.close_in_flight(transfer, TransferState::Succeeded);
            }

            FetchResult::HttpError {
                final_url,
                status_code,
            } => {
                tracing::warn!("HTTP {} for {}, dropped", status_code, final_url);
                self.close_in_flight(transfer, TransferState::Failed);
            }

            FetchResult::NetworkError { error } => {
                tracing::warn!("Transfer of {} failed: {}", transfer.link.fetch_url(), error);
                self.close_in_flight(transfer, TransferState::Failed);
            }
        }
    }

    /// Records the new links of an HTML body in the session's tree
    ///
    /// Returns the links to transfer with their depth. A link already known
    /// to the tree is skipped; an unknown one is inserted at `depth + 1`
    /// before being returned, so later duplicates see it as known.
    fn extract_from(
        &mut self,
        index: usize,
        body: &[u8],
        current_url: &str,
        depth: i32,
    ) -> Vec<(Link, i32)> {
        let session = &mut self.sessions[index];
        let mut discovered = Vec::new();

        for raw in extract_links(body) {
            session.stats.links_seen += 1;

            let Some(link) = resolve_link(&raw, current_url) else {
                tracing::trace!("Not following '{}'", raw);
                continue;
            };
            if session.tree.is_known(&link.key) {
                continue;
            }

            session.tree.insert(&link.key, depth + 1);
            session.stats.links_scheduled += 1;
            discovered.push((link, depth + 1));
        }

        discovered
    }

    fn close_in_flight(&mut self, transfer: InFlight, next: TransferState) {
        let InFlight {
            session,
            link,
            depth,
            mut state,
            ..
        } = transfer;

        if let Err(e) = state.transition(next) {
            tracing::error!("{}: {}", link.key, e);
        }
        self.settle(session, state, depth);
    }

    /// Accounts for a transfer that reached a terminal state
    fn settle(&mut self, session: usize, state: TransferState, depth: i32) {
        let entry = &mut self.sessions[session];
        entry.outstanding = entry.outstanding.saturating_sub(1);
        entry.stats.record_terminal(state, depth);
    }

    /// Aborts running transfers and fails queued ones
    fn abandon_remaining(&mut self) {
        self.timed_out = true;
        tracing::warn!(
            "Crawl timeout reached: abandoning {} transfers in flight and {} queued",
            self.in_flight.len(),
            self.scheduler.pending_len()
        );

        let running: Vec<InFlight> = self.in_flight.drain().map(|(_, t)| t).collect();
        for transfer in running {
            transfer.handle.abort();
            self.close_in_flight(transfer, TransferState::Failed);
        }

        for mut queued in self.scheduler.drain_pending() {
            if let Err(e) = queued.state.transition(TransferState::Failed) {
                tracing::error!("{}: {}", queued.link.key, e);
            }
            self.settle(queued.session, queued.state, queued.depth);
        }

        while self.outcomes_rx.try_recv().is_ok() {}
    }

    /// Writes the hyperlink index of drained sessions and releases their tree
    async fn finish_drained_sessions(&mut self) {
        for session in self.sessions.iter_mut() {
            if session.finished || session.outstanding > 0 {
                continue;
            }
            session.finished = true;

            match self
                .writer
                .write_hyperlinks(&session.action, &session.tree)
                .await
            {
                Ok(path) => tracing::debug!("Wrote {}", path.display()),
                Err(e) => {
                    tracing::warn!("Could not write hyperlink index: {}", e);
                    session.stats.write_errors += 1;
                }
            }

            let released = std::mem::take(&mut session.tree).delete();
            let stats = &session.stats;
            tracing::info!(
                "Session '{}' drained: {} transfers, {} succeeded, {} failed, {} files kept, {} tree nodes released",
                stats.action,
                stats.transfers_started,
                stats.succeeded,
                stats.failed,
                stats.files_kept,
                released
            );
        }
    }
}
