//! The sync coordinator.
//!
//! One [`SyncCoordinator`] owns a device's event log, pull cursor, and
//! pending set, and reconciles them with the remote store:
//!
//! - **push** sends every pending event; a duplicate insert counts as
//!   confirmation, and a transport failure leaves the event pending behind
//!   the [`RetryGate`]. An event the store refuses outright leaves the
//!   pending set for the rejected set and is never sent again.
//! - **pull** fetches rows that arrived after the cursor minus a small
//!   overlap, merges them by client id, and advances the cursor. A failed
//!   pull leaves the cursor where it was.
//! - **realtime ingest** merges rows from the change feed but never moves
//!   the cursor, since a notification can overtake earlier arrivals.
//! - **full resync** re-fetches the whole remote log after the local cache
//!   was found unusable.
//!
//! Every mutation of log, cursor, and pending set happens under one mutex
//! and is followed by a cache write, so concurrent callers observe "merge
//! and advance" as a single step. Remote calls are made with the mutex
//! released and are bounded by the request timeout. A separate cycle lock
//! keeps at most one push, pull, or resync in flight per device.
//!
//! The in-memory state may run ahead of the cache but never the reverse:
//! a cache that lags only means rows are re-fetched or re-pushed, which the
//! client-id dedup absorbs. Local appends are the exception and are written
//! before they become visible.

use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{Mutex, Notify, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use grove_core::{DerivationMemo, ReplayRules, resources_at, validate};
use grove_db::{
    CACHE_VERSION, CacheLoad, CacheSnapshot, InsertOutcome, LocalCache, RemoteError, RemoteEvent,
    RemoteEventStore, RemoteInsert, ResyncReason,
};
use grove_events::{EventLog, LogError, MergeOutcome};
use grove_types::{DerivedState, Event, EventId, ResourceState};

use crate::error::SyncError;
use crate::report::{PullReport, PushReport, SyncReport};
use crate::retry::RetryGate;
use crate::settings::SyncSettings;
use crate::status::{SyncFailure, SyncState, SyncStatus};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Everything guarded by the coordinator mutex.
struct Core {
    log: EventLog,
    cursor: Option<DateTime<Utc>>,
    pending: BTreeSet<EventId>,
    memo: DerivationMemo,
    gate: RetryGate,
    /// Set when the cache was unusable at open.
    resync: Option<ResyncReason>,
    /// Local events the store refused for good.
    rejected: BTreeSet<EventId>,
    /// Set when the remote store rejected the session.
    signed_out: bool,
    last_confirmed_at: Option<DateTime<Utc>>,
    push_error: Option<SyncFailure>,
    fetch_error: Option<SyncFailure>,
    cache_error: Option<SyncFailure>,
}

impl Core {
    fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            version: CACHE_VERSION,
            events: self.log.clone(),
            cursor: self.cursor,
            pending: self.pending.clone(),
            rejected: self.rejected.clone(),
            last_confirmed_at: self.last_confirmed_at,
        }
    }

    /// The remote store holds `id`. Only a pending id moves the last
    /// confirmation time.
    fn confirm(&mut self, id: &EventId, arrived_at: Option<DateTime<Utc>>) {
        if self.pending.remove(id) && arrived_at.is_some() {
            self.last_confirmed_at = self.last_confirmed_at.max(arrived_at);
        }
    }

    /// The remote store refused `id` and will keep refusing it.
    fn reject(&mut self, id: EventId, err: &SyncError) {
        warn!(%id, error = %err, "remote store refused event, not retrying");
        self.pending.remove(&id);
        self.rejected.insert(id);
        self.push_error = Some(SyncFailure::from(err));
    }

    fn last_error(&self) -> Option<&SyncFailure> {
        self.cache_error
            .as_ref()
            .or(self.push_error.as_ref())
            .or(self.fetch_error.as_ref())
    }

    fn status(&self, phase: Option<SyncState>) -> SyncStatus {
        let outage = [&self.cache_error, &self.push_error, &self.fetch_error]
            .into_iter()
            .flatten()
            .any(SyncFailure::is_outage);
        let state = phase.unwrap_or(if outage {
            SyncState::Offline
        } else if self.pending.is_empty() {
            SyncState::Synced
        } else {
            SyncState::PushingPending
        });
        SyncStatus {
            state,
            last_confirmed_at: self.last_confirmed_at,
            pending: self.pending.len(),
            rejected: self.rejected.len(),
            last_error: self.last_error().cloned(),
        }
    }

    /// Merge fetched rows. Returns how many were new.
    fn absorb(&mut self, rows: &[RemoteEvent]) -> usize {
        let mut merged: usize = 0;
        for row in rows {
            self.confirm(&row.client_event_id, Some(row.arrived_at));
            if self.log.merge(row.to_event()) == MergeOutcome::Inserted {
                merged = merged.saturating_add(1);
            }
        }
        merged
    }

    fn record_push_failure(&mut self, err: &SyncError) {
        if err.is_auth() {
            self.signed_out = true;
        }
        self.push_error = Some(SyncFailure::from(err));
    }

    fn record_fetch_failure(&mut self, err: &SyncError) {
        if err.is_auth() {
            self.signed_out = true;
        }
        self.fetch_error = Some(SyncFailure::from(err));
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Reconciles one device's local log with the shared remote log.
pub struct SyncCoordinator<R, C> {
    remote: R,
    cache: C,
    rules: ReplayRules,
    settings: SyncSettings,
    core: Mutex<Core>,
    /// Serializes push, pull, and resync.
    cycle: Mutex<()>,
    status: watch::Sender<SyncStatus>,
    /// Wakes the background loop after a local append or sign-in.
    wake: Notify,
}

impl<R: RemoteEventStore, C: LocalCache> SyncCoordinator<R, C> {
    /// Load the local cache and build a coordinator.
    ///
    /// An unusable cache does not fail: its salvaged events are kept, all
    /// of them are treated as pending, and the next [`sync`](Self::sync)
    /// starts with a full resync. The rejected set and last confirmation
    /// time are lost with it.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Cache`] if the cache storage cannot be read.
    pub fn open(
        remote: R,
        cache: C,
        rules: ReplayRules,
        settings: SyncSettings,
    ) -> Result<Self, SyncError> {
        let (snapshot, resync) = match cache.load()? {
            CacheLoad::Empty => (CacheSnapshot::empty(), None),
            CacheLoad::Ready(snapshot) => (snapshot, None),
            CacheLoad::NeedsResync { reason, salvaged } => {
                warn!(
                    ?reason,
                    salvaged = salvaged.len(),
                    "local cache unusable, scheduling full resync"
                );
                let log = EventLog::from(salvaged);
                let pending = log.iter().map(|event| event.client_id).collect();
                let snapshot = CacheSnapshot {
                    events: log,
                    pending,
                    ..CacheSnapshot::empty()
                };
                (snapshot, Some(reason))
            }
        };

        info!(
            events = snapshot.events.len(),
            pending = snapshot.pending.len(),
            rejected = snapshot.rejected.len(),
            cursor = ?snapshot.cursor,
            "sync coordinator opened"
        );

        let core = Core {
            log: snapshot.events,
            cursor: snapshot.cursor,
            pending: snapshot.pending,
            memo: DerivationMemo::new(),
            gate: RetryGate::new(settings.push_retry_initial, settings.push_retry_max),
            resync,
            rejected: snapshot.rejected,
            signed_out: false,
            last_confirmed_at: snapshot.last_confirmed_at,
            push_error: None,
            fetch_error: None,
            cache_error: None,
        };
        let (status, _) = watch::channel(core.status(None));
        Ok(Self {
            remote,
            cache,
            core: Mutex::new(core),
            rules,
            settings,
            cycle: Mutex::new(()),
            status,
            wake: Notify::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Local writes
    // -----------------------------------------------------------------------

    /// Validate a locally authored event, append it, and persist it as
    /// pending. The background loop is woken to push it.
    ///
    /// The event is checked against the state derived from the current log
    /// as of its own timestamp. Nothing changes if validation or the cache
    /// write fails.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Log`] if its id is already in the log.
    /// - [`SyncError::Validation`] if the event breaks a client-side rule.
    /// - [`SyncError::Cache`] if it could not be persisted.
    pub async fn append_local_event(&self, event: Event) -> Result<(), SyncError> {
        let id = event.client_id;
        let now = event.parsed_timestamp().unwrap_or_else(Utc::now);

        let mut guard = self.core.lock().await;
        let core = &mut *guard;
        if core.log.contains(&id) {
            return Err(LogError::DuplicateId(id).into());
        }
        validate(&event, core.memo.get_or_derive(&core.log, &self.rules), &self.rules, now)?;

        let mut snapshot = core.snapshot();
        snapshot.events.append_local(event)?;
        snapshot.pending.insert(id);
        self.cache.store(&snapshot)?;
        core.log = snapshot.events;
        core.pending = snapshot.pending;

        debug!(%id, pending = core.pending.len(), "local event appended");
        self.publish(core, None);
        drop(guard);
        self.wake.notify_one();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Sync steps
    // -----------------------------------------------------------------------

    /// Push every pending event, oldest first, stopping at the first
    /// retryable failure.
    ///
    /// An event the store refuses outright is moved to the rejected set
    /// and the push goes on with the next one. Returns a deferred report
    /// without contacting the store while the retry gate is closed.
    ///
    /// # Errors
    ///
    /// - [`SyncError::SignInRequired`] while sync is paused for sign-in.
    /// - [`SyncError::Remote`] or [`SyncError::Timeout`] if an insert
    ///   failed in a way worth retrying. Events not yet confirmed stay
    ///   pending.
    pub async fn push_pending(&self) -> Result<PushReport, SyncError> {
        let _cycle = self.cycle.lock().await;
        self.push_locked().await
    }

    /// Fetch rows that arrived after the cursor, less the configured
    /// overlap, and merge them. Rows seen before are skipped by id.
    ///
    /// # Errors
    ///
    /// - [`SyncError::SignInRequired`] while sync is paused for sign-in.
    /// - [`SyncError::Remote`] or [`SyncError::Timeout`] if the fetch
    ///   failed. The cursor is unchanged.
    pub async fn pull(&self) -> Result<PullReport, SyncError> {
        let _cycle = self.cycle.lock().await;
        self.pull_locked().await
    }

    /// Merge one row delivered by the change feed.
    ///
    /// Safe to call before, during, or after a pull that returns the same
    /// row. The cursor is never moved.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Cache`] if a change could not be persisted.
    pub async fn realtime_ingest(&self, row: RemoteEvent) -> Result<MergeOutcome, SyncError> {
        let mut core = self.core.lock().await;
        let was_pending = core.pending.contains(&row.client_event_id);
        core.confirm(&row.client_event_id, Some(row.arrived_at));
        let outcome = core.log.merge(row.to_event());
        if outcome == MergeOutcome::Duplicate && !was_pending {
            return Ok(outcome);
        }
        debug!(id = %row.client_event_id, ?outcome, "realtime row ingested");
        let persisted = self.persist(&mut core);
        self.publish(&core, None);
        persisted.map(|()| outcome)
    }

    /// Re-fetch the entire remote log, merge it, and rebuild the cursor and
    /// pending set from it. Local events the store lacks stay pending.
    ///
    /// # Errors
    ///
    /// - [`SyncError::SignInRequired`] while sync is paused for sign-in.
    /// - [`SyncError::Remote`] or [`SyncError::Timeout`] if the fetch
    ///   failed. Nothing changes and the resync stays scheduled.
    pub async fn full_resync(&self) -> Result<PullReport, SyncError> {
        let _cycle = self.cycle.lock().await;
        self.resync_locked().await
    }

    /// One sync cycle: a full resync if one is scheduled, then push, then
    /// pull.
    ///
    /// The pull runs even when the push failed, unless the session is
    /// gone.
    ///
    /// # Errors
    ///
    /// Returns the resync error if a scheduled resync failed, otherwise the
    /// push error, otherwise the pull error.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let _cycle = self.cycle.lock().await;
        let resync_scheduled = self.core.lock().await.resync.is_some();
        let resync = if resync_scheduled {
            Some(self.resync_locked().await?)
        } else {
            None
        };
        let push = match self.push_locked().await {
            Err(err) if err.is_auth() => return Err(err),
            other => other,
        };
        let pull = self.pull_locked().await;
        Ok(SyncReport {
            resync,
            push: push?,
            pull: pull?,
        })
    }

    /// A user-requested sync: reopens the retry gate first.
    ///
    /// # Errors
    ///
    /// Same as [`sync`](Self::sync).
    pub async fn sync_now(&self) -> Result<SyncReport, SyncError> {
        self.core.lock().await.gate.record_success();
        self.sync().await
    }

    /// Lift the sign-in pause and wake the background loop.
    pub async fn resume_after_sign_in(&self) {
        let mut core = self.core.lock().await;
        core.signed_out = false;
        core.push_error = None;
        core.fetch_error = None;
        core.gate.record_success();
        info!("sync resumed after sign-in");
        self.publish(&core, None);
        drop(core);
        self.wake.notify_one();
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The state derived from the current log.
    pub async fn derived_state(&self) -> DerivedState {
        let mut guard = self.core.lock().await;
        let core = &mut *guard;
        core.memo.get_or_derive(&core.log, &self.rules).clone()
    }

    /// Resources available at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Clock`] if `now` is out of range.
    pub async fn resources(&self, now: DateTime<Utc>) -> Result<ResourceState, SyncError> {
        let mut guard = self.core.lock().await;
        let core = &mut *guard;
        let state = core.memo.get_or_derive(&core.log, &self.rules);
        Ok(resources_at(state, &self.rules, now)?)
    }

    /// Every event in the local log, in append order.
    pub async fn events(&self) -> Vec<Event> {
        self.core.lock().await.log.as_slice().to_vec()
    }

    /// The pull cursor.
    pub async fn cursor(&self) -> Option<DateTime<Utc>> {
        self.core.lock().await.cursor
    }

    /// Ids of local events not yet confirmed.
    pub async fn pending(&self) -> BTreeSet<EventId> {
        self.core.lock().await.pending.clone()
    }

    /// Ids of local events the remote store refused for good.
    pub async fn rejected(&self) -> BTreeSet<EventId> {
        self.core.lock().await.rejected.clone()
    }

    /// Whether a full resync is scheduled.
    pub async fn resync_scheduled(&self) -> bool {
        self.core.lock().await.resync.is_some()
    }

    /// The latest status.
    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// A receiver that sees every status change.
    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// The rules derivation and validation use.
    pub const fn rules(&self) -> &ReplayRules {
        &self.rules
    }

    // -----------------------------------------------------------------------
    // Background loop
    // -----------------------------------------------------------------------

    /// Run sync in the background until `shutdown` resolves.
    ///
    /// A cycle runs on every poll interval tick and whenever a local append
    /// or sign-in wakes the loop. Rows from the change feed are ingested as
    /// they arrive; a lost feed is reopened on the next tick. Failures are
    /// reported through the status signal only.
    pub async fn run<F>(self: Arc<Self>, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut feed: Option<mpsc::Receiver<RemoteEvent>> = None;
        tokio::pin!(shutdown);

        info!(
            poll_interval_ms = u64::try_from(self.settings.poll_interval.as_millis()).unwrap_or(u64::MAX),
            "sync loop started"
        );

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    if feed.is_none() {
                        feed = self.open_feed().await;
                    }
                    self.background_sync().await;
                }
                () = self.wake.notified() => self.background_sync().await,
                row = next_row(&mut feed) => match row {
                    Some(row) => {
                        if let Err(err) = self.realtime_ingest(row).await {
                            warn!(error = %err, "realtime ingest failed");
                        }
                    }
                    None => {
                        warn!("change feed closed");
                        feed = None;
                    }
                },
            }
        }

        info!("sync loop stopped");
    }

    async fn background_sync(&self) {
        match self.sync().await {
            Ok(report) => debug!(?report, "sync cycle complete"),
            Err(SyncError::SignInRequired) => debug!("sync paused until sign-in"),
            Err(err) => debug!(error = %err, "sync cycle failed"),
        }
    }

    async fn open_feed(&self) -> Option<mpsc::Receiver<RemoteEvent>> {
        if self.core.lock().await.signed_out {
            return None;
        }
        match self.bounded("subscribe", self.remote.subscribe()).await {
            Ok(feed) => {
                debug!("change feed open");
                Some(feed)
            }
            Err(err) => {
                debug!(error = %err, "change feed unavailable");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Steps, with the cycle lock held
    // -----------------------------------------------------------------------

    async fn push_locked(&self) -> Result<PushReport, SyncError> {
        let (batch, unencodable) = {
            let mut core = self.core.lock().await;
            if core.signed_out {
                return Err(SyncError::SignInRequired);
            }
            if core.pending.is_empty() {
                return Ok(PushReport::default());
            }
            if !core.gate.is_open(Instant::now()) {
                return Ok(PushReport {
                    remaining: core.pending.len(),
                    deferred: true,
                    ..PushReport::default()
                });
            }
            let mut batch = Vec::with_capacity(core.pending.len());
            let mut unencodable = Vec::new();
            for event in core.log.iter().filter(|event| core.pending.contains(&event.client_id)) {
                match RemoteInsert::from_event(event) {
                    Ok(insert) => batch.push(insert),
                    Err(err) => unencodable.push((event.client_id, SyncError::from(err))),
                }
            }
            for (id, err) in &unencodable {
                core.reject(*id, err);
            }
            self.publish(&core, Some(SyncState::PushingPending));
            (batch, unencodable.len())
        };

        let mut confirmed = Vec::with_capacity(batch.len());
        let mut refused = Vec::new();
        let mut failure = None;
        for insert in batch {
            let id = insert.client_event_id;
            match self.bounded("insert", self.remote.insert(insert)).await {
                Ok(InsertOutcome::Inserted { arrived_at }) => confirmed.push((id, Some(arrived_at))),
                Ok(InsertOutcome::Duplicate) => {
                    debug!(%id, "remote store already had event");
                    confirmed.push((id, None));
                }
                Err(err) if err.is_rejection() => refused.push((id, err)),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        let mut core = self.core.lock().await;
        for (id, arrived_at) in &confirmed {
            core.confirm(id, *arrived_at);
        }
        for (id, err) in &refused {
            core.reject(*id, err);
        }
        let rejected = unencodable.saturating_add(refused.len());
        let result = match failure {
            Some(err) => {
                let delay = core.gate.record_failure(Instant::now());
                core.record_push_failure(&err);
                warn!(
                    error = %err,
                    confirmed = confirmed.len(),
                    rejected,
                    pending = core.pending.len(),
                    retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "push failed"
                );
                Err(err)
            }
            None => {
                core.gate.record_success();
                if rejected == 0 {
                    core.push_error = None;
                }
                Ok(PushReport {
                    confirmed: confirmed.len(),
                    duplicates: confirmed.iter().filter(|(_, at)| at.is_none()).count(),
                    rejected,
                    remaining: core.pending.len(),
                    deferred: false,
                })
            }
        };
        let persisted = self.persist(&mut core);
        self.publish(&core, None);
        persisted.and(result)
    }

    async fn pull_locked(&self) -> Result<PullReport, SyncError> {
        let cursor = self.begin_fetch().await?;
        let overlap = TimeDelta::from_std(self.settings.pull_overlap).unwrap_or(TimeDelta::MAX);
        let since = cursor.map(|cursor| {
            cursor
                .checked_sub_signed(overlap)
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        });
        let fetched = self.bounded("fetch", self.remote.fetch_since(since)).await;

        let mut core = self.core.lock().await;
        let rows = match fetched {
            Ok(rows) => rows,
            Err(err) => return self.fail_fetch(&mut core, err),
        };
        let merged = core.absorb(&rows);
        let newest = rows.iter().map(|row| row.arrived_at).max();
        core.cursor = core.cursor.max(newest);
        core.fetch_error = None;

        let report = PullReport {
            fetched: rows.len(),
            merged,
            cursor: core.cursor,
        };
        debug!(?report, "pull complete");
        let persisted = self.persist(&mut core);
        self.publish(&core, None);
        persisted.map(|()| report)
    }

    async fn resync_locked(&self) -> Result<PullReport, SyncError> {
        self.begin_fetch().await?;
        let fetched = self.bounded("fetch", self.remote.fetch_since(None)).await;

        let mut core = self.core.lock().await;
        let rows = match fetched {
            Ok(rows) => rows,
            Err(err) => return self.fail_fetch(&mut core, err),
        };
        let remote_ids: HashSet<EventId> = rows.iter().map(|row| row.client_event_id).collect();
        let merged = core.absorb(&rows);
        let pending: BTreeSet<EventId> = core
            .log
            .iter()
            .map(|event| event.client_id)
            .filter(|id| !remote_ids.contains(id) && !core.rejected.contains(id))
            .collect();
        core.pending = pending;
        core.cursor = rows.iter().map(|row| row.arrived_at).max();
        core.resync = None;
        core.fetch_error = None;
        core.gate.record_success();

        let report = PullReport {
            fetched: rows.len(),
            merged,
            cursor: core.cursor,
        };
        info!(?report, pending = core.pending.len(), "full resync complete");
        let persisted = self.persist(&mut core);
        self.publish(&core, None);
        persisted.map(|()| report)
    }

    /// Check the session and mark a fetch as started. Returns the cursor.
    async fn begin_fetch(&self) -> Result<Option<DateTime<Utc>>, SyncError> {
        let core = self.core.lock().await;
        if core.signed_out {
            return Err(SyncError::SignInRequired);
        }
        self.publish(&core, Some(SyncState::Syncing));
        Ok(core.cursor)
    }

    fn fail_fetch<T>(&self, core: &mut Core, err: SyncError) -> Result<T, SyncError> {
        core.record_fetch_failure(&err);
        warn!(error = %err, cursor = ?core.cursor, "fetch failed");
        self.publish(core, None);
        Err(err)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Await a remote call, giving up after the request timeout.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, RemoteError>>,
    ) -> Result<T, SyncError> {
        match tokio::time::timeout(self.settings.request_timeout, call).await {
            Ok(result) => result.map_err(SyncError::from),
            Err(_elapsed) => Err(SyncError::Timeout { operation }),
        }
    }

    fn persist(&self, core: &mut Core) -> Result<(), SyncError> {
        match self.cache.store(&core.snapshot()) {
            Ok(()) => {
                core.cache_error = None;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "cache write failed");
                core.cache_error = Some(SyncFailure::Cache(err.to_string()));
                Err(err.into())
            }
        }
    }

    fn publish(&self, core: &Core, phase: Option<SyncState>) {
        self.status.send_replace(core.status(phase));
    }
}

async fn next_row(feed: &mut Option<mpsc::Receiver<RemoteEvent>>) -> Option<RemoteEvent> {
    match feed {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
