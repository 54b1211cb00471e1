use super::config::{Config, ConfigError, RequeueMode};
use crate::buffer::{Batch, BatchTrigger, FlushTimer, LogBuffer};
use crate::domain::{ClientError, LogEntry, LogLevel, RawError, accept};
use crate::reliability::DeliveryEngine;
use crate::sanitizer::Sanitizer;
use crate::sender::{ClientStats, EntryTransmitter, HttpClient, StatsSnapshot};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Uninitialized,
    Running,
    ShuttingDown,
    Stopped,
}

impl LifecycleState {
    pub fn accepts_entries(self) -> bool {
        matches!(self, LifecycleState::Uninitialized | LifecycleState::Running)
    }
}

/// What a single call to `flush` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was buffered.
    Empty,
    /// Another flush held the flag; this call did nothing.
    InProgress,
    /// Every entry in the snapshot was delivered.
    Delivered { count: usize },
    /// At least one entry failed and entries went back into the buffer.
    Requeued {
        delivered: usize,
        failed: usize,
        requeued: usize,
    },
    /// The client is stopped.
    AlreadyShutDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub final_flush: FlushOutcome,
    /// Entries still buffered after the final flush; they are dropped.
    pub discarded: usize,
}

struct ClientInner {
    config: Config,
    state: RwLock<LifecycleState>,
    buffer: Mutex<LogBuffer>,
    context: RwLock<Map<String, Value>>,
    sanitizer: Sanitizer,
    engine: DeliveryEngine,
    stats: Arc<ClientStats>,
    // Held from snapshot to requeue. `try_lock` failing means a flush is in flight.
    flushing: Arc<AsyncMutex<()>>,
    timer: Mutex<Option<FlushTimer>>,
    host: Option<String>,
}

/// Log shipping client: ingestion, buffering, delivery and lifecycle.
///
/// Cheap to clone; clones share one buffer, context and delivery engine.
#[derive(Clone)]
pub struct LogClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for LogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogClient")
            .field("project_id", &self.inner.config.project_id)
            .field("state", &self.state())
            .field("buffered", &self.buffered_len())
            .finish()
    }
}

impl LogClient {
    /// Validates `config` and builds the client without touching the network.
    ///
    /// The flush timer is not armed until [`LogClient::start`].
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let stats = Arc::new(ClientStats::new());
        let http = HttpClient::new(config.sender_config())
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        let engine = DeliveryEngine::new(
            EntryTransmitter::new(http, stats.clone()),
            config.retry_policy(),
            stats.clone(),
        );

        let host = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok());

        let inner = ClientInner {
            state: RwLock::new(LifecycleState::Uninitialized),
            buffer: Mutex::new(LogBuffer::new(config.batch_size)),
            context: RwLock::new(Map::new()),
            sanitizer: Sanitizer::new(config.sanitization.clone()),
            config,
            engine,
            stats,
            flushing: Arc::new(AsyncMutex::new(())),
            timer: Mutex::new(None),
            host,
        };

        debug!(config = ?inner.config, "Log client created");
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Builds the client and arms its flush timer.
    pub fn init(config: Config) -> Result<Self, ClientError> {
        let client = Self::new(config)?;
        client.start()?;
        Ok(client)
    }

    /// Arms the periodic flush timer and moves to `Running`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), ClientError> {
        Handle::try_current().map_err(|e| ClientError::Runtime(e.to_string()))?;

        let mut state = self.inner.state.write();
        match *state {
            LifecycleState::Uninitialized => {}
            LifecycleState::Running => return Err(ClientError::AlreadyRunning),
            LifecycleState::ShuttingDown | LifecycleState::Stopped => {
                return Err(ClientError::ShutDown);
            }
        }

        let weak: Weak<ClientInner> = Arc::downgrade(&self.inner);
        let timer = FlushTimer::start(self.inner.config.flush_interval, move || {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.flush(BatchTrigger::TimeBased).await;
                }
            }
        });
        *self.inner.timer.lock() = Some(timer);
        *state = LifecycleState::Running;

        info!(
            endpoint = %self.inner.config.endpoint,
            project_id = %self.inner.config.project_id,
            flush_interval_ms = self.inner.config.flush_interval.as_millis() as u64,
            batch_size = self.inner.config.batch_size,
            "Log client started"
        );
        Ok(())
    }

    /// Single ingestion entry point. Never fails: rejected, filtered or
    /// dropped entries are counted in [`LogClient::stats`].
    pub fn log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        error: Option<RawError>,
        data: Option<Value>,
    ) {
        self.inner
            .ingest(level, message.into(), error, data, Map::new());
    }

    /// Like [`LogClient::log`], with caller metadata merged over the
    /// client's own.
    pub fn log_with_metadata(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        error: Option<RawError>,
        data: Option<Value>,
        metadata: Map<String, Value>,
    ) {
        self.inner
            .ingest(level, message.into(), error, data, metadata);
    }

    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message, None, None);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message, None, None);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message, None, None);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message, None, None);
    }

    pub fn error(&self, message: impl Into<String>, error: Option<RawError>) {
        self.log(LogLevel::Error, message, error, None);
    }

    pub fn fatal(&self, message: impl Into<String>, error: Option<RawError>) {
        self.log(LogLevel::Fatal, message, error, None);
    }

    /// Shallow-merges `context` into the global context; later keys win.
    pub fn set_context(&self, context: Map<String, Value>) {
        self.inner.context.write().extend(context);
    }

    pub fn get_context(&self) -> Map<String, Value> {
        self.inner.context.read().clone()
    }

    pub fn clear_context(&self) {
        self.inner.context.write().clear();
    }

    /// Delivers everything currently buffered.
    ///
    /// A no-op when a flush is already running or the buffer is empty.
    pub async fn flush(&self) -> FlushOutcome {
        self.inner.flush(BatchTrigger::Manual).await
    }

    /// Stops ingestion, cancels the timer, waits for any in-flight flush and
    /// makes one final best-effort flush. Idempotent.
    pub async fn shutdown(&self) -> ShutdownReport {
        {
            let mut state = self.inner.state.write();
            if !state.accepts_entries() {
                return ShutdownReport {
                    final_flush: FlushOutcome::AlreadyShutDown,
                    discarded: 0,
                };
            }
            *state = LifecycleState::ShuttingDown;
        }
        info!("Log client shutting down");

        let timer = self.inner.timer.lock().take();
        if let Some(timer) = timer {
            timer.stop().await;
        }

        // Waits out any flush still in flight, then flushes under the same guard.
        let guard = Arc::clone(&self.inner.flushing).lock_owned().await;
        let final_flush = self.inner.flush_locked(BatchTrigger::Shutdown, guard).await;

        let discarded = {
            let mut buffer = self.inner.buffer.lock();
            let leftover = buffer.len();
            buffer.take_batch(BatchTrigger::Shutdown);
            leftover
        };
        if discarded > 0 {
            self.inner.stats.record_discarded(discarded);
            warn!(discarded, "Discarding undelivered entries at shutdown");
        }

        *self.inner.state.write() = LifecycleState::Stopped;
        info!(?final_flush, "Log client stopped");

        ShutdownReport {
            final_flush,
            discarded,
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.inner.state.read()
    }

    pub fn buffered_len(&self) -> usize {
        self.inner.buffer.lock().len()
    }

    /// Copies of the entries currently buffered, oldest first.
    pub fn buffered_entries(&self) -> Vec<LogEntry> {
        self.inner.buffer.lock().iter().cloned().collect()
    }

    pub fn is_flushing(&self) -> bool {
        self.inner.flushing.try_lock().is_err()
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.inner.sanitizer
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}

impl ClientInner {
    fn ingest(
        self: &Arc<Self>,
        level: LogLevel,
        message: String,
        error: Option<RawError>,
        data: Option<Value>,
        metadata: Map<String, Value>,
    ) {
        if !self.state.read().accepts_entries() {
            self.stats.record_rejected();
            warn!(%level, "Log client is shutting down, entry rejected");
            return;
        }

        if !accept(level, self.config.min_level) {
            self.stats.record_filtered();
            return;
        }

        let entry = self.build_entry(level, message, error, data, metadata);
        let Some(entry) = self.sanitizer.sanitize(entry) else {
            self.stats.record_dropped();
            return;
        };

        let runtime = Handle::try_current().ok();
        let size_flush = {
            // Shutdown flips the state under the write lock, so nothing lands
            // in the buffer once it has started draining.
            let state = self.state.read();
            if !state.accepts_entries() {
                self.stats.record_rejected();
                warn!(%level, "Log client is shutting down, entry rejected");
                return;
            }
            let mut buffer = self.buffer.lock();
            let full = buffer.push(entry);
            self.stats.record_accepted();
            if full {
                self.take_size_batch(&mut buffer, runtime.is_some())
            } else {
                None
            }
        };

        if let (Some((batch, guard)), Some(runtime)) = (size_flush, runtime) {
            let inner = Arc::clone(self);
            runtime.spawn(async move {
                inner.deliver(batch, guard).await;
            });
        }
    }

    // Cut while the buffer lock is still held: entries logged after the
    // threshold push go to the next cycle, not into this batch.
    fn take_size_batch(
        &self,
        buffer: &mut LogBuffer,
        has_runtime: bool,
    ) -> Option<(Batch, OwnedMutexGuard<()>)> {
        if !has_runtime {
            debug!("No runtime for size-triggered flush, leaving it to the timer");
            return None;
        }
        let Ok(guard) = Arc::clone(&self.flushing).try_lock_owned() else {
            self.stats.record_flush_skipped();
            debug!(trigger = ?BatchTrigger::SizeBased, "Flush already in progress, skipping");
            return None;
        };
        let batch = buffer.take_batch(BatchTrigger::SizeBased)?;
        Some((batch, guard))
    }

    fn build_entry(
        &self,
        level: LogLevel,
        message: String,
        error: Option<RawError>,
        data: Option<Value>,
        metadata: Map<String, Value>,
    ) -> LogEntry {
        let mut entry_metadata = Map::new();
        if let Some(host) = &self.host {
            entry_metadata.insert("host".to_string(), Value::String(host.clone()));
        }
        entry_metadata.insert(
            "sdkVersion".to_string(),
            Value::String(crate::VERSION.to_string()),
        );
        entry_metadata.extend(metadata);

        let mut entry = LogEntry::new(level, message)
            .with_context(self.context.read().clone())
            .with_metadata(entry_metadata);
        entry.service = self.config.service.clone();
        entry.environment = self.config.environment.clone();
        entry.data = data;
        entry.error = error.map(RawError::normalize);
        entry
    }

    async fn flush(&self, trigger: BatchTrigger) -> FlushOutcome {
        if *self.state.read() == LifecycleState::Stopped {
            return FlushOutcome::AlreadyShutDown;
        }

        let Ok(guard) = Arc::clone(&self.flushing).try_lock_owned() else {
            self.stats.record_flush_skipped();
            debug!(?trigger, "Flush already in progress, skipping");
            return FlushOutcome::InProgress;
        };
        self.flush_locked(trigger, guard).await
    }

    async fn flush_locked(&self, trigger: BatchTrigger, guard: OwnedMutexGuard<()>) -> FlushOutcome {
        // Snapshot and reset before any I/O so new entries go to the next cycle.
        let Some(batch) = self.buffer.lock().take_batch(trigger) else {
            return FlushOutcome::Empty;
        };
        self.deliver(batch, guard).await
    }

    async fn deliver(&self, batch: Batch, _guard: OwnedMutexGuard<()>) -> FlushOutcome {
        self.stats.record_flush_started();
        debug!(
            batch_id = batch.id(),
            size = batch.size(),
            trigger = ?batch.trigger(),
            "Flushing batch"
        );

        let outcome = self.engine.deliver_batch(&batch).await;
        if outcome.is_success() {
            return FlushOutcome::Delivered {
                count: outcome.delivered(),
            };
        }

        let delivered = outcome.delivered();
        let failed = outcome.results.len() - delivered;
        let entries = batch.into_entries();
        let requeue: Vec<LogEntry> = match self.config.requeue_mode {
            RequeueMode::WholeBatch => entries,
            RequeueMode::FailedOnly => entries
                .into_iter()
                .zip(outcome.results.iter())
                .filter(|(_, result)| result.is_err())
                .map(|(entry, _)| entry)
                .collect(),
        };
        let requeued = requeue.len();

        self.buffer.lock().requeue_front(requeue);
        self.stats.record_requeued(requeued);
        warn!(
            batch_id = %outcome.batch_id,
            delivered,
            failed,
            requeued,
            error = ?outcome.first_error().map(ToString::to_string),
            "Flush failed, entries requeued"
        );

        FlushOutcome::Requeued {
            delivered,
            failed,
            requeued,
        }
    }
}
