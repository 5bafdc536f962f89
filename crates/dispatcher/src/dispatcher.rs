//! Dispatcher - rate-limited submission queue with a self-stopping cycle
//!
//! `submit` enqueues and, when the cycle is dormant, starts exactly one
//! controller task. The controller fires once per window, dispatches at most
//! `max_per_window` documents, and stops itself once it observes an empty
//! queue at the end of a window. Queue and cycle state share one mutex; the
//! transport call runs outside it.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use contracts::{ContractError, DispatcherBlueprint, Document, Transport};
use observability::{DispatchStatsAggregator, MetricsSummary};

use crate::encoder::{JsonEncoder, PayloadEncoder};
use crate::error::DispatcherError;
use crate::failure::{failure_channel, DispatchFailure, FailureKind, FailureReporter};
use crate::metrics::DispatcherMetrics;
use crate::queue::{CycleState, PendingItem, SubmissionQueue, WindowOutcome};
use crate::rate::RateConfig;
use crate::transports::AnyTransport;

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder<D, T, E = JsonEncoder> {
    rate: RateConfig,
    transport: T,
    encoder: E,
    failures: Option<mpsc::Sender<DispatchFailure>>,
    _document: PhantomData<fn(D)>,
}

impl<D, T> DispatcherBuilder<D, T, JsonEncoder> {
    /// Create a new DispatcherBuilder with the JSON encoder
    pub fn new(rate: RateConfig, transport: T) -> Self {
        Self {
            rate,
            transport,
            encoder: JsonEncoder,
            failures: None,
            _document: PhantomData,
        }
    }
}

impl<D, T, E> DispatcherBuilder<D, T, E> {
    /// Replace the serializer
    pub fn encoder<E2>(self, encoder: E2) -> DispatcherBuilder<D, T, E2> {
        DispatcherBuilder {
            rate: self.rate,
            transport: self.transport,
            encoder,
            failures: self.failures,
            _document: PhantomData,
        }
    }

    /// Send a `DispatchFailure` for every dropped document
    ///
    /// The controller never waits on this channel; events are dropped with a
    /// warning when it is full.
    pub fn report_failures(mut self, tx: mpsc::Sender<DispatchFailure>) -> Self {
        self.failures = Some(tx);
        self
    }
}

impl<D, T, E> DispatcherBuilder<D, T, E>
where
    D: Send + 'static,
    T: Transport + Sync + 'static,
    E: PayloadEncoder<D> + 'static,
{
    /// Build the dispatcher
    ///
    /// Performs no I/O and starts no task; the runtime handle is captured so
    /// `submit` can be called from any thread later.
    #[instrument(
        name = "dispatcher_builder_build",
        skip(self),
        fields(
            window_ms = self.rate.window().as_millis() as u64,
            max_per_window = self.rate.max_per_window(),
            transport = %self.transport.name()
        )
    )]
    pub fn build(self) -> Result<Dispatcher<D, T, E>, DispatcherError> {
        let runtime = Handle::try_current().map_err(|_| DispatcherError::NoRuntime)?;
        let (cycle_tx, _) = watch::channel(CycleState::Dormant);

        let inner = Inner {
            rate: self.rate,
            queue: Mutex::new(SubmissionQueue::new()),
            transport: self.transport,
            encoder: self.encoder,
            metrics: Arc::new(DispatcherMetrics::new()),
            stats: Mutex::new(DispatchStatsAggregator::new()),
            failures: self.failures.map(FailureReporter::new),
            cycle_tx,
            runtime,
        };

        debug!("Dispatcher created");

        Ok(Dispatcher {
            inner: Arc::new(inner),
        })
    }
}

/// Rate-limited document dispatcher
///
/// Cheap to clone; clones share the queue and the cycle. Dropping every
/// handle does not cancel an active cycle: it keeps draining until the queue
/// is empty.
pub struct Dispatcher<D, T, E = JsonEncoder> {
    inner: Arc<Inner<D, T, E>>,
}

impl<D, T, E> Clone for Dispatcher<D, T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<D, T, E> {
    rate: RateConfig,
    queue: Mutex<SubmissionQueue<D>>,
    transport: T,
    encoder: E,
    metrics: Arc<DispatcherMetrics>,
    stats: Mutex<DispatchStatsAggregator>,
    failures: Option<FailureReporter>,
    cycle_tx: watch::Sender<CycleState>,
    runtime: Handle,
}

impl<D, T, E> Dispatcher<D, T, E>
where
    D: Send + 'static,
    T: Transport + Sync + 'static,
    E: PayloadEncoder<D> + 'static,
{
    /// Queue a document for dispatch
    ///
    /// Never blocks on I/O and never fails; the outcome of the eventual
    /// dispatch is only visible through logs, metrics and failure events.
    pub fn submit(&self, document: D) {
        let enqueued = {
            let mut queue = self.inner.lock_queue();
            let enqueued = queue.push(document);
            self.inner.metrics.set_queue_len(enqueued.queue_len);
            if enqueued.activated {
                self.inner.mark_active();
            }
            enqueued
        };

        self.inner.metrics.inc_submitted();
        observability::record_document_submitted(enqueued.queue_len);
        debug!(
            sequence = enqueued.sequence,
            queue_len = enqueued.queue_len,
            "Document queued"
        );

        if enqueued.activated {
            let controller = Controller {
                inner: Arc::clone(&self.inner),
                finished: false,
            };
            // If the runtime is already shut down the task is dropped right
            // away and `Controller::drop` puts the cycle back to `Dormant`.
            self.inner.runtime.spawn(controller.run());
        }
    }

    /// Resolve once the cycle is dormant (immediately if it never started)
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.cycle_tx.subscribe();
        // Only fails if the sender is gone, which `self` rules out
        let _ = rx.wait_for(|state| *state == CycleState::Dormant).await;
    }
}

impl<D, T, E> Dispatcher<D, T, E> {
    /// Current cycle state
    pub fn cycle_state(&self) -> CycleState {
        self.inner.lock_queue().cycle()
    }

    /// Documents waiting for a window
    pub fn queue_len(&self) -> usize {
        self.inner.lock_queue().len()
    }

    /// Rate configuration
    pub fn rate(&self) -> RateConfig {
        self.inner.rate
    }

    /// The injected transport
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Live counters
    pub fn metrics(&self) -> &Arc<DispatcherMetrics> {
        &self.inner.metrics
    }

    /// Aggregated batch size / queue wait statistics
    pub fn stats_summary(&self) -> MetricsSummary {
        self.inner
            .stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .summary()
    }
}

/// Owns one active cycle
///
/// Dropped without finishing (runtime shut down, task aborted) it resets the
/// cycle to `Dormant` so `wait_idle` resolves and the next `submit` starts a
/// new controller. Queued documents are kept.
struct Controller<D, T, E> {
    inner: Arc<Inner<D, T, E>>,
    finished: bool,
}

impl<D, T, E> Controller<D, T, E>
where
    D: Send + 'static,
    T: Transport + Sync + 'static,
    E: PayloadEncoder<D> + 'static,
{
    async fn run(mut self) {
        Arc::clone(&self.inner).run_cycle().await;
        self.finished = true;
    }
}

impl<D, T, E> Drop for Controller<D, T, E> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let queued = {
            let mut queue = self.inner.lock_queue();
            if queue.abandon_cycle() {
                self.inner.mark_dormant();
            }
            queue.len()
        };
        warn!(queued, "Cycle controller dropped before the queue drained, cycle reset");
    }
}

impl<D, T, E> Inner<D, T, E> {
    fn lock_queue(&self) -> MutexGuard<'_, SubmissionQueue<D>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_stats(&self) -> MutexGuard<'_, DispatchStatsAggregator> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Dormant -> Active bookkeeping; caller holds the queue lock
    fn mark_active(&self) {
        self.metrics.controller_started();
        self.cycle_tx.send_replace(CycleState::Active);
        observability::record_cycle_transition(true);
    }

    /// Active -> Dormant bookkeeping; caller holds the queue lock
    fn mark_dormant(&self) {
        self.metrics.controller_stopped();
        self.cycle_tx.send_replace(CycleState::Dormant);
        observability::record_cycle_transition(false);
    }
}

impl<D, T, E> Inner<D, T, E>
where
    D: Send + 'static,
    T: Transport + Sync + 'static,
    E: PayloadEncoder<D> + 'static,
{
    /// Cycle controller: one drain per tick until the queue is observed empty
    #[instrument(
        name = "dispatcher_cycle",
        skip(self),
        fields(
            window_ms = self.rate.window().as_millis() as u64,
            max_per_window = self.rate.max_per_window()
        )
    )]
    async fn run_cycle(self: Arc<Self>) {
        info!("Cycle controller started");

        let mut ticker = time::interval(self.rate.window());
        // A slow window pushes later windows back instead of bursting to catch up
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut windows: u64 = 0;
        loop {
            ticker.tick().await;
            windows += 1;
            if self.drain_window().await == WindowOutcome::Deactivated {
                break;
            }
        }

        info!(windows, "Queue drained, cycle controller stopped");
    }

    /// One firing: bounded drain, then the dormancy decision
    #[instrument(name = "dispatcher_drain_window", skip(self))]
    async fn drain_window(&self) -> WindowOutcome {
        let limit = self.rate.max_per_window();
        self.metrics.inc_windows_fired();

        let mut attempted = 0;
        while attempted < limit {
            // One pop per dispatch; the lock is released before the transport call
            let next = {
                let mut queue = self.lock_queue();
                let next = queue.pop();
                self.metrics.set_queue_len(queue.len());
                next
            };
            let Some(item) = next else {
                break;
            };
            self.dispatch_one(item).await;
            attempted += 1;
        }

        self.lock_stats().record_window(attempted);

        let (outcome, remaining) = {
            let mut queue = self.lock_queue();
            let outcome = queue.finish_window();
            self.metrics.set_queue_len(queue.len());
            if outcome == WindowOutcome::Deactivated {
                self.mark_dormant();
            }
            (outcome, queue.len())
        };

        observability::record_window_fired(attempted, remaining);
        debug!(attempted, remaining, "Window drained");
        outcome
    }

    /// Encode and send one document; failures are recorded, never propagated
    async fn dispatch_one(&self, item: PendingItem<D>) {
        let PendingItem {
            sequence,
            enqueued_at,
            document,
        } = item;
        let wait = enqueued_at.elapsed();
        observability::record_queue_wait_ms(wait.as_secs_f64() * 1000.0);

        let payload = match self.encoder.encode(&document) {
            Ok(payload) => payload,
            Err(e) => {
                self.record_failure(sequence, FailureKind::Encoding, &e, wait);
                return;
            }
        };
        drop(document);

        match self.transport.send(payload).await {
            Ok(()) => {
                self.metrics.inc_dispatched();
                self.lock_stats()
                    .record_outcome(true, wait.as_secs_f64() * 1000.0);
                observability::record_document_dispatched(self.transport.name(), true);
                debug!(sequence, "Document dispatched");
            }
            Err(e) => {
                observability::record_document_dispatched(self.transport.name(), false);
                self.record_failure(sequence, FailureKind::Transport, &e, wait);
            }
        }
    }

    fn record_failure(&self, sequence: u64, kind: FailureKind, err: &ContractError, wait: Duration) {
        match kind {
            FailureKind::Encoding => self.metrics.inc_encoding_failures(),
            FailureKind::Transport => self.metrics.inc_transport_failures(),
        }
        self.lock_stats()
            .record_outcome(false, wait.as_secs_f64() * 1000.0);
        observability::record_dispatch_failure(kind.as_str());

        error!(
            sequence,
            kind = kind.as_str(),
            error = %err,
            "Dispatch failed, document dropped"
        );

        if let Some(reporter) = &self.failures {
            reporter.report(DispatchFailure::new(sequence, kind, err.to_string()));
        }
    }
}

/// Create a JSON-encoding dispatcher
///
/// # Errors
/// `InvalidConfiguration` when `max_per_window < 1` or `window` is zero;
/// `NoRuntime` outside a tokio runtime.
pub fn create<D, T>(
    window: Duration,
    max_per_window: i64,
    transport: T,
) -> Result<Dispatcher<D, T>, DispatcherError>
where
    D: Serialize + Send + 'static,
    T: Transport + Sync + 'static,
{
    let rate = RateConfig::new(window, max_per_window)?;
    DispatcherBuilder::new(rate, transport).build()
}

/// Create a document dispatcher from a loaded configuration
///
/// Returns the dispatcher and the receiving side of its failure channel.
#[instrument(name = "dispatcher_create", skip(blueprint))]
pub fn create_dispatcher(
    blueprint: &DispatcherBlueprint,
) -> Result<
    (
        Dispatcher<Document, AnyTransport>,
        mpsc::Receiver<DispatchFailure>,
    ),
    DispatcherError,
> {
    let rate = RateConfig::from_settings(&blueprint.rate)?;
    let name = match blueprint.transport.kind {
        contracts::TransportKind::Http => "http",
        contracts::TransportKind::Log => "log",
    };
    let transport = AnyTransport::from_settings(name, &blueprint.transport)?;
    let (failure_tx, failure_rx) = failure_channel(blueprint.failures.channel_capacity.max(1));

    let dispatcher = DispatcherBuilder::new(rate, transport)
        .report_failures(failure_tx)
        .build()?;

    Ok((dispatcher, failure_rx))
}
