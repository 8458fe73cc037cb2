//! Channel registry for scoped real-time subscriptions.
//!
//! Owns at most one transport channel, for the active scope, and drives
//! everything attached to it from a single background task:
//!
//! - Opening the channel and registering one handler per descriptor entry
//! - Routing inbound payloads through the dispatcher into the debouncer
//! - Releasing expired debounce deadlines as cache invalidations
//! - Feeding transport status into the reconnection controller and
//!   resubscribing when a retry deadline passes
//! - Tearing the channel down on scope change, close, shutdown or drop
//!
//! Callbacks handed to the transport carry the epoch of the scope they were
//! registered for, and status callbacks additionally carry the sequence
//! number of the subscribe call that produced them. Anything arriving with a
//! stale tag is discarded, so nothing from a retired scope or attempt can
//! reach the cache or the controller.

use std::time::Duration;

use serde_json::Value as JsonValue;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::{
    debouncer::Debouncer,
    descriptor::SubscriptionDescriptor,
    dispatcher::{Dispatch, EventDispatcher},
    error::{RealtimeError, Result},
    event_handlers::{ConnectionError, DisconnectReason, EventHandlers},
    models::{ChannelStatus, ConnectionStatus, RegistryInfo},
    options::RealtimeOptions,
    reconnect::{ConnectionState, ReconnectionController, Transition},
    scope::Scope,
    transport::{
        CacheInvalidator, OnEventCallback, OnStatusCallback, RealtimeTransport, TransportChannel,
    },
};

/// Sleep target used when no deadline is pending.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365);

// ── Commands ────────────────────────────────────────────────────────────────

/// Commands sent from the public handle to the registry task.
enum RegistryCmd {
    Open {
        scope: Scope,
        result_tx: oneshot::Sender<Result<bool>>,
    },
    Close {
        result_tx: oneshot::Sender<bool>,
    },
    Reconnect {
        result_tx: oneshot::Sender<bool>,
    },
    Info {
        result_tx: oneshot::Sender<RegistryInfo>,
    },
    Shutdown {
        result_tx: Option<oneshot::Sender<()>>,
    },
}

/// Messages enqueued by transport callbacks.
enum TransportMsg {
    Event {
        epoch: u64,
        index: usize,
        payload: JsonValue,
    },
    Status {
        epoch: u64,
        seq: u64,
        status: ChannelStatus,
        error: Option<String>,
    },
}

// ── Public handle ───────────────────────────────────────────────────────────

/// Handle to a running subscription registry.
///
/// Dropping the handle shuts the registry down and closes any open channel.
///
/// # Examples
///
/// ```rust,no_run
/// use booking_realtime::{CacheKey, RealtimeOptions, RealtimeRegistry, RealtimeTransport, Scope};
///
/// # async fn example<T: RealtimeTransport>(transport: T) -> booking_realtime::Result<()> {
/// let registry = RealtimeRegistry::builder(transport, |key: &CacheKey| {
///         println!("refetch {}", key);
///     })
///     .options(RealtimeOptions::default())
///     .spawn();
///
/// registry.open(Scope::user("u1")).await?;
/// let mut status = registry.watch_status();
/// while status.changed().await.is_ok() {
///     println!("realtime status: {}", *status.borrow());
/// }
/// # Ok(())
/// # }
/// ```
pub struct RealtimeRegistry {
    cmd_tx: mpsc::Sender<RegistryCmd>,
    status_rx: watch::Receiver<ConnectionStatus>,
    _task: JoinHandle<()>,
}

impl RealtimeRegistry {
    pub fn builder<T, C>(transport: T, cache: C) -> RealtimeRegistryBuilder<T, C>
    where
        T: RealtimeTransport,
        C: CacheInvalidator,
    {
        RealtimeRegistryBuilder {
            transport,
            cache,
            options: RealtimeOptions::default(),
            event_handlers: EventHandlers::default(),
        }
    }

    /// Open the channel for `scope`, closing the channel of any other scope
    /// first.
    ///
    /// Returns `Ok(false)` when `scope` is already open (no-op).
    pub async fn open(&self, scope: Scope) -> Result<bool> {
        self.request(|result_tx| RegistryCmd::Open { scope, result_tx })
            .await?
    }

    /// Close the open channel, dropping pending invalidations and retries.
    ///
    /// Safe to call multiple times; returns `Ok(false)` when nothing was open.
    pub async fn close(&self) -> Result<bool> {
        self.request(|result_tx| RegistryCmd::Close { result_tx }).await
    }

    /// Leave the terminal failed state: reset backoff and resubscribe on the
    /// same channel.
    ///
    /// Returns `Ok(false)` when no scope is open or the channel is not in a
    /// failed or disconnected state.
    pub async fn reconnect(&self) -> Result<bool> {
        self.request(|result_tx| RegistryCmd::Reconnect { result_tx }).await
    }

    /// Snapshot of the registry state.
    pub async fn info(&self) -> Result<RegistryInfo> {
        self.request(|result_tx| RegistryCmd::Info { result_tx }).await
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    /// Receiver that observes every status change.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Close the open channel and stop the registry task.
    ///
    /// Subsequent calls on this handle return [`RealtimeError::RegistryClosed`].
    pub async fn shutdown(&self) {
        let (result_tx, result_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(RegistryCmd::Shutdown {
                result_tx: Some(result_tx),
            })
            .await
            .is_ok()
        {
            let _ = result_rx.await;
        }
    }

    pub fn is_running(&self) -> bool {
        !self.cmd_tx.is_closed()
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(oneshot::Sender<R>) -> RegistryCmd,
    ) -> Result<R> {
        let (result_tx, result_rx) = oneshot::channel();
        self.cmd_tx.send(build(result_tx)).await.map_err(|_| {
            RealtimeError::RegistryClosed("Registry task is not running".to_string())
        })?;
        result_rx.await.map_err(|_| {
            RealtimeError::RegistryClosed("Registry task exited before replying".to_string())
        })
    }
}

impl Drop for RealtimeRegistry {
    fn drop(&mut self) {
        let _ = self.cmd_tx.try_send(RegistryCmd::Shutdown { result_tx: None });
    }
}

/// Builder for [`RealtimeRegistry`].
pub struct RealtimeRegistryBuilder<T, C> {
    transport: T,
    cache: C,
    options: RealtimeOptions,
    event_handlers: EventHandlers,
}

impl<T, C> RealtimeRegistryBuilder<T, C>
where
    T: RealtimeTransport,
    C: CacheInvalidator,
{
    pub fn options(mut self, options: RealtimeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn event_handlers(mut self, handlers: EventHandlers) -> Self {
        self.event_handlers = handlers;
        self
    }

    /// Start the registry task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn(self) -> RealtimeRegistry {
        let (cmd_tx, cmd_rx) = mpsc::channel(self.options.command_channel_capacity.max(1));
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);

        let task = RegistryTask {
            transport: self.transport,
            cache: self.cache,
            options: self.options,
            handlers: self.event_handlers,
            status_tx,
            msg_tx,
            active: None,
            epoch: 0,
        };
        let handle = tokio::spawn(task.run(cmd_rx, msg_rx));

        RealtimeRegistry {
            cmd_tx,
            status_rx,
            _task: handle,
        }
    }
}

// ── Registry task ───────────────────────────────────────────────────────────

/// Everything owned on behalf of one open scope.
struct ActiveScope<Ch> {
    epoch: u64,
    /// Sequence number of the latest subscribe call on `channel`.
    subscribe_seq: u64,
    channel_name: String,
    channel: Ch,
    descriptor: SubscriptionDescriptor,
    dispatcher: EventDispatcher,
    debouncer: Debouncer,
    controller: ReconnectionController,
}

impl<Ch: TransportChannel> ActiveScope<Ch> {
    fn resubscribe(&mut self, msg_tx: &mpsc::UnboundedSender<TransportMsg>) {
        self.subscribe_seq += 1;
        self.controller.begin_connect();
        self.channel
            .subscribe(status_callback(msg_tx, self.epoch, self.subscribe_seq));
    }

    fn next_deadline(&self) -> Option<Instant> {
        match (self.debouncer.next_deadline(), self.controller.retry_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

struct RegistryTask<T: RealtimeTransport, C> {
    transport: T,
    cache: C,
    options: RealtimeOptions,
    handlers: EventHandlers,
    status_tx: watch::Sender<ConnectionStatus>,
    msg_tx: mpsc::UnboundedSender<TransportMsg>,
    active: Option<ActiveScope<T::Channel>>,
    epoch: u64,
}

fn event_callback(
    msg_tx: &mpsc::UnboundedSender<TransportMsg>,
    epoch: u64,
    index: usize,
) -> OnEventCallback {
    let tx = msg_tx.clone();
    std::sync::Arc::new(move |payload| {
        let _ = tx.send(TransportMsg::Event {
            epoch,
            index,
            payload,
        });
    })
}

fn status_callback(
    msg_tx: &mpsc::UnboundedSender<TransportMsg>,
    epoch: u64,
    seq: u64,
) -> OnStatusCallback {
    let tx = msg_tx.clone();
    std::sync::Arc::new(move |status, error| {
        let _ = tx.send(TransportMsg::Status {
            epoch,
            seq,
            status,
            error,
        });
    })
}

impl<T, C> RegistryTask<T, C>
where
    T: RealtimeTransport,
    C: CacheInvalidator,
{
    async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<RegistryCmd>,
        mut msg_rx: mpsc::UnboundedReceiver<TransportMsg>,
    ) {
        loop {
            let deadline = self.active.as_ref().and_then(|a| a.next_deadline());
            let sleep = tokio::time::sleep_until(
                deadline.unwrap_or_else(|| Instant::now() + FAR_FUTURE),
            );
            tokio::pin!(sleep);

            tokio::select! {
                biased;

                _ = &mut sleep, if deadline.is_some() => {
                    self.fire_due(Instant::now());
                }

                Some(msg) = msg_rx.recv() => {
                    self.handle_transport(msg);
                }

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(RegistryCmd::Open { scope, result_tx }) => {
                            let _ = result_tx.send(self.open(scope));
                        },
                        Some(RegistryCmd::Close { result_tx }) => {
                            let closed = self.teardown("Channel closed by caller");
                            self.publish_status();
                            let _ = result_tx.send(closed);
                        },
                        Some(RegistryCmd::Reconnect { result_tx }) => {
                            let _ = result_tx.send(self.reconnect());
                        },
                        Some(RegistryCmd::Info { result_tx }) => {
                            let _ = result_tx.send(self.info());
                        },
                        Some(RegistryCmd::Shutdown { result_tx }) => {
                            self.teardown("Registry shut down");
                            self.publish_status();
                            if let Some(tx) = result_tx {
                                let _ = tx.send(());
                            }
                            break;
                        },
                        None => {
                            self.teardown("Registry handle dropped");
                            self.publish_status();
                            break;
                        },
                    }
                }
            }
        }
        log::debug!("[booking-realtime] Registry task stopped");
    }

    fn open(&mut self, scope: Scope) -> Result<bool> {
        scope.validate()?;

        if let Some(active) = &self.active {
            if active.descriptor.scope() == &scope {
                log::debug!(
                    "[booking-realtime] Channel '{}' already open, ignoring open",
                    active.channel_name
                );
                return Ok(false);
            }
        }

        // Status is published once, after the new channel is up.
        self.teardown("Scope changed");

        self.epoch += 1;
        let epoch = self.epoch;
        let descriptor = SubscriptionDescriptor::for_scope(&scope);
        let channel_name = descriptor.channel_name();

        let mut channel = self.transport.open_channel(&channel_name);
        for (index, spec) in descriptor.specs().iter().enumerate() {
            channel.on_event(spec.clone(), event_callback(&self.msg_tx, epoch, index));
        }

        let mut active = ActiveScope {
            epoch,
            subscribe_seq: 0,
            channel_name,
            channel,
            dispatcher: EventDispatcher::new(scope.clone()),
            debouncer: Debouncer::new(scope.debounce_window(&self.options)),
            controller: ReconnectionController::new(&self.options),
            descriptor,
        };
        active.resubscribe(&self.msg_tx);

        log::info!(
            "[booking-realtime] Opened channel '{}' for {} with {} handler(s) (epoch {})",
            active.channel_name,
            scope,
            active.descriptor.len(),
            epoch
        );

        self.active = Some(active);
        self.publish_status();
        Ok(true)
    }

    /// Close the active channel. Pending deadlines are dropped without
    /// invalidating and the controller is discarded; no failure is counted.
    fn teardown(&mut self, reason: &str) -> bool {
        let Some(mut active) = self.active.take() else {
            return false;
        };

        let dropped = active.debouncer.cancel_all();
        let was_connected = active.controller.state() == ConnectionState::Connected;
        active.controller.cancel();
        self.transport.close_channel(active.channel);

        log::info!(
            "[booking-realtime] Closed channel '{}' ({}); dropped {} pending invalidation(s)",
            active.channel_name,
            reason,
            dropped
        );

        if was_connected {
            self.handlers
                .emit_disconnect(DisconnectReason::for_channel(reason, active.channel_name));
        }
        true
    }

    fn reconnect(&mut self) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        match active.controller.state() {
            ConnectionState::Failed | ConnectionState::Disconnected => {},
            state => {
                log::debug!(
                    "[booking-realtime] Ignoring reconnect for '{}' in state {:?}",
                    active.channel_name,
                    state
                );
                return false;
            },
        }

        log::info!(
            "[booking-realtime] Manual reconnect of channel '{}'",
            active.channel_name
        );
        active.controller = ReconnectionController::new(&self.options);
        active.resubscribe(&self.msg_tx);
        self.publish_status();
        true
    }

    fn info(&self) -> RegistryInfo {
        match &self.active {
            None => RegistryInfo::closed(self.epoch),
            Some(active) => RegistryInfo {
                scope: Some(active.descriptor.scope().clone()),
                channel_name: Some(active.channel_name.clone()),
                state: active.controller.state(),
                status: active.controller.status(),
                reconnect_attempt: active.controller.attempt(),
                pending_invalidations: active.debouncer.len(),
                handler_count: active.descriptor.len(),
                epoch: active.epoch,
            },
        }
    }

    fn handle_transport(&mut self, msg: TransportMsg) {
        match msg {
            TransportMsg::Event {
                epoch,
                index,
                payload,
            } => self.handle_event(epoch, index, payload),
            TransportMsg::Status {
                epoch,
                seq,
                status,
                error,
            } => self.handle_status(epoch, seq, status, error),
        }
    }

    fn handle_event(&mut self, epoch: u64, index: usize, payload: JsonValue) {
        let Some(active) = self.active.as_mut().filter(|a| a.epoch == epoch) else {
            log::debug!(
                "[booking-realtime] Dropping event from retired channel (epoch {})",
                epoch
            );
            return;
        };

        let Some(spec) = active.descriptor.get(index) else {
            log::warn!(
                "[booking-realtime] No handler #{} on channel '{}'",
                index,
                active.channel_name
            );
            return;
        };

        match active
            .dispatcher
            .dispatch(spec, &payload, &mut active.debouncer, Instant::now())
        {
            Ok(Dispatch::Forwarded(key)) => {
                log::debug!("[booking-realtime] {} changed, debouncing {}", spec, key);
            },
            Ok(Dispatch::Skipped(reason)) => {
                log::debug!("[booking-realtime] Skipped {} event: {:?}", spec, reason);
            },
            Err(e) => {
                log::warn!(
                    "[booking-realtime] Dropping malformed event on '{}': {}",
                    active.channel_name,
                    e
                );
            },
        }
    }

    fn handle_status(
        &mut self,
        epoch: u64,
        seq: u64,
        status: ChannelStatus,
        error: Option<String>,
    ) {
        let Some(active) = self
            .active
            .as_mut()
            .filter(|a| a.epoch == epoch && a.subscribe_seq == seq)
        else {
            log::debug!(
                "[booking-realtime] Ignoring stale status {} (epoch {}, seq {})",
                status,
                epoch,
                seq
            );
            return;
        };

        let was_connected = active.controller.state() == ConnectionState::Connected;
        let transition = active.controller.on_status(status, Instant::now());
        let channel_name = active.channel_name.clone();
        let detail = match error {
            Some(e) => format!("{}: {}", status, e),
            None => status.to_string(),
        };

        match transition {
            Transition::Connected => {
                log::info!("[booking-realtime] Channel '{}' subscribed", channel_name);
                if !was_connected {
                    self.handlers.emit_connect();
                }
            },
            Transition::RetryScheduled { attempt, delay } => {
                log::warn!(
                    "[booking-realtime] Channel '{}' failed ({}); retrying in {}ms (attempt {})",
                    channel_name,
                    detail,
                    delay.as_millis(),
                    attempt
                );
                if was_connected {
                    self.handlers
                        .emit_disconnect(DisconnectReason::for_channel(&detail, &channel_name));
                }
                self.handlers.emit_error(ConnectionError::new(
                    format!("{}; retry {} in {}ms", detail, attempt, delay.as_millis()),
                    true,
                ));
            },
            Transition::Failed { attempts } => {
                log::warn!(
                    "[booking-realtime] Channel '{}' failed after {} reconnection attempt(s): {}",
                    channel_name,
                    attempts,
                    detail
                );
                if was_connected {
                    self.handlers
                        .emit_disconnect(DisconnectReason::for_channel(&detail, &channel_name));
                }
                self.handlers.emit_error(ConnectionError::new(
                    format!(
                        "Connection failed after {} reconnection attempt(s): {}",
                        attempts, detail
                    ),
                    false,
                ));
            },
            Transition::Ignored => {
                log::debug!(
                    "[booking-realtime] Channel '{}' reported {} while waiting, ignored",
                    channel_name,
                    detail
                );
            },
        }

        self.publish_status();
    }

    fn fire_due(&mut self, now: Instant) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        for key in active.debouncer.take_expired(now) {
            log::debug!("[booking-realtime] Invalidating {}", key);
            self.cache.invalidate(&key);
            self.handlers.emit_invalidate(&key);
        }

        if active.controller.poll_retry(now) {
            log::info!(
                "[booking-realtime] Resubscribing channel '{}' (attempt {})",
                active.channel_name,
                active.controller.attempt()
            );
            active.resubscribe(&self.msg_tx);
        }

        self.publish_status();
    }

    fn publish_status(&mut self) {
        let status = self
            .active
            .as_ref()
            .map(|a| a.controller.status())
            .unwrap_or_default();

        let changed = self.status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });

        if changed {
            log::debug!("[booking-realtime] Status -> {}", status);
            self.handlers.emit_status(status);
        }
    }
}
