//! Recording transport and cache doubles for registry integration tests.
//!
//! The mock transport routes payloads the way a change-feed server would:
//! by table and event kind only. Row filters are left to the registry, so
//! tests also exercise its client-side matching.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use booking_realtime::{
    CacheInvalidator, CacheKey, ChangeKind, ChannelStatus, OnEventCallback, OnStatusCallback,
    RealtimeOptions, RealtimeRegistry, RealtimeTransport, RegistryInfo, SubscriptionSpec,
    TransportChannel,
};
use serde_json::Value as JsonValue;
use tokio::time::Instant;

// ── Transport ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct ChannelRecord {
    pub name: String,
    pub handlers: Vec<(SubscriptionSpec, OnEventCallback)>,
    pub status_callbacks: Vec<OnStatusCallback>,
    pub subscribe_times: Vec<Instant>,
    pub closed: bool,
}

#[derive(Default)]
struct TransportState {
    channels: Vec<ChannelRecord>,
    open_calls: Vec<String>,
    close_calls: Vec<String>,
}

/// Cloneable handle; the registry owns one clone, the test keeps another.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<TransportState>>,
}

pub struct MockChannel {
    id: usize,
    state: Arc<Mutex<TransportState>>,
}

impl TransportChannel for MockChannel {
    fn on_event(&mut self, spec: SubscriptionSpec, handler: OnEventCallback) -> &mut Self {
        self.state.lock().unwrap().channels[self.id]
            .handlers
            .push((spec, handler));
        self
    }

    fn subscribe(&mut self, callback: OnStatusCallback) -> &mut Self {
        {
            let mut state = self.state.lock().unwrap();
            let record = &mut state.channels[self.id];
            record.status_callbacks.push(callback);
            record.subscribe_times.push(Instant::now());
        }
        self
    }
}

impl RealtimeTransport for MockTransport {
    type Channel = MockChannel;

    fn open_channel(&self, name: &str) -> MockChannel {
        let mut state = self.state.lock().unwrap();
        state.open_calls.push(name.to_string());
        state.channels.push(ChannelRecord {
            name: name.to_string(),
            ..Default::default()
        });
        MockChannel {
            id: state.channels.len() - 1,
            state: self.state.clone(),
        }
    }

    fn close_channel(&self, channel: MockChannel) {
        let mut state = self.state.lock().unwrap();
        let record = &mut state.channels[channel.id];
        record.closed = true;
        let name = record.name.clone();
        state.close_calls.push(name);
    }
}

impl MockTransport {
    pub fn open_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().open_calls.clone()
    }

    pub fn close_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().close_calls.clone()
    }

    pub fn channel_count(&self) -> usize {
        self.state.lock().unwrap().channels.len()
    }

    /// Registered specs of the `index`-th opened channel.
    pub fn specs(&self, index: usize) -> Vec<SubscriptionSpec> {
        self.state.lock().unwrap().channels[index]
            .handlers
            .iter()
            .map(|(spec, _)| spec.clone())
            .collect()
    }

    pub fn is_closed(&self, index: usize) -> bool {
        self.state.lock().unwrap().channels[index].closed
    }

    pub fn subscribe_count(&self, index: usize) -> usize {
        self.state.lock().unwrap().channels[index].subscribe_times.len()
    }

    pub fn subscribe_times(&self, index: usize) -> Vec<Instant> {
        self.state.lock().unwrap().channels[index].subscribe_times.clone()
    }

    fn latest(&self) -> usize {
        self.channel_count() - 1
    }

    /// Deliver a change payload on the latest channel to every handler whose
    /// table and kind match. Returns the number of handlers invoked.
    pub fn emit(&self, payload: JsonValue) -> usize {
        self.emit_on(self.latest(), payload)
    }

    pub fn emit_on(&self, index: usize, payload: JsonValue) -> usize {
        let table = payload["table"].as_str().unwrap_or_default().to_string();
        let kind: Option<ChangeKind> = serde_json::from_value(payload["eventType"].clone()).ok();

        // Callbacks run outside the lock, like a real transport's reader.
        let handlers: Vec<OnEventCallback> = {
            let state = self.state.lock().unwrap();
            state.channels[index]
                .handlers
                .iter()
                .filter(|(spec, _)| {
                    spec.entity.table_name() == table
                        && kind.is_some_and(|k| spec.event_kind.matches(k))
                })
                .map(|(_, handler)| handler.clone())
                .collect()
        };
        for handler in &handlers {
            handler(payload.clone());
        }
        handlers.len()
    }

    /// Deliver a raw payload straight to handler `handler` of the latest
    /// channel, bypassing routing.
    pub fn emit_raw(&self, handler: usize, payload: JsonValue) {
        let callback = {
            let state = self.state.lock().unwrap();
            let index = state.channels.len() - 1;
            state.channels[index].handlers[handler].1.clone()
        };
        callback(payload);
    }

    /// Report `status` through the most recent subscribe callback of the
    /// latest channel.
    pub fn report(&self, status: ChannelStatus) {
        self.report_on(self.latest(), status, None);
    }

    pub fn report_on(&self, index: usize, status: ChannelStatus, error: Option<&str>) {
        let callback = {
            let state = self.state.lock().unwrap();
            state.channels[index]
                .status_callbacks
                .last()
                .cloned()
                .expect("channel was never subscribed")
        };
        callback(status, error.map(str::to_string));
    }

    /// Report through an earlier subscribe callback of the latest channel.
    pub fn report_via(&self, subscribe_call: usize, status: ChannelStatus) {
        let callback = {
            let state = self.state.lock().unwrap();
            let index = state.channels.len() - 1;
            state.channels[index].status_callbacks[subscribe_call].clone()
        };
        callback(status, None);
    }
}

// ── Cache ───────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingCache {
    calls: Arc<Mutex<Vec<(CacheKey, Instant)>>>,
}

impl CacheInvalidator for RecordingCache {
    fn invalidate(&self, key: &CacheKey) {
        self.calls.lock().unwrap().push((key.clone(), Instant::now()));
    }
}

impl RecordingCache {
    pub fn keys(&self) -> Vec<CacheKey> {
        self.calls.lock().unwrap().iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn calls(&self) -> Vec<(CacheKey, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

pub fn spawn_registry(options: RealtimeOptions) -> (RealtimeRegistry, MockTransport, RecordingCache) {
    let transport = MockTransport::default();
    let cache = RecordingCache::default();
    let registry = RealtimeRegistry::builder(transport.clone(), cache.clone())
        .options(options)
        .spawn();
    (registry, transport, cache)
}

/// Round-trip through the registry task. Everything the transport enqueued
/// before this call has been processed when it returns.
pub async fn settle(registry: &RealtimeRegistry) -> RegistryInfo {
    registry.info().await.expect("registry task should be running")
}

pub async fn advance(registry: &RealtimeRegistry, by: Duration) -> RegistryInfo {
    tokio::time::sleep(by).await;
    settle(registry).await
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Booking change payload. DELETE carries the row as `old`, every other kind
/// as `new`.
pub fn booking(kind: &str, student: &str, instructor: &str) -> JsonValue {
    let row = serde_json::json!({"id": "b1", "student_id": student, "instructor_id": instructor});
    let side = if kind == "DELETE" { "old" } else { "new" };
    let mut payload = serde_json::json!({"table": "booking", "eventType": kind});
    payload[side] = row;
    payload
}

/// Booking UPDATE moving the row from `old_student` to `new_student`.
pub fn booking_reassigned(old_student: &str, new_student: &str) -> JsonValue {
    serde_json::json!({
        "table": "booking",
        "eventType": "UPDATE",
        "new": {"id": "b1", "student_id": new_student, "instructor_id": "i1"},
        "old": {"id": "b1", "student_id": old_student, "instructor_id": "i1"},
    })
}
