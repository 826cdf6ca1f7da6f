//! Mock [`Transport`] and [`LiveChannel`] implementations for testing.
//!
//! - [`MockTransport`] - Scripted responses keyed by operation name, with
//!   request recording. Every opened channel is a [`MockChannel`].
//! - [`MockChannel`] - Channel handle paired with a [`ChannelProbe`] so tests
//!   can push events, inspect start/disconnect and inject failures.
//!
//! A probe keeps delivering after `disconnect`, which stands in for events
//! the transport had already scheduled when teardown was requested.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::port::{
    ChannelMessage, LiveChannel, MessageHandler, Transport, TransportError, WireRequest,
};

// ---------------------------------------------------------------------------
// MockChannel
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ChannelState {
    listeners: Vec<(String, MessageHandler)>,
    started: bool,
    start_error: Option<String>,
    disconnect_calls: usize,
    disconnect_error: Option<String>,
}

/// Channel handle handed to the code under test.
pub struct MockChannel {
    state: Arc<Mutex<ChannelState>>,
}

impl MockChannel {
    /// Create a channel and the probe that controls it.
    #[must_use]
    pub fn new() -> (Self, ChannelProbe) {
        let state = Arc::new(Mutex::new(ChannelState::default()));
        (
            Self {
                state: state.clone(),
            },
            ChannelProbe { state },
        )
    }
}

impl LiveChannel for MockChannel {
    fn add_listener(&mut self, event: &str, handler: MessageHandler) {
        self.state.lock().listeners.push((event.to_string(), handler));
    }

    fn start(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if let Some(reason) = state.start_error.clone() {
            return Err(TransportError::Channel(reason));
        }
        state.started = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.disconnect_calls += 1;
        match state.disconnect_error.clone() {
            Some(reason) => Err(TransportError::Disconnect(reason)),
            None => Ok(()),
        }
    }
}

/// Test-side control of a [`MockChannel`].
#[derive(Clone)]
pub struct ChannelProbe {
    state: Arc<Mutex<ChannelState>>,
}

impl ChannelProbe {
    /// Deliver `message` to every listener registered for its event.
    ///
    /// Returns the number of listeners invoked; zero before `start`.
    pub fn deliver(&self, message: ChannelMessage) -> usize {
        let mut state = self.state.lock();
        if !state.started {
            return 0;
        }
        let mut invoked = 0;
        for (event, handler) in state.listeners.iter_mut() {
            if *event == message.event {
                handler(message.clone());
                invoked += 1;
            }
        }
        invoked
    }

    /// Deliver a `message` event with a raw body.
    pub fn emit(&self, data: impl Into<String>) -> usize {
        self.deliver(ChannelMessage::message(data))
    }

    /// Deliver a `message` event with a JSON body.
    pub fn emit_json(&self, body: &Value) -> usize {
        self.emit(body.to_string())
    }

    /// Make every later `disconnect` fail.
    pub fn fail_disconnect(&self, reason: impl Into<String>) {
        self.state.lock().disconnect_error = Some(reason.into());
    }

    /// Make every later `start` fail.
    pub fn fail_start(&self, reason: impl Into<String>) {
        self.state.lock().start_error = Some(reason.into());
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    #[must_use]
    pub fn disconnect_calls(&self) -> usize {
        self.state.lock().disconnect_calls
    }

    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        self.disconnect_calls() > 0
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }
}

// ---------------------------------------------------------------------------
// MockTransport
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TransportState {
    responses: HashMap<String, VecDeque<Result<Value, TransportError>>>,
    open_failures: HashMap<String, TransportError>,
    start_failures: HashMap<String, String>,
    requests: Vec<WireRequest>,
    channels: Vec<ChannelProbe>,
}

/// A transport with scripted results per operation name.
///
/// Each `request` pops the next scripted result for its operation; with
/// nothing scripted it fails with [`TransportError::Request`].
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<TransportState>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful `data` body for `operation`.
    #[must_use]
    pub fn with_response(self, operation: &str, data: Value) -> Self {
        self.push_result(operation, Ok(data));
        self
    }

    /// Script a failure for `operation`.
    #[must_use]
    pub fn with_error(self, operation: &str, error: TransportError) -> Self {
        self.push_result(operation, Err(error));
        self
    }

    /// Make `open_channel` fail for `operation`.
    #[must_use]
    pub fn with_open_failure(self, operation: &str, error: TransportError) -> Self {
        self.state
            .lock()
            .open_failures
            .insert(operation.to_string(), error);
        self
    }

    /// Make channels opened for `operation` fail on `start`.
    #[must_use]
    pub fn with_start_failure(self, operation: &str, reason: &str) -> Self {
        self.state
            .lock()
            .start_failures
            .insert(operation.to_string(), reason.to_string());
        self
    }

    /// Queue another scripted result for `operation`.
    pub fn push_result(&self, operation: &str, result: Result<Value, TransportError>) {
        self.state
            .lock()
            .responses
            .entry(operation.to_string())
            .or_default()
            .push_back(result);
    }

    /// Every request and channel request seen so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<WireRequest> {
        self.state.lock().requests.clone()
    }

    /// Requests seen for `operation`.
    #[must_use]
    pub fn requests_for(&self, operation: &str) -> Vec<WireRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.operation_name == operation)
            .collect()
    }

    /// Probes of every channel opened so far, in order.
    #[must_use]
    pub fn channels(&self) -> Vec<ChannelProbe> {
        self.state.lock().channels.clone()
    }

    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.state.lock().channels.len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: &WireRequest) -> Result<Value, TransportError> {
        let mut state = self.state.lock();
        state.requests.push(request.clone());
        state
            .responses
            .get_mut(&request.operation_name)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(TransportError::Request(format!(
                    "no scripted response for {}",
                    request.operation_name
                )))
            })
    }

    async fn open_channel(
        &self,
        request: &WireRequest,
    ) -> Result<Box<dyn LiveChannel>, TransportError> {
        let mut state = self.state.lock();
        state.requests.push(request.clone());
        if let Some(error) = state.open_failures.get(&request.operation_name) {
            return Err(error.clone());
        }

        let (channel, probe) = MockChannel::new();
        if let Some(reason) = state.start_failures.get(&request.operation_name) {
            probe.fail_start(reason.clone());
        }
        state.channels.push(probe);
        Ok(Box::new(channel))
    }

    fn transport_name(&self) -> &'static str {
        "mock"
    }
}
