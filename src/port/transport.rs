//! Transport port for request/response calls and live channels.
//!
//! The transport client is an external collaborator. It executes rendered
//! [`WireRequest`]s and hands back either the parsed response `data` object
//! or a [`LiveChannel`] that delivers push events to registered listeners.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors reported by the transport. Surfaced to callers unmodified.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The request could not be delivered or the response not read.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with an error result.
    #[error("request rejected: {message}")]
    Rejected { message: String },

    /// A live channel could not be opened or started.
    #[error("channel failed: {0}")]
    Channel(String),

    /// Closing a live channel failed.
    #[error("disconnect failed: {0}")]
    Disconnect(String),
}

/// A request rendered for the wire: a query document plus JSON variables.
///
/// Serializes as the standard GraphQL-over-HTTP body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRequest {
    pub operation_name: String,
    pub query: String,
    pub variables: Value,
}

/// One event delivered on a live channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMessage {
    /// Event name the transport dispatched on (e.g. `message`).
    pub event: String,
    /// Raw event body as received, expected to be JSON text.
    pub data: String,
}

impl ChannelMessage {
    /// Create a `message` event with the given body.
    pub fn message(data: impl Into<String>) -> Self {
        Self {
            event: MESSAGE_EVENT.to_string(),
            data: data.into(),
        }
    }
}

/// Event name used for data-carrying channel events.
pub const MESSAGE_EVENT: &str = "message";

/// Listener invoked for each delivered event.
///
/// Runs to completion on the transport's delivery path and must not block.
pub type MessageHandler = Box<dyn FnMut(ChannelMessage) + Send + 'static>;

/// Handle to a long-lived push channel.
///
/// Listeners are attached before [`LiveChannel::start`]; events begin to
/// flow only after it.
pub trait LiveChannel: Send {
    /// Attach a listener for events named `event`.
    fn add_listener(&mut self, event: &str, handler: MessageHandler);

    /// Begin delivering events.
    fn start(&mut self) -> Result<(), TransportError>;

    /// Close the channel.
    fn disconnect(&mut self) -> Result<(), TransportError>;
}

/// Client executing queries, mutations and subscriptions.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a query or mutation and return the parsed `data` object.
    async fn request(&self, request: &WireRequest) -> Result<Value, TransportError>;

    /// Open a live channel for a subscription request.
    async fn open_channel(
        &self,
        request: &WireRequest,
    ) -> Result<Box<dyn LiveChannel>, TransportError>;

    /// Get the transport name for logging/debugging.
    fn transport_name(&self) -> &'static str {
        "transport"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_request_serializes_as_graphql_body() {
        let request = WireRequest {
            operation_name: "OrderById".into(),
            query: "query OrderById($id: ID!) { order(id: $id) { id } }".into(),
            variables: json!({ "id": "o1" }),
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["operationName"], "OrderById");
        assert_eq!(body["variables"]["id"], "o1");
        assert!(body["query"].as_str().unwrap().starts_with("query OrderById"));
    }

    #[test]
    fn message_constructor_uses_message_event() {
        let msg = ChannelMessage::message("{}");
        assert_eq!(msg.event, MESSAGE_EVENT);
        assert_eq!(msg.data, "{}");
    }
}
