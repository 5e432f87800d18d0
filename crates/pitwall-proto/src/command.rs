//! Outbound client commands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    Destination,
    errors::{ProtocolError, Result},
};

/// Client-chosen id binding a subscribe to its later unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u32);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Body of a chat publish: `{ receiverId, message }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSend {
    /// Receiving user.
    pub receiver_id: String,
    /// Message text.
    pub message: String,
}

/// Commands the client publishes to the realtime channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Bind a destination to a subscription id.
    Subscribe {
        /// Client-chosen id for the binding.
        id: SubscriptionId,
        /// Destination to subscribe.
        destination: Destination,
    },

    /// Release a subscription.
    Unsubscribe {
        /// Id from the matching subscribe.
        id: SubscriptionId,
    },

    /// Publish a chat message to the application destination.
    Send {
        /// Application destination (always [`Destination::ChatSend`]).
        destination: Destination,
        /// Message body.
        body: ChatSend,
    },
}

impl ClientCommand {
    /// Encode the command to WebSocket text.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_encodes_with_path() {
        let cmd = ClientCommand::Subscribe {
            id: SubscriptionId(1),
            destination: Destination::PrivateQueue,
        };
        let text = cmd.encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["command"], "subscribe");
        assert_eq!(value["destination"], "/user/queue/events");
        assert_eq!(value["id"], 1);
    }

    #[test]
    fn send_uses_camel_case_body() {
        let cmd = ClientCommand::Send {
            destination: Destination::ChatSend,
            body: ChatSend { receiver_id: "u-9".into(), message: "done".into() },
        };
        let value: serde_json::Value = serde_json::from_str(&cmd.encode().unwrap()).unwrap();
        assert_eq!(value["body"]["receiverId"], "u-9");
        assert_eq!(value["body"]["message"], "done");
    }

    #[test]
    fn command_round_trips() {
        let cmd = ClientCommand::Unsubscribe { id: SubscriptionId(7) };
        let decoded: ClientCommand =
            serde_json::from_str(&cmd.encode().unwrap()).unwrap();
        assert_eq!(decoded, cmd);
    }
}
