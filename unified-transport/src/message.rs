/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Transport message and its wire envelope.

use crate::error::TransportError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Headers and opaque body of one bus message.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TransportMessage {
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl TransportMessage {
    pub fn new(headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self { headers, body }
    }
}

/// Encodes messages to the string payload carried by both services.
pub trait MessageSerializer: Send + Sync {
    fn encode(&self, message: &TransportMessage) -> Result<String, TransportError>;
    fn decode(&self, wire: &str) -> Result<TransportMessage, TransportError>;
}

/// Exactly `{"headers", "body"}`. Other JSON documents, such as topic documents that are not
/// notifications, fail to decode instead of reading as an empty message.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireEnvelope {
    #[serde(default)]
    headers: HashMap<String, String>,
    body: String,
}

/// Notification wrapper the topic service adds when raw delivery is off.
#[derive(Deserialize)]
struct TopicNotification {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Message")]
    message: String,
}

const NOTIFICATION_TYPE: &str = "Notification";

/// `{"headers": {..}, "body": "<base64>"}` JSON envelope.
///
/// Decoding also accepts the envelope nested inside a topic notification document.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonMessageSerializer;

impl JsonMessageSerializer {
    fn decode_envelope(wire: &str) -> Result<TransportMessage, TransportError> {
        let envelope: WireEnvelope = serde_json::from_str(wire)
            .map_err(|err| TransportError::Serialization(format!("invalid envelope: {err}")))?;
        let body = STANDARD
            .decode(envelope.body.as_bytes())
            .map_err(|err| TransportError::Serialization(format!("invalid body encoding: {err}")))?;

        Ok(TransportMessage::new(envelope.headers, body))
    }
}

impl MessageSerializer for JsonMessageSerializer {
    fn encode(&self, message: &TransportMessage) -> Result<String, TransportError> {
        let envelope = WireEnvelope {
            headers: message.headers.clone(),
            body: STANDARD.encode(&message.body),
        };

        serde_json::to_string(&envelope).map_err(|err| TransportError::Serialization(err.to_string()))
    }

    fn decode(&self, wire: &str) -> Result<TransportMessage, TransportError> {
        match serde_json::from_str::<TopicNotification>(wire) {
            Ok(notification) if notification.kind == NOTIFICATION_TYPE => {
                Self::decode_envelope(&notification.message)
            }
            _ => Self::decode_envelope(wire),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonMessageSerializer, MessageSerializer, TransportMessage};
    use crate::error::TransportError;
    use std::collections::HashMap;

    fn message() -> TransportMessage {
        TransportMessage::new(
            HashMap::from([
                ("rbs2-msg-id".to_string(), "42".to_string()),
                ("rbs2-content-type".to_string(), "application/json".to_string()),
            ]),
            vec![0, 159, 146, 150, b'{', b'}'],
        )
    }

    #[test]
    fn envelope_preserves_headers_and_binary_body() {
        let serializer = JsonMessageSerializer;
        let wire = serializer.encode(&message()).unwrap();

        assert_eq!(serializer.decode(&wire).unwrap(), message());
    }

    #[test]
    fn decode_unwraps_topic_notification() {
        let serializer = JsonMessageSerializer;
        let inner = serializer.encode(&message()).unwrap();
        let wrapped = serde_json::json!({
            "Type": "Notification",
            "MessageId": "m-1",
            "TopicArn": "arn:aws:sns:us-east-1:000000000000:orders",
            "Message": inner,
        })
        .to_string();

        assert_eq!(serializer.decode(&wrapped).unwrap(), message());
    }

    #[test]
    fn decode_rejects_non_envelope_payloads() {
        let serializer = JsonMessageSerializer;

        assert!(matches!(
            serializer.decode("plain text"),
            Err(TransportError::Serialization(_))
        ));
        assert!(matches!(
            serializer.decode(r#"{"headers":{},"body":"***"}"#),
            Err(TransportError::Serialization(_))
        ));
    }

    #[test]
    fn decode_rejects_foreign_json_documents() {
        let serializer = JsonMessageSerializer;

        for wire in [
            r#"{"foo":1}"#,
            r#"{"Type":"SubscriptionConfirmation","Message":"x"}"#,
            r#"{"headers":{"rbs2-msg-id":"42"}}"#,
        ] {
            assert!(
                matches!(serializer.decode(wire), Err(TransportError::Serialization(_))),
                "{wire} should not decode"
            );
        }
    }
}
