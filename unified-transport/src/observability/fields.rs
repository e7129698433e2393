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

//! Canonical structured field keys and value-format helpers.

use crate::message::TransportMessage;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const TRANSPORT: &str = "transport";

pub const QUEUE: &str = "queue";
pub const TOPIC: &str = "topic";
pub const ENDPOINT: &str = "endpoint";
pub const HANDLE: &str = "handle";
pub const MSG_ID: &str = "msg_id";
pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
/// Header consulted for log correlation of bus messages.
pub const MESSAGE_ID_HEADER: &str = "rbs2-msg-id";

pub fn format_message_id(message: &TransportMessage) -> String {
    message
        .headers
        .get(MESSAGE_ID_HEADER)
        .cloned()
        .unwrap_or_else(|| NONE.to_string())
}

pub fn format_optional(value: Option<&str>) -> String {
    value.unwrap_or(NONE).to_string()
}

#[cfg(test)]
mod tests {
    use super::{format_message_id, format_optional, MESSAGE_ID_HEADER, NONE};
    use crate::message::TransportMessage;
    use std::collections::HashMap;

    #[test]
    fn format_message_id_returns_header_when_present() {
        let message = TransportMessage::new(
            HashMap::from([(MESSAGE_ID_HEADER.to_string(), "m-7".to_string())]),
            Vec::new(),
        );

        assert_eq!(format_message_id(&message), "m-7");
    }

    #[test]
    fn format_message_id_returns_none_when_absent() {
        assert_eq!(format_message_id(&TransportMessage::default()), NONE);
    }

    #[test]
    fn format_optional_falls_back_when_absent() {
        assert_eq!(format_optional(None), NONE);
        assert_eq!(format_optional(Some("orders")), "orders");
    }
}
