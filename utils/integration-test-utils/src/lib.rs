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

//! Shared fixtures for `unified-transport` integration tests.

use std::collections::HashMap;
use tracing_subscriber::EnvFilter;
use unified_transport::TransportMessage;

/// Header carrying the bus message id in test messages.
pub const MESSAGE_ID_HEADER: &str = "rbs2-msg-id";

/// Installs a `tracing` subscriber honouring `RUST_LOG`; later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A resource name no other test in the process uses.
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

/// A message with a fresh id header, a content-type header, and `text` as body.
pub fn message_with(text: &str) -> TransportMessage {
    TransportMessage::new(
        HashMap::from([
            (
                MESSAGE_ID_HEADER.to_string(),
                uuid::Uuid::new_v4().to_string(),
            ),
            (
                "rbs2-content-type".to_string(),
                "text/plain; charset=utf-8".to_string(),
            ),
        ]),
        text.as_bytes().to_vec(),
    )
}
