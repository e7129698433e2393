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

//! Contracts offered to the host message bus.

use crate::error::TransportError;
use crate::message::TransportMessage;
use async_trait::async_trait;

/// Point-to-point and fan-out message exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Creates the queue (and, when services are attached, the topic) named by `address`.
    async fn create_queue(&self, address: &str) -> Result<(), TransportError>;

    /// Sends `message` to a queue, or publishes it to a topic, depending on `destination`.
    async fn send(&self, destination: &str, message: &TransportMessage)
        -> Result<(), TransportError>;

    /// Takes the next message from the transport's own queue, if any.
    async fn receive(&self) -> Result<Option<TransportMessage>, TransportError>;
}

/// Topic subscriber bookkeeping, kept at the topic service rather than locally.
#[async_trait]
pub trait SubscriptionStorage: Send + Sync {
    async fn get_subscriber_addresses(&self, topic: &str) -> Result<Vec<String>, TransportError>;

    async fn register_subscriber(&self, topic: &str, subscriber: &str)
        -> Result<(), TransportError>;

    /// Unregistering a subscription that does not exist succeeds.
    async fn unregister_subscriber(
        &self,
        topic: &str,
        subscriber: &str,
    ) -> Result<(), TransportError>;

    /// Every bus instance sees the same subscriber set.
    fn is_centralized(&self) -> bool {
        true
    }
}
