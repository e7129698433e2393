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

//! # unified-transport
//!
//! `unified-transport` exchanges bus messages over a point-to-point queue service and a
//! publish/subscribe topic service through one address space.
//!
//! Typical usage is centered on [`UnifiedTransport`], which implements the [`Transport`] and
//! [`SubscriptionStorage`] contracts offered to a host message bus. The cloud services are
//! consumed through the [`QueueService`] and [`TopicService`] traits.
//!
//! ## Addresses
//!
//! Every operation accepts a bare resource name, a fully-qualified resource identifier, or
//! (for queues) a locator URL. Destinations naming the queue service go to the queue;
//! everything else is published to a topic.
//!
//! ## Publish and subscribe
//!
//! ```
//! use std::sync::Arc;
//! use in_memory_services::InMemoryCloud;
//! use unified_transport::{
//!     SubscriptionStorage, Transport, TransportMessage, TransportOptions, UnifiedTransport,
//! };
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let cloud = Arc::new(InMemoryCloud::new());
//! let billing = UnifiedTransport::new(
//!     Some("billing"),
//!     TransportOptions::default(),
//!     cloud.clone(),
//!     cloud.clone(),
//! )
//! .unwrap();
//! billing.initialize().await.unwrap();
//!
//! billing.register_subscriber("orders", "billing").await.unwrap();
//! assert!(billing.check_access_policy("billing", "orders").await.unwrap());
//!
//! let message = TransportMessage::new(Default::default(), b"order placed".to_vec());
//! billing.send("orders", &message).await.unwrap();
//!
//! assert_eq!(billing.receive().await.unwrap(), Some(message));
//! # });
//! ```
//!
//! ## Access policies
//!
//! A topic service accepts a publish even when a subscribed queue's policy refuses the
//! delivery, and the message is then lost without any error. The transport therefore makes
//! sure every subscribed queue grants the topic delivery permission: once at start-up for its
//! own topic, the first time it publishes to any topic, and after each subscriber
//! registration. Existing grants for other principals are never removed.
//!
//! ## Internal architecture map
//!
//! - Addressing: address parsing and classification
//! - Identity: name -> identity resolution with one single-flight cache per service
//! - Control plane: subscription reconciliation and access-policy reconciliation
//! - API facade: `UnifiedTransport` composition root
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber. Binaries and tests
//! are responsible for one-time `tracing_subscriber` initialization.

mod access_policy;
pub use access_policy::policy_document::{
    PolicyDocument, PolicyStatement, POLICY_VERSION, SEND_MESSAGE_ACTION,
    SOURCE_ARN_CONDITION_KEY, TOPIC_SERVICE_PRINCIPAL,
};

mod addressing;
pub use addressing::address::{classify, Address, AddressKind, ServiceKind};
pub use addressing::arn::{Arn, ArnParseError};

mod contracts;
pub use contracts::{SubscriptionStorage, Transport};

mod control_plane;

mod error;
pub use error::TransportError;

mod identity;

mod message;
pub use message::{JsonMessageSerializer, MessageSerializer, TransportMessage};

#[doc(hidden)]
pub mod observability;

mod options;
pub use options::{CreateTopicsOptions, TransportOptions};

mod services;
pub use services::{
    Page, QueueIdentity, QueueService, ReceivedMessage, ServiceError, Subscription, TopicService,
    CONTENT_BASED_DEDUPLICATION_ATTRIBUTE, FIFO_TOPIC_ATTRIBUTE, POLICY_ATTRIBUTE,
    QUEUE_PROTOCOL, RAW_MESSAGE_DELIVERY_ATTRIBUTE,
};

#[cfg(test)]
mod test_support;

mod unified_transport;
pub use unified_transport::UnifiedTransport;
