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

//! Addressing layer.
//!
//! Every address handed to the transport is one of three shapes: a bare resource name, a
//! fully-qualified resource identifier (`arn:partition:service:region:account:resource`) or a
//! locator URL. This layer classifies the shape once and infers which service the address
//! names, so the rest of the crate matches on [`Address`] instead of inspecting strings.
//!
//! ```
//! use unified_transport::{Address, AddressKind, ServiceKind};
//!
//! let bare = Address::parse("billing").unwrap();
//! assert_eq!(bare.kind(), AddressKind::Unqualified);
//! assert_eq!(bare.service(), ServiceKind::Unspecified);
//!
//! let topic = Address::parse("arn:aws:sns:us-east-1:000000000000:orders").unwrap();
//! assert_eq!(topic.kind(), AddressKind::FullyQualifiedId);
//! assert_eq!(topic.service(), ServiceKind::Topic);
//! assert_eq!(topic.resource_id(), "orders");
//!
//! let queue = Address::parse("https://sqs.us-east-1.amazonaws.com/000000000000/billing").unwrap();
//! assert_eq!(queue.kind(), AddressKind::LocatorUrl);
//! assert_eq!(queue.service(), ServiceKind::Queue);
//! ```

pub(crate) mod address;
pub(crate) mod arn;
