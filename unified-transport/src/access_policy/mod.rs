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

//! Queue resource-policy documents.
//!
//! A queue grants a topic permission to deliver to it through one allow-statement in the
//! queue's policy document. [`PolicyStatement`] is that statement; [`PolicyDocument`] is the
//! whole document, which may also carry statements for unrelated principals that must survive
//! every rewrite.
//!
//! ```
//! use unified_transport::{PolicyDocument, PolicyStatement};
//!
//! let statement = PolicyStatement::allow_topic_delivery(
//!     "arn:aws:sqs:us-east-1:1:billing",
//!     "arn:aws:sns:us-east-1:1:orders",
//! );
//!
//! let mut document = PolicyDocument::new();
//! assert!(!document.contains(&statement));
//!
//! document.push(&statement);
//! assert!(document.contains(&statement));
//! ```

pub(crate) mod policy_document;
