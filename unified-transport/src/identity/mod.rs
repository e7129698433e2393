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

//! Identity layer.
//!
//! Maps human-readable resource names to fully-qualified identities, one cache per service.
//! A cache lives exactly as long as the resolver that owns it, so separate transports in one
//! process never share entries.

pub(crate) mod queue_directory;
pub(crate) mod resource_identity_cache;
pub(crate) mod topic_directory;
