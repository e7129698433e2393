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

//! Canonical structured event names used across `unified-transport`.

// Identity resolution events.
pub const IDENTITY_CACHE_SEEDED: &str = "identity_cache_seeded";
pub const IDENTITY_LOOKUP_SCAN: &str = "identity_lookup_scan";
pub const IDENTITY_LOOKUP_MISS: &str = "identity_lookup_miss";
pub const IDENTITY_CREATED: &str = "identity_created";
pub const TOPIC_LISTING_TRUNCATED: &str = "topic_listing_truncated";

// Subscription reconciliation events.
pub const SUBSCRIPTION_REGISTERED: &str = "subscription_registered";
pub const SUBSCRIPTION_REGISTER_FAILED: &str = "subscription_register_failed";
pub const SUBSCRIPTION_RAW_DELIVERY_SET: &str = "subscription_raw_delivery_set";
pub const SUBSCRIPTION_UNREGISTER_OK: &str = "subscription_unregister_ok";
pub const SUBSCRIPTION_UNREGISTER_NOOP: &str = "subscription_unregister_noop";

// Access-policy reconciliation events.
pub const POLICY_ALREADY_AUTHORIZED: &str = "policy_already_authorized";
pub const POLICY_STATEMENT_MISSING: &str = "policy_statement_missing";
pub const POLICY_STATEMENT_ADDED: &str = "policy_statement_added";
pub const POLICY_DRIFT_SKIPPED_ENDPOINT: &str = "policy_drift_skipped_endpoint";
pub const POLICY_SWEEP_START: &str = "policy_sweep_start";
pub const POLICY_SWEEP_OK: &str = "policy_sweep_ok";
pub const POLICY_SWEEP_FAILED: &str = "policy_sweep_failed";
pub const POLICY_SWEEP_ALREADY_CHECKED: &str = "policy_sweep_already_checked";

// Transport facade events.
pub const TRANSPORT_INITIALIZE_START: &str = "transport_initialize_start";
pub const TRANSPORT_INITIALIZE_OK: &str = "transport_initialize_ok";
pub const TRANSPORT_SEND_QUEUE: &str = "transport_send_queue";
pub const TRANSPORT_SEND_TOPIC: &str = "transport_send_topic";
pub const TRANSPORT_RECEIVE_OK: &str = "transport_receive_ok";
pub const TRANSPORT_RECEIVE_DECODE_FAILED: &str = "transport_receive_decode_failed";
pub const TRANSPORT_RESOURCE_DELETED: &str = "transport_resource_deleted";
