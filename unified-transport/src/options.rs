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

//! Transport configuration.

use crate::error::TransportError;
use crate::services::{CONTENT_BASED_DEDUPLICATION_ATTRIBUTE, FIFO_TOPIC_ATTRIBUTE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const DEFAULT_PAGE_LIMIT: usize = 1000;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TransportOptions {
    /// Create the own topic and subscribe the own queue to it at start-up.
    #[serde(default)]
    pub auto_attach_services: bool,
    /// Turn off every access-policy reconciliation.
    #[serde(default)]
    pub disable_access_policy_checks: bool,
    #[serde(default = "default_true")]
    pub create_queues: bool,
    #[serde(default)]
    pub create_topics: CreateTopicsOptions,
    #[serde(default = "default_true")]
    pub raw_message_delivery: bool,
    /// Upper bound on pages followed by any paged listing.
    #[serde(default = "default_page_limit")]
    pub subscription_page_limit: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CreateTopicsOptions {
    #[serde(default = "default_true")]
    pub create_topics: bool,
    #[serde(default)]
    pub use_fifo: bool,
    #[serde(default)]
    pub content_based_deduplication: bool,
}

fn default_true() -> bool {
    true
}

fn default_page_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

impl Default for CreateTopicsOptions {
    fn default() -> Self {
        Self {
            create_topics: true,
            use_fifo: false,
            content_based_deduplication: false,
        }
    }
}

impl CreateTopicsOptions {
    /// Attributes passed to the topic service when creating a topic.
    pub(crate) fn topic_attributes(&self) -> HashMap<String, String> {
        let mut attributes = HashMap::new();
        if self.use_fifo {
            attributes.insert(FIFO_TOPIC_ATTRIBUTE.to_string(), "true".to_string());
            attributes.insert(
                CONTENT_BASED_DEDUPLICATION_ATTRIBUTE.to_string(),
                self.content_based_deduplication.to_string(),
            );
        }
        attributes
    }
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            auto_attach_services: false,
            disable_access_policy_checks: false,
            create_queues: true,
            create_topics: CreateTopicsOptions::default(),
            raw_message_delivery: true,
            subscription_page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl TransportOptions {
    pub fn from_json5_str(contents: &str) -> Result<Self, TransportError> {
        let options: TransportOptions = json5::from_str(contents).map_err(|e| {
            TransportError::Configuration(format!("Unable to parse options: {e:?}"))
        })?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json5_file(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            TransportError::Configuration(format!(
                "Unable to read options file {:?}: {e:?}",
                path.as_ref()
            ))
        })?;
        Self::from_json5_str(&contents)
    }

    pub fn validate(&self) -> Result<(), TransportError> {
        if self.subscription_page_limit == 0 {
            return Err(TransportError::Configuration(
                "subscription_page_limit must be at least 1".to_string(),
            ));
        }
        if self.create_topics.content_based_deduplication && !self.create_topics.use_fifo {
            return Err(TransportError::Configuration(
                "content_based_deduplication requires use_fifo".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn policy_checks_enabled(&self) -> bool {
        !self.disable_access_policy_checks
    }
}
