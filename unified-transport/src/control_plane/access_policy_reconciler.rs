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

//! Queue access-policy inspection and repair.
//!
//! A publish succeeds at the topic service even when the subscribed queue's policy refuses the
//! delivery, and nothing reports the loss. This reconciler closes that gap by making sure each
//! subscribed queue grants the topic delivery permission.
//!
//! Policy writes replace the whole document without a conditional-write guard. Two writers
//! racing on one queue can lose one addition; re-running reconciliation repairs it.

use crate::access_policy::policy_document::{PolicyDocument, PolicyStatement};
use crate::addressing::address::{Address, ServiceKind};
use crate::control_plane::checked_topics::CheckedTopicSet;
use crate::control_plane::subscription_reconciler::list_all_subscriptions;
use crate::error::TransportError;
use crate::identity::queue_directory::QueueDirectory;
use crate::identity::topic_directory::TopicDirectory;
use crate::observability::events;
use crate::services::{QueueIdentity, POLICY_ATTRIBUTE, QUEUE_PROTOCOL};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "access_policy_reconciler";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum PolicyCheck {
    AlreadyAuthorized,
    Repaired,
    /// The statement is absent and repair was not allowed.
    Missing,
}

impl PolicyCheck {
    pub(crate) fn is_authorized(self) -> bool {
        !matches!(self, PolicyCheck::Missing)
    }
}

pub(crate) struct AccessPolicyReconciler {
    queues: Arc<QueueDirectory>,
    topics: Arc<TopicDirectory>,
    page_limit: usize,
    checked_topics: CheckedTopicSet,
}

impl AccessPolicyReconciler {
    pub(crate) fn new(
        queues: Arc<QueueDirectory>,
        topics: Arc<TopicDirectory>,
        page_limit: usize,
    ) -> Self {
        Self {
            queues,
            topics,
            page_limit,
            checked_topics: CheckedTopicSet::default(),
        }
    }

    /// Ensures `queue` grants `topic_arn` delivery permission.
    ///
    /// With `allow_repair == false` the policy is only inspected. A missing statement is
    /// appended to the existing document; statements for other principals are kept as they are.
    pub(crate) async fn check_or_repair(
        &self,
        queue: &QueueIdentity,
        topic_arn: &str,
        allow_repair: bool,
    ) -> Result<PolicyCheck, TransportError> {
        let queues = self.queues.service();
        let attributes = queues
            .get_policy_attributes(&queue.url)
            .await
            .map_err(|err| TransportError::remote("get queue attributes", err))?;

        let mut document = match attributes.get(POLICY_ATTRIBUTE) {
            Some(existing) if !existing.trim().is_empty() => PolicyDocument::from_json(existing)
                .map_err(|err| TransportError::InvalidPolicyDocument {
                    queue: queue.arn.clone(),
                    reason: err.to_string(),
                })?,
            _ => PolicyDocument::new(),
        };

        let statement = PolicyStatement::allow_topic_delivery(&queue.arn, topic_arn);
        if document.contains(&statement) {
            debug!(
                event = events::POLICY_ALREADY_AUTHORIZED,
                component = COMPONENT,
                queue = queue.arn.as_str(),
                topic = topic_arn,
                "topic already authorized"
            );
            return Ok(PolicyCheck::AlreadyAuthorized);
        }

        if !allow_repair {
            debug!(
                event = events::POLICY_STATEMENT_MISSING,
                component = COMPONENT,
                queue = queue.arn.as_str(),
                topic = topic_arn,
                "topic is not authorized"
            );
            return Ok(PolicyCheck::Missing);
        }

        document.push(&statement);
        let merged = document
            .to_json()
            .map_err(|err| TransportError::Serialization(err.to_string()))?;
        queues
            .set_policy_attributes(
                &queue.url,
                HashMap::from([(POLICY_ATTRIBUTE.to_string(), merged)]),
            )
            .await
            .map_err(|err| TransportError::remote("set queue attributes", err))?;

        info!(
            event = events::POLICY_STATEMENT_ADDED,
            component = COMPONENT,
            queue = queue.arn.as_str(),
            topic = topic_arn,
            statements = document.statements.len(),
            "authorized topic to deliver to queue"
        );
        Ok(PolicyCheck::Repaired)
    }

    /// Validates the policy of every queue currently subscribed to `topic_arn`.
    ///
    /// Runs at most once per topic for the lifetime of this reconciler. Concurrent callers wait
    /// for the sweep in flight, so none of them publishes before the subscribers are authorized.
    /// A failed sweep is run again by the next trigger.
    pub(crate) async fn reconcile_topic_subscribers(
        &self,
        topic_arn: &str,
    ) -> Result<(), TransportError> {
        let swept = self
            .checked_topics
            .check_once(topic_arn, || async move {
                let result = self.sweep(topic_arn).await;
                if let Err(err) = &result {
                    warn!(
                        event = events::POLICY_SWEEP_FAILED,
                        component = COMPONENT,
                        topic = topic_arn,
                        err = %err,
                        "topic subscriber validation failed"
                    );
                }
                result
            })
            .await?;

        if !swept {
            debug!(
                event = events::POLICY_SWEEP_ALREADY_CHECKED,
                component = COMPONENT,
                topic = topic_arn,
                "topic subscribers already validated"
            );
        }
        Ok(())
    }

    async fn sweep(&self, topic_arn: &str) -> Result<(), TransportError> {
        debug!(
            event = events::POLICY_SWEEP_START,
            component = COMPONENT,
            topic = topic_arn,
            "validating topic subscribers"
        );

        let subscriptions =
            list_all_subscriptions(self.topics.service().as_ref(), topic_arn, self.page_limit)
                .await?;

        let mut validated = 0usize;
        let mut repaired = 0usize;
        for subscription in subscriptions
            .iter()
            .filter(|subscription| subscription.protocol.eq_ignore_ascii_case(QUEUE_PROTOCOL))
        {
            let address = match Address::parse(&subscription.endpoint) {
                Ok(address) if address.service() != ServiceKind::Topic => address,
                Ok(_) => {
                    Self::skip_endpoint(topic_arn, &subscription.endpoint, "not a queue endpoint");
                    continue;
                }
                Err(err) => {
                    Self::skip_endpoint(topic_arn, &subscription.endpoint, &err.to_string());
                    continue;
                }
            };

            let Some(queue) = self.queues.resolve(&address, false).await? else {
                Self::skip_endpoint(topic_arn, &subscription.endpoint, "queue does not resolve");
                continue;
            };

            match self.check_or_repair(&queue, topic_arn, true).await {
                Ok(PolicyCheck::Repaired) => repaired += 1,
                Ok(_) => {}
                Err(err @ TransportError::InvalidPolicyDocument { .. }) => {
                    Self::skip_endpoint(topic_arn, &subscription.endpoint, &err.to_string());
                    continue;
                }
                Err(err) => return Err(err),
            }
            validated += 1;
        }

        info!(
            event = events::POLICY_SWEEP_OK,
            component = COMPONENT,
            topic = topic_arn,
            validated,
            repaired,
            "topic subscribers validated"
        );
        Ok(())
    }

    fn skip_endpoint(topic_arn: &str, endpoint: &str, reason: &str) {
        warn!(
            event = events::POLICY_DRIFT_SKIPPED_ENDPOINT,
            component = COMPONENT,
            topic = topic_arn,
            endpoint,
            reason,
            "skipping access policy check for subscription endpoint"
        );
    }
}
