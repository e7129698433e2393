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

//! Composition root: one transport over the queue and topic services.

use crate::addressing::address::{Address, AddressKind, ServiceKind};
use crate::contracts::{SubscriptionStorage, Transport};
use crate::control_plane::access_policy_reconciler::AccessPolicyReconciler;
use crate::control_plane::subscription_reconciler::SubscriptionReconciler;
use crate::error::TransportError;
use crate::identity::queue_directory::QueueDirectory;
use crate::identity::topic_directory::TopicDirectory;
use crate::message::{JsonMessageSerializer, MessageSerializer, TransportMessage};
use crate::observability::{events, fields};
use crate::options::TransportOptions;
use crate::services::{QueueIdentity, QueueService, Subscription, TopicService};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

const COMPONENT: &str = "unified_transport";

/// Identities of the transport's own resources, fixed by `initialize()`.
#[derive(Clone, Debug)]
struct OwnIdentities {
    /// `None` for send-only and topic-only transports.
    queue: Option<QueueIdentity>,
    topic_arn: Option<String>,
}

/// Routes sends by destination address and keeps topic deliveries authorized.
///
/// Addresses naming the queue service, and locator URLs, go to the queue service. Everything
/// else, including bare names, is published to a topic.
///
/// Access policies are reconciled at start-up for the own topic, the first time each topic is
/// published to, and after every subscriber registration, unless
/// [`TransportOptions::disable_access_policy_checks`] is set.
pub struct UnifiedTransport {
    label: String,
    input_address: Option<Address>,
    options: TransportOptions,
    queues: Arc<QueueDirectory>,
    topics: Arc<TopicDirectory>,
    subscriptions: SubscriptionReconciler,
    policies: AccessPolicyReconciler,
    serializer: Arc<dyn MessageSerializer>,
    own: OnceCell<OwnIdentities>,
}

impl UnifiedTransport {
    /// Builds a transport reading from `input_address`, or a send-only one for `None`.
    ///
    /// No remote call is made until [`UnifiedTransport::initialize`].
    pub fn new(
        input_address: Option<&str>,
        options: TransportOptions,
        queue_service: Arc<dyn QueueService>,
        topic_service: Arc<dyn TopicService>,
    ) -> Result<Self, TransportError> {
        options.validate()?;
        let input_address = input_address.map(Address::parse).transpose()?;
        let page_limit = options.subscription_page_limit;

        let queues = Arc::new(QueueDirectory::new(queue_service));
        let topics = Arc::new(TopicDirectory::new(
            topic_service,
            &options.create_topics,
            page_limit,
        ));
        let subscriptions = SubscriptionReconciler::new(
            queues.clone(),
            topics.clone(),
            options.create_topics.create_topics,
            options.raw_message_delivery,
            page_limit,
        );
        let policies = AccessPolicyReconciler::new(queues.clone(), topics.clone(), page_limit);

        let label = fields::format_optional(input_address.as_ref().map(Address::resource_id));

        Ok(Self {
            label,
            input_address,
            options,
            queues,
            topics,
            subscriptions,
            policies,
            serializer: Arc::new(JsonMessageSerializer),
            own: OnceCell::new(),
        })
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn MessageSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn address(&self) -> Option<&Address> {
        self.input_address.as_ref()
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Resolves (or creates) the own queue and topic and runs the start-up reconciliation.
    ///
    /// Concurrent and repeated calls initialize once. A failed initialization can be retried.
    pub async fn initialize(&self) -> Result<(), TransportError> {
        self.own.get_or_try_init(|| self.bootstrap()).await?;
        Ok(())
    }

    async fn bootstrap(&self) -> Result<OwnIdentities, TransportError> {
        debug!(
            event = events::TRANSPORT_INITIALIZE_START,
            component = COMPONENT,
            transport = self.label.as_str(),
            "initializing transport"
        );

        let Some(input) = &self.input_address else {
            info!(
                event = events::TRANSPORT_INITIALIZE_OK,
                component = COMPONENT,
                transport = self.label.as_str(),
                "send-only transport initialized"
            );
            return Ok(OwnIdentities {
                queue: None,
                topic_arn: None,
            });
        };

        let auto_attach = self.options.auto_attach_services;
        let create_topics = self.options.create_topics.create_topics;
        let (queue_address, topic_address, create_topic) = match input.service() {
            ServiceKind::Topic => (None, input.clone(), create_topics),
            _ => (
                Some(input),
                Address::unqualified(input.resource_id()),
                auto_attach && create_topics,
            ),
        };

        let (queue, topic_arn) = tokio::try_join!(
            self.resolve_own_queue(queue_address),
            self.topics.resolve(&topic_address, create_topic),
        )?;

        if let Some(queue) = &queue {
            self.queues.seed(input.resource_id(), queue.clone()).await;
        }
        if let Some(topic_arn) = &topic_arn {
            self.topics
                .seed(topic_address.resource_id(), topic_arn.clone())
                .await;
        }

        if let (true, Some(queue), Some(topic_arn)) = (auto_attach, &queue, &topic_arn) {
            let own_queue = Address::parse(&queue.arn)?;
            let own_topic = Address::parse(topic_arn)?;
            self.subscriptions.register(&own_topic, &own_queue).await?;
        }

        if let (true, Some(topic_arn)) = (self.options.policy_checks_enabled(), &topic_arn) {
            self.policies.reconcile_topic_subscribers(topic_arn).await?;
        }

        info!(
            event = events::TRANSPORT_INITIALIZE_OK,
            component = COMPONENT,
            transport = self.label.as_str(),
            queue = %fields::format_optional(queue.as_ref().map(|queue| queue.arn.as_str())),
            topic = %fields::format_optional(topic_arn.as_deref()),
            "transport initialized"
        );
        Ok(OwnIdentities { queue, topic_arn })
    }

    async fn resolve_own_queue(
        &self,
        address: Option<&Address>,
    ) -> Result<Option<QueueIdentity>, TransportError> {
        let Some(address) = address else {
            return Ok(None);
        };
        self.queues
            .resolve(address, self.options.create_queues)
            .await?
            .map(Some)
            .ok_or_else(|| TransportError::UnresolvableQueue(address.to_string()))
    }

    /// Reports whether `queue` grants `topic` delivery permission, without changing anything.
    ///
    /// A queue or topic that does not resolve is reported as not authorized.
    pub async fn check_access_policy(
        &self,
        queue: &str,
        topic: &str,
    ) -> Result<bool, TransportError> {
        let queue_address = Address::parse(queue)?;
        let topic_address = Address::parse(topic)?;

        let Some(queue) = self.queues.resolve(&queue_address, false).await? else {
            return Ok(false);
        };
        let Some(topic_arn) = self.topics.resolve(&topic_address, false).await? else {
            return Ok(false);
        };

        let check = self
            .policies
            .check_or_repair(&queue, &topic_arn, false)
            .await?;
        Ok(check.is_authorized())
    }

    /// Lists the raw subscriptions of `topic`, including ones created outside this transport.
    pub async fn list_topic_subscriptions(
        &self,
        topic: &str,
    ) -> Result<Vec<Subscription>, TransportError> {
        let topic = Address::parse(topic)?;
        self.subscriptions.list_subscriptions(&topic).await
    }

    /// Deletes the own queue and topic resolved by `initialize()`.
    pub async fn delete_own_resources(&self) -> Result<(), TransportError> {
        let own = self.own.get().ok_or(TransportError::NotInitialized)?;

        if let Some(queue) = &own.queue {
            self.queues
                .service()
                .delete_queue(&queue.url)
                .await
                .map_err(|err| TransportError::remote("delete queue", err))?;
            info!(
                event = events::TRANSPORT_RESOURCE_DELETED,
                component = COMPONENT,
                transport = self.label.as_str(),
                queue = queue.arn.as_str(),
                "deleted own queue"
            );
        }

        if let Some(topic_arn) = &own.topic_arn {
            self.topics
                .service()
                .delete_topic(topic_arn)
                .await
                .map_err(|err| TransportError::remote("delete topic", err))?;
            info!(
                event = events::TRANSPORT_RESOURCE_DELETED,
                component = COMPONENT,
                transport = self.label.as_str(),
                topic = topic_arn.as_str(),
                "deleted own topic"
            );
        }
        Ok(())
    }

    fn routes_to_queue(address: &Address) -> bool {
        address.kind() == AddressKind::LocatorUrl || address.service() == ServiceKind::Queue
    }

    async fn send_to_queue(
        &self,
        destination: &Address,
        message: &TransportMessage,
        payload: &str,
    ) -> Result<(), TransportError> {
        let queue = self
            .queues
            .resolve(destination, false)
            .await?
            .ok_or_else(|| TransportError::UnresolvableQueue(destination.to_string()))?;

        self.queues
            .service()
            .send(&queue.url, payload)
            .await
            .map_err(|err| TransportError::remote("send message", err))?;

        debug!(
            event = events::TRANSPORT_SEND_QUEUE,
            component = COMPONENT,
            transport = self.label.as_str(),
            queue = queue.arn.as_str(),
            msg_id = %fields::format_message_id(message),
            "sent message to queue"
        );
        Ok(())
    }

    async fn publish_to_topic(
        &self,
        destination: &Address,
        message: &TransportMessage,
        payload: &str,
    ) -> Result<(), TransportError> {
        let topic_arn = self
            .topics
            .resolve(destination, self.options.create_topics.create_topics)
            .await?
            .ok_or_else(|| TransportError::UnresolvableTopic(destination.to_string()))?;

        if self.options.policy_checks_enabled() {
            self.policies.reconcile_topic_subscribers(&topic_arn).await?;
        }

        let remote_id = self
            .topics
            .service()
            .publish(&topic_arn, payload)
            .await
            .map_err(|err| TransportError::remote("publish", err))?;

        debug!(
            event = events::TRANSPORT_SEND_TOPIC,
            component = COMPONENT,
            transport = self.label.as_str(),
            topic = topic_arn.as_str(),
            msg_id = %fields::format_message_id(message),
            remote_id = remote_id.as_str(),
            "published message to topic"
        );
        Ok(())
    }
}

#[async_trait]
impl Transport for UnifiedTransport {
    /// Only available with [`TransportOptions::auto_attach_services`].
    async fn create_queue(&self, address: &str) -> Result<(), TransportError> {
        if !self.options.auto_attach_services {
            return Err(TransportError::NotSupported("create_queue"));
        }

        let address = Address::parse(address)?;
        let topic_address = Address::unqualified(address.resource_id());
        tokio::try_join!(
            self.queues.resolve(&address, true),
            self.topics
                .resolve(&topic_address, self.options.create_topics.create_topics),
        )?;
        Ok(())
    }

    async fn send(
        &self,
        destination: &str,
        message: &TransportMessage,
    ) -> Result<(), TransportError> {
        let destination = Address::parse(destination)?;
        let payload = self.serializer.encode(message)?;

        if Self::routes_to_queue(&destination) {
            self.send_to_queue(&destination, message, &payload).await
        } else {
            self.publish_to_topic(&destination, message, &payload).await
        }
    }

    async fn receive(&self) -> Result<Option<TransportMessage>, TransportError> {
        match &self.input_address {
            Some(input) if input.service() != ServiceKind::Topic => {}
            _ => return Err(TransportError::ReceiveNotSupported),
        }
        let own = self.own.get().ok_or(TransportError::NotInitialized)?;
        let queue = own
            .queue
            .as_ref()
            .ok_or(TransportError::ReceiveNotSupported)?;

        let queue_service = self.queues.service();
        let Some(received) = queue_service
            .receive(&queue.url)
            .await
            .map_err(|err| TransportError::remote("receive message", err))?
        else {
            return Ok(None);
        };

        let message = match self.serializer.decode(&received.body) {
            Ok(message) => message,
            Err(err) => {
                warn!(
                    event = events::TRANSPORT_RECEIVE_DECODE_FAILED,
                    component = COMPONENT,
                    transport = self.label.as_str(),
                    err = %err,
                    "received message could not be decoded; leaving it for redelivery"
                );
                return Err(err);
            }
        };

        queue_service
            .delete_message(&queue.url, &received.receipt_handle)
            .await
            .map_err(|err| TransportError::remote("delete message", err))?;

        debug!(
            event = events::TRANSPORT_RECEIVE_OK,
            component = COMPONENT,
            transport = self.label.as_str(),
            msg_id = %fields::format_message_id(&message),
            "received message"
        );
        Ok(Some(message))
    }
}

#[async_trait]
impl SubscriptionStorage for UnifiedTransport {
    async fn get_subscriber_addresses(&self, topic: &str) -> Result<Vec<String>, TransportError> {
        let topic = Address::parse(topic)?;
        self.subscriptions.subscriber_addresses(&topic).await
    }

    async fn register_subscriber(
        &self,
        topic: &str,
        subscriber: &str,
    ) -> Result<(), TransportError> {
        let topic = Address::parse(topic)?;
        let subscriber = Address::parse(subscriber)?;
        let registration = self.subscriptions.register(&topic, &subscriber).await?;

        if self.options.policy_checks_enabled() {
            self.policies
                .check_or_repair(&registration.subscriber, &registration.topic_arn, true)
                .await?;
        }
        Ok(())
    }

    async fn unregister_subscriber(
        &self,
        topic: &str,
        subscriber: &str,
    ) -> Result<(), TransportError> {
        let topic = Address::parse(topic)?;
        let subscriber = Address::parse(subscriber)?;
        self.subscriptions.unregister(&topic, &subscriber).await
    }
}

#[cfg(test)]
mod tests {
    use super::UnifiedTransport;
    use crate::contracts::{SubscriptionStorage, Transport};
    use crate::error::TransportError;
    use crate::message::{JsonMessageSerializer, MessageSerializer, TransportMessage};
    use crate::options::TransportOptions;
    use crate::services::QUEUE_PROTOCOL;
    use crate::test_support::{queue_arn, queue_url, topic_arn, FakeQueues, FakeTopics};
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn transport(
        input: Option<&str>,
        options: TransportOptions,
        queues: &Arc<FakeQueues>,
        topics: &Arc<FakeTopics>,
    ) -> UnifiedTransport {
        UnifiedTransport::new(input, options, queues.clone(), topics.clone()).unwrap()
    }

    fn hello() -> TransportMessage {
        TransportMessage::new(
            HashMap::from([("rbs2-msg-id".to_string(), "1".to_string())]),
            b"hello".to_vec(),
        )
    }

    #[tokio::test]
    async fn invalid_options_are_rejected_at_construction() {
        let options = TransportOptions {
            subscription_page_limit: 0,
            ..TransportOptions::default()
        };

        let result = UnifiedTransport::new(
            Some("billing"),
            options,
            Arc::new(FakeQueues::default()),
            Arc::new(FakeTopics::default()),
        );

        assert!(matches!(result, Err(TransportError::Configuration(_))));
    }

    #[tokio::test]
    async fn receive_requires_an_initialized_input_queue() {
        let queues = Arc::new(FakeQueues::default());
        let topics = Arc::new(FakeTopics::default());

        let send_only = transport(None, TransportOptions::default(), &queues, &topics);
        assert!(matches!(
            send_only.receive().await,
            Err(TransportError::ReceiveNotSupported)
        ));

        let topic_only = transport(
            Some(&topic_arn("orders")),
            TransportOptions::default(),
            &queues,
            &topics,
        );
        assert!(matches!(
            topic_only.receive().await,
            Err(TransportError::ReceiveNotSupported)
        ));

        let uninitialized = transport(Some("billing"), TransportOptions::default(), &queues, &topics);
        assert!(matches!(
            uninitialized.receive().await,
            Err(TransportError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn initialize_creates_queue_and_is_idempotent() {
        let queues = Arc::new(FakeQueues::default());
        let topics = Arc::new(FakeTopics::default());
        let transport = transport(Some("billing"), TransportOptions::default(), &queues, &topics);

        transport.initialize().await.unwrap();
        transport.initialize().await.unwrap();

        assert_eq!(queues.creates.load(Ordering::SeqCst), 1);
        assert_eq!(topics.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn initialize_fails_when_queue_may_not_be_created() {
        let queues = Arc::new(FakeQueues::default());
        let topics = Arc::new(FakeTopics::default());
        let options = TransportOptions {
            create_queues: false,
            ..TransportOptions::default()
        };
        let transport = transport(Some("billing"), options, &queues, &topics);

        assert!(matches!(
            transport.initialize().await,
            Err(TransportError::UnresolvableQueue(_))
        ));
    }

    #[tokio::test]
    async fn queue_destinations_bypass_the_topic_service() {
        let queues = Arc::new(FakeQueues::with_queues(&["billing"]));
        let topics = Arc::new(FakeTopics::default());
        let transport = transport(None, TransportOptions::default(), &queues, &topics);

        transport.send(&queue_arn("billing"), &hello()).await.unwrap();
        transport.send(&queue_url("billing"), &hello()).await.unwrap();

        assert_eq!(queues.depth("billing"), 2);
        assert!(topics.published().is_empty());
    }

    #[tokio::test]
    async fn bare_name_destinations_publish_after_one_sweep() {
        let queues = Arc::new(FakeQueues::with_queues(&["billing"]));
        let topics = Arc::new(FakeTopics::with_topics(&["orders"]));
        topics.add_subscription("orders", QUEUE_PROTOCOL, &queue_arn("billing"));
        let transport = transport(None, TransportOptions::default(), &queues, &topics);

        transport.send("orders", &hello()).await.unwrap();
        transport.send("orders", &hello()).await.unwrap();

        let published = topics.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].0, topic_arn("orders"));
        assert_eq!(
            JsonMessageSerializer.decode(&published[0].1).unwrap(),
            hello()
        );
        assert_eq!(queues.policy_writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_queue_destination_is_unresolvable() {
        let queues = Arc::new(FakeQueues::default());
        let topics = Arc::new(FakeTopics::default());
        let transport = transport(None, TransportOptions::default(), &queues, &topics);

        let result = transport.send(&queue_arn("billing"), &hello()).await;

        assert!(matches!(result, Err(TransportError::UnresolvableQueue(_))));
    }

    #[tokio::test]
    async fn receive_acknowledges_only_decodable_messages() {
        let queues = Arc::new(FakeQueues::default());
        let topics = Arc::new(FakeTopics::default());
        let transport = transport(Some("billing"), TransportOptions::default(), &queues, &topics);
        transport.initialize().await.unwrap();

        queues.push_body("billing", "garbage");
        assert!(matches!(
            transport.receive().await,
            Err(TransportError::Serialization(_))
        ));
        assert_eq!(queues.depth("billing"), 1);

        let queues = Arc::new(FakeQueues::default());
        let transport = self::transport(Some("billing"), TransportOptions::default(), &queues, &topics);
        transport.initialize().await.unwrap();
        queues.push_body("billing", &JsonMessageSerializer.encode(&hello()).unwrap());

        assert_eq!(transport.receive().await.unwrap(), Some(hello()));
        assert_eq!(queues.depth("billing"), 0);
        assert_eq!(transport.receive().await.unwrap(), None);
    }

    #[tokio::test]
    async fn register_authorizes_the_topic_unless_checks_are_disabled() {
        for (disable_checks, expected) in [(false, true), (true, false)] {
            let queues = Arc::new(FakeQueues::with_queues(&["billing"]));
            let topics = Arc::new(FakeTopics::default());
            let options = TransportOptions {
                disable_access_policy_checks: disable_checks,
                ..TransportOptions::default()
            };
            let transport = transport(None, options, &queues, &topics);

            transport.register_subscriber("orders", "billing").await.unwrap();

            assert_eq!(
                transport.check_access_policy("billing", "orders").await.unwrap(),
                expected
            );
        }
    }

    #[tokio::test]
    async fn access_check_rejects_a_topic_in_queue_position() {
        let queues = Arc::new(FakeQueues::with_queues(&["orders"]));
        let topics = Arc::new(FakeTopics::with_topics(&["orders"]));
        let transport = transport(None, TransportOptions::default(), &queues, &topics);

        let result = transport
            .check_access_policy(&topic_arn("orders"), "orders")
            .await;

        assert!(matches!(
            result,
            Err(TransportError::UnsupportedDestination { .. })
        ));
        assert_eq!(queues.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn create_queue_needs_attached_services() {
        let queues = Arc::new(FakeQueues::default());
        let topics = Arc::new(FakeTopics::default());

        let detached = transport(None, TransportOptions::default(), &queues, &topics);
        assert!(matches!(
            detached.create_queue("billing").await,
            Err(TransportError::NotSupported("create_queue"))
        ));

        let options = TransportOptions {
            auto_attach_services: true,
            ..TransportOptions::default()
        };
        let attached = transport(None, options, &queues, &topics);
        attached.create_queue("billing").await.unwrap();

        assert_eq!(queues.creates.load(Ordering::SeqCst), 1);
        assert_eq!(topics.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_destination_is_surfaced() {
        let queues = Arc::new(FakeQueues::default());
        let topics = Arc::new(FakeTopics::default());
        let transport = transport(None, TransportOptions::default(), &queues, &topics);

        let result = transport.send("arn:aws:sns", &hello()).await;

        assert!(matches!(result, Err(TransportError::MalformedAddress { .. })));
    }
}
