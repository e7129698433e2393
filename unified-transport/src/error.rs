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

//! Error taxonomy surfaced by every public transport operation.

use crate::addressing::address::ServiceKind;
use crate::services::ServiceError;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum TransportError {
    /// The address looks like an identifier or URL but cannot be decomposed.
    MalformedAddress { address: String, reason: String },
    /// The topic could not be resolved and creating it was disallowed or failed.
    UnresolvableTopic(String),
    /// The subscriber queue could not be resolved. Subscribing never creates queues.
    UnresolvableSubscriber(String),
    /// A queue destination (or the transport's own input queue) could not be resolved.
    UnresolvableQueue(String),
    /// The address names a recognized service this operation cannot route to.
    UnsupportedDestination {
        address: String,
        service: ServiceKind,
    },
    /// The transport has no input queue and therefore cannot receive.
    ReceiveNotSupported,
    /// A remote call returned a non-success status.
    RemoteOperationFailed {
        operation: &'static str,
        source: ServiceError,
    },
    /// The queue already carries a policy attribute that is not a policy document.
    InvalidPolicyDocument { queue: String, reason: String },
    Serialization(String),
    Configuration(String),
    /// The operation needs the identities resolved by `initialize()`.
    NotInitialized,
    NotSupported(&'static str),
}

impl TransportError {
    pub(crate) fn malformed(address: &str, reason: &str) -> Self {
        TransportError::MalformedAddress {
            address: address.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn remote(operation: &'static str, source: ServiceError) -> Self {
        TransportError::RemoteOperationFailed { operation, source }
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::MalformedAddress { address, reason } => {
                write!(f, "could not parse address '{address}': {reason}")
            }
            TransportError::UnresolvableTopic(topic) => {
                write!(f, "could not resolve topic '{topic}'")
            }
            TransportError::UnresolvableSubscriber(subscriber) => {
                write!(
                    f,
                    "could not resolve subscriber queue '{subscriber}'; the queue must exist before subscribing"
                )
            }
            TransportError::UnresolvableQueue(queue) => {
                write!(f, "could not resolve queue '{queue}'")
            }
            TransportError::UnsupportedDestination { address, service } => {
                write!(
                    f,
                    "unsupported {service} service for destination address '{address}'"
                )
            }
            TransportError::ReceiveNotSupported => {
                write!(f, "receive is not supported by a transport without an input queue")
            }
            TransportError::RemoteOperationFailed { operation, source } => {
                write!(f, "{operation} failed: {source}")
            }
            TransportError::InvalidPolicyDocument { queue, reason } => {
                write!(f, "existing access policy of queue '{queue}' is invalid: {reason}")
            }
            TransportError::Serialization(reason) => {
                write!(f, "message serialization failed: {reason}")
            }
            TransportError::Configuration(reason) => {
                write!(f, "invalid transport configuration: {reason}")
            }
            TransportError::NotInitialized => write!(f, "transport is not initialized"),
            TransportError::NotSupported(operation) => {
                write!(f, "{operation} is not supported with the current options")
            }
        }
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransportError::RemoteOperationFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TransportError;
    use crate::services::ServiceError;
    use std::error::Error;

    #[test]
    fn remote_failure_exposes_status_request_id_and_source() {
        let error = TransportError::remote(
            "publish",
            ServiceError::new(503, "ServiceUnavailable").with_request_id("req-42"),
        );

        let rendered = error.to_string();
        assert!(rendered.starts_with("publish failed"));
        assert!(rendered.contains("503"));
        assert!(rendered.contains("req-42"));
        assert!(error.source().is_some());
    }

    #[test]
    fn local_errors_have_no_source() {
        assert!(TransportError::ReceiveNotSupported.source().is_none());
        assert_eq!(
            TransportError::UnresolvableTopic("orders".to_string()).to_string(),
            "could not resolve topic 'orders'"
        );
    }
}
