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

//! Address value object and its single classifier.

use crate::addressing::arn::Arn;
use crate::error::TransportError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use url::Url;

const URL_SCHEME_SEPARATOR: &str = "://";

/// Shape of a raw address string.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AddressKind {
    /// A bare resource name, e.g. `billing`.
    Unqualified,
    /// A colon-delimited fully-qualified resource identifier.
    FullyQualifiedId,
    /// An absolute locator URL (queue service only).
    LocatorUrl,
}

/// Which of the two services an address names.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ServiceKind {
    /// Not inferable from the address, or a service token this crate does not know.
    Unspecified,
    Queue,
    Topic,
}

impl ServiceKind {
    /// Maps a service token (identifier field or host label) to a service.
    ///
    /// Unknown tokens are tagged [`ServiceKind::Unspecified`] rather than rejected.
    pub fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "sqs" => ServiceKind::Queue,
            "sns" => ServiceKind::Topic,
            _ => ServiceKind::Unspecified,
        }
    }
}

impl Display for ServiceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceKind::Unspecified => write!(f, "unspecified"),
            ServiceKind::Queue => write!(f, "queue"),
            ServiceKind::Topic => write!(f, "topic"),
        }
    }
}

/// Classifies the shape of `raw` without decomposing it.
///
/// ```
/// use unified_transport::{classify, AddressKind};
///
/// assert_eq!(classify("orders"), AddressKind::Unqualified);
/// assert_eq!(classify("arn:aws:sns:us-east-1:1:orders"), AddressKind::FullyQualifiedId);
/// assert_eq!(classify("https://sqs.us-east-1.amazonaws.com/1/orders"), AddressKind::LocatorUrl);
/// ```
pub fn classify(raw: &str) -> AddressKind {
    if Arn::looks_like(raw) {
        AddressKind::FullyQualifiedId
    } else if raw.contains(URL_SCHEME_SEPARATOR) {
        AddressKind::LocatorUrl
    } else {
        AddressKind::Unqualified
    }
}

/// Immutable, parsed address.
///
/// `full_identity` is present exactly when the kind is not [`AddressKind::Unqualified`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Address {
    kind: AddressKind,
    service: ServiceKind,
    resource_id: String,
    full_identity: Option<String>,
}

impl Address {
    /// Parses any of the three address shapes.
    ///
    /// Fails with [`TransportError::MalformedAddress`] only when `raw` looks like an identifier
    /// or a URL but cannot be decomposed. Everything else is a bare name.
    pub fn parse(raw: &str) -> Result<Self, TransportError> {
        match classify(raw) {
            AddressKind::FullyQualifiedId => Self::from_arn_str(raw),
            AddressKind::LocatorUrl => Self::from_url_str(raw),
            AddressKind::Unqualified => Ok(Self::unqualified(raw)),
        }
    }

    /// Builds a bare-name address without classification.
    pub fn unqualified(name: &str) -> Self {
        Self {
            kind: AddressKind::Unqualified,
            service: ServiceKind::Unspecified,
            resource_id: name.to_string(),
            full_identity: None,
        }
    }

    /// Builds an identifier address from an already-decomposed [`Arn`].
    pub fn from_arn(arn: &Arn) -> Self {
        Self {
            kind: AddressKind::FullyQualifiedId,
            service: ServiceKind::from_token(&arn.service),
            resource_id: arn.resource.clone(),
            full_identity: Some(arn.to_string()),
        }
    }

    fn from_arn_str(raw: &str) -> Result<Self, TransportError> {
        let arn = Arn::from_str(raw)
            .map_err(|err| TransportError::malformed(raw, &err.to_string()))?;

        Ok(Self {
            full_identity: Some(raw.to_string()),
            ..Self::from_arn(&arn)
        })
    }

    fn from_url_str(raw: &str) -> Result<Self, TransportError> {
        let url = Url::parse(raw).map_err(|err| TransportError::malformed(raw, &err.to_string()))?;

        let service = url
            .host_str()
            .and_then(|host| host.split('.').next())
            .map(ServiceKind::from_token)
            .unwrap_or(ServiceKind::Unspecified);

        let resource_id = url
            .path_segments()
            .and_then(|segments| segments.rev().find(|segment| !segment.is_empty()))
            .ok_or_else(|| TransportError::malformed(raw, "URL has no resource path segment"))?;

        Ok(Self {
            kind: AddressKind::LocatorUrl,
            service,
            resource_id: resource_id.to_string(),
            full_identity: Some(raw.to_string()),
        })
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn service(&self) -> ServiceKind {
        self.service
    }

    /// The human-readable resource name, for every shape.
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn full_identity(&self) -> Option<&str> {
        self.full_identity.as_deref()
    }

    pub fn is_fully_qualified_id(&self) -> bool {
        self.kind == AddressKind::FullyQualifiedId
    }
}

impl FromStr for Address {
    type Err = TransportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Address::parse(raw)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.full_identity {
            Some(full_identity) => write!(f, "{full_identity}"),
            None => write!(f, "{}", self.resource_id),
        }
    }
}
