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

//! Fully-qualified resource identifier grammar.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub(crate) const ARN_PREFIX: &str = "arn:";
const ARN_FIELD_COUNT: usize = 6;

/// Colon-delimited fixed-field resource identifier.
///
/// The resource field is everything after the fifth colon and may itself contain colons or
/// slashes.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl Arn {
    pub fn new(
        partition: &str,
        service: &str,
        region: &str,
        account_id: &str,
        resource: &str,
    ) -> Self {
        Self {
            partition: partition.to_string(),
            service: service.to_string(),
            region: region.to_string(),
            account_id: account_id.to_string(),
            resource: resource.to_string(),
        }
    }

    /// Returns `true` when `raw` starts like an identifier, whether or not it decomposes.
    pub fn looks_like(raw: &str) -> bool {
        raw.get(..ARN_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(ARN_PREFIX))
    }
}

/// Reasons an identifier-shaped string could not be decomposed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArnParseError {
    MissingPrefix,
    TooFewFields,
    EmptyPartition,
    EmptyService,
    EmptyResource,
}

impl Display for ArnParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ArnParseError::MissingPrefix => write!(f, "identifier must start with 'arn:'"),
            ArnParseError::TooFewFields => write!(f, "identifier must have six ':'-separated fields"),
            ArnParseError::EmptyPartition => write!(f, "identifier partition is empty"),
            ArnParseError::EmptyService => write!(f, "identifier service is empty"),
            ArnParseError::EmptyResource => write!(f, "identifier resource is empty"),
        }
    }
}

impl std::error::Error for ArnParseError {}

impl FromStr for Arn {
    type Err = ArnParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if !Arn::looks_like(raw) {
            return Err(ArnParseError::MissingPrefix);
        }

        let fields: Vec<&str> = raw.splitn(ARN_FIELD_COUNT, ':').collect();
        let [_, partition, service, region, account_id, resource] = fields.as_slice() else {
            return Err(ArnParseError::TooFewFields);
        };

        if partition.is_empty() {
            return Err(ArnParseError::EmptyPartition);
        }
        if service.is_empty() {
            return Err(ArnParseError::EmptyService);
        }
        if resource.is_empty() {
            return Err(ArnParseError::EmptyResource);
        }

        Ok(Arn::new(partition, service, region, account_id, resource))
    }
}

impl Display for Arn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Arn, ArnParseError};
    use std::str::FromStr;

    #[test]
    fn parses_all_six_fields() {
        let arn = Arn::from_str("arn:aws:sqs:eu-west-1:123456789012:billing").unwrap();

        assert_eq!(arn.partition, "aws");
        assert_eq!(arn.service, "sqs");
        assert_eq!(arn.region, "eu-west-1");
        assert_eq!(arn.account_id, "123456789012");
        assert_eq!(arn.resource, "billing");
    }

    #[test]
    fn resource_keeps_embedded_separators() {
        let arn = Arn::from_str("arn:aws:iam::123456789012:role/path:with-colon").unwrap();

        assert_eq!(arn.region, "");
        assert_eq!(arn.resource, "role/path:with-colon");
    }

    #[test]
    fn short_identifier_is_rejected() {
        assert_eq!(
            Arn::from_str("arn:aws:sns:us-east-1"),
            Err(ArnParseError::TooFewFields)
        );
        assert_eq!(
            Arn::from_str("arn:aws::us-east-1:1:orders"),
            Err(ArnParseError::EmptyService)
        );
        assert_eq!(
            Arn::from_str("arn:aws:sns:us-east-1:1:"),
            Err(ArnParseError::EmptyResource)
        );
    }

    #[test]
    fn display_matches_parsed_input() {
        let raw = "arn:aws:sns:us-east-1:000000000000:orders";
        assert_eq!(Arn::from_str(raw).unwrap().to_string(), raw);
    }
}
