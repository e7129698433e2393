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

//! Policy document model and structural statement comparison.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};

pub const POLICY_VERSION: &str = "2012-10-17";
/// Principal under which the topic service delivers to queues.
pub const TOPIC_SERVICE_PRINCIPAL: &str = "sns.amazonaws.com";
pub const SEND_MESSAGE_ACTION: &str = "sqs:SendMessage";
pub const SOURCE_ARN_CONDITION_KEY: &str = "aws:SourceArn";
const ARN_EQUALS_CONDITION: &str = "ArnEquals";

const SID_KEY: &str = "Sid";
const EFFECT_KEY: &str = "Effect";
const PRINCIPAL_KEY: &str = "Principal";
const ACTION_KEY: &str = "Action";
const RESOURCE_KEY: &str = "Resource";
const CONDITION_KEY: &str = "Condition";
const ALLOW: &str = "Allow";

fn default_version() -> String {
    POLICY_VERSION.to_string()
}

/// Accepts both a single statement object and a statement array.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Value>),
        One(Value),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(statements) => statements,
        OneOrMany::One(statement) => vec![statement],
    })
}

/// A queue's resource policy.
///
/// Statements are kept as raw JSON so statements this crate does not model are written back
/// exactly as they were read.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version", default = "default_version")]
    pub version: String,
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "Statement", default, deserialize_with = "one_or_many")]
    pub statements: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyDocument {
    pub fn new() -> Self {
        Self {
            version: default_version(),
            id: None,
            statements: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn from_json(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// True when some statement is structurally equal to `statement`, ignoring its `Sid`.
    pub fn contains(&self, statement: &PolicyStatement) -> bool {
        let required = statement.normalized();
        self.statements
            .iter()
            .filter_map(NormalizedStatement::from_value)
            .any(|existing| existing == required)
    }

    /// Appends `statement` under a fresh `Sid`; existing statements are left untouched.
    pub fn push(&mut self, statement: &PolicyStatement) {
        let sid = format!("Sid{}", uuid::Uuid::new_v4().simple());
        self.statements.push(statement.to_value(&sid));
    }
}

/// The allow-statement that lets one topic deliver to one queue.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PolicyStatement {
    queue_arn: String,
    topic_arn: String,
}

impl PolicyStatement {
    pub fn allow_topic_delivery(queue_arn: impl Into<String>, topic_arn: impl Into<String>) -> Self {
        Self {
            queue_arn: queue_arn.into(),
            topic_arn: topic_arn.into(),
        }
    }

    pub fn queue_arn(&self) -> &str {
        &self.queue_arn
    }

    pub fn topic_arn(&self) -> &str {
        &self.topic_arn
    }

    pub fn to_value(&self, sid: &str) -> Value {
        json!({
            SID_KEY: sid,
            EFFECT_KEY: ALLOW,
            PRINCIPAL_KEY: { "Service": TOPIC_SERVICE_PRINCIPAL },
            ACTION_KEY: SEND_MESSAGE_ACTION,
            RESOURCE_KEY: self.queue_arn,
            CONDITION_KEY: {
                ARN_EQUALS_CONDITION: { SOURCE_ARN_CONDITION_KEY: self.topic_arn }
            },
        })
    }

    fn normalized(&self) -> NormalizedStatement {
        NormalizedStatement::from_value(&self.to_value(""))
            .unwrap_or_else(NormalizedStatement::unmatchable)
    }
}

/// Order- and shape-insensitive view of one statement.
///
/// Single strings and string arrays compare equal when they hold the same values; action names
/// and condition keys compare case-insensitively.
#[derive(Debug, Eq, PartialEq)]
struct NormalizedStatement {
    effect: String,
    principal: BTreeMap<String, BTreeSet<String>>,
    actions: BTreeSet<String>,
    resources: BTreeSet<String>,
    condition: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

impl NormalizedStatement {
    /// `None` for statements using elements this model does not compare (e.g. `NotAction`).
    fn from_value(statement: &Value) -> Option<Self> {
        let object = statement.as_object()?;
        let mut normalized = Self::unmatchable();

        for (key, value) in object {
            match key.as_str() {
                SID_KEY => {}
                EFFECT_KEY => normalized.effect = value.as_str()?.to_string(),
                PRINCIPAL_KEY => normalized.principal = principal_set(value)?,
                ACTION_KEY => {
                    normalized.actions = string_set(value)?
                        .into_iter()
                        .map(|action| action.to_ascii_lowercase())
                        .collect()
                }
                RESOURCE_KEY => normalized.resources = string_set(value)?,
                CONDITION_KEY => normalized.condition = condition_map(value)?,
                _ => return None,
            }
        }

        Some(normalized)
    }

    fn unmatchable() -> Self {
        Self {
            effect: String::new(),
            principal: BTreeMap::new(),
            actions: BTreeSet::new(),
            resources: BTreeSet::new(),
            condition: BTreeMap::new(),
        }
    }
}

fn string_set(value: &Value) -> Option<BTreeSet<String>> {
    match value {
        Value::String(single) => Some(BTreeSet::from([single.clone()])),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

fn principal_set(value: &Value) -> Option<BTreeMap<String, BTreeSet<String>>> {
    match value {
        Value::String(wildcard) => Some(BTreeMap::from([(
            wildcard.clone(),
            BTreeSet::from([wildcard.clone()]),
        )])),
        Value::Object(kinds) => kinds
            .iter()
            .map(|(kind, ids)| string_set(ids).map(|ids| (kind.clone(), ids)))
            .collect(),
        _ => None,
    }
}

fn condition_map(value: &Value) -> Option<BTreeMap<String, BTreeMap<String, BTreeSet<String>>>> {
    value
        .as_object()?
        .iter()
        .map(|(operator, keys)| {
            let keys = keys
                .as_object()?
                .iter()
                .map(|(key, values)| {
                    string_set(values).map(|values| (key.to_ascii_lowercase(), values))
                })
                .collect::<Option<BTreeMap<_, _>>>()?;
            Some((operator.clone(), keys))
        })
        .collect()
}
