//! Bucket access policies.
//!
//! Statements are serialized in the AWS IAM policy JSON format understood
//! by S3-compatible stores.  Each grant owns exactly one statement whose
//! `Sid` is the granted user's name; merging a statement replaces the one
//! with the same `Sid` or appends it, so repeated grants are idempotent.
//!
//! Statements written by other tools round-trip untouched: `Action`,
//! `Resource` and principal lists accept a bare string on read, and keys we
//! do not model (e.g. `Condition`) are preserved.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Policy language version written into every policy we create.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Actions granted to a bucket-access identity.
pub const ALLOWED_ACTIONS: &[&str] = &["s3:*"];

const USER_ARN_PREFIX: &str = "arn:aws:iam:::user/";
const BUCKET_ARN_PREFIX: &str = "arn:aws:s3:::";

/// Statement effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// The `Principal` element: either the `"*"` wildcard or a map of
/// principal kinds, of which only `AWS` is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Principal {
    Wildcard(String),
    Mapped(PrincipalMap),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrincipalMap {
    #[serde(
        rename = "AWS",
        default,
        with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub aws: Vec<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Default for Principal {
    fn default() -> Self {
        Principal::Mapped(PrincipalMap::default())
    }
}

/// A single policy statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyStatement {
    #[serde(rename = "Sid", default, skip_serializing_if = "String::is_empty")]
    pub sid: String,
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Principal", default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    /// Absent on statements written with `NotAction`; never serialized empty.
    #[serde(
        rename = "Action",
        default,
        with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub actions: Vec<String>,
    #[serde(
        rename = "Resource",
        default,
        with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub resources: Vec<String>,
    /// Keys we do not interpret (`Condition`, `NotAction`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PolicyStatement {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyStatement {
    /// An empty `Allow` statement, to be filled in with the builder methods.
    pub fn new() -> Self {
        Self {
            sid: String::new(),
            effect: Effect::Allow,
            principal: None,
            actions: Vec::new(),
            resources: Vec::new(),
            extra: Map::new(),
        }
    }

    /// The statement granting `user` full access to `bucket` and its objects.
    pub fn grant(user: &str, bucket: &str) -> Self {
        Self::new()
            .with_sid(user)
            .for_principals([user])
            .for_resources([bucket])
            .for_sub_resources([bucket])
            .allows()
            .actions(ALLOWED_ACTIONS.iter().copied())
    }

    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = sid.into();
        self
    }

    /// Add IAM users as principals.
    pub fn for_principals<'a>(mut self, users: impl IntoIterator<Item = &'a str>) -> Self {
        let arns = users
            .into_iter()
            .map(|u| format!("{USER_ARN_PREFIX}{u}"));
        match &mut self.principal {
            Some(Principal::Mapped(map)) => map.aws.extend(arns),
            _ => {
                self.principal = Some(Principal::Mapped(PrincipalMap {
                    aws: arns.collect(),
                    other: Map::new(),
                }))
            }
        }
        self
    }

    /// Add buckets as resources.
    pub fn for_resources<'a>(mut self, buckets: impl IntoIterator<Item = &'a str>) -> Self {
        self.resources
            .extend(buckets.into_iter().map(|b| format!("{BUCKET_ARN_PREFIX}{b}")));
        self
    }

    /// Add every object inside the buckets as resources.
    pub fn for_sub_resources<'a>(mut self, buckets: impl IntoIterator<Item = &'a str>) -> Self {
        self.resources
            .extend(buckets.into_iter().map(|b| format!("{BUCKET_ARN_PREFIX}{b}/*")));
        self
    }

    pub fn allows(mut self) -> Self {
        self.effect = Effect::Allow;
        self
    }

    pub fn denies(mut self) -> Self {
        self.effect = Effect::Deny;
        self
    }

    pub fn actions<'a>(mut self, actions: impl IntoIterator<Item = &'a str>) -> Self {
        self.actions.extend(actions.into_iter().map(str::to_string));
        self
    }

    /// AWS principals named by this statement.
    pub fn principals(&self) -> &[String] {
        match &self.principal {
            Some(Principal::Mapped(map)) => &map.aws,
            _ => &[],
        }
    }
}

/// A bucket policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketPolicy {
    #[serde(rename = "Version", default = "default_version")]
    pub version: String,
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "Statement", default)]
    pub statements: Vec<PolicyStatement>,
}

fn default_version() -> String {
    POLICY_VERSION.to_string()
}

impl BucketPolicy {
    /// A policy holding exactly `statement`.
    pub fn new(statement: PolicyStatement) -> Self {
        Self {
            version: default_version(),
            id: None,
            statements: vec![statement],
        }
    }

    /// Merge `statement` into `existing`, treating an absent policy as empty.
    pub fn merge(existing: Option<BucketPolicy>, statement: PolicyStatement) -> Self {
        match existing {
            None => Self::new(statement),
            Some(mut policy) => {
                policy.upsert_statement(statement);
                policy
            }
        }
    }

    /// Replace the statement sharing `statement.sid` in place, or append.
    ///
    /// Later statements with the same `sid` are dropped so the policy keeps
    /// one statement per identity even if it was edited out of band.
    pub fn upsert_statement(&mut self, statement: PolicyStatement) {
        match self.statements.iter().position(|s| s.sid == statement.sid) {
            Some(pos) => {
                let sid = statement.sid.clone();
                self.statements[pos] = statement;
                let mut idx = 0;
                self.statements.retain(|s| {
                    let keep = idx <= pos || s.sid != sid;
                    idx += 1;
                    keep
                });
            }
            None => self.statements.push(statement),
        }
    }

    /// Drop every statement with this `sid`.  Returns whether any was removed.
    pub fn remove_statement(&mut self, sid: &str) -> bool {
        let before = self.statements.len();
        self.statements.retain(|s| s.sid != sid);
        self.statements.len() != before
    }

    pub fn statement(&self, sid: &str) -> Option<&PolicyStatement> {
        self.statements.iter().find(|s| s.sid == sid)
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Serde adapter for policy fields that may be a string or a list.
mod one_or_many {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    pub fn serialize<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        values.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        })
    }
}

// -- Tests -------------------------------------------------------------------
