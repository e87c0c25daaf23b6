//! Strongly typed session template.
//!
//! Templates are decoded once at the store boundary. Anything downstream of
//! [`Template::from_document`] works on a well-formed value; a document that
//! does not decode is reported as a store error and never partially used.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Id of the template the gateway looks up first.
pub const ACTIVE_TEMPLATE_ID: &str = "session.meta.ads.v1";

/// Source tag used for the second lookup when the id lookup finds nothing.
pub const TEMPLATE_SOURCE: &str = "meta";

/// The only mapping target the normalizer knows how to build.
pub const CLICK_SIGNALS_TARGET: &str = "context.click_signals";

pub const DEFAULT_CHANNEL: &str = "ads";

const QUERY_PREFIX: &str = "$query.";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Template {
    #[serde(rename = "_id", alias = "id", deserialize_with = "document_id")]
    pub id: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Parameters that must be present and valid, checked in this order.
    pub require: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Defaults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<FieldMapping>,
}

fn default_active() -> bool {
    true
}

/// Accepts a plain string id or an extended-JSON object id (`{"$oid": "..."}`).
fn document_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DocumentId {
        Plain(String),
        ObjectId {
            #[serde(rename = "$oid")]
            oid: String,
        },
    }

    match DocumentId::deserialize(deserializer) {
        Ok(DocumentId::Plain(id)) => Ok(id),
        Ok(DocumentId::ObjectId { oid }) => Ok(oid),
        Err(_) => Err(de::Error::custom(
            "template id must be a string or an object id",
        )),
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Defaults {
    /// Copied verbatim into the payload's `consent` key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent: Option<Value>,
    /// Seed fields of the payload's `context`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<IndexMap<String, Value>>,
    /// Sections the normalizer does not consume (e.g. `business`).
    #[serde(flatten)]
    pub other: IndexMap<String, Value>,
}

/// Output target path → (output field → source reference).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct FieldMapping {
    pub targets: IndexMap<String, IndexMap<String, SourceRef>>,
}

impl FieldMapping {
    pub fn click_signals(&self) -> Option<&IndexMap<String, SourceRef>> {
        self.targets.get(CLICK_SIGNALS_TARGET)
    }
}

/// Where a mapped output field takes its value from.
///
/// Only query parameters are resolvable today. Any other reference is kept as
/// `Unsupported` so a template using it still loads and the field is skipped.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum SourceRef {
    Query(String),
    Unsupported(String),
}

impl SourceRef {
    /// Name of the query parameter this reference reads, if any.
    pub fn query_param(&self) -> Option<&str> {
        match self {
            SourceRef::Query(name) => Some(name),
            SourceRef::Unsupported(_) => None,
        }
    }
}

impl From<String> for SourceRef {
    fn from(raw: String) -> Self {
        match raw.strip_prefix(QUERY_PREFIX) {
            Some(name) => SourceRef::Query(name.to_string()),
            None => SourceRef::Unsupported(raw),
        }
    }
}

impl From<&str> for SourceRef {
    fn from(raw: &str) -> Self {
        SourceRef::from(raw.to_string())
    }
}

impl From<SourceRef> for String {
    fn from(source: SourceRef) -> Self {
        match source {
            SourceRef::Query(name) => format!("{QUERY_PREFIX}{name}"),
            SourceRef::Unsupported(raw) => raw,
        }
    }
}

impl Template {
    /// Decodes a raw store document.
    pub fn from_document(document: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(document)
    }

    pub fn channel(&self) -> &str {
        self.channel.as_deref().unwrap_or(DEFAULT_CHANNEL)
    }

    /// Built-in template used whenever the store has nothing usable.
    pub fn fallback() -> Self {
        let click_signals = [
            "fbclid",
            "campaign_id",
            "adset_id",
            "ad_id",
            "placement",
            "utm_source",
            "utm_medium",
            "utm_campaign",
            "utm_content",
        ]
        .into_iter()
        .map(|field| (field.to_string(), SourceRef::Query(field.to_string())))
        .collect();

        Template {
            id: "fallback".into(),
            active: true,
            source: Some(TEMPLATE_SOURCE.into()),
            tenant: Some("xtrim".into()),
            channel: Some(DEFAULT_CHANNEL.into()),
            require: vec!["campaign_id".into(), "adset_id".into(), "ad_id".into()],
            defaults: Some(Defaults {
                consent: Some(json!({"ad_personalization": true})),
                context: Some(IndexMap::from([("device".to_string(), json!("mobile"))])),
                other: IndexMap::from([("business".to_string(), json!({"brand": "xtrim"}))]),
            }),
            mapping: Some(FieldMapping {
                targets: IndexMap::from([(CLICK_SIGNALS_TARGET.to_string(), click_signals)]),
            }),
        }
    }
}
