//! Repository records as returned by the GitHub API
//!
//! A [`RepositoryRecord`] keeps the three fields the mirror needs as typed
//! values and carries every other field of the API document alongside, so
//! `list --format` can reach anything GitHub returns.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{MirrorError, Result};

/// One remote repository
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RepositoryRecord {
    pub name: String,
    #[serde(deserialize_with = "clone_url_with_directory")]
    pub clone_url: String,
    #[serde(default)]
    pub archived: bool,
    /// Remaining provider fields, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RepositoryRecord {
    /// Decode one API object
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Look up any field of the original document by key
    pub fn get(&self, key: &str) -> Result<Value> {
        match key {
            "name" => Ok(Value::String(self.name.clone())),
            "clone_url" => Ok(Value::String(self.clone_url.clone())),
            "archived" => Ok(Value::Bool(self.archived)),
            _ => self
                .extra
                .get(key)
                .cloned()
                .ok_or_else(|| MirrorError::MissingField(key.to_string())),
        }
    }

    /// The full document, known fields included
    pub fn raw(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert("clone_url".to_string(), Value::String(self.clone_url.clone()));
        map.insert("archived".to_string(), Value::Bool(self.archived));
        Value::Object(map)
    }

    /// Local directory name: the last path segment of the clone URL, verbatim
    pub fn directory_name(&self) -> &str {
        last_segment(&self.clone_url)
    }
}

fn last_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// A clone URL must end in a segment usable as a directory under `current/`
fn clone_url_with_directory<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let url = String::deserialize(deserializer)?;
    match last_segment(&url) {
        "" | "." | ".." => Err(serde::de::Error::custom(format!(
            "clone_url {:?} does not end in a directory name",
            url
        ))),
        _ => Ok(url),
    }
}

/// Render a `%(key)s` template against a record
///
/// `%%` yields a literal percent sign. String fields print bare, everything
/// else prints as JSON.
pub fn format_record(template: &str, record: &RepositoryRecord) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];

        if let Some(after) = rest.strip_prefix('%') {
            out.push('%');
            rest = after;
            continue;
        }

        let Some(body) = rest.strip_prefix('(') else {
            return Err(MirrorError::Format(format!(
                "expected '(' after '%' in {:?}",
                template
            )));
        };
        let Some(close) = body.find(')') else {
            return Err(MirrorError::Format(format!("unclosed '%(' in {:?}", template)));
        };

        let key = &body[..close];
        let after_key = &body[close + 1..];
        let Some(after_conv) = after_key.strip_prefix('s') else {
            return Err(MirrorError::Format(format!(
                "only %(key)s conversions are supported, in {:?}",
                template
            )));
        };

        match record.get(key)? {
            Value::String(s) => out.push_str(&s),
            other => out.push_str(&other.to_string()),
        }
        rest = after_conv;
    }

    out.push_str(rest);
    Ok(out)
}
