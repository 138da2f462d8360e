//! HTTP response envelope.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::schema::{self, JsonSchema, Record};

/// An HTTP response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResponse {
    /// Final request URL.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response headers, names lowercased.
    pub headers: BTreeMap<String, String>,
    /// Response body text.
    pub body: String,
    /// When the response was received.
    pub received_at: DateTime<Utc>,
}

impl HttpResponse {
    /// Creates a response envelope stamped with the current time.
    ///
    /// Header names are lowercased for case-insensitive lookup.
    pub fn new(
        url: impl Into<String>,
        status: u16,
        headers: BTreeMap<String, String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            status,
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value))
                .collect(),
            body: body.into(),
            received_at: Utc::now(),
        }
    }

    /// Returns true for a 2xx status.
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Looks up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> Result<Value, CoreError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Extracts flat records from the body.
    ///
    /// The path selects the value to iterate as records; the schema remaps
    /// each record's fields. See [`schema::extract`].
    pub fn records(
        &self,
        json_path: Option<&str>,
        json_schema: Option<&JsonSchema>,
    ) -> Result<Vec<Record>, CoreError> {
        let document = self.json()?;
        schema::extract(&document, json_path, json_schema)
    }
}
