//! The endpoint contract.
//!
//! An [`Endpoint`] couples a request template with a default JSON path and
//! default extraction schema. Endpoints are immutable after construction;
//! call-time overrides travel in [`ExtractOptions`] and never mutate the
//! endpoint.

use flatfetch_client::HttpClient;
use flatfetch_core::{HttpRequest, HttpResponse, JsonSchema, Record};
use tracing::debug;

use crate::error::ApiError;
use crate::options::ExtractOptions;

/// A remote JSON endpoint with extraction defaults.
#[derive(Debug, Clone)]
pub struct Endpoint {
    request: HttpRequest,
    json_path: Option<String>,
    json_schema: Option<JsonSchema>,
}

impl Endpoint {
    /// Creates an endpoint from a request template.
    pub fn new(request: HttpRequest) -> Self {
        Self {
            request,
            json_path: None,
            json_schema: None,
        }
    }

    /// Sets the default JSON path selecting the records within a response.
    #[must_use]
    pub fn with_json_path(mut self, path: impl Into<String>) -> Self {
        self.json_path = Some(path.into());
        self
    }

    /// Sets the default extraction schema.
    #[must_use]
    pub fn with_json_schema(mut self, schema: JsonSchema) -> Self {
        self.json_schema = Some(schema);
        self
    }

    /// The request template.
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    /// Default JSON path, if any.
    pub fn json_path(&self) -> Option<&str> {
        self.json_path.as_deref()
    }

    /// Default schema, if any.
    pub fn json_schema(&self) -> Option<&JsonSchema> {
        self.json_schema.as_ref()
    }

    /// Identity of this endpoint: the request fingerprint.
    pub fn key(&self) -> String {
        self.request.fingerprint()
    }

    /// Effective JSON path for one call.
    pub fn effective_json_path<'a>(&'a self, options: &'a ExtractOptions) -> Option<&'a str> {
        options.resolve_json_path(self.json_path.as_deref())
    }

    /// Effective schema for one call.
    pub fn effective_schema<'a>(&'a self, options: &'a ExtractOptions) -> Option<&'a JsonSchema> {
        options.resolve_json_schema(self.json_schema.as_ref())
    }

    /// Fetches the endpoint, blocking through the client's throttle.
    ///
    /// # Errors
    ///
    /// Transport failures surface as [`ApiError::Client`].
    pub fn fetch(&self, client: &HttpClient) -> Result<HttpResponse, ApiError> {
        Ok(client.request(&self.request)?)
    }

    /// Fetches the endpoint on the concurrent pipeline.
    ///
    /// # Errors
    ///
    /// Transport failures surface as [`ApiError::Client`].
    pub async fn fetch_concurrent(&self, client: &HttpClient) -> Result<HttpResponse, ApiError> {
        Ok(client.request_concurrent(&self.request).await?)
    }

    /// Extracts this endpoint's flat records from a response.
    ///
    /// Call-time overrides in `options` win over the endpoint defaults for
    /// this call only.
    ///
    /// # Errors
    ///
    /// Invalid response JSON or a schema shape mismatch surface as
    /// [`ApiError::Core`].
    pub fn records(
        &self,
        response: &HttpResponse,
        options: &ExtractOptions,
    ) -> Result<Vec<Record>, ApiError> {
        let json_path = self.effective_json_path(options);
        let json_schema = self.effective_schema(options);
        let records = response.records(json_path, json_schema)?;
        debug!(
            url = %self.request.url(),
            count = records.len(),
            "Extracted records"
        );
        Ok(records)
    }
}

// ============================================================================
// Tests
// ============================================================================
