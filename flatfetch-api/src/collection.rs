//! Multi-endpoint fan-out.
//!
//! An [`EndpointCollection`] is an ordered, duplicate-free set of endpoints.
//! Insertion order is semantically meaningful: it fixes the output order of
//! the sequential path and the slot assignment of the concurrent path.
//!
//! Sequential extraction is lazy and single-pass: endpoint N+1 is fetched
//! only once endpoint N's records have been drained. Concurrent extraction
//! fetches every endpoint at once, joins them all before producing a single
//! record, and then yields records in original collection order; the
//! barrier trades streaming of early results for deterministic ordering.

use flatfetch_client::HttpClient;
use flatfetch_core::{JsonSchema, Record};
use futures::future;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::options::ExtractOptions;

// ============================================================================
// Endpoint Collection
// ============================================================================

/// An ordered, duplicate-free set of endpoints.
#[derive(Debug, Clone, Default)]
pub struct EndpointCollection {
    endpoints: Vec<Endpoint>,
}

impl EndpointCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an endpoint, preserving first-insertion order.
    ///
    /// Uniqueness is by identity (request fingerprint); a duplicate is
    /// ignored and `false` is returned.
    pub fn insert(&mut self, endpoint: Endpoint) -> bool {
        let key = endpoint.key();
        if self.endpoints.iter().any(|existing| existing.key() == key) {
            debug!(key, "Ignoring duplicate endpoint");
            return false;
        }
        self.endpoints.push(endpoint);
        true
    }

    /// Number of endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns true if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Iterates endpoints in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Endpoint> {
        self.endpoints.iter()
    }

    // ------------------------------------------------------------------------
    // Sequential extraction
    // ------------------------------------------------------------------------

    /// Lazily extracts flat records across all endpoints in order.
    ///
    /// Records already yielded stay delivered when a later endpoint fails;
    /// the failure is yielded as one `Err` item and the sequence ends.
    pub fn extract<'a>(
        &'a self,
        client: &'a HttpClient,
        options: &'a ExtractOptions,
    ) -> Extract<'a> {
        Extract {
            inner: self.extract_with_schema(client, options),
        }
    }

    /// Like [`EndpointCollection::extract`], pairing every record with the
    /// schema that produced it.
    pub fn extract_with_schema<'a>(
        &'a self,
        client: &'a HttpClient,
        options: &'a ExtractOptions,
    ) -> ExtractWithSchema<'a> {
        ExtractWithSchema {
            endpoints: self.endpoints.iter(),
            client,
            options,
            buffer: Vec::new().into_iter(),
            schema: None,
            done: false,
        }
    }

    /// Lazily extracts typed instances across all endpoints in order.
    ///
    /// Each flat record is materialized into `T` by field name; an
    /// incompatible record yields [`ApiError::Instance`].
    pub fn extract_as<'a, T>(
        &'a self,
        client: &'a HttpClient,
        options: &'a ExtractOptions,
    ) -> impl Iterator<Item = Result<T, ApiError>> + 'a
    where
        T: DeserializeOwned + 'a,
    {
        self.extract(client, options)
            .map(|result| result.and_then(materialize::<T>))
    }

    // ------------------------------------------------------------------------
    // Concurrent extraction
    // ------------------------------------------------------------------------

    /// Extracts flat records across all endpoints concurrently.
    ///
    /// One task per endpoint; all fetches are joined before any extraction,
    /// then records come back in collection order regardless of which fetch
    /// finished first. Any single fetch failure fails the whole batch.
    ///
    /// # Errors
    ///
    /// The first endpoint failure, with no partial results.
    #[instrument(skip_all, fields(endpoints = self.endpoints.len()))]
    pub async fn extract_concurrent(
        &self,
        client: &HttpClient,
        options: &ExtractOptions,
    ) -> Result<Vec<Record>, ApiError> {
        let paired = self.extract_with_schema_concurrent(client, options).await?;
        Ok(paired.into_iter().map(|(record, _)| record).collect())
    }

    /// Like [`EndpointCollection::extract_concurrent`], pairing every record
    /// with the schema that produced it.
    ///
    /// # Errors
    ///
    /// The first endpoint failure, with no partial results.
    pub async fn extract_with_schema_concurrent<'a>(
        &'a self,
        client: &HttpClient,
        options: &'a ExtractOptions,
    ) -> Result<Vec<(Record, Option<&'a JsonSchema>)>, ApiError> {
        let fetches = self
            .endpoints
            .iter()
            .map(|endpoint| endpoint.fetch_concurrent(client));
        let responses = future::try_join_all(fetches).await?;

        let mut paired = Vec::new();
        for (endpoint, response) in self.endpoints.iter().zip(&responses) {
            let schema = endpoint.effective_schema(options);
            for record in endpoint.records(response, options)? {
                paired.push((record, schema));
            }
        }

        debug!(records = paired.len(), "Concurrent extraction complete");
        Ok(paired)
    }

    /// Extracts typed instances across all endpoints concurrently.
    ///
    /// # Errors
    ///
    /// The first endpoint failure or the first incompatible record.
    pub async fn extract_as_concurrent<T>(
        &self,
        client: &HttpClient,
        options: &ExtractOptions,
    ) -> Result<Vec<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        self.extract_concurrent(client, options)
            .await?
            .into_iter()
            .map(materialize::<T>)
            .collect()
    }
}

impl FromIterator<Endpoint> for EndpointCollection {
    fn from_iter<I: IntoIterator<Item = Endpoint>>(iter: I) -> Self {
        let mut collection = Self::new();
        collection.extend(iter);
        collection
    }
}

impl Extend<Endpoint> for EndpointCollection {
    fn extend<I: IntoIterator<Item = Endpoint>>(&mut self, iter: I) {
        for endpoint in iter {
            self.insert(endpoint);
        }
    }
}

impl<'a> IntoIterator for &'a EndpointCollection {
    type Item = &'a Endpoint;
    type IntoIter = std::slice::Iter<'a, Endpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.endpoints.iter()
    }
}

// ============================================================================
// Sequential Iterators
// ============================================================================

/// Lazy record sequence over a collection, paired with schemas.
pub struct ExtractWithSchema<'a> {
    endpoints: std::slice::Iter<'a, Endpoint>,
    client: &'a HttpClient,
    options: &'a ExtractOptions,
    buffer: std::vec::IntoIter<Record>,
    schema: Option<&'a JsonSchema>,
    done: bool,
}

impl<'a> Iterator for ExtractWithSchema<'a> {
    type Item = Result<(Record, Option<&'a JsonSchema>), ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some(record) = self.buffer.next() {
                return Some(Ok((record, self.schema)));
            }

            let Some(endpoint) = self.endpoints.next() else {
                self.done = true;
                return None;
            };

            let batch = endpoint
                .fetch(self.client)
                .and_then(|response| endpoint.records(&response, self.options));
            match batch {
                Ok(records) => {
                    self.schema = endpoint.effective_schema(self.options);
                    self.buffer = records.into_iter();
                }
                Err(error) => {
                    self.done = true;
                    return Some(Err(error));
                }
            }
        }
    }
}

/// Lazy record sequence over a collection.
pub struct Extract<'a> {
    inner: ExtractWithSchema<'a>,
}

impl Iterator for Extract<'_> {
    type Item = Result<Record, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|result| result.map(|(record, _)| record))
    }
}

// ============================================================================
// Typed Materialization
// ============================================================================

/// Materializes a flat record into a typed instance by field name.
fn materialize<T: DeserializeOwned>(record: Record) -> Result<T, ApiError> {
    serde_json::from_value(Value::Object(record)).map_err(|source| ApiError::Instance {
        type_name: std::any::type_name::<T>(),
        source,
    })
}

// ============================================================================
// Tests
// ============================================================================
