//! Declarative field-remapping schemas.
//!
//! A [`JsonSchema`] is an ordered set of (setter, getter) pairs that turns a
//! raw JSON record into a flat output record:
//!
//! - [`Getter`] resolves a value from the current record (dotted path) or
//!   computes one from the whole response document plus the current record.
//! - [`Setter`] writes the resolved value at one output path, or fans a
//!   sequence out across a tuple of output paths.
//!
//! Output records keep schema iteration order.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::path;

/// A flat output record.
pub type Record = Map<String, Value>;

/// Signature of a computed getter: (whole response document, current record).
pub type ComputedFn = dyn Fn(&Value, &Value) -> Option<Value> + Send + Sync;

// ============================================================================
// Getter
// ============================================================================

/// Source of a schema field value.
#[derive(Clone)]
pub enum Getter {
    /// Dotted input path navigated on the current record.
    Path(String),
    /// Function of (whole response document, current record).
    Computed(Arc<ComputedFn>),
}

impl Getter {
    /// Creates a path getter.
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    /// Creates a computed getter.
    pub fn computed<F>(func: F) -> Self
    where
        F: Fn(&Value, &Value) -> Option<Value> + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(func))
    }

    /// Resolves this getter against a document and the current record.
    fn resolve(&self, document: &Value, record: &Value) -> Option<Value> {
        match self {
            Self::Path(path) => path::get(record, path).cloned(),
            Self::Computed(func) => func(document, record),
        }
    }
}

impl fmt::Debug for Getter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Computed(_) => f.debug_tuple("Computed").field(&"<fn>").finish(),
        }
    }
}

impl From<&str> for Getter {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for Getter {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

// ============================================================================
// Setter
// ============================================================================

/// Destination of a schema field value.
#[derive(Debug, Clone)]
pub enum Setter {
    /// Single dotted output path.
    Path(String),
    /// Tuple of output paths; sequences zip positionally, anything else
    /// broadcasts.
    Paths(Vec<String>),
}

impl Setter {
    /// Creates a single-path setter.
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    /// Creates a tuple setter.
    pub fn paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Paths(paths.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for Setter {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for Setter {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<Vec<String>> for Setter {
    fn from(paths: Vec<String>) -> Self {
        Self::Paths(paths)
    }
}

// ============================================================================
// JSON Schema
// ============================================================================

/// An ordered field-remapping rule set.
#[derive(Debug, Clone, Default)]
pub struct JsonSchema {
    fields: Vec<(Setter, Getter)>,
}

impl JsonSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a (setter, getter) pair; iteration order is application order.
    #[must_use]
    pub fn field(mut self, setter: impl Into<Setter>, getter: impl Into<Getter>) -> Self {
        self.fields.push((setter.into(), getter.into()));
        self
    }

    /// Returns the number of field rules.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no field rules.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates the (setter, getter) pairs in application order.
    pub fn iter(&self) -> impl Iterator<Item = &(Setter, Getter)> {
        self.fields.iter()
    }

    /// Builds a flat output record from one raw record.
    ///
    /// A getter miss writes nothing: the output field stays absent, it is
    /// never an error. A tuple setter whose getter result length disagrees
    /// fails with [`CoreError::ShapeMismatch`].
    pub fn apply(&self, document: &Value, record: &Value) -> Result<Record, CoreError> {
        let mut output = Record::new();

        for (setter, getter) in &self.fields {
            let value = getter.resolve(document, record);

            match setter {
                Setter::Path(out_path) => {
                    if let Some(value) = value {
                        path::set(&mut output, out_path, value);
                    }
                }
                Setter::Paths(out_paths) => match value {
                    None => {}
                    Some(Value::Array(items)) => {
                        if items.len() != out_paths.len() {
                            return Err(CoreError::ShapeMismatch {
                                expected: out_paths.len(),
                                actual: items.len(),
                            });
                        }
                        for (out_path, item) in out_paths.iter().zip(items) {
                            path::set(&mut output, out_path, item);
                        }
                    }
                    Some(value) => {
                        for out_path in out_paths {
                            path::set(&mut output, out_path, value.clone());
                        }
                    }
                },
            }
        }

        Ok(output)
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Extracts flat records from a JSON document.
///
/// Selects the records the path addresses (see [`path::records_at`]) and
/// applies the schema to each. With no schema, a selected mapping is returned
/// as-is and a non-mapping yields an empty record.
pub fn extract(
    document: &Value,
    json_path: Option<&str>,
    json_schema: Option<&JsonSchema>,
) -> Result<Vec<Record>, CoreError> {
    let mut records = Vec::new();

    for raw in path::records_at(document, json_path) {
        let record = match json_schema {
            Some(schema) => schema.apply(document, raw)?,
            None => match raw {
                Value::Object(map) => map.clone(),
                _ => Record::new(),
            },
        };
        records.push(record);
    }

    Ok(records)
}

// ============================================================================
// Tests
// ============================================================================
