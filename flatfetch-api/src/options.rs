//! Call-time extraction overrides.

use flatfetch_core::JsonSchema;

/// A call-time override of an endpoint default.
///
/// Distinguishes "use the endpoint default" from "clear the default for
/// this call" from "use this value instead". Overrides apply per call; the
/// endpoint itself is never mutated.
#[derive(Debug, Clone)]
pub enum Override<T> {
    /// Use the endpoint default.
    Default,
    /// Clear the endpoint default for this call.
    Clear,
    /// Use this value for this call.
    Set(T),
}

impl<T> Default for Override<T> {
    fn default() -> Self {
        Self::Default
    }
}

/// Options for an extraction pass over a collection.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    json_path: Override<String>,
    json_schema: Override<JsonSchema>,
}

impl ExtractOptions {
    /// Creates options that use every endpoint's defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the JSON path for this call.
    #[must_use]
    pub fn json_path(mut self, path: impl Into<String>) -> Self {
        self.json_path = Override::Set(path.into());
        self
    }

    /// Clears every endpoint's default JSON path for this call, selecting
    /// the document root.
    #[must_use]
    pub fn without_json_path(mut self) -> Self {
        self.json_path = Override::Clear;
        self
    }

    /// Overrides the JSON schema for this call.
    #[must_use]
    pub fn json_schema(mut self, schema: JsonSchema) -> Self {
        self.json_schema = Override::Set(schema);
        self
    }

    /// Clears every endpoint's default schema for this call; selected
    /// mappings pass through unmapped.
    #[must_use]
    pub fn without_json_schema(mut self) -> Self {
        self.json_schema = Override::Clear;
        self
    }

    /// Resolves the effective JSON path against an endpoint default.
    pub fn resolve_json_path<'a>(&'a self, default: Option<&'a str>) -> Option<&'a str> {
        match &self.json_path {
            Override::Default => default,
            Override::Clear => None,
            Override::Set(path) => Some(path.as_str()),
        }
    }

    /// Resolves the effective schema against an endpoint default.
    pub fn resolve_json_schema<'a>(
        &'a self,
        default: Option<&'a JsonSchema>,
    ) -> Option<&'a JsonSchema> {
        match &self.json_schema {
            Override::Default => default,
            Override::Clear => None,
            Override::Set(schema) => Some(schema),
        }
    }
}
