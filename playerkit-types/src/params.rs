use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single named template/mutation parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Str(String),
    Date(DateTime<Utc>),
    Url(String),
}

impl ParamValue {
    /// Text form used when the value is substituted into a template.
    pub fn render(&self) -> String {
        match self {
            ParamValue::Str(s) | ParamValue::Url(s) => s.clone(),
            ParamValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Parameters assembled by the orchestrator for one run.
///
/// Keys are kept sorted so renders and serialized reports are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntegrationParameters(BTreeMap<String, ParamValue>);

impl IntegrationParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) -> &mut Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn set_str(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.insert(name, ParamValue::Str(value.into()))
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Rendered text for `name`, if present.
    pub fn text(&self, name: &str) -> Option<String> {
        self.0.get(name).map(ParamValue::render)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
