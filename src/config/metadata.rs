//! Step parameter metadata: declared types, mandatory flags and defaults.
//!
//! The built-in metadata is compiled into the binary and can be replaced
//! with `--metadata <file>`.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

const BUILTIN_METADATA: &str = include_str!("metadata.yaml");

/// Source of metadata-declared parameter defaults
pub trait DefaultLookup {
    /// Declared default of a parameter, `None` if the parameter declares none
    fn default_for(&self, name: &str) -> Option<Value>;

    /// Names of parameters declared mandatory and string-typed
    fn mandatory_string_parameters(&self) -> Vec<String>;
}

/// Declared type of a step parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterKind {
    String,
    Bool,
    StringList,
    MapList,
}

/// One parameter declaration
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ParameterKind,

    #[serde(default)]
    pub mandatory: bool,

    #[serde(default)]
    pub default: Option<Value>,
}

/// Parameter metadata of the release step
#[derive(Debug, Clone, Deserialize)]
pub struct StepMetadata {
    pub parameters: Vec<ParameterDefinition>,
}

impl StepMetadata {
    /// Metadata compiled into the binary
    pub fn builtin() -> Result<Self> {
        serde_yaml::from_str(BUILTIN_METADATA).context("Failed to parse built-in step metadata")
    }

    /// Load metadata from a file, or fall back to the built-in metadata
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Self::builtin();
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Fill every absent top-level option with its declared default
    pub fn apply_defaults(&self, options: &mut Map<String, Value>) {
        for parameter in &self.parameters {
            if let Some(default) = &parameter.default {
                options
                    .entry(parameter.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
    }
}

impl DefaultLookup for StepMetadata {
    fn default_for(&self, name: &str) -> Option<Value> {
        self.parameter(name).and_then(|p| p.default.clone())
    }

    fn mandatory_string_parameters(&self) -> Vec<String> {
        self.parameters
            .iter()
            .filter(|p| p.mandatory && p.kind == ParameterKind::String && !p.name.is_empty())
            .map(|p| p.name.clone())
            .collect()
    }
}
