//! CloudFormation template model.

use crate::error::{Error, Result};
use crate::resources::{intrinsic, CfnResource};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Template format version emitted in every template
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// A template parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter type
    #[serde(rename = "Type")]
    pub parameter_type: String,
    /// Human readable description
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Parameter {
    /// A `String` parameter
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            parameter_type: "String".to_string(),
            description: Some(description.into()),
        }
    }
}

/// A template output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// Output value, usually an intrinsic
    #[serde(rename = "Value")]
    pub value: Value,
    /// Human readable description
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Output {
    /// Create an output
    pub fn new(value: Value) -> Self {
        Self {
            value,
            description: None,
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One CloudFormation template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    format_version: String,

    #[serde(rename = "Description", skip_serializing_if = "Option::is_none", default)]
    description: Option<String>,

    #[serde(rename = "Parameters", skip_serializing_if = "IndexMap::is_empty", default)]
    parameters: IndexMap<String, Parameter>,

    #[serde(rename = "Resources", default)]
    resources: IndexMap<String, Value>,

    #[serde(rename = "Outputs", skip_serializing_if = "IndexMap::is_empty", default)]
    outputs: IndexMap<String, Output>,
}

impl Template {
    /// Create an empty template
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: Some(description.into()),
            parameters: IndexMap::new(),
            resources: IndexMap::new(),
            outputs: IndexMap::new(),
        }
    }

    /// Declare a parameter
    pub fn add_parameter(&mut self, name: impl Into<String>, parameter: Parameter) -> Result<()> {
        let name = name.into();
        if self.parameters.contains_key(&name) || self.resources.contains_key(&name) {
            return Err(Error::AssemblyInvariant(format!(
                "logical id '{}' declared twice",
                name
            )));
        }
        self.parameters.insert(name, parameter);
        Ok(())
    }

    /// Render and add a resource
    pub fn add_resource(&mut self, resource: &dyn CfnResource) -> Result<()> {
        let id = resource.logical_id().to_string();
        if self.resources.contains_key(&id) || self.parameters.contains_key(&id) {
            return Err(Error::AssemblyInvariant(format!(
                "logical id '{}' declared twice",
                id
            )));
        }
        self.resources.insert(id, resource.render());
        Ok(())
    }

    /// Declare an output
    pub fn add_output(&mut self, name: impl Into<String>, output: Output) -> Result<()> {
        let name = name.into();
        if self.outputs.contains_key(&name) {
            return Err(Error::AssemblyInvariant(format!(
                "output '{}' declared twice",
                name
            )));
        }
        self.outputs.insert(name, output);
        Ok(())
    }

    /// Template description
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Parameters in declaration order
    pub fn parameters(&self) -> &IndexMap<String, Parameter> {
        &self.parameters
    }

    /// Rendered resources in declaration order
    pub fn resources(&self) -> &IndexMap<String, Value> {
        &self.resources
    }

    /// Outputs in declaration order
    pub fn outputs(&self) -> &IndexMap<String, Output> {
        &self.outputs
    }

    /// A rendered resource by logical id
    pub fn resource(&self, logical_id: &str) -> Option<&Value> {
        self.resources.get(logical_id)
    }

    /// Logical ids of all resources of a given type
    pub fn resources_of_type(&self, type_string: &str) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|(_, r)| r.get("Type").and_then(Value::as_str) == Some(type_string))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Check that every `Ref`/`Fn::GetAtt`/`Fn::Sub` target is declared here
    pub fn check_references(&self) -> Result<()> {
        let declared = |id: &str| self.resources.contains_key(id) || self.parameters.contains_key(id);

        let resource_refs = self.resources.values().flat_map(intrinsic::references);
        let output_refs = self
            .outputs
            .values()
            .flat_map(|o| intrinsic::references(&o.value));

        for id in resource_refs.chain(output_refs) {
            if !declared(&id) {
                return Err(Error::AssemblyInvariant(format!(
                    "reference to undeclared logical id '{}'",
                    id
                )));
            }
        }
        Ok(())
    }

    /// Template as the JSON value CloudFormation receives
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// YAML rendering
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
