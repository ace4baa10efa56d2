//! CloudFormation resource descriptors.
//!
//! Each resource the site declares implements [`CfnResource`] and renders to
//! the JSON shape CloudFormation expects under `Resources.<LogicalId>`.
//! The [`intrinsic`] helpers build the `Ref`/`Fn::*` values used to wire one
//! resource's attributes into another's properties.

pub mod bucket;
pub mod certificate;
pub mod deployment;
pub mod distribution;
pub mod record;
pub mod zone;

pub use bucket::{BucketPolicy, SiteBucket};
pub use certificate::{DnsValidatedCertificate, CERTIFICATE_REGION};
pub use deployment::{BucketDeployment, INVALIDATION_PATHS};
pub use distribution::{DistributionSettings, SiteDistribution};
pub use record::{AliasRecord, CLOUDFRONT_HOSTED_ZONE_ID};
pub use zone::{HostedZone, ZoneQuery};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// What happens to a resource when it leaves the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalPolicy {
    /// Delete the physical resource
    Destroy,
    /// Orphan the physical resource
    Retain,
}

impl RemovalPolicy {
    /// Value for the `DeletionPolicy`/`UpdateReplacePolicy` attributes
    pub fn as_cfn(&self) -> &'static str {
        match self {
            RemovalPolicy::Destroy => "Delete",
            RemovalPolicy::Retain => "Retain",
        }
    }
}

/// A resource that can be rendered into a CloudFormation template
pub trait CfnResource {
    /// Logical id within the template
    fn logical_id(&self) -> &str;

    /// CloudFormation type, e.g. `AWS::S3::Bucket`
    fn type_string(&self) -> &'static str;

    /// The `Properties` block
    fn properties(&self) -> Value;

    /// Removal policy, if the resource sets one
    fn deletion_policy(&self) -> Option<RemovalPolicy> {
        None
    }

    /// Logical ids this resource must be created after, beyond implicit references
    fn depends_on(&self) -> Vec<String> {
        Vec::new()
    }

    /// Render the full resource entry
    fn render(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("Type".into(), json!(self.type_string()));
        entry.insert("Properties".into(), self.properties());

        if let Some(policy) = self.deletion_policy() {
            entry.insert("DeletionPolicy".into(), json!(policy.as_cfn()));
            entry.insert("UpdateReplacePolicy".into(), json!(policy.as_cfn()));
        }

        let depends_on = self.depends_on();
        if !depends_on.is_empty() {
            entry.insert("DependsOn".into(), json!(depends_on));
        }

        Value::Object(entry)
    }
}

/// CloudFormation intrinsic functions
pub mod intrinsic {
    use serde_json::{json, Value};

    /// `{"Ref": id}`
    pub fn reference(logical_id: &str) -> Value {
        json!({ "Ref": logical_id })
    }

    /// `{"Fn::GetAtt": [id, attr]}`
    pub fn get_att(logical_id: &str, attribute: &str) -> Value {
        json!({ "Fn::GetAtt": [logical_id, attribute] })
    }

    /// `{"Fn::Sub": template}`
    pub fn sub(template: &str) -> Value {
        json!({ "Fn::Sub": template })
    }

    /// `{"Fn::Split": [delimiter, source]}`
    pub fn split(delimiter: &str, source: Value) -> Value {
        json!({ "Fn::Split": [delimiter, source] })
    }

    /// `{"Fn::Select": [index, list]}`
    pub fn select(index: usize, list: Value) -> Value {
        json!({ "Fn::Select": [index, list] })
    }

    /// Logical ids referenced through `Ref` or `Fn::GetAtt` anywhere in `value`
    pub fn references(value: &Value) -> Vec<String> {
        let mut found = Vec::new();
        collect_references(value, &mut found);
        found
    }

    fn collect_references(value: &Value, found: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(id)) = map.get("Ref") {
                    if !id.starts_with("AWS::") && !found.contains(id) {
                        found.push(id.clone());
                    }
                }
                if let Some(Value::Array(parts)) = map.get("Fn::GetAtt") {
                    if let Some(Value::String(id)) = parts.first() {
                        if !found.contains(id) {
                            found.push(id.clone());
                        }
                    }
                }
                if let Some(Value::String(template)) = map.get("Fn::Sub") {
                    let mut rest = template.as_str();
                    while let Some(start) = rest.find("${") {
                        let Some(len) = rest[start + 2..].find('}') else {
                            break;
                        };
                        let var = &rest[start + 2..start + 2 + len];
                        let id = var.split('.').next().unwrap_or(var);
                        if !id.starts_with("AWS::") && !found.iter().any(|f| f == id) {
                            found.push(id.to_string());
                        }
                        rest = &rest[start + 2 + len..];
                    }
                }
                for nested in map.values() {
                    collect_references(nested, found);
                }
            }
            Value::Array(items) => {
                for item in items {
                    collect_references(item, found);
                }
            }
            _ => {}
        }
    }
}
