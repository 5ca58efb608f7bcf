//! Declarative resource graph
//!
//! A [`ResourceGraph`] is the complete desired state of one stack: a provider
//! binding, an ordered list of resources, and the outputs derived from them.
//! Resources keep their declaration order and properties live in ordered
//! maps, so serializing the same graph twice yields identical bytes.

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Provider binding shared by every resource of a graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderBinding {
    /// Logical name resources refer to (e.g. "escAwsProvider")
    pub name: String,

    /// Provider package (e.g. "aws")
    pub package: String,

    /// Target region
    pub region: String,
}

impl ProviderBinding {
    pub fn new(
        name: impl Into<String>,
        package: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            region: region.into(),
        }
    }
}

/// Reference to an attribute another resource exposes once it exists
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub resource: String,
    pub attribute: String,
}

impl ResourceRef {
    pub fn new(resource: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            attribute: attribute.into(),
        }
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.resource, self.attribute)
    }
}

/// Value of a resource property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    String(String),
    /// Local filesystem path, relative to the project root
    Path(String),
    List(Vec<PropertyValue>),
    Object(BTreeMap<String, PropertyValue>),
    /// Attribute of another resource, known only after the engine creates it
    Ref(ResourceRef),
}

impl PropertyValue {
    pub fn path(path: impl Into<String>) -> Self {
        PropertyValue::Path(path.into())
    }

    pub fn reference(resource: impl Into<String>, attribute: impl Into<String>) -> Self {
        PropertyValue::Ref(ResourceRef::new(resource, attribute))
    }

    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<PropertyValue>,
    {
        PropertyValue::List(items.into_iter().map(Into::into).collect())
    }

    pub fn object<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, PropertyValue)>,
        K: Into<String>,
    {
        PropertyValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) | PropertyValue::Path(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ResourceRef> {
        match self {
            PropertyValue::Ref(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a nested value by object keys; list items are addressed by index
    pub fn get_path(&self, path: &[&str]) -> Option<&PropertyValue> {
        let mut current = self;
        for segment in path {
            current = match current {
                PropertyValue::Object(map) => map.get(*segment)?,
                PropertyValue::List(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    fn collect_refs<'a>(&'a self, out: &mut Vec<&'a ResourceRef>) {
        match self {
            PropertyValue::Ref(r) => out.push(r),
            PropertyValue::List(items) => items.iter().for_each(|v| v.collect_refs(out)),
            PropertyValue::Object(map) => map.values().for_each(|v| v.collect_refs(out)),
            _ => {}
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<u16> for PropertyValue {
    fn from(value: u16) -> Self {
        PropertyValue::Int(i64::from(value))
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::Int(i64::from(value))
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<ResourceRef> for PropertyValue {
    fn from(value: ResourceRef) -> Self {
        PropertyValue::Ref(value)
    }
}

/// Declaration of a single resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Logical name, unique within the graph
    pub name: String,

    /// Engine type token (e.g. "aws:s3:BucketV2")
    pub type_token: String,

    /// Name of the provider binding
    pub provider: String,

    /// Resource-specific properties
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,

    /// Explicit ordering dependencies, on top of those implied by references
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl ResourceSpec {
    pub fn new(
        name: impl Into<String>,
        type_token: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_token: type_token.into(),
            provider: provider.into(),
            properties: BTreeMap::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_dependency(mut self, resource: impl Into<String>) -> Self {
        self.depends_on.push(resource.into());
        self
    }

    /// Reference to one of this resource's attributes
    pub fn output(&self, attribute: impl Into<String>) -> ResourceRef {
        ResourceRef::new(self.name.clone(), attribute)
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Nested property lookup, e.g. `["indexDocument", "suffix"]`
    pub fn property_path(&self, path: &[&str]) -> Option<&PropertyValue> {
        let (first, rest) = path.split_first()?;
        self.properties.get(*first)?.get_path(rest)
    }

    /// All attribute references made by this resource's properties
    pub fn references(&self) -> Vec<&ResourceRef> {
        let mut refs = Vec::new();
        for value in self.properties.values() {
            value.collect_refs(&mut refs);
        }
        refs
    }
}

/// One piece of an output template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OutputSegment {
    Literal(String),
    Ref(ResourceRef),
}

/// Named value exported from the stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,
    pub segments: Vec<OutputSegment>,
}

impl OutputSpec {
    /// Output equal to a single resource attribute
    pub fn reference(name: impl Into<String>, reference: ResourceRef) -> Self {
        Self {
            name: name.into(),
            segments: vec![OutputSegment::Ref(reference)],
        }
    }

    /// Output built from a literal prefix followed by a resource attribute
    pub fn prefixed(name: impl Into<String>, prefix: impl Into<String>, reference: ResourceRef) -> Self {
        Self {
            name: name.into(),
            segments: vec![
                OutputSegment::Literal(prefix.into()),
                OutputSegment::Ref(reference),
            ],
        }
    }

    pub fn references(&self) -> impl Iterator<Item = &ResourceRef> {
        self.segments.iter().filter_map(|s| match s {
            OutputSegment::Ref(r) => Some(r),
            OutputSegment::Literal(_) => None,
        })
    }

    /// Compose the output; `None` while any referenced attribute is unknown
    pub fn resolve<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&ResourceRef) -> Option<String>,
    {
        let mut value = String::new();
        for segment in &self.segments {
            match segment {
                OutputSegment::Literal(s) => value.push_str(s),
                OutputSegment::Ref(r) => value.push_str(&lookup(r)?),
            }
        }
        Some(value)
    }
}

/// Desired state of a whole stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGraph {
    /// Project name
    pub project: String,

    /// The single provider binding
    pub provider: ProviderBinding,

    /// Resources in declaration order
    pub resources: Vec<ResourceSpec>,

    /// Exported outputs in declaration order
    pub outputs: Vec<OutputSpec>,
}

impl ResourceGraph {
    pub fn new(project: impl Into<String>, provider: ProviderBinding) -> Self {
        Self {
            project: project.into(),
            provider,
            resources: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn add(&mut self, resource: ResourceSpec) {
        self.resources.push(resource);
    }

    pub fn add_output(&mut self, output: OutputSpec) {
        self.outputs.push(output);
    }

    pub fn get(&self, name: &str) -> Option<&ResourceSpec> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&OutputSpec> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceSpec> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Every resource `name` must wait for: explicit dependencies first,
    /// then those implied by attribute references, without duplicates
    pub fn dependencies_of(&self, name: &str) -> Result<Vec<&str>> {
        let resource = self
            .get(name)
            .ok_or_else(|| CloudError::ResourceNotFound(name.to_string()))?;

        let mut deps: Vec<&str> = Vec::new();
        let explicit = resource.depends_on.iter().map(String::as_str);
        let implied = resource.references().into_iter().map(|r| r.resource.as_str());
        for dep in explicit.chain(implied) {
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }
        Ok(deps)
    }

    /// Check structural invariants
    ///
    /// Names are unique, every resource uses the graph's provider binding, and
    /// dependencies and references only point at resources declared earlier.
    /// The last rule keeps the graph acyclic.
    pub fn validate(&self) -> Result<()> {
        let mut declared: BTreeSet<&str> = BTreeSet::new();

        for resource in &self.resources {
            if resource.name.is_empty() {
                return Err(CloudError::InvalidGraph(format!(
                    "resource of type {} has an empty name",
                    resource.type_token
                )));
            }
            if declared.contains(resource.name.as_str()) {
                return Err(CloudError::DuplicateResource(resource.name.clone()));
            }
            if resource.provider != self.provider.name {
                return Err(CloudError::InvalidGraph(format!(
                    "{} uses provider {} but the graph is bound to {}",
                    resource.name, resource.provider, self.provider.name
                )));
            }
            for dep in &resource.depends_on {
                if !declared.contains(dep.as_str()) {
                    return Err(CloudError::InvalidGraph(format!(
                        "{} depends on undeclared resource {}",
                        resource.name, dep
                    )));
                }
            }
            for reference in resource.references() {
                if !declared.contains(reference.resource.as_str()) {
                    return Err(CloudError::InvalidGraph(format!(
                        "{} references undeclared resource {}",
                        resource.name, reference
                    )));
                }
            }
            declared.insert(resource.name.as_str());
        }

        let mut output_names: BTreeSet<&str> = BTreeSet::new();
        for output in &self.outputs {
            if !output_names.insert(output.name.as_str()) {
                return Err(CloudError::InvalidGraph(format!(
                    "duplicate output {}",
                    output.name
                )));
            }
            for reference in output.references() {
                if !declared.contains(reference.resource.as_str()) {
                    return Err(CloudError::InvalidGraph(format!(
                        "output {} references undeclared resource {}",
                        output.name, reference
                    )));
                }
            }
        }

        Ok(())
    }

    /// Canonical JSON form of the graph
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
