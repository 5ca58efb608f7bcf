//! Pulumi YAML program rendering
//!
//! Turns a [`ResourceGraph`] into the `Pulumi.yaml` document the pulumi CLI
//! runs with the YAML runtime. The provider binding becomes an explicit
//! provider resource, references become `${name.attribute}` interpolations
//! and explicit dependencies land in `options.dependsOn`.

use crate::error::Result;
use ppinfra_cloud::{OutputSegment, OutputSpec, PropertyValue, ResourceGraph, ResourceSpec};
use serde_yaml::{Mapping, Value};
use std::path::{Component, Path, PathBuf};

/// Program file name the pulumi CLI looks for
pub const PROGRAM_FILE: &str = "Pulumi.yaml";

/// Rendering options
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Directory relative `Path` properties are resolved against. The program
    /// runs from the workspace directory, so local paths must be anchored to
    /// the project root.
    pub base_dir: Option<PathBuf>,

    /// Project description
    pub description: Option<String>,
}

/// Render the graph as a Pulumi YAML document
pub fn render_program(graph: &ResourceGraph, options: &RenderOptions) -> Value {
    let mut doc = Mapping::new();
    doc.insert(key("name"), Value::String(graph.project.clone()));
    doc.insert(key("runtime"), Value::String("yaml".to_string()));
    if let Some(description) = &options.description {
        doc.insert(key("description"), Value::String(description.clone()));
    }

    let mut resources = Mapping::new();
    resources.insert(key(&graph.provider.name), render_provider(graph));
    for resource in &graph.resources {
        resources.insert(key(&resource.name), render_resource(resource, options));
    }
    doc.insert(key("resources"), Value::Mapping(resources));

    if !graph.outputs.is_empty() {
        let mut outputs = Mapping::new();
        for output in &graph.outputs {
            outputs.insert(key(&output.name), Value::String(render_output(output)));
        }
        doc.insert(key("outputs"), Value::Mapping(outputs));
    }

    Value::Mapping(doc)
}

/// Render the graph as `Pulumi.yaml` text
pub fn to_yaml(graph: &ResourceGraph, options: &RenderOptions) -> Result<String> {
    Ok(serde_yaml::to_string(&render_program(graph, options))?)
}

fn render_provider(graph: &ResourceGraph) -> Value {
    let provider = &graph.provider;

    let mut properties = Mapping::new();
    properties.insert(key("region"), Value::String(provider.region.clone()));

    let mut node = Mapping::new();
    node.insert(
        key("type"),
        Value::String(format!("pulumi:providers:{}", provider.package)),
    );
    node.insert(key("properties"), Value::Mapping(properties));
    Value::Mapping(node)
}

fn render_resource(resource: &ResourceSpec, options: &RenderOptions) -> Value {
    let mut node = Mapping::new();
    node.insert(key("type"), Value::String(resource.type_token.clone()));

    if !resource.properties.is_empty() {
        let mut properties = Mapping::new();
        for (k, v) in &resource.properties {
            properties.insert(key(k), render_value(v, options));
        }
        node.insert(key("properties"), Value::Mapping(properties));
    }

    let mut resource_options = Mapping::new();
    resource_options.insert(key("provider"), Value::String(interpolate(&resource.provider)));
    if !resource.depends_on.is_empty() {
        let deps = resource
            .depends_on
            .iter()
            .map(|d| Value::String(interpolate(d)))
            .collect();
        resource_options.insert(key("dependsOn"), Value::Sequence(deps));
    }
    node.insert(key("options"), Value::Mapping(resource_options));

    Value::Mapping(node)
}

fn render_value(value: &PropertyValue, options: &RenderOptions) -> Value {
    match value {
        PropertyValue::Bool(b) => Value::Bool(*b),
        PropertyValue::Int(i) => Value::Number((*i).into()),
        PropertyValue::String(s) => Value::String(escape(s)),
        PropertyValue::Path(p) => Value::String(escape(&anchor_path(p, options))),
        PropertyValue::List(items) => {
            Value::Sequence(items.iter().map(|v| render_value(v, options)).collect())
        }
        PropertyValue::Object(map) => {
            let mut mapping = Mapping::new();
            for (k, v) in map {
                mapping.insert(key(k), render_value(v, options));
            }
            Value::Mapping(mapping)
        }
        PropertyValue::Ref(r) => Value::String(interpolate(&r.to_string())),
    }
}

fn render_output(output: &OutputSpec) -> String {
    output
        .segments
        .iter()
        .map(|segment| match segment {
            OutputSegment::Literal(s) => escape(s),
            OutputSegment::Ref(r) => interpolate(&r.to_string()),
        })
        .collect()
}

fn anchor_path(path: &str, options: &RenderOptions) -> String {
    let relative = Path::new(path);
    match &options.base_dir {
        Some(base) if relative.is_relative() => {
            let cleaned: PathBuf = relative
                .components()
                .filter(|c| !matches!(c, Component::CurDir))
                .collect();
            base.join(cleaned).display().to_string()
        }
        _ => path.to_string(),
    }
}

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

fn interpolate(expr: &str) -> String {
    format!("${{{}}}", expr)
}

// Pulumi YAML treats `${` as the start of an expression; `$${` is a literal
fn escape(s: &str) -> String {
    s.replace("${", "$${")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppinfra_cloud::ProviderBinding;

    fn sample_graph() -> ResourceGraph {
        let mut graph =
            ResourceGraph::new("site", ProviderBinding::new("awsProvider", "aws", "eu-west-1"));
        let bucket = ResourceSpec::new("bucket", "aws:s3:BucketV2", "awsProvider");
        let folder = ResourceSpec::new("folder", "synced-folder:index:S3BucketFolder", "awsProvider")
            .with_property("path", PropertyValue::path("./www"))
            .with_property("bucketName", bucket.output("bucket"))
            .with_property("note", "costs ${5}")
            .with_dependency("bucket");
        graph.add_output(OutputSpec::prefixed(
            "bucketUrl",
            "s3://",
            bucket.output("bucket"),
        ));
        graph.add(bucket);
        graph.add(folder);
        graph
    }

    fn lookup<'a>(doc: &'a Value, path: &[&str]) -> &'a Value {
        path.iter().fold(doc, |v, k| &v[*k])
    }

    #[test]
    fn test_render_provider_resource() {
        let doc = render_program(&sample_graph(), &RenderOptions::default());

        assert_eq!(doc["name"].as_str(), Some("site"));
        assert_eq!(doc["runtime"].as_str(), Some("yaml"));
        assert_eq!(
            lookup(&doc, &["resources", "awsProvider", "type"]).as_str(),
            Some("pulumi:providers:aws")
        );
        assert_eq!(
            lookup(&doc, &["resources", "awsProvider", "properties", "region"]).as_str(),
            Some("eu-west-1")
        );
    }

    #[test]
    fn test_render_references_and_options() {
        let doc = render_program(&sample_graph(), &RenderOptions::default());
        let folder = lookup(&doc, &["resources", "folder"]);

        assert_eq!(
            folder["properties"]["bucketName"].as_str(),
            Some("${bucket.bucket}")
        );
        assert_eq!(
            folder["options"]["provider"].as_str(),
            Some("${awsProvider}")
        );
        let deps = folder["options"]["dependsOn"].as_sequence().unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].as_str(), Some("${bucket}"));

        // resources without properties omit the key entirely
        let bucket = lookup(&doc, &["resources", "bucket"]);
        assert!(bucket.get("properties").is_none());
        assert!(bucket["options"].get("dependsOn").is_none());
    }

    #[test]
    fn test_render_escapes_literal_interpolation() {
        let doc = render_program(&sample_graph(), &RenderOptions::default());
        assert_eq!(
            lookup(&doc, &["resources", "folder", "properties", "note"]).as_str(),
            Some("costs $${5}")
        );
    }

    #[test]
    fn test_render_outputs() {
        let doc = render_program(&sample_graph(), &RenderOptions::default());
        assert_eq!(
            lookup(&doc, &["outputs", "bucketUrl"]).as_str(),
            Some("s3://${bucket.bucket}")
        );
    }

    #[test]
    fn test_path_anchored_to_base_dir() {
        let options = RenderOptions {
            base_dir: Some(PathBuf::from("/srv/project")),
            description: None,
        };
        let doc = render_program(&sample_graph(), &options);
        assert_eq!(
            lookup(&doc, &["resources", "folder", "properties", "path"]).as_str(),
            Some("/srv/project/www")
        );

        let unanchored = render_program(&sample_graph(), &RenderOptions::default());
        assert_eq!(
            lookup(&unanchored, &["resources", "folder", "properties", "path"]).as_str(),
            Some("./www")
        );
    }

    #[test]
    fn test_resource_order_follows_declaration() {
        let yaml = to_yaml(&sample_graph(), &RenderOptions::default()).unwrap();
        let provider_pos = yaml.find("awsProvider:").unwrap();
        let bucket_pos = yaml.find("  bucket:").unwrap();
        let folder_pos = yaml.find("  folder:").unwrap();
        assert!(provider_pos < bucket_pos);
        assert!(bucket_pos < folder_pos);
    }
}
