//! Structural checks run on every loaded document
//!
//! Typed checks work on the parsed `OpenAPI` value. Reference and pattern
//! checks walk the raw YAML tree so that every `$ref` is seen regardless of
//! where it sits; `example`, `examples` and `x-` extension subtrees are never
//! entered.

use openapiv3::{Components, OpenAPI, Operation, Parameter, ParameterData, PathItem, ReferenceOr};
use regex::Regex;
use serde_yaml::Value;
use std::collections::{HashMap, HashSet};

const COMPONENT_NAME_PATTERN: &str = r"^[a-zA-Z0-9._-]+$";

/// Run every check and return the problems found, in document order.
pub(crate) fn validate(doc: &OpenAPI, raw: &Value) -> Vec<String> {
    let mut issues = Vec::new();

    check_version(doc, &mut issues);
    check_info(doc, &mut issues);
    check_servers(doc, &mut issues);
    check_paths(doc, &mut issues);
    check_component_names(doc, &mut issues);

    let mut location = Vec::new();
    walk(raw, raw, &mut location, Keys::Fields, &mut issues);

    issues
}

fn check_version(doc: &OpenAPI, issues: &mut Vec<String>) {
    if !doc.openapi.starts_with("3.") {
        issues.push(format!(
            "unsupported openapi version {:?}, expected 3.x",
            doc.openapi
        ));
    }
}

fn check_info(doc: &OpenAPI, issues: &mut Vec<String>) {
    if doc.info.title.trim().is_empty() {
        issues.push("info.title must not be empty".to_string());
    }
    if doc.info.version.trim().is_empty() {
        issues.push("info.version must not be empty".to_string());
    }
}

fn check_servers(doc: &OpenAPI, issues: &mut Vec<String>) {
    for (i, server) in doc.servers.iter().enumerate() {
        if server.url.trim().is_empty() {
            issues.push(format!("servers[{}]: url must not be empty", i));
            continue;
        }

        let variables = server.variables.as_ref();
        for name in template_names(&server.url) {
            if !variables.is_some_and(|vars| vars.contains_key(name)) {
                issues.push(format!(
                    "servers[{}]: url variable {:?} is not declared",
                    i, name
                ));
            }
        }

        for (name, variable) in variables.into_iter().flatten() {
            if variable.default.is_empty() {
                issues.push(format!(
                    "servers[{}].variables.{}: default must not be empty",
                    i, name
                ));
            } else if !variable.enumeration.is_empty()
                && !variable.enumeration.contains(&variable.default)
            {
                issues.push(format!(
                    "servers[{}].variables.{}: default {:?} is not one of the enum values",
                    i, name, variable.default
                ));
            }
        }
    }
}

fn check_paths(doc: &OpenAPI, issues: &mut Vec<String>) {
    let components = doc.components.as_ref();
    let mut operation_ids: HashMap<&str, String> = HashMap::new();

    for (path, item) in doc.paths.paths.iter() {
        if !path.starts_with('/') {
            issues.push(format!("paths.{}: path must begin with '/'", path));
        }

        let ReferenceOr::Item(item) = item else {
            continue;
        };

        let shared = path_parameters(&item.parameters, components, path, issues);
        let templates = template_names(path);

        for (method, operation) in operations(item) {
            let location = format!("paths.{}.{}", path, method);

            if operation.responses.responses.is_empty() && operation.responses.default.is_none() {
                issues.push(format!("{}: at least one response is required", location));
            }

            if let Some(id) = operation.operation_id.as_deref() {
                if let Some(previous) = operation_ids.get(id) {
                    issues.push(format!(
                        "{}: operationId {:?} is already used by {}",
                        location, id, previous
                    ));
                } else {
                    operation_ids.insert(id, location.clone());
                }
            }

            let own = path_parameters(&operation.parameters, components, &location, issues);
            for name in &templates {
                if !shared.contains(name) && !own.contains(name) {
                    issues.push(format!(
                        "{}: path parameter {:?} is not declared",
                        location, name
                    ));
                }
            }

            let mut unused: Vec<&str> = shared
                .union(&own)
                .copied()
                .filter(|name| !templates.contains(name))
                .collect();
            unused.sort_unstable();
            for name in unused {
                issues.push(format!(
                    "{}: path parameter {:?} does not appear in the path",
                    location, name
                ));
            }
        }
    }
}

/// Names of the `in: path` parameters in `parameters`, reporting any that are
/// not marked required.
fn path_parameters<'a>(
    parameters: &'a [ReferenceOr<Parameter>],
    components: Option<&'a Components>,
    location: &str,
    issues: &mut Vec<String>,
) -> HashSet<&'a str> {
    let mut names = HashSet::new();

    for parameter in parameters {
        let Some(data) = resolve_parameter(parameter, components).and_then(path_parameter) else {
            continue;
        };
        if !data.required {
            issues.push(format!(
                "{}: path parameter {:?} must be required",
                location, data.name
            ));
        }
        names.insert(data.name.as_str());
    }

    names
}

fn resolve_parameter<'a>(
    parameter: &'a ReferenceOr<Parameter>,
    components: Option<&'a Components>,
) -> Option<&'a Parameter> {
    match parameter {
        ReferenceOr::Item(parameter) => Some(parameter),
        ReferenceOr::Reference { reference } => {
            let name = reference.strip_prefix("#/components/parameters/")?;
            match components?.parameters.get(name)? {
                ReferenceOr::Item(parameter) => Some(parameter),
                ReferenceOr::Reference { .. } => None,
            }
        }
    }
}

fn path_parameter(parameter: &Parameter) -> Option<&ParameterData> {
    match parameter {
        Parameter::Path { parameter_data, .. } => Some(parameter_data),
        _ => None,
    }
}

fn operations(item: &PathItem) -> impl Iterator<Item = (&'static str, &Operation)> + '_ {
    [
        ("get", &item.get),
        ("put", &item.put),
        ("post", &item.post),
        ("delete", &item.delete),
        ("options", &item.options),
        ("head", &item.head),
        ("patch", &item.patch),
        ("trace", &item.trace),
    ]
    .into_iter()
    .filter_map(|(method, operation)| operation.as_ref().map(|op| (method, op)))
}

/// The `{name}` placeholders of a path or server URL template
fn template_names(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start + 1..].find('}') else {
            break;
        };
        names.push(&rest[start + 1..start + 1 + len]);
        rest = &rest[start + 1 + len + 1..];
    }
    names
}

fn check_component_names(doc: &OpenAPI, issues: &mut Vec<String>) {
    let Some(components) = doc.components.as_ref() else {
        return;
    };
    let Ok(valid) = Regex::new(COMPONENT_NAME_PATTERN) else {
        return;
    };

    let kinds: [(&str, Vec<&String>); 9] = [
        ("schemas", components.schemas.keys().collect()),
        ("responses", components.responses.keys().collect()),
        ("parameters", components.parameters.keys().collect()),
        ("examples", components.examples.keys().collect()),
        ("requestBodies", components.request_bodies.keys().collect()),
        ("headers", components.headers.keys().collect()),
        ("securitySchemes", components.security_schemes.keys().collect()),
        ("links", components.links.keys().collect()),
        ("callbacks", components.callbacks.keys().collect()),
    ];

    for (kind, names) in kinds {
        for name in names {
            if !valid.is_match(name) {
                issues.push(format!(
                    "components.{}: name {:?} must match {}",
                    kind, name, COMPONENT_NAME_PATTERN
                ));
            }
        }
    }
}

/// How the keys of a mapping are to be read
#[derive(Clone, Copy, PartialEq, Eq)]
enum Keys {
    /// Keys are OpenAPI fields (`$ref`, `pattern`, `example`, ...)
    Fields,
    /// Keys are user-chosen names; each value is an object with fields
    Names,
    /// Keys name callbacks; each value maps runtime expressions to path items
    Callbacks,
}

/// Fields whose value is a map keyed by user-chosen names
fn named_children(key: &str) -> Option<Keys> {
    match key {
        "properties" | "patternProperties" | "headers" | "content" | "links" | "encoding"
        | "responses" | "variables" | "parameters" | "scopes" | "mapping" => Some(Keys::Names),
        "callbacks" => Some(Keys::Callbacks),
        _ => None,
    }
}

fn walk(
    root: &Value,
    node: &Value,
    location: &mut Vec<String>,
    keys: Keys,
    issues: &mut Vec<String>,
) {
    match node {
        Value::Mapping(map) => {
            for (key, value) in map {
                let key = match key {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => continue,
                };

                let children = match keys {
                    Keys::Names => Keys::Fields,
                    Keys::Callbacks => Keys::Names,
                    Keys::Fields => {
                        match key.as_str() {
                            "example" | "examples" => continue,
                            k if k.starts_with("x-") => continue,
                            "$ref" => {
                                if let Value::String(reference) = value {
                                    check_reference(root, reference, location, issues);
                                }
                                continue;
                            }
                            "pattern" => {
                                if let Value::String(pattern) = value {
                                    if let Err(e) = Regex::new(pattern) {
                                        issues.push(format!(
                                            "{}: pattern {:?} does not compile: {}",
                                            display(location),
                                            pattern,
                                            e
                                        ));
                                    }
                                    continue;
                                }
                            }
                            _ => {}
                        }

                        if location.is_empty() && key == "paths" {
                            Keys::Names
                        } else if location.len() == 1 && location[0] == "components" {
                            if key == "callbacks" {
                                Keys::Callbacks
                            } else {
                                Keys::Names
                            }
                        } else {
                            named_children(&key).unwrap_or(Keys::Fields)
                        }
                    }
                };

                location.push(key);
                walk(root, value, location, children, issues);
                location.pop();
            }
        }
        Value::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                location.push(i.to_string());
                walk(root, item, location, Keys::Fields, issues);
                location.pop();
            }
        }
        Value::Tagged(tagged) => walk(root, &tagged.value, location, keys, issues),
        _ => {}
    }
}

/// Local references must point at an existing node. References into other
/// documents are left alone.
fn check_reference(root: &Value, reference: &str, location: &[String], issues: &mut Vec<String>) {
    let Some(pointer) = reference.strip_prefix('#') else {
        return;
    };
    if lookup(root, pointer).is_none() {
        issues.push(format!(
            "{}: unresolved reference {:?}",
            display(location),
            reference
        ));
    }
}

/// Resolve a JSON pointer against the raw document.
fn lookup<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    if pointer.is_empty() {
        return Some(root);
    }
    let pointer = pointer.strip_prefix('/')?;

    pointer.split('/').try_fold(root, |node, segment| {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        match node {
            Value::Mapping(map) => map.get(segment.as_str()).or_else(|| {
                // Unquoted status codes are integer keys in YAML.
                segment
                    .parse::<u64>()
                    .ok()
                    .and_then(|n| map.get(Value::Number(n.into())))
            }),
            Value::Sequence(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            Value::Tagged(tagged) => lookup(&tagged.value, &format!("/{}", segment)),
            _ => None,
        }
    })
}

fn display(location: &[String]) -> String {
    if location.is_empty() {
        "document".to_string()
    } else {
        location.join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn extracts_template_names() {
        assert_eq!(template_names("/widgets"), Vec::<&str>::new());
        assert_eq!(template_names("/widgets/{widgetId}"), vec!["widgetId"]);
        assert_eq!(
            template_names("https://{region}.xyz.com/{version}"),
            vec!["region", "version"]
        );
        assert_eq!(template_names("/broken/{oops"), Vec::<&str>::new());
    }

    #[test]
    fn resolves_json_pointers() {
        let doc = raw(
            r#"
components:
  schemas:
    "a/b": { type: string }
    Widget: { type: object }
paths:
  /w:
    get:
      responses:
        200: { description: ok }
"#,
        );

        assert!(lookup(&doc, "").is_some());
        assert!(lookup(&doc, "/components/schemas/Widget").is_some());
        assert!(lookup(&doc, "/components/schemas/a~1b").is_some());
        assert!(lookup(&doc, "/paths/~1w/get/responses/200").is_some());
        assert!(lookup(&doc, "/components/schemas/Missing").is_none());
        assert!(lookup(&doc, "components").is_none());
    }

    #[test]
    fn walker_skips_examples_and_extensions() {
        let doc = raw(
            r##"
components:
  schemas:
    Widget:
      type: object
      properties:
        example:
          $ref: "#/components/schemas/Missing"
      example:
        $ref: "#/nowhere"
      x-generator:
        pattern: "(unclosed"
"##,
        );

        let mut issues = Vec::new();
        walk(&doc, &doc, &mut Vec::new(), Keys::Fields, &mut issues);

        // A property called "example" is still a schema.
        assert_eq!(issues.len(), 1, "{:?}", issues);
        assert!(issues[0].contains("components.schemas.Widget.properties.example"));
        assert!(issues[0].contains("#/components/schemas/Missing"));
    }

    #[test]
    fn entries_named_example_are_still_checked() {
        let doc = raw(
            r##"
servers:
  - url: https://{example}.xyz.com
    variables:
      example:
        default: eu
        x-note: { $ref: "#/ignored" }
paths:
  /w:
    get:
      responses:
        200:
          description: ok
          headers:
            example:
              schema:
                $ref: "#/components/schemas/Missing"
          content:
            example:
              schema:
                type: string
                pattern: "(unclosed"
          links:
            example:
              $ref: "#/components/links/Gone"
      callbacks:
        example:
          "{$request.body#/url}":
            post:
              requestBody:
                $ref: "#/components/requestBodies/Nope"
components:
  securitySchemes:
    oauth:
      type: oauth2
      flows:
        implicit:
          authorizationUrl: https://xyz.com/auth
          scopes:
            pattern: "read access ("
"##,
        );

        let mut issues = Vec::new();
        walk(&doc, &doc, &mut Vec::new(), Keys::Fields, &mut issues);

        assert_eq!(issues.len(), 4, "{:?}", issues);
        assert!(issues[0].starts_with("paths./w.get.responses.200.headers.example.schema:"));
        assert!(issues[1].contains("does not compile"));
        assert!(issues[2].contains("#/components/links/Gone"));
        assert!(issues[3].contains("#/components/requestBodies/Nope"));
    }

    #[test]
    fn walker_reports_bad_patterns() {
        let doc = raw(
            r#"
components:
  schemas:
    Name:
      type: string
      pattern: "[a-z"
    pattern:
      type: string
"#,
        );

        let mut issues = Vec::new();
        walk(&doc, &doc, &mut Vec::new(), Keys::Fields, &mut issues);

        assert_eq!(issues.len(), 1, "{:?}", issues);
        assert!(issues[0].starts_with("components.schemas.Name:"));
    }
}
