//! template assembled from multiple documents
//!
//! A [Template] starts out empty and grows by merging documents into it. The merge is
//! shallow on purpose: top-level sections (`Resources`, `Outputs`, ...) are merged key by
//! key, but each entry of a section is replaced as a whole. Passing the same resource
//! name twice therefore swaps the complete resource definition.
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Default, Debug, Clone, PartialEq)]
pub struct Template {
    body: Map<String, Value>,
}

/// A document fragment that can be merged into a [Template]
#[derive(Debug, Clone)]
pub enum Document {
    Parsed(Value),
    /// JSON text, parsed before merging
    Text(String),
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Document::Parsed(value)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(value: Map<String, Value>) -> Self {
        Document::Parsed(Value::Object(value))
    }
}

impl From<&str> for Document {
    fn from(value: &str) -> Self {
        Document::Text(value.to_string())
    }
}

impl From<String> for Document {
    fn from(value: String) -> Self {
        Document::Text(value)
    }
}

impl Document {
    fn into_object(self) -> Result<Map<String, Value>, TemplateError> {
        let value = match self {
            Document::Parsed(value) => value,
            Document::Text(text) => serde_json::from_str(&text)?,
        };

        match value {
            Value::Object(map) => Ok(map),
            other => Err(TemplateError::NotAnObject(kind_of(&other))),
        }
    }
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge documents in argument order
    ///
    /// All documents are parsed first. If any of them is invalid the template stays
    /// untouched.
    pub fn with_documents<I, D>(&mut self, documents: I) -> Result<&mut Self, TemplateError>
    where
        I: IntoIterator<Item = D>,
        D: Into<Document>,
    {
        let fragments = documents
            .into_iter()
            .map(|document| document.into().into_object())
            .collect::<Result<Vec<_>, _>>()?;

        for fragment in fragments {
            self.merge(fragment);
        }

        Ok(self)
    }

    fn merge(&mut self, fragment: Map<String, Value>) {
        for (section, incoming) in fragment {
            match incoming {
                Value::Object(entries) if self.body.get(&section).is_some_and(Value::is_object) => {
                    tracing::trace!(%section, entries = entries.len(), "merge section");
                    if let Some(Value::Object(existing)) = self.body.get_mut(&section) {
                        existing.extend(entries);
                    }
                }
                incoming => {
                    tracing::trace!(%section, "set section");
                    self.body.insert(section, incoming);
                }
            }
        }
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Compact JSON, suitable as `TemplateBody`
    pub fn render(&self) -> Result<String, TemplateError> {
        Ok(serde_json::to_string(&self.body)?)
    }

    pub fn render_pretty(&self) -> Result<String, TemplateError> {
        Ok(serde_json::to_string_pretty(&self.body)?)
    }

    pub fn render_yaml(&self) -> Result<String, TemplateError> {
        Ok(serde_yaml::to_string(&self.body)?)
    }
}

impl Template {
    /// Load and merge a single `.json`, `.yaml` or `.yml` file
    pub fn load_file(&mut self, file_path: &Path) -> Result<&mut Self, TemplateError> {
        tracing::info!(path=%file_path.display(), "loading template");

        let contents = std::fs::read_to_string(file_path)?;
        let value: Value = if is_yaml(file_path) {
            let yaml: serde_yaml::Value = serde_yaml::from_str(&contents)?;
            serde_json::to_value(expand_short_form(yaml))?
        } else {
            serde_json::from_str(&contents)?
        };

        self.with_documents([value])
    }

    /// Load and merge all template files of a directory, ordered by file name
    pub fn load_directory(&mut self, dir_path: &Path) -> Result<&mut Self, TemplateError> {
        let mut file_paths = vec![];
        for dir_entry in std::fs::read_dir(dir_path)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let file_path = dir_entry.path();
            if is_yaml(&file_path) || has_extension(&file_path, "json") {
                file_paths.push(file_path);
            }
        }

        if file_paths.is_empty() {
            return Err(TemplateError::NoFilesFound);
        }

        file_paths.sort();
        for file_path in file_paths {
            self.load_file(&file_path)?;
        }

        Ok(self)
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

fn is_yaml(path: &Path) -> bool {
    has_extension(path, "yaml") || has_extension(path, "yml")
}

/// Rewrite short-form intrinsic functions (`!Ref X`, `!GetAtt A.B`, `!Sub ..`) into their
/// long form, which is the only form JSON can express
fn expand_short_form(value: serde_yaml::Value) -> serde_yaml::Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Tagged(tagged) => {
            let tagged = *tagged;
            let tag = tagged.tag.to_string();
            let inner = expand_short_form(tagged.value);

            let (key, inner) = match tag.trim_start_matches('!') {
                name @ ("Ref" | "Condition") => (name.to_string(), inner),
                "GetAtt" => match inner {
                    Yaml::String(path) => {
                        let parts = match path.split_once('.') {
                            Some((resource, attribute)) => vec![resource, attribute],
                            None => vec![path.as_str()],
                        };
                        let parts = parts.into_iter().map(|p| Yaml::String(p.to_string()));
                        ("Fn::GetAtt".to_string(), Yaml::Sequence(parts.collect()))
                    }
                    other => ("Fn::GetAtt".to_string(), other),
                },
                name => (format!("Fn::{name}"), inner),
            };

            let mut mapping = serde_yaml::Mapping::new();
            mapping.insert(Yaml::String(key), inner);
            Yaml::Mapping(mapping)
        }
        Yaml::Sequence(items) => Yaml::Sequence(items.into_iter().map(expand_short_form).collect()),
        Yaml::Mapping(entries) => Yaml::Mapping(
            entries
                .into_iter()
                .map(|(key, value)| (key, expand_short_form(value)))
                .collect(),
        ),
        other => other,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error("Template document must be an object, found {0}")]
    NotAnObject(&'static str),
    #[error("Unable to parse json document")]
    Parse(#[from] serde_json::Error),
    #[error("Unable to parse yaml document")]
    Yaml(#[from] serde_yaml::Error),
    #[error("No template files found in directory")]
    NoFilesFound,
    #[error("IO error")]
    Io(#[from] std::io::Error),
}
