//! Reading report files and template files from disk.

use crate::error::{CliError, Result};
use radstruct_domain::{ReportInput, Template, TemplateNode};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load report inputs from one or more `.json` files.
///
/// Each file holds a JSON array of non-empty strings. Reports are labeled
/// `{file_name}_report_{n}`, numbered from 1 across all files in order.
pub fn load_reports<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<ReportInput>> {
    let mut inputs = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let file_name = file_name(path);
        if !file_name.to_lowercase().ends_with(".json") {
            return Err(CliError::InvalidInput(format!(
                "File {} must be a JSON file",
                file_name
            )));
        }

        let contents = read_file(path, &file_name)?;
        let texts = parse_report_array(&file_name, &contents)?;
        debug!(file = %file_name, reports = texts.len(), "Read report file");

        for text in texts {
            let label = format!("{}_report_{}", file_name, inputs.len() + 1);
            inputs.push(ReportInput::new(text, label));
        }
    }

    if inputs.is_empty() {
        return Err(CliError::InvalidInput("No reports found".to_string()));
    }
    Ok(inputs)
}

/// Validate one file's contents as an array of non-empty strings.
pub fn parse_report_array(file_name: &str, contents: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(contents)
        .map_err(|e| CliError::InvalidInput(format!("Invalid JSON in file {}: {}", file_name, e)))?;

    let Value::Array(items) = value else {
        return Err(CliError::InvalidInput(format!(
            "File {} must contain a JSON array of strings",
            file_name
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(text) if text.trim().is_empty() => Err(CliError::InvalidInput(format!(
                "Empty report at index {} in file {}",
                index, file_name
            ))),
            Value::String(text) => Ok(text),
            other => Err(CliError::InvalidInput(format!(
                "Item at index {} in file {} must be a string, got {}",
                index,
                file_name,
                json_type_name(&other)
            ))),
        })
        .collect()
}

/// Load a template file.
///
/// Accepts `{"name": ..., "structure": {...}}` or a bare structure mapping,
/// in which case the file stem becomes the template name.
pub fn load_template(path: &Path) -> Result<Template> {
    let file_name = file_name(path);
    let contents = read_file(path, &file_name)?;
    let value: Value = serde_json::from_str(&contents).map_err(|e| {
        CliError::InvalidInput(format!("Invalid JSON in template file {}: {}", file_name, e))
    })?;
    Ok(template_from_value(&file_stem(path), &value))
}

/// Build a template from parsed JSON, falling back to `default_name`.
pub fn template_from_value(default_name: &str, value: &Value) -> Template {
    let wrapped = value
        .as_object()
        .filter(|map| map.contains_key("structure"))
        .filter(|map| map.keys().all(|key| key == "name" || key == "structure"))
        .filter(|map| map.get("name").map_or(true, Value::is_string));

    match wrapped {
        Some(map) => {
            let name = map
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(default_name);
            let structure = map.get("structure").unwrap_or(&Value::Null);
            Template::new(name, TemplateNode::from_value(structure))
        }
        None => Template::new(default_name, TemplateNode::from_value(value)),
    }
}

fn read_file(path: &Path, file_name: &str) -> Result<String> {
    let bytes = fs::read(path)
        .map_err(|e| CliError::InvalidInput(format!("Cannot read file {}: {}", file_name, e)))?;
    String::from_utf8(bytes)
        .map_err(|_| CliError::InvalidInput(format!("File {} is not valid UTF-8", file_name)))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "template".to_string())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
