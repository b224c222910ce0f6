//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use radstruct_domain::{BatchProgress, ReportBatch, ReportStatus, StructuredReport};
use radstruct_schema::{CompiledSchema, FieldKind, SchemaObject};
use serde_json::{json, Value};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Longest result cell shown in table mode
const MAX_CELL_CHARS: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format the reports of a batch.
    pub fn format_reports(&self, reports: &[StructuredReport]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&reports_json(reports))?),
            OutputFormat::Table => Ok(self.format_reports_table(reports)),
        }
    }

    /// Format a batch record with its live progress.
    pub fn format_batch(&self, batch: &ReportBatch, progress: &BatchProgress) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&batch_json(batch, progress))?),
            OutputFormat::Table => {
                let status = batch.status.as_str();
                let status = match progress.failed {
                    0 => self.colorize(status, "green"),
                    n if n == progress.total => self.colorize(status, "red"),
                    _ => self.colorize(status, "yellow"),
                };
                Ok(format!(
                    "Batch '{}' ({}): {}\n{} total, {} completed, {} failed, {} pending, {} processing",
                    batch.name,
                    batch.id,
                    status,
                    progress.total,
                    progress.completed,
                    progress.failed,
                    progress.pending,
                    progress.processing
                ))
            }
        }
    }

    /// Format a compiled schema and its diagnostics.
    pub fn format_schema(&self, schema: &CompiledSchema) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let diagnostics: Vec<String> =
                    schema.diagnostics.iter().map(ToString::to_string).collect();
                Ok(serde_json::to_string_pretty(&json!({
                    "schema": schema.to_json_schema(),
                    "leaf_count": schema.leaf_count(),
                    "diagnostics": diagnostics,
                }))?)
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Path", "Kind", "Description"]);
                push_fields(&mut builder, &schema.root);

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));

                let document = serde_json::to_string_pretty(&schema.to_json_schema())?;
                let mut out = vec![table.to_string(), document];
                if schema.is_clean() {
                    out.push(self.success(&format!("{} field(s), no diagnostics", schema.leaf_count())));
                } else {
                    out.extend(
                        schema
                            .diagnostics
                            .iter()
                            .map(|diagnostic| self.warning(&diagnostic.to_string())),
                    );
                }
                Ok(out.join("\n"))
            }
        }
    }

    /// Format a single named value, such as a rendered prompt.
    pub fn format_text(&self, key: &str, text: &str) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({ key: text }))?),
            OutputFormat::Table => Ok(text.to_string()),
        }
    }

    /// Format key/value pairs.
    pub fn format_pairs(&self, pairs: &[(&str, String)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let map: serde_json::Map<String, Value> = pairs
                    .iter()
                    .map(|(key, value)| (key.to_string(), Value::String(value.clone())))
                    .collect();
                Ok(serde_json::to_string_pretty(&map)?)
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                for (key, value) in pairs {
                    builder.push_record([*key, value.as_str()]);
                }
                let mut table = builder.build();
                table.with(Style::rounded());
                Ok(table.to_string())
            }
        }
    }

    fn format_reports_table(&self, reports: &[StructuredReport]) -> String {
        if reports.is_empty() {
            return self.colorize("No reports found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Report", "Status", "Confidence", "Result"]);

        for report in reports {
            let confidence = report
                .confidence_score
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string());
            let result = match (&report.structured_data, &report.error_message) {
                (Some(data), _) => truncate(&data.to_string(), MAX_CELL_CHARS),
                (None, Some(message)) => truncate(message, MAX_CELL_CHARS),
                (None, None) => String::new(),
            };
            let status = match report.status {
                ReportStatus::Completed => self.colorize(report.status.as_str(), "green"),
                ReportStatus::Failed => self.colorize(report.status.as_str(), "red"),
                _ => self.colorize(report.status.as_str(), "yellow"),
            };
            builder.push_record([report.filename.clone(), status, confidence, result]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn reports_json(reports: &[StructuredReport]) -> Value {
    Value::Array(
        reports
            .iter()
            .map(|r| {
                json!({
                    "id": r.id.to_string(),
                    "filename": r.filename,
                    "status": r.status,
                    "structured_data": r.structured_data,
                    "confidence_score": r.confidence_score.map(u8::from),
                    "error_message": r.error_message,
                })
            })
            .collect(),
    )
}

fn batch_json(batch: &ReportBatch, progress: &BatchProgress) -> Value {
    json!({
        "id": batch.id.to_string(),
        "name": batch.name,
        "template_id": batch.template_id.to_string(),
        "status": batch.status,
        "total_reports": batch.total_reports,
        "completed": progress.completed,
        "failed": progress.failed,
        "pending": progress.pending,
        "processing": progress.processing,
        "created_at": batch.created_at,
    })
}

fn push_fields(builder: &mut Builder, object: &SchemaObject) {
    for field in &object.fields {
        match &field.kind {
            FieldKind::Scalar { description, .. } => {
                builder.push_record([
                    field.path.as_str(),
                    "string | null",
                    description.as_deref().unwrap_or(""),
                ]);
            }
            FieldKind::Object(child) => {
                builder.push_record([field.path.as_str(), "object | null", ""]);
                push_fields(builder, child);
            }
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
