//! Prompt construction for template-driven extraction

use radstruct_domain::TemplateNode;

/// Version of the instruction block; bump whenever [`INSTRUCTIONS`] changes
pub const PROMPT_VERSION: u32 = 1;

const ROLE_LINE: &str = "You are a medical AI assistant that converts free-text radiology \
reports into structured data that follows a given template.";

/// Fixed extraction rules appended to every prompt
pub const INSTRUCTIONS: &str = r#"Instructions:
1. Fill each template field with the matching information from the report.
2. Use null for any field the report does not mention.
3. Keep the original medical terminology; do not paraphrase findings.
4. Respond with data that matches the template structure exactly.
5. Do not add explanations, commentary, or any text outside the data."#;

/// Builds the extraction prompt for one report
pub struct PromptBuilder<'a> {
    report_text: &'a str,
    structure: &'a TemplateNode,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(report_text: &'a str, structure: &'a TemplateNode) -> Self {
        Self {
            report_text,
            structure,
        }
    }

    /// Build the complete extraction prompt
    ///
    /// The structure is embedded exactly as authored, including keys the
    /// schema compiler ignores.
    pub fn build(&self) -> String {
        let structure = serde_json::to_string_pretty(&self.structure.to_value())
            .unwrap_or_else(|_| "{}".to_string());

        let mut prompt = String::with_capacity(
            ROLE_LINE.len() + self.report_text.len() + structure.len() + INSTRUCTIONS.len() + 64,
        );
        prompt.push_str(ROLE_LINE);
        prompt.push_str("\n\nRADIOLOGY REPORT:\n");
        prompt.push_str(self.report_text);
        prompt.push_str("\n\nTEMPLATE STRUCTURE:\n");
        prompt.push_str(&structure);
        prompt.push_str("\n\n");
        prompt.push_str(INSTRUCTIONS);
        prompt
    }
}
