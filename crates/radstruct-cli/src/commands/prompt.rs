//! Prompt command implementation.

use crate::cli::PromptArgs;
use crate::error::{CliError, Result};
use crate::ingest::load_template;
use crate::output::Formatter;
use radstruct_extractor::PromptBuilder;

/// Execute the prompt command.
pub async fn execute_prompt(args: PromptArgs, formatter: &Formatter) -> Result<()> {
    if args.text.trim().is_empty() {
        return Err(CliError::InvalidInput("Report text is empty".to_string()));
    }

    let template = load_template(&args.template)?;
    let prompt = PromptBuilder::new(&args.text, &template.structure).build();
    println!("{}", formatter.format_text("prompt", &prompt)?);
    Ok(())
}
