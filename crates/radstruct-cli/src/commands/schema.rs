//! Schema command implementation.

use crate::cli::SchemaArgs;
use crate::error::Result;
use crate::ingest::load_template;
use crate::output::Formatter;

/// Execute the schema command.
pub async fn execute_schema(args: SchemaArgs, formatter: &Formatter) -> Result<()> {
    let template = load_template(&args.template)?;
    let schema = radstruct_schema::compile(&template.structure);
    println!("{}", formatter.format_schema(&schema)?);
    Ok(())
}
