//! Command implementations.

pub mod prompt;
pub mod provider;
pub mod run;
pub mod schema;

pub use self::prompt::execute_prompt;
pub use self::provider::execute_provider;
pub use self::run::execute_run;
pub use self::schema::execute_schema;
