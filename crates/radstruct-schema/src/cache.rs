//! Compiled-schema cache keyed by template id

use crate::compiler::compile;
use crate::schema::CompiledSchema;
use radstruct_domain::{Template, TemplateId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Shared cache of compiled schemas
///
/// Read by many concurrent units of work, written at most once per template
/// id. Compilation runs outside the lock; when two workers miss at the same
/// time both compile, the first insert wins and the results are equal.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<TemplateId, Arc<CompiledSchema>>>,
}

impl SchemaCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached schema for a template id, if present
    pub fn get(&self, id: TemplateId) -> Option<Arc<CompiledSchema>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Cached schema for the template, compiling it on a miss
    pub fn get_or_compile(&self, template: &Template) -> Arc<CompiledSchema> {
        if let Some(hit) = self.get(template.id) {
            return hit;
        }

        let compiled = Arc::new(compile(&template.structure));
        debug!(
            template_id = %template.id,
            fields = compiled.leaf_count(),
            "Compiled template schema"
        );
        for diagnostic in &compiled.diagnostics {
            warn!(template_id = %template.id, "Degraded template: {}", diagnostic);
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(template.id).or_insert(compiled))
    }

    /// Drop a cached schema (e.g. after the template was replaced)
    pub fn invalidate(&self, id: TemplateId) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Number of cached schemas
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
