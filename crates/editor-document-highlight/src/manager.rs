//! Registry of highlighting definitions.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::builtin;
use crate::definition::SyntaxDefinition;
use crate::error::Result;
use crate::rules::HighlightingDefinition;

/// Explicit registry of compiled highlighting definitions.
///
/// Definitions are looked up by name and by file extension. There is no global
/// instance: build one at startup and pass it to whatever needs it.
#[derive(Debug, Default, Clone)]
pub struct HighlightingManager {
    by_name: HashMap<String, Arc<HighlightingDefinition>>,
    by_extension: HashMap<String, Arc<HighlightingDefinition>>,
}

impl HighlightingManager {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the built-in JSON and INI definitions.
    pub fn with_builtins() -> Result<Self> {
        let mut manager = Self::new();
        for definition in builtin::definitions() {
            manager.register_syntax(&definition)?;
        }
        Ok(manager)
    }

    /// Register a compiled definition, replacing any definition with the same name or a
    /// shared extension.
    pub fn register(&mut self, definition: HighlightingDefinition) -> Arc<HighlightingDefinition> {
        let definition = Arc::new(definition);
        for extension in definition.extensions() {
            self.by_extension
                .insert(extension.clone(), definition.clone());
        }
        debug!(
            definition = %definition.name(),
            extensions = definition.extensions().len(),
            "registered highlighting definition"
        );
        self.by_name
            .insert(definition.name().to_string(), definition.clone());
        definition
    }

    /// Compile `syntax` against this registry and register the result.
    pub fn register_syntax(
        &mut self,
        syntax: &SyntaxDefinition,
    ) -> Result<Arc<HighlightingDefinition>> {
        let definition = HighlightingDefinition::build(syntax, self)?;
        Ok(self.register(definition))
    }

    /// Definition by name.
    pub fn definition(&self, name: &str) -> Option<Arc<HighlightingDefinition>> {
        self.by_name.get(name).cloned()
    }

    /// Definition by file extension. The leading dot is optional and case is ignored.
    pub fn definition_by_extension(&self, extension: &str) -> Option<Arc<HighlightingDefinition>> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self.by_extension.get(&extension).cloned()
    }

    /// All registered definitions, sorted by name.
    pub fn definitions(&self) -> Vec<Arc<HighlightingDefinition>> {
        let mut definitions: Vec<_> = self.by_name.values().cloned().collect();
        definitions.sort_by(|a, b| a.name().cmp(b.name()));
        definitions
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
