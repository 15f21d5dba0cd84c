use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    Template, families,
    errors::{RegistryError, TemplateError},
};

/// Flat, read-only map of template id to template.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: IndexMap<String, Arc<Template>>,
}

impl TemplateRegistry {
    /// Assembles the registry from the built-in families.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_families(families::builtin()?)
    }

    /// Merges template families into one namespace.
    ///
    /// Fails with [`RegistryError::DuplicateTemplate`] when two templates share an id.
    pub fn from_families<I>(families: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Vec<Template>>,
    {
        let mut templates = IndexMap::new();
        for template in families.into_iter().flatten() {
            if templates.contains_key(&template.id) {
                return Err(RegistryError::DuplicateTemplate { id: template.id });
            }
            templates.insert(template.id.clone(), Arc::new(template));
        }
        debug!(templates = templates.len(), "template registry assembled");
        Ok(Self { templates })
    }

    pub fn resolve(&self, template_id: &str) -> Result<&Template, TemplateError> {
        self.templates
            .get(template_id)
            .map(Arc::as_ref)
            .ok_or_else(|| TemplateError::NotFound {
                template_id: template_id.to_string(),
                available: self.ids().collect::<Vec<_>>().join(", "),
            })
    }

    /// Resolves `template_id` and returns `parameters` merged over its defaults, once they pass its rules.
    pub fn validate(&self, template_id: &str, parameters: &Map<String, Value>) -> Result<Map<String, Value>, TemplateError> {
        self.resolve(template_id)?.validate(parameters)
    }

    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.templates.values().map(Arc::as_ref)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
