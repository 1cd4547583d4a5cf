//! Parent → child context propagation
//!
//! Child fetches depend on two things a parent record provides: the parent's
//! identifier (substituted into the child's resource path) and the run-level
//! country code (stamped onto every child record). [`ContextPropagator`]
//! derives both into a [`ChildContext`]; [`PathTemplate`] renders child paths
//! from it.

use serde_json::Value;
use std::collections::BTreeMap;

use super::{ExtractError, ExtractResult};
use crate::config::RunConfig;
use crate::fetcher::parser::CatalogParser;
use crate::SkillCategory;

/// Context handed from a parent record to its child fetches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildContext {
    /// Template variable the parent id is bound to (e.g. `industry_id`)
    pub parent_key: &'static str,
    /// Parent record identifier
    pub parent_id: String,
    /// Run-level country code
    pub country_code: String,
}

impl ChildContext {
    /// Template variables carried by this context
    pub fn vars(&self) -> BTreeMap<&'static str, String> {
        let mut vars = BTreeMap::new();
        vars.insert(self.parent_key, self.parent_id.clone());
        vars.insert("country_code", self.country_code.clone());
        vars
    }

    /// Render a child resource path, binding `{category}` when given
    pub fn render(
        &self,
        template: &PathTemplate,
        category: Option<SkillCategory>,
    ) -> ExtractResult<String> {
        let mut vars = self.vars();
        if let Some(category) = category {
            vars.insert("category", category.as_str().to_string());
        }
        template.render(&vars)
    }
}

/// Derives [`ChildContext`] from parent records of one entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextPropagator {
    entity: &'static str,
    id_field: &'static str,
    parent_key: &'static str,
}

impl ContextPropagator {
    /// Industries parent `/industries/{industry_id}/...`
    pub const INDUSTRY: ContextPropagator = ContextPropagator {
        entity: "industry",
        id_field: "id",
        parent_key: "industry_id",
    };

    /// Occupations parent `/occupations/{occupation_id}/...`
    pub const OCCUPATION: ContextPropagator = ContextPropagator {
        entity: "occupation",
        id_field: "id",
        parent_key: "occupation_id",
    };

    /// Parent entity kind
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// Template variable the parent id is bound to
    pub fn parent_key(&self) -> &'static str {
        self.parent_key
    }

    /// Build the child context for `parent`.
    ///
    /// # Errors
    /// - [`ExtractError::MissingIdentifier`] when the parent has no usable id
    /// - [`ExtractError::Config`] when the run has no country code
    pub fn derive_child_context(
        &self,
        parent: &Value,
        config: &RunConfig,
    ) -> ExtractResult<ChildContext> {
        let parent_id = CatalogParser::record_id(parent, self.id_field).ok_or(
            ExtractError::MissingIdentifier {
                entity: self.entity,
                field: self.id_field,
            },
        )?;
        let country_code = config.country_code()?.to_string();

        Ok(ChildContext {
            parent_key: self.parent_key,
            parent_id,
            country_code,
        })
    }
}

/// Resource path with `{name}` placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathTemplate(&'static str);

impl PathTemplate {
    /// `/industries/{industry_id}/skills/{category}`
    pub const INDUSTRY_SKILLS: PathTemplate =
        PathTemplate("/industries/{industry_id}/skills/{category}");

    /// `/occupations/{occupation_id}/skills/{category}`
    pub const OCCUPATION_SKILLS: PathTemplate =
        PathTemplate("/occupations/{occupation_id}/skills/{category}");

    /// `/occupations/{occupation_id}`
    pub const OCCUPATION_DETAIL: PathTemplate = PathTemplate("/occupations/{occupation_id}");

    /// Wrap a template string
    pub const fn new(template: &'static str) -> Self {
        Self(template)
    }

    /// Raw template
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Substitute every placeholder.
    ///
    /// Fails with [`ExtractError::Template`] on an unbound placeholder or an
    /// unterminated `{`.
    pub fn render(&self, vars: &BTreeMap<&'static str, String>) -> ExtractResult<String> {
        let mut out = String::with_capacity(self.0.len() + 16);
        let mut rest = self.0;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                ExtractError::Template(format!("unterminated placeholder in '{}'", self.0))
            })?;
            let name = &after[..close];
            let value = vars.get(name).ok_or_else(|| {
                ExtractError::Template(format!("no value for '{{{name}}}' in '{}'", self.0))
            })?;
            out.push_str(value);
            rest = &after[close + 1..];
        }
        out.push_str(rest);

        Ok(out)
    }
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}
