//! Declarative hierarchy definitions
//!
//! The hierarchy is described by two ordered lists, `roles` and
//! `permissions`, whose entries name an item and the children it implies:
//!
//! ```text
//! roles:
//!   - name: admin
//!     descr: Administrator
//!     children: [edit, main/*]
//! permissions:
//!   - name: edit
//! ```
//!
//! Definitions are checked when loaded so a malformed file fails at startup
//! instead of producing a partial hierarchy.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RbacError, RbacResult};

/// One role or permission entry of the configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemDefinition {
    /// Item name. Required; an empty name is a configuration error.
    #[serde(default)]
    pub name: String,

    /// Optional display text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,

    /// Names implied by this item.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

impl ItemDefinition {
    /// Create a definition with no description and no children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the description.
    pub fn with_descr(mut self, descr: impl Into<String>) -> Self {
        self.descr = Some(descr.into());
        self
    }

    /// Set the implied children.
    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    /// Check that the definition names an item and lists only named children.
    pub fn validate(&self, position: &str) -> RbacResult<()> {
        if self.name.trim().is_empty() {
            return Err(RbacError::Configuration(format!(
                "item definition at {position} has no name"
            )));
        }
        if self.children.iter().any(|c| c.trim().is_empty()) {
            return Err(RbacError::Configuration(format!(
                "item '{}' lists an empty child name",
                self.name
            )));
        }
        Ok(())
    }
}

/// The full declarative hierarchy: roles first, then permissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HierarchyConfig {
    /// Role definitions, processed first.
    #[serde(default)]
    pub roles: Vec<ItemDefinition>,

    /// Permission definitions, processed after roles.
    #[serde(default)]
    pub permissions: Vec<ItemDefinition>,
}

impl HierarchyConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a role definition.
    pub fn role(mut self, def: ItemDefinition) -> Self {
        self.roles.push(def);
        self
    }

    /// Append a permission definition.
    pub fn permission(mut self, def: ItemDefinition) -> Self {
        self.permissions.push(def);
        self
    }

    /// Validate every definition, reporting the first offending position.
    pub fn validate(&self) -> RbacResult<()> {
        for (i, def) in self.roles.iter().enumerate() {
            def.validate(&format!("roles[{i}]"))?;
        }
        for (i, def) in self.permissions.iter().enumerate() {
            def.validate(&format!("permissions[{i}]"))?;
        }
        Ok(())
    }

    /// Parse a JSON document.
    pub fn from_json(s: &str) -> RbacResult<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document.
    pub fn from_yaml(s: &str) -> RbacResult<Self> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a definition file. `.yaml`/`.yml` files are read as YAML,
    /// anything else as JSON.
    pub fn load(path: &Path) -> RbacResult<Self> {
        if !path.is_file() {
            return Err(RbacError::Configuration(format!(
                "RBAC data file '{}' is not found",
                path.display()
            )));
        }
        let contents = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .map(|ext| ext == "yaml" || ext == "yml")
            .unwrap_or(false);

        if is_yaml {
            Self::from_yaml(&contents)
        } else {
            Self::from_json(&contents)
        }
    }

    /// Total number of definitions.
    pub fn len(&self) -> usize {
        self.roles.len() + self.permissions.len()
    }

    /// Check if there are no definitions.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.permissions.is_empty()
    }
}
