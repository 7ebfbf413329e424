//! Access control configuration.
//!
//! Locates the hierarchy definition file and the assignment storage.
//! Configuration is loaded from environment variables with defaults
//! suitable for local development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{RbacError, RbacResult};
use crate::hierarchy::HierarchyStore;

/// Default assignment storage file.
pub const DEFAULT_ASSIGNMENT_FILE: &str = "assignment.json";

/// Configuration for the access control component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RbacConfig {
    /// Hierarchy definition file (JSON or YAML).
    pub data_file: Option<PathBuf>,

    /// Assignment storage file.
    pub assignment_file: PathBuf,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            assignment_file: PathBuf::from(DEFAULT_ASSIGNMENT_FILE),
        }
    }
}

impl RbacConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RBAC_DATA_FILE`: hierarchy definition file (required by [`validate`](Self::validate))
    /// - `RBAC_ASSIGNMENT_FILE`: assignment storage file (default: assignment.json)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            data_file: std::env::var("RBAC_DATA_FILE")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            assignment_file: std::env::var("RBAC_ASSIGNMENT_FILE")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.assignment_file),
        }
    }

    /// Set the hierarchy definition file.
    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = Some(path.into());
        self
    }

    /// Set the assignment storage file.
    pub fn with_assignment_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.assignment_file = path.into();
        self
    }

    /// Check that the required settings are present.
    pub fn validate(&self) -> RbacResult<()> {
        if self.data_file.is_none() {
            return Err(RbacError::Configuration(
                "no hierarchy definition file is configured (set RBAC_DATA_FILE)".to_string(),
            ));
        }
        if self.assignment_file.as_os_str().is_empty() {
            return Err(RbacError::Configuration(
                "assignment storage file must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate the configuration and build the hierarchy from the data file.
    pub fn load_hierarchy(&self) -> RbacResult<HierarchyStore> {
        self.validate()?;
        match &self.data_file {
            Some(path) => HierarchyStore::load(path),
            None => Err(RbacError::Configuration("no hierarchy definition file".to_string())),
        }
    }
}
