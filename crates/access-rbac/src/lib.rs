//! # Access RBAC (Role-Based Access Control)
//!
//! This crate resolves whether a subject holds a named permission, given a
//! statically configured hierarchy of roles and permissions, a persisted set
//! of direct assignments, and optional rules evaluated against request
//! context.
//!
//! ## Overview
//!
//! The access-rbac crate handles:
//! - **Items**: Roles and permissions with parent/child implication links
//! - **Hierarchy**: The item graph built from declarative definitions, with
//!   exact and wildcard lookup
//! - **Resolution**: The `can` decision over assignments, rules and parents
//! - **Assignments**: Direct grants, persisted through a pluggable store
//!
//! ## Architecture
//!
//! ```text
//! HierarchyConfig ──build──→ HierarchyStore ──Arc──┐
//!                                                  ├─→ AccessResolver::can(subject, permission, context)
//! AssignmentStore (memory | file) ─────────Arc─────┤
//! CallerProvider (current caller) ─────────Arc─────┘
//! ```
//!
//! ## Propagation
//!
//! Holding an item grants its children. `can` walks UP from the checked
//! name through its `parents`: assigning `admin`, which lists `edit` as a
//! child, makes `can(u, "edit")` true.
//!
//! ## Pseudo-permissions
//!
//! - `*` is granted to everyone
//! - `!` is granted to everyone except the authenticated caller
//! - `@` is granted only to the authenticated caller
//!
//! ## Wildcards
//!
//! An item named `main/*` matches any name where `*` stands for one or more
//! word characters or hyphens, e.g. `main/view`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use access_rbac::{
//!     AccessResolver, Anonymous, Context, HierarchyConfig, HierarchyStore, ItemDefinition,
//!     MemoryAssignmentStore,
//! };
//! use std::sync::Arc;
//!
//! async fn example() -> access_rbac::RbacResult<()> {
//!     let config = HierarchyConfig::new()
//!         .role(ItemDefinition::new("admin").with_children(["edit", "main/*"]))
//!         .permission(ItemDefinition::new("edit"));
//!
//!     let resolver = AccessResolver::new(
//!         Arc::new(HierarchyStore::from_config(&config)?),
//!         Arc::new(MemoryAssignmentStore::new()),
//!         Arc::new(Anonymous),
//!     );
//!
//!     resolver.assign("u1", "admin", Some("root")).await?;
//!     assert!(resolver.can(Some("u1"), "main/view", &Context::new()).await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `file-store` (default): JSON-file assignment store

pub mod assignment;
pub mod caller;
pub mod config;
pub mod definition;
pub mod error;
pub mod hierarchy;
pub mod items;
pub mod resolver;
pub mod rule;
pub mod store;

// Re-export main types for convenience
pub use assignment::Assignment;
pub use caller::{Anonymous, CallerProvider, FixedCaller};
pub use config::RbacConfig;
pub use definition::{HierarchyConfig, ItemDefinition};
pub use error::{RbacError, RbacResult};
pub use hierarchy::HierarchyStore;
pub use items::{AccessItem, ItemKind};
pub use resolver::AccessResolver;
pub use rule::{ContextEquals, Context, FnRule, Rule};
pub use store::{AssignmentStore, MemoryAssignmentStore, StoreError, StoreResult};

#[cfg(feature = "file-store")]
pub use store::FileAssignmentStore;
