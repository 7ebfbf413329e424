//! # Hierarchy Store
//!
//! The in-memory item graph. It is built once from a [`HierarchyConfig`]
//! and is read-only afterwards, so it can be shared behind an `Arc` by any
//! number of concurrent resolvers.
//!
//! Construction runs in two passes:
//!
//! 1. every defined item and every referenced child is materialized, with
//!    later definitions of a name replacing kind, description and children;
//! 2. `parents` are derived as the exact inverse of the final `children`
//!    sets and wildcard names are compiled into patterns.
//!
//! Nothing built by pass 1 is observable before pass 2 has finished.

use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::definition::{HierarchyConfig, ItemDefinition};
use crate::error::{RbacError, RbacResult};
use crate::items::{AccessItem, ItemKind, WILDCARD_MARKER};
use crate::rule::Rule;

/// Characters a wildcard marker stands for: one or more word characters or hyphens.
const WILDCARD_SEGMENT: &str = "[A-Za-z0-9_-]+";

/// Role and permission items indexed by name, in insertion order.
///
/// # Example
///
/// ```
/// use access_rbac::{HierarchyConfig, HierarchyStore, ItemDefinition};
///
/// let config = HierarchyConfig::new()
///     .role(ItemDefinition::new("admin").with_children(["edit", "main/*"]))
///     .permission(ItemDefinition::new("edit"));
/// let store = HierarchyStore::from_config(&config).unwrap();
///
/// assert_eq!(store.get("edit").unwrap().parents, vec!["admin"]);
/// assert_eq!(store.get("main/view").unwrap().name, "main/*");
/// assert!(store.get("other/view").is_none());
/// ```
#[derive(Debug, Default)]
pub struct HierarchyStore {
    /// Items in insertion order.
    items: Vec<AccessItem>,
    /// Name to position in `items`.
    index: HashMap<String, usize>,
    /// Compiled wildcard names with the position of their item, in insertion order.
    patterns: Vec<(Regex, usize)>,
}

impl HierarchyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the hierarchy from role and permission definitions.
    ///
    /// Roles are processed first, then permissions. All definitions are
    /// validated before anything is built, so an error never leaves a
    /// partial hierarchy behind.
    pub fn build(roles: &[ItemDefinition], permissions: &[ItemDefinition]) -> RbacResult<Self> {
        for (i, def) in roles.iter().enumerate() {
            def.validate(&format!("roles[{i}]"))?;
        }
        for (i, def) in permissions.iter().enumerate() {
            def.validate(&format!("permissions[{i}]"))?;
        }

        let mut store = Self::new();
        for def in roles {
            store.materialize(def, ItemKind::Role);
        }
        for def in permissions {
            store.materialize(def, ItemKind::Permission);
        }
        store.link()?;

        tracing::info!(
            items = store.items.len(),
            roles = store.items.iter().filter(|i| i.is_role()).count(),
            wildcards = store.patterns.len(),
            "Built access hierarchy"
        );

        Ok(store)
    }

    /// Build the hierarchy from a parsed configuration.
    pub fn from_config(config: &HierarchyConfig) -> RbacResult<Self> {
        Self::build(&config.roles, &config.permissions)
    }

    /// Load and build the hierarchy from a JSON or YAML definition file.
    pub fn load(path: &Path) -> RbacResult<Self> {
        let config = HierarchyConfig::load(path)?;
        tracing::debug!(path = %path.display(), definitions = config.len(), "Loaded hierarchy definitions");
        Self::from_config(&config)
    }

    /// Register one definition after the initial build.
    ///
    /// Uses the same overwrite rules as [`build`](Self::build): an existing
    /// item keeps its position and rule but takes the new kind,
    /// description and children. Links are recomputed afterwards. A
    /// definition that fails validation or pattern compilation leaves the
    /// store unchanged.
    pub fn register(&mut self, def: &ItemDefinition, kind: ItemKind) -> RbacResult<()> {
        def.validate("registration")?;
        for name in std::iter::once(&def.name).chain(&def.children) {
            if name.contains(WILDCARD_MARKER) {
                wildcard_pattern(name)?;
            }
        }

        self.materialize(def, kind);
        self.link()?;
        tracing::debug!(item = %def.name, kind = %kind, "Registered access item");
        Ok(())
    }

    /// Attach a rule to the item with exactly this name.
    ///
    /// Wildcard items are addressed by their pattern name, e.g. `dept/*`.
    pub fn attach_rule(&mut self, name: &str, rule: Arc<dyn Rule>) -> RbacResult<()> {
        let pos = *self
            .index
            .get(name)
            .ok_or_else(|| RbacError::NotFound(name.to_string()))?;
        self.items[pos].rule = Some(rule);
        Ok(())
    }

    /// Builder-style variant of [`attach_rule`](Self::attach_rule).
    pub fn with_rule<R>(mut self, name: &str, rule: R) -> RbacResult<Self>
    where
        R: Rule + 'static,
    {
        self.attach_rule(name, Arc::new(rule))?;
        Ok(self)
    }

    /// Find an item by name.
    ///
    /// An exact match wins. Otherwise wildcard items are tried in insertion
    /// order and the first whose pattern matches the whole name is returned.
    pub fn get(&self, name: &str) -> Option<&AccessItem> {
        if let Some(&pos) = self.index.get(name) {
            return Some(&self.items[pos]);
        }
        self.patterns
            .iter()
            .find(|(pattern, _)| pattern.is_match(name))
            .map(|(_, pos)| &self.items[*pos])
    }

    /// Check if an item with exactly this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All items, in insertion order.
    pub fn all(&self) -> &[AccessItem] {
        &self.items
    }

    /// Names of all role items, in insertion order.
    pub fn role_names(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.is_role())
            .map(|item| item.name.clone())
            .collect()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the store has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pass 1: create or overwrite the defined item and create missing children.
    fn materialize(&mut self, def: &ItemDefinition, kind: ItemKind) {
        let pos = match self.index.get(&def.name).copied() {
            Some(pos) => pos,
            None => self.push(AccessItem::new(def.name.clone(), kind)),
        };

        let item = &mut self.items[pos];
        item.kind = kind;
        item.description = def.descr.clone();
        item.children.clear();
        for child in &def.children {
            item.add_child(child);
        }

        for child in &def.children {
            if !self.index.contains_key(child) {
                self.push(AccessItem::new(child.clone(), ItemKind::Permission));
            }
        }
    }

    /// Pass 2: derive parents from children and compile wildcard patterns.
    fn link(&mut self) -> RbacResult<()> {
        for item in &mut self.items {
            item.parents.clear();
        }

        let mut links = Vec::new();
        for item in &self.items {
            for child in &item.children {
                if let Some(&child_pos) = self.index.get(child) {
                    links.push((child_pos, item.name.clone()));
                }
            }
        }
        for (child_pos, parent) in links {
            self.items[child_pos].add_parent(&parent);
        }

        self.patterns = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_wildcard())
            .map(|(pos, item)| wildcard_pattern(&item.name).map(|pattern| (pattern, pos)))
            .collect::<RbacResult<Vec<_>>>()?;

        Ok(())
    }

    fn push(&mut self, item: AccessItem) -> usize {
        let pos = self.items.len();
        self.index.insert(item.name.clone(), pos);
        self.items.push(item);
        pos
    }
}

/// Compile a wildcard item name into an anchored pattern.
///
/// Literal parts are matched verbatim; each marker matches one or more
/// word characters or hyphens, so `main/*` matches `main/view` but not
/// `main/a/b`.
pub fn wildcard_pattern(name: &str) -> RbacResult<Regex> {
    let body = name
        .split(WILDCARD_MARKER)
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(WILDCARD_SEGMENT);

    Regex::new(&format!("^{body}$")).map_err(|e| {
        RbacError::Configuration(format!("invalid wildcard item name '{name}': {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::FnRule;

    fn defs(names: &[(&str, &[&str])]) -> Vec<ItemDefinition> {
        names
            .iter()
            .map(|(name, children)| ItemDefinition::new(*name).with_children(children.iter().copied()))
            .collect()
    }

    #[test]
    fn test_build_links_parents() {
        let store = HierarchyStore::build(
            &defs(&[("admin", &["edit", "view"]), ("editor", &["edit"])]),
            &defs(&[("edit", &["view"])]),
        )
        .unwrap();

        assert_eq!(store.get("edit").unwrap().parents, vec!["admin", "editor"]);
        assert_eq!(store.get("view").unwrap().parents, vec!["admin", "edit"]);
        assert!(store.get("admin").unwrap().parents.is_empty());
    }

    #[test]
    fn test_children_and_parents_are_consistent() {
        let store = HierarchyStore::build(
            &defs(&[("admin", &["editor", "audit"]), ("editor", &["edit", "view"])]),
            &defs(&[("edit", &["view"])]),
        )
        .unwrap();

        for item in store.all() {
            for child in &item.children {
                let child = store.get(child).expect("child exists");
                assert!(child.parents.contains(&item.name));
            }
            for parent in &item.parents {
                assert!(store.get(parent).unwrap().implies(&item.name));
            }
        }
    }

    #[test]
    fn test_implicit_children_are_permissions() {
        let store = HierarchyStore::build(&defs(&[("admin", &["report"])]), &[]).unwrap();
        let report = store.get("report").unwrap();
        assert_eq!(report.kind, ItemKind::Permission);
        assert!(report.children.is_empty());
        assert_eq!(store.role_names(), vec!["admin"]);
    }

    #[test]
    fn test_later_definition_overwrites() {
        let roles = vec![ItemDefinition::new("admin").with_children(["edit"])];
        let permissions = vec![
            ItemDefinition::new("edit").with_descr("Edit content"),
            ItemDefinition::new("admin").with_descr("Now a permission").with_children(["view"]),
        ];
        let store = HierarchyStore::build(&roles, &permissions).unwrap();

        let admin = store.get("admin").unwrap();
        assert_eq!(admin.kind, ItemKind::Permission);
        assert_eq!(admin.description.as_deref(), Some("Now a permission"));
        assert_eq!(admin.children, vec!["view"]);
        assert!(store.get("edit").unwrap().parents.is_empty());
        assert_eq!(store.get("edit").unwrap().description.as_deref(), Some("Edit content"));
        assert!(store.role_names().is_empty());
    }

    #[test]
    fn test_definition_after_implicit_creation_keeps_parents() {
        let store = HierarchyStore::build(
            &defs(&[("admin", &["manager"]), ("manager", &["edit"])]),
            &[],
        )
        .unwrap();

        let manager = store.get("manager").unwrap();
        assert_eq!(manager.kind, ItemKind::Role);
        assert_eq!(manager.parents, vec!["admin"]);
        assert_eq!(store.role_names(), vec!["admin", "manager"]);
    }

    #[test]
    fn test_duplicate_children_ignored() {
        let store = HierarchyStore::build(&defs(&[("admin", &["edit", "edit"])]), &[]).unwrap();
        assert_eq!(store.get("admin").unwrap().children, vec!["edit"]);
        assert_eq!(store.get("edit").unwrap().parents, vec!["admin"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_missing_name_fails_without_partial_state() {
        let roles = vec![ItemDefinition::new("admin"), ItemDefinition::default()];
        let err = HierarchyStore::build(&roles, &[]).unwrap_err();
        assert!(matches!(err, RbacError::Configuration(_)));
    }

    #[test]
    fn test_wildcard_lookup() {
        let store = HierarchyStore::build(&defs(&[("admin", &["main/*"])]), &[]).unwrap();

        assert_eq!(store.get("main/view").unwrap().name, "main/*");
        assert_eq!(store.get("main/view-all_2").unwrap().name, "main/*");
        assert!(store.get("other/view").is_none());
        assert!(store.get("main/").is_none());
        assert!(store.get("main/a/b").is_none());
    }

    #[test]
    fn test_exact_match_beats_wildcard() {
        let store = HierarchyStore::build(&[], &defs(&[("main/*", &[]), ("main/view", &["x"])])).unwrap();
        assert_eq!(store.get("main/view").unwrap().name, "main/view");
        assert_eq!(store.get("main/edit").unwrap().name, "main/*");
    }

    #[test]
    fn test_wildcard_scan_uses_insertion_order() {
        let store = HierarchyStore::build(&[], &defs(&[("*/view", &[]), ("main/*", &[])])).unwrap();
        assert_eq!(store.get("main/view").unwrap().name, "*/view");
    }

    #[test]
    fn test_anyone_item_matches_single_segment() {
        let store = HierarchyStore::build(&defs(&[("*", &["home"])]), &[]).unwrap();

        assert!(store.contains("*"));
        assert!(!store.contains("anything"));
        assert_eq!(store.get("anything").unwrap().name, "*");
        assert_eq!(store.get("home").unwrap().name, "home");
        assert!(store.get("main/view").is_none());
    }

    #[test]
    fn test_wildcard_literal_parts_are_escaped() {
        let pattern = wildcard_pattern("api.v1.*").unwrap();
        assert!(pattern.is_match("api.v1.users"));
        assert!(!pattern.is_match("apixv1.users"));
    }

    #[test]
    fn test_register_relinks() {
        let mut store = HierarchyStore::build(&defs(&[("admin", &["edit"])]), &[]).unwrap();
        store
            .register(&ItemDefinition::new("auditor").with_children(["edit", "logs/*"]), ItemKind::Role)
            .unwrap();

        assert_eq!(store.get("edit").unwrap().parents, vec!["admin", "auditor"]);
        assert_eq!(store.get("logs/today").unwrap().name, "logs/*");
        assert_eq!(store.role_names(), vec!["admin", "auditor"]);
    }

    #[test]
    fn test_register_failure_leaves_store_unchanged() {
        let mut store = HierarchyStore::build(&defs(&[("admin", &["edit"])]), &[]).unwrap();
        let oversized = "*/".repeat(1_000_000);

        let err = store
            .register(
                &ItemDefinition::new("auditor").with_children([oversized.as_str(), "edit"]),
                ItemKind::Role,
            )
            .unwrap_err();

        assert!(matches!(err, RbacError::Configuration(_)));
        assert!(!store.contains("auditor"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("edit").unwrap().parents, vec!["admin"]);
    }

    #[test]
    fn test_attach_rule() {
        let store = HierarchyStore::build(&[], &defs(&[("dept/*", &[])]))
            .unwrap()
            .with_rule("dept/*", FnRule::new(|_, _, _| true))
            .unwrap();
        assert!(store.get("dept/7").unwrap().has_rule());

        let err = HierarchyStore::new()
            .with_rule("ghost", FnRule::new(|_, _, _| true))
            .unwrap_err();
        assert!(matches!(err, RbacError::NotFound(_)));
    }

    #[test]
    fn test_register_keeps_rule() {
        let mut store = HierarchyStore::build(&[], &defs(&[("report", &[])]))
            .unwrap()
            .with_rule("report", FnRule::new(|_, _, _| false))
            .unwrap();
        store
            .register(&ItemDefinition::new("report").with_descr("Reports"), ItemKind::Permission)
            .unwrap();
        assert!(store.get("report").unwrap().has_rule());
    }
}
