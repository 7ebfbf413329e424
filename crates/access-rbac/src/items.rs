//! # Access Items
//!
//! Nodes of the role/permission hierarchy. An item is either a role
//! (assignable, shown to administrators) or a permission, and carries
//! explicit links to the items it implies (`children`) and the items
//! that imply it (`parents`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::rule::Rule;

/// Marker that turns an item name into a pattern, e.g. `main/*`.
pub const WILDCARD_MARKER: char = '*';

/// Pseudo-permission granted to everyone.
pub const ANYONE: &str = "*";

/// Pseudo-permission granted to everyone except the authenticated caller.
pub const GUEST: &str = "!";

/// Pseudo-permission granted only to the authenticated caller.
pub const AUTHENTICATED: &str = "@";

/// Kind of an access item.
///
/// Roles are the assignable items; permissions are the leaves they imply.
/// Both kinds resolve the same way in [`AccessResolver::can`](crate::AccessResolver::can).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A permission (the default for implicitly created children).
    #[default]
    Permission,

    /// A role, typically assigned to users directly.
    Role,
}

impl ItemKind {
    /// Get the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Permission => "permission",
            ItemKind::Role => "role",
        }
    }

    /// Parse kind from string representation (case-insensitive).
    ///
    /// # Example
    ///
    /// ```
    /// use access_rbac::ItemKind;
    ///
    /// assert_eq!(ItemKind::parse("Role"), Some(ItemKind::Role));
    /// assert_eq!(ItemKind::parse("permission"), Some(ItemKind::Permission));
    /// assert_eq!(ItemKind::parse("group"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "permission" => Some(ItemKind::Permission),
            "role" => Some(ItemKind::Role),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named role or permission node.
///
/// Holding an item grants all of its `children`. The `parents` list is the
/// inverse relation and is maintained by the
/// [`HierarchyStore`](crate::HierarchyStore); callers never edit it.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessItem {
    /// Unique name, possibly containing a [`WILDCARD_MARKER`].
    pub name: String,

    /// Role or permission.
    pub kind: ItemKind,

    /// Optional display text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Names this item implies, in definition order, without duplicates.
    #[serde(default)]
    pub children: Vec<String>,

    /// Names of the items that list this one as a child.
    #[serde(default)]
    pub parents: Vec<String>,

    /// Dynamic rule deciding this item instead of the parent walk.
    #[serde(skip)]
    pub(crate) rule: Option<Arc<dyn Rule>>,
}

impl AccessItem {
    /// Create an item with no links and no rule.
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            children: Vec::new(),
            parents: Vec::new(),
            rule: None,
        }
    }

    /// Check if the name is a wildcard pattern.
    ///
    /// A stored item named [`ANYONE`] is a pattern too and matches any
    /// single-segment name; the resolver grants `*` itself before lookup.
    pub fn is_wildcard(&self) -> bool {
        self.name.contains(WILDCARD_MARKER)
    }

    /// Check if this item is a role.
    pub fn is_role(&self) -> bool {
        self.kind == ItemKind::Role
    }

    /// Get the rule attached to this item, if any.
    pub fn rule(&self) -> Option<&Arc<dyn Rule>> {
        self.rule.as_ref()
    }

    /// Check if a rule is attached.
    pub fn has_rule(&self) -> bool {
        self.rule.is_some()
    }

    /// Check if this item directly implies `name`.
    pub fn implies(&self, name: &str) -> bool {
        self.children.iter().any(|c| c == name)
    }

    pub(crate) fn add_child(&mut self, name: &str) {
        if !self.implies(name) {
            self.children.push(name.to_string());
        }
    }

    pub(crate) fn add_parent(&mut self, name: &str) {
        if !self.parents.iter().any(|p| p == name) {
            self.parents.push(name.to_string());
        }
    }
}

impl fmt::Debug for AccessItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessItem")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("description", &self.description)
            .field("children", &self.children)
            .field("parents", &self.parents)
            .field("has_rule", &self.has_rule())
            .finish()
    }
}

impl PartialEq for AccessItem {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.description == other.description
            && self.children == other.children
            && self.parents == other.parents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_is_unlinked() {
        let item = AccessItem::new("edit", ItemKind::Permission);
        assert!(item.children.is_empty());
        assert!(item.parents.is_empty());
        assert!(!item.has_rule());
        assert!(!item.is_role());
    }

    #[test]
    fn test_children_have_set_semantics() {
        let mut item = AccessItem::new("admin", ItemKind::Role);
        item.add_child("edit");
        item.add_child("view");
        item.add_child("edit");
        assert_eq!(item.children, vec!["edit", "view"]);
        assert!(item.implies("view"));
        assert!(!item.implies("delete"));
    }

    #[test]
    fn test_wildcard_detection() {
        assert!(AccessItem::new("main/*", ItemKind::Permission).is_wildcard());
        assert!(!AccessItem::new("main/view", ItemKind::Permission).is_wildcard());
        assert!(AccessItem::new(ANYONE, ItemKind::Permission).is_wildcard());
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&ItemKind::Role).unwrap();
        assert_eq!(json, "\"role\"");
        let kind: ItemKind = serde_json::from_str("\"permission\"").unwrap();
        assert_eq!(kind, ItemKind::Permission);
    }

    #[test]
    fn test_item_serialization_skips_rule() {
        let mut item = AccessItem::new("admin", ItemKind::Role);
        item.add_child("edit");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["name"], "admin");
        assert_eq!(value["kind"], "role");
        assert_eq!(value["children"], serde_json::json!(["edit"]));
        assert!(value.get("rule").is_none());
        assert!(value.get("description").is_none());
    }
}
