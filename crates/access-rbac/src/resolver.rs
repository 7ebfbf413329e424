//! # Access Resolver
//!
//! Decides whether a subject holds a permission. Each name reached by the
//! walk is checked in a fixed order, stopping at the first step that
//! decides it:
//!
//! 1. `*` grants everyone;
//! 2. `!` grants everyone except the authenticated caller;
//! 3. `@` grants only the authenticated caller;
//! 4. a direct assignment of the name to the subject grants;
//! 5. a name with no matching item denies;
//! 6. an item with a rule is decided by the rule;
//! 7. otherwise the item's parents are checked in order, and the first
//!    granting parent grants.
//!
//! Parents are walked depth-first in list order, so a grant is found in
//! the same order as a recursive evaluation would find it. A name is
//! evaluated at most once per call, which keeps cyclic hierarchies from
//! looping.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::assignment::Assignment;
use crate::caller::CallerProvider;
use crate::error::RbacResult;
use crate::hierarchy::HierarchyStore;
use crate::items::{AccessItem, ANYONE, AUTHENTICATED, GUEST};
use crate::rule::Context;
use crate::store::{AssignmentStore, StoreError};

/// Revoke target removing every assignment of a subject.
pub const ALL_ITEMS: &str = "*";

/// Outcome of checking a single name.
enum Step<'a> {
    Granted,
    Denied,
    Parents(&'a [String]),
}

/// Access decision and assignment management over a shared hierarchy.
///
/// # Example
///
/// ```rust,no_run
/// use access_rbac::{
///     AccessResolver, Anonymous, Context, HierarchyConfig, HierarchyStore, ItemDefinition,
///     MemoryAssignmentStore,
/// };
/// use std::sync::Arc;
///
/// async fn example() -> access_rbac::RbacResult<()> {
///     let config = HierarchyConfig::new()
///         .role(ItemDefinition::new("admin").with_children(["edit"]))
///         .permission(ItemDefinition::new("edit"));
///     let resolver = AccessResolver::new(
///         Arc::new(HierarchyStore::from_config(&config)?),
///         Arc::new(MemoryAssignmentStore::new()),
///         Arc::new(Anonymous),
///     );
///
///     resolver.assign("u1", "admin", None).await?;
///     assert!(resolver.can(Some("u1"), "edit", &Context::new()).await?);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct AccessResolver {
    hierarchy: Arc<HierarchyStore>,
    assignments: Arc<dyn AssignmentStore>,
    caller: Arc<dyn CallerProvider>,
}

impl fmt::Debug for AccessResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessResolver")
            .field("items", &self.hierarchy.len())
            .finish_non_exhaustive()
    }
}

impl AccessResolver {
    /// Create a resolver over a built hierarchy.
    pub fn new(
        hierarchy: Arc<HierarchyStore>,
        assignments: Arc<dyn AssignmentStore>,
        caller: Arc<dyn CallerProvider>,
    ) -> Self {
        Self {
            hierarchy,
            assignments,
            caller,
        }
    }

    /// The hierarchy this resolver decides over.
    pub fn hierarchy(&self) -> &HierarchyStore {
        &self.hierarchy
    }

    /// Check if `subject` holds `permission` in `context`.
    ///
    /// Unknown names are a deny, not an error. Errors come only from the
    /// assignment store or from a failing rule, and abort the check.
    pub async fn can(
        &self,
        subject: Option<&str>,
        permission: &str,
        context: &Context,
    ) -> RbacResult<bool> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut pending: Vec<&str> = vec![permission];

        while let Some(name) = pending.pop() {
            if !visited.insert(name) {
                continue;
            }
            match self.check(subject, name, context).await? {
                Step::Granted => {
                    tracing::debug!(subject = ?subject, permission, via = name, "Access granted");
                    return Ok(true);
                }
                Step::Denied => {}
                Step::Parents(parents) => {
                    pending.extend(parents.iter().rev().map(String::as_str));
                }
            }
        }

        tracing::debug!(subject = ?subject, permission, "Access denied");
        Ok(false)
    }

    /// Decide a single name without following parents.
    async fn check<'a>(
        &'a self,
        subject: Option<&str>,
        name: &str,
        context: &Context,
    ) -> RbacResult<Step<'a>> {
        match name {
            ANYONE => return Ok(Step::Granted),
            GUEST => return Ok(decided(!self.caller.is_current(subject))),
            AUTHENTICATED => return Ok(decided(self.caller.is_current(subject))),
            _ => {}
        }

        if let Some(subject) = subject {
            if self.assignments.exists(subject, name).await? {
                return Ok(Step::Granted);
            }
        }

        let Some(item) = self.hierarchy.get(name) else {
            return Ok(Step::Denied);
        };

        if let Some(rule) = item.rule() {
            return match rule.evaluate(subject, name, context).await {
                Ok(granted) => Ok(decided(granted)),
                Err(e) => {
                    tracing::warn!(item = %item.name, permission = name, error = %e, "Rule evaluation failed");
                    Err(e)
                }
            };
        }

        Ok(Step::Parents(&item.parents))
    }

    /// Assign an item to a subject.
    ///
    /// Idempotent: assigning an existing pair succeeds without creating a
    /// second record. Any other store failure is returned.
    pub async fn assign(&self, subject: &str, item: &str, creator: Option<&str>) -> RbacResult<bool> {
        let mut assignment = Assignment::new(subject, item);
        if let Some(creator) = creator {
            assignment = assignment.with_creator(creator);
        }

        match self.assignments.insert(assignment).await {
            Ok(()) => {
                tracing::debug!(subject, item, creator = ?creator, "Assigned item");
                Ok(true)
            }
            Err(StoreError::Conflict(_)) => {
                tracing::debug!(subject, item, "Item already assigned");
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Revoke an item from a subject.
    ///
    /// [`ALL_ITEMS`] removes every assignment of the subject. Revoking an
    /// absent assignment succeeds.
    pub async fn revoke(&self, subject: &str, item: &str) -> RbacResult<bool> {
        if item == ALL_ITEMS {
            let removed = self.assignments.delete_all(subject).await?;
            tracing::debug!(subject, removed, "Revoked all items");
            return Ok(true);
        }

        let removed = self.assignments.delete(subject, item).await?;
        tracing::debug!(subject, item, removed, "Revoked item");
        Ok(true)
    }

    /// Direct assignments of a subject, ordered by item name.
    pub async fn assignments(&self, subject: &str) -> RbacResult<Vec<Assignment>> {
        Ok(self.assignments.list(subject).await?)
    }

    /// Remove every assignment of every subject. Returns the number removed.
    pub async fn revoke_everyone(&self) -> RbacResult<u64> {
        let removed = self.assignments.clear().await?;
        tracing::info!(removed, "Removed all assignments");
        Ok(removed)
    }

    /// Find an item by exact or wildcard name.
    pub fn get_item(&self, name: &str) -> Option<&AccessItem> {
        self.hierarchy.get(name)
    }

    /// All items, in hierarchy order.
    pub fn get_items(&self) -> &[AccessItem] {
        self.hierarchy.all()
    }

    /// Names of the assignable role items.
    pub fn get_role_names(&self) -> Vec<String> {
        self.hierarchy.role_names()
    }
}

fn decided<'a>(granted: bool) -> Step<'a> {
    if granted {
        Step::Granted
    } else {
        Step::Denied
    }
}
