//! Rule capabilities for context-sensitive items
//!
//! A rule replaces the parent walk for the item it is attached to: when the
//! resolver reaches an item carrying a rule, the rule's answer is the
//! decision for that item.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::error::RbacResult;

/// Request context passed to rules, e.g. `{"dept": 123}`.
pub type Context = HashMap<String, Value>;

/// Predicate evaluated for rule-bearing items.
///
/// Implementations may perform I/O. Returning an error aborts the whole
/// `can` call; it is not treated as a deny.
#[async_trait]
pub trait Rule: Send + Sync {
    /// Decide whether `subject` holds `permission` in `context`.
    ///
    /// `permission` is the name being checked, which differs from the item
    /// name when the item is a wildcard such as `dept/*`.
    async fn evaluate(
        &self,
        subject: Option<&str>,
        permission: &str,
        context: &Context,
    ) -> RbacResult<bool>;
}

/// Adapter turning a synchronous closure into a [`Rule`].
///
/// # Example
///
/// ```
/// use access_rbac::rule::FnRule;
///
/// let rule = FnRule::new(|subject, _permission, _context| subject == Some("root"));
/// ```
pub struct FnRule<F> {
    f: F,
}

impl<F> FnRule<F> {
    /// Wrap a closure.
    pub fn new(f: F) -> Self
    where
        F: Fn(Option<&str>, &str, &Context) -> bool + Send + Sync,
    {
        Self { f }
    }
}

impl<F> fmt::Debug for FnRule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> Rule for FnRule<F>
where
    F: Fn(Option<&str>, &str, &Context) -> bool + Send + Sync,
{
    async fn evaluate(
        &self,
        subject: Option<&str>,
        permission: &str,
        context: &Context,
    ) -> RbacResult<bool> {
        Ok((self.f)(subject, permission, context))
    }
}

/// Grants when a context key equals an expected value.
#[derive(Debug, Clone)]
pub struct ContextEquals {
    key: String,
    expected: Value,
}

impl ContextEquals {
    /// Create a rule matching `context[key] == expected`.
    pub fn new(key: impl Into<String>, expected: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            expected: expected.into(),
        }
    }
}

#[async_trait]
impl Rule for ContextEquals {
    async fn evaluate(
        &self,
        _subject: Option<&str>,
        _permission: &str,
        context: &Context,
    ) -> RbacResult<bool> {
        Ok(context.get(&self.key) == Some(&self.expected))
    }
}
