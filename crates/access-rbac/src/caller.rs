//! Current-caller capability
//!
//! The `!` and `@` pseudo-permissions compare the checked subject with the
//! currently authenticated caller. The host application supplies that
//! lookup; the resolver never reads process-wide state.

/// Answers "who is the currently authenticated caller, if any".
pub trait CallerProvider: Send + Sync {
    /// Identifier of the authenticated caller, `None` when anonymous.
    fn current_caller(&self) -> Option<String>;

    /// Check if `subject` is the authenticated caller.
    ///
    /// An anonymous caller never matches, not even an anonymous subject.
    fn is_current(&self, subject: Option<&str>) -> bool {
        match (self.current_caller(), subject) {
            (Some(caller), Some(subject)) => caller == subject,
            _ => false,
        }
    }
}

/// Provider for contexts with no authenticated caller (CLI, batch jobs).
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl CallerProvider for Anonymous {
    fn current_caller(&self) -> Option<String> {
        None
    }
}

/// Provider returning a fixed caller, e.g. one resolved per request.
#[derive(Debug, Clone, Default)]
pub struct FixedCaller(Option<String>);

impl FixedCaller {
    /// Caller authenticated as `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self(Some(id.into()))
    }

    /// Caller that is not authenticated.
    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl CallerProvider for FixedCaller {
    fn current_caller(&self) -> Option<String> {
        self.0.clone()
    }
}
