//! Per-parse error context with scoped reset.

use std::fmt;
use std::ops::{Deref, DerefMut};

/// Where a parse currently is: resource, activity and the object being built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    resource: Option<String>,
    activity: Option<String>,
    object: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a parse of `resource`; the context is reset when the
    /// returned scope is dropped, whether the parse succeeded or not.
    pub fn scope(&mut self, resource: &str) -> ErrorContextScope<'_> {
        self.reset();
        self.resource = Some(resource.to_string());
        ErrorContextScope { context: self }
    }

    pub fn activity(&mut self, activity: impl Into<String>) -> &mut Self {
        self.activity = Some(activity.into());
        self
    }

    pub fn object(&mut self, object: impl Into<String>) -> &mut Self {
        self.object = Some(object.into());
        self
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    pub fn current_activity(&self) -> Option<&str> {
        self.activity.as_deref()
    }

    pub fn current_object(&self) -> Option<&str> {
        self.object.as_deref()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.resource.is_none() && self.activity.is_none() && self.object.is_none()
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("no context");
        }
        let mut parts = Vec::new();
        if let Some(resource) = &self.resource {
            parts.push(format!("resource: {}", resource));
        }
        if let Some(activity) = &self.activity {
            parts.push(format!("while {}", activity));
        }
        if let Some(object) = &self.object {
            parts.push(format!("object: {}", object));
        }
        f.write_str(&parts.join(", "))
    }
}

/// Borrow of an [`ErrorContext`] that resets it on drop.
pub struct ErrorContextScope<'a> {
    context: &'a mut ErrorContext,
}

impl Deref for ErrorContextScope<'_> {
    type Target = ErrorContext;

    fn deref(&self) -> &ErrorContext {
        self.context
    }
}

impl DerefMut for ErrorContextScope<'_> {
    fn deref_mut(&mut self) -> &mut ErrorContext {
        self.context
    }
}

impl Drop for ErrorContextScope<'_> {
    fn drop(&mut self) {
        self.context.reset();
    }
}
