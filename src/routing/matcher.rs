//! Route matching logic.
//!
//! # Responsibilities
//! - Match request method (exact string)
//! - Match request pathname (exact string)
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Both comparisons are case-sensitive and exact
//! - No wildcards, no trailing-slash normalization
//! - No regex to guarantee O(n) matching

/// The parts of a request a route can be matched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTarget<'a> {
    pub method: &'a str,
    pub path: &'a str,
}

impl<'a> RequestTarget<'a> {
    pub fn new(method: &'a str, path: &'a str) -> Self {
        Self { method, path }
    }
}

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, target: &RequestTarget<'_>) -> bool;
}

/// Matches the HTTP method.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    method: String,
}

impl MethodMatcher {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
        }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, target: &RequestTarget<'_>) -> bool {
        target.method == self.method
    }
}

/// Matches the request pathname.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pathname: String,
}

impl PathMatcher {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
        }
    }
}

impl Matcher for PathMatcher {
    fn matches(&self, target: &RequestTarget<'_>) -> bool {
        target.path == self.pathname
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, target: &RequestTarget<'_>) -> bool {
        self.matchers.iter().all(|m| m.matches(target))
    }
}
