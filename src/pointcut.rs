//! Pointcut selection.
//!
//! # Responsibilities
//! - Select methods carrying `#[auto_log]` (annotation-driven, never by
//!   signature or name)
//! - Restrict selection to the component paths interception was enabled for
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Scope matching is on whole path segments: `shop` selects `shop::Cart`
//!   but not `shopping::Cart`
//! - Empty scope = every component (wildcard)
//! - Unannotated methods are never rewritten, so they never reach a pointcut

use crate::join_point::MethodDescriptor;

/// Predicate selecting which invocations are intercepted.
pub trait Pointcut: Send + Sync + std::fmt::Debug {
    /// Returns true if calls to `method` on the component at `component_path` are selected.
    fn matches(&self, component_path: &str, method: &MethodDescriptor) -> bool;
}

/// Matches methods that carry an `AutoLog` annotation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationPointcut;

impl Pointcut for AnnotationPointcut {
    fn matches(&self, _component_path: &str, method: &MethodDescriptor) -> bool {
        method.auto_log.is_some()
    }
}

/// Matches components under any of the enabled base paths.
#[derive(Debug, Clone, Default)]
pub struct ScopePointcut {
    base_paths: Vec<String>,
}

impl ScopePointcut {
    pub fn new<I, S>(base_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            base_paths: base_paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn base_paths(&self) -> &[String] {
        &self.base_paths
    }

    fn covers(&self, component_path: &str) -> bool {
        self.base_paths.is_empty()
            || self.base_paths.iter().any(|base| {
                component_path
                    .strip_prefix(base.as_str())
                    .map(|rest| rest.is_empty() || rest.starts_with("::"))
                    .unwrap_or(false)
            })
    }
}

impl Pointcut for ScopePointcut {
    fn matches(&self, component_path: &str, _method: &MethodDescriptor) -> bool {
        self.covers(component_path)
    }
}

/// Combines multiple pointcuts with AND semantics.
#[derive(Debug)]
pub struct AllOf {
    pointcuts: Vec<Box<dyn Pointcut>>,
}

impl AllOf {
    pub fn new(pointcuts: Vec<Box<dyn Pointcut>>) -> Self {
        Self { pointcuts }
    }

    /// Annotated methods within `scope`.
    pub fn annotated_within(scope: ScopePointcut) -> Self {
        Self::new(vec![Box::new(AnnotationPointcut), Box::new(scope)])
    }
}

impl Pointcut for AllOf {
    fn matches(&self, component_path: &str, method: &MethodDescriptor) -> bool {
        self.pointcuts.iter().all(|p| p.matches(component_path, method))
    }
}
