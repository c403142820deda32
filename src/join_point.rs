//! Method metadata and join points.
//!
//! # Responsibilities
//! - Describe methods (name, declared parameter types, attached options)
//! - Expose a component's method table for resolution at call time
//! - Bundle one concrete invocation: target, signature, arguments, body
//!
//! # Design Decisions
//! - Tables are `&'static` and built by the macros in `const` context
//! - Parameter types are compared as written in the declaration
//! - Arguments are borrowed as `&dyn Debug`; rendering is deferred until a
//!   record actually needs them

use std::fmt;

use crate::annotation::AutoLog;
use crate::error::MethodNotFound;

/// Name and declared parameter types of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub name: &'static str,
    pub parameter_types: &'static [&'static str],
}

impl MethodSignature {
    pub const fn new(name: &'static str, parameter_types: &'static [&'static str]) -> Self {
        Self {
            name,
            parameter_types,
        }
    }
}

/// One entry of a component's method table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub signature: MethodSignature,
    /// Options when the method carries `#[auto_log]`.
    pub auto_log: Option<AutoLog>,
}

impl MethodDescriptor {
    pub const fn new(signature: MethodSignature, auto_log: Option<AutoLog>) -> Self {
        Self {
            signature,
            auto_log,
        }
    }

    pub const fn annotated(signature: MethodSignature, auto_log: AutoLog) -> Self {
        Self::new(signature, Some(auto_log))
    }

    pub const fn plain(signature: MethodSignature) -> Self {
        Self::new(signature, None)
    }
}

/// A type whose methods can be intercepted.
///
/// Implemented by `#[component]` on an inherent impl block.
pub trait Component {
    /// Fully qualified path, e.g. `my_app::service::Calculator`.
    fn component_path(&self) -> &'static str;

    /// Every method declared in the component's `#[component]` impl.
    fn method_table(&self) -> &'static [MethodDescriptor];

    /// Find the descriptor matching `signature` by name and parameter types.
    fn resolve(&self, signature: &MethodSignature) -> Result<&'static MethodDescriptor, MethodNotFound> {
        self.method_table()
            .iter()
            .find(|m| {
                m.signature.name == signature.name
                    && m.signature.parameter_types == signature.parameter_types
            })
            .ok_or(MethodNotFound {
                component: self.component_path(),
                method: signature.name,
                parameter_types: signature.parameter_types,
            })
    }
}

/// Component standing in for the module that declares free functions.
#[derive(Debug)]
pub struct ModuleComponent {
    path: &'static str,
    methods: &'static [MethodDescriptor],
}

impl ModuleComponent {
    pub const fn new(path: &'static str, methods: &'static [MethodDescriptor]) -> Self {
        Self { path, methods }
    }
}

impl Component for ModuleComponent {
    fn component_path(&self) -> &'static str {
        self.path
    }

    fn method_table(&self) -> &'static [MethodDescriptor] {
        self.methods
    }
}

/// Renders an argument sequence as `[a, b, c]` using each element's `Debug`.
#[derive(Clone, Copy)]
pub struct Args<'a>(pub &'a [&'a dyn fmt::Debug]);

impl fmt::Display for Args<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:?}", arg)?;
        }
        f.write_str("]")
    }
}

impl fmt::Debug for Args<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// One concrete invocation waiting to proceed.
pub struct JoinPoint<'a, F> {
    target: &'a dyn Component,
    signature: MethodSignature,
    args: &'a [&'a dyn fmt::Debug],
    proceed: F,
}

impl<'a, F> JoinPoint<'a, F> {
    pub fn new<R>(
        target: &'a dyn Component,
        signature: MethodSignature,
        args: &'a [&'a dyn fmt::Debug],
        proceed: F,
    ) -> Self
    where
        F: FnOnce() -> R,
    {
        Self {
            target,
            signature,
            args,
            proceed,
        }
    }

    pub fn target(&self) -> &'a dyn Component {
        self.target
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    pub fn args(&self) -> Args<'a> {
        Args(self.args)
    }

    /// Run the real method.
    pub fn proceed<R>(self) -> R
    where
        F: FnOnce() -> R,
    {
        (self.proceed)()
    }
}

impl<F> fmt::Debug for JoinPoint<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinPoint")
            .field("target", &self.target.component_path())
            .field("signature", &self.signature)
            .field("args", &Args(self.args))
            .finish_non_exhaustive()
    }
}
