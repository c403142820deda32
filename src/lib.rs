//! Declarative method entry/exit logging.
//!
//! Mark a method with `#[auto_log]` and, once an [`AutoLogAspect`] is
//! enabled, every call emits records for its arguments, result, elapsed time,
//! slow calls and failures, without the body mentioning logging.
//!
//! ```rust,ignore
//! use auto_log::component;
//!
//! pub struct Calculator;
//!
//! #[component]
//! impl Calculator {
//!     #[auto_log(slow_threshold_mills = 100)]
//!     pub fn add(&self, a: i32, b: i32) -> i32 {
//!         a + b
//!     }
//! }
//!
//! auto_log::aspect::enable(std::sync::Arc::new(auto_log::AutoLogAspect::new(
//!     std::sync::Arc::new(auto_log::TracingSink),
//! )));
//! Calculator.add(2, 3);
//! // add param is [2, 3].
//! // add result is 5.
//! // add cost time is 0ms.
//! ```

pub mod annotation;
pub mod aspect;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod join_point;
pub mod lifecycle;
pub mod observability;
pub mod pointcut;
pub mod sink;

pub use annotation::AutoLog;
pub use aspect::{with_aspect, AutoLogAspect};
pub use auto_log_macros::{auto_log, component};
pub use error::{AutoLogError, MethodNotFound};
pub use join_point::{Component, JoinPoint, MethodDescriptor, MethodSignature, ModuleComponent};
pub use lifecycle::startup::bootstrap;
pub use sink::{LogSink, RecordingSink, TracingSink};

/// Support code for macro expansions. Not public API.
#[doc(hidden)]
pub mod __private {
    use std::fmt;
    use std::future::Future;

    use crate::aspect::AutoLogAspect;
    use crate::interceptor::Invocation;
    use crate::join_point::{Component, MethodSignature};

    pub use crate::aspect::current;
    pub use crate::join_point::Args;

    /// Start an invocation if an aspect is installed and selects the method.
    ///
    /// # Panics
    /// If `signature` is missing from `target`'s method table. Generated
    /// methods cannot report this through their own return type.
    pub fn enter<'a>(
        aspect: Option<&'a AutoLogAspect>,
        target: &dyn Component,
        signature: &MethodSignature,
    ) -> Option<Invocation<'a>> {
        match aspect?.begin(target, signature) {
            Ok(invocation) => invocation,
            Err(err) => panic!("failed to resolve intercepted method: {}", err),
        }
    }

    pub fn finish<R, F>(invocation: Option<Invocation<'_>>, body: F) -> R
    where
        R: fmt::Debug,
        F: FnOnce() -> R,
    {
        match invocation {
            Some(invocation) => invocation.complete(body),
            None => body(),
        }
    }

    pub fn finish_fallible<T, E, F>(invocation: Option<Invocation<'_>>, body: F) -> Result<T, E>
    where
        T: fmt::Debug,
        E: fmt::Debug,
        F: FnOnce() -> Result<T, E>,
    {
        match invocation {
            Some(invocation) => invocation.complete_fallible(body),
            None => body(),
        }
    }

    pub async fn finish_async<R, Fut>(invocation: Option<Invocation<'_>>, body: Fut) -> R
    where
        R: fmt::Debug,
        Fut: Future<Output = R>,
    {
        match invocation {
            Some(invocation) => invocation.complete_async(body).await,
            None => body.await,
        }
    }

    pub async fn finish_fallible_async<T, E, Fut>(invocation: Option<Invocation<'_>>, body: Fut) -> Result<T, E>
    where
        T: fmt::Debug,
        E: fmt::Debug,
        Fut: Future<Output = Result<T, E>>,
    {
        match invocation {
            Some(invocation) => invocation.complete_fallible_async(body).await,
            None => body.await,
        }
    }
}
