//! Aspect enablement.
//!
//! # Responsibilities
//! - Bundle pointcut, interceptor and sink into one installable aspect
//! - Install it process-wide (`enable`) or for one thread (`with_aspect`)
//! - Apply config reloads to a running aspect
//!
//! # Design Decisions
//! - Before any aspect is installed, annotated methods run their bodies
//!   directly and emit nothing
//! - A thread-scoped aspect shadows the global one, the way a scoped
//!   `tracing` dispatcher shadows the global default
//! - The pointcut lives in an `ArcSwap`: reloads never block callers

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use tokio::sync::mpsc;

use crate::annotation::AutoLog;
use crate::config::schema::{AspectConfig, AutoLogConfig};
use crate::error::{AutoLogError, MethodNotFound};
use crate::interceptor::{AutoLogInterceptor, Invocation};
use crate::join_point::{Component, JoinPoint, MethodDescriptor, MethodSignature};
use crate::pointcut::{AllOf, Pointcut, ScopePointcut};
use crate::sink::{LogSink, TracingSink};

static GLOBAL: ArcSwapOption<AutoLogAspect> = ArcSwapOption::const_empty();

thread_local! {
    static SCOPED: RefCell<Option<Arc<AutoLogAspect>>> = const { RefCell::new(None) };
}

/// Pointcut + interceptor, ready to be enabled.
pub struct AutoLogAspect {
    enabled: AtomicBool,
    pointcut: ArcSwap<AllOf>,
    interceptor: AutoLogInterceptor,
}

impl AutoLogAspect {
    /// Aspect intercepting every annotated method, logging to `sink`.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self::builder().sink(sink).build()
    }

    pub fn builder() -> AutoLogAspectBuilder {
        AutoLogAspectBuilder::default()
    }

    /// Aspect configured from the `[aspect]` config section.
    pub fn from_config(config: &AspectConfig, sink: Arc<dyn LogSink>) -> Self {
        Self::builder()
            .sink(sink)
            .enabled(config.enabled)
            .base_paths(config.base_paths.iter().cloned())
            .metrics(config.metrics_enabled)
            .build()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn interceptor(&self) -> &AutoLogInterceptor {
        &self.interceptor
    }

    /// Returns true if calls to `method` on `component_path` are intercepted.
    pub fn selects(&self, component_path: &str, method: &MethodDescriptor) -> bool {
        self.is_enabled() && self.pointcut.load().matches(component_path, method)
    }

    /// Swap in a new scope and switches from a reloaded config.
    pub fn reconfigure(&self, config: &AspectConfig) {
        self.set_enabled(config.enabled);
        self.interceptor.set_metrics(config.metrics_enabled);
        self.pointcut.store(Arc::new(AllOf::annotated_within(ScopePointcut::new(
            config.base_paths.iter().cloned(),
        ))));

        tracing::info!(
            enabled = config.enabled,
            base_paths = ?config.base_paths,
            metrics_enabled = config.metrics_enabled,
            "Auto-log aspect reconfigured"
        );
    }

    /// Apply configs from a [`ConfigWatcher`](crate::config::watcher::ConfigWatcher)
    /// until the channel closes.
    pub async fn follow(self: Arc<Self>, mut updates: mpsc::UnboundedReceiver<AutoLogConfig>) {
        while let Some(config) = updates.recv().await {
            self.reconfigure(&config.aspect);
        }
        tracing::debug!("Config update channel closed");
    }

    /// Resolve `signature` on `target` and start an invocation if selected.
    ///
    /// `Ok(None)` means the call proceeds without interception.
    pub fn begin(
        &self,
        target: &dyn Component,
        signature: &MethodSignature,
    ) -> Result<Option<Invocation<'_>>, MethodNotFound> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let method = target.resolve(signature)?;
        if !self.pointcut.load().matches(target.component_path(), method) {
            return Ok(None);
        }

        Ok(method
            .auto_log
            .map(|options| self.interceptor.begin(method.signature.name, options)))
    }

    /// Run an infallible join point through the aspect.
    pub fn intercept<F, R>(&self, join_point: JoinPoint<'_, F>) -> Result<R, AutoLogError>
    where
        F: FnOnce() -> R,
        R: fmt::Debug,
    {
        match self.selected(&join_point)? {
            Some((method, options)) => Ok(self.interceptor.around_resolved(method, join_point, &options)),
            None => Ok(join_point.proceed()),
        }
    }

    /// Run a `Result`-returning join point through the aspect.
    pub fn intercept_fallible<F, T, E>(&self, join_point: JoinPoint<'_, F>) -> Result<Result<T, E>, AutoLogError>
    where
        F: FnOnce() -> Result<T, E>,
        T: fmt::Debug,
        E: fmt::Debug,
    {
        match self.selected(&join_point)? {
            Some((method, options)) => Ok(self
                .interceptor
                .around_fallible_resolved(method, join_point, &options)),
            None => Ok(join_point.proceed()),
        }
    }

    fn selected<F>(
        &self,
        join_point: &JoinPoint<'_, F>,
    ) -> Result<Option<(&'static MethodDescriptor, AutoLog)>, MethodNotFound> {
        if !self.is_enabled() {
            return Ok(None);
        }
        let target = join_point.target();
        let method = target.resolve(join_point.signature())?;
        if !self.pointcut.load().matches(target.component_path(), method) {
            return Ok(None);
        }
        Ok(method.auto_log.map(|options| (method, options)))
    }
}

impl fmt::Debug for AutoLogAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoLogAspect")
            .field("enabled", &self.is_enabled())
            .field("pointcut", &self.pointcut.load_full())
            .field("interceptor", &self.interceptor)
            .finish()
    }
}

/// Builder for [`AutoLogAspect`].
pub struct AutoLogAspectBuilder {
    sink: Option<Arc<dyn LogSink>>,
    base_paths: Vec<String>,
    enabled: bool,
    metrics: bool,
}

impl Default for AutoLogAspectBuilder {
    fn default() -> Self {
        Self {
            sink: None,
            base_paths: Vec::new(),
            enabled: true,
            metrics: false,
        }
    }
}

impl AutoLogAspectBuilder {
    /// Defaults to [`TracingSink`].
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Restrict interception to components under these module paths.
    pub fn base_paths<I, S>(mut self, base_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_paths = base_paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn metrics(mut self, enabled: bool) -> Self {
        self.metrics = enabled;
        self
    }

    pub fn build(self) -> AutoLogAspect {
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));
        AutoLogAspect {
            enabled: AtomicBool::new(self.enabled),
            pointcut: ArcSwap::from_pointee(AllOf::annotated_within(ScopePointcut::new(self.base_paths))),
            interceptor: AutoLogInterceptor::new(sink).with_metrics(self.metrics),
        }
    }
}

/// Install `aspect` for the whole process, replacing any previous one.
pub fn enable(aspect: Arc<AutoLogAspect>) {
    tracing::info!(aspect = ?aspect, "Auto-log enabled");
    GLOBAL.store(Some(aspect));
}

/// Remove the process-wide aspect, returning it.
pub fn disable() -> Option<Arc<AutoLogAspect>> {
    let previous = GLOBAL.swap(None);
    if previous.is_some() {
        tracing::info!("Auto-log disabled");
    }
    previous
}

/// The aspect in effect on this thread: the scoped one, else the global one.
pub fn current() -> Option<Arc<AutoLogAspect>> {
    SCOPED
        .with(|scoped| scoped.borrow().clone())
        .or_else(|| GLOBAL.load_full())
}

/// Run `f` with `aspect` installed for the current thread only.
///
/// The previous thread-scoped aspect is restored afterwards, also on unwind.
pub fn with_aspect<R>(aspect: &Arc<AutoLogAspect>, f: impl FnOnce() -> R) -> R {
    let previous = SCOPED.with(|scoped| scoped.replace(Some(aspect.clone())));
    let _restore = RestoreScoped(previous);
    f()
}

struct RestoreScoped(Option<Arc<AutoLogAspect>>);

impl Drop for RestoreScoped {
    fn drop(&mut self) {
        let previous = self.0.take();
        SCOPED.with(|scoped| *scoped.borrow_mut() = previous);
    }
}
