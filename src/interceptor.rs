//! Around interceptor: the logging advice wrapped around each selected call.
//!
//! # Data Flow
//! ```text
//! JoinPoint
//!     → resolve method (name + parameter types) on the target
//!     → Invocation::begin (start instant)
//!     → param record
//!     → proceed (panics caught)
//!         success → result record → cost record → slow record → value
//!         failure → exception record → same Err / same panic payload
//! ```
//!
//! # Design Decisions
//! - Options are copied into the invocation once; nothing is re-read later
//! - The end instant is only read when a cost or slow record may need it
//! - Failures are handed back untouched: `Err(e)` is returned as is and
//!   panics resume with their original payload

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;

use crate::annotation::AutoLog;
use crate::error::AutoLogError;
use crate::join_point::{Args, JoinPoint, MethodDescriptor};
use crate::observability::metrics;
use crate::sink::{LogSink, Record, RecordKind};

/// Emits the configured records around intercepted calls.
pub struct AutoLogInterceptor {
    sink: Arc<dyn LogSink>,
    metrics_enabled: AtomicBool,
}

impl AutoLogInterceptor {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            metrics_enabled: AtomicBool::new(false),
        }
    }

    /// Record invocation counters and durations through `metrics`.
    pub fn with_metrics(self, enabled: bool) -> Self {
        self.set_metrics(enabled);
        self
    }

    pub fn set_metrics(&self, enabled: bool) {
        self.metrics_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    /// Start one invocation of `method`, capturing the start instant.
    pub fn begin(&self, method: &'static str, options: AutoLog) -> Invocation<'_> {
        Invocation {
            method,
            options,
            sink: &*self.sink,
            metrics: self.metrics_enabled.load(Ordering::Relaxed),
            started: Instant::now(),
        }
    }

    /// Wrap an infallible call. Only a panic counts as a failure.
    ///
    /// Returns `Err` only when the join point's signature cannot be resolved
    /// on its target; whatever the body returns is passed through as `Ok`.
    pub fn around<F, R>(&self, join_point: JoinPoint<'_, F>, options: &AutoLog) -> Result<R, AutoLogError>
    where
        F: FnOnce() -> R,
        R: fmt::Debug,
    {
        self.run(join_point, options, |inv, jp| inv.complete(|| jp.proceed()))
    }

    /// Wrap a call returning `Result`; `Err` is the failure and is returned unchanged.
    pub fn around_fallible<F, T, E>(
        &self,
        join_point: JoinPoint<'_, F>,
        options: &AutoLog,
    ) -> Result<Result<T, E>, AutoLogError>
    where
        F: FnOnce() -> Result<T, E>,
        T: fmt::Debug,
        E: fmt::Debug,
    {
        self.run(join_point, options, |inv, jp| inv.complete_fallible(|| jp.proceed()))
    }

    /// [`around`](Self::around) for a method the caller already resolved.
    pub fn around_resolved<F, R>(
        &self,
        method: &MethodDescriptor,
        join_point: JoinPoint<'_, F>,
        options: &AutoLog,
    ) -> R
    where
        F: FnOnce() -> R,
        R: fmt::Debug,
    {
        self.settle(method, join_point, options, |inv, jp| inv.complete(|| jp.proceed()))
    }

    /// [`around_fallible`](Self::around_fallible) for a method the caller already resolved.
    pub fn around_fallible_resolved<F, T, E>(
        &self,
        method: &MethodDescriptor,
        join_point: JoinPoint<'_, F>,
        options: &AutoLog,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        T: fmt::Debug,
        E: fmt::Debug,
    {
        self.settle(method, join_point, options, |inv, jp| inv.complete_fallible(|| jp.proceed()))
    }

    fn run<'j, F, R>(
        &self,
        join_point: JoinPoint<'j, F>,
        options: &AutoLog,
        settle: impl FnOnce(Invocation<'_>, JoinPoint<'j, F>) -> R,
    ) -> Result<R, AutoLogError>
    where
        F: FnOnce() -> R,
    {
        let method = join_point.target().resolve(join_point.signature())?;
        Ok(self.settle(method, join_point, options, settle))
    }

    fn settle<'j, F, R>(
        &self,
        method: &MethodDescriptor,
        join_point: JoinPoint<'j, F>,
        options: &AutoLog,
        settle: impl FnOnce(Invocation<'_>, JoinPoint<'j, F>) -> R,
    ) -> R
    where
        F: FnOnce() -> R,
    {
        let invocation = self.begin(method.signature.name, *options);
        invocation.log_args(join_point.args());
        settle(invocation, join_point)
    }
}

impl fmt::Debug for AutoLogInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoLogInterceptor")
            .field("metrics_enabled", &self.metrics_enabled.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// State of one intercepted call, from start instant to outcome.
pub struct Invocation<'s> {
    method: &'static str,
    options: AutoLog,
    sink: &'s dyn LogSink,
    metrics: bool,
    started: Instant,
}

impl<'s> Invocation<'s> {
    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn options(&self) -> &AutoLog {
        &self.options
    }

    /// Emit the param record if enabled.
    pub fn log_args(&self, args: Args<'_>) {
        if self.options.param {
            self.sink.info(&Record {
                method: self.method,
                kind: RecordKind::Param,
                message: format_args!("{} param is {}.", self.method, args),
            });
        }
    }

    /// Run `body` and log its value as a success; panics are the failure path.
    pub fn complete<R, F>(self, body: F) -> R
    where
        R: fmt::Debug,
        F: FnOnce() -> R,
    {
        self.drive(body, |inv, value| inv.succeed(value))
    }

    /// Run `body`, treating `Err` (and panics) as the failure path.
    pub fn complete_fallible<T, E, F>(self, body: F) -> Result<T, E>
    where
        T: fmt::Debug,
        E: fmt::Debug,
        F: FnOnce() -> Result<T, E>,
    {
        self.drive(body, |inv, outcome| match outcome {
            Ok(value) => inv.succeed(value),
            Err(err) => inv.fail(err),
        })
    }

    /// Async counterpart of [`Invocation::complete`].
    pub async fn complete_async<R, Fut>(self, body: Fut) -> R
    where
        R: fmt::Debug,
        Fut: Future<Output = R>,
    {
        self.drive_async(body, |inv, value| inv.succeed(value)).await
    }

    /// Async counterpart of [`Invocation::complete_fallible`].
    pub async fn complete_fallible_async<T, E, Fut>(self, body: Fut) -> Result<T, E>
    where
        T: fmt::Debug,
        E: fmt::Debug,
        Fut: Future<Output = Result<T, E>>,
    {
        self.drive_async(body, |inv, outcome| match outcome {
            Ok(value) => inv.succeed(value),
            Err(err) => inv.fail(err),
        })
        .await
    }

    fn drive<R>(self, body: impl FnOnce() -> R, settle: impl FnOnce(Self, &R)) -> R {
        match panic::catch_unwind(AssertUnwindSafe(body)) {
            Ok(outcome) => {
                settle(self, &outcome);
                outcome
            }
            Err(payload) => {
                self.fail(&PanicCause(&*payload));
                panic::resume_unwind(payload)
            }
        }
    }

    async fn drive_async<R>(self, body: impl Future<Output = R>, settle: impl FnOnce(Self, &R)) -> R {
        match AssertUnwindSafe(body).catch_unwind().await {
            Ok(outcome) => {
                settle(self, &outcome);
                outcome
            }
            Err(payload) => {
                self.fail(&PanicCause(&*payload));
                panic::resume_unwind(payload)
            }
        }
    }

    /// Emit the result, cost and slow records for a successful call.
    pub fn succeed<T: fmt::Debug + ?Sized>(self, value: &T) {
        let method = self.method;
        let options = self.options;

        if options.result {
            self.sink.info(&Record {
                method,
                kind: RecordKind::Result,
                message: format_args!("{} result is {:?}.", method, value),
            });
        }

        if options.needs_timing() {
            let elapsed = elapsed_millis(self.started);
            if options.cost_time {
                self.sink.info(&Record {
                    method,
                    kind: RecordKind::CostTime,
                    message: format_args!("{} cost time is {}ms.", method, elapsed),
                });
            }
            if options.is_slow(elapsed) {
                self.sink.warn(&Record {
                    method,
                    kind: RecordKind::SlowCall,
                    message: format_args!(
                        "{} is slow log, {}ms >= {}ms.",
                        method, elapsed, options.slow_threshold_mills
                    ),
                });
                if self.metrics {
                    metrics::record_slow_call(method);
                }
            }
            if self.metrics {
                metrics::record_duration(method, elapsed);
            }
        }

        if self.metrics {
            metrics::record_invocation(method, metrics::Outcome::Success);
        }
    }

    /// Emit the exception record for a failed call.
    pub fn fail<E: fmt::Debug + ?Sized>(self, cause: &E) {
        if self.options.exception {
            self.sink.error(
                &Record {
                    method: self.method,
                    kind: RecordKind::Exception,
                    message: format_args!("{} meet ex.", self.method),
                },
                &cause,
            );
        }

        if self.metrics {
            metrics::record_invocation(self.method, metrics::Outcome::Failure);
        }
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("method", &self.method)
            .field("options", &self.options)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

fn elapsed_millis(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Renders a panic payload as the attached cause.
struct PanicCause<'a>(&'a (dyn Any + Send));

impl fmt::Debug for PanicCause<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(msg) = self.0.downcast_ref::<&'static str>() {
            f.debug_tuple("Panic").field(msg).finish()
        } else if let Some(msg) = self.0.downcast_ref::<String>() {
            f.debug_tuple("Panic").field(msg).finish()
        } else {
            f.write_str("Panic(<non-string payload>)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join_point::{MethodSignature, ModuleComponent};
    use crate::sink::{Level, RecordingSink};

    const ADD: MethodSignature = MethodSignature::new("add", &["i32", "i32"]);
    const BOOM: MethodSignature = MethodSignature::new("boom", &[]);
    const TABLE: &[MethodDescriptor] = &[
        MethodDescriptor::annotated(ADD, AutoLog::new()),
        MethodDescriptor::annotated(BOOM, AutoLog::new()),
    ];
    static CALC: ModuleComponent = ModuleComponent::new("calc", TABLE);

    fn interceptor() -> (Arc<RecordingSink>, AutoLogInterceptor) {
        let sink = Arc::new(RecordingSink::new());
        (sink.clone(), AutoLogInterceptor::new(sink))
    }

    #[test]
    fn test_default_options_log_param_result_cost() {
        let (sink, interceptor) = interceptor();
        let (a, b) = (2, 3);
        let args = [&a as &dyn std::fmt::Debug, &b];
        let jp = JoinPoint::new(&CALC, ADD, &args, || a + b);

        let value = interceptor.around(jp, &AutoLog::default()).unwrap();
        assert_eq!(value, 5);

        let messages = sink.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], (Level::Info, "add param is [2, 3].".to_string()));
        assert_eq!(messages[1], (Level::Info, "add result is 5.".to_string()));
        assert_eq!(messages[2].0, Level::Info);
        assert!(messages[2].1.starts_with("add cost time is "));
        assert!(messages[2].1.ends_with("ms."));
    }

    #[test]
    fn test_fallible_error_is_returned_unchanged() {
        let (sink, interceptor) = interceptor();
        let jp = JoinPoint::new(&CALC, BOOM, &[], || Err::<u8, _>(String::from("x")));

        let outcome = interceptor.around_fallible(jp, &AutoLog::default()).unwrap();
        assert_eq!(outcome, Err("x".to_string()));

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "boom param is [].");
        assert_eq!(records[1].level, Level::Error);
        assert_eq!(records[1].message, "boom meet ex.");
        assert_eq!(records[1].cause.as_deref(), Some("\"x\""));
    }

    #[test]
    fn test_unresolvable_signature() {
        let (sink, interceptor) = interceptor();
        let missing = MethodSignature::new("add", &["u8"]);
        let jp = JoinPoint::new(&CALC, missing, &[], || 0);

        let err = interceptor.around(jp, &AutoLog::default()).unwrap_err();
        assert!(matches!(err, AutoLogError::Resolution(ref e) if e.method == "add"));
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_panic_resumes_with_same_payload() {
        let (sink, interceptor) = interceptor();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let jp = JoinPoint::new(&CALC, BOOM, &[], || -> u8 { panic!("kaboom") });
            interceptor.around(jp, &AutoLog::default())
        }));

        let payload = result.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"kaboom"));

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].message, "boom meet ex.");
        assert_eq!(records[1].cause.as_deref(), Some("Panic(\"kaboom\")"));
    }

    #[test]
    fn test_no_timing_when_both_gates_off() {
        let (sink, interceptor) = interceptor();
        let options = AutoLog::new().param(false).cost_time(false);
        let inv = interceptor.begin("quiet", options);
        let value = inv.complete(|| 7);
        assert_eq!(value, 7);
        assert_eq!(sink.messages(), vec![(Level::Info, "quiet result is 7.".to_string())]);
    }

    #[test]
    fn test_exception_disabled_still_fails_through() {
        let (sink, interceptor) = interceptor();
        let inv = interceptor.begin("boom", AutoLog::new().exception(false));
        inv.log_args(Args(&[]));
        let outcome: Result<(), &str> = inv.complete_fallible(|| Err("x"));
        assert_eq!(outcome, Err("x"));
        assert_eq!(sink.messages(), vec![(Level::Info, "boom param is [].".to_string())]);
    }

    #[test]
    fn test_resolved_method_name_is_used() {
        let (sink, interceptor) = interceptor();
        let jp = JoinPoint::new(&CALC, ADD, &[], || 1);
        let value = interceptor.around_resolved(&TABLE[0], jp, &AutoLog::new().cost_time(false));
        assert_eq!(value, 1);
        assert_eq!(
            sink.messages(),
            vec![
                (Level::Info, "add param is [].".to_string()),
                (Level::Info, "add result is 1.".to_string()),
            ]
        );
    }
}
