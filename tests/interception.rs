//! End-to-end interception of `#[auto_log]` methods and free functions.

use std::num::ParseIntError;
use std::panic::{self, AssertUnwindSafe};

use auto_log::sink::{Level, RecordKind};
use auto_log::{auto_log, component, with_aspect, Component};

mod common;

#[derive(Debug, PartialEq)]
struct E(&'static str);

struct Calculator;

#[component]
impl Calculator {
    #[auto_log]
    fn add(&self, a: i32, b: i32) -> i32 {
        a + b
    }

    #[auto_log(param = false, result = false, costTime = false, slowThresholdMills = -1)]
    fn noop(&self) {}

    #[auto_log(slow_threshold_mills = 0)]
    fn fast(&self) -> &'static str {
        common::busy(1);
        "ok"
    }

    #[auto_log(slow_threshold_mills = 100)]
    fn quick(&self) -> u32 {
        7
    }

    #[auto_log(cost_time = false, slow_threshold_mills = 0)]
    fn slow_only(&self) -> u8 {
        common::busy(2);
        1
    }

    #[auto_log(cost_time = false, slow_threshold_mills = 60_000)]
    fn fast_only(&self) -> u8 {
        1
    }

    #[auto_log]
    fn boom(&self) -> Result<(), E> {
        Err(E("x"))
    }

    #[auto_log(exception = false)]
    fn quiet_boom(&self) -> Result<(), E> {
        Err(E("x"))
    }

    #[auto_log(cost_time = false)]
    fn parse(&self, text: &str) -> Result<i32, ParseIntError> {
        let n: i32 = text.trim().parse()?;
        Ok(n * 2)
    }

    #[auto_log(cost_time = false)]
    fn explode(&self, reason: &'static str) -> u8 {
        panic!("{}", reason)
    }

    fn reset(&self) -> i32 {
        0
    }
}

struct Counter {
    hits: u32,
}

#[component]
impl Counter {
    #[auto_log(result = false, cost_time = false)]
    fn bump(&mut self, by: u32) -> u32 {
        self.hits += by;
        self.hits
    }
}

#[auto_log(cost_time = false)]
fn double(x: u64) -> u64 {
    x * 2
}

mod billing {
    use auto_log::component;

    pub struct Ledger;

    #[component]
    impl Ledger {
        #[auto_log(cost_time = false)]
        pub fn total(&self) -> u32 {
            3
        }
    }
}

#[test]
fn test_defaults_log_param_result_and_cost() {
    let (sink, aspect) = common::recording_aspect();

    let sum = with_aspect(&aspect, || Calculator.add(2, 3));
    assert_eq!(sum, 5);

    let messages = sink.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0], (Level::Info, "add param is [2, 3].".to_string()));
    assert_eq!(messages[1], (Level::Info, "add result is 5.".to_string()));
    assert_eq!(messages[2].0, Level::Info);
    assert!(messages[2].1.starts_with("add cost time is "));
    common::cost_millis(&messages[2].1);
}

#[test]
fn test_everything_off_emits_nothing() {
    let (sink, aspect) = common::recording_aspect();

    with_aspect(&aspect, || Calculator.noop());

    assert!(sink.records().is_empty());
}

#[test]
fn test_zero_threshold_always_warns() {
    let (sink, aspect) = common::recording_aspect();

    let value = with_aspect(&aspect, || Calculator.fast());
    assert_eq!(value, "ok");

    let records = sink.records();
    assert_eq!(
        common::kinds(&records),
        vec![
            (Level::Info, RecordKind::Param),
            (Level::Info, RecordKind::Result),
            (Level::Info, RecordKind::CostTime),
            (Level::Warn, RecordKind::SlowCall),
        ]
    );
    assert_eq!(records[0].message, "fast param is [].");
    assert_eq!(records[1].message, "fast result is \"ok\".");

    let cost = common::cost_millis(&records[2].message);
    assert!(cost >= 1);
    assert_eq!(records[3].message, format!("fast is slow log, {cost}ms >= 0ms."));
}

#[test]
fn test_below_threshold_does_not_warn() {
    let (sink, aspect) = common::recording_aspect();

    assert_eq!(with_aspect(&aspect, || Calculator.quick()), 7);

    let records = sink.records();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.level == Level::Info));
    assert!(records.iter().all(|r| r.kind != RecordKind::SlowCall));
}

#[test]
fn test_slow_record_without_cost_record() {
    let (sink, aspect) = common::recording_aspect();

    assert_eq!(with_aspect(&aspect, || Calculator.slow_only()), 1);

    let records = sink.records();
    assert_eq!(
        common::kinds(&records),
        vec![
            (Level::Info, RecordKind::Param),
            (Level::Info, RecordKind::Result),
            (Level::Warn, RecordKind::SlowCall),
        ]
    );
    assert_eq!(records[1].message, "slow_only result is 1.");

    let elapsed: u64 = records[2]
        .message
        .strip_prefix("slow_only is slow log, ")
        .and_then(|rest| rest.strip_suffix("ms >= 0ms."))
        .unwrap()
        .parse()
        .unwrap();
    assert!(elapsed >= 2);
}

#[test]
fn test_under_threshold_without_cost_record() {
    let (sink, aspect) = common::recording_aspect();

    assert_eq!(with_aspect(&aspect, || Calculator.fast_only()), 1);

    assert_eq!(
        sink.messages(),
        vec![
            (Level::Info, "fast_only param is [].".to_string()),
            (Level::Info, "fast_only result is 1.".to_string()),
        ]
    );
}

#[test]
fn test_err_is_logged_and_returned() {
    let (sink, aspect) = common::recording_aspect();

    let outcome = with_aspect(&aspect, || Calculator.boom());
    assert_eq!(outcome, Err(E("x")));

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].message, "boom param is [].");
    assert_eq!(records[1].level, Level::Error);
    assert_eq!(records[1].message, "boom meet ex.");
    assert_eq!(records[1].cause.as_deref(), Some("E(\"x\")"));
}

#[test]
fn test_err_without_exception_logging() {
    let (sink, aspect) = common::recording_aspect();

    let outcome = with_aspect(&aspect, || Calculator.quiet_boom());
    assert_eq!(outcome, Err(E("x")));

    assert_eq!(
        sink.messages(),
        vec![(Level::Info, "quiet_boom param is [].".to_string())]
    );
}

#[test]
fn test_question_mark_inside_body() {
    let (sink, aspect) = common::recording_aspect();

    assert_eq!(with_aspect(&aspect, || Calculator.parse(" 21 ")), Ok(42));
    assert!(with_aspect(&aspect, || Calculator.parse("nope")).is_err());

    let records = sink.records();
    assert_eq!(
        common::kinds(&records),
        vec![
            (Level::Info, RecordKind::Param),
            (Level::Info, RecordKind::Result),
            (Level::Info, RecordKind::Param),
            (Level::Error, RecordKind::Exception),
        ]
    );
    assert_eq!(records[0].message, "parse param is [\" 21 \"].");
    assert_eq!(records[1].message, "parse result is 42.");
    assert_eq!(records[2].message, "parse param is [\"nope\"].");
    assert!(records[3].cause.as_deref().unwrap().contains("InvalidDigit"));
}

#[test]
fn test_panic_is_logged_and_resumed() {
    let (sink, aspect) = common::recording_aspect();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        with_aspect(&aspect, || Calculator.explode("kaboom"))
    }));

    let payload = result.unwrap_err();
    assert_eq!(payload.downcast_ref::<String>().map(String::as_str), Some("kaboom"));

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].message, "explode param is [\"kaboom\"].");
    assert_eq!(records[1].message, "explode meet ex.");
    assert_eq!(records[1].cause.as_deref(), Some("Panic(\"kaboom\")"));

    // the scoped aspect was restored while unwinding
    assert!(auto_log::aspect::current().is_none());
}

#[test]
fn test_mutating_method() {
    let (sink, aspect) = common::recording_aspect();
    let mut counter = Counter { hits: 1 };

    let hits = with_aspect(&aspect, || counter.bump(4));
    assert_eq!(hits, 5);
    assert_eq!(counter.hits, 5);

    assert_eq!(
        sink.messages(),
        vec![(Level::Info, "bump param is [4].".to_string())]
    );
}

#[test]
fn test_free_function() {
    let (sink, aspect) = common::recording_aspect();

    assert_eq!(with_aspect(&aspect, || double(21)), 42);

    assert_eq!(
        sink.messages(),
        vec![
            (Level::Info, "double param is [21].".to_string()),
            (Level::Info, "double result is 42.".to_string()),
        ]
    );
}

#[test]
fn test_unannotated_method_is_untouched() {
    let (sink, aspect) = common::recording_aspect();

    assert_eq!(with_aspect(&aspect, || Calculator.reset()), 0);
    assert!(sink.records().is_empty());
}

#[test]
fn test_method_table_lists_every_method() {
    let table = Calculator.method_table();
    let names: Vec<_> = table.iter().map(|m| m.signature.name).collect();
    assert_eq!(
        names,
        vec![
            "add",
            "noop",
            "fast",
            "quick",
            "slow_only",
            "fast_only",
            "boom",
            "quiet_boom",
            "parse",
            "explode",
            "reset",
        ]
    );

    let add = &table[0];
    assert_eq!(add.signature.parameter_types, &["i32", "i32"]);
    assert_eq!(add.auto_log, Some(auto_log::AutoLog::DEFAULT));
    assert!(table[10].auto_log.is_none());

    assert_eq!(Calculator.component_path(), "interception::Calculator");
    assert_eq!(billing::Ledger.component_path(), "interception::billing::Ledger");
}

#[test]
fn test_scope_limits_interception() {
    let (sink, aspect) = common::recording_aspect_within(["interception::billing"]);

    let (sum, total) = with_aspect(&aspect, || (Calculator.add(1, 1), billing::Ledger.total()));
    assert_eq!((sum, total), (2, 3));

    assert_eq!(
        sink.messages(),
        vec![
            (Level::Info, "total param is [].".to_string()),
            (Level::Info, "total result is 3.".to_string()),
        ]
    );
}

#[test]
fn test_no_aspect_means_no_interception() {
    let (sink, aspect) = common::recording_aspect();

    assert_eq!(Calculator.add(2, 3), 5);

    aspect.set_enabled(false);
    assert_eq!(with_aspect(&aspect, || Calculator.add(2, 3)), 5);

    assert!(sink.records().is_empty());
}

#[test]
fn test_result_never_altered_by_logging() {
    let (sink, aspect) = common::recording_aspect();

    let direct = Calculator.parse("8");
    let intercepted = with_aspect(&aspect, || Calculator.parse("8"));
    assert_eq!(direct, intercepted);
    assert_eq!(sink.records().len(), 2);
}
