//! Shared utilities for interception tests.

use std::sync::Arc;
use std::time::Duration;

use auto_log::sink::{CapturedRecord, Level, RecordKind};
use auto_log::{AutoLogAspect, RecordingSink};

/// Aspect over every component, recording into the returned sink.
pub fn recording_aspect() -> (Arc<RecordingSink>, Arc<AutoLogAspect>) {
    recording_aspect_within(Vec::<String>::new())
}

/// Aspect limited to `base_paths`, recording into the returned sink.
pub fn recording_aspect_within<I, S>(base_paths: I) -> (Arc<RecordingSink>, Arc<AutoLogAspect>)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let sink = Arc::new(RecordingSink::new());
    let aspect = AutoLogAspect::builder()
        .sink(sink.clone())
        .base_paths(base_paths)
        .build();
    (sink, Arc::new(aspect))
}

/// Record kinds in emission order.
#[allow(dead_code)]
pub fn kinds(records: &[CapturedRecord]) -> Vec<(Level, RecordKind)> {
    records.iter().map(|r| (r.level, r.kind)).collect()
}

/// Parse the `N` out of a `... Nms.` cost message.
#[allow(dead_code)]
pub fn cost_millis(message: &str) -> u64 {
    let digits = message
        .rsplit(' ')
        .next()
        .and_then(|tail| tail.strip_suffix("ms."))
        .unwrap_or_else(|| panic!("not a cost message: {message}"));
    digits.parse().unwrap()
}

/// Sleep on the current thread long enough to register on a millisecond clock.
#[allow(dead_code)]
pub fn busy(millis: u64) {
    std::thread::sleep(Duration::from_millis(millis));
}
