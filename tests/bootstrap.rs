//! Process-wide startup from a config file.

use std::io::Write;

use auto_log::{auto_log, bootstrap, AutoLogError};

#[auto_log(slow_threshold_mills = 50)]
fn square(x: i64) -> i64 {
    x * x
}

#[test]
fn test_bootstrap_enables_global_aspect() {
    let mut bad = tempfile::NamedTempFile::new().unwrap();
    writeln!(bad, "[observability]\nlog_level = \"loud\"").unwrap();
    assert!(matches!(bootstrap(bad.path()), Err(AutoLogError::Config(_))));
    assert!(auto_log::aspect::current().is_none());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[aspect]
enabled = true
base_paths = ["bootstrap"]
metrics_enabled = true

[observability]
log_level = "debug"
log_format = "compact"
"#
    )
    .unwrap();

    let aspect = bootstrap(file.path()).unwrap();
    assert!(aspect.is_enabled());

    let current = auto_log::aspect::current().unwrap();
    assert!(std::sync::Arc::ptr_eq(&aspect, &current));

    // goes through the global aspect and the tracing sink
    assert_eq!(square(7), 49);

    // the subscriber is process-wide and can only be installed once
    assert!(matches!(bootstrap(file.path()), Err(AutoLogError::Logging(_))));

    let previous = auto_log::aspect::disable().unwrap();
    assert!(std::sync::Arc::ptr_eq(&aspect, &previous));
    assert!(auto_log::aspect::current().is_none());
}
