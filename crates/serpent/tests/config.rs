//! Tests for runtime configuration, resource limits and the diagnostics hooks.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serpent::{
    AttributeBinding, DispatchStrategy, ExcType, LimitedTracker, Namespace, RecordingTracer, ResourceLimits, Runtime,
    RuntimeConfig, TraceEvent, Value,
};

// =============================================================================
// 1. Configuration
// =============================================================================

/// The configuration deserializes from JSON; omitted fields take their defaults.
#[test]
fn config_from_json() {
    let config: RuntimeConfig = serde_json::from_str(
        r#"{"attribute_binding": "snapshot", "search_path": ["/srv/lib"], "limits": {"max_allocations": 50}}"#,
    )
    .unwrap();
    assert_eq!(config.attribute_binding, AttributeBinding::Snapshot);
    assert_eq!(config.search_path, ["/srv/lib"]);
    assert_eq!(config.limits, ResourceLimits::new().max_allocations(50));

    let defaults: RuntimeConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(defaults, RuntimeConfig::default());
    assert_eq!(defaults.attribute_binding, AttributeBinding::Live);
    assert!(defaults.limits.is_unlimited());
}

/// Configuration survives a serialization round trip.
#[test]
fn config_serializes() {
    let config = RuntimeConfig {
        limits: ResourceLimits::new().max_duration(Duration::from_millis(250)),
        attribute_binding: AttributeBinding::Snapshot,
        search_path: vec!["lib".to_owned()],
    };
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["attribute_binding"], "snapshot");
    let back: RuntimeConfig = serde_json::from_value(json).unwrap();
    assert_eq!(back, config);
}

// =============================================================================
// 2. Resource limits
// =============================================================================

/// Exceeding the allocation limit raises a MemoryError no handler can catch.
#[test]
fn allocation_limit_is_uncatchable() {
    let mut rt = Runtime::with_config(RuntimeConfig {
        limits: ResourceLimits::new().max_allocations(3),
        ..RuntimeConfig::default()
    });
    for _ in 0..3 {
        rt.new_list(vec![]).unwrap();
    }
    assert_eq!(rt.allocation_count(), Some(3));

    let err = rt.new_list(vec![]).unwrap_err();
    assert_eq!(err.simple_type(), Some(ExcType::MemoryError));
    let memory_error = rt.exc_class(ExcType::MemoryError);
    let base = rt.exc_class(ExcType::BaseException);
    assert!(!rt.exception_matches(&err, memory_error));
    assert!(!rt.exception_matches(&err, base));
    assert!(rt.catch(Err::<(), _>(err.clone()), base).is_err(), "catch re-raises");

    let exc = rt.describe_error(&err);
    assert_eq!(exc.type_name(), "MemoryError");
    assert_eq!(exc.message(), Some("allocation limit exceeded: 4 > 3"));
}

/// A memory limit vetoes oversized repeats before they are built.
#[test]
fn memory_limit_rejects_large_results() {
    let mut rt = Runtime::with_config(RuntimeConfig {
        limits: ResourceLimits::new().max_memory(100_000),
        ..RuntimeConfig::default()
    });
    let zero = rt.new_list(vec![Value::Int(0)]).unwrap();
    let small = rt.mul(&zero, &Value::Int(100)).unwrap();
    assert_eq!(rt.len(&small).unwrap(), 100);

    let err = rt.mul(&zero, &Value::Int(10_000)).unwrap_err();
    assert_eq!(err.simple_type(), Some(ExcType::MemoryError));
    assert!(!rt.exception_matches(&err, rt.exc_class(ExcType::MemoryError)));
    let exc = rt.describe_error(&err);
    assert!(exc.message().unwrap().starts_with("memory limit exceeded"));

    let err = rt.mul(&Value::from("x"), &Value::Int(200_000)).unwrap_err();
    assert_eq!(err.simple_type(), Some(ExcType::MemoryError));
}

/// A zero time budget stops the next function call with RuntimeError.
#[test]
fn time_limit_stops_calls() {
    let mut rt = Runtime::new();
    rt.set_tracker(LimitedTracker::new(ResourceLimits::new().max_duration(Duration::ZERO)));
    std::thread::sleep(Duration::from_millis(2));

    let list = rt.new_list(vec![Value::Int(1)]).unwrap();
    let err = rt.call_method(&list, "append", vec![Value::Int(2)]).unwrap_err();
    assert_eq!(err.simple_type(), Some(ExcType::RuntimeError));
    assert!(!rt.exception_matches(&err, rt.exc_class(ExcType::RuntimeError)));
}

/// Without limits no allocation count is kept, but the heap still counts instances.
#[test]
fn unlimited_runtime_counts_in_heap_stats() {
    let mut rt = Runtime::new();
    assert_eq!(rt.allocation_count(), None);
    let before = rt.heap_stats().instances_allocated;
    rt.new_tuple(vec![]).unwrap();
    rt.new_dict(vec![]).unwrap();
    assert_eq!(rt.heap_stats().instances_allocated, before + 2);
}

// =============================================================================
// 3. Tracing
// =============================================================================

/// The tracer sees class construction, instantiation and dispatch decisions.
#[test]
fn tracer_records_runtime_events() {
    let mut rt = Runtime::new();
    let tracer = RecordingTracer::new();
    rt.set_tracer(tracer.clone());

    let cls = rt
        .define_class("Empty", &[], Namespace::new().attr("x", Value::Int(1)))
        .unwrap();
    rt.instantiate(cls, vec![]).unwrap();
    rt.add(&Value::Int(1), &Value::Int(2)).unwrap();
    let _ = rt.add(&Value::Int(1), &Value::None);

    let events = tracer.events();
    assert!(events.contains(&TraceEvent::ClassBuilt {
        name: "Empty".to_owned(),
        bases: 0,
        attrs: 1,
    }));
    assert!(events.contains(&TraceEvent::Instantiate {
        class_name: "Empty".to_owned()
    }));
    let strategies: Vec<DispatchStrategy> = events
        .iter()
        .filter_map(|event| match event {
            TraceEvent::Dispatch { strategy, .. } => Some(*strategy),
            _ => None,
        })
        .collect();
    assert_eq!(strategies, [DispatchStrategy::Native, DispatchStrategy::Unsupported]);

    tracer.clear();
    assert!(tracer.events().is_empty());
}

/// Calls and returns are reported with the stack depth.
#[test]
fn tracer_records_call_depth() {
    let mut rt = Runtime::new();
    let tracer = RecordingTracer::new();
    rt.set_tracer(tracer.clone());

    let list = rt.new_list(vec![]).unwrap();
    tracer.clear();
    rt.call_method(&list, "append", vec![Value::Int(1)]).unwrap();

    assert_eq!(
        tracer.events(),
        [
            TraceEvent::Call {
                name: "append".to_owned(),
                depth: 1,
            },
            TraceEvent::Return { depth: 0 },
        ]
    );
}
