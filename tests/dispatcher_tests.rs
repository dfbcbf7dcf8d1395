//! Tests for the registry and the per-request handler lifecycle
//!
//! # Test Coverage
//!
//! - Lookup: pooled instance, factory construction, unregistered names
//! - Lifecycle order: ready → run → clean → pool return
//! - Panic containment in ready, run, clean and the factory itself
//! - Error precedence: handler error > late panic > success
//! - Registration replacement (last `add` wins)
//! - Typed output erasure, including outputs that fail to serialize

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use http::Method;
use logic_dispatch::handlers::EchoHandler;
use logic_dispatch::{DispatchContext, Handler, Registry, RequestContext, ResultEnvelope};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// What the scripted handler should do at each step
#[derive(Clone, Copy, Default)]
struct Script {
    panic_in_ready: bool,
    panic_in_run: bool,
    error_in_run: Option<i32>,
    panic_in_clean: bool,
}

/// Records every lifecycle call into a shared journal
struct Scripted {
    id: usize,
    script: Script,
    journal: Arc<Mutex<Vec<String>>>,
    served: u32,
}

impl Handler for Scripted {
    type Output = Value;

    fn ready(&mut self, _ctx: &DispatchContext) {
        self.journal.lock().push(format!("ready:{}", self.id));
        if self.script.panic_in_ready {
            panic!("ready exploded");
        }
    }

    fn run(&mut self, _ctx: &DispatchContext, req: &RequestContext) -> ResultEnvelope<Value> {
        self.journal.lock().push(format!("run:{}", self.id));
        self.served += 1;
        if self.script.panic_in_run {
            panic!("boom");
        }
        if let Some(code) = self.script.error_in_run {
            return ResultEnvelope::failure(code, "conflict on ".to_string() + &req.path);
        }
        ResultEnvelope::success(json!({ "instance": self.id, "served": self.served }))
    }

    fn clean(&mut self, _ctx: &DispatchContext) {
        self.journal.lock().push(format!("clean:{}", self.id));
        self.served = 0;
        if self.script.panic_in_clean {
            panic!("clean exploded");
        }
    }
}

struct Fixture {
    registry: Registry,
    constructed: Arc<AtomicUsize>,
    journal: Arc<Mutex<Vec<String>>>,
}

fn fixture(name: &str, script: Script) -> Fixture {
    let constructed = Arc::new(AtomicUsize::new(0));
    let journal = Arc::new(Mutex::new(Vec::new()));
    let mut registry = Registry::new();
    {
        let constructed = Arc::clone(&constructed);
        let journal = Arc::clone(&journal);
        registry.add(name, move || Scripted {
            id: constructed.fetch_add(1, Ordering::SeqCst),
            script,
            journal: Arc::clone(&journal),
            served: 0,
        });
    }
    Fixture {
        registry,
        constructed,
        journal,
    }
}

fn request(path: &str) -> RequestContext {
    RequestContext::new(Method::GET, path)
}

#[test]
fn test_first_call_constructs_exactly_one_instance() {
    let f = fixture("work", Script::default());
    assert_eq!(f.constructed.load(Ordering::SeqCst), 0);

    let envelope = f.registry.call(&request("/work"), "work");
    assert!(envelope.is_success());
    assert_eq!(f.constructed.load(Ordering::SeqCst), 1);
    assert_eq!(*f.journal.lock(), vec!["ready:0", "run:0", "clean:0"]);

    let snapshot = f.registry.pool_metrics("work").unwrap();
    assert_eq!(snapshot.constructed, 1);
    assert_eq!(snapshot.returned, 1);
    assert_eq!(snapshot.idle, 1);
}

#[test]
fn test_pooled_instance_is_reused_with_clean_state() {
    let f = fixture("work", Script::default());

    let first = f.registry.call(&request("/work"), "work");
    let second = f.registry.call(&request("/work"), "work");

    assert_eq!(f.constructed.load(Ordering::SeqCst), 1);
    // clean resets the per-request counter, so the reused instance starts over
    assert_eq!(first.data(), Some(&json!({"instance": 0, "served": 1})));
    assert_eq!(second.data(), Some(&json!({"instance": 0, "served": 1})));

    let snapshot = f.registry.pool_metrics("work").unwrap();
    assert_eq!(snapshot.dispatched, 2);
    assert_eq!(snapshot.reused, 1);
    assert_eq!(snapshot.idle, 1);
}

#[test]
fn test_unregistered_name_returns_406_without_side_effects() {
    let f = fixture("work", Script::default());

    let envelope = f.registry.call(&request("/missing"), "missing");
    assert!(!envelope.is_success());
    assert_eq!(envelope.code(), 406);
    assert_eq!(
        envelope.json(),
        r#"{"code":406,"data":{},"text":"unregistered handler: missing"}"#
    );

    assert_eq!(f.constructed.load(Ordering::SeqCst), 0);
    assert!(f.journal.lock().is_empty());
    assert_eq!(f.registry.pool_metrics("missing"), None);
    assert_eq!(f.registry.pool_metrics("work").unwrap().dispatched, 0);
}

#[test]
fn test_run_panic_yields_500_and_instance_is_pooled() {
    let f = fixture(
        "work",
        Script {
            panic_in_run: true,
            ..Script::default()
        },
    );

    let envelope = f.registry.call(&request("/work"), "work");
    assert!(!envelope.is_success());
    assert_eq!(envelope.code(), 500);
    assert_eq!(envelope.json(), r#"{"code":500,"data":{},"text":"boom"}"#);

    assert_eq!(*f.journal.lock(), vec!["ready:0", "run:0", "clean:0"]);
    let snapshot = f.registry.pool_metrics("work").unwrap();
    assert_eq!(snapshot.panics, 1);
    assert_eq!(snapshot.idle, 1);
    assert_eq!(snapshot.returned, 1);

    // the same instance serves the next request
    let _ = f.registry.call(&request("/work"), "work");
    assert_eq!(f.constructed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_ready_panic_still_cleans() {
    let f = fixture(
        "work",
        Script {
            panic_in_ready: true,
            ..Script::default()
        },
    );

    let envelope = f.registry.call(&request("/work"), "work");
    assert_eq!(envelope.code(), 500);
    assert_eq!(envelope.text(), "ready exploded");
    assert_eq!(*f.journal.lock(), vec!["ready:0", "clean:0"]);
    assert_eq!(f.registry.pool_metrics("work").unwrap().idle, 1);
}

#[test]
fn test_handler_error_passes_through() {
    let f = fixture(
        "work",
        Script {
            error_in_run: Some(409),
            ..Script::default()
        },
    );

    let envelope = f.registry.call(&request("/work"), "work");
    assert_eq!(
        envelope.json(),
        r#"{"code":409,"data":{},"text":"conflict on /work"}"#
    );
}

#[test]
fn test_handler_error_wins_over_later_panic() {
    let f = fixture(
        "work",
        Script {
            error_in_run: Some(409),
            panic_in_clean: true,
            ..Script::default()
        },
    );

    let envelope = f.registry.call(&request("/work"), "work");
    assert_eq!(envelope.code(), 409);
    assert_eq!(envelope.data(), None);
    assert_eq!(envelope.text(), "conflict on /work");
    assert_eq!(f.registry.pool_metrics("work").unwrap().idle, 1);
}

#[test]
fn test_prewarmed_instances_are_not_counted_as_returns() {
    let f = fixture("work", Script::default());
    assert_eq!(f.registry.prewarm("work", 2), Ok(2));

    let snapshot = f.registry.pool_metrics("work").unwrap();
    assert_eq!(snapshot.prewarmed, 2);
    assert_eq!(snapshot.returned, 0);
    assert_eq!(snapshot.idle, 2);

    let _ = f.registry.call(&request("/work"), "work");
    let snapshot = f.registry.pool_metrics("work").unwrap();
    assert_eq!(snapshot.constructed, 2);
    assert_eq!(snapshot.reused, 1);
    assert_eq!(snapshot.returned, 1);
}

#[test]
fn test_clean_panic_still_returns_instance() {
    let f = fixture(
        "work",
        Script {
            panic_in_clean: true,
            ..Script::default()
        },
    );

    let envelope = f.registry.call(&request("/work"), "work");
    assert_eq!(envelope.code(), 500);
    assert_eq!(envelope.text(), "clean exploded");

    let snapshot = f.registry.pool_metrics("work").unwrap();
    assert_eq!(snapshot.panics, 1);
    assert_eq!(snapshot.returned, 1);
    assert_eq!(snapshot.idle, 1);

    // the obtained instance went back and serves the next request
    let _ = f.registry.call(&request("/work"), "work");
    assert_eq!(f.constructed.load(Ordering::SeqCst), 1);
    assert_eq!(f.registry.pool_metrics("work").unwrap().reused, 1);
}

#[test]
fn test_factory_panic_is_contained() {
    struct Never;
    impl Handler for Never {
        type Output = ();
        fn run(&mut self, _ctx: &DispatchContext, _req: &RequestContext) -> ResultEnvelope<()> {
            ResultEnvelope::new()
        }
    }

    let mut registry = Registry::new();
    registry.add("broken", || -> Never { panic!("factory exploded") });

    let envelope = registry.call(&request("/broken"), "broken");
    assert_eq!(envelope.json(), r#"{"code":500,"data":{},"text":"factory exploded"}"#);

    let snapshot = registry.pool_metrics("broken").unwrap();
    assert_eq!(snapshot.constructed, 0);
    assert_eq!(snapshot.idle, 0);
    assert_eq!(snapshot.panics, 1);
}

#[test]
fn test_echo_scenario() {
    let mut registry = Registry::new();
    registry.add("echo", EchoHandler::default);

    let req = RequestContext::new(Method::POST, "/echo").with_body("hi");
    let envelope = registry.call(&req, "echo");
    assert!(envelope.is_success());
    assert_eq!(envelope.json(), r#"{"code":0,"data":"hi","text":"success"}"#);

    // the pooled echo buffer does not leak into the next request
    let req = RequestContext::new(Method::POST, "/echo").with_body("yo");
    assert_eq!(
        registry.call(&req, "echo").json(),
        r#"{"code":0,"data":"yo","text":"success"}"#
    );
}

#[test]
fn test_empty_envelope_from_handler() {
    struct Silent;
    impl Handler for Silent {
        type Output = Value;
        fn run(&mut self, _ctx: &DispatchContext, _req: &RequestContext) -> ResultEnvelope<Value> {
            ResultEnvelope::new()
        }
    }

    let mut registry = Registry::new();
    registry.add("silent", || Silent);
    assert_eq!(
        registry.call(&request("/silent"), "silent").json(),
        r#"{"code":0,"data":null,"text":"success"}"#
    );
}

#[test]
fn test_add_replaces_previous_registration() {
    struct Constant(u32);
    impl Handler for Constant {
        type Output = u32;
        fn run(&mut self, _ctx: &DispatchContext, _req: &RequestContext) -> ResultEnvelope<u32> {
            ResultEnvelope::success(self.0)
        }
    }

    let mut registry = Registry::new();
    registry.add("value", || Constant(1));
    let _ = registry.call(&request("/value"), "value");
    assert_eq!(registry.pool_metrics("value").unwrap().idle, 1);

    registry.add("value", || Constant(2));
    assert_eq!(registry.len(), 1);
    // the old pool went with the old registration
    assert_eq!(registry.pool_metrics("value").unwrap().idle, 0);
    assert_eq!(
        registry.call(&request("/value"), "value").data(),
        Some(&json!(2))
    );
}

#[test]
fn test_typed_output_is_serialized() {
    #[derive(Serialize)]
    struct Pet {
        id: u64,
        name: String,
    }

    struct GetPet;
    impl Handler for GetPet {
        type Output = Pet;
        fn run(&mut self, _ctx: &DispatchContext, req: &RequestContext) -> ResultEnvelope<Pet> {
            ResultEnvelope::success(Pet {
                id: 42,
                name: req.body_text().into_owned(),
            })
        }
    }

    let mut registry = Registry::new();
    registry.add("get_pet", || GetPet);
    let req = RequestContext::new(Method::GET, "/pets/42").with_body("rex");
    assert_eq!(
        registry.call(&req, "get_pet").json(),
        r#"{"code":0,"data":{"id":42,"name":"rex"},"text":"success"}"#
    );
}

#[test]
fn test_unserializable_output_yields_500() {
    struct BadKeys;
    impl Handler for BadKeys {
        type Output = HashMap<(u8, u8), u8>;
        fn run(
            &mut self,
            _ctx: &DispatchContext,
            _req: &RequestContext,
        ) -> ResultEnvelope<HashMap<(u8, u8), u8>> {
            ResultEnvelope::success(HashMap::from([((1, 2), 3)]))
        }
    }

    let mut registry = Registry::new();
    registry.add("bad", || BadKeys);
    let envelope = registry.call(&request("/bad"), "bad");
    assert_eq!(envelope.code(), 500);
    assert!(envelope
        .text()
        .starts_with("failed to serialize handler output"));
    // the instance itself was fine and goes back to the pool
    assert_eq!(registry.pool_metrics("bad").unwrap().idle, 1);
}

#[test]
fn test_metrics_cover_all_handlers() {
    let mut registry = Registry::new();
    registry.add("echo", EchoHandler::default);
    registry.add("echo2", EchoHandler::default);
    let _ = registry.call(&request("/echo"), "echo");

    let metrics = registry.metrics();
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics["echo"].dispatched, 1);
    assert_eq!(metrics["echo2"].dispatched, 0);
    assert!(registry.contains("echo2"));
    assert!(!registry.is_empty());
}
