use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use super::{ChainOutcome, RequestDispatcher};
use crate::handlers::{Handler, HandlerError};
use crate::router::{MethodRegistry, Verb};
use crate::runtime_config::RuntimeConfig;
use crate::server::{Body, HandlerRequest, HandlerResponse, ResponseBuilder};

fn dispatcher(config: RuntimeConfig) -> RequestDispatcher {
    RequestDispatcher::with_config(MethodRegistry::new(), config)
}

fn json_body(res: &ResponseBuilder) -> Value {
    let bytes = res.body().and_then(Body::as_bytes).unwrap_or_default();
    serde_json::from_slice(bytes).unwrap()
}

fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Handler {
    let log = Arc::clone(log);
    Handler::chain(move |_req, _res, next| {
        log.lock().unwrap().push(name);
        next.proceed();
    })
}

#[test]
fn test_chain_exhaustion_finalizes_empty_200() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let d = dispatcher(RuntimeConfig::default());
    let chain = [recorder(&log, "a"), recorder(&log, "b")];
    let (res, outcome) = d.run_chain(&chain, &HandlerRequest::new(Verb::Get, "/"));

    assert_eq!(outcome, ChainOutcome::Exhausted);
    assert!(res.is_ready());
    assert_eq!(res.status_code(), 200);
    assert!(res.body().is_some_and(Body::is_empty));
    assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
}

#[test]
fn test_first_responder_wins() {
    let later = Arc::new(AtomicUsize::new(0));
    let later_hits = Arc::clone(&later);
    let chain = [
        Handler::chain(|_req, res, _next| {
            res.send("first").unwrap();
        }),
        Handler::terminal(move |_req| {
            later_hits.fetch_add(1, Ordering::SeqCst);
            Ok(HandlerResponse::text(201, "second"))
        }),
    ];
    let d = dispatcher(RuntimeConfig::default());
    let (res, outcome) = d.run_chain(&chain, &HandlerRequest::new(Verb::Get, "/"));

    assert_eq!(outcome, ChainOutcome::Responded { index: 0 });
    assert_eq!(res.body().and_then(Body::as_bytes), Some(&b"first"[..]));
    assert_eq!(later.load(Ordering::SeqCst), 0);
}

#[test]
fn test_error_stage_skipped_on_success() {
    let stage_hits = Arc::new(AtomicUsize::new(0));
    let hits = Arc::clone(&stage_hits);
    let chain = [
        Handler::on_error(move |_req, _res, _err| {
            hits.fetch_add(1, Ordering::SeqCst);
        }),
        Handler::terminal(|_req| Ok(HandlerResponse::json(200, json!({ "ok": true })))),
    ];
    let d = dispatcher(RuntimeConfig::default());
    let (res, outcome) = d.run_chain(&chain, &HandlerRequest::new(Verb::Get, "/"));

    assert_eq!(outcome, ChainOutcome::Responded { index: 1 });
    assert_eq!(json_body(&res), json!({ "ok": true }));
    assert_eq!(stage_hits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_failure_routes_to_following_error_stage() {
    let chain = [
        Handler::chain(|_req, _res, next| next.fail(HandlerError::with_status(403, "denied"))),
        Handler::terminal(|_req| Ok(HandlerResponse::text(200, "unreachable"))),
        Handler::on_error(|_req, res, err| {
            let status = err.status().unwrap_or(500);
            res.status(status)
                .unwrap()
                .json(&json!({ "reason": err.to_string() }))
                .unwrap();
        }),
    ];
    let d = dispatcher(RuntimeConfig::default());
    let (res, outcome) = d.run_chain(&chain, &HandlerRequest::new(Verb::Get, "/"));

    assert_eq!(outcome, ChainOutcome::Failed { handled: true });
    assert_eq!(res.status_code(), 403);
    assert_eq!(json_body(&res), json!({ "reason": "denied" }));
}

#[test]
fn test_error_stage_before_failure_is_not_used() {
    let chain = [
        Handler::on_error(|_req, res, _err| {
            res.send("too early").unwrap();
        }),
        Handler::terminal(|_req| Err(HandlerError::new("boom"))),
    ];
    let d = dispatcher(RuntimeConfig::default());
    let (res, outcome) = d.run_chain(&chain, &HandlerRequest::new(Verb::Get, "/"));

    assert_eq!(outcome, ChainOutcome::Failed { handled: false });
    assert_eq!(res.status_code(), 500);
    assert_eq!(json_body(&res), json!({ "error": "Internal Server Error" }));
}

#[test]
fn test_synthesized_failure_uses_error_status_and_details() {
    let chain = [Handler::terminal(|_req| {
        Err(HandlerError::with_status(422, "bad widget"))
    })];
    let d = dispatcher(RuntimeConfig {
        expose_errors: true,
        ..RuntimeConfig::default()
    });
    let (res, _) = d.run_chain(&chain, &HandlerRequest::new(Verb::Post, "/widgets"));

    assert_eq!(res.status_code(), 422);
    assert_eq!(
        json_body(&res),
        json!({ "error": "Unprocessable Entity", "details": "bad widget" })
    );
}

#[test]
fn test_panic_is_recovered() {
    let chain = [Handler::chain(|_req, _res, _next| {
        panic!("handler exploded")
    })];
    let d = dispatcher(RuntimeConfig {
        expose_errors: true,
        ..RuntimeConfig::default()
    });
    let (res, outcome) = d.run_chain(&chain, &HandlerRequest::new(Verb::Get, "/"));

    assert_eq!(outcome, ChainOutcome::Failed { handled: false });
    assert_eq!(res.status_code(), 500);
    let details = json_body(&res)["details"].as_str().unwrap_or_default().to_string();
    assert!(details.contains("handler exploded"), "details: {details}");
}

#[test]
fn test_error_stage_without_finalize_falls_back() {
    let chain = [
        Handler::chain(|_req, res, next| {
            res.set_header("x-partial", "1").unwrap();
            next.fail(HandlerError::with_status(409, "version mismatch"));
        }),
        Handler::terminal(|_req| Ok(HandlerResponse::text(200, "unreachable"))),
        Handler::on_error(|_req, res, _err| {
            res.status(418).unwrap();
        }),
    ];
    let d = dispatcher(RuntimeConfig::default());
    let (res, outcome) = d.run_chain(&chain, &HandlerRequest::new(Verb::Put, "/"));

    assert_eq!(outcome, ChainOutcome::Failed { handled: false });
    assert!(res.is_ready());
    assert_eq!(res.status_code(), 409);
    assert_eq!(json_body(&res), json!({ "error": "Conflict" }));
    assert_eq!(res.get_header("x-partial"), None);
}

#[test]
fn test_panicking_error_stage_falls_back() {
    let chain = [
        Handler::terminal(|_req| Err(HandlerError::new("lookup failed"))),
        Handler::on_error(|_req, res, _err| {
            res.set_header("x-stage", "1").unwrap();
            panic!("error stage exploded");
        }),
    ];
    let d = dispatcher(RuntimeConfig::default());
    let (res, outcome) = d.run_chain(&chain, &HandlerRequest::new(Verb::Get, "/"));

    assert_eq!(outcome, ChainOutcome::Failed { handled: false });
    assert!(res.is_ready());
    assert_eq!(res.status_code(), 500);
    assert_eq!(json_body(&res), json!({ "error": "Internal Server Error" }));
    assert_eq!(res.get_header("x-stage"), None);
}

#[test]
fn test_dropped_continuation_is_a_failure() {
    let chain = [
        Handler::chain(|_req, _res, next| drop(next)),
        Handler::on_error(|_req, res, err| {
            assert_eq!(*err, HandlerError::ContinuationDropped { index: 0 });
            res.status(504).unwrap().send(()).unwrap();
        }),
    ];
    let d = dispatcher(RuntimeConfig::default());
    let (res, outcome) = d.run_chain(&chain, &HandlerRequest::new(Verb::Get, "/"));

    assert_eq!(outcome, ChainOutcome::Failed { handled: true });
    assert_eq!(res.status_code(), 504);
}

#[test]
fn test_continuation_from_another_thread() {
    let chain = [
        Handler::chain(|_req, res, next| {
            res.set_header("x-async", "yes").unwrap();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(10));
                next.proceed();
            });
        }),
        Handler::chain(|req, res, _next| {
            let id = req.get_path_param("id").unwrap_or("none").to_string();
            res.send(id).unwrap();
        }),
    ];
    let mut registry = MethodRegistry::new();
    registry.get("/jobs/:id", chain);
    let d = RequestDispatcher::with_config(registry, RuntimeConfig::default());

    let res = d
        .dispatch(HandlerRequest::new(Verb::Get, "/jobs/42"))
        .unwrap();
    assert_eq!(res.get_header("X-Async"), Some("yes"));
    assert_eq!(res.body().and_then(Body::as_bytes), Some(&b"42"[..]));
}

#[test]
fn test_dispatch_not_found_is_none() {
    let mut registry = MethodRegistry::new();
    registry.get("/a", [Handler::terminal(|_req| Ok(HandlerResponse::empty(204)))]);
    let d = RequestDispatcher::with_config(registry, RuntimeConfig::default());

    assert!(d.dispatch(HandlerRequest::new(Verb::Get, "/b")).is_none());
    assert!(d.dispatch(HandlerRequest::new(Verb::Post, "/a")).is_none());
    let res = d
        .dispatch_route(Verb::Get, "/a", HandlerRequest::new(Verb::Post, "/ignored"))
        .unwrap();
    assert_eq!(res.status_code(), 204);
}
