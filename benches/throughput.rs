use std::hint::black_box;

use acprouter::runtime_config::RuntimeConfig;
use acprouter::server::HandlerResponse;
use acprouter::{Handler, HandlerRequest, MethodRegistry, RequestDispatcher, Verb};
use criterion::{criterion_group, criterion_main, Criterion};

fn route_table() -> Vec<(Verb, &'static str)> {
    vec![
        (Verb::Get, "/"),
        (Verb::Get, "/zoo/animals"),
        (Verb::Post, "/zoo/animals"),
        (Verb::Get, "/zoo/animals/:id"),
        (Verb::Put, "/zoo/animals/:id"),
        (Verb::Patch, "/zoo/animals/:id"),
        (Verb::Delete, "/zoo/animals/:id"),
        (Verb::Get, "/zoo/animals/:id/toys/:toy_id"),
        (
            Verb::Get,
            "/zoo/:category/animals/:id/habitats/:habitat_id/sections/:section_id",
        ),
        (
            Verb::Post,
            "/inventory/:warehouse_id/feeds/:feed_id/items/:item_id/batches/:batch_id",
        ),
        (Verb::Get, "/complex/:a/:b/:c/:d/:e/:f/:g/:h/:i"),
        (Verb::Head, "/zoo/health"),
        (Verb::Options, "/zoo/health"),
        (Verb::Get, "/*"),
    ]
}

fn registry() -> MethodRegistry {
    let ok = Handler::terminal(|_req| Ok(HandlerResponse::empty(204)));
    MethodRegistry::from_routes(
        route_table()
            .into_iter()
            .map(|(verb, path)| (verb, path, ok.clone())),
    )
}

const TEST_PATHS: [(Verb, &str); 6] = [
    (Verb::Get, "/zoo/animals/123"),
    (Verb::Get, "/zoo/animals/123/toys/456"),
    (Verb::Get, "/zoo/cats/animals/123/habitats/88/sections/5"),
    (Verb::Post, "/inventory/1/feeds/2/items/3/batches/4"),
    (Verb::Get, "/complex/1/2/3/4/5/6/7/8/9"),
    (Verb::Get, "/nowhere/in/particular"),
];

fn bench_route_throughput(c: &mut Criterion) {
    let registry = registry();
    c.bench_function("route_match", |b| {
        b.iter(|| {
            for (verb, path) in TEST_PATHS.iter() {
                let res = registry.lookup(*verb, path);
                black_box(&res);
            }
        })
    });
}

fn bench_chain_dispatch(c: &mut Criterion) {
    let mut registry = registry();
    let pass = Handler::chain(|_req, _res, next| next.proceed());
    registry.get("/chained/:id", [pass.clone(), pass.clone(), pass]);
    registry.get(
        "/chained/:id",
        [Handler::terminal(|_req| Ok(HandlerResponse::empty(204)))],
    );
    let dispatcher = RequestDispatcher::with_config(registry, RuntimeConfig::default());

    c.bench_function("chain_dispatch", |b| {
        b.iter(|| {
            let res = dispatcher.dispatch(HandlerRequest::new(Verb::Get, "/chained/9"));
            black_box(&res);
        })
    });
}

criterion_group!(benches, bench_route_throughput, bench_chain_dispatch);
criterion_main!(benches);
