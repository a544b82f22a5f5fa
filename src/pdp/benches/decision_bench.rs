//! Decision benchmarks
//!
//! Policy sets of growing width, each child policy targeting one resource id,
//! evaluated with deny-overrides at both levels.

use cretoai_pdp::expression::AttributeDesignator;
use cretoai_pdp::finder::StdPolicyFinder;
use cretoai_pdp::identifier::*;
use cretoai_pdp::policy::{Match, PolicyBuilder, PolicySetBuilder, RuleBuilder, Target};
use cretoai_pdp::{AttributeValue, Effect, ParseMode, PdpEngine, PolicyDef, Request};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

fn resource_target(resource: &str) -> Target {
    Target::single(Match::designator(
        FUNCTION_STRING_EQUAL,
        AttributeValue::string(resource),
        AttributeDesignator::new(CATEGORY_RESOURCE, ID_RESOURCE_RESOURCE_ID, DATATYPE_STRING),
    ))
}

fn create_policy_set(count: usize) -> PolicyDef {
    let mut builder = PolicySetBuilder::new("urn:bench:root", ParseMode::Strict)
        .combining_algorithm(&POLICY_DENY_OVERRIDES)
        .unwrap();

    for i in 0..count {
        let effect = if i % 2 == 0 { Effect::Permit } else { Effect::Deny };
        let policy = PolicyBuilder::new(format!("urn:bench:policy-{}", i), ParseMode::Strict)
            .target(resource_target(&format!("document:{}", i)))
            .unwrap()
            .combining_algorithm(&RULE_DENY_OVERRIDES)
            .unwrap()
            .rule(RuleBuilder::new("rule", effect, ParseMode::Strict).build().unwrap())
            .build()
            .unwrap();
        builder = builder.policy(policy);
    }

    builder.build().unwrap().into()
}

fn bench_decide(c: &mut Criterion) {
    let mut group = c.benchmark_group("decide");

    for policy_count in [10, 100, 1000].iter() {
        let engine = PdpEngine::with_policy_finder(Arc::new(StdPolicyFinder::with_root(create_policy_set(*policy_count))));
        let request = Request::new()
            .with_attribute(CATEGORY_ACCESS_SUBJECT, ID_SUBJECT_SUBJECT_ID, AttributeValue::string("alice"))
            .with_attribute(CATEGORY_RESOURCE, ID_RESOURCE_RESOURCE_ID, AttributeValue::string("document:4"));

        group.bench_with_input(BenchmarkId::new("policies", policy_count), &request, |b, request| {
            b.iter(|| black_box(engine.decide(black_box(request))));
        });
    }

    group.finish();
}

fn bench_decide_async(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let engine = PdpEngine::with_policy_finder(Arc::new(StdPolicyFinder::with_root(create_policy_set(100))));
    let request = Request::new().with_attribute(
        CATEGORY_RESOURCE,
        ID_RESOURCE_RESOURCE_ID,
        AttributeValue::string("document:42"),
    );

    c.bench_function("decide_async", |b| {
        b.iter(|| rt.block_on(engine.decide_async(request.clone())));
    });
}

criterion_group!(benches, bench_decide, bench_decide_async);
criterion_main!(benches);
