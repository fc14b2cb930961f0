//! Integration tests: replay recorded call traces against dynamic selectors.
//!
//! Each fixture in tests/fixtures/ has:
//! - case.json: the input list, the combiner and a sequence of calls
//! - expect.json: the result of every call and the recomputation count
//!   after it, or the construction error
//!
//! States and props are fresh JSON documents on every call, so only
//! primitive fields can produce cache hits.

use memoselect_kernel::{DynCombiner, DynInput, DynSelector, Value, dyn_input};
use serde_json::{Value as Json, json};
use std::convert::Infallible;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_json(path: &PathBuf) -> Json {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("failed to parse {}: {e}", path.display()))
}

fn input(entry: &Json) -> DynInput<Json, Json, Infallible> {
    let field = entry["field"].as_str().expect("input without field").to_string();
    match entry["source"].as_str() {
        Some("state") => dyn_input(move |state: &Json, _: &Json| Ok(Value::from(&state[&field]))),
        Some("props") => dyn_input(move |_: &Json, props: &Json| Ok(Value::from(&props[&field]))),
        other => panic!("unknown input source: {other:?}"),
    }
}

fn combiner(entry: &Json) -> DynCombiner<Value, Infallible> {
    let arity = entry["arity"].as_u64().expect("combiner without arity") as usize;
    match entry["name"].as_str() {
        Some("double") => DynCombiner::new(arity, |values: &[Value]| {
            Ok(Value::Int(values[0].as_int().unwrap_or_default() * 2))
        }),
        Some("sum") => DynCombiner::new(arity, |values: &[Value]| {
            Ok(Value::Int(values.iter().filter_map(Value::as_int).sum()))
        }),
        Some("concat") => DynCombiner::new(arity, |values: &[Value]| {
            let parts: Vec<String> = values
                .iter()
                .map(|value| match value.to_json() {
                    Json::String(s) => s,
                    other => other.to_string(),
                })
                .collect();
            Ok(Value::str(parts.join("|")))
        }),
        other => panic!("unknown combiner: {other:?}"),
    }
}

fn replay(case: &Json) -> Json {
    let inputs = case["inputs"]
        .as_array()
        .expect("missing inputs")
        .iter()
        .map(input)
        .collect();
    let selector = match DynSelector::new(inputs, combiner(&case["combiner"])) {
        Ok(selector) => selector,
        Err(err) => return json!({ "configuration_error": err.to_string() }),
    };

    let mut results = Vec::new();
    let mut recomputations = Vec::new();
    for call in case["calls"].as_array().expect("missing calls") {
        let result = match selector.select(&call["state"], &call["props"]) {
            Ok(result) => result,
            Err(never) => match never {},
        };
        results.push(result.to_json());
        recomputations.push(json!(selector.recomputations()));
    }
    json!({ "results": results, "recomputations": recomputations })
}

fn run_fixture(name: &str) {
    let dir = fixtures_dir().join(name);
    let case = read_json(&dir.join("case.json"));
    let expected = read_json(&dir.join("expect.json"));

    let got = replay(&case);
    assert_eq!(
        got,
        expected,
        "\n\nFixture: {name}\n\nGot:\n{}\n\nExpected:\n{}\n",
        serde_json::to_string_pretty(&got).unwrap(),
        serde_json::to_string_pretty(&expected).unwrap(),
    );
}

#[test]
fn doubling_counter() {
    run_fixture("doubling_counter");
}

#[test]
fn alternating_eviction() {
    run_fixture("alternating_eviction");
}

#[test]
fn props_transparency() {
    run_fixture("props_transparency");
}

#[test]
fn arity_mismatch() {
    run_fixture("arity_mismatch");
}
