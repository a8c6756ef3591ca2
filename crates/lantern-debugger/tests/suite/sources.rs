use lantern_debugger::host::scripted::{ScriptedOp, ScriptedScript, ScriptedSource};
use serde_json::{json, Value};

use crate::harness::{sample_program, TestClient, SOURCE, URL};

#[tokio::test]
async fn new_source_is_announced_once_with_its_pipeline() {
    let mut client = TestClient::start(sample_program());
    client.attach(1, 7).await;
    client.load(1);

    let source = client.wait_for_event("new-source").await;
    assert_eq!(source["sourceId"], json!(SOURCE));
    assert_eq!(source["url"], URL);
    assert_eq!(source["urlOverride"], Value::Null);
    assert_eq!(source["text"], "f(); g();");
    assert_eq!(source["introductionType"], "scriptElement");
    assert_eq!(source["pipelineId"], json!(7));
    assert!(source.get("workerId").is_none(), "{source}");

    // Reporting the same load again is not a new source.
    client.load(1);
    let rest = client.drain().await;
    assert!(
        rest.iter().all(|msg| msg["type"] != "new-source"),
        "duplicate new-source: {rest:?}"
    );
    client.disconnect().await;
}

#[tokio::test]
async fn sources_from_unregistered_globals_are_ignored() {
    let mut client = TestClient::start(sample_program());
    client.load(9);
    let rest = client.drain().await;
    assert!(rest.is_empty(), "unexpected messages: {rest:?}");

    let reply = client
        .call(json!({"type": "get-possible-breakpoints", "sourceId": SOURCE}))
        .await;
    assert_eq!(reply["type"], "error", "{reply}");
    client.disconnect().await;
}

#[tokio::test]
async fn possible_breakpoints_cover_every_nested_script() {
    let mut client = TestClient::start(sample_program());
    client.attach(1, 7).await;
    client.load(1);

    let reply = client
        .call(json!({"type": "get-possible-breakpoints", "sourceId": SOURCE}))
        .await;
    assert_eq!(reply["type"], "reply", "{reply}");
    let positions = reply
        .pointer("/body/positions")
        .and_then(Value::as_array)
        .expect("positions array");

    let mut found: Vec<(u64, u64)> = positions
        .iter()
        .map(|p| {
            (
                p["scriptId"].as_u64().unwrap(),
                p["offset"].as_u64().unwrap(),
            )
        })
        .collect();
    found.sort();
    assert_eq!(
        found,
        vec![
            (0, 0),
            (0, 2),
            (0, 4),
            (0, 6),
            (0, 8),
            (10, 10),
            (10, 12),
            (10, 14),
            (20, 20),
            (20, 21),
            (20, 22),
            (30, 30),
            (30, 32),
        ]
    );

    let mid = positions
        .iter()
        .find(|p| p["offset"] == json!(21))
        .expect("offset 21 listed");
    assert_eq!(mid["line"], json!(14));
    assert_eq!(mid["column"], json!(4));
    client.disconnect().await;
}

#[tokio::test]
async fn unknown_source_is_answered_with_an_error() {
    let mut client = TestClient::start(sample_program());
    let reply = client
        .call(json!({"type": "get-possible-breakpoints", "sourceId": 42}))
        .await;
    assert_eq!(reply["type"], "error");
    assert!(
        reply["message"].as_str().unwrap().contains("unknown source 42"),
        "{reply}"
    );
    client.disconnect().await;
}

#[tokio::test]
async fn loaded_sources_are_listed_per_pipeline() {
    let mut program = sample_program();
    program.sources.push(
        ScriptedSource::new(
            2,
            "https://example.test/bundle.js",
            ScriptedScript::new(0).op(ScriptedOp::new(0, 1)),
        )
        .with_display_url("src/widget.ts"),
    );
    let mut client = TestClient::start(program);
    client.attach(1, 7).await;
    client.attach(2, 8).await;
    client.load(1);

    client.wait_for_event("new-source").await;
    let mapped = client.wait_for_event("new-source").await;
    assert_eq!(mapped["sourceId"], json!(2));
    assert_eq!(mapped["urlOverride"], "src/widget.ts");

    let reply = client.call(json!({"type": "get-sources"})).await;
    assert_eq!(reply["type"], "reply", "{reply}");
    assert_eq!(
        reply.pointer("/body/sources"),
        Some(&json!([
            {
                "sourceId": SOURCE,
                "url": URL,
                "urlOverride": null,
                "introductionType": "scriptElement",
                "pipelineId": 7,
            },
            {
                "sourceId": 2,
                "url": "https://example.test/bundle.js",
                "urlOverride": "src/widget.ts",
                "introductionType": "scriptElement",
                "pipelineId": 7,
            },
        ]))
    );

    let other = client
        .call(json!({"type": "get-sources", "pipelineId": 8}))
        .await;
    assert_eq!(other.pointer("/body/sources"), Some(&json!([])), "{other}");
    client.disconnect().await;
}
