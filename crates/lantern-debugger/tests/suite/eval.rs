use serde_json::json;

use crate::harness::{sample_program, TestClient};
use lantern_debugger::ids::DebuggeeHandle;
use lantern_debugger::value::RawCompletion;

#[tokio::test]
async fn returned_values_are_summarized() {
    let mut client = TestClient::start(sample_program());
    client.attach(1, 7).await;

    let reply = client
        .call(json!({"type": "eval", "code": "42", "pipelineId": 7}))
        .await;
    assert_eq!(
        reply["body"],
        json!({"completionType": "return", "valueType": "number", "numberValue": 42.0})
    );

    let reply = client
        .call(json!({"type": "eval", "code": "\"lantern\"", "pipelineId": 7}))
        .await;
    assert_eq!(
        reply["body"],
        json!({"completionType": "return", "valueType": "string", "stringValue": "lantern"})
    );

    let reply = client
        .call(json!({"type": "eval", "code": "new Map()", "pipelineId": 7}))
        .await;
    assert_eq!(
        reply["body"],
        json!({"completionType": "return", "valueType": "object", "objectClass": "Map"})
    );
    client.disconnect().await;
}

#[tokio::test]
async fn thrown_values_report_a_throw_completion() {
    let mut client = TestClient::start(sample_program());
    client.attach(1, 7).await;

    let reply = client
        .call(json!({"type": "eval", "code": "throw new TypeError('boom')", "pipelineId": 7}))
        .await;
    assert_eq!(
        reply["body"],
        json!({"completionType": "throw", "valueType": "object", "objectClass": "TypeError"})
    );

    let reply = client
        .call(json!({"type": "eval", "code": "throw false", "pipelineId": 7}))
        .await;
    assert_eq!(
        reply["body"],
        json!({"completionType": "throw", "valueType": "boolean", "booleanValue": false})
    );
    client.disconnect().await;
}

#[tokio::test]
async fn terminated_evaluation_is_reported_as_such() {
    let mut client = TestClient::start(sample_program());
    client.attach(1, 7).await;
    client.host.set_evaluation("while (true) {}", None);

    let reply = client
        .call(json!({"type": "eval", "code": "while (true) {}", "pipelineId": 7}))
        .await;
    assert_eq!(
        reply["body"],
        json!({"completionType": "terminated", "valueType": "undefined"})
    );
    client.disconnect().await;
}

#[tokio::test]
async fn eval_in_a_torn_down_global_is_terminated() {
    let mut client = TestClient::start(sample_program());
    client.attach(1, 7).await;
    client.load(1);
    client
        .host
        .tear_down(&client.session.hooks(), DebuggeeHandle(1));

    let reply = client
        .call(json!({"type": "eval", "code": "42", "pipelineId": 7}))
        .await;
    assert_eq!(reply["type"], "reply", "{reply}");
    assert_eq!(
        reply["body"],
        json!({"completionType": "terminated", "valueType": "undefined"})
    );
    client.disconnect().await;
}

#[tokio::test]
async fn eval_in_a_removed_global_is_terminated() {
    let mut client = TestClient::start(sample_program());
    client.attach(1, 7).await;
    client
        .send(json!({"type": "remove-debuggee", "handle": 1}))
        .await;

    // The host could still run the code; the session no longer observes it.
    let reply = client
        .call(json!({"type": "eval", "code": "42", "pipelineId": 7}))
        .await;
    assert_eq!(
        reply["body"],
        json!({"completionType": "terminated", "valueType": "undefined"}),
        "{reply}"
    );

    // Adding it again makes it evaluable.
    client.attach(1, 7).await;
    let reply = client
        .call(json!({"type": "eval", "code": "42", "pipelineId": 7}))
        .await;
    assert_eq!(reply["body"]["completionType"], "return", "{reply}");
    client.disconnect().await;
}

#[tokio::test]
async fn malformed_completion_is_an_error_reply() {
    let mut client = TestClient::start(sample_program());
    client.attach(1, 7).await;
    client
        .host
        .set_evaluation("odd", Some(RawCompletion::default()));

    let reply = client
        .call(json!({"type": "eval", "code": "odd", "pipelineId": 7}))
        .await;
    assert_eq!(reply["type"], "error", "{reply}");
    client.disconnect().await;
}

#[tokio::test]
async fn worker_target_wins_over_pipeline() {
    let mut client = TestClient::start(sample_program());
    client.attach(1, 8).await;
    client
        .send(json!({"type": "add-debuggee", "handle": 2, "pipelineId": 7, "workerId": 3}))
        .await;
    client.barrier().await;

    let reply = client
        .call(json!({"type": "eval", "code": "1", "pipelineId": 8, "workerId": 3}))
        .await;
    assert_eq!(reply["type"], "reply", "{reply}");

    // Pipeline 8 exists, but the unknown worker decides.
    let reply = client
        .call(json!({"type": "eval", "code": "1", "pipelineId": 8, "workerId": 99}))
        .await;
    assert_eq!(reply["type"], "error", "{reply}");
    assert!(reply["message"].as_str().unwrap().contains("worker 99"));

    // A pipeline with only a worker registered still resolves to it.
    let reply = client
        .call(json!({"type": "eval", "code": "1", "pipelineId": 7}))
        .await;
    assert_eq!(reply["type"], "reply", "{reply}");
    client.disconnect().await;
}

#[tokio::test]
async fn unresolvable_targets_are_error_replies() {
    let mut client = TestClient::start(sample_program());

    let missing = client.call(json!({"type": "eval", "code": "1"})).await;
    assert_eq!(missing["type"], "error", "{missing}");

    let unknown = client
        .call(json!({"type": "eval", "code": "1", "pipelineId": 5}))
        .await;
    assert_eq!(unknown["type"], "error");
    assert!(unknown["message"].as_str().unwrap().contains("pipeline 5"));
    client.disconnect().await;
}
