use lantern_config::SessionConfig;
use lantern_debugger::host::scripted::RunOutcome;
use lantern_debugger::ids::DebuggeeHandle;
use lantern_debugger::{DebugError, DebugSession};
use serde_json::json;
use tokio::sync::mpsc;

use crate::harness::{finished, paused_line, sample_program, TestClient};

#[tokio::test]
async fn second_session_in_the_same_slot_is_refused() {
    let client = TestClient::start(sample_program());
    let slot = client.slot.clone();
    let host = client.host.clone();

    let (tx, _rx) = mpsc::unbounded_channel();
    let err = DebugSession::init(&slot, host.clone(), SessionConfig::default(), tx)
        .err()
        .expect("second init must fail");
    assert!(matches!(err, DebugError::SessionAlreadyActive));

    client.disconnect().await;
    assert!(!slot.is_active());

    let (tx, _rx) = mpsc::unbounded_channel();
    let again = DebugSession::init(&slot, host, SessionConfig::default(), tx).unwrap();
    assert!(again.is_active());
}

#[tokio::test]
async fn interrupt_pauses_on_the_next_frame_entry() {
    let mut client = TestClient::start(sample_program());
    client.attach(1, 7).await;
    client.load(1);
    client.send(json!({"type": "interrupt"})).await;
    client.barrier().await;
    assert!(client.host.enter_hook_enabled());

    let target = client.spawn_execute(1);
    let paused = client.wait_for_event("paused").await;
    assert_eq!(paused["why"], json!({"type": "interrupted", "onNext": true}));
    assert_eq!(paused_line(&paused), 1);
    assert!(!client.host.enter_hook_enabled());

    client.resume(None, None).await;
    assert_eq!(finished(target).await, RunOutcome::Completed);
    let rest = client.drain().await;
    assert!(rest.iter().all(|msg| msg["type"] != "paused"), "{rest:?}");
    client.disconnect().await;
}

#[tokio::test]
async fn teardown_abandons_the_pause() {
    let mut client = TestClient::start(sample_program());
    let target = client.run_with_breakpoints(&[(10, 10)]).await;
    client.wait_for_event("paused").await;

    client
        .host
        .tear_down(&client.session.hooks(), DebuggeeHandle(1));
    assert_eq!(finished(target).await, RunOutcome::TornDown);
    assert_eq!(client.host.live_frames(), 0);

    let reply = client.resume(None, None).await;
    assert_eq!(reply["type"], "error", "{reply}");
    let eval = client
        .call(json!({"type": "eval", "code": "1", "pipelineId": 7}))
        .await;
    assert_eq!(
        eval["body"],
        json!({"completionType": "terminated", "valueType": "undefined"}),
        "{eval}"
    );
    client.disconnect().await;
}

#[tokio::test]
async fn removed_debuggee_is_no_longer_paused() {
    let mut client = TestClient::start(sample_program());
    let target = client.run_with_breakpoints(&[(10, 10), (0, 4)]).await;
    client.wait_for_event("paused").await;

    client
        .send(json!({"type": "remove-debuggee", "handle": 1}))
        .await;
    client.barrier().await;
    assert!(!client.session.is_paused());

    // The later breakpoint hit belongs to a global nobody observes anymore.
    assert_eq!(finished(target).await, RunOutcome::Completed);
    let rest = client.drain().await;
    assert!(rest.iter().all(|msg| msg["type"] != "paused"), "{rest:?}");
    client.disconnect().await;
}

#[tokio::test]
async fn disconnect_releases_a_paused_target() {
    let mut client = TestClient::start(sample_program());
    let target = client.run_with_breakpoints(&[(10, 10), (0, 4)]).await;
    client.wait_for_event("paused").await;

    let slot = client.slot.clone();
    client.disconnect().await;
    assert!(!slot.is_active());
    assert_eq!(finished(target).await, RunOutcome::Completed);
}

#[tokio::test]
async fn resume_without_a_pause_is_an_error() {
    let mut client = TestClient::start(sample_program());
    let reply = client.resume(None, Some("next")).await;
    assert_eq!(reply["type"], "error");
    assert!(reply["message"].as_str().unwrap().contains("not paused"));
    client.disconnect().await;
}

#[tokio::test]
async fn malformed_commands_are_answered_when_they_carry_an_id() {
    let mut client = TestClient::start(sample_program());

    let reply = client.call(json!({"type": "no-such-command"})).await;
    assert_eq!(reply["type"], "error", "{reply}");
    assert!(reply["message"]
        .as_str()
        .unwrap()
        .starts_with("malformed command"));

    // Without an id there is nobody to answer; the loop keeps going.
    client.send(json!({"type": "set-breakpoint"})).await;
    let rest = client.drain().await;
    assert!(rest.is_empty(), "{rest:?}");
    client.disconnect().await;
}
