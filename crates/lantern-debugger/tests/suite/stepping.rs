use serde_json::json;

use crate::harness::{finished, paused_actor, paused_line, sample_program, TestClient, SOURCE};
use lantern_debugger::host::scripted::RunOutcome;
use lantern_debugger::ids::{ScriptId, ScriptLocation, SourceId};

fn at(script: u32, offset: u32) -> (ScriptLocation, u32) {
    (ScriptLocation::new(SourceId(SOURCE), ScriptId(script)), offset)
}

#[tokio::test]
async fn next_steps_over_calls() {
    let mut client = TestClient::start(sample_program());
    let target = client.run_with_breakpoints(&[(0, 2)]).await;

    let at_call = client.wait_for_event("paused").await;
    assert_eq!(paused_line(&at_call), 2);
    client.resume(None, Some("next")).await;

    let resumed = client.wait_for_event("resumed").await;
    assert_eq!(resumed["resumeLimit"], "next");

    let stepped = client.wait_for_event("paused").await;
    assert_eq!(stepped["why"], json!({"type": "resume-limit"}));
    assert_eq!(paused_line(&stepped), 3);
    assert_eq!(paused_actor(&stepped), paused_actor(&at_call));

    // The callee ran to completion without stopping.
    let trace = client.host.trace();
    assert!(trace.contains(&at(10, 14)));
    assert!(trace.contains(&at(30, 32)));

    client.resume(None, None).await;
    assert_eq!(finished(target).await, RunOutcome::Completed);
    let rest = client.drain().await;
    assert!(rest.iter().all(|msg| msg["type"] != "paused"), "{rest:?}");
    client.disconnect().await;
}

#[tokio::test]
async fn step_enters_the_callee() {
    let mut client = TestClient::start(sample_program());
    let target = client.run_with_breakpoints(&[(0, 2)]).await;

    let at_call = client.wait_for_event("paused").await;
    client.resume(None, Some("step")).await;

    let inside = client.wait_for_event("paused").await;
    assert_eq!(inside["why"], json!({"type": "resume-limit"}));
    assert_eq!(paused_line(&inside), 7);
    assert_ne!(paused_actor(&inside), paused_actor(&at_call));

    // A plain continue drops every step hook.
    client.resume(None, None).await;
    assert_eq!(finished(target).await, RunOutcome::Completed);
    let rest = client.drain().await;
    assert!(rest.iter().all(|msg| msg["type"] != "paused"), "{rest:?}");
    assert!(!client.host.enter_hook_enabled());
    client.disconnect().await;
}

#[tokio::test]
async fn steps_only_stop_at_step_boundaries() {
    let mut client = TestClient::start(sample_program());
    let target = client.run_with_breakpoints(&[(20, 20)]).await;

    let start = client.wait_for_event("paused").await;
    assert_eq!(paused_line(&start), 14);
    client.resume(None, Some("next")).await;

    let stepped = client.wait_for_event("paused").await;
    assert_eq!(paused_line(&stepped), 15, "offset 21 is mid-step: {stepped}");
    assert_eq!(stepped["frame"]["column"], json!(0));

    client.resume(None, None).await;
    assert_eq!(finished(target).await, RunOutcome::Completed);
    client.disconnect().await;
}

#[tokio::test]
async fn finish_pauses_when_the_frame_returns() {
    let mut client = TestClient::start(sample_program());
    let target = client.run_with_breakpoints(&[(10, 10)]).await;

    let in_f = client.wait_for_event("paused").await;
    client.resume(None, Some("finish")).await;

    let returning = client.wait_for_event("paused").await;
    assert_eq!(returning["why"], json!({"type": "resume-limit"}));
    assert_eq!(paused_actor(&returning), paused_actor(&in_f));
    assert_eq!(paused_line(&returning), 9);

    client.resume(None, None).await;
    assert_eq!(finished(target).await, RunOutcome::Completed);
    client.disconnect().await;
}

/// Pause at f's return point, then resume with `limit` from there.
async fn step_from_completed_frame(limit: &str) -> (u64, String, String) {
    let mut client = TestClient::start(sample_program());
    let target = client.run_with_breakpoints(&[(10, 10)]).await;

    client.wait_for_event("paused").await;
    client.resume(None, Some("finish")).await;
    let returning = client.wait_for_event("paused").await;
    client.wait_for_event("resumed").await;

    client.resume(None, Some(limit)).await;
    let resumed = client.wait_for_event("resumed").await;
    let in_caller = client.wait_for_event("paused").await;
    assert_ne!(paused_actor(&in_caller), paused_actor(&returning));

    client.resume(None, None).await;
    assert_eq!(finished(target).await, RunOutcome::Completed);
    client.disconnect().await;

    (
        paused_line(&in_caller),
        resumed["resumeLimit"].as_str().unwrap_or_default().to_owned(),
        in_caller["why"]["type"].as_str().unwrap_or_default().to_owned(),
    )
}

#[tokio::test]
async fn finish_from_a_completed_frame_is_next_in_the_caller() {
    let finish = step_from_completed_frame("finish").await;
    let next = step_from_completed_frame("next").await;

    assert_eq!(finish, next);
    assert_eq!(finish, (3, "next".to_owned(), "resume-limit".to_owned()));
}

#[tokio::test]
async fn stepping_past_a_return_stops_in_the_caller() {
    let mut client = TestClient::start(sample_program());
    let target = client.run_with_breakpoints(&[(30, 32)]).await;

    let in_h = client.wait_for_event("paused").await;
    assert_eq!(paused_line(&in_h), 12);
    client.resume(None, Some("next")).await;

    let in_f = client.wait_for_event("paused").await;
    assert_eq!(in_f["why"], json!({"type": "resume-limit"}));
    assert_eq!(paused_line(&in_f), 9);
    assert_ne!(paused_actor(&in_f), paused_actor(&in_h));

    client.resume(None, None).await;
    assert_eq!(finished(target).await, RunOutcome::Completed);
    client.disconnect().await;
}
