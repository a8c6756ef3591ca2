use serde_json::{json, Value};

use crate::harness::{
    finished, paused_actor, paused_line, sample_program, still_running, TestClient,
};
use lantern_debugger::host::scripted::RunOutcome;

#[tokio::test]
async fn breakpoint_pauses_until_resumed() {
    let mut client = TestClient::start(sample_program());
    let target = client.run_with_breakpoints(&[(10, 10)]).await;

    let paused = client.wait_for_event("paused").await;
    assert_eq!(paused["why"], json!({"type": "breakpoint"}));
    assert_eq!(paused["pipelineId"], json!(7));
    assert_eq!(paused_line(&paused), 7);

    let ack = client.resume(None, None).await;
    assert_eq!(ack["type"], "reply", "{ack}");
    assert_eq!(ack["body"], json!({}));

    let resumed = client.wait_for_event("resumed").await;
    assert_eq!(resumed["frameActorId"], json!(paused_actor(&paused)));
    assert!(resumed.get("resumeLimit").is_none(), "{resumed}");

    assert_eq!(finished(target).await, RunOutcome::Completed);
    client.disconnect().await;
}

#[tokio::test]
async fn cleared_breakpoint_never_pauses() {
    let mut client = TestClient::start(sample_program());
    client.attach(1, 7).await;
    client.load(1);
    client.set_breakpoint(10, 10).await;
    client.clear_breakpoint(10, 10).await;
    client.barrier().await;

    let target = client.spawn_execute(1);
    assert_eq!(finished(target).await, RunOutcome::Completed);
    let rest = client.drain().await;
    assert!(rest.iter().all(|msg| msg["type"] != "paused"), "{rest:?}");
    client.disconnect().await;
}

#[tokio::test]
async fn setting_the_same_breakpoint_twice_installs_one_hit() {
    let mut client = TestClient::start(sample_program());
    let target = client.run_with_breakpoints(&[(0, 4), (0, 4)]).await;

    client.wait_for_event("paused").await;
    client.resume(None, None).await;
    assert_eq!(finished(target).await, RunOutcome::Completed);

    let rest = client.drain().await;
    assert!(
        rest.iter().all(|msg| msg["type"] != "paused"),
        "second pause at the same offset: {rest:?}"
    );
    client.disconnect().await;
}

#[tokio::test]
async fn one_clear_removes_a_doubly_set_breakpoint() {
    let mut client = TestClient::start(sample_program());
    client.attach(1, 7).await;
    client.load(1);
    client.set_breakpoint(0, 4).await;
    client.set_breakpoint(0, 4).await;
    client.clear_breakpoint(0, 4).await;
    client.barrier().await;

    let target = client.spawn_execute(1);
    assert_eq!(finished(target).await, RunOutcome::Completed);
    let rest = client.drain().await;
    assert!(rest.iter().all(|msg| msg["type"] != "paused"), "{rest:?}");
    client.disconnect().await;
}

#[tokio::test]
async fn breakpoint_in_unknown_script_is_dropped_silently() {
    let mut client = TestClient::start(sample_program());
    let target = client.run_with_breakpoints(&[(99, 0)]).await;

    assert_eq!(finished(target).await, RunOutcome::Completed);
    let rest = client.drain().await;
    assert!(
        rest.iter()
            .all(|msg| msg["type"] != "paused" && msg["type"] != "error"),
        "{rest:?}"
    );
    client.disconnect().await;
}

#[tokio::test]
async fn paused_target_keeps_serving_unrelated_requests() {
    let mut client = TestClient::start(sample_program());
    let mut target = client.run_with_breakpoints(&[(10, 10)]).await;
    let paused = client.wait_for_event("paused").await;
    let actor = paused_actor(&paused);

    let eval = client
        .call(json!({"type": "eval", "code": "42", "pipelineId": 7}))
        .await;
    assert_eq!(eval["type"], "reply", "{eval}");
    assert_eq!(eval.pointer("/body/numberValue"), Some(&json!(42.0)));

    let positions = client
        .call(json!({"type": "get-possible-breakpoints", "sourceId": 1}))
        .await;
    assert_eq!(positions["type"], "reply", "{positions}");

    // A resume for some other frame is refused and the pause stays.
    let refused = client.resume(Some("frame999"), None).await;
    assert_eq!(refused["type"], "error", "{refused}");
    assert!(still_running(&mut target).await);
    assert!(client.session.is_paused());
    assert_eq!(client.session.paused_frame_actor().unwrap().as_str(), actor);

    let ack = client.resume(Some(&actor), None).await;
    assert_eq!(ack["type"], "reply", "{ack}");
    assert_eq!(finished(target).await, RunOutcome::Completed);
    client.disconnect().await;
}

#[tokio::test]
async fn an_activation_keeps_one_frame_actor() {
    let mut client = TestClient::start(sample_program());
    let target = client.run_with_breakpoints(&[(0, 0), (10, 10), (0, 4)]).await;

    let first = client.wait_for_event("paused").await;
    let registered = client.wait_for_event("frame-registered").await;
    let global = paused_actor(&first);
    assert_eq!(registered.pointer("/frame/actor"), Some(&json!(global)));
    assert_eq!(registered.pointer("/frame/kind"), Some(&json!("global")));
    assert_eq!(registered.pointer("/frame/url"), Some(&json!(crate::harness::URL)));
    client.resume(None, None).await;

    let in_f = client.wait_for_event("paused").await;
    assert_ne!(paused_actor(&in_f), global);
    client.resume(None, None).await;

    let again = client.wait_for_event("paused").await;
    assert_eq!(paused_actor(&again), global);
    assert_eq!(paused_line(&again), 3);
    client.resume(None, None).await;
    assert_eq!(finished(target).await, RunOutcome::Completed);

    let rest = client.drain().await;
    let registrations: Vec<_> = rest
        .iter()
        .filter(|msg| msg["type"] == "frame-registered")
        .collect();
    assert_eq!(
        registrations.len(),
        1,
        "only f's frame is new after the first pause: {registrations:?}"
    );
    client.disconnect().await;
}

#[tokio::test]
async fn a_second_pause_is_refused_while_one_is_outstanding() {
    let mut client = TestClient::start(sample_program());
    client.attach(1, 7).await;
    client.attach(2, 8).await;
    client.load(1);
    client.set_breakpoint(10, 10).await;
    client.barrier().await;

    let mut first = client.spawn_execute(1);
    let paused = client.wait_for_event("paused").await;
    assert_eq!(paused["pipelineId"], json!(7));
    let actor = paused_actor(&paused);

    // The other global hits the same breakpoint and runs on unobserved.
    let second = client.spawn_execute(2);
    assert_eq!(finished(second).await, RunOutcome::Completed);
    assert!(still_running(&mut first).await);
    assert_eq!(client.session.paused_frame_actor().unwrap().as_str(), actor);

    let rest = client.drain().await;
    assert!(
        rest.iter().all(|msg| msg["type"] != "paused"),
        "second pause reported: {rest:?}"
    );

    client.resume(Some(&actor), None).await;
    assert_eq!(finished(first).await, RunOutcome::Completed);
    client.disconnect().await;
}

#[tokio::test]
async fn paused_stack_is_listed_youngest_first() {
    let mut client = TestClient::start(sample_program());
    let not_paused = client.call(json!({"type": "get-frames"})).await;
    assert_eq!(not_paused["type"], "error", "{not_paused}");

    let target = client.run_with_breakpoints(&[(30, 30)]).await;
    let paused = client.wait_for_event("paused").await;

    let reply = client.call(json!({"type": "get-frames"})).await;
    assert_eq!(reply["type"], "reply", "{reply}");
    let frames = reply
        .pointer("/body/frames")
        .and_then(Value::as_array)
        .expect("frames array")
        .clone();
    assert_eq!(frames.len(), 3, "{frames:?}");

    assert_eq!(frames[0]["actor"], json!(paused_actor(&paused)));
    assert_eq!(frames[0]["name"], "h");
    assert_eq!(frames[0]["line"], json!(11));

    assert_eq!(frames[1]["name"], "f");
    assert_eq!(frames[1]["kind"], "call");
    assert_eq!(frames[1]["offset"], json!(12));
    assert_eq!(frames[1]["line"], json!(8));

    assert_eq!(frames[2]["kind"], "global");
    assert!(frames[2].get("name").is_none(), "{}", frames[2]);
    assert_eq!(frames[2]["line"], json!(2));

    // Listing again hands out the same actors.
    let again = client.call(json!({"type": "get-frames"})).await;
    let actors: Vec<_> = again
        .pointer("/body/frames")
        .and_then(Value::as_array)
        .expect("frames array")
        .iter()
        .map(|frame| frame["actor"].clone())
        .collect();
    let first: Vec<_> = frames.iter().map(|frame| frame["actor"].clone()).collect();
    assert_eq!(actors, first);

    // A caller's actor does not name the paused frame.
    let caller = frames[1]["actor"].as_str().unwrap().to_owned();
    let ack = client.resume(Some(&caller), None).await;
    assert_eq!(ack["type"], "error", "{ack}");

    client.resume(None, None).await;
    assert_eq!(finished(target).await, RunOutcome::Completed);
    client.disconnect().await;
}
