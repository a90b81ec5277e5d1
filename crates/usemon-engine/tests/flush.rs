//! Flush cycles: scheduling, at-least-once dispatch, and shutdown.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod support;

use std::time::Duration;

use usemon_core::{Cadence, ErrorCode};

use support::{pairs, start, RecordingAdapter};

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn failed_send_keeps_data_until_success() {
    let adapter = RecordingAdapter::new();
    let monitor = start(&adapter);
    adapter.set_failing(true);

    monitor.start_measurement("render", Some("a")).unwrap();
    tokio::time::advance(Duration::from_millis(40)).await;
    monitor.end_measurement("render", "a").unwrap();

    let err = monitor.flush(Cadence::Default).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Dispatch);
    assert_eq!(monitor.measurement("render").unwrap().resolved_requests, 1);

    // more work lands before the retry; the retry is a superset
    monitor.start_measurement("render", Some("b")).unwrap();
    tokio::time::advance(Duration::from_millis(80)).await;
    monitor.end_measurement("render", "b").unwrap();

    adapter.set_failing(false);
    assert_eq!(monitor.flush(Cadence::Default).await.unwrap(), 2);
    assert_eq!(
        adapter.last(),
        pairs(&[("app.render.avg", 60.0), ("app.render.count", 2.0)])
    );

    // confirmed: nothing left for the same cadence
    assert_eq!(monitor.flush(Cadence::Default).await.unwrap(), 0);
    let state = monitor.measurement("render").unwrap();
    assert_eq!(state.resolved_requests, 0);
    assert_eq!(state.total, 0.0);
    assert!(state.entries.is_empty());

    let stats = monitor.render_stats();
    assert!(stats.contains("usemon_dispatch_total{outcome=\"failed\"} 1"), "{stats}");
    assert!(stats.contains("usemon_dispatch_total{outcome=\"ok\"} 1"), "{stats}");
}

#[tokio::test]
async fn empty_snapshot_makes_no_adapter_call() {
    let adapter = RecordingAdapter::new();
    let monitor = start(&adapter);

    assert_eq!(monitor.flush(Cadence::Default).await.unwrap(), 0);
    assert_eq!(monitor.flush(Cadence::Every(10)).await.unwrap(), 0);
    assert!(adapter.batches().is_empty());
}

#[tokio::test]
async fn pending_cadence_skips_new_send() {
    let adapter = RecordingAdapter::gated();
    let monitor = start(&adapter);
    let id = monitor.start_measurement("jobsDone", None).unwrap();
    monitor.end_measurement("jobsDone", &id).unwrap();

    let m = monitor.clone();
    let first = tokio::spawn(async move { m.flush(Cadence::Default).await });
    settle().await;
    assert!(!first.is_finished());

    // same cadence is busy: skipped, data kept
    assert_eq!(monitor.flush(Cadence::Default).await.unwrap(), 0);
    assert_eq!(monitor.measurement("jobsDone").unwrap().resolved_requests, 1);

    adapter.release(1);
    assert_eq!(first.await.unwrap().unwrap(), 1);
    assert_eq!(adapter.batches().len(), 1);
    assert_eq!(monitor.measurement("jobsDone").unwrap().resolved_requests, 0);
    assert!(monitor
        .render_stats()
        .contains("usemon_dispatch_total{outcome=\"skipped\"} 1"));
}

#[tokio::test(start_paused = true)]
async fn custom_cadence_has_its_own_timer() {
    let adapter = RecordingAdapter::new();
    let monitor = start(&adapter);

    monitor.start_measurement("websocketConnections", Some("c1")).unwrap();
    monitor.start_measurement("render", Some("r1")).unwrap();
    monitor.end_measurement("render", "r1").unwrap();

    // first 10s tick: only the ws gauge
    tokio::time::sleep(Duration::from_secs(11)).await;
    monitor.wait_idle().await;
    assert_eq!(adapter.batches().len(), 1);
    assert_eq!(adapter.last(), pairs(&[("app.ws.active", 1.0)]));

    // no activity since: the gauge is not repeated on the next 10s tick
    tokio::time::sleep(Duration::from_secs(10)).await;
    monitor.wait_idle().await;
    assert_eq!(adapter.batches().len(), 1);

    // default 60s tick carries render
    tokio::time::sleep(Duration::from_secs(40)).await;
    monitor.wait_idle().await;
    assert_eq!(
        adapter.last(),
        pairs(&[("app.render.avg", 0.0), ("app.render.count", 1.0)])
    );
}

#[tokio::test(start_paused = true)]
async fn registered_events_report_once() {
    let adapter = RecordingAdapter::new();
    let monitor = start(&adapter);

    monitor.register_event("cacheFlush").unwrap();
    assert_eq!(monitor.flush(Cadence::Default).await.unwrap(), 1);
    assert_eq!(adapter.last(), pairs(&[("app.cache.flush", 1.0)]));
    assert_eq!(monitor.measurement("cacheFlush").unwrap().active_requests, 0);

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(monitor.flush(Cadence::Default).await.unwrap(), 0);
}

#[tokio::test]
async fn immediate_event_during_send_is_reported_next_cycle() {
    let adapter = RecordingAdapter::gated();
    let monitor = start(&adapter);
    monitor.register_event("cacheFlush").unwrap();

    let m = monitor.clone();
    let first = tokio::spawn(async move { m.flush(Cadence::Default).await });
    settle().await;

    // lands after the snapshot was taken, before the send is confirmed
    monitor.register_event("cacheFlush").unwrap();
    adapter.release(1);
    assert_eq!(first.await.unwrap().unwrap(), 1);
    assert_eq!(adapter.last(), pairs(&[("app.cache.flush", 1.0)]));
    assert_eq!(monitor.measurement("cacheFlush").unwrap().active_requests, 1);

    adapter.release(1);
    assert_eq!(monitor.flush(Cadence::Default).await.unwrap(), 1);
    assert_eq!(adapter.last(), pairs(&[("app.cache.flush", 1.0)]));

    let state = monitor.measurement("cacheFlush").unwrap();
    assert_eq!(state.active_requests, 0);
    assert!(state.last_flush_at.is_some());

    adapter.release(1);
    assert_eq!(monitor.flush(Cadence::Default).await.unwrap(), 0);
    assert_eq!(adapter.batches().len(), 2);
}

#[tokio::test]
async fn close_waits_for_pending_failed_send() {
    let adapter = RecordingAdapter::gated();
    adapter.set_failing(true);
    let monitor = start(&adapter);

    let id = monitor.start_measurement("render", None).unwrap();
    monitor.end_measurement("render", &id).unwrap();

    let m = monitor.clone();
    let pending = tokio::spawn(async move { m.flush(Cadence::Default).await });
    settle().await;

    let m = monitor.clone();
    let closing = tokio::spawn(async move { m.close().await });
    settle().await;
    assert!(!closing.is_finished());
    assert!(!pending.is_finished());

    adapter.release(2);
    let outcome = closing.await.unwrap();
    assert_eq!(outcome.unwrap_err().code(), ErrorCode::Dispatch);
    assert_eq!(pending.await.unwrap().unwrap_err().code(), ErrorCode::Dispatch);

    // both attempts carried the same retained data
    let batches = adapter.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0], batches[1]);
    assert!(monitor.render_stats().contains("usemon_closing 1"));
    assert!(monitor.render_stats().contains("usemon_sends_in_flight 0"));
}

#[tokio::test]
async fn concurrent_closes_share_the_final_outcome() {
    let adapter = RecordingAdapter::gated();
    adapter.set_failing(true);
    let monitor = start(&adapter);

    let id = monitor.start_measurement("jobsDone", None).unwrap();
    monitor.end_measurement("jobsDone", &id).unwrap();

    let m = monitor.clone();
    let first = tokio::spawn(async move { m.close().await });
    settle().await;
    let m = monitor.clone();
    let second = tokio::spawn(async move { m.close().await });
    settle().await;
    assert!(!first.is_finished());
    assert!(!second.is_finished());

    adapter.release(1);
    assert_eq!(first.await.unwrap().unwrap_err().code(), ErrorCode::Dispatch);
    assert_eq!(second.await.unwrap().unwrap_err().code(), ErrorCode::Dispatch);

    // one final attempt only; a later close reports the same outcome
    assert_eq!(adapter.batches().len(), 1);
    assert_eq!(monitor.close().await.unwrap_err().code(), ErrorCode::Dispatch);
    assert_eq!(adapter.batches().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn close_flushes_every_cadence() {
    let adapter = RecordingAdapter::new();
    let monitor = start(&adapter);

    let c = monitor.start_measurement("websocketConnections", None).unwrap();
    monitor.end_measurement("websocketConnections", &c).unwrap();
    let id = monitor.start_measurement("render", None).unwrap();
    tokio::time::advance(Duration::from_millis(250)).await;
    monitor.end_measurement("render", &id).unwrap();

    // a stale gauge is still reported on shutdown
    tokio::time::advance(Duration::from_secs(5)).await;
    monitor.close().await.unwrap();

    assert_eq!(
        adapter.last(),
        pairs(&[
            ("app.render.avg", 250.0),
            ("app.render.count", 1.0),
            ("app.ws.active", 0.0),
        ])
    );
}

#[tokio::test]
async fn close_with_nothing_to_send_resolves() {
    let adapter = RecordingAdapter::new();
    let monitor = start(&adapter);
    monitor.close().await.unwrap();
    assert!(adapter.batches().is_empty());
}
