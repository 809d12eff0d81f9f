//! Controller behaviour under paused tokio time.
//!
//! Every test runs with `start_paused = true`: the clock only moves when
//! all tasks are idle, jumping straight to the next timer. Ticks, throttle
//! windows, fetch delays and timeouts are therefore exact.

mod common;

use std::time::Duration;

use common::*;
use playback::{
    FetchError, FrameError, PlaybackConfig, PlaybackError, PlaybackEvent, PlaybackMode,
};
use radar_common::{FrameLabeler, TimestampLabeler};
use test_utils::{drain, manifest_json, time::REFERENCE_TS};

fn server_error(reference: &str) -> FetchError {
    FetchError::Status {
        url: reference.to_string(),
        status: 500,
    }
}

// ============================================================================
// Epochs
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_replace_epoch_plays_from_latest_frame() {
    let timeline = frames("", 5);
    let mut h = spawn(with_frames(MockSource::new(), "", &timeline), test_config());

    h.handle.replace_epoch(timeline.clone()).await.unwrap();

    let (event, before) = h.wait_for(|e| ready_index(e).is_some()).await;
    assert!(matches!(before[0], PlaybackEvent::StateChanged(PlaybackMode::Playing)));
    assert_eq!(label_index(&before[1]), Some(4));

    match event {
        PlaybackEvent::FrameReady { index, label, areas } => {
            assert_eq!(index, 4);
            assert_eq!(label, TimestampLabeler::default().label(timeline[4].timestamp));
            assert_eq!(areas.len(), 1);
            assert_eq!(areas[0].color_hex, frame_color("", 4));
            assert_eq!(areas[0].polygons.len(), 1);
        }
        other => panic!("unexpected event {:?}", other),
    }

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state.mode, PlaybackMode::Playing);
    assert_eq!(snapshot.state.current_index, 4);
    assert_eq!(snapshot.visible_index, Some(4));
    assert_eq!(snapshot.len, 5);
}

#[tokio::test(start_paused = true)]
async fn test_result_from_previous_epoch_is_discarded() {
    let old = frames("old/", 3);
    let new = frames("new/", 2);

    let source = MockSource::new()
        .respond_after(old[2].reference.clone(), frame_payload("old/", 2), Duration::from_secs(5));
    let source = with_frames(source, "new/", &new);
    let mut h = spawn(source, test_config());

    h.handle.replace_epoch(old).await.unwrap();
    h.handle.replace_epoch(new).await.unwrap();

    let (index, color) = h.next_ready().await;
    assert_eq!(index, 1);
    assert_eq!(color, frame_color("new/", 1));
    h.handle.pause().await.unwrap();

    // Let the slow fetch from the first epoch land
    tokio::time::sleep(Duration::from_secs(10)).await;

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.epoch, 2);
    assert_eq!(snapshot.state.current_index, 1);
    assert_eq!(snapshot.visible_index, Some(1));
    assert_eq!(snapshot.metrics.stale, 1);
    assert_eq!(snapshot.metrics.errors, 0);
    assert_eq!(snapshot.cache.entries, 1);

    let late: Vec<_> = drain(&mut h.events)
        .into_iter()
        .filter(|e| ready_index(e).is_some() || matches!(e, PlaybackEvent::FrameLoadError(_)))
        .collect();
    assert!(late.is_empty(), "stale result leaked: {:?}", late);
}

#[tokio::test(start_paused = true)]
async fn test_empty_epoch_reports_no_data() {
    let mut h = spawn(MockSource::new(), test_config());

    h.handle.replace_epoch(Vec::new()).await.unwrap();
    let (_, before) = h.wait_for(|e| matches!(e, PlaybackEvent::NoData)).await;
    assert!(before.is_empty());

    h.handle.play().await.unwrap();
    h.handle.scrub(3).await.unwrap();
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state.mode, PlaybackMode::Stopped);
    assert_eq!(snapshot.len, 0);
    assert!(h.source.fetched().is_empty());
}

// ============================================================================
// Autoplay
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_ticks_wrap_around() {
    let timeline = frames("", 5);
    let mut h = spawn(with_frames(MockSource::new(), "", &timeline), test_config());

    h.handle.replace_epoch(timeline.clone()).await.unwrap();
    assert_eq!(h.next_ready().await.0, 4);

    let start = tokio::time::Instant::now();
    let mut seen = Vec::new();
    for _ in 0..5 {
        seen.push(h.next_ready().await.0);
    }
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    assert!(start.elapsed() >= Duration::from_secs(5));

    // Returning to the latest frame is served from the cache
    assert_eq!(h.source.fetch_count(&timeline[4].reference), 1);
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.metrics.cache_hits, 1);
}

#[tokio::test(start_paused = true)]
async fn test_pause_stops_ticking() {
    let timeline = frames("", 3);
    let mut h = spawn(with_frames(MockSource::new(), "", &timeline), test_config());

    h.handle.replace_epoch(timeline).await.unwrap();
    h.next_ready().await;
    h.handle.pause().await.unwrap();
    h.wait_for(|e| matches!(e, PlaybackEvent::StateChanged(PlaybackMode::Stopped)))
        .await;

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(drain(&mut h.events).is_empty());
    assert_eq!(h.source.fetched().len(), 1);

    h.handle.play().await.unwrap();
    assert_eq!(h.next_ready().await.0, 0);
}

#[tokio::test(start_paused = true)]
async fn test_failure_keeps_last_geometry_and_keeps_ticking() {
    let timeline = frames("", 3);
    let source = with_frames(MockSource::new(), "", &timeline)
        .fail(timeline[0].reference.clone(), server_error(&timeline[0].reference));
    let mut h = spawn(source, test_config());

    h.handle.replace_epoch(timeline).await.unwrap();
    assert_eq!(h.next_ready().await.0, 2);

    let (event, _) = h
        .wait_for(|e| matches!(e, PlaybackEvent::FrameLoadError(_)))
        .await;
    match event {
        PlaybackEvent::FrameLoadError(err) => {
            assert_eq!(err.index, 0);
            assert!(matches!(
                err.cause,
                FrameError::Fetch(FetchError::Status { status: 500, .. })
            ));
        }
        other => panic!("unexpected event {:?}", other),
    }

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.visible_index, Some(2));
    assert_eq!(snapshot.state.mode, PlaybackMode::Playing);
    assert_eq!(snapshot.metrics.errors, 1);

    assert_eq!(h.next_ready().await.0, 1);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_payload_is_a_frame_error() {
    let timeline = frames("", 2);
    let source = MockSource::new()
        .respond(timeline[1].reference.clone(), &br#"{"coords": {"x_min": 1}}"#[..]);
    let mut h = spawn(source, test_config());

    h.handle.replace_epoch(timeline).await.unwrap();
    let (event, _) = h
        .wait_for(|e| matches!(e, PlaybackEvent::FrameLoadError(_)))
        .await;
    match event {
        PlaybackEvent::FrameLoadError(err) => {
            assert_eq!(err.index, 1);
            assert!(matches!(err.cause, FrameError::Codec(_)));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_hanging_fetch_times_out() {
    let timeline = frames("", 2);
    let source = MockSource::new().hang(timeline[1].reference.clone());
    let config = PlaybackConfig {
        fetch_timeout_secs: 2,
        tick_interval_ms: 60_000,
        ..test_config()
    };
    let mut h = spawn(source, config);

    let start = tokio::time::Instant::now();
    h.handle.replace_epoch(timeline).await.unwrap();
    let (event, _) = h
        .wait_for(|e| matches!(e, PlaybackEvent::FrameLoadError(_)))
        .await;

    assert!(start.elapsed() >= Duration::from_secs(2));
    assert!(start.elapsed() < Duration::from_secs(60));
    match event {
        PlaybackEvent::FrameLoadError(err) => {
            assert!(matches!(err.cause, FrameError::Fetch(FetchError::Timeout(_))));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_is_retried() {
    let timeline = frames("", 1);
    let source = MockSource::new().fail_times(
        timeline[0].reference.clone(),
        1,
        server_error(&timeline[0].reference),
        frame_payload("", 0),
    );
    let config = PlaybackConfig {
        max_retries: 2,
        ..test_config()
    };
    let mut h = spawn(source, config);

    h.handle.replace_epoch(timeline.clone()).await.unwrap();
    assert_eq!(h.next_ready().await.0, 0);
    assert_eq!(h.source.fetch_count(&timeline[0].reference), 2);
}

#[tokio::test(start_paused = true)]
async fn test_hung_attempt_is_retried_within_fetch_timeout() {
    let timeline = frames("", 1);
    let source = MockSource::new().hang_once(timeline[0].reference.clone(), frame_payload("", 0));
    let config = PlaybackConfig {
        max_retries: 1,
        request_timeout_secs: 2,
        fetch_timeout_secs: 30,
        tick_interval_ms: 60_000,
        ..test_config()
    };
    let mut h = spawn(source, config);

    let start = tokio::time::Instant::now();
    h.handle.replace_epoch(timeline.clone()).await.unwrap();
    assert_eq!(h.next_ready().await.0, 0);

    assert!(start.elapsed() >= Duration::from_secs(2));
    assert!(start.elapsed() < Duration::from_secs(30));
    assert_eq!(h.source.fetch_count(&timeline[0].reference), 2);
    assert_eq!(h.handle.snapshot().await.unwrap().metrics.errors, 0);
}

// ============================================================================
// Scrubbing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_scrubs_in_one_window_fetch_only_the_last() {
    let timeline = frames("", 10);
    let mut h = spawn(with_frames(MockSource::new(), "", &timeline), test_config());

    h.handle.replace_epoch(timeline.clone()).await.unwrap();
    assert_eq!(h.next_ready().await.0, 9);

    for index in [1, 5, 3, 7] {
        h.handle.scrub(index).await.unwrap();
    }

    let (event, before) = h.wait_for(|e| ready_index(e).is_some()).await;
    assert_eq!(ready_index(&event), Some(7));

    // Every scrub updates the label immediately
    let labels: Vec<usize> = before.iter().filter_map(label_index).collect();
    assert_eq!(labels, vec![1, 5, 3, 7]);
    assert!(matches!(before[0], PlaybackEvent::StateChanged(PlaybackMode::Scrubbing)));

    assert_eq!(
        h.source.fetched(),
        vec![timeline[9].reference.clone(), timeline[7].reference.clone()]
    );

    // Scrubbing does not resume autoplay
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(drain(&mut h.events).is_empty());
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state.mode, PlaybackMode::Scrubbing);
    assert_eq!(snapshot.visible_index, Some(7));
}

#[tokio::test(start_paused = true)]
async fn test_scrub_is_clamped() {
    let timeline = frames("", 3);
    let mut h = spawn(with_frames(MockSource::new(), "", &timeline), test_config());

    h.handle.replace_epoch(timeline).await.unwrap();
    h.next_ready().await;
    h.handle.scrub(1).await.unwrap();
    assert_eq!(h.next_ready().await.0, 1);

    h.handle.scrub(42).await.unwrap();
    assert_eq!(h.next_ready().await.0, 2);
}

#[tokio::test(start_paused = true)]
async fn test_scrub_supersedes_slow_tick_fetch() {
    let timeline = frames("", 5);
    let source = with_frames(MockSource::new(), "", &timeline).respond_after(
        timeline[0].reference.clone(),
        frame_payload("", 0),
        Duration::from_secs(3),
    );
    let mut h = spawn(source, test_config());

    h.handle.replace_epoch(timeline).await.unwrap();
    assert_eq!(h.next_ready().await.0, 4);

    // The first tick dispatches frame 0, which takes 3 s to arrive
    h.wait_for(|e| label_index(e) == Some(0)).await;
    h.handle.scrub(2).await.unwrap();
    assert_eq!(h.next_ready().await.0, 2);

    tokio::time::sleep(Duration::from_secs(5)).await;
    let late: Vec<_> = drain(&mut h.events).into_iter().filter_map(|e| ready_index(&e)).collect();
    assert!(late.is_empty());

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.visible_index, Some(2));
    assert_eq!(snapshot.metrics.stale, 1);
    // Only the frames actually shown were cached
    assert_eq!(snapshot.cache.entries, 2);
}

#[tokio::test(start_paused = true)]
async fn test_failure_of_superseded_fetch_is_silent() {
    let timeline = frames("", 5);
    let source = with_frames(MockSource::new(), "", &timeline).fail_after(
        timeline[0].reference.clone(),
        server_error(&timeline[0].reference),
        Duration::from_secs(3),
    );
    let mut h = spawn(source, test_config());

    h.handle.replace_epoch(timeline).await.unwrap();
    assert_eq!(h.next_ready().await.0, 4);

    // Frame 0 is dispatched by the first tick and fails 3 s later
    h.wait_for(|e| label_index(e) == Some(0)).await;
    h.handle.scrub(2).await.unwrap();
    assert_eq!(h.next_ready().await.0, 2);

    tokio::time::sleep(Duration::from_secs(5)).await;
    let errors: Vec<_> = drain(&mut h.events)
        .into_iter()
        .filter(|e| matches!(e, PlaybackEvent::FrameLoadError(_)))
        .collect();
    assert!(errors.is_empty(), "superseded failure reported: {:?}", errors);

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.visible_index, Some(2));
    assert_eq!(snapshot.metrics.errors, 0);
    assert_eq!(snapshot.metrics.stale, 1);
}

#[tokio::test(start_paused = true)]
async fn test_play_after_scrub_continues_from_scrubbed_frame() {
    let timeline = frames("", 5);
    let mut h = spawn(with_frames(MockSource::new(), "", &timeline), test_config());

    h.handle.replace_epoch(timeline).await.unwrap();
    h.next_ready().await;
    h.handle.scrub(1).await.unwrap();
    assert_eq!(h.next_ready().await.0, 1);

    h.handle.play().await.unwrap();
    h.wait_for(|e| matches!(e, PlaybackEvent::StateChanged(PlaybackMode::Playing)))
        .await;
    assert_eq!(h.next_ready().await.0, 2);
}

#[tokio::test(start_paused = true)]
async fn test_scrub_to_timestamp_selects_nearest_frame() {
    let timeline = frames("", 5);
    let mut h = spawn(with_frames(MockSource::new(), "", &timeline), test_config());

    h.handle.replace_epoch(timeline.clone()).await.unwrap();
    h.next_ready().await;

    h.handle
        .scrub_to_timestamp(timeline[2].timestamp + 100)
        .await
        .unwrap();
    assert_eq!(h.next_ready().await.0, 2);
}

// ============================================================================
// Manifests and lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_load_manifest_installs_epoch() {
    let timeline = frames("", 4);
    let source = with_frames(MockSource::new(), "", &timeline)
        .respond("manifest.json", manifest_json(4, REFERENCE_TS, 300).into_bytes());
    let mut h = spawn(source, test_config());

    assert_eq!(h.handle.load_manifest("manifest.json").await.unwrap(), 4);
    assert_eq!(h.next_ready().await.0, 3);
}

#[tokio::test(start_paused = true)]
async fn test_manifest_failure_reports_no_data() {
    let timeline = frames("", 3);
    let mut h = spawn(with_frames(MockSource::new(), "", &timeline), test_config());

    h.handle.replace_epoch(timeline).await.unwrap();
    h.next_ready().await;

    let err = h.handle.load_manifest("missing.json").await.unwrap_err();
    assert!(matches!(err, PlaybackError::Manifest(_)));

    h.wait_for(|e| matches!(e, PlaybackEvent::NoData)).await;
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.len, 0);
    assert_eq!(snapshot.state.mode, PlaybackMode::Stopped);
    assert_eq!(snapshot.visible_index, None);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = PlaybackConfig {
        tick_interval_ms: 0,
        ..test_config()
    };
    let result = playback::PlaybackController::spawn(
        std::sync::Arc::new(MockSource::new()),
        config,
        std::sync::Arc::new(TimestampLabeler::default()),
    );
    assert!(matches!(result, Err(PlaybackError::Config(_))));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_handle() {
    let h = spawn(MockSource::new(), test_config());

    h.handle.shutdown().await.unwrap();
    h.task.await.unwrap();

    assert!(matches!(h.handle.play().await, Err(PlaybackError::Closed)));
}
