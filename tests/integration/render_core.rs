//! Render core driven by commands, mood results and the scheduler.

use std::sync::Arc;

use aquamood::app::commands::{AppCommand, CommandQueue};
use aquamood::app::events::{AppEvent, CareEvent};
use aquamood::app::service::{RenderCore, RenderDriver};
use aquamood::config::SystemConfig;
use aquamood::coord::channels::CoordLinks;
use aquamood::coord::mood_task::MoodTask;
use aquamood::diagnostics::CoordinatorStats;
use aquamood::frames::frame_buffers;
use aquamood::mood::{self, MoodCategory, ParameterSnapshot};
use aquamood::scheduler::RenderScheduler;

use crate::mock_ports::{ManualClock, MemoryLog, RecordingSink, Screen, small_config};

const T0: u64 = 50_000;

fn render(config: SystemConfig) -> (RenderCore, Arc<CoordLinks>, Arc<CoordinatorStats>) {
    let stats = Arc::new(CoordinatorStats::new());
    let links = Arc::new(CoordLinks::new());
    let (_writer, reader) = frame_buffers(config.frame_bytes());
    let core = RenderCore::new(config, Arc::clone(&links), reader, Arc::clone(&stats), T0);
    (core, links, stats)
}

/// Nitrate in the warning band, everything else ideal.
fn sad_snapshot() -> ParameterSnapshot {
    ParameterSnapshot {
        ammonia_ppm: 0.0,
        nitrite_ppm: 0.0,
        nitrate_ppm: 65.0,
        ph: 7.0,
        last_feed_secs: T0,
        last_water_change_secs: T0,
        feed_interval_secs: 8 * 3600,
        water_change_interval_secs: 7 * 86_400,
    }
}

/// Evaluate everything queued for the mood task, as the task would.
fn run_mood_task(links: &CoordLinks, stats: &Arc<CoordinatorStats>) -> usize {
    let task = MoodTask::new(ManualClock::at(T0), Arc::clone(stats));
    let mut n = 0;
    while let Ok(snapshot) = links.snapshots.try_receive() {
        links
            .mood_results
            .try_send(task.handle(&snapshot))
            .expect("result channel has room");
        n += 1;
    }
    n
}

#[test]
fn category_change_switches_frames_and_asks_for_advice() {
    let (mut core, links, _) = render(small_config());
    let mut sink = RecordingSink::new();

    let result = mood::evaluate(&sad_snapshot(), T0);
    assert_eq!(result.category, MoodCategory::Sad);
    links.mood_results.try_send(result).expect("room");

    let applied = core.poll_mood_result(T0, &mut sink).expect("result applied");
    assert_eq!(applied.category, MoodCategory::Sad);
    assert_eq!(core.category(), MoodCategory::Sad);
    assert_eq!(sink.mood_changes(), 1);

    assert_eq!(links.frame_requests.try_take(), Some(4));
    let request = links.advisory_requests.try_take().expect("advisory requested");
    assert_eq!(request.category, MoodCategory::Sad);
}

#[test]
fn unchanged_category_is_quiet() {
    let (mut core, links, _) = render(small_config());
    let mut sink = RecordingSink::new();

    let happy = mood::evaluate(core.snapshot(), T0);
    assert_eq!(happy.category, MoodCategory::Happy);
    links.mood_results.try_send(happy).expect("room");
    assert!(core.poll_mood_result(T0, &mut sink).is_some());

    assert!(core.last_result().is_some());
    assert_eq!(sink.mood_changes(), 0);
    assert!(links.advisory_requests.try_take().is_none());
    assert!(links.frame_requests.try_take().is_none());
}

#[test]
fn only_the_newest_result_is_applied() {
    let (mut core, links, _) = render(small_config());
    let mut sink = RecordingSink::new();

    links
        .mood_results
        .try_send(mood::evaluate(&sad_snapshot(), T0))
        .expect("room");
    links
        .mood_results
        .try_send(mood::evaluate(core.snapshot(), T0))
        .expect("room");

    core.poll_mood_result(T0, &mut sink);
    assert_eq!(core.category(), MoodCategory::Happy);
    assert_eq!(sink.mood_changes(), 0);
}

#[test]
fn commands_log_care_events_and_queue_snapshots() {
    let (mut core, links, stats) = render(small_config());
    let mut sink = RecordingSink::new();
    let mut log = MemoryLog::default();
    let queue = CommandQueue::new();

    queue.try_send(AppCommand::RecordFeed).expect("room");
    queue
        .try_send(AppCommand::SetParameters(sad_snapshot()))
        .expect("room");
    queue.try_send(AppCommand::RecordWaterChange).expect("room");

    while let Ok(cmd) = queue.try_receive() {
        core.handle_command(cmd, T0 + 60, &mut log, &mut sink);
    }

    assert_eq!(log.records.len(), 3);
    assert_eq!(log.records[0], CareEvent::Fed { at_secs: T0 + 60 });
    assert!(matches!(log.records[1], CareEvent::ParameterReading { nitrate_ppm, .. } if nitrate_ppm == 65.0));
    assert_eq!(log.records[2], CareEvent::WaterChanged { at_secs: T0 + 60 });
    assert_eq!(core.snapshot().last_water_change_secs, T0 + 60);

    // Two snapshots fit the channel; the third waits on the render side.
    assert!(core.has_pending_snapshot());
    assert_eq!(run_mood_task(&links, &stats), 2);

    core.poll_mood_result(T0 + 60, &mut sink);
    assert!(!core.has_pending_snapshot());
    assert_eq!(core.category(), MoodCategory::Sad);

    // The retried snapshot is the latest one.
    let retried = links.snapshots.try_receive().expect("pending snapshot submitted");
    assert_eq!(retried.last_water_change_secs, T0 + 60);
    assert_eq!(retried.nitrate_ppm, 65.0);
}

#[test]
fn broken_log_does_not_block_evaluation() {
    let (mut core, links, _) = render(small_config());
    let mut log = MemoryLog {
        broken: true,
        ..Default::default()
    };

    core.record_feed(T0 + 1, &mut log);
    assert!(log.records.is_empty());
    let submitted = links.snapshots.try_receive().expect("snapshot queued");
    assert_eq!(submitted.last_feed_secs, T0 + 1);
}

#[test]
fn config_update_keeps_frame_geometry() {
    let (mut core, _, _) = render(small_config());
    let mut sink = RecordingSink::new();
    let mut log = MemoryLog::default();

    let update = SystemConfig {
        frames_per_category: 2,
        advisory_min_interval_secs: 60,
        ..small_config()
    };
    core.handle_command(AppCommand::UpdateConfig(update), T0, &mut log, &mut sink);
    assert_eq!(core.config().frames_per_category, 4);
    assert_eq!(core.config().advisory_min_interval_secs, 60);

    let invalid = SystemConfig {
        quota_cooldown_secs: 0,
        ..small_config()
    };
    core.handle_command(AppCommand::UpdateConfig(invalid), T0, &mut log, &mut sink);
    assert_eq!(core.config().quota_cooldown_secs, small_config().quota_cooldown_secs);
}

#[test]
fn scheduler_routes_timers_to_the_core() {
    let config = small_config();
    let (mut core, links, _) = render(config.clone());
    let mut sched = RenderScheduler::new(&config);
    let mut display = Screen::default();
    let mut events = RecordingSink::new();
    core.start(&mut events);
    assert_eq!(links.frame_requests.try_take(), Some(0));

    links
        .mood_results
        .try_send(mood::evaluate(&sad_snapshot(), T0))
        .expect("room");
    let mut driver = RenderDriver {
        core: &mut core,
        display: &mut display,
        events: &mut events,
        now: T0,
    };
    sched.tick(config.mood_poll_interval_ms, &mut driver);
    assert_eq!(core.category(), MoodCategory::Sad);

    let mut driver = RenderDriver {
        core: &mut core,
        display: &mut display,
        events: &mut events,
        now: T0 + 30,
    };
    sched.tick(config.telemetry_interval_secs * 1000, &mut driver);

    assert!(matches!(events.events.first(), Some(AppEvent::Started(MoodCategory::Happy))));
    assert!(
        events
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::TelemetryPublished(t) if t.mood == MoodCategory::Sad))
    );
    // No storage task in this rig, so the frame tick found nothing to show.
    assert!(display.shown.is_empty());
    assert!(core.stats().snapshot().frame_ticks_skipped >= 1);
}
