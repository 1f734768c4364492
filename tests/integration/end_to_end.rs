//! All three coordinator tasks on their own threads, render loop on the
//! test thread.

use std::sync::Arc;
use std::time::{Duration, Instant};

use aquamood::advisory::net_task::NetTask;
use aquamood::app::service::RenderCore;
use aquamood::coord::channels::CoordLinks;
use aquamood::coord::mood_task::MoodTask;
use aquamood::diagnostics::CoordinatorStats;
use aquamood::drivers::task_pin::{Core, spawn_on_core};
use aquamood::frames::frame_buffers;
use aquamood::frames::storage_task::StorageTask;
use aquamood::mood::MoodCategory;

use crate::mock_ports::{
    ManualClock, MemoryLog, MockNet, MockTelemetry, PatternStore, RecordingSink, ScriptedClient,
    Screen, small_config,
};

const T0: u64 = 10_000;

struct Render {
    core: RenderCore,
    display: Screen,
    sink: RecordingSink,
    log: MemoryLog,
}

impl Render {
    fn step(&mut self) {
        self.core.poll_mood_result(T0, &mut self.sink);
        self.core.poll_advisory_result(T0, &mut self.sink);
        self.core.tick_frame_consumer(&mut self.display, &mut self.sink);
    }

    fn last_shown(&self) -> Option<u8> {
        self.display.shown.last().map(|s| s.1)
    }

    /// Run the render loop until `done` holds or ten seconds pass.
    fn drive_until(&mut self, done: impl Fn(&Self) -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            self.step();
            if done(self) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    }
}

#[test]
fn parameter_changes_flow_through_every_task() {
    let config = small_config();
    let stats = Arc::new(CoordinatorStats::new());
    let links = Arc::new(CoordLinks::new());
    let clock = ManualClock::at(T0);
    let (writer, reader) = frame_buffers(config.frame_bytes());
    let client = ScriptedClient::default();

    let storage = StorageTask::new(PatternStore::new(), writer, &config, Arc::clone(&stats));
    let l = Arc::clone(&links);
    spawn_on_core(Core::App, 6, 6, "storage\0", move || storage.run(&l.frame_requests))
        .expect("spawn storage");

    let mood = MoodTask::new(clock.clone(), Arc::clone(&stats));
    let l = Arc::clone(&links);
    spawn_on_core(Core::App, 5, 6, "mood\0", move || mood.run(&l)).expect("spawn mood");

    let net = NetTask::new(
        MockNet::online(),
        client.clone(),
        MockTelemetry::default(),
        clock,
        &config,
        Arc::clone(&stats),
    );
    let l = Arc::clone(&links);
    spawn_on_core(Core::App, 4, 16, "net\0", move || net.run(&l)).expect("spawn net");

    let mut r = Render {
        core: RenderCore::new(config, Arc::clone(&links), reader, Arc::clone(&stats), T0),
        display: Screen::default(),
        sink: RecordingSink::new(),
        log: MemoryLog::default(),
    };
    r.core.start(&mut r.sink);

    assert!(
        r.drive_until(|r| r.last_shown() == Some(0) && r.core.last_result().is_some()),
        "first frame and first evaluation"
    );
    assert_eq!(r.core.category(), MoodCategory::Happy);

    // Nitrate in the warning band: Sad, remote advice.
    let mut sad = *r.core.snapshot();
    sad.nitrate_ppm = 65.0;
    r.core.set_parameters(sad, T0, &mut r.log);
    assert!(
        r.drive_until(|r| {
            r.core.category() == MoodCategory::Sad
                && r.core.advice() == ScriptedClient::FALLBACK
                && r.last_shown().is_some_and(|i| (4..8).contains(&i))
        }),
        "sad mood with remote advice"
    );
    assert_eq!(client.calls(), 1);

    // Ammonia spike: Angry, answered locally.
    let mut toxic = sad;
    toxic.ammonia_ppm = 2.0;
    r.core.set_parameters(toxic, T0, &mut r.log);
    assert!(
        r.drive_until(|r| {
            r.core.category() == MoodCategory::Angry
                && r.core.advice().contains("Ammonia is toxic")
                && r.last_shown().is_some_and(|i| (8..12).contains(&i))
        }),
        "angry mood with local advice"
    );
    assert_eq!(client.calls(), 1, "urgent advice stays local");

    for (_, index, first_byte) in &r.display.shown {
        assert_eq!(index, first_byte);
    }
    assert_eq!(r.log.records.len(), 2);
    assert_eq!(r.sink.mood_changes(), 2);
    assert!(stats.snapshot().mood_evaluations >= 3);
}
