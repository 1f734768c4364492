//! Storage task → frame pool → render-side consumer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use aquamood::coord::channels::CoordLinks;
use aquamood::diagnostics::CoordinatorStats;
use aquamood::drivers::task_pin::{Core, spawn_on_core};
use aquamood::frames::consumer::{FrameConsumer, TickOutcome};
use aquamood::frames::storage_task::{LoadOutcome, StorageTask};
use aquamood::frames::{BufferId, Descriptor, frame_buffers};
use aquamood::mood::MoodCategory;

use crate::mock_ports::{PatternStore, Screen, small_config};

struct Rig {
    storage: StorageTask<PatternStore>,
    consumer: FrameConsumer,
    links: CoordLinks,
    store: PatternStore,
    stats: Arc<CoordinatorStats>,
}

fn rig() -> Rig {
    let config = small_config();
    let stats = Arc::new(CoordinatorStats::new());
    let (writer, reader) = frame_buffers(config.frame_bytes());
    let store = PatternStore::new();
    Rig {
        storage: StorageTask::new(store.clone(), writer, &config, Arc::clone(&stats)),
        consumer: FrameConsumer::new(reader, &config, Arc::clone(&stats)),
        links: CoordLinks::new(),
        store,
        stats,
    }
}

impl Rig {
    /// Let the storage task serve whatever request is pending.
    fn pump(&mut self) -> Option<LoadOutcome> {
        let index = self.links.frame_requests.try_take()?;
        Some(self.storage.handle(index))
    }

    fn tick(&mut self, screen: &mut Screen) -> TickOutcome {
        self.consumer.tick(screen, &self.links.frame_requests)
    }
}

#[test]
fn steady_animation_cycles_through_the_bank() {
    let mut r = rig();
    let mut screen = Screen::default();
    r.consumer.prime(&r.links.frame_requests);

    for _ in 0..6 {
        assert!(matches!(r.pump(), Some(LoadOutcome::Loaded(_))));
        assert!(matches!(r.tick(&mut screen), TickOutcome::Shown { .. }));
    }

    let indices: Vec<u8> = screen.shown.iter().map(|s| s.1).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 0, 1]);
    for (_, index, first_byte) in &screen.shown {
        assert_eq!(index, first_byte, "pixels belong to the frame they claim");
    }
    let descriptors: Vec<Descriptor> = screen.shown.iter().map(|s| s.0).collect();
    assert_eq!(
        descriptors,
        vec![
            Descriptor::Primary,
            Descriptor::Secondary,
            Descriptor::Primary,
            Descriptor::Secondary,
            Descriptor::Primary,
            Descriptor::Secondary,
        ]
    );
    assert_eq!(r.stats.snapshot().frames_shown, 6);
}

#[test]
fn repeated_request_keeps_a_single_copy() {
    let config = small_config();
    let stats = Arc::new(CoordinatorStats::new());
    let (writer, reader) = frame_buffers(config.frame_bytes());
    let store = PatternStore::new();
    let mut storage = StorageTask::new(store.clone(), writer, &config, Arc::clone(&stats));

    assert!(matches!(storage.handle(5), LoadOutcome::Loaded(_)));
    assert_eq!(storage.handle(5), LoadOutcome::Duplicate);

    let copies = BufferId::ALL
        .into_iter()
        .filter(|id| reader.ready_index(*id) == Some(5))
        .count();
    assert_eq!(copies, 1);
    assert_eq!(store.reads(), 1);
    assert_eq!(stats.snapshot().requests_duplicate, 1);
}

#[test]
fn category_switch_shows_the_new_bank_next() {
    let mut r = rig();
    let mut screen = Screen::default();
    r.consumer.prime(&r.links.frame_requests);
    r.pump();
    r.tick(&mut screen);
    // Frame 1 is now loaded ahead of time.
    r.pump();

    r.consumer.set_category(MoodCategory::Angry, &r.links.frame_requests);
    assert_eq!(r.consumer.next_index(), 8);

    assert!(matches!(r.pump(), Some(LoadOutcome::Loaded(_))));
    assert_eq!(
        r.tick(&mut screen),
        TickOutcome::Shown {
            index: 8,
            descriptor: Descriptor::Secondary
        }
    );
    assert_eq!(screen.shown.last().map(|s| s.2), Some(8));
}

#[test]
fn load_finishing_after_switch_is_released_as_stale() {
    let mut r = rig();
    let mut screen = Screen::default();
    r.consumer.prime(&r.links.frame_requests);
    r.pump();
    r.tick(&mut screen);

    // The storage task has picked up the request for frame 1 ...
    let in_flight = r.links.frame_requests.try_take();
    assert_eq!(in_flight, Some(1));
    // ... the mood flips while it reads ...
    r.consumer.set_category(MoodCategory::Sad, &r.links.frame_requests);
    // ... and the old frame lands after the invalidation.
    assert!(matches!(r.storage.handle(1), LoadOutcome::Loaded(_)));
    assert!(matches!(r.pump(), Some(LoadOutcome::Loaded(_))));

    assert_eq!(
        r.tick(&mut screen),
        TickOutcome::Shown {
            index: 4,
            descriptor: Descriptor::Secondary
        }
    );
    assert!(r.stats.snapshot().stale_buffers_released >= 1);
    assert!(screen.shown.iter().all(|(_, i, _)| *i == 0 || *i == 4));
}

#[test]
fn failed_read_is_requested_again() {
    let mut r = rig();
    let mut screen = Screen::default();
    r.store.fail_next_read_of(1);
    r.consumer.prime(&r.links.frame_requests);
    r.pump();
    r.tick(&mut screen);

    assert!(matches!(r.pump(), Some(LoadOutcome::Failed(_))));
    assert_eq!(r.tick(&mut screen), TickOutcome::Waiting { expected: 1 });

    assert!(matches!(r.pump(), Some(LoadOutcome::Loaded(_))));
    assert!(matches!(r.tick(&mut screen), TickOutcome::Shown { index: 1, .. }));

    let stats = r.stats.snapshot();
    assert_eq!(stats.frame_load_failures, 1);
    assert_eq!(stats.frame_ticks_skipped, 1);
}

#[test]
fn out_of_range_request_is_rejected() {
    let mut r = rig();
    assert_eq!(r.storage.handle(12), LoadOutcome::Rejected);
    assert_eq!(r.store.reads(), 0);
    assert_eq!(r.stats.snapshot().requests_invalid, 1);
}

#[test]
fn threaded_storage_task_feeds_the_consumer() {
    let config = small_config();
    let stats = Arc::new(CoordinatorStats::new());
    let links = Arc::new(CoordLinks::new());
    let (writer, reader) = frame_buffers(config.frame_bytes());
    let storage = StorageTask::new(PatternStore::new(), writer, &config, Arc::clone(&stats));
    let mut consumer = FrameConsumer::new(reader, &config, Arc::clone(&stats));

    let l = Arc::clone(&links);
    spawn_on_core(Core::App, 6, 6, "storage\0", move || storage.run(&l.frame_requests))
        .expect("spawn storage task");

    let mut screen = Screen::default();
    consumer.prime(&links.frame_requests);
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut switched_at = None;

    while screen.shown.len() < 20 && Instant::now() < deadline {
        if screen.shown.len() == 10 && switched_at.is_none() {
            consumer.set_category(MoodCategory::Angry, &links.frame_requests);
            switched_at = Some(screen.shown.len());
        }
        if let TickOutcome::Waiting { .. } = consumer.tick(&mut screen, &links.frame_requests) {
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    assert_eq!(screen.shown.len(), 20, "pipeline stalled");
    for (_, index, first_byte) in &screen.shown {
        assert_eq!(index, first_byte);
    }
    let (before, after) = screen.shown.split_at(10);
    assert!(before.iter().map(|s| s.1).eq([0, 1, 2, 3, 0, 1, 2, 3, 0, 1]));
    assert!(after.iter().map(|s| s.1).eq([8, 9, 10, 11, 8, 9, 10, 11, 8, 9]));
}
