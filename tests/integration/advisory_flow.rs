//! Render core ⇄ network task advisory and telemetry round trips.

use std::sync::Arc;

use aquamood::advisory::OFFLINE_TEXT;
use aquamood::advisory::net_task::{AdvisoryState, NetTask};
use aquamood::advisory::quota::{QuotaLimits, QuotaState};
use aquamood::app::commands::AppCommand;
use aquamood::app::events::AppEvent;
use aquamood::app::ports::ConfigPort;
use aquamood::app::service::{AdvisoryDispatch, RenderCore};
use aquamood::config::SystemConfig;
use aquamood::coord::channels::CoordLinks;
use aquamood::diagnostics::CoordinatorStats;
use aquamood::frames::frame_buffers;
use aquamood::mood::{MoodCategory, ParameterSnapshot};

use crate::mock_ports::{
    ManualClock, MemoryConfig, MemoryLog, MockNet, MockTelemetry, RecordingSink, ScriptedClient,
    small_config, status,
};

const T0: u64 = 1000;

struct Rig {
    core: RenderCore,
    net: NetTask<MockNet, ScriptedClient, MockTelemetry, ManualClock>,
    links: Arc<CoordLinks>,
    clock: ManualClock,
    link: MockNet,
    client: ScriptedClient,
    telemetry: MockTelemetry,
    stats: Arc<CoordinatorStats>,
    sink: RecordingSink,
}

fn rig(config: SystemConfig, client: ScriptedClient) -> Rig {
    let stats = Arc::new(CoordinatorStats::new());
    let links = Arc::new(CoordLinks::new());
    let (_writer, reader) = frame_buffers(config.frame_bytes());
    let clock = ManualClock::at(T0);
    let link = MockNet::online();
    let telemetry = MockTelemetry::default();
    let net = NetTask::new(
        link.clone(),
        client.clone(),
        telemetry.clone(),
        clock.clone(),
        &config,
        Arc::clone(&stats),
    );
    let core = RenderCore::new(config, Arc::clone(&links), reader, Arc::clone(&stats), T0);
    Rig {
        core,
        net,
        links,
        clock,
        link,
        client,
        telemetry,
        stats,
        sink: RecordingSink::new(),
    }
}

impl Rig {
    fn now(&self) -> u64 {
        use aquamood::app::ports::Clock;
        self.clock.now_secs()
    }

    /// Ask for advice, let the network task serve it, poll the answer.
    fn round_trip(&mut self) -> AdvisoryDispatch {
        let now = self.now();
        let dispatch = self.core.request_advisory(false, now, &mut self.sink);
        if let Some(request) = self.links.advisory_requests.try_take() {
            self.net.apply_pending_limits(&self.links);
            let result = self.net.handle_request(&request);
            self.links.advisory_results.signal(result);
        }
        self.core.poll_advisory_result(now, &mut self.sink);
        dispatch
    }
}

#[test]
fn offline_request_shows_offline_text_without_a_call() {
    let mut r = rig(small_config(), ScriptedClient::default());
    r.link.set_online(false);

    assert_eq!(r.round_trip(), AdvisoryDispatch::Sent);
    assert_eq!(r.core.advice(), OFFLINE_TEXT);
    assert_eq!(r.client.calls(), 0);
    assert!(r.sink.events.contains(&AppEvent::AdvisoryApplied {
        success: false,
        local: false
    }));

    // A failure does not arm the minimum interval.
    r.link.set_online(true);
    assert_eq!(r.round_trip(), AdvisoryDispatch::Sent);
    assert_eq!(r.core.advice(), ScriptedClient::FALLBACK);
    assert_eq!(r.stats.snapshot().offline_refusals, 1);
}

#[test]
fn rate_limit_cools_down_then_retries_at_the_deadline() {
    let client = ScriptedClient::new(vec![status(429)]);
    let mut r = rig(SystemConfig::default(), client);

    r.round_trip();
    assert_eq!(r.core.advice(), "API quota exhausted. Will retry in 1 hour.");
    assert_eq!(r.net.state(), AdvisoryState::QuotaCooldown { until: T0 + 3600 });

    r.clock.set(T0 + 10);
    r.round_trip();
    assert_eq!(r.core.advice(), "API quota exhausted. Resets in 3590 seconds.");
    assert_eq!(r.client.calls(), 1, "no remote call while cooling down");

    r.clock.set(T0 + 3600);
    r.round_trip();
    assert_eq!(r.core.advice(), ScriptedClient::FALLBACK);
    assert_eq!(r.client.calls(), 2);
    assert_eq!(r.net.quota(), QuotaState::default());
    assert_eq!(r.net.state(), AdvisoryState::Idle);

    // The success arms the render-side minimum interval.
    r.clock.set(T0 + 3700);
    assert_eq!(r.round_trip(), AdvisoryDispatch::Throttled { retry_in_secs: 200 });
    assert_eq!(r.client.calls(), 2);
}

#[test]
fn changed_cooldown_applies_to_the_next_rate_limit() {
    let client = ScriptedClient::new(vec![status(429), status(429)]);
    let mut r = rig(SystemConfig::default(), client);
    let store = MemoryConfig::default();
    let mut log = MemoryLog::default();

    let update = SystemConfig {
        quota_cooldown_secs: 60,
        quota_cooldown_max_secs: 90,
        ..r.core.config().clone()
    };
    assert!(r.core.handle_command(AppCommand::UpdateConfig(update), T0, &mut log, &mut r.sink));
    r.core.persist_config(&store).expect("config saved");

    r.round_trip();
    assert_eq!(r.net.limits(), QuotaLimits { base_secs: 60, max_secs: 90 });
    assert_eq!(r.core.advice(), "API quota exhausted. Will retry in 1 minutes.");
    assert_eq!(r.net.state(), AdvisoryState::QuotaCooldown { until: T0 + 60 });

    // Second strike: 120s doubled, capped at the new maximum.
    r.clock.set(T0 + 60);
    r.round_trip();
    assert_eq!(r.net.state(), AdvisoryState::QuotaCooldown { until: T0 + 150 });

    let stored = store.load().expect("stored config");
    assert_eq!(stored.quota_cooldown_secs, 60);
    assert_eq!(stored.quota_cooldown_max_secs, 90);
    assert_eq!(store.saves.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[test]
fn going_offline_during_cooldown_keeps_the_deadline() {
    let client = ScriptedClient::new(vec![status(429)]);
    let mut r = rig(SystemConfig::default(), client);
    r.round_trip();

    r.link.set_online(false);
    r.clock.set(T0 + 100);
    r.round_trip();
    assert_eq!(r.core.advice(), OFFLINE_TEXT);
    assert_eq!(r.net.state(), AdvisoryState::QuotaCooldown { until: T0 + 3600 });
}

#[test]
fn request_carries_the_current_parameters() {
    let mut r = rig(small_config(), ScriptedClient::default());
    let mut log = MemoryLog::default();
    let snapshot = ParameterSnapshot {
        ammonia_ppm: 0.0,
        nitrite_ppm: 0.0,
        nitrate_ppm: 35.0,
        ph: 7.2,
        last_feed_secs: T0,
        last_water_change_secs: T0,
        feed_interval_secs: 8 * 3600,
        water_change_interval_secs: 7 * 86_400,
    };
    r.core.set_parameters(snapshot, T0, &mut log);
    r.round_trip();

    let prompt = r.client.last_prompt().expect("remote was called");
    assert!(prompt.contains("Nitrate: 35.0 ppm"));
    assert!(prompt.contains("pH: 7.2"));
    assert!(prompt.contains(MoodCategory::Happy.label()));
    assert_eq!(log.records.len(), 1);
}

#[test]
fn urgent_request_never_reaches_the_network() {
    let mut r = rig(small_config(), ScriptedClient::default());
    let mut log = MemoryLog::default();
    let mut toxic = *r.core.snapshot();
    toxic.ammonia_ppm = 1.0;
    r.core.set_parameters(toxic, T0, &mut log);

    let now = r.now();
    assert_eq!(
        r.core.request_advisory(true, now, &mut r.sink),
        AdvisoryDispatch::AnsweredLocally
    );
    assert!(r.links.advisory_requests.try_take().is_none());
    assert!(r.core.advice().contains("Ammonia is toxic"));
    assert_eq!(r.client.calls(), 0);
}

#[test]
fn telemetry_snapshot_reaches_the_dashboard_port() {
    let mut r = rig(small_config(), ScriptedClient::default());
    r.clock.set(T0 + 7200);

    let now = r.now();
    let published = r.core.publish_telemetry(now, &mut r.sink);
    let snapshot = r.links.telemetry.try_take().expect("telemetry signalled");
    assert_eq!(snapshot, published);
    r.net.handle_telemetry(&snapshot).expect("push succeeds");

    let pushed = r.telemetry.pushed();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].mood, MoodCategory::Happy);
    assert!((pushed[0].hours_since_feed - 2.0).abs() < 1e-3);
    assert_eq!(r.stats.snapshot().telemetry_pushes, 1);
}

#[test]
fn telemetry_is_dropped_offline_and_counted_on_rejection() {
    let mut r = rig(small_config(), ScriptedClient::default());
    let snapshot = r.core.build_telemetry(T0);

    r.link.set_online(false);
    assert!(r.net.handle_telemetry(&snapshot).is_ok());
    assert!(r.telemetry.pushed().is_empty());

    r.link.set_online(true);
    r.telemetry.reject.store(true, std::sync::atomic::Ordering::SeqCst);
    assert!(r.net.handle_telemetry(&snapshot).is_err());
    assert_eq!(r.stats.snapshot().telemetry_failures, 1);
}
