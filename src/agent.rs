//! The telemetry agent: one cooperative loop that applies sensor events to
//! the cache and, on every tick, probes the host, builds a snapshot and
//! publishes it.
//!
//! Events and ticks are handled one at a time on the same task, so the cache
//! needs no locking. Probing and publishing run inline in the tick handler; a
//! slow tick delays the next one rather than overlapping it.

use crate::config::AgentConfig;
use crate::probe::ComputeProbe;
use crate::publisher::{DeliveryChannel, PublishOutcome, TelemetryPublisher};
use crate::sensors::{SensorEvent, SensorStateCache};
use crate::snapshot::{SnapshotBuilder, TelemetrySnapshot};
use std::future::Future;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Counters reported when the agent stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentStats {
    pub events: u64,
    pub ticks: u64,
    pub delivered: u64,
    pub dropped: u64,
}

/// Owns the cache, the probe and the publisher for the process lifetime.
pub struct TelemetryAgent<P, C> {
    config: AgentConfig,
    cache: SensorStateCache,
    builder: SnapshotBuilder,
    probe: P,
    publisher: TelemetryPublisher<C>,
    events: u64,
    ticks: u64,
}

impl<P, C> TelemetryAgent<P, C>
where
    P: ComputeProbe,
    C: DeliveryChannel,
{
    pub fn new(config: AgentConfig, probe: P, channel: C) -> Self {
        let builder = SnapshotBuilder::new(config.robot_name.clone(), config.battery_capacity_wh);
        Self {
            config,
            cache: SensorStateCache::new(),
            builder,
            probe,
            publisher: TelemetryPublisher::new(channel),
            events: 0,
            ticks: 0,
        }
    }

    pub fn cache(&self) -> &SensorStateCache {
        &self.cache
    }

    pub fn stats(&self) -> AgentStats {
        AgentStats {
            events: self.events,
            ticks: self.ticks,
            delivered: self.publisher.delivered(),
            dropped: self.publisher.dropped(),
        }
    }

    /// Apply one sensor event to the cache.
    pub fn handle_event(&mut self, event: SensorEvent) {
        self.events += 1;
        self.cache.update(event);
    }

    /// Build and publish one snapshot.
    pub async fn tick(&mut self) -> (TelemetrySnapshot, PublishOutcome) {
        self.ticks += 1;
        debug!(
            "Tick {}: channels with data {:?}",
            self.ticks,
            self.cache.populated_channels()
        );

        let compute = self.probe.probe();
        let snapshot = self.builder.build(&self.cache.snapshot_view(), compute);
        info!("{}", snapshot.report());

        let outcome = self.publisher.publish(&snapshot).await;
        (snapshot, outcome)
    }

    /// Run until `shutdown` completes.
    ///
    /// The first snapshot is produced one full period after start. A closed
    /// event channel is not a reason to stop: ticks continue with whatever the
    /// cache holds.
    pub async fn run<F>(&mut self, mut events: mpsc::Receiver<SensorEvent>, shutdown: F) -> AgentStats
    where
        F: Future<Output = ()>,
    {
        let period = self.config.tick_interval();
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            "Telemetry agent running for '{}' (interval: {}s, queue: {})",
            self.config.robot_name,
            period.as_secs(),
            self.config.queue_name
        );

        let mut events_open = true;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping telemetry agent");
                    break;
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        debug!("All sensor sources closed, continuing with cached readings");
                        events_open = false;
                    }
                },
            }
        }

        self.stats()
    }

    /// Give back the delivery channel so it can be released.
    pub fn into_channel(self) -> C {
        self.publisher.into_channel()
    }
}
