//! Snapshot delivery.
//!
//! [`TelemetryPublisher`] serializes each snapshot to JSON and hands it to a
//! [`DeliveryChannel`]. A failed delivery is logged and the snapshot is
//! dropped; nothing is queued or retried locally.

pub mod amqp;

pub use amqp::AmqpChannel;

use crate::error::Result;
use crate::snapshot::data::TelemetrySnapshot;
use std::future::Future;
use tracing::{debug, error};

/// Outbound transport for serialized snapshots.
pub trait DeliveryChannel {
    /// Deliver one message body as a persistent message.
    fn deliver(&self, body: Vec<u8>) -> impl Future<Output = Result<()>>;
}

/// Encode a snapshot as the JSON message body.
pub fn encode_snapshot(snapshot: &TelemetrySnapshot) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(snapshot)?)
}

/// What happened to a published snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Delivered,
    Dropped,
}

/// Serializes snapshots and pushes them through a [`DeliveryChannel`].
pub struct TelemetryPublisher<C> {
    channel: C,
    delivered: u64,
    dropped: u64,
}

impl<C: DeliveryChannel> TelemetryPublisher<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            delivered: 0,
            dropped: 0,
        }
    }

    /// Publish one snapshot. Failures are logged and reported as
    /// [`PublishOutcome::Dropped`], never returned as errors.
    pub async fn publish(&mut self, snapshot: &TelemetrySnapshot) -> PublishOutcome {
        let result = match encode_snapshot(snapshot) {
            Ok(body) => self.channel.deliver(body).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                self.delivered += 1;
                debug!("Published telemetry snapshot ts={}", snapshot.ts);
                PublishOutcome::Delivered
            }
            Err(err) => {
                self.dropped += 1;
                error!("Publish Error: {}", err);
                PublishOutcome::Dropped
            }
        }
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Take back the channel, e.g. to close it on shutdown.
    pub fn into_channel(self) -> C {
        self.channel
    }
}
