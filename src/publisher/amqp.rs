//! AMQP delivery channel backed by lapin.

use super::DeliveryChannel;
use crate::config::BrokerConfig;
use crate::error::{Result, TelemetryError};
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions};
use lapin::publisher_confirm::Confirmation;
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tracing::info;

/// AMQP delivery mode marking a message as persistent.
pub const PERSISTENT_DELIVERY_MODE: u8 = 2;

/// Publishes to a durable queue through the default exchange.
pub struct AmqpChannel {
    connection: Connection,
    channel: Channel,
    queue: String,
}

impl AmqpChannel {
    /// Connect to the broker, enable publisher confirms and declare the
    /// durable queue.
    pub async fn connect(broker: &BrokerConfig, queue: &str) -> Result<Self> {
        info!("[RabbitMQ] {}", broker.describe());

        let connection =
            Connection::connect_uri(broker.amqp_uri(), ConnectionProperties::default())
                .await
                .map_err(|e| TelemetryError::broker_error(format!("Failed to connect: {}", e)))?;
        let channel = connection.create_channel().await?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| {
                TelemetryError::broker_error(format!("Failed to enable publisher confirms: {}", e))
            })?;
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                TelemetryError::broker_error(format!("Failed to declare queue {}: {}", queue, e))
            })?;

        info!("RabbitMQ connected, publishing to queue {}", queue);

        Ok(Self {
            connection,
            channel,
            queue: queue.to_string(),
        })
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Close the channel and the connection.
    pub async fn close(self) -> Result<()> {
        if self.channel.status().connected() {
            self.channel.close(200, "shutdown").await?;
        }
        if self.connection.status().connected() {
            self.connection.close(200, "shutdown").await?;
        }
        info!("RabbitMQ connection closed");
        Ok(())
    }
}

impl DeliveryChannel for AmqpChannel {
    async fn deliver(&self, body: Vec<u8>) -> Result<()> {
        let properties = BasicProperties::default().with_delivery_mode(PERSISTENT_DELIVERY_MODE);

        let confirmation = self
            .channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                &body,
                properties,
            )
            .await
            .map_err(|e| TelemetryError::publish_error(e.to_string()))?
            .await
            .map_err(|e| TelemetryError::publish_error(e.to_string()))?;

        check_confirmation(confirmation)
    }
}

/// Map the broker's answer to a publish onto the delivery result.
fn check_confirmation(confirmation: Confirmation) -> Result<()> {
    match confirmation {
        Confirmation::Ack(_) => Ok(()),
        Confirmation::Nack(_) => Err(TelemetryError::publish_error(
            "broker rejected the message (nack)",
        )),
        Confirmation::NotRequested => Err(TelemetryError::publish_error(
            "publisher confirms are not enabled on the channel",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_is_delivered() {
        assert!(check_confirmation(Confirmation::Ack(None)).is_ok());
    }

    #[test]
    fn test_nack_is_a_publish_error() {
        let err = check_confirmation(Confirmation::Nack(None)).unwrap_err();
        assert!(matches!(err, TelemetryError::Publish(_)));
        assert!(err.to_string().contains("nack"));
    }

    #[test]
    fn test_unconfirmed_publish_is_not_delivered() {
        let err = check_confirmation(Confirmation::NotRequested).unwrap_err();
        assert!(matches!(err, TelemetryError::Publish(_)));
    }
}
