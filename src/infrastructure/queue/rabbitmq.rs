use super::JobQueue;
use crate::modules::jobs::events::AdJobMessage;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lapin::{
    options::*, types::FieldTable, BasicProperties, Channel, Connection,
    ConnectionProperties,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Persistent delivery; survives a broker restart on a durable queue.
const PERSISTENT: u8 = 2;

struct Link {
    conn: Connection,
    publisher: Channel,
}

/// Job transport over one durable RabbitMQ queue. Publishes are confirmed
/// by the broker, so `enqueue` returning `Ok` means the broker has the job.
#[derive(Clone)]
pub struct RabbitMqService {
    url: String,
    queue: String,
    link: Arc<Mutex<Link>>,
}

impl RabbitMqService {
    async fn open(url: &str, queue: &str) -> Result<Link> {
        info!("Connecting to RabbitMQ");
        let conn = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| anyhow!("Failed to connect to RabbitMQ: {}", e))?;

        let publisher = conn
            .create_channel()
            .await
            .map_err(|e| anyhow!("Failed to create channel: {}", e))?;
        publisher
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| anyhow!("Failed to enable publisher confirms: {}", e))?;
        Self::declare_queue(&publisher, queue).await?;

        info!(queue, "✅ Connected to RabbitMQ");
        Ok(Link { conn, publisher })
    }

    pub async fn new(url: &str, queue: &str) -> Result<Self> {
        let link = Self::open(url, queue).await?;

        Ok(Self {
            url: url.to_string(),
            queue: queue.to_string(),
            link: Arc::new(Mutex::new(link)),
        })
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Replaces the connection and publisher channel. Consumers open a new
    /// channel afterwards through `consumer_channel`.
    pub async fn reconnect(&self) -> Result<()> {
        warn!("RabbitMQ connection dropped, reconnecting...");
        let link = Self::open(&self.url, &self.queue).await?;
        *self.link.lock().await = link;
        Ok(())
    }

    async fn declare_queue(channel: &Channel, queue: &str) -> Result<()> {
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| anyhow!("Failed to declare queue {}: {}", queue, e))?;
        Ok(())
    }

    /// A fresh channel on the current connection for a consumer, so
    /// deliveries never contend with publishes for the publisher lock.
    pub async fn consumer_channel(&self) -> Result<Channel> {
        let link = self.link.lock().await;
        let channel = link
            .conn
            .create_channel()
            .await
            .map_err(|e| anyhow!("Failed to create consumer channel: {}", e))?;
        Self::declare_queue(&channel, &self.queue).await?;
        Ok(channel)
    }

    async fn try_publish(&self, payload: &[u8]) -> Result<()> {
        let link = self.link.lock().await;

        let confirmation = link
            .publisher
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default()
                    .with_content_type("application/json".into())
                    .with_delivery_mode(PERSISTENT),
            )
            .await
            .map_err(|e| anyhow!("Failed to publish message: {}", e))?
            .await
            .map_err(|e| anyhow!("Failed to confirm publication: {}", e))?;

        if confirmation.is_nack() {
            return Err(anyhow!("Broker rejected message for queue {}", self.queue));
        }
        Ok(())
    }

    /// One reconnect-and-retry; a second failure is returned to the caller.
    async fn publish(&self, payload: &[u8]) -> Result<()> {
        if let Err(e) = self.try_publish(payload).await {
            warn!("RabbitMQ publish failed: {}. Retrying after reconnect.", e);
            self.reconnect().await?;
            self.try_publish(payload).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl JobQueue for RabbitMqService {
    async fn enqueue(&self, message: &AdJobMessage) -> Result<()> {
        let payload = serde_json::to_vec(message)?;
        self.publish(&payload).await?;
        debug!(job_id = %message.job_id, queue = %self.queue, "Job message confirmed by broker");
        Ok(())
    }
}
