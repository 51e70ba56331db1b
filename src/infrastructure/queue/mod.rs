use crate::modules::jobs::events::AdJobMessage;
use anyhow::Result;
use async_trait::async_trait;

pub mod channel;
pub mod rabbitmq;

/// Transport that hands a freshly created job to some worker. Returning
/// `Ok` means the message was accepted by the transport, not that the job
/// ran.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, message: &AdJobMessage) -> Result<()>;
}
