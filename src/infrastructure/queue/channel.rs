use super::JobQueue;
use crate::modules::jobs::events::AdJobMessage;
use anyhow::{anyhow, Result};
use async_channel::{Receiver, Sender, TrySendError};
use async_trait::async_trait;

/// In-process job queue. The receiving half is drained by
/// `workers::ad_worker::start_channel_worker`. A full queue rejects the
/// job instead of holding the submitting request open.
#[derive(Clone)]
pub struct ChannelQueue {
    tx: Sender<AdJobMessage>,
}

impl ChannelQueue {
    pub fn bounded(capacity: usize) -> (Self, Receiver<AdJobMessage>) {
        let (tx, rx) = async_channel::bounded(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl JobQueue for ChannelQueue {
    async fn enqueue(&self, message: &AdJobMessage) -> Result<()> {
        self.tx.try_send(*message).map_err(|e| match e {
            TrySendError::Full(_) => anyhow!("Job channel is full ({} pending)", self.tx.len()),
            TrySendError::Closed(_) => anyhow!("Job channel is closed"),
        })
    }
}
