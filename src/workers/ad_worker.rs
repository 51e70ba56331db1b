use crate::infrastructure::queue::rabbitmq::RabbitMqService;
use crate::modules::jobs::events::AdJobMessage;
use crate::modules::pipeline::orchestrator::AdPipeline;
use anyhow::{anyhow, Result};
use async_channel::Receiver;
use futures_util::StreamExt;
use lapin::message::Delivery;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicQosOptions};
use lapin::types::FieldTable;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Pause between a consumer going away and the next attempt.
const CONSUMER_RESTART_DELAY: Duration = Duration::from_secs(5);

/// Consumes the service's job queue for the life of the process. Each
/// delivery runs in its own task; the broker never hands out more than
/// `concurrency` unacked messages. When the consumer stream ends or cannot
/// be opened, the connection is reopened and consumption resumes.
pub async fn start_ad_worker(rabbit: RabbitMqService, pipeline: Arc<AdPipeline>, concurrency: u16) {
    info!("🎬 Starting ad generation worker...");

    supervise(
        || consume(&rabbit, &pipeline, concurrency),
        || rabbit.reconnect(),
        CONSUMER_RESTART_DELAY,
    )
    .await
}

/// Runs `consume` forever. Every time it returns, waits `delay`, then calls
/// `reconnect` before the next attempt.
async fn supervise<C, CF, R, RF>(mut consume: C, mut reconnect: R, delay: Duration)
where
    C: FnMut() -> CF,
    CF: Future<Output = Result<()>>,
    R: FnMut() -> RF,
    RF: Future<Output = Result<()>>,
{
    loop {
        match consume().await {
            Ok(()) => warn!("Ad worker consumer stream ended, restarting"),
            Err(e) => error!("❌ Ad worker consumer failed: {:#}", e),
        }

        tokio::time::sleep(delay).await;
        if let Err(e) = reconnect().await {
            error!("Failed to reconnect ad worker: {:#}", e);
        }
    }
}

async fn consume(rabbit: &RabbitMqService, pipeline: &Arc<AdPipeline>, concurrency: u16) -> Result<()> {
    let channel = rabbit.consumer_channel().await?;

    channel
        .basic_qos(concurrency, BasicQosOptions::default())
        .await
        .map_err(|e| anyhow!("Failed to set prefetch: {}", e))?;

    let mut consumer = channel
        .basic_consume(
            rabbit.queue(),
            "ad_worker",
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|e| anyhow!("Failed to create consumer: {}", e))?;

    info!(queue = rabbit.queue(), concurrency, "🎬 Ad worker listening");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                let pipeline = pipeline.clone();
                tokio::spawn(async move { handle_delivery(pipeline, delivery).await });
            }
            Err(e) => error!("Consumer error: {}", e),
        }
    }

    Ok(())
}

async fn handle_delivery(pipeline: Arc<AdPipeline>, delivery: Delivery) {
    match serde_json::from_slice::<AdJobMessage>(&delivery.data) {
        Ok(message) => {
            info!(job_id = %message.job_id, "📦 Received ad job");
            pipeline.run(message.job_id).await;
        }
        Err(e) => {
            // Nothing to mark FAILED without a job id; drop the message.
            error!("❌ Discarding unparseable job message: {}", e);
        }
    }

    // Acked only after the terminal write, so a crash mid-run redelivers.
    if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
        error!("Failed to ack message: {}", e);
    }
}

/// Drains the in-process queue with `concurrency` consumers. The tasks end
/// once every `ChannelQueue` sender is dropped.
pub fn start_channel_worker(
    rx: Receiver<AdJobMessage>,
    pipeline: Arc<AdPipeline>,
    concurrency: u16,
) -> Vec<JoinHandle<()>> {
    info!(concurrency, "🎬 Starting in-process ad worker");

    (0..concurrency.max(1))
        .map(|slot| {
            let rx = rx.clone();
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                while let Ok(message) = rx.recv().await {
                    info!(job_id = %message.job_id, slot, "📦 Received ad job");
                    pipeline.run(message.job_id).await;
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::queue::channel::ChannelQueue;
    use crate::infrastructure::queue::JobQueue;
    use crate::modules::jobs::model::JobStatus;
    use crate::modules::jobs::repository::{JobStore, MemoryJobStore};
    use crate::modules::pipeline::catalog::BlobProductCatalog;
    use crate::modules::pipeline::orchestrator::{PipelineSettings, Providers};
    use crate::modules::pipeline::render::RenderPollPolicy;
    use crate::modules::pipeline::testing::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn pipeline(jobs: Arc<MemoryJobStore>) -> Arc<AdPipeline> {
        let blobs = Arc::new(FakeBlobStore::default());
        blobs.insert(
            "product_db.json",
            r#"{"TV-100": {"productName": "Aurora TV", "product_shot_url": ["s3://test-bucket/shots/a.mp4", "s3://test-bucket/shots/b.mp4"]}}"#,
        );

        let providers = Providers {
            blueprint: Arc::new(FakeBlueprint { fail: false }),
            clips: Arc::new(FakeClips::default()),
            voice: Arc::new(FakeVoice::default()),
            render: Arc::new(FakeRender::done("https://cdn.test/final.mp4")),
            blobs: blobs.clone(),
            catalog: Arc::new(BlobProductCatalog::new(blobs, "product_db.json")),
        };
        let settings = PipelineSettings {
            render_poll: RenderPollPolicy {
                interval: Duration::from_millis(1),
                max_attempts: 5,
            },
            ..PipelineSettings::default()
        };
        Arc::new(AdPipeline::new(jobs, providers, settings))
    }

    async fn wait_for_terminal(jobs: &MemoryJobStore, id: Uuid) -> JobStatus {
        for _ in 0..200 {
            let status = jobs.get(id).await.unwrap().unwrap().status;
            if status.is_terminal() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {} never reached a terminal state", id);
    }

    #[tokio::test]
    async fn channel_worker_drives_queued_jobs_to_completion() {
        let jobs = Arc::new(MemoryJobStore::new());
        let (queue, rx) = ChannelQueue::bounded(8);
        let workers = start_channel_worker(rx, pipeline(jobs.clone()), 2);

        let ok = Uuid::new_v4();
        let unknown_sku = Uuid::new_v4();
        jobs.create(ok, json!({"sku": "TV-100", "user_context": "summer sale"})).await.unwrap();
        jobs.create(unknown_sku, json!({"sku": "NOPE"})).await.unwrap();
        queue.enqueue(&AdJobMessage { job_id: ok }).await.unwrap();
        queue.enqueue(&AdJobMessage { job_id: unknown_sku }).await.unwrap();

        assert_eq!(wait_for_terminal(&jobs, ok).await, JobStatus::Complete);
        assert_eq!(wait_for_terminal(&jobs, unknown_sku).await, JobStatus::Failed);

        let completed = jobs.get(ok).await.unwrap().unwrap();
        assert_eq!(completed.final_video_url.as_deref(), Some("https://cdn.test/final.mp4"));
        let failed = jobs.get(unknown_sku).await.unwrap().unwrap();
        assert_eq!(failed.error_message.as_deref(), Some("Product SKU 'NOPE' not found."));

        drop(queue);
        for worker in workers {
            worker.await.unwrap();
        }
    }

    #[tokio::test]
    async fn consumer_is_restarted_after_its_stream_ends() {
        let consumed = Arc::new(AtomicUsize::new(0));
        let reconnects = Arc::new(AtomicUsize::new(0));

        let supervisor = {
            let consumed = consumed.clone();
            let reconnects = reconnects.clone();
            tokio::spawn(supervise(
                move || {
                    let consumed = consumed.clone();
                    async move {
                        match consumed.fetch_add(1, Ordering::SeqCst) {
                            0 => Ok(()),
                            1 => Err(anyhow!("channel closed by broker")),
                            _ => std::future::pending().await,
                        }
                    }
                },
                move || {
                    let reconnects = reconnects.clone();
                    async move {
                        // The first reconnect fails; consumption is still retried.
                        if reconnects.fetch_add(1, Ordering::SeqCst) == 0 {
                            Err(anyhow!("connection refused"))
                        } else {
                            Ok(())
                        }
                    }
                },
                Duration::from_millis(1),
            ))
        };

        for _ in 0..200 {
            if consumed.load(Ordering::SeqCst) >= 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        supervisor.abort();

        assert_eq!(consumed.load(Ordering::SeqCst), 3);
        assert_eq!(reconnects.load(Ordering::SeqCst), 2);
    }
}
