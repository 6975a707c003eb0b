use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span};

use crate::client::{QueueClient, ReceiveRequest};
use crate::errors::ConsumerError;
use crate::health::HealthSink;

mod config;
mod functions;
mod workers;

pub use config::{
    DEFAULT_MAX_NUMBER_OF_MESSAGES, DEFAULT_WAIT_TIME_SECONDS, MAX_BATCH_SIZE,
    MAX_VISIBILITY_TIMEOUT_SECONDS, MAX_WAIT_TIME_SECONDS, SqsConsumerConfig,
};
pub use functions::{ConsumerCallback, ConsumerFn, DeleteSubmitter};

use workers::{DeleteWorker, ReceiveLoop};

/// Lifecycle of a consumer. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Created,
    Running,
    /// A stop was requested or a unit failed; the units are still winding down.
    Stopping,
    Stopped,
}

enum Lifecycle {
    Created,
    Running(Units),
    Stopped,
}

struct Units {
    receive: JoinHandle<()>,
    delete: JoinHandle<()>,
}

impl Units {
    fn is_finished(&self) -> bool {
        self.receive.is_finished() && self.delete.is_finished()
    }

    /// Waits for the receive loop, then the delete worker it closes.
    async fn join(self) {
        if let Err(e) = self.receive.await {
            error!(error = %e, "receive loop terminated abnormally");
        }
        if let Err(e) = self.delete.await {
            error!(error = %e, "delete worker terminated abnormally");
        }
    }
}

/// Consumes one SQS queue with a receive loop and a delete worker.
///
/// The receive loop fetches batches and hands each message to the callback;
/// the delete worker removes messages the callback submitted. Both run as tokio
/// tasks and share a run flag that only ever goes from `true` to `false`.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use rs_sqs_consumer::client::create_sqs_client_from_env;
/// use rs_sqs_consumer::health::HealthFlag;
/// use rs_sqs_consumer::message::Message;
/// use rs_sqs_consumer::receiver::{ConsumerFn, DeleteSubmitter, SqsConsumer, SqsConsumerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Arc::new(create_sqs_client_from_env().await);
///     let config = SqsConsumerConfig::with_queue_url("https://sqs.region.amazonaws.com/account/queue-name");
///     let callback = ConsumerFn::new(
///         |message: Message, deleter: DeleteSubmitter, _: ()| async move {
///             println!("Processing message: {}", message.body);
///             let _ = deleter.submit().await;
///         },
///         (),
///     );
///
///     let consumer = SqsConsumer::new(client, config, callback, HealthFlag::new());
///     consumer.start().await?;
///     tokio::signal::ctrl_c().await?;
///     consumer.halt().await;
///     Ok(())
/// }
/// ```
pub struct SqsConsumer<C: QueueClient> {
    client: Arc<C>,
    config: SqsConsumerConfig,
    callback: Arc<dyn ConsumerCallback>,
    health: Arc<dyn HealthSink>,
    running: Arc<AtomicBool>,
    lifecycle: Mutex<Lifecycle>,
}

impl<C: QueueClient> SqsConsumer<C> {
    pub fn new(
        client: Arc<C>,
        config: SqsConsumerConfig,
        callback: impl ConsumerCallback + 'static,
        health: impl HealthSink + 'static,
    ) -> Self {
        SqsConsumer {
            client,
            config,
            callback: Arc::new(callback),
            health: Arc::new(health),
            running: Arc::new(AtomicBool::new(false)),
            lifecycle: Mutex::new(Lifecycle::Created),
        }
    }

    pub fn config(&self) -> &SqsConsumerConfig {
        &self.config
    }

    /// Validates the configuration, resolves the queue and launches both units.
    ///
    /// Only a `Created` consumer can be started. On error the consumer stays
    /// `Created` and nothing has been spawned.
    pub async fn start(&self) -> Result<(), ConsumerError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if !matches!(*lifecycle, Lifecycle::Created) {
            return Err(ConsumerError::InvalidState(self.state_of(&lifecycle)));
        }

        self.config.validate()?;
        let queue_url = self.resolve_queue_url().await?;

        let (deletes, requests) = mpsc::channel(self.config.max_number_of_messages as usize);
        let request = ReceiveRequest {
            queue_url: queue_url.clone(),
            wait_time_seconds: self.config.wait_time_seconds,
            max_number_of_messages: self.config.max_number_of_messages,
            attribute_names: self.config.attribute_names.clone(),
            visibility_timeout: self.config.visibility_timeout,
        };

        let delete_queue_closed = CancellationToken::new();
        self.running.store(true, Ordering::Release);

        let receive_loop = ReceiveLoop {
            client: self.client.clone(),
            request,
            callback: self.callback.clone(),
            deletes,
            delete_queue_closed: delete_queue_closed.clone(),
            running: self.running.clone(),
            health: self.health.clone(),
        };
        let delete_worker = DeleteWorker {
            client: self.client.clone(),
            queue_url: queue_url.clone(),
            requests,
            delete_queue_closed,
            running: self.running.clone(),
            health: self.health.clone(),
        };

        let receive = tokio::spawn(
            receive_loop
                .run()
                .instrument(info_span!("sqs_receive", queue_url = %queue_url)),
        );
        let delete = tokio::spawn(
            delete_worker
                .run()
                .instrument(info_span!("sqs_delete", queue_url = %queue_url)),
        );

        *lifecycle = Lifecycle::Running(Units { receive, delete });
        info!(
            queue_url = %queue_url,
            wait_time_seconds = self.config.wait_time_seconds,
            max_number_of_messages = self.config.max_number_of_messages,
            "consumer started"
        );
        Ok(())
    }

    /// Requests a stop and waits until both units have exited.
    ///
    /// The receive loop finishes its in-flight receive call and dispatches that
    /// batch first, and the delete worker drains every submitted request.
    /// Calling `halt` again is a no-op. Halting before `start` stops the
    /// consumer for good without spawning anything.
    pub async fn halt(&self) {
        // Unblocks a concurrent `wait` holding the lifecycle lock.
        self.running.store(false, Ordering::Release);

        let mut lifecycle = self.lifecycle.lock().await;
        // A `start` that held the lock may have raised the flag again.
        self.running.store(false, Ordering::Release);
        match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Running(units) => {
                info!("halting consumer");
                units.join().await;
                info!("consumer stopped");
            }
            Lifecycle::Created => debug!("consumer halted before start"),
            Lifecycle::Stopped => {}
        }
    }

    /// Waits until both units have exited, without requesting a stop.
    ///
    /// Returns once a fatal receive or delete failure has unwound the consumer,
    /// or immediately when it is not running.
    pub async fn wait(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Running(units) => {
                units.join().await;
                info!("consumer stopped");
            }
            other => *lifecycle = other,
        }
    }

    pub fn state(&self) -> ConsumerState {
        match self.lifecycle.try_lock() {
            Ok(lifecycle) => self.state_of(&lifecycle),
            // A start, halt or wait is in progress.
            Err(_) if self.is_running() => ConsumerState::Running,
            Err(_) => ConsumerState::Stopping,
        }
    }

    /// Current value of the shared run flag.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn state_of(&self, lifecycle: &Lifecycle) -> ConsumerState {
        match lifecycle {
            Lifecycle::Created => ConsumerState::Created,
            Lifecycle::Stopped => ConsumerState::Stopped,
            Lifecycle::Running(units) if units.is_finished() => ConsumerState::Stopped,
            Lifecycle::Running(_) if self.is_running() => ConsumerState::Running,
            Lifecycle::Running(_) => ConsumerState::Stopping,
        }
    }

    async fn resolve_queue_url(&self) -> Result<String, ConsumerError> {
        if let Some(queue_url) = &self.config.queue_url {
            return Ok(queue_url.clone());
        }
        let Some(provider) = &self.config.queue_provider else {
            return Err(ConsumerError::InvalidConfiguration(
                "either queue_url or queue_provider must be set".to_string(),
            ));
        };

        let queue_url = provider
            .queue_url()
            .await
            .map_err(ConsumerError::QueueResolution)?;
        let queue_arn = provider
            .queue_arn()
            .await
            .map_err(ConsumerError::QueueResolution)?;
        info!(queue_url = %queue_url, queue_arn = %queue_arn, "resolved queue from provider");
        Ok(queue_url)
    }
}

impl<C: QueueClient> Drop for SqsConsumer<C> {
    fn drop(&mut self) {
        // Lets detached units wind down on their own.
        self.running.store(false, Ordering::Release);
    }
}

impl<C: QueueClient> fmt::Debug for SqsConsumer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqsConsumer")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}
