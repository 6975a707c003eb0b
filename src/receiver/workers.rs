use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::client::{QueueClient, ReceiveRequest, is_retriable_error};
use crate::health::{DELETE_FAILURE_CAUSE, HealthSink, RECEIVE_FAILURE_CAUSE};
use crate::message::DeleteRequest;
use crate::receiver::functions::{ConsumerCallback, DeleteSubmitter};

/// Polls the queue and dispatches every message to the callback until the run
/// flag drops or a receive call fails.
pub(crate) struct ReceiveLoop<C: QueueClient> {
    pub(crate) client: Arc<C>,
    pub(crate) request: ReceiveRequest,
    pub(crate) callback: Arc<dyn ConsumerCallback>,
    pub(crate) deletes: mpsc::Sender<DeleteRequest>,
    /// Cancelled when the loop exits, closing the delete queue.
    pub(crate) delete_queue_closed: CancellationToken,
    pub(crate) running: Arc<AtomicBool>,
    pub(crate) health: Arc<dyn HealthSink>,
}

impl<C: QueueClient> ReceiveLoop<C> {
    pub(crate) async fn run(self) {
        let ReceiveLoop {
            client,
            request,
            callback,
            deletes,
            delete_queue_closed,
            running,
            health,
        } = self;
        // Closes the delete queue on every exit path, unwinding included.
        let _close_delete_queue = delete_queue_closed.drop_guard();

        while running.load(Ordering::Acquire) {
            let messages = match client.receive(&request).await {
                Ok(messages) => messages,
                Err(e) => {
                    error!(
                        queue_url = %request.queue_url,
                        category = %e.category,
                        code = e.code.as_deref(),
                        retriable = client.is_retriable(&e),
                        error = %e,
                        "failed to receive messages, stopping consumer"
                    );
                    health.trip_unhealthy(RECEIVE_FAILURE_CAUSE);
                    running.store(false, Ordering::Release);
                    break;
                }
            };

            if messages.is_empty() {
                trace!("no messages received");
                continue;
            }

            debug!(count = messages.len(), "received batch");
            for message in messages {
                let deleter = DeleteSubmitter::new(deletes.clone(), &message);
                callback.on_message(message, deleter).await;
            }
        }

        info!("receive loop exited");
    }
}

/// Issues delete calls, in submission order, until the receive loop has closed
/// the delete queue and it is drained, or a delete call fails.
pub(crate) struct DeleteWorker<C: QueueClient> {
    pub(crate) client: Arc<C>,
    pub(crate) queue_url: String,
    pub(crate) requests: mpsc::Receiver<DeleteRequest>,
    pub(crate) delete_queue_closed: CancellationToken,
    pub(crate) running: Arc<AtomicBool>,
    pub(crate) health: Arc<dyn HealthSink>,
}

impl<C: QueueClient> DeleteWorker<C> {
    pub(crate) async fn run(self) {
        let DeleteWorker {
            client,
            queue_url,
            mut requests,
            delete_queue_closed,
            running,
            health,
        } = self;

        let mut closed = false;
        loop {
            let request = tokio::select! {
                request = requests.recv() => request,
                _ = delete_queue_closed.cancelled(), if !closed => {
                    // Refuses further submissions; buffered requests still drain.
                    requests.close();
                    closed = true;
                    debug!("delete queue closed, draining");
                    continue;
                }
            };
            let Some(request) = request else {
                break;
            };

            match client.delete(&queue_url, &request.receipt_handle).await {
                Ok(()) => trace!(message_id = request.message_id.as_deref(), "deleted message"),
                Err(e) => {
                    // Retriable or not, the client already exhausted its retries.
                    error!(
                        queue_url = %queue_url,
                        message_id = request.message_id.as_deref(),
                        category = %e.category,
                        code = e.code.as_deref(),
                        retriable = is_retriable_error(client.as_ref(), &e),
                        error = %e,
                        "failed to delete message, stopping consumer"
                    );
                    health.trip_unhealthy(DELETE_FAILURE_CAUSE);
                    running.store(false, Ordering::Release);
                    requests.close();

                    let mut abandoned = 0usize;
                    while requests.try_recv().is_ok() {
                        abandoned += 1;
                    }
                    if abandoned > 0 {
                        warn!(
                            abandoned,
                            "pending deletes abandoned, messages will be redelivered"
                        );
                    }
                    break;
                }
            }
        }

        info!("delete worker exited");
    }
}
