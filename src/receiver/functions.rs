use std::future::Future;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::errors::ConsumerError;
use crate::message::{DeleteRequest, Message};

/// Business logic invoked once per received message.
///
/// The receive loop awaits `on_message` before dispatching the next message, so
/// a slow callback slows down polling. Work that outlives the call can be moved
/// to a spawned task together with the [`DeleteSubmitter`].
#[async_trait]
pub trait ConsumerCallback: Send + Sync {
    async fn on_message(&self, message: Message, deleter: DeleteSubmitter);
}

/// Hands a processed message to the delete worker.
///
/// Every dispatched message gets its own submitter, bound to that delivery's
/// receipt handle, and `submit` consumes it, so a message is submitted at most
/// once. Dropping the submitter without submitting leaves the message to be
/// redelivered after its visibility timeout.
///
/// The receive loop closes the delete queue when it exits. A submitter kept
/// past that point fails with [`ConsumerError::DeleteQueueClosed`].
#[derive(Debug)]
pub struct DeleteSubmitter {
    sender: mpsc::Sender<DeleteRequest>,
    request: DeleteRequest,
}

impl DeleteSubmitter {
    pub(crate) fn new(sender: mpsc::Sender<DeleteRequest>, message: &Message) -> Self {
        DeleteSubmitter {
            sender,
            request: DeleteRequest::from(message),
        }
    }

    /// Queues the bound message for deletion, waiting for room in the delete queue.
    pub async fn submit(self) -> Result<(), ConsumerError> {
        self.sender
            .send(self.request)
            .await
            .map_err(|_| ConsumerError::DeleteQueueClosed)
    }

    /// Receipt handle of the delivery this submitter deletes.
    pub fn receipt_handle(&self) -> &str {
        &self.request.receipt_handle
    }

    /// Whether the delete queue has stopped accepting requests.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[async_trait]
impl<F, Fut, TShared> ConsumerCallback for ConsumerFn<F, TShared>
where
    F: Fn(Message, DeleteSubmitter, TShared) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
    TShared: Send + Sync + Clone + 'static,
{
    async fn on_message(&self, message: Message, deleter: DeleteSubmitter) {
        (self.callback_fn)(message, deleter, self.shared_resources.clone()).await
    }
}

/// Adapts an async function and a shared resource into a [`ConsumerCallback`].
///
/// # Type Parameters
///
/// * `F` - The message handler function type
/// * `TShared` - The type of shared resources passed to the handler
///
/// # Example
///
/// ```rust
/// use rs_sqs_consumer::message::Message;
/// use rs_sqs_consumer::receiver::{ConsumerFn, DeleteSubmitter};
///
/// let callback = ConsumerFn::new(
///     |message: Message, deleter: DeleteSubmitter, greeting: String| async move {
///         println!("{greeting}: {}", message.body);
///         let _ = deleter.submit().await;
///     },
///     "received".to_string(),
/// );
/// # let _ = callback;
/// ```
pub struct ConsumerFn<F, TShared> {
    callback_fn: F,
    shared_resources: TShared,
}

impl<F, TShared> ConsumerFn<F, TShared> {
    pub fn new(callback_fn: F, shared_resources: TShared) -> Self {
        ConsumerFn {
            callback_fn,
            shared_resources,
        }
    }
}
