use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rs_sqs_consumer::client::{QueueClient, ReceiveRequest};
use rs_sqs_consumer::errors::{GenericError, QueueClientError};
use rs_sqs_consumer::health::HealthSink;
use rs_sqs_consumer::message::Message;
use rs_sqs_consumer::provider::QueueProvider;
use tokio::time::{sleep, timeout};

pub const QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/000000000000/orders";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn message(n: usize) -> Message {
    Message::new(format!("m{n}"), format!("rh-{n}")).with_message_id(format!("id-{n}"))
}

/// Polls `condition` until it holds, failing the test after five seconds.
pub async fn eventually(description: &str, condition: impl Fn() -> bool) {
    let result = timeout(Duration::from_secs(5), async {
        while !condition() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(result.is_ok(), "timed out waiting for: {description}");
}

/// In-memory queue client replaying scripted receive results.
///
/// Once the script is exhausted every receive returns an empty batch after a
/// short idle delay.
pub struct FakeQueueClient {
    batches: Mutex<VecDeque<Result<Vec<Message>, QueueClientError>>>,
    delete_failures: Mutex<VecDeque<QueueClientError>>,
    requests: Mutex<Vec<ReceiveRequest>>,
    deleted: Mutex<Vec<String>>,
    delete_attempts: Mutex<usize>,
    receive_delay: Duration,
    delete_delay: Duration,
    idle_delay: Duration,
}

impl FakeQueueClient {
    pub fn new() -> Self {
        FakeQueueClient {
            batches: Mutex::new(VecDeque::new()),
            delete_failures: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            delete_attempts: Mutex::new(0),
            receive_delay: Duration::ZERO,
            delete_delay: Duration::ZERO,
            idle_delay: Duration::from_millis(10),
        }
    }

    pub fn with_batch(self, messages: Vec<Message>) -> Self {
        self.batches.lock().unwrap().push_back(Ok(messages));
        self
    }

    pub fn with_receive_error(self, error: QueueClientError) -> Self {
        self.batches.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn with_delete_failure(self, error: QueueClientError) -> Self {
        self.delete_failures.lock().unwrap().push_back(error);
        self
    }

    /// Delay applied to every scripted receive result.
    pub fn with_receive_delay(mut self, delay: Duration) -> Self {
        self.receive_delay = delay;
        self
    }

    pub fn with_delete_delay(mut self, delay: Duration) -> Self {
        self.delete_delay = delay;
        self
    }

    pub fn receive_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ReceiveRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn delete_attempts(&self) -> usize {
        *self.delete_attempts.lock().unwrap()
    }
}

#[async_trait]
impl QueueClient for FakeQueueClient {
    async fn receive(&self, request: &ReceiveRequest) -> Result<Vec<Message>, QueueClientError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(result) => {
                sleep(self.receive_delay).await;
                result
            }
            None => {
                sleep(self.idle_delay).await;
                Ok(Vec::new())
            }
        }
    }

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), QueueClientError> {
        assert!(!queue_url.is_empty());
        *self.delete_attempts.lock().unwrap() += 1;
        sleep(self.delete_delay).await;
        let failure = self.delete_failures.lock().unwrap().pop_front();
        if let Some(error) = failure {
            return Err(error);
        }
        self.deleted.lock().unwrap().push(receipt_handle.to_string());
        Ok(())
    }
}

/// Health sink recording every trip.
#[derive(Clone, Default)]
pub struct RecordingHealth {
    causes: Arc<Mutex<Vec<String>>>,
}

impl RecordingHealth {
    pub fn causes(&self) -> Vec<String> {
        self.causes.lock().unwrap().clone()
    }
}

impl HealthSink for RecordingHealth {
    fn trip_unhealthy(&self, cause: &str) {
        self.causes.lock().unwrap().push(cause.to_string());
    }
}

/// Queue provider returning fixed values and counting lookups.
#[derive(Default)]
pub struct StaticProvider {
    pub fail: bool,
    /// Time each url lookup takes.
    pub delay: Duration,
    pub url_lookups: Mutex<usize>,
    pub arn_lookups: Mutex<usize>,
}

#[async_trait]
impl QueueProvider for StaticProvider {
    async fn queue_url(&self) -> Result<String, GenericError> {
        *self.url_lookups.lock().unwrap() += 1;
        sleep(self.delay).await;
        if self.fail {
            return Err(GenericError::from("queue does not exist"));
        }
        Ok(QUEUE_URL.to_string())
    }

    async fn queue_arn(&self) -> Result<String, GenericError> {
        *self.arn_lookups.lock().unwrap() += 1;
        Ok("arn:aws:sqs:us-east-1:000000000000:orders".to_string())
    }
}
