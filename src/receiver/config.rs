use std::fmt;
use std::sync::Arc;

use crate::errors::ConsumerError;
use crate::provider::QueueProvider;

/// Hard upper bound of messages per receive call imposed by SQS.
pub const MAX_BATCH_SIZE: i32 = 10;

/// Longest long-poll wait SQS accepts, in seconds.
pub const MAX_WAIT_TIME_SECONDS: i32 = 20;

/// Longest visibility timeout SQS accepts (12 hours), in seconds.
pub const MAX_VISIBILITY_TIMEOUT_SECONDS: i32 = 43_200;

pub const DEFAULT_WAIT_TIME_SECONDS: i32 = 5;
pub const DEFAULT_MAX_NUMBER_OF_MESSAGES: i32 = 5;

/// Configuration for an SQS consumer.
///
/// Fixed for the lifetime of one consumer. Exactly one of `queue_url` and
/// `queue_provider` must be set; the provider is only consulted at start.
///
/// # Fields
/// - `wait_time_seconds`: long-poll duration of each receive call.
/// - `max_number_of_messages`: batch size bound, between 1 and [`MAX_BATCH_SIZE`].
/// - `visibility_timeout`: overrides the queue's visibility timeout for received messages.
/// - `attribute_names`: message attributes to request with each message.
#[derive(Clone)]
pub struct SqsConsumerConfig {
    pub queue_url: Option<String>,

    pub queue_provider: Option<Arc<dyn QueueProvider>>,

    /// The wait time for long polling, in seconds.
    pub wait_time_seconds: i32,

    /// The maximum number of messages to receive in a single request.
    pub max_number_of_messages: i32,

    pub visibility_timeout: Option<i32>,

    pub attribute_names: Option<Vec<String>>,
}

impl Default for SqsConsumerConfig {
    fn default() -> Self {
        SqsConsumerConfig {
            queue_url: None,
            queue_provider: None,
            wait_time_seconds: DEFAULT_WAIT_TIME_SECONDS,
            max_number_of_messages: DEFAULT_MAX_NUMBER_OF_MESSAGES,
            visibility_timeout: None,
            attribute_names: None,
        }
    }
}

impl fmt::Debug for SqsConsumerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqsConsumerConfig")
            .field("queue_url", &self.queue_url)
            .field("queue_provider", &self.queue_provider.as_ref().map(|_| ".."))
            .field("wait_time_seconds", &self.wait_time_seconds)
            .field("max_number_of_messages", &self.max_number_of_messages)
            .field("visibility_timeout", &self.visibility_timeout)
            .field("attribute_names", &self.attribute_names)
            .finish()
    }
}

impl SqsConsumerConfig {
    pub fn with_queue_url(queue_url: &str) -> Self {
        SqsConsumerConfig {
            queue_url: Some(queue_url.to_string()),
            ..Default::default()
        }
    }

    pub fn with_queue_provider(provider: Arc<dyn QueueProvider>) -> Self {
        SqsConsumerConfig {
            queue_provider: Some(provider),
            ..Default::default()
        }
    }

    pub fn wait_time_seconds(mut self, seconds: i32) -> Self {
        self.wait_time_seconds = seconds;
        self
    }

    pub fn max_number_of_messages(mut self, max: i32) -> Self {
        self.max_number_of_messages = max;
        self
    }

    pub fn visibility_timeout(mut self, seconds: i32) -> Self {
        self.visibility_timeout = Some(seconds);
        self
    }

    pub fn attribute_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Checks the configuration against the queue API limits.
    pub fn validate(&self) -> Result<(), ConsumerError> {
        match (&self.queue_url, &self.queue_provider) {
            (Some(_), Some(_)) => {
                return Err(invalid(
                    "queue_url and queue_provider are mutually exclusive".to_string(),
                ));
            }
            (None, None) => {
                return Err(invalid(
                    "either queue_url or queue_provider must be set".to_string(),
                ));
            }
            (Some(url), None) if url.trim().is_empty() => {
                return Err(invalid("queue_url must not be empty".to_string()));
            }
            _ => {}
        }

        if !(1..=MAX_BATCH_SIZE).contains(&self.max_number_of_messages) {
            return Err(invalid(format!(
                "max_number_of_messages must be between 1 and {MAX_BATCH_SIZE}, got {}",
                self.max_number_of_messages
            )));
        }

        if !(0..=MAX_WAIT_TIME_SECONDS).contains(&self.wait_time_seconds) {
            return Err(invalid(format!(
                "wait_time_seconds must be between 0 and {MAX_WAIT_TIME_SECONDS}, got {}",
                self.wait_time_seconds
            )));
        }

        if let Some(timeout) = self.visibility_timeout {
            if !(0..=MAX_VISIBILITY_TIMEOUT_SECONDS).contains(&timeout) {
                return Err(invalid(format!(
                    "visibility_timeout must be between 0 and {MAX_VISIBILITY_TIMEOUT_SECONDS}, got {timeout}"
                )));
            }
        }

        Ok(())
    }
}

fn invalid(reason: String) -> ConsumerError {
    ConsumerError::InvalidConfiguration(reason)
}
