use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::QueueAttributeName;
use futures::FutureExt;

use crate::errors::GenericError;

/// Resolves a queue's url and ARN when they are not known before the consumer starts.
///
/// Both methods are called once, from `SqsConsumer::start`.
#[async_trait]
pub trait QueueProvider: Send + Sync {
    async fn queue_url(&self) -> Result<String, GenericError>;

    async fn queue_arn(&self) -> Result<String, GenericError>;
}

/// Looks up an existing queue by name.
pub struct SqsQueueLookup {
    client: aws_sdk_sqs::Client,
    queue_name: String,
    owner_account_id: Option<String>,
}

impl SqsQueueLookup {
    pub fn new(client: aws_sdk_sqs::Client, queue_name: &str) -> Self {
        SqsQueueLookup {
            client,
            queue_name: queue_name.to_string(),
            owner_account_id: None,
        }
    }

    /// Resolve a queue owned by another AWS account.
    pub fn with_owner_account_id(mut self, account_id: &str) -> Self {
        self.owner_account_id = Some(account_id.to_string());
        self
    }
}

#[async_trait]
impl QueueProvider for SqsQueueLookup {
    async fn queue_url(&self) -> Result<String, GenericError> {
        let output = self
            .client
            .get_queue_url()
            .queue_name(&self.queue_name)
            .set_queue_owner_aws_account_id(self.owner_account_id.clone())
            .send()
            .boxed()
            .await
            .map_err(|e| {
                GenericError::new(format!(
                    "failed to look up url of queue {}: {}",
                    self.queue_name,
                    DisplayErrorContext(&e)
                ))
            })?;

        output.queue_url().map(str::to_string).ok_or_else(|| {
            GenericError::new(format!("no url returned for queue {}", self.queue_name))
        })
    }

    async fn queue_arn(&self) -> Result<String, GenericError> {
        let queue_url = self.queue_url().await?;
        let output = self
            .client
            .get_queue_attributes()
            .queue_url(&queue_url)
            .attribute_names(QueueAttributeName::QueueArn)
            .send()
            .boxed()
            .await
            .map_err(|e| {
                GenericError::new(format!(
                    "failed to look up attributes of queue {}: {}",
                    self.queue_name,
                    DisplayErrorContext(&e)
                ))
            })?;

        output
            .attributes()
            .and_then(|attributes| attributes.get(&QueueAttributeName::QueueArn))
            .cloned()
            .ok_or_else(|| GenericError::new(format!("no ARN returned for queue {}", self.queue_name)))
    }
}
