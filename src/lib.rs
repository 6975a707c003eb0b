//! # AWS SQS Consumer
//!
//! A queue-consumption engine for AWS SQS. A receive loop long-polls the queue
//! and hands every message to your callback; a delete worker removes the
//! messages your callback is finished with, in the order they were submitted.
//!
//! ## Features
//!
//! - Asynchronous polling and deletion on tokio
//! - Trait-based callbacks, or plain async functions with a shared resource
//! - Deletes only what the callback explicitly submits
//! - Fatal receive and delete failures trip a health sink and stop the consumer
//! - Two-phase shutdown that drains every submitted delete before returning
//! - Queue url given directly or resolved at start by a queue provider
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rs_sqs_consumer::{
//!     client::create_sqs_client_from_env,
//!     health::HealthFlag,
//!     message::Message,
//!     receiver::{ConsumerFn, DeleteSubmitter, SqsConsumer, SqsConsumerConfig},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(create_sqs_client_from_env().await);
//!     let config = SqsConsumerConfig::with_queue_url("https://sqs.region.amazonaws.com/account/queue-name")
//!         .wait_time_seconds(10)
//!         .max_number_of_messages(10);
//!     let shared_data = "shared state".to_string();
//!
//!     let consumer = SqsConsumer::new(
//!         client,
//!         config,
//!         ConsumerFn::new(
//!             |message: Message, deleter: DeleteSubmitter, shared: String| async move {
//!                 println!("Processing message: {} with shared: {}", message.body, shared);
//!                 let _ = deleter.submit().await;
//!             },
//!             shared_data,
//!         ),
//!         HealthFlag::new(),
//!     );
//!
//!     consumer.start().await?;
//!     consumer.wait().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod errors;
pub mod health;
pub mod message;
pub mod provider;
pub mod receiver;
