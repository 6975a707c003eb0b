use std::collections::HashMap;

/// A message received from the queue.
///
/// The body is opaque to the consumer. The receipt handle identifies this
/// particular delivery and is the only thing needed to delete it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message_id: Option<String>,
    pub body: String,
    pub receipt_handle: String,
    /// String-valued message attributes named in the configured allow-list.
    pub attributes: HashMap<String, String>,
    /// System attributes returned by the queue (e.g. `ApproximateReceiveCount`).
    pub system_attributes: HashMap<String, String>,
}

impl Message {
    pub fn new(body: impl Into<String>, receipt_handle: impl Into<String>) -> Self {
        Message {
            message_id: None,
            body: body.into(),
            receipt_handle: receipt_handle.into(),
            attributes: HashMap::new(),
            system_attributes: HashMap::new(),
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// A request to delete one message, handed from a callback to the delete worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub receipt_handle: String,
    pub message_id: Option<String>,
}

impl From<&Message> for DeleteRequest {
    fn from(message: &Message) -> Self {
        DeleteRequest {
            receipt_handle: message.receipt_handle.clone(),
            message_id: message.message_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_request_carries_receipt_handle_and_id() {
        let message = Message::new("payload", "rh-1")
            .with_message_id("id-1")
            .with_attribute("tenant", "acme");

        let request = DeleteRequest::from(&message);
        assert_eq!(request.receipt_handle, "rh-1");
        assert_eq!(request.message_id.as_deref(), Some("id-1"));
        assert_eq!(message.attribute("tenant"), Some("acme"));
        assert_eq!(message.attribute("missing"), None);
    }
}
