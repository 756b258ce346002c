use std::fmt;

// ============================================================================
// Message Envelopes
// ============================================================================

/// Raw delivery handed over by the consumer loop
#[derive(Debug, Clone, Copy)]
pub struct Delivery<'a> {
    pub topic: &'a str,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<&'a [u8]>,
    pub payload: Option<&'a [u8]>,
}

/// Decoded message: broker coordinates plus typed payload
#[derive(Debug, Clone, PartialEq)]
pub struct Message<T> {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<String>,
    pub payload: T,
}

impl<T> Message<T> {
    pub fn from_delivery(delivery: &Delivery<'_>, payload: T) -> Self {
        Self {
            topic: delivery.topic.to_string(),
            partition: delivery.partition,
            offset: delivery.offset,
            key: delivery
                .key
                .map(|key| String::from_utf8_lossy(key).into_owned()),
            payload,
        }
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

impl<T: fmt::Debug> fmt::Display for Message<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Message[topic={}, partition={}, offset={}, key={:?}, payload={:?}]",
            self.topic, self.partition, self.offset, self.key, self.payload
        )
    }
}
