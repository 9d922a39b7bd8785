#[derive(Debug, thiserror::Error)]
pub enum CounterError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Counter {key} would overflow when applying {delta}")]
    Overflow { key: String, delta: i64 },

    #[error("Counter backend error: {0}")]
    Backend(String),
}

impl CounterError {
    pub fn backend<T: ToString>(msg: T) -> Self {
        Self::Backend(msg.to_string())
    }

    pub fn connection<T: ToString>(msg: T) -> Self {
        Self::Connection(msg.to_string())
    }
}
