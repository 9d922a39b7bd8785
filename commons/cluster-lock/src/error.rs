use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("Lock service unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out after {waited:?} waiting for lock {name}")]
    Timeout { name: String, waited: Duration },
}
