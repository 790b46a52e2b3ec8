use std::time::Duration;

use thiserror::Error;

/// Failure talking to the chat platform.
#[derive(Error, Debug)]
pub enum DbotError {
    #[error("Bot error: {0}")]
    Bot(String),

    /// Chat platform asked us to back off; carries the server-specified delay.
    #[error("Rate limited, retry after {0:?}")]
    RateLimited(Duration),
}

pub type Result<T> = std::result::Result<T, DbotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DbotError::Bot("chat not found".to_string()).to_string(),
            "Bot error: chat not found"
        );
        assert_eq!(
            DbotError::RateLimited(Duration::from_secs(3)).to_string(),
            "Rate limited, retry after 3s"
        );
    }
}
