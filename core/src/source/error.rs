// core/src/source/error.rs
use thiserror::Error;

/// Why a live fetch produced no usable snapshot.
///
/// The dashboard treats every variant the same way (fall back to synthetic
/// data); the distinction only shows up in the message and the log.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// Unreachable host, DNS failure, connection reset or timeout.
    #[error("transport error: {0}")]
    Transport(String),
    /// Backend answered with a non-success status.
    #[error("backend returned HTTP {status}")]
    Protocol { status: u16 },
    /// Body could not be decoded into a snapshot or broke its invariants.
    #[error("malformed payload: {0}")]
    Shape(String),
}

impl FetchError {
    pub fn timed_out(after_ms: u128) -> Self {
        FetchError::Transport(format!("no response within {} ms", after_ms))
    }

    /// The single user-visible form of any fetch failure.
    pub fn user_message(&self) -> String {
        format!("live data unavailable: {}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_variants_share_the_user_facing_prefix() {
        for err in [
            FetchError::Transport("connection refused".into()),
            FetchError::Protocol { status: 503 },
            FetchError::Shape("missing field `gpu_stats`".into()),
            FetchError::timed_out(10_000),
        ] {
            assert!(err.user_message().starts_with("live data unavailable: "));
        }
        assert_eq!(
            FetchError::Protocol { status: 503 }.user_message(),
            "live data unavailable: backend returned HTTP 503"
        );
    }
}
