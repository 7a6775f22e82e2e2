//! Socket Lifecycle
//!
//! Shared connection state machine for the presence and chat channels, plus
//! the reconnect policy injected into a channel at construction time.

/// Lifecycle of a WebSocket channel.
///
/// `Errored` is terminal: neither channel retries on its own unless a
/// reconnect policy says otherwise, and the UI offers a page reload as the
/// only recovery path.
#[derive(Clone, Debug, PartialEq)]
pub enum SocketStatus {
    Connecting,
    Open,
    Closed,
    Errored(String),
}

/// Reconnect behavior for a channel.
///
/// The default is `None`: a lost socket stays lost until the owning
/// component remounts. `Backoff` retries with exponential delay, capped at
/// 30 seconds per attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReconnectPolicy {
    None,
    Backoff { max_attempts: u32 },
}

impl ReconnectPolicy {
    /// Delay in milliseconds before the given attempt (0-based), or `None`
    /// when no further attempt should be made.
    pub fn delay_ms(&self, attempt: u32) -> Option<u32> {
        match self {
            ReconnectPolicy::None => None,
            ReconnectPolicy::Backoff { max_attempts } => {
                if attempt >= *max_attempts {
                    None
                } else {
                    Some((2_u32.pow(attempt) * 1000).min(30_000))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_reconnect_by_default() {
        assert_eq!(ReconnectPolicy::None.delay_ms(0), None);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = ReconnectPolicy::Backoff { max_attempts: 10 };
        assert_eq!(policy.delay_ms(0), Some(1000));
        assert_eq!(policy.delay_ms(1), Some(2000));
        assert_eq!(policy.delay_ms(2), Some(4000));
        assert_eq!(policy.delay_ms(9), Some(30_000));
    }

    #[test]
    fn test_backoff_stops_after_max_attempts() {
        let policy = ReconnectPolicy::Backoff { max_attempts: 3 };
        assert_eq!(policy.delay_ms(2), Some(4000));
        assert_eq!(policy.delay_ms(3), None);
    }
}
