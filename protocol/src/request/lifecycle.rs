//! # Request Lifecycle
//!
//! Every submitted call walks the same path:
//!
//! ```text
//! Constructed -> Signed -> Enveloped -> Sent -> ResponseReceived -> Decrypted -> Verified
//!                                          \-> TimedOut
//!                                          \-> RpcError (from Sent or any later step)
//! ```
//!
//! `Verified`, `TimedOut` and `RpcError` are terminal. Driving the machine
//! any other way is an error. Nothing retries: a terminal failure is final
//! for this request, and a new attempt needs a new nonce and a new key.

use std::time::Instant;

use tracing::debug;

use crate::error::{ClientError, ProtocolError, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    Constructed,
    Signed,
    Enveloped,
    Sent,
    ResponseReceived,
    Decrypted,
    Verified,
    TimedOut,
    RpcError,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constructed => "constructed",
            Self::Signed => "signed",
            Self::Enveloped => "enveloped",
            Self::Sent => "sent",
            Self::ResponseReceived => "response_received",
            Self::Decrypted => "decrypted",
            Self::Verified => "verified",
            Self::TimedOut => "timed_out",
            Self::RpcError => "rpc_error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::TimedOut | Self::RpcError)
    }

    fn can_advance_to(&self, next: RequestState) -> bool {
        use RequestState::*;
        matches!(
            (self, next),
            (Constructed, Signed)
                | (Signed, Enveloped)
                | (Enveloped, Sent)
                | (Sent, ResponseReceived)
                | (Sent, TimedOut)
                | (Sent, RpcError)
                | (ResponseReceived, Decrypted)
                | (ResponseReceived, RpcError)
                | (Decrypted, Verified)
                | (Decrypted, RpcError)
        )
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks one request from construction to a terminal state.
#[derive(Debug, Clone)]
pub struct RequestLifecycle {
    state: RequestState,
    tx_hash: String,
    started_at: Instant,
}

impl RequestLifecycle {
    pub fn new(tx_hash: String) -> Self {
        Self {
            state: RequestState::Constructed,
            tx_hash,
            started_at: Instant::now(),
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn tx_hash(&self) -> &str {
        &self.tx_hash
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Move to `next`, or fail without changing state.
    pub fn advance(&mut self, next: RequestState) -> Result<(), ProtocolError> {
        if !self.state.can_advance_to(next) {
            return Err(ProtocolError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        debug!(tx_hash = %self.tx_hash, from = %self.state, to = %next, "request state");
        self.state = next;
        Ok(())
    }

    /// Record a failure after the request went out. Timeouts end in
    /// `TimedOut`, everything else in `RpcError`. Before `Sent` there is
    /// nothing to record and the state is left alone.
    pub fn fail(&mut self, err: &ClientError) -> RequestState {
        let next = match err {
            ClientError::Transport(TransportError::Timeout { .. }) => RequestState::TimedOut,
            _ => RequestState::RpcError,
        };
        if self.advance(next).is_err() && next == RequestState::TimedOut {
            // TimedOut is only reachable from Sent; anything later is an rpc error.
            let _ = self.advance(RequestState::RpcError);
        }
        self.state
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sent() -> RequestLifecycle {
        let mut lc = RequestLifecycle::new("0xabc".to_string());
        lc.advance(RequestState::Signed).unwrap();
        lc.advance(RequestState::Enveloped).unwrap();
        lc.advance(RequestState::Sent).unwrap();
        lc
    }

    #[test]
    fn test_happy_path() {
        let mut lc = sent();
        lc.advance(RequestState::ResponseReceived).unwrap();
        lc.advance(RequestState::Decrypted).unwrap();
        lc.advance(RequestState::Verified).unwrap();
        assert!(lc.is_terminal());
        assert_eq!(lc.tx_hash(), "0xabc");
    }

    #[test]
    fn test_skipping_a_step_is_rejected() {
        let mut lc = RequestLifecycle::new("0x".to_string());
        let err = lc.advance(RequestState::Sent).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::InvalidTransition {
                from: "constructed".into(),
                to: "sent".into()
            }
        );
        assert_eq!(lc.state(), RequestState::Constructed);
    }

    #[test]
    fn test_timeout_maps_to_timed_out() {
        let mut lc = sent();
        let state = lc.fail(&TransportError::Timeout { elapsed_ms: 5 }.into());
        assert_eq!(state, RequestState::TimedOut);
    }

    #[test]
    fn test_late_failure_is_rpc_error() {
        let mut lc = sent();
        lc.advance(RequestState::ResponseReceived).unwrap();
        let state = lc.fail(&TransportError::Timeout { elapsed_ms: 5 }.into());
        assert_eq!(state, RequestState::RpcError);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut lc = sent();
        lc.advance(RequestState::TimedOut).unwrap();
        assert!(lc.advance(RequestState::ResponseReceived).is_err());
        assert_eq!(lc.fail(&ProtocolError::NoFrames.into()), RequestState::TimedOut);
    }
}
