//! Error types

use crate::protocol::crypto::CryptoError;
use crate::protocol::http::HttpCodecError;
use crate::protocol::tlv8::TlvError;
use crate::storage::StorageError;

/// Status codes carried in TLV tag 7 replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TlvStatus {
    #[error("unknown")]
    Unknown,
    #[error("setup code or signature verification failed")]
    Authentication,
    #[error("wait the retry-delay before retrying")]
    Backoff,
    #[error("accessory cannot accept any more pairings")]
    MaxPeers,
    #[error("accessory reached its maximum authentication attempts")]
    MaxTries,
    #[error("pairing method is unavailable")]
    Unavailable,
    #[error("accessory is busy")]
    Busy,
}

impl TlvStatus {
    /// Map a TLV error code byte; unknown codes collapse to `Unknown`
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            0x02 => Self::Authentication,
            0x03 => Self::Backoff,
            0x04 => Self::MaxPeers,
            0x05 => Self::MaxTries,
            0x06 => Self::Unavailable,
            0x07 => Self::Busy,
            _ => Self::Unknown,
        }
    }
}

/// Main error type for HAP controller operations
#[derive(Debug, thiserror::Error)]
pub enum HapError {
    /// No candidate address of the device could be dialled
    #[error("device {0} not reachable")]
    NotReachable(String),

    /// Socket-level failure
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection went away while a call was in flight
    #[error("connection closed")]
    ConnectionClosed,

    /// Per-request deadline expired; the connection itself may be fine
    #[error("request timed out")]
    Timeout,

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("tlv error: {0}")]
    Tlv(#[from] TlvError),

    #[error("http error: {0}")]
    Http(#[from] HttpCodecError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Pair-setup failure tagged with the handshake step that produced it
    #[error("pair-setup error on step {step}: {source}")]
    PairSetup {
        step: &'static str,
        source: Box<HapError>,
    },

    /// Pair-verify failure tagged with the handshake step that produced it
    #[error("pair-verify error on step {step}: {source}")]
    PairVerify {
        step: &'static str,
        source: Box<HapError>,
    },

    /// The accessory answered with a non-zero TLV error code
    #[error("accessory error: {0}")]
    Accessory(TlvStatus),

    /// A handshake step got a non-2xx HTTP status
    #[error("unexpected status code {0}")]
    UnexpectedStatus(u16),

    /// Malformed or out-of-sequence protocol data
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("device not paired")]
    NotPaired,

    #[error("device already paired")]
    AlreadyPaired,

    #[error("device not verified")]
    NotVerified,

    #[error("device not discovered")]
    NotDiscovered,

    #[error("no open connection")]
    NotConnected,

    #[error("not subscribed")]
    NotSubscribed,

    #[error("already subscribed")]
    AlreadySubscribed,
}

impl HapError {
    /// Wrap a pair-setup step failure
    pub fn pair_setup(step: &'static str, source: impl Into<HapError>) -> Self {
        Self::PairSetup {
            step,
            source: Box::new(source.into()),
        }
    }

    /// Wrap a pair-verify step failure
    pub fn pair_verify(step: &'static str, source: impl Into<HapError>) -> Self {
        Self::PairVerify {
            step,
            source: Box::new(source.into()),
        }
    }

    /// Handshake (credential) failures are not retried by the supervisor;
    /// everything else is treated as transient.
    #[must_use]
    pub fn is_handshake_failure(&self) -> bool {
        matches!(self, Self::PairSetup { .. } | Self::PairVerify { .. })
    }
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, HapError>;
