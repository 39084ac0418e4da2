use vesclink_frame::InvalidFrame;

/// A frame passed its integrity checks but its payload does not fit the
/// packet type it claims to be.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The first payload byte is not this packet's type id.
    #[error("{name} expects type id {expected}, frame carries {actual:?}")]
    WrongType {
        name: &'static str,
        expected: u8,
        actual: Option<u8>,
    },

    /// The payload ends before a fixed field.
    #[error("{name} payload too short ({actual} bytes, need {required})")]
    TooShort {
        name: &'static str,
        required: usize,
        actual: usize,
    },

    /// A NUL-terminated string field has no terminator.
    #[error("{name} {field} is not NUL-terminated")]
    Unterminated {
        name: &'static str,
        field: &'static str,
    },
}

/// Errors raised while building a packet registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A decoder is already registered for this type id.
    #[error("packet type {id} already registered as {existing}")]
    DuplicateType { id: u8, existing: &'static str },
}

/// Why a candidate frame in a byte stream was discarded.
///
/// Rejections are never fatal. A scanner that sees one skips a single byte
/// and looks for the next start byte.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The envelope is invalid (bad length, bad end byte, checksum mismatch).
    #[error(transparent)]
    Frame(#[from] InvalidFrame),

    /// The frame is valid but no decoder is registered for its type.
    #[error("unknown packet type {0}")]
    UnknownType(u8),

    /// The registered decoder refused the payload.
    #[error("malformed packet (type {type_id}): {source}")]
    Malformed { type_id: u8, source: DecodeError },
}

impl Rejection {
    /// Whether a whole frame arrived and was thrown away.
    ///
    /// False for header-level rejections, which stray bytes that happen to
    /// equal a start byte produce all the time.
    pub fn is_discarded_frame(&self) -> bool {
        match self {
            Self::Frame(err) => err.is_checksum(),
            Self::UnknownType(_) | Self::Malformed { .. } => true,
        }
    }
}

/// Errors from the blocking and async stream adapters.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// An I/O error occurred while reading or writing packets.
    #[error("packet stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended (or stopped accepting bytes) mid-exchange.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discarded_frame_classification() {
        let crc = Rejection::Frame(InvalidFrame::CrcMismatch {
            expected: 1,
            computed: 2,
        });
        assert!(crc.is_discarded_frame());
        assert!(Rejection::UnknownType(42).is_discarded_frame());
        assert!(!Rejection::Frame(InvalidFrame::PayloadLength(0)).is_discarded_frame());
        assert!(!Rejection::Frame(InvalidFrame::InvalidEnd(0)).is_discarded_frame());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Rejection::UnknownType(42).to_string(),
            "unknown packet type 42"
        );
        let malformed = Rejection::Malformed {
            type_id: 4,
            source: DecodeError::TooShort {
                name: "Values",
                required: 73,
                actual: 10,
            },
        };
        assert_eq!(
            malformed.to_string(),
            "malformed packet (type 4): Values payload too short (10 bytes, need 73)"
        );
    }
}
