/// Errors from parsing foundation types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypeError {
    /// Invalid hexadecimal input.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded byte sequence has the wrong length.
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// A signature line could not be parsed or contains forbidden characters.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
}
