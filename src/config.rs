//! Session configuration.

use crate::error::{Error, Result};
use std::time::Duration;

/// How chunk bytes are decoded before being handed to `data` subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Strict UTF-8. An invalid sequence is fatal to the session.
    #[default]
    Utf8,
    /// Lossy UTF-8; invalid sequences become U+FFFD. A chunk boundary can
    /// split a multibyte sequence, so followers of non-ASCII files usually
    /// want this variant.
    Utf8Lossy,
}

impl Encoding {
    pub(crate) fn decode(self, bytes: Vec<u8>) -> Result<String> {
        match self {
            Encoding::Utf8 => Ok(String::from_utf8(bytes)?),
            Encoding::Utf8Lossy => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}

/// Tuning knobs for a tail session. Fixed once the session is constructed.
///
/// Partial overrides use struct update syntax:
///
/// ```
/// use file_tail::TailOptions;
///
/// let options = TailOptions {
///     chunk_size: 4096,
///     ..TailOptions::default()
/// };
/// assert_eq!(options.poll_interval.as_millis(), 500);
/// ```
#[derive(Debug, Clone)]
pub struct TailOptions {
    /// Upper bound on the size of a single read, in bytes.
    pub chunk_size: usize,
    /// Decoding applied to each chunk before emission.
    pub encoding: Encoding,
    /// Fixed interval at which the file is polled for changes. Smaller
    /// values lower detection latency at the cost of more stat calls.
    pub poll_interval: Duration,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            encoding: Encoding::Utf8,
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl TailOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidArgument(
                "chunk_size must be positive".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::InvalidArgument(
                "poll_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
