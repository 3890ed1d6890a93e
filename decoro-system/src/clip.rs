//! Clip-region payload handling.
//!
//! The scissor-window property carries an opaque serialized clip region
//! whose format is owned by the rendering collaborator. The engine only
//! delegates deserialization through [`ClipDecoder`]; malformed payloads
//! are reported as errors and the caller retains the previous clip.

use thiserror::Error;

use decoro_core::types::Rect;

/// A geometric region outside of which a window's content is not drawn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClipRegion {
    /// The rectangles making up the visible region.
    pub rects: Vec<Rect<i32>>,
}

/// Error type for clip payload decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClipDecodeError {
    /// The payload was present but empty.
    #[error("Clip payload is empty")]
    EmptyPayload,

    /// The payload length is not a whole number of rectangles.
    #[error("Clip payload length {0} is not a multiple of 16")]
    TruncatedPayload(usize),

    /// A rectangle with non-positive dimensions was encoded.
    #[error("Clip rectangle has non-positive dimensions {width}x{height}")]
    DegenerateRect { width: i32, height: i32 },
}

/// Deserializes scissor payloads into clip regions.
pub trait ClipDecoder: Send {
    /// Decodes an opaque payload.
    fn decode(&self, payload: &[u8]) -> Result<ClipRegion, ClipDecodeError>;
}

/// Default decoder: a flat list of little-endian `i32` quadruples
/// `(x, y, width, height)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RectListDecoder;

impl ClipDecoder for RectListDecoder {
    fn decode(&self, payload: &[u8]) -> Result<ClipRegion, ClipDecodeError> {
        if payload.is_empty() {
            return Err(ClipDecodeError::EmptyPayload);
        }
        if payload.len() % 16 != 0 {
            return Err(ClipDecodeError::TruncatedPayload(payload.len()));
        }

        let mut rects = Vec::with_capacity(payload.len() / 16);
        for chunk in payload.chunks_exact(16) {
            let x = le_i32(&chunk[0..4]);
            let y = le_i32(&chunk[4..8]);
            let width = le_i32(&chunk[8..12]);
            let height = le_i32(&chunk[12..16]);
            if width <= 0 || height <= 0 {
                return Err(ClipDecodeError::DegenerateRect { width, height });
            }
            rects.push(Rect::new(x, y, width, height));
        }
        Ok(ClipRegion { rects })
    }
}

fn le_i32(bytes: &[u8]) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    i32::from_le_bytes(buf)
}
