//! RTS frame parser
//!
//! Payload layout after de-whitening:
//!
//! | byte | content                                  |
//! |------|------------------------------------------|
//! | 0    | encryption key                           |
//! | 1    | button (high nibble), checksum (low)     |
//! | 2-3  | rolling code, big endian                 |
//! | 4-6  | remote address, little endian            |

use tracing::trace;

use super::checksum::{check_checksum, dewhiten};
use super::types::{Button, ButtonEvent, PayloadFrame};
use crate::error::DecodeError;
use crate::radio::DecodedFrame;

/// De-whiten, verify and interpret a Manchester-decoded frame
pub fn parse_frame(frame: &DecodedFrame) -> Result<ButtonEvent, DecodeError> {
    let payload = dewhiten(frame);
    trace!("De-whitened payload: {}", hex::encode(payload.bytes()));

    check_checksum(&payload)?;
    Ok(extract_fields(&payload))
}

/// Read the fields of a checksum-valid payload
pub fn extract_fields(payload: &PayloadFrame) -> ButtonEvent {
    let p = payload.bytes();
    ButtonEvent {
        remote_address: ((p[6] as u32) << 16) | ((p[5] as u32) << 8) | (p[4] as u32),
        rolling_code: ((p[2] as u16) << 8) | (p[3] as u16),
        button: Button::from(p[1] >> 4),
    }
}
