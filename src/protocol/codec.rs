//! Protocol codec
//!
//! Encoding side of the wire protocol. Decoding is incremental and lives in
//! [`super::Parser`].

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{HiveError, Result};

/// Every command token is exactly this many bytes
pub const COMMAND_LEN: usize = 3;

/// Maximum argument size (16 MB)
pub const MAX_ARG_SIZE: usize = 16 * 1024 * 1024;

/// Encode a command with up to two framed arguments
///
/// An empty `key` yields the bare command. A `value` without a `key` is rejected
/// because the receiver could not tell which argument it is.
pub fn create_data(command: impl AsRef<[u8]>, key: &[u8], value: &[u8]) -> Result<Bytes> {
    let command = command.as_ref();
    if command.len() != COMMAND_LEN {
        return Err(HiveError::InvalidArgument(format!(
            "command must be {} bytes, got {}",
            COMMAND_LEN,
            command.len()
        )));
    }
    if key.is_empty() && !value.is_empty() {
        return Err(HiveError::InvalidArgument(
            "cannot specify a value with no key".to_string(),
        ));
    }

    let mut message = BytesMut::with_capacity(COMMAND_LEN + 2 * 10 + key.len() + value.len());
    message.put_slice(command);
    if !key.is_empty() {
        put_frame(&mut message, key)?;
        if !value.is_empty() {
            put_frame(&mut message, value)?;
        }
    }

    Ok(message.freeze())
}

/// Append `arg` as length-of-length + length + body
pub(crate) fn put_frame(buf: &mut BytesMut, arg: &[u8]) -> Result<()> {
    if arg.len() > MAX_ARG_SIZE {
        return Err(HiveError::InvalidArgument(format!(
            "argument too large: {} bytes (max {})",
            arg.len(),
            MAX_ARG_SIZE
        )));
    }
    put_length_field(buf, arg.len().to_string().as_bytes());
    buf.put_slice(arg);
    Ok(())
}

/// Append `digits` as a literal-value argument (length field only, no body)
pub(crate) fn put_literal(buf: &mut BytesMut, digits: &[u8]) -> Result<()> {
    if digits.is_empty() || digits.len() > 9 || !digits.iter().all(u8::is_ascii_digit) {
        return Err(HiveError::InvalidArgument(format!(
            "literal argument must be 1-9 decimal digits, got {:?}",
            String::from_utf8_lossy(digits)
        )));
    }
    put_length_field(buf, digits);
    Ok(())
}

fn put_length_field(buf: &mut BytesMut, digits: &[u8]) {
    // MAX_ARG_SIZE keeps every length within 9 digits
    debug_assert!((1..=9).contains(&digits.len()));
    buf.put_u8(b'0' + digits.len() as u8);
    buf.put_slice(digits);
}
