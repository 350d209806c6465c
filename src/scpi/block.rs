//! IEEE 488.2 definite-length arbitrary blocks: `#<n><len><payload>`.

use std::io::BufRead;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Encodes `values` as big-endian 16 bit words inside a definite-length block.
pub fn encode_u16_block(values: &[u16]) -> Bytes {
    let payload_len = values.len() * 2;
    let len_digits = payload_len.to_string();
    let mut buf = BytesMut::with_capacity(2 + len_digits.len() + payload_len);
    buf.put_u8(b'#');
    buf.put_u8(b'0' + len_digits.len() as u8);
    buf.put_slice(len_digits.as_bytes());
    for v in values {
        buf.put_u16(*v);
    }
    buf.freeze()
}

/// Reads one block of at most `max_len` payload bytes from `reader` and returns
/// the payload. The message terminator following the payload is left in the
/// reader.
pub fn read_block<R: BufRead>(reader: &mut R, max_len: usize) -> Result<Bytes> {
    let mut head = [0u8; 2];
    reader.read_exact(&mut head)?;
    if head[0] != b'#' {
        return Err(Error::InvalidBlock(format!(
            "expected '#', found {:?}",
            head[0] as char
        )));
    }
    let n_digits = match head[1] {
        d @ b'1'..=b'9' => (d - b'0') as usize,
        b'0' => {
            return Err(Error::InvalidBlock(
                "indefinite-length blocks are not supported".to_string(),
            ))
        }
        d => {
            return Err(Error::InvalidBlock(format!(
                "invalid length digit count {:?}",
                d as char
            )))
        }
    };
    let mut digits = vec![0u8; n_digits];
    reader.read_exact(&mut digits)?;
    let len: usize = std::str::from_utf8(&digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::InvalidBlock(format!("invalid length {:?}", digits)))?;
    if len > max_len {
        return Err(Error::InvalidBlock(format!(
            "block of {} bytes exceeds the limit of {}",
            len, max_len
        )));
    }
    let mut payload = BytesMut::zeroed(len);
    reader.read_exact(&mut payload)?;
    log::trace!("read {} byte block", len);
    Ok(payload.freeze())
}

/// Splits a block payload into big-endian 16 bit words.
pub fn decode_u16_payload(mut payload: Bytes) -> Result<Vec<u16>> {
    if payload.len() % 2 != 0 {
        return Err(Error::InvalidBlock(format!(
            "odd payload length {} for 16 bit data",
            payload.len()
        )));
    }
    let mut values = Vec::with_capacity(payload.len() / 2);
    while payload.has_remaining() {
        values.push(payload.get_u16());
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_length_prefix_and_big_endian_words() {
        let block = encode_u16_block(&[0x0102, 0x3fff]);
        assert_eq!(&block[..], b"#14\x01\x02\x3f\xff");

        let block = encode_u16_block(&vec![0; 6]);
        assert_eq!(&block[..4], b"#212");
    }

    #[test]
    fn reads_block_and_leaves_terminator() {
        let mut reader = std::io::Cursor::new(b"#14\x00\x01\x20\x00\nrest".to_vec());
        let payload = read_block(&mut reader, 64).unwrap();
        assert_eq!(decode_u16_payload(payload).unwrap(), vec![1, 0x2000]);
        let mut tail = String::new();
        reader.read_line(&mut tail).unwrap();
        assert_eq!(tail, "\n");
    }

    #[test]
    fn rejects_malformed_blocks() {
        let mut reader = std::io::Cursor::new(b"12\x00".to_vec());
        assert!(matches!(read_block(&mut reader, 64), Err(Error::InvalidBlock(_))));
        let mut reader = std::io::Cursor::new(b"#0\x00\x01".to_vec());
        assert!(matches!(read_block(&mut reader, 64), Err(Error::InvalidBlock(_))));
        assert!(decode_u16_payload(Bytes::from_static(b"\x00\x01\x02")).is_err());
    }

    #[test]
    fn length_header_is_checked_before_allocating() {
        let mut reader = std::io::Cursor::new(b"#9999999999\x00".to_vec());
        assert!(matches!(read_block(&mut reader, 262_144), Err(Error::InvalidBlock(_))));
        let mut reader = std::io::Cursor::new(b"#14\x00\x01\x00\x02".to_vec());
        assert!(matches!(read_block(&mut reader, 2), Err(Error::InvalidBlock(_))));
        let mut reader = std::io::Cursor::new(b"#1x".to_vec());
        assert!(matches!(read_block(&mut reader, 64), Err(Error::InvalidBlock(_))));
    }

    #[test]
    fn truncated_payload_is_an_io_error() {
        let mut reader = std::io::Cursor::new(b"#18\x00\x01".to_vec());
        assert!(matches!(read_block(&mut reader, 64), Err(Error::IOError(_))));
    }
}
