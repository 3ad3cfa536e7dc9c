
use std::io::{ErrorKind, Read, Write};

use anyhow::{bail, Context};
use serde::Serialize;

use crate::{config, protocol::Request};

/// Read one framed request. `Ok(None)` means the front end closed stdin.
pub fn read_message<R: Read + ?Sized>(input: &mut R) -> anyhow::Result<Option<Request>> {
    // A single read() may return fewer than 4 bytes on a pipe; keep filling.
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        match input.read(&mut len_buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("failed reading native message length"),
        }
    }
    if filled == 0 {
        return Ok(None);
    }
    if filled < len_buf.len() {
        bail!("incomplete length prefix (expected 4 bytes, got {filled})");
    }

    // Native messaging uses 32-bit little-endian length.
    let msg_len = u32::from_le_bytes(len_buf);
    if msg_len > config::native_messaging::MAX_MESSAGE_SIZE_BYTES {
        bail!("message too large: {msg_len} bytes");
    }

    let mut payload = vec![0u8; msg_len as usize];
    input
        .read_exact(&mut payload)
        .with_context(|| format!("failed reading native message payload ({msg_len} bytes)"))?;

    let req: Request = serde_json::from_slice(&payload).context("invalid JSON request")?;
    Ok(Some(req))
}

/// Write one framed JSON message and flush.
pub fn write_message<W: Write + ?Sized, T: Serialize>(output: &mut W, message: &T) -> anyhow::Result<()> {
    let bytes = serde_json::to_vec(message).context("failed serializing JSON response")?;
    let len: u32 = bytes
        .len()
        .try_into()
        .context("response too large for u32 length")?;
    output.write_all(&len.to_le_bytes())?;
    output.write_all(&bytes)?;
    output.flush().context("failed flushing stdout")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn frame(json: &str) -> Vec<u8> {
        let mut out = (json.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(json.as_bytes());
        out
    }

    #[test]
    fn test_reads_request_and_eof() {
        let mut input = Cursor::new(frame(r#"{"id":"1","method":"hello"}"#));
        let req = read_message(&mut input).unwrap().unwrap();
        assert_eq!(req.id, "1");
        assert_eq!(req.method, "hello");
        assert!(req.params.is_null());
        assert!(read_message(&mut input).unwrap().is_none());
    }

    #[test]
    fn test_truncated_prefix_is_error() {
        let mut input = Cursor::new(vec![5u8, 0]);
        assert!(read_message(&mut input).is_err());
    }

    #[test]
    fn test_oversized_message_rejected() {
        let mut input = Cursor::new(u32::MAX.to_le_bytes().to_vec());
        let err = read_message(&mut input).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_write_message_frames_json() {
        let mut out = Vec::new();
        write_message(&mut out, &serde_json::json!({ "id": "7", "result": true })).unwrap();
        let len = u32::from_le_bytes([out[0], out[1], out[2], out[3]]) as usize;
        assert_eq!(len, out.len() - 4);
        let v: serde_json::Value = serde_json::from_slice(&out[4..]).unwrap();
        assert_eq!(v["id"], "7");
    }
}
