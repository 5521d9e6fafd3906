//! Postings blob codec
//!
//! Blob layout:
//! - u8 codec tag (0 = plain, 1 = delta)
//! - u32 crc32 of the payload (little endian)
//! - payload bytes
//!
//! The tag makes decoding independent of the session's configured mode, so
//! blobs written under one mode stay readable after switching to another.

use crc32fast::Hasher;

use crate::config::CompressionMode;
use crate::error::{GramdexError, Result};
use crate::models::{PostingsEntry, PostingsList};

const HEADER_LEN: usize = 5;

/// One payload format for postings lists
pub trait PostingsCodec: Send + Sync {
    /// Tag byte written ahead of the payload
    fn tag(&self) -> u8;

    fn encode_payload(&self, list: &PostingsList, out: &mut Vec<u8>) -> Result<()>;

    fn decode_payload(&self, payload: &[u8]) -> Result<PostingsList>;
}

/// Direct structural serialization of the entry sequence
pub struct PlainCodec;

impl PostingsCodec for PlainCodec {
    fn tag(&self) -> u8 {
        0
    }

    fn encode_payload(&self, list: &PostingsList, out: &mut Vec<u8>) -> Result<()> {
        bincode::serialize_into(out, list)
            .map_err(|e| GramdexError::codec(format!("plain encode failed: {}", e)))
    }

    fn decode_payload(&self, payload: &[u8]) -> Result<PostingsList> {
        bincode::deserialize(payload)
            .map_err(|e| GramdexError::codec(format!("plain decode failed: {}", e)))
    }
}

/// Gap-coded document ids and positions, variable-byte packed.
///
/// Payload: entry count, then per entry the document id gap, the position
/// count and the position gaps.
pub struct DeltaCodec;

impl PostingsCodec for DeltaCodec {
    fn tag(&self) -> u8 {
        1
    }

    fn encode_payload(&self, list: &PostingsList, out: &mut Vec<u8>) -> Result<()> {
        encode_vbyte(list.len() as u64, out);
        let mut prev_doc = 0;
        for entry in list {
            encode_vbyte(entry.document_id - prev_doc, out);
            prev_doc = entry.document_id;

            encode_vbyte(entry.positions.len() as u64, out);
            let mut prev_pos = 0;
            for &pos in &entry.positions {
                encode_vbyte((pos - prev_pos) as u64, out);
                prev_pos = pos;
            }
        }
        Ok(())
    }

    fn decode_payload(&self, payload: &[u8]) -> Result<PostingsList> {
        let mut cursor = 0;
        let count = decode_vbyte(payload, &mut cursor)?;
        // every entry needs at least two bytes, which bounds the allocation
        let mut entries = Vec::with_capacity((count as usize).min(payload.len() / 2));

        let mut prev_doc: u64 = 0;
        for _ in 0..count {
            let gap = decode_vbyte(payload, &mut cursor)?;
            let document_id = prev_doc
                .checked_add(gap)
                .ok_or_else(|| GramdexError::codec("document id overflow"))?;
            prev_doc = document_id;

            let positions_count = decode_vbyte(payload, &mut cursor)?;
            let mut positions =
                Vec::with_capacity((positions_count as usize).min(payload.len() - cursor));
            let mut prev_pos: u32 = 0;
            for _ in 0..positions_count {
                let gap = u32::try_from(decode_vbyte(payload, &mut cursor)?)
                    .map_err(|_| GramdexError::codec("position gap out of range"))?;
                let pos = prev_pos
                    .checked_add(gap)
                    .ok_or_else(|| GramdexError::codec("position overflow"))?;
                positions.push(pos);
                prev_pos = pos;
            }
            entries.push(PostingsEntry::new(document_id, positions));
        }

        if cursor != payload.len() {
            return Err(GramdexError::codec(format!(
                "{} trailing bytes after delta payload",
                payload.len() - cursor
            )));
        }

        PostingsList::from_entries(entries).map_err(GramdexError::codec)
    }
}

fn codec_for(mode: CompressionMode) -> &'static dyn PostingsCodec {
    match mode {
        CompressionMode::None => &PlainCodec,
        CompressionMode::Delta => &DeltaCodec,
    }
}

fn codec_for_tag(tag: u8) -> Result<&'static dyn PostingsCodec> {
    match tag {
        0 => Ok(&PlainCodec),
        1 => Ok(&DeltaCodec),
        other => Err(GramdexError::codec(format!("unknown codec tag {}", other))),
    }
}

/// Encode a postings list into a self-describing blob
pub fn encode(list: &PostingsList, mode: CompressionMode) -> Result<Vec<u8>> {
    let codec = codec_for(mode);
    let mut payload = Vec::new();
    codec.encode_payload(list, &mut payload)?;

    let mut hasher = Hasher::new();
    hasher.update(&payload);
    let crc32 = hasher.finalize();

    let mut blob = Vec::with_capacity(HEADER_LEN + payload.len());
    blob.push(codec.tag());
    blob.extend_from_slice(&crc32.to_le_bytes());
    blob.extend_from_slice(&payload);
    Ok(blob)
}

/// Decode a blob produced by [`encode`] under any mode
pub fn decode(blob: &[u8]) -> Result<PostingsList> {
    if blob.len() < HEADER_LEN {
        return Err(GramdexError::codec(format!(
            "blob too short: {} bytes",
            blob.len()
        )));
    }
    let codec = codec_for_tag(blob[0])?;
    let expected = u32::from_le_bytes([blob[1], blob[2], blob[3], blob[4]]);
    let payload = &blob[HEADER_LEN..];

    let mut hasher = Hasher::new();
    hasher.update(payload);
    let actual = hasher.finalize();
    if actual != expected {
        return Err(GramdexError::codec(format!(
            "checksum mismatch: expected {:08x}, got {:08x}",
            expected, actual
        )));
    }

    codec.decode_payload(payload)
}

/// Variable-byte encoding; the high bit marks the last byte
pub fn encode_vbyte(value: u64, output: &mut Vec<u8>) {
    let mut v = value;
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            output.push(byte | 0x80);
            break;
        } else {
            output.push(byte);
        }
    }
}

/// Decode a variable-byte encoded integer
pub fn decode_vbyte(input: &[u8], pos: &mut usize) -> Result<u64> {
    let mut result: u64 = 0;
    let mut shift = 0;

    loop {
        let Some(&byte) = input.get(*pos) else {
            return Err(GramdexError::codec("unexpected end of vbyte"));
        };
        *pos += 1;

        result |= ((byte & 0x7F) as u64) << shift;

        if byte & 0x80 != 0 {
            return Ok(result);
        }

        shift += 7;
        if shift > 63 {
            return Err(GramdexError::codec("vbyte value too large"));
        }
    }
}
