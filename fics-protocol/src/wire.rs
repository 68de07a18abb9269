//! Timeseal framing.
//!
//! Outgoing commands are salted with a timestamp and scrambled in 12-byte
//! blocks against a fixed key. Inbound text arrives in the clear except for
//! `[G]\0` markers, which the server uses to ask for a timing
//! acknowledgement.

use std::time::{SystemTime, UNIX_EPOCH};

const KEY: &[u8; 50] = b"Timestamp (FICS) v1.0 - programmed by Henrik Gram.";
const BLOCK_LEN: usize = 12;
const BLOCK_SWAPS: [(usize, usize); 3] = [(0, 11), (2, 9), (4, 7)];
const PAD: u8 = b'1';

/// Marker the server embeds in its output to request an acknowledgement.
pub const ACK_MARKER: &[u8] = b"[G]\0";

/// Payload of the acknowledgement reply.
const ACK_PAYLOAD: &str = "\u{2}9";

/// Encode one command line at the given timestamp.
pub fn encode(command: &str, timestamp: u32) -> Vec<u8> {
    let mut frame = Vec::with_capacity(command.len() + 16);
    frame.extend_from_slice(command.as_bytes());
    frame.push(0x18);
    frame.extend_from_slice(timestamp.to_string().as_bytes());
    frame.push(0x19);
    while frame.len() % BLOCK_LEN != 0 {
        frame.push(PAD);
    }

    for block in frame.chunks_exact_mut(BLOCK_LEN) {
        for (a, b) in BLOCK_SWAPS {
            block.swap(a, b);
        }
    }
    for (i, byte) in frame.iter_mut().enumerate() {
        *byte = ((*byte | 0x80) ^ KEY[i % KEY.len()]).wrapping_sub(32);
    }

    frame.push(0x80);
    frame.push(0x0a);
    frame
}

/// Encode a command with the current timestamp.
pub fn encode_now(command: &str) -> Vec<u8> {
    encode(command, timestamp_now())
}

/// Encode the reply owed for one inbound acknowledgement marker.
pub fn encode_ack(timestamp: u32) -> Vec<u8> {
    encode(ACK_PAYLOAD, timestamp)
}

/// Milliseconds within the current ten-second window.
pub fn timestamp_now() -> u32 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    (millis % 10_000) as u32
}

/// Text recovered from one inbound read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inbound {
    pub text: String,
    /// Number of acknowledgement markers removed; one reply is owed for each.
    pub acks: usize,
}

/// Strips acknowledgement markers from the inbound byte stream.
///
/// A marker may straddle two reads, so a trailing partial marker is held
/// back until the next call.
#[derive(Debug, Default)]
pub struct InboundDecoder {
    held: Vec<u8>,
}

impl InboundDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, bytes: &[u8]) -> Inbound {
        let mut data = std::mem::take(&mut self.held);
        data.extend_from_slice(bytes);

        let mut clean = Vec::with_capacity(data.len());
        let mut acks = 0;
        let mut i = 0;
        while i < data.len() {
            if data[i..].starts_with(ACK_MARKER) {
                acks += 1;
                i += ACK_MARKER.len();
            } else if ACK_MARKER.starts_with(&data[i..]) {
                self.held = data[i..].to_vec();
                break;
            } else {
                clean.push(data[i]);
                i += 1;
            }
        }

        if acks > 0 {
            tracing::trace!("Stripped {} acknowledgement marker(s)", acks);
        }
        Inbound {
            text: String::from_utf8_lossy(&clean).into_owned(),
            acks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_golden_frame() {
        assert_eq!(
            encode("hello", 1234),
            vec![0xc5, 0x6c, 0xb9, 0x69, 0xa1, 0xcc, 0xb0, 0x62, 0xa3, 0xac, 0x91, 0x8e, 0x80, 0x0a]
        );
    }

    #[test]
    fn test_ack_golden_frame() {
        assert_eq!(
            encode_ack(0),
            vec![0xc5, 0xb0, 0xbc, 0xb5, 0xa2, 0xa5, 0xb0, 0xd4, 0xa1, 0x98, 0x79, 0xa4, 0x80, 0x0a]
        );
    }

    #[test]
    fn test_frame_length_is_padded() {
        for command in ["", "e4", "tell 53 a somewhat longer message"] {
            let frame = encode(command, 9999);
            assert_eq!((frame.len() - 2) % BLOCK_LEN, 0);
            assert_eq!(&frame[frame.len() - 2..], &[0x80, 0x0a]);
        }
    }

    #[test]
    fn test_timestamp_window() {
        assert!(timestamp_now() < 10_000);
    }

    #[test]
    fn test_markers_are_stripped_and_counted() {
        let mut decoder = InboundDecoder::new();
        let inbound = decoder.decode(b"fics% [G]\0\nhello[G]\0");
        assert_eq!(inbound.text, "fics% \nhello");
        assert_eq!(inbound.acks, 2);
    }

    #[test]
    fn test_marker_split_across_reads() {
        let mut decoder = InboundDecoder::new();
        let first = decoder.decode(b"abc[G");
        assert_eq!(first.text, "abc");
        assert_eq!(first.acks, 0);
        let second = decoder.decode(b"]\0def");
        assert_eq!(second.text, "def");
        assert_eq!(second.acks, 1);
    }

    #[test]
    fn test_lone_bracket_is_released() {
        let mut decoder = InboundDecoder::new();
        assert_eq!(decoder.decode(b"[").text, "");
        assert_eq!(decoder.decode(b"x]").text, "[x]");
    }
}
