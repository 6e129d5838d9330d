//! See [Tokio's LinesCodec](https://docs.rs/tokio-util/latest/src/tokio_util/codec/lines_codec.rs.html)

use bytes::{Bytes, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

pub const TERMINATOR: &[u8] = b"\r\n";

/// Splits a byte stream into frames ending in `\r\n`.
///
/// Frames are yielded without the terminator. A lone `\n` or `\r` is part of
/// the frame. Outgoing bytes are written as given, replies carry their own
/// line endings.
#[derive(Debug, Clone, Default)]
pub struct CrlfCodec {
    /// bytes of the buffer already searched
    next_index: usize,
}

impl CrlfCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for CrlfCodec {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<Self::Item>> {
        // step back one byte, the last read may have ended between \r and \n
        let start = self.next_index.saturating_sub(1).min(src.len());

        match src[start..]
            .windows(TERMINATOR.len())
            .position(|w| w == TERMINATOR)
        {
            Some(offset) => {
                let end = start + offset;
                let mut frame = src.split_to(end + TERMINATOR.len());
                frame.truncate(end);
                self.next_index = 0;
                Ok(Some(frame))
            }
            None => {
                self.next_index = src.len();
                Ok(None)
            }
        }
    }
}

impl Encoder<Bytes> for CrlfCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> io::Result<()> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}
