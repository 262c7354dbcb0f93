//! A module for all encoding needs.
use crate::{is_literal, mnemonic_of, StreamResult, VisStatus, ESCAPE, MAX_ESCAPE_LEN};

#[cfg(feature = "std")]
use crate::AllResult;
#[cfg(feature = "std")]
use std::io::{self, BufRead, Write};

/// The streaming encoder.
///
/// Encodes arbitrary bytes into printable text. The encoder only carries the tail of an escape
/// that did not fit into the previous output buffer, so any split of the in- and output leads to
/// the same text as the one-shot [`encode`].
///
/// [`encode`]: ../fn.encode.html
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    /// The escape which has not been written completely.
    pending: Escape,
    /// How much of `pending` has already been written.
    pending_at: u8,
    /// If the input has been marked as finished.
    has_ended: bool,
}

/// A encoding stream sink.
///
/// See [`Encoder::into_stream`] on how to create this type and more information.
///
/// [`Encoder::into_stream`]: struct.Encoder.html#method.into_stream
#[cfg(feature = "std")]
pub struct IntoStream<'d, W> {
    encoder: &'d mut Encoder,
    writer: W,
    buffer: Option<StreamBuf<'d>>,
    default_size: usize,
}

/// An async encoding sink.
///
/// See [`Encoder::into_async`] on how to create this type and more information.
///
/// [`Encoder::into_async`]: struct.Encoder.html#method.into_async
#[cfg(feature = "async")]
pub struct IntoAsync<'d, W> {
    encoder: &'d mut Encoder,
    writer: W,
    buffer: Option<StreamBuf<'d>>,
    default_size: usize,
}

#[cfg(feature = "std")]
enum StreamBuf<'d> {
    Borrowed(&'d mut [u8]),
    Owned(crate::alloc::vec::Vec<u8>),
}

/// The token a single input byte turns into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Escape {
    bytes: [u8; MAX_ESCAPE_LEN],
    len: u8,
}

impl Escape {
    /// Classify and render one byte.
    pub(crate) fn of(byte: u8) -> Self {
        if is_literal(byte) {
            Escape::with(&[byte])
        } else if byte == ESCAPE {
            Escape::with(&[ESCAPE, ESCAPE])
        } else if let Some(letter) = mnemonic_of(byte) {
            Escape::with(&[ESCAPE, letter])
        } else {
            Escape::with(&[
                ESCAPE,
                b'0' + (byte >> 6),
                b'0' + ((byte >> 3) & 0o7),
                b'0' + (byte & 0o7),
            ])
        }
    }

    fn with(token: &[u8]) -> Self {
        let mut bytes = [0; MAX_ESCAPE_LEN];
        bytes[..token.len()].copy_from_slice(token);
        Escape {
            bytes,
            len: token.len() as u8,
        }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len)]
    }

    pub(crate) fn len(&self) -> usize {
        usize::from(self.len)
    }
}

#[cfg(feature = "std")]
const STREAM_BUF_SIZE: usize = 1 << 16;

impl Encoder {
    /// Create a new encoder.
    ///
    /// The encoder escapes whitespace, backslashes and all bytes that are not printable ASCII.
    pub fn new() -> Self {
        Encoder::default()
    }

    /// Encode some bytes from `inp` into `out`.
    ///
    /// See [`into_stream`] for high-level functions (this interface is only available with the
    /// `std` feature) and [`finish`] for marking the input data as complete.
    ///
    /// The status is never an error. It is `Done` once the encoder was finished and all input
    /// and every pending escape have been written.
    ///
    /// [`into_stream`]: #method.into_stream
    /// [`finish`]: #method.finish
    pub fn encode_bytes(&mut self, inp: &[u8], out: &mut [u8]) -> StreamResult {
        let c_in = inp.len();
        let c_out = out.len();
        let mut inp = inp;
        let mut out = out;

        self.flush_pending(&mut out);

        while self.is_flushed() {
            if out.is_empty() {
                break;
            }

            let (&byte, rest) = match inp.split_first() {
                Some(split) => split,
                None => break,
            };

            inp = rest;
            self.pending = Escape::of(byte);
            self.pending_at = 0;
            self.flush_pending(&mut out);
        }

        let consumed_in = c_in - inp.len();
        let consumed_out = c_out - out.len();

        let status = if self.has_ended && inp.is_empty() && self.is_flushed() {
            VisStatus::Done
        } else if consumed_in == 0 && consumed_out == 0 {
            VisStatus::NoProgress
        } else {
            VisStatus::Ok
        };

        StreamResult {
            consumed_in,
            consumed_out,
            status: Ok(status),
        }
    }

    /// Construct a encoder into a writer.
    #[cfg(feature = "std")]
    pub fn into_stream<W: Write>(&mut self, writer: W) -> IntoStream<'_, W> {
        IntoStream {
            encoder: self,
            writer,
            buffer: None,
            default_size: STREAM_BUF_SIZE,
        }
    }

    /// Construct a encoder into an async writer.
    #[cfg(feature = "async")]
    pub fn into_async<W: futures::io::AsyncWrite>(&mut self, writer: W) -> IntoAsync<'_, W> {
        IntoAsync {
            encoder: self,
            writer,
            buffer: None,
            default_size: STREAM_BUF_SIZE,
        }
    }

    /// Mark the encoding as finished.
    ///
    /// Following calls to `encode_bytes` report `Done` once their input and any pending escape
    /// have been fully written.
    pub fn finish(&mut self) {
        self.has_ended = true;
    }

    /// Undo `finish` and drop any escape that has not been written yet.
    pub fn reset(&mut self) {
        *self = Encoder::default();
    }

    fn is_flushed(&self) -> bool {
        usize::from(self.pending_at) == self.pending.len()
    }

    fn flush_pending(&mut self, out: &mut &mut [u8]) {
        let rest = &self.pending.as_bytes()[usize::from(self.pending_at)..];
        let count = rest.len().min(out.len());
        let (bytes, tail) = core::mem::replace(out, &mut []).split_at_mut(count);
        bytes.copy_from_slice(&rest[..count]);
        *out = tail;
        self.pending_at += count as u8;
    }
}

#[cfg(feature = "std")]
impl<'d, W: Write> IntoStream<'d, W> {
    /// Encode data from a reader.
    ///
    /// This will drain the supplied reader. It will not finish the encoder.
    pub fn encode(&mut self, read: impl BufRead) -> AllResult {
        self.encode_part(read, false)
    }

    /// Encode data from a reader and finish the encoder.
    pub fn encode_all(mut self, read: impl BufRead) -> AllResult {
        self.encode_part(read, true)
    }

    /// Set the size of the intermediate encode buffer.
    ///
    /// A buffer of this size is allocated to hold one part of the encoded stream when no buffer
    /// is available and any encoding method is called. No buffer is allocated if `set_buffer`
    /// has been called. The buffer is reused.
    ///
    /// # Panics
    /// This method panics if `size` is `0`.
    pub fn set_buffer_size(&mut self, size: usize) {
        assert_ne!(size, 0, "Attempted to set empty buffer");
        self.default_size = size;
    }

    /// Use a particular buffer as an intermediate encode buffer.
    ///
    /// Calling this sets or replaces the buffer. When a buffer has been set then it is used
    /// instead of a dynamically allocating a buffer. Note that the size of the buffer is relevant
    /// for efficient encoding as there is additional overhead from `write` calls each time the
    /// buffer has been filled.
    ///
    /// # Panics
    /// This method panics if the `buffer` is empty.
    pub fn set_buffer(&mut self, buffer: &'d mut [u8]) {
        assert_ne!(buffer.len(), 0, "Attempted to set empty buffer");
        self.buffer = Some(StreamBuf::Borrowed(buffer));
    }

    fn encode_part(&mut self, mut read: impl BufRead, finish: bool) -> AllResult {
        let IntoStream {
            encoder,
            writer,
            buffer,
            default_size,
        } = self;
        enum Progress {
            Ok,
            Done,
        }

        let mut bytes_read = 0;
        let mut bytes_written = 0;

        let read_bytes = &mut bytes_read;
        let write_bytes = &mut bytes_written;

        let outbuf: &mut [u8] =
            match { buffer.get_or_insert_with(|| StreamBuf::Owned(vec![0u8; *default_size])) } {
                StreamBuf::Borrowed(slice) => &mut *slice,
                StreamBuf::Owned(vec) => &mut *vec,
            };
        assert!(!outbuf.is_empty());

        let once = move || {
            let data = read.fill_buf()?;

            if data.is_empty() {
                if finish {
                    encoder.finish();
                } else if encoder.is_flushed() {
                    return Ok(Progress::Done);
                }
            }

            let result = encoder.encode_bytes(data, &mut outbuf[..]);
            *read_bytes += result.consumed_in;
            *write_bytes += result.consumed_out;
            read.consume(result.consumed_in);

            let done = result
                .status
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

            writer.write_all(&outbuf[..result.consumed_out])?;

            if let VisStatus::Done = done {
                return Ok(Progress::Done);
            }

            Ok(Progress::Ok)
        };

        let status = core::iter::repeat_with(once)
            // scan+fuse can be replaced with map_while
            .scan((), |(), result| match result {
                Ok(Progress::Ok) => Some(Ok(())),
                Err(err) => Some(Err(err)),
                Ok(Progress::Done) => None,
            })
            .fuse()
            .collect();

        AllResult {
            bytes_read,
            bytes_written,
            status,
        }
    }
}

#[cfg(feature = "async")]
impl<'d, W: futures::io::AsyncWrite + core::marker::Unpin> IntoAsync<'d, W> {
    /// Encode data from a reader.
    ///
    /// This will drain the supplied reader. It will not finish the encoder.
    pub async fn encode(&mut self, read: impl futures::io::AsyncBufRead) -> AllResult {
        self.encode_part(read, false).await
    }

    /// Encode data from a reader and finish the encoder.
    pub async fn encode_all(mut self, read: impl futures::io::AsyncBufRead) -> AllResult {
        self.encode_part(read, true).await
    }

    /// Set the size of the intermediate encode buffer.
    ///
    /// # Panics
    /// This method panics if `size` is `0`.
    pub fn set_buffer_size(&mut self, size: usize) {
        assert_ne!(size, 0, "Attempted to set empty buffer");
        self.default_size = size;
    }

    /// Use a particular buffer as an intermediate encode buffer.
    ///
    /// # Panics
    /// This method panics if the `buffer` is empty.
    pub fn set_buffer(&mut self, buffer: &'d mut [u8]) {
        assert_ne!(buffer.len(), 0, "Attempted to set empty buffer");
        self.buffer = Some(StreamBuf::Borrowed(buffer));
    }

    async fn encode_part(
        &mut self,
        read: impl futures::io::AsyncBufRead,
        finish: bool,
    ) -> AllResult {
        use futures::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};

        let IntoAsync {
            encoder,
            writer,
            buffer,
            default_size,
        } = self;

        let mut read = Box::pin(read);

        let mut bytes_read = 0;
        let mut bytes_written = 0;

        let outbuf: &mut [u8] =
            match { buffer.get_or_insert_with(|| StreamBuf::Owned(vec![0u8; *default_size])) } {
                StreamBuf::Borrowed(slice) => &mut *slice,
                StreamBuf::Owned(vec) => &mut *vec,
            };
        assert!(!outbuf.is_empty());

        let status = loop {
            let data = match AsyncBufReadExt::fill_buf(&mut read).await {
                Err(err) => break Err(err),
                Ok(data) => data,
            };

            if data.is_empty() {
                if finish {
                    encoder.finish();
                } else if encoder.is_flushed() {
                    break Ok(());
                }
            }

            let result = encoder.encode_bytes(data, &mut outbuf[..]);
            bytes_read += result.consumed_in;
            bytes_written += result.consumed_out;
            AsyncBufRead::consume(read.as_mut(), result.consumed_in);

            let done = match result.status {
                Ok(done) => done,
                Err(err) => break Err(io::Error::new(io::ErrorKind::InvalidData, err)),
            };

            let out = &outbuf[..result.consumed_out];
            if let Err(err) = AsyncWriteExt::write_all(&mut *writer, out).await {
                break Err(err);
            }

            if let VisStatus::Done = done {
                break Ok(());
            }
        };

        AllResult {
            bytes_read,
            bytes_written,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Encoder, Escape};
    use crate::VisStatus;

    #[test]
    fn escapes_by_class() {
        assert_eq!(Escape::of(b'a').as_bytes(), b"a");
        assert_eq!(Escape::of(b'\\').as_bytes(), br"\\");
        assert_eq!(Escape::of(b' ').as_bytes(), br"\s");
        assert_eq!(Escape::of(b'\t').as_bytes(), br"\t");
        assert_eq!(Escape::of(b'\n').as_bytes(), br"\n");
        assert_eq!(Escape::of(b'\r').as_bytes(), br"\r");
        assert_eq!(Escape::of(0x00).as_bytes(), br"\000");
        assert_eq!(Escape::of(0x07).as_bytes(), br"\007");
        assert_eq!(Escape::of(0x7f).as_bytes(), br"\177");
        assert_eq!(Escape::of(0xa0).as_bytes(), br"\240");
        assert_eq!(Escape::of(0xff).as_bytes(), br"\377");
    }

    #[test]
    fn every_byte_is_printable() {
        for byte in 0..=255u8 {
            let escape = Escape::of(byte);
            assert!(escape.len() >= 1 && escape.len() <= 4);
            assert!(
                escape.as_bytes().iter().all(u8::is_ascii_graphic),
                "{:#x} escaped to {:?}",
                byte,
                escape
            );
        }
    }

    #[test]
    fn escape_split_over_small_buffers() {
        let input = [0x07, b'x'];
        let mut encoder = Encoder::new();
        encoder.finish();

        let mut target = [0u8; 3];
        let result = encoder.encode_bytes(&input, &mut target);
        assert_eq!(result.consumed_in, 1);
        assert_eq!(result.consumed_out, 3);
        assert_eq!(result.status, Ok(VisStatus::Ok));
        assert_eq!(&target, br"\00");

        let result = encoder.encode_bytes(&input[1..], &mut target);
        assert_eq!(result.consumed_in, 1);
        assert_eq!(result.consumed_out, 2);
        assert_eq!(result.status, Ok(VisStatus::Done));
        assert_eq!(&target[..2], b"7x");
    }

    #[test]
    fn no_progress_without_space() {
        let mut encoder = Encoder::new();
        let result = encoder.encode_bytes(b"abc", &mut []);
        assert_eq!(result.consumed_in, 0);
        assert_eq!(result.consumed_out, 0);
        assert_eq!(result.status, Ok(VisStatus::NoProgress));
    }

    #[test]
    fn reset_drops_pending_escape() {
        let mut encoder = Encoder::new();
        encoder.finish();

        let mut target = [0u8; 2];
        let result = encoder.encode_bytes(&[0xff], &mut target);
        assert_eq!(result.consumed_in, 1);
        assert_eq!(&target, br"\3");
        assert_eq!(result.status, Ok(VisStatus::Ok));

        encoder.reset();
        let mut target = [0u8; 4];
        let result = encoder.encode_bytes(b"a", &mut target);
        assert_eq!(result.consumed_in, 1);
        assert_eq!(&target[..result.consumed_out], b"a");
        // No longer finished, the tail of the dropped escape is gone.
        assert_eq!(result.status, Ok(VisStatus::Ok));

        let result = encoder.encode_bytes(&[], &mut target);
        assert_eq!(result.consumed_out, 0);
        assert_eq!(result.status, Ok(VisStatus::NoProgress));
    }

    #[test]
    fn finished_empty_input_is_done() {
        let mut encoder = Encoder::new();
        encoder.finish();
        let result = encoder.encode_bytes(&[], &mut []);
        assert_eq!(result.status, Ok(VisStatus::Done));
    }
}
