//! A module for all decoding needs.
use crate::{byte_of_mnemonic, DecodeError, StreamResult, VisStatus, ESCAPE};

#[cfg(feature = "std")]
use crate::AllResult;
#[cfg(feature = "std")]
use std::io::{self, BufRead, Write};

/// The streaming decoder.
///
/// Escapes may be split arbitrarily between calls to `decode_bytes`, the decoder remembers the
/// part it has already seen. Bytes decoded before an error remain in the output buffer, use the
/// one-shot [`decode`] when partial results are not wanted.
///
/// [`decode`]: ../fn.decode.html
#[derive(Clone, Debug, Default)]
pub struct Decoder {
    state: State,
    /// If the input has been marked as finished.
    has_ended: bool,
}

/// A decoding stream sink.
///
/// See [`Decoder::into_stream`] on how to create this type and more information.
///
/// [`Decoder::into_stream`]: struct.Decoder.html#method.into_stream
#[cfg(feature = "std")]
pub struct IntoStream<'d, W> {
    decoder: &'d mut Decoder,
    writer: W,
    buffer: Option<StreamBuf<'d>>,
    default_size: usize,
}

/// An async decoding sink.
///
/// See [`Decoder::into_async`] on how to create this type and more information.
///
/// [`Decoder::into_async`]: struct.Decoder.html#method.into_async
#[cfg(feature = "async")]
pub struct IntoAsync<'d, W> {
    decoder: &'d mut Decoder,
    writer: W,
    buffer: Option<StreamBuf<'d>>,
    default_size: usize,
}

#[cfg(feature = "std")]
enum StreamBuf<'d> {
    Borrowed(&'d mut [u8]),
    Owned(crate::alloc::vec::Vec<u8>),
}

/// Where in a token the decoder currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Between tokens.
    Literal,
    /// After a backslash.
    Escape,
    /// Inside an octal escape, with the value of the digits so far.
    Octal { value: u8, digits: u8 },
    /// After `\M`.
    Meta,
    /// After `\M-`.
    MetaChar,
    /// After `\M^`.
    MetaControl,
    /// After `\^`.
    Control,
}

impl Default for State {
    fn default() -> Self {
        State::Literal
    }
}

#[cfg(feature = "std")]
const STREAM_BUF_SIZE: usize = 1 << 16;

/// Unvis a control character, `?` stands for delete.
fn control(ch: u8) -> u8 {
    if ch == b'?' {
        0x7f
    } else {
        ch & 0x1f
    }
}

impl State {
    /// Feed one byte, returning a byte when it completes a token.
    ///
    /// On error the state is left untouched.
    fn advance(&mut self, byte: u8) -> Result<Option<u8>, DecodeError> {
        let (next, decoded) = match *self {
            State::Literal if byte == ESCAPE => (State::Escape, None),
            State::Literal => (State::Literal, Some(byte)),
            State::Escape => match byte {
                ESCAPE => (State::Literal, Some(ESCAPE)),
                // A leading digit above 3 would not fit into a byte.
                b'0'..=b'3' => (
                    State::Octal {
                        value: byte - b'0',
                        digits: 1,
                    },
                    None,
                ),
                b'M' => (State::Meta, None),
                b'^' => (State::Control, None),
                _ => match byte_of_mnemonic(byte) {
                    Some(raw) => (State::Literal, Some(raw)),
                    None => return Err(DecodeError::InvalidEscape),
                },
            },
            State::Octal { value, digits } => match byte {
                b'0'..=b'7' => {
                    let value = (value << 3) | (byte - b'0');
                    if digits == 2 {
                        (State::Literal, Some(value))
                    } else {
                        (
                            State::Octal {
                                value,
                                digits: digits + 1,
                            },
                            None,
                        )
                    }
                }
                _ => return Err(DecodeError::InvalidEscape),
            },
            State::Meta => match byte {
                b'-' => (State::MetaChar, None),
                b'^' => (State::MetaControl, None),
                _ => return Err(DecodeError::InvalidEscape),
            },
            State::MetaChar => (State::Literal, Some(0x80 | byte)),
            State::MetaControl => (State::Literal, Some(0x80 | control(byte))),
            State::Control => (State::Literal, Some(control(byte))),
        };

        *self = next;
        Ok(decoded)
    }
}

impl Decoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        Decoder::default()
    }

    /// Decode some bytes from `inp` into `out`.
    ///
    /// See [`into_stream`] for high-level functions (this interface is only available with the
    /// `std` feature) and [`finish`] for marking the input data as complete.
    ///
    /// A byte that does not form a valid escape is not consumed and reported as
    /// `InvalidEscape`. After `finish`, running out of input inside of an escape is reported as
    /// `TruncatedEscape`.
    ///
    /// [`into_stream`]: #method.into_stream
    /// [`finish`]: #method.finish
    pub fn decode_bytes(&mut self, inp: &[u8], out: &mut [u8]) -> StreamResult {
        let c_in = inp.len();
        let c_out = out.len();
        let mut inp = inp;
        let mut out = out;
        let mut status = Ok(VisStatus::Ok);

        while let Some((&byte, rest)) = inp.split_first() {
            if out.is_empty() {
                break;
            }

            match self.state.advance(byte) {
                Ok(None) => {}
                Ok(Some(decoded)) => {
                    let (target, tail) = core::mem::replace(&mut out, &mut []).split_at_mut(1);
                    target[0] = decoded;
                    out = tail;
                }
                Err(err) => {
                    status = Err(err);
                    break;
                }
            }

            inp = rest;
        }

        let consumed_in = c_in - inp.len();
        let consumed_out = c_out - out.len();

        if status.is_ok() {
            if self.has_ended && inp.is_empty() {
                status = match self.state {
                    State::Literal => Ok(VisStatus::Done),
                    _ => Err(DecodeError::TruncatedEscape),
                };
            } else if consumed_in == 0 && consumed_out == 0 {
                status = Ok(VisStatus::NoProgress);
            }
        }

        StreamResult {
            consumed_in,
            consumed_out,
            status,
        }
    }

    /// Construct a decoder into a writer.
    #[cfg(feature = "std")]
    pub fn into_stream<W: Write>(&mut self, writer: W) -> IntoStream<'_, W> {
        IntoStream {
            decoder: self,
            writer,
            buffer: None,
            default_size: STREAM_BUF_SIZE,
        }
    }

    /// Construct a decoder into an async writer.
    #[cfg(feature = "async")]
    pub fn into_async<W: futures::io::AsyncWrite>(&mut self, writer: W) -> IntoAsync<'_, W> {
        IntoAsync {
            decoder: self,
            writer,
            buffer: None,
            default_size: STREAM_BUF_SIZE,
        }
    }

    /// Mark the input as complete.
    ///
    /// An escape that is still open when the remaining input has been consumed is then an error.
    pub fn finish(&mut self) {
        self.has_ended = true;
    }

    /// Check if the input has been marked as complete and fully decoded.
    pub fn has_ended(&self) -> bool {
        self.has_ended && self.state == State::Literal
    }

    /// Forget a partially read escape and undo `finish`.
    pub fn reset(&mut self) {
        *self = Decoder::default();
    }
}

#[cfg(feature = "std")]
impl<'d, W: Write> IntoStream<'d, W> {
    /// Decode data from a reader.
    ///
    /// This will drain the supplied reader. An escape left open at its end stays pending.
    pub fn decode(&mut self, read: impl BufRead) -> AllResult {
        self.decode_part(read, false)
    }

    /// Decode data from a reader, which must end on a complete token.
    pub fn decode_all(mut self, read: impl BufRead) -> AllResult {
        self.decode_part(read, true)
    }

    /// Set the size of the intermediate decode buffer.
    ///
    /// A buffer of this size is allocated to hold one part of the decoded stream when no buffer
    /// is available and any decoding method is called. No buffer is allocated if `set_buffer`
    /// has been called. The buffer is reused.
    ///
    /// # Panics
    /// This method panics if `size` is `0`.
    pub fn set_buffer_size(&mut self, size: usize) {
        assert_ne!(size, 0, "Attempted to set empty buffer");
        self.default_size = size;
    }

    /// Use a particular buffer as an intermediate decode buffer.
    ///
    /// # Panics
    /// This method panics if the `buffer` is empty.
    pub fn set_buffer(&mut self, buffer: &'d mut [u8]) {
        assert_ne!(buffer.len(), 0, "Attempted to set empty buffer");
        self.buffer = Some(StreamBuf::Borrowed(buffer));
    }

    fn decode_part(&mut self, mut read: impl BufRead, finish: bool) -> AllResult {
        let IntoStream {
            decoder,
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
                    decoder.finish();
                } else {
                    return Ok(Progress::Done);
                }
            }

            let result = decoder.decode_bytes(data, &mut outbuf[..]);
            *read_bytes += result.consumed_in;
            *write_bytes += result.consumed_out;
            read.consume(result.consumed_in);

            // Bytes before a malformed escape are still valid output.
            writer.write_all(&outbuf[..result.consumed_out])?;

            let done = result
                .status
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

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
    /// Decode data from a reader.
    ///
    /// This will drain the supplied reader. An escape left open at its end stays pending.
    pub async fn decode(&mut self, read: impl futures::io::AsyncBufRead) -> AllResult {
        self.decode_part(read, false).await
    }

    /// Decode data from a reader, which must end on a complete token.
    pub async fn decode_all(mut self, read: impl futures::io::AsyncBufRead) -> AllResult {
        self.decode_part(read, true).await
    }

    /// Set the size of the intermediate decode buffer.
    ///
    /// # Panics
    /// This method panics if `size` is `0`.
    pub fn set_buffer_size(&mut self, size: usize) {
        assert_ne!(size, 0, "Attempted to set empty buffer");
        self.default_size = size;
    }

    /// Use a particular buffer as an intermediate decode buffer.
    ///
    /// # Panics
    /// This method panics if the `buffer` is empty.
    pub fn set_buffer(&mut self, buffer: &'d mut [u8]) {
        assert_ne!(buffer.len(), 0, "Attempted to set empty buffer");
        self.buffer = Some(StreamBuf::Borrowed(buffer));
    }

    async fn decode_part(
        &mut self,
        read: impl futures::io::AsyncBufRead,
        finish: bool,
    ) -> AllResult {
        use futures::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};

        let IntoAsync {
            decoder,
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
                    decoder.finish();
                } else {
                    break Ok(());
                }
            }

            let result = decoder.decode_bytes(data, &mut outbuf[..]);
            bytes_read += result.consumed_in;
            bytes_written += result.consumed_out;
            AsyncBufRead::consume(read.as_mut(), result.consumed_in);

            let out = &outbuf[..result.consumed_out];
            if let Err(err) = AsyncWriteExt::write_all(&mut *writer, out).await {
                break Err(err);
            }

            let done = match result.status {
                Ok(done) => done,
                Err(err) => break Err(io::Error::new(io::ErrorKind::InvalidData, err)),
            };

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
