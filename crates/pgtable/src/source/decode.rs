use encoding_rs::{Decoder, DecoderResult, Encoding};
use std::io::{self, Read};

const INPUT_CHUNK: usize = 8 * 1024;
const OUTPUT_CHUNK: usize = 16 * 1024;

/// Look up a WHATWG encoding label (`utf-8`, `latin1`, `windows-1252`, ...).
pub(crate) fn encoding_for_label(label: &str) -> io::Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unknown text encoding '{label}'"),
        )
    })
}

/// Streams `inner` as UTF-8, decoding from `encoding` chunk by chunk.
///
/// Malformed input is an `InvalidData` error rather than a replacement character.
/// A leading byte-order mark is removed.
pub(crate) struct DecodeReader<R> {
    inner: R,
    decoder: Decoder,
    input: Vec<u8>,
    in_start: usize,
    in_end: usize,
    output: Vec<u8>,
    out_start: usize,
    out_end: usize,
    eof: bool,
    done: bool,
}

impl<R: Read> DecodeReader<R> {
    pub(crate) fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            decoder: encoding.new_decoder_with_bom_removal(),
            input: vec![0; INPUT_CHUNK],
            in_start: 0,
            in_end: 0,
            output: vec![0; OUTPUT_CHUNK],
            out_start: 0,
            out_end: 0,
            eof: false,
            done: false,
        }
    }

    fn fill_output(&mut self) -> io::Result<()> {
        loop {
            if self.in_start == self.in_end && !self.eof {
                let n = self.inner.read(&mut self.input)?;
                self.in_start = 0;
                self.in_end = n;
                self.eof = n == 0;
            }

            let (result, read, written) = self.decoder.decode_to_utf8_without_replacement(
                &self.input[self.in_start..self.in_end],
                &mut self.output,
                self.eof,
            );
            self.in_start += read;
            self.out_start = 0;
            self.out_end = written;

            match result {
                DecoderResult::Malformed(_, _) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "input is not valid {}",
                            self.decoder.encoding().name()
                        ),
                    ));
                }
                DecoderResult::InputEmpty if self.eof => {
                    self.done = true;
                    return Ok(());
                }
                DecoderResult::InputEmpty | DecoderResult::OutputFull => {
                    if written > 0 {
                        return Ok(());
                    }
                }
            }
        }
    }
}

impl<R: Read> Read for DecodeReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.out_start == self.out_end {
            if self.done {
                return Ok(0);
            }
            self.fill_output()?;
        }
        let n = buf.len().min(self.out_end - self.out_start);
        buf[..n].copy_from_slice(&self.output[self.out_start..self.out_start + n]);
        self.out_start += n;
        Ok(n)
    }
}
