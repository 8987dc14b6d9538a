use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::common::{Error, Result};
use crate::image::{CHANNELS, PixelBuffer, SampleDepth};

const MAGIC: &[u8] = b"P6";

#[derive(Debug, PartialEq, Eq)]
struct PpmHeader {
    width: u32,
    height: u32,
    maxval: u16,
    /// Offset of the first data byte.
    data_offset: usize,
}

struct HeaderParser<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> HeaderParser<'a> {
    /// Skips whitespace and `#` comments. Returns true if anything was skipped.
    fn skip_separators(&mut self) -> bool {
        let start = self.pos;
        while let Some(&b) = self.data.get(self.pos) {
            if b == b'#' {
                while let Some(&c) = self.data.get(self.pos) {
                    self.pos += 1;
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.pos > start
    }

    fn number(&mut self, name: &str) -> Result<u32> {
        if !self.skip_separators() {
            return Err(Error::Format(format!("expected whitespace before {}", name)));
        }

        let start = self.pos;
        while self.data.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(Error::Format(format!("missing {}", name)));
        }

        // Only ASCII digits were consumed.
        let digits = std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| Error::Format(format!("invalid {}", name)))?;
        digits
            .parse::<u32>()
            .map_err(|_| Error::Format(format!("{} {} out of range", name, digits)))
    }
}

fn parse_header(data: &[u8]) -> Result<PpmHeader> {
    if !data.starts_with(MAGIC) {
        return Err(Error::Format("missing P6 magic".to_string()));
    }

    let mut parser = HeaderParser {
        data,
        pos: MAGIC.len(),
    };
    let width = parser.number("width")?;
    let height = parser.number("height")?;
    let maxval = parser.number("maxval")?;

    if width == 0 || height == 0 {
        return Err(Error::Format(format!(
            "zero dimension {}x{}",
            width, height
        )));
    }
    let maxval = u16::try_from(maxval)
        .ok()
        .filter(|&m| m > 0)
        .ok_or_else(|| Error::Format(format!("maxval {} outside [1, 65535]", maxval)))?;

    // Exactly one whitespace byte separates the header from the samples.
    match data.get(parser.pos) {
        Some(b) if b.is_ascii_whitespace() => {}
        _ => return Err(Error::Format("missing whitespace after maxval".to_string())),
    }

    Ok(PpmHeader {
        width,
        height,
        maxval,
        data_offset: parser.pos + 1,
    })
}

pub(crate) fn read_ppm<R: Read>(mut reader: R) -> Result<PixelBuffer> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let header = parse_header(&data)?;
    let bpc = SampleDepth::from_maxval(header.maxval).bytes_per_channel();
    let expected = (header.width as usize)
        .checked_mul(header.height as usize)
        .and_then(|n| n.checked_mul(CHANNELS * bpc))
        .ok_or_else(|| {
            Error::Format(format!(
                "{}x{} image is too large",
                header.width, header.height
            ))
        })?;

    let samples = &data[header.data_offset..];
    if samples.len() < expected {
        return Err(Error::Format(format!(
            "truncated pixel data: {} bytes, expected {}",
            samples.len(),
            expected
        )));
    }

    PixelBuffer::from_packed(
        header.width,
        header.height,
        header.maxval,
        &samples[..expected],
    )
}

pub(crate) fn load_ppm<P: AsRef<Path>>(path: P) -> Result<PixelBuffer> {
    let file = File::open(path.as_ref())?;
    let buffer = read_ppm(BufReader::new(file))?;

    tracing::debug!(path = %path.as_ref().display(), desc = %buffer.desc(), "Loaded PPM");

    Ok(buffer)
}

pub(crate) fn write_ppm<W: Write>(buffer: &PixelBuffer, mut writer: W) -> Result<()> {
    write!(
        writer,
        "P6\n{} {}\n{}\n",
        buffer.width(),
        buffer.height(),
        buffer.maxval()
    )?;
    for row in buffer.rows() {
        writer.write_all(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn save_ppm<P: AsRef<Path>>(
    buffer: &PixelBuffer,
    path: P,
    overwrite: bool,
) -> Result<()> {
    let path = path.as_ref();
    if !overwrite && std::fs::metadata(path).is_ok_and(|m| m.len() > 0) {
        return Err(Error::FileExists(path.to_path_buf()));
    }

    let file = File::create(path)?;
    write_ppm(buffer, BufWriter::new(file))?;

    tracing::debug!(path = %path.display(), desc = %buffer.desc(), "Saved PPM");

    Ok(())
}
