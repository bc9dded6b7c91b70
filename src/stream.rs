use std::io;

use log::{debug, error, trace};

use crate::{
    chunks::idat::{IdatBody, HEADER as IDAT_HEADER},
    crc::{finish_crc, update_crc_byte, CRC_INIT},
    encoder::PngEncoder,
    error::{EncodeError, Result},
    layout::{Region, PNG_SIGNATURE},
    source::PixelSource,
};

/// Offset of the IDAT body inside the chunk: length field plus type.
const IDAT_BODY_START: u64 = 8;

/// A forward-only reader over one encoded image.
///
/// Every byte is synthesized when asked for: the fixed chunks come from the
/// encoder's small precomputed buffers, IDAT bytes are framed around pixels
/// read straight from the source. There is no way back; `mark`, `reset` and
/// seeking all fail with [`EncodeError::UnsupportedOperation`].
pub struct PngStream<'a, S: ?Sized> {
    encoder: PngEncoder<'a, S>,
    position: u64,
    region: Region,
    /// Offset inside the current region.
    local: u64,
    body: IdatBody<'a, S>,
    /// CRC register over the IDAT type and body bytes emitted so far.
    idat_crc: u32,
    failure: Option<EncodeError>,
}

impl<'a, S: PixelSource + ?Sized> PngStream<'a, S> {
    pub(crate) fn new(encoder: PngEncoder<'a, S>) -> Self {
        Self {
            position: 0,
            region: encoder.layout.region_at(0),
            local: 0,
            body: encoder.idat_body(),
            idat_crc: CRC_INIT,
            failure: None,
            encoder,
        }
    }

    /// Bytes emitted so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn total_size(&self) -> u64 {
        self.encoder.layout.total_size()
    }

    /// Bytes still to come. Zero once the stream is exhausted or closed.
    pub fn bytes_available(&self) -> u64 {
        if self.region == Region::Exhausted {
            0
        } else {
            self.total_size() - self.position
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.bytes_available() == 0
    }

    /// Produces the next byte, or `None` at end of stream.
    ///
    /// An [`EncodeError::InternalInconsistency`] poisons the stream: the same
    /// error is returned from then on.
    pub fn read_one(&mut self) -> Result<Option<u8>> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        self.next_byte().map_err(|err| {
            error!("{err}");
            self.failure = Some(err.clone());
            err
        })
    }

    /// Fills `buf` with as many bytes as remain, returning how many were
    /// written. Zero means end of stream (or an empty `buf`).
    ///
    /// A failure after some bytes were written returns those bytes; the
    /// poisoned stream reports the error on the next call.
    pub fn read_many(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut produced = 0;
        for slot in buf.iter_mut() {
            match self.read_one() {
                Ok(Some(byte)) => *slot = byte,
                Ok(None) => break,
                Err(_) if produced > 0 => break,
                Err(err) => return Err(err),
            }
            produced += 1;
        }
        Ok(produced)
    }

    /// Ends the stream early. Later reads report end of stream. Calling it
    /// again, or on an exhausted stream, does nothing.
    pub fn close(&mut self) {
        if self.region != Region::Exhausted && self.position < self.total_size() {
            debug!(
                "stream closed after {} of {} bytes",
                self.position,
                self.total_size()
            );
        }
        self.region = Region::Exhausted;
    }

    pub fn mark_supported(&self) -> bool {
        false
    }

    pub fn mark(&mut self, _read_limit: usize) -> Result<()> {
        Err(EncodeError::UnsupportedOperation("mark"))
    }

    pub fn reset(&mut self) -> Result<()> {
        Err(EncodeError::UnsupportedOperation("reset"))
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        let layout = self.encoder.layout;
        if self.region == Region::Exhausted || self.position >= layout.total_size() {
            self.region = Region::Exhausted;
            return Ok(None);
        }

        let region = layout.region_at(self.position);
        if region != self.region {
            self.enter(region)?;
        }
        let local = self.local;
        let byte = match region {
            Region::Signature => PNG_SIGNATURE[local as usize],
            Region::Ihdr => self.encoder.buffers.ihdr[local as usize],
            Region::Idat => self.idat_byte(local)?,
            Region::Iend => self.encoder.buffers.iend[local as usize],
            Region::Exhausted => return Ok(None),
        };
        self.position += 1;
        self.local += 1;
        Ok(Some(byte))
    }

    /// Moves the cursor into `region`, which must begin exactly where the
    /// previous one ended.
    fn enter(&mut self, region: Region) -> Result<()> {
        let layout = self.encoder.layout;
        let inconsistency = |reason| EncodeError::InternalInconsistency {
            position: self.position,
            reason,
        };
        if self.local != layout.span(self.region).len {
            return Err(inconsistency("left a chunk before its end"));
        }
        if layout.span(region).start != self.position {
            return Err(inconsistency("entered a chunk away from its start"));
        }
        trace!("{:?} -> {:?} at byte {}", self.region, region, self.position);
        self.region = region;
        self.local = 0;
        Ok(())
    }

    fn idat_byte(&mut self, local: u64) -> Result<u8> {
        let layout = self.encoder.layout;
        let body_end = IDAT_BODY_START + layout.idat_body_size();
        let byte = match local {
            0..=3 => layout.idat_chunk_length.to_be_bytes()[local as usize],
            4..=7 => IDAT_HEADER[local as usize - 4],
            _ if local < body_end => {
                self.body
                    .next()
                    .ok_or(EncodeError::InternalInconsistency {
                        position: self.position,
                        reason: "IDAT body ended early",
                    })?
            }
            _ => {
                let expected = self.encoder.buffers.checksums.idat_crc32;
                let index = (local - body_end) as usize;
                if index == 0 && finish_crc(self.idat_crc) != expected {
                    return Err(EncodeError::InternalInconsistency {
                        position: self.position,
                        reason: "IDAT bytes differ from the precomputed CRC",
                    });
                }
                return Ok(expected.to_be_bytes()[index]);
            }
        };
        if local >= 4 {
            self.idat_crc = update_crc_byte(self.idat_crc, byte);
        }
        Ok(byte)
    }
}

impl<S: PixelSource + ?Sized> io::Read for PngStream<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_many(buf).map_err(io::Error::other)
    }
}

impl<S: PixelSource + ?Sized> io::Seek for PngStream<'_, S> {
    fn seek(&mut self, _pos: io::SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            EncodeError::UnsupportedOperation("seek"),
        ))
    }
}
