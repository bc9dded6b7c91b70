use super::ParseableChunk;
use crate::{
    crc::calculate_crc,
    layout::{Framing, Layout, ZLIB_HEADER_SIZE},
    scanlines::Scanlines,
    source::{ImageDescriptor, PixelSource},
    zlib::{stored_block_flags, stored_block_header},
};
use nom::IResult;

pub(crate) const HEADER: &[u8; 4] = b"IDAT";

#[derive(Debug)]
pub(crate) struct IDATChunk<'a> {
    pub(crate) data: &'a [u8],
}
impl<'a> ParseableChunk<'a> for IDATChunk<'a> {
    const HEADER: &'static [u8; 4] = HEADER;

    fn from_bytes(chunk_data: &'a [u8]) -> IResult<&'a [u8], Self> {
        Ok((&chunk_data[0..0], IDATChunk { data: chunk_data }))
    }
}

/// Produces the IDAT chunk data one byte at a time: zlib header, framed
/// stored blocks around the scanline payload, then whatever trailer the
/// framing calls for. Nothing is buffered beyond the current block header.
pub(crate) struct IdatBody<'a, S: ?Sized> {
    layout: Layout,
    zlib_header: [u8; 2],
    adler32: [u8; 4],
    payload: Scanlines<'a, S>,
    offset: u64,
    block_header: [u8; 5],
}

impl<'a, S: PixelSource + ?Sized> IdatBody<'a, S> {
    pub(crate) fn new(
        layout: Layout,
        image: ImageDescriptor<'a, S>,
        zlib_header: [u8; 2],
        adler32: u32,
    ) -> Self {
        Self {
            layout,
            zlib_header,
            adler32: adler32.to_be_bytes(),
            payload: Scanlines::new(image),
            offset: 0,
            block_header: [0; 5],
        }
    }

    fn header_for(&self, block: u64) -> [u8; 5] {
        let is_final = block + 1 == self.layout.block_count;
        match self.layout.framing {
            Framing::Slotted => [stored_block_flags(is_final), 0, 0, 0, 0],
            // Conformant blocks never exceed 65535 bytes.
            Framing::Conformant => {
                stored_block_header(is_final, self.layout.block_len(block) as u16)
            }
        }
    }
}

impl<S: PixelSource + ?Sized> Iterator for IdatBody<'_, S> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let at = self.offset;
        if at >= self.layout.idat_body_size() {
            return None;
        }
        self.offset += 1;

        if at < ZLIB_HEADER_SIZE {
            return Some(self.zlib_header[at as usize]);
        }
        let framed = at - ZLIB_HEADER_SIZE;
        if framed >= self.layout.compressed_size {
            return Some(self.adler32[(framed - self.layout.compressed_size) as usize]);
        }

        let framing = self.layout.framing;
        let stride = framing.block_stride();
        let (block, within) = (framed / stride, framed % stride);
        if within < framing.block_header_size() {
            if within == 0 {
                self.block_header = self.header_for(block);
            }
            return Some(self.block_header[within as usize]);
        }
        match framing {
            // Slots are fixed size; the tail of the last one is zero padding.
            Framing::Slotted => Some(self.payload.next().unwrap_or(0)),
            Framing::Conformant => self.payload.next(),
        }
    }
}

/// CRC-32 the IDAT chunk must carry: over its type and every body byte.
pub(crate) fn body_crc<S: PixelSource + ?Sized>(body: IdatBody<'_, S>) -> u32 {
    calculate_crc(HEADER.iter().copied().chain(body))
}
