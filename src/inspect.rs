use std::borrow::Cow;

use anyhow::{anyhow, ensure, Context};
use miniz_oxide::inflate::decompress_to_vec_zlib_with_limit;
use nom::{bytes::complete::tag, combinator::opt, IResult};

use crate::{
    chunks::{
        idat::IDATChunk,
        iend,
        ihdr::{self, ColorType, IHDRChunk, Interlacing},
        iter_chunks, Chunk, ParseableChunk,
    },
    layout::{Framing, BYTES_PER_PIXEL, PNG_SIGNATURE},
    scanlines::FILTER_NONE,
    zlib::is_deflate_header,
};

/// What a produced stream turned out to contain, CRCs already verified.
#[derive(Debug)]
pub struct Inspection {
    /// Whether the stream opened with the PNG signature.
    pub signature: bool,
    pub header: IHDRChunk,
    /// Concatenated IDAT chunk data.
    pub image_data: Vec<u8>,
    /// Type of every chunk, in stream order.
    pub chunk_types: Vec<[u8; 4]>,
}

fn parse_signature(input: &[u8]) -> IResult<&[u8], Option<&[u8]>> {
    opt(tag(&PNG_SIGNATURE[..]))(input)
}

/// Slotted streams carry 17 in the IHDR length field over a 13-byte body.
/// Rewrites it so the chunk walk takes the right number of bytes.
fn restore_ihdr_length(chunks: &[u8]) -> Cow<'_, [u8]> {
    let slotted = Framing::Slotted.ihdr_length_field().to_be_bytes();
    match chunks.get(..8) {
        Some(prefix) if prefix[..4] == slotted && prefix[4..] == ihdr::HEADER[..] => {
            let mut owned = chunks.to_vec();
            owned[..4].copy_from_slice(&Framing::Conformant.ihdr_length_field().to_be_bytes());
            Cow::Owned(owned)
        }
        _ => Cow::Borrowed(chunks),
    }
}

/// Walks a stream produced by this crate (or any single-image PNG), checking
/// chunk CRCs and chunk order.
pub fn inspect(bytes: &[u8]) -> anyhow::Result<Inspection> {
    let (rest, signature) =
        parse_signature(bytes).map_err(|e| anyhow!("Failed to read signature: {e:?}"))?;
    let rest = match signature {
        Some(_) => Cow::Borrowed(rest),
        None => restore_ihdr_length(rest),
    };
    let mut chunks = iter_chunks(&rest);
    let mut header = None;
    let mut image_data = vec![];
    let mut chunk_types = vec![];
    let mut ended = false;
    for chunk in chunks.by_ref() {
        match chunk.context("Failed to parse chunk.")? {
            Chunk::IHDR(ihdr_chunk) => {
                ensure!(chunk_types.is_empty(), "IHDR is not the first chunk");
                header = Some(ihdr_chunk);
                chunk_types.push(*IHDRChunk::HEADER);
            }
            Chunk::IDAT(idat_chunk) => {
                ensure!(header.is_some(), "IDAT before IHDR");
                image_data.extend_from_slice(idat_chunk.data);
                chunk_types.push(*IDATChunk::HEADER);
            }
            Chunk::IEND => {
                ended = true;
                chunk_types.push(*iend::HEADER);
            }
            Chunk::Unknown(raw) => chunk_types.push(raw.chunk_type),
        }
    }
    ensure!(ended, "stream has no IEND chunk");
    ensure!(
        chunks.rest().is_empty(),
        "{} trailing bytes after IEND",
        chunks.rest().len()
    );
    ensure!(
        chunk_types.contains(IDATChunk::HEADER),
        "stream has no IDAT chunk"
    );

    Ok(Inspection {
        signature: signature.is_some(),
        header: header.context("stream has no IHDR chunk")?,
        image_data,
        chunk_types,
    })
}

impl Inspection {
    /// Slotted streams are the ones written without a signature.
    pub fn framing(&self) -> Framing {
        if self.signature {
            Framing::Conformant
        } else {
            Framing::Slotted
        }
    }

    fn scanline_size(&self) -> anyhow::Result<usize> {
        usize::try_from(self.header.width as u64 * BYTES_PER_PIXEL + 1)
            .context("scanline does not fit in memory")
    }

    /// Bytes the header says the decompressed payload holds.
    fn expected_payload(&self) -> anyhow::Result<usize> {
        self.scanline_size()?
            .checked_mul(self.header.height as usize)
            .with_context(|| {
                format!(
                    "{}x{} payload does not fit in memory",
                    self.header.width, self.header.height
                )
            })
    }

    /// Recovers the nominal decompressed payload: filter bytes plus RGBA.
    pub fn payload(&self) -> anyhow::Result<Vec<u8>> {
        let expected = self.expected_payload()?;
        let payload = match self.framing() {
            // One byte over the limit is enough to notice excess data.
            Framing::Conformant => {
                decompress_to_vec_zlib_with_limit(&self.image_data, expected.saturating_add(1))
                    .context("Failed to decompress image data.")?
            }
            Framing::Slotted => unframe_slots(&self.image_data, expected)?,
        };
        ensure!(
            payload.len() == expected,
            "payload is {} bytes, expected {expected}",
            payload.len()
        );
        Ok(payload)
    }

    /// The Adler-32 a conformant stream ends its zlib data with.
    pub fn trailer_adler32(&self) -> Option<u32> {
        if self.framing() != Framing::Conformant {
            return None;
        }
        let start = self.image_data.len().checked_sub(4)?;
        Some(u32::from_be_bytes(self.image_data[start..].try_into().ok()?))
    }

    /// The RGBA8888 pixels, row after row.
    pub fn decode_pixels(&self) -> anyhow::Result<Vec<u8>> {
        let header = &self.header;
        ensure!(
            header.bit_depth == 8
                && header.color_type == ColorType::TruecolorWithAlpha
                && header.interlace_method == Interlacing::None,
            "only non-interlaced 8-bit RGBA is supported, got {header:?}"
        );
        let payload = self.payload()?;
        let mut pixels = Vec::with_capacity(payload.len() - header.height as usize);
        for (row, scanline) in payload.chunks(self.scanline_size()?).enumerate() {
            ensure!(
                scanline[0] == FILTER_NONE,
                "scanline {row} uses filter {}",
                scanline[0]
            );
            pixels.extend_from_slice(&scanline[1..]);
        }
        Ok(pixels)
    }
}

fn unframe_slots(data: &[u8], expected: usize) -> anyhow::Result<Vec<u8>> {
    ensure!(data.len() >= 2, "IDAT data too short for a zlib header");
    let (zlib_header, slots) = data.split_at(2);
    ensure!(
        is_deflate_header([zlib_header[0], zlib_header[1]]),
        "IDAT data does not open with a deflate zlib header"
    );

    let stride = Framing::Slotted.block_stride() as usize;
    ensure!(
        slots.len() % stride == 0,
        "{} bytes of slots is not a whole number of slots",
        slots.len()
    );
    let slot_count = slots.len() / stride;
    let needed = expected
        .div_ceil(Framing::Slotted.block_payload() as usize)
        .max(1);
    ensure!(
        slot_count == needed,
        "{slot_count} slots present, {expected} payload bytes need {needed}"
    );

    let mut payload = Vec::with_capacity(expected);
    for (index, slot) in slots.chunks(stride).enumerate() {
        let is_final = index + 1 == slot_count;
        ensure!(
            slot[0] == is_final as u8,
            "slot {index} carries flags {:#04x}",
            slot[0]
        );
        let wanted = (expected - payload.len()).min(slot.len() - 1);
        let (body, padding) = slot[1..].split_at(wanted);
        ensure!(
            padding.iter().all(|&b| b == 0),
            "slot {index} has nonzero padding"
        );
        payload.extend_from_slice(body);
    }
    Ok(payload)
}
