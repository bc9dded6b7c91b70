use std::fmt;

use crate::{
    error::{EncodeError, Result},
    zlib::{SLOTTED_ZLIB_HEADER, ZLIB_HEADER},
};

pub const PNG_SIGNATURE: [u8; 8] = *b"\x89PNG\x0d\x0a\x1a\x0a";

pub(crate) const IHDR_SIZE: u64 = 25;
pub(crate) const IEND_SIZE: u64 = 12;
/// Length, type and CRC around a chunk body.
pub(crate) const CHUNK_OVERHEAD: u64 = 12;
pub(crate) const ZLIB_HEADER_SIZE: u64 = 2;
pub(crate) const ADLER_TRAILER_SIZE: u64 = 4;
pub(crate) const BYTES_PER_PIXEL: u64 = 4;

/// PNG caps chunk lengths at 2^31 - 1.
const MAX_CHUNK_LENGTH: u64 = 0x7fff_ffff;

/// How the stored DEFLATE stream inside IDAT is framed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framing {
    /// Fixed 32768-byte slots, each a lone BFINAL/BTYPE byte followed by up to
    /// 32767 payload bytes, the last slot zero padded. No LEN/NLEN fields, no
    /// Adler-32 trailer and no PNG signature. The IHDR length field reads 17
    /// and the zlib header is `87 05`, CM in the high nibble.
    #[default]
    Slotted,
    /// Real stored blocks (`BFINAL/BTYPE`, `LEN`, `NLEN`) of up to 65535
    /// bytes, an Adler-32 trailer and a leading PNG signature. Readable by any
    /// PNG decoder.
    Conformant,
}

impl Framing {
    /// Payload bytes carried by every block except possibly the last.
    pub const fn block_payload(self) -> u64 {
        match self {
            Self::Slotted => 32767,
            Self::Conformant => 65535,
        }
    }

    pub const fn block_header_size(self) -> u64 {
        match self {
            Self::Slotted => 1,
            Self::Conformant => 5,
        }
    }

    /// Distance between two consecutive block headers.
    pub const fn block_stride(self) -> u64 {
        self.block_header_size() + self.block_payload()
    }

    pub const fn signature_size(self) -> u64 {
        match self {
            Self::Slotted => 0,
            Self::Conformant => PNG_SIGNATURE.len() as u64,
        }
    }

    /// Value written into the IHDR length field. The body is 13 bytes either way.
    pub const fn ihdr_length_field(self) -> u32 {
        match self {
            Self::Slotted => 17,
            Self::Conformant => 13,
        }
    }

    pub const fn zlib_header(self) -> [u8; 2] {
        match self {
            Self::Slotted => SLOTTED_ZLIB_HEADER,
            Self::Conformant => ZLIB_HEADER,
        }
    }

    pub const fn trailer_size(self) -> u64 {
        match self {
            Self::Slotted => 0,
            Self::Conformant => ADLER_TRAILER_SIZE,
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Slotted => "slotted",
            Self::Conformant => "conformant",
        })
    }
}

/// A half-open byte range of the output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u64,
    pub len: u64,
}

impl Span {
    pub const fn end(&self) -> u64 {
        self.start + self.len
    }

    pub const fn contains(&self, position: u64) -> bool {
        position >= self.start && position < self.end()
    }

    const fn after(self, len: u64) -> Span {
        Span {
            start: self.end(),
            len,
        }
    }
}

/// Regions of the output, in stream order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Region {
    Signature,
    Ihdr,
    Idat,
    Iend,
    Exhausted,
}

/// Sizes and absolute offsets of everything the encoder emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub framing: Framing,
    pub width: u32,
    pub height: u32,
    /// Filter byte plus RGBA bytes for every scanline.
    pub decompressed_size: u64,
    pub block_count: u64,
    /// Block headers, payload and padding, without zlib header or trailer.
    pub compressed_size: u64,
    /// Value of the IDAT length field.
    pub idat_chunk_length: u32,
    pub signature: Span,
    pub ihdr: Span,
    pub idat: Span,
    pub iend: Span,
}

pub fn plan_layout(width: u32, height: u32, framing: Framing) -> Result<Layout> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimension { width, height });
    }
    let overflow = || EncodeError::SizeOverflow { width, height };

    let scanline = (width as u64)
        .checked_mul(BYTES_PER_PIXEL)
        .and_then(|w| w.checked_add(1))
        .ok_or_else(overflow)?;
    let decompressed_size = scanline
        .checked_mul(height as u64)
        .ok_or_else(overflow)?;
    let block_count = decompressed_size.div_ceil(framing.block_payload());
    let compressed_size = match framing {
        Framing::Slotted => block_count.checked_mul(framing.block_stride()),
        Framing::Conformant => block_count
            .checked_mul(framing.block_header_size())
            .and_then(|headers| headers.checked_add(decompressed_size)),
    }
    .ok_or_else(overflow)?;
    let idat_chunk_length = compressed_size
        .checked_add(ZLIB_HEADER_SIZE + framing.trailer_size())
        .filter(|len| *len <= MAX_CHUNK_LENGTH)
        .ok_or_else(overflow)?;

    let signature = Span {
        start: 0,
        len: framing.signature_size(),
    };
    let ihdr = signature.after(IHDR_SIZE);
    let idat = ihdr.after(CHUNK_OVERHEAD + idat_chunk_length);
    let iend = idat.after(IEND_SIZE);

    Ok(Layout {
        framing,
        width,
        height,
        decompressed_size,
        block_count,
        compressed_size,
        idat_chunk_length: idat_chunk_length as u32,
        signature,
        ihdr,
        idat,
        iend,
    })
}

impl Layout {
    pub fn total_size(&self) -> u64 {
        self.iend.end()
    }

    /// Bytes of chunk data inside IDAT, i.e. everything between its type and CRC.
    pub fn idat_body_size(&self) -> u64 {
        self.idat_chunk_length as u64
    }

    /// Payload bytes carried by `block`.
    pub fn block_len(&self, block: u64) -> u64 {
        if block + 1 < self.block_count {
            self.framing.block_payload()
        } else {
            self.decompressed_size - self.framing.block_payload() * (self.block_count - 1)
        }
    }

    pub(crate) fn span(&self, region: Region) -> Span {
        match region {
            Region::Signature => self.signature,
            Region::Ihdr => self.ihdr,
            Region::Idat => self.idat,
            Region::Iend => self.iend,
            Region::Exhausted => Span {
                start: self.total_size(),
                len: 0,
            },
        }
    }

    pub(crate) fn region_at(&self, position: u64) -> Region {
        [Region::Signature, Region::Ihdr, Region::Idat, Region::Iend]
            .into_iter()
            .find(|region| self.span(*region).contains(position))
            .unwrap_or(Region::Exhausted)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}x{} {}", self.width, self.height, self.framing)?;
        writeln!(
            f,
            "payload: {} bytes in {} block(s)",
            self.decompressed_size, self.block_count
        )?;
        for (name, span) in [
            ("signature", self.signature),
            ("IHDR", self.ihdr),
            ("IDAT", self.idat),
            ("IEND", self.iend),
        ] {
            writeln!(f, "{name}: {}..{}", span.start, span.end())?;
        }
        write!(f, "total: {}", self.total_size())
    }
}
