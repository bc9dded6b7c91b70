use log::debug;

use crate::{
    adler::adler32,
    chunks::{
        idat::{body_crc, IdatBody},
        iend::IENDChunk,
        ihdr::IHDRChunk,
        WritableChunk,
    },
    error::{EncodeError, Result},
    layout::{plan_layout, Framing, Layout},
    scanlines::Scanlines,
    source::{ImageDescriptor, PixelSource},
    stream::PngStream,
};

/// Checksums computed up front from the pixel source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checksums {
    /// Adler-32 of the nominal decompressed payload (filter bytes included).
    pub adler32: u32,
    /// CRC-32 carried by the IDAT chunk.
    pub idat_crc32: u32,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ChunkBuffers {
    pub(crate) ihdr: [u8; 25],
    pub(crate) zlib_header: [u8; 2],
    pub(crate) iend: [u8; 12],
    pub(crate) checksums: Checksums,
}

/// Everything needed to stream one image as a PNG.
///
/// Building an encoder validates the image, plans the output layout and reads
/// the pixel source twice to precompute the Adler-32 and IDAT CRC-32. The
/// encoded file itself is never held in memory; [`PngEncoder::stream`] hands
/// out forward-only readers that synthesize it on demand.
pub struct PngEncoder<'a, S: ?Sized> {
    pub(crate) image: ImageDescriptor<'a, S>,
    pub(crate) layout: Layout,
    pub(crate) buffers: ChunkBuffers,
}

impl<'a, S: PixelSource + ?Sized> PngEncoder<'a, S> {
    pub fn new(image: ImageDescriptor<'a, S>, framing: Framing) -> Result<Self> {
        let layout = plan_layout(image.width, image.height, framing)?;
        let required = image
            .pixel_bytes()
            .and_then(|len| len.checked_add(image.offset))
            .ok_or(EncodeError::SizeOverflow {
                width: image.width,
                height: image.height,
            })?;
        let available = image.source.byte_len();
        if required > available {
            return Err(EncodeError::SourceTooSmall {
                required,
                available,
            });
        }

        let adler32 = adler32(Scanlines::new(image));
        let zlib_header = framing.zlib_header();
        let idat_crc32 = body_crc(IdatBody::new(layout, image, zlib_header, adler32));
        let buffers = ChunkBuffers {
            ihdr: IHDRChunk::rgba8(image.width, image.height)
                .to_bytes_with_length(framing.ihdr_length_field()),
            zlib_header,
            iend: IENDChunk.to_bytes(),
            checksums: Checksums {
                adler32,
                idat_crc32,
            },
        };
        debug!(
            "{}x{} {} encoder: {} bytes, adler32 {:08x}, IDAT crc {:08x}",
            image.width,
            image.height,
            framing,
            layout.total_size(),
            adler32,
            idat_crc32
        );

        Ok(Self {
            image,
            layout,
            buffers,
        })
    }

    /// Shorthand for the default [`Framing::Slotted`] layout.
    pub fn slotted(image: ImageDescriptor<'a, S>) -> Result<Self> {
        Self::new(image, Framing::Slotted)
    }

    /// Shorthand for a stream any PNG decoder can read.
    pub fn conformant(image: ImageDescriptor<'a, S>) -> Result<Self> {
        Self::new(image, Framing::Conformant)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn checksums(&self) -> Checksums {
        self.buffers.checksums
    }

    pub fn total_size(&self) -> u64 {
        self.layout.total_size()
    }

    /// A fresh stream positioned at byte 0. Streams cannot be rewound, so
    /// re-reading the image means opening another one.
    pub fn stream(&self) -> PngStream<'a, S> {
        PngStream::new(*self)
    }

    pub fn into_stream(self) -> PngStream<'a, S> {
        PngStream::new(self)
    }

    pub(crate) fn idat_body(&self) -> IdatBody<'a, S> {
        IdatBody::new(
            self.layout,
            self.image,
            self.buffers.zlib_header,
            self.buffers.checksums.adler32,
        )
    }
}

impl<S: ?Sized> Clone for PngEncoder<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<S: ?Sized> Copy for PngEncoder<'_, S> {}
