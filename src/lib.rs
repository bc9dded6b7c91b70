//! Streams RGBA8888 pixel memory out as a PNG file without ever holding the
//! encoded file in memory. The image data is wrapped in stored (uncompressed)
//! DEFLATE blocks inside a single IDAT chunk, so every output byte can be
//! synthesized on demand from its position alone.

mod adler;
mod chunks;
mod crc;
mod encoder;
mod error;
mod inspect;
mod layout;
mod scanlines;
mod source;
mod stream;
mod zlib;

pub use adler::{adler32, Adler32};
pub use chunks::ihdr::{ColorType, IHDRChunk, Interlacing};
pub use crc::{calculate_crc, finish_crc, update_crc, update_crc_byte, CRC_INIT};
pub use encoder::{Checksums, PngEncoder};
pub use error::{EncodeError, Result};
pub use inspect::{inspect, Inspection};
pub use layout::{plan_layout, Framing, Layout, Span, PNG_SIGNATURE};
pub use source::{FnSource, ImageDescriptor, Pixel, PixelSource};
pub use stream::PngStream;
