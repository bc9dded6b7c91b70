use crate::crc::calculate_crc;
use nom::{
    bytes::complete::take,
    error::{Error, ErrorKind},
    number::complete::be_u32,
    sequence::tuple,
    IResult,
};

use super::{ParseableChunk, WritableChunk};

pub(crate) const HEADER: &[u8; 4] = b"IHDR";
const BODY_LENGTH: u32 = 13;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IHDRChunk {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace_method: Interlacing,
}
impl IHDRChunk {
    /// Header of a non-interlaced 8-bit RGBA image.
    pub(crate) fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bit_depth: 8,
            color_type: ColorType::TruecolorWithAlpha,
            compression_method: 0,
            filter_method: 0,
            interlace_method: Interlacing::None,
        }
    }

    /// The whole chunk with `length_field` in place of the true body length.
    /// The CRC does not cover the length, so it is unaffected.
    pub(crate) fn to_bytes_with_length(&self, length_field: u32) -> [u8; 25] {
        let mut bytes = self.to_bytes();
        bytes[0..4].copy_from_slice(&length_field.to_be_bytes());
        bytes
    }
}
impl<'a> ParseableChunk<'a> for IHDRChunk {
    const HEADER: &'static [u8; 4] = HEADER;

    fn from_bytes(chunk_data: &'a [u8]) -> IResult<&'a [u8], Self> {
        let (rest, (width, height, other_bytes)) =
            tuple((be_u32, be_u32, take(5usize)))(chunk_data)?;
        let invalid = || nom::Err::Failure(Error::new(chunk_data, ErrorKind::Verify));
        Ok((
            rest,
            IHDRChunk {
                width,
                height,
                bit_depth: other_bytes[0],
                color_type: other_bytes[1].try_into().map_err(|_| invalid())?,
                compression_method: other_bytes[2],
                filter_method: other_bytes[3],
                interlace_method: other_bytes[4].try_into().map_err(|_| invalid())?,
            },
        ))
    }
}
impl WritableChunk for IHDRChunk {
    type Output = [u8; 25];

    fn to_bytes(&self) -> Self::Output {
        let mut bytes = [0; 25];
        bytes[0..4].copy_from_slice(&BODY_LENGTH.to_be_bytes());
        bytes[4..8].copy_from_slice(HEADER);
        bytes[8..12].copy_from_slice(&self.width.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.height.to_be_bytes());
        bytes[16..21].copy_from_slice(&[
            self.bit_depth,
            self.color_type as u8,
            self.compression_method,
            self.filter_method,
            self.interlace_method as u8,
        ]);
        let crc = calculate_crc(bytes[4..21].iter().copied()).to_be_bytes();
        bytes[21..].copy_from_slice(&crc);
        bytes
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    #[default]
    Greyscale = 0,
    Truecolor = 2,
    IndexedColor = 3,
    GreyscaleWithAlpha = 4,
    TruecolorWithAlpha = 6,
}
impl TryFrom<u8> for ColorType {
    type Error = anyhow::Error;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Greyscale),
            2 => Ok(Self::Truecolor),
            3 => Ok(Self::IndexedColor),
            4 => Ok(Self::GreyscaleWithAlpha),
            6 => Ok(Self::TruecolorWithAlpha),
            i => Err(anyhow::anyhow!("{i} is not a PNG color type")),
        }
    }
}
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Interlacing {
    #[default]
    None,
    Adam7,
}
impl TryFrom<u8> for Interlacing {
    type Error = anyhow::Error;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Adam7),
            i => Err(anyhow::anyhow!("{i} is not a PNG interlace method")),
        }
    }
}
