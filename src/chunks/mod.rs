use nom::{
    bytes::complete::{tag, take},
    combinator::{map, map_res},
    multi::length_data,
    number::complete::be_u32,
    sequence::{terminated, tuple},
    IResult,
};

use crate::crc::calculate_crc;

pub(crate) mod idat;
pub(crate) mod iend;
pub(crate) mod ihdr;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug)]
pub(crate) enum Chunk<'a> {
    IHDR(ihdr::IHDRChunk),
    IDAT(idat::IDATChunk<'a>),
    IEND,
    Unknown(RawChunk<'a>),
}

pub(crate) fn iter_chunks(source: &[u8]) -> ChunkIter {
    ChunkIter {
        source,
        finished: false,
    }
}

pub(crate) struct ChunkIter<'a> {
    source: &'a [u8],
    finished: bool,
}

impl<'a> ChunkIter<'a> {
    /// Bytes left after the last chunk returned.
    pub(crate) fn rest(&self) -> &'a [u8] {
        self.source
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = anyhow::Result<Chunk<'a>>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match parse_chunk(self.source) {
            Ok((rest, chunk)) => {
                self.source = rest;
                if matches!(chunk, Chunk::IEND) {
                    self.finished = true;
                }
                Some(Ok(chunk))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e.to_owned().into()))
            }
        }
    }
}

fn parse_chunk(input: &[u8]) -> IResult<&[u8], Chunk<'_>> {
    let (rest, (header, chunk_data)) = valid_chunk(input)?;
    match header {
        ihdr::HEADER => Ok((
            rest,
            Chunk::IHDR(ihdr::IHDRChunk::from_bytes(chunk_data)?.1),
        )),
        idat::HEADER => Ok((
            rest,
            Chunk::IDAT(idat::IDATChunk::from_bytes(chunk_data)?.1),
        )),
        iend::HEADER => Ok((rest, Chunk::IEND)),
        _ => Ok((
            rest,
            Chunk::Unknown(RawChunk {
                chunk_type: *header,
                _chunk_data: chunk_data,
            }),
        )),
    }
}

#[derive(Debug)]
pub(crate) struct RawChunk<'a> {
    pub(crate) chunk_type: [u8; 4],
    _chunk_data: &'a [u8],
}

/// Splits off one chunk, rejecting it unless its trailing CRC matches.
fn valid_chunk<'a, Error>(input: &'a [u8]) -> IResult<&'a [u8], (&'a [u8; 4], &'a [u8]), Error>
where
    Error: nom::error::ParseError<&'a [u8]>
        + nom::error::FromExternalError<&'a [u8], std::array::TryFromSliceError>,
{
    let (header_length, crc_length) = (4, 4);
    let (input, chunk_data) = length_data(map(be_u32, |v: u32| {
        v.saturating_add(header_length + crc_length)
    }))(input)?;
    let crc = calculate_crc(
        chunk_data[0..chunk_data.len() - crc_length as usize]
            .iter()
            .copied(),
    )
    .to_be_bytes();
    let (_, data) = tuple((
        map_res(take(header_length), <&[u8; 4]>::try_from),
        terminated(
            take(chunk_data.len() - (header_length + crc_length) as usize),
            tag(&crc[..]),
        ),
    ))(chunk_data)?;
    Ok((input, data))
}

pub(crate) trait ParseableChunk<'a>: Sized {
    const HEADER: &'static [u8; 4];

    fn from_bytes(chunk_data: &'a [u8]) -> IResult<&'a [u8], Self>;
}

/// A chunk the encoder synthesizes whole, CRC included.
pub(crate) trait WritableChunk {
    type Output: AsRef<[u8]>;

    fn to_bytes(&self) -> Self::Output;
}
