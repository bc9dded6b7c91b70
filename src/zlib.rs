/// Compression method 8: DEFLATE.
const CM_DEFLATE: u8 = 8;
/// Window size 2^(7 + 8) = 32 KiB.
const CINFO_32K: u8 = 7;

/// The two-byte zlib stream header for `cmf`: no preset dictionary, fastest
/// level, and the smallest FCHECK that makes `CMF * 256 + FLG` a multiple of 31.
pub(crate) const fn stream_header(cmf: u8) -> [u8; 2] {
    let mut fcheck = 0;
    while fcheck < 31 {
        if (cmf as u16 * 256 + fcheck as u16) % 31 == 0 {
            break;
        }
        fcheck += 1;
    }
    // FDICT (bit 5) and FLEVEL (bits 6-7) stay clear.
    [cmf, fcheck]
}

/// CM in the low nibble and CINFO in the high one, as inflaters expect.
pub(crate) const ZLIB_HEADER: [u8; 2] = stream_header((CINFO_32K << 4) | CM_DEFLATE);

/// The same two fields with the nibbles swapped, as the slotted layout writes
/// them. Only the slot unframer reads this header back.
pub(crate) const SLOTTED_ZLIB_HEADER: [u8; 2] = stream_header((CM_DEFLATE << 4) | CINFO_32K);

/// Whether a header names DEFLATE, in either nibble, with valid check bits.
pub(crate) fn is_deflate_header([cmf, flg]: [u8; 2]) -> bool {
    let names_deflate = cmf & 0x0f == CM_DEFLATE || cmf >> 4 == CM_DEFLATE;
    names_deflate && flg & 0x20 == 0 && (cmf as u16 * 256 + flg as u16) % 31 == 0
}

/// First byte of a stored DEFLATE block: BFINAL in bit 0, BTYPE 00 above it.
pub(crate) const fn stored_block_flags(is_final: bool) -> u8 {
    is_final as u8
}

/// The full five-byte header of a stored DEFLATE block.
pub(crate) fn stored_block_header(is_final: bool, len: u16) -> [u8; 5] {
    let [len_lo, len_hi] = len.to_le_bytes();
    let [nlen_lo, nlen_hi] = (!len).to_le_bytes();
    [stored_block_flags(is_final), len_lo, len_hi, nlen_lo, nlen_hi]
}
