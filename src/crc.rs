const CRC_TABLE: [u32; 256] = {
    let mut table = [0; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut i = 0;
        while i < 8 {
            if c & 1 != 0 {
                c = 0xedb88320 ^ (c >> 1);
            } else {
                c >>= 1;
            }
            i += 1;
        }
        table[n as usize] = c;
        n += 1;
    }
    table
};

/// Register value a running CRC starts from.
pub const CRC_INIT: u32 = 0xffffffff;

/// Feeds a single byte into a raw CRC register.
#[inline]
pub fn update_crc_byte(crc: u32, byte: u8) -> u32 {
    let index = (crc ^ byte as u32) & 0xff;
    CRC_TABLE[index as usize] ^ (crc >> 8)
}

/// Feeds bytes into a raw CRC register. Pair with [`finish_crc`].
pub fn update_crc<I: IntoIterator<Item = u8>>(crc: u32, data: I) -> u32 {
    data.into_iter().fold(crc, update_crc_byte)
}

/// Applies the final XOR to a raw register.
#[inline]
pub fn finish_crc(crc: u32) -> u32 {
    crc ^ 0xffffffff
}

/// CRC-32 as used by PNG chunks and zlib.
pub fn calculate_crc<I: IntoIterator<Item = u8>>(data: I) -> u32 {
    finish_crc(update_crc(CRC_INIT, data))
}
