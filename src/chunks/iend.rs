use super::WritableChunk;
use crate::crc::calculate_crc;

pub(crate) const HEADER: &[u8; 4] = b"IEND";

pub(crate) struct IENDChunk;
impl WritableChunk for IENDChunk {
    type Output = [u8; 12];

    fn to_bytes(&self) -> Self::Output {
        let mut data = [0; 12];
        data[4..8].copy_from_slice(HEADER);
        let crc = calculate_crc(data[4..8].iter().copied()).to_be_bytes();
        for (i, b) in crc.into_iter().enumerate() {
            data[i + 8] = b;
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_bytes() {
        let hex: String = IENDChunk
            .to_bytes()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        insta::assert_snapshot!(hex, @"0000000049454e44ae426082");
    }

    #[test]
    fn crc_is_over_the_type_only() {
        let bytes = IENDChunk.to_bytes();
        assert_eq!(bytes[8..], calculate_crc(*b"IEND").to_be_bytes());
    }
}
