use std::io::{Read, Seek, SeekFrom};

use lazy_png::{
    adler32, calculate_crc, inspect, EncodeError, FnSource, Framing, ImageDescriptor, Pixel,
    PngEncoder, PNG_SIGNATURE,
};

fn gradient(width: u32, height: u32) -> Vec<u8> {
    (0..width * height * 4)
        .map(|i| (i.wrapping_mul(31) ^ (i >> 3)) as u8)
        .collect()
}

fn read_all(encoder: &PngEncoder<'_, Vec<u8>>) -> Vec<u8> {
    let mut bytes = vec![];
    encoder.stream().read_to_end(&mut bytes).unwrap();
    bytes
}

fn slotted_total(width: u64, height: u64) -> u64 {
    let n = (height * (1 + width * 4)).div_ceil(32767);
    25 + (12 + 2 + n * 32768) + 12
}

/// Independent bit-at-a-time CRC-32, no table.
fn reference_crc(data: &[u8]) -> u32 {
    let mut crc = 0xffff_ffffu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 == 1 {
                (crc >> 1) ^ 0xedb8_8320
            } else {
                crc >> 1
            };
        }
    }
    !crc
}

fn reference_adler(data: &[u8]) -> u32 {
    let (mut a, mut b) = (1u32, 0u32);
    for &byte in data {
        a = (a + byte as u32) % 65521;
        b = (b + a) % 65521;
    }
    (b << 16) | a
}

#[test]
fn total_size_matches_the_slot_formula() {
    for (width, height) in [(1, 1), (2, 2), (3, 5), (100, 40), (8192, 1), (10, 900)] {
        let pixels = gradient(width, height);
        let encoder = PngEncoder::slotted(ImageDescriptor::new(width, height, &pixels)).unwrap();
        let expected = slotted_total(width as u64, height as u64);
        assert_eq!(encoder.total_size(), expected, "{width}x{height}");
        assert_eq!(read_all(&encoder).len() as u64, expected, "{width}x{height}");
    }
}

#[test]
fn one_by_one_scenario() {
    let pixels: Vec<u8> = vec![0x11, 0x22, 0x33, 0x44];
    let encoder = PngEncoder::slotted(ImageDescriptor::new(1, 1, &pixels)).unwrap();
    let layout = encoder.layout();
    assert_eq!(layout.decompressed_size, 5);
    assert_eq!(layout.block_count, 1);
    assert_eq!(layout.compressed_size, 32768);
    assert_eq!(encoder.total_size(), 25 + 14 + 32768 + 12);

    let bytes = read_all(&encoder);
    assert_eq!(bytes[..8], [0, 0, 0, 17, b'I', b'H', b'D', b'R']);
    // IDAT opens at byte 25; its data, zlib header first, follows length and type.
    assert_eq!(bytes[25..29], 32770u32.to_be_bytes());
    let (cmf, flg) = (bytes[25 + 8], bytes[25 + 9]);
    assert_eq!((cmf as u32 * 256 + flg as u32) % 31, 0);
    assert_eq!(&bytes[29..33], b"IDAT");
}

#[test]
fn zlib_header_sits_right_after_the_idat_type() {
    let pixels = vec![0u8; 4];
    for (framing, header) in [
        (Framing::Slotted, [0x87, 0x05]),
        (Framing::Conformant, [0x78, 0x01]),
    ] {
        let encoder = PngEncoder::new(ImageDescriptor::new(1, 1, &pixels), framing).unwrap();
        let bytes = read_all(&encoder);
        let idat = encoder.layout().idat.start as usize;
        assert_eq!(bytes[idat + 8..idat + 10], header, "{framing}");
    }
}

#[test]
fn ihdr_length_field_per_framing() {
    let pixels = vec![0u8; 4];
    for (framing, length) in [(Framing::Slotted, 17u32), (Framing::Conformant, 13)] {
        let encoder = PngEncoder::new(ImageDescriptor::new(1, 1, &pixels), framing).unwrap();
        let bytes = read_all(&encoder);
        let ihdr = encoder.layout().ihdr.start as usize;
        assert_eq!(bytes[ihdr..ihdr + 4], length.to_be_bytes(), "{framing}");
        // Whatever the length field says, the chunk is 25 bytes.
        assert_eq!(encoder.layout().ihdr.len, 25);
        assert_eq!(&bytes[ihdr + 4..ihdr + 8], b"IHDR");
    }
}

#[test]
fn two_by_two_zero_adler() {
    let source = FnSource::new(16, |_| 0);
    let encoder = PngEncoder::slotted(ImageDescriptor::new(2, 2, &source)).unwrap();
    let payload = [0u8; 10];
    assert_eq!(encoder.checksums().adler32, reference_adler(&payload));
    assert_eq!(encoder.checksums().adler32, adler32(payload));
}

#[test]
fn streams_are_deterministic() {
    let pixels = gradient(77, 13);
    let first = PngEncoder::slotted(ImageDescriptor::new(77, 13, &pixels)).unwrap();
    let second = PngEncoder::slotted(ImageDescriptor::new(77, 13, &pixels)).unwrap();
    assert_eq!(read_all(&first), read_all(&second));
    assert_eq!(read_all(&first), read_all(&first));
}

#[test]
fn chunk_crcs_check_out() {
    let pixels = gradient(40, 30);
    let encoder = PngEncoder::slotted(ImageDescriptor::new(40, 30, &pixels)).unwrap();
    let bytes = read_all(&encoder);

    let ihdr = &bytes[..25];
    assert_eq!(ihdr[21..], reference_crc(&ihdr[4..21]).to_be_bytes());

    let iend = &bytes[bytes.len() - 12..];
    assert_eq!(iend[..8], [0, 0, 0, 0, b'I', b'E', b'N', b'D']);
    assert_eq!(iend[8..], calculate_crc(*b"IEND").to_be_bytes());
    assert_eq!(iend[8..], reference_crc(b"IEND").to_be_bytes());

    let idat = encoder.layout().idat;
    let idat = &bytes[idat.start as usize..idat.end() as usize];
    let crc_at = idat.len() - 4;
    assert_eq!(idat[crc_at..], reference_crc(&idat[4..crc_at]).to_be_bytes());
    assert_eq!(
        u32::from_be_bytes(idat[crc_at..].try_into().unwrap()),
        encoder.checksums().idat_crc32
    );
}

#[test]
fn bytes_available_counts_down() {
    let pixels = gradient(9, 9);
    let encoder = PngEncoder::slotted(ImageDescriptor::new(9, 9, &pixels)).unwrap();
    let mut stream = encoder.stream();
    let mut available = stream.bytes_available();
    assert_eq!(available, encoder.total_size());
    let mut buf = [0u8; 997];
    for size in [1usize, 7, 25, 0, 300, 997].into_iter().cycle() {
        let produced = stream.read_many(&mut buf[..size]).unwrap();
        assert_eq!(stream.bytes_available(), available - produced as u64);
        available = stream.bytes_available();
        if available == 0 {
            break;
        }
    }
    assert_eq!(stream.position(), encoder.total_size());
    assert_eq!(stream.read_many(&mut buf).unwrap(), 0);
    assert_eq!(stream.bytes_available(), 0);
}

#[test]
fn byte_at_a_time_matches_bulk_reads() {
    let pixels = gradient(8200, 2);
    let encoder = PngEncoder::slotted(ImageDescriptor::new(8200, 2, &pixels)).unwrap();

    let mut single = vec![];
    let mut stream = encoder.stream();
    while let Some(byte) = stream.read_one().unwrap() {
        single.push(byte);
    }

    let mut chunked = vec![];
    let mut stream = encoder.stream();
    let mut buf = vec![0u8; 40_000];
    for size in [3usize, 4096, 1, 40_000, 17].into_iter().cycle() {
        let produced = stream.read_many(&mut buf[..size]).unwrap();
        if produced == 0 {
            break;
        }
        chunked.extend_from_slice(&buf[..produced]);
    }

    assert_eq!(single.len() as u64, encoder.total_size());
    assert_eq!(single, chunked);
}

#[test]
fn mark_reset_and_seek_always_fail() {
    let pixels = gradient(3, 3);
    let encoder = PngEncoder::slotted(ImageDescriptor::new(3, 3, &pixels)).unwrap();
    let mut stream = encoder.stream();
    assert!(!stream.mark_supported());
    for step in 0..3 {
        assert_eq!(stream.mark(16), Err(EncodeError::UnsupportedOperation("mark")));
        assert_eq!(stream.reset(), Err(EncodeError::UnsupportedOperation("reset")));
        let err = stream.seek(SeekFrom::Start(0)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
        if step == 0 {
            stream.read_one().unwrap();
        } else {
            let mut rest = vec![];
            stream.read_to_end(&mut rest).unwrap();
        }
    }
    // The failed calls did not disturb the cursor.
    assert_eq!(stream.position(), encoder.total_size());
}

#[test]
fn reading_past_the_end_stays_at_the_end() {
    let pixels = gradient(2, 1);
    let encoder = PngEncoder::conformant(ImageDescriptor::new(2, 1, &pixels)).unwrap();
    let mut stream = encoder.stream();
    let mut bytes = vec![];
    stream.read_to_end(&mut bytes).unwrap();
    for _ in 0..5 {
        assert_eq!(stream.read_one(), Ok(None));
        assert_eq!(stream.read(&mut [0u8; 32]).unwrap(), 0);
        assert_eq!(stream.bytes_available(), 0);
    }
}

#[test]
fn conformant_stream_inflates_to_the_pixels() {
    let (width, height) = (200, 180);
    let pixels = gradient(width, height);
    let encoder = PngEncoder::conformant(ImageDescriptor::new(width, height, &pixels)).unwrap();
    let bytes = read_all(&encoder);
    assert_eq!(bytes[..8], PNG_SIGNATURE);

    let idat = encoder.layout().idat;
    let zlib = &bytes[idat.start as usize + 8..idat.end() as usize - 4];
    let payload = miniz_oxide::inflate::decompress_to_vec_zlib(zlib).unwrap();
    let stride = width as usize * 4 + 1;
    assert_eq!(payload.len(), stride * height as usize);
    for (row, scanline) in payload.chunks(stride).enumerate() {
        assert_eq!(scanline[0], 0);
        let start = row * (stride - 1);
        assert_eq!(scanline[1..], pixels[start..start + stride - 1]);
    }
    let trailer = u32::from_be_bytes(zlib[zlib.len() - 4..].try_into().unwrap());
    assert_eq!(trailer, reference_adler(&payload));
    assert_eq!(trailer, encoder.checksums().adler32);
}

#[test]
fn inspector_reads_both_framings() {
    let (width, height) = (130, 140);
    let pixels = gradient(width, height);
    for framing in [Framing::Slotted, Framing::Conformant] {
        let encoder =
            PngEncoder::new(ImageDescriptor::new(width, height, &pixels), framing).unwrap();
        let inspection = inspect(&read_all(&encoder)).unwrap();
        assert_eq!(inspection.framing(), framing);
        assert_eq!((inspection.header.width, inspection.header.height), (width, height));
        assert_eq!(inspection.decode_pixels().unwrap(), pixels, "{framing}");
        let payload = inspection.payload().unwrap();
        assert_eq!(adler32(payload), encoder.checksums().adler32);
    }
}

#[test]
fn offset_and_pixel_sources() {
    let pixels: Vec<Pixel> = (0..6u8)
        .map(|i| Pixel::new(i, i + 10, i + 20, 255))
        .collect();
    let as_bytes: Vec<u8> = pixels
        .iter()
        .flat_map(|p| [p.red, p.green, p.blue, p.alpha])
        .collect();
    let from_pixels = PngEncoder::conformant(ImageDescriptor::new(3, 2, &pixels)).unwrap();
    let mut padded = vec![0xaa; 7];
    padded.extend(&as_bytes);
    let from_offset =
        PngEncoder::conformant(ImageDescriptor::new(3, 2, &padded).with_offset(7)).unwrap();

    let mut a = vec![];
    from_pixels.stream().read_to_end(&mut a).unwrap();
    let b = read_all(&from_offset);
    assert_eq!(a, b);
    assert_eq!(inspect(&a).unwrap().decode_pixels().unwrap(), as_bytes);
}

#[test]
fn invalid_inputs_are_rejected() {
    let pixels = vec![0u8; 64];
    assert!(matches!(
        PngEncoder::slotted(ImageDescriptor::new(0, 1, &pixels)),
        Err(EncodeError::InvalidDimension { .. })
    ));
    assert!(matches!(
        PngEncoder::slotted(ImageDescriptor::new(5, 5, &pixels)),
        Err(EncodeError::SourceTooSmall {
            required: 100,
            available: 64
        })
    ));
    let huge = FnSource::new(usize::MAX, |_| 0);
    assert!(matches!(
        PngEncoder::slotted(ImageDescriptor::new(70_000, 70_000, &huge)),
        Err(EncodeError::SizeOverflow { .. })
    ));
}

#[test]
fn layout_table() {
    let source = FnSource::new(256 * 256 * 4, |a| a as u8);
    let encoder = PngEncoder::conformant(ImageDescriptor::new(256, 256, &source)).unwrap();
    insta::assert_snapshot!(encoder.layout().to_string(), @r###"
    256x256 conformant
    payload: 262400 bytes in 5 block(s)
    signature: 0..8
    IHDR: 8..33
    IDAT: 33..262476
    IEND: 262476..262488
    total: 262488
    "###);
}
