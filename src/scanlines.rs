use crate::source::{ImageDescriptor, PixelSource};

/// Filter type 0: the scanline is stored as-is.
pub(crate) const FILTER_NONE: u8 = 0;

/// Walks the nominal decompressed payload of an image: every scanline is a
/// [`FILTER_NONE`] byte followed by that row's RGBA bytes, read straight from
/// the pixel source.
pub(crate) struct Scanlines<'a, S: ?Sized> {
    image: ImageDescriptor<'a, S>,
    row_bytes: usize,
    row: u32,
    /// Position inside the current scanline, 0 being the filter byte.
    column: usize,
    address: usize,
}

impl<'a, S: PixelSource + ?Sized> Scanlines<'a, S> {
    pub(crate) fn new(image: ImageDescriptor<'a, S>) -> Self {
        Self {
            image,
            row_bytes: image.width as usize * 4,
            row: 0,
            column: 0,
            address: image.offset,
        }
    }

    fn remaining(&self) -> usize {
        let rows_left = (self.image.height - self.row) as usize;
        (rows_left * (self.row_bytes + 1)).saturating_sub(self.column)
    }
}

impl<S: PixelSource + ?Sized> Iterator for Scanlines<'_, S> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.row >= self.image.height {
            return None;
        }
        let byte = if self.column == 0 {
            FILTER_NONE
        } else {
            let b = self.image.source.read_byte(self.address);
            self.address += 1;
            b
        };
        self.column += 1;
        if self.column > self.row_bytes {
            self.column = 0;
            self.row += 1;
        }
        Some(byte)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}
