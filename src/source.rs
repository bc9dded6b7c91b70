use std::fmt;

/// Byte-addressable RGBA8888 pixel memory.
///
/// The encoder only ever reads forward, one byte at a time, inside
/// `[offset, offset + height * width * 4)` of the owning [`ImageDescriptor`],
/// and expects the contents to stay unchanged while a stream is open.
pub trait PixelSource {
    fn read_byte(&self, address: usize) -> u8;

    /// Number of addressable bytes, starting at address 0.
    fn byte_len(&self) -> usize;
}

impl PixelSource for [u8] {
    fn read_byte(&self, address: usize) -> u8 {
        self[address]
    }

    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl PixelSource for Vec<u8> {
    fn read_byte(&self, address: usize) -> u8 {
        self[address]
    }

    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl<const N: usize> PixelSource for [u8; N] {
    fn read_byte(&self, address: usize) -> u8 {
        self[address]
    }

    fn byte_len(&self) -> usize {
        N
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Pixel {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}
impl Pixel {
    pub fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub fn channel(&self, index: usize) -> u8 {
        match index {
            0 => self.red,
            1 => self.green,
            2 => self.blue,
            _ => self.alpha,
        }
    }
}

impl PixelSource for [Pixel] {
    fn read_byte(&self, address: usize) -> u8 {
        self[address / 4].channel(address % 4)
    }

    fn byte_len(&self) -> usize {
        self.len() * 4
    }
}

impl PixelSource for Vec<Pixel> {
    fn read_byte(&self, address: usize) -> u8 {
        self.as_slice().read_byte(address)
    }

    fn byte_len(&self) -> usize {
        self.as_slice().byte_len()
    }
}

/// Pixel memory computed on demand by a closure.
pub struct FnSource<F> {
    len: usize,
    read: F,
}

impl<F: Fn(usize) -> u8> FnSource<F> {
    pub fn new(len: usize, read: F) -> Self {
        Self { len, read }
    }
}

impl<F: Fn(usize) -> u8> PixelSource for FnSource<F> {
    fn read_byte(&self, address: usize) -> u8 {
        (self.read)(address)
    }

    fn byte_len(&self) -> usize {
        self.len
    }
}

impl<F> fmt::Debug for FnSource<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSource").field("len", &self.len).finish()
    }
}

/// An RGBA8888 image living in some caller-owned [`PixelSource`].
pub struct ImageDescriptor<'a, S: ?Sized> {
    pub width: u32,
    pub height: u32,
    /// Address of the first pixel's red byte.
    pub offset: usize,
    pub source: &'a S,
}

impl<'a, S: PixelSource + ?Sized> ImageDescriptor<'a, S> {
    pub fn new(width: u32, height: u32, source: &'a S) -> Self {
        Self {
            width,
            height,
            offset: 0,
            source,
        }
    }

    pub fn with_offset(self, offset: usize) -> Self {
        Self { offset, ..self }
    }

    /// Pixel bytes the image spans, if that fits in memory at all.
    pub fn pixel_bytes(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(4)?
            .checked_mul(self.height as usize)
    }
}

// Manual impls: deriving would demand `S: Clone`.
impl<S: ?Sized> Clone for ImageDescriptor<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<S: ?Sized> Copy for ImageDescriptor<'_, S> {}

impl<S: ?Sized> fmt::Debug for ImageDescriptor<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageDescriptor")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}
