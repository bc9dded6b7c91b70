const MOD_ADLER: u32 = 65_521;

/// Running Adler-32 over a byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adler32 {
    s1: u32,
    s2: u32,
}

impl Default for Adler32 {
    fn default() -> Self {
        Self { s1: 1, s2: 0 }
    }
}

impl Adler32 {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn update(&mut self, byte: u8) {
        self.s1 = (self.s1 + byte as u32) % MOD_ADLER;
        self.s2 = (self.s2 + self.s1) % MOD_ADLER;
    }

    pub fn checksum(&self) -> u32 {
        (self.s2 << 16) | self.s1
    }
}

impl Extend<u8> for Adler32 {
    fn extend<I: IntoIterator<Item = u8>>(&mut self, iter: I) {
        for b in iter {
            self.update(b);
        }
    }
}

pub fn adler32<I: IntoIterator<Item = u8>>(data: I) -> u32 {
    let mut adler = Adler32::new();
    adler.extend(data);
    adler.checksum()
}
