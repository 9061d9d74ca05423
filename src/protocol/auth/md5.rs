//! MD5 core with the legacy iTunes variant
//!
//! The DAAP validation hash is built on MD5, but the original client
//! implementation shipped a transposed rotation in one round-3 step. Servers
//! validate against that exact output, so the digest must reproduce the bug
//! bit-for-bit for protocol v2 peers. That is why this is hand-rolled
//! instead of using a stock MD5 crate.

/// Per-round rotation amounts
const S: [[u32; 4]; 4] = [
    [7, 12, 17, 22],
    [5, 9, 14, 20],
    [4, 11, 16, 23],
    [6, 10, 15, 21],
];

/// Sine-derived additive constants
const K: [u32; 64] = [
    0xd76a_a478, 0xe8c7_b756, 0x2420_70db, 0xc1bd_ceee,
    0xf57c_0faf, 0x4787_c62a, 0xa830_4613, 0xfd46_9501,
    0x6980_98d8, 0x8b44_f7af, 0xffff_5bb1, 0x895c_d7be,
    0x6b90_1122, 0xfd98_7193, 0xa679_438e, 0x49b4_0821,
    0xf61e_2562, 0xc040_b340, 0x265e_5a51, 0xe9b6_c7aa,
    0xd62f_105d, 0x0244_1453, 0xd8a1_e681, 0xe7d3_fbc8,
    0x21e1_cde6, 0xc337_07d6, 0xf4d5_0d87, 0x455a_14ed,
    0xa9e3_e905, 0xfcef_a3f8, 0x676f_02d9, 0x8d2a_4c8a,
    0xfffa_3942, 0x8771_f681, 0x6d9d_6122, 0xfde5_380c,
    0xa4be_ea44, 0x4bde_cfa9, 0xf6bb_4b60, 0xbebf_bc70,
    0x289b_7ec6, 0xeaa1_27fa, 0xd4ef_3085, 0x0488_1d05,
    0xd9d4_d039, 0xe6db_99e5, 0x1fa2_7cf8, 0xc4ac_5665,
    0xf429_2244, 0x432a_ff97, 0xab94_23a7, 0xfc93_a039,
    0x655b_59c3, 0x8f0c_cc92, 0xffef_f47d, 0x8584_5dd1,
    0x6fa8_7e4f, 0xfe2c_e6e0, 0xa301_4314, 0x4e08_11a1,
    0xf753_7e82, 0xbd3a_f235, 0x2ad7_d2bb, 0xeb86_d391,
];

/// The round-3 step whose rotation the legacy client got wrong
const LEGACY_STEP: usize = 34;

/// Incremental MD5 with a variant flag
pub struct Md5 {
    state: [u32; 4],
    count: u64,
    buffer: [u8; 64],
    buffered: usize,
    legacy: bool,
}

impl Md5 {
    /// Create a new context.
    ///
    /// `legacy` selects the transposed-rotation variant used for DAAP
    /// protocol v2 peers; `false` is standard MD5.
    #[must_use]
    pub fn new(legacy: bool) -> Self {
        Self {
            state: [0x6745_2301, 0xefcd_ab89, 0x98ba_dcfe, 0x1032_5476],
            count: 0,
            buffer: [0u8; 64],
            buffered: 0,
            legacy,
        }
    }

    /// Absorb input bytes
    pub fn update(&mut self, mut data: &[u8]) {
        self.count = self.count.wrapping_add(data.len() as u64);

        if self.buffered > 0 {
            let take = data.len().min(64 - self.buffered);
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&data[..take]);
            self.buffered += take;
            data = &data[take..];

            if self.buffered == 64 {
                let block = self.buffer;
                self.transform(&block);
                self.buffered = 0;
            }
        }

        while data.len() >= 64 {
            let mut block = [0u8; 64];
            block.copy_from_slice(&data[..64]);
            self.transform(&block);
            data = &data[64..];
        }

        if !data.is_empty() {
            self.buffer[..data.len()].copy_from_slice(data);
            self.buffered = data.len();
        }
    }

    /// Apply padding and return the 16-byte digest
    #[must_use]
    pub fn finalize(mut self) -> [u8; 16] {
        let bit_count = self.count.wrapping_mul(8);

        self.update(&[0x80]);
        while self.buffered != 56 {
            self.update(&[0x00]);
        }

        // Length in bits, little-endian, bypassing the count update
        let mut block = self.buffer;
        block[56..64].copy_from_slice(&bit_count.to_le_bytes());
        self.transform(&block);

        let mut digest = [0u8; 16];
        for (chunk, word) in digest.chunks_exact_mut(4).zip(self.state) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        digest
    }

    fn transform(&mut self, block: &[u8; 64]) {
        let mut x = [0u32; 16];
        for (word, chunk) in x.iter_mut().zip(block.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        let [mut a, mut b, mut c, mut d] = self.state;

        for i in 0..64 {
            let (f, g) = match i / 16 {
                0 => ((b & c) | (!b & d), i),
                1 => ((d & b) | (!d & c), (5 * i + 1) % 16),
                2 => (b ^ c ^ d, (3 * i + 5) % 16),
                _ => (c ^ (b | !d), (7 * i) % 16),
            };

            let mut s = S[i / 16][i % 4];
            if self.legacy && i == LEGACY_STEP {
                s -= 1;
            }

            let rotated = a
                .wrapping_add(f)
                .wrapping_add(K[i])
                .wrapping_add(x[g])
                .rotate_left(s);
            a = d;
            d = c;
            c = b;
            b = b.wrapping_add(rotated);
        }

        self.state[0] = self.state[0].wrapping_add(a);
        self.state[1] = self.state[1].wrapping_add(b);
        self.state[2] = self.state[2].wrapping_add(c);
        self.state[3] = self.state[3].wrapping_add(d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(digest: [u8; 16]) -> String {
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn md5(legacy: bool, input: &[u8]) -> String {
        let mut ctx = Md5::new(legacy);
        ctx.update(input);
        hex(ctx.finalize())
    }

    #[test]
    fn test_standard_vectors() {
        // RFC 1321 test suite
        assert_eq!(md5(false, b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5(false, b"a"), "0cc175b9c0f1b6a831c399e269772661");
        assert_eq!(md5(false, b"abc"), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(
            md5(false, b"message digest"),
            "f96b697d7cb7938d525a2f31aaf161d0"
        );
        assert_eq!(
            md5(false, b"abcdefghijklmnopqrstuvwxyz"),
            "c3fcd3d76192e4007dfb496cca67e13b"
        );
    }

    #[test]
    fn test_legacy_variant_differs() {
        assert_ne!(md5(true, b"abc"), md5(false, b"abc"));
    }

    #[test]
    fn test_legacy_variant_deterministic() {
        assert_eq!(md5(true, b"daap"), md5(true, b"daap"));
    }

    #[test]
    fn test_incremental_update_matches_oneshot() {
        let mut ctx = Md5::new(false);
        ctx.update(b"mess");
        ctx.update(b"age ");
        ctx.update(b"digest");
        assert_eq!(hex(ctx.finalize()), "f96b697d7cb7938d525a2f31aaf161d0");
    }

    #[test]
    fn test_multi_block_input() {
        let input = vec![b'x'; 200];
        let mut ctx = Md5::new(false);
        for chunk in input.chunks(7) {
            ctx.update(chunk);
        }
        let mut oneshot = Md5::new(false);
        oneshot.update(&input);
        assert_eq!(ctx.finalize(), oneshot.finalize());
    }
}
