use crate::block::{zero, Block, ARGON2_BLOCK_BYTES};

pub const SBOX_SIZE: usize = 1 << 10;
const SBOX_MASK: u64 = (SBOX_SIZE / 2 - 1) as u64;
const SBOX_ROUNDS: usize = 32;

macro_rules! g_blake2b {
    ($a: expr, $b: expr, $c: expr, $d: expr) => {
        $a = $a.wrapping_add($b).wrapping_add(lower_mult($a, $b));
        $d = ($d ^ $a).rotate_right(32);
        $c = $c.wrapping_add($d).wrapping_add(lower_mult($c, $d));
        $b = ($b ^ $c).rotate_right(24);
        $a = $a.wrapping_add($b).wrapping_add(lower_mult($a, $b));
        $d = ($d ^ $a).rotate_right(16);
        $c = $c.wrapping_add($d).wrapping_add(lower_mult($c, $d));
        $b = ($b ^ $c).rotate_right(63);
    };
}

macro_rules! p {
    ($v0: expr, $v1: expr, $v2: expr, $v3: expr,
     $v4: expr, $v5: expr, $v6: expr, $v7: expr,
     $v8: expr, $v9: expr, $v10: expr, $v11: expr,
     $v12: expr, $v13: expr, $v14: expr, $v15: expr) => {
        g_blake2b!($v0, $v4, $v8, $v12); g_blake2b!($v1, $v5, $v9, $v13);
        g_blake2b!($v2, $v6, $v10, $v14); g_blake2b!($v3, $v7, $v11, $v15);
        g_blake2b!($v0, $v5, $v10, $v15); g_blake2b!($v1, $v6, $v11, $v12);
        g_blake2b!($v2, $v7, $v8, $v13); g_blake2b!($v3, $v4, $v9, $v14);
    };
}

// The multiply-add flavor of the BLAKE2b mix: a += b + 2 * lo32(a) * lo32(b).
#[inline(always)]
fn lower_mult(a: u64, b: u64) -> u64 {
    fn lower32(k: u64) -> u64 { k & 0xffffffff }
    lower32(a).wrapping_mul(lower32(b)).wrapping_mul(2)
}

#[cfg_attr(rustfmt, rustfmt_skip)]
fn p_row(row: usize, b: &mut Block) {
    p!(b[16 * row + 0], b[16 * row + 1], b[16 * row + 2], b[16 * row + 3],
       b[16 * row + 4], b[16 * row + 5], b[16 * row + 6], b[16 * row + 7],
       b[16 * row + 8], b[16 * row + 9], b[16 * row + 10], b[16 * row + 11],
       b[16 * row + 12], b[16 * row + 13], b[16 * row + 14], b[16 * row + 15]);
}

// Column-wise over pairs of adjacent words.
#[cfg_attr(rustfmt, rustfmt_skip)]
fn p_col(col: usize, b: &mut Block) {
    p!(b[2 * col + 16 * 0], b[2 * col + 16 * 0 + 1],
       b[2 * col + 16 * 1], b[2 * col + 16 * 1 + 1],
       b[2 * col + 16 * 2], b[2 * col + 16 * 2 + 1],
       b[2 * col + 16 * 3], b[2 * col + 16 * 3 + 1],
       b[2 * col + 16 * 4], b[2 * col + 16 * 4 + 1],
       b[2 * col + 16 * 5], b[2 * col + 16 * 5 + 1],
       b[2 * col + 16 * 6], b[2 * col + 16 * 6 + 1],
       b[2 * col + 16 * 7], b[2 * col + 16 * 7 + 1]);
}

// Walks the 64x64 multiplication chain through the two S-box halves. Only
// the low halves of the running word pick the table slots.
fn sbox_mix(r0: &Block, sbox: &[u64]) -> u64 {
    let mut x = r0[0] ^ r0[per_kib!(u64) - 1];
    for _ in 0..SBOX_ROUNDS {
        let x1 = x >> 32;
        let x2 = x & 0xffffffff;
        let y = sbox[(x1 & SBOX_MASK) as usize];
        let z = sbox[((x2 & SBOX_MASK) as usize) + SBOX_SIZE / 2];
        x = x1.wrapping_mul(x2).wrapping_add(y) ^ z;
    }
    x
}

/// ``` g x y = let r = x `xor` y in p_col (p_row r) `xor` r ```
/// With an S-box present the multiplication chain seeded from `r` is folded
/// into the first and last words of the result.
pub fn g(dest: &mut Block, lhs: &Block, rhs: &Block, sbox: Option<&[u64]>) {
    for (d, (l, r)) in dest.iter_mut().zip(lhs.iter().zip(rhs.iter())) {
        *d = *l ^ *r;
    }

    let x = match sbox {
        Some(sb) => sbox_mix(dest, sb),
        None => 0,
    };

    for row in 0..8 {
        p_row(row, dest);
    }
    // column-wise, 2x u64 groups
    for col in 0..8 {
        p_col(col, dest);
    }

    for (d, (l, r)) in dest.iter_mut().zip(lhs.iter().zip(rhs.iter())) {
        *d = *d ^ *l ^ *r;
    }

    if sbox.is_some() {
        dest[0] = dest[0].wrapping_add(x);
        dest[per_kib!(u64) - 1] = dest[per_kib!(u64) - 1].wrapping_add(x);
    }
}

/// ``` g2 y = let g' y = g 0 y in g' . g' ```
/// Used for data-independent index generation.
pub fn g_two(dest: &mut Block, src: &Block) {
    *dest = src.clone();

    for row in 0..8 {
        p_row(row, dest);
    }
    for col in 0..8 {
        p_col(col, dest);
    }

    for (d, s) in dest.iter_mut().zip(src.iter()) {
        *d ^= *s;
    }

    let tmp: Block = dest.clone();

    for row in 0..8 {
        p_row(row, dest);
    }
    for col in 0..8 {
        p_col(col, dest);
    }

    for (d, s) in dest.iter_mut().zip(tmp.iter()) {
        *d ^= *s;
    }
}

/// Rebuilds the 1024-word S-box by iterating `g` from `seed`, 128 words per
/// application.
pub fn generate_sbox(seed: &Block, sbox: &mut [u64]) {
    debug_assert_eq!(sbox.len(), SBOX_SIZE);
    let zero_blk = zero();
    let mut prev = seed.clone();
    let mut next = zero();
    for chunk in sbox.chunks_mut(per_kib!(u64)) {
        g(&mut next, &prev, &zero_blk, None);
        chunk.copy_from_slice(next.as_u64());
        prev = next.clone();
    }
}

#[cfg(test)]
mod test {
    use super::{g, g_two, generate_sbox, SBOX_SIZE};
    use crate::block::zero;

    #[test]
    fn g_of_zeroes_is_zero() {
        let (a, b, mut out) = (zero(), zero(), zero());
        g(&mut out, &a, &b, None);
        assert!(out.as_u64().iter().all(|&w| w == 0));
    }

    #[test]
    fn g_is_symmetric_in_its_inputs() {
        let mut a = zero();
        let mut b = zero();
        for i in 0..128 {
            a[i] = 0x0123_4567_89ab_cdef ^ (i as u64);
            b[i] = (i as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        }
        let (mut ab, mut ba) = (zero(), zero());
        g(&mut ab, &a, &b, None);
        g(&mut ba, &b, &a, None);
        assert_eq!(ab.as_u64(), ba.as_u64());
    }

    #[test]
    fn sbox_changes_the_output() {
        let mut a = zero();
        for i in 0..128 {
            a[i] = i as u64 + 1;
        }
        let b = zero();
        let mut sbox = vec![0u64; SBOX_SIZE];
        generate_sbox(&a, &mut sbox);
        assert!(sbox.iter().any(|&w| w != 0));

        let (mut plain, mut mixed) = (zero(), zero());
        g(&mut plain, &a, &b, None);
        g(&mut mixed, &a, &b, Some(&sbox));
        assert_ne!(plain.as_u64(), mixed.as_u64());
    }

    #[test]
    fn g_two_is_deterministic() {
        let mut src = zero();
        for i in 0..7 {
            src[i] = i as u64;
        }
        let (mut fst, mut snd) = (zero(), zero());
        g_two(&mut fst, &src);
        g_two(&mut snd, &src);
        assert_eq!(fst.as_u64(), snd.as_u64());
        assert!(fst.as_u64().iter().any(|&w| w != 0));
    }
}
