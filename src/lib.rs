//! Memory-hard password hashing with the five members of the Argon2 family
//! (version byte `0x10`): Argon2d, Argon2i, Argon2di, Argon2id and Argon2ds.
//!
//! The short way in is one of the context entry points or the `*_simple`
//! wrappers; [`Argon2`] gives full control over the cost parameters:
//!
//! ```
//! use argon2kdf::{Argon2, Variant};
//!
//! let a2 = Argon2::new(3, 1, 16, Variant::Argon2id).unwrap();
//! let mut tag = [0u8; 32];
//! a2.hash(&mut tag, b"password", b"delicious salt", &[], &[]);
//! assert_ne!(tag, [0u8; 32]);
//! ```

#[macro_use]
mod block;
mod compress;
mod context;
mod error;
pub mod verifier;
mod workers;

pub use crate::context::{AllocateFn, Context, FreeFn};
pub use crate::error::Error;

use crate::block::{zero, Block, Matrix, ARGON2_BLOCK_BYTES};
use crate::compress::{g, g_two, generate_sbox, SBOX_SIZE};
use crate::workers::Workers;
use blake2_rfc::blake2b::Blake2b;

const ARGON2_VERSION: u32 = 0x10;
const DEF_B2HASH_LEN: usize = 64;
const SLICES_PER_LANE: u32 = 4;

pub const MIN_LANES: u32 = 1;
pub const MAX_LANES: u32 = 64;
pub const MIN_SALT_LEN: usize = 8;
pub const MIN_OUT_LEN: usize = 4;
pub const MAX_PASSES: u32 = 1 << 24;
pub const MAX_MEMORY_KIB: u32 = 1 << 24;

pub mod defaults {
    // cost parameters the example driver starts from
    pub const PASSES: u32 = 3;
    pub const KIB: u32 = 4096;
    pub const LANES: u32 = 1;
    pub const LENGTH: usize = 64;
}

/// Selector for the five family members. The discriminant enters the
/// pre-hash, so two variants never produce the same tag.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Variant {
    Argon2d = 0,
    Argon2i = 1,
    Argon2di = 2,
    Argon2id = 3,
    Argon2ds = 4,
}

impl Variant {
    pub fn from_u32(n: u32) -> Result<Variant, Error> {
        match n {
            0 => Ok(Variant::Argon2d),
            1 => Ok(Variant::Argon2i),
            2 => Ok(Variant::Argon2di),
            3 => Ok(Variant::Argon2id),
            4 => Ok(Variant::Argon2ds),
            _ => Err(Error::IncorrectType),
        }
    }

    /// The lowercase tag used in encoded hashes, e.g. `"id"` in `$argon2id$`.
    pub fn code(&self) -> &'static str {
        match *self {
            Variant::Argon2d => "d",
            Variant::Argon2i => "i",
            Variant::Argon2di => "di",
            Variant::Argon2id => "id",
            Variant::Argon2ds => "ds",
        }
    }

    pub fn from_code(code: &str) -> Option<Variant> {
        match code {
            "d" => Some(Variant::Argon2d),
            "i" => Some(Variant::Argon2i),
            "di" => Some(Variant::Argon2di),
            "id" => Some(Variant::Argon2id),
            "ds" => Some(Variant::Argon2ds),
            _ => None,
        }
    }

    // Whether (j1, j2) for this position come from the counter stream
    // instead of the previous block.
    fn data_independent(&self, pass: u32, slice: u32) -> bool {
        let early = pass == 0 && slice < SLICES_PER_LANE / 2;
        match *self {
            Variant::Argon2d | Variant::Argon2ds => false,
            Variant::Argon2i => true,
            Variant::Argon2id => early,
            Variant::Argon2di => !early,
        }
    }
}

fn split_u64(n: u64) -> (u32, u32) {
    ((n & 0xffffffff) as u32, (n >> 32) as u32)
}

fn as32le(k: u32) -> [u8; 4] { k.to_le_bytes() }

fn len32(t: &[u8]) -> [u8; 4] { as32le(t.len() as u32) }

macro_rules! b2hash {
    ($($bytes: expr),*) => {
        {
            let mut out = [0u8; DEF_B2HASH_LEN];
            b2hash!(&mut out; $($bytes),*);
            out
        }
    };
    ($out: expr; $($bytes: expr),*) => {
        {
            let mut b = Blake2b::new($out.len());
            $(b.update($bytes));*;
            $out.clone_from_slice(b.finalize().as_bytes());
        }
    };
}

// The pre-hashing digest, padded with room for the (block, lane) counters
// appended while seeding the first two columns.
#[cfg_attr(rustfmt, rustfmt_skip)]
pub(crate) fn h0(lanes: u32, hash_length: u32, memory_kib: u32, passes: u32,
                 version: u32, variant: Variant,
                 p: &[u8], s: &[u8], k: &[u8], x: &[u8])
                 -> [u8; 72] {
    let mut rv = [0u8; 72];
    b2hash!(&mut rv[0..DEF_B2HASH_LEN];
            &as32le(lanes), &as32le(hash_length), &as32le(memory_kib),
            &as32le(passes), &as32le(version), &as32le(variant as u32),
            &len32(p), p,
            &len32(s), s,
            &len32(k), k,
            &len32(x), x);
    rv
}

fn h_prime(out: &mut [u8], input: &[u8]) {
    if out.len() <= DEF_B2HASH_LEN {
        b2hash!(out; &len32(out), input);
    } else {
        let mut tmp = b2hash!(&len32(out), input);
        out[0..DEF_B2HASH_LEN].clone_from_slice(&tmp);
        let mut wr_at: usize = 32;

        while out.len() - wr_at > DEF_B2HASH_LEN {
            b2hash!(&mut tmp; &tmp);
            out[wr_at..wr_at + DEF_B2HASH_LEN].clone_from_slice(&tmp);
            wr_at += DEF_B2HASH_LEN / 2;
        }

        let len = out.len() - wr_at;
        b2hash!(&mut out[wr_at..wr_at + len]; &tmp);
    }
}

// from opt.c
fn index_alpha(pass: u32, lane: u32, slice: u32, lanes: u32, sliceidx: u32,
               slicelen: u32, j1: u32, j2: u32)
               -> u32 {
    let lanelen = slicelen * 4;
    let r: u32 = match (pass, slice, j2 % lanes == lane) {
        (0, 0, _) => sliceidx - 1,
        (0, _, false) => slice * slicelen - if sliceidx == 0 { 1 } else { 0 },
        (0, _, true) => slice * slicelen + sliceidx - 1,
        (_, _, false) => lanelen - slicelen - if sliceidx == 0 { 1 } else { 0 },
        (_, _, true) => lanelen - slicelen + sliceidx - 1,
    };

    let (r_, j1_) = (r as u64, j1 as u64);
    let relpos = (r_ - 1 - (r_ * (j1_ * j1_ >> 32) >> 32)) as u32;

    match (pass, slice) {
        (0, _) | (_, 3) => relpos % lanelen,
        _ => (slicelen * (slice + 1) + relpos) % lanelen,
    }
}

// Batched counter-mode source of (j1, j2) pairs for the data-independent
// phases: one input block yields 128 draws, then the counter word advances.
struct Gen2i {
    arg: Block,
    pseudos: Block,
    idx: usize,
}

impl Gen2i {
    fn new(start_at: usize, pass: u32, lane: u32, slice: u32, totblocks: u32,
           totpasses: u32, variant: Variant)
           -> Gen2i {
        let mut rv = Gen2i { arg: zero(), pseudos: zero(), idx: start_at };
        let args = [pass as u64, lane as u64, slice as u64, totblocks as u64,
                    totpasses as u64, variant as u64];
        for (k, v) in rv.arg.iter_mut().zip(args.iter()) {
            *k = *v;
        }
        rv.more();
        rv
    }

    fn more(&mut self) {
        self.arg[6] += 1;
        g_two(&mut self.pseudos, &self.arg);
    }

    fn nextj(&mut self) -> (u32, u32) {
        let rv = split_u64(self.pseudos[self.idx]);
        self.idx = (self.idx + 1) % per_kib!(u64);
        if self.idx == 0 {
            self.more();
        }
        rv
    }
}

/// A validated set of cost parameters, ready to hash.
pub struct Argon2 {
    passes: u32,
    lanes: u32,
    lanelen: u32,
    kib: u32,
    variant: Variant,
}

impl Argon2 {
    pub fn new(passes: u32, lanes: u32, kib: u32, variant: Variant)
               -> Result<Argon2, Error> {
        if passes < 1 {
            return Err(Error::TimeTooSmall);
        }
        if passes > MAX_PASSES {
            return Err(Error::TimeTooLarge);
        }
        if lanes < MIN_LANES {
            return Err(Error::LanesTooFew);
        }
        if lanes > MAX_LANES {
            return Err(Error::LanesTooMany);
        }
        if (kib as u64) < 8 * lanes as u64 {
            return Err(Error::MemoryTooLittle);
        }
        if kib > MAX_MEMORY_KIB {
            return Err(Error::MemoryTooMuch);
        }
        Ok(Argon2 {
            passes,
            lanes,
            lanelen: kib / (4 * lanes) * 4,
            kib,
            variant,
        })
    }

    pub fn default(variant: Variant) -> Argon2 {
        Argon2::new(defaults::PASSES, defaults::LANES, defaults::KIB, variant)
            .ok()
            .unwrap()
    }

    /// (variant, m_cost, t_cost, lanes) as given at construction.
    pub fn params(&self) -> (Variant, u32, u32, u32) {
        (self.variant, self.kib, self.passes, self.lanes)
    }

    /// Block count after rounding `m_cost` down to a multiple of
    /// `4 * lanes`.
    pub fn memory_blocks(&self) -> u32 { self.lanes * self.lanelen }

    pub(crate) fn lane_length(&self) -> u32 { self.lanelen }

    /// Fills `out` with the tag for the given password, salt, secret and
    /// associated data. `out.len()` selects the tag length.
    pub fn hash(&self, out: &mut [u8], p: &[u8], s: &[u8], k: &[u8],
                x: &[u8]) {
        assert!(out.len() >= MIN_OUT_LEN);
        assert!(out.len() as u64 <= 0xffff_ffff);
        let seed = h0(self.lanes, out.len() as u32, self.kib, self.passes,
                      ARGON2_VERSION, self.variant, p, s, k, x);
        let mut blks = Matrix::new(self.lanes, self.lanelen, false);
        self.run(out, seed, &mut blks);
    }

    pub(crate) fn run(&self, out: &mut [u8], h0: [u8; 72],
                      blks: &mut Matrix) {
        let mut workers = Workers::new(self.lanes);
        workers.map(blks, &|m, lane| self.fill_first_blocks(m, &h0, lane));

        let mut sbox = match self.variant {
            Variant::Argon2ds => Some(vec![0u64; SBOX_SIZE]),
            _ => None,
        };

        for pass in 0..self.passes {
            // the multiplication chain keys off block (0, 0) as it stands
            // at the start of the pass
            if let Some(sb) = sbox.as_mut() {
                generate_sbox(&blks[(0, 0)], sb);
            }
            for slice in 0..SLICES_PER_LANE {
                let offset = if pass == 0 && slice == 0 { 2 } else { 0 };
                let sref = sbox.as_deref();
                workers.map(blks, &|m, lane| {
                    self.fill_slice(m, sref, pass, lane, slice, offset)
                });
            }
        }

        h_prime(out, blks.xor_column(self.lanelen - 1).as_u8());
    }

    fn fill_first_blocks(&self, blks: &mut Matrix, h0: &[u8; 72], lane: u32) {
        let mut seed = *h0;
        seed[68..72].copy_from_slice(&as32le(lane));

        seed[64..68].copy_from_slice(&as32le(0));
        h_prime(blks[(lane, 0)].as_u8_mut(), &seed);

        seed[64..68].copy_from_slice(&as32le(1));
        h_prime(blks[(lane, 1)].as_u8_mut(), &seed);
    }

    #[cfg_attr(rustfmt, rustfmt_skip)]
    fn fill_slice(&self, blks: &mut Matrix, sbox: Option<&[u64]>, pass: u32,
                  lane: u32, slice: u32, offset: u32) {
        let slicelen = self.lanelen / SLICES_PER_LANE;
        let mut jgen = if self.variant.data_independent(pass, slice) {
            Some(Gen2i::new(offset as usize, pass, lane, slice,
                            self.lanes * self.lanelen, self.passes,
                            self.variant))
        } else {
            None
        };

        for idx in offset..slicelen {
            let (j1, j2) = match jgen.as_mut() {
                Some(gen) => gen.nextj(),
                None => {
                    let col = self.prev(slice * slicelen + idx);
                    split_u64(blks[(lane, col)][0])
                }
            };
            self.fill_block(blks, sbox, pass, lane, slice, idx, j1, j2);
        }
    }

    fn fill_block(&self, blks: &mut Matrix, sbox: Option<&[u64]>, pass: u32,
                  lane: u32, slice: u32, idx: u32, j1: u32, j2: u32) {
        let slicelen = self.lanelen / SLICES_PER_LANE;
        let z = index_alpha(pass, lane, slice, self.lanes, idx, slicelen, j1,
                            j2);

        // no other lane has finished anything yet in the very first slice
        let zth = match (pass, slice) {
            (0, 0) => (lane, z),
            _ => (j2 % self.lanes, z),
        };

        let cur = (lane, slice * slicelen + idx);
        let pre = (lane, self.prev(cur.1));
        let (wr, prev, refblk) = blks.get3(cur, pre, zth);
        if pass == 0 {
            g(wr, prev, refblk, sbox);
        } else {
            let mut fresh = zero();
            g(&mut fresh, prev, refblk, sbox);
            *wr ^= &fresh;
        }
    }

    fn prev(&self, n: u32) -> u32 {
        if n > 0 { n - 1 } else { self.lanelen - 1 }
    }
}

/// Data-dependent addressing throughout; the fastest variant, but leaks an
/// access pattern derived from the password.
pub fn argon2d(ctx: &mut Context<'_>) -> Result<(), Error> {
    context::hash(ctx, Variant::Argon2d)
}

/// Data-independent addressing throughout.
pub fn argon2i(ctx: &mut Context<'_>) -> Result<(), Error> {
    context::hash(ctx, Variant::Argon2i)
}

/// Data-dependent first half-pass, data-independent from there on.
pub fn argon2di(ctx: &mut Context<'_>) -> Result<(), Error> {
    context::hash(ctx, Variant::Argon2di)
}

/// Data-independent first half-pass, data-dependent from there on.
pub fn argon2id(ctx: &mut Context<'_>) -> Result<(), Error> {
    context::hash(ctx, Variant::Argon2id)
}

/// Argon2d plus the S-box multiplication chain inside the compression
/// function.
pub fn argon2ds(ctx: &mut Context<'_>) -> Result<(), Error> {
    context::hash(ctx, Variant::Argon2ds)
}

/// The PHS-shaped convenience entry: one lane, Argon2d, password and secret
/// wiped after pre-hashing, memory kept.
pub fn phs(out: &mut [u8], pwd: &mut [u8], salt: &[u8], t_cost: u32,
           m_cost: u32)
           -> Result<(), Error> {
    let mut ctx = Context::new(out, Some(pwd), salt);
    ctx.t_cost = t_cost;
    ctx.m_cost = m_cost;
    ctx.lanes = 1;
    ctx.clear_password = true;
    ctx.clear_secret = true;
    argon2d(&mut ctx)
}

/// Convenience wrapper around Argon2i for the majority of password/salt
/// hashing use cases.
pub fn argon2i_simple(password: &str, salt: &str) -> [u8; defaults::LENGTH] {
    let mut out = [0; defaults::LENGTH];
    let a2 = Argon2::default(Variant::Argon2i);
    a2.hash(&mut out, password.as_bytes(), salt.as_bytes(), &[], &[]);
    out
}

/// Convenience wrapper around Argon2d for the majority of password/salt
/// hashing use cases.
pub fn argon2d_simple(password: &str, salt: &str) -> [u8; defaults::LENGTH] {
    let mut out = [0; defaults::LENGTH];
    let a2 = Argon2::default(Variant::Argon2d);
    a2.hash(&mut out, password.as_bytes(), salt.as_bytes(), &[], &[]);
    out
}
