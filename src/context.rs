use crate::block::Matrix;
use crate::error::Error;
use crate::{defaults, h0, Argon2, Variant, ARGON2_VERSION, MAX_LANES,
            MAX_MEMORY_KIB, MAX_PASSES, MIN_LANES, MIN_OUT_LEN, MIN_SALT_LEN};

/// Hands back a buffer of `byte_length` bytes, aligned for 64-bit words.
pub type AllocateFn = fn(byte_length: usize) -> Result<*mut u8, Error>;

/// Releases a buffer produced by the paired [`AllocateFn`]; `byte_length`
/// is the length that was requested.
pub type FreeFn = fn(memory: *mut u8, byte_length: usize);

/// Everything one hashing run needs: buffers, cost parameters, wipe flags,
/// and the optional allocator pair. Password and secret are held mutably so
/// their wipe flags can zeroize them the moment the pre-hash has consumed
/// them.
pub struct Context<'a> {
    pub out: &'a mut [u8],
    pub pwd: Option<&'a mut [u8]>,
    pub salt: &'a [u8],
    pub secret: Option<&'a mut [u8]>,
    pub ad: &'a [u8],
    pub t_cost: u32,
    pub m_cost: u32,
    pub lanes: u32,
    pub clear_password: bool,
    pub clear_secret: bool,
    pub clear_memory: bool,
    pub allocate_cbk: Option<AllocateFn>,
    pub free_cbk: Option<FreeFn>,
}

impl<'a> Context<'a> {
    /// A context with the default cost parameters, no secret, no associated
    /// data, and nothing wiped.
    pub fn new(out: &'a mut [u8], pwd: Option<&'a mut [u8]>, salt: &'a [u8])
               -> Context<'a> {
        Context {
            out,
            pwd,
            salt,
            secret: None,
            ad: &[],
            t_cost: defaults::PASSES,
            m_cost: defaults::KIB,
            lanes: defaults::LANES,
            clear_password: false,
            clear_secret: false,
            clear_memory: false,
            allocate_cbk: None,
            free_cbk: None,
        }
    }
}

const MAX_FIELD_LEN: u64 = 0xffff_ffff;

pub(crate) fn validate(ctx: &Context<'_>) -> Result<(), Error> {
    if ctx.out.len() < MIN_OUT_LEN {
        return Err(Error::OutputTooShort);
    }
    if ctx.out.len() as u64 > MAX_FIELD_LEN {
        return Err(Error::OutputTooLong);
    }
    if let Some(ref pwd) = ctx.pwd {
        if pwd.len() as u64 > MAX_FIELD_LEN {
            return Err(Error::PwdTooLong);
        }
    }
    if ctx.salt.len() < MIN_SALT_LEN {
        return Err(Error::SaltTooShort);
    }
    if ctx.salt.len() as u64 > MAX_FIELD_LEN {
        return Err(Error::SaltTooLong);
    }
    if let Some(ref secret) = ctx.secret {
        if secret.len() as u64 > MAX_FIELD_LEN {
            return Err(Error::SecretTooLong);
        }
    }
    if ctx.ad.len() as u64 > MAX_FIELD_LEN {
        return Err(Error::AdTooLong);
    }
    if ctx.t_cost < 1 {
        return Err(Error::TimeTooSmall);
    }
    if ctx.t_cost > MAX_PASSES {
        return Err(Error::TimeTooLarge);
    }
    if ctx.lanes < MIN_LANES {
        return Err(Error::LanesTooFew);
    }
    if ctx.lanes > MAX_LANES {
        return Err(Error::LanesTooMany);
    }
    if (ctx.m_cost as u64) < 8 * ctx.lanes as u64 {
        return Err(Error::MemoryTooLittle);
    }
    if ctx.m_cost > MAX_MEMORY_KIB {
        return Err(Error::MemoryTooMuch);
    }
    match (ctx.allocate_cbk, ctx.free_cbk) {
        (Some(_), None) => Err(Error::FreeMemoryCbkNull),
        (None, Some(_)) => Err(Error::AllocateMemoryCbkNull),
        _ => Ok(()),
    }
}

// Validation, pre-hash, wipe, fill, tag. The matrix is released on every
// exit path; `clear_memory` zeroizes it first.
pub(crate) fn hash(ctx: &mut Context<'_>, variant: Variant)
                   -> Result<(), Error> {
    validate(ctx)?;
    let a2 = Argon2::new(ctx.t_cost, ctx.lanes, ctx.m_cost, variant)?;

    let seed = h0(ctx.lanes,
                  ctx.out.len() as u32,
                  ctx.m_cost,
                  ctx.t_cost,
                  ARGON2_VERSION,
                  variant,
                  ctx.pwd.as_deref().unwrap_or(&[]),
                  ctx.salt,
                  ctx.secret.as_deref().unwrap_or(&[]),
                  ctx.ad);

    if ctx.clear_password {
        if let Some(pwd) = ctx.pwd.as_mut() {
            for b in pwd.iter_mut() {
                *b = 0;
            }
        }
    }
    if ctx.clear_secret {
        if let Some(secret) = ctx.secret.as_mut() {
            for b in secret.iter_mut() {
                *b = 0;
            }
        }
    }

    let mut blks = match (ctx.allocate_cbk, ctx.free_cbk) {
        (Some(allocate), Some(free)) => {
            Matrix::with_allocator(ctx.lanes, a2.lane_length(),
                                   ctx.clear_memory, allocate, free)?
        }
        _ => Matrix::new(ctx.lanes, a2.lane_length(), ctx.clear_memory),
    };
    a2.run(ctx.out, seed, &mut blks);
    Ok(())
}
