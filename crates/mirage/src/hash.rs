//! CPython-compatible hash helpers.
//!
//! Hashing forwards to the wrapped value's own hash, so the value model uses
//! deterministic hashing equivalent to CPython under `PYTHONHASHSEED=0`:
//! strings hash with SipHash-1-3 and a zeroed key, and numeric types hash
//! with the Mersenne-prime modular algorithm from `Objects/longobject.c` and
//! `Objects/floatobject.c`.
//!
//! The cross-type invariant matters for dict keys: since `0 == 0.0 == False`
//! and `1 == 1.0 == True`, int, float, and bool must hash identically for
//! equal values, which the shared modular algorithm guarantees.

/// Mersenne prime used by CPython for numeric hashing: `2^61 - 1`.
const MODULUS: i64 = (1 << 61) - 1;

/// Hash of `None`, a fixed constant as in CPython 3.12+.
pub(crate) const NONE_HASH: u64 = 0xFCA8_6420;

/// Hashes UTF-8 string content with CPython's deterministic seed-0 algorithm.
///
/// Applies CPython's two conventions: empty input hashes to `0`, and a
/// computed hash of `-1` is remapped to `-2` (CPython reserves `-1` as an
/// internal error sentinel in C).
#[must_use]
pub(crate) fn str_hash(value: &str) -> u64 {
    let bytes = value.as_bytes();
    if bytes.is_empty() {
        return 0;
    }
    let signed = i64::from_ne_bytes(siphash13_seed0(bytes).to_ne_bytes());
    let adjusted = if signed == -1 { -2 } else { signed };
    u64::from_ne_bytes(adjusted.to_ne_bytes())
}

/// Hashes a signed 64-bit integer using CPython's modular algorithm.
///
/// The algorithm is `n % MODULUS` (sign-preserving), with a result of `-1`
/// remapped to `-2`. This matches `long_hash` in `Objects/longobject.c`.
#[must_use]
pub(crate) fn int_hash(value: i64) -> u64 {
    u64::from_ne_bytes(int_hash_signed(value).to_ne_bytes())
}

fn int_hash_signed(value: i64) -> i64 {
    if value == 0 {
        return 0;
    }
    let sign: i64 = if value < 0 { -1 } else { 1 };
    // i64::MIN's absolute value overflows i64, so widen before taking it.
    let abs = i128::from(value).unsigned_abs() as u64;
    let result = sign * ((abs % (MODULUS as u64)) as i64);
    if result == -1 { -2 } else { result }
}

/// Hashes an `f64` using CPython's float hashing algorithm.
///
/// Integral floats delegate to [`int_hash`] so that `hash(n) == hash(float(n))`
/// holds; non-integral floats use the `frexp`-based decomposition from
/// `_Py_HashDouble` in `Python/pyhash.c`. Infinities hash to `±314159` and
/// NaN hashes to `0` as in CPython 3.10+.
#[must_use]
pub(crate) fn float_hash(value: f64) -> u64 {
    u64::from_ne_bytes(float_hash_signed(value).to_ne_bytes())
}

fn float_hash_signed(value: f64) -> i64 {
    if value.is_infinite() {
        return if value > 0.0 { 314_159 } else { -314_159 };
    }
    if value.is_nan() {
        return 0;
    }

    // Exact integer values take the integer path for cross-type consistency.
    let truncated = value.trunc();
    if value == truncated && truncated >= i64::MIN as f64 && truncated <= i64::MAX as f64 {
        return int_hash_signed(truncated as i64);
    }

    let (mut m, mut e) = frexp(value);
    let sign: i64 = if m < 0.0 {
        m = -m;
        -1
    } else {
        1
    };

    // Process the mantissa bits in 28-bit chunks, accumulating modulo 2^61 - 1.
    let mut x: u64 = 0;
    while m > 0.0 {
        x = ((x << 28) & (MODULUS as u64)) | (x >> 33);
        m *= 268_435_456.0; // 2^28
        e -= 28;
        let w = m as u64;
        m -= w as f64;
        x = x.wrapping_add(w);
        if x >= MODULUS as u64 {
            x -= MODULUS as u64;
        }
    }

    // Fold the exponent back in.
    e %= 61;
    if e < 0 {
        e += 61;
    }
    x = ((x << e as u32) & (MODULUS as u64)) | (x >> (61 - e) as u32);

    let result = (sign * (x as i64)) % MODULUS;
    if result == -1 { -2 } else { result }
}

/// Hashes a heap address the way `_Py_HashPointer` does: rotate right by four
/// bits so that allocator alignment does not waste the low bits.
#[must_use]
pub(crate) fn pointer_hash(ptr: usize) -> u64 {
    let rotated = ((ptr as u64) >> 4) | ((ptr as u64) << 60);
    let signed = i64::from_ne_bytes(rotated.to_ne_bytes());
    let adjusted = if signed == -1 { -2 } else { signed };
    u64::from_ne_bytes(adjusted.to_ne_bytes())
}

/// Returns `(frac, exp)` such that `value == frac * 2^exp` with `0.5 <= |frac| < 1.0`.
///
/// Equivalent to C's `frexp()` and Python's `math.frexp()`.
fn frexp(value: f64) -> (f64, i32) {
    if value == 0.0 || value.is_nan() || value.is_infinite() {
        return (value, 0);
    }
    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32;
    if exponent == 0 {
        // Subnormal: normalize by scaling up, then adjust the exponent back.
        let normalized = value * (1u64 << 63) as f64 * 2.0;
        let (frac, exp) = frexp(normalized);
        return (frac, exp - 64);
    }
    // Replace the exponent bits with the bias minus one, giving 0.5 <= |frac| < 1.0.
    let frac_bits = (bits & 0x800F_FFFF_FFFF_FFFF) | 0x3FE0_0000_0000_0000;
    (f64::from_bits(frac_bits), exponent - 1022)
}

/// Computes SipHash-1-3 with a zero key, matching CPython's seed-0 parameters.
#[must_use]
fn siphash13_seed0(bytes: &[u8]) -> u64 {
    let mut v0: u64 = 0x736f_6d65_7073_6575;
    let mut v1: u64 = 0x646f_7261_6e64_6f6d;
    let mut v2: u64 = 0x6c79_6765_6e65_7261;
    let mut v3: u64 = 0x7465_6462_7974_6573;

    let mut chunks = bytes.chunks_exact(8);
    for chunk in &mut chunks {
        let mut block = [0_u8; 8];
        block.copy_from_slice(chunk);
        let message = u64::from_le_bytes(block);
        v3 ^= message;
        sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
        v0 ^= message;
    }

    let mut tail = (bytes.len() as u64) << 56;
    for (index, byte) in chunks.remainder().iter().copied().enumerate() {
        tail |= u64::from(byte) << (index * 8);
    }

    v3 ^= tail;
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    v0 ^= tail;

    v2 ^= 0xff;
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);

    v0 ^ v1 ^ v2 ^ v3
}

fn sip_round(v0: &mut u64, v1: &mut u64, v2: &mut u64, v3: &mut u64) {
    *v0 = v0.wrapping_add(*v1);
    *v1 = v1.rotate_left(13);
    *v1 ^= *v0;
    *v0 = v0.rotate_left(32);
    *v2 = v2.wrapping_add(*v3);
    *v3 = v3.rotate_left(16);
    *v3 ^= *v2;
    *v0 = v0.wrapping_add(*v3);
    *v3 = v3.rotate_left(21);
    *v3 ^= *v0;
    *v2 = v2.wrapping_add(*v1);
    *v1 = v1.rotate_left(17);
    *v1 ^= *v2;
    *v2 = v2.rotate_left(32);
}
