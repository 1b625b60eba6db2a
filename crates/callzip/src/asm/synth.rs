//! Multi-op encodings for constants that are expensive as plain literals.
//!
//! A 256-bit value whose complement, negation, sign-extension seed or
//! shifted complement is short can be rebuilt from that short literal plus
//! one or two opcodes for fewer bytes than the full `PUSH`.

use revm_primitives::U256;

/// A constant encoding that beats the plain minimal-width `PUSH`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ConstSynth {
    /// `PUSHk(inner); NOT` where `inner = !v`.
    Not(U256),
    /// `PUSHk(neg); PUSH0; SUB` where `neg = 0 - v`. `SUB` sees the zero on
    /// top and computes `0 - neg = v`.
    Sub(U256),
    /// `PUSHk(value); PUSH1(ext); SIGNEXTEND`.
    SignExtend { value: U256, ext: u8 },
    /// `PUSHk(value); PUSH1(shift); SHL; NOT`.
    ShlNot { value: U256, shift: u8 },
}

/// Number of significant big-endian bytes of `v`.
pub(crate) fn byte_len(v: U256) -> usize {
    v.bit_len().div_ceil(8)
}

/// `SIGNEXTEND` as the EVM computes it: `b` indexes the byte holding the
/// sign; values of `b` past the word width leave `x` untouched.
pub(crate) fn signextend(b: U256, x: U256) -> U256 {
    if b >= U256::from(31u64) {
        return x;
    }
    let sign_bit = 8 * (b.to::<usize>() + 1) - 1;
    let high = U256::MAX << (sign_bit + 1);
    if x.bit(sign_bit) {
        x | high
    } else {
        x & !high
    }
}

/// The cheapest multi-op encoding of `v`, if one is strictly shorter than
/// the plain literal. Ties between encodings go to the one listed first.
pub(crate) fn best_synth(v: U256) -> Option<ConstSynth> {
    best(v).map(|(_, s)| s)
}

/// Byte cost of the winning encoding from [`best_synth`].
pub(crate) fn synth_cost(v: U256) -> Option<u32> {
    best(v).map(|(c, _)| c)
}

fn best(v: U256) -> Option<(u32, ConstSynth)> {
    let plain = 1 + byte_len(v) as u32;
    if plain <= 2 {
        return None;
    }
    let mut winner: Option<(u32, ConstSynth)> = None;
    let mut consider = |cost: u32, synth: ConstSynth| {
        if cost < plain && winner.map_or(true, |(best, _)| cost < best) {
            winner = Some((cost, synth));
        }
    };

    let inner = !v;
    consider(2 + byte_len(inner) as u32, ConstSynth::Not(inner));

    let neg = U256::ZERO.wrapping_sub(v);
    consider(3 + byte_len(neg) as u32, ConstSynth::Sub(neg));

    if let Some((m, trunc)) = signextend_seed(v) {
        consider(4 + m as u32, ConstSynth::SignExtend { value: trunc, ext: m - 1 });
    }

    if let Some((shift, rest)) = shl_not_seed(v) {
        consider(5 + byte_len(rest) as u32, ConstSynth::ShlNot { value: rest, shift });
    }

    winner
}

/// Smallest byte width `m` whose low `m` bytes of `v` sign-extend back to
/// `v` exactly, together with those bytes.
fn signextend_seed(v: U256) -> Option<(u8, U256)> {
    for m in 1u8..32 {
        let mask = U256::MAX >> (256 - 8 * m as usize);
        let trunc = v & mask;
        if signextend(U256::from(m - 1), trunc) == v {
            return Some((m, trunc));
        }
    }
    None
}

/// Widest shift `s` (multiples of 8 up to 248) for which
/// `!((!v >> s) << s) == v`, i.e. the low `s` bits of `v` are all ones.
/// Scanning wide-first keeps the seed literal minimal.
fn shl_not_seed(v: U256) -> Option<(u8, U256)> {
    let inner = !v;
    for s in (8u16..=248).step_by(8).rev() {
        let rest = inner >> s as usize;
        if !(rest << s as usize) == v {
            return Some((s as u8, rest));
        }
    }
    None
}
