//! Calldata run-length encoding.
//!
//! ABI-encoded calldata is dominated by runs of `0x00` (padding) and, to a
//! lesser degree, `0xff` (sign-extended negatives and max values). Both are
//! folded behind a `0x00` marker byte: a control under `0x80` stands for
//! `control + 1` zero bytes (up to 128), a control of `0x80..=0x9f` stands
//! for `control - 0x7f` bytes of `0xff` (up to 32). Every other byte is
//! itself.
//!
//! The first four bytes of the stream (the selector) are complemented on
//! both sides so a selector with leading zero bytes cannot collide with the
//! marker.

use eyre::ensure;

const MAX_ZERO_RUN: usize = 128;
const MAX_ONES_RUN: usize = 32;

/// Compresses `input`.
pub fn cd_compress(input: &[u8]) -> Vec<u8> {
    let at = |i: usize| if i < 4 { !input[i] } else { input[i] };
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        let b = at(i);
        if b == 0x00 {
            let mut n = 1;
            while n < MAX_ZERO_RUN && i + n < input.len() && at(i + n) == 0x00 {
                n += 1;
            }
            out.push(0x00);
            out.push(n as u8 - 1);
            i += n;
        } else if b == 0xff {
            let mut n = 1;
            while n < MAX_ONES_RUN && i + n < input.len() && at(i + n) == 0xff {
                n += 1;
            }
            out.push(0x00);
            out.push(0x7f + n as u8);
            i += n;
        } else {
            out.push(b);
            i += 1;
        }
    }
    out
}

/// Decompresses a [`cd_compress`] stream.
pub fn cd_decompress(input: &[u8]) -> crate::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() * 4);
    let mut i = 0;
    while i < input.len() {
        let b = input[i];
        i += 1;
        if b == 0x00 {
            ensure!(i < input.len(), "marker at end of input");
            let control = input[i];
            i += 1;
            if control < 0x80 {
                out.resize(out.len() + control as usize + 1, 0x00);
            } else {
                out.resize(out.len() + (control - 0x7f) as usize, 0xff);
            }
        } else {
            out.push(b);
        }
    }
    for b in out.iter_mut().take(4) {
        *b = !*b;
    }
    Ok(out)
}
