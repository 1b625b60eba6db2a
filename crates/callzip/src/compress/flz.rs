//! FastLZ level-one compression.
//!
//! LZ77 over a 13-bit window: literal runs of up to 32 bytes, matches of
//! 3..=264 bytes at distances up to 8192. Control bytes carry a 3-bit kind
//! in the high bits: 0 for a literal run, 1..=6 for a short match, 7 for a
//! long match with an extra length byte.

use eyre::ensure;

const HASH_LOG: u32 = 13;
const HASH_SIZE: usize = 1 << HASH_LOG;
const MAX_DISTANCE: usize = 8192;
const MAX_LITERAL: usize = 32;
const MAX_MATCH: usize = 264;

/// Compresses `input`. The output always starts with a literal run, so an
/// empty input yields an empty output.
pub fn flz_compress(input: &[u8]) -> Vec<u8> {
    let n = input.len();
    let mut out = Vec::with_capacity(n / 2 + 16);
    if n < 16 {
        emit_literals(&mut out, input);
        return out;
    }

    let mut htab = vec![0u32; HASH_SIZE];
    // Leave a literal tail so the three-byte reads below stay in bounds.
    let limit = n - 12;
    let mut anchor = 0;
    let mut ip = 2;

    while ip < limit {
        let seq = read_u24(input, ip);
        let h = hash(seq);
        let r = htab[h] as usize;
        htab[h] = ip as u32;
        let distance = ip - r;
        if distance == 0 || distance > MAX_DISTANCE || read_u24(input, r) != seq {
            ip += 1;
            continue;
        }

        if ip > anchor {
            emit_literals(&mut out, &input[anchor..ip]);
        }
        let mut len = 3;
        while ip + len < n && input[r + len] == input[ip + len] {
            len += 1;
        }
        emit_match(&mut out, len, distance);
        ip += len;
        if ip < limit {
            // The match skipped positions; refresh the table for the two
            // just behind the new cursor.
            htab[hash(read_u24(input, ip - 2))] = (ip - 2) as u32;
            htab[hash(read_u24(input, ip - 1))] = (ip - 1) as u32;
        }
        anchor = ip;
    }
    emit_literals(&mut out, &input[anchor..]);
    out
}

/// Decompresses a [`flz_compress`] stream.
pub fn flz_decompress(input: &[u8]) -> crate::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() * 2);
    let mut i = 0;
    while i < input.len() {
        let ctrl = input[i];
        i += 1;
        let kind = ctrl >> 5;
        if kind == 0 {
            let len = (ctrl & 31) as usize + 1;
            ensure!(i + len <= input.len(), "literal run past end of input");
            out.extend_from_slice(&input[i..i + len]);
            i += len;
        } else {
            let (len, lo_at) = if kind == 7 {
                ensure!(i + 1 < input.len(), "long match truncated");
                let len = input[i] as usize + 9;
                i += 2;
                (len, i - 1)
            } else {
                ensure!(i < input.len(), "match truncated");
                i += 1;
                (kind as usize + 2, i - 1)
            };
            let distance = (((ctrl & 31) as usize) << 8 | input[lo_at] as usize) + 1;
            ensure!(distance <= out.len(), "match reaches before output start");
            let start = out.len() - distance;
            // Byte-at-a-time: matches may overlap their own output.
            for k in 0..len {
                let b = out[start + k];
                out.push(b);
            }
        }
    }
    Ok(out)
}

#[inline]
fn hash(seq: u32) -> usize {
    ((seq.wrapping_mul(2654435769) >> (32 - HASH_LOG)) & (HASH_SIZE as u32 - 1)) as usize
}

#[inline]
fn read_u24(b: &[u8], i: usize) -> u32 {
    b[i] as u32 | (b[i + 1] as u32) << 8 | (b[i + 2] as u32) << 16
}

fn emit_literals(out: &mut Vec<u8>, mut run: &[u8]) {
    while !run.is_empty() {
        let take = run.len().min(MAX_LITERAL);
        out.push(take as u8 - 1);
        out.extend_from_slice(&run[..take]);
        run = &run[take..];
    }
}

fn emit_match(out: &mut Vec<u8>, mut len: usize, distance: usize) {
    let d = distance - 1;
    while len > MAX_MATCH {
        // Keep the final chunk at three bytes or more.
        let take = if len - MAX_MATCH >= 3 { MAX_MATCH } else { MAX_MATCH - 2 };
        emit_one(out, take, d);
        len -= take;
    }
    emit_one(out, len, d);
}

fn emit_one(out: &mut Vec<u8>, len: usize, d: usize) {
    debug_assert!((3..=MAX_MATCH).contains(&len));
    if len <= 8 {
        out.push((((len - 2) << 5) | (d >> 8)) as u8);
        out.push((d & 0xff) as u8);
    } else {
        out.push((7 << 5 | (d >> 8)) as u8);
        out.push((len - 9) as u8);
        out.push((d & 0xff) as u8);
    }
}
