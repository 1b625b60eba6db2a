//! Two-pass bytecode synthesis.
//!
//! The first pass plans the reconstruction and, as a side effect, counts
//! every integer the plan will push. The second pass starts from a clean
//! emitter, seeds the stack with the most frequently used constants, and
//! replays the plan: with the seeds in `DUP` reach, many planned pushes
//! collapse to a single byte. Replaying the same plan with the same seeds
//! is deterministic.

use crate::{
    asm::Assembler,
    plan::{Planner, Step},
};
use revm_primitives::U256;

/// Fixed tail of every synthesised contract:
/// `CALLVALUE PUSH0 CALLDATALOAD GAS CALL RETURNDATASIZE PUSH0 PUSH0
/// RETURNDATACOPY RETURNDATASIZE PUSH0 RETURN`.
///
/// With the call arguments already on the stack it forwards the rebuilt
/// calldata to the address carried in the rewritten 32-byte calldata, then
/// returns whatever the target returned.
pub const CALL_TRAILER: [u8; 12] =
    [0x34, 0x5f, 0x35, 0x5a, 0xf1, 0x3d, 0x5f, 0x5f, 0x3e, 0x3d, 0x5f, 0xf3];

/// Stack slots reserved for seeded constants. The EVM can `DUP` 16 deep;
/// keeping one slot short of that leaves room for live operands.
const SEED_MAX: usize = 15;

/// Constants that never earn a seed slot: zero and one are single-byte
/// pushes, 32 and 0xe0 are answered by `CALLDATASIZE` and `ADDRESS`.
const RESERVED: [u64; 4] = [0, 1, 32, 0xe0];

/// Synthesises a contract that rebuilds `data` in memory, forwards it to
/// the target address read from calldata, and returns the call's output.
#[instrument(level = "debug", skip_all, fields(len = data.len()))]
pub fn synthesize(data: &[u8]) -> Vec<u8> {
    let mut asm = Assembler::new();
    let plan = Planner::plan(data, &mut asm);
    let seeds = seed_values(&asm);
    debug!(steps = plan.len(), seeds = seeds.len(), "replaying plan");

    let mut asm = asm.into_replay();
    let one = U256::from(1u64);
    asm.push_int(one);
    for &v in &seeds {
        asm.push_int(v);
    }
    asm.push_int(one);
    asm.seal_seeds();

    for step in &plan {
        match step {
            Step::Num(v) => asm.push_int(*v),
            Step::Bytes(b) => asm.push_bytes(b),
            Step::Op(o) => asm.op(*o),
        }
    }

    let mut code = asm.finish();
    code.extend_from_slice(&CALL_TRAILER);
    code
}

/// Values worth holding on the stack for the whole replay: pushed more than
/// once, not already one byte by other means, and narrow enough to fit a
/// 16-byte push. Most-recently-first-seen values go deepest, so the
/// earliest-needed seeds end up closest to the top.
fn seed_values(asm: &Assembler) -> Vec<U256> {
    let mut picks: Vec<(U256, u32)> = asm
        .counted()
        .filter(|&(_, n, _)| n > 1)
        .filter(|&(v, ..)| !RESERVED.iter().any(|&r| v == U256::from(r)))
        .filter(|&(v, ..)| v.bit_len() <= 128)
        .map(|(v, _, seen)| (v, seen))
        .collect();
    picks.sort_by(|a, b| b.1.cmp(&a.1));
    picks.truncate(SEED_MAX);
    picks.into_iter().map(|(v, _)| v).collect()
}
