//! First pass: turning padded calldata into a replayable plan.
//!
//! The planner walks the input 32 bytes at a time and decides, per word,
//! the cheapest way to rebuild it in memory under a bytes-emitted cost
//! model. The outcome is a [`Plan`]: a flat list of push and opcode steps
//! with no emitter state attached, so the second pass can replay it against
//! a differently seeded stack.

use crate::asm::{byte_len, synth_cost, Assembler};
use revm_interpreter::opcode as op;
use revm_primitives::{B256, U256};
use rustc_hash::FxHashMap;

/// Zero bytes prepended to the calldata so the 4-byte selector sits
/// right-aligned in the first word and every later ABI word lands on a
/// 32-byte boundary.
pub(crate) const PAD: usize = 28;

/// One step of the plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Push the integer through the emitter's full rewrite pipeline.
    Num(U256),
    /// Push the byte run verbatim at its recorded width.
    Bytes(Vec<u8>),
    /// Emit the opcode.
    Op(u8),
}

/// The plan recorded by the first pass. Replaying it through an
/// [`Assembler`] rebuilds the calldata image in memory and leaves the call
/// arguments on the stack, ready for the call trailer.
pub type Plan = Vec<Step>;

/// Word construction strategies, in tie-breaking order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Strategy {
    /// Single `PUSH` of the tail from the first non-zero byte.
    Literal,
    /// `MLOAD` the word from the offset where it was first written.
    Reuse,
    /// Push each segment, shift it into place, `OR` the pieces together.
    ShlOr,
    /// One `MSTORE8` per byte; only for words of isolated single bytes.
    Mstore8,
    /// Rebuild the whole word value through a constant synthesis.
    Peephole,
}

pub(crate) struct Planner<'a> {
    asm: &'a mut Assembler,
    plan: Plan,
    /// Offset at which each distinct word was first materialised.
    first_base: FxHashMap<B256, u64>,
    /// Estimated per-use cost of reloading a word, or `None` once reloading
    /// is known to never pay off for it.
    reuse_cost: FxHashMap<B256, Option<u32>>,
}

impl<'a> Planner<'a> {
    /// Plans the reconstruction of `data`, feeding every step through `asm`
    /// so its push counters reflect the recorded plan.
    pub(crate) fn plan(data: &[u8], asm: &'a mut Assembler) -> Plan {
        let mut buf = vec![0u8; PAD];
        buf.extend_from_slice(data);
        buf.resize(buf.len().next_multiple_of(32), 0);

        let mut planner = Planner {
            asm,
            plan: Vec::new(),
            first_base: FxHashMap::default(),
            reuse_cost: FxHashMap::default(),
        };
        for base in (0..buf.len()).step_by(32) {
            planner.word(&buf[base..base + 32], base as u64);
        }

        // Call arguments for the trailer: retSize, retOffset, argsSize,
        // argsOffset. The 28 padding bytes are skipped at call time.
        planner.step(Step::Num(U256::ZERO));
        planner.step(Step::Num(U256::ZERO));
        planner.step(Step::Num(U256::from(data.len())));
        planner.step(Step::Num(U256::from(PAD)));

        debug!(words = buf.len() / 32, steps = planner.plan.len(), "planned");
        planner.plan
    }

    fn step(&mut self, s: Step) {
        match &s {
            Step::Num(v) => self.asm.push_int(*v),
            Step::Bytes(b) => self.asm.push_bytes(b),
            Step::Op(o) => self.asm.op(*o),
        }
        self.plan.push(s);
    }

    fn word(&mut self, word: &[u8], base: u64) {
        let segs = segments(word);
        // An all-zero word is already there: fresh memory reads as zero.
        let Some(&(s0, _)) = segs.first() else { return };

        let key = B256::from_slice(word);
        let value = U256::from_be_slice(word);
        let reuse = match (self.first_base.get(&key), self.reuse_cost.get(&key)) {
            (Some(&first), Some(&Some(cost))) => Some((cost, first)),
            _ => None,
        };
        let candidates = candidates(word, &segs, reuse.map(|(c, _)| c));
        let (strategy, cost) = choose(&candidates);
        trace!(base, ?strategy, cost, "word");

        match strategy {
            Strategy::Literal => self.step(Step::Bytes(word[s0..].to_vec())),
            Strategy::Reuse => {
                let (_, first) = reuse.unwrap();
                self.step(Step::Num(U256::from(first)));
                self.step(Step::Op(op::MLOAD));
            }
            Strategy::ShlOr => {
                for (i, &(s, e)) in segs.iter().enumerate() {
                    self.step(Step::Bytes(word[s..=e].to_vec()));
                    if e < 31 {
                        self.step(Step::Num(U256::from(8 * (31 - e))));
                        self.step(Step::Op(op::SHL));
                    }
                    if i > 0 {
                        self.step(Step::Op(op::OR));
                    }
                }
            }
            Strategy::Mstore8 => {
                for &(s, _) in &segs {
                    self.step(Step::Num(U256::from(word[s])));
                    self.step(Step::Num(U256::from(base + s as u64)));
                    self.step(Step::Op(op::MSTORE8));
                }
            }
            Strategy::Peephole => self.step(Step::Num(value)),
        }
        if strategy != Strategy::Mstore8 {
            self.step(Step::Num(U256::from(base)));
            self.step(Step::Op(op::MSTORE));
        }

        // First sighting: remember where the word lives, and whether
        // loading it back can ever beat re-emitting it.
        if !self.first_base.contains_key(&key) {
            self.first_base.insert(key, base);
            let literal = literal_cost(s0);
            let entry = if literal > 8 {
                let per_use = byte_len(U256::from(base)) as u32 + 3;
                (per_use < literal).then_some(per_use)
            } else {
                None
            };
            self.reuse_cost.insert(key, entry);
        }
    }
}

/// Maximal runs of non-zero bytes, as inclusive `(start, end)` pairs.
pub(crate) fn segments(word: &[u8]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < word.len() {
        if word[i] != 0 {
            let s = i;
            while i < word.len() && word[i] != 0 {
                i += 1;
            }
            out.push((s, i - 1));
        } else {
            i += 1;
        }
    }
    out
}

fn literal_cost(s0: usize) -> u32 {
    1 + (32 - s0) as u32
}

/// Byte costs of every applicable strategy for one word, in tie order.
pub(crate) fn candidates(
    word: &[u8],
    segs: &[(usize, usize)],
    reuse: Option<u32>,
) -> Vec<(Strategy, u32)> {
    let s0 = segs[0].0;
    let mut out = vec![(Strategy::Literal, literal_cost(s0))];
    if let Some(cost) = reuse {
        out.push((Strategy::Reuse, cost));
    }
    let shlor = segs
        .iter()
        .enumerate()
        .map(|(i, &(s, e))| {
            (1 + (e - s + 1) as u32) + if e < 31 { 3 } else { 0 } + (i > 0) as u32
        })
        .sum();
    out.push((Strategy::ShlOr, shlor));
    if segs.iter().all(|&(s, e)| s == e) {
        out.push((Strategy::Mstore8, 3 * segs.len() as u32));
    }
    if let Some(cost) = synth_cost(U256::from_be_slice(word)) {
        out.push((Strategy::Peephole, cost));
    }
    out
}

/// Picks the cheapest candidate; the list is already in tie order, so a
/// strict comparison resolves ties toward the earlier strategy.
pub(crate) fn choose(candidates: &[(Strategy, u32)]) -> (Strategy, u32) {
    let mut best = candidates[0];
    for &c in &candidates[1..] {
        if c.1 < best.1 {
            best = c;
        }
    }
    best
}
