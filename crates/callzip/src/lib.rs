#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_extern_crates))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

use revm_primitives::{address, Address};

mod asm;
pub use asm::{AsmOp, Assembler};

mod fmt;
pub use fmt::{format_bytecode, format_bytecode_to, Opcode, OpcodesIter};

mod plan;
pub use plan::{Plan, Step};

mod compiler;
pub use compiler::{synthesize, CALL_TRAILER};

pub mod compress;

mod rewrite;
pub use rewrite::{compress_call, Algorithm};

#[doc(no_inline)]
pub use eyre;
#[doc(no_inline)]
pub use revm_primitives::{self as primitives, U256};

/// Result type used by fallible helpers.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type used by fallible helpers.
pub type Error = eyre::Error;

/// The address at which the synthesised contract is installed via state
/// override. Its last byte is `0xe0` so it can be rebuilt from `ADDRESS`.
pub const DECOMPRESSOR_ADDRESS: Address = address!("00000000000000000000000000000000000000e0");

/// The only pre-existing state-override key a payload may carry and still be
/// rewritten.
pub const MULTICALL3_ADDRESS: Address = address!("ca11bde05977b3631167028862be2a173976ca11");

/// Minimum length of the call's `data` string (`0x` prefix included) for a
/// payload to be considered at all.
pub const MIN_DATA_LEN: usize = 1150;
