//! The FastLZ and calldata-RLE compression paths.
//!
//! Each encoder pairs with a fixed forwarder runtime: a small contract,
//! installed at the decompressor address, that decodes its calldata back to
//! the original bytes in memory and forwards them to the target baked in at
//! splice time. Unlike the JIT path, the forwarder bytecodes are static;
//! only the 20-byte target address changes per call.

mod cd;
pub use cd::{cd_compress, cd_decompress};

mod flz;
pub use flz::{flz_compress, flz_decompress};

use revm_primitives::Address;

/// Offset of the spliced target address in both forwarder templates: each
/// opens with `PUSH20 <target>`.
pub const FORWARDER_ADDRESS_OFFSET: usize = 1;

/// Forwarder runtime for [`cd_compress`] streams.
///
/// Walks calldata byte by byte: a `0x00` marker byte is followed by a run
/// control (zeros advance the output cursor over untouched memory, ones
/// runs store a full word of `0xff` and advance by the run length), any
/// other byte is stored verbatim. The first four decoded bytes are
/// complemented in place before the forward call.
const CD_FORWARDER: [u8; 120] = [
    // PUSH20 target, output and input cursors start at zero
    0x73, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0x5f, 0x5f, //
    // 0x17 loop: while input cursor < CALLDATASIZE
    0x5b, 0x81, 0x36, 0x11, 0x60, 0x3a, 0x57, //
    // 0x1e done: complement the selector word's top four bytes
    0x63, 0xff, 0xff, 0xff, 0xff, 0x60, 0xe0, 0x1b, 0x5f, 0x51, 0x18, 0x5f, 0x52, //
    // forward and return: CALL(GAS, target, CALLVALUE, 0, o, 0, 0)
    0x5f, 0x5f, 0x82, 0x5f, 0x34, 0x87, 0x5a, 0xf1, //
    0x3d, 0x5f, 0x5f, 0x3e, 0x3d, 0x5f, 0xf3, //
    // 0x3a body: load the next byte, advance the input cursor
    0x5b, 0x81, 0x35, 0x60, 0xf8, 0x1c, 0x91, 0x60, 0x01, 0x01, 0x91, //
    // non-zero bytes are literals
    0x80, 0x60, 0x6f, 0x57, //
    // marker: load the run control, advance the input cursor
    0x50, 0x81, 0x35, 0x60, 0xf8, 0x1c, 0x91, 0x60, 0x01, 0x01, 0x91, //
    // controls under 0x80 are zero runs
    0x80, 0x60, 0x80, 0x11, 0x60, 0x67, 0x57, //
    // ones run: store a word of 0xff, advance by control - 0x7f
    0x60, 0x7f, 0x90, 0x03, 0x5f, 0x19, 0x82, 0x52, 0x01, 0x60, 0x17, 0x56, //
    // 0x67 zero run: advance by control + 1 over untouched memory
    0x5b, 0x60, 0x01, 0x01, 0x01, 0x60, 0x17, 0x56, //
    // 0x6f literal: store the byte, advance the output cursor
    0x5b, 0x81, 0x53, 0x60, 0x01, 0x01, 0x60, 0x17, 0x56, //
];

/// Forwarder runtime for [`flz_compress`] streams.
///
/// Decodes the token stream into memory, then forwards the rebuilt
/// calldata like the RLE forwarder does. Literal runs land through a
/// single `CALLDATACOPY`; matches copy byte by byte so overlapping copies
/// feed on their own output.
const FLZ_FORWARDER: [u8; 166] = [
    // PUSH20 target, output and input cursors start at zero
    0x73, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0x5f, 0x5f, //
    // 0x17 loop: while input cursor < CALLDATASIZE
    0x5b, 0x81, 0x36, 0x11, 0x60, 0x2d, 0x57, //
    // forward and return: CALL(GAS, target, CALLVALUE, 0, o, 0, 0)
    0x5f, 0x5f, 0x82, 0x5f, 0x34, 0x87, 0x5a, 0xf1, //
    0x3d, 0x5f, 0x5f, 0x3e, 0x3d, 0x5f, 0xf3, //
    // 0x2d body: load the control byte, advance the input cursor
    0x5b, 0x81, 0x35, 0x60, 0xf8, 0x1c, 0x91, 0x60, 0x01, 0x01, 0x91, //
    // high three bits pick the token kind
    0x80, 0x60, 0x05, 0x1c, 0x80, 0x60, 0x50, 0x57, //
    // literal run of control + 1 bytes: CALLDATACOPY, advance both cursors
    0x50, 0x60, 0x01, 0x01, //
    0x80, 0x83, 0x83, 0x37, //
    0x80, 0x92, 0x01, 0x91, 0x01, 0x60, 0x17, 0x56, //
    // 0x50 match: kind 7 carries an extra length byte
    0x5b, 0x80, 0x60, 0x07, 0x14, 0x60, 0x5e, 0x57, //
    // short match: length = kind + 2
    0x60, 0x02, 0x01, 0x60, 0x6d, 0x56, //
    // 0x5e long match: length = 9 + next byte, advance the input cursor
    0x5b, 0x50, 0x82, 0x35, 0x60, 0xf8, 0x1c, 0x92, 0x60, 0x01, 0x01, 0x92, //
    0x60, 0x09, 0x01, //
    // 0x6d distance: low control bits joined with the next byte, plus one
    0x5b, 0x90, 0x60, 0x1f, 0x16, 0x60, 0x08, 0x1b, //
    0x83, 0x35, 0x60, 0xf8, 0x1c, 0x17, 0x60, 0x01, 0x01, //
    0x92, 0x60, 0x01, 0x01, 0x92, //
    // 0x83 copy: one byte per round from output - distance
    0x5b, 0x81, 0x15, 0x60, 0xa0, 0x57, //
    0x80, 0x83, 0x03, 0x51, 0x60, 0xf8, 0x1c, 0x83, 0x53, //
    0x91, 0x60, 0x01, 0x01, 0x91, //
    0x90, 0x60, 0x01, 0x90, 0x03, 0x90, //
    0x60, 0x83, 0x56, //
    // 0xa0 copy done
    0x5b, 0x50, 0x50, 0x60, 0x17, 0x56, //
];

/// The calldata-RLE forwarder with `to` spliced in.
pub fn cd_forwarder(to: Address) -> Vec<u8> {
    splice(&CD_FORWARDER, to)
}

/// The FastLZ forwarder with `to` spliced in.
pub fn flz_forwarder(to: Address) -> Vec<u8> {
    splice(&FLZ_FORWARDER, to)
}

fn splice(template: &[u8], to: Address) -> Vec<u8> {
    let mut code = template.to_vec();
    code[FORWARDER_ADDRESS_OFFSET..FORWARDER_ADDRESS_OFFSET + 20].copy_from_slice(to.as_slice());
    code
}
