//! JSON-RPC payload rewriting.
//!
//! [`compress_call`] inspects an `eth_call` payload, picks a compression
//! path, and swaps the call for one that executes the synthesised or
//! forwarder bytecode at the decompressor address via a state override.
//! Anything that fails a gate (wrong method, pinned block, conflicting
//! overrides, short or malformed data, output that would not shrink the
//! request) leaves the payload untouched. Ineligibility is not an error.

use crate::{
    compress::{cd_compress, cd_forwarder, flz_compress, flz_forwarder},
    synthesize, DECOMPRESSOR_ADDRESS, MIN_DATA_LEN, MULTICALL3_ADDRESS,
};
use eyre::eyre;
use revm_primitives::{hex, Address};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Compression path selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    /// Synthesise a contract that rebuilds the calldata opcode by opcode.
    Jit,
    /// FastLZ-compress the calldata behind the FastLZ forwarder.
    Flz,
    /// Run-length-encode the calldata behind the RLE forwarder.
    Cd,
}

impl FromStr for Algorithm {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "jit" => Ok(Self::Jit),
            "flz" => Ok(Self::Flz),
            "cd" => Ok(Self::Cd),
            _ => Err(eyre!("unknown algorithm {s:?}, expected jit, flz or cd")),
        }
    }
}

/// Hex-string length bounds (`0x` prefix included) steering the default
/// selection: small payloads synthesise well, very large ones defeat the
/// mid-size encoders' forwarder overhead.
const JIT_BELOW: usize = 3000;
const JIT_FROM: usize = 8000;

/// Rewrites an `eth_call` payload to carry compressed calldata, or returns
/// it unchanged when ineligible or when compression would not shrink it.
pub fn compress_call(payload: &Value, algorithm: Option<Algorithm>) -> Value {
    match try_compress(payload, algorithm) {
        Some(rewritten) => rewritten,
        None => payload.clone(),
    }
}

fn try_compress(payload: &Value, algorithm: Option<Algorithm>) -> Option<Value> {
    let obj = payload.as_object()?;
    if let Some(method) = obj.get("method") {
        if method.as_str()? != "eth_call" {
            return None;
        }
    }

    // Standard payloads carry `params: [call, block, overrides]`; legacy
    // callers pass the call object itself with an optional method.
    let legacy = !obj.contains_key("params");
    let (call, block, overrides) = if legacy {
        let mut call = obj.clone();
        call.remove("method");
        (call, None, None)
    } else {
        let params = obj.get("params")?.as_array()?;
        (params.first()?.as_object()?.clone(), params.get(1), params.get(2))
    };

    if let Some(block) = block {
        if block.as_str()? != "latest" {
            return None;
        }
    }

    let mut merged = Map::new();
    // RPC clients commonly spell "no overrides" as an explicit null.
    if let Some(overrides) = overrides.filter(|v| !v.is_null()) {
        let overrides = overrides.as_object()?;
        for key in overrides.keys() {
            if Address::from_str(key).ok()? != MULTICALL3_ADDRESS {
                return None;
            }
        }
        merged = overrides.clone();
    }

    if !call.keys().all(|k| matches!(k.as_str(), "to" | "data" | "from")) {
        return None;
    }
    let to = Address::from_str(call.get("to")?.as_str()?).ok()?;
    let data_str = call.get("data")?.as_str()?;
    if data_str.len() < MIN_DATA_LEN {
        return None;
    }
    let data = hex::decode(data_str).ok()?;

    let (code, compressed) = match algorithm {
        Some(Algorithm::Jit) => (synthesize(&data), padded_target(to)),
        Some(Algorithm::Flz) => (flz_forwarder(to), flz_compress(&data)),
        Some(Algorithm::Cd) => (cd_forwarder(to), cd_compress(&data)),
        None => {
            let s = data_str.len();
            if s < JIT_BELOW || s >= JIT_FROM {
                (synthesize(&data), padded_target(to))
            } else {
                let flz = flz_compress(&data);
                let cd = cd_compress(&data);
                if flz.len() <= cd.len() {
                    (flz_forwarder(to), flz)
                } else {
                    (cd_forwarder(to), cd)
                }
            }
        }
    };

    // Last line of defence: never ship a request that grew.
    if code.len() + compressed.len() >= data.len() {
        debug!(
            code = code.len(),
            compressed = compressed.len(),
            original = data.len(),
            "rewrite would grow the request"
        );
        return None;
    }

    let mut call = call;
    call.insert("to".into(), Value::String(hex::encode_prefixed(DECOMPRESSOR_ADDRESS)));
    call.insert("data".into(), Value::String(hex::encode_prefixed(&compressed)));
    merged.insert(
        hex::encode_prefixed(DECOMPRESSOR_ADDRESS),
        serde_json::json!({ "code": hex::encode_prefixed(&code) }),
    );
    let block = block.cloned().unwrap_or_else(|| Value::String("latest".into()));
    let params = Value::Array(vec![Value::Object(call), block, Value::Object(merged)]);

    let mut out = if legacy {
        let mut out = Map::new();
        out.insert("method".into(), Value::String("eth_call".into()));
        out
    } else {
        obj.clone()
    };
    out.insert("params".into(), params);
    Some(Value::Object(out))
}

/// The rewritten JIT calldata: the 20-byte target left-padded to a word.
fn padded_target(to: Address) -> Vec<u8> {
    let mut word = vec![0u8; 12];
    word.extend_from_slice(to.as_slice());
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use similar_asserts::assert_eq;

    const TO: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";
    const MULTICALL3: &str = "0xca11bde05977b3631167028862be2a173976ca11";
    const DECOMPRESSOR: &str = "0x00000000000000000000000000000000000000e0";

    fn payload(data: &str) -> Value {
        json!({
            "method": "eth_call",
            "params": [{ "to": TO, "data": data }, "latest"],
        })
    }

    fn rewritten_call(out: &Value) -> &Map<String, Value> {
        out["params"][0].as_object().unwrap()
    }

    fn override_code(out: &Value) -> &str {
        out["params"][2][DECOMPRESSOR]["code"].as_str().unwrap()
    }

    #[test]
    fn all_zero_calldata_rewrites_to_the_minimal_contract() {
        let p = payload(&format!("0x{}", "00".repeat(1000)));
        let out = compress_call(&p, None);
        assert_ne!(out, p);
        let call = rewritten_call(&out);
        assert_eq!(call["to"], DECOMPRESSOR);
        assert_eq!(
            call["data"].as_str().unwrap(),
            format!("0x000000000000000000000000{}", &TO[2..]),
        );
        assert_eq!(override_code(&out), "0x60015f806103e8601c345f355af13d5f5f3e3d5ff3");
    }

    #[test]
    fn repeated_bytes_rewrite_under_a_jit_hint() {
        let p = payload(&format!("0x{}", "ab".repeat(600)));
        let out = compress_call(&p, Some(Algorithm::Jit));
        let call = rewritten_call(&out);
        assert_eq!(call["to"], DECOMPRESSOR);
        assert_eq!(
            call["data"].as_str().unwrap(),
            format!("0x000000000000000000000000{}", &TO[2..]),
        );
        assert!(out["params"][2].as_object().unwrap().contains_key(DECOMPRESSOR));
    }

    #[test]
    fn non_eth_call_methods_pass_through() {
        let mut p = payload(&format!("0x{}", "ab".repeat(1000)));
        p["method"] = Value::String("eth_sendTransaction".into());
        for algorithm in [None, Some(Algorithm::Jit), Some(Algorithm::Cd)] {
            assert_eq!(compress_call(&p, algorithm), p);
        }
    }

    #[test]
    fn pinned_blocks_pass_through() {
        let mut p = payload(&format!("0x{}", "ab".repeat(1000)));
        p["params"][1] = Value::String("0x123456".into());
        assert_eq!(compress_call(&p, None), p);
    }

    #[test]
    fn conflicting_overrides_pass_through() {
        let mut p = payload(&format!("0x{}", "ab".repeat(1000)));
        p["params"]
            .as_array_mut()
            .unwrap()
            .push(json!({ DECOMPRESSOR: { "code": "0x1234" } }));
        assert_eq!(compress_call(&p, None), p);
    }

    #[test]
    fn null_overrides_count_as_absent() {
        let mut p = payload(&format!("0x{}", "00".repeat(1000)));
        p["params"].as_array_mut().unwrap().push(Value::Null);
        let out = compress_call(&p, None);
        assert_ne!(out, p);
        let overrides = out["params"][2].as_object().unwrap();
        assert_eq!(overrides.len(), 1);
        assert!(overrides.contains_key(DECOMPRESSOR));
    }

    #[test]
    fn multicall_overrides_are_merged_and_preserved() {
        let mut p = payload(&format!("0x{}", "00".repeat(1000)));
        p["params"]
            .as_array_mut()
            .unwrap()
            .push(json!({ MULTICALL3: { "code": "0x1234" } }));
        let out = compress_call(&p, None);
        let overrides = out["params"][2].as_object().unwrap();
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides[MULTICALL3], json!({ "code": "0x1234" }));
        assert!(overrides.contains_key(DECOMPRESSOR));
    }

    #[test]
    fn short_data_passes_through() {
        // 1148 characters with the prefix: one byte under the threshold.
        let p = payload(&format!("0x{}", "ab".repeat(573)));
        assert_eq!(compress_call(&p, None), p);
        let p = payload(&format!("0x{}", "00".repeat(574)));
        assert_ne!(compress_call(&p, None), p);
    }

    #[test]
    fn extra_call_keys_pass_through() {
        let mut p = payload(&format!("0x{}", "00".repeat(1000)));
        p["params"][0]["gas"] = Value::String("0x5208".into());
        assert_eq!(compress_call(&p, None), p);
    }

    #[test]
    fn from_is_an_allowed_call_key() {
        let mut p = payload(&format!("0x{}", "00".repeat(1000)));
        p["params"][0]["from"] = Value::String(TO.into());
        let out = compress_call(&p, None);
        assert_eq!(rewritten_call(&out)["from"], TO);
    }

    #[test]
    fn malformed_hex_passes_through() {
        let p = payload(&format!("0xzz{}", "00".repeat(1000)));
        assert_eq!(compress_call(&p, None), p);
    }

    #[test]
    fn incompressible_data_passes_through() {
        // Dense distinct bytes: the synthesised contract cannot undercut
        // the data it rebuilds, so the gate keeps the original payload.
        let data: String =
            (0..700).map(|i| format!("{:02x}", (i * 37 + 11) % 251 + 1)).collect();
        let p = payload(&format!("0x{data}"));
        assert_eq!(compress_call(&p, Some(Algorithm::Jit)), p);
    }

    #[test]
    fn mid_size_payloads_pick_the_shorter_encoder() {
        // 2400 zero bytes: hex length 4802 lands in the FLZ/CD band, and
        // FastLZ folds the run tighter than two-byte RLE chunks.
        let p = payload(&format!("0x{}", "00".repeat(2400)));
        let out = compress_call(&p, None);
        assert_ne!(out, p);
        let code = override_code(&out);
        // The forwarder template, not a synthesised contract.
        assert_eq!(code.len(), 2 + 166 * 2);
    }

    #[test]
    fn explicit_cd_hint_uses_the_rle_path() {
        let p = payload(&format!("0x{}", "00".repeat(1000)));
        let out = compress_call(&p, Some(Algorithm::Cd));
        assert_eq!(override_code(&out).len(), 2 + 120 * 2);
        // 1000 zeros fold to eight RLE chunks; the first two bytes of the
        // stream sit in the complemented selector region.
        let data = rewritten_call(&out)["data"].as_str().unwrap();
        assert!(data.len() < 60);
    }

    #[test]
    fn legacy_call_objects_are_normalised() {
        let p = json!({ "method": "eth_call", "to": TO, "data": format!("0x{}", "00".repeat(1000)) });
        let out = compress_call(&p, None);
        assert_eq!(out["method"], "eth_call");
        assert_eq!(rewritten_call(&out)["to"], DECOMPRESSOR);
        assert_eq!(out["params"][1], "latest");
    }

    #[test]
    fn request_envelope_is_preserved() {
        let mut p = payload(&format!("0x{}", "00".repeat(1000)));
        p["id"] = json!(7);
        p["jsonrpc"] = json!("2.0");
        let out = compress_call(&p, None);
        assert_eq!(out["id"], json!(7));
        assert_eq!(out["jsonrpc"], json!("2.0"));
    }

    #[test]
    fn missing_block_tag_defaults_to_latest() {
        let p = json!({
            "method": "eth_call",
            "params": [{ "to": TO, "data": format!("0x{}", "00".repeat(1000)) }],
        });
        let out = compress_call(&p, None);
        assert_eq!(out["params"][1], "latest");
    }

    #[test]
    fn algorithm_parses_from_str() {
        assert_eq!("jit".parse::<Algorithm>().unwrap(), Algorithm::Jit);
        assert_eq!("flz".parse::<Algorithm>().unwrap(), Algorithm::Flz);
        assert_eq!("cd".parse::<Algorithm>().unwrap(), Algorithm::Cd);
        assert!("gzip".parse::<Algorithm>().is_err());
    }
}
