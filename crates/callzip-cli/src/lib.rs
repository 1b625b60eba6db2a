#![allow(missing_docs)]

use callzip::{
    eyre::{ensure, eyre, WrapErr},
    Result,
};
use serde_json::{json, Value};
use std::{
    io::Read,
    path::Path,
};

/// Reads a JSON-RPC payload from a file, or from stdin when the path is `-`.
pub fn read_payload(path: &Path) -> Result<Value> {
    let contents = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).wrap_err("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(contents.trim()).wrap_err("payload is not valid JSON")
}

/// Wraps raw calldata in a fresh `eth_call` payload against `to`.
pub fn build_payload(data: &str, to: &str) -> Result<Value> {
    let data = data.trim();
    ensure!(
        data.strip_prefix("0x").is_some_and(|h| h.chars().all(|c| c.is_ascii_hexdigit())),
        "calldata must be 0x-prefixed hex"
    );
    Ok(json!({
        "method": "eth_call",
        "params": [{ "to": to, "data": data }, "latest"],
    }))
}

/// Pulls the state-override bytecode out of a rewritten payload, if any.
pub fn override_code(payload: &Value) -> Result<Vec<u8>> {
    let code = payload["params"][2]
        .as_object()
        .and_then(|overrides| overrides.values().find_map(|entry| entry["code"].as_str()))
        .ok_or_else(|| eyre!("payload carries no state-override code"))?;
    callzip::primitives::hex::decode(code).wrap_err("override code is not valid hex")
}
