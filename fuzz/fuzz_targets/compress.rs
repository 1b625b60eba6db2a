#![no_main]

use callzip::{
    compress::{cd_compress, cd_decompress, flz_compress, flz_decompress},
    compress_call, primitives::hex, synthesize, CALL_TRAILER,
};
use libfuzzer_sys::fuzz_target;
use serde_json::json;

fuzz_target!(|data: &[u8]| {
    // Synthesis must not panic and always carries the fixed trailer.
    let code = synthesize(data);
    assert_eq!(&code[code.len() - 12..], &CALL_TRAILER);

    // Both mid-size encoders must round-trip exactly.
    assert_eq!(flz_decompress(&flz_compress(data)).unwrap(), data);
    assert_eq!(cd_decompress(&cd_compress(data)).unwrap(), data);

    // The rewriter must never grow a request it decides to touch.
    let payload = json!({
        "method": "eth_call",
        "params": [
            {
                "to": "0x6b175474e89094c44da98b954eedeac495271d0f",
                "data": format!("0x{}", hex::encode(data)),
            },
            "latest",
        ],
    });
    let out = compress_call(&payload, None);
    if out != payload {
        let rewritten = out["params"][0]["data"].as_str().unwrap();
        let code = out["params"][2]["0x00000000000000000000000000000000000000e0"]["code"]
            .as_str()
            .unwrap();
        assert!((rewritten.len() - 2) / 2 + (code.len() - 2) / 2 < data.len());
    }
});
