#![no_main]
use libfuzzer_sys::fuzz_target;
use aptx::{convert, from_xml_bytes, ConvertOptions, Converter};

fuzz_target!(|data: &[u8]| {
    if let Ok(doc) = from_xml_bytes(data) {
        let node = convert(&doc.root);
        if let Ok(strict) = Converter::with_options(ConvertOptions::strict()).convert(&doc.root) {
            assert_eq!(strict, node);
        }
        let _ = aptx::convert::to_json_pretty(&node);
    }
});
