#![no_main]
use libfuzzer_sys::fuzz_target;
use aptx::{XmlConfig, XmlParser};

fuzz_target!(|data: &[u8]| {
    let mut parser = XmlParser::with_config(data, XmlConfig::default());
    let _ = parser.parse();
});
