use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use aptx::{convert, from_xml_str, xml_to_json};

const SIMPLE_XML: &str = "<Proposal><Title>Deep field</Title><Cycle>3</Cycle></Proposal>";
const FIXTURE_XML: &str = include_str!("../tests/fixtures/1435.xml");

/// Proposal with `n` targets, each carrying attributes and nested fields
fn targets_xml(n: usize) -> String {
    let mut xml = String::from("<Proposal><Title>Survey</Title><Targets>");
    for i in 0..n {
        xml.push_str(&format!(
            "<Target Number=\"{i}\"><Name>T{i}</Name><RA>{i}.5</RA><Dec>-{i}.25</Dec></Target>"
        ));
    }
    xml.push_str("</Targets></Proposal>");
    xml
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("aptx_parse_fixture", |b| {
        b.iter(|| from_xml_str(black_box(FIXTURE_XML)))
    });
}

fn bench_convert(c: &mut Criterion) {
    let large = targets_xml(500);
    let Ok(doc) = from_xml_str(&large) else {
        return;
    };
    c.bench_function("aptx_convert_500_targets", |b| {
        b.iter(|| convert(black_box(&doc.root)))
    });
}

fn bench_xml_to_json(c: &mut Criterion) {
    c.bench_function("aptx_xml_to_json_simple", |b| {
        b.iter(|| xml_to_json(black_box(SIMPLE_XML)))
    });
    c.bench_function("aptx_xml_to_json_fixture", |b| {
        b.iter(|| xml_to_json(black_box(FIXTURE_XML)))
    });
}

criterion_group!(benches, bench_parse, bench_convert, bench_xml_to_json);
criterion_main!(benches);
