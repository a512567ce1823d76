use criterion::{Criterion, criterion_group, criterion_main};
use assoc::{EngineConfig, GeneSearch, RecordDecoder, VariantsPayload};
use serde_json::{json, Value};
use std::io::Cursor;

fn search_terms(genes: usize) -> String {
    (0..genes)
        .map(|i| format!("[\"ENSG{:011}\", [\"GENE{}\", \"ALIAS{}\", \"GENE{} ANTISENSE\"]]\n", i, i, i % 500, i))
        .collect()
}

fn build_search_benchmark(c: &mut Criterion) {
    let terms_10000 = search_terms(10_000);
    c.bench_function("index 10000 genes", |b| b.iter(|| {
        GeneSearch::from_reader(Cursor::new(terms_10000.as_bytes())).unwrap()
    }));

    let search = GeneSearch::from_reader(Cursor::new(terms_10000.as_bytes())).unwrap();
    c.bench_function("search prefix", |b| b.iter(|| search.search("GENE1")));
}

fn variants_payload(variants: usize) -> VariantsPayload {
    let consequences = ["stop_gained", "missense_variant", "synonymous_variant", "intron_variant"];
    let rows = (0..variants)
        .map(|i| {
            let row = json!([
                format!("1-{}-A-G", 1000 + i), 1000 + i, consequences[i % 4], format!("c.{}A>G", i), null,
                [i as f64 / 10.0],
                [[i % 7, 2000, i % 3, 4000], null],
            ]);
            match row {
                Value::Array(values) => values,
                _ => Vec::new(),
            }
        })
        .collect();
    VariantsPayload { variants: rows }
}

fn decode_variants_benchmark(c: &mut Criterion) {
    let config = EngineConfig {
        variant_info_field_names: vec!["cadd".to_string()],
        variant_result_analysis_groups: vec!["DN".to_string(), "DBS".to_string()],
        variant_group_result_field_names: ["ac_case", "an_case", "ac_ctrl", "an_ctrl"]
            .iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    };
    let payload_1000 = variants_payload(1_000);

    c.bench_function("decode 1000 variants", |b| b.iter(|| {
        RecordDecoder::new(&config).decode_variants(&payload_1000).unwrap()
    }));
}

criterion_group!(benches,
    build_search_benchmark,
    decode_variants_benchmark);
criterion_main!(benches);
