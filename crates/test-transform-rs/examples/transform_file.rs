use camino::Utf8PathBuf;
use std::fs;
use test_transform_rs::{create_transformer, ProcessOptions, TransformConfig};

fn main() {
    let path = std::env::args()
        .nth(1)
        .expect("Usage: transform_file <file>");
    let source = fs::read_to_string(&path).expect("Failed to read file");
    let transformer = create_transformer(TransformConfig {
        sourcemap: true,
        ..Default::default()
    });
    let output = transformer.process(
        &source,
        &Utf8PathBuf::from(path),
        &serde_json::Value::Null,
        &ProcessOptions::default(),
    );
    match output.code {
        Some(code) => println!("{code}"),
        None => std::process::exit(1),
    }
}
