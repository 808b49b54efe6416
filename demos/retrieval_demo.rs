//! Retrieval Demo - builds an index from JSON lines and runs keyword
//! searches against it.
//!
//! ```text
//! cargo run --example retrieval_demo -- [data.jsonl] [query...]
//! ```
//!
//! Each input line is an object with `id`, `name` and `address`. Without a
//! data file a small built-in sample is used.

use std::io::BufRead;

use serde::Deserialize;
use tempfile::TempDir;

use lucerne::{AnalyzerConfig, Document, Engine, IndexConfig, OpenMode};

const SAMPLE: &str = r#"{"id": "1", "name": "追加饭店", "address": "上海市浦东新区学业路302号"}
{"id": "2", "name": "海德花园酒店", "address": "天津路海德花园南明大道北"}
{"id": "3", "name": "龙田饭店", "address": "平湖街道龙田镇龙兴街"}
{"id": "4", "name": "山大路自助银行", "address": "中国农业银行24小时自助银行(山大路)"}
{"id": "5", "name": "昌黎大厦饭店", "address": "河北昌黎县昌黎大厦南边的红绿灯路口"}
"#;

#[derive(Debug, Deserialize)]
struct Shop {
    id: String,
    name: String,
    address: String,
}

fn load_shops(reader: impl BufRead) -> anyhow::Result<Vec<Shop>> {
    let mut shops = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        shops.push(serde_json::from_str(&line)?);
    }
    Ok(shops)
}

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let shops = match args.next() {
        Some(path) => load_shops(std::io::BufReader::new(std::fs::File::open(path)?))?,
        None => load_shops(SAMPLE.as_bytes())?,
    };
    let mut queries: Vec<String> = args.collect();
    if queries.is_empty() {
        queries = ["饭店", "addr:自助银行", "饭店 -昌黎", "酒店 OR 银行"]
            .map(String::from)
            .to_vec();
    }

    let dir = TempDir::new()?;
    let config = IndexConfig::builder()
        .analyzer(AnalyzerConfig::Cjk)
        .field_analyzer("id", AnalyzerConfig::Keyword)
        .stop_words(["镇", "村", "市", "乡"], true)
        .default_field("name")
        .open_mode(OpenMode::Create)
        .build();
    let engine = Engine::open_dir(dir.path(), config)?;

    let mut writer = engine.writer()?;
    let docs = shops
        .into_iter()
        .map(|shop| {
            Document::with_id(shop.id.as_str())
                .add_string("id", shop.id, true)
                .add_text("name", shop.name, true)
                .add_text("addr", shop.address, false)
        })
        .collect();
    println!("indexed {} documents", writer.add_documents(docs)?);
    writer.close()?;

    let parser = engine.query_parser();
    let searcher = engine.searcher()?;
    for text in &queries {
        let query = parser.parse(text)?;
        println!("\nquery: {text} ({query})");
        for hit in searcher.search_documents(&query, 10)? {
            let name = hit.fields.get("name").map_or("", String::as_str);
            println!("  id={} name={name} score={:.4}", hit.id, hit.score);
        }
    }
    Ok(())
}
