//! Index Demo - appending, updating and deleting documents.
//!
//! Every step opens its own writer session, the way separate processes
//! would, and prints what a fresh reader sees afterwards.
//!
//! ```text
//! cargo run --example index_demo
//! ```

use lucerne::{AnalyzerConfig, Document, Engine, IndexConfig, OpenMode};
use tempfile::TempDir;

fn shop(id: &str, name: &str, addr: &str) -> Document {
    Document::with_id(id)
        .add_string("id", id, true)
        .add_text("name", name, true)
        .add_text("addr", addr, false)
}

fn show(engine: &Engine, query: &str) -> anyhow::Result<()> {
    let query = engine.query_parser().parse(query)?;
    let hits = engine.searcher()?.search_documents(&query, 10)?;
    println!("query {query}: {} hits", hits.len());
    for hit in hits {
        println!("  {} {:.4} {:?}", hit.id, hit.score, hit.fields);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = |mode| {
        IndexConfig::builder()
            .analyzer(AnalyzerConfig::Cjk)
            .field_analyzer("id", AnalyzerConfig::Keyword)
            .stop_words(["镇", "村", "市", "乡"], true)
            .default_field("name")
            .open_mode(mode)
            .build()
    };

    // Create
    let engine = Engine::open_dir(dir.path(), config(OpenMode::Create))?;
    let mut writer = engine.writer()?;
    writer.add_documents(vec![
        shop("1", "追加饭店", "上海市浦东新区学业路302号"),
        shop("2", "海德花园酒店", "天津路南明大道北"),
    ])?;
    writer.close()?;
    show(&engine, "饭店")?;

    // Append
    let engine = Engine::open_dir(dir.path(), config(OpenMode::Append))?;
    let mut writer = engine.writer()?;
    writer.add_document(shop("3", "龙田饭店", "平湖街道龙田镇龙兴街"))?;
    writer.close()?;
    show(&engine, "饭店")?;

    // Update
    let mut writer = engine.writer()?;
    writer.update_document("3", shop("3", "龙兴大酒店", "平湖街道龙田镇龙兴街"))?;
    writer.close()?;
    show(&engine, "酒店")?;

    // Delete
    let mut writer = engine.writer()?;
    println!("deleted: {}", writer.delete_document("1")?);
    writer.close()?;
    show(&engine, "name:追加")?;

    let mut writer = engine.writer()?;
    writer.force_merge_deletes()?;
    writer.close()?;
    let reader = engine.reader()?;
    println!(
        "{} docs in {} segments, deletions: {}",
        reader.doc_count(),
        reader.segment_count(),
        reader.has_deletions()
    );
    Ok(())
}
