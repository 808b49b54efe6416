//! Analyzer Demo - prints how each analysis strategy splits the same text.
//!
//! ```text
//! cargo run --example analyzer_demo
//! ```

use lucerne::analysis::{AnalyzerConfig, StopWords};

const SENTENCE: &str = "I have a lot of dreams. 北京市海淀区. 河西路六巷,西羌大道南段. \
    中国农业银行24小时自助银行(山大路) 北京798 天津路,海德花园南明大道北,S302,上虞区北街南明村X230";

fn main() -> anyhow::Result<()> {
    let stop_words = StopWords::empty();
    let strategies = [
        ("standard", AnalyzerConfig::Standard),
        ("whitespace", AnalyzerConfig::Whitespace),
        ("simple", AnalyzerConfig::Simple),
        ("stop", AnalyzerConfig::Stop),
        ("keyword", AnalyzerConfig::Keyword),
        ("cjk", AnalyzerConfig::Cjk),
        (
            "dictionary",
            AnalyzerConfig::Dictionary {
                words: ["北京市", "海淀区", "农业银行", "自助银行", "花园", "大道"]
                    .map(String::from)
                    .to_vec(),
            },
        ),
    ];

    for (name, config) in strategies {
        let analyzer = config.build(true, &stop_words)?;
        let tokens: Vec<String> = analyzer.analyze(SENTENCE).map(|t| t.text).collect();
        println!("analyzer: {name}");
        println!("{}|\n", tokens.join("|"));
    }
    Ok(())
}
