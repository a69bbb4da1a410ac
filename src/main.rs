//! Demo: type into one document and watch its translation follow
//!
//! Without a fixture, both documents start as empty paragraphs and the given
//! paragraphs are typed into the source and translated. Then `--append` is
//! added to the first source paragraph to show an update being merged.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use parallel_translate::model::{DataItem, NodeType};
use parallel_translate::mt::{
    ApertiumTranslator, BundledTranslator, DoublingTranslator, GoogleTranslateProvider, MockMode,
    MockTranslator, Translator, YandexTranslateProvider,
};
use parallel_translate::{AnnotationStore, Document, LinearItem, Prism, PrismConfig, Side, SyncResult, Transaction};
use serde::Deserialize;
use tracing::info;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    /// Upper-cases and doubles every character; needs no network
    Doubling,
    /// Appends the target language code to each line
    Mock,
    Google,
    Apertium,
    Yandex,
}

#[derive(Parser, Debug)]
#[command(name = "parallel-translate")]
#[command(about = "Keep a document and its translation in step")]
struct Args {
    /// Translation backend
    #[arg(short, long, value_enum, default_value_t = Backend::Doubling)]
    backend: Backend,

    /// Source language code
    #[arg(long, default_value = "en")]
    source: String,

    /// Target language code
    #[arg(long, default_value = "fr")]
    target: String,

    /// Engine configuration file (JSON)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Document pair to start from (JSON with `source` and `target` linear data)
    #[arg(short, long, value_name = "PATH")]
    fixture: Option<PathBuf>,

    /// Text appended to the first paragraph once everything is translated
    #[arg(long, default_value = " again")]
    append: String,

    /// Source paragraphs
    #[arg(value_name = "PARAGRAPH")]
    paragraphs: Vec<String>,
}

fn translator(backend: Backend) -> SyncResult<Arc<dyn Translator>> {
    Ok(match backend {
        Backend::Doubling => Arc::new(DoublingTranslator::new()),
        Backend::Mock => Arc::new(BundledTranslator::new(MockTranslator::new(MockMode::Suffix))),
        Backend::Google => Arc::new(BundledTranslator::new(GoogleTranslateProvider::from_env()?)),
        Backend::Apertium => Arc::new(BundledTranslator::new(ApertiumTranslator::from_env()?)),
        Backend::Yandex => Arc::new(BundledTranslator::new(YandexTranslateProvider::from_env()?)),
    })
}

#[derive(Deserialize)]
struct Fixture {
    source: serde_json::Value,
    target: serde_json::Value,
}

fn empty_paragraphs(count: usize) -> Vec<DataItem> {
    (0..count)
        .flat_map(|_| [DataItem::open(NodeType::Paragraph), DataItem::Close(NodeType::Paragraph)])
        .collect()
}

fn content(text: &str) -> Vec<DataItem> {
    text.chars().map(|c| DataItem::Content(LinearItem::Plain(c))).collect()
}

/// Insert text at the end of a source paragraph
fn type_into(prism: &mut Prism, index: usize, text: &str) -> SyncResult<()> {
    let doc = prism.document(Side::First);
    let Some(node) = doc.content_branch_nodes().into_iter().nth(index) else {
        return Ok(());
    };
    let tx = Transaction::insertion(doc.data(), node.close, content(text));
    prism.apply(Side::First, tx)
}

fn print_documents(prism: &Prism) {
    let source = prism.document(Side::First);
    let target = prism.document(Side::Second);
    for (node, (left, right)) in target
        .content_branch_nodes()
        .iter()
        .zip(source.texts().into_iter().zip(target.texts()))
    {
        let state = prism
            .dirty_state(Side::Second, node.id)
            .map_or("-".to_string(), |state| state.to_string());
        println!("  {:<40} | {:<40} [{}]", left, right, state);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => PrismConfig::from_json_file(path)?,
        None => PrismConfig::default(),
    };
    let store = AnnotationStore::new();
    let translator = translator(args.backend)?;
    info!(backend = ?args.backend, translator = translator.name(), "Starting");

    let mut prism = match &args.fixture {
        Some(path) => {
            let fixture: Fixture = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            let source = Document::from_json(&args.source, store.id(), fixture.source)?;
            let target = Document::from_json(&args.target, store.id(), fixture.target)?;
            Prism::new(source, target, store, Some(translator), config)?
        }
        None => {
            let paragraphs = if args.paragraphs.is_empty() {
                vec!["The cat sat on the mat.".to_string(), "It was happy.".to_string()]
            } else {
                args.paragraphs.clone()
            };
            let source = Document::new(&args.source, store.id(), empty_paragraphs(paragraphs.len()))?;
            let target = Document::new(&args.target, store.id(), empty_paragraphs(paragraphs.len()))?;
            let mut prism = Prism::new(source, target, store, Some(translator), config)?;
            for (index, paragraph) in paragraphs.iter().enumerate() {
                type_into(&mut prism, index, paragraph)?;
            }
            prism.run_until_idle().await?;
            prism
        }
    };
    println!("Start:");
    print_documents(&prism);

    type_into(&mut prism, 0, &args.append)?;
    prism.run_until_idle().await?;
    println!("After editing the first paragraph:");
    print_documents(&prism);

    info!(history = prism.history().len(), "Done");
    Ok(())
}
