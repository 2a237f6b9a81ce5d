//! diglot - export bilingual manuscripts to print, preview and EPUB

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use diglot::model::{Document, ExportKind, Tier};
use diglot::{Compiler, ExportConfig};

#[derive(Parser)]
#[command(name = "diglot")]
#[command(version, about = "Export bilingual manuscripts", long_about = None)]
#[command(after_help = "EXAMPLES:
    diglot book.json --kind epub -o book.epub             Build an EPUB
    diglot book.json --kind print --tier paid -o book.pdf  Render print PDF
    diglot book.json --kind preview --markup-only -o p.html  Preview markup only")]
struct Cli {
    /// Document snapshot (JSON)
    #[arg(value_name = "DOCUMENT")]
    input: PathBuf,

    /// Export kind: print, preview or epub
    #[arg(short, long, default_value = "epub")]
    kind: ExportKind,

    /// Subscription tier: free or paid
    #[arg(short, long, default_value = "free")]
    tier: Tier,

    /// Output file (defaults to the input name with the artifact's extension)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write print/preview HTML instead of calling the rendering service
    #[arg(long)]
    markup_only: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("diglot=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(path) => {
            eprintln!("wrote {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<PathBuf, String> {
    let config = match &cli.config {
        Some(path) => ExportConfig::load(path).map_err(|e| e.to_string())?,
        None => ExportConfig::default(),
    };
    let json = std::fs::read_to_string(&cli.input).map_err(|e| format!("{}: {e}", cli.input.display()))?;
    let doc = Document::from_json(&json).map_err(|e| e.to_string())?;
    let compiler = Compiler::new(config);

    if cli.markup_only {
        let markup = compiler
            .markup(&doc, cli.kind, cli.tier)
            .ok_or("--markup-only applies to print and preview exports")?;
        let output = output_path(cli, "html");
        let html = markup.to_document(doc.display_title(), doc.source_lang());
        std::fs::write(&output, html).map_err(|e| e.to_string())?;
        return Ok(output);
    }

    let artifact = compiler
        .export(&doc, cli.kind, cli.tier)
        .map_err(|e| format!("{} ({}): {e}", e.user_message(), e.status_code()))?;
    let output = output_path(cli, artifact.extension());
    std::fs::write(&output, &artifact.bytes).map_err(|e| e.to_string())?;
    if artifact.degraded {
        eprintln!("warning: rendered at reduced fidelity by the fallback service");
    }
    Ok(output)
}

fn output_path(cli: &Cli, extension: &str) -> PathBuf {
    cli.output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension(extension))
}
