use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use richtext::config::{EditorConfig, config_path, load_config_or_default};
use richtext::richtext::{ExportFormat, LineSymbol, MonospaceMeasurer, RichTextEditor};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "richtext")]
#[command(about = "Inspect saved rich text documents", long_about = None)]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a saved document as text, HTML or Markdown
    Export {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Text)]
        format: ExportFormat,
        /// Saved document
        file: PathBuf,
    },
    /// Lay a saved document out and print one row per line
    Layout {
        #[arg(short, long, default_value_t = 640.0)]
        width: f32,
        /// Disable word wrapping
        #[arg(long)]
        no_wrap: bool,
        /// Saved document
        file: PathBuf,
    },
}

fn load_settings(path: Option<&Path>) -> EditorConfig {
    match path.map(Path::to_path_buf).or_else(config_path) {
        Some(path) => load_config_or_default(&path),
        None => EditorConfig::default(),
    }
}

fn open(file: &Path, config: EditorConfig) -> Result<RichTextEditor> {
    let data = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let mut editor = RichTextEditor::new(Box::new(MonospaceMeasurer::new()), config);
    editor
        .load(&data)
        .with_context(|| format!("failed to load {}", file.display()))?;
    Ok(editor)
}

fn symbol_label(symbol: LineSymbol) -> String {
    match symbol {
        LineSymbol::None => String::new(),
        LineSymbol::Bullet => "*".to_string(),
        LineSymbol::Ordinal(n) => format!("{n}."),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "richtext=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = load_settings(args.config.as_deref());

    match args.command {
        Commands::Export { format, file } => {
            let editor = open(&file, config)?;
            println!("{}", editor.export(format, false));
        }
        Commands::Layout {
            width,
            no_wrap,
            file,
        } => {
            let mut editor = open(&file, config)?;
            editor.set_word_wrap(!no_wrap);
            editor.layout(width, 0.0);
            for (i, line) in editor.lines().iter().enumerate() {
                println!(
                    "{:>4} y={:<6} h={:<4} x={:<4} {:<4}|{}|",
                    i,
                    line.y,
                    line.max_height,
                    line.offset,
                    symbol_label(line.symbol),
                    line.text()
                );
            }
        }
    }

    Ok(())
}
