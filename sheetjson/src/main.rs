use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sheetjson_core::{Converter, ConverterConfig};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod formatter;

#[derive(Parser)]
#[command(name = "sheetjson")]
#[command(about = "Convert base64-encoded Excel/ODS workbooks into typed JSON", long_about = None)]
#[command(version)]
struct Cli {
    /// File holding the base64 payload (reads stdin when omitted or "-")
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Treat FILE as a spreadsheet document instead of base64 text
    #[arg(long, requires = "file")]
    raw: bool,

    /// Write output to this file instead of stdout
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// The JSON document
    Json,
    /// Colored per-sheet counts
    Summary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        ConverterConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        // Try to load default config from current directory if it exists
        let default_config_path = PathBuf::from("sheetjson.toml");
        if default_config_path.exists() {
            ConverterConfig::from_file(&default_config_path).with_context(|| {
                format!(
                    "Failed to load config from {}",
                    default_config_path.display()
                )
            })?
        } else {
            ConverterConfig::default()
        }
    };

    config.validate().context("Invalid configuration")?;
    if cli.pretty {
        config.output.pretty = true;
    }

    let source = cli
        .file
        .as_ref()
        .filter(|path| path.as_os_str() != "-")
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<stdin>".to_string());

    let converter = Converter::with_config(config);
    let bytes = read_document(&cli)?;

    let result = converter
        .convert_to_result(bytes)
        .with_context(|| format!("Failed to convert {}", source))?;

    match cli.format {
        OutputFormat::Json => {
            formatter::write_json(&result, converter.config().output.pretty, cli.output.as_deref())?;
        }
        OutputFormat::Summary => {
            formatter::print_summary(&source, &result);
        }
    }

    Ok(())
}

/// Read the input and return the document bytes
fn read_document(cli: &Cli) -> Result<Vec<u8>> {
    let path = cli.file.as_ref().filter(|path| path.as_os_str() != "-");

    if cli.raw {
        let path = path.context("--raw needs a spreadsheet file path")?;
        return fs::read(path).with_context(|| format!("Failed to read {}", path.display()));
    }

    let text = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read base64 payload from stdin")?;
            text
        }
    };

    sheetjson_core::decode_base64(&text).context("Invalid input")
}
