//! gemtex - chat conversation to LaTeX exporter

use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use gemtex_config::Config;
use gemtex_engine::{Chunk, Document, convert_inline, to_html};

#[derive(Parser)]
#[command(name = "gemtex")]
#[command(version, about = "Convert chat conversations to LaTeX", long_about = None)]
#[command(after_help = "EXAMPLES:
    gemtex export chat.json              Export scraped pairs to the configured file
    gemtex export chat.md -o chat.tex    Export a prompt/===/answer text
    gemtex preview prompt.md             Render a prompt as preview HTML")]
struct Cli {
    /// Config file (defaults to ~/.config/gemtex/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a conversation to a LaTeX document
    Export {
        /// JSON array of {prompt, answer_md} pairs, or text with a `===` line
        /// ("-" for stdin)
        #[arg(value_name = "INPUT")]
        input: String,

        /// Output file ("-" for stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<String>,
    },
    /// Render a prompt as preview HTML
    Preview {
        /// Prompt text ("-" for stdin)
        #[arg(value_name = "INPUT")]
        input: String,

        /// Print the node tree as JSON instead of HTML
        #[arg(long)]
        json: bool,
    },
    /// Write a config file with the default settings
    InitConfig,
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(Config::config_path);

    match cli.command {
        Command::Export { input, output } => {
            let config = load_config(&config_path)?;
            let document = read_document(&read_input(&input)?)?;
            let tex = document.render(&config.export_options())?;
            let output =
                output.unwrap_or_else(|| config.output_file.to_string_lossy().into_owned());
            write_output(&output, &tex)?;
            if output != "-" {
                log::info!(
                    "Exported {} prompt/answer pairs to {output}",
                    document.chunks.len()
                );
            }
        }
        Command::Preview { input, json } => {
            let text = read_input(&input)?;
            let lines: Vec<&str> = text.lines().collect();
            let nodes = convert_inline(&lines);
            let rendered = if json {
                serde_json::to_string_pretty(&nodes)?
            } else {
                to_html(&nodes)
            };
            write_output("-", &rendered)?;
        }
        Command::InitConfig => {
            if config_path.exists() {
                anyhow::bail!("Config file already exists at {}", config_path.display());
            }
            Config::default().save_to_path(&config_path)?;
            log::info!("Wrote default config to {}", config_path.display());
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    match Config::load_from_path(path)? {
        Some(config) => Ok(config),
        None => {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))
}

/// JSON arrays are scraped pairs; anything else is one chunk.
fn read_document(text: &str) -> Result<Document> {
    if text.trim_start().starts_with('[') {
        return Ok(Document::from_json(text)?);
    }
    Ok(Document::new(vec![Chunk::parse(text)]))
}

fn write_output(output: &str, content: &str) -> Result<()> {
    if output == "-" {
        let mut stdout = io::stdout().lock();
        stdout.write_all(content.as_bytes())?;
        if !content.ends_with('\n') {
            stdout.write_all(b"\n")?;
        }
        return Ok(());
    }
    let path = Path::new(output);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {output}"))
}
