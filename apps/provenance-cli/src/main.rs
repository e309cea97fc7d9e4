//! Evidence provenance inspection tool
//!
//! Resolves evidence targets against a recognition layout file and prints
//! the highlight snapshot and surface directive as JSON.

mod commands;

use clap::{Parser, Subcommand};
use provenance_core::{ProvenanceConfig, ViewerTab};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "provenance")]
#[command(version, about = "Resolve evidence highlights against OCR layout output")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a character range (and optional quote) to boxes and a surface directive
    Resolve {
        /// Layout JSON; the file stem is used as the document id
        #[arg(short, long, required_unless_present = "document")]
        layout: Option<PathBuf>,

        /// Document id, read from `<layout_dir>/<id>.json`
        #[arg(short, long, conflicts_with = "layout")]
        document: Option<String>,

        #[arg(short, long)]
        page: u32,

        #[arg(long)]
        start: Option<usize>,

        #[arg(long)]
        end: Option<usize>,

        #[arg(long)]
        quote: Option<String>,

        #[arg(long)]
        value: Option<String>,

        /// The document has a PDF source
        #[arg(long)]
        pdf: bool,

        /// The document has an image source
        #[arg(long)]
        image: bool,

        /// Force a surface instead of the default tab
        #[arg(long, value_parser = parse_tab)]
        tab: Option<ViewerTab>,

        /// Page media box `x,y,width,height` in points; adds `pdf_rects` to the output
        #[arg(long, value_parser = parse_media_box)]
        media_box: Option<[f64; 4]>,
    },

    /// Find literal text on a page and resolve it to boxes
    Locate {
        #[arg(short, long, required_unless_present = "document")]
        layout: Option<PathBuf>,

        #[arg(short, long, conflicts_with = "layout")]
        document: Option<String>,

        #[arg(short, long)]
        page: u32,

        #[arg(short, long)]
        text: String,
    },

    /// Print the effective configuration
    Config,
}

fn parse_tab(s: &str) -> Result<ViewerTab, String> {
    match s.to_ascii_lowercase().as_str() {
        "text" => Ok(ViewerTab::Text),
        "pdf" => Ok(ViewerTab::Pdf),
        "image" => Ok(ViewerTab::Image),
        other => Err(format!("unknown tab '{other}' (expected text, pdf or image)")),
    }
}

fn parse_media_box(s: &str) -> Result<[f64; 4], String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid media box '{s}': {e}"))?;
    match values.as_slice() {
        [x, y, w, h] if *w > 0.0 && *h > 0.0 => Ok([*x, *y, *w, *h]),
        _ => Err(format!("media box '{s}' must be x,y,width,height with a positive size")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries JSON; logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &args.config {
        Some(path) => ProvenanceConfig::from_file(path)?,
        None => ProvenanceConfig::default(),
    };

    let output = match args.command {
        Command::Resolve {
            layout,
            document,
            page,
            start,
            end,
            quote,
            value,
            pdf,
            image,
            tab,
            media_box,
        } => {
            let request = commands::ResolveRequest {
                layout: commands::layout_path(&config, layout, document)?,
                page,
                start,
                end,
                quote,
                value,
                has_pdf: pdf,
                has_image: image,
                tab,
                media_box,
            };
            serde_json::to_string_pretty(&commands::resolve(&config, request).await?)?
        }
        Command::Locate {
            layout,
            document,
            page,
            text,
        } => {
            let layout = commands::layout_path(&config, layout, document)?;
            serde_json::to_string_pretty(&commands::locate(&layout, page, &text)?)?
        }
        Command::Config => config.to_toml_string()?,
    };

    println!("{output}");
    Ok(())
}
