//! CLI binary for edgequake-pdfpng.
//!
//! `serve` runs the HTTP service; `pdf2png` and `png2pdf` run the same
//! pipelines over local files.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdfpng::{
    pdf_to_png, png_to_pdf, serve, ConversionConfig, ServerConfig, UploadedItem,
};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP service on 0.0.0.0:8000
  pdfpng serve

  # Rasterise a PDF (writes report_png_export.zip to the current directory)
  pdfpng pdf2png report.pdf

  # Several PDFs into one archive in ./out/
  pdfpng pdf2png a.pdf b.pdf -o out/

  # Merge images; page order follows the sorted file names
  pdfpng png2pdf scans/*.png -o merged.pdf

HTTP ENDPOINTS:
  POST /convert-pdf-to-png   multipart field "files" → application/zip
  POST /convert-png-to-pdf   multipart field "files" → application/pdf
  GET  /health               {"status":"healthy"}

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  PDFPNG_HOST             Bind address for `serve`
  PDFPNG_PORT             Port for `serve`
  RUST_LOG                Overrides the log filter (e.g. debug, tower_http=debug)
"#;

/// Convert between PDF documents and PNG/JPEG images.
#[derive(Parser, Debug)]
#[command(
    name = "pdfpng",
    version,
    about = "Convert PDF pages to PNG archives and merge images into PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    conversion: ConversionArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFPNG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDFPNG_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP conversion service.
    Serve(ServeArgs),

    /// Rasterise PDFs into a ZIP of PNG pages.
    Pdf2png(FileArgs),

    /// Merge PNG/JPEG images into one PDF.
    Png2pdf(FileArgs),
}

#[derive(Args, Debug)]
struct ConversionArgs {
    /// Page render scale over the PDF's 72 DPI base (2.0 ≈ 150 DPI).
    #[arg(long, global = true, env = "PDFPNG_SCALE", default_value_t = 2.0)]
    scale: f32,

    /// Pixels per inch used to size merged PDF pages.
    #[arg(long, global = true, env = "PDFPNG_RESOLUTION", default_value_t = 100.0)]
    resolution: f32,

    /// Directory for per-request scratch workspaces.
    #[arg(long, global = true, env = "PDFPNG_WORKSPACE_DIR")]
    workspace_dir: Option<PathBuf>,

    /// Path to the pdfium shared library or its directory.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Interface to bind.
    #[arg(long, env = "PDFPNG_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "PDFPNG_PORT", default_value_t = 8000)]
    port: u16,

    /// Maximum request body size in MiB.
    #[arg(long, env = "PDFPNG_MAX_UPLOAD_MB", default_value_t = 100)]
    max_upload_mb: usize,

    /// Per-conversion timeout in seconds (0 disables it).
    #[arg(long, env = "PDFPNG_TIMEOUT", default_value_t = 300)]
    timeout: u64,
}

#[derive(Args, Debug)]
struct FileArgs {
    /// Input files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file, or existing directory to write the default name into.
    #[arg(short, long, env = "PDFPNG_OUTPUT")]
    output: Option<PathBuf>,

    /// Print a JSON summary on stdout.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli.conversion)?;

    match cli.command {
        Command::Serve(args) => {
            let server = ServerConfig {
                host: args.host,
                port: args.port,
                max_upload_bytes: args.max_upload_mb.saturating_mul(1024 * 1024),
                convert_timeout_secs: (args.timeout > 0).then_some(args.timeout),
            };
            serve(server, config).await.context("HTTP server failed")?;
        }
        Command::Pdf2png(args) => {
            let items = read_inputs(&args.inputs).await?;
            let archive = pdf_to_png(items, &config)
                .await
                .context("PDF → PNG conversion failed")?;
            let path = output_path(args.output.as_deref(), &archive.filename);
            write_output(&path, &archive.bytes).await?;

            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&archive).context("Failed to serialise summary")?
                );
            } else if !cli.quiet {
                eprintln!(
                    "{}  {} pages from {} document(s)  →  {}",
                    green("✔"),
                    archive.entries.len(),
                    archive.document_count,
                    bold(&path.display().to_string()),
                );
            }
        }
        Command::Png2pdf(args) => {
            let items = read_inputs(&args.inputs).await?;
            let document = png_to_pdf(items, &config)
                .await
                .context("PNG → PDF conversion failed")?;
            let path = output_path(args.output.as_deref(), &document.filename);
            write_output(&path, &document.bytes).await?;

            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&document).context("Failed to serialise summary")?
                );
            } else if !cli.quiet {
                eprintln!(
                    "{}  {} pages  →  {}",
                    green("✔"),
                    document.page_count(),
                    bold(&path.display().to_string()),
                );
                eprintln!("   {}", dim(&document.page_sources.join(", ")));
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(args: &ConversionArgs) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .render_scale(args.scale)
        .pdf_resolution(args.resolution);
    if let Some(ref dir) = args.workspace_dir {
        builder = builder.workspace_root(dir);
    }
    if let Some(ref lib) = args.pdfium_lib {
        builder = builder.pdfium_library_path(lib);
    }
    builder.build().context("Invalid configuration")
}

/// Load local files as uploads named after their file names.
async fn read_inputs(paths: &[PathBuf]) -> Result<Vec<UploadedItem>> {
    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {:?}", path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        items.push(UploadedItem::new(name, bytes));
    }
    Ok(items)
}

fn output_path(requested: Option<&Path>, default_name: &str) -> PathBuf {
    match requested {
        Some(p) if p.is_dir() => p.join(default_name),
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(default_name),
    }
}

/// Atomic write: temp file in the target directory, then rename.
async fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }

    let tmp_path = path.with_extension("part");
    tokio::fs::write(&tmp_path, bytes)
        .await
        .with_context(|| format!("Failed to write {:?}", tmp_path))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to move output into {:?}", path))?;
    Ok(())
}
