//! PDF Combine CLI tool
//!
//! A command-line tool for combining images and PDFs into one PDF.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use glob::glob;
use log::{info, warn};

use pdf_combine::input::validate;
use pdf_combine::logger::{level_from_flags, StderrLogger};
use pdf_combine::pdf::inspect_file;
use pdf_combine::{
    assemble, FileInfo, ImagesPerPage, InputFile, LayoutOptions, Length, Orientation, Rgb,
    OUTPUT_FILE_NAME,
};

/// PDF Combine - Merge images and PDFs into a single document
#[derive(Parser)]
#[command(name = "pdf-combine")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # One photo per page, portrait A4
    pdf-combine combine photo1.jpg photo2.png

    # Four scans per page in landscape with a thin red border, then a PDF appended
    pdf-combine combine --per-page 4 --landscape --border --border-color \"#cc0000\" \"scans/*.jpg\" appendix.pdf

    # Use a saved layout preset and open the result
    pdf-combine combine --config layout.json -o album.pdf --open *.png")]
struct Cli {
    /// Show debug output (repeat for more)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine images and PDF files into one PDF
    Combine {
        /// Input files (in order): JPG, JPEG, PNG or PDF. Supports glob patterns like "*.png"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long, default_value = OUTPUT_FILE_NAME)]
        output: PathBuf,

        /// JSON layout preset; flags given here override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Images per page (1, 2 or 4)
        #[arg(short = 'n', long, value_parser = parse_images_per_page)]
        per_page: Option<ImagesPerPage>,

        /// Landscape pages instead of portrait
        #[arg(long)]
        landscape: bool,

        /// Margin on all sides in mm (0-100)
        #[arg(long, value_parser = parse_finite)]
        margin: Option<f64>,

        /// Top margin in mm (overrides --margin)
        #[arg(long, value_parser = parse_finite)]
        margin_top: Option<f64>,

        /// Right margin in mm, also the gap between columns
        #[arg(long, value_parser = parse_finite)]
        margin_right: Option<f64>,

        /// Bottom margin in mm, also the gap between rows
        #[arg(long, value_parser = parse_finite)]
        margin_bottom: Option<f64>,

        /// Left margin in mm
        #[arg(long, value_parser = parse_finite)]
        margin_left: Option<f64>,

        /// Draw a border around each image
        #[arg(long)]
        border: bool,

        /// Border width in points (0.1-10)
        #[arg(long, value_parser = parse_finite)]
        border_width: Option<f64>,

        /// Border colour as #rrggbb
        #[arg(long, value_parser = parse_color)]
        border_color: Option<Rgb>,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

/// Layout flags collected from the command line
struct LayoutFlags {
    per_page: Option<ImagesPerPage>,
    landscape: bool,
    margin: Option<f64>,
    margin_top: Option<f64>,
    margin_right: Option<f64>,
    margin_bottom: Option<f64>,
    margin_left: Option<f64>,
    border: bool,
    border_width: Option<f64>,
    border_color: Option<Rgb>,
}

impl LayoutFlags {
    fn apply(&self, mut options: LayoutOptions) -> LayoutOptions {
        if let Some(per_page) = self.per_page {
            options.images_per_page = per_page;
        }
        if self.landscape {
            options.orientation = Orientation::Landscape;
        }
        if let Some(all) = self.margin {
            options.margins = pdf_combine::Margins::uniform(Length::from_mm(all));
        }
        let sides = [
            (self.margin_top, &mut options.margins.top),
            (self.margin_right, &mut options.margins.right),
            (self.margin_bottom, &mut options.margins.bottom),
            (self.margin_left, &mut options.margins.left),
        ];
        for (value, side) in sides {
            if let Some(mm) = value {
                *side = Length::from_mm(mm);
            }
        }
        if self.border {
            options.border.enabled = true;
        }
        if let Some(width) = self.border_width {
            options.border.width = width;
        }
        if let Some(color) = self.border_color {
            options.border.color = color;
        }
        options
    }
}

fn parse_images_per_page(s: &str) -> Result<ImagesPerPage, String> {
    let n: u8 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    ImagesPerPage::try_from(n)
}

fn parse_color(s: &str) -> Result<Rgb, String> {
    s.parse::<Rgb>().map_err(|e| e.to_string())
}

/// Parse a length or width, refusing NaN and infinities
fn parse_finite(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    if !value.is_finite() {
        return Err(format!("'{}' is not a finite number", s));
    }
    Ok(value)
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = StderrLogger::new(level_from_flags(cli.verbose, cli.quiet)).init() {
        eprintln!("Warning: could not install logger: {}", e);
    }

    let result = match cli.command {
        Commands::Combine {
            inputs,
            output,
            config,
            per_page,
            landscape,
            margin,
            margin_top,
            margin_right,
            margin_bottom,
            margin_left,
            border,
            border_width,
            border_color,
            open,
        } => {
            let flags = LayoutFlags {
                per_page,
                landscape,
                margin,
                margin_top,
                margin_right,
                margin_bottom,
                margin_left,
                border,
                border_width,
                border_color,
            };
            cmd_combine(inputs, output, config, flags, open)
        }
        Commands::Info { input } => cmd_info(input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Expand glob patterns in input paths, keeping argument order
fn expand_globs(patterns: Vec<String>) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = Vec::new();
            for entry in glob(&pattern)? {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => warn!("glob error for {}: {}", pattern, e),
                }
            }
            if matched.is_empty() {
                bail!("No files matched pattern: {}", pattern);
            }
            matched.sort();
            paths.extend(matched);
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// Open a file with the system default application
fn open_file(path: &Path) -> anyhow::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

/// Validate inputs, skipping rejected ones, and read the accepted files
fn collect_inputs(paths: &[PathBuf]) -> anyhow::Result<Vec<InputFile>> {
    let mut files = Vec::new();

    for path in paths {
        let info = FileInfo::from_path(path).ok();
        if let Err(e) = validate(info.as_ref()) {
            warn!("{}: {}", path.display(), e);
            continue;
        }
        // validate() only succeeds with Some
        let Some(info) = info else { continue };

        let file = InputFile::load(info, path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(file);
    }

    Ok(files)
}

/// Combine images and PDFs into one document
fn cmd_combine(
    inputs: Vec<String>,
    output: PathBuf,
    config: Option<PathBuf>,
    flags: LayoutFlags,
    open: bool,
) -> anyhow::Result<()> {
    let paths = expand_globs(inputs)?;

    let base = match config {
        Some(path) => LayoutOptions::load(&path)
            .with_context(|| format!("Failed to load layout preset {}", path.display()))?,
        None => LayoutOptions::default(),
    };
    let options = flags.apply(base);

    let files = collect_inputs(&paths)?;
    info!(
        "Combining {} of {} file(s), {} per page, {:?}",
        files.len(),
        paths.len(),
        options.images_per_page.count(),
        options.orientation
    );

    let bytes = assemble(&files, &options)?;

    std::fs::write(&output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Combined to: {} ({} bytes)", output.display(), bytes.len());

    if open {
        open_file(&output)?;
    }

    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: PathBuf) -> anyhow::Result<()> {
    let summary = inspect_file(&input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", summary.page_count);

    for (i, (width, height)) in summary.page_sizes.iter().enumerate() {
        println!(
            "  Page {}: {:.1} x {:.1} mm",
            i + 1,
            width * 25.4 / 72.0,
            height * 25.4 / 72.0
        );
    }

    if let Some(title) = summary.title {
        println!("Title: {}", title);
    }
    if let Some(producer) = summary.producer {
        println!("Producer: {}", producer);
    }

    Ok(())
}
