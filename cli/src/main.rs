//! docling-reader CLI - load converted documents as records

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};

use docling_reader::{
    convert_file, DoclingReader, ExportType, JsonFormat, MarkdownOptions, PageSelection,
};

#[derive(Parser)]
#[command(name = "docling-reader")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Load DoclingDocument conversions as Markdown or JSON records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load sources as records (one JSON object per line)
    Load {
        /// Source files or URIs
        #[arg(value_name = "SOURCE", required = true)]
        sources: Vec<String>,

        /// Text export of each record
        #[arg(short, long, value_enum, default_value = "markdown", env = "DOCLING_READER_EXPORT")]
        export: ExportMode,

        /// Metadata attached to every record, as a JSON object
        #[arg(long, value_name = "JSON")]
        extra_info: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Pretty-print each record
        #[arg(long)]
        pretty: bool,
    },

    /// Convert a source to Markdown
    #[command(alias = "md")]
    Markdown {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Render page headers and footers too
        #[arg(long)]
        include_furniture: bool,

        /// Escape underscores outside code
        #[arg(long)]
        escape_underscores: bool,

        /// Text emitted for each picture
        #[arg(long, value_name = "TEXT")]
        image_placeholder: Option<String>,

        /// Table rendering mode
        #[arg(long, value_enum, default_value = "markdown")]
        table_mode: TableMode,

        /// Maximum heading level (1-6)
        #[arg(long, default_value = "6")]
        max_heading: u8,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Convert a source to plain text
    Text {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Convert a source to DoclingDocument JSON
    Json {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show document information
    Info {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ExportMode {
    /// Markdown join of the body text
    Markdown,
    /// Canonical DoclingDocument JSON
    Json,
}

impl From<ExportMode> for ExportType {
    fn from(mode: ExportMode) -> Self {
        match mode {
            ExportMode::Markdown => ExportType::Markdown,
            ExportMode::Json => ExportType::Json,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TableMode {
    /// Standard Markdown tables
    Markdown,
    /// HTML tables for merged cells
    Html,
}

impl From<TableMode> for docling_reader::TableFallback {
    fn from(mode: TableMode) -> Self {
        match mode {
            TableMode::Markdown => docling_reader::TableFallback::Markdown,
            TableMode::Html => docling_reader::TableFallback::Html,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Load {
            sources,
            export,
            extra_info,
            output,
            pretty,
        }) => cmd_load(
            &sources,
            export,
            extra_info.as_deref(),
            output.as_deref(),
            pretty,
        ),
        Some(Commands::Markdown {
            input,
            output,
            include_furniture,
            escape_underscores,
            image_placeholder,
            table_mode,
            max_heading,
            pages,
        }) => cmd_markdown(
            &input,
            output.as_deref(),
            include_furniture,
            escape_underscores,
            image_placeholder,
            table_mode,
            max_heading,
            pages.as_deref(),
        ),
        Some(Commands::Text { input, output }) => cmd_text(&input, output.as_deref()),
        Some(Commands::Json {
            input,
            output,
            compact,
        }) => cmd_json(&input, output.as_deref(), compact),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: docling-reader <COMMAND>".yellow());
            println!("       docling-reader --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn parse_extra_info(raw: &str) -> Result<Map<String, Value>, Box<dyn std::error::Error>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(format!("extra info must be a JSON object, got {}", other).into()),
    }
}

fn cmd_load(
    sources: &[String],
    export: ExportMode,
    extra_info: Option<&str>,
    output: Option<&Path>,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = DoclingReader::builder().export_type(export.into());
    if let Some(raw) = extra_info {
        builder = builder.extra_info(parse_extra_info(raw)?);
    }
    let reader = builder.build();

    let mut sink: Box<dyn Write> = match output {
        Some(path) => Box::new(fs::File::create(path)?),
        None => Box::new(std::io::stdout().lock()),
    };

    // Progress goes to stderr, so only draw it when records go to a file.
    let pb = if output.is_some() {
        ProgressBar::new(sources.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut count = 0;
    for (source, record) in sources.iter().zip(reader.lazy_load_many(sources.iter().cloned())) {
        pb.set_message(source.clone());
        let record = record.map_err(|e| format!("{}: {}", source, e))?;
        let line = if pretty {
            serde_json::to_string_pretty(&record)?
        } else {
            serde_json::to_string(&record)?
        };
        writeln!(sink, "{}", line)?;
        count += 1;
        pb.inc(1);
    }
    sink.flush()?;
    pb.finish_with_message("Done!");

    if let Some(path) = output {
        println!(
            "{} {} records to {}",
            "Saved".green(),
            count,
            path.display()
        );
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_markdown(
    input: &Path,
    output: Option<&Path>,
    include_furniture: bool,
    escape_underscores: bool,
    image_placeholder: Option<String>,
    table_mode: TableMode,
    max_heading: u8,
    pages: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let page_selection = if let Some(p) = pages {
        PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?
    } else {
        PageSelection::All
    };

    let mut options = MarkdownOptions::new()
        .with_furniture(include_furniture)
        .with_escape_underscores(escape_underscores)
        .with_table_fallback(table_mode.into())
        .with_max_heading(max_heading)
        .with_pages(page_selection);
    if let Some(placeholder) = image_placeholder {
        options = options.with_image_placeholder(placeholder);
    }

    let markdown = docling_reader::to_markdown_with_options(input, &options)?;
    emit(output, &markdown)
}

fn cmd_text(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let text = docling_reader::to_text(input)?;
    emit(output, &text)
}

fn cmd_json(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = docling_reader::to_json(input, format)?;
    emit(output, &json)
}

fn emit(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let doc = convert_file(input)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Name".bold(), doc.name);
    println!("{}: {} {}", "Schema".bold(), doc.schema_name, doc.version);
    if let Some(ref origin) = doc.origin {
        println!("{}: {}", "Type".bold(), origin.mimetype);
        println!("{}: {:016x}", "Hash".bold(), origin.binary_hash);
    }
    println!("{}: {}", "Pages".bold(), doc.pages.len());
    println!(
        "{}: {}",
        "Valid tree".bold(),
        match doc.validate() {
            Ok(()) => "Yes".to_string(),
            Err(e) => format!("No ({})", e),
        }
    );

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let text = doc.plain_text();
    println!("{}: {}", "Words".bold(), text.split_whitespace().count());
    println!("{}: {}", "Characters".bold(), text.chars().count());
    println!("{}: {}", "Texts".bold(), doc.texts.len());
    println!("{}: {}", "Groups".bold(), doc.groups.len());
    println!("{}: {}", "Tables".bold(), doc.tables.len());
    println!("{}: {}", "Pictures".bold(), doc.pictures.len());

    Ok(())
}

fn cmd_version() {
    println!(
        "{} {}",
        "docling-reader".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("DoclingDocument reader for retrieval pipelines");
    println!();
    println!(
        "Repository: {}",
        "https://github.com/iyulab/docling-reader".dimmed()
    );
    println!("License: MIT");
}
