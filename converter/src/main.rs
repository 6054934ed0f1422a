//! Bingo goals CLI - convert the goal sheet to the goal list and back
//!
//! # Main Commands
//!
//! ```bash
//! bingo-goals sync                     # Download (if needed) and convert goals.csv
//! bingo-goals to-json goals.csv        # Convert a CSV file to JSON
//! bingo-goals to-csv goal-list.json    # Convert a goal list back to CSV
//! ```
//!
//! # Other Commands
//!
//! ```bash
//! bingo-goals fetch --force            # Download the sheet only
//! bingo-goals validate goal-list.json  # Check a goal list against its schema
//! bingo-goals schema current           # Print a built-in schema
//! bingo-goals categories               # Print the canonical category order
//! ```

use bingo_goals::logs::{log_error, log_info, log_success, log_warning};
use bingo_goals::{
    canonical_categories, convert_csv_file, convert_json_file, csv_to_json, json_to_csv,
    load_categories, parse_document_str, read_text_file, validate_document, BlankRowPolicy,
    Config, ErrorPolicy, RowPolicy, Schema, SheetCache, SheetFetcher, BUILTIN_SCHEMAS,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bingo-goals")]
#[command(about = "Convert the bingo goal sheet (CSV) to the goal list (JSON) and back", long_about = None)]
struct Cli {
    /// Built-in schema name or schema JSON file (default: GOALS_SCHEMA or "legacy")
    #[arg(long, global = true)]
    schema: Option<String>,

    /// Override the schema's blank row handling
    #[arg(long, global = true, value_enum)]
    blank_rows: Option<BlankRowsArg>,

    /// Override the schema's bad row handling
    #[arg(long, global = true, value_enum)]
    on_error: Option<OnErrorArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the sheet if needed, convert it and write the goal list
    Sync {
        /// Download even if a cached CSV exists
        #[arg(short, long)]
        force: bool,

        /// Cached CSV path (default: GOALS_CSV or goals.csv)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Output JSON path (default: GOALS_JSON or goal-list.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip validation against the published document schema
        #[arg(long)]
        no_validate: bool,
    },

    /// Convert a CSV file to a JSON goal list
    ToJson {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip validation against the published document schema
        #[arg(long)]
        no_validate: bool,
    },

    /// Convert a JSON goal list to CSV
    ToCsv {
        /// Input JSON file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Category order file (JSON array or one name per line)
        #[arg(long)]
        categories: Option<PathBuf>,
    },

    /// Download the sheet into the local cache
    Fetch {
        /// Download even if a cached CSV exists
        #[arg(short, long)]
        force: bool,

        /// Cached CSV path (default: GOALS_CSV or goals.csv)
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Validate a JSON goal list against the published document schema
    Validate {
        /// Input JSON file
        input: PathBuf,
    },

    /// Print a built-in schema as JSON
    Schema {
        /// Built-in schema name
        #[arg(default_value = "legacy")]
        name: String,
    },

    /// Print the canonical category order
    Categories,
}

#[derive(Clone, Copy, ValueEnum)]
enum BlankRowsArg {
    Skip,
    Terminate,
}

#[derive(Clone, Copy, ValueEnum)]
enum OnErrorArg {
    Skip,
    Abort,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = Config::from_env();
    let cli = Cli::parse();

    let result = run(cli, config).await;

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Commands::Schema { name } => return cmd_schema(name),
        Commands::Categories => return cmd_categories(),
        _ => {}
    }

    let schema = load_schema(
        cli.schema.as_deref().unwrap_or(&config.schema),
        cli.blank_rows,
        cli.on_error,
    )?;

    match cli.command {
        Commands::Sync {
            force,
            csv,
            output,
            no_validate,
        } => {
            let csv = csv.unwrap_or_else(|| config.csv_path.clone());
            let output = output.unwrap_or_else(|| config.json_path.clone());
            cmd_sync(
                &schema,
                &config.sheet_url,
                &csv,
                &output,
                force || config.force_download,
                !no_validate,
            )
            .await
        }

        Commands::ToJson {
            input,
            output,
            no_validate,
        } => cmd_to_json(&schema, &input, output.as_deref(), !no_validate),

        Commands::ToCsv {
            input,
            output,
            categories,
        } => cmd_to_csv(&schema, &input, output.as_deref(), categories.as_deref()),

        Commands::Fetch { force, csv } => {
            let csv = csv.unwrap_or_else(|| config.csv_path.clone());
            cmd_fetch(&config.sheet_url, &csv, force || config.force_download).await
        }

        Commands::Validate { input } => cmd_validate(&schema, &input),

        Commands::Schema { .. } | Commands::Categories => Ok(()),
    }
}

/// Resolve the schema and apply the row policy overrides.
fn load_schema(
    name_or_path: &str,
    blank_rows: Option<BlankRowsArg>,
    on_error: Option<OnErrorArg>,
) -> Result<Schema, Box<dyn std::error::Error>> {
    let schema = Schema::resolve(name_or_path)?;
    let defaults = schema.rows();

    let rows = RowPolicy {
        blank_rows: match blank_rows {
            Some(BlankRowsArg::Skip) => BlankRowPolicy::Skip,
            Some(BlankRowsArg::Terminate) => BlankRowPolicy::Terminate,
            None => defaults.blank_rows,
        },
        on_error: match on_error {
            Some(OnErrorArg::Skip) => ErrorPolicy::Skip,
            Some(OnErrorArg::Abort) => ErrorPolicy::Abort,
            None => defaults.on_error,
        },
    };

    Ok(schema.with_rows(rows))
}

async fn cmd_sync(
    schema: &Schema,
    url: &str,
    csv: &Path,
    output: &Path,
    force: bool,
    validate: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    SheetCache::new(csv)
        .ensure(&SheetFetcher::new(), url, force)
        .await?;

    convert_csv_file(schema, csv, output, validate)?;
    Ok(())
}

fn cmd_to_json(
    schema: &Schema,
    input: &Path,
    output: Option<&Path>,
    validate: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            convert_csv_file(schema, input, path, validate)?;
        }
        None => {
            log_info(format!("Converting: {}", input.display()));
            let content = read_text_file(input)?;
            let (json, _) = csv_to_json(schema, &content, validate)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn cmd_to_csv(
    schema: &Schema,
    input: &Path,
    output: Option<&Path>,
    categories: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let order = match categories {
        Some(path) => load_categories(path)?,
        None => canonical_categories(),
    };

    match output {
        Some(path) => {
            convert_json_file(schema, input, path, &order)?;
        }
        None => {
            log_info(format!("Converting: {}", input.display()));
            let content = read_text_file(input)?;
            let (csv, _) = json_to_csv(schema, &content, &order)?;
            print!("{}", csv);
        }
    }

    Ok(())
}

async fn cmd_fetch(url: &str, csv: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let cache = SheetCache::new(csv);
    let sheet = cache.ensure(&SheetFetcher::new(), url, force).await?;

    match cache.info().await {
        Some(meta) => log_info(format!(
            "{} bytes from {} (fetched {})",
            meta.bytes, meta.source_url, meta.fetched_at
        )),
        None => log_warning(format!(
            "No download metadata for \"{}\"",
            csv.display()
        )),
    }
    log_success(format!(
        "{} lines in \"{}\"",
        sheet.text.lines().count(),
        csv.display()
    ));

    Ok(())
}

fn cmd_validate(schema: &Schema, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    log_info(format!("Validating: {}", input.display()));

    let content = read_text_file(input)?;
    let document = parse_document_str(schema, &content)?;
    validate_document(schema, &document)?;

    log_success(format!(
        "{} goals, document matches schema '{}'",
        document.record_count(),
        schema.name()
    ));
    Ok(())
}

fn cmd_schema(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let schema = Schema::builtin(name).ok_or_else(|| {
        format!(
            "Unknown built-in schema '{}' (available: {})",
            name,
            BUILTIN_SCHEMAS.join(", ")
        )
    })?;
    println!("{}", schema.to_json()?);
    Ok(())
}

fn cmd_categories() -> Result<(), Box<dyn std::error::Error>> {
    for category in canonical_categories() {
        println!("{}", category);
    }
    Ok(())
}
