//! Command-line interface for rmlformat

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::sync::Arc;

#[cfg(feature = "cli")]
use rmlformat::element::{Element, Node};
#[cfg(feature = "cli")]
use rmlformat::export::{to_json_string, DescriptionInfo};
#[cfg(feature = "cli")]
use rmlformat::locations::SearchPathResolver;
#[cfg(feature = "cli")]
use rmlformat::{Reader, SchemaSet};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "rmlformat")]
#[command(author, version, about = "RML document reader and schema inspector", long_about = None)]
struct Cli {
    /// Read the grammar from this directory instead of the bundled one
    #[arg(long, global = true, value_name = "DIR")]
    schema_dir: Option<PathBuf>,

    /// Map a URI prefix to colon-separated directories (URI=PATHS)
    #[arg(long = "uri-path", global = true, value_name = "URI=PATHS")]
    uri_paths: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Read a document and report whether it binds
    Check {
        /// Path to the document
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Read a document and print the bound tree
    Print {
        /// Path to the document
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,

        /// Pretty print JSON output
        #[arg(short, long)]
        pretty: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Display the grammar of an element
    Describe {
        /// Schema file to describe (defaults to the root)
        #[arg(value_name = "SCHEMA", default_value = "root.schema")]
        schema: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = build_reader(&cli).and_then(|reader| match cli.command {
        Commands::Check { file } => cmd_check(&reader, file),
        Commands::Print {
            file,
            json,
            pretty,
            output,
        } => cmd_print(&reader, file, json, pretty, output),
        Commands::Describe { schema, json } => cmd_describe(&reader, &schema, json),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn build_reader(cli: &Cli) -> Result<Reader, Box<dyn std::error::Error>> {
    let mut resolver = SearchPathResolver::from_env();
    for mapping in &cli.uri_paths {
        let (uri, paths) = mapping
            .split_once('=')
            .ok_or_else(|| format!("Invalid --uri-path '{}', expected URI=PATHS", mapping))?;
        resolver.add_uri_path(uri, paths);
    }

    let schemas = match &cli.schema_dir {
        Some(dir) => SchemaSet::from_dir(dir),
        None => SchemaSet::bundled(),
    };

    Ok(Reader::new()
        .with_schemas(Arc::new(schemas))
        .with_resolver(resolver))
}

#[cfg(feature = "cli")]
fn cmd_check(reader: &Reader, file: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let root = reader.read_file(&file)?;

    println!("✓ {} binds", file.display());
    println!("  Version: {}", root.original_version());
    for child in root.children() {
        let name = child
            .attribute("name")
            .map(|p| p.as_string())
            .unwrap_or_default();
        println!("  {} {}", child.name(), name);
    }
    println!("  Elements: {}", count_elements(&root));
    Ok(())
}

#[cfg(feature = "cli")]
fn count_elements(element: &Element) -> usize {
    1 + element.children().iter().map(count_elements).sum::<usize>()
}

#[cfg(feature = "cli")]
fn cmd_print(
    reader: &Reader,
    file: PathBuf,
    json: bool,
    pretty: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = reader.read_file(&file)?;

    let text = if json {
        to_json_string(&root, pretty)?
    } else {
        root.to_xml_string()
    };

    if let Some(output_path) = output {
        fs::write(output_path, &text)?;
    } else {
        println!("{}", text);
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_describe(reader: &Reader, schema: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let desc = reader.schemas().load(schema)?;

    if json {
        let info = DescriptionInfo::from(desc.as_ref());
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{}", desc.print_description());
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
