//! Schema Validator CLI
//!
//! Validates JSON instances against stored schemas, and schema documents
//! against the draft 2020-12 meta-schema.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tenant_schemas::{
    InMemorySchemaStore, MetaSchemaValidator, RegistryError, SchemaConfig, SchemaServices,
    Violation,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-validator")]
#[command(about = "Validate JSON documents against registered schemas")]
struct Cli {
    /// Config file (defaults to schemas.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    /// Snapshot file, overriding the configured store path
    #[arg(short, long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a JSON instance against a stored schema
    Instance {
        /// Schema id, e.g. "2281_person_1.0"
        schema_id: String,
        /// File holding the instance
        file: PathBuf,
        /// Fail with "Constraint Violation" instead of listing violations
        #[arg(long)]
        strict: bool,
    },

    /// Check a schema document before registering it
    Schema {
        /// File holding the schema document
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

/// Returns whether the document was valid
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = SchemaConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Instance {
            schema_id,
            file,
            strict,
        } => {
            let input = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;

            let store_path = cli.store.unwrap_or_else(|| config.store_path());
            let store = Arc::new(InMemorySchemaStore::open(&store_path)?);
            let services = SchemaServices::from_config(store.clone(), &config)?;

            let outcome = if strict {
                services
                    .validation
                    .validate_and_throw(&input, &schema_id)
                    .map(|()| Vec::new())
            } else {
                services.validation.validate(&input, &schema_id)
            };

            // Every attempt is counted, including failed ones
            store.persist(&store_path)?;

            match outcome {
                Ok(violations) => Ok(report(&file, &violations)),
                Err(RegistryError::ValidationFailed { violations }) => {
                    println!("❌ {}: Constraint Violation", file.display());
                    print_violations(&violations);
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        }

        Commands::Schema { file } => {
            let document = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let validator = MetaSchemaValidator::new(config.compiler()?);
            Ok(report(&file, &validator.validate_document(&document)))
        }
    }
}

fn report(file: &std::path::Path, violations: &[Violation]) -> bool {
    if violations.is_empty() {
        println!("✅ {} - valid", file.display());
        true
    } else {
        println!("❌ {} - {} violation(s)", file.display(), violations.len());
        print_violations(violations);
        false
    }
}

fn print_violations(violations: &[Violation]) {
    for violation in violations {
        if violation.instance_location.is_empty() {
            println!("   └─ {}", violation.message);
        } else {
            println!("   └─ {}: {}", violation.instance_location, violation.message);
        }
    }
}
