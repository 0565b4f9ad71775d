//! Schema Registry CLI
//!
//! Create, inspect and delete tenant schemas and their UI schemas. State is
//! kept in a JSON snapshot between invocations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tenant_schemas::{
    InMemorySchemaStore, PageRequest, SchemaConfig, SchemaCreateRequest, SchemaRecord, SchemaServices,
    UiSchemaRequest,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-registry")]
#[command(about = "Manage versioned JSON schemas per tenant")]
struct Cli {
    /// Config file (defaults to schemas.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    /// Snapshot file, overriding the configured store path
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Tenant the command acts for
    #[arg(short, long)]
    tenant: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a schema document as a new version
    Create {
        /// Schema name
        #[arg(short, long)]
        name: String,
        /// Dotted numeric version, e.g. "1.2.0"
        #[arg(short = 'V', long)]
        version: String,
        /// File holding the schema document
        #[arg(short, long)]
        file: PathBuf,
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Show a schema by id
    Get { id: String },

    /// Show the greatest version of a schema
    Latest { name: String },

    /// List the tenant's schemas
    List {
        #[arg(short, long, default_value_t = 0)]
        page: usize,
        #[arg(long)]
        size: Option<usize>,
    },

    /// Delete a schema and its UI schema
    Delete { id: String },

    /// Verify the checksums of the tenant's stored documents
    Verify,

    /// Manage the UI schema of a schema
    Ui {
        #[command(subcommand)]
        command: UiCommands,
    },
}

#[derive(Subcommand)]
enum UiCommands {
    /// Show the UI schema
    Get { schema_id: String },

    /// Create or replace the UI schema from a JSON file
    Put {
        schema_id: String,
        #[arg(short, long)]
        file: PathBuf,
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete the UI schema
    Delete { schema_id: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = SchemaConfig::load_from(cli.config.as_deref())?;
    let store_path = cli.store.unwrap_or_else(|| config.store_path());

    let store = Arc::new(InMemorySchemaStore::open(&store_path)?);
    let services = SchemaServices::from_config(store.clone(), &config)?;
    let tenant = cli.tenant.as_str();

    let modified = match cli.command {
        Commands::Create {
            name,
            version,
            file,
            description,
        } => {
            let document = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let mut request = SchemaCreateRequest::new(name, version, document);
            request.description = description;

            let record = services.registry.create(tenant, request)?;
            println!("✅ Created {}", record.id);
            true
        }

        Commands::Get { id } => {
            print_record(&services.registry.get_by_id(tenant, &id)?)?;
            false
        }

        Commands::Latest { name } => {
            print_record(&services.registry.get_latest_by_name(tenant, &name)?)?;
            false
        }

        Commands::List { page, size } => {
            let page = services
                .registry
                .list(tenant, config.page_request(page, size))?;

            for record in &page.content {
                println!(
                    "{}  {}  {}  used {}x",
                    record.id,
                    record.version,
                    record.created_at.to_rfc3339(),
                    record.validation_usage_count
                );
            }
            println!(
                "page {} of {} ({} schemas)",
                page.page + 1,
                page.total_pages().max(1),
                page.total_elements
            );
            false
        }

        Commands::Delete { id } => {
            services.registry.delete(tenant, &id)?;
            println!("✅ Deleted {}", id);
            true
        }

        Commands::Verify => {
            let records = services
                .registry
                .list(tenant, PageRequest::unpaged())?;

            let mut all_valid = true;
            for record in &records.content {
                if record.verify_checksum() {
                    println!("  ✅ {} - valid", record.id);
                } else {
                    println!("  ❌ {} - INVALID", record.id);
                    all_valid = false;
                }
            }
            if !all_valid {
                bail!("checksum validation failed");
            }
            false
        }

        Commands::Ui { command } => run_ui(&services, tenant, command)?,
    };

    if modified {
        store.persist(&store_path)?;
    }
    Ok(())
}

fn run_ui(services: &SchemaServices, tenant: &str, command: UiCommands) -> anyhow::Result<bool> {
    match command {
        UiCommands::Get { schema_id } => {
            let ui_schema = services.ui_schemas.get(tenant, &schema_id)?;
            println!("{}", serde_json::to_string_pretty(&ui_schema)?);
            Ok(false)
        }

        UiCommands::Put {
            schema_id,
            file,
            description,
        } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let request = UiSchemaRequest {
                value: serde_json::from_str(&text)
                    .with_context(|| format!("parsing {}", file.display()))?,
                description,
            };

            let ui_schema = services
                .ui_schemas
                .create_or_replace(tenant, &schema_id, request)?;
            println!("✅ Stored UI schema {} on {}", ui_schema.id, schema_id);
            Ok(true)
        }

        UiCommands::Delete { schema_id } => {
            services.ui_schemas.delete(tenant, &schema_id)?;
            println!("✅ Deleted UI schema of {}", schema_id);
            Ok(true)
        }
    }
}

fn print_record(record: &SchemaRecord) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}
