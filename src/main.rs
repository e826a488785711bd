//! # Carteles CLI
//!
//! Command-line interface for binding product data into cartel templates
//! and printing them.
//!
//! ## Usage
//!
//! ```bash
//! # List stored templates
//! carteles templates
//!
//! # Fields a variant displays
//! carteles fields oferta porcentaje
//!
//! # HTML preview with edits applied
//! carteles render --catalog productos.json --family oferta --variant porcentaje \
//!     --edits cambios.json --output carteles.html
//!
//! # Print (edited selections need a justification)
//! carteles print --catalog productos.json --family oferta --variant porcentaje \
//!     --edits cambios.json --justification "Precio acordado con el proveedor"
//!
//! # HTTP API
//! carteles serve --catalog productos.json --listen 0.0.0.0:8080
//! ```

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use carteles::{
    CartelError,
    catalog::{InMemoryCatalog, ProductCatalog},
    config::EngineConfig,
    document::{PageFormat, PrintConfiguration},
    logging::{self, LogFormat},
    print::{HtmlFileSurface, PrintMode},
    server::{self, ServerConfig},
    session::PrintSession,
    template::{InMemoryTemplateStore, TemplateStore},
};

/// Carteles - retail price poster engine
#[derive(Parser, Debug)]
#[command(name = "carteles")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Engine configuration (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct TemplateArgs {
    /// Directory of extra template JSON files
    #[arg(long, value_name = "DIR")]
    templates: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct JobArgs {
    /// Product catalog (JSON array)
    #[arg(long, value_name = "FILE")]
    catalog: PathBuf,

    /// Template family
    #[arg(long)]
    family: String,

    /// Template variant
    #[arg(long)]
    variant: String,

    /// Products to print, in order (default: the whole catalog)
    #[arg(long, value_delimiter = ',')]
    products: Vec<String>,

    /// Edits to apply (JSON array of {productId, field, value})
    #[arg(long, value_name = "FILE")]
    edits: Option<PathBuf>,

    /// Page format: a4, a4-landscape, a5, a3, letter, or WIDTHxHEIGHT in mm
    #[arg(long, default_value = "a4")]
    page_format: PageFormat,

    /// Stack cartels without page breaks
    #[arg(long)]
    no_page_breaks: bool,

    #[command(flatten)]
    templates: TemplateArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List stored template variants
    Templates {
        #[command(flatten)]
        templates: TemplateArgs,
    },

    /// Show the fields a template variant displays
    Fields {
        family: String,
        variant: String,

        #[command(flatten)]
        templates: TemplateArgs,
    },

    /// Write the assembled HTML document without printing
    Render {
        #[command(flatten)]
        job: JobArgs,

        /// Output file
        #[arg(long, short, default_value = "carteles.html")]
        output: PathBuf,
    },

    /// Print through the audit gate
    Print {
        #[command(flatten)]
        job: JobArgs,

        /// Why edited values differ from the catalog
        #[arg(long, default_value = "")]
        justification: String,

        /// Where print jobs are written (overrides the configuration)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Command receiving the job file, e.g. `lp`
        #[arg(long)]
        print_command: Option<String>,
    },

    /// Serve the HTTP API
    Serve {
        /// Product catalog (JSON array)
        #[arg(long, value_name = "FILE")]
        catalog: PathBuf,

        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,

        #[command(flatten)]
        templates: TemplateArgs,
    },
}

/// One typed edit from an edits file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditEntry {
    product_id: String,
    field: String,
    value: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        if let Some(hint) = e.guidance() {
            eprintln!("{}", hint);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CartelError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Templates { templates } => {
            let store = load_store(&templates)?;
            println!("Available templates:");
            for (family, variant) in store.variants() {
                println!("  {}/{}", family, variant);
            }
            Ok(())
        }

        Commands::Fields {
            family,
            variant,
            templates,
        } => {
            let store = load_store(&templates)?;
            let session = PrintSession::from_config(
                config,
                Arc::new(store),
                Arc::new(InMemoryCatalog::default()),
            )?;
            let fields = session.field_set(&family, &variant)?;
            println!("Fields of {}/{}:", family, variant);
            for descriptor in fields.iter() {
                println!(
                    "  {:<22} {:<28} {:?}{}",
                    descriptor.field.as_str(),
                    descriptor.label,
                    descriptor.value_type,
                    if descriptor.required { " (required)" } else { "" }
                );
            }
            Ok(())
        }

        Commands::Render { job, output } => {
            let (session, print) = prepare(config, &job)?;
            let document = session.preview(&print).await?;
            std::fs::write(&output, document.to_html())?;
            println!(
                "Wrote {} page(s) to {}",
                document.page_count(),
                output.display()
            );
            Ok(())
        }

        Commands::Print {
            job,
            justification,
            output_dir,
            print_command,
        } => {
            let mut config = config;
            if let Some(dir) = output_dir {
                config.print.output_dir = dir;
            }
            if print_command.is_some() {
                config.print.print_command = print_command;
            }
            let mut surface = HtmlFileSurface::from_config(&config.print);

            let (session, print) = prepare(config, &job)?;
            let receipt = session
                .confirm_print(&print, &justification, &mut surface)
                .await?;

            if receipt.outcome.mode == PrintMode::OnScreenFallback {
                println!("Printed through the fallback path");
            }
            if let Some(report) = &receipt.report {
                println!(
                    "Change report {} sent ({} change(s))",
                    report.id,
                    report.change_count()
                );
            }
            if let Some(path) = surface.job_path() {
                println!(
                    "Printed {} page(s): {}",
                    receipt.outcome.pages,
                    path.display()
                );
            }
            Ok(())
        }

        Commands::Serve {
            catalog,
            listen,
            templates,
        } => {
            let store = load_store(&templates)?;
            let catalog = InMemoryCatalog::load(&catalog)?;
            let session = PrintSession::from_config(config, Arc::new(store), Arc::new(catalog))?;
            server::serve(ServerConfig { listen_addr: listen }, session).await
        }
    }
}

fn load_store(args: &TemplateArgs) -> Result<InMemoryTemplateStore, CartelError> {
    let mut store = InMemoryTemplateStore::builtin();
    if let Some(dir) = &args.templates {
        store.load_dir(dir)?;
    }
    Ok(store)
}

fn load_edits(path: &Path) -> Result<Vec<EditEntry>, CartelError> {
    let json = std::fs::read_to_string(path)?;
    serde_json::from_str(&json)
        .map_err(|e| CartelError::Config(format!("Malformed edits file {}: {}", path.display(), e)))
}

/// Build a session with the job's edits applied, and the print configuration.
fn prepare(
    config: EngineConfig,
    job: &JobArgs,
) -> Result<(PrintSession, PrintConfiguration), CartelError> {
    let store = load_store(&job.templates)?;
    let catalog = InMemoryCatalog::load(&job.catalog)?;

    let products = if job.products.is_empty() {
        catalog.products().into_iter().map(|p| p.id).collect()
    } else {
        job.products.clone()
    };

    let mut session = PrintSession::from_config(config, Arc::new(store), Arc::new(catalog))?;
    if let Some(path) = &job.edits {
        for edit in load_edits(path)? {
            session.edit_field(&edit.product_id, &edit.field, &edit.value)?;
        }
    }

    let print = PrintConfiguration::new(&job.family, &job.variant, products)
        .page_format(job.page_format)
        .page_break_per_product(!job.no_page_breaks);
    Ok((session, print))
}
