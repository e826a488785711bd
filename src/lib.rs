//! # Carteles - Retail Price Poster Engine
//!
//! Carteles binds live product data into cartel templates, tracks edits
//! made before printing, and assembles print-ready documents. It provides:
//!
//! - **Field discovery**: which fields a template variant displays
//! - **Value resolution**: edited, catalog, or derived value per field
//! - **Edit tracking**: a per-product ledger that collapses reverted edits
//! - **Audit gate**: printing edited values needs a justification and a
//!   delivered change report
//! - **Document generation**: one scaled page per product, with fallbacks
//!   for missing artwork
//! - **Print execution**: a narrow surface port with an on-screen fallback
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use carteles::{
//!     catalog::{InMemoryCatalog, Product},
//!     config::EngineConfig,
//!     document::PrintConfiguration,
//!     print::HtmlFileSurface,
//!     session::PrintSession,
//!     template::InMemoryTemplateStore,
//! };
//!
//! # async fn example() -> Result<(), carteles::CartelError> {
//! let catalog = InMemoryCatalog::new([
//!     Product::new("P1", "Yerba 1kg", 3200.0).sku("100200"),
//!     Product::new("P2", "Aceite 1.5L", 2500.0).sku("100300"),
//! ]);
//! let mut session = PrintSession::from_config(
//!     EngineConfig::default(),
//!     Arc::new(InMemoryTemplateStore::builtin()),
//!     Arc::new(catalog),
//! )?;
//!
//! // Edit a price, then print with a justification
//! session.edit_field("P1", "precioActual", "2990")?;
//!
//! let config = PrintConfiguration::new("oferta", "porcentaje", ["P1", "P2"]);
//! let mut surface = HtmlFileSurface::new("print-jobs");
//! let receipt = session
//!     .confirm_print(&config, "Precio acordado con el proveedor", &mut surface)
//!     .await?;
//! println!("{} pages", receipt.outcome.pages);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`fields`] | Field vocabulary, registry, template introspection |
//! | [`template`] | Template trees and the template store |
//! | [`catalog`] | Products and the product catalog |
//! | [`value`] | Typed field values |
//! | [`resolve`] | Value resolver |
//! | [`ledger`] | Change ledger |
//! | [`audit`] | Audit gate and change reports |
//! | [`document`] | Print document generation |
//! | [`print`] | Print executor and surfaces |
//! | [`session`] | Session coordinator |
//! | [`server`] | HTTP API |
//! | [`config`] | Engine configuration |
//! | [`error`] | Error types |

pub mod audit;
pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod fields;
pub mod ledger;
pub mod logging;
pub mod print;
pub mod resolve;
pub mod server;
pub mod session;
pub mod template;
pub mod value;

// Re-exports for convenience
pub use error::CartelError;
pub use fields::{FieldId, FieldRegistry, FieldSet};
pub use ledger::ChangeLedger;
pub use resolve::ValueResolver;
pub use session::PrintSession;
