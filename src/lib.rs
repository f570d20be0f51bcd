//! # glossa-core
//!
//! Profile validation and output-parser simulation for translation pipeline configuration.
//!
//! ## Overview
//!
//! A translation pipeline is assembled from named *profiles* of six kinds: `api` endpoints,
//! `prompt` templates, output `parser` grammars, line-alignment `policy` rules, `chunk`
//! strategies, and `pipeline` profiles that wire one of each together. Profiles are authored as
//! YAML (or JSON) documents.
//!
//! glossa-core is the logic underneath a profile editor:
//!
//! - **[`validate`]**: decides whether a document is well formed and whether its references to
//!   other profiles hold, returning symbolic error and warning codes.
//! - **[`parser`]**: runs an output-parser profile against sample model output, including `any`
//!   cascades that try several parsers in order. This powers a live preview.
//! - **[`reconcile`]**: repairs pipeline references after a profile is renamed or deleted.
//! - **[`sync`]**: keeps an editor form and its document text in step, debounced and without
//!   losing fields the form does not know about.
//! - **[`store`]**: the persistence seam ([`store::ProfileStore`]) with in-memory and
//!   directory-backed implementations, and **[`manager`]** tying validation, storage and repair
//!   together.
//!
//! ## Quick Start
//!
//! ### Previewing a parser
//!
//! ```rust
//! use glossa_core::{document::ParserSpec, parser};
//!
//! let spec = ParserSpec::new("tagged_line").with_option("sort_by_id", true);
//! let output = parser::run(&spec, "@@2@@world\n@@1@@hello").unwrap();
//! assert_eq!(output.lines, vec!["hello", "world"]);
//! ```
//!
//! ### Validating a pipeline
//!
//! ```rust
//! use glossa_core::{
//!     document::ProfileDocument,
//!     properties::ProfileKind,
//!     validate::{validate, ReferenceIndex},
//! };
//!
//! let doc = ProfileDocument::parse(
//!     ProfileKind::Pipeline,
//!     "id: main\nname: Main\nprovider: gpt\nprompt: default\nparser: plain\nchunk_policy: blocks\n",
//! )
//! .unwrap();
//! let index = ReferenceIndex::new()
//!     .with(ProfileKind::Api, &["claude"])
//!     .with(ProfileKind::Prompt, &["default"])
//!     .with(ProfileKind::Parser, &["plain"])
//!     .with(ProfileKind::Chunk, &["blocks"]);
//! let report = validate(&doc, &index);
//! assert_eq!(report.error_codes(), vec!["missing_reference:api:gpt"]);
//! ```
//!
//! ### Saving through a store
//!
//! ```rust,no_run
//! use glossa_core::{manager::ProfileManager, properties::ProfileKind, store::DirProfileStore};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = ProfileManager::new(DirProfileStore::new("./profiles"));
//!     let outcome = manager
//!         .save(ProfileKind::Parser, "id: plain\nname: Plain\ntype: plain\n", false)
//!         .await?;
//!     for warning in outcome.warnings {
//!         println!("warning: {warning}");
//!     }
//!     // Deleting repoints pipelines at another parser, or clears the reference
//!     let report = manager.delete(ProfileKind::Parser, "plain").await?;
//!     println!("{} pipelines updated", report.updated);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Codes
//!
//! Validation and parsing never report free-form messages to callers. Validation yields
//! [`validate::ValidationCode`]s (`invalid_timeout`, `missing_reference:api:gpt`, ...) and the
//! interpreter yields [`parser::ParseFailure`]s with a fixed [`code`](parser::ParseFailure::code).
//! Turning codes into localized text is left to the application.
//!
//! ## Features
//!
//! - **default**: the library
//! - **bin**: the `glossa` command line tool (`validate` a profile directory, `preview` a parser)

pub mod config;
pub mod document;
pub mod error;
pub mod manager;
pub mod parser;
pub mod properties;
pub mod reconcile;
pub mod store;
pub mod sync;
#[cfg(test)]
mod tests;
pub mod validate;

pub use error::*;
