//! One-click app deployment client
//!
//! Building blocks of the `oneclick` binary: the HTTP platform client, a
//! dry-run platform that never leaves the process, the terminal progress
//! renderer and the client configuration file.
//!
//! # Example
//!
//! ```no_run
//! use oneclick::{client::CaptainClient, progress::TerminalProgress};
//! use oneclick_orchestration::OneClickOrchestrator;
//! use oneclick_template::{VariableValues, parser};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let template = parser::parse_file("wordpress.yml")?;
//!     let values = VariableValues::new("blog").with_defaults(&template);
//!
//!     let client =
//!         CaptainClient::login("https://captain.example.com", "secret", Duration::from_secs(60))
//!             .await?;
//!     let orchestrator = OneClickOrchestrator::new(Arc::new(client));
//!     let outcome = orchestrator
//!         .run(&template, &values, &TerminalProgress::new())
//!         .await;
//!     assert!(outcome.succeeded());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod dry_run;
pub mod progress;
