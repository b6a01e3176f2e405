//! `aimpact` - Encrypted AI productivity impact reports
//!
//! This library provides the report model, the report form state machine and
//! its headless controller, the encrypt-and-upload pipeline, and the HTTP
//! server that stores encrypted reports and serves reference data.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod form;
pub mod logging;
pub mod machine;
pub mod reference;
pub mod report;
pub mod server;
pub mod storage;
pub mod submit;

pub use config::Config;
pub use error::{Error, Result};
pub use form::{FormController, FormHandle, FormOptions, FormSnapshot, ReportService};
pub use logging::init_logging;
pub use machine::{FormEvent, FormMachine, FormState};
pub use report::{ReportFormContext, ReportRow, ReportStatus};
pub use storage::{BlobId, BlobStore, StorageStats};
