#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/atelier/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod columns;
pub mod dates;
pub mod error;
pub mod summary;
pub mod transactions;

pub use error::{DataError, Result};
pub use summary::SalesSummary;
pub use transactions::{Transaction, TransactionTable};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
