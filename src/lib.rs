// Virginia Bills Dashboard - Core Library
// Exposes the headless pipeline for the TUI, the view server, and tests

pub mod bill;
pub mod status;      // Status Normalizer - source flags -> BillStatus
pub mod filter;      // Filter Engine
pub mod sort;        // Sort Engine
pub mod paginate;    // Paginator
pub mod store;       // Mutation Layer
pub mod validation;  // Add/edit form rules
pub mod export;      // CSV Exporter
pub mod source;      // GET /api/bills + boundary schema
pub mod dashboard;   // Session state + derived views
pub mod preferences;
pub mod error;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use bill::{Bill, BillDraft, BillPatch, BillStatus};
pub use status::{derive_status, StatusFlags};
pub use filter::{filter_bills, BillFilters};
pub use sort::{sort_bills, SortDirection, SortField, SortSpec};
pub use paginate::{paginate, total_pages, PAGE_SIZES};
pub use store::{BillStore, Clock, ManualClock, SystemClock};
pub use validation::{BillForm, FieldError};
pub use export::{export_filename, write_csv, EXPORT_PREFIX};
pub use source::{ApiClient, BillSource, ClientConfig, LoadReport, RawBill, StaticSource};
pub use dashboard::{page_view, sorted_view, Dashboard, LoadState, PageView, ViewQuery};
pub use preferences::Preferences;
pub use error::{BillError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
