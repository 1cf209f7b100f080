// Customer Extract - Core Library
// Exposes all modules for use in the CLI and tests

pub mod records;    // Raw customer → order → item input
pub mod coerce;     // Explicit fallible parses
pub mod category;   // Fixed category code table
pub mod transform;  // Flattening transformer
pub mod loader;     // VIP list + customer JSON
pub mod sink;       // CSV output
pub mod db;         // SQLite output
pub mod pipeline;   // load → flatten → write

// Re-export commonly used types
pub use records::{CustomerRecord, OrderRecord, ItemRecord, Entry};
pub use coerce::{CoerceError, CoerceResult};
pub use category::{CategoryMap, CATEGORY_MAP, FALLBACK_CATEGORY};
pub use transform::{
    OutputRow, FlattenReport, FlatteningTransformer, FieldError,
    flatten, flatten_with_report,
};
pub use loader::{
    load_vip_ids, load_customer_records, read_vip_ids, read_customer_records,
};
pub use sink::{write_table, write_table_to};
pub use db::{setup_database, insert_rows, count_rows, get_all_rows, write_database};
pub use pipeline::{Extractor, OutputFormat, PipelineConfig, run};
