// List Data Controller - paginated, searchable, exportable record lists

pub mod columns;
pub mod controller;
pub mod export;
pub mod search;

pub use columns::{CellRenderer, ColumnDefinition};
pub use controller::{ListDataController, ListPage, ListSource, PageFetcher, PageRequest, RecordFilter, RecordMapper};
pub use export::{ExportColumn, ExportTable};
pub use search::{clean_term, search_records};
