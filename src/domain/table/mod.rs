// ============================================================
// TABLE DOMAIN LAYER
// ============================================================
// Value objects shared by the loader, the inference engine and the cleaner
// No I/O, no async

mod cleaned_dataset;
mod column_info;
mod header_analysis;
mod raw_cell;
mod raw_grid;

pub use cleaned_dataset::{CellValue, CleanedDataset, CleanedRow};
pub use column_info::{ColumnInfo, ColumnType};
pub use header_analysis::{HeaderAnalysis, MergedCellSignal};
pub use raw_cell::RawCell;
pub use raw_grid::RawGrid;
