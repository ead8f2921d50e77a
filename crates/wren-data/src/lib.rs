//! # wren-data
//!
//! Everything between a file on disk and the tensors a network trains on.
//!
//! - [`BatchIterator`] — shuffled, fixed-size mini-batches
//! - [`CsvTable`] / [`CsvConfig`] — numeric CSV loading
//! - [`transform`] — one-hot encoding and column scaling
//! - [`split`] — ordered train/test split

pub mod batch;
pub mod csv;
pub mod split;
pub mod transform;

pub use batch::{gather_rows, BatchIterator};
pub use csv::{parse_rows, CsvConfig, CsvTable};
pub use split::{split_rows, train_test_split, DataSplit};
pub use transform::{column_max, one_hot, scale, scale_by_column_max};
