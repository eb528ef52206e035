//! File I/O, validation, and serialization for the proteus pipeline.

mod domain;
mod error;
mod reader;
mod shapelet_file;
mod writer;

pub use domain::{ExperimentName, LoadedDataset, SeriesId};
pub use error::IoError;
pub use reader::DatasetReader;
pub use shapelet_file::{read_shapelets, write_shapelets};
pub use writer::ResultWriter;
