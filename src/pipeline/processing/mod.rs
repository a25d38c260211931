// Row-wise processing stages applied after ingestion

pub mod clean;

pub use clean::{Cleaner, MovieCleaner};
