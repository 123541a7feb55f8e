//! Console report and CSV export

pub mod csv_export;
pub mod formatter;

pub use csv_export::{read_csv, write_csv};
pub use formatter::ConsoleFormatter;
