//! Renderers for exported artifacts

mod csv;
mod qr;

pub use self::csv::{export_file_name, render_codes_csv, CSV_HEADER};
pub use qr::QrRenderer;
