//! Input processing module
//! Handles file detection, text extraction, OCR fallback and word layout

pub mod file_detector;
pub mod layout;
pub mod manager;
pub mod ocr;
pub mod text_extractor;

pub use manager::InputManager;
pub use text_extractor::ExtractedDocument;
