//! OCR fallback for scanned (image-only) PDFs
//!
//! Pages are rasterized with `pdftoppm` (poppler-utils) and each image is read
//! with `tesseract`. Both steps sit behind traits so the fallback can be driven
//! by other engines, or by fakes in tests.

use crate::error::{Result, ResumeRankerError};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Renders every page of a PDF to an image file inside `out_dir`, in page order.
pub trait PageRasterizer: Send + Sync {
    fn render_pages(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Image to text.
pub trait OcrEngine: Send + Sync {
    fn image_to_text(&self, image: &Path) -> Result<String>;
}

pub struct PdftoppmRasterizer {
    pub dpi: u32,
}

impl PageRasterizer for PdftoppmRasterizer {
    fn render_pages(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let output_prefix = out_dir.join("page");

        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(pdf)
            .arg(&output_prefix)
            .output()
            .map_err(|e| ResumeRankerError::Ocr(format!("Failed to run pdftoppm: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResumeRankerError::Ocr(format!("pdftoppm failed: {}", stderr.trim())));
        }

        // pdftoppm zero-pads page numbers to a common width, so a lexical sort is page order
        let mut images: Vec<PathBuf> = std::fs::read_dir(out_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|ext| ext == "png").unwrap_or(false))
            .collect();
        images.sort();

        if images.is_empty() {
            return Err(ResumeRankerError::Ocr("pdftoppm produced no images".to_string()));
        }

        Ok(images)
    }
}

pub struct TesseractOcr {
    pub language: String,
}

impl OcrEngine for TesseractOcr {
    fn image_to_text(&self, image: &Path) -> Result<String> {
        let output = Command::new("tesseract")
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| ResumeRankerError::Ocr(format!("Failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("tesseract reported a problem on {}: {}", image.display(), stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Rasterize-then-recognize pipeline used when a PDF has no text layer.
pub struct OcrFallback {
    rasterizer: Box<dyn PageRasterizer>,
    engine: Box<dyn OcrEngine>,
}

impl OcrFallback {
    pub fn new(rasterizer: Box<dyn PageRasterizer>, engine: Box<dyn OcrEngine>) -> Self {
        Self { rasterizer, engine }
    }

    /// Poppler + Tesseract with the given resolution and language.
    pub fn tesseract(dpi: u32, language: &str) -> Self {
        Self::new(
            Box::new(PdftoppmRasterizer { dpi }),
            Box::new(TesseractOcr { language: language.to_string() }),
        )
    }

    /// Check if OCR tools (pdftoppm and tesseract) are available on the system
    pub fn tools_available() -> bool {
        let pdftoppm = Command::new("pdftoppm").arg("-v").output().is_ok();
        let tesseract = Command::new("tesseract").arg("--version").output().is_ok();

        if !pdftoppm {
            debug!("pdftoppm not found - install poppler-utils for OCR support");
        }
        if !tesseract {
            debug!("tesseract not found - install tesseract-ocr for OCR support");
        }

        pdftoppm && tesseract
    }

    /// OCR every page and concatenate the output in page order.
    pub fn recognize(&self, pdf: &Path) -> Result<String> {
        let temp_dir = tempfile::tempdir()?;
        let images = self.rasterizer.render_pages(pdf, temp_dir.path())?;

        info!("Running OCR on {} page(s) of {}", images.len(), pdf.display());

        let mut pages = Vec::with_capacity(images.len());
        for image in &images {
            pages.push(self.engine.image_to_text(image)?);
        }

        Ok(pages.join("\n"))
    }
}
