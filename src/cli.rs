//! CLI interface for the resume ranker

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "resume-ranker")]
#[command(about = "Extract structured candidate records from resumes and rank them against a job description")]
#[command(long_about = "Parse PDF (including scanned) and DOCX resumes into name, contact details, sections, skills and an optional summary, then rank candidates by semantic similarity to a job description")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract and display one record per resume
    Parse {
        /// Resume files (PDF, DOCX)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// CSV export path (defaults to output.csv_path from the config)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Skip summarization
        #[arg(long)]
        no_summary: bool,
    },

    /// Rank resumes against a job description
    Rank {
        /// Resume files (PDF, DOCX)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Job description file (TXT, MD)
        #[arg(short, long, conflicts_with = "job_text", required_unless_present = "job_text")]
        job: Option<PathBuf>,

        /// Job description given inline
        #[arg(long)]
        job_text: Option<String>,

        /// CSV export path (defaults to output.csv_path from the config)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Skip summarization
        #[arg(long)]
        no_summary: bool,
    },

    /// Model management commands
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List known models
    List,

    /// Download a model
    Download {
        /// Model id or Hugging Face repo id
        model: String,

        /// Force re-download if model exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show model information
    Info {
        /// Model id
        model: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file location
    Path,
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}
