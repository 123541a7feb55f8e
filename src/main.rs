//! resume-ranker: structured resume extraction and job-description ranking

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use resume_ranker::cli::{self, Cli, Commands, ConfigAction, ModelAction};
use resume_ranker::config::Config;
use resume_ranker::error::{Result, ResumeRankerError};
use resume_ranker::input::InputManager;
use resume_ranker::nlp::model_manager::ModelManager;
use resume_ranker::nlp::NlpContext;
use resume_ranker::output::csv_export::write_csv;
use resume_ranker::output::formatter::ConsoleFormatter;
use resume_ranker::processing::{BatchOutcome, JobDescription, RankingEngine, ResumePipeline};
use std::path::{Path, PathBuf};
use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, &config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: &Path) -> Result<()> {
    match command {
        Commands::Parse { files, csv, no_summary } => {
            let (outcome, _nlp) = process_resumes(&config, &files, no_summary).await?;
            let formatter = ConsoleFormatter::new(config.output.color_output);

            print!("{}", formatter.format_records(&outcome.records));
            print!("{}", formatter.format_failures(&outcome.failures));

            export(&outcome, csv.as_deref().unwrap_or(config.output.csv_path.as_path()))?;
        }

        Commands::Rank {
            files,
            job,
            job_text,
            csv,
            no_summary,
        } => {
            let job = read_job_description(job.as_deref(), job_text).await?;
            let (outcome, nlp) = process_resumes(&config, &files, no_summary).await?;
            let formatter = ConsoleFormatter::new(config.output.color_output);
            let csv_path = csv.unwrap_or_else(|| config.output.csv_path.clone());

            print!("{}", formatter.format_failures(&outcome.failures));

            match RankingEngine::new(nlp.embedder.as_ref()).rank(&outcome.records, &job) {
                Ok(ranking) => {
                    print!("{}", formatter.format_ranking(&ranking));
                    let ranked: Vec<_> = ranking.records().cloned().collect();
                    if !ranked.is_empty() {
                        write_csv(&csv_path, &ranked)?;
                    }
                }
                Err(e) => {
                    // Records are still worth showing; the run still fails
                    warn!("Ranking failed, showing records unranked");
                    print!("{}", formatter.format_records(&outcome.records));
                    export(&outcome, &csv_path)?;
                    return Err(e);
                }
            }
        }

        Commands::Models { action } => {
            let mut model_manager = ModelManager::new(config.models_dir().clone()).await?;

            match action {
                ModelAction::List => {
                    println!("Available Models\n");
                    let mut models = model_manager.list_available_models();
                    models.sort_by(|a, b| a.0.cmp(b.0));

                    for (id, model) in models {
                        let status = if model_manager.is_model_downloaded(id) {
                            "downloaded"
                        } else {
                            "available"
                        };
                        println!(
                            "  • {} ({}) - {} - {} MB [{}]",
                            id, model.repo_id, model.kind, model.size_mb, status
                        );
                        println!("    {}", model.description);
                    }
                    println!("\nDownload with: resume-ranker models download <id>");
                }

                ModelAction::Download { model, force } => {
                    let model_id = model_manager.resolve_model_id(&model).unwrap_or(model);
                    if !force && model_manager.is_model_downloaded(&model_id) {
                        println!("Model '{}' is already downloaded (use --force to re-download)", model_id);
                        return Ok(());
                    }

                    let model_path = model_manager.download_model(&model_id, force).await?;
                    println!("Model '{}' downloaded to {}", model_id, model_path.display());
                }

                ModelAction::Info { model } => {
                    let model_id = model_manager
                        .resolve_model_id(&model)
                        .ok_or_else(|| ResumeRankerError::InvalidInput(format!("Unknown model: {}", model)))?;
                    let model_info = model_manager
                        .get_model_info(&model_id)
                        .ok_or_else(|| ResumeRankerError::InvalidInput(format!("Unknown model: {}", model)))?;

                    println!("Name: {}", model_info.name);
                    println!("Repository: {}", model_info.repo_id);
                    println!("Capability: {}", model_info.kind);
                    println!("Size: {} MB", model_info.size_mb);
                    println!("Description: {}", model_info.description);

                    if model_manager.is_model_downloaded(&model_id) {
                        println!("Location: {}", model_manager.models_dir().join(&model_id).display());
                    } else {
                        println!("Status: not downloaded (resume-ranker models download {})", model_id);
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                let content = toml::to_string_pretty(&config)
                    .map_err(|e| ResumeRankerError::Configuration(format!("Failed to serialize config: {}", e)))?;
                println!("# {}\n{}", config_path.display(), content);
            }

            Some(ConfigAction::Reset) => {
                Config::default().save_to(config_path)?;
                println!("Configuration reset to defaults at {}", config_path.display());
            }

            Some(ConfigAction::Path) => {
                println!("{}", config_path.display());
            }
        },
    }

    Ok(())
}

/// Load models and run every file through the pipeline. Skipped documents are in
/// `outcome.failures`; only batch-fatal errors come back as `Err`.
async fn process_resumes(config: &Config, files: &[PathBuf], no_summary: bool) -> Result<(BatchOutcome, NlpContext)> {
    info!("Processing {} resume(s)", files.len());

    let nlp = NlpContext::from_config(config, !no_summary).await?;
    let mut pipeline = ResumePipeline::new(config)?;
    if no_summary {
        pipeline = pipeline.without_summary();
    }
    let mut input = InputManager::from_config(&config.extraction);

    let progress = if files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .map_err(|e| ResumeRankerError::OutputFormatting(e.to_string()))?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let outcome = pipeline
        .process_batch(&mut input, files, &nlp, |path| {
            if let Some(pb) = &progress {
                pb.set_message(path.display().to_string());
                pb.inc(1);
            }
        })
        .await?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Ok((outcome, nlp))
}

async fn read_job_description(job: Option<&Path>, job_text: Option<String>) -> Result<JobDescription> {
    let text = match (job, job_text) {
        (_, Some(text)) => text,
        (Some(path), None) => {
            cli::validate_file_extension(path, &["txt", "md"])
                .map_err(|e| ResumeRankerError::InvalidInput(format!("Job description file: {}", e)))?;
            tokio::fs::read_to_string(path).await?
        }
        (None, None) => {
            return Err(ResumeRankerError::InvalidInput(
                "A job description is required (--job or --job-text)".to_string(),
            ))
        }
    };

    if text.trim().is_empty() {
        return Err(ResumeRankerError::InvalidInput("Job description is empty".to_string()));
    }
    Ok(JobDescription::new(text))
}

fn export(outcome: &BatchOutcome, path: &Path) -> Result<()> {
    if outcome.records.is_empty() {
        warn!("No records to export");
        return Ok(());
    }
    write_csv(path, &outcome.records)
}
