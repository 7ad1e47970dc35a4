use std::collections::HashSet;
use std::path::{Path, PathBuf};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::config::Config;
use crate::error::{Result, SrtError};
use crate::translate::{DeeplHandler, SrtTranslator, TranslationHandler};

pub struct Workflow {
    config: Config,
}

impl Workflow {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Translate `input_path` with DeepL into every configured target language.
    pub async fn translate_subtitles<P: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Option<&Path>,
        api_key: &str,
    ) -> Result<Vec<PathBuf>> {
        let input_path = input_path.as_ref();
        if !input_path.exists() {
            return Err(SrtError::FileNotFound(input_path.display().to_string()));
        }

        let handler = DeeplHandler::connect(&self.config.deepl, api_key).await?;
        self.run(Box::new(handler), input_path, output_path).await
    }

    /// Translate with an arbitrary handler and write one file per target language.
    pub async fn run(
        &self,
        handler: Box<dyn TranslationHandler>,
        input_path: &Path,
        output_path: Option<&Path>,
    ) -> Result<Vec<PathBuf>> {
        let targets = &self.config.translate.target_languages;
        let outputs = output_paths(input_path, output_path, targets)?;

        let used_before = handler.chars();
        info!("{} used of {} available.", used_before, handler.limit());

        let pb = progress_bar();
        let progress = pb.clone();
        let mut translator = SrtTranslator::new(handler)
            .with_quota_check(self.config.translate.check_quota)
            .with_progress(move |total, done| {
                progress.set_length(total as u64);
                progress.set_position(done as u64);
            });

        translator.add_input_file(input_path, &self.config.translate.source_language)?;

        for (target, path) in &outputs {
            info!("Translating {} into {}", input_path.display(), path.display());
            pb.reset();
            pb.set_message(target.clone());

            let result = translator.translate(target).await;
            pb.finish_and_clear();
            result?;

            translator.write(target, path)?;
        }

        info!(
            "Done. {} characters translated. Total {} so far.",
            translator.chars(),
            used_before + translator.chars()
        );

        Ok(outputs.into_iter().map(|(_, path)| path).collect())
    }
}

/// `movie.srt` translated into `EN-GB` becomes `movie.en.srt` next to the input.
pub fn default_output_path(input_path: &Path, target_language: &str) -> PathBuf {
    output_path_with_suffix(input_path, primary_subtag(target_language))
}

fn primary_subtag(target_language: &str) -> &str {
    target_language
        .split(['-', '_'])
        .next()
        .unwrap_or(target_language)
}

fn output_path_with_suffix(input_path: &Path, suffix: &str) -> PathBuf {
    let stem = input_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    input_path.with_file_name(format!("{}.{}.srt", stem, suffix.to_lowercase()))
}

/// Pair every target with its output file. Targets sharing a primary subtag
/// (`EN-GB`, `EN-US`) are named after the full tag so no file is written twice.
fn output_paths(
    input_path: &Path,
    output_path: Option<&Path>,
    targets: &[String],
) -> Result<Vec<(String, PathBuf)>> {
    if targets.is_empty() {
        return Err(SrtError::Config("No target language given".to_string()));
    }

    let paths: Vec<(String, PathBuf)> = match output_path {
        Some(path) if targets.len() == 1 => vec![(targets[0].clone(), path.to_path_buf())],
        Some(_) => {
            return Err(SrtError::Config(
                "--output can only be used with a single target language".to_string(),
            ));
        }
        None => targets
            .iter()
            .map(|target| {
                let primary = primary_subtag(target).to_lowercase();
                let shared = targets
                    .iter()
                    .filter(|other| primary_subtag(other).to_lowercase() == primary)
                    .count()
                    > 1;
                let suffix = if shared { target.as_str() } else { primary.as_str() };
                (target.clone(), output_path_with_suffix(input_path, suffix))
            })
            .collect(),
    };

    let mut seen = HashSet::new();
    for (target, path) in &paths {
        if !seen.insert(path.clone()) {
            return Err(SrtError::Config(format!(
                "Target language {} would overwrite {}",
                target,
                path.display()
            )));
        }
    }

    Ok(paths)
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg:>6} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% ({pos}/{len} chars)")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
