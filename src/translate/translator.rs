use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{Result, SrtError};
use crate::subtitle::{SubtitleFile, SubtitleRecord};
use super::handler::TranslationHandler;

/// Called once per cue with (characters needed in total, characters queued so far).
pub type ProgressFn = Box<dyn FnMut(usize, usize) + Send>;

/// Translates one input subtitle file into any number of target languages,
/// one cue at a time and in file order.
pub struct SrtTranslator {
    input: Option<SubtitleFile>,
    input_language: String,
    output: HashMap<String, SubtitleFile>,
    chars: usize,
    handler: Box<dyn TranslationHandler>,
    progress: Option<ProgressFn>,
    check_quota: bool,
}

impl SrtTranslator {
    pub fn new(handler: Box<dyn TranslationHandler>) -> Self {
        Self {
            input: None,
            input_language: String::new(),
            output: HashMap::new(),
            chars: 0,
            handler,
            progress: None,
            check_quota: true,
        }
    }

    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: FnMut(usize, usize) + Send + 'static,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Enable or disable the up-front quota check. Enabled by default.
    pub fn with_quota_check(mut self, enabled: bool) -> Self {
        self.check_quota = enabled;
        self
    }

    /// Parse `path` as the input, dropping cues without text.
    /// `language` is the source language; empty leaves it to the provider.
    pub fn add_input_file<P: AsRef<Path>>(&mut self, path: P, language: &str) -> Result<&mut Self> {
        let path = path.as_ref();
        info!("Loading subtitles from {}", path.display());

        let mut file = SubtitleFile::new();
        file.read_path(path)?.remove_empty_subtitles();
        Ok(self.bind_input(file, language))
    }

    /// Same as [`add_input_file`](Self::add_input_file) for an already open stream.
    pub fn add_input_reader<R: BufRead>(&mut self, reader: R, language: &str) -> Result<&mut Self> {
        let mut file = SubtitleFile::new();
        file.read(reader)?.remove_empty_subtitles();
        Ok(self.bind_input(file, language))
    }

    /// Use an already parsed file as the input. It is taken as-is, empty cues included.
    pub fn add_input_srt(&mut self, file: SubtitleFile, language: &str) -> &mut Self {
        self.bind_input(file, language)
    }

    fn bind_input(&mut self, file: SubtitleFile, language: &str) -> &mut Self {
        debug!(
            "Bound input with {} subtitles (source language: {:?})",
            file.len(),
            language
        );
        self.input = Some(file);
        self.input_language = language.to_string();
        self
    }

    /// Translate every input cue into `target_language`, keeping the timing.
    ///
    /// The quota is checked once before anything is sent; if it does not fit,
    /// nothing is translated. A provider error stops the run and leaves the
    /// cues translated so far in the output for `target_language`.
    pub async fn translate(&mut self, target_language: &str) -> Result<&SubtitleFile> {
        let input = self.input.as_ref().ok_or(SrtError::NoInput)?;

        let chars_needed = input.count_content_chars();
        if self.check_quota && !self.handler.check_quota(chars_needed) {
            let available = self.handler.limit().saturating_sub(self.handler.chars());
            warn!(
                "Not enough quota to translate into {}: needed {}, available {}",
                target_language, chars_needed, available
            );
            return Err(SrtError::OutOfQuota {
                needed: chars_needed,
                available,
            });
        }

        info!(
            "Translating {} subtitles ({} characters) into {}",
            input.len(),
            chars_needed,
            target_language
        );

        let result = self
            .output
            .entry(target_language.to_string())
            .or_default();
        *result = SubtitleFile::new();

        let total = input.len();
        let mut queued = 0;
        for (idx, record) in input.iter().enumerate() {
            let text = record.joined_text();
            let len = text.chars().count();
            queued += len;
            self.chars += len;
            if let Some(progress) = self.progress.as_mut() {
                progress(chars_needed, queued);
            }

            debug!("Translating subtitle {}/{}: {:?}", idx + 1, total, text);
            let translated = self
                .handler
                .translate(&self.input_language, target_language, &text)
                .await?;
            debug!("Translated subtitle {}/{}: {:?}", idx + 1, total, translated);

            result.push(SubtitleRecord::with_text(
                record.start,
                record.end,
                translated.split('\n').map(str::to_string).collect(),
            ));
        }

        info!("Finished translation into {}", target_language);
        Ok(&*result)
    }

    /// Write the translation for `target_language` to `path`.
    pub fn write<P: AsRef<Path>>(&self, target_language: &str, path: P) -> Result<()> {
        let path = path.as_ref();
        let output = self.output_for(target_language)?;
        info!("Writing {} subtitles to {}", output.len(), path.display());
        output.write_path(path)
    }

    /// Write the translation for `target_language` to an open writer, leaving it open.
    pub fn write_to<W: Write>(&self, target_language: &str, writer: W) -> Result<()> {
        self.output_for(target_language)?.write(writer)
    }

    fn output_for(&self, target_language: &str) -> Result<&SubtitleFile> {
        self.output
            .get(target_language)
            .ok_or_else(|| SrtError::NoOutput {
                language: target_language.to_string(),
            })
    }

    pub fn output(&self, target_language: &str) -> Option<&SubtitleFile> {
        self.output.get(target_language)
    }

    pub fn input(&self) -> Option<&SubtitleFile> {
        self.input.as_ref()
    }

    pub fn input_language(&self) -> &str {
        &self.input_language
    }

    /// Characters submitted by this translator across all `translate` calls.
    pub fn chars(&self) -> usize {
        self.chars
    }
}
