use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Subtitle file to translate
    #[arg(value_name = "SUBFILE")]
    pub subfile: PathBuf,

    /// Name of file containing DeepL's API key
    #[arg(short, long, value_name = "KEYFILE")]
    pub keyfile: Option<PathBuf>,

    /// Name of output subtitle file (only with a single target language)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Target languages for translation (comma-separated)
    #[arg(short, long)]
    pub target_langs: Option<String>,

    /// Source language of the subtitles; omit to let the provider decide
    #[arg(short, long)]
    pub source_lang: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Translate even if the quota check says the file will not fit
    #[arg(long)]
    pub skip_quota_check: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Target languages given on the command line, split and trimmed.
    pub fn target_languages(&self) -> Option<Vec<String>> {
        self.target_langs.as_ref().map(|langs| {
            langs
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }
}
