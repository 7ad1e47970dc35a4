//! SubRip (.srt) subtitle model: timing values, cues, and whole files.

pub mod file;
pub mod record;

pub use file::SubtitleFile;
pub use record::{SubtitleRecord, Timepoint};
