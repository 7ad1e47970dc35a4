//! srt-translate - SubRip subtitle translation
//!
//! Parses .srt files, sends each cue's text to a translation provider
//! (DeepL by default) and writes a new subtitle file per target language
//! with the original timing preserved.

pub mod cli;
pub mod config;
pub mod error;
pub mod subtitle;
pub mod translate;
pub mod workflow;
