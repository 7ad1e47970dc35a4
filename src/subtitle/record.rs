use std::fmt;

use crate::error::{Result, SrtError};

/// A moment inside a subtitle track, as written in SRT timing lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timepoint {
    hour: u32,
    minute: u8,
    second: u8,
    millisecond: u16,
}

impl Timepoint {
    /// Build a timepoint, rejecting minutes/seconds above 59 and milliseconds above 999.
    pub fn new(hour: u32, minute: u32, second: u32, millisecond: u32) -> Result<Self> {
        if minute > 59 || second > 59 || millisecond > 999 {
            return Err(SrtError::InvalidTimepoint(format!(
                "{}:{}:{},{} is out of range",
                hour, minute, second, millisecond
            )));
        }

        Ok(Self {
            hour,
            minute: minute as u8,
            second: second as u8,
            millisecond: millisecond as u16,
        })
    }

    pub fn from_millis(total_milliseconds: u64) -> Self {
        Self {
            hour: (total_milliseconds / 3_600_000) as u32,
            minute: ((total_milliseconds % 3_600_000) / 60_000) as u8,
            second: ((total_milliseconds % 60_000) / 1_000) as u8,
            millisecond: (total_milliseconds % 1_000) as u16,
        }
    }

    pub fn as_millis(&self) -> u64 {
        self.hour as u64 * 3_600_000
            + self.minute as u64 * 60_000
            + self.second as u64 * 1_000
            + self.millisecond as u64
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute as u32
    }

    pub fn second(&self) -> u32 {
        self.second as u32
    }

    pub fn millisecond(&self) -> u32 {
        self.millisecond as u32
    }
}

/// Format in SRT time format (HH:MM:SS,mmm). Hours wider than two digits are kept whole.
impl fmt::Display for Timepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02},{:03}",
            self.hour, self.minute, self.second, self.millisecond
        )
    }
}

/// One cue: its display interval and text lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleRecord {
    pub start: Timepoint,
    pub end: Timepoint,
    pub text: Vec<String>,
}

impl SubtitleRecord {
    pub fn new(start: Timepoint, end: Timepoint) -> Self {
        Self {
            start,
            end,
            text: Vec::new(),
        }
    }

    pub fn with_text(start: Timepoint, end: Timepoint, text: Vec<String>) -> Self {
        Self { start, end, text }
    }

    pub fn add_line<S: Into<String>>(&mut self, line: S) {
        self.text.push(line.into());
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    /// Text lines joined the way they are sent for translation.
    pub fn joined_text(&self) -> String {
        self.text.join("\n")
    }
}

/// Timing line followed by the text lines, each newline-terminated. No sequence label.
impl fmt::Display for SubtitleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} --> {}", self.start, self.end)?;
        writeln!(f, "{}", self.joined_text())
    }
}
