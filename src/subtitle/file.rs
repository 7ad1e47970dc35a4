use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

use crate::error::{Result, SrtError};
use super::record::{SubtitleRecord, Timepoint};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// An SRT document: cues in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleFile {
    records: Vec<SubtitleRecord>,
}

impl SubtitleFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse SRT text held in memory.
    pub fn parse(input: &str) -> Self {
        let mut parser = CueParser::default();
        for (idx, line) in input.lines().enumerate() {
            parser.feed(strip_bom(idx, line));
        }
        Self {
            records: parser.finish(),
        }
    }

    /// Read cues from an open stream and append them. The stream is not closed.
    ///
    /// Parsing is permissive: stray text, missing text and unnumbered blocks
    /// are recovered line by line. Only I/O failures are reported.
    pub fn read<R: BufRead>(&mut self, reader: R) -> Result<&mut Self> {
        let mut parser = CueParser::default();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            parser.feed(strip_bom(idx, &line));
        }

        let records = parser.finish();
        debug!("Parsed {} subtitle records", records.len());
        self.records.extend(records);
        Ok(self)
    }

    /// Open `path`, read it with [`SubtitleFile::read`] and close it again.
    pub fn read_path<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SrtError::FileNotFound(path.display().to_string()),
            _ => SrtError::Io(e),
        })?;
        self.read(BufReader::new(file))
    }

    /// Serialize every cue with contiguous 1-based labels. The writer is not closed.
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        for (index, record) in self.records.iter().enumerate() {
            write!(writer, "{}\n{}\n", index + 1, record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Create or truncate `path` and write the file to it.
    pub fn write_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write(BufWriter::new(file))
    }

    pub fn to_srt_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Drop cues without text, keeping the order of the rest.
    pub fn remove_empty_subtitles(&mut self) -> &mut Self {
        self.records.retain(SubtitleRecord::has_text);
        self
    }

    /// Number of characters that would be submitted for translation.
    pub fn count_content_chars(&self) -> usize {
        self.records
            .iter()
            .map(|record| record.joined_text().chars().count())
            .sum()
    }

    pub fn push(&mut self, record: SubtitleRecord) {
        self.records.push(record);
    }

    pub fn get(&self, index: usize) -> Option<&SubtitleRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubtitleRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a SubtitleFile {
    type Item = &'a SubtitleRecord;
    type IntoIter = std::slice::Iter<'a, SubtitleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn strip_bom(index: usize, line: &str) -> &str {
    if index == 0 {
        line.strip_prefix(BYTE_ORDER_MARK).unwrap_or(line)
    } else {
        line
    }
}

#[derive(Debug, PartialEq)]
enum LineKind {
    Blank,
    Label,
    Timing(Timepoint, Timepoint),
    Text,
}

impl LineKind {
    fn classify(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            LineKind::Blank
        } else if line.chars().all(|c| c.is_ascii_digit()) {
            LineKind::Label
        } else if let Some((start, end)) = parse_timing_line(line) {
            LineKind::Timing(start, end)
        } else {
            LineKind::Text
        }
    }
}

/// Line-driven state machine; `current` is the cue being accumulated.
#[derive(Default)]
struct CueParser {
    current: Option<SubtitleRecord>,
    records: Vec<SubtitleRecord>,
}

impl CueParser {
    fn feed(&mut self, line: &str) {
        match LineKind::classify(line) {
            LineKind::Blank => self.flush(),
            LineKind::Timing(start, end) => {
                self.flush();
                self.current = Some(SubtitleRecord::new(start, end));
            }
            // Labels are only skipped between cues; inside a cue a bare number is dialogue.
            LineKind::Label | LineKind::Text => {
                if let Some(record) = self.current.as_mut() {
                    record.add_line(line.trim());
                }
            }
        }
    }

    fn flush(&mut self) {
        if let Some(record) = self.current.take() {
            self.records.push(record);
        }
    }

    fn finish(mut self) -> Vec<SubtitleRecord> {
        self.flush();
        self.records
    }
}

/// Recognise `HH:MM:SS,mmm --> HH:MM:SS,mmm`. Anything after the end time
/// (position hints and the like) is ignored.
fn parse_timing_line(line: &str) -> Option<(Timepoint, Timepoint)> {
    let mut cursor = Cursor::new(line);
    let start = cursor.timepoint()?;
    if !cursor.whitespace() || !cursor.literal("-->") || !cursor.whitespace() {
        return None;
    }
    let end = cursor.timepoint()?;
    Some((start, end))
}

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn timepoint(&mut self) -> Option<Timepoint> {
        let hour = self.number(2, 9)?;
        self.literal(":").then_some(())?;
        let minute = self.number(2, 2)?;
        self.literal(":").then_some(())?;
        let second = self.number(2, 2)?;
        self.literal(",").then_some(())?;
        let millisecond = self.number(3, 3)?;
        // Out-of-range fields still mark a timing line; carry them over into the next unit.
        let total = hour as u64 * 3_600_000
            + minute as u64 * 60_000
            + second as u64 * 1_000
            + millisecond as u64;
        Some(Timepoint::from_millis(total))
    }

    /// Consume between `min` and `max` ASCII digits.
    fn number(&mut self, min: usize, max: usize) -> Option<u32> {
        let len = self
            .rest
            .bytes()
            .take(max)
            .take_while(u8::is_ascii_digit)
            .count();
        if len < min {
            return None;
        }
        let (digits, rest) = self.rest.split_at(len);
        self.rest = rest;
        digits.parse().ok()
    }

    fn literal(&mut self, expected: &str) -> bool {
        match self.rest.strip_prefix(expected) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    /// Consume one or more whitespace characters.
    fn whitespace(&mut self) -> bool {
        let trimmed = self.rest.trim_start();
        let consumed = trimmed.len() < self.rest.len();
        self.rest = trimmed;
        consumed
    }
}
