//! Spreadsheet flattening: `.xlsx` workbook → one plain-text transcript.
//!
//! Every sheet, in the workbook's declared order, becomes
//!
//! ```text
//! Sheet: <name>
//! <row 1 as CSV>
//! <row 2 as CSV>
//! …
//! <blank line>
//! ```
//!
//! The model receives the transcript as a text part, so the encoding has to
//! be lossless for cell text: fields containing commas, quotes or newlines are
//! quoted with standard CSV rules.

use crate::error::DocPromptError;
use calamine::{open_workbook_from_rs, Data, ExcelDateTime, Reader, Xlsx, XlsxError};
use chrono::NaiveTime;
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

/// Prefix of the per-sheet header line.
pub const SHEET_HEADER_PREFIX: &str = "Sheet: ";

#[derive(Debug, Error)]
enum FlattenError {
    #[error(transparent)]
    Xlsx(#[from] XlsxError),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("transcript would exceed {limit} bytes")]
    TooLarge { limit: u64 },
}

impl FlattenError {
    fn into_doc_error(self, name: &str) -> DocPromptError {
        match self {
            FlattenError::Csv(e) => DocPromptError::Internal(format!("CSV writer: {e}")),
            other => parse_error(name, other),
        }
    }
}

/// A non-empty cell: `(row, column)` and its rendered text.
type UsedCell = ((u32, u32), String);

/// Parse a workbook and flatten every sheet into one transcript.
///
/// Only the used range of each sheet is emitted, from its first non-empty
/// row and column to its last. The transcript may not grow beyond
/// `max_len` bytes; a workbook that would is rejected as a parse error.
///
/// CPU-bound; async callers should run it under `spawn_blocking`.
pub fn flatten_workbook(name: &str, bytes: &[u8], max_len: u64) -> Result<String, DocPromptError> {
    let mut workbook = open(name, bytes)?;
    let mut transcript = Transcript::new(max_len);

    let sheet_names = workbook.sheet_names();
    for sheet_name in &sheet_names {
        used_cells(&mut workbook, sheet_name, max_len)
            .and_then(|cells| transcript.push_sheet(sheet_name, cells))
            .map_err(|e| e.into_doc_error(name))?;
    }

    debug!("Flattened {} sheet(s) from {}", sheet_names.len(), name);
    Ok(transcript.text)
}

/// Sheet names in declared order, without reading any cell data.
pub fn sheet_names(name: &str, bytes: &[u8]) -> Result<Vec<String>, DocPromptError> {
    Ok(open(name, bytes)?.sheet_names())
}

fn open<'a>(name: &str, bytes: &'a [u8]) -> Result<Xlsx<Cursor<&'a [u8]>>, DocPromptError> {
    open_workbook_from_rs(Cursor::new(bytes)).map_err(|e| parse_error(name, e))
}

fn parse_error(name: &str, e: impl std::fmt::Display) -> DocPromptError {
    DocPromptError::Parse {
        name: name.to_string(),
        detail: e.to_string(),
    }
}

/// Stream the non-empty cells of one sheet, sorted by row then column.
///
/// Cells are read one at a time so memory follows the amount of data in the
/// sheet, not the span between its first and last cell.
fn used_cells(
    workbook: &mut Xlsx<Cursor<&[u8]>>,
    sheet_name: &str,
    max_len: u64,
) -> Result<Vec<UsedCell>, FlattenError> {
    let mut reader = match workbook.worksheet_cells_reader(sheet_name) {
        Ok(reader) => reader,
        Err(XlsxError::NotAWorksheet(kind)) => {
            debug!("Sheet {} is a {}, no cells", sheet_name, kind);
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    let mut cells = Vec::new();
    let mut text_len = 0u64;

    while let Some(cell) = reader.next_cell()? {
        let text = cell_text(&Data::from(cell.get_value().clone()));
        if text.is_empty() {
            continue;
        }
        text_len += text.len() as u64;
        if text_len > max_len {
            return Err(FlattenError::TooLarge { limit: max_len });
        }
        cells.push((cell.get_position(), text));
    }

    cells.sort_unstable_by_key(|(pos, _)| *pos);
    Ok(cells)
}

/// Bounding box of the used cells, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UsedRange {
    top: u32,
    bottom: u32,
    left: u32,
    right: u32,
}

impl UsedRange {
    fn of(cells: &[UsedCell]) -> Option<Self> {
        let ((top, _), _) = cells.first()?;
        let ((bottom, _), _) = cells.last()?;
        let left = cells.iter().map(|((_, c), _)| *c).min()?;
        let right = cells.iter().map(|((_, c), _)| *c).max()?;
        Some(Self {
            top: *top,
            bottom: *bottom,
            left,
            right,
        })
    }

    fn width(&self) -> usize {
        (self.right - self.left) as usize + 1
    }

    /// Number of cells in the box; each costs at least one separator byte.
    fn area(&self) -> u64 {
        (u64::from(self.bottom - self.top) + 1) * (u64::from(self.right - self.left) + 1)
    }
}

/// Size-capped transcript buffer.
struct Transcript {
    text: String,
    limit: u64,
}

impl Transcript {
    fn new(limit: u64) -> Self {
        Self {
            text: String::new(),
            limit,
        }
    }

    fn push(&mut self, s: &str) -> Result<(), FlattenError> {
        if (self.text.len() + s.len()) as u64 > self.limit {
            return Err(FlattenError::TooLarge { limit: self.limit });
        }
        self.text.push_str(s);
        Ok(())
    }

    /// Append `Sheet: <name>`, one CSV line per row of the used range, and
    /// the blank separator line.
    fn push_sheet(&mut self, sheet_name: &str, cells: Vec<UsedCell>) -> Result<(), FlattenError> {
        self.push(SHEET_HEADER_PREFIX)?;
        self.push(sheet_name)?;
        self.push("\n")?;

        if let Some(range) = UsedRange::of(&cells) {
            let remaining = self.limit.saturating_sub(self.text.len() as u64);
            if range.area() > remaining {
                return Err(FlattenError::TooLarge { limit: self.limit });
            }

            let mut cells = cells.into_iter().peekable();
            for row in range.top..=range.bottom {
                let mut fields = vec![String::new(); range.width()];
                while let Some(((_, col), text)) = cells.next_if(|((r, _), _)| *r == row) {
                    fields[(col - range.left) as usize] = text;
                }
                if row > range.top {
                    self.push("\n")?;
                }
                self.push(&csv_line(&fields)?)?;
            }
        }

        self.push("\n\n")
    }
}

/// Render one cell the way a spreadsheet shows it.
///
/// Dates and times use ISO 8601, durations `h:mm:ss`, booleans `TRUE`/`FALSE`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::DateTime(dt) => datetime_text(dt),
        other => other.to_string(),
    }
}

fn datetime_text(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        if let Some(duration) = dt.as_duration() {
            let secs = duration.num_seconds();
            return format!("{}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60);
        }
    } else if let Some(value) = dt.as_datetime() {
        return if value.time() == NaiveTime::MIN {
            value.format("%Y-%m-%d").to_string()
        } else {
            value.format("%Y-%m-%dT%H:%M:%S").to_string()
        };
    }
    dt.as_f64().to_string()
}

/// One CSV record without its terminator.
///
/// A lone empty field is written as an empty line rather than the `""` the
/// csv crate emits to keep such records distinguishable.
fn csv_line(fields: &[String]) -> Result<String, csv::Error> {
    if fields.len() <= 1 && fields.iter().all(|f| f.is_empty()) {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;

    let mut line = String::from_utf8_lossy(&bytes).into_owned();
    if line.ends_with('\n') {
        line.pop();
    }
    Ok(line)
}
