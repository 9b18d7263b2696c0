//! Fixed text that wraps user content inside a generation request.
//!
//! The user's instruction is always sent verbatim; the only text this crate
//! contributes is the label that tells the model a text part is a flattened
//! spreadsheet rather than something the user typed.

/// Label placed before a flattened spreadsheet transcript.
pub const SPREADSHEET_CONTENT_LABEL: &str = "Spreadsheet content:";

/// Build the text part carrying a spreadsheet transcript.
pub fn spreadsheet_part(transcript: &str) -> String {
    format!("{SPREADSHEET_CONTENT_LABEL}\n{transcript}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_follows_label_line() {
        let part = spreadsheet_part("Sheet: A\nx\n\n");
        assert_eq!(part, "Spreadsheet content:\nSheet: A\nx\n\n");
    }
}
