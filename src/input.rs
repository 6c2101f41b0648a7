//! Input normalization: CSV upload or pasted text → [`RequirementsText`].
//!
//! Presence is checked here, before any backend exists, so an empty
//! submission never costs a provider call.

use crate::error::Result;
use crate::types::RequirementsText;
use crate::PipelineError;

/// File extension accepted for tabular uploads.
const CSV_EXTENSION: &str = "csv";

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied file name; only its extension is inspected.
    pub file_name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_csv(&self) -> bool {
        is_csv_file_name(&self.file_name)
    }
}

/// What a caller submitted: an optional upload and optional pasted text.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub upload: Option<Upload>,
    pub text: Option<String>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upload(mut self, upload: Upload) -> Self {
        self.upload = Some(upload);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Normalize into requirements text with no size limit.
    pub fn normalize(&self) -> Result<RequirementsText> {
        self.normalize_with_limit(None)
    }

    /// Normalize into requirements text.
    ///
    /// A `.csv` upload takes precedence and is flattened with
    /// [`flatten_csv`]. Otherwise non-blank pasted text is used, trimmed.
    /// Anything else is [`PipelineError::MissingInput`]. When `max_bytes`
    /// is set, longer results are rejected as
    /// [`PipelineError::InvalidInput`].
    pub fn normalize_with_limit(&self, max_bytes: Option<usize>) -> Result<RequirementsText> {
        let text = match (&self.upload, self.pasted_text()) {
            (Some(upload), _) if upload.is_csv() => {
                tracing::debug!(
                    file = %upload.file_name,
                    bytes = upload.bytes.len(),
                    "flattening CSV upload"
                );
                flatten_csv(&upload.bytes)?
            }
            (_, Some(pasted)) => pasted.to_string(),
            _ => return Err(PipelineError::MissingInput),
        };

        if let Some(limit) = max_bytes {
            if text.len() > limit {
                return Err(PipelineError::InvalidInput(format!(
                    "requirements are {} bytes, limit is {}",
                    text.len(),
                    limit
                )));
            }
        }

        Ok(RequirementsText::new(text))
    }

    fn pasted_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Whether `name` has a `.csv` extension (case-insensitive).
pub fn is_csv_file_name(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(CSV_EXTENSION))
}

/// Flatten CSV bytes into comma-delimited text.
///
/// The header row comes first, then every record in file order. Fields
/// are re-quoted only where needed, records end with `\n`, and blank lines
/// are dropped. Records shorter than the header are padded with empty
/// fields. A missing header row, records longer than the header, and
/// non-UTF-8 content are [`PipelineError::InvalidInput`].
pub fn flatten_csv(bytes: &[u8]) -> Result<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers().map_err(unreadable_csv)?.clone();
    if headers.is_empty() {
        return Err(PipelineError::InvalidInput(
            "CSV file has no header row".to_string(),
        ));
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::with_capacity(bytes.len()));
    writer.write_record(&headers).map_err(unreadable_csv)?;

    let mut rows = 0usize;
    for record in reader.records() {
        let mut record = record.map_err(unreadable_csv)?;
        if record.len() > headers.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(PipelineError::InvalidInput(format!(
                "CSV line {} has {} fields, header has {}",
                line,
                record.len(),
                headers.len()
            )));
        }
        while record.len() < headers.len() {
            record.push_field("");
        }
        writer.write_record(&record).map_err(unreadable_csv)?;
        rows += 1;
    }

    let flat = writer
        .into_inner()
        .map_err(|e| PipelineError::InvalidInput(format!("failed to flush CSV: {}", e)))?;
    tracing::debug!(columns = headers.len(), rows, "flattened CSV");

    String::from_utf8(flat).map_err(|e| PipelineError::InvalidInput(e.to_string()))
}

fn unreadable_csv(err: csv::Error) -> PipelineError {
    PipelineError::InvalidInput(format!("unreadable CSV: {}", err))
}
