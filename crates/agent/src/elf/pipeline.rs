//! Pipeline — retrieval → decode → build → enqueue, one file at a time.
//!
//! Files are processed strictly in descriptor order and rows strictly in
//! file order; rows of different files never interleave. The spool buffer
//! of the file being processed is dropped on every exit path.
//!
//! Rows are read line by line. Quote structure is checked per logical
//! record before tokenizing, since the tokenizer itself recovers from
//! unbalanced quotes instead of reporting them.

use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use chrono::Utc;
use csv::StringRecord;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::api::LogDownload;
use crate::elf::decode::decode_row;
use crate::elf::descriptor::LogDescriptor;
use crate::elf::error::IngestError;
use crate::elf::record::{build_record, Record};
use crate::elf::retrieve::{retrieve, DownloadedLog};

/// Outcome counters for one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub files_attempted: u64,
    pub files_succeeded: u64,
    pub files_failed: u64,
    pub records_emitted: u64,
}

pub struct Pipeline {
    spool_dir: PathBuf,
    /// Whether a failed file aborts the batch or just that file.
    continue_on_file_error: bool,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(spool_dir: PathBuf, continue_on_file_error: bool, cancel: CancellationToken) -> Self {
        Self {
            spool_dir,
            continue_on_file_error,
            cancel,
        }
    }

    /// Process a batch of descriptors, pushing one record per data row onto
    /// `tx` in file order.
    pub async fn process(
        &self,
        descriptors: &[LogDescriptor],
        client: &dyn LogDownload,
        tx: &mpsc::Sender<Record>,
    ) -> Result<BatchSummary, IngestError> {
        info!(files = descriptors.len(), "starting event log file batch");

        let mut summary = BatchSummary::default();
        for descriptor in descriptors {
            summary.files_attempted += 1;
            match self.process_file(descriptor, client, tx).await {
                Ok(emitted) => {
                    summary.files_succeeded += 1;
                    summary.records_emitted += emitted;
                }
                Err(err @ (IngestError::Cancelled | IngestError::QueueClosed)) => {
                    return Err(err);
                }
                Err(err) if self.continue_on_file_error => {
                    warn!(id = %descriptor.id, error = %err, "event log file failed, continuing batch");
                    summary.files_failed += 1;
                }
                Err(err) => {
                    return Err(IngestError::File {
                        id: descriptor.id.clone(),
                        source: Box::new(err),
                    });
                }
            }
        }

        info!(
            files = summary.files_attempted,
            failed = summary.files_failed,
            records = summary.records_emitted,
            "event log file batch complete"
        );
        Ok(summary)
    }

    async fn process_file(
        &self,
        descriptor: &LogDescriptor,
        client: &dyn LogDownload,
        tx: &mpsc::Sender<Record>,
    ) -> Result<u64, IngestError> {
        let log = retrieve(client, descriptor, &self.spool_dir).await?;
        // `log` owns the spool buffer; it drops here on success and on
        // every error path, closing and deleting the file exactly once.
        self.emit_rows(&log, tx).await
    }

    async fn emit_rows(
        &self,
        log: &DownloadedLog,
        tx: &mpsc::Sender<Record>,
    ) -> Result<u64, IngestError> {
        let mut reader = BufReader::new(log.open_reader()?);
        let mut line_no = 0u64;

        let header = match read_record(&mut reader, &mut line_no)? {
            Some(header) => header,
            // No header line means no rows.
            None => return Ok(0),
        };
        if header.len() != log.field_types.len() {
            return Err(IngestError::LengthMismatch {
                expected: log.field_types.len(),
                got: header.len(),
            });
        }

        let mut emitted = 0u64;
        loop {
            if self.cancel.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            let raw = match read_record(&mut reader, &mut line_no)? {
                Some(raw) => raw,
                None => break,
            };
            if raw.len() != header.len() {
                return Err(IngestError::LengthMismatch {
                    expected: header.len(),
                    got: raw.len(),
                });
            }

            let row = decode_row(&raw, &log.field_types)?;
            let record = build_record(&header, &row, &log.event_type, Utc::now())?;
            tx.send(record)
                .await
                .map_err(|_| IngestError::QueueClosed)?;
            emitted += 1;
        }

        Ok(emitted)
    }
}

// ── Line-oriented CSV reading ──

/// Outcome of scanning one (possibly partial) logical record for quote
/// structure.
#[derive(Debug, PartialEq, Eq)]
enum QuoteScan {
    /// Every quoted field is closed; the record is complete.
    Complete,
    /// A quoted field is still open; the record continues on the next line.
    Open,
    /// A closing quote was followed by something other than a delimiter
    /// or end of line.
    Malformed { at: usize },
}

fn scan_quoting(text: &str) -> QuoteScan {
    enum State {
        FieldStart,
        Unquoted,
        InQuotes,
        QuoteSeen,
    }
    use State::*;

    let mut state = FieldStart;
    for (i, b) in text.bytes().enumerate() {
        state = match (state, b) {
            (FieldStart, b'"') => InQuotes,
            (FieldStart, b',') => FieldStart,
            (FieldStart, b'\n') => FieldStart,
            (FieldStart, _) => Unquoted,
            (Unquoted, b',') => FieldStart,
            (Unquoted, b'\n') => FieldStart,
            // Quotes inside an unquoted field are taken literally.
            (Unquoted, _) => Unquoted,
            (InQuotes, b'"') => QuoteSeen,
            (InQuotes, _) => InQuotes,
            // A doubled quote is an escaped quote inside the field.
            (QuoteSeen, b'"') => InQuotes,
            (QuoteSeen, b',') => FieldStart,
            (QuoteSeen, b'\n') => FieldStart,
            (QuoteSeen, b'\r') => QuoteSeen,
            (QuoteSeen, _) => return QuoteScan::Malformed { at: i },
        };
    }
    match state {
        InQuotes => QuoteScan::Open,
        _ => QuoteScan::Complete,
    }
}

/// Read one logical record off the reader. A record spans multiple
/// physical lines when a quoted field contains newlines; it is complete
/// once every opened quote is closed.
fn read_logical_line(
    reader: &mut impl BufRead,
    line_no: &mut u64,
) -> Result<Option<String>, IngestError> {
    let mut buf = String::new();
    loop {
        let bytes = reader.read_line(&mut buf).map_err(|err| {
            if err.kind() == std::io::ErrorKind::InvalidData {
                IngestError::CsvSyntax(format!("invalid UTF-8 on line {}", *line_no + 1))
            } else {
                IngestError::Spool(err)
            }
        })?;
        if bytes == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            return match scan_quoting(&buf) {
                QuoteScan::Complete => Ok(Some(buf)),
                QuoteScan::Open => Err(IngestError::CsvSyntax(format!(
                    "unterminated quote in record ending on line {line_no}"
                ))),
                QuoteScan::Malformed { at } => Err(quote_error(*line_no, at)),
            };
        }

        *line_no += 1;
        match scan_quoting(&buf) {
            QuoteScan::Complete => return Ok(Some(buf)),
            QuoteScan::Open => continue,
            QuoteScan::Malformed { at } => return Err(quote_error(*line_no, at)),
        }
    }
}

fn quote_error(line_no: u64, at: usize) -> IngestError {
    IngestError::CsvSyntax(format!(
        "closing quote followed by data on line {line_no}, byte {at}"
    ))
}

/// Read and tokenize the next non-blank record.
fn read_record(
    reader: &mut impl BufRead,
    line_no: &mut u64,
) -> Result<Option<StringRecord>, IngestError> {
    loop {
        let line = match read_logical_line(reader, line_no)? {
            Some(line) => line,
            None => return Ok(None),
        };
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            continue;
        }
        return Ok(Some(tokenize(trimmed, *line_no)?));
    }
}

fn tokenize(line: &str, line_no: u64) -> Result<StringRecord, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut record = StringRecord::new();
    if reader.read_record(&mut record)? {
        Ok(record)
    } else {
        Err(IngestError::CsvSyntax(format!(
            "empty record on line {line_no}"
        )))
    }
}
