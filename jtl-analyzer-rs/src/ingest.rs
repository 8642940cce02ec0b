//! Trace ingestion
//!
//! Loads trace records from a JMeter XML results file or a JSON array of
//! record objects. Records are returned in file order.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use correlation_engine_rs::TraceRecord;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

const ROOT_ELEMENT: &[u8] = b"testResults";
// Top-level samples sit directly under the root; their fields one level below.
const SAMPLE_DEPTH: usize = 2;
const FIELD_DEPTH: usize = 3;

/// Errors raised while loading a trace file
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed XML near byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Malformed JSON trace: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected trace structure: {0}")]
    Structure(String),
}

/// On-disk trace formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TraceFormat {
    /// JMeter XML results (`.jtl`, `.xml`)
    Xml,
    /// JSON array of record objects
    Json,
}

impl TraceFormat {
    /// Guess the format from the file extension; anything but `.json` is XML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => TraceFormat::Json,
            _ => TraceFormat::Xml,
        }
    }
}

/// Read and parse a trace file
pub fn load_trace(path: &Path, format: Option<TraceFormat>) -> Result<Vec<TraceRecord>, IngestError> {
    let format = format.unwrap_or_else(|| TraceFormat::from_path(path));
    let text = fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let records = match format {
        TraceFormat::Xml => parse_xml(&text)?,
        TraceFormat::Json => parse_json(&text)?,
    };

    log::info!("Loaded {} trace records from {} ({:?})", records.len(), path.display(), format);
    Ok(records)
}

/// Parse a JSON array of trace records
pub fn parse_json(text: &str) -> Result<Vec<TraceRecord>, IngestError> {
    Ok(serde_json::from_str(text)?)
}

#[derive(Debug, Clone, Copy)]
enum SampleField {
    RequestPayload,
    ResponsePayload,
    RequestHeaders,
    ResponseHeaders,
}

impl SampleField {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"samplerData" => Some(SampleField::RequestPayload),
            b"responseData" => Some(SampleField::ResponsePayload),
            b"requestHeader" => Some(SampleField::RequestHeaders),
            b"responseHeader" => Some(SampleField::ResponseHeaders),
            _ => None,
        }
    }

    fn assign(self, record: &mut TraceRecord, value: String) {
        let slot = match self {
            SampleField::RequestPayload => &mut record.request_payload,
            SampleField::ResponsePayload => &mut record.response_payload,
            SampleField::RequestHeaders => &mut record.request_headers,
            SampleField::ResponseHeaders => &mut record.response_headers,
        };
        *slot = Some(value);
    }
}

fn is_sample(name: &[u8]) -> bool {
    name == b"httpSample" || name == b"sample"
}

/// Parse JMeter XML results
///
/// Only samples directly under `testResults` become records; nested
/// sub-samples (redirects, embedded resources) are skipped.
pub fn parse_xml(text: &str) -> Result<Vec<TraceRecord>, IngestError> {
    let mut reader = Reader::from_str(text);
    let mut records = Vec::new();

    let mut depth = 0usize;
    let mut seen_root = false;
    let mut current: Option<TraceRecord> = None;
    let mut field: Option<SampleField> = None;
    let mut value = String::new();

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|source| IngestError::Xml { position, source })?;

        match event {
            Event::Start(e) => {
                depth += 1;
                let name = e.name();
                if depth == 1 {
                    check_root(name.as_ref())?;
                    seen_root = true;
                } else if depth == SAMPLE_DEPTH && is_sample(name.as_ref()) {
                    current = Some(record_from_attributes(&e, position)?);
                } else if depth == FIELD_DEPTH && current.is_some() {
                    field = SampleField::from_name(name.as_ref());
                    value.clear();
                }
            }
            Event::Empty(e) => {
                let name = e.name();
                if depth == 0 {
                    check_root(name.as_ref())?;
                    seen_root = true;
                } else if depth + 1 == SAMPLE_DEPTH && is_sample(name.as_ref()) {
                    records.push(record_from_attributes(&e, position)?);
                } else if depth + 1 == FIELD_DEPTH {
                    if let (Some(field), Some(record)) = (SampleField::from_name(name.as_ref()), current.as_mut()) {
                        field.assign(record, String::new());
                    }
                }
            }
            Event::Text(t) if field.is_some() => {
                let text = t
                    .unescape()
                    .map_err(|source| IngestError::Xml { position, source })?;
                value.push_str(&text);
            }
            Event::CData(c) if field.is_some() => {
                value.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Event::End(_) => {
                if depth == FIELD_DEPTH {
                    if let (Some(field), Some(record)) = (field.take(), current.as_mut()) {
                        field.assign(record, std::mem::take(&mut value));
                    }
                } else if depth == SAMPLE_DEPTH {
                    if let Some(record) = current.take() {
                        records.push(record);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root && !text.trim().is_empty() {
        return Err(IngestError::Structure("no root element found".to_string()));
    }

    Ok(records)
}

fn check_root(name: &[u8]) -> Result<(), IngestError> {
    if name == ROOT_ELEMENT {
        Ok(())
    } else {
        Err(IngestError::Structure(format!(
            "expected root element testResults, found {}",
            String::from_utf8_lossy(name)
        )))
    }
}

fn record_from_attributes(element: &BytesStart<'_>, position: usize) -> Result<TraceRecord, IngestError> {
    let mut thread_id = None;
    let mut label = None;
    let mut raw_success = None;

    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| IngestError::Xml {
            position,
            source: quick_xml::Error::InvalidAttr(e),
        })?;

        let slot = match attribute.key.as_ref() {
            b"tn" => &mut thread_id,
            b"lb" => &mut label,
            b"s" => &mut raw_success,
            _ => continue,
        };
        let value = attribute
            .unescape_value()
            .map_err(|source| IngestError::Xml { position, source })?;
        *slot = Some(value.into_owned());
    }

    Ok(TraceRecord::from_raw_flag(thread_id, label, raw_success.as_deref()))
}
