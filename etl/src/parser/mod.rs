//! Delimited table reader with encoding and delimiter auto-detection.
//!
//! Produces a text-only [`Table`]: every cell keeps its raw text, the header
//! row names the columns, and a row whose field count differs from the
//! header is rejected.

use std::path::Path;

use crate::error::{ExtractError, ExtractResult};
use crate::logs::log_warning;
use crate::table::Table;

/// Delimiters tried by [`detect_delimiter`], in tie-break order.
const CANDIDATE_DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParsedTable {
    /// Parsed text table
    pub table: Table,
    /// Detected encoding
    pub encoding: String,
    /// Detected or requested delimiter
    pub delimiter: char,
}

impl ParsedTable {
    pub fn headers(&self) -> Vec<&str> {
        self.table.headers()
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    /// Empty cells per column, in header order.
    pub fn missing_counts(&self) -> Vec<(&str, usize)> {
        self.table
            .columns()
            .iter()
            .map(|c| (c.name.as_str(), c.values.missing_count()))
            .collect()
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding.
///
/// A leading byte order mark is dropped. Bytes detected as UTF-8 that turn
/// out not to be valid UTF-8 are decoded as Windows-1252 instead.
pub fn decode_content(bytes: &[u8], encoding: &str) -> ExtractResult<String> {
    let decoder = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(text) => return Ok(text.trim_start_matches('\u{feff}').to_string()),
            Err(_) => {
                log_warning("Input is not valid UTF-8, decoding as windows-1252");
                encoding_rs::WINDOWS_1252
            }
        },
        // WHATWG maps latin-1 labels onto windows-1252, a superset
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252
        }
        "iso-8859-15" => encoding_rs::ISO_8859_15,
        other => encoding_rs::Encoding::for_label(other.as_bytes()).ok_or_else(|| {
            ExtractError::Encoding {
                encoding: other.to_string(),
            }
        })?,
    };

    let (text, _, had_errors) = decoder.decode(bytes);
    if had_errors {
        return Err(ExtractError::Encoding {
            encoding: decoder.name().to_string(),
        });
    }
    Ok(text.into_owned())
}

/// Detect the delimiter by counting unquoted occurrences in the first line.
///
/// Comma wins ties and is returned when no candidate occurs at all.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut in_quotes = false;
    for c in first_line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(i) = CANDIDATE_DELIMITERS.iter().position(|&d| d == c) {
            counts[i] += 1;
        }
    }

    let mut best_sep = CANDIDATE_DELIMITERS[0];
    let mut best_count = 0;
    for (&sep, &count) in CANDIDATE_DELIMITERS.iter().zip(counts.iter()) {
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Byte form of a delimiter accepted by the `csv` crate.
pub fn delimiter_byte(delimiter: char) -> ExtractResult<u8> {
    if delimiter.is_ascii() && delimiter != '"' && delimiter != '\n' && delimiter != '\r' {
        Ok(delimiter as u8)
    } else {
        Err(ExtractError::InvalidDelimiter(delimiter))
    }
}

fn malformed(err: csv::Error) -> ExtractError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    let message = match err.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {} fields, found {}", expected_len, len),
        _ => err.to_string(),
    };
    ExtractError::MalformedInput { line, message }
}

/// Parse decoded text with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use tabular_etl::parse_table;
///
/// let table = parse_table("Id,Dept\n1,Fire\n2,Police", ',').unwrap();
/// assert_eq!(table.shape(), (2, 2));
/// ```
pub fn parse_table(content: &str, delimiter: char) -> ExtractResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte(delimiter)?)
        .has_headers(true)
        .flexible(false)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() {
        return Err(ExtractError::MalformedInput {
            line: 1,
            message: "no header row".to_string(),
        });
    }

    for (i, name) in headers.iter().enumerate() {
        if headers[..i].contains(name) {
            return Err(ExtractError::MalformedInput {
                line: 1,
                message: format!("duplicate column name '{}'", name),
            });
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(malformed)?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::from_rows(headers, rows))
}

/// Parse raw bytes, detecting the encoding and, unless given, the delimiter.
pub fn parse_bytes_auto(bytes: &[u8], delimiter: Option<char>) -> ExtractResult<ParsedTable> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));
    let table = parse_table(&content, delimiter)?;

    Ok(ParsedTable {
        table,
        encoding,
        delimiter,
    })
}

/// Read a delimited file into a text table.
///
/// # Example
/// ```ignore
/// let parsed = read_table("Salaries.csv", None)?;
/// println!("Encoding: {}, Delimiter: '{}'", parsed.encoding, parsed.delimiter);
/// println!("Rows: {}", parsed.row_count());
/// ```
pub fn read_table<P: AsRef<Path>>(path: P, delimiter: Option<char>) -> ExtractResult<ParsedTable> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ExtractError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ExtractError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_bytes_auto(&bytes, delimiter)
}
