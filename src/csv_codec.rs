//! CSV import/export of the recipient list.
//!
//! Layout: a header `address,<SYMBOL>,<SYMBOL>...` followed by one line per recipient with
//! the amount for each column, or an empty field when the recipient has none. The format
//! has no quoting or escaping, so addresses and amounts must not contain commas or
//! newlines.
//!
//! A list survives `decode(encode(..))` unchanged when every address is non-empty, no
//! symbol or amount is blank or padded with whitespace, and each recipient lists its
//! tokens in column order (see [`columns`]). The recipient ledger never commits an empty
//! address or a blank amount, and lists produced by `decode` are always in column order.

use crate::error::{Error, Result};
use crate::types::{Recipient, TokenAmount};
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const ADDRESS_HEADER: &str = "address";

/// Parse CSV text into recipients.
///
/// Blank lines are skipped and CRLF line endings accepted. Nothing is validated here:
/// addresses, symbols and amounts are carried as text until dispatch.
///
/// # Errors
/// `Error::MalformedInput` when the text has no header line.
pub fn decode(text: &str) -> Result<Vec<Recipient>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record?,
        None => return Err(Error::MalformedInput("CSV input has no header line".to_string())),
    };

    // One slot per column after the address; blank or repeated symbols are ignored.
    let mut seen = HashSet::new();
    let columns: Vec<Option<String>> = header
        .iter()
        .skip(1)
        .enumerate()
        .map(|(i, field)| {
            let symbol = field.trim();
            if symbol.is_empty() {
                warn!("Ignoring CSV column {} with an empty token symbol", i + 2);
                None
            } else if !seen.insert(symbol.to_string()) {
                warn!("Ignoring repeated CSV column for token {}", symbol);
                None
            } else {
                Some(symbol.to_string())
            }
        })
        .collect();

    let mut recipients = Vec::new();
    for record in records {
        let record = record?;
        let mut fields = record.iter();
        let address = fields.next().unwrap_or_default().to_string();

        let token_amounts = columns
            .iter()
            .zip(fields)
            .filter_map(|(column, field)| {
                let symbol = column.as_ref()?;
                let amount = field.trim();
                (!amount.is_empty()).then(|| TokenAmount::new(symbol.clone(), amount))
            })
            .collect();

        recipients.push(Recipient {
            address,
            token_amounts,
        });
    }

    debug!("Decoded {} recipient(s) from CSV", recipients.len());
    Ok(recipients)
}

/// Every distinct symbol across `recipients`, in first-seen order.
pub fn columns(recipients: &[Recipient]) -> Vec<String> {
    let mut seen = HashSet::new();
    recipients
        .iter()
        .flat_map(|r| r.symbols())
        .filter(|s| seen.insert(*s))
        .map(str::to_string)
        .collect()
}

/// Render recipients as CSV text, one line per recipient.
pub fn encode(recipients: &[Recipient]) -> Result<String> {
    let columns = columns(recipients);

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .from_writer(Vec::new());

    let header = std::iter::once(ADDRESS_HEADER).chain(columns.iter().map(String::as_str));
    writer.write_record(header)?;

    for recipient in recipients {
        let amounts = columns
            .iter()
            .map(|symbol| recipient.amount_for(symbol).unwrap_or(""));
        let row = std::iter::once(recipient.address.as_str()).chain(amounts);
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))?;
    String::from_utf8(bytes).map_err(|e| Error::MalformedInput(e.to_string()))
}

pub fn read_file(path: &Path) -> Result<Vec<Recipient>> {
    let text = fs::read_to_string(path)?;
    decode(&text)
}

pub fn write_file(path: &Path, recipients: &[Recipient]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, encode(recipients)?)?;
    Ok(())
}
