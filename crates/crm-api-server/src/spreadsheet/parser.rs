use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use encoding_rs::WINDOWS_1252;
use tracing::debug;

use crate::utils::EngineError;

/// Decode an uploaded workbook into raw cell rows. XLSX/XLS goes through
/// calamine (first sheet only); everything else is treated as CSV.
pub fn decode_rows(filename: &str, bytes: &[u8]) -> Result<Vec<Vec<String>>, EngineError> {
    let extension = filename
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_lowercase();

    debug!("Decoding upload {} ({} bytes)", filename, bytes.len());

    match extension.as_str() {
        "xlsx" | "xls" => decode_excel(bytes),
        _ => decode_csv(bytes),
    }
}

fn decode_excel(bytes: &[u8]) -> Result<Vec<Vec<String>>, EngineError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor).map_err(|e| {
        EngineError::Validation(format!("Failed to parse the file as a workbook: {e}"))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| EngineError::Validation("The workbook has no sheets".to_string()))?
        .map_err(|e| EngineError::Validation(format!("Failed to read the first sheet: {e}")))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

fn decode_csv(bytes: &[u8]) -> Result<Vec<Vec<String>>, EngineError> {
    // Legacy exports are not always UTF-8
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => WINDOWS_1252.decode(bytes).0.into_owned(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| EngineError::Validation(format!("Failed to parse the file as CSV: {e}")))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_round_trip() {
        let bytes = b"Account Name,Billing City\nAcme Labs,Pune\n";
        let rows = decode_rows("upload.csv", bytes).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["Account Name", "Billing City"]);
        assert_eq!(rows[1], vec!["Acme Labs", "Pune"]);
    }

    #[test]
    fn non_utf8_csv_is_decoded_leniently() {
        // "Caf\xe9" in Windows-1252
        let bytes = b"Name\nCaf\xe9\n";
        let rows = decode_rows("upload.csv", bytes).unwrap();
        assert_eq!(rows[1][0], "Caf\u{e9}");
    }

    #[test]
    fn garbage_xlsx_is_rejected() {
        let err = decode_rows("upload.xlsx", b"not a zip archive").unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
