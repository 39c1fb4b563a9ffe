//! CSV text generation.

use csv::{QuoteStyle, WriterBuilder};

/// Serialize rows into CSV text with the given header.
///
/// Values containing a comma, quote, or newline are quoted with internal
/// quotes doubled; everything else is written bare. Rows are joined by
/// `\n` with no trailing newline. An empty row list yields an empty
/// string, header included.
pub fn to_csv(columns: &[&'static str], rows: &[Vec<String>]) -> Result<String, csv::Error> {
    if rows.is_empty() {
        return Ok(String::new());
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    let mut text = String::from_utf8(bytes).map_err(|err| {
        csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })?;

    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rows_yield_empty_string() {
        let csv = to_csv(&["A", "B"], &[]).unwrap();
        assert_eq!(csv, "");
    }

    #[test]
    fn test_header_and_rows() {
        let rows = vec![
            vec!["Account".to_string(), "Name".to_string()],
            vec!["Case".to_string(), "Subject".to_string()],
        ];
        let csv = to_csv(&["ObjectName", "FieldName"], &rows).unwrap();
        assert_eq!(csv, "ObjectName,FieldName\nAccount,Name\nCase,Subject");
    }

    #[test]
    fn test_no_trailing_newline() {
        let rows = vec![vec!["x".to_string()]];
        let csv = to_csv(&["A"], &rows).unwrap();
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_escaping_special_characters() {
        let rows = vec![vec![
            "plain".to_string(),
            "has,comma".to_string(),
            "has\"quote".to_string(),
            "has\nnewline".to_string(),
        ]];
        let csv = to_csv(&["A", "B", "C", "D"], &rows).unwrap();
        let line = csv.lines().nth(1).unwrap_or(&csv);
        assert!(line.starts_with("plain,\"has,comma\",\"has\"\"quote\","));
        assert!(csv.contains("\"has\nnewline\""));
    }

    #[test]
    fn test_round_trip_through_reader() {
        let gnarly = "a,b\"c\nd";
        let rows = vec![vec![gnarly.to_string(), "plain".to_string()]];
        let csv = to_csv(&["Value", "Other"], &rows).unwrap();

        let mut reader = csv::ReaderBuilder::new().from_reader(csv.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], gnarly);
        assert_eq!(&record[1], "plain");
    }

    #[test]
    fn test_empty_values_serialize_empty() {
        let rows = vec![vec!["".to_string(), "x".to_string(), "".to_string()]];
        let csv = to_csv(&["A", "B", "C"], &rows).unwrap();
        assert_eq!(csv.lines().nth(1), Some(",x,"));
    }
}
