use std::io::Write;
use chrono::{DateTime, TimeZone};
use regex::Regex;
use crate::{ColumnDefinition, Lookup, Result, Scalar};

const ROW_TERMINATOR: &str = "\r\n";

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// One CSV cell. Values containing a comma or either quote character are
/// quoted, with embedded double quotes doubled.
pub fn format_cell(value: &Scalar) -> String {
    let text = value.to_text();
    if text.contains(|c: char| c == ',' || c == '"' || c == '\'') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.into_owned()
    }
}

fn header_cells(columns: &[ColumnDefinition]) -> Vec<String> {
    columns.iter()
        .map(|column| format_cell(&Scalar::from(column.heading())))
        .collect()
}

fn row_cells<T: Lookup>(row: &T, columns: &[ColumnDefinition]) -> Vec<String> {
    columns.iter()
        .map(|column| format_cell(&column.render_for_export.export(row.lookup(&column.key))))
        .collect()
}

fn encode_line(cells: &[String]) -> String {
    let mut line = cells.join(",");
    line.push_str(ROW_TERMINATOR);
    line
}

/// Header plus one line per row, every line ending in CRLF.
pub fn to_delimited_text<T: Lookup>(rows: &[T], columns: &[ColumnDefinition]) -> String {
    let mut text = encode_line(&header_cells(columns));
    for row in rows {
        text.push_str(&encode_line(&row_cells(row, columns)));
    }
    text
}

/// Writes rows as CSV to any writer.
pub struct CsvExporter<I: Iterator> {
    columns: Vec<ColumnDefinition>,
    rows: I,
}

impl<T, I: Iterator<Item=T>> CsvExporter<I>
    where T: Lookup
{
    pub fn new(columns: Vec<ColumnDefinition>, rows: I) -> CsvExporter<I> {
        CsvExporter { columns, rows }
    }

    pub fn write_all<W: Write>(&mut self, writer: W) -> Result<()> {
        // Cells are escaped up front, the writer only joins them.
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .terminator(csv::Terminator::CRLF)
            .from_writer(writer);

        csv_writer.write_record(header_cells(&self.columns))?;
        let mut written = 0;
        for row in &mut self.rows {
            csv_writer.write_record(row_cells(&row, &self.columns))?;
            written += 1;
        }
        csv_writer.flush()?;
        tracing::debug!("exported {} rows", written);
        Ok(())
    }
}

/// The same text as `to_delimited_text`, one chunk per line.
#[cfg(feature = "async")]
pub fn stream_delimited_text<T, I>(rows: I, columns: Vec<ColumnDefinition>)
    -> impl futures::Stream<Item=Result<bytes::Bytes>>
    where T: Lookup,
          I: IntoIterator<Item=T>,
{
    let header = encode_line(&header_cells(&columns));
    let lines = rows.into_iter()
        .map(move |row| encode_line(&row_cells(&row, &columns)));
    futures::stream::iter(
        std::iter::once(header)
            .chain(lines)
            .map(|line| Ok(bytes::Bytes::from(line)))
    )
}

/// `<base>_<YYYY_MM_DD_HH_MM_SS>.csv` with whitespace runs in `base` turned
/// into underscores.
pub fn export_file_name<Tz: TimeZone>(base: &str, timestamp: &DateTime<Tz>) -> String
    where Tz::Offset: std::fmt::Display
{
    let base = WHITESPACE.replace_all(base, "_");
    format!("{}_{}.csv", base, timestamp.format("%Y_%m_%d_%H_%M_%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Named(Scalar);

    impl Lookup for Named {
        fn lookup(&self, path: &str) -> Scalar {
            match path {
                "name" => self.0.clone(),
                _ => Scalar::Null,
            }
        }
    }

    fn name_column() -> Vec<ColumnDefinition> {
        vec![ColumnDefinition::new("name")]
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&Scalar::from("a,b")), "\"a,b\"");
        assert_eq!(format_cell(&Scalar::from("a\"b")), "\"a\"\"b\"");
        assert_eq!(format_cell(&Scalar::from("say \"hi\" twice")), "\"say \"\"hi\"\" twice\"");
        assert_eq!(format_cell(&Scalar::from("it's")), "\"it's\"");
        assert_eq!(format_cell(&Scalar::from("value,")), "\"value,\"");
        assert_eq!(format_cell(&Scalar::Null), "");
        assert_eq!(format_cell(&Scalar::Float(0.000123)), "0.000123");
        assert_eq!(format_cell(&Scalar::Int(42)), "42");
    }

    #[test]
    fn test_to_delimited_text() {
        let rows = vec![Named(Scalar::from("a,b")), Named(Scalar::Null)];
        assert_eq!(to_delimited_text(&rows, &name_column()), "name\r\n\"a,b\"\r\n\r\n");
    }

    #[test]
    fn test_headings() {
        let columns = vec![ColumnDefinition::new("group_result.af").with_heading("AF")];
        let rows: Vec<Named> = Vec::new();
        assert_eq!(to_delimited_text(&rows, &columns), "AF\r\n");
    }

    #[test]
    fn test_exporter_matches_text() {
        let rows = vec![Named(Scalar::from("a\"b")), Named(Scalar::Float(0.5))];
        let mut output = Vec::new();
        CsvExporter::new(name_column(), rows.iter()).write_all(&mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), to_delimited_text(&rows, &name_column()));
    }

    #[cfg(feature = "async")]
    #[test]
    fn test_stream_matches_text() {
        use futures::{executor::block_on, StreamExt};

        let rows = vec![Named(Scalar::from("x")), Named(Scalar::Int(1))];
        let expected = to_delimited_text(&rows, &name_column());
        let chunks: Vec<Result<bytes::Bytes>> = block_on(stream_delimited_text(rows, name_column()).collect());
        let streamed: Vec<u8> = chunks.into_iter().flat_map(|chunk| chunk.unwrap().to_vec()).collect();
        assert_eq!(String::from_utf8(streamed).unwrap(), expected);
    }

    #[test]
    fn test_export_file_name() {
        let timestamp = chrono::Utc.with_ymd_and_hms(2020, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(
            export_file_name("All Samples_ENSG00000169174_variants", &timestamp),
            "All_Samples_ENSG00000169174_variants_2020_03_07_09_05_01.csv",
        );
    }
}
