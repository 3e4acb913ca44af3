use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate};
use derive_more::Display;

use crate::model::sales_item::NewSalesItem;

/// Columns every uploaded sheet must carry, matched case-insensitively.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "date",
    "no",
    "item",
    "price",
    "quantity",
    "buying price",
    "payment mode",
];

/// Day zero of the Excel 1900 date system.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

#[derive(Debug, Display, PartialEq)]
pub enum IngestError {
    #[display(fmt = "Excel file is empty or invalid")]
    EmptySheet,
    #[display(fmt = "Missing required column: {}", _0)]
    MissingColumn(String),
    /// Carries the 1-based spreadsheet row (header row included).
    #[display(fmt = "Missing order number (no) in row {}", _0)]
    MissingOrderNumber(usize),
    #[display(fmt = "Failed to read workbook: {}", _0)]
    Workbook(String),
}

impl std::error::Error for IngestError {}

/// A spreadsheet cell reduced to the three shapes the normalizer cares
/// about. Whitespace-only text counts as empty.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    fn from_cell(cell: &Data) -> Self {
        match cell {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(trimmed.to_string())
                }
            }
            Data::Bool(b) => CellValue::Text(b.to_string()),
            Data::Empty | Data::Error(_) => CellValue::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric reading; text is parsed as a float and anything else is 0.
    pub fn as_f64(&self) -> f64 {
        match self {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => s.parse().unwrap_or(0.0),
            CellValue::Empty => 0.0,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

/// First worksheet of an uploaded workbook: lower-cased headers and one
/// map per data row keyed by those headers.
#[derive(Debug)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, CellValue>>,
}

/// Parses the first worksheet out of raw xlsx bytes.
pub fn read_workbook(bytes: &[u8]) -> Result<Sheet, IngestError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook: Xlsx<_> =
        Xlsx::new(cursor).map_err(|e| IngestError::Workbook(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::EmptySheet)?
        .map_err(|e| IngestError::Workbook(e.to_string()))?;

    let mut rows = range.rows();

    let headers: Vec<String> = rows
        .next()
        .ok_or(IngestError::EmptySheet)?
        .iter()
        .map(|cell| cell.to_string().trim().to_lowercase())
        .collect();

    let rows: Vec<HashMap<String, CellValue>> = rows
        .map(|row| {
            headers
                .iter()
                .cloned()
                .zip(row.iter().map(CellValue::from_cell))
                .collect()
        })
        .collect();

    Ok(Sheet { headers, rows })
}

/// All-or-nothing validation: every required column present and every
/// row carrying an order number, otherwise the whole upload is rejected.
pub fn validate(sheet: &Sheet) -> Result<(), IngestError> {
    if sheet.rows.is_empty() {
        return Err(IngestError::EmptySheet);
    }

    for col in REQUIRED_COLUMNS {
        if !sheet.headers.iter().any(|h| h == col) {
            return Err(IngestError::MissingColumn(col.to_string()));
        }
    }

    for (i, row) in sheet.rows.iter().enumerate() {
        let order = row.get("no").unwrap_or(&CellValue::Empty);
        if order.is_empty() {
            // +2: header row plus 1-based indexing
            return Err(IngestError::MissingOrderNumber(i + 2));
        }
    }

    Ok(())
}

/// Validates the sheet and normalizes every row into an insertable item.
pub fn to_sales_items(sheet: &Sheet) -> Result<Vec<NewSalesItem>, IngestError> {
    validate(sheet)?;

    let items = sheet
        .rows
        .iter()
        .map(|row| {
            let get = |key: &str| row.get(key).cloned().unwrap_or(CellValue::Empty);

            NewSalesItem {
                date: normalize_date(&get("date")),
                order_number: normalize_order_number(&get("no")),
                item_name: get("item").as_text(),
                selling_price: get("price").as_f64(),
                quantity: get("quantity").as_f64(),
                buying_price: get("buying price").as_f64(),
                payment_mode: get("payment mode").as_text(),
            }
        })
        .collect();

    Ok(items)
}

/// Converts an Excel serial date (days since 1899-12-30, fractional part
/// is the time of day) to a calendar date. The time component is
/// discarded; only the date survives into the ledger.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_signed(Duration::days(serial.floor() as i64))
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

    for fmt in FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    // Datetime strings keep the date part only
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    None
}

/// Date cells arrive as serials, strings, or nothing; unparseable input
/// becomes NULL rather than failing the upload.
pub fn normalize_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Number(serial) => serial_to_date(*serial),
        CellValue::Text(s) => parse_date_text(s),
        CellValue::Empty => None,
    }
}

/// Numeric order numbers are prefixed `ORD-`; text passes through.
pub fn normalize_order_number(cell: &CellValue) -> String {
    match cell {
        CellValue::Number(n) => format!("ORD-{}", n),
        CellValue::Text(s) => s.clone(),
        CellValue::Empty => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sheet(headers: &[&str], rows: Vec<Vec<CellValue>>) -> Sheet {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|row| headers.iter().cloned().zip(row).collect())
            .collect();
        Sheet { headers, rows }
    }

    fn valid_row(no: CellValue) -> Vec<CellValue> {
        vec![
            CellValue::Number(44927.0),
            no,
            CellValue::Text("Cornflakes".into()),
            CellValue::Number(100.0),
            CellValue::Number(3.0),
            CellValue::Number(60.0),
            CellValue::Text("cash".into()),
        ]
    }

    const HEADERS: [&str; 7] = [
        "date",
        "no",
        "item",
        "price",
        "quantity",
        "buying price",
        "payment mode",
    ];

    #[test]
    fn rejects_sheet_without_rows() {
        let s = sheet(&HEADERS, vec![]);
        assert_eq!(validate(&s), Err(IngestError::EmptySheet));
    }

    #[test]
    fn rejects_missing_required_column() {
        let headers = ["date", "no", "item", "price", "quantity", "buying price"];
        let s = sheet(&headers, vec![valid_row(CellValue::Number(1.0))[..6].to_vec()]);
        assert_eq!(
            validate(&s),
            Err(IngestError::MissingColumn("payment mode".into()))
        );
        assert_eq!(
            validate(&s).unwrap_err().to_string(),
            "Missing required column: payment mode"
        );
    }

    #[test]
    fn rejects_blank_order_number_naming_the_row() {
        let s = sheet(
            &HEADERS,
            vec![
                valid_row(CellValue::Number(1.0)),
                valid_row(CellValue::Empty),
                valid_row(CellValue::Number(3.0)),
            ],
        );
        let err = validate(&s).unwrap_err();
        assert_eq!(err, IngestError::MissingOrderNumber(3));
        assert_eq!(err.to_string(), "Missing order number (no) in row 3");
    }

    #[test]
    fn whitespace_text_cells_count_as_blank() {
        assert_eq!(CellValue::from_cell(&Data::String("   ".into())), CellValue::Empty);
        assert_eq!(CellValue::from_cell(&Data::Empty), CellValue::Empty);
        assert_eq!(
            CellValue::from_cell(&Data::String(" SO-7 ".into())),
            CellValue::Text("SO-7".into())
        );
        assert_eq!(CellValue::from_cell(&Data::Int(5)), CellValue::Number(5.0));

        let s = sheet(&HEADERS, vec![valid_row(CellValue::Empty)]);
        assert_eq!(validate(&s), Err(IngestError::MissingOrderNumber(2)));
    }

    #[test]
    fn normalizes_every_valid_row() {
        let s = sheet(
            &HEADERS,
            vec![
                valid_row(CellValue::Number(1.0)),
                valid_row(CellValue::Text("A-99".into())),
                valid_row(CellValue::Number(3.0)),
            ],
        );
        let items = to_sales_items(&s).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].order_number, "ORD-1");
        assert_eq!(items[1].order_number, "A-99");
        assert_eq!(items[0].date, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(items[0].selling_price, 100.0);
        assert_eq!(items[0].buying_price, 60.0);
        assert_eq!(items[0].revenue(), 100.0);
        assert_eq!(items[0].profit(), 40.0);
    }

    #[rstest]
    #[case(44927.0, 2023, 1, 1)]
    #[case(44927.75, 2023, 1, 1)] // fractional day is time of day
    #[case(45092.0, 2023, 6, 15)]
    #[case(25569.0, 1970, 1, 1)]
    fn converts_excel_serials(
        #[case] serial: f64,
        #[case] y: i32,
        #[case] m: u32,
        #[case] d: u32,
    ) {
        assert_eq!(serial_to_date(serial), NaiveDate::from_ymd_opt(y, m, d));
    }

    #[test]
    fn non_finite_serial_is_none() {
        assert_eq!(serial_to_date(f64::NAN), None);
        assert_eq!(serial_to_date(f64::INFINITY), None);
    }

    #[rstest]
    #[case("2023-06-15", Some((2023, 6, 15)))]
    #[case("2023/06/15", Some((2023, 6, 15)))]
    #[case("06/15/2023", Some((2023, 6, 15)))]
    #[case("2023-06-15T10:30:00", Some((2023, 6, 15)))]
    #[case("not a date", None)]
    fn parses_string_dates(#[case] input: &str, #[case] expected: Option<(i32, u32, u32)>) {
        let expected = expected.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        assert_eq!(normalize_date(&CellValue::Text(input.into())), expected);
    }

    #[test]
    fn empty_date_cell_is_none() {
        assert_eq!(normalize_date(&CellValue::Empty), None);
    }

    #[test]
    fn order_number_prefixing() {
        assert_eq!(normalize_order_number(&CellValue::Number(7.0)), "ORD-7");
        assert_eq!(normalize_order_number(&CellValue::Number(7.5)), "ORD-7.5");
        assert_eq!(
            normalize_order_number(&CellValue::Text("SO-1001".into())),
            "SO-1001"
        );
    }

    #[test]
    fn numeric_cells_from_text() {
        assert_eq!(CellValue::Text("12.5".into()).as_f64(), 12.5);
        assert_eq!(CellValue::Text("n/a".into()).as_f64(), 0.0);
        assert_eq!(CellValue::Empty.as_f64(), 0.0);
        assert_eq!(CellValue::Number(9.0).as_text(), "9");
    }
}
