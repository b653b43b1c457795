use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;

/// Expected columns and the type each is coerced to.
pub const COLUMNS: &[(&str, &str)] = &[
    ("Date", "date"),
    ("Product_Category", "text"),
    ("Product", "text"),
    ("Region", "text"),
    ("Quantity", "int"),
    ("Unit_Price", "decimal"),
    ("Customer_Age", "int"),
    ("Customer_Gender", "M/F"),
    ("Payment_Method", "text"),
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Cell values read as missing, in addition to the empty string.
const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// True for an empty cell or one of the usual NA markers.
pub fn is_missing(cell: &str) -> bool {
    cell.is_empty() || NA_TOKENS.contains(&cell)
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("missing column {0:?}")]
    MissingColumn(&'static str),
    #[error("line {line}: {column} is empty")]
    MissingValue { line: usize, column: &'static str },
    #[error("line {line}: expected {expected} fields, found {found}")]
    ExtraFields {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: {column} has invalid value {value:?}")]
    BadValue {
        line: usize,
        column: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    M,
    F,
}

impl Gender {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "m" | "male" => Some(Gender::M),
            "f" | "female" => Some(Gender::F),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub category: String,
    pub product: Option<String>,
    pub region: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub customer_age: Option<u32>,
    pub gender: Gender,
    pub payment_method: String,
    /// quantity × unit_price, derived at load
    pub revenue: f64,
}

impl SalesRecord {
    /// `YYYY-MM` bucket of the sale date.
    pub fn month(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

/// The sales CSV as loaded: raw cells for quality checks plus typed rows.
#[derive(Debug, Clone, Default)]
pub struct SalesTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub records: Vec<SalesRecord>,
}

impl SalesTable {
    pub fn column_type(name: &str) -> &'static str {
        COLUMNS
            .iter()
            .find(|(col, _)| *col == name)
            .map(|(_, kind)| *kind)
            .unwrap_or("text")
    }
}

pub fn load(path: &Path) -> Result<SalesTable, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Open {
        path: path.display().to_string(),
        source,
    })?;
    from_reader(file)
}

pub fn from_reader<R: Read>(input: R) -> Result<SalesTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), i))
        .collect();
    let columns = ColumnIndex::resolve(&index)?;

    let mut rows = Vec::new();
    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        if record.len() > headers.len() {
            return Err(LoadError::ExtraFields {
                line,
                expected: headers.len(),
                found: record.len(),
            });
        }
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(headers.len(), String::new());
        records.push(columns.parse(&row, line)?);
        rows.push(row);
    }

    Ok(SalesTable {
        headers,
        rows,
        records,
    })
}

struct ColumnIndex {
    date: usize,
    category: usize,
    product: usize,
    region: usize,
    quantity: usize,
    unit_price: usize,
    age: usize,
    gender: usize,
    payment: usize,
}

impl ColumnIndex {
    fn resolve(index: &HashMap<&str, usize>) -> Result<Self, LoadError> {
        let find = |name: &'static str| {
            index
                .get(name)
                .copied()
                .ok_or(LoadError::MissingColumn(name))
        };
        Ok(Self {
            date: find("Date")?,
            category: find("Product_Category")?,
            product: find("Product")?,
            region: find("Region")?,
            quantity: find("Quantity")?,
            unit_price: find("Unit_Price")?,
            age: find("Customer_Age")?,
            gender: find("Customer_Gender")?,
            payment: find("Payment_Method")?,
        })
    }

    fn parse(&self, row: &[String], line: usize) -> Result<SalesRecord, LoadError> {
        let required = |i: usize, column: &'static str| {
            let v = row[i].as_str();
            if is_missing(v) {
                Err(LoadError::MissingValue { line, column })
            } else {
                Ok(v)
            }
        };
        let bad = |column: &'static str, value: &str| LoadError::BadValue {
            line,
            column,
            value: value.to_string(),
        };

        let raw = required(self.date, "Date")?;
        let date = parse_date(raw).ok_or_else(|| bad("Date", raw))?;

        let raw = required(self.quantity, "Quantity")?;
        let quantity = parse_int(raw).ok_or_else(|| bad("Quantity", raw))?;

        let raw = required(self.unit_price, "Unit_Price")?;
        let unit_price: f64 = raw
            .parse()
            .ok()
            .filter(|p: &f64| p.is_finite())
            .ok_or_else(|| bad("Unit_Price", raw))?;

        let raw = row[self.age].as_str();
        let customer_age = if is_missing(raw) {
            None
        } else {
            let age = parse_int(raw)
                .and_then(|a| u32::try_from(a).ok())
                .ok_or_else(|| bad("Customer_Age", raw))?;
            Some(age)
        };

        let raw = required(self.gender, "Customer_Gender")?;
        let gender = Gender::parse(raw).ok_or_else(|| bad("Customer_Gender", raw))?;

        let product = Some(row[self.product].clone()).filter(|p| !is_missing(p));

        Ok(SalesRecord {
            date,
            category: required(self.category, "Product_Category")?.to_string(),
            product,
            region: required(self.region, "Region")?.to_string(),
            quantity,
            unit_price,
            customer_age,
            gender,
            payment_method: required(self.payment, "Payment_Method")?.to_string(),
            revenue: quantity as f64 * unit_price,
        })
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    // tolerate a trailing time component ("2024-01-05 00:00:00")
    let day = s.split_whitespace().next()?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
}

/// Integers may arrive as "34.0" when the column had gaps upstream.
fn parse_int(s: &str) -> Option<i64> {
    s.parse::<i64>().ok().or_else(|| {
        let f: f64 = s.parse().ok()?;
        (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Date,Product_Category,Product,Region,Quantity,Unit_Price,Customer_Age,Customer_Gender,Payment_Method\n";

    fn load_str(body: &str) -> Result<SalesTable, LoadError> {
        from_reader(format!("{}{}", HEADER, body).as_bytes())
    }

    #[test]
    fn typed_row_and_revenue() {
        let t = load_str("2024-01-15,Electronics,Laptop,North,2,899.99,34,M,Credit Card\n").unwrap();
        assert_eq!(t.records.len(), 1);
        let r = &t.records[0];
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(r.product.as_deref(), Some("Laptop"));
        assert_eq!(r.quantity, 2);
        assert_eq!(r.customer_age, Some(34));
        assert_eq!(r.gender, Gender::M);
        assert!((r.revenue - 1799.98).abs() < 1e-9);
        assert_eq!(r.month(), "2024-01");
    }

    #[test]
    fn empty_file_has_no_records() {
        let t = load_str("").unwrap();
        assert!(t.records.is_empty());
        assert_eq!(t.headers.len(), 9);
    }

    #[test]
    fn optional_cells_may_be_missing() {
        let t = load_str("2024-02-01,Clothing,,South,1,25.5,,F,Cash\n").unwrap();
        assert_eq!(t.records[0].product, None);
        assert_eq!(t.records[0].customer_age, None);
        assert_eq!(t.rows[0][2], "");
    }

    #[test]
    fn na_markers_read_as_missing() {
        let t = load_str(
            "2024-02-01,Clothing,NA,South,1,25.5,NaN,F,Cash\n\
             2024-02-02,Clothing,null,South,1,25.5,N/A,M,Cash\n",
        )
        .unwrap();
        assert!(t.records.iter().all(|r| r.product.is_none() && r.customer_age.is_none()));
        assert!(is_missing("#N/A") && is_missing("") && !is_missing("Nano"));

        let err = load_str("2024-02-01,NULL,Shirt,South,1,25.5,41,F,Cash\n").unwrap_err();
        assert!(matches!(err, LoadError::MissingValue { line: 2, column: "Product_Category" }));
    }

    #[test]
    fn line_numbers_follow_the_file() {
        let body = "2024-02-01,Clothing,\"Shirt,\nlong\",South,1,25.5,41,F,Cash\n\
                    \n\
                    2024-02-01,Clothing,Shirt,South,x,25.5,41,F,Cash\n";
        let err = load_str(body).unwrap_err();
        assert!(matches!(err, LoadError::BadValue { line: 5, column: "Quantity", .. }));
    }

    #[test]
    fn extra_fields_fail() {
        let err = load_str("2024-02-01,Clothing,Shirt,South,1,25.5,41,F,Cash,oops\n").unwrap_err();
        assert!(matches!(err, LoadError::ExtraFields { line: 2, expected: 9, found: 10 }));
    }

    #[test]
    fn float_encoded_age() {
        let t = load_str("2024-02-01,Clothing,Shirt,South,1,25.5,41.0,F,Cash\n").unwrap();
        assert_eq!(t.records[0].customer_age, Some(41));
    }

    #[test]
    fn required_cell_missing_fails_with_line() {
        let err = load_str("2024-02-01,Clothing,Shirt,South,,25.5,41,F,Cash\n").unwrap_err();
        assert!(matches!(err, LoadError::MissingValue { line: 2, column: "Quantity" }));
    }

    #[test]
    fn malformed_cells_fail() {
        let err = load_str("not-a-date,Clothing,Shirt,South,1,25.5,41,F,Cash\n").unwrap_err();
        assert!(matches!(err, LoadError::BadValue { column: "Date", .. }));
        let err = load_str("2024-02-01,Clothing,Shirt,South,1,25.5,41,X,Cash\n").unwrap_err();
        assert!(matches!(err, LoadError::BadValue { column: "Customer_Gender", .. }));
    }

    #[test]
    fn missing_column_fails() {
        let err = from_reader("Date,Region\n2024-01-01,North\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("Product_Category")));
    }

    #[test]
    fn fixture_loads() {
        let t = load(Path::new("tests/fixtures/sales.csv")).unwrap();
        assert_eq!(t.records.len(), 20);
        assert_eq!(t.rows.len(), 20);
    }
}
