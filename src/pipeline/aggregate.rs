//! Result aggregation: parse model output and merge records into one table.
//!
//! Model output is untyped JSON whose shape varies per document: usually a
//! single object, sometimes an array of objects (several transactions in
//! one agreement), occasionally something else entirely. [`ModelOutput`]
//! names the three cases and [`ModelOutput::into_records`] resolves them:
//!
//! | Parsed shape | Records appended |
//! |--------------|------------------|
//! | object       | exactly one |
//! | array        | one per element; non-object elements become `{"value": elem}` |
//! | scalar       | one, `{"value": scalar}` |
//!
//! Rows from different documents are never merged or deduplicated. The
//! uniform column set is the union of all field names in first-seen order;
//! a row lacking a column projects to [`Cell::Absent`].

use crate::error::{DocumentError, Pdf2TableError};
use crate::pipeline::postprocess;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

/// One extracted record: field name → value.
pub type StructuredRecord = Map<String, Value>;

/// Field name used when a non-object value is kept as a record.
pub const CATCH_ALL_FIELD: &str = "value";

/// The parsed model response, before it is flattened into records.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// A single JSON object.
    Mapping(StructuredRecord),
    /// A JSON array; each element becomes its own record.
    Records(Vec<Value>),
    /// Any other JSON value (string, number, bool, null).
    Other(Value),
}

impl ModelOutput {
    /// Clean and parse a raw model response.
    pub fn parse(raw: &str) -> Result<Self, DocumentError> {
        let cleaned = postprocess::clean_model_output(raw);
        let value: Value =
            serde_json::from_str(&cleaned).map_err(|e| DocumentError::MalformedModelOutput {
                detail: format!("{} (response starts with {:?})", e, preview(&cleaned)),
            })?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => ModelOutput::Mapping(map),
            Value::Array(items) => ModelOutput::Records(items),
            other => ModelOutput::Other(other),
        }
    }

    /// Flatten into records, one level deep.
    pub fn into_records(self) -> Vec<StructuredRecord> {
        match self {
            ModelOutput::Mapping(map) => vec![map],
            ModelOutput::Records(items) => items.into_iter().map(wrap_record).collect(),
            ModelOutput::Other(v) => vec![wrap_record(v)],
        }
    }
}

fn wrap_record(value: Value) -> StructuredRecord {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert(CATCH_ALL_FIELD.to_string(), other);
            map
        }
    }
}

fn preview(s: &str) -> String {
    s.chars().take(40).collect()
}

/// Parse a raw model response straight into records.
pub fn parse_records(raw: &str) -> Result<Vec<StructuredRecord>, DocumentError> {
    Ok(ModelOutput::parse(raw)?.into_records())
}

/// One row of the table, attributed to its source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub document_index: usize,
    pub record: StructuredRecord,
}

/// A cell of the uniform projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Value(&'a Value),
    /// The row's record has no such field.
    Absent,
}

impl Cell<'_> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }

    /// Text form for flat outputs: strings unquoted, absent and null empty,
    /// other values as compact JSON.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Absent | Cell::Value(Value::Null) => String::new(),
            Cell::Value(Value::String(s)) => s.clone(),
            Cell::Value(v) => v.to_string(),
        }
    }
}

/// Ordered records from a batch of documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<TableRow>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `raw` and append its records for `document_index`.
    ///
    /// Returns the number of records appended. On malformed output nothing
    /// is appended.
    pub fn aggregate(&mut self, document_index: usize, raw: &str) -> Result<usize, DocumentError> {
        let records = parse_records(raw)?;
        let n = records.len();
        self.append(document_index, records);
        Ok(n)
    }

    /// Append already-parsed records, keeping their order.
    pub fn append(&mut self, document_index: usize, records: Vec<StructuredRecord>) {
        self.rows.extend(records.into_iter().map(|record| TableRow {
            document_index,
            record,
        }));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Union of all field names, in order of first appearance.
    pub fn columns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for row in &self.rows {
            for key in row.record.keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }

    /// Project every row onto [`Self::columns`].
    pub fn projected_rows(&self) -> Vec<Vec<Cell<'_>>> {
        let columns = self.columns();
        self.rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| row.record.get(c).map_or(Cell::Absent, Cell::Value))
                    .collect()
            })
            .collect()
    }

    /// Render the projection as CSV with a leading `document` column
    /// holding the 1-based document number.
    pub fn to_csv(&self) -> Result<String, Pdf2TableError> {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::<u8>::new());
        self.write_records(&mut writer)?;
        let bytes = writer
            .into_inner()
            .map_err(|e| Pdf2TableError::Internal(format!("CSV flush failed: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| Pdf2TableError::Internal(format!("invalid utf-8 CSV output: {}", e)))
    }

    /// Write the projection as CSV to `path`.
    pub fn write_csv(&self, path: &Path) -> Result<(), Pdf2TableError> {
        let mut writer = csv::WriterBuilder::new().from_path(path)?;
        self.write_records(&mut writer)?;
        writer.flush().map_err(|e| Pdf2TableError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn write_records<W: std::io::Write>(
        &self,
        writer: &mut csv::Writer<W>,
    ) -> Result<(), Pdf2TableError> {
        let columns = self.columns();
        let mut header = Vec::with_capacity(columns.len() + 1);
        header.push(document_column_name(&columns));
        header.extend(columns.iter().cloned());
        writer.write_record(&header)?;

        for (row, cells) in self.rows.iter().zip(self.projected_rows()) {
            let mut record = Vec::with_capacity(cells.len() + 1);
            record.push((row.document_index + 1).to_string());
            record.extend(cells.iter().map(Cell::to_text));
            writer.write_record(&record)?;
        }
        Ok(())
    }
}

/// Header for the leading 1-based document number column. Prefixed with
/// underscores until it cannot shadow a schema field.
fn document_column_name(columns: &[String]) -> String {
    let mut name = String::from("_document");
    while columns.iter().any(|c| *c == name) {
        name.insert(0, '_');
    }
    name
}

impl Serialize for ResultTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ResultTable", 2)?;
        s.serialize_field("columns", &self.columns())?;
        s.serialize_field("rows", &self.rows)?;
        s.end()
    }
}
