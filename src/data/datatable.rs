use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the inferred data type of a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataType {
    String,
    Integer,
    Float,
    Boolean,
    DateTime,
    Null,
    Mixed, // For columns with mixed types
}

impl DataType {
    /// Infer type from a raw string cell.
    ///
    /// Declared rules, in order: empty or "null" is Null, "true"/"false" is
    /// Boolean, i64 parse is Integer, f64 parse is Float, date-like strings
    /// are DateTime, everything else is String.
    pub fn infer_from_string(value: &str) -> Self {
        if value.is_empty() || value.eq_ignore_ascii_case("null") {
            return DataType::Null;
        }

        if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
            return DataType::Boolean;
        }

        if value.parse::<i64>().is_ok() {
            return DataType::Integer;
        }

        if value.parse::<f64>().is_ok() {
            return DataType::Float;
        }

        // Simple heuristic - dashes or colons in expected positions
        if (value.contains('-') && value.len() >= 8) || (value.contains(':') && value.len() >= 5) {
            return DataType::DateTime;
        }

        DataType::String
    }

    /// Merge two types (for columns whose cells disagree)
    pub fn merge(&self, other: &DataType) -> DataType {
        if self == other {
            return self.clone();
        }

        match (self, other) {
            (DataType::Null, t) | (t, DataType::Null) => t.clone(),
            (DataType::Integer, DataType::Float) | (DataType::Float, DataType::Integer) => {
                DataType::Float
            }
            _ => DataType::Mixed,
        }
    }

    /// Whether a column of this type participates in mean imputation
    /// and charting.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }
}

/// Column metadata and definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataColumn {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub null_count: usize,
}

impl DataColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::String,
            nullable: true,
            null_count: 0,
        }
    }

    pub fn with_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }
}

/// A single cell value in the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(String), // Stored as the source's text form
    Null,
}

impl DataValue {
    /// Decode a raw string cell using the declared inference rules.
    pub fn from_string(s: &str) -> Self {
        match DataType::infer_from_string(s) {
            DataType::Null => DataValue::Null,
            DataType::Boolean => DataValue::Boolean(s.eq_ignore_ascii_case("true")),
            DataType::Integer => s
                .parse::<i64>()
                .map(DataValue::Integer)
                .unwrap_or_else(|_| DataValue::String(s.to_string())),
            DataType::Float => s
                .parse::<f64>()
                .map(DataValue::Float)
                .unwrap_or_else(|_| DataValue::String(s.to_string())),
            DataType::DateTime => DataValue::DateTime(s.to_string()),
            _ => DataValue::String(s.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    pub fn data_type(&self) -> DataType {
        match self {
            DataValue::String(_) => DataType::String,
            DataValue::Integer(_) => DataType::Integer,
            DataValue::Float(_) => DataType::Float,
            DataValue::Boolean(_) => DataType::Boolean,
            DataValue::DateTime(_) => DataType::DateTime,
            DataValue::Null => DataType::Null,
        }
    }

    /// Numeric reading of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Integer(i) => Some(*i as f64),
            DataValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Stable key text for exact-duplicate comparison. Distinguishes a null
    /// cell from an empty string and a float from its integer twin, and keys
    /// floats by bit pattern so NaN cells compare equal to themselves.
    /// Text payloads are length-prefixed so a cell embedding the row-key
    /// separator cannot forge another row's key.
    pub fn key_string(&self) -> String {
        match self {
            DataValue::String(s) => format!("s{}:{}", s.len(), s),
            DataValue::Integer(i) => format!("i:{}", i),
            DataValue::Float(f) => format!("f:{:016x}", f.to_bits()),
            DataValue::Boolean(b) => format!("b:{}", b),
            DataValue::DateTime(dt) => format!("d{}:{}", dt.len(), dt),
            DataValue::Null => "n".to_string(),
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::String(s) => write!(f, "{}", s),
            DataValue::Integer(i) => write!(f, "{}", i),
            DataValue::Float(fl) => write!(f, "{}", fl),
            DataValue::Boolean(b) => write!(f, "{}", b),
            DataValue::DateTime(dt) => write!(f, "{}", dt),
            DataValue::Null => write!(f, ""),
        }
    }
}

/// A row of data in the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    pub values: Vec<DataValue>,
}

impl DataRow {
    pub fn new(values: Vec<DataValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&DataValue> {
        self.values.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut DataValue> {
        self.values.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whole-row key for exact-duplicate detection.
    pub fn key_string(&self) -> String {
        let parts: Vec<String> = self.values.iter().map(|v| v.key_string()).collect();
        parts.join("\u{1f}")
    }
}

/// The main in-memory table: ordered named columns over positional rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTable {
    pub name: String,
    pub columns: Vec<DataColumn>,
    pub rows: Vec<DataRow>,
    /// Original source filename, when the table came from a file
    pub source_file: Option<String>,
    /// Source size in bytes, when known
    pub source_size: Option<u64>,
}

impl DataTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            source_file: None,
            source_size: None,
        }
    }

    /// Add a column, keeping names unique within the table. A duplicate name
    /// is mangled with a numeric suffix (`a`, `a.1`, `a.2`, ...); name-based
    /// selection and projection rely on this invariant.
    pub fn add_column(&mut self, column: DataColumn) -> &mut Self {
        let mut column = column;
        if self.get_column_index(&column.name).is_some() {
            let base = column.name.clone();
            let mut suffix = 1;
            while self
                .get_column_index(&format!("{}.{}", base, suffix))
                .is_some()
            {
                suffix += 1;
            }
            column.name = format!("{}.{}", base, suffix);
        }
        self.columns.push(column);
        self
    }

    pub fn add_row(&mut self, row: DataRow) -> Result<(), String> {
        if row.len() != self.columns.len() {
            return Err(format!(
                "Row has {} values but table has {} columns",
                row.len(),
                self.columns.len()
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn get_column(&self, name: &str) -> Option<&DataColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Indices of columns whose inferred type is numeric, in table order.
    pub fn numeric_column_indices(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.data_type.is_numeric())
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Infer and update column types based on data
    pub fn infer_column_types(&mut self) {
        for (col_idx, column) in self.columns.iter_mut().enumerate() {
            let mut inferred_type = DataType::Null;
            let mut null_count = 0;

            for row in &self.rows {
                if let Some(value) = row.get(col_idx) {
                    if value.is_null() {
                        null_count += 1;
                    } else {
                        inferred_type = inferred_type.merge(&value.data_type());
                    }
                }
            }

            column.data_type = inferred_type;
            column.null_count = null_count;
            column.nullable = null_count > 0;
        }
    }

    pub fn get_value(&self, row: usize, col: usize) -> Option<&DataValue> {
        self.rows.get(row)?.get(col)
    }

    pub fn get_value_by_name(&self, row: usize, col_name: &str) -> Option<&DataValue> {
        let col_idx = self.get_column_index(col_name)?;
        self.get_value(row, col_idx)
    }

    /// Convert to a vector of string vectors (for display/serialization)
    pub fn to_string_table(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.values.iter().map(|v| v.to_string()).collect())
            .collect()
    }

    /// Get a single row rendered as strings
    pub fn get_row_as_strings(&self, index: usize) -> Option<Vec<String>> {
        self.rows
            .get(index)
            .map(|row| row.values.iter().map(|value| value.to_string()).collect())
    }

    pub fn estimate_memory_size(&self) -> usize {
        let mut size = std::mem::size_of::<Self>();

        size += self.columns.len() * std::mem::size_of::<DataColumn>();
        for col in &self.columns {
            size += col.name.len();
        }

        size += self.rows.len() * std::mem::size_of::<DataRow>();

        for row in &self.rows {
            for value in &row.values {
                size += std::mem::size_of::<DataValue>();
                match value {
                    DataValue::String(s) | DataValue::DateTime(s) => size += s.len(),
                    _ => {} // Numbers and booleans are inline
                }
            }
        }

        size
    }
}
