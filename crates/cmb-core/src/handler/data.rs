//! Representación neutral de los datos que cruzan un handler.
//!
//! `AssetData` cubre las formas que aparecen en el pipeline (documentos JSON,
//! texto, tablas indexadas por banda, arreglos numéricos) sin depender de
//! ninguna librería científica. Los tipos fuertes de `cmb-handlers`
//! implementan `AssetPayload` para convertirse desde/hacia esta forma.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::HandlerError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssetData {
    Json(Value),
    Text(String),
    Table(Table),
    Array(ArrayData),
    Bytes(Vec<u8>),
}

impl AssetData {
    pub fn kind(&self) -> &'static str {
        match self {
            AssetData::Json(_) => "json",
            AssetData::Text(_) => "text",
            AssetData::Table(_) => "table",
            AssetData::Array(_) => "array",
            AssetData::Bytes(_) => "bytes",
        }
    }

    fn wrong(&self, expected: &'static str) -> HandlerError {
        HandlerError::WrongData { expected, found: self.kind() }
    }

    pub fn as_json(&self) -> Result<&Value, HandlerError> {
        match self {
            AssetData::Json(v) => Ok(v),
            other => Err(other.wrong("json")),
        }
    }

    pub fn as_text(&self) -> Result<&str, HandlerError> {
        match self {
            AssetData::Text(s) => Ok(s),
            other => Err(other.wrong("text")),
        }
    }

    pub fn as_table(&self) -> Result<&Table, HandlerError> {
        match self {
            AssetData::Table(t) => Ok(t),
            other => Err(other.wrong("table")),
        }
    }

    pub fn as_array(&self) -> Result<&ArrayData, HandlerError> {
        match self {
            AssetData::Array(a) => Ok(a),
            other => Err(other.wrong("array")),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8], HandlerError> {
        match self {
            AssetData::Bytes(b) => Ok(b),
            other => Err(other.wrong("bytes")),
        }
    }
}

/// Tabla de texto indexada por la primera columna (p. ej. banda o detector).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: IndexMap<String, Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Result<Self, HandlerError> {
        if columns.is_empty() {
            return Err(HandlerError::Invalid("table needs at least one column".into()));
        }
        Ok(Self { columns, rows: IndexMap::new() })
    }

    /// Inserta una fila completa (la primera celda es la clave).
    pub fn insert_row(&mut self, cells: Vec<String>) -> Result<(), HandlerError> {
        if cells.len() != self.columns.len() {
            return Err(HandlerError::Invalid(format!("row has {} cells, expected {}", cells.len(), self.columns.len())));
        }
        let key = cells[0].clone();
        if self.rows.contains_key(&key) {
            return Err(HandlerError::Invalid(format!("duplicate row key '{key}'")));
        }
        self.rows.insert(key, cells);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &str, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(key).map(|row| row[idx].as_str())
    }

    pub fn get_f64(&self, key: &str, column: &str) -> Option<f64> {
        self.get(key, column).and_then(|v| v.parse().ok())
    }
}

/// Arreglo numérico denso en orden row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayData {
    shape: Vec<usize>,
    values: Vec<f64>,
}

impl ArrayData {
    pub fn new(shape: Vec<usize>, values: Vec<f64>) -> Result<Self, HandlerError> {
        if shape.iter().product::<usize>() != values.len() {
            return Err(HandlerError::Shape { shape, len: values.len() });
        }
        Ok(Self { shape, values })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_parts(self) -> (Vec<usize>, Vec<f64>) {
        (self.shape, self.values)
    }
}

/// Conversión tipo fuerte ↔ `AssetData`.
pub trait AssetPayload: Sized {
    fn into_data(self) -> Result<AssetData, HandlerError>;
    fn from_data(data: AssetData) -> Result<Self, HandlerError>;
}

macro_rules! neutral_payload {
    ($ty:ty, $variant:ident, $expected:literal) => {
        impl AssetPayload for $ty {
            fn into_data(self) -> Result<AssetData, HandlerError> {
                Ok(AssetData::$variant(self))
            }

            fn from_data(data: AssetData) -> Result<Self, HandlerError> {
                match data {
                    AssetData::$variant(v) => Ok(v),
                    other => Err(other.wrong($expected)),
                }
            }
        }
    };
}

neutral_payload!(Value, Json, "json");
neutral_payload!(String, Text, "text");
neutral_payload!(Table, Table, "table");
neutral_payload!(ArrayData, Array, "array");
neutral_payload!(Vec<u8>, Bytes, "bytes");

impl AssetPayload for AssetData {
    fn into_data(self) -> Result<AssetData, HandlerError> {
        Ok(self)
    }

    fn from_data(data: AssetData) -> Result<Self, HandlerError> {
        Ok(data)
    }
}
