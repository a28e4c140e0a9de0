//! Fixed-layout record schema: attribute list, key indices, and the ASCII
//! serialization `createTable`/`openTable` exchange through the table
//! header page.

use std::fmt;

use common::{DbError, DbResult};

use crate::value::DataType;

/// A single named, typed column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub ty: DataType,
}

impl Attribute {
    pub fn new(name: impl Into<String>, ty: DataType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// The attribute list and key set for a table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    pub attrs: Vec<Attribute>,
    pub keys: Vec<usize>,
}

impl Schema {
    /// Build a schema, resolving `key_names` against `attrs`.
    pub fn new(attrs: Vec<Attribute>, key_names: &[&str]) -> DbResult<Self> {
        if attrs.is_empty() {
            return Err(DbError::InvalidSchema(
                "schema must have at least one attribute".into(),
            ));
        }
        let mut keys = Vec::with_capacity(key_names.len());
        for key_name in key_names {
            let idx = attrs
                .iter()
                .position(|a| a.name == *key_name)
                .ok_or_else(|| {
                    DbError::InvalidSchema(format!("unknown key attribute '{key_name}'"))
                })?;
            keys.push(idx);
        }
        Ok(Self { attrs, keys })
    }

    /// Total encoded byte length of one record under this schema.
    pub fn record_size(&self) -> usize {
        self.attrs.iter().map(|a| a.ty.size()).sum()
    }

    /// Byte offset of attribute `idx` within the record body.
    pub fn attr_offset(&self, idx: usize) -> DbResult<usize> {
        if idx >= self.attrs.len() {
            return Err(DbError::InvalidArg(format!("no attribute at index {idx}")));
        }
        Ok(self.attrs[..idx].iter().map(|a| a.ty.size()).sum())
    }

    pub fn attr(&self, idx: usize) -> DbResult<&Attribute> {
        self.attrs
            .get(idx)
            .ok_or_else(|| DbError::InvalidArg(format!("no attribute at index {idx}")))
    }

    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }

    /// Parse the ASCII grammar written by [`Schema::fmt`] /
    /// [`std::fmt::Display`] back into a schema.
    pub fn parse(s: &str) -> DbResult<Schema> {
        let body = s
            .strip_prefix("Schema with ")
            .ok_or_else(|| DbError::InvalidSchema("missing 'Schema with ' prefix".into()))?;
        let (count_str, rest) = body
            .split_once(" attributes (")
            .ok_or_else(|| DbError::InvalidSchema("missing attribute count".into()))?;
        let attr_count: usize = count_str
            .trim()
            .parse()
            .map_err(|_| DbError::InvalidSchema(format!("bad attribute count '{count_str}'")))?;

        let (attrs_str, rest) = rest
            .split_once(") with keys (")
            .ok_or_else(|| DbError::InvalidSchema("missing ') with keys (' separator".into()))?;
        let keys_str = rest
            .strip_suffix(')')
            .ok_or_else(|| DbError::InvalidSchema("schema string must end with ')'".into()))?;

        let mut attrs = Vec::with_capacity(attr_count);
        if !attrs_str.is_empty() {
            for part in attrs_str.split(", ") {
                let (name, ty_str) = part
                    .split_once(": ")
                    .ok_or_else(|| DbError::InvalidSchema(format!("bad attribute '{part}'")))?;
                attrs.push(Attribute::new(name, parse_type(ty_str)?));
            }
        }
        if attrs.len() != attr_count {
            return Err(DbError::InvalidSchema(format!(
                "declared {attr_count} attributes but found {}",
                attrs.len()
            )));
        }

        let key_names: Vec<&str> = if keys_str.is_empty() {
            Vec::new()
        } else {
            keys_str.split(", ").collect()
        };
        Schema::new(attrs, &key_names)
    }
}

fn parse_type(s: &str) -> DbResult<DataType> {
    match s {
        "INT" => Ok(DataType::Int),
        "FLOAT" => Ok(DataType::Float),
        "BOOL" => Ok(DataType::Bool),
        _ => {
            let n = s
                .strip_prefix("STRING[")
                .and_then(|rest| rest.strip_suffix(']'))
                .and_then(|n| n.parse::<u32>().ok())
                .ok_or_else(|| DbError::UnknownDatatype(s.to_string()))?;
            Ok(DataType::String(n))
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schema with {} attributes (", self.attrs.len())?;
        for (i, attr) in self.attrs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", attr.name, attr.ty.type_name())?;
        }
        write!(f, ") with keys (")?;
        for (i, &key_idx) in self.keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", self.attrs[key_idx].name)?;
        }
        write!(f, ")")
    }
}
