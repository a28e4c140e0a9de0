//! The record codec: a fixed-layout byte buffer addressed by attribute
//! index through a [`Schema`].

use common::DbResult;

use crate::schema::Schema;
use crate::value::Value;

/// A decoded table row: the concatenation, in attribute order, of each
/// attribute's fixed-width encoding. Carries no address of its own — the
/// table manager pairs it with a [`common::Rid`] on insert/get.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub data: Vec<u8>,
}

impl Record {
    /// A zeroed record buffer sized for `schema`.
    pub fn new(schema: &Schema) -> Self {
        Self {
            data: vec![0u8; schema.record_size()],
        }
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Decode attribute `idx` by summing the widths of earlier attributes
    /// to find its offset.
    pub fn get_attr(&self, schema: &Schema, idx: usize) -> DbResult<Value> {
        let attr = schema.attr(idx)?;
        let offset = schema.attr_offset(idx)?;
        let size = attr.ty.size();
        Ok(Value::decode(attr.ty, &self.data[offset..offset + size]))
    }

    /// Encode `value` into attribute `idx`'s slot, by the same offset
    /// [`Record::get_attr`] uses.
    pub fn set_attr(&mut self, schema: &Schema, idx: usize, value: &Value) -> DbResult<()> {
        let attr = schema.attr(idx)?;
        let offset = schema.attr_offset(idx)?;
        let size = attr.ty.size();
        value.encode(attr.ty, &mut self.data[offset..offset + size])
    }
}
