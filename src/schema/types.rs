#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    Serial,
    BigSerial,
    Integer,
    BigInt,
    SmallInt,
    Text,
    VarChar(usize),
    Boolean,
    Timestamp,
    TimestampTz,
    Date,
    Time,
    Uuid,
    Json,
    JsonB,
    Binary,
    Real,
    DoublePrecision,
    Decimal { precision: u8, scale: u8 },
    /// Dialect-specific type rendered verbatim.
    Custom(String),
    /// Type not known. Columns reconstructed for reversal of a drop carry this.
    Null,
}

impl ColumnType {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnType::Null)
    }
}
