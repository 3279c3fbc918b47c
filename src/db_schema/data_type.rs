//! Logical column datatypes and their SQL literal encodings.
//!
//! Drivers report a type code, a type name and a size for every column; a
//! vendor maps that triple to a [`DataType`] (see
//! [`crate::vendor::Vendor::data_type`]). The datatype then knows how to turn
//! a lexical value into a literal the engine accepts, or `NULL` when the value
//! cannot be represented.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::vendor::Vendor;

lazy_static! {
    static ref EXACT_NUMERIC: Regex = Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").unwrap();
    static ref APPROXIMATE_NUMERIC: Regex =
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").unwrap();
    static ref BIT_STRING: Regex = Regex::new(r"^[01]*$").unwrap();
}

/// Driver-level type codes, numbered like `java.sql.Types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SqlTypeCode {
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Real,
    Double,
    Numeric,
    Decimal,
    Char,
    Varchar,
    LongVarchar,
    Date,
    Time,
    Timestamp,
    Binary,
    Varbinary,
    LongVarbinary,
    Null,
    Other,
    JavaObject,
    Distinct,
    Struct,
    Array,
    Blob,
    Clob,
    Ref,
    Datalink,
    Boolean,
    RowId,
    NChar,
    NVarchar,
    LongNVarchar,
    NClob,
    SqlXml,
}

const TYPE_CODES: &[(SqlTypeCode, i32, &str)] = &[
    (SqlTypeCode::Bit, -7, "BIT"),
    (SqlTypeCode::TinyInt, -6, "TINYINT"),
    (SqlTypeCode::SmallInt, 5, "SMALLINT"),
    (SqlTypeCode::Integer, 4, "INTEGER"),
    (SqlTypeCode::BigInt, -5, "BIGINT"),
    (SqlTypeCode::Float, 6, "FLOAT"),
    (SqlTypeCode::Real, 7, "REAL"),
    (SqlTypeCode::Double, 8, "DOUBLE"),
    (SqlTypeCode::Numeric, 2, "NUMERIC"),
    (SqlTypeCode::Decimal, 3, "DECIMAL"),
    (SqlTypeCode::Char, 1, "CHAR"),
    (SqlTypeCode::Varchar, 12, "VARCHAR"),
    (SqlTypeCode::LongVarchar, -1, "LONGVARCHAR"),
    (SqlTypeCode::Date, 91, "DATE"),
    (SqlTypeCode::Time, 92, "TIME"),
    (SqlTypeCode::Timestamp, 93, "TIMESTAMP"),
    (SqlTypeCode::Binary, -2, "BINARY"),
    (SqlTypeCode::Varbinary, -3, "VARBINARY"),
    (SqlTypeCode::LongVarbinary, -4, "LONGVARBINARY"),
    (SqlTypeCode::Null, 0, "NULL"),
    (SqlTypeCode::Other, 1111, "OTHER"),
    (SqlTypeCode::JavaObject, 2000, "JAVA_OBJECT"),
    (SqlTypeCode::Distinct, 2001, "DISTINCT"),
    (SqlTypeCode::Struct, 2002, "STRUCT"),
    (SqlTypeCode::Array, 2003, "ARRAY"),
    (SqlTypeCode::Blob, 2004, "BLOB"),
    (SqlTypeCode::Clob, 2005, "CLOB"),
    (SqlTypeCode::Ref, 2006, "REF"),
    (SqlTypeCode::Datalink, 70, "DATALINK"),
    (SqlTypeCode::Boolean, 16, "BOOLEAN"),
    (SqlTypeCode::RowId, -8, "ROWID"),
    (SqlTypeCode::NChar, -15, "NCHAR"),
    (SqlTypeCode::NVarchar, -9, "NVARCHAR"),
    (SqlTypeCode::LongNVarchar, -16, "LONGNVARCHAR"),
    (SqlTypeCode::NClob, 2011, "NCLOB"),
    (SqlTypeCode::SqlXml, 2009, "SQLXML"),
];

impl SqlTypeCode {
    pub fn from_code(code: i32) -> Option<Self> {
        TYPE_CODES
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(t, _, _)| *t)
    }

    /// Accepts the canonical names plus a few common spellings (`INT`,
    /// `BOOL`, `TEXT`, `VARCHAR2`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_uppercase();
        if let Some((t, _, _)) = TYPE_CODES.iter().find(|(_, _, n)| *n == upper) {
            return Some(*t);
        }
        let alias = match upper.as_str() {
            "INT" | "INT4" => SqlTypeCode::Integer,
            "INT2" => SqlTypeCode::SmallInt,
            "INT8" => SqlTypeCode::BigInt,
            "BOOL" => SqlTypeCode::Boolean,
            "TEXT" => SqlTypeCode::LongVarchar,
            "VARCHAR2" | "CHARACTER VARYING" => SqlTypeCode::Varchar,
            "NVARCHAR2" => SqlTypeCode::NVarchar,
            "CHARACTER" => SqlTypeCode::Char,
            "DOUBLE PRECISION" | "FLOAT8" => SqlTypeCode::Double,
            "FLOAT4" => SqlTypeCode::Real,
            "DATETIME" => SqlTypeCode::Timestamp,
            "BYTEA" => SqlTypeCode::Varbinary,
            _ => return None,
        };
        Some(alias)
    }

    pub fn code(&self) -> i32 {
        TYPE_CODES
            .iter()
            .find(|(t, _, _)| t == self)
            .map(|(_, c, _)| *c)
            .unwrap_or(1111)
    }
}

impl fmt::Display for SqlTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = TYPE_CODES
            .iter()
            .find(|(t, _, _)| t == self)
            .map(|(_, _, n)| *n)
            .unwrap_or("OTHER");
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GenericType {
    Character,
    Binary,
    ExactNumeric,
    ApproximateNumeric,
    Boolean,
    Date,
    Time,
    Timestamp,
    Interval,
    Bit,
    Unsupported,
}

/// Engine quirks that change literal encoding or value handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Flavor {
    Standard,
    /// Exact numeric that cannot hold negative values.
    Unsigned,
    /// Single-bit column that behaves like the integers 0 and 1.
    SingleBitNumeric,
    /// Oracle `TIMESTAMP WITH LOCAL TIME ZONE`.
    LocalTimeZone,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataType {
    pub name: String,
    pub generic: GenericType,
    pub flavor: Flavor,
    pub supports_distinct: bool,
}

impl DataType {
    pub fn new(generic: GenericType, name: impl Into<String>) -> Self {
        DataType {
            name: name.into(),
            generic,
            flavor: Flavor::Standard,
            supports_distinct: true,
        }
    }

    pub fn character(name: impl Into<String>) -> Self {
        Self::new(GenericType::Character, name)
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self::new(GenericType::Binary, name)
    }

    pub fn exact_numeric(name: impl Into<String>) -> Self {
        Self::new(GenericType::ExactNumeric, name)
    }

    pub fn approximate_numeric(name: impl Into<String>) -> Self {
        Self::new(GenericType::ApproximateNumeric, name)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(GenericType::Boolean, name)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(GenericType::Date, name)
    }

    pub fn time(name: impl Into<String>) -> Self {
        Self::new(GenericType::Time, name)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(GenericType::Timestamp, name)
    }

    pub fn interval(name: impl Into<String>) -> Self {
        Self::new(GenericType::Interval, name)
    }

    pub fn bit(name: impl Into<String>) -> Self {
        Self::new(GenericType::Bit, name)
    }

    pub fn unsupported(name: impl Into<String>) -> Self {
        let mut data_type = Self::new(GenericType::Unsupported, name);
        data_type.supports_distinct = false;
        data_type
    }

    pub fn with_flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = flavor;
        self
    }

    pub fn without_distinct(mut self) -> Self {
        self.supports_distinct = false;
        self
    }

    pub fn supports_distinct(&self) -> bool {
        self.supports_distinct
    }

    pub fn is_unsupported(&self) -> bool {
        self.generic == GenericType::Unsupported
    }

    /// Encodes a lexical value as a literal for `vendor`, or `NULL` when the
    /// value is not valid for this type.
    pub fn to_sql_literal(&self, value: &str, vendor: &dyn Vendor) -> String {
        let encoded = match self.generic {
            GenericType::Character | GenericType::Interval => {
                Some(vendor.quote_string_literal(value))
            }
            GenericType::Binary => hex::decode(value.trim())
                .ok()
                .map(|bytes| vendor.quote_binary_literal(&hex::encode_upper(bytes))),
            GenericType::ExactNumeric => self.exact_numeric_literal(value),
            GenericType::ApproximateNumeric => approximate_numeric_literal(value, vendor),
            GenericType::Boolean => parse_boolean(value).map(|b| vendor.boolean_literal(b)),
            GenericType::Bit => self.bit_literal(value),
            GenericType::Date => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                .ok()
                .map(|d| vendor.quote_date_literal(&d.format("%Y-%m-%d").to_string())),
            GenericType::Time => NaiveTime::parse_from_str(value.trim(), "%H:%M:%S%.f")
                .ok()
                .map(|t| vendor.quote_time_literal(&t.format("%H:%M:%S%.f").to_string())),
            GenericType::Timestamp => parse_timestamp(value).map(|ts| {
                let literal =
                    vendor.quote_timestamp_literal(&ts.format("%Y-%m-%d %H:%M:%S%.f").to_string());
                if self.flavor == Flavor::LocalTimeZone {
                    format!("CAST({} AS TIMESTAMP WITH LOCAL TIME ZONE)", literal)
                } else {
                    literal
                }
            }),
            GenericType::Unsupported => None,
        };
        encoded.unwrap_or_else(|| "NULL".to_string())
    }

    fn exact_numeric_literal(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if !EXACT_NUMERIC.is_match(trimmed) {
            return None;
        }
        if self.flavor == Flavor::Unsigned && trimmed.starts_with('-') {
            return None;
        }
        Some(trimmed.trim_start_matches('+').to_string())
    }

    fn bit_literal(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if self.flavor == Flavor::SingleBitNumeric {
            return parse_boolean(trimmed).map(|b| if b { "1" } else { "0" }.to_string());
        }
        if BIT_STRING.is_match(trimmed) && !trimmed.is_empty() {
            Some(format!("B'{}'", trimmed))
        } else {
            None
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn parse_boolean(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn approximate_numeric_literal(value: &str, vendor: &dyn Vendor) -> Option<String> {
    let trimmed = value.trim();
    if APPROXIMATE_NUMERIC.is_match(trimmed) {
        return Some(trimmed.trim_start_matches('+').to_string());
    }
    let special = match trimmed {
        "NaN" => f64::NAN,
        "INF" | "+INF" | "Infinity" | "+Infinity" => f64::INFINITY,
        "-INF" | "-Infinity" => f64::NEG_INFINITY,
        _ => return None,
    };
    vendor.approximate_numeric_special(special)
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// Mapping shared by every vendor for the standard type codes. Vendors
/// correct the result for their own quirks before falling back to this.
pub fn standard_data_type(code: SqlTypeCode, name: &str) -> Option<DataType> {
    let data_type = match code {
        SqlTypeCode::Char
        | SqlTypeCode::Varchar
        | SqlTypeCode::LongVarchar
        | SqlTypeCode::NChar
        | SqlTypeCode::NVarchar
        | SqlTypeCode::LongNVarchar => DataType::character(name),
        SqlTypeCode::Clob | SqlTypeCode::NClob => DataType::character(name),
        SqlTypeCode::Boolean => DataType::boolean(name),
        SqlTypeCode::Binary | SqlTypeCode::Varbinary | SqlTypeCode::LongVarbinary => {
            DataType::binary(name)
        }
        SqlTypeCode::Blob => DataType::binary(name),
        SqlTypeCode::Bit => DataType::bit(name),
        SqlTypeCode::Numeric
        | SqlTypeCode::Decimal
        | SqlTypeCode::TinyInt
        | SqlTypeCode::SmallInt
        | SqlTypeCode::Integer
        | SqlTypeCode::BigInt => DataType::exact_numeric(name),
        SqlTypeCode::Real | SqlTypeCode::Float | SqlTypeCode::Double => {
            DataType::approximate_numeric(name)
        }
        SqlTypeCode::Date => DataType::date(name),
        SqlTypeCode::Time => DataType::time(name),
        SqlTypeCode::Timestamp => DataType::timestamp(name),
        SqlTypeCode::Array | SqlTypeCode::JavaObject => DataType::unsupported(name),
        _ => return None,
    };
    Some(data_type)
}
