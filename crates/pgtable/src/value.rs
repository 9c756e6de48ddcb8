//! Text-typed parameter binding and result decoding.
//!
//! Every value the shell or a CSV file supplies is text. [`TextValue`] binds such a
//! string to whatever type the server inferred for the placeholder, parsing it into
//! the matching Rust type at bind time. [`CellText`] goes the other way and renders
//! any result column as text for display and CSV output.
//!
//! Types outside the directly supported set go through the server's own text
//! conversion: the gateway casts such placeholders as `NULLIF($n::text, '')::<type>` and
//! selects such columns as `::text` (see [`TextValue::binds_directly`] and
//! [`CellText::decodes_directly`]).

use crate::ident::quote_ident;
use bit_vec::BitVec;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use cidr::{IpCidr, IpInet};
use eui48::MacAddress;
use geo_types::{Point, Rect};
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};
use uuid::Uuid;

type BoxError = Box<dyn Error + Sync + Send>;

/// A bound parameter supplied as text.
///
/// - textual targets (`text`, `varchar`, `char(n)`, `name`) receive the string verbatim
/// - other scalar targets parse the trimmed string; an empty string binds `NULL`
/// - enum labels are sent as text
/// - any other type is rejected; see [`TextValue::binds_directly`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextValue(String);

impl TextValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether a value can be encoded for `ty` on the client.
    ///
    /// Placeholders of any other type must be cast from text in the SQL.
    pub fn binds_directly(ty: &Type) -> bool {
        is_textual(ty)
            || is_enum(ty)
            || matches!(
                *ty,
                Type::BOOL
                    | Type::INT2
                    | Type::INT4
                    | Type::INT8
                    | Type::OID
                    | Type::FLOAT4
                    | Type::FLOAT8
                    | Type::NUMERIC
                    | Type::UUID
                    | Type::DATE
                    | Type::TIME
                    | Type::TIMESTAMP
                    | Type::TIMESTAMPTZ
                    | Type::JSON
                    | Type::JSONB
            )
    }
}

impl From<&str> for TextValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TextValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

fn is_textual(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    )
}

fn is_enum(ty: &Type) -> bool {
    matches!(ty.kind(), Kind::Enum(_))
}

/// Schema-qualified, quoted type name for use in a cast.
pub(crate) fn type_sql(ty: &Type) -> String {
    format!("{}.{}", quote_ident(ty.schema()), quote_ident(ty.name()))
}

fn parse<T>(s: &str, ty: &Type) -> Result<T, BoxError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    s.parse::<T>()
        .map_err(|e| format!("invalid {} value '{s}': {e}", ty.name()).into())
}

fn parse_bool(s: &str) -> Result<bool, BoxError> {
    match s.to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" | "1" => Ok(true),
        "f" | "false" | "n" | "no" | "off" | "0" => Ok(false),
        _ => Err(format!("invalid bool value '{s}'").into()),
    }
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, BoxError> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];
    for format in FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(ts);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ts) = date.and_hms_opt(0, 0, 0) {
            return Ok(ts);
        }
    }
    Err(format!("invalid timestamp value '{s}'").into())
}

fn parse_timestamptz(s: &str) -> Result<DateTime<Utc>, BoxError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Ok(ts.with_timezone(&Utc));
    }
    // No offset given: read as UTC.
    parse_timestamp(s)
        .map(|naive| naive.and_utc())
        .map_err(|_| format!("invalid timestamptz value '{s}'").into())
}

impl ToSql for TextValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        let raw = self.0.as_str();
        if is_textual(ty) || is_enum(ty) {
            return <&str as ToSql>::to_sql(&raw, ty, out);
        }

        let s = raw.trim();
        if s.is_empty() {
            return Ok(IsNull::Yes);
        }

        match *ty {
            Type::BOOL => parse_bool(s)?.to_sql(ty, out),
            Type::INT2 => parse::<i16>(s, ty)?.to_sql(ty, out),
            Type::INT4 => parse::<i32>(s, ty)?.to_sql(ty, out),
            Type::INT8 => parse::<i64>(s, ty)?.to_sql(ty, out),
            Type::OID => parse::<u32>(s, ty)?.to_sql(ty, out),
            Type::FLOAT4 => parse::<f32>(s, ty)?.to_sql(ty, out),
            Type::FLOAT8 => parse::<f64>(s, ty)?.to_sql(ty, out),
            Type::NUMERIC => parse::<Decimal>(s, ty)?.to_sql(ty, out),
            Type::UUID => parse::<Uuid>(s, ty)?.to_sql(ty, out),
            Type::DATE => parse::<NaiveDate>(s, ty)?.to_sql(ty, out),
            Type::TIME => parse::<NaiveTime>(s, ty)?.to_sql(ty, out),
            Type::TIMESTAMP => parse_timestamp(s)?.to_sql(ty, out),
            Type::TIMESTAMPTZ => parse_timestamptz(s)?.to_sql(ty, out),
            Type::JSON | Type::JSONB => parse::<serde_json::Value>(s, ty)?.to_sql(ty, out),
            _ => Err(format!(
                "parameter type {} cannot be bound from text without a cast",
                ty.name()
            )
            .into()),
        }
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// A result cell rendered as text, whatever its column type.
///
/// Decode as `Option<CellText>` so SQL `NULL` becomes `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellText(pub String);

impl CellText {
    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether a column of type `ty` can be rendered on the client.
    ///
    /// Columns of any other type must be selected as `::text`.
    pub fn decodes_directly(ty: &Type) -> bool {
        is_textual(ty)
            || is_enum(ty)
            || matches!(
                *ty,
                Type::BOOL
                    | Type::INT2
                    | Type::INT4
                    | Type::INT8
                    | Type::OID
                    | Type::FLOAT4
                    | Type::FLOAT8
                    | Type::NUMERIC
                    | Type::UUID
                    | Type::DATE
                    | Type::TIME
                    | Type::TIMESTAMP
                    | Type::TIMESTAMPTZ
                    | Type::JSON
                    | Type::JSONB
                    | Type::BYTEA
                    | Type::INET
                    | Type::CIDR
                    | Type::MACADDR
                    | Type::POINT
                    | Type::BOX
                    | Type::BIT
                    | Type::VARBIT
            )
    }
}

// Host addresses print without a prefix length, as the server does.
fn inet_text(inet: IpInet) -> String {
    let host_len = match inet.address() {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    if inet.network_length() == host_len {
        inet.address().to_string()
    } else {
        format!("{}/{}", inet.address(), inet.network_length())
    }
}

fn mac_text(mac: MacAddress) -> String {
    mac.as_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

fn bytea_hex(raw: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(2 + raw.len() * 2);
    out.push_str("\\x");
    for b in raw {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

impl<'a> FromSql<'a> for CellText {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        if is_textual(ty) || is_enum(ty) {
            return Ok(Self(std::str::from_utf8(raw)?.to_string()));
        }

        let text = match *ty {
            Type::BOOL => bool::from_sql(ty, raw)?.to_string(),
            Type::INT2 => i16::from_sql(ty, raw)?.to_string(),
            Type::INT4 => i32::from_sql(ty, raw)?.to_string(),
            Type::INT8 => i64::from_sql(ty, raw)?.to_string(),
            Type::OID => u32::from_sql(ty, raw)?.to_string(),
            Type::FLOAT4 => f32::from_sql(ty, raw)?.to_string(),
            Type::FLOAT8 => f64::from_sql(ty, raw)?.to_string(),
            Type::NUMERIC => Decimal::from_sql(ty, raw)?.to_string(),
            Type::UUID => Uuid::from_sql(ty, raw)?.to_string(),
            Type::DATE => NaiveDate::from_sql(ty, raw)?.to_string(),
            Type::TIME => NaiveTime::from_sql(ty, raw)?.to_string(),
            Type::TIMESTAMP => NaiveDateTime::from_sql(ty, raw)?.to_string(),
            Type::TIMESTAMPTZ => DateTime::<Utc>::from_sql(ty, raw)?.to_rfc3339(),
            Type::JSON | Type::JSONB => serde_json::Value::from_sql(ty, raw)?.to_string(),
            Type::BYTEA => bytea_hex(raw),
            Type::INET => inet_text(IpInet::from_sql(ty, raw)?),
            Type::CIDR => {
                let cidr = IpCidr::from_sql(ty, raw)?;
                format!("{}/{}", cidr.first_address(), cidr.network_length())
            }
            Type::MACADDR => mac_text(MacAddress::from_sql(ty, raw)?),
            Type::POINT => {
                let p = Point::<f64>::from_sql(ty, raw)?;
                format!("({},{})", p.x(), p.y())
            }
            Type::BOX => {
                let r = Rect::<f64>::from_sql(ty, raw)?;
                format!("({},{}),({},{})", r.max().x, r.max().y, r.min().x, r.min().y)
            }
            Type::BIT | Type::VARBIT => BitVec::from_sql(ty, raw)?
                .iter()
                .map(|bit| if bit { '1' } else { '0' })
                .collect(),
            _ => {
                return Err(format!("column type {} cannot be rendered as text here", ty.name()).into());
            }
        };
        Ok(Self(text))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &str, ty: &Type) -> Result<(IsNull, BytesMut), BoxError> {
        let mut out = BytesMut::new();
        let is_null = TextValue::new(value).to_sql(ty, &mut out)?;
        Ok((is_null, out))
    }

    #[test]
    fn text_is_bound_verbatim() {
        let (is_null, out) = encode("  John Doe ", &Type::TEXT).unwrap();
        assert!(matches!(is_null, IsNull::No));
        assert_eq!(&out[..], b"  John Doe ");
    }

    #[test]
    fn empty_text_stays_empty_string() {
        let (is_null, out) = encode("", &Type::VARCHAR).unwrap();
        assert!(matches!(is_null, IsNull::No));
        assert!(out.is_empty());
    }

    #[test]
    fn integer_is_parsed_for_int4() {
        let (_, out) = encode(" 42 ", &Type::INT4).unwrap();
        assert_eq!(&out[..], &42i32.to_be_bytes());
    }

    #[test]
    fn empty_string_binds_null_for_non_text() {
        let (is_null, _) = encode("", &Type::INT8).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
    }

    #[test]
    fn bad_integer_is_an_error() {
        let Err(err) = encode("forty-two", &Type::INT4) else {
            panic!("expected a parse error");
        };
        assert!(err.to_string().contains("int4"));
    }

    #[test]
    fn types_without_client_encoding_need_a_cast() {
        assert!(TextValue::binds_directly(&Type::INT4));
        assert!(TextValue::binds_directly(&Type::VARCHAR));
        for ty in [Type::INET, Type::INTERVAL, Type::TEXT_ARRAY, Type::MONEY, Type::TIMETZ] {
            assert!(!TextValue::binds_directly(&ty), "{ty}");
        }
    }

    #[test]
    fn encoding_unsupported_type_fails_instead_of_writing_text_bytes() {
        let Err(err) = encode("10.0.0.2", &Type::INET) else {
            panic!("inet must not be encoded as raw text");
        };
        assert!(err.to_string().contains("inet"));
        let Err(_) = encode("{x,y}", &Type::TEXT_ARRAY) else {
            panic!("arrays must not be encoded as raw text");
        };
    }

    #[test]
    fn cast_type_names_are_qualified_and_quoted() {
        assert_eq!(type_sql(&Type::INET), r#""pg_catalog"."inet""#);
        assert_eq!(type_sql(&Type::TEXT_ARRAY), r#""pg_catalog"."_text""#);
    }

    #[test]
    fn bool_accepts_postgres_spellings() {
        let (_, out) = encode("yes", &Type::BOOL).unwrap();
        assert_eq!(&out[..], &[1]);
        let (_, out) = encode("F", &Type::BOOL).unwrap();
        assert_eq!(&out[..], &[0]);
        assert!(encode("maybe", &Type::BOOL).is_err());
    }

    #[test]
    fn timestamps_accept_space_or_t_separator() {
        assert!(parse_timestamp("2024-03-01 10:15:00").is_ok());
        assert!(parse_timestamp("2024-03-01T10:15:00.5").is_ok());
        assert!(parse_timestamp("2024-03-01").is_ok());
        assert!(parse_timestamp("March 1st").is_err());
    }

    #[test]
    fn timestamptz_without_offset_is_utc() {
        let ts = parse_timestamptz("2024-03-01 10:15:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T10:15:00+00:00");
        let ts = parse_timestamptz("2024-03-01T12:15:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T10:15:00+00:00");
    }

    #[test]
    fn cell_text_decodes_scalars() {
        let cell = CellText::from_sql(&Type::INT4, &7i32.to_be_bytes()).unwrap();
        assert_eq!(cell.0, "7");
        let cell = CellText::from_sql(&Type::BOOL, &[1]).unwrap();
        assert_eq!(cell.0, "true");
        let cell = CellText::from_sql(&Type::TEXT, b"hello").unwrap();
        assert_eq!(cell.0, "hello");
    }

    #[test]
    fn cell_text_decodes_network_and_geometric_types() {
        // family, prefix length, is_cidr, address length, address
        let host = [2, 32, 0, 4, 10, 0, 0, 2];
        assert_eq!(CellText::from_sql(&Type::INET, &host).unwrap().0, "10.0.0.2");
        let net = [2, 24, 1, 4, 192, 168, 1, 0];
        assert_eq!(CellText::from_sql(&Type::CIDR, &net).unwrap().0, "192.168.1.0/24");

        let mac = [0x08, 0x00, 0x2b, 0x01, 0x02, 0x03];
        assert_eq!(CellText::from_sql(&Type::MACADDR, &mac).unwrap().0, "08:00:2b:01:02:03");

        let mut point = Vec::new();
        point.extend_from_slice(&1.5f64.to_be_bytes());
        point.extend_from_slice(&(-2.0f64).to_be_bytes());
        assert_eq!(CellText::from_sql(&Type::POINT, &point).unwrap().0, "(1.5,-2)");
    }

    #[test]
    fn cell_text_decodes_bit_strings() {
        // bit length, then packed bits
        let raw = [0, 0, 0, 4, 0b1010_0000];
        assert_eq!(CellText::from_sql(&Type::VARBIT, &raw).unwrap().0, "1010");
    }

    #[test]
    fn cell_text_rejects_binary_it_cannot_render() {
        assert!(!CellText::decodes_directly(&Type::INTERVAL));
        assert!(!CellText::decodes_directly(&Type::TEXT_ARRAY));
        let interval = [0u8; 16];
        assert!(CellText::from_sql(&Type::INTERVAL, &interval).is_err());
    }

    #[test]
    fn cell_text_renders_bytea_as_hex() {
        let cell = CellText::from_sql(&Type::BYTEA, &[0xde, 0xad]).unwrap();
        assert_eq!(cell.0, "\\xdead");
    }
}
