//! Text rendering of `PostgreSQL` `NUMERIC` values.
//!
//! `tokio-postgres` receives results in the binary wire format, where a numeric is
//! `ndigits:i16, weight:i16, sign:u16, dscale:u16` followed by `ndigits` base-10000
//! digits. Fines are `NUMERIC(10,2)`, so they are decoded to an exact decimal string
//! instead of a float.

use std::error::Error;
use tokio_postgres::types::{FromSql, Type};

const SIGN_POSITIVE: u16 = 0x0000;
const SIGN_NEGATIVE: u16 = 0x4000;
const SIGN_NAN: u16 = 0xC000;
const SIGN_POS_INFINITY: u16 = 0xD000;
const SIGN_NEG_INFINITY: u16 = 0xF000;

/// A `NUMERIC` value in its exact decimal text form (e.g. `"10.00"`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgNumeric(pub String);

impl<'a> FromSql<'a> for PgNumeric {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        decode_numeric(raw).map(PgNumeric)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

/// Decode the binary `NUMERIC` representation into decimal text
pub fn decode_numeric(raw: &[u8]) -> Result<String, Box<dyn Error + Sync + Send>> {
    if raw.len() < 8 {
        return Err("numeric value is shorter than its header".into());
    }

    let read = |at: usize| u16::from_be_bytes([raw[at], raw[at + 1]]);

    let ndigits = usize::from(read(0));
    let weight = i32::from(read(2) as i16);
    let sign = read(4);
    let dscale = usize::from(read(6));

    if raw.len() != 8 + ndigits * 2 {
        return Err(
            format!("numeric value declares {ndigits} digits but has {} bytes", raw.len()).into()
        );
    }

    match sign {
        SIGN_NAN => return Ok("NaN".to_string()),
        SIGN_POS_INFINITY => return Ok("Infinity".to_string()),
        SIGN_NEG_INFINITY => return Ok("-Infinity".to_string()),
        SIGN_POSITIVE | SIGN_NEGATIVE => {}
        other => return Err(format!("unknown numeric sign 0x{other:04X}").into()),
    }

    let digits: Vec<u16> = (0..ndigits).map(|i| read(8 + 2 * i)).collect();
    let digit_at =
        |i: i32| usize::try_from(i).ok().and_then(|i| digits.get(i).copied()).unwrap_or(0);

    let mut out = String::new();
    if sign == SIGN_NEGATIVE {
        out.push('-');
    }

    if weight < 0 {
        out.push('0');
    } else {
        for i in 0..=weight {
            if i == 0 {
                out.push_str(&digit_at(i).to_string());
            } else {
                out.push_str(&format!("{:04}", digit_at(i)));
            }
        }
    }

    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut i = weight + 1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", digit_at(i)));
            i += 1;
        }
        fraction.truncate(dscale);
        out.push('.');
        out.push_str(&fraction);
    }

    Ok(out)
}
