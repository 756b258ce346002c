use rust_decimal::Decimal;
use scylla::value::CqlDecimal;

// ============================================================================
// Decimal <-> CQL decimal
// ============================================================================
//
// CQL stores a decimal as a big-endian two's complement varint plus a scale.
// rust_decimal holds a 96-bit mantissa with a scale of 0..=28, so anything
// written here reads back exactly; values written by other clients may not fit.
//
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DecimalCodecError {
    #[error("CQL decimal mantissa is {0} bytes, more than fits in 128 bits")]
    MantissaTooWide(usize),

    #[error("CQL decimal has a negative scale ({0})")]
    NegativeScale(i32),

    #[error("CQL decimal does not fit a 96-bit mantissa with scale {scale}: {source}")]
    OutOfRange {
        scale: i32,
        #[source]
        source: rust_decimal::Error,
    },
}

pub fn to_cql(value: Decimal) -> CqlDecimal {
    let bytes = value.mantissa().to_be_bytes();
    CqlDecimal::from_signed_be_bytes_slice_and_exponent(minimal_varint(&bytes), value.scale() as i32)
}

pub fn from_cql(value: &CqlDecimal) -> Result<Decimal, DecimalCodecError> {
    let (bytes, scale) = value.as_signed_be_bytes_slice_and_exponent();

    if bytes.len() > 16 {
        return Err(DecimalCodecError::MantissaTooWide(bytes.len()));
    }
    if scale < 0 {
        return Err(DecimalCodecError::NegativeScale(scale));
    }

    let negative = bytes.first().is_some_and(|b| b & 0x80 != 0);
    let mut wide = if negative { [0xFF; 16] } else { [0; 16] };
    wide[16 - bytes.len()..].copy_from_slice(bytes);

    Decimal::try_from_i128_with_scale(i128::from_be_bytes(wide), scale as u32)
        .map_err(|source| DecimalCodecError::OutOfRange { scale, source })
}

/// Drop leading bytes that only repeat the sign
fn minimal_varint(bytes: &[u8; 16]) -> &[u8] {
    let mut start = 0;
    while start < 15 {
        let (current, next) = (bytes[start], bytes[start + 1]);
        let redundant = (current == 0x00 && next & 0x80 == 0) || (current == 0xFF && next & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    &bytes[start..]
}
