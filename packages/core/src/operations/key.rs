//! Hashable row keys for grouping, joining and distinct counts

use crate::models::Scalar;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum KeyPart {
    Int(i64),
    /// Bit pattern of a non-NaN float, with -0.0 folded into 0.0
    Float(u64),
    Text(String),
    Bool(bool),
    Timestamp(i64),
}

impl KeyPart {
    /// Key for a value; `None` for null and NaN, which never match anything
    pub(crate) fn from_scalar(value: &Scalar) -> Option<Self> {
        match value {
            Scalar::Null => None,
            Scalar::Int(v) => Some(KeyPart::Int(*v)),
            Scalar::Float(v) => float_key(*v),
            Scalar::Text(v) => Some(KeyPart::Text(v.clone())),
            Scalar::Bool(v) => Some(KeyPart::Bool(*v)),
            Scalar::Timestamp(v) => Some(KeyPart::Timestamp(*v)),
        }
    }

    /// Key that compares ints and floats by numeric value
    pub(crate) fn numeric(value: &Scalar) -> Option<Self> {
        match value {
            Scalar::Int(v) => float_key(*v as f64),
            other => Self::from_scalar(other),
        }
    }
}

fn float_key(value: f64) -> Option<KeyPart> {
    if value.is_nan() {
        return None;
    }
    let normalized = if value == 0.0 { 0.0 } else { value };
    Some(KeyPart::Float(normalized.to_bits()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_and_nan_have_no_key() {
        assert_eq!(KeyPart::from_scalar(&Scalar::Null), None);
        assert_eq!(KeyPart::from_scalar(&Scalar::Float(f64::NAN)), None);
    }

    #[test]
    fn test_signed_zero_is_one_key() {
        assert_eq!(
            KeyPart::from_scalar(&Scalar::Float(-0.0)),
            KeyPart::from_scalar(&Scalar::Float(0.0))
        );
    }

    #[test]
    fn test_numeric_key_matches_int_and_float() {
        assert_eq!(
            KeyPart::numeric(&Scalar::Int(2)),
            KeyPart::numeric(&Scalar::Float(2.0))
        );
        assert_ne!(
            KeyPart::from_scalar(&Scalar::Int(2)),
            KeyPart::from_scalar(&Scalar::Float(2.0))
        );
    }
}
