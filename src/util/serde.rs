//! Serde helpers for values JSON cannot represent natively.

/// Serialize an `f64` as a JSON number when finite, and as the string
/// `"inf"`, `"-inf"` or `"NaN"` otherwise, the same text CSV output uses.
///
/// Use with `#[serde(with = "crate::util::serde::non_finite_f64")]`.
pub mod non_finite_f64 {
    use ::serde::de::Error as _;
    use ::serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    /// Write `value`.
    ///
    /// # Errors
    ///
    /// Returns any error from the serializer.
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.collect_str(value)
        }
    }

    /// Read a number or one of the non-finite spellings.
    ///
    /// # Errors
    ///
    /// Fails on strings that are not a float.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => text
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid float `{text}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use ::serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Change {
        #[serde(with = "super::non_finite_f64")]
        value: f64,
    }

    fn round_trip(value: f64) -> (String, f64) {
        let json = serde_json::to_string(&Change { value }).unwrap();
        let back: Change = serde_json::from_str(&json).unwrap();
        (json, back.value)
    }

    #[test]
    fn finite_values_stay_numbers() {
        let (json, back) = round_trip(-0.375);
        assert_eq!(json, r#"{"value":-0.375}"#);
        assert!((back + 0.375).abs() < f64::EPSILON);
    }

    #[test]
    fn non_finite_values_are_strings() {
        let (json, back) = round_trip(f64::INFINITY);
        assert_eq!(json, r#"{"value":"inf"}"#);
        assert_eq!(back, f64::INFINITY);

        let (json, back) = round_trip(f64::NEG_INFINITY);
        assert_eq!(json, r#"{"value":"-inf"}"#);
        assert_eq!(back, f64::NEG_INFINITY);

        let (json, back) = round_trip(f64::NAN);
        assert_eq!(json, r#"{"value":"NaN"}"#);
        assert!(back.is_nan());
    }

    #[test]
    fn garbage_strings_are_rejected() {
        assert!(serde_json::from_str::<Change>(r#"{"value":"lots"}"#).is_err());
    }
}
