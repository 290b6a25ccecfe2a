use serde::{Deserialize, Deserializer, Serialize};

/// One surveyed trip, reduced to the raw integer codes the analyses use.
///
/// Every field is optional: blank or non-numeric cells become `None` instead
/// of failing the whole read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TripRecord {
    #[serde(rename = "originreportzone", default, deserialize_with = "lenient_code")]
    pub origin_zone: Option<i64>,
    #[serde(rename = "destreportzone", default, deserialize_with = "lenient_code")]
    pub dest_zone: Option<i64>,
    #[serde(rename = "modeprimary", default, deserialize_with = "lenient_code")]
    pub mode_primary: Option<i64>,
    #[serde(rename = "trippurpose", default, deserialize_with = "lenient_code")]
    pub trip_purpose: Option<i64>,
    #[serde(rename = "departtime", default, deserialize_with = "lenient_code")]
    pub depart_time: Option<i64>,
}

/// Parses a survey code, accepting integer-valued floats (`"2.0"`) as written
/// by tools that store integer columns with gaps as floating point.
pub fn parse_code(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }

    let v: f64 = raw.parse().ok()?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 {
        #[allow(clippy::cast_possible_truncation)]
        Some(v as i64)
    } else {
        None
    }
}

fn lenient_code<'de, D>(d: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.as_deref().and_then(parse_code))
}
