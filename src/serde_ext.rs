use serde::{Deserialize, Deserializer};

/// Reads a missing or `null` string field as `""`.
///
/// Pair with `#[serde(default)]` so an absent key also lands here as empty.
pub fn empty_if_null<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}
