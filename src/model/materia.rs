use serde::{Deserialize, Deserializer, Serialize};

/// A single marketplace offer as reported by the upstream board.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listing {
    #[serde(rename = "pricePerUnit")]
    pub price_per_unit: u64,
    pub quantity: u64,
    #[serde(rename = "worldName")]
    pub world_name: String,
}

impl Listing {
    /// Unit price in the signed gil domain, saturating at `i64::MAX`.
    pub fn price_gil(&self) -> i64 {
        i64::try_from(self.price_per_unit).unwrap_or(i64::MAX)
    }

    /// Detail line shown for the listing, e.g. `3 × 12,000 gil @ Gilgamesh`.
    pub fn detail_line(&self) -> String {
        format!(
            "{} × {} gil @ {}",
            self.quantity,
            format_gil(self.price_gil()),
            self.world_name
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum ScripType {
    Orange,
    Purple,
    Other(String),
}

impl From<String> for ScripType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "orange" => ScripType::Orange,
            "purple" => ScripType::Purple,
            _ => ScripType::Other(value),
        }
    }
}

impl From<ScripType> for String {
    fn from(value: ScripType) -> Self {
        match value {
            ScripType::Orange => "orange".to_string(),
            ScripType::Purple => "purple".to_string(),
            ScripType::Other(other) => other,
        }
    }
}

/// One tradeable materia variant with its current market aggregates.
///
/// Price aggregates are computed upstream; every optional field may be `null`
/// or missing on the wire.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MateriaEntry {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stat: String,
    #[serde(default)]
    pub stat_increase: Option<i64>,
    #[serde(default)]
    pub average_gil: Option<i64>,
    #[serde(default)]
    pub scrip_cost: Option<i64>,
    #[serde(default)]
    pub gil_per_scrip: Option<i64>,
    #[serde(default)]
    pub scrip_type: Option<ScripType>,
    #[serde(default)]
    pub advanced_melding: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_quantity: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub listing_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cheapest_listings: Vec<Listing>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub historical_avg: Option<i64>,
}

impl MateriaEntry {
    /// The authoritative cheapest offer. Listings arrive pre-sorted ascending.
    pub fn cheapest(&self) -> Option<&Listing> {
        self.cheapest_listings.first()
    }

    pub fn cheapest_price(&self) -> Option<u64> {
        self.cheapest().map(|listing| listing.price_per_unit)
    }

    pub fn listing_lines(&self) -> Vec<String> {
        self.cheapest_listings
            .iter()
            .map(Listing::detail_line)
            .collect()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Groups thousands with commas: `1234567` → `1,234,567`.
pub fn format_gil(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
