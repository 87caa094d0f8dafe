use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Currency amount in rupees.
pub type Amount = Decimal;

/// Delivery platforms prices are compared across.
///
/// Declaration order is the platform order used everywhere: iteration of the
/// per-product maps, result rows, and tie-breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    Blinkit,
    Zepto,
    BigBasket,
    JioMart,
}

impl PlatformId {
    /// Fixed search page opened by the "Go to" action.
    pub fn search_url(self) -> &'static str {
        match self {
            PlatformId::Blinkit => "https://blinkit.com/search",
            PlatformId::Zepto => "https://zepto.com/search",
            PlatformId::BigBasket => "https://www.bigbasket.com/search",
            PlatformId::JioMart => "https://www.jiomart.com/search",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlatformId::Blinkit => "blinkit",
            PlatformId::Zepto => "zepto",
            PlatformId::BigBasket => "bigbasket",
            PlatformId::JioMart => "jiomart",
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub id: PlatformId,
    pub name: &'static str,
    /// Brand color as RGB.
    pub color: (u8, u8, u8),
}

pub const PLATFORMS: [Platform; 4] = [
    Platform {
        id: PlatformId::Blinkit,
        name: "Blinkit",
        color: (248, 203, 70),
    },
    Platform {
        id: PlatformId::Zepto,
        name: "Zepto",
        color: (98, 29, 168),
    },
    Platform {
        id: PlatformId::BigBasket,
        name: "BigBasket",
        color: (132, 194, 37),
    },
    Platform {
        id: PlatformId::JioMart,
        name: "JioMart",
        color: (0, 120, 173),
    },
];

pub fn platform(id: PlatformId) -> &'static Platform {
    // PLATFORMS is indexed in declaration order.
    &PLATFORMS[id as usize]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub canonical_id: Option<String>,
    pub category: String,
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub rating: f32,
    pub prices: BTreeMap<PlatformId, Amount>,
    pub availability: BTreeMap<PlatformId, bool>,
    #[serde(rename = "deliveryTime", default)]
    pub delivery_time: BTreeMap<PlatformId, String>,
}

impl Product {
    /// Stable identifier: the canonical id when present, else `category-id`.
    pub fn product_id(&self) -> String {
        match self.canonical_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("{}-{}", self.category, self.id),
        }
    }

    /// Price listed on `platform`; a missing entry counts as zero.
    pub fn price_on(&self, platform: PlatformId) -> Amount {
        self.prices.get(&platform).copied().unwrap_or_default()
    }

    pub fn is_available_on(&self, platform: PlatformId) -> bool {
        self.availability.get(&platform).copied().unwrap_or(false)
    }

    pub fn delivery_time_on(&self, platform: PlatformId) -> &str {
        self.delivery_time
            .get(&platform)
            .map(String::as_str)
            .unwrap_or("-")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Best-effort structured address. Fields are empty when the lookup had
/// nothing for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedLocation {
    pub city: String,
    pub area: String,
    pub landmark: String,
    pub pincode: String,
}

impl DetectedLocation {
    /// Short label for result headings: city, falling back to the pincode.
    pub fn label(&self) -> &str {
        if self.city.is_empty() {
            &self.pincode
        } else {
            &self.city
        }
    }
}

/// Renders an empty field as "Unknown".
pub fn or_unknown(field: &str) -> &str {
    if field.is_empty() {
        "Unknown"
    } else {
        field
    }
}

#[derive(Debug, Deserialize)]
pub struct NominatimResponse {
    #[serde(default)]
    pub address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NominatimAddress {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub suburb: Option<String>,
    pub neighbourhood: Option<String>,
    pub subarea: Option<String>,
    pub amenity: Option<String>,
    pub building: Option<String>,
    pub road: Option<String>,
    pub postcode: Option<String>,
}

// First non-empty candidate, or "".
fn first_present(candidates: &[&Option<String>]) -> String {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .find(|s| !s.is_empty())
        .unwrap_or("")
        .to_string()
}

// Map the Nominatim address block onto our four display fields.
impl From<NominatimAddress> for DetectedLocation {
    fn from(a: NominatimAddress) -> Self {
        Self {
            city: first_present(&[&a.city, &a.town, &a.village]),
            area: first_present(&[&a.suburb, &a.neighbourhood, &a.subarea]),
            landmark: first_present(&[&a.amenity, &a.building, &a.road]),
            pincode: first_present(&[&a.postcode]),
        }
    }
}

impl From<NominatimResponse> for DetectedLocation {
    fn from(res: NominatimResponse) -> Self {
        res.address.map(Self::from).unwrap_or_default()
    }
}
