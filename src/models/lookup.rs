//! Lookup result returned to callers.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::{Level1Region, Level2Region};

/// The province/district pair a point resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMatch {
    pub province_code: String,
    pub province_name: String,
    pub district_code: String,
    pub district_name: String,
}

impl RegionMatch {
    pub fn from_regions(level1: &Level1Region, level2: &Level2Region) -> Self {
        Self {
            province_code: level1.level1_id.clone(),
            province_name: level1.name.clone(),
            district_code: level2.level2_id.clone(),
            district_name: level2.name.clone(),
        }
    }
}

/// Outcome of a lookup. `NotFound` is a normal result (open water, territory
/// outside the dataset), never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    Found(RegionMatch),
    NotFound,
}

impl LookupResult {
    pub fn is_found(&self) -> bool {
        matches!(self, LookupResult::Found(_))
    }

    pub fn as_match(&self) -> Option<&RegionMatch> {
        match self {
            LookupResult::Found(m) => Some(m),
            LookupResult::NotFound => None,
        }
    }
}

/// Wire shape:
/// `{"codeProvince", "province", "district", "codeDistrict"}` when found,
/// `{"province": null, "district": null}` otherwise.
impl Serialize for LookupResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LookupResult::Found(m) => {
                let mut s = serializer.serialize_struct("LookupResult", 4)?;
                s.serialize_field("codeProvince", &m.province_code)?;
                s.serialize_field("province", &m.province_name)?;
                s.serialize_field("district", &m.district_name)?;
                s.serialize_field("codeDistrict", &m.district_code)?;
                s.end()
            }
            LookupResult::NotFound => {
                let mut s = serializer.serialize_struct("LookupResult", 2)?;
                s.serialize_field("province", &None::<String>)?;
                s.serialize_field("district", &None::<String>)?;
                s.end()
            }
        }
    }
}
