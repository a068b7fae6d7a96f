//! Realtime online record cached by the benchmark.

use crate::fixture::FixtureItem;
use cachebench_cache::CacheItem;
use cachebench_core::{CacheBenchError, CacheBenchResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Monitoring specialty a reading belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialtyCategory {
    S10,
    S20,
    S30,
    S40,
    S50,
}

impl SpecialtyCategory {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::S10 => "S10",
            Self::S20 => "S20",
            Self::S30 => "S30",
            Self::S40 => "S40",
            Self::S50 => "S50",
        }
    }
}

impl fmt::Display for SpecialtyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecialtyCategory {
    type Err = CacheBenchError;

    fn from_str(s: &str) -> CacheBenchResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S10" => Ok(Self::S10),
            "S20" => Ok(Self::S20),
            "S30" => Ok(Self::S30),
            "S40" => Ok(Self::S40),
            "S50" => Ok(Self::S50),
            other => Err(CacheBenchError::configuration(format!(
                "Unknown specialty category: {}",
                other
            ))),
        }
    }
}

/// One realtime reading of a device parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RealtimeOnline {
    pub enterprise_code: String,
    pub specialty_category: SpecialtyCategory,
    pub device_number: String,
    pub param_dict_number: String,
    pub record_date: DateTime<Utc>,
    pub record_value: String,
}

impl RealtimeOnline {
    /// Build a record from a fixture item.
    #[must_use]
    pub fn from_fixture(
        item: &FixtureItem,
        category: SpecialtyCategory,
        record_value: &str,
        record_date: DateTime<Utc>,
    ) -> Self {
        Self {
            enterprise_code: item.enterprise_code.clone(),
            specialty_category: category,
            device_number: item.device_number.clone(),
            param_dict_number: item.dict_number.clone(),
            record_date,
            record_value: record_value.to_string(),
        }
    }

    /// Identity key: `enterprise,device,param,category`.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "{},{},{},{}",
            self.enterprise_code, self.device_number, self.param_dict_number, self.specialty_category
        )
    }
}

impl CacheItem for RealtimeOnline {
    const CACHE_NAME: &'static str = "RealtimeOnline";
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachebench_cache::keys::normalize_key;

    fn item() -> FixtureItem {
        FixtureItem {
            enterprise_code: "E1".to_string(),
            device_number: "D1".to_string(),
            dict_number: "P1".to_string(),
        }
    }

    #[test]
    fn test_cache_key_format() {
        let record = RealtimeOnline::from_fixture(&item(), SpecialtyCategory::S30, "123.45", Utc::now());
        assert_eq!(record.cache_key(), "E1,D1,P1,S30");
    }

    #[test]
    fn test_normalized_key_example() {
        let record = RealtimeOnline::from_fixture(&item(), SpecialtyCategory::S30, "123.45", Utc::now());
        let key = normalize_key(RealtimeOnline::CACHE_NAME, "162.HNSC.VOC.II ", &record.cache_key());
        assert_eq!(key, "c:RealtimeOnline,k:162.HNSC.VOC.II E1,D1,P1,S30");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("S30".parse::<SpecialtyCategory>().unwrap(), SpecialtyCategory::S30);
        assert_eq!(" s10 ".parse::<SpecialtyCategory>().unwrap(), SpecialtyCategory::S10);

        let err = "X99".parse::<SpecialtyCategory>().unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_serializes_pascal_case() {
        let record = RealtimeOnline::from_fixture(&item(), SpecialtyCategory::S30, "123.45", Utc::now());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["EnterpriseCode"], "E1");
        assert_eq!(json["SpecialtyCategory"], "S30");
        assert_eq!(json["ParamDictNumber"], "P1");
        assert_eq!(json["RecordValue"], "123.45");

        let back: RealtimeOnline = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
