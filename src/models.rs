//! Form input, recommendation, and diagnosis records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AgriError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SoilQuality {
    Poor,
    #[default]
    Average,
    Good,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Climate {
    Tropical,
    Dry,
    #[default]
    Temperate,
    Continental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GrowthStage {
    Seedling,
    #[default]
    Vegetative,
    Flowering,
    Fruiting,
}

/// Generates `as_str`, `Display`, and case-insensitive `FromStr`/`Deserialize` for the form enums.
macro_rules! form_enum {
    ($ty:ident, $label:literal, [$($variant:ident),+ $(,)?]) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = AgriError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        let allowed: Vec<&str> = $ty::ALL.iter().map(|v| v.as_str()).collect();
                        AgriError::validation(format!(
                            "invalid {} '{}', expected one of: {}",
                            $label,
                            wanted,
                            allowed.join(", ")
                        ))
                    })
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

form_enum!(SoilQuality, "soil quality", [Poor, Average, Good]);
form_enum!(Climate, "climate", [Tropical, Dry, Temperate, Continental]);
form_enum!(GrowthStage, "growth stage", [Seedling, Vegetative, Flowering, Fruiting]);

/// What the user typed into the advice form.
///
/// Missing fields fall back to the form's initial state, so a partial
/// submission is still a valid one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormInput {
    pub crop_type: String,
    pub soil_quality: SoilQuality,
    pub climate: Climate,
    pub growth_stage: GrowthStage,
    pub nutrient_deficiencies: String,
}

/// A canned fertilizer suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub fertilizer_name: String,
    pub application_method: String,
    pub reasoning: String,
    pub precautions: String,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.fertilizer_name)?;
        writeln!(f, "  Method: {}", self.application_method)?;
        writeln!(f, "  Why: {}", self.reasoning)?;
        write!(f, "  Precautions: {}", self.precautions)
    }
}

/// Result of an image upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub image_id: String,
    pub format: String,
    pub size_bytes: usize,
    pub finding: String,
    pub recommendations: Vec<Recommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_defaults_match_initial_state() {
        let form = FormInput::default();
        assert_eq!(form.crop_type, "");
        assert_eq!(form.soil_quality, SoilQuality::Average);
        assert_eq!(form.climate, Climate::Temperate);
        assert_eq!(form.growth_stage, GrowthStage::Vegetative);
        assert_eq!(form.nutrient_deficiencies, "");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let form: FormInput =
            serde_json::from_str(r#"{"cropType":"Maize","climate":"Dry"}"#).unwrap();
        assert_eq!(form.crop_type, "Maize");
        assert_eq!(form.climate, Climate::Dry);
        assert_eq!(form.soil_quality, SoilQuality::Average);
    }

    #[test]
    fn enum_parsing_is_case_insensitive() {
        assert_eq!("poor".parse::<SoilQuality>().unwrap(), SoilQuality::Poor);
        assert_eq!(" FRUITING ".parse::<GrowthStage>().unwrap(), GrowthStage::Fruiting);
        let err = "Arctic".parse::<Climate>().unwrap_err();
        assert!(err.to_string().contains("Tropical, Dry, Temperate, Continental"));
    }

    #[test]
    fn wire_values_are_case_insensitive() {
        let form: FormInput = serde_json::from_str(
            r#"{"soilQuality":"poor","climate":"TROPICAL","growthStage":"flowering"}"#,
        )
        .unwrap();
        assert_eq!(form.soil_quality, SoilQuality::Poor);
        assert_eq!(form.climate, Climate::Tropical);
        assert_eq!(form.growth_stage, GrowthStage::Flowering);

        let err = serde_json::from_str::<FormInput>(r#"{"climate":"Arctic"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid climate 'Arctic'"));
    }

    #[test]
    fn serialized_values_stay_pascal_case() {
        let v = serde_json::to_value(SoilQuality::Good).unwrap();
        assert_eq!(v, "Good");
    }

    #[test]
    fn recommendation_serializes_camel_case() {
        let rec = Recommendation {
            fertilizer_name: "A".into(),
            application_method: "B".into(),
            reasoning: "C".into(),
            precautions: "D".into(),
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["fertilizerName"], "A");
        assert_eq!(v["applicationMethod"], "B");
    }
}
