use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;
use crate::countries;
use crate::geo::Coordinates;
use crate::validation::{ValidationErrors, REQUIRED};

pub const CODE_LEN: usize = 3;
pub const TEXT_MAX: usize = 255;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Airport {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl Airport {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates { lat: self.lat, lon: self.lon }
    }
}

impl fmt::Display for Airport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} | {})", self.name, self.city, self.country)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirportInput {
    pub code: String,
    pub name: String,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

/// Upper-cases an airport code, rejecting anything that is not three letters.
pub fn normalize_code(code: &str) -> Result<String, Vec<String>> {
    let code = code.trim();
    let mut problems = Vec::new();
    if code.is_empty() {
        problems.push(REQUIRED.to_string());
        return Err(problems);
    }
    if !code.chars().all(|c| c.is_ascii_alphabetic()) {
        problems.push("Airport code must contain only letters".to_string());
    }
    if code.chars().count() != CODE_LEN {
        problems.push("Airport code must be exactly 3 letters".to_string());
    }
    if problems.is_empty() {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(problems)
    }
}

impl AirportInput {
    /// Validates every field and returns the input in its stored form.
    pub fn normalize(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match normalize_code(&self.code) {
            Ok(code) => self.code = code,
            Err(problems) => {
                for problem in problems {
                    errors.add("code", problem);
                }
            }
        }

        errors.check_text("name", &self.name, TEXT_MAX);
        errors.check_text("city", &self.city, TEXT_MAX);

        self.state = self
            .state
            .take()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(state) = &self.state {
            if state.chars().count() > TEXT_MAX {
                errors.add("state", format!("Ensure this field has no more than {} characters.", TEXT_MAX));
            }
        }

        let country = self.country.take().map(|c| c.trim().to_string()).unwrap_or_default();
        if country.is_empty() {
            errors.add("country", REQUIRED);
        } else {
            match countries::canonical_name(&country) {
                Some(canonical) => self.country = Some(canonical.to_string()),
                None => errors.add("country", format!("'{}' is not a valid country name", country)),
            }
        }

        if !(-90.0..=90.0).contains(&self.lat) {
            errors.add("lat", "Latitude must be between -90 and 90");
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            errors.add("lon", "Longitude must be between -180 and 180");
        }

        errors.into_result()?;
        self.name = self.name.trim().to_string();
        self.city = self.city.trim().to_string();
        Ok(self)
    }

    /// Country after `normalize`; empty before.
    pub fn country(&self) -> &str {
        self.country.as_deref().unwrap_or_default()
    }
}

impl From<&Airport> for AirportInput {
    fn from(airport: &Airport) -> Self {
        Self {
            code: airport.code.clone(),
            name: airport.name.clone(),
            city: airport.city.clone(),
            state: airport.state.clone(),
            country: Some(airport.country.clone()),
            lat: airport.lat,
            lon: airport.lon,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AirportPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    /// Absent keeps the state; `null` or `""` clears it.
    #[serde(default, deserialize_with = "present")]
    pub state: Option<Option<String>>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl AirportPatch {
    pub fn apply_to(self, base: &Airport) -> AirportInput {
        let base = AirportInput::from(base);
        AirportInput {
            code: self.code.unwrap_or(base.code),
            name: self.name.unwrap_or(base.name),
            city: self.city.unwrap_or(base.city),
            state: self.state.unwrap_or(base.state),
            country: self.country.or(base.country),
            lat: self.lat.unwrap_or(base.lat),
            lon: self.lon.unwrap_or(base.lon),
        }
    }
}

/// Wraps a field that was sent, `null` included, in `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anaa() -> AirportInput {
        AirportInput {
            code: "aaa".to_string(),
            name: "Anaa Airport".to_string(),
            city: "Anaa".to_string(),
            state: None,
            country: Some("French Polynesia".to_string()),
            lat: -17.3595,
            lon: -145.494,
        }
    }

    #[test]
    fn test_code_is_uppercased() {
        let airport = anaa().normalize().unwrap();
        assert_eq!(airport.code, "AAA");
    }

    #[test]
    fn test_code_contains_only_letters() {
        let mut input = anaa();
        input.code = "A1A".to_string();
        let errors = input.normalize().unwrap_err();
        assert_eq!(errors.messages("code"), ["Airport code must contain only letters"]);
    }

    #[test]
    fn test_code_length() {
        let mut input = anaa();
        input.code = "AALB".to_string();
        let errors = input.normalize().unwrap_err();
        assert_eq!(errors.messages("code"), ["Airport code must be exactly 3 letters"]);
    }

    #[test]
    fn test_country_required() {
        let mut input = anaa();
        input.country = None;
        let errors = input.normalize().unwrap_err();
        assert_eq!(errors.messages("country"), [REQUIRED]);
    }

    #[test]
    fn test_country_exists() {
        let mut input = anaa();
        input.country = Some("Test Country".to_string());
        let errors = input.normalize().unwrap_err();
        assert_eq!(errors.messages("country"), ["'Test Country' is not a valid country name"]);
    }

    #[test]
    fn test_country_gets_canonical_spelling() {
        let mut input = anaa();
        input.country = Some("french polynesia".to_string());
        assert_eq!(input.normalize().unwrap().country(), "French Polynesia");
    }

    #[test]
    fn test_coordinates_range() {
        let mut input = anaa();
        input.lat = 91.0;
        input.lon = -181.0;
        let errors = input.normalize().unwrap_err();
        assert!(errors.has("lat"));
        assert!(errors.has("lon"));
    }

    #[test]
    fn test_patch_state() {
        let mut input = anaa();
        input.state = Some("Tuamotu".to_string());
        let stored = input.normalize().unwrap();
        let airport = Airport {
            id: Uuid::new_v4(),
            code: stored.code.clone(),
            name: stored.name.clone(),
            city: stored.city.clone(),
            state: stored.state.clone(),
            country: stored.country().to_string(),
            lat: stored.lat,
            lon: stored.lon,
        };

        let kept: AirportPatch = serde_json::from_str(r#"{"name": "Anaa"}"#).unwrap();
        assert_eq!(kept.apply_to(&airport).state.as_deref(), Some("Tuamotu"));

        let cleared: AirportPatch = serde_json::from_str(r#"{"state": null}"#).unwrap();
        assert_eq!(cleared.apply_to(&airport).state, None);

        let blank: AirportPatch = serde_json::from_str(r#"{"state": ""}"#).unwrap();
        assert_eq!(blank.apply_to(&airport).normalize().unwrap().state, None);
    }

    #[test]
    fn test_display() {
        let airport = Airport {
            id: Uuid::new_v4(),
            code: "AAA".to_string(),
            name: "Anaa Airport".to_string(),
            city: "Anaa".to_string(),
            state: None,
            country: "French Polynesia".to_string(),
            lat: -17.3595,
            lon: -145.494,
        };
        assert_eq!(airport.to_string(), "Anaa Airport (Anaa | French Polynesia)");
    }
}
