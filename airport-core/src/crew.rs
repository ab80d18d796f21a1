use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use crate::validation::ValidationErrors;

pub const NAME_MAX: usize = 64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CrewTitle {
    Captain,
    #[serde(rename = "Co-Pilot")]
    CoPilot,
    #[serde(rename = "Flight Attendant")]
    FlightAttendant,
    #[serde(rename = "Flight Engineer")]
    FlightEngineer,
    #[serde(rename = "Flight Medic")]
    FlightMedic,
}

impl CrewTitle {
    pub const ALL: [CrewTitle; 5] = [
        CrewTitle::Captain,
        CrewTitle::CoPilot,
        CrewTitle::FlightAttendant,
        CrewTitle::FlightEngineer,
        CrewTitle::FlightMedic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrewTitle::Captain => "Captain",
            CrewTitle::CoPilot => "Co-Pilot",
            CrewTitle::FlightAttendant => "Flight Attendant",
            CrewTitle::FlightEngineer => "Flight Engineer",
            CrewTitle::FlightMedic => "Flight Medic",
        }
    }
}

impl fmt::Display for CrewTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrewTitle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CrewTitle::ALL
            .into_iter()
            .find(|title| title.as_str() == s)
            .ok_or_else(|| format!("\"{}\" is not a valid choice.", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Crew {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub title: CrewTitle,
}

impl Crew {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Display for Crew {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.full_name(), self.title)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrewInput {
    pub first_name: String,
    pub last_name: String,
    pub title: CrewTitle,
}

impl CrewInput {
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check_text("first_name", &self.first_name, NAME_MAX);
        errors.check_text("last_name", &self.last_name, NAME_MAX);
        errors.into_result()?;

        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrewPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: Option<CrewTitle>,
}

impl CrewPatch {
    pub fn apply_to(self, base: &Crew) -> CrewInput {
        CrewInput {
            first_name: self.first_name.unwrap_or_else(|| base.first_name.clone()),
            last_name: self.last_name.unwrap_or_else(|| base.last_name.clone()),
            title: self.title.unwrap_or(base.title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn john() -> Crew {
        Crew {
            id: Uuid::new_v4(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            title: CrewTitle::Captain,
        }
    }

    #[test]
    fn test_full_name_property() {
        assert_eq!(john().full_name(), "John Doe");
    }

    #[test]
    fn test_display() {
        assert_eq!(john().to_string(), "John Doe (Captain)");
    }

    #[test]
    fn test_title_wire_names() {
        let title: CrewTitle = serde_json::from_str("\"Co-Pilot\"").unwrap();
        assert_eq!(title, CrewTitle::CoPilot);
        assert_eq!(serde_json::to_string(&CrewTitle::FlightMedic).unwrap(), "\"Flight Medic\"");
        assert!(serde_json::from_str::<CrewTitle>("\"Stowaway\"").is_err());
    }

    #[test]
    fn test_title_round_trips_through_str() {
        for title in CrewTitle::ALL {
            assert_eq!(title.as_str().parse::<CrewTitle>().unwrap(), title);
        }
        assert!("captain".parse::<CrewTitle>().is_err());
    }

    #[test]
    fn test_input_rejects_blank_names() {
        let input = CrewInput {
            first_name: " ".to_string(),
            last_name: "x".repeat(65),
            title: CrewTitle::FlightAttendant,
        };

        let errors = input.validate().unwrap_err();
        assert!(errors.has("first_name"));
        assert!(errors.has("last_name"));
    }
}
