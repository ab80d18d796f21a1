use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use crate::validation::ValidationErrors;

pub const NAME_MAX: usize = 255;
pub const CODE_MAX: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AirplaneType {
    pub id: Uuid,
    pub name: String,
}

impl fmt::Display for AirplaneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirplaneTypeInput {
    pub name: String,
}

impl AirplaneTypeInput {
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check_text("name", &self.name, NAME_MAX);
        errors.into_result()?;
        self.name = self.name.trim().to_string();
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AirplaneTypePatch {
    pub name: Option<String>,
}

impl AirplaneTypePatch {
    pub fn apply_to(self, base: &AirplaneType) -> AirplaneTypeInput {
        AirplaneTypeInput {
            name: self.name.unwrap_or_else(|| base.name.clone()),
        }
    }
}

/// Cabin geometry used to bound ticket row/seat numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatLayout {
    pub rows: i32,
    pub seats_in_row: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Airplane {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub rows: i32,
    pub seats_in_row: i32,
    pub airplane_type: AirplaneType,
}

impl Airplane {
    pub fn total_seats(&self) -> i64 {
        i64::from(self.rows) * i64::from(self.seats_in_row)
    }

    pub fn seat_layout(&self) -> SeatLayout {
        SeatLayout {
            rows: self.rows,
            seats_in_row: self.seats_in_row,
        }
    }
}

impl fmt::Display for Airplane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (total seats: {})", self.name, self.total_seats())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirplaneInput {
    pub name: String,
    pub code: String,
    pub rows: i32,
    pub seats_in_row: i32,
    pub airplane_type: Uuid,
}

impl AirplaneInput {
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check_text("name", &self.name, NAME_MAX);
        errors.check_text("code", &self.code, CODE_MAX);
        errors.check_positive("rows", self.rows);
        errors.check_positive("seats_in_row", self.seats_in_row);
        errors.into_result()?;

        self.name = self.name.trim().to_string();
        self.code = self.code.trim().to_string();
        Ok(self)
    }
}

impl From<&Airplane> for AirplaneInput {
    fn from(airplane: &Airplane) -> Self {
        Self {
            name: airplane.name.clone(),
            code: airplane.code.clone(),
            rows: airplane.rows,
            seats_in_row: airplane.seats_in_row,
            airplane_type: airplane.airplane_type.id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AirplanePatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub rows: Option<i32>,
    pub seats_in_row: Option<i32>,
    pub airplane_type: Option<Uuid>,
}

impl AirplanePatch {
    pub fn apply_to(self, base: &Airplane) -> AirplaneInput {
        let base = AirplaneInput::from(base);
        AirplaneInput {
            name: self.name.unwrap_or(base.name),
            code: self.code.unwrap_or(base.code),
            rows: self.rows.unwrap_or(base.rows),
            seats_in_row: self.seats_in_row.unwrap_or(base.seats_in_row),
            airplane_type: self.airplane_type.unwrap_or(base.airplane_type),
        }
    }
}
