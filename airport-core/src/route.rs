use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use crate::airport::Airport;
use crate::geo;
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub id: Uuid,
    pub source: Airport,
    pub destination: Airport,
}

impl Route {
    /// Kilometres between the endpoints. Recomputed on every call.
    pub fn distance(&self) -> i64 {
        geo::distance_km(self.source.coordinates(), self.destination.coordinates())
    }

    /// "AAA -> AAL"
    pub fn code_label(&self) -> String {
        format!("{} -> {}", self.source.code, self.destination.code)
    }

    /// "Anaa Airport -> Aalborg Airport"
    pub fn name_label(&self) -> String {
        format!("{} -> {}", self.source.name, self.destination.name)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} km)", self.name_label(), self.distance())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteInput {
    pub source: Uuid,
    pub destination: Uuid,
}

impl RouteInput {
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        if self.source == self.destination {
            return Err(ValidationErrors::single(
                "destination",
                "Source and destination airports must be different",
            ));
        }
        Ok(self)
    }
}

impl From<&Route> for RouteInput {
    fn from(route: &Route) -> Self {
        Self {
            source: route.source.id,
            destination: route.destination.id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoutePatch {
    pub source: Option<Uuid>,
    pub destination: Option<Uuid>,
}

impl RoutePatch {
    pub fn apply_to(self, base: &Route) -> RouteInput {
        RouteInput {
            source: self.source.unwrap_or(base.source.id),
            destination: self.destination.unwrap_or(base.destination.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn airport(code: &str, name: &str, city: &str, country: &str, lat: f64, lon: f64) -> Airport {
        Airport {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: name.to_string(),
            city: city.to_string(),
            state: None,
            country: country.to_string(),
            lat,
            lon,
        }
    }

    fn route() -> Route {
        Route {
            id: Uuid::new_v4(),
            source: airport("AAA", "Anaa Airport", "Anaa", "French Polynesia", -17.3595, -145.494),
            destination: airport("AAL", "Aalborg Airport", "Norresundby", "Denmark", 57.0952, 9.85606),
        }
    }

    #[test]
    fn test_distance_property_calculation() {
        assert_eq!(route().distance(), 15142);
    }

    #[test]
    fn test_route_display() {
        assert_eq!(route().to_string(), "Anaa Airport -> Aalborg Airport (15142 km)");
        assert_eq!(route().code_label(), "AAA -> AAL");
    }

    #[test]
    fn test_same_source_and_destination() {
        let id = Uuid::new_v4();
        let errors = RouteInput { source: id, destination: id }.validate().unwrap_err();
        assert_eq!(errors.messages("destination"), ["Source and destination airports must be different"]);
    }

    #[test]
    fn test_distinct_endpoints_pass() {
        let input = RouteInput { source: Uuid::new_v4(), destination: Uuid::new_v4() };
        assert!(input.validate().is_ok());
    }
}
