//! Query filters and pagination for list endpoints.
//!
//! Each filter has a `matches` predicate used by the in-memory store; the
//! PostgreSQL store translates the same fields into SQL.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;
use crate::airplane::Airplane;
use crate::airport::Airport;
use crate::crew::Crew;
use crate::flight::Flight;
use crate::route::Route;
use crate::validation::ValidationErrors;

/// Case-insensitive substring test; an empty needle matches everything.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn text_matches(value: &str, wanted: &Option<String>) -> bool {
    wanted.as_deref().map_or(true, |needle| contains_ci(value, needle))
}

/// Parses a comma-separated list of ids such as `?crew=<id>,<id>`.
pub fn parse_id_list(field: &str, raw: &str) -> Result<Vec<Uuid>, ValidationErrors> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            Uuid::parse_str(part)
                .map_err(|_| ValidationErrors::single(field, format!("\"{}\" is not a valid UUID.", part)))
        })
        .collect()
}

pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ValidationErrors> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationErrors::single(field, "Enter a valid date in the format YYYY-MM-DD.")
    })
}

pub fn parse_non_negative(field: &str, raw: &str) -> Result<i64, ValidationErrors> {
    match raw.trim().parse::<i64>() {
        Ok(value) if value >= 0 => Ok(value),
        _ => Err(ValidationErrors::single(field, "Enter a whole number.")),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AirplaneFilter {
    /// Substring of the airplane type name.
    pub airplane_type: Option<String>,
    /// Only airplanes with at most this many seats.
    pub max_total_seats: Option<i64>,
}

impl AirplaneFilter {
    pub fn matches(&self, airplane: &Airplane) -> bool {
        text_matches(&airplane.airplane_type.name, &self.airplane_type)
            && self.max_total_seats.map_or(true, |max| airplane.total_seats() <= max)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrewFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: Option<String>,
}

impl CrewFilter {
    pub fn matches(&self, crew: &Crew) -> bool {
        text_matches(&crew.first_name, &self.first_name)
            && text_matches(&crew.last_name, &self.last_name)
            && text_matches(crew.title.as_str(), &self.title)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AirportFilter {
    pub code: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl AirportFilter {
    pub fn matches(&self, airport: &Airport) -> bool {
        text_matches(&airport.code, &self.code)
            && text_matches(&airport.name, &self.name)
            && text_matches(&airport.city, &self.city)
            && text_matches(&airport.country, &self.country)
    }
}

/// Source/destination filters match on airport codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteFilter {
    pub source: Option<String>,
    pub destination: Option<String>,
}

impl RouteFilter {
    pub fn matches(&self, route: &Route) -> bool {
        text_matches(&route.source.code, &self.source)
            && text_matches(&route.destination.code, &self.destination)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightFilter {
    pub routes: Vec<Uuid>,
    pub airplanes: Vec<Uuid>,
    /// Flights staffed by any of these crew members.
    pub crew: Vec<Uuid>,
    /// Departure date in UTC.
    pub departure_date: Option<NaiveDate>,
}

impl FlightFilter {
    pub fn matches(&self, flight: &Flight) -> bool {
        (self.routes.is_empty() || self.routes.contains(&flight.route.id))
            && (self.airplanes.is_empty() || self.airplanes.contains(&flight.airplane.id))
            && (self.crew.is_empty() || flight.crew.iter().any(|c| self.crew.contains(&c.id)))
            && self
                .departure_date
                .map_or(true, |date| flight.departure_time.date_naive() == date)
    }
}

/// Row-level visibility of orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    All,
    Owner(Uuid),
}

impl OrderScope {
    pub fn permits(&self, owner: Uuid) -> bool {
        match self {
            OrderScope::All => true,
            OrderScope::Owner(id) => *id == owner,
        }
    }
}

/// A window into a list, from `?page=<n>&page_size=<m>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u64,
}

impl PageRequest {
    /// `page` is 1-based; `page_size` is clamped to `max_size`. Both the
    /// offset and the limit fit in an `i64`.
    pub fn new(
        page: Option<u64>,
        page_size: Option<u64>,
        default_size: u64,
        max_size: u64,
    ) -> Result<Self, ValidationErrors> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(ValidationErrors::single("page", "Invalid page."));
        }
        let limit = page_size
            .unwrap_or(default_size)
            .clamp(1, max_size.max(1))
            .min(i64::MAX as u64);
        let offset = (page - 1)
            .checked_mul(limit)
            .filter(|offset| *offset <= i64::MAX as u64)
            .ok_or_else(|| ValidationErrors::single("page", "Invalid page."))?;
        Ok(Self { offset, limit })
    }

    /// Offset and limit as SQL `BIGINT` values.
    pub fn bounds(&self) -> (i64, i64) {
        (
            i64::try_from(self.offset).unwrap_or(i64::MAX),
            i64::try_from(self.limit).unwrap_or(i64::MAX),
        )
    }

    /// Applies the window to an already filtered, ordered list.
    pub fn slice<T>(&self, items: Vec<T>) -> Page<T> {
        let count = items.len() as u64;
        let results = items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect();
        Page { count, results }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { offset: 0, limit: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Matches before pagination.
    pub count: u64,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airplane::AirplaneType;

    fn airplane(type_name: &str, rows: i32, seats_in_row: i32) -> Airplane {
        Airplane {
            id: Uuid::new_v4(),
            name: format!("{} {}", type_name, rows),
            code: "X1".to_string(),
            rows,
            seats_in_row,
            airplane_type: AirplaneType { id: Uuid::new_v4(), name: type_name.to_string() },
        }
    }

    #[test]
    fn test_airplane_filter() {
        let filter = AirplaneFilter {
            airplane_type: Some("boe".to_string()),
            max_total_seats: Some(20),
        };
        assert!(filter.matches(&airplane("Boeing", 5, 4)));
        assert!(!filter.matches(&airplane("Boeing", 5, 5)));
        assert!(!filter.matches(&airplane("Airbus", 2, 2)));
        assert!(AirplaneFilter::default().matches(&airplane("Airbus", 50, 6)));
    }

    #[test]
    fn test_parse_id_list() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(parse_id_list("crew", &format!("{},{}", a, b)).unwrap(), vec![a, b]);
        assert!(parse_id_list("crew", "1,2").unwrap_err().has("crew"));
        assert!(parse_id_list("crew", "").unwrap().is_empty());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("departure_date", "2026-11-05").unwrap(),
            NaiveDate::from_ymd_opt(2026, 11, 5).unwrap()
        );
        assert!(parse_date("departure_date", "05/11/2026").is_err());
    }

    #[test]
    fn test_order_scope() {
        let owner = Uuid::new_v4();
        assert!(OrderScope::All.permits(owner));
        assert!(OrderScope::Owner(owner).permits(owner));
        assert!(!OrderScope::Owner(owner).permits(Uuid::new_v4()));
    }

    #[test]
    fn test_page_request() {
        let page = PageRequest::new(Some(2), Some(10), 20, 50).unwrap();
        assert_eq!(page, PageRequest { offset: 10, limit: 10 });

        let clamped = PageRequest::new(None, Some(1000), 20, 50).unwrap();
        assert_eq!(clamped.limit, 50);

        assert!(PageRequest::new(Some(0), None, 20, 50).is_err());
    }

    #[test]
    fn test_page_beyond_bigint_is_invalid() {
        let errors = PageRequest::new(Some(u64::MAX), Some(20), 20, 100).unwrap_err();
        assert_eq!(errors.messages("page"), ["Invalid page."]);

        let last = i64::MAX as u64 / 20 + 1;
        let page = PageRequest::new(Some(last), Some(20), 20, 100).unwrap();
        let (offset, limit) = page.bounds();
        assert!(offset >= 0);
        assert_eq!(limit, 20);
        assert!(PageRequest::new(Some(last + 1), Some(20), 20, 100).is_err());
    }

    #[test]
    fn test_slice_counts_everything() {
        let page = PageRequest { offset: 2, limit: 2 }.slice((1..=5).collect::<Vec<_>>());
        assert_eq!(page.count, 5);
        assert_eq!(page.results, vec![3, 4]);
    }
}
