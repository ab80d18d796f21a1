//! Column lists for the joined queries and the decoders that read them back.
//!
//! Joined entities are selected with prefixed aliases (`source_code`,
//! `airplane_type_name`, ...) so one decoder serves every query that embeds
//! the entity.

use airport_core::airplane::{Airplane, AirplaneType};
use airport_core::airport::Airport;
use airport_core::crew::{Crew, CrewTitle};
use airport_core::filter::PageRequest;
use airport_core::flight::Flight;
use airport_core::route::Route;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};

pub(crate) const AIRPLANE_COLUMNS: &str = r#"a.id AS airplane_id, a.name AS airplane_name,
    a.code AS airplane_code, a."rows" AS airplane_rows, a.seats_in_row AS airplane_seats_in_row,
    t.id AS airplane_type_id, t.name AS airplane_type_name"#;

pub(crate) const AIRPLANE_TABLES: &str = "airplanes a JOIN airplane_types t ON t.id = a.airplane_type_id";

pub(crate) const ROUTE_TABLES: &str = "routes r \
    JOIN airports s ON s.id = r.source_id \
    JOIN airports d ON d.id = r.destination_id";

pub(crate) const FLIGHT_TABLES: &str = "flights f \
    JOIN routes r ON r.id = f.route_id \
    JOIN airports s ON s.id = r.source_id \
    JOIN airports d ON d.id = r.destination_id \
    JOIN airplanes a ON a.id = f.airplane_id \
    JOIN airplane_types t ON t.id = a.airplane_type_id";

pub(crate) const CREW_COLUMNS: &str = "c.id AS crew_id, c.first_name AS crew_first_name, \
    c.last_name AS crew_last_name, c.title AS crew_title";

pub(crate) fn airport_columns(alias: &str, prefix: &str) -> String {
    ["id", "code", "name", "city", "state", "country", "lat", "lon"]
        .iter()
        .map(|column| format!("{alias}.{column} AS {prefix}_{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn route_columns() -> String {
    format!(
        "r.id AS route_id, {}, {}",
        airport_columns("s", "source"),
        airport_columns("d", "destination")
    )
}

pub(crate) fn flight_columns() -> String {
    format!(
        "f.id AS flight_id, f.departure_time, f.arrival_time, \
         (SELECT COUNT(*) FROM tickets tk WHERE tk.flight_id = f.id) AS tickets_sold, {}, {}",
        route_columns(),
        AIRPLANE_COLUMNS
    )
}

/// `%needle%` for ILIKE, with the wildcard characters escaped.
pub(crate) fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub(crate) fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: PageRequest) {
    let (offset, limit) = page.bounds();
    qb.push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
}

pub(crate) fn airplane_type(row: &PgRow) -> Result<AirplaneType, sqlx::Error> {
    Ok(AirplaneType {
        id: row.try_get("airplane_type_id")?,
        name: row.try_get("airplane_type_name")?,
    })
}

pub(crate) fn airplane(row: &PgRow) -> Result<Airplane, sqlx::Error> {
    Ok(Airplane {
        id: row.try_get("airplane_id")?,
        name: row.try_get("airplane_name")?,
        code: row.try_get("airplane_code")?,
        rows: row.try_get("airplane_rows")?,
        seats_in_row: row.try_get("airplane_seats_in_row")?,
        airplane_type: airplane_type(row)?,
    })
}

pub(crate) fn crew(row: &PgRow) -> Result<Crew, sqlx::Error> {
    let title: String = row.try_get("crew_title")?;
    Ok(Crew {
        id: row.try_get("crew_id")?,
        first_name: row.try_get("crew_first_name")?,
        last_name: row.try_get("crew_last_name")?,
        title: title
            .parse::<CrewTitle>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?,
    })
}

pub(crate) fn airport(row: &PgRow, prefix: &str) -> Result<Airport, sqlx::Error> {
    let column = |name: &str| format!("{prefix}_{name}");
    let code: String = row.try_get(column("code").as_str())?;
    Ok(Airport {
        id: row.try_get(column("id").as_str())?,
        code: code.trim_end().to_string(),
        name: row.try_get(column("name").as_str())?,
        city: row.try_get(column("city").as_str())?,
        state: row.try_get(column("state").as_str())?,
        country: row.try_get(column("country").as_str())?,
        lat: row.try_get(column("lat").as_str())?,
        lon: row.try_get(column("lon").as_str())?,
    })
}

pub(crate) fn route(row: &PgRow) -> Result<Route, sqlx::Error> {
    Ok(Route {
        id: row.try_get("route_id")?,
        source: airport(row, "source")?,
        destination: airport(row, "destination")?,
    })
}

/// Crew is loaded by a separate query and attached by the caller.
pub(crate) fn flight(row: &PgRow) -> Result<Flight, sqlx::Error> {
    Ok(Flight {
        id: row.try_get("flight_id")?,
        route: route(row)?,
        airplane: airplane(row)?,
        crew: Vec::new(),
        departure_time: row.try_get("departure_time")?,
        arrival_time: row.try_get("arrival_time")?,
        tickets_sold: row.try_get("tickets_sold")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("AA"), "%AA%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_airport_columns_are_prefixed() {
        let columns = airport_columns("s", "source");
        assert!(columns.starts_with("s.id AS source_id, s.code AS source_code"));
        assert!(columns.ends_with("s.lon AS source_lon"));
    }
}
