use std::collections::HashMap;
use airport_core::airplane::SeatLayout;
use airport_core::crew::Crew;
use airport_core::filter::{FlightFilter, Page, PageRequest};
use airport_core::flight::{Flight, FlightInput, Seat};
use airport_core::repository::FlightRepository;
use airport_core::{CoreError, CoreResult};
use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, Row, Transaction};
use tracing::{debug, info};
use uuid::Uuid;
use crate::database::{delete_error, internal, write_error, PgStore};
use crate::rows::{self, CREW_COLUMNS, FLIGHT_TABLES};

#[derive(sqlx::FromRow)]
struct SeatRow {
    row: i32,
    seat: i32,
}

#[derive(sqlx::FromRow)]
struct LayoutRow {
    id: Uuid,
    rows: i32,
    seats_in_row: i32,
}

fn push_flight_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &FlightFilter) {
    qb.push(" WHERE TRUE");
    if !filter.routes.is_empty() {
        qb.push(" AND f.route_id = ANY(").push_bind(filter.routes.clone()).push(")");
    }
    if !filter.airplanes.is_empty() {
        qb.push(" AND f.airplane_id = ANY(").push_bind(filter.airplanes.clone()).push(")");
    }
    if !filter.crew.is_empty() {
        qb.push(" AND EXISTS (SELECT 1 FROM flight_crew fc WHERE fc.flight_id = f.id AND fc.crew_id = ANY(")
            .push_bind(filter.crew.clone())
            .push("))");
    }
    if let Some(date) = filter.departure_date {
        qb.push(" AND (f.departure_time AT TIME ZONE 'UTC')::date = ").push_bind(date);
    }
}

impl PgStore {
    /// Fills in the crew of each flight with one query.
    async fn attach_crew(&self, flights: &mut [Flight]) -> CoreResult<()> {
        if flights.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = flights.iter().map(|f| f.id).collect();
        let sql = format!(
            "SELECT fc.flight_id, {} FROM flight_crew fc JOIN crews c ON c.id = fc.crew_id \
             WHERE fc.flight_id = ANY($1) ORDER BY c.last_name, c.first_name",
            CREW_COLUMNS
        );
        let crew_rows = sqlx::query(&sql)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;

        let mut by_flight: HashMap<Uuid, Vec<Crew>> = HashMap::new();
        for row in &crew_rows {
            let flight_id: Uuid = row.try_get("flight_id").map_err(internal)?;
            by_flight
                .entry(flight_id)
                .or_default()
                .push(rows::crew(row).map_err(internal)?);
        }
        for flight in flights.iter_mut() {
            flight.crew = by_flight.remove(&flight.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn replace_crew(tx: &mut Transaction<'_, Postgres>, flight_id: Uuid, crew: &[Uuid]) -> CoreResult<()> {
        sqlx::query("DELETE FROM flight_crew WHERE flight_id = $1")
            .bind(flight_id)
            .execute(&mut **tx)
            .await
            .map_err(internal)?;

        for crew_id in crew {
            sqlx::query("INSERT INTO flight_crew (flight_id, crew_id) VALUES ($1, $2)")
                .bind(flight_id)
                .bind(crew_id)
                .execute(&mut **tx)
                .await
                .map_err(write_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl FlightRepository for PgStore {
    async fn list_flights(&self, filter: &FlightFilter, page: PageRequest) -> CoreResult<Page<Flight>> {
        debug!("Listing flights with {:?}", filter);

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM flights f");
        push_flight_filter(&mut count_query, filter);
        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(internal)?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM {}", rows::flight_columns(), FLIGHT_TABLES));
        push_flight_filter(&mut query, filter);
        query.push(" ORDER BY f.departure_time, f.id");
        rows::push_page(&mut query, page);

        let mut results = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?
            .iter()
            .map(rows::flight)
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;
        self.attach_crew(&mut results).await?;

        Ok(Page { count: count as u64, results })
    }

    async fn get_flight(&self, id: Uuid) -> CoreResult<Option<Flight>> {
        let sql = format!("SELECT {} FROM {} WHERE f.id = $1", rows::flight_columns(), FLIGHT_TABLES);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut flights = [rows::flight(&row).map_err(internal)?];
        self.attach_crew(&mut flights).await?;
        let [flight] = flights;
        Ok(Some(flight))
    }

    async fn create_flight(&self, input: &FlightInput) -> CoreResult<Flight> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await.map_err(internal)?;

        sqlx::query(
            "INSERT INTO flights (id, route_id, airplane_id, departure_time, arrival_time) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(input.route)
        .bind(input.airplane)
        .bind(input.departure_time)
        .bind(input.arrival_time)
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;

        Self::replace_crew(&mut tx, id, &input.crew).await?;
        tx.commit().await.map_err(internal)?;

        info!("Created flight {} departing {}", id, input.departure_time);
        self.get_flight(id)
            .await?
            .ok_or_else(|| CoreError::not_found("flight", id))
    }

    async fn update_flight(&self, id: Uuid, input: &FlightInput) -> CoreResult<Flight> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        let result = sqlx::query(
            "UPDATE flights SET route_id = $2, airplane_id = $3, departure_time = $4, arrival_time = $5 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(input.route)
        .bind(input.airplane)
        .bind(input.departure_time)
        .bind(input.arrival_time)
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("flight", id));
        }
        Self::replace_crew(&mut tx, id, &input.crew).await?;
        tx.commit().await.map_err(internal)?;

        self.get_flight(id)
            .await?
            .ok_or_else(|| CoreError::not_found("flight", id))
    }

    async fn delete_flight(&self, id: Uuid) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM flights WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error("flight", e))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("flight", id));
        }
        info!("Deleted flight {}", id);
        Ok(())
    }

    async fn taken_seats(&self, flight_id: Uuid) -> CoreResult<Vec<Seat>> {
        let seats = sqlx::query_as::<_, SeatRow>(
            r#"SELECT "row", seat FROM tickets WHERE flight_id = $1 ORDER BY "row", seat"#,
        )
        .bind(flight_id)
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        Ok(seats.into_iter().map(|s| Seat { row: s.row, seat: s.seat }).collect())
    }

    async fn seat_layouts(&self, flight_ids: &[Uuid]) -> CoreResult<HashMap<Uuid, SeatLayout>> {
        let layouts = sqlx::query_as::<_, LayoutRow>(
            r#"SELECT f.id, a."rows", a.seats_in_row
               FROM flights f JOIN airplanes a ON a.id = f.airplane_id
               WHERE f.id = ANY($1)"#,
        )
        .bind(flight_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        Ok(layouts
            .into_iter()
            .map(|l| (l.id, SeatLayout { rows: l.rows, seats_in_row: l.seats_in_row }))
            .collect())
    }
}
