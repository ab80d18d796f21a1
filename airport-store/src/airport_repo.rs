use airport_core::airport::{Airport, AirportInput};
use airport_core::filter::{AirportFilter, Page, PageRequest};
use airport_core::repository::AirportRepository;
use airport_core::{CoreError, CoreResult};
use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;
use crate::database::{delete_error, internal, write_error, PgStore};
use crate::rows;

fn push_airport_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &AirportFilter) {
    qb.push(" WHERE TRUE");
    for (column, value) in [
        ("p.code", &filter.code),
        ("p.name", &filter.name),
        ("p.city", &filter.city),
        ("p.country", &filter.country),
    ] {
        if let Some(value) = value {
            qb.push(format!(" AND {} ILIKE ", column))
                .push_bind(rows::like_pattern(value));
        }
    }
}

impl PgStore {
    async fn write_airport(&self, sql: &str, id: Uuid, input: &AirportInput) -> CoreResult<Option<Airport>> {
        let sql = format!("{} RETURNING {}", sql, rows::airport_columns("airports", "airport"));
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.city)
            .bind(&input.state)
            .bind(input.country())
            .bind(input.lat)
            .bind(input.lon)
            .fetch_optional(&self.pool)
            .await
            .map_err(write_error)?;

        row.as_ref()
            .map(|row| rows::airport(row, "airport"))
            .transpose()
            .map_err(internal)
    }
}

#[async_trait]
impl AirportRepository for PgStore {
    async fn list_airports(&self, filter: &AirportFilter, page: PageRequest) -> CoreResult<Page<Airport>> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM airports p");
        push_airport_filter(&mut count_query, filter);
        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(internal)?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM airports p",
            rows::airport_columns("p", "airport")
        ));
        push_airport_filter(&mut query, filter);
        query.push(" ORDER BY p.code");
        rows::push_page(&mut query, page);

        let results = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?
            .iter()
            .map(|row| rows::airport(row, "airport"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(Page { count: count as u64, results })
    }

    async fn get_airport(&self, id: Uuid) -> CoreResult<Option<Airport>> {
        let sql = format!("SELECT {} FROM airports p WHERE p.id = $1", rows::airport_columns("p", "airport"));
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;

        row.as_ref()
            .map(|row| rows::airport(row, "airport"))
            .transpose()
            .map_err(internal)
    }

    async fn create_airport(&self, input: &AirportInput) -> CoreResult<Airport> {
        let airport = self
            .write_airport(
                "INSERT INTO airports (id, code, name, city, state, country, lat, lon) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                Uuid::new_v4(),
                input,
            )
            .await?
            .ok_or_else(|| CoreError::Internal("insert returned no row".to_string()))?;

        info!("Created airport {} ({})", airport.code, airport.id);
        Ok(airport)
    }

    async fn update_airport(&self, id: Uuid, input: &AirportInput) -> CoreResult<Airport> {
        self.write_airport(
            "UPDATE airports SET code = $2, name = $3, city = $4, state = $5, country = $6, \
             lat = $7, lon = $8 WHERE id = $1",
            id,
            input,
        )
        .await?
        .ok_or_else(|| CoreError::not_found("airport", id))
    }

    async fn delete_airport(&self, id: Uuid) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM airports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error("airport", e))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("airport", id));
        }
        info!("Deleted airport {}", id);
        Ok(())
    }
}
