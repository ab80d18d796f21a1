use airport_core::airplane::{Airplane, AirplaneInput, AirplaneType, AirplaneTypeInput};
use airport_core::filter::{AirplaneFilter, Page, PageRequest};
use airport_core::repository::{AirplaneRepository, AirplaneTypeRepository};
use airport_core::{CoreError, CoreResult};
use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;
use crate::database::{delete_error, internal, write_error, PgStore};
use crate::rows::{self, AIRPLANE_COLUMNS, AIRPLANE_TABLES};

#[derive(sqlx::FromRow)]
struct AirplaneTypeRow {
    id: Uuid,
    name: String,
}

impl From<AirplaneTypeRow> for AirplaneType {
    fn from(row: AirplaneTypeRow) -> Self {
        AirplaneType { id: row.id, name: row.name }
    }
}

#[async_trait]
impl AirplaneTypeRepository for PgStore {
    async fn list_airplane_types(&self, page: PageRequest) -> CoreResult<Page<AirplaneType>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM airplane_types")
            .fetch_one(&self.pool)
            .await
            .map_err(internal)?;

        let rows = sqlx::query_as::<_, AirplaneTypeRow>(
            "SELECT id, name FROM airplane_types ORDER BY name, id LIMIT $1 OFFSET $2",
        )
        .bind(page.bounds().1)
        .bind(page.bounds().0)
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        Ok(Page {
            count: count as u64,
            results: rows.into_iter().map(AirplaneType::from).collect(),
        })
    }

    async fn get_airplane_type(&self, id: Uuid) -> CoreResult<Option<AirplaneType>> {
        let row = sqlx::query_as::<_, AirplaneTypeRow>("SELECT id, name FROM airplane_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        Ok(row.map(AirplaneType::from))
    }

    async fn create_airplane_type(&self, input: &AirplaneTypeInput) -> CoreResult<AirplaneType> {
        let row = sqlx::query_as::<_, AirplaneTypeRow>(
            "INSERT INTO airplane_types (id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;

        info!("Created airplane type {} ({})", row.name, row.id);
        Ok(row.into())
    }

    async fn update_airplane_type(&self, id: Uuid, input: &AirplaneTypeInput) -> CoreResult<AirplaneType> {
        let row = sqlx::query_as::<_, AirplaneTypeRow>(
            "UPDATE airplane_types SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id)
        .bind(&input.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)?;

        row.map(AirplaneType::from)
            .ok_or_else(|| CoreError::not_found("airplane type", id))
    }

    async fn delete_airplane_type(&self, id: Uuid) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM airplane_types WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error("airplane type", e))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("airplane type", id));
        }
        info!("Deleted airplane type {}", id);
        Ok(())
    }
}

fn push_airplane_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &AirplaneFilter) {
    qb.push(" WHERE TRUE");
    if let Some(type_name) = &filter.airplane_type {
        qb.push(" AND t.name ILIKE ").push_bind(rows::like_pattern(type_name));
    }
    if let Some(max) = filter.max_total_seats {
        qb.push(r#" AND a."rows"::BIGINT * a.seats_in_row <= "#).push_bind(max);
    }
}

#[async_trait]
impl AirplaneRepository for PgStore {
    async fn list_airplanes(&self, filter: &AirplaneFilter, page: PageRequest) -> CoreResult<Page<Airplane>> {
        debug!("Listing airplanes with {:?}", filter);

        let mut count_query = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", AIRPLANE_TABLES));
        push_airplane_filter(&mut count_query, filter);
        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(internal)?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM {}", AIRPLANE_COLUMNS, AIRPLANE_TABLES));
        push_airplane_filter(&mut query, filter);
        query.push(" ORDER BY a.name, a.id");
        rows::push_page(&mut query, page);

        let results = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?
            .iter()
            .map(rows::airplane)
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(Page { count: count as u64, results })
    }

    async fn get_airplane(&self, id: Uuid) -> CoreResult<Option<Airplane>> {
        let sql = format!("SELECT {} FROM {} WHERE a.id = $1", AIRPLANE_COLUMNS, AIRPLANE_TABLES);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;

        row.as_ref().map(rows::airplane).transpose().map_err(internal)
    }

    async fn create_airplane(&self, input: &AirplaneInput) -> CoreResult<Airplane> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"INSERT INTO airplanes (id, name, code, "rows", seats_in_row, airplane_type_id)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.code)
        .bind(input.rows)
        .bind(input.seats_in_row)
        .bind(input.airplane_type)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        info!("Created airplane {} ({})", input.name, id);
        self.get_airplane(id)
            .await?
            .ok_or_else(|| CoreError::not_found("airplane", id))
    }

    async fn update_airplane(&self, id: Uuid, input: &AirplaneInput) -> CoreResult<Airplane> {
        let result = sqlx::query(
            r#"UPDATE airplanes
               SET name = $2, code = $3, "rows" = $4, seats_in_row = $5, airplane_type_id = $6
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.code)
        .bind(input.rows)
        .bind(input.seats_in_row)
        .bind(input.airplane_type)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("airplane", id));
        }
        self.get_airplane(id)
            .await?
            .ok_or_else(|| CoreError::not_found("airplane", id))
    }

    async fn delete_airplane(&self, id: Uuid) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM airplanes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error("airplane", e))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("airplane", id));
        }
        info!("Deleted airplane {}", id);
        Ok(())
    }
}
