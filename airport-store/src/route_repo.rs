use airport_core::filter::{Page, PageRequest, RouteFilter};
use airport_core::repository::RouteRepository;
use airport_core::route::{Route, RouteInput};
use airport_core::{CoreError, CoreResult};
use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;
use crate::database::{delete_error, internal, write_error, PgStore};
use crate::rows::{self, ROUTE_TABLES};

fn push_route_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &RouteFilter) {
    qb.push(" WHERE TRUE");
    if let Some(source) = &filter.source {
        qb.push(" AND s.code ILIKE ").push_bind(rows::like_pattern(source));
    }
    if let Some(destination) = &filter.destination {
        qb.push(" AND d.code ILIKE ").push_bind(rows::like_pattern(destination));
    }
}

#[async_trait]
impl RouteRepository for PgStore {
    async fn list_routes(&self, filter: &RouteFilter, page: PageRequest) -> CoreResult<Page<Route>> {
        let mut count_query = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", ROUTE_TABLES));
        push_route_filter(&mut count_query, filter);
        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(internal)?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM {}", rows::route_columns(), ROUTE_TABLES));
        push_route_filter(&mut query, filter);
        query.push(" ORDER BY s.code, d.code, r.id");
        rows::push_page(&mut query, page);

        let results = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?
            .iter()
            .map(rows::route)
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(Page { count: count as u64, results })
    }

    async fn get_route(&self, id: Uuid) -> CoreResult<Option<Route>> {
        let sql = format!("SELECT {} FROM {} WHERE r.id = $1", rows::route_columns(), ROUTE_TABLES);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;

        row.as_ref().map(rows::route).transpose().map_err(internal)
    }

    async fn create_route(&self, input: &RouteInput) -> CoreResult<Route> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO routes (id, source_id, destination_id) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(input.source)
            .bind(input.destination)
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        let route = self
            .get_route(id)
            .await?
            .ok_or_else(|| CoreError::not_found("route", id))?;
        info!("Created route {} ({})", route.code_label(), id);
        Ok(route)
    }

    async fn update_route(&self, id: Uuid, input: &RouteInput) -> CoreResult<Route> {
        let result = sqlx::query("UPDATE routes SET source_id = $2, destination_id = $3 WHERE id = $1")
            .bind(id)
            .bind(input.source)
            .bind(input.destination)
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("route", id));
        }
        self.get_route(id)
            .await?
            .ok_or_else(|| CoreError::not_found("route", id))
    }

    async fn delete_route(&self, id: Uuid) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM routes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error("route", e))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("route", id));
        }
        info!("Deleted route {}", id);
        Ok(())
    }
}
