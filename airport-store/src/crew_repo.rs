use airport_core::crew::{Crew, CrewInput};
use airport_core::filter::{CrewFilter, Page, PageRequest};
use airport_core::repository::CrewRepository;
use airport_core::{CoreError, CoreResult};
use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;
use crate::database::{delete_error, internal, write_error, PgStore};
use crate::rows::{self, CREW_COLUMNS};

fn push_crew_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &CrewFilter) {
    qb.push(" WHERE TRUE");
    for (column, value) in [
        ("c.first_name", &filter.first_name),
        ("c.last_name", &filter.last_name),
        ("c.title", &filter.title),
    ] {
        if let Some(value) = value {
            qb.push(format!(" AND {} ILIKE ", column))
                .push_bind(rows::like_pattern(value));
        }
    }
}

#[async_trait]
impl CrewRepository for PgStore {
    async fn list_crews(&self, filter: &CrewFilter, page: PageRequest) -> CoreResult<Page<Crew>> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM crews c");
        push_crew_filter(&mut count_query, filter);
        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(internal)?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM crews c", CREW_COLUMNS));
        push_crew_filter(&mut query, filter);
        query.push(" ORDER BY c.last_name, c.first_name, c.id");
        rows::push_page(&mut query, page);

        let results = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?
            .iter()
            .map(rows::crew)
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(Page { count: count as u64, results })
    }

    async fn get_crew(&self, id: Uuid) -> CoreResult<Option<Crew>> {
        Ok(self.find_crews(&[id]).await?.into_iter().next())
    }

    async fn find_crews(&self, ids: &[Uuid]) -> CoreResult<Vec<Crew>> {
        let sql = format!("SELECT {} FROM crews c WHERE c.id = ANY($1) ORDER BY c.last_name, c.first_name", CREW_COLUMNS);
        sqlx::query(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?
            .iter()
            .map(rows::crew)
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)
    }

    async fn create_crew(&self, input: &CrewInput) -> CoreResult<Crew> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO crews (id, first_name, last_name, title) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(input.title.as_str())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        info!("Created crew member {} {} ({})", input.first_name, input.last_name, id);
        Ok(Crew {
            id,
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            title: input.title,
        })
    }

    async fn update_crew(&self, id: Uuid, input: &CrewInput) -> CoreResult<Crew> {
        let result = sqlx::query("UPDATE crews SET first_name = $2, last_name = $3, title = $4 WHERE id = $1")
            .bind(id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(input.title.as_str())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("crew", id));
        }
        Ok(Crew {
            id,
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            title: input.title,
        })
    }

    async fn delete_crew(&self, id: Uuid) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM crews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error("crew member", e))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("crew", id));
        }
        info!("Deleted crew member {}", id);
        Ok(())
    }
}
