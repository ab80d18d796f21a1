use std::collections::HashMap;
use airport_core::filter::{OrderScope, Page, PageRequest};
use airport_core::order::{FlightSummary, Order, Owner, Ticket, TicketInput};
use airport_core::repository::OrderRepository;
use airport_core::{CoreError, CoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use tracing::info;
use uuid::Uuid;
use crate::database::{internal, write_error, PgStore};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    owner_id: Uuid,
    owner_email: String,
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    order_id: Uuid,
    row: i32,
    seat: i32,
    flight_id: Uuid,
    source_code: String,
    destination_code: String,
    airplane_name: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Ticket {
            id: row.id,
            row: row.row,
            seat: row.seat,
            flight: FlightSummary {
                id: row.flight_id,
                route: format!("{} -> {}", row.source_code.trim_end(), row.destination_code.trim_end()),
                airplane: row.airplane_name,
                departure_time: row.departure_time,
                arrival_time: row.arrival_time,
            },
        }
    }
}

/// `None` lifts the owner restriction.
fn owner_of(scope: OrderScope) -> Option<Uuid> {
    match scope {
        OrderScope::All => None,
        OrderScope::Owner(id) => Some(id),
    }
}

const ORDER_SELECT: &str = "SELECT o.id, o.created_at, u.id AS owner_id, u.email AS owner_email \
    FROM orders o JOIN users u ON u.id = o.user_id";

impl PgStore {
    async fn with_tickets(&self, orders: Vec<OrderRow>) -> CoreResult<Vec<Order>> {
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let ticket_rows = sqlx::query_as::<_, TicketRow>(
            r#"SELECT tk.id, tk.order_id, tk."row", tk.seat, f.id AS flight_id,
                      s.code AS source_code, d.code AS destination_code, a.name AS airplane_name,
                      f.departure_time, f.arrival_time
               FROM tickets tk
               JOIN flights f ON f.id = tk.flight_id
               JOIN routes r ON r.id = f.route_id
               JOIN airports s ON s.id = r.source_id
               JOIN airports d ON d.id = r.destination_id
               JOIN airplanes a ON a.id = f.airplane_id
               WHERE tk.order_id = ANY($1)
               ORDER BY f.departure_time, tk."row", tk.seat"#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        let mut by_order: HashMap<Uuid, Vec<Ticket>> = HashMap::new();
        for row in ticket_rows {
            by_order.entry(row.order_id).or_default().push(row.into());
        }

        Ok(orders
            .into_iter()
            .map(|o| Order {
                tickets: by_order.remove(&o.id).unwrap_or_default(),
                id: o.id,
                owner: Owner { id: o.owner_id, email: o.owner_email },
                created_at: o.created_at,
            })
            .collect())
    }

    async fn insert_tickets(tx: &mut Transaction<'_, Postgres>, order_id: Uuid, tickets: &[TicketInput]) -> CoreResult<()> {
        for ticket in tickets {
            sqlx::query(r#"INSERT INTO tickets (id, order_id, flight_id, "row", seat) VALUES ($1, $2, $3, $4, $5)"#)
                .bind(Uuid::new_v4())
                .bind(order_id)
                .bind(ticket.flight)
                .bind(ticket.row)
                .bind(ticket.seat)
                .execute(&mut **tx)
                .await
                .map_err(write_error)?;
        }
        Ok(())
    }

    async fn fetch_order(&self, scope: OrderScope, id: Uuid) -> CoreResult<Order> {
        self.get_order(scope, id)
            .await?
            .ok_or_else(|| CoreError::not_found("order", id))
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn list_orders(&self, scope: OrderScope, page: PageRequest) -> CoreResult<Page<Order>> {
        let owner = owner_of(scope);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE ($1::uuid IS NULL OR user_id = $1)")
            .bind(owner)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)?;

        let sql = format!(
            "{} WHERE ($1::uuid IS NULL OR o.user_id = $1) ORDER BY o.created_at DESC, o.id LIMIT $2 OFFSET $3",
            ORDER_SELECT
        );
        let orders = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(owner)
            .bind(page.bounds().1)
            .bind(page.bounds().0)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;

        Ok(Page {
            count: count as u64,
            results: self.with_tickets(orders).await?,
        })
    }

    async fn get_order(&self, scope: OrderScope, id: Uuid) -> CoreResult<Option<Order>> {
        let sql = format!("{} WHERE o.id = $1 AND ($2::uuid IS NULL OR o.user_id = $2)", ORDER_SELECT);
        let order = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(owner_of(scope))
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;

        match order {
            Some(order) => Ok(self.with_tickets(vec![order]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create_order(&self, owner: Uuid, tickets: &[TicketInput]) -> CoreResult<Order> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await.map_err(internal)?;

        sqlx::query("INSERT INTO orders (id, user_id) VALUES ($1, $2)")
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;
        Self::insert_tickets(&mut tx, id, tickets).await?;
        tx.commit().await.map_err(internal)?;

        info!("Created order {} with {} ticket(s) for user {}", id, tickets.len(), owner);
        self.fetch_order(OrderScope::All, id).await
    }

    async fn replace_tickets(&self, scope: OrderScope, id: Uuid, tickets: &[TicketInput]) -> CoreResult<Order> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        let locked: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM orders WHERE id = $1 AND ($2::uuid IS NULL OR user_id = $2) FOR UPDATE",
        )
        .bind(id)
        .bind(owner_of(scope))
        .fetch_optional(&mut *tx)
        .await
        .map_err(internal)?;
        if locked.is_none() {
            return Err(CoreError::not_found("order", id));
        }

        sqlx::query("DELETE FROM tickets WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(internal)?;
        Self::insert_tickets(&mut tx, id, tickets).await?;
        tx.commit().await.map_err(internal)?;

        info!("Replaced tickets of order {}", id);
        self.fetch_order(scope, id).await
    }

    async fn delete_order(&self, scope: OrderScope, id: Uuid) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND ($2::uuid IS NULL OR user_id = $2)")
            .bind(id)
            .bind(owner_of(scope))
            .execute(&self.pool)
            .await
            .map_err(internal)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("order", id));
        }
        info!("Deleted order {} and its tickets", id);
        Ok(())
    }
}
