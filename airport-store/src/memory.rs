//! In-process store used when no database is configured and by the tests.
//!
//! Every table sits behind one `RwLock`; writers check the same unique,
//! foreign key and check constraints as the SQL schema while holding the
//! write guard, so concurrent bookings of one seat still conflict.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use airport_core::airplane::{Airplane, AirplaneInput, AirplaneType, AirplaneTypeInput, SeatLayout};
use airport_core::airport::{Airport, AirportInput};
use airport_core::crew::{Crew, CrewInput};
use airport_core::filter::{
    AirplaneFilter, AirportFilter, CrewFilter, FlightFilter, OrderScope, Page, PageRequest, RouteFilter,
};
use airport_core::flight::{Flight, FlightInput, Seat};
use airport_core::order::{FlightSummary, Order, Owner, Ticket, TicketInput};
use airport_core::repository::{
    AirplaneRepository, AirplaneTypeRepository, AirportRepository, CrewRepository, FlightRepository,
    OrderRepository, RouteRepository, UserRepository,
};
use airport_core::route::{Route, RouteInput};
use airport_core::user::{NewUser, User, UserChanges};
use airport_core::{CoreError, CoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;
use crate::constraints::{self, *};

#[derive(Debug, Clone)]
struct AirplaneRecord {
    name: String,
    code: String,
    rows: i32,
    seats_in_row: i32,
    airplane_type: Uuid,
}

#[derive(Debug, Clone, Copy)]
struct RouteRecord {
    source: Uuid,
    destination: Uuid,
}

#[derive(Debug, Clone)]
struct FlightRecord {
    route: Uuid,
    airplane: Uuid,
    crew: Vec<Uuid>,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct OrderRecord {
    owner: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct TicketRecord {
    order: Uuid,
    flight: Uuid,
    row: i32,
    seat: i32,
}

#[derive(Debug, Default)]
struct Tables {
    airplane_types: HashMap<Uuid, AirplaneType>,
    airplanes: HashMap<Uuid, AirplaneRecord>,
    crews: HashMap<Uuid, Crew>,
    airports: HashMap<Uuid, Airport>,
    routes: HashMap<Uuid, RouteRecord>,
    flights: HashMap<Uuid, FlightRecord>,
    users: HashMap<Uuid, User>,
    orders: HashMap<Uuid, OrderRecord>,
    tickets: HashMap<Uuid, TicketRecord>,
}

impl Tables {
    fn airplane(&self, id: Uuid) -> Option<Airplane> {
        let record = self.airplanes.get(&id)?;
        Some(Airplane {
            id,
            name: record.name.clone(),
            code: record.code.clone(),
            rows: record.rows,
            seats_in_row: record.seats_in_row,
            airplane_type: self.airplane_types.get(&record.airplane_type)?.clone(),
        })
    }

    fn route(&self, id: Uuid) -> Option<Route> {
        let record = self.routes.get(&id)?;
        Some(Route {
            id,
            source: self.airports.get(&record.source)?.clone(),
            destination: self.airports.get(&record.destination)?.clone(),
        })
    }

    fn flight(&self, id: Uuid) -> Option<Flight> {
        let record = self.flights.get(&id)?;
        let mut crew: Vec<Crew> = record
            .crew
            .iter()
            .filter_map(|c| self.crews.get(c).cloned())
            .collect();
        crew.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));

        Some(Flight {
            id,
            route: self.route(record.route)?,
            airplane: self.airplane(record.airplane)?,
            crew,
            departure_time: record.departure_time,
            arrival_time: record.arrival_time,
            tickets_sold: self.tickets.values().filter(|t| t.flight == id).count() as i64,
        })
    }

    fn order(&self, id: Uuid) -> Option<Order> {
        let record = self.orders.get(&id)?;
        let owner = self.users.get(&record.owner)?;

        let mut tickets: Vec<(DateTime<Utc>, Ticket)> = self
            .tickets
            .iter()
            .filter(|(_, t)| t.order == id)
            .filter_map(|(ticket_id, t)| {
                let flight = self.flights.get(&t.flight)?;
                let route = self.route(flight.route)?;
                let airplane = self.airplanes.get(&flight.airplane)?;
                Some((
                    flight.departure_time,
                    Ticket {
                        id: *ticket_id,
                        row: t.row,
                        seat: t.seat,
                        flight: FlightSummary {
                            id: t.flight,
                            route: route.code_label(),
                            airplane: airplane.name.clone(),
                            departure_time: flight.departure_time,
                            arrival_time: flight.arrival_time,
                        },
                    },
                ))
            })
            .collect();
        tickets.sort_by_key(|(departure, t)| (*departure, t.row, t.seat));

        Some(Order {
            id,
            owner: Owner { id: owner.id, email: owner.email.clone() },
            created_at: record.created_at,
            tickets: tickets.into_iter().map(|(_, t)| t).collect(),
        })
    }

    fn check_airplane(&self, id: Option<Uuid>, input: &AirplaneInput) -> CoreResult<()> {
        for (other, airplane) in &self.airplanes {
            if Some(*other) == id {
                continue;
            }
            if airplane.name == input.name {
                return Err(constraints::unique_violation(UQ_AIRPLANES_NAME));
            }
            if airplane.code == input.code {
                return Err(constraints::unique_violation(UQ_AIRPLANES_CODE));
            }
        }
        if !self.airplane_types.contains_key(&input.airplane_type) {
            return Err(constraints::missing_reference(FK_AIRPLANES_AIRPLANE_TYPE, input.airplane_type));
        }
        Ok(())
    }

    fn check_airport(&self, id: Option<Uuid>, input: &AirportInput) -> CoreResult<()> {
        if self
            .airports
            .iter()
            .any(|(other, a)| Some(*other) != id && a.code == input.code)
        {
            return Err(constraints::unique_violation(UQ_AIRPORTS_CODE));
        }
        Ok(())
    }

    fn check_route(&self, input: &RouteInput) -> CoreResult<()> {
        if !self.airports.contains_key(&input.source) {
            return Err(constraints::missing_reference(FK_ROUTES_SOURCE, input.source));
        }
        if !self.airports.contains_key(&input.destination) {
            return Err(constraints::missing_reference(FK_ROUTES_DESTINATION, input.destination));
        }
        if input.source == input.destination {
            return Err(constraints::check_violation(CK_ROUTES_DISTINCT_AIRPORTS));
        }
        Ok(())
    }

    fn check_flight(&self, input: &FlightInput) -> CoreResult<()> {
        if !self.routes.contains_key(&input.route) {
            return Err(constraints::missing_reference(FK_FLIGHTS_ROUTE, input.route));
        }
        if !self.airplanes.contains_key(&input.airplane) {
            return Err(constraints::missing_reference(FK_FLIGHTS_AIRPLANE, input.airplane));
        }
        if let Some(crew) = input.crew.iter().find(|c| !self.crews.contains_key(c)) {
            return Err(constraints::missing_reference(FK_FLIGHT_CREW_CREW, crew));
        }
        if input.arrival_time < input.departure_time {
            return Err(constraints::check_violation(CK_FLIGHTS_SCHEDULE));
        }
        Ok(())
    }

    /// Checks a ticket batch as if the tickets of `replacing` were gone.
    fn check_tickets(&self, replacing: Option<Uuid>, tickets: &[TicketInput]) -> CoreResult<()> {
        let mut taken: HashSet<(Uuid, i32, i32)> = self
            .tickets
            .values()
            .filter(|t| Some(t.order) != replacing)
            .map(|t| (t.flight, t.row, t.seat))
            .collect();

        for ticket in tickets {
            if !self.flights.contains_key(&ticket.flight) {
                return Err(constraints::missing_reference(FK_TICKETS_FLIGHT, ticket.flight));
            }
            if !taken.insert((ticket.flight, ticket.row, ticket.seat)) {
                return Err(constraints::unique_violation(UQ_TICKETS_FLIGHT_ROW_SEAT));
            }
        }
        Ok(())
    }

    fn insert_tickets(&mut self, order: Uuid, tickets: &[TicketInput]) {
        for ticket in tickets {
            self.tickets.insert(
                Uuid::new_v4(),
                TicketRecord { order, flight: ticket.flight, row: ticket.row, seat: ticket.seat },
            );
        }
    }
}

/// Sorts, filters and pages assembled entities.
fn page_of<T>(mut items: Vec<T>, page: PageRequest, order: impl FnMut(&T, &T) -> std::cmp::Ordering) -> Page<T> {
    items.sort_by(order);
    page.slice(items)
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AirplaneTypeRepository for MemoryStore {
    async fn list_airplane_types(&self, page: PageRequest) -> CoreResult<Page<AirplaneType>> {
        let tables = self.tables.read().await;
        let items: Vec<AirplaneType> = tables.airplane_types.values().cloned().collect();
        Ok(page_of(items, page, |a, b| (&a.name, a.id).cmp(&(&b.name, b.id))))
    }

    async fn get_airplane_type(&self, id: Uuid) -> CoreResult<Option<AirplaneType>> {
        Ok(self.tables.read().await.airplane_types.get(&id).cloned())
    }

    async fn create_airplane_type(&self, input: &AirplaneTypeInput) -> CoreResult<AirplaneType> {
        let airplane_type = AirplaneType { id: Uuid::new_v4(), name: input.name.clone() };
        self.tables
            .write()
            .await
            .airplane_types
            .insert(airplane_type.id, airplane_type.clone());
        info!("Created airplane type {} ({})", airplane_type.name, airplane_type.id);
        Ok(airplane_type)
    }

    async fn update_airplane_type(&self, id: Uuid, input: &AirplaneTypeInput) -> CoreResult<AirplaneType> {
        let mut tables = self.tables.write().await;
        let airplane_type = tables
            .airplane_types
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("airplane type", id))?;
        airplane_type.name = input.name.clone();
        Ok(airplane_type.clone())
    }

    async fn delete_airplane_type(&self, id: Uuid) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.airplane_types.contains_key(&id) {
            return Err(CoreError::not_found("airplane type", id));
        }
        if tables.airplanes.values().any(|a| a.airplane_type == id) {
            return Err(constraints::still_referenced("airplane type", FK_AIRPLANES_AIRPLANE_TYPE));
        }
        tables.airplane_types.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl AirplaneRepository for MemoryStore {
    async fn list_airplanes(&self, filter: &AirplaneFilter, page: PageRequest) -> CoreResult<Page<Airplane>> {
        let tables = self.tables.read().await;
        let items: Vec<Airplane> = tables
            .airplanes
            .keys()
            .filter_map(|id| tables.airplane(*id))
            .filter(|a| filter.matches(a))
            .collect();
        Ok(page_of(items, page, |a, b| (&a.name, a.id).cmp(&(&b.name, b.id))))
    }

    async fn get_airplane(&self, id: Uuid) -> CoreResult<Option<Airplane>> {
        Ok(self.tables.read().await.airplane(id))
    }

    async fn create_airplane(&self, input: &AirplaneInput) -> CoreResult<Airplane> {
        let mut tables = self.tables.write().await;
        tables.check_airplane(None, input)?;

        let id = Uuid::new_v4();
        tables.airplanes.insert(
            id,
            AirplaneRecord {
                name: input.name.clone(),
                code: input.code.clone(),
                rows: input.rows,
                seats_in_row: input.seats_in_row,
                airplane_type: input.airplane_type,
            },
        );
        info!("Created airplane {} ({})", input.name, id);
        tables.airplane(id).ok_or_else(|| CoreError::not_found("airplane", id))
    }

    async fn update_airplane(&self, id: Uuid, input: &AirplaneInput) -> CoreResult<Airplane> {
        let mut tables = self.tables.write().await;
        if !tables.airplanes.contains_key(&id) {
            return Err(CoreError::not_found("airplane", id));
        }
        tables.check_airplane(Some(id), input)?;

        tables.airplanes.insert(
            id,
            AirplaneRecord {
                name: input.name.clone(),
                code: input.code.clone(),
                rows: input.rows,
                seats_in_row: input.seats_in_row,
                airplane_type: input.airplane_type,
            },
        );
        tables.airplane(id).ok_or_else(|| CoreError::not_found("airplane", id))
    }

    async fn delete_airplane(&self, id: Uuid) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.airplanes.contains_key(&id) {
            return Err(CoreError::not_found("airplane", id));
        }
        if tables.flights.values().any(|f| f.airplane == id) {
            return Err(constraints::still_referenced("airplane", FK_FLIGHTS_AIRPLANE));
        }
        tables.airplanes.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl CrewRepository for MemoryStore {
    async fn list_crews(&self, filter: &CrewFilter, page: PageRequest) -> CoreResult<Page<Crew>> {
        let tables = self.tables.read().await;
        let items: Vec<Crew> = tables.crews.values().filter(|c| filter.matches(c)).cloned().collect();
        Ok(page_of(items, page, |a, b| {
            (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
        }))
    }

    async fn get_crew(&self, id: Uuid) -> CoreResult<Option<Crew>> {
        Ok(self.tables.read().await.crews.get(&id).cloned())
    }

    async fn find_crews(&self, ids: &[Uuid]) -> CoreResult<Vec<Crew>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.crews.get(id).cloned()).collect())
    }

    async fn create_crew(&self, input: &CrewInput) -> CoreResult<Crew> {
        let crew = Crew {
            id: Uuid::new_v4(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            title: input.title,
        };
        self.tables.write().await.crews.insert(crew.id, crew.clone());
        info!("Created crew member {} ({})", crew, crew.id);
        Ok(crew)
    }

    async fn update_crew(&self, id: Uuid, input: &CrewInput) -> CoreResult<Crew> {
        let mut tables = self.tables.write().await;
        let crew = tables.crews.get_mut(&id).ok_or_else(|| CoreError::not_found("crew", id))?;
        crew.first_name = input.first_name.clone();
        crew.last_name = input.last_name.clone();
        crew.title = input.title;
        Ok(crew.clone())
    }

    async fn delete_crew(&self, id: Uuid) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.crews.contains_key(&id) {
            return Err(CoreError::not_found("crew", id));
        }
        if tables.flights.values().any(|f| f.crew.contains(&id)) {
            return Err(constraints::still_referenced("crew member", FK_FLIGHT_CREW_CREW));
        }
        tables.crews.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl AirportRepository for MemoryStore {
    async fn list_airports(&self, filter: &AirportFilter, page: PageRequest) -> CoreResult<Page<Airport>> {
        let tables = self.tables.read().await;
        let items: Vec<Airport> = tables.airports.values().filter(|a| filter.matches(a)).cloned().collect();
        Ok(page_of(items, page, |a, b| a.code.cmp(&b.code)))
    }

    async fn get_airport(&self, id: Uuid) -> CoreResult<Option<Airport>> {
        Ok(self.tables.read().await.airports.get(&id).cloned())
    }

    async fn create_airport(&self, input: &AirportInput) -> CoreResult<Airport> {
        let mut tables = self.tables.write().await;
        tables.check_airport(None, input)?;

        let airport = airport_from(Uuid::new_v4(), input);
        tables.airports.insert(airport.id, airport.clone());
        info!("Created airport {} ({})", airport.code, airport.id);
        Ok(airport)
    }

    async fn update_airport(&self, id: Uuid, input: &AirportInput) -> CoreResult<Airport> {
        let mut tables = self.tables.write().await;
        if !tables.airports.contains_key(&id) {
            return Err(CoreError::not_found("airport", id));
        }
        tables.check_airport(Some(id), input)?;

        let airport = airport_from(id, input);
        tables.airports.insert(id, airport.clone());
        Ok(airport)
    }

    async fn delete_airport(&self, id: Uuid) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.airports.contains_key(&id) {
            return Err(CoreError::not_found("airport", id));
        }
        if let Some(route) = tables
            .routes
            .values()
            .find(|r| r.source == id || r.destination == id)
        {
            let constraint = if route.source == id { FK_ROUTES_SOURCE } else { FK_ROUTES_DESTINATION };
            return Err(constraints::still_referenced("airport", constraint));
        }
        tables.airports.remove(&id);
        Ok(())
    }
}

fn airport_from(id: Uuid, input: &AirportInput) -> Airport {
    Airport {
        id,
        code: input.code.clone(),
        name: input.name.clone(),
        city: input.city.clone(),
        state: input.state.clone(),
        country: input.country().to_string(),
        lat: input.lat,
        lon: input.lon,
    }
}

#[async_trait]
impl RouteRepository for MemoryStore {
    async fn list_routes(&self, filter: &RouteFilter, page: PageRequest) -> CoreResult<Page<Route>> {
        let tables = self.tables.read().await;
        let items: Vec<Route> = tables
            .routes
            .keys()
            .filter_map(|id| tables.route(*id))
            .filter(|r| filter.matches(r))
            .collect();
        Ok(page_of(items, page, |a, b| {
            (&a.source.code, &a.destination.code, a.id).cmp(&(&b.source.code, &b.destination.code, b.id))
        }))
    }

    async fn get_route(&self, id: Uuid) -> CoreResult<Option<Route>> {
        Ok(self.tables.read().await.route(id))
    }

    async fn create_route(&self, input: &RouteInput) -> CoreResult<Route> {
        let mut tables = self.tables.write().await;
        tables.check_route(input)?;

        let id = Uuid::new_v4();
        tables.routes.insert(id, RouteRecord { source: input.source, destination: input.destination });
        let route = tables.route(id).ok_or_else(|| CoreError::not_found("route", id))?;
        info!("Created route {} ({})", route.code_label(), id);
        Ok(route)
    }

    async fn update_route(&self, id: Uuid, input: &RouteInput) -> CoreResult<Route> {
        let mut tables = self.tables.write().await;
        if !tables.routes.contains_key(&id) {
            return Err(CoreError::not_found("route", id));
        }
        tables.check_route(input)?;

        tables.routes.insert(id, RouteRecord { source: input.source, destination: input.destination });
        tables.route(id).ok_or_else(|| CoreError::not_found("route", id))
    }

    async fn delete_route(&self, id: Uuid) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.routes.contains_key(&id) {
            return Err(CoreError::not_found("route", id));
        }
        if tables.flights.values().any(|f| f.route == id) {
            return Err(constraints::still_referenced("route", FK_FLIGHTS_ROUTE));
        }
        tables.routes.remove(&id);
        Ok(())
    }
}

fn flight_record(input: &FlightInput) -> FlightRecord {
    FlightRecord {
        route: input.route,
        airplane: input.airplane,
        crew: input.crew.clone(),
        departure_time: input.departure_time,
        arrival_time: input.arrival_time,
    }
}

#[async_trait]
impl FlightRepository for MemoryStore {
    async fn list_flights(&self, filter: &FlightFilter, page: PageRequest) -> CoreResult<Page<Flight>> {
        debug!("Listing flights with {:?}", filter);
        let tables = self.tables.read().await;
        let items: Vec<Flight> = tables
            .flights
            .keys()
            .filter_map(|id| tables.flight(*id))
            .filter(|f| filter.matches(f))
            .collect();
        Ok(page_of(items, page, |a, b| (a.departure_time, a.id).cmp(&(b.departure_time, b.id))))
    }

    async fn get_flight(&self, id: Uuid) -> CoreResult<Option<Flight>> {
        Ok(self.tables.read().await.flight(id))
    }

    async fn create_flight(&self, input: &FlightInput) -> CoreResult<Flight> {
        let mut tables = self.tables.write().await;
        tables.check_flight(input)?;

        let id = Uuid::new_v4();
        tables.flights.insert(id, flight_record(input));
        info!("Created flight {} departing {}", id, input.departure_time);
        tables.flight(id).ok_or_else(|| CoreError::not_found("flight", id))
    }

    async fn update_flight(&self, id: Uuid, input: &FlightInput) -> CoreResult<Flight> {
        let mut tables = self.tables.write().await;
        if !tables.flights.contains_key(&id) {
            return Err(CoreError::not_found("flight", id));
        }
        tables.check_flight(input)?;

        tables.flights.insert(id, flight_record(input));
        tables.flight(id).ok_or_else(|| CoreError::not_found("flight", id))
    }

    async fn delete_flight(&self, id: Uuid) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.flights.contains_key(&id) {
            return Err(CoreError::not_found("flight", id));
        }
        if tables.tickets.values().any(|t| t.flight == id) {
            return Err(constraints::still_referenced("flight", FK_TICKETS_FLIGHT));
        }
        tables.flights.remove(&id);
        Ok(())
    }

    async fn taken_seats(&self, flight_id: Uuid) -> CoreResult<Vec<Seat>> {
        let tables = self.tables.read().await;
        let mut seats: Vec<Seat> = tables
            .tickets
            .values()
            .filter(|t| t.flight == flight_id)
            .map(|t| Seat { row: t.row, seat: t.seat })
            .collect();
        seats.sort();
        Ok(seats)
    }

    async fn seat_layouts(&self, flight_ids: &[Uuid]) -> CoreResult<HashMap<Uuid, SeatLayout>> {
        let tables = self.tables.read().await;
        Ok(flight_ids
            .iter()
            .filter_map(|id| {
                let flight = tables.flights.get(id)?;
                let airplane = tables.airplanes.get(&flight.airplane)?;
                Some((*id, SeatLayout { rows: airplane.rows, seats_in_row: airplane.seats_in_row }))
            })
            .collect())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn list_orders(&self, scope: OrderScope, page: PageRequest) -> CoreResult<Page<Order>> {
        let tables = self.tables.read().await;
        let items: Vec<Order> = tables
            .orders
            .iter()
            .filter(|(_, o)| scope.permits(o.owner))
            .filter_map(|(id, _)| tables.order(*id))
            .collect();
        Ok(page_of(items, page, |a, b| (b.created_at, a.id).cmp(&(a.created_at, b.id))))
    }

    async fn get_order(&self, scope: OrderScope, id: Uuid) -> CoreResult<Option<Order>> {
        let tables = self.tables.read().await;
        match tables.orders.get(&id) {
            Some(record) if scope.permits(record.owner) => Ok(tables.order(id)),
            _ => Ok(None),
        }
    }

    async fn create_order(&self, owner: Uuid, tickets: &[TicketInput]) -> CoreResult<Order> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&owner) {
            return Err(constraints::missing_reference(FK_ORDERS_USER, owner));
        }
        tables.check_tickets(None, tickets)?;

        let id = Uuid::new_v4();
        tables.orders.insert(id, OrderRecord { owner, created_at: Utc::now() });
        tables.insert_tickets(id, tickets);
        info!("Created order {} with {} ticket(s) for user {}", id, tickets.len(), owner);
        tables.order(id).ok_or_else(|| CoreError::not_found("order", id))
    }

    async fn replace_tickets(&self, scope: OrderScope, id: Uuid, tickets: &[TicketInput]) -> CoreResult<Order> {
        let mut tables = self.tables.write().await;
        match tables.orders.get(&id) {
            Some(record) if scope.permits(record.owner) => {}
            _ => return Err(CoreError::not_found("order", id)),
        }
        tables.check_tickets(Some(id), tickets)?;

        tables.tickets.retain(|_, t| t.order != id);
        tables.insert_tickets(id, tickets);
        info!("Replaced tickets of order {}", id);
        tables.order(id).ok_or_else(|| CoreError::not_found("order", id))
    }

    async fn delete_order(&self, scope: OrderScope, id: Uuid) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.orders.get(&id) {
            Some(record) if scope.permits(record.owner) => {}
            _ => return Err(CoreError::not_found("order", id)),
        }
        tables.orders.remove(&id);
        tables.tickets.retain(|_, t| t.order != id);
        info!("Deleted order {} and its tickets", id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn list_users(&self, page: PageRequest) -> CoreResult<Page<User>> {
        let tables = self.tables.read().await;
        let items: Vec<User> = tables.users.values().cloned().collect();
        Ok(page_of(items, page, |a, b| a.email.cmp(&b.email)))
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: &NewUser) -> CoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(constraints::unique_violation(UQ_USERS_EMAIL));
        }

        let created = User {
            id: Uuid::new_v4(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            is_staff: user.is_staff,
        };
        tables.users.insert(created.id, created.clone());
        info!("Created user {} (staff: {})", created.email, created.is_staff);
        Ok(created)
    }

    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> CoreResult<User> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &changes.email {
            if tables.users.iter().any(|(other, u)| *other != id && &u.email == email) {
                return Err(constraints::unique_violation(UQ_USERS_EMAIL));
            }
        }

        let user = tables.users.get_mut(&id).ok_or_else(|| CoreError::not_found("user", id))?;
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(hash) = &changes.password_hash {
            user.password_hash = hash.clone();
        }
        if let Some(is_staff) = changes.is_staff {
            user.is_staff = is_staff;
        }
        Ok(user.clone())
    }
}
