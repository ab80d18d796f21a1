use std::collections::HashMap;
use async_trait::async_trait;
use uuid::Uuid;
use crate::airplane::{Airplane, AirplaneInput, AirplaneType, AirplaneTypeInput, SeatLayout};
use crate::airport::{Airport, AirportInput};
use crate::crew::{Crew, CrewInput};
use crate::filter::{
    AirplaneFilter, AirportFilter, CrewFilter, FlightFilter, OrderScope, Page, PageRequest, RouteFilter,
};
use crate::flight::{Flight, FlightInput, Seat};
use crate::order::{Order, TicketInput};
use crate::route::{Route, RouteInput};
use crate::user::{NewUser, User, UserChanges};
use crate::CoreResult;

// Inputs reaching a repository have already been validated. Referential and
// uniqueness rules are enforced by the store and surface as
// `CoreError::Validation` (writes) or `CoreError::Conflict` (deletes).
// Updating or deleting a missing row yields `CoreError::NotFound`.

#[async_trait]
pub trait AirplaneTypeRepository: Send + Sync {
    async fn list_airplane_types(&self, page: PageRequest) -> CoreResult<Page<AirplaneType>>;

    async fn get_airplane_type(&self, id: Uuid) -> CoreResult<Option<AirplaneType>>;

    async fn create_airplane_type(&self, input: &AirplaneTypeInput) -> CoreResult<AirplaneType>;

    async fn update_airplane_type(&self, id: Uuid, input: &AirplaneTypeInput) -> CoreResult<AirplaneType>;

    async fn delete_airplane_type(&self, id: Uuid) -> CoreResult<()>;
}

#[async_trait]
pub trait AirplaneRepository: Send + Sync {
    async fn list_airplanes(&self, filter: &AirplaneFilter, page: PageRequest) -> CoreResult<Page<Airplane>>;

    async fn get_airplane(&self, id: Uuid) -> CoreResult<Option<Airplane>>;

    async fn create_airplane(&self, input: &AirplaneInput) -> CoreResult<Airplane>;

    async fn update_airplane(&self, id: Uuid, input: &AirplaneInput) -> CoreResult<Airplane>;

    async fn delete_airplane(&self, id: Uuid) -> CoreResult<()>;
}

#[async_trait]
pub trait CrewRepository: Send + Sync {
    async fn list_crews(&self, filter: &CrewFilter, page: PageRequest) -> CoreResult<Page<Crew>>;

    async fn get_crew(&self, id: Uuid) -> CoreResult<Option<Crew>>;

    /// Members among `ids` that exist.
    async fn find_crews(&self, ids: &[Uuid]) -> CoreResult<Vec<Crew>>;

    async fn create_crew(&self, input: &CrewInput) -> CoreResult<Crew>;

    async fn update_crew(&self, id: Uuid, input: &CrewInput) -> CoreResult<Crew>;

    async fn delete_crew(&self, id: Uuid) -> CoreResult<()>;
}

#[async_trait]
pub trait AirportRepository: Send + Sync {
    async fn list_airports(&self, filter: &AirportFilter, page: PageRequest) -> CoreResult<Page<Airport>>;

    async fn get_airport(&self, id: Uuid) -> CoreResult<Option<Airport>>;

    async fn create_airport(&self, input: &AirportInput) -> CoreResult<Airport>;

    async fn update_airport(&self, id: Uuid, input: &AirportInput) -> CoreResult<Airport>;

    async fn delete_airport(&self, id: Uuid) -> CoreResult<()>;
}

#[async_trait]
pub trait RouteRepository: Send + Sync {
    async fn list_routes(&self, filter: &RouteFilter, page: PageRequest) -> CoreResult<Page<Route>>;

    async fn get_route(&self, id: Uuid) -> CoreResult<Option<Route>>;

    async fn create_route(&self, input: &RouteInput) -> CoreResult<Route>;

    async fn update_route(&self, id: Uuid, input: &RouteInput) -> CoreResult<Route>;

    async fn delete_route(&self, id: Uuid) -> CoreResult<()>;
}

#[async_trait]
pub trait FlightRepository: Send + Sync {
    /// Flights come back with `tickets_sold` aggregated.
    async fn list_flights(&self, filter: &FlightFilter, page: PageRequest) -> CoreResult<Page<Flight>>;

    async fn get_flight(&self, id: Uuid) -> CoreResult<Option<Flight>>;

    async fn create_flight(&self, input: &FlightInput) -> CoreResult<Flight>;

    async fn update_flight(&self, id: Uuid, input: &FlightInput) -> CoreResult<Flight>;

    async fn delete_flight(&self, id: Uuid) -> CoreResult<()>;

    /// Occupied seats, ordered by row then seat.
    async fn taken_seats(&self, flight_id: Uuid) -> CoreResult<Vec<Seat>>;

    /// Cabin layouts of the given flights that exist.
    async fn seat_layouts(&self, flight_ids: &[Uuid]) -> CoreResult<HashMap<Uuid, SeatLayout>>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Newest first.
    async fn list_orders(&self, scope: OrderScope, page: PageRequest) -> CoreResult<Page<Order>>;

    /// Orders outside `scope` are reported as missing.
    async fn get_order(&self, scope: OrderScope, id: Uuid) -> CoreResult<Option<Order>>;

    /// Creates the order and its tickets atomically.
    async fn create_order(&self, owner: Uuid, tickets: &[TicketInput]) -> CoreResult<Order>;

    /// Swaps the ticket set of an order atomically.
    async fn replace_tickets(&self, scope: OrderScope, id: Uuid, tickets: &[TicketInput]) -> CoreResult<Order>;

    /// Deletes the order together with its tickets.
    async fn delete_order(&self, scope: OrderScope, id: Uuid) -> CoreResult<()>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list_users(&self, page: PageRequest) -> CoreResult<Page<User>>;

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>>;

    async fn create_user(&self, user: &NewUser) -> CoreResult<User>;

    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> CoreResult<User>;
}

/// Everything the HTTP layer needs from storage.
pub trait Store:
    AirplaneTypeRepository
    + AirplaneRepository
    + CrewRepository
    + AirportRepository
    + RouteRepository
    + FlightRepository
    + OrderRepository
    + UserRepository
{
}

impl<T> Store for T where
    T: AirplaneTypeRepository
        + AirplaneRepository
        + CrewRepository
        + AirportRepository
        + RouteRepository
        + FlightRepository
        + OrderRepository
        + UserRepository
{
}
