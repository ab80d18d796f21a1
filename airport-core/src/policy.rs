//! Static access rules: who may do what to which collection, and which
//! response shape they get back.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;
use crate::filter::OrderScope;
use crate::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    AirplaneTypes,
    Airplanes,
    Crews,
    Airports,
    Routes,
    Flights,
    Orders,
    Users,
    CurrentUser,
}

impl Resource {
    /// Reference data that anonymous callers may browse.
    fn is_public(self) -> bool {
        matches!(self, Resource::Airports | Resource::Routes | Resource::Flights)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
}

impl Action {
    /// Maps an HTTP method to an action. `has_id` tells collection requests
    /// (`/flights`) from item requests (`/flights/{id}`).
    pub fn resolve(method: &str, has_id: bool) -> Option<Action> {
        match (method.to_ascii_uppercase().as_str(), has_id) {
            ("GET" | "HEAD", false) => Some(Action::List),
            ("GET" | "HEAD", true) => Some(Action::Retrieve),
            ("POST", false) => Some(Action::Create),
            ("PUT", true) => Some(Action::Update),
            ("PATCH", true) => Some(Action::PartialUpdate),
            ("DELETE", true) => Some(Action::Destroy),
            _ => None,
        }
    }

    pub fn is_read(self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Anonymous,
    Customer,
    Staff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("Authentication credentials were not provided.")]
    Unauthenticated,
    #[error("You do not have permission to perform this action.")]
    Forbidden,
}

/// Which serializer variant a response uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    List,
    Detail,
    Write,
    StaffList,
    StaffDetail,
}

pub fn authorize(resource: Resource, action: Action, role: Role) -> Result<(), Denial> {
    use Denial::*;

    match (resource, role) {
        (Resource::CurrentUser, Role::Anonymous) => Err(Unauthenticated),
        (Resource::CurrentUser, _) => match action {
            Action::Retrieve | Action::Update | Action::PartialUpdate => Ok(()),
            _ => Err(Forbidden),
        },

        (_, Role::Staff) => Ok(()),

        (Resource::Users, Role::Anonymous) if action == Action::Create => Ok(()),
        (Resource::Users, Role::Anonymous) => Err(Unauthenticated),
        (Resource::Users, Role::Customer) => Err(Forbidden),

        (Resource::Orders, Role::Anonymous) => Err(Unauthenticated),
        (Resource::Orders, Role::Customer) => Ok(()),

        (r, Role::Anonymous) if r.is_public() && action.is_read() => Ok(()),
        (_, Role::Anonymous) => Err(Unauthenticated),

        (_, Role::Customer) if action.is_read() => Ok(()),
        (_, Role::Customer) => Err(Forbidden),
    }
}

pub fn shape(resource: Resource, action: Action, role: Role) -> Shape {
    let staff_orders = resource == Resource::Orders && role == Role::Staff;
    match action {
        Action::List if staff_orders => Shape::StaffList,
        Action::List => Shape::List,
        Action::Retrieve if staff_orders => Shape::StaffDetail,
        Action::Retrieve => Shape::Detail,
        Action::Create | Action::Update | Action::PartialUpdate | Action::Destroy => Shape::Write,
    }
}

/// Who a request acts for.
#[derive(Debug, Clone, Default)]
pub enum Caller {
    #[default]
    Anonymous,
    Authenticated(User),
}

impl Caller {
    pub fn role(&self) -> Role {
        match self {
            Caller::Anonymous => Role::Anonymous,
            Caller::Authenticated(user) if user.is_staff => Role::Staff,
            Caller::Authenticated(_) => Role::Customer,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Caller::Anonymous => None,
            Caller::Authenticated(user) => Some(user),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user().map(|u| u.id)
    }

    /// Orders this caller may see. Anonymous callers get an empty owner scope
    /// but never reach order queries.
    pub fn order_scope(&self) -> OrderScope {
        match self {
            Caller::Authenticated(user) if user.is_staff => OrderScope::All,
            Caller::Authenticated(user) => OrderScope::Owner(user.id),
            Caller::Anonymous => OrderScope::Owner(Uuid::nil()),
        }
    }

    pub fn authorize(&self, resource: Resource, action: Action) -> Result<(), Denial> {
        authorize(resource, action, self.role())
    }

    pub fn shape(&self, resource: Resource, action: Action) -> Shape {
        shape(resource, action, self.role())
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caller::Anonymous => f.write_str("anonymous"),
            Caller::Authenticated(user) => f.write_str(&user.email),
        }
    }
}
