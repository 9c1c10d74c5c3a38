use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// Role
///
/// The privilege tiers recognised by the permission layer, as a single ordered
/// enumeration. The declaration order is load-bearing: `PartialOrd`/`Ord` are
/// derived from it, and every privilege comparison in the application goes
/// through [`Actor::role_at_least`], so `user < moderator < admin < superuser`
/// is expressed exactly once. `Superuser` sits at the top of the order and
/// therefore dominates every check.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    TS,
    ToSchema,
    sqlx::Type,
    Default,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
    Superuser,
}

/// Identity
///
/// The resolved snapshot of an authenticated user, produced by the `AuthUser`
/// extractor (token verification plus a database role lookup). The permission
/// and validation layers only ever see this snapshot; they never touch the
/// store themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

/// Actor
///
/// The entity issuing a request: either an anonymous client or an
/// authenticated user. Handlers build an `Actor` from the request context and
/// hand it to the permission evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    Authenticated(Identity),
}

impl Actor {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::Authenticated(_))
    }

    /// True if the actor's role is at least `wanted` in the privilege order.
    /// Pure predicate over the snapshot; anonymous actors hold no role.
    pub fn role_at_least(&self, wanted: Role) -> bool {
        match self {
            Actor::Anonymous => false,
            Actor::Authenticated(identity) => identity.role >= wanted,
        }
    }

    /// The actor's user id, if authenticated.
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated(identity) => Some(identity.id),
        }
    }
}
