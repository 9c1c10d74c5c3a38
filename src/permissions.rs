use uuid::Uuid;

use crate::error::ApiError;
use crate::identity::{Actor, Role};

/// Action
///
/// The request intents the evaluator distinguishes. `List` and `Retrieve` are
/// the safe methods: they never mutate state and are therefore exempt from
/// most checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

impl Action {
    /// A safe method is a read-only action (list/retrieve).
    pub fn is_safe(self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }
}

/// ResourceKind
///
/// The resource families the evaluator rules over. `Me` is the self-service
/// sub-surface of `User`: same records, different privilege rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Category,
    Genre,
    Title,
    Review,
    Comment,
    User,
    Me,
}

/// Decision
///
/// The evaluator's verdict. `Deny` means the actor is known but lacks
/// privilege; a missing resource is a separate NotFound condition raised by
/// the lookup path, never by this module (403 vs 404 stays unambiguous).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

fn allow_if(condition: bool) -> Decision {
    if condition { Decision::Allow } else { Decision::Deny }
}

/// evaluate
///
/// The single permission predicate for the whole API. Pure function over the
/// supplied actor snapshot; holds no state between calls. `owner` is the
/// author id of the existing resource for object-level checks (review/comment
/// update and delete) and is ignored everywhere else.
///
/// Rules, first match wins:
/// 1. Safe methods on Category/Genre/Title are open to everyone.
/// 2. Writes on Category/Genre/Title require at least `admin`.
/// 3. Review/Comment: safe methods open; create requires authentication;
///    update/delete require authorship or at least `moderator`.
/// 4. The User management surface requires at least `admin`.
/// 5. The `Me` self-service surface requires only authentication and is
///    scoped by the caller to the actor's own record.
pub fn evaluate(
    actor: &Actor,
    action: Action,
    kind: ResourceKind,
    owner: Option<Uuid>,
) -> Decision {
    match kind {
        ResourceKind::Category | ResourceKind::Genre | ResourceKind::Title => {
            if action.is_safe() {
                return Decision::Allow;
            }
            allow_if(actor.role_at_least(Role::Admin))
        }
        ResourceKind::Review | ResourceKind::Comment => {
            if action.is_safe() {
                return Decision::Allow;
            }
            match action {
                Action::Create => allow_if(actor.is_authenticated()),
                _ => allow_if(
                    (owner.is_some() && actor.id() == owner)
                        || actor.role_at_least(Role::Moderator),
                ),
            }
        }
        ResourceKind::User => allow_if(actor.role_at_least(Role::Admin)),
        ResourceKind::Me => allow_if(actor.is_authenticated()),
    }
}

/// authorize
///
/// Convenience wrapper for handlers: maps `Deny` to `ApiError::PermissionDenied`
/// (403). Handlers must resolve the resource first so that a missing resource
/// surfaces as 404 before any privilege question is asked.
pub fn authorize(
    actor: &Actor,
    action: Action,
    kind: ResourceKind,
    owner: Option<Uuid>,
) -> Result<(), ApiError> {
    match evaluate(actor, action, kind, owner) {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(ApiError::PermissionDenied),
    }
}
