use critique::identity::{Actor, Identity, Role};
use critique::permissions::{Action, Decision, ResourceKind, evaluate};
use uuid::Uuid;

// --- Test Utilities ---

fn actor_with(role: Role) -> Actor {
    actor_as(Uuid::new_v4(), role)
}

fn actor_as(id: Uuid, role: Role) -> Actor {
    Actor::Authenticated(Identity {
        id,
        username: "critic".to_string(),
        role,
    })
}

const CATALOG: [ResourceKind; 3] = [
    ResourceKind::Category,
    ResourceKind::Genre,
    ResourceKind::Title,
];

const WRITES: [Action; 3] = [Action::Create, Action::Update, Action::Delete];

// --- Identity & Role Model ---

#[test]
fn role_order_is_total() {
    assert!(Role::User < Role::Moderator);
    assert!(Role::Moderator < Role::Admin);
    assert!(Role::Admin < Role::Superuser);
}

#[test]
fn anonymous_actor_is_unauthenticated_and_roleless() {
    let anon = Actor::Anonymous;
    assert!(!anon.is_authenticated());
    assert!(!anon.role_at_least(Role::User));
    assert_eq!(anon.id(), None);
}

#[test]
fn superuser_passes_every_role_check() {
    let root = actor_with(Role::Superuser);
    for wanted in [Role::User, Role::Moderator, Role::Admin, Role::Superuser] {
        assert!(root.role_at_least(wanted), "superuser must dominate {wanted:?}");
    }
}

#[test]
fn moderator_is_not_admin() {
    let moderator = actor_with(Role::Moderator);
    assert!(moderator.role_at_least(Role::User));
    assert!(moderator.role_at_least(Role::Moderator));
    assert!(!moderator.role_at_least(Role::Admin));
}

// --- Catalog Rules (Category / Genre / Title) ---

#[test]
fn anonymous_can_read_catalog() {
    for kind in CATALOG {
        for action in [Action::List, Action::Retrieve] {
            assert_eq!(
                evaluate(&Actor::Anonymous, action, kind, None),
                Decision::Allow,
                "safe {action:?} on {kind:?} must be open"
            );
        }
    }
}

#[test]
fn anonymous_cannot_write_catalog() {
    for kind in CATALOG {
        for action in WRITES {
            assert_eq!(
                evaluate(&Actor::Anonymous, action, kind, None),
                Decision::Deny,
                "{action:?} on {kind:?} must be denied anonymously"
            );
        }
    }
}

#[test]
fn catalog_writes_require_admin() {
    for kind in CATALOG {
        for action in WRITES {
            assert_eq!(evaluate(&actor_with(Role::User), action, kind, None), Decision::Deny);
            assert_eq!(
                evaluate(&actor_with(Role::Moderator), action, kind, None),
                Decision::Deny
            );
            assert_eq!(
                evaluate(&actor_with(Role::Admin), action, kind, None),
                Decision::Allow
            );
            assert_eq!(
                evaluate(&actor_with(Role::Superuser), action, kind, None),
                Decision::Allow
            );
        }
    }
}

// --- Review / Comment Rules ---

#[test]
fn anyone_can_read_reviews_and_comments() {
    for kind in [ResourceKind::Review, ResourceKind::Comment] {
        assert_eq!(
            evaluate(&Actor::Anonymous, Action::List, kind, None),
            Decision::Allow
        );
        assert_eq!(
            evaluate(&Actor::Anonymous, Action::Retrieve, kind, None),
            Decision::Allow
        );
    }
}

#[test]
fn review_create_requires_authentication_only() {
    assert_eq!(
        evaluate(&Actor::Anonymous, Action::Create, ResourceKind::Review, None),
        Decision::Deny
    );
    assert_eq!(
        evaluate(&actor_with(Role::User), Action::Create, ResourceKind::Review, None),
        Decision::Allow
    );
}

#[test]
fn plain_user_cannot_touch_foreign_review() {
    let owner = Uuid::new_v4();
    let stranger = actor_with(Role::User);
    assert_eq!(
        evaluate(&stranger, Action::Update, ResourceKind::Review, Some(owner)),
        Decision::Deny
    );
    assert_eq!(
        evaluate(&stranger, Action::Delete, ResourceKind::Review, Some(owner)),
        Decision::Deny
    );
}

#[test]
fn author_can_update_own_review() {
    let author_id = Uuid::new_v4();
    let author = actor_as(author_id, Role::User);
    assert_eq!(
        evaluate(&author, Action::Update, ResourceKind::Review, Some(author_id)),
        Decision::Allow
    );
    assert_eq!(
        evaluate(&author, Action::Delete, ResourceKind::Review, Some(author_id)),
        Decision::Allow
    );
}

#[test]
fn moderator_can_moderate_foreign_review_and_comment() {
    let owner = Uuid::new_v4();
    let moderator = actor_with(Role::Moderator);
    for kind in [ResourceKind::Review, ResourceKind::Comment] {
        assert_eq!(
            evaluate(&moderator, Action::Update, kind, Some(owner)),
            Decision::Allow
        );
        assert_eq!(
            evaluate(&moderator, Action::Delete, kind, Some(owner)),
            Decision::Allow
        );
    }
}

#[test]
fn update_with_unknown_owner_still_requires_moderator() {
    // When the caller could not resolve the author, a plain user is denied
    // and a moderator passes.
    assert_eq!(
        evaluate(&actor_with(Role::User), Action::Update, ResourceKind::Review, None),
        Decision::Deny
    );
    assert_eq!(
        evaluate(&actor_with(Role::Moderator), Action::Update, ResourceKind::Review, None),
        Decision::Allow
    );
}

// --- User & Me Rules ---

#[test]
fn user_management_requires_admin() {
    for action in [Action::List, Action::Retrieve, Action::Create, Action::Update, Action::Delete]
    {
        assert_eq!(
            evaluate(&actor_with(Role::User), action, ResourceKind::User, None),
            Decision::Deny
        );
        assert_eq!(
            evaluate(&actor_with(Role::Moderator), action, ResourceKind::User, None),
            Decision::Deny
        );
        assert_eq!(
            evaluate(&actor_with(Role::Admin), action, ResourceKind::User, None),
            Decision::Allow
        );
    }
}

#[test]
fn me_surface_requires_only_authentication() {
    assert_eq!(
        evaluate(&Actor::Anonymous, Action::Retrieve, ResourceKind::Me, None),
        Decision::Deny
    );
    assert_eq!(
        evaluate(&actor_with(Role::User), Action::Update, ResourceKind::Me, None),
        Decision::Allow
    );
}

// --- Purity ---

#[test]
fn evaluate_is_idempotent() {
    let owner = Uuid::new_v4();
    let actor = actor_with(Role::User);
    let first = evaluate(&actor, Action::Update, ResourceKind::Review, Some(owner));
    let second = evaluate(&actor, Action::Update, ResourceKind::Review, Some(owner));
    assert_eq!(first, second);
}
