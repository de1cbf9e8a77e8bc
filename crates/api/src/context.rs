use stockroom_auth::{Actor, Role};
use stockroom_core::ActorId;

/// Authenticated caller for a request.
///
/// Inserted by the auth middleware; must be present for all inventory routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor: Actor,
}

impl ActorContext {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn actor_id(&self) -> ActorId {
        self.actor.actor_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.actor.roles
    }
}
