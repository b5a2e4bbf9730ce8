//! Who may do what to a task.
//!
//! Pure functions of the caller's identity and the task's owner; callers
//! must establish that the task exists before asking, so a missing task is
//! reported as not-found regardless of who asks.

use tracing::warn;
use uuid::Uuid;

use crate::{auth::claims::Identity, error::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    CreateOwn,
    UpdateOwn,
    ToggleComplete,
    ToggleImportant,
    Delete,
}

impl Action {
    /// Ownership alone is not enough for these.
    pub fn admin_only(self) -> bool {
        matches!(self, Action::ToggleImportant | Action::Delete)
    }
}

pub fn can_act(actor: &Identity, owner_id: Uuid, action: Action) -> bool {
    match action {
        Action::Read | Action::CreateOwn => true,
        Action::UpdateOwn | Action::ToggleComplete => actor.is_admin || actor.id == owner_id,
        Action::ToggleImportant | Action::Delete => actor.is_admin,
    }
}

pub fn authorize(actor: &Identity, owner_id: Uuid, action: Action) -> Result<(), AppError> {
    if can_act(actor, owner_id, action) {
        return Ok(());
    }
    warn!(actor = %actor.id, owner = %owner_id, ?action, "action denied");
    let message = if action.admin_only() {
        "Access denied: Admins only"
    } else {
        "Not authorized"
    };
    Err(AppError::Forbidden(message.into()))
}
