use crate::auth::token::Identity;
use crate::error::AppError;

/// A post or comment may be changed by its owner or by an admin.
pub fn can_modify(actor: &Identity, owner_id: i64) -> bool {
    actor.user_id == owner_id || actor.is_admin()
}

pub fn ensure_can_modify(actor: &Identity, owner_id: i64) -> Result<(), AppError> {
    if can_modify(actor, owner_id) {
        Ok(())
    } else {
        tracing::debug!(
            "User {} denied modification of resource owned by {}",
            actor.user_id,
            owner_id
        );
        Err(AppError::Forbidden)
    }
}
