use talentmatch_core::UserId;

/// Authenticated caller for a request.
///
/// Immutable and present on all protected routes; run ownership is scoped by
/// this identity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CallerContext {
    user_id: UserId,
}

impl CallerContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}
