use serde::Serialize;

use crate::error::Rejection;

/// Who is logged in for the duration of one interaction.
///
/// Created by a successful login or registration and passed to every
/// operation that needs an identity; dropping it is logging out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Session {
    User { uuid: String, login: String },
    Coach { coach_id: String },
}

impl Session {
    pub fn user(uuid: impl Into<String>, login: impl Into<String>) -> Self {
        Session::User {
            uuid: uuid.into(),
            login: login.into(),
        }
    }

    pub fn coach(coach_id: impl Into<String>) -> Self {
        Session::Coach {
            coach_id: coach_id.into(),
        }
    }

    pub fn user_uuid(&self) -> Option<&str> {
        match self {
            Session::User { uuid, .. } => Some(uuid),
            Session::Coach { .. } => None,
        }
    }

    pub fn coach_id(&self) -> Option<&str> {
        match self {
            Session::Coach { coach_id } => Some(coach_id),
            Session::User { .. } => None,
        }
    }

    pub fn require_user(&self) -> Result<&str, Rejection> {
        self.user_uuid()
            .ok_or_else(|| Rejection::new("Error: Unable to determine the logged-in user."))
    }

    pub fn require_coach(&self) -> Result<&str, Rejection> {
        self.coach_id()
            .ok_or_else(|| Rejection::new("Error: Unable to determine the logged-in coach."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_exclusive() {
        let user = Session::user("u1", "alice");
        assert_eq!(user.require_user(), Ok("u1"));
        assert!(user.require_coach().is_err());

        let coach = Session::coach("c1");
        assert_eq!(coach.require_coach(), Ok("c1"));
        assert_eq!(
            coach.require_user().unwrap_err().message,
            "Error: Unable to determine the logged-in user."
        );
    }
}
