//! Credentials (`usersLoginData.txt`, `coachesLogin.txt`) and the checks run
//! before an account is created.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Rejection, Result};
use crate::session::Session;
use crate::store::FlatFile;

const USER_LOGIN_FIELDS: usize = 3;
const COACH_LOGIN_FIELDS: usize = 2;

pub const INVALID_CREDENTIALS: &str = "Invalid login or password.";

/// `uuid;login;password`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRecord {
    pub uuid: String,
    pub login: String,
    pub password: String,
}

/// `login;password`. The login doubles as the coach id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoachLogin {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AccountStore {
    users: FlatFile,
    coaches: FlatFile,
}

impl AccountStore {
    pub fn new(users: FlatFile, coaches: FlatFile) -> Self {
        Self { users, coaches }
    }

    /// Lines with exactly three fields; anything else is ignored.
    pub fn user_logins(&self) -> Vec<LoginRecord> {
        self.users
            .records()
            .into_iter()
            .filter(|fields| fields.len() == USER_LOGIN_FIELDS)
            .map(|fields| LoginRecord {
                uuid: fields[0].clone(),
                login: fields[1].clone(),
                password: fields[2].clone(),
            })
            .collect()
    }

    /// Lines with exactly two fields; anything else is ignored.
    pub fn coach_logins(&self) -> Vec<CoachLogin> {
        self.coaches
            .records()
            .into_iter()
            .filter(|fields| fields.len() == COACH_LOGIN_FIELDS)
            .map(|fields| CoachLogin {
                login: fields[0].clone(),
                password: fields[1].clone(),
            })
            .collect()
    }

    pub fn login_exists(&self, login: &str) -> bool {
        self.user_logins().iter().any(|record| record.login == login)
    }

    /// First failing rule wins; the order matters for the message shown.
    pub fn validate_registration(&self, login: &str, password: &str) -> std::result::Result<(), Rejection> {
        if login.is_empty() || password.is_empty() {
            return Err(Rejection::new("Fields cannot be empty."));
        }
        if login.contains(';') || password.contains(';') {
            return Err(Rejection::new("Login or password cannot contain ';'."));
        }
        if self.login_exists(login) {
            return Err(Rejection::new("Login already exists."));
        }
        if login.contains(' ') || password.contains(' ') {
            return Err(Rejection::new("Login or password cannot contain spaces."));
        }
        Ok(())
    }

    /// Appends a login record under a fresh UUID and returns the UUID.
    /// Callers validate first.
    pub fn add_user(&self, login: &str, password: &str) -> Result<String> {
        let uuid = uuid::Uuid::new_v4().to_string();
        self.users
            .append_line(&format!("{};{};{}", uuid, login, password))?;
        tracing::info!(login, %uuid, "Registered new user");
        Ok(uuid)
    }

    /// Coach credentials are tried before user credentials.
    pub fn authenticate(&self, login: &str, password: &str) -> std::result::Result<Session, Rejection> {
        if let Some(coach) = self
            .coach_logins()
            .into_iter()
            .find(|c| c.login == login && c.password == password)
        {
            tracing::info!(coach = %coach.login, "Coach logged in");
            return Ok(Session::coach(coach.login));
        }

        if let Some(user) = self
            .user_logins()
            .into_iter()
            .find(|u| u.login == login && u.password == password)
        {
            tracing::info!(login = %user.login, "User logged in");
            return Ok(Session::user(user.uuid, user.login));
        }

        tracing::warn!(login, "Failed login attempt");
        Err(Rejection::new(INVALID_CREDENTIALS))
    }
}

pub const RECORD_TEXT_REJECTED: &str = "Name and gender cannot contain ';' or line breaks.";

/// Free text stored as a profile field must not split the record.
pub fn check_record_text(text: &str) -> std::result::Result<(), Rejection> {
    if text.contains([';', '\n', '\r']) {
        return Err(Rejection::new(RECORD_TEXT_REJECTED));
    }
    Ok(())
}

/// Profile data collected at registration, as typed by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationDetails {
    pub name: String,
    pub weight: String,
    pub height: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
}

/// Registration details after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDetails {
    pub name: String,
    pub weight: f64,
    pub height_cm: i32,
    pub age: i32,
    pub gender: String,
}

impl RegistrationDetails {
    /// Numbers are checked before presence, then the birth date must be
    /// strictly before `today`.
    pub fn validate(&self, today: NaiveDate) -> std::result::Result<ValidDetails, Rejection> {
        let numeric = || Rejection::new("Weight and Height must be numeric.");
        let weight: f64 = self.weight.trim().parse().map_err(|_| numeric())?;
        let height_cm: i32 = self.height.trim().parse().map_err(|_| numeric())?;

        let (birth_date, gender) = match (self.birth_date, self.gender.as_deref()) {
            (Some(birth_date), Some(gender)) if !self.name.is_empty() => (birth_date, gender),
            _ => return Err(Rejection::new("Fields cannot be empty.")),
        };
        check_record_text(&self.name)?;
        check_record_text(gender)?;
        if birth_date >= today {
            return Err(Rejection::new(
                "Date of Birth cannot be today or a future date.",
            ));
        }

        let age = today
            .years_since(birth_date)
            .and_then(|years| i32::try_from(years).ok())
            .unwrap_or(0);

        Ok(ValidDetails {
            name: self.name.clone(),
            weight,
            height_cm,
            age,
            gender: gender.to_string(),
        })
    }
}
