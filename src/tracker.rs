//! The workflows behind every screen: one [`Tracker`] per data directory,
//! with the caller's [`Session`] passed into each operation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::accounts::{check_record_text, AccountStore, RegistrationDetails};
use crate::activity::{new_activity_id, Activity, TrainingForm};
use crate::codec::{format_timestamp, parse_double};
use crate::coaching::{find_coach, roster, CoachingStore, RequestOutcome, RequestState, RosterEntry};
use crate::config::AppConfig;
use crate::error::{Rejection, Result, TrackerError};
use crate::profile::{ProfileStore, UserProfile, WeightEntry, WeightStore};
use crate::session::Session;
use crate::store::FlatFile;
use crate::training::TrainingStore;
use crate::user::StandardUser;

/// Profile fields a user may change. Weight and height that do not parse
/// keep their previous values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileEdit {
    pub name: String,
    pub weight: String,
    pub height: String,
}

#[derive(Debug, Clone)]
pub struct Tracker {
    accounts: AccountStore,
    profiles: ProfileStore,
    weights: WeightStore,
    training: TrainingStore,
    coaching: CoachingStore,
}

impl Tracker {
    pub fn new(config: &AppConfig) -> Self {
        let file = |name: &str| FlatFile::new(config.path_for(name)).with_atomic_writes(config.atomic_writes);

        Self {
            accounts: AccountStore::new(file(&config.users_login_file), file(&config.coaches_login_file)),
            profiles: ProfileStore::new(file(&config.users_data_file)),
            weights: WeightStore::new(file(&config.weights_data_file)),
            training: TrainingStore::new(file(&config.training_data_file), config.training_encoding),
            coaching: CoachingStore::new(
                file(&config.coaches_requests_file),
                file(&config.coaches_students_file),
            ),
        }
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn authenticate(&self, login: &str, password: &str) -> Result<Session> {
        Ok(self.accounts.authenticate(login, password)?)
    }

    /// Validates credentials and details, then writes the login record and
    /// the profile. Nothing is written if any check fails.
    pub fn register(
        &self,
        login: &str,
        password: &str,
        details: &RegistrationDetails,
        now: NaiveDateTime,
    ) -> Result<Session> {
        self.accounts.validate_registration(login, password)?;
        let valid = details.validate(now.date())?;

        let uuid = self.accounts.add_user(login, password)?;
        let created = format_timestamp(&now);
        self.profiles.append(&UserProfile {
            uuid: uuid.clone(),
            name: valid.name,
            weight: valid.weight,
            height_cm: f64::from(valid.height_cm),
            age: valid.age,
            gender: valid.gender,
            account_creation_date: created.clone(),
            current_weight_date: created,
        })?;

        Ok(Session::user(uuid, login))
    }

    pub fn profile(&self, session: &Session) -> Result<UserProfile> {
        let uuid = session.require_user()?;
        self.profiles
            .load(uuid)
            .ok_or_else(|| TrackerError::NotFound(format!("profile for {}", uuid)))
    }

    pub fn activities(&self, session: &Session) -> Result<Vec<Activity>> {
        let uuid = session.require_user()?;
        Ok(self.training.activities(uuid))
    }

    /// Profile, weight history and activities assembled into one user.
    pub fn standard_user(&self, session: &Session) -> Result<StandardUser> {
        let profile = self.profile(session)?;
        let history = self
            .weights
            .history(&profile.uuid)
            .into_iter()
            .map(|entry| entry.weight)
            .collect();
        let activities = self.training.activities(&profile.uuid);
        Ok(profile.into_standard_user(history, activities))
    }

    /// Derives the activity from the form and the user's current weight,
    /// then saves it.
    pub fn log_workout(&self, session: &Session, form: TrainingForm) -> Result<Activity> {
        let uuid = session.require_user()?;
        let weight = self.profiles.weight_of(uuid);
        let activity = form.into_activity(new_activity_id(), weight)?;
        self.training.append(uuid, &activity)?;
        Ok(activity)
    }

    /// Applies the edit, stamps a new current-weight date and records the
    /// weight in the history. Blank fields keep their stored values.
    pub fn update_profile(
        &self,
        session: &Session,
        edit: &ProfileEdit,
        now: NaiveDateTime,
    ) -> Result<UserProfile> {
        let uuid = session.require_user()?;
        let stamp = format_timestamp(&now);

        let mut profile = self.profiles.load(uuid).unwrap_or_else(|| {
            tracing::warn!(uuid, "No profile on record; starting a new one");
            UserProfile {
                uuid: uuid.to_string(),
                name: String::new(),
                weight: 0.0,
                height_cm: 0.0,
                age: 0,
                gender: String::new(),
                account_creation_date: stamp.clone(),
                current_weight_date: stamp.clone(),
            }
        });

        let name = edit.name.trim();
        if !name.is_empty() {
            check_record_text(name)?;
            profile.name = name.to_string();
        }
        if let Some(weight) = parse_double(&edit.weight) {
            profile.weight = weight;
        }
        if let Some(height) = parse_double(&edit.height) {
            profile.height_cm = height;
        }
        profile.current_weight_date = stamp.clone();

        self.profiles.upsert(&profile)?;
        self.weights.record(uuid, &stamp, profile.weight)?;
        Ok(profile)
    }

    pub fn weight_history(&self, session: &Session) -> Result<Vec<WeightEntry>> {
        let uuid = session.require_user()?;
        Ok(self.weights.history(uuid))
    }

    pub fn request_coach(&self, session: &Session, coach_id: &str) -> Result<RequestOutcome> {
        let uuid = session.require_user()?;
        if find_coach(coach_id).is_none() {
            return Err(Rejection::new(format!("Unknown coach: {}", coach_id)).into());
        }
        self.coaching.request(coach_id, uuid)
    }

    pub fn pending_requests(&self, session: &Session) -> Result<Vec<RosterEntry>> {
        let coach_id = session.require_coach()?;
        let uuids = self.coaching.requests_of(coach_id);
        Ok(roster(&uuids, &self.profiles.all()))
    }

    pub fn students(&self, session: &Session) -> Result<Vec<RosterEntry>> {
        let coach_id = session.require_coach()?;
        let uuids = self.coaching.students_of(coach_id);
        Ok(roster(&uuids, &self.profiles.all()))
    }

    /// Only students with a pending request (or already accepted) can be
    /// accepted.
    pub fn accept(&self, session: &Session, student: &str) -> Result<()> {
        let coach_id = session.require_coach()?;
        if self.coaching.state(coach_id, student) == RequestState::Absent {
            return Err(Rejection::new("No pending request from this student.").into());
        }
        self.coaching.accept(coach_id, student)
    }

    pub fn dismiss(&self, session: &Session, student: &str) -> Result<bool> {
        let coach_id = session.require_coach()?;
        self.coaching.dismiss(coach_id, student)
    }
}
