//! Coach/student requests.
//!
//! A (coach, student) pair is Requested while the student's UUID sits on the
//! coach's line in `coachesRequests.txt`, and Accepted once it sits on the
//! coach's line in `coachesStudents.txt`. Both files use
//! `coachId;studentUUID;studentUUID;...`.

use serde::Serialize;
use std::collections::HashSet;

use crate::error::Result;
use crate::profile::UserProfile;
use crate::store::FlatFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coach {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const KNOWN_COACHES: [Coach; 2] = [
    Coach {
        id: "c1",
        name: "José Alcántar",
        description: "Jose knows exactly what he does. He coaches people for 15 years now and is a professional team sports competitor!",
    },
    Coach {
        id: "c2",
        name: "Jorge Echevarría",
        description: "Jorge is passionate about fitness and well-being. He specializes in strength training and personalized coaching plans.",
    },
];

pub fn find_coach(id: &str) -> Option<&'static Coach> {
    KNOWN_COACHES.iter().find(|coach| coach.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Requested,
    Accepted,
    Absent,
}

/// Result of a student asking a coach for sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    Sent,
    AlreadyStudent,
    AlreadyRequested,
}

impl RequestOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            RequestOutcome::Sent => "Request sent to the coach successfully!",
            RequestOutcome::AlreadyStudent => {
                "You are already a student of this coach – you cannot request again!"
            }
            RequestOutcome::AlreadyRequested => "You have already sent a request to this coach!",
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, RequestOutcome::Sent)
    }
}

#[derive(Debug, Clone)]
pub struct CoachingStore {
    requests: FlatFile,
    students: FlatFile,
}

impl CoachingStore {
    pub fn new(requests: FlatFile, students: FlatFile) -> Self {
        Self { requests, students }
    }

    /// Pending request UUIDs for a coach, in request order.
    pub fn requests_of(&self, coach_id: &str) -> Vec<String> {
        uuids_on(&self.requests, coach_id)
    }

    /// Accepted student UUIDs for a coach, in acceptance order.
    pub fn students_of(&self, coach_id: &str) -> Vec<String> {
        uuids_on(&self.students, coach_id)
    }

    pub fn state(&self, coach_id: &str, student: &str) -> RequestState {
        if self.students_of(coach_id).iter().any(|s| s == student) {
            RequestState::Accepted
        } else if self.requests_of(coach_id).iter().any(|s| s == student) {
            RequestState::Requested
        } else {
            RequestState::Absent
        }
    }

    /// Adds the student to the coach's request line. Students already
    /// accepted or already waiting are turned away without touching a file.
    pub fn request(&self, coach_id: &str, student: &str) -> Result<RequestOutcome> {
        match self.state(coach_id, student) {
            RequestState::Accepted => return Ok(RequestOutcome::AlreadyStudent),
            RequestState::Requested => return Ok(RequestOutcome::AlreadyRequested),
            RequestState::Absent => {}
        }

        add_uuid(&self.requests, coach_id, student)?;
        tracing::info!(coach = coach_id, student, "Coaching request sent");
        Ok(RequestOutcome::Sent)
    }

    /// Moves the student from the coach's requests to their students.
    ///
    /// Two separate rewrites; a failure between them leaves the pair in
    /// neither file.
    pub fn accept(&self, coach_id: &str, student: &str) -> Result<()> {
        remove_uuid(&self.requests, coach_id, student)?;
        if !self.students_of(coach_id).iter().any(|s| s == student) {
            add_uuid(&self.students, coach_id, student)?;
        }
        tracing::info!(coach = coach_id, student, "Coaching request accepted");
        Ok(())
    }

    /// Drops the request. Returns whether the student had one pending.
    pub fn dismiss(&self, coach_id: &str, student: &str) -> Result<bool> {
        let removed = remove_uuid(&self.requests, coach_id, student)?;
        tracing::info!(coach = coach_id, student, removed, "Coaching request dismissed");
        Ok(removed)
    }
}

fn uuids_on(file: &FlatFile, coach_id: &str) -> Vec<String> {
    file.records()
        .into_iter()
        .filter(|fields| fields[0] == coach_id)
        .flat_map(|fields| fields.into_iter().skip(1))
        .filter(|uuid| !uuid.is_empty())
        .collect()
}

fn add_uuid(file: &FlatFile, coach_id: &str, uuid: &str) -> Result<()> {
    file.upsert(
        coach_id,
        1,
        |fields| format!("{};{}", fields.join(";"), uuid),
        || format!("{};{}", coach_id, uuid),
    )?;
    Ok(())
}

// Lines for other coaches pass through untouched.
fn remove_uuid(file: &FlatFile, coach_id: &str, uuid: &str) -> Result<bool> {
    let mut removed = false;
    file.update(coach_id, |fields| {
        let mut kept = vec![coach_id];
        for token in &fields[1..] {
            if *token == uuid {
                removed = true;
            } else {
                kept.push(*token);
            }
        }
        kept.join(";")
    })?;
    Ok(removed)
}

/// One row of a coach's student or request list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub uuid: String,
    pub name: String,
    pub weight: f64,
    pub height_cm: f64,
    pub age: i32,
    pub gender: String,
    pub bmi: f64,
}

impl From<&UserProfile> for RosterEntry {
    fn from(profile: &UserProfile) -> Self {
        Self {
            uuid: profile.uuid.clone(),
            name: profile.name.clone(),
            weight: profile.weight,
            height_cm: profile.height_cm,
            age: profile.age,
            gender: profile.gender.clone(),
            bmi: profile.bmi(),
        }
    }
}

/// Profiles whose UUID is in `uuids`, in profile file order. UUIDs without
/// a profile are dropped.
pub fn roster(uuids: &[String], profiles: &[UserProfile]) -> Vec<RosterEntry> {
    let wanted: HashSet<&str> = uuids.iter().map(String::as_str).collect();
    profiles
        .iter()
        .filter(|profile| wanted.contains(profile.uuid.as_str()))
        .map(RosterEntry::from)
        .collect()
}
