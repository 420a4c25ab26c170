//! User profile records (`usersData.txt`) and weight history
//! (`weightsData.txt`).

use serde::{Deserialize, Serialize};

use crate::activity::Activity;
use crate::codec::{format_double, parse_double};
use crate::error::Result;
use crate::store::{FlatFile, Upsert};
use crate::user::{calculate_bmi, StandardUser};

pub const PROFILE_FIELDS: usize = 8;

/// `uuid;name;weight;height;age;gender;accountCreationDate;currentWeightDate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uuid: String,
    pub name: String,
    /// Kilograms.
    pub weight: f64,
    /// Centimetres, unlike [`StandardUser::height`].
    pub height_cm: f64,
    pub age: i32,
    pub gender: String,
    pub account_creation_date: String,
    pub current_weight_date: String,
}

impl UserProfile {
    /// Parses a record. Fewer than eight fields is not a profile; bad
    /// numbers become zero.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Option<Self> {
        if fields.len() < PROFILE_FIELDS {
            return None;
        }
        let field = |i: usize| fields[i].as_ref();
        let uuid = field(0);

        let weight = parse_double(field(2)).unwrap_or_else(|| {
            tracing::warn!(uuid, value = field(2), "Invalid weight format in file");
            0.0
        });
        let height_cm = parse_double(field(3)).unwrap_or_else(|| {
            tracing::warn!(uuid, value = field(3), "Invalid height format in file");
            0.0
        });
        let age = field(4).trim().parse::<i32>().unwrap_or_else(|_| {
            tracing::warn!(uuid, value = field(4), "Invalid age format in file");
            0
        });

        Some(Self {
            uuid: uuid.to_string(),
            name: field(1).to_string(),
            weight,
            height_cm,
            age,
            gender: field(5).to_string(),
            account_creation_date: field(6).to_string(),
            current_weight_date: field(7).to_string(),
        })
    }

    pub fn to_record(&self) -> String {
        [
            self.uuid.clone(),
            self.name.clone(),
            format_double(self.weight),
            format_double(self.height_cm),
            self.age.to_string(),
            self.gender.clone(),
            self.account_creation_date.clone(),
            self.current_weight_date.clone(),
        ]
        .join(";")
    }

    pub fn height_m(&self) -> f64 {
        self.height_cm / 100.0
    }

    pub fn bmi(&self) -> f64 {
        calculate_bmi(self.weight, self.height_m())
    }

    pub fn into_standard_user(
        self,
        weight_history: Vec<f64>,
        activities: Vec<Activity>,
    ) -> StandardUser {
        StandardUser {
            height: self.height_m(),
            id: self.uuid,
            name: self.name,
            weight: self.weight,
            age: self.age,
            gender: self.gender,
            weight_history,
            activities,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    file: FlatFile,
}

impl ProfileStore {
    pub fn new(file: FlatFile) -> Self {
        Self { file }
    }

    pub fn load(&self, uuid: &str) -> Option<UserProfile> {
        self.file
            .find(uuid, PROFILE_FIELDS)
            .and_then(|fields| UserProfile::from_fields(&fields))
    }

    /// Every well-formed profile in file order.
    pub fn all(&self) -> Vec<UserProfile> {
        self.file
            .records()
            .iter()
            .filter_map(|fields| UserProfile::from_fields(fields))
            .collect()
    }

    /// Current weight, 0.0 when the user or the value is missing.
    pub fn weight_of(&self, uuid: &str) -> f64 {
        match self.file.find(uuid, 3) {
            Some(fields) => parse_double(&fields[2]).unwrap_or_else(|| {
                tracing::warn!(uuid, "Invalid weight format in file");
                0.0
            }),
            None => {
                tracing::warn!(uuid, "No weight on record");
                0.0
            }
        }
    }

    pub fn append(&self, profile: &UserProfile) -> Result<()> {
        self.file.append_line(&profile.to_record())
    }

    /// Replaces the user's line, or appends one if the user has none.
    pub fn upsert(&self, profile: &UserProfile) -> Result<Upsert> {
        let record = profile.to_record();
        let outcome = self.file.upsert(
            &profile.uuid,
            PROFILE_FIELDS,
            |_| record.clone(),
            || record.clone(),
        )?;
        if outcome == Upsert::Appended {
            tracing::info!(uuid = %profile.uuid, "UUID not found in profile file; appended");
        }
        Ok(outcome)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub date: String,
    pub weight: f64,
}

/// `uuid;date~weight;date~weight;...`
#[derive(Debug, Clone)]
pub struct WeightStore {
    file: FlatFile,
}

impl WeightStore {
    pub fn new(file: FlatFile) -> Self {
        Self { file }
    }

    /// The user's entries in recorded order.
    pub fn history(&self, uuid: &str) -> Vec<WeightEntry> {
        let mut entries = Vec::new();
        for fields in self.file.records() {
            if fields.len() < 2 || fields[0] != uuid {
                continue;
            }
            for token in &fields[1..] {
                let parts: Vec<&str> = token.split('~').collect();
                if parts.len() != 2 {
                    continue;
                }
                let weight = parse_double(parts[1]).unwrap_or_else(|| {
                    tracing::warn!(uuid, value = parts[1], "Invalid weight entry");
                    0.0
                });
                entries.push(WeightEntry {
                    date: parts[0].to_string(),
                    weight,
                });
            }
        }
        entries
    }

    /// Records a weight for a date. A date already present is left alone;
    /// returns whether a new entry was written.
    pub fn record(&self, uuid: &str, date: &str, weight: f64) -> Result<bool> {
        let entry = format!("{}~{}", date, format_double(weight));
        let prefix = format!("{}~", date);
        let mut extended = false;

        let outcome = self.file.upsert(
            uuid,
            2,
            |fields| {
                let mut line = fields.join(";");
                if !fields[1..].iter().any(|t| t.starts_with(&prefix)) {
                    line.push(';');
                    line.push_str(&entry);
                    extended = true;
                }
                line
            },
            || format!("{};{}", uuid, entry),
        )?;

        Ok(extended || outcome == Upsert::Appended)
    }
}
