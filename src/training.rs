//! Training records: `uuid;token~token~...`, one token per activity.

use crate::activity::Activity;
use crate::codec::{decode_activity, encode_activity, TrainingEncoding};
use crate::error::Result;
use crate::store::FlatFile;

const TOKEN_SEPARATOR: char = '~';

#[derive(Debug, Clone)]
pub struct TrainingStore {
    file: FlatFile,
    encoding: TrainingEncoding,
}

impl TrainingStore {
    pub fn new(file: FlatFile, encoding: TrainingEncoding) -> Self {
        Self { file, encoding }
    }

    pub fn encoding(&self) -> TrainingEncoding {
        self.encoding
    }

    /// Adds an activity to the end of the user's line, creating the line if
    /// the user has none.
    pub fn append(&self, uuid: &str, activity: &Activity) -> Result<()> {
        let token = encode_activity(activity, self.encoding);

        self.file.upsert(
            uuid,
            1,
            |fields| {
                if fields.len() < 2 {
                    format!("{};{}", uuid, token)
                } else {
                    format!("{}{}{}", fields.join(";"), TOKEN_SEPARATOR, token)
                }
            },
            || format!("{};{}", uuid, token),
        )?;

        tracing::info!(uuid, activity = %activity.name, "Training saved");
        Ok(())
    }

    /// The user's activities in entry order. Unreadable tokens are skipped.
    pub fn activities(&self, uuid: &str) -> Vec<Activity> {
        let mut activities = Vec::new();
        for fields in self.file.records() {
            if fields.len() < 2 || fields[0] != uuid {
                continue;
            }
            activities.extend(
                fields[1]
                    .split(TOKEN_SEPARATOR)
                    .filter_map(decode_activity),
            );
        }
        activities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityKind;
    use chrono::NaiveDate;
    use std::fs;

    fn store(encoding: TrainingEncoding) -> (tempfile::TempDir, TrainingStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TrainingStore::new(FlatFile::new(dir.path().join("trainingData.txt")), encoding);
        (dir, store)
    }

    fn sample_run() -> Activity {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(6, 30, 0)
            .unwrap();
        Activity::new(
            5,
            "Running",
            245.0,
            30.0,
            start,
            start + chrono::Duration::minutes(30),
            ActivityKind::Running {
                covered_distance: 5.0,
                average_speed: 10.0,
            },
        )
    }

    #[test]
    fn legacy_tokens_join_with_tilde() {
        let (_dir, store) = store(TrainingEncoding::Legacy);
        store.append("u1", &sample_run()).unwrap();
        store.append("u1", &sample_run()).unwrap();

        let lines = store.file.read_lines();
        assert_eq!(lines.len(), 1);
        let summary = sample_run().all_info();
        assert_eq!(lines[0], format!("u1;{}~{}", summary, summary));

        let loaded = store.activities("u1");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].kind, sample_run().kind);
    }

    #[test]
    fn structured_and_legacy_tokens_mix() {
        let (_dir, store) = store(TrainingEncoding::Structured);
        fs::write(
            store.file.path(),
            "u1;Name: Rope Jumping Burned calories: 84.0 Duration: 10.0 Repetitions: 1200\n",
        )
        .unwrap();
        store.append("u1", &sample_run()).unwrap();

        let loaded = store.activities("u1");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "Rope Jumping");
        assert_eq!(loaded[1], sample_run());
    }

    #[test]
    fn other_users_and_bad_tokens_are_ignored() {
        let (_dir, store) = store(TrainingEncoding::Legacy);
        fs::write(
            store.file.path(),
            "u2;Name: Cycling Burned calories: 1.0 Duration: 1.0 Distance cycled: 1.0 km Maximum speed: 6.0 km/h\n\
             u1;Name: Running Burned calories: oops Duration: 1.0~Name: Rope Jumping Burned calories: 2.0 Duration: 1.0 Repetitions: 120\n\
             u3\n",
        )
        .unwrap();

        let loaded = store.activities("u1");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].kind, ActivityKind::RopeJumping { repetitions: 120 });
        assert!(store.activities("u3").is_empty());
        assert!(store.activities("nobody").is_empty());
    }

    #[test]
    fn bare_uuid_line_gets_first_token() {
        let (_dir, store) = store(TrainingEncoding::Legacy);
        fs::write(store.file.path(), "u1\n").unwrap();
        store.append("u1", &sample_run()).unwrap();
        assert_eq!(store.activities("u1").len(), 1);
    }
}
