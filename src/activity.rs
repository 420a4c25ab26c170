use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strsim::levenshtein;

use crate::codec::format_double;
use crate::error::Rejection;

// Metabolic equivalents per training type
const MET_RUNNING: f64 = 7.0;
const MET_CYCLING: f64 = 6.0;
const MET_ROPE_JUMPING: f64 = 12.0;
const MET_UNKNOWN: f64 = 1.0;

const INTENSITY_LOW: f64 = 0.8;
const INTENSITY_MEDIUM: f64 = 1.0;
const INTENSITY_HIGH: f64 = 1.2;

// Cycling max speed is estimated from the average.
const CYCLING_MAX_SPEED_BONUS_KMH: f64 = 5.0;
const ROPE_JUMPS_PER_SECOND: i32 = 2;

const FUZZY_MAX_DISTANCE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingType {
    Running,
    Cycling,
    RopeJumping,
}

impl TrainingType {
    pub const ALL: [TrainingType; 3] = [
        TrainingType::Running,
        TrainingType::Cycling,
        TrainingType::RopeJumping,
    ];

    /// Name shown to users and stored as the activity name.
    pub fn display_name(&self) -> &'static str {
        match self {
            TrainingType::Running => "Running",
            TrainingType::Cycling => "Cycling",
            TrainingType::RopeJumping => "Rope Jumping",
        }
    }

    /// Tag used by the structured training token.
    pub fn tag(&self) -> &'static str {
        match self {
            TrainingType::Running => "running",
            TrainingType::Cycling => "cycling",
            TrainingType::RopeJumping => "rope_jumping",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.display_name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn met(&self) -> f64 {
        match self {
            TrainingType::Running => MET_RUNNING,
            TrainingType::Cycling => MET_CYCLING,
            TrainingType::RopeJumping => MET_ROPE_JUMPING,
        }
    }

    /// Resolves free-form user input to a training type.
    ///
    /// Exact display names and tags win; otherwise the closest known name
    /// within a small edit distance is accepted.
    pub fn resolve(input: &str) -> Option<Self> {
        let clean = input.trim().to_lowercase();
        if let Some(t) = Self::from_display_name(&clean).or_else(|| Self::from_tag(&clean)) {
            return Some(t);
        }

        let normalized = clean.replace(['_', '-'], " ");
        let mut best: Option<(TrainingType, usize)> = None;
        for t in Self::ALL {
            let distance = levenshtein(&normalized, &t.display_name().to_lowercase());
            if distance <= FUZZY_MAX_DISTANCE && best.map_or(true, |(_, d)| distance < d) {
                best = Some((t, distance));
            }
        }

        if let Some((t, distance)) = best {
            tracing::debug!(input, resolved = t.display_name(), distance, "Fuzzy training type match");
        }
        best.map(|(t, _)| t)
    }
}

impl fmt::Display for TrainingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for TrainingType {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s).ok_or_else(|| Rejection::new(format!("Unknown training type: {}", s)))
    }
}

/// Base MET of an arbitrary training label, 1.0 when unrecognized.
pub fn met_for(training: &str) -> f64 {
    TrainingType::from_display_name(training)
        .map(|t| t.met())
        .unwrap_or(MET_UNKNOWN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Intensity {
    Low,
    #[default]
    Medium,
    High,
}

impl Intensity {
    pub fn multiplier(&self) -> f64 {
        match self {
            Intensity::Low => INTENSITY_LOW,
            Intensity::Medium => INTENSITY_MEDIUM,
            Intensity::High => INTENSITY_HIGH,
        }
    }
}

impl FromStr for Intensity {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Intensity::Low),
            "medium" => Ok(Intensity::Medium),
            "high" => Ok(Intensity::High),
            other => Err(Rejection::new(format!("Unknown intensity: {}", other))),
        }
    }
}

/// Type-specific metrics of an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityKind {
    Running {
        covered_distance: f64,
        average_speed: f64,
    },
    Cycling {
        covered_distance: f64,
        max_speed: f64,
    },
    RopeJumping {
        repetitions: i32,
    },
}

impl ActivityKind {
    pub fn training_type(&self) -> TrainingType {
        match self {
            ActivityKind::Running { .. } => TrainingType::Running,
            ActivityKind::Cycling { .. } => TrainingType::Cycling,
            ActivityKind::RopeJumping { .. } => TrainingType::RopeJumping,
        }
    }
}

/// A recorded workout.
///
/// `duration` is authoritative unless [`Activity::calculate_duration`] is
/// called; it is allowed to disagree with the timestamps. Activities decoded
/// from the human-readable summary carry no id or timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i32,
    pub name: String,
    pub burned_calories: f64,
    /// Minutes.
    pub duration: f64,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub kind: ActivityKind,
}

impl Activity {
    pub fn new(
        id: i32,
        name: impl Into<String>,
        burned_calories: f64,
        duration: f64,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        kind: ActivityKind,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            burned_calories,
            duration,
            start_time: Some(start_time),
            end_time: Some(end_time),
            kind,
        }
    }

    pub fn training_type(&self) -> TrainingType {
        self.kind.training_type()
    }

    /// Recomputes the duration in whole minutes (truncated) from the
    /// timestamps and stores it. Without both timestamps the stored
    /// duration is returned unchanged.
    pub fn calculate_duration(&mut self) -> f64 {
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            self.duration = (end - start).num_minutes() as f64;
        }
        self.duration
    }

    /// Not guarded: a zero duration yields infinity or NaN.
    pub fn calories_per_minute(&self) -> f64 {
        self.burned_calories / self.duration
    }

    /// Fixed-label summary. This exact text is also the legacy on-disk
    /// training token, so labels and order must not change.
    pub fn all_info(&self) -> String {
        let mut info = String::new();
        info.push_str(&format!("Name: {} ", self.name));
        info.push_str(&format!(
            "Burned calories: {} ",
            format_double(self.burned_calories)
        ));
        info.push_str(&format!("Duration: {}", format_double(self.duration)));

        match &self.kind {
            ActivityKind::Running {
                covered_distance,
                average_speed,
            } => {
                info.push_str(&format!(
                    " Distance ran: {} km ",
                    format_double(*covered_distance)
                ));
                info.push_str(&format!(
                    "Average speed: {} km/h",
                    format_double(*average_speed)
                ));
            }
            ActivityKind::Cycling {
                covered_distance,
                max_speed,
            } => {
                info.push_str(&format!(
                    " Distance cycled: {} km ",
                    format_double(*covered_distance)
                ));
                info.push_str(&format!("Maximum speed: {} km/h", format_double(*max_speed)));
            }
            ActivityKind::RopeJumping { repetitions } => {
                info.push_str(&format!(" Repetitions: {}", repetitions));
            }
        }

        info
    }
}

/// Input of the training registration form.
#[derive(Debug, Clone)]
pub struct TrainingForm {
    pub training_type: TrainingType,
    pub start_time: NaiveDateTime,
    pub minutes: i64,
    pub intensity: Intensity,
    /// Kilometres; required for running and cycling.
    pub distance_km: Option<f64>,
}

/// MET adjusted by intensity.
pub fn met_value(training_type: TrainingType, intensity: Intensity) -> f64 {
    training_type.met() * intensity.multiplier()
}

pub fn calories_burned(met: f64, weight_kg: f64, minutes: i64) -> f64 {
    met * weight_kg * (minutes as f64 / 60.0)
}

/// `None` when the count does not fit in an `i32`.
pub fn rope_repetitions(minutes: i64) -> Option<i32> {
    let seconds = i32::try_from(minutes).ok()?.checked_mul(60)?;
    ROPE_JUMPS_PER_SECOND.checked_mul(seconds)
}

impl TrainingForm {
    /// Builds the activity the form describes for a user of the given weight.
    pub fn into_activity(self, id: i32, weight_kg: f64) -> Result<Activity, Rejection> {
        let invalid = || Rejection::new("Duration and Distance must be numeric.");
        // minutes must fit the integer field of the form
        if self.minutes < 0 || i32::try_from(self.minutes).is_err() {
            return Err(invalid());
        }
        let end_time = self
            .start_time
            .checked_add_signed(Duration::minutes(self.minutes))
            .ok_or_else(invalid)?;

        let met = met_value(self.training_type, self.intensity);
        let calories = calories_burned(met, weight_kg, self.minutes);
        let hours = self.minutes as f64 / 60.0;

        let kind = match self.training_type {
            TrainingType::Running => {
                let distance = self.distance_km.ok_or_else(invalid)?;
                ActivityKind::Running {
                    covered_distance: distance,
                    average_speed: distance / hours,
                }
            }
            TrainingType::Cycling => {
                let distance = self.distance_km.ok_or_else(invalid)?;
                ActivityKind::Cycling {
                    covered_distance: distance,
                    max_speed: distance / hours + CYCLING_MAX_SPEED_BONUS_KMH,
                }
            }
            TrainingType::RopeJumping => ActivityKind::RopeJumping {
                repetitions: rope_repetitions(self.minutes).ok_or_else(invalid)?,
            },
        };

        Ok(Activity::new(
            id,
            self.training_type.display_name(),
            calories,
            self.minutes as f64,
            self.start_time,
            end_time,
            kind,
        ))
    }
}

/// Integer activity id derived from a fresh v4 UUID.
pub fn new_activity_id() -> i32 {
    let bits = uuid::Uuid::new_v4().as_u128();
    let folded = (bits >> 96) ^ (bits >> 64) ^ (bits >> 32) ^ bits;
    folded as u32 as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn run(duration: f64, start: NaiveDateTime, end: NaiveDateTime) -> Activity {
        Activity::new(
            1,
            "Running",
            300.0,
            duration,
            start,
            end,
            ActivityKind::Running {
                covered_distance: 5.0,
                average_speed: 10.0,
            },
        )
    }

    #[test]
    fn calculate_duration_overwrites_stored_value() {
        let mut activity = run(99.0, at(10, 0), at(10, 45));
        assert_eq!(activity.calculate_duration(), 45.0);
        assert_eq!(activity.duration, 45.0);
    }

    #[test]
    fn calculate_duration_truncates_partial_minutes() {
        let start = at(10, 0);
        let end = start + Duration::seconds(30 * 60 + 59);
        let mut activity = run(0.0, start, end);
        assert_eq!(activity.calculate_duration(), 30.0);
    }

    #[test]
    fn calculate_duration_without_timestamps_keeps_duration() {
        let mut activity = run(12.0, at(10, 0), at(11, 0));
        activity.start_time = None;
        assert_eq!(activity.calculate_duration(), 12.0);
    }

    #[test]
    fn calories_per_minute_is_unguarded() {
        let activity = run(30.0, at(10, 0), at(10, 30));
        assert_eq!(activity.calories_per_minute(), 10.0);

        let zero = run(0.0, at(10, 0), at(10, 0));
        assert!(zero.calories_per_minute().is_infinite());

        let mut empty = run(0.0, at(10, 0), at(10, 0));
        empty.burned_calories = 0.0;
        assert!(empty.calories_per_minute().is_nan());
    }

    #[test]
    fn all_info_uses_fixed_labels() {
        let activity = run(30.0, at(10, 0), at(10, 30));
        assert_eq!(
            activity.all_info(),
            "Name: Running Burned calories: 300.0 Duration: 30.0 Distance ran: 5.0 km Average speed: 10.0 km/h"
        );

        let cycling = Activity::new(
            2,
            "Cycling",
            360.0,
            60.0,
            at(8, 0),
            at(9, 0),
            ActivityKind::Cycling {
                covered_distance: 20.0,
                max_speed: 25.0,
            },
        );
        assert_eq!(
            cycling.all_info(),
            "Name: Cycling Burned calories: 360.0 Duration: 60.0 Distance cycled: 20.0 km Maximum speed: 25.0 km/h"
        );

        let rope = Activity::new(
            3,
            "Rope Jumping",
            84.0,
            10.0,
            at(8, 0),
            at(8, 10),
            ActivityKind::RopeJumping { repetitions: 1200 },
        );
        assert_eq!(
            rope.all_info(),
            "Name: Rope Jumping Burned calories: 84.0 Duration: 10.0 Repetitions: 1200"
        );
    }

    #[test]
    fn medium_run_scenario() {
        let form = TrainingForm {
            training_type: TrainingType::Running,
            start_time: at(7, 0),
            minutes: 30,
            intensity: Intensity::Medium,
            distance_km: Some(5.0),
        };
        let activity = form.into_activity(7, 70.0).unwrap();
        assert_eq!(activity.burned_calories, 245.0);
        assert_eq!(activity.duration, 30.0);
        assert_eq!(activity.end_time, Some(at(7, 30)));
        assert_eq!(
            activity.kind,
            ActivityKind::Running {
                covered_distance: 5.0,
                average_speed: 10.0
            }
        );
    }

    #[test]
    fn cycling_max_speed_adds_five() {
        let form = TrainingForm {
            training_type: TrainingType::Cycling,
            start_time: at(7, 0),
            minutes: 60,
            intensity: Intensity::High,
            distance_km: Some(20.0),
        };
        let activity = form.into_activity(1, 80.0).unwrap();
        assert!((activity.burned_calories - 6.0 * 1.2 * 80.0).abs() < 1e-9);
        assert_eq!(
            activity.kind,
            ActivityKind::Cycling {
                covered_distance: 20.0,
                max_speed: 25.0
            }
        );
    }

    #[test]
    fn rope_jumping_counts_two_jumps_per_second() {
        let form = TrainingForm {
            training_type: TrainingType::RopeJumping,
            start_time: at(7, 0),
            minutes: 10,
            intensity: Intensity::Low,
            distance_km: None,
        };
        let activity = form.into_activity(1, 70.0).unwrap();
        assert_eq!(activity.kind, ActivityKind::RopeJumping { repetitions: 1200 });
        assert!((activity.burned_calories - 12.0 * 0.8 * 70.0 * (10.0 / 60.0)).abs() < 1e-9);
    }

    #[test]
    fn running_without_distance_is_rejected() {
        let form = TrainingForm {
            training_type: TrainingType::Running,
            start_time: at(7, 0),
            minutes: 30,
            intensity: Intensity::Medium,
            distance_km: None,
        };
        let err = form.into_activity(1, 70.0).unwrap_err();
        assert_eq!(err.message, "Duration and Distance must be numeric.");
    }

    #[test]
    fn oversized_durations_are_rejected() {
        let form = |training_type, minutes| TrainingForm {
            training_type,
            start_time: at(7, 0),
            minutes,
            intensity: Intensity::Medium,
            distance_km: Some(5.0),
        };
        let message = |f: TrainingForm| f.into_activity(1, 70.0).unwrap_err().message;

        assert_eq!(
            message(form(TrainingType::RopeJumping, 20_000_000)),
            "Duration and Distance must be numeric."
        );
        assert_eq!(
            message(form(TrainingType::Running, 1_000_000_000_000)),
            "Duration and Distance must be numeric."
        );
        assert!(form(TrainingType::Running, -1).into_activity(1, 70.0).is_err());

        assert_eq!(rope_repetitions(17_895_698), None);
        assert_eq!(rope_repetitions(17_895_697), Some(2_147_483_640));
        assert!(form(TrainingType::Cycling, i64::from(i32::MAX))
            .into_activity(1, 70.0)
            .is_ok());
    }

    #[test]
    fn resolve_training_type_fuzzy() {
        assert_eq!(TrainingType::resolve("running"), Some(TrainingType::Running));
        assert_eq!(TrainingType::resolve("Rope Jumping"), Some(TrainingType::RopeJumping));
        assert_eq!(TrainingType::resolve("rope_jumping"), Some(TrainingType::RopeJumping));
        assert_eq!(TrainingType::resolve("runing"), Some(TrainingType::Running));
        assert_eq!(TrainingType::resolve("swimming laps"), None);
    }

    #[test]
    fn unknown_training_label_has_unit_met() {
        assert_eq!(met_for("Yoga"), 1.0);
        assert_eq!(met_for("Cycling"), 6.0);
        assert_eq!(met_value(TrainingType::Running, Intensity::Low), 7.0 * 0.8);
    }
}
