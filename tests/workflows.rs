use std::fs;

use chrono::{NaiveDate, NaiveDateTime};
use fitness_tracker::accounts::RegistrationDetails;
use fitness_tracker::activity::{ActivityKind, Intensity, TrainingForm, TrainingType};
use fitness_tracker::codec::TrainingEncoding;
use fitness_tracker::coaching::RequestOutcome;
use fitness_tracker::config::AppConfig;
use fitness_tracker::tracker::ProfileEdit;
use fitness_tracker::{Session, Tracker, TrackerError};

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn details(name: &str) -> RegistrationDetails {
    RegistrationDetails {
        name: name.to_string(),
        weight: "70".to_string(),
        height: "175".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1990, 3, 10),
        gender: Some("Female".to_string()),
    }
}

fn run(minutes: i64, distance: f64, start: NaiveDateTime) -> TrainingForm {
    TrainingForm {
        training_type: TrainingType::Running,
        start_time: start,
        minutes,
        intensity: Intensity::Medium,
        distance_km: Some(distance),
    }
}

#[test]
fn register_login_and_log_workouts() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = Tracker::new(&AppConfig::with_data_dir(dir.path()));

    let registered = tracker.register("alice", "pw", &details("Alice"), at(1, 9)).unwrap();
    let session = tracker.authenticate("alice", "pw").unwrap();
    assert_eq!(session, registered);

    let again = tracker.register("alice", "other", &details("Alice"), at(1, 9));
    assert_eq!(again.unwrap_err().to_string(), "Login already exists.");

    tracker.log_workout(&session, run(30, 5.0, at(2, 7))).unwrap();
    tracker
        .log_workout(
            &session,
            TrainingForm {
                training_type: TrainingType::RopeJumping,
                start_time: at(3, 7),
                minutes: 10,
                intensity: Intensity::High,
                distance_km: None,
            },
        )
        .unwrap();

    let user = tracker.standard_user(&session).unwrap();
    assert_eq!(user.activities.len(), 2);
    assert_eq!(
        user.activities[0].kind,
        ActivityKind::Running {
            covered_distance: 5.0,
            average_speed: 10.0
        }
    );
    assert_eq!(
        user.activities[1].kind,
        ActivityKind::RopeJumping { repetitions: 1200 }
    );
    // 12 MET * 1.2 * 70 kg * 10/60 h
    assert!((user.activities[1].burned_calories - 168.0).abs() < 1e-9);
    assert_eq!(user.longest_activity().unwrap().name, "Running");
    assert_eq!(user.most_effective_activity().unwrap().name, "Rope Jumping");

    let lines = fs::read_to_string(dir.path().join("trainingData.txt")).unwrap();
    assert!(lines.starts_with(&format!(
        "{};Name: Running Burned calories: 245.0 Duration: 30.0 Distance ran: 5.0 km Average speed: 10.0 km/h~",
        session.user_uuid().unwrap()
    )));
}

#[test]
fn structured_encoding_keeps_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        training_encoding: TrainingEncoding::Structured,
        atomic_writes: true,
        ..AppConfig::with_data_dir(dir.path())
    };
    let tracker = Tracker::new(&config);
    let session = tracker.register("bob", "pw", &details("Bob"), at(1, 9)).unwrap();

    let logged = tracker.log_workout(&session, run(45, 15.0, at(4, 18))).unwrap();
    let loaded = tracker.activities(&session).unwrap();
    assert_eq!(loaded, vec![logged]);
    assert_eq!(loaded[0].end_time, Some(at(4, 18) + chrono::Duration::minutes(45)));
}

#[test]
fn weight_history_grows_once_per_date() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = Tracker::new(&AppConfig::with_data_dir(dir.path()));
    let session = tracker.register("carol", "pw", &details("Carol"), at(1, 9)).unwrap();

    let edit = |weight: &str| ProfileEdit {
        name: "Carol".to_string(),
        weight: weight.to_string(),
        height: "170".to_string(),
    };
    tracker.update_profile(&session, &edit("69.0"), at(5, 8)).unwrap();
    tracker.update_profile(&session, &edit("68.0"), at(5, 8)).unwrap();
    tracker.update_profile(&session, &edit("67.5"), at(6, 8)).unwrap();

    let history = tracker.weight_history(&session).unwrap();
    let weights: Vec<f64> = history.iter().map(|e| e.weight).collect();
    assert_eq!(weights, vec![69.0, 67.5]);

    let profile = tracker.profile(&session).unwrap();
    assert_eq!(profile.weight, 67.5);
    assert_eq!(profile.height_cm, 170.0);
    assert_eq!(profile.current_weight_date, "2024-06-06 08:00:00");
}

#[test]
fn coach_request_workflow() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("coachesLogin.txt"), "c1;coachpw\nc2;coachpw\n").unwrap();
    let tracker = Tracker::new(&AppConfig::with_data_dir(dir.path()));

    let alice = tracker.register("alice", "pw", &details("Alice"), at(1, 9)).unwrap();
    let bob = tracker.register("bob", "pw", &details("Bob"), at(1, 9)).unwrap();
    let coach = tracker.authenticate("c1", "coachpw").unwrap();
    assert_eq!(coach, Session::coach("c1"));

    assert_eq!(tracker.request_coach(&alice, "c1").unwrap(), RequestOutcome::Sent);
    assert_eq!(tracker.request_coach(&bob, "c1").unwrap(), RequestOutcome::Sent);
    assert_eq!(
        tracker.request_coach(&alice, "c1").unwrap(),
        RequestOutcome::AlreadyRequested
    );

    let pending = tracker.pending_requests(&coach).unwrap();
    let names: Vec<&str> = pending.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);

    let alice_uuid = alice.user_uuid().unwrap();
    let bob_uuid = bob.user_uuid().unwrap();
    tracker.accept(&coach, alice_uuid).unwrap();
    assert!(tracker.dismiss(&coach, bob_uuid).unwrap());

    assert!(tracker.pending_requests(&coach).unwrap().is_empty());
    let students = tracker.students(&coach).unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].uuid, alice_uuid);

    assert_eq!(
        tracker.request_coach(&alice, "c1").unwrap(),
        RequestOutcome::AlreadyStudent
    );
    // another coach is unaffected
    assert_eq!(tracker.request_coach(&alice, "c2").unwrap(), RequestOutcome::Sent);

    assert!(matches!(
        tracker.students(&alice),
        Err(TrackerError::Rejected(_))
    ));
}

#[test]
fn empty_history_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = Tracker::new(&AppConfig::with_data_dir(dir.path()));
    let session = tracker.register("dave", "pw", &details("Dave"), at(1, 9)).unwrap();

    let stats = tracker.standard_user(&session).unwrap().stats();
    assert_eq!(stats.count, 0);
    assert_eq!(stats.total_duration, 0.0);
    assert!(stats.average_duration.is_nan());
    assert!(stats.average_calories.is_nan());
    assert!(stats.longest.is_none());
    assert!(stats.most_effective.is_none());
}
