use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;

use fitness_tracker::accounts::RegistrationDetails;
use fitness_tracker::activity::{Intensity, TrainingForm, TrainingType};
use fitness_tracker::codec::{format_double, parse_timestamp};
use fitness_tracker::coaching::{RosterEntry, KNOWN_COACHES};
use fitness_tracker::config::AppConfig;
use fitness_tracker::logging::init_logging;
use fitness_tracker::tracker::ProfileEdit;
use fitness_tracker::user::BmiCategory;
use fitness_tracker::{Session, Tracker};

#[derive(Parser)]
#[command(
    name = "fitness-tracker",
    about = "Log workouts, track weight and work with a coach"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Account login
    #[arg(long, global = true)]
    login: Option<String>,

    /// Account password (prompted for when omitted)
    #[arg(long, global = true)]
    password: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account and its profile
    Register {
        #[arg(long)]
        name: String,
        /// Kilograms
        #[arg(long)]
        weight: String,
        /// Whole centimetres
        #[arg(long)]
        height: String,
        /// YYYY-MM-DD
        #[arg(long)]
        birth_date: Option<NaiveDate>,
        #[arg(long)]
        gender: Option<String>,
    },

    /// Check credentials and show who is logged in
    Login,

    /// Record a workout
    LogWorkout {
        /// Running, Cycling or Rope Jumping
        #[arg(long = "type")]
        training_type: TrainingType,
        #[arg(long)]
        minutes: i64,
        #[arg(long, default_value = "medium")]
        intensity: Intensity,
        /// Kilometres, for running and cycling
        #[arg(long)]
        distance: Option<f64>,
        /// "YYYY-MM-DD HH:MM:SS", defaults to now
        #[arg(long)]
        start: Option<String>,
    },

    /// Activity statistics
    Stats,

    /// Show the profile with BMI
    Profile,

    /// Change name, weight or height
    UpdateProfile {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        weight: String,
        #[arg(long, default_value = "")]
        height: String,
    },

    /// Weight history
    Weights,

    /// List the coaches
    Coaches,

    /// Ask a coach for sessions
    RequestCoach { coach: String },

    /// Pending requests (coach)
    Requests,

    /// Accept a pending request (coach)
    Accept { student: String },

    /// Dismiss a pending request (coach)
    Dismiss { student: String },

    /// Accepted students (coach)
    Students,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;
    tracing::debug!(data_dir = %config.data_dir.display(), "Configuration loaded");

    let tracker = Tracker::new(&config);
    run(cli, &tracker)
}

fn run(cli: Cli, tracker: &Tracker) -> Result<()> {
    let json = cli.json;

    match &cli.command {
        Command::Register {
            name,
            weight,
            height,
            birth_date,
            gender,
        } => {
            let login = require_login(&cli)?;
            let password = password(&cli)?;
            let details = RegistrationDetails {
                name: name.clone(),
                weight: weight.clone(),
                height: height.clone(),
                birth_date: *birth_date,
                gender: gender.clone(),
            };
            let session = tracker.register(login, &password, &details, Local::now().naive_local())?;
            emit(json, &session, || "Data submitted successfully!".to_string())
        }

        Command::Login => {
            let session = authenticate(&cli, tracker)?;
            emit(json, &session, || match &session {
                Session::User { login, .. } => format!("Logged in as {}", login),
                Session::Coach { coach_id } => format!("Logged in as coach {}", coach_id),
            })
        }

        Command::LogWorkout {
            training_type,
            minutes,
            intensity,
            distance,
            start,
        } => {
            let session = authenticate(&cli, tracker)?;
            let start_time = match start {
                Some(text) => parse_timestamp(text)
                    .ok_or_else(|| anyhow!("Start must look like 2024-06-01 07:30:00"))?,
                None => Local::now().naive_local(),
            };
            let form = TrainingForm {
                training_type: *training_type,
                start_time,
                minutes: *minutes,
                intensity: *intensity,
                distance_km: *distance,
            };
            let activity = tracker.log_workout(&session, form)?;
            emit(json, &activity, || activity.all_info())
        }

        Command::Stats => {
            let session = authenticate(&cli, tracker)?;
            let mut user = tracker.standard_user(&session)?;
            if json {
                return emit(true, &user.stats(), String::new);
            }
            println!("{}", user.all_info());
            for activity in &user.activities {
                println!("{}", activity.all_info());
            }
            Ok(())
        }

        Command::Profile => {
            let session = authenticate(&cli, tracker)?;
            let profile = tracker.profile(&session)?;
            emit(json, &profile, || {
                let bmi = profile.bmi();
                let mut text = String::new();
                text.push_str(&format!("Name: {}\n", profile.name));
                text.push_str(&format!("Weight: {}\n", format_double(profile.weight)));
                text.push_str(&format!("Height: {}\n", format_double(profile.height_cm)));
                text.push_str(&format!("Age: {}\n", profile.age));
                text.push_str(&format!("Gender: {}\n", profile.gender));
                text.push_str(&format!("Account created: {}\n", profile.account_creation_date));
                text.push_str(&format!("Date of current weight: {}\n", profile.current_weight_date));
                if profile.height_cm > 0.0 {
                    text.push_str(&format!("Your BMI: {:.1} ({})", bmi, BmiCategory::from_bmi(bmi)));
                }
                text
            })
        }

        Command::UpdateProfile {
            name,
            weight,
            height,
        } => {
            let session = authenticate(&cli, tracker)?;
            let edit = ProfileEdit {
                name: name.clone(),
                weight: weight.clone(),
                height: height.clone(),
            };
            let profile = tracker.update_profile(&session, &edit, Local::now().naive_local())?;
            emit(json, &profile, || "Profile updated.".to_string())
        }

        Command::Weights => {
            let session = authenticate(&cli, tracker)?;
            let history = tracker.weight_history(&session)?;
            emit(json, &history, || {
                history
                    .iter()
                    .map(|entry| format!("{}  {} kg", entry.date, format_double(entry.weight)))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }

        Command::Coaches => emit(json, &KNOWN_COACHES, || {
            KNOWN_COACHES
                .iter()
                .map(|coach| format!("{}  {}\n    {}", coach.id, coach.name, coach.description))
                .collect::<Vec<_>>()
                .join("\n")
        }),

        Command::RequestCoach { coach } => {
            let session = authenticate(&cli, tracker)?;
            let outcome = tracker.request_coach(&session, coach)?;
            emit(json, &outcome, || outcome.message().to_string())
        }

        Command::Requests => {
            let session = authenticate(&cli, tracker)?;
            let rows = tracker.pending_requests(&session)?;
            emit(json, &rows, || roster_table(&rows))
        }

        Command::Accept { student } => {
            let session = authenticate(&cli, tracker)?;
            tracker.accept(&session, student)?;
            emit(json, student, || format!("Accepted {}", student))
        }

        Command::Dismiss { student } => {
            let session = authenticate(&cli, tracker)?;
            let removed = tracker.dismiss(&session, student)?;
            emit(json, &removed, || {
                if removed {
                    format!("Dismissed {}", student)
                } else {
                    format!("No pending request from {}", student)
                }
            })
        }

        Command::Students => {
            let session = authenticate(&cli, tracker)?;
            let rows = tracker.students(&session)?;
            emit(json, &rows, || roster_table(&rows))
        }
    }
}

fn require_login(cli: &Cli) -> Result<&str> {
    cli.login
        .as_deref()
        .ok_or_else(|| anyhow!("--login is required for this command"))
}

fn password(cli: &Cli) -> Result<String> {
    match &cli.password {
        Some(password) => Ok(password.clone()),
        None => rpassword::prompt_password("Password: ").context("Failed to read password"),
    }
}

fn authenticate(cli: &Cli, tracker: &Tracker) -> Result<Session> {
    let login = require_login(cli)?;
    let password = password(cli)?;
    Ok(tracker.authenticate(login, &password)?)
}

fn emit<T, F>(json: bool, value: &T, text: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce() -> String,
{
    if json {
        let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{}", out);
    } else {
        println!("{}", text());
    }
    Ok(())
}

fn roster_table(rows: &[RosterEntry]) -> String {
    if rows.is_empty() {
        return "Nobody here yet.".to_string();
    }
    let mut table = format!(
        "{:<36}  {:<20} {:>11} {:>11} {:>4} {:<8} {:>6}\n",
        "UUID", "Name", "Weight (kg)", "Height (cm)", "Age", "Gender", "BMI"
    );
    for row in rows {
        table.push_str(&format!(
            "{:<36}  {:<20} {:>11.1} {:>11.0} {:>4} {:<8} {:>6.2}\n",
            row.uuid, row.name, row.weight, row.height_cm, row.age, row.gender, row.bmi
        ));
    }
    table.pop();
    table
}
