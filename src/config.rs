use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::codec::TrainingEncoding;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding every data file.
    pub data_dir: PathBuf,

    // Storage behaviour
    pub training_encoding: TrainingEncoding,
    pub atomic_writes: bool,

    // File names inside data_dir
    pub users_login_file: String,
    pub coaches_login_file: String,
    pub users_data_file: String,
    pub weights_data_file: String,
    pub training_data_file: String,
    pub coaches_students_file: String,
    pub coaches_requests_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("src/main/resources"),
            training_encoding: TrainingEncoding::Legacy,
            atomic_writes: false,
            users_login_file: "usersLoginData.txt".to_string(),
            coaches_login_file: "coachesLogin.txt".to_string(),
            users_data_file: "usersData.txt".to_string(),
            weights_data_file: "weightsData.txt".to_string(),
            training_data_file: "trainingData.txt".to_string(),
            coaches_students_file: "coachesStudents.txt".to_string(),
            coaches_requests_file: "coachesRequests.txt".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `Fitness.toml`, `Fitness.json` and `FITNESS_*`
    /// environment variables.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("Fitness.toml"))
            .merge(Json::file("Fitness.json"))
            .merge(Env::prefixed("FITNESS_"))
    }

    /// Same defaults rooted at another data directory.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }
}
