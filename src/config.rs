use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn new_from_env() -> Self {
        let api_base_url = env::var("STUDYTRACK_API_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string());
        let data_dir = env::var("STUDYTRACK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".studytrack"));

        Self {
            api_base_url,
            data_dir,
        }
    }
}
