use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct MlConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub admin_token: String,
    pub ml: MlConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let admin_token = std::env::var("ADMIN_TOKEN")?;
        let ml = MlConfig {
            base_url: std::env::var("ML_API_URL")
                .unwrap_or_else(|_| "http://localhost:5000".into()),
            timeout_secs: std::env::var("ML_API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };
        Ok(Self {
            database_url,
            admin_token,
            ml,
        })
    }
}
