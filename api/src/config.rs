use std::env;

#[derive(Clone)]
pub struct Config {
    /// Postgres connection string; absent means the in-memory store
    pub database_url: Option<String>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL").ok(),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
        }
    }
}
