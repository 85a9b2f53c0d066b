use std::env;

#[derive(Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub username: String,
    pub password: String,
    pub server: String,
    pub port: u32,
    pub database: String,
}

impl AppConfig {
    pub fn database_url(&self) -> String {
        if let Ok(url) = env::var("DATABASE_URL") {
            return url;
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.database.username,
            self.database.password,
            self.database.server,
            self.database.port,
            self.database.database
        )
    }

    pub fn from_env() -> Self {
        let get = |key: &str, default: &str| -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        };
        Self {
            server: ServerConfig {
                host: get("SERVER_HOST", "0.0.0.0"),
                port: get("SERVER_PORT", "8080").parse().unwrap_or(8080),
            },
            database: DatabaseConfig {
                username: get("DATABASE_USERNAME", "quoteserver"),
                password: get("DATABASE_PASSWORD", "quoteserver"),
                server: get("DATABASE_SERVER", "localhost"),
                port: get("DATABASE_PORT", "5432").parse().unwrap_or(5432),
                database: get("DATABASE_NAME", "quoteserver"),
            },
        }
    }
}
