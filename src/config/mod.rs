use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration, built once at startup from the environment and
/// carried in shared state. No global singleton; handlers receive it by
/// reference through the router state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HS256 secret shared with the authentication provider.
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Cloudinary cloud name; empty disables uploads with a 503.
    pub cloud_name: String,
    /// Unsigned upload preset configured on the Cloudinary side.
    pub upload_preset: String,
    /// Folder tag attached to every uploaded photo.
    pub folder: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("SCOUT_API_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs =
                v.parse().unwrap_or(self.database.connect_timeout_secs);
        }
        if let Ok(v) = env::var("SCOUT_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("CLOUDINARY_CLOUD_NAME") {
            self.storage.cloud_name = v;
        }
        if let Ok(v) = env::var("CLOUDINARY_UPLOAD_PRESET") {
            self.storage.upload_preset = v;
        }
        if let Ok(v) = env::var("CLOUDINARY_FOLDER") {
            self.storage.folder = v;
        }
        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                max_connections: 5,
                connect_timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
            },
            storage: StorageConfig {
                cloud_name: String::new(),
                upload_preset: String::new(),
                folder: "scout".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 10,
                connect_timeout_secs: 10,
            },
            ..Self::development()
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 20,
                connect_timeout_secs: 5,
            },
            ..Self::development()
        }
    }
}
