pub use crate::utils::database;
use async_trait::async_trait;
use std::env;

const DEFAULT_TOKEN_SECRET: &str = "preplate-development-token-secret";

#[derive(Clone)]
pub enum AppEnvironment {
    Production,
    Development,
}

impl AppEnvironment {
    pub fn from(raw_environment: String) -> Self {
        match raw_environment.as_ref() {
            "production" => Self::Production,
            _ => Self::Development,
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
}

#[derive(Clone)]
pub struct AuthContext {
    pub token_secret: String,
}

#[derive(Clone)]
pub struct Context {
    pub app: AppContext,
    pub db_conn: database::DatabaseConnection,
    pub auth: AuthContext,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub token_secret: String,
}

#[derive(Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub app: AppConfig,
    pub auth: AuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = AppEnvironment::from(environment);
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u32>()
            .expect("Invalid PORT number");
        let url = env::var("URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let token_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) => {
                // Signing tokens with the compiled-in secret is a deployment
                // misconfiguration, never acceptable in production.
                if let AppEnvironment::Production = environment {
                    panic!("JWT_SECRET not set");
                }
                tracing::warn!("JWT_SECRET not set, falling back to the development secret");
                DEFAULT_TOKEN_SECRET.to_string()
            }
        };

        Self {
            database: DatabaseConfig { url: database_url },
            app: AppConfig {
                host,
                environment,
                port,
                url,
            },
            auth: AuthConfig { token_secret },
        }
    }
}

#[async_trait]
pub trait ToContext {
    async fn to_context(self) -> Context;
}

#[async_trait]
impl ToContext for Config {
    async fn to_context(self) -> Context {
        let db_conn = database::connect(self.database.url.as_str()).await;
        database::migrate(db_conn.clone()).await;

        Context {
            app: AppContext {
                host: self.app.host,
                environment: self.app.environment,
                port: self.app.port,
                url: self.app.url,
            },
            db_conn,
            auth: AuthContext {
                token_secret: self.auth.token_secret,
            },
        }
    }
}
