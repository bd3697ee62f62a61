// src/config.rs
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;

/// Runtime configuration, loaded once at startup from the environment
/// (`.env` honoured via dotenv) with CLI overrides applied on top.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Email granted the admin role. Empty string means no admin is configured.
    pub admin_email: String,
    /// Extra password required on upload endpoints when non-empty
    /// (checked against the `X-Admin-Password` header).
    pub admin_password: String,
    /// Corporate email domain required for any authenticated request.
    pub allowed_domain: String,
    /// Emails allowed on restricted endpoints (lean actions, meeting summaries).
    pub allowed_admins: Vec<String>,
    /// Request paths served without the email guard.
    pub exempt_paths: HashSet<String>,
    /// SQLite database file.
    pub database_path: PathBuf,
    pub env_name: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let admin_email = env::var("ADMIN_EMAIL")
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        let admin_password = env::var("ADMIN_PASSWORD").unwrap_or_default();
        let allowed_domain = env::var("ALLOWED_EMAIL_DOMAIN")
            .unwrap_or_else(|_| "@neemba.com".to_string())
            .trim()
            .to_lowercase();
        let env_name = env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let mut allowed_admins: Vec<String> = env::var("ALLOWED_ADMINS")
            .unwrap_or_default()
            .split(',')
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        if !admin_email.is_empty() && !allowed_admins.contains(&admin_email) {
            allowed_admins.push(admin_email.clone());
        }

        let mut exempt_paths: HashSet<String> = [
            "/health",
            "/kpi/inspection/analytics",
            "/kpi/inspection/quarters",
            "/kpi/inspection/snapshot",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        if env_name != "prod" {
            exempt_paths.insert("/kpi/productivite/analytics".to_string());
        }

        let database_path = env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("atelier_kpi.db"));

        Self {
            admin_email,
            admin_password,
            allowed_domain,
            allowed_admins,
            exempt_paths,
            database_path,
            env_name,
        }
    }

    pub fn is_allowed_admin(&self, email: &str) -> bool {
        self.allowed_admins.iter().any(|e| e == email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_admins_contains_admin_email() {
        let cfg = AppConfig {
            admin_email: "chef@neemba.com".into(),
            admin_password: String::new(),
            allowed_domain: "@neemba.com".into(),
            allowed_admins: vec!["chef@neemba.com".into()],
            exempt_paths: HashSet::new(),
            database_path: PathBuf::from(":memory:"),
            env_name: "test".into(),
        };
        assert!(cfg.is_allowed_admin("chef@neemba.com"));
        assert!(!cfg.is_allowed_admin("guest@neemba.com"));
    }
}
