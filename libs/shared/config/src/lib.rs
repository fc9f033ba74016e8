use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Supabase,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub store_backend: StoreBackend,
    pub supabase_url: String,
    pub supabase_api_key: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub default_admin_username: String,
    pub default_admin_password: String,
    pub booking_max_attempts: u32,
    pub reject_past_slot_times: bool,
    pub reprice_appointments_on_cost_change: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 5000,
            store_backend: StoreBackend::Memory,
            supabase_url: String::new(),
            supabase_api_key: String::new(),
            jwt_secret: String::new(),
            token_ttl_hours: 24,
            default_admin_username: "admin".to_string(),
            default_admin_password: "@dm1n".to_string(),
            booking_max_attempts: 3,
            reject_past_slot_times: false,
            reprice_appointments_on_cost_change: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let supabase_url = env::var("SUPABASE_URL")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_URL not set, using empty value");
                String::new()
            });
        let supabase_api_key = env::var("SUPABASE_API_KEY")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_API_KEY not set, using empty value");
                String::new()
            });

        let store_backend = match env::var("STORE_BACKEND").ok().as_deref() {
            Some("memory") => StoreBackend::Memory,
            Some("supabase") => StoreBackend::Supabase,
            Some(other) => {
                warn!("Unknown STORE_BACKEND '{}', falling back to auto-detection", other);
                Self::detect_backend(&supabase_url, &supabase_api_key)
            }
            None => Self::detect_backend(&supabase_url, &supabase_api_key),
        };

        let config = Self {
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| defaults.server_host.clone()),
            server_port: parse_or("SERVER_PORT", defaults.server_port),
            store_backend,
            supabase_url,
            supabase_api_key,
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            token_ttl_hours: parse_or("TOKEN_TTL_HOURS", defaults.token_ttl_hours),
            default_admin_username: env::var("DEFAULT_ADMIN_USERNAME")
                .unwrap_or(defaults.default_admin_username),
            default_admin_password: env::var("DEFAULT_ADMIN_PASSWORD")
                .unwrap_or(defaults.default_admin_password),
            booking_max_attempts: parse_or("BOOKING_MAX_ATTEMPTS", defaults.booking_max_attempts).max(1),
            reject_past_slot_times: parse_or(
                "BOOKING_REJECT_PAST_SLOT_TIMES",
                defaults.reject_past_slot_times,
            ),
            reprice_appointments_on_cost_change: parse_or(
                "REPRICE_APPOINTMENTS_ON_COST_CHANGE",
                defaults.reprice_appointments_on_cost_change,
            ),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    fn detect_backend(supabase_url: &str, supabase_api_key: &str) -> StoreBackend {
        if !supabase_url.is_empty() && !supabase_api_key.is_empty() {
            StoreBackend::Supabase
        } else {
            StoreBackend::Memory
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
            && (self.store_backend == StoreBackend::Memory || self.is_supabase_configured())
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_api_key.is_empty()
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
