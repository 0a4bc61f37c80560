use std::env;
use std::fmt;

const DEFAULT_REDIS_ADDR: &str = "localhost:6379";
const DEFAULT_PORT: &str = "8080";

#[derive(Clone)]
pub struct AdminCredentials {
    pub user: String,
    pub pass: String,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub redis_addr: String,
    pub port: String,
    pub admin: AdminCredentials,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let value = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let user = value("ADMIN_USER");
        let pass = value("ADMIN_PASS");
        let (Some(user), Some(pass)) = (user, pass) else {
            return Err("ADMIN_USER or ADMIN_PASS environment variables are not set".into());
        };
        Ok(Self {
            redis_addr: value("REDIS_ADDR").unwrap_or_else(|| DEFAULT_REDIS_ADDR.into()),
            port: value("PORT").unwrap_or_else(|| DEFAULT_PORT.into()),
            admin: AdminCredentials { user, pass },
        })
    }

    pub fn server_address(&self) -> String {
        format!("0.0.0.0:{}", self.port.trim_start_matches(':'))
    }
}
