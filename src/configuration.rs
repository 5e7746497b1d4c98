use std::env;
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, anyhow};

use crate::store::user::check_password;

pub const USERS_FILE: &str = "users.csv";
pub const INCIDENTS_FILE: &str = "incident_reports.csv";
pub const IMAGE_DIR: &str = "incident_images";

// 최대 10년
const SESSION_TTL_HOURS_RANGE: RangeInclusive<i64> = 1..=24 * 365 * 10;
const BCRYPT_COST_RANGE: RangeInclusive<u32> = 4..=31;

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub max_upload_bytes: usize,
    pub bcrypt_cost: u32,
    pub admin: Option<AdminSeed>,
}

impl Settings {
    /// 환경 변수에서 설정을 읽는다. `.env`는 호출 전에 로드되어 있어야 한다.
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.is_empty() {
            return Err(anyhow!("JWT_SECRET must not be empty"));
        }

        let admin = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Some(AdminSeed { username, password })
            }
            _ => None,
        };

        let settings = Self {
            host: env_or("APP_HOST", "127.0.0.1".to_string())?,
            port: env_or("APP_PORT", 8080)?,
            data_dir: env_or("DATA_DIR", PathBuf::from("."))?,
            jwt_secret,
            session_ttl_hours: env_or("SESSION_TTL_HOURS", 24)?,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            bcrypt_cost: env_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            admin,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// 범위를 벗어난 값은 서버를 띄우기 전에 거부한다.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !SESSION_TTL_HOURS_RANGE.contains(&self.session_ttl_hours) {
            return Err(anyhow!(
                "SESSION_TTL_HOURS 값은 {}..={} 사이여야 합니다: {}",
                SESSION_TTL_HOURS_RANGE.start(),
                SESSION_TTL_HOURS_RANGE.end(),
                self.session_ttl_hours
            ));
        }
        if !BCRYPT_COST_RANGE.contains(&self.bcrypt_cost) {
            return Err(anyhow!(
                "BCRYPT_COST 값은 {}..={} 사이여야 합니다: {}",
                BCRYPT_COST_RANGE.start(),
                BCRYPT_COST_RANGE.end(),
                self.bcrypt_cost
            ));
        }
        if let Some(admin) = &self.admin {
            check_password(&admin.password)
                .map_err(|reason| anyhow!("ADMIN_PASSWORD 값이 잘못되었습니다: {}", reason))?;
        }
        Ok(())
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE)
    }

    pub fn incidents_path(&self) -> PathBuf {
        self.data_dir.join(INCIDENTS_FILE)
    }

    pub fn image_dir(&self) -> PathBuf {
        self.data_dir.join(IMAGE_DIR)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} 값이 잘못되었습니다 ({}): {}", key, raw, e)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("."),
            jwt_secret: "secret".to_string(),
            session_ttl_hours: 24,
            max_upload_bytes: 1024,
            bcrypt_cost: 4,
            admin: None,
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(settings().validate().is_ok());
    }

    #[test]
    fn out_of_range_session_ttl_is_rejected() {
        for hours in [0, -1, i64::MAX] {
            let s = Settings { session_ttl_hours: hours, ..settings() };
            assert!(s.validate().is_err(), "hours = {hours}");
        }
    }

    #[test]
    fn out_of_range_bcrypt_cost_is_rejected() {
        for cost in [3, 32] {
            let s = Settings { bcrypt_cost: cost, ..settings() };
            assert!(s.validate().is_err(), "cost = {cost}");
        }
    }

    #[test]
    fn unhashable_admin_password_is_rejected() {
        let s = Settings {
            admin: Some(AdminSeed {
                username: "admin".to_string(),
                password: "a".repeat(100),
            }),
            ..settings()
        };
        assert!(s.validate().is_err());
    }
}
