use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::table::Record;

/// `users.csv` 한 행. `password`에는 bcrypt 해시가 들어간다.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl Record for Model {
    const HEADERS: &'static [&'static str] = &["username", "password", "role"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
