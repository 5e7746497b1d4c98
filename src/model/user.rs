use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entity::user::{Model as Account, Role};

pub const MASKED_PASSWORD: &str = "********";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl AccountResponse {
    pub fn from_model(model: Account, reveal: bool) -> Self {
        Self {
            username: model.username,
            password: if reveal { model.password } else { MASKED_PASSWORD.to_string() },
            role: model.role,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsersQuery {
    /// 저장된 비밀번호 값(해시) 표시 여부
    #[serde(default)]
    pub reveal: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
}
