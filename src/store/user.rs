use std::path::PathBuf;

use bcrypt::{DEFAULT_COST, non_truncating_hash, non_truncating_verify};
use tracing::{info, instrument, warn};

use super::StoreError;
use super::table::CsvTable;
use crate::entity::user::{Model as Account, Role};

/// bcrypt는 입력 끝에 NUL 바이트를 붙여 72바이트까지만 쓴다.
pub const MAX_PASSWORD_BYTES: usize = 71;

/// 잘리지 않고 그대로 해시되는 비밀번호인지 확인한다. 아니면 사유를 돌려준다.
pub fn check_password(password: &str) -> Result<(), &'static str> {
    if password.is_empty() {
        return Err("비밀번호는 필수입니다.");
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err("비밀번호는 71바이트 이하여야 합니다.");
    }
    if password.contains('\0') {
        return Err("비밀번호에 NUL 문자를 쓸 수 없습니다.");
    }
    Ok(())
}

pub struct UserStore {
    table: CsvTable<Account>,
    cost: u32,
}

impl UserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_cost(path, DEFAULT_COST)
    }

    pub fn with_cost(path: impl Into<PathBuf>, cost: u32) -> Self {
        Self {
            table: CsvTable::new(path),
            cost,
        }
    }

    pub async fn load_users(&self) -> Result<Vec<Account>, StoreError> {
        self.table.load().await
    }

    pub async fn find(&self, username: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .load_users()
            .await?
            .into_iter()
            .find(|a| a.username == username))
    }

    /// 이미 있는 사용자명이면 아무것도 바꾸지 않고 `false`.
    #[instrument(skip(self, password))]
    pub async fn save_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<bool, StoreError> {
        check_password(password).map_err(StoreError::InvalidPassword)?;

        let _guard = self.table.lock().await;
        let mut accounts = self.table.load().await?;

        if accounts.iter().any(|a| a.username == username) {
            return Ok(false);
        }

        accounts.push(Account {
            username: username.to_string(),
            password: non_truncating_hash(password, self.cost)?,
            role,
        });
        self.table.rewrite(&accounts).await?;

        info!("계정 저장 완료");
        Ok(true)
    }

    /// 사용자명과 비밀번호가 정확히 일치하는 계정의 역할.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Role>, StoreError> {
        // 저장될 수 없는 비밀번호는 어떤 계정과도 일치하지 않는다
        if check_password(password).is_err() {
            return Ok(None);
        }

        let accounts = self.table.load().await?;

        for account in accounts.iter().filter(|a| a.username == username) {
            match non_truncating_verify(password, &account.password) {
                Ok(true) => return Ok(Some(account.role)),
                Ok(false) => {}
                // 손으로 편집된 행 등 해시가 아닌 값은 불일치로 취급
                Err(e) => warn!("저장된 비밀번호 해시를 검증할 수 없습니다: {}", e),
            }
        }

        Ok(None)
    }

    /// 해당 사용자명의 모든 행을 갱신한다. 일치하는 행이 없으면 `false`.
    #[instrument(skip(self, new_password))]
    pub async fn reset_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> Result<bool, StoreError> {
        check_password(new_password).map_err(StoreError::InvalidPassword)?;

        let _guard = self.table.lock().await;
        let mut accounts = self.table.load().await?;

        let hashed = non_truncating_hash(new_password, self.cost)?;
        let mut matched = false;
        for account in accounts.iter_mut().filter(|a| a.username == username) {
            account.password = hashed.clone();
            matched = true;
        }

        if matched {
            self.table.rewrite(&accounts).await?;
            info!("비밀번호 재설정 완료");
        }
        Ok(matched)
    }

    /// 해당 사용자명의 모든 행을 지운다. 나머지 행의 순서는 그대로.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, username: &str) -> Result<bool, StoreError> {
        let _guard = self.table.lock().await;
        let mut accounts = self.table.load().await?;

        let before = accounts.len();
        accounts.retain(|a| a.username != username);
        if accounts.len() == before {
            return Ok(false);
        }

        self.table.rewrite(&accounts).await?;
        info!(removed = before - accounts.len(), "계정 삭제 완료");
        Ok(true)
    }

    /// 관리자 계정이 없으면 만든다. 새로 만들었으면 `true`.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, StoreError> {
        self.save_user(username, password, Role::Admin).await
    }
}
