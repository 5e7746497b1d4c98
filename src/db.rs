use tracing::{info, instrument};

use crate::configuration::Settings;
use crate::store::{IncidentStore, UserStore};

/// 계정 테이블과 신고 테이블. `web::Data`로 공유한다.
pub struct Storage {
    pub users: UserStore,
    pub incidents: IncidentStore,
}

impl Storage {
    pub fn new(settings: &Settings) -> Self {
        Self {
            users: UserStore::with_cost(settings.users_path(), settings.bcrypt_cost),
            incidents: IncidentStore::new(settings.incidents_path(), settings.image_dir()),
        }
    }
}

#[instrument(skip(settings), fields(data_dir = %settings.data_dir.display()))]
pub async fn init_storage(settings: &Settings) -> anyhow::Result<Storage> {
    info!("저장소 디렉터리 준비 중...");
    tokio::fs::create_dir_all(&settings.data_dir).await?;

    let storage = Storage::new(settings);
    storage.incidents.ensure_image_dir().await?;

    if let Some(admin) = &settings.admin {
        if storage.users.ensure_admin(&admin.username, &admin.password).await? {
            info!(username = %admin.username, "초기 관리자 계정 생성");
        }
    }

    info!("저장소 준비 완료");
    Ok(storage)
}
