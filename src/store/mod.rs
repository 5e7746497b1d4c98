pub mod incident;
pub mod table;
pub mod user;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use incident::{IncidentStore, IncidentUpdate, NewIncident, ReportFilter};
pub use user::UserStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("파일 입출력 실패 ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV 테이블 처리 실패 ({path}): {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("저장할 수 없는 비밀번호: {0}")]
    InvalidPassword(&'static str),

    #[error("비밀번호 해시 처리 실패: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        StoreError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}
