use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::StoreError;

/// 헤더 행을 가진 CSV 테이블의 행 타입.
pub trait Record: Serialize + DeserializeOwned {
    const HEADERS: &'static [&'static str];
}

/// 파일 하나에 저장되는 CSV 테이블.
///
/// 읽기는 매번 디스크에서 새로 한다. 변경 작업은 `lock()`으로 얻은 가드를
/// 다시 읽기-수정-쓰기 전체 구간 동안 쥐고 있어야 한다. 전체 재기록은 임시
/// 파일에 쓴 뒤 rename 하므로 중간에 죽어도 테이블이 잘리지 않는다.
pub struct CsvTable<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> CsvTable<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// 파일이 없으면 빈 테이블.
    pub async fn load(&self) -> Result<Vec<T>, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let rows = csv::Reader::from_reader(bytes.as_slice())
            .deserialize()
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| StoreError::csv(&self.path, e))?;

        debug!(path = %self.path.display(), rows = rows.len(), "테이블 로드");
        Ok(rows)
    }

    pub async fn rewrite(&self, rows: &[T]) -> Result<(), StoreError> {
        let bytes = encode_rows(rows, true).map_err(|e| StoreError::csv(&self.path, e))?;

        let tmp = self.tmp_path();
        write_and_sync(&tmp, &bytes).await?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;

        debug!(path = %self.path.display(), rows = rows.len(), "테이블 전체 재기록");
        Ok(())
    }

    /// 파일이 이미 있으면 행만 덧붙이고, 없으면 헤더와 함께 새로 만든다.
    pub async fn append(&self, row: &T) -> Result<(), StoreError> {
        if !fs::try_exists(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?
        {
            return self.rewrite(std::slice::from_ref(row)).await;
        }

        let bytes = encode_rows(std::slice::from_ref(row), false)
            .map_err(|e| StoreError::csv(&self.path, e))?;

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        file.sync_all()
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;

        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// 행들을 CSV 바이트로 직렬화한다. 행이 없어도 `with_header`면 헤더는 쓴다.
pub fn encode_rows<T: Record>(rows: &[T], with_header: bool) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    if with_header {
        writer.write_record(T::HEADERS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

async fn write_and_sync(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = fs::File::create(path)
        .await
        .map_err(|e| StoreError::io(path, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| StoreError::io(path, e))?;
    file.sync_all().await.map_err(|e| StoreError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        name: String,
        note: String,
    }

    impl Record for Row {
        const HEADERS: &'static [&'static str] = &["name", "note"];
    }

    fn row(name: &str, note: &str) -> Row {
        Row {
            name: name.to_string(),
            note: note.to_string(),
        }
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let table = CsvTable::<Row>::new(dir.path().join("rows.csv"));

        assert!(table.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn first_append_writes_header_then_appends_rows_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let table = CsvTable::<Row>::new(&path);

        table.append(&row("a", "first")).await.unwrap();
        table.append(&row("b", "has, comma")).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "name,note\na,first\nb,\"has, comma\"\n");
        assert_eq!(
            table.load().await.unwrap(),
            vec![row("a", "first"), row("b", "has, comma")]
        );
    }

    #[tokio::test]
    async fn rewrite_of_empty_table_keeps_header_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let table = CsvTable::<Row>::new(&path);

        table.append(&row("a", "x")).await.unwrap();
        table.rewrite(&[]).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "name,note\n");
        assert!(!dir.path().join("rows.csv.tmp").exists());
    }

    #[tokio::test]
    async fn malformed_table_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        std::fs::write(&path, "name,note\nonly-one-field\n").unwrap();
        let table = CsvTable::<Row>::new(&path);

        assert!(matches!(table.load().await, Err(StoreError::Csv { .. })));
    }
}
