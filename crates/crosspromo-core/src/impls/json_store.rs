//! JsonFilePromoStore - 単一 JSON ファイルに永続化するストア
//!
//! # 設計原則
//! - 起動時に全件ロード、以後はメモリが読み取りの正本
//! - 変更ごとに tmp ファイルへ書き出して rename（途中状態を残さない）
//! - 書き込みに失敗した変更はメモリ側もロールバックする

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::table::PromoTable;
use crate::domain::{MessageRef, PromoId, PromoRecord, StoreError, Target};
use crate::ports::PromoStore;

const TEMP_FILE_SUFFIX: &str = ".tmp";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    promos: Vec<PromoRecord>,
}

/// JsonFilePromoStore は再起動をまたいでレコードを保持する
pub struct JsonFilePromoStore {
    path: PathBuf,
    table: Mutex<PromoTable>,
}

impl JsonFilePromoStore {
    /// Open (or create on first write) the store at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let table = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => PromoTable::default(),
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                if snapshot.version != FORMAT_VERSION {
                    return Err(StoreError::Corrupt(format!(
                        "unsupported promo store version {} in {}",
                        snapshot.version,
                        path.display()
                    )));
                }
                PromoTable::from_records(snapshot.promos)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => PromoTable::default(),
            Err(err) => return Err(err.into()),
        };
        tracing::info!(path = %path.display(), records = table.len(), "promo store loaded");
        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, table: &PromoTable) -> Result<(), StoreError> {
        let snapshot = Snapshot {
            version: FORMAT_VERSION,
            promos: table.sorted(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| StoreError::Unavailable(format!("encode promo snapshot: {e}")))?;
        write_atomic(&self.path, &bytes).await?;
        Ok(())
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = PathBuf::from(format!("{}{}", path.display(), TEMP_FILE_SUFFIX));
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

#[async_trait]
impl PromoStore for JsonFilePromoStore {
    async fn save(&self, record: PromoRecord) -> Result<PromoId, StoreError> {
        let id = record.promo_id;
        let mut table = self.table.lock().await;
        let mut next = table.clone();
        next.insert(record);
        self.persist(&next).await?;
        *table = next;
        Ok(id)
    }

    async fn get(&self, promo_id: &PromoId) -> Result<Option<PromoRecord>, StoreError> {
        Ok(self.table.lock().await.get(promo_id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<PromoRecord>, StoreError> {
        Ok(self.table.lock().await.sorted())
    }

    async fn delete(&self, target: &Target, message_ref: MessageRef) -> Result<bool, StoreError> {
        let mut table = self.table.lock().await;
        let mut next = table.clone();
        if next.remove(target, message_ref).is_none() {
            return Ok(false);
        }
        self.persist(&next).await?;
        *table = next;
        Ok(true)
    }
}
