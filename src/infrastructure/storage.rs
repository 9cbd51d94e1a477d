// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::config::settings::StorageSettings;
use crate::domain::repositories::asset_repository::{AssetStore, StorageError, StoredAsset};

// 内容类型附属文件的扩展名
const CONTENT_TYPE_SUFFIX: &str = ".content-type";

/// 本地文件系统存储实现
///
/// 每个键对应一个数据文件，以及一个保存内容类型的附属文件
pub struct LocalAssetStore {
    base_path: PathBuf,
}

impl LocalAssetStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn get_full_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        // 键只能是单个路径段
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(StorageError::Other(format!("Invalid asset key: {:?}", key)));
        }
        Ok(self.base_path.join(key))
    }

    fn content_type_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(CONTENT_TYPE_SUFFIX);
        PathBuf::from(name)
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn put(&self, key: &str, content_type: &str, data: &[u8]) -> Result<(), StorageError> {
        let full_path = self.get_full_path(key)?;

        // 确保目录存在
        fs::create_dir_all(&self.base_path).await?;

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        fs::write(Self::content_type_path(&full_path), content_type).await?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredAsset, StorageError> {
        let full_path = self.get_full_path(key)?;

        let data = match fs::read(&full_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        let content_type = match fs::read_to_string(Self::content_type_path(&full_path)).await {
            Ok(ct) => ct,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(StorageError::Io(e)),
        };

        Ok(StoredAsset { content_type, data })
    }
}

/// 内存存储实现，资源只在进程生命周期内有效
pub struct InMemoryAssetStore {
    data: Arc<RwLock<HashMap<String, StoredAsset>>>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryAssetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn put(&self, key: &str, content_type: &str, data: &[u8]) -> Result<(), StorageError> {
        let mut map = self.data.write().await;
        map.insert(
            key.to_string(),
            StoredAsset {
                content_type: content_type.to_string(),
                data: data.to_vec(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredAsset, StorageError> {
        let map = self.data.read().await;
        map.get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

/// 存储工厂函数
pub fn create_asset_store(settings: &StorageSettings) -> Result<Arc<dyn AssetStore>, StorageError> {
    match settings.storage_type.as_str() {
        "memory" => Ok(Arc::new(InMemoryAssetStore::new())),
        "local" => {
            let base_path = settings
                .local_path
                .as_ref()
                .cloned()
                .unwrap_or_else(|| "./storage".to_string());
            Ok(Arc::new(LocalAssetStore::new(base_path)))
        }

        other => Err(StorageError::Other(format!(
            "Unsupported storage type: {}",
            other
        ))),
    }
}
