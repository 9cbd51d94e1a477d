// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 资源不存在
    #[error("No asset with key {0:?}")]
    NotFound(String),
    /// 存储错误
    #[error("Storage error: {0}")]
    Other(String),
}

/// 已存储的资源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// 内容类型
    pub content_type: String,
    /// 原始字节
    pub data: Vec<u8>,
}

/// 资源存储特质
///
/// 以调用方给定的键存取二进制资源（主要是下载的图片）
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// 使用指定键保存资源及其内容类型
    async fn put(&self, key: &str, content_type: &str, data: &[u8]) -> Result<(), StorageError>;

    /// 根据键读取资源，不存在时返回 `StorageError::NotFound`
    async fn get(&self, key: &str) -> Result<StoredAsset, StorageError>;
}
