//! 單次計算的記憶快取

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

use order_core::Result;

/// 按鍵記憶的讀取快取
///
/// 每個鍵一個 `OnceCell`：同鍵的併發請求只觸發一次後端呼叫（single-flight），
/// 成功值與 NotFound 哨兵都會被快取，失敗不快取、由呼叫方決定是否重試。
pub struct MemoCache<K, V> {
    entries: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// 創建空的快取
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn cell(&self, key: K) -> Arc<OnceCell<V>> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.entry(key).or_default().clone()
    }

    /// 讀取快取值，未命中時以 `fetch` 取得並記憶
    pub async fn get_or_try_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let cell = self.cell(key);
        let value = cell.get_or_try_init(fetch).await?;
        Ok(value.clone())
    }

    /// 讀取已快取的值，未快取回傳 `None`
    pub fn peek(&self, key: &K) -> Option<V> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.get(key).and_then(|cell| cell.get().cloned())
    }

    /// 寫入批次取得的值；已存在的值保持不變
    pub fn insert(&self, key: K, value: V) {
        let cell = self.cell(key);
        let _ = cell.set(value);
    }
}

impl<K, V> Default for MemoCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
