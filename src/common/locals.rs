//! ミドルウェアとハンドラー間で共有する値の格納領域

use std::any::Any;
use std::collections::HashMap;

/// リクエスト単位の共有値（型付きのキー・バリュー）
#[derive(Debug, Default)]
pub struct Locals {
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Locals {
    /// 新しいLocalsを作成
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// 値を設定
    pub fn set<T: Send + Sync + 'static>(&mut self, key: &str, value: T) {
        self.values.insert(key.to_string(), Box::new(value));
    }

    /// 値を取得
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.values
            .get(key)
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// 値を削除して返却
    pub fn remove<T: 'static>(&mut self, key: &str) -> Option<T> {
        self.values
            .remove(key)
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// 指定されたキーが存在するかチェック
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Clone for Locals {
    fn clone(&self) -> Self {
        // Anyはcloneできないため、複製時は空になる
        Self::new()
    }
}
