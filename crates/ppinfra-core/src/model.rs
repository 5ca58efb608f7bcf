//! サイト設定モデル
//!
//! スタック単位のキー/値設定と、デフォルト値を適用したサイト設定の定義

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 同期するローカルディレクトリのデフォルト
pub const DEFAULT_PATH: &str = "./www";

/// インデックスドキュメントのデフォルト
pub const DEFAULT_INDEX_DOCUMENT: &str = "index.html";

/// エラードキュメントのデフォルト
pub const DEFAULT_ERROR_DOCUMENT: &str = "error.html";

/// プロバイダーのデフォルトリージョン
pub const DEFAULT_REGION: &str = "us-east-1";

/// デフォルトのプロジェクト名
pub const DEFAULT_PROJECT: &str = "ppinfra";

/// 設定キー
pub mod keys {
    pub const PATH: &str = "path";
    pub const INDEX_DOCUMENT: &str = "indexDocument";
    pub const ERROR_DOCUMENT: &str = "errorDocument";
    pub const REGION: &str = "region";
}

/// スタックにスコープされたキー/値設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackConfig {
    /// スタック名（dev, prod など）
    pub stack: String,

    /// 設定値（キーは camelCase に正規化済み）
    pub values: BTreeMap<String, String>,
}

impl StackConfig {
    pub fn new(stack: impl Into<String>) -> Self {
        Self {
            stack: stack.into(),
            values: BTreeMap::new(),
        }
    }

    /// 値を設定（キーは正規化される）
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(canonical_key(key), value.into());
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// 値を取得。空文字列は未設定として扱う
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&canonical_key(key))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// 別の設定で上書き
    pub fn merge(&mut self, other: &StackConfig) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }
}

/// キー名を camelCase に正規化（`index-document`, `index_document` → `indexDocument`）
pub fn canonical_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '-' || c == '_' {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// デフォルト適用済みのサイト設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    /// バケットに同期するローカルディレクトリ
    pub path: String,

    /// インデックスドキュメント名
    pub index_document: String,

    /// エラードキュメント名（CDNのカスタムエラーページにも使用）
    pub error_document: String,

    /// プロバイダーのリージョン
    pub region: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_PATH.to_string(),
            index_document: DEFAULT_INDEX_DOCUMENT.to_string(),
            error_document: DEFAULT_ERROR_DOCUMENT.to_string(),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl SiteConfig {
    /// スタック設定から解決。値の検証は行わない
    pub fn resolve(config: &StackConfig) -> Self {
        let pick = |key: &str, default: &str| config.get(key).unwrap_or(default).to_string();
        Self {
            path: pick(keys::PATH, DEFAULT_PATH),
            index_document: pick(keys::INDEX_DOCUMENT, DEFAULT_INDEX_DOCUMENT),
            error_document: pick(keys::ERROR_DOCUMENT, DEFAULT_ERROR_DOCUMENT),
            region: pick(keys::REGION, DEFAULT_REGION),
        }
    }

    /// CDNのカスタムエラーレスポンスのパス
    pub fn error_page_path(&self) -> String {
        format!("/{}", self.error_document)
    }
}
