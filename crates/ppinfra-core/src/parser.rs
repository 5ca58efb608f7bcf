//! スタック設定ファイルのパース
//!
//! ```kdl
//! project "ppinfra"
//!
//! config {
//!     region "us-east-1"
//! }
//!
//! stack "prod" {
//!     path "./dist"
//!     index-document "home.html"
//!     error-document "404.html"
//! }
//! ```
//!
//! トップレベルの `config` は全スタック共通、`stack` ブロックが優先される。

use crate::error::{Result, SiteError};
use crate::model::StackConfig;
use kdl::{KdlDocument, KdlNode};
use std::path::Path;

/// パース済みスタック設定ファイル
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackFile {
    /// プロジェクト名（未指定なら None）
    pub project: Option<String>,

    /// ファイル内で定義されているスタック名（出現順）
    pub stacks: Vec<String>,

    /// 選択したスタックの設定
    pub config: StackConfig,
}

/// KDL文字列から指定スタックの設定を取り出す
pub fn parse_stack_file(content: &str, stack: &str) -> Result<StackFile> {
    let doc: KdlDocument = content.parse()?;

    let mut file = StackFile {
        config: StackConfig::new(stack),
        ..Default::default()
    };
    let mut shared = StackConfig::new(stack);
    let mut selected = StackConfig::new(stack);

    for node in doc.nodes() {
        match node.name().value() {
            "project" => {
                file.project = Some(first_string(node).ok_or_else(|| {
                    SiteError::InvalidConfig("project requires a name".to_string())
                })?);
            }
            "config" => {
                collect_values(node, &mut shared);
            }
            "stack" => {
                let name = first_string(node).ok_or_else(|| {
                    SiteError::InvalidConfig("stack requires a name".to_string())
                })?;
                if name == stack {
                    // 同名ブロックが複数あれば後勝ち
                    collect_values(node, &mut selected);
                }
                if !file.stacks.contains(&name) {
                    file.stacks.push(name);
                }
            }
            other => {
                tracing::warn!("不明なノードを無視します: {}", other);
            }
        }
    }

    file.config.merge(&shared);
    file.config.merge(&selected);
    Ok(file)
}

/// ファイルから指定スタックの設定を読み込む
pub fn load_stack_file(path: &Path, stack: &str) -> Result<StackFile> {
    let content = std::fs::read_to_string(path).map_err(|e| SiteError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    tracing::debug!("スタック設定を読み込みました: {}", path.display());
    parse_stack_file(&content, stack)
}

fn first_string(node: &KdlNode) -> Option<String> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

/// 子ノードを `key "value"` として収集。文字列以外の値は無視してデフォルトに任せる
fn collect_values(node: &KdlNode, config: &mut StackConfig) {
    let Some(children) = node.children() else {
        return;
    };
    for child in children.nodes() {
        let key = child.name().value();
        match first_string(child) {
            Some(value) => config.set(key, value),
            None => {
                tracing::warn!("設定 '{}' の値が文字列ではないため無視します", key);
            }
        }
    }
}
