pub mod error;

pub use error::*;

use std::path::{Path, PathBuf};

/// 設定ファイルパスを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "PPINFRA_CONFIG_PATH";

/// スタック設定ファイル名（優先順）
const CANDIDATES: [&str; 4] = ["site.local.kdl", ".site.local.kdl", "site.kdl", ".site.kdl"];

/// プロジェクトのsite.kdlファイルを探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 PPINFRA_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: site.local.kdl, .site.local.kdl, site.kdl, .site.kdl
/// 3. ./.ppinfra/ ディレクトリ内: 同様の順序
/// 4. ~/.config/ppinfra/site.kdl (グローバル設定)
pub fn find_stack_file() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(&config_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::ConfigPathMissing(config_path));
    }

    // 2, 3. プロジェクトディレクトリで検索
    let current_dir = std::env::current_dir()?;
    if let Some(path) = find_stack_file_in(&current_dir) {
        return Ok(path);
    }

    // 4. グローバル設定ファイル (~/.config/ppinfra/site.kdl)
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("ppinfra").join("site.kdl");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::StackFileNotFound)
}

/// 指定ディレクトリとその .ppinfra/ 内で設定ファイルを探す
pub fn find_stack_file_in(dir: &Path) -> Option<PathBuf> {
    let in_dir = |base: &Path| {
        CANDIDATES
            .iter()
            .map(|name| base.join(name))
            .find(|path| path.is_file())
    };

    if let Some(path) = in_dir(dir) {
        return Some(path);
    }

    let ppinfra_dir = dir.join(".ppinfra");
    if ppinfra_dir.is_dir() {
        return in_dir(&ppinfra_dir);
    }

    None
}
