use crate::StackArgs;
use colored::Colorize;
use ppinfra_config::ConfigError;
use ppinfra_core::{ResolvedStack, StackConfig};
use std::path::PathBuf;

/// スタック未指定時のデフォルト
pub const DEFAULT_STACK: &str = "dev";

/// 読み込み済みスタック
pub struct LoadedStack {
    pub stack_name: String,
    pub config_file: Option<PathBuf>,
    pub resolved: ResolvedStack,
}

/// スタック名を決定する（位置引数 > -s/--stack > デフォルト）
pub fn determine_stack_name(args: &StackArgs) -> String {
    args.stack
        .clone()
        .or_else(|| args.stack_flag.clone())
        .unwrap_or_else(|| DEFAULT_STACK.to_string())
}

/// `-c key=value` を設定に変換
pub fn parse_overrides(stack: &str, pairs: &[String]) -> anyhow::Result<StackConfig> {
    let mut config = StackConfig::new(stack);
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            anyhow::anyhow!("設定の上書きは KEY=VALUE 形式で指定してください: {}", pair)
        })?;
        if key.trim().is_empty() {
            return Err(anyhow::anyhow!("設定キーが空です: {}", pair));
        }
        config.set(key.trim(), value);
    }
    Ok(config)
}

/// 設定ファイルを探してスタックを解決する
///
/// 設定ファイルが無い場合は全てデフォルト値で続行する。
pub fn load_stack(args: &StackArgs) -> anyhow::Result<LoadedStack> {
    let stack_name = determine_stack_name(args);
    if !ppinfra_cloud::is_valid_stack_name(&stack_name) {
        return Err(anyhow::anyhow!(
            "無効なスタック名です（'/', '\\', '..' は使えません）: {}",
            stack_name
        ));
    }
    let overrides = parse_overrides(&stack_name, &args.config)?;

    let config_file = match ppinfra_config::find_stack_file() {
        Ok(path) => Some(path),
        Err(ConfigError::StackFileNotFound) => {
            tracing::warn!("スタック設定ファイルが見つかりません。デフォルト値を使用します");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let resolved = ppinfra_core::resolve_stack(config_file.as_deref(), &stack_name, &overrides)?;

    Ok(LoadedStack {
        stack_name,
        config_file,
        resolved,
    })
}

/// 読み込んだ設定ファイル情報を表示
pub fn print_loaded_config_file(loaded: &LoadedStack) {
    match &loaded.config_file {
        Some(path) => {
            println!("📄 読み込んだ設定ファイル:");
            println!("  • {}", path.display().to_string().cyan());
        }
        None => {
            println!("{}", "📄 設定ファイルなし（デフォルト値を使用）".dimmed());
        }
    }
}

/// サイト設定とリソース一覧を表示
pub fn print_stack_summary(loaded: &LoadedStack) {
    let resolved = &loaded.resolved;
    let site = &resolved.site;

    println!("プロジェクト: {}", resolved.project.cyan());
    println!("スタック: {}", loaded.stack_name.cyan());
    println!();
    println!("{}", "サイト設定:".bold());
    println!("  path:          {}", site.path);
    println!("  indexDocument: {}", site.index_document);
    println!("  errorDocument: {}", site.error_document);
    println!("  region:        {}", site.region);
    println!();
    println!(
        "{}",
        format!("リソース ({} 個):", resolved.graph.len()).bold()
    );
    for resource in resolved.graph.iter() {
        if resource.depends_on.is_empty() {
            println!("  • {} ({})", resource.name.cyan(), resource.type_token);
        } else {
            println!(
                "  • {} ({}) ← {}",
                resource.name.cyan(),
                resource.type_token,
                resource.depends_on.join(", ")
            );
        }
    }
}
