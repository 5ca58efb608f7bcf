use crate::utils::{self, LoadedStack};
use colored::Colorize;
use ppinfra_cloud::ProvisioningEngine;

pub async fn handle(loaded: &LoadedStack, engine: &dyn ProvisioningEngine) -> anyhow::Result<()> {
    println!("{}", "プレビューを開始します...".blue().bold());
    utils::print_loaded_config_file(loaded);
    println!();
    utils::print_stack_summary(loaded);

    ensure_authenticated(engine).await?;

    println!();
    println!("{}", format!("{} に問い合わせ中...", engine.display_name()).blue());
    let result = engine.preview(&loaded.resolved.graph).await?;

    println!();
    if result.summary.has_changes() {
        println!("{} {}", "変更予定:".yellow().bold(), result.summary);
    } else {
        println!("{}", "✓ 変更はありません".green());
    }
    println!("  ({}ms)", result.duration_ms);

    Ok(())
}

/// エンジンの認証状態を確認（未認証ならエラー）
pub async fn ensure_authenticated(engine: &dyn ProvisioningEngine) -> anyhow::Result<()> {
    let auth = engine.check_auth().await?;
    if !auth.authenticated {
        return Err(anyhow::anyhow!(
            "{} が利用できません: {}",
            engine.display_name(),
            auth.error.unwrap_or_else(|| "不明なエラー".to_string())
        ));
    }
    if let Some(account) = &auth.account_info {
        println!("{} {}", "認証済み:".green(), account);
    }
    Ok(())
}
