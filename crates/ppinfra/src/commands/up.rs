use crate::commands::preview::ensure_authenticated;
use crate::commands::outputs::print_outputs;
use crate::utils::{self, LoadedStack};
use colored::Colorize;
use ppinfra_cloud::ProvisioningEngine;
use ppinfra_core::StackOutputs;

pub async fn handle(
    loaded: &LoadedStack,
    engine: &dyn ProvisioningEngine,
    yes: bool,
) -> anyhow::Result<()> {
    println!("{}", "スタックを適用します...".blue().bold());
    utils::print_loaded_config_file(loaded);
    println!();
    utils::print_stack_summary(loaded);

    // 確認（--yesが指定されていない場合）
    if !yes {
        println!();
        println!(
            "{}",
            "警告: クラウド上のリソースを作成・更新します。".yellow()
        );
        println!("実行するには --yes オプションを指定してください");
        return Ok(());
    }

    ensure_authenticated(engine).await?;

    println!();
    println!("{}", format!("{} で適用中...", engine.display_name()).blue());
    let result = engine.submit(&loaded.resolved.graph).await?;

    println!();
    println!("{} {}", "✓ 適用完了:".green().bold(), result.summary);
    println!("  ({}ms)", result.duration_ms);

    // 出力の取得は失敗しても適用結果には影響しない
    match engine.attributes().await {
        Ok(attributes) => {
            let outputs = StackOutputs::project(&loaded.resolved.graph, &attributes);
            println!();
            print_outputs(&outputs);
        }
        Err(e) => {
            tracing::warn!("出力を取得できませんでした: {}", e);
            println!(
                "{}",
                "⚠ 出力を取得できませんでした。`ppinfra outputs` で再取得できます".yellow()
            );
        }
    }

    Ok(())
}
