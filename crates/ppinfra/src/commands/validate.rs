use crate::utils::{self, LoadedStack};
use colored::Colorize;

/// グラフはロード時に検証済みなので、ここでは内容を表示するだけ
pub fn handle(loaded: &LoadedStack) {
    println!("{}", "設定を検証中...".blue());
    utils::print_loaded_config_file(loaded);
    println!();

    utils::print_stack_summary(loaded);

    let graph = &loaded.resolved.graph;
    println!();
    println!("{}", format!("出力 ({} 個):", graph.outputs.len()).bold());
    for output in &graph.outputs {
        let refs: Vec<String> = output.references().map(|r| r.to_string()).collect();
        println!("  • {} ← {}", output.name.cyan(), refs.join(", "));
    }

    println!();
    println!("{}", "✓ 設定は正常です！".green().bold());
}
