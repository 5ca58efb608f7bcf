use crate::RenderFormat;
use crate::utils::LoadedStack;
use colored::Colorize;
use ppinfra_pulumi::RenderOptions;
use std::path::Path;

pub fn handle(
    loaded: &LoadedStack,
    format: RenderFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let graph = &loaded.resolved.graph;

    let content = match format {
        RenderFormat::Json => {
            let mut json = graph.to_json()?;
            json.push('\n');
            json
        }
        // パスはプロジェクトルート相対のまま出力する
        RenderFormat::Yaml => ppinfra_pulumi::to_yaml(graph, &RenderOptions::default())?,
    };

    match output {
        Some(path) => {
            std::fs::write(path, &content)?;
            eprintln!(
                "{} {}",
                "✓ 書き出しました:".green(),
                path.display().to_string().cyan()
            );
        }
        None => print!("{}", content),
    }

    Ok(())
}
