pub mod error;
pub mod model;
pub mod outputs;
pub mod parser;
pub mod stack;

pub use error::*;
pub use model::*;
pub use outputs::StackOutputs;
pub use parser::{StackFile, load_stack_file, parse_stack_file};
pub use stack::{declare_site, declare_site_for};

use ppinfra_cloud::ResourceGraph;
use std::path::Path;

/// 解決済みスタック: 設定とそこから宣言されたグラフ
#[derive(Debug, Clone)]
pub struct ResolvedStack {
    pub project: String,
    pub config: StackConfig,
    pub site: SiteConfig,
    pub graph: ResourceGraph,
}

/// スタック設定を解決してグラフを宣言する
///
/// `file` が None の場合は全てデフォルト値。`overrides` はファイルの値より優先される。
pub fn resolve_stack(
    file: Option<&Path>,
    stack: &str,
    overrides: &StackConfig,
) -> Result<ResolvedStack> {
    let parsed = match file {
        Some(path) => load_stack_file(path, stack)?,
        None => StackFile {
            config: StackConfig::new(stack),
            ..Default::default()
        },
    };

    let mut config = parsed.config;
    config.merge(overrides);

    let project = parsed
        .project
        .unwrap_or_else(|| DEFAULT_PROJECT.to_string());
    let site = SiteConfig::resolve(&config);
    let graph = declare_site_for(&project, &site);
    graph.validate()?;

    tracing::debug!(
        "スタック {} を解決しました（リソース {}個）",
        stack,
        graph.len()
    );

    Ok(ResolvedStack {
        project,
        config,
        site,
        graph,
    })
}
