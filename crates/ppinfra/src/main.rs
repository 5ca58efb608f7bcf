mod commands;
mod utils;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ppinfra_pulumi::PulumiEngine;
use std::path::PathBuf;

const PROJECT_DESCRIPTION: &str = "Static website hosting: S3 website bucket behind CloudFront";

#[derive(Parser)]
#[command(name = "ppinfra")]
#[command(about = "静的サイトの配信基盤を宣言し、Pulumiに渡す。", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// スタック指定と設定の上書き（全コマンド共通）
#[derive(Args, Debug, Clone)]
pub struct StackArgs {
    /// スタック名 (dev, prod など)
    stack: Option<String>,
    /// スタック名 (-s/--stack フラグ、PPINFRA_STACK 環境変数)
    #[arg(
        short = 's',
        long = "stack",
        env = "PPINFRA_STACK",
        conflicts_with = "stack",
        hide = true
    )]
    stack_flag: Option<String>,
    /// 設定値を上書き（例: -c errorDocument=404.html）
    #[arg(short = 'c', long = "config", value_name = "KEY=VALUE")]
    config: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RenderFormat {
    /// 宣言したリソースグラフ
    Json,
    /// Pulumi YAML プログラム
    Yaml,
}

#[derive(Subcommand)]
enum Commands {
    /// リソースグラフを出力（外部ツール不要）
    Render {
        #[command(flatten)]
        stack: StackArgs,
        /// 出力形式
        #[arg(short, long, value_enum, default_value = "json")]
        format: RenderFormat,
        /// 出力先ファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 変更内容をプレビュー（pulumi preview）
    Preview {
        #[command(flatten)]
        stack: StackArgs,
    },
    /// スタックを適用（pulumi up）
    Up {
        #[command(flatten)]
        stack: StackArgs,
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },
    /// スタックの出力を表示
    Outputs {
        #[command(flatten)]
        stack: StackArgs,
        /// JSONで出力
        #[arg(long)]
        json: bool,
    },
    /// 設定を検証
    Validate {
        #[command(flatten)]
        stack: StackArgs,
    },
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout は render の出力に使うので、ログは stderr に出す
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("ppinfra {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let project_root = std::env::current_dir()?;

    match cli.command {
        Commands::Render {
            stack,
            format,
            output,
        } => {
            let loaded = utils::load_stack(&stack)?;
            commands::render::handle(&loaded, format, output.as_deref())?;
        }
        Commands::Preview { stack } => {
            let loaded = utils::load_stack(&stack)?;
            let engine = engine_for(&project_root, &loaded);
            commands::preview::handle(&loaded, &engine).await?;
        }
        Commands::Up { stack, yes } => {
            let loaded = utils::load_stack(&stack)?;
            let engine = engine_for(&project_root, &loaded);
            commands::up::handle(&loaded, &engine, yes).await?;
        }
        Commands::Outputs { stack, json } => {
            let loaded = utils::load_stack(&stack)?;
            let engine = engine_for(&project_root, &loaded);
            commands::outputs::handle(&loaded, &engine, json).await?;
        }
        Commands::Validate { stack } => {
            let loaded = utils::load_stack(&stack)?;
            commands::validate::handle(&loaded);
        }
        Commands::Version => {
            unreachable!("Version is handled before config loading");
        }
    }

    Ok(())
}

fn engine_for(project_root: &std::path::Path, loaded: &utils::LoadedStack) -> PulumiEngine {
    PulumiEngine::new(project_root, loaded.stack_name.clone()).with_description(PROJECT_DESCRIPTION)
}
