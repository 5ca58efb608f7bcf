use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "スタック設定ファイルが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリ: site.local.kdl, .site.local.kdl, site.kdl, .site.kdl\n\
        - ./.ppinfra/ ディレクトリ\n\
        - ~/.config/ppinfra/site.kdl\n\
        または PPINFRA_CONFIG_PATH 環境変数で直接指定できます"
    )]
    StackFileNotFound,

    #[error("PPINFRA_CONFIG_PATH が存在しないファイルを指しています: {0}")]
    ConfigPathMissing(String),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
