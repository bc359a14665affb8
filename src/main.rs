use anyhow::{Context, Result};
use clap::Parser;

use quiz_extract::cli::{Cli, Command, RunOptions};
use quiz_extract::utils::logging;
use quiz_extract::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // .env 不存在时忽略
    let _ = dotenvy::dotenv();

    // 初始化日志
    logging::init();

    let cli = Cli::parse();

    // 加载配置（缺少 API Key 时直接退出，不处理任何文件）
    let config = Config::from_env().context("配置加载失败")?;

    match cli.command {
        Command::Run(args) => {
            let options = RunOptions::from_args(args, &config);
            App::initialize(config, options)?.run().await?;
        }
    }

    Ok(())
}
