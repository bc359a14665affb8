//! 命令行参数
//!
//! `quiz-extract run --in <dir> --out <dir> --type {fa|mealy|moore|dfa} --refresh --solved-dir <subdir>`

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::models::AutomatonKind;

#[derive(Parser, Debug)]
#[command(author, version, about = "Extrai questões de PDF/DOCX e gera respostas e autômatos JFLAP", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Processa todos os .pdf e .docx do diretório de entrada
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Diretório de entrada (padrão: INPUT_DIR)
    #[arg(long = "in", value_name = "DIRECTORY_PATH")]
    pub input: Option<PathBuf>,

    /// Diretório de saída (padrão: OUTPUT_DIR)
    #[arg(long = "out", value_name = "DIRECTORY_PATH")]
    pub output: Option<PathBuf>,

    /// Tipo de autômato gravado nos arquivos .jff
    #[arg(long = "type", value_enum, default_value_t = AutomatonKind::Fa)]
    pub kind: AutomatonKind,

    /// Reexecuta do zero, ignorando o status salvo
    #[arg(long, default_value_t = false)]
    pub refresh: bool,

    /// Subpasta de --out para os .jff por questão
    #[arg(long = "solved-dir", value_name = "SUBDIR", default_value = "resolvidas")]
    pub solved_dir: String,
}

/// 一次运行的最终参数（命令行优先，其次配置）
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub kind: AutomatonKind,
    pub refresh: bool,
    pub solved_dir: String,
}

impl RunOptions {
    pub fn from_args(args: RunArgs, config: &Config) -> Self {
        Self {
            input_dir: args.input.unwrap_or_else(|| config.input_dir.clone()),
            output_dir: args.output.unwrap_or_else(|| config.output_dir.clone()),
            kind: args.kind,
            refresh: args.refresh,
            solved_dir: args.solved_dir,
        }
    }
}
