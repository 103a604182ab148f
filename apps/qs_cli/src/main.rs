// apps/qs_cli/src/main.rs

//! QuakeStiff 命令行界面
//!
//! 断层子段间库仑应力相互作用的计算、聚合与缓存管理。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// QuakeStiff 断层相互作用刚度命令行工具
#[derive(Parser)]
#[command(name = "qs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "QuakeStiff fault interaction stiffness calculator", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 显示默认配置与聚合方法
    Info(commands::info::InfoArgs),
    /// 计算一个子段对
    Pair(commands::pair::PairArgs),
    /// 多个源子段对一个接收子段
    Cluster(commands::cluster::ClusterArgs),
    /// 聚合缓存文件
    #[command(subcommand)]
    Cache(commands::cache::CacheCommand),
}

fn parse_level(name: &str) -> Level {
    match name.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&cli.log_level))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Info(args) => commands::info::execute(args),
        Commands::Pair(args) => commands::pair::execute(args),
        Commands::Cluster(args) => commands::cluster::execute(args),
        Commands::Cache(cmd) => commands::cache::execute(cmd),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("verbose"), Level::INFO);
    }

    #[test]
    fn test_parse_cluster_sources() {
        let cli = Cli::try_parse_from([
            "qs", "cluster", "--model", "m.json", "--sources", "1,2,3", "--receiver", "4",
        ])
        .unwrap();
        match cli.command {
            Commands::Cluster(args) => {
                assert_eq!(args.sources, vec![1, 2, 3]);
                assert_eq!(args.receiver, 4);
            }
            _ => panic!("expected cluster command"),
        }
    }
}
