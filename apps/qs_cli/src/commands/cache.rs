// apps/qs_cli/src/commands/cache.rs

//! 聚合缓存命令
//!
//! 构建全部有序子段对的缓存文件，或检查已有文件。

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use qs_stiffness::AggregationEngine;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::{ModelArgs, Session};

/// 缓存子命令
#[derive(Subcommand)]
pub enum CacheCommand {
    /// 计算全部有序子段对并写出缓存文件
    Build(BuildArgs),
    /// 载入缓存文件并报告条目数
    Info(InfoArgs),
}

/// 构建参数
#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// 输出目录
    #[arg(short, long)]
    pub out: PathBuf,
}

/// 检查参数
#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// 缓存文件
    #[arg(short, long)]
    pub file: PathBuf,
}

/// 执行缓存命令
pub fn execute(cmd: CacheCommand) -> Result<()> {
    match cmd {
        CacheCommand::Build(args) => build(args),
        CacheCommand::Info(args) => inspect(args),
    }
}

fn build(args: BuildArgs) -> Result<()> {
    let session = Session::load(&args.model)?;
    let calc = &session.calc;
    let config = session.config.aggregation_config();
    let engine = AggregationEngine::new(Arc::clone(calc), config);
    let ids: Vec<_> = (0..calc.section_count())
        .map(|raw| calc.section_id(raw))
        .collect::<Result<_, _>>()?;

    let start = Instant::now();
    let total = ids.len() * ids.len().saturating_sub(1);
    let mut done = 0;
    for &receiver in &ids {
        for &source in &ids {
            if source == receiver {
                continue;
            }
            engine.get_sect_aggregation(source, receiver)?;
            done += 1;
        }
        info!(receiver = receiver.get(), "进度 {done}/{total}");
    }

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("无法创建目录 {}", args.out.display()))?;
    let path = args.out.join(calc.cache_file_name(config.quantity));
    let written = calc.aggregation_cache(config.quantity).write_cache_file(&path)?;
    println!("已写出 {written} 条到 {}", path.display());
    info!("完成，耗时 {:.2?}", start.elapsed());
    Ok(())
}

fn inspect(args: InfoArgs) -> Result<()> {
    let session = Session::load(&args.model)?;
    let quantity = session.config.aggregation.quantity;
    let cache = session.calc.aggregation_cache(quantity);
    let loaded = cache
        .load_cache_file(&args.file)
        .with_context(|| format!("无法载入缓存文件 {}", args.file.display()))?;
    println!("文件: {}", args.file.display());
    println!("物理量: {quantity}");
    println!("载入条目: {loaded}");
    println!("缓存大小: {}", cache.calc_cache_size());
    if loaded == 0 {
        println!("(表头不匹配或文件为空)");
    }
    Ok(())
}
