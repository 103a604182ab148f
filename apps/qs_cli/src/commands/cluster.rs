// apps/qs_cli/src/commands/cluster.rs

//! 多源命令
//!
//! 若干源子段对一个接收子段的聚合。

use anyhow::Result;
use clap::Args;
use qs_stiffness::AggregationEngine;
use std::sync::Arc;
use tracing::info;

use super::{ModelArgs, Session};

/// 多源参数
#[derive(Args)]
pub struct ClusterArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// 源子段编号，逗号分隔
    #[arg(long, value_delimiter = ',', required = true)]
    pub sources: Vec<usize>,

    /// 接收子段编号
    #[arg(short, long)]
    pub receiver: usize,
}

/// 执行多源命令
pub fn execute(args: ClusterArgs) -> Result<()> {
    let session = Session::load(&args.model)?;
    let calc = &session.calc;
    let sources = args
        .sources
        .iter()
        .map(|&raw| calc.section_id(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let receiver = calc.section_id(args.receiver)?;

    let config = session.config.aggregation_config();
    session.load_cache(config.quantity)?;
    let engine = AggregationEngine::new(Arc::clone(calc), config);
    info!(sources = sources.len(), receiver = args.receiver, "{engine}");

    for &source in &sources {
        if source == receiver && !config.allow_sect_to_self {
            continue;
        }
        println!("{} -> {}: {}", source, args.receiver, engine.calc(source, receiver)?);
    }
    println!("\n{}", engine.get_sects_to_sect_aggregation(&sources, receiver)?);
    if config.sects_to_sect_agg.is_some() || config.sects_to_sects_agg.is_some() {
        println!(
            "{} = {}",
            config.scalar_name(),
            engine.calc_sects_to_sect(&sources, receiver)?
        );
    }

    session.store_cache(config.quantity)?;
    Ok(())
}
