// apps/qs_cli/src/commands/pair.rs

//! 子段对命令
//!
//! 输出一个有序子段对的 SIGMA/TAU/CFF 统计和引擎在全部聚合方法下的结果。

use anyhow::{Context, Result};
use clap::Args;
use qs_stiffness::{AggregationEngine, PairwiseStiffnessCache};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::{ModelArgs, Session};

/// 子段对参数
#[derive(Args)]
pub struct PairArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// 源子段编号
    #[arg(short, long)]
    pub source: usize,

    /// 接收子段编号
    #[arg(short, long)]
    pub receiver: usize,
}

/// 执行子段对命令
pub fn execute(args: PairArgs) -> Result<()> {
    let session = Session::load(&args.model)?;
    let calc = &session.calc;
    let source = calc.section_id(args.source)?;
    let receiver = calc.section_id(args.receiver)?;
    let start = Instant::now();

    if source != receiver {
        let pairwise = PairwiseStiffnessCache::new(Arc::clone(calc));
        for result in pairwise.stiffness(source, receiver)?.iter() {
            println!("{result}");
        }
    }

    let config = session.config.aggregation_config();
    session.load_cache(config.quantity)?;
    let engine = AggregationEngine::new(Arc::clone(calc), config);
    let agg = engine
        .get_sect_aggregation(source, receiver)
        .with_context(|| format!("子段对 {} -> {} 聚合失败", args.source, args.receiver))?;
    println!("\n{engine}");
    println!("{agg}");
    println!("{} = {}", config.scalar_name(), engine.calc(source, receiver)?);

    session.store_cache(config.quantity)?;
    info!("完成，耗时 {:.2?}", start.elapsed());
    Ok(())
}
