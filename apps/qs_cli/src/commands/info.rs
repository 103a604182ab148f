// apps/qs_cli/src/commands/info.rs

//! 信息显示命令
//!
//! 显示默认配置和聚合方法表。

use anyhow::{Context, Result};
use clap::Args;
use qs_config::RunConfig;
use qs_stiffness::AggregationMethod;
use std::path::PathBuf;

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 配置文件路径，给出时校验并显示其聚合流水线
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    println!("=== QuakeStiff {} ===", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => RunConfig::from_json_file(path)
            .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
        None => RunConfig::default(),
    };
    let title = if args.config.is_some() { "配置" } else { "默认配置" };
    println!("\n=== {title} ===");
    println!("{}", serde_json::to_string_pretty(&config)?);

    let agg = config.aggregation_config();
    println!("\n流水线: {agg}");
    println!("标量: {}", agg.scalar_name());
    println!("带单位: {}", if agg.has_units() { "是" } else { "否" });

    print_method_table();
    Ok(())
}

fn print_method_table() {
    println!("\n=== 聚合方法 ===");
    println!("{:<22} {:<20} {:<6} {:<6}", "名称", "显示名", "单位", "可拆分");
    for method in AggregationMethod::ALL {
        println!(
            "{:<22} {:<20} {:<6} {:<6}",
            method.name(),
            method.display_name(),
            if method.has_units() { "✓" } else { "-" },
            if method.is_splittable() { "✓" } else { "-" },
        );
    }
}
