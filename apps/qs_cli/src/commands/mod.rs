// apps/qs_cli/src/commands/mod.rs

//! 子命令实现与共用的模型/配置加载

pub mod cache;
pub mod cluster;
pub mod info;
pub mod pair;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use qs_config::RunConfig;
use qs_fault::{load_fault_model, FaultSection};
use qs_stiffness::{StiffnessCalculator, StiffnessType};
use tracing::info;

/// 断层模型与运行配置
#[derive(Args)]
pub struct ModelArgs {
    /// 断层模型 JSON 文件
    #[arg(short, long)]
    pub model: PathBuf,

    /// 运行配置 JSON 文件，缺省使用默认配置
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// 一次运行所需的配置与计算器
pub struct Session {
    pub config: RunConfig,
    pub calc: Arc<StiffnessCalculator>,
}

impl Session {
    /// 加载配置与断层模型并创建计算器
    pub fn load(args: &ModelArgs) -> Result<Self> {
        let config = match &args.config {
            Some(path) => RunConfig::from_json_file(path)
                .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
            None => RunConfig::default(),
        };
        let sections = load_fault_model(&args.model)
            .with_context(|| format!("无法加载断层模型 {}", args.model.display()))?;
        info!(sections = sections.len(), "断层模型已加载");

        let sections: Vec<Arc<dyn FaultSection>> = sections
            .into_iter()
            .map(|s| Arc::new(s) as Arc<dyn FaultSection>)
            .collect();
        let calc = StiffnessCalculator::new(sections, config.calculator_params())
            .context("无法创建刚度计算器")?;
        Ok(Self {
            config,
            calc: Arc::new(calc),
        })
    }

    fn cache_path(&self, ty: StiffnessType) -> Option<PathBuf> {
        self.config
            .cache
            .directory
            .as_ref()
            .map(|dir| dir.join(self.calc.cache_file_name(ty)))
    }

    /// 按配置载入已有的聚合缓存文件
    pub fn load_cache(&self, ty: StiffnessType) -> Result<()> {
        if !self.config.cache.load_on_start {
            return Ok(());
        }
        if let Some(path) = self.cache_path(ty).filter(|p| p.exists()) {
            self.calc
                .aggregation_cache(ty)
                .load_cache_file(&path)
                .with_context(|| format!("无法载入缓存文件 {}", path.display()))?;
        }
        Ok(())
    }

    /// 按配置写出聚合缓存文件
    pub fn store_cache(&self, ty: StiffnessType) -> Result<()> {
        if !self.config.cache.write_on_exit {
            return Ok(());
        }
        if let Some(path) = self.cache_path(ty) {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            self.calc
                .aggregation_cache(ty)
                .write_cache_file(&path)
                .with_context(|| format!("无法写出缓存文件 {}", path.display()))?;
        }
        Ok(())
    }
}
