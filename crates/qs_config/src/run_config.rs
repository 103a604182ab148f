// crates/qs_config/src/run_config.rs

//! RunConfig - 刚度计算运行配置
//!
//! 三个分节：计算器参数、聚合流水线、缓存文件策略。所有字段都有默认值，
//! 空 JSON 对象即是一份合法配置。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use qs_stiffness::{AggregationConfig, AggregationMethod, PatchAlignment, StiffnessParams, StiffnessType};

use crate::error::ConfigError;

/// 运行配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// 计算器参数
    #[serde(default)]
    pub calculator: CalculatorSection,

    /// 聚合流水线
    #[serde(default)]
    pub aggregation: AggregationSection,

    /// 缓存文件策略
    #[serde(default)]
    pub cache: CacheSection,
}

/// 计算器参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorSection {
    /// 网格间距 [km]
    #[serde(default = "default_grid_spacing")]
    pub grid_spacing_km: f64,

    /// 拉梅常数 λ [MPa]
    #[serde(default = "default_lame")]
    pub lame_lambda: f64,

    /// 剪切模量 μ [MPa]
    #[serde(default = "default_lame")]
    pub lame_mu: f64,

    /// 有效摩擦系数
    #[serde(default = "default_friction")]
    pub coeff_of_friction: f64,

    /// 面元布置方式
    #[serde(default)]
    pub patch_alignment: PatchAlignment,

    /// 自刚度上限倍数，0 表示不限制
    #[serde(default)]
    pub self_stiffness_cap: f64,
}

fn default_grid_spacing() -> f64 { 2.0 }
fn default_lame() -> f64 { 30000.0 }
fn default_friction() -> f64 { 0.5 }

impl Default for CalculatorSection {
    fn default() -> Self {
        Self {
            grid_spacing_km: default_grid_spacing(),
            lame_lambda: default_lame(),
            lame_mu: default_lame(),
            coeff_of_friction: default_friction(),
            patch_alignment: PatchAlignment::default(),
            self_stiffness_cap: 0.0,
        }
    }
}

/// 聚合流水线
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationSection {
    /// 物理量
    #[serde(default = "default_quantity")]
    pub quantity: StiffnessType,

    /// 接收面元聚合
    #[serde(default)]
    pub receiver_patch_agg: Option<AggregationMethod>,

    /// 子段对聚合
    #[serde(default = "default_sect_to_sect")]
    pub sect_to_sect_agg: Option<AggregationMethod>,

    /// 多源对单接收聚合
    #[serde(default = "default_sects_to_sect")]
    pub sects_to_sect_agg: Option<AggregationMethod>,

    /// 多源对多接收聚合
    #[serde(default)]
    pub sects_to_sects_agg: Option<AggregationMethod>,

    /// 是否允许自作用
    #[serde(default)]
    pub allow_sect_to_self: bool,
}

fn default_quantity() -> StiffnessType { StiffnessType::Cff }
fn default_sect_to_sect() -> Option<AggregationMethod> { Some(AggregationMethod::Median) }
fn default_sects_to_sect() -> Option<AggregationMethod> { Some(AggregationMethod::Sum) }

impl Default for AggregationSection {
    fn default() -> Self {
        Self {
            quantity: default_quantity(),
            receiver_patch_agg: None,
            sect_to_sect_agg: default_sect_to_sect(),
            sects_to_sect_agg: default_sects_to_sect(),
            sects_to_sects_agg: None,
            allow_sect_to_self: false,
        }
    }
}

/// 缓存文件策略
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSection {
    /// 缓存目录，未设置时不读写缓存文件
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// 启动时载入已有缓存
    #[serde(default = "default_true")]
    pub load_on_start: bool,

    /// 退出时写出缓存
    #[serde(default = "default_true")]
    pub write_on_exit: bool,
}

fn default_true() -> bool { true }

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            directory: None,
            load_on_start: true,
            write_on_exit: true,
        }
    }
}

impl RunConfig {
    /// 从 JSON 文件加载并校验
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: RunConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 保存为 JSON 文件
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.calculator;
        for (key, value) in [
            ("calculator.grid_spacing_km", c.grid_spacing_km),
            ("calculator.lame_lambda", c.lame_lambda),
            ("calculator.lame_mu", c.lame_mu),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::invalid(key, value, "必须为有限正数"));
            }
        }
        for (key, value) in [
            ("calculator.coeff_of_friction", c.coeff_of_friction),
            ("calculator.self_stiffness_cap", c.self_stiffness_cap),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::invalid(key, value, "不能为负"));
            }
        }

        if self.aggregation.sect_to_sect_agg.is_none() {
            return Err(ConfigError::Missing("aggregation.sect_to_sect_agg".to_string()));
        }
        Ok(())
    }

    /// 计算器运行参数
    #[must_use]
    pub fn calculator_params(&self) -> StiffnessParams {
        let c = &self.calculator;
        StiffnessParams {
            grid_spacing_km: c.grid_spacing_km,
            lame_lambda: c.lame_lambda,
            lame_mu: c.lame_mu,
            coeff_of_friction: c.coeff_of_friction,
            patch_alignment: c.patch_alignment,
            self_stiffness_cap: c.self_stiffness_cap,
        }
    }

    /// 聚合流水线配置
    #[must_use]
    pub fn aggregation_config(&self) -> AggregationConfig {
        let a = &self.aggregation;
        let mut builder =
            AggregationConfig::builder(a.quantity).allow_sect_to_self(a.allow_sect_to_self);
        if let Some(m) = a.receiver_patch_agg {
            builder = builder.receiver_patch_agg(m);
        }
        if let Some(m) = a.sect_to_sect_agg {
            builder = builder.sect_to_sect_agg(m);
        }
        if let Some(m) = a.sects_to_sect_agg {
            builder = builder.sects_to_sect_agg(m);
        }
        if let Some(m) = a.sects_to_sects_agg {
            builder = builder.sects_to_sects_agg(m);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.calculator_params(), StiffnessParams::default());
        assert_eq!(
            config.aggregation_config().to_string(),
            "AggregationEngine[ΔCFF: Median -> Sum]"
        );
        assert!(config.cache.load_on_start && config.cache.write_on_exit);
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let parsed: RunConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, RunConfig::default());

        let parsed: RunConfig =
            serde_json::from_str(r#"{"calculator": {"lame_mu": 25000.0}}"#).unwrap();
        assert_eq!(parsed.calculator.lame_mu, 25000.0);
        assert_eq!(parsed.calculator.lame_lambda, 30000.0);
    }

    #[test]
    fn test_method_names() {
        let json = r#"{
            "aggregation": {
                "quantity": "TAU",
                "receiver_patch_agg": "FRACT_POSITIVE",
                "sect_to_sect_agg": "MEAN",
                "sects_to_sect_agg": null,
                "allow_sect_to_self": true
            }
        }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        let agg = config.aggregation_config();
        assert_eq!(agg.quantity, StiffnessType::Tau);
        assert_eq!(agg.receiver_patch_agg, Some(AggregationMethod::FractPositive));
        assert_eq!(agg.sects_to_sect_agg, None);
        assert!(agg.allow_sect_to_self);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = RunConfig::default();
        config.calculator.lame_lambda = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));

        let mut config = RunConfig::default();
        config.calculator.coeff_of_friction = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.aggregation.sect_to_sect_agg = None;
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let mut config = RunConfig::default();
        config.calculator.patch_alignment = PatchAlignment::FillOverlap;
        config.cache.directory = Some(dir.path().to_path_buf());
        config.to_json_file(&path).unwrap();
        assert_eq!(RunConfig::from_json_file(&path).unwrap(), config);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(RunConfig::from_json_file(&path), Err(ConfigError::Parse(_))));
    }
}
