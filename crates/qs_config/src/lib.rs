// crates/qs_config/src/lib.rs

//! QuakeStiff Config Layer
//!
//! 运行配置层：JSON 配置文件的读写、默认值与校验，以及到
//! `qs_stiffness` 运行时参数的转换。
//!
//! # 模块概览
//!
//! - [`run_config`]: `RunConfig` 及其三个分节
//! - [`error`]: 配置错误类型

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod run_config;

pub use error::ConfigError;
pub use run_config::{AggregationSection, CacheSection, CalculatorSection, RunConfig};
