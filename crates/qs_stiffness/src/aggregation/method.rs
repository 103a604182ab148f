// crates/qs_stiffness/src/aggregation/method.rs
//! 聚合方法表
//!
//! 每种方法是一个标签加一行表项（名称、显示名、是否带物理单位、是否可拆分、
//! 归约函数）。归约函数作用于一次性算好的 [`Summary`]，所以一组数据的
//! 全部十个统计量只需要排序一次。
//!
//! NaN 在归约前被剔除。空输入（或全 NaN）时：和为 0，计数为 0，其余为 NaN。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 聚合方法；声明顺序即缓存文件列顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationMethod {
    /// 均值
    Mean,
    /// 中位数
    Median,
    /// 求和
    Sum,
    /// 最小值
    Min,
    /// 最大值
    Max,
    /// 非负值比例
    FractPositive,
    /// 非负值个数
    NumPositive,
    /// 负值个数
    NumNegative,
    /// `max(和, 中位数)`
    GreaterSumMedian,
    /// `max(均值, 中位数)`
    GreaterMeanMedian,
}

/// 方法个数
pub const METHOD_COUNT: usize = 10;

/// 一组有限值的基础统计
#[derive(Debug, Clone, Copy)]
pub struct Summary {
    count: usize,
    sum: f64,
    mean: f64,
    median: f64,
    min: f64,
    max: f64,
    num_positive: usize,
}

impl Summary {
    /// 计算统计量，NaN 被剔除
    #[must_use]
    pub fn of(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(f64::total_cmp);
        Self::of_sorted(&sorted)
    }

    fn of_sorted(sorted: &[f64]) -> Self {
        let count = sorted.len();
        if count == 0 {
            return Self {
                count: 0,
                sum: 0.0,
                mean: f64::NAN,
                median: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
                num_positive: 0,
            };
        }
        let sum: f64 = sorted.iter().sum();
        let median = if count % 2 == 1 {
            sorted[count / 2]
        } else {
            0.5 * (sorted[count / 2 - 1] + sorted[count / 2])
        };
        Self {
            count,
            sum,
            mean: sum / count as f64,
            median,
            min: sorted[0],
            max: sorted[count - 1],
            num_positive: sorted.iter().filter(|&&v| v >= 0.0).count(),
        }
    }

    /// 有效值个数
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// 和
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// 均值
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// 中位数
    #[must_use]
    pub fn median(&self) -> f64 {
        self.median
    }

    /// 最小值
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }
}

/// NaN 传播的 max
fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

struct MethodInfo {
    name: &'static str,
    display: &'static str,
    has_units: bool,
    splittable: bool,
    reduce: fn(&Summary) -> f64,
}

const TABLE: [MethodInfo; METHOD_COUNT] = [
    MethodInfo {
        name: "MEAN",
        display: "Mean",
        has_units: true,
        splittable: false,
        reduce: |s| s.mean,
    },
    MethodInfo {
        name: "MEDIAN",
        display: "Median",
        has_units: true,
        splittable: false,
        reduce: |s| s.median,
    },
    MethodInfo {
        name: "SUM",
        display: "Sum",
        has_units: true,
        splittable: true,
        reduce: |s| s.sum,
    },
    MethodInfo {
        name: "MIN",
        display: "Minimum",
        has_units: true,
        splittable: true,
        reduce: |s| s.min,
    },
    MethodInfo {
        name: "MAX",
        display: "Maximum",
        has_units: true,
        splittable: true,
        reduce: |s| s.max,
    },
    MethodInfo {
        name: "FRACT_POSITIVE",
        display: "Fraction Positive",
        has_units: false,
        splittable: false,
        reduce: |s| {
            if s.count == 0 {
                f64::NAN
            } else {
                s.num_positive as f64 / s.count as f64
            }
        },
    },
    MethodInfo {
        name: "NUM_POSITIVE",
        display: "Num Positive",
        has_units: false,
        splittable: false,
        reduce: |s| s.num_positive as f64,
    },
    MethodInfo {
        name: "NUM_NEGATIVE",
        display: "Num Negative",
        has_units: false,
        splittable: false,
        reduce: |s| (s.count - s.num_positive) as f64,
    },
    MethodInfo {
        name: "GREATER_SUM_MEDIAN",
        display: "Max[Sum,Median]",
        has_units: true,
        splittable: false,
        reduce: |s| nan_max(s.sum, s.median),
    },
    MethodInfo {
        name: "GREATER_MEAN_MEDIAN",
        display: "Max[Mean,Median]",
        has_units: true,
        splittable: false,
        reduce: |s| nan_max(s.mean, s.median),
    },
];

impl AggregationMethod {
    /// 所有方法，按声明顺序
    pub const ALL: [AggregationMethod; METHOD_COUNT] = [
        Self::Mean,
        Self::Median,
        Self::Sum,
        Self::Min,
        Self::Max,
        Self::FractPositive,
        Self::NumPositive,
        Self::NumNegative,
        Self::GreaterSumMedian,
        Self::GreaterMeanMedian,
    ];

    /// 声明顺序下标
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    fn info(self) -> &'static MethodInfo {
        &TABLE[self.index()]
    }

    /// 常量名（缓存文件列名）
    #[must_use]
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// 显示名
    #[must_use]
    pub fn display_name(self) -> &'static str {
        self.info().display
    }

    /// 结果是否带物理单位（计数与比例不带）
    #[must_use]
    pub fn has_units(self) -> bool {
        self.info().has_units
    }

    /// 对子集分别归约后再归约是否与整体归约一致
    #[must_use]
    pub fn is_splittable(self) -> bool {
        self.info().splittable
    }

    /// 按常量名查找
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// 对已算好的统计量归约
    #[inline]
    #[must_use]
    pub fn apply(self, summary: &Summary) -> f64 {
        (self.info().reduce)(summary)
    }

    /// 归约一组值
    #[must_use]
    pub fn reduce(self, values: &[f64]) -> f64 {
        self.apply(&Summary::of(values))
    }
}

impl fmt::Display for AggregationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// 一组值在全部聚合方法下的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StiffnessAggregation {
    values: [f64; METHOD_COUNT],
}

impl StiffnessAggregation {
    /// 计算全部聚合结果
    #[must_use]
    pub fn new(values: &[f64]) -> Self {
        Self::from_summary(&Summary::of(values))
    }

    /// 由统计量构造
    #[must_use]
    pub fn from_summary(summary: &Summary) -> Self {
        let mut values = [0.0; METHOD_COUNT];
        for method in AggregationMethod::ALL {
            values[method.index()] = method.apply(summary);
        }
        Self { values }
    }

    /// 由声明顺序的原始数组构造（缓存文件读取）
    #[must_use]
    pub const fn from_array(values: [f64; METHOD_COUNT]) -> Self {
        Self { values }
    }

    /// 取某方法的结果
    #[inline]
    #[must_use]
    pub fn get(&self, method: AggregationMethod) -> f64 {
        self.values[method.index()]
    }

    /// 声明顺序的全部结果
    #[must_use]
    pub fn as_array(&self) -> &[f64; METHOD_COUNT] {
        &self.values
    }

    /// 与另一结果逐位相同（NaN 视为相等）
    #[must_use]
    pub fn bit_eq(&self, other: &Self) -> bool {
        self.values
            .iter()
            .zip(&other.values)
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl fmt::Display for StiffnessAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, method) in AggregationMethod::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", method.display_name(), self.values[i])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AggregationMethod::*;

    #[test]
    fn test_aggregation_identities() {
        let values = [3.0, -1.0, 0.0, 7.5, -2.25, 10.0];
        let agg = StiffnessAggregation::new(&values);
        let sum: f64 = values.iter().sum();
        assert_eq!(agg.get(Sum), sum);
        assert_eq!(agg.get(Mean), sum / values.len() as f64);
        assert_eq!(agg.get(NumPositive) + agg.get(NumNegative), values.len() as f64);
        assert_eq!(agg.get(FractPositive), agg.get(NumPositive) / values.len() as f64);
        assert_eq!(agg.get(GreaterSumMedian), sum.max(agg.get(Median)));
        assert_eq!(agg.get(GreaterMeanMedian), agg.get(Mean).max(agg.get(Median)));
        assert_eq!(agg.get(Min), -2.25);
        assert_eq!(agg.get(Max), 10.0);
        // 0 计为正
        assert_eq!(agg.get(NumPositive), 4.0);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(Median.reduce(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(Median.reduce(&[5.0, 1.0, 3.0]), 3.0);
    }

    #[test]
    fn test_nan_skipped() {
        let agg = StiffnessAggregation::new(&[1.0, f64::NAN, 3.0]);
        assert_eq!(agg.get(Mean), 2.0);
        assert_eq!(agg.get(NumPositive) + agg.get(NumNegative), 2.0);
    }

    #[test]
    fn test_empty_input() {
        let agg = StiffnessAggregation::new(&[f64::NAN]);
        assert_eq!(agg.get(Sum), 0.0);
        assert_eq!(agg.get(NumPositive), 0.0);
        assert_eq!(agg.get(NumNegative), 0.0);
        for m in [Mean, Median, Min, Max, FractPositive, GreaterSumMedian, GreaterMeanMedian] {
            assert!(agg.get(m).is_nan(), "{m:?}");
        }
    }

    #[test]
    fn test_table_metadata() {
        let names: Vec<_> = AggregationMethod::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(
            names,
            [
                "MEAN",
                "MEDIAN",
                "SUM",
                "MIN",
                "MAX",
                "FRACT_POSITIVE",
                "NUM_POSITIVE",
                "NUM_NEGATIVE",
                "GREATER_SUM_MEDIAN",
                "GREATER_MEAN_MEDIAN"
            ]
        );
        for m in AggregationMethod::ALL {
            assert_eq!(AggregationMethod::from_name(m.name()), Some(m));
        }
        assert!(Sum.is_splittable() && Min.is_splittable() && Max.is_splittable());
        assert!(!Median.is_splittable());
        assert!(!FractPositive.has_units());
        assert!(Median.has_units());
        assert_eq!(GreaterSumMedian.to_string(), "Max[Sum,Median]");
    }

    #[test]
    fn test_serde_constant_names() {
        let json = serde_json::to_string(&GreaterMeanMedian).unwrap();
        assert_eq!(json, "\"GREATER_MEAN_MEDIAN\"");
    }
}
