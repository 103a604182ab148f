// crates/qs_fault/src/trace.rs
//! 断层迹线
//!
//! 迹线是地表（或上界）的一条有序折线。沿迹线距离以各段球面水平距离
//! 累加计算，插值在单段内沿该段方位角推进。

use qs_foundation::{ensure, QsError, QsResult};
use qs_geo::Location;
use serde::{Deserialize, Serialize};

/// 断层迹线（至少两个点）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Location>", into = "Vec<Location>")]
pub struct FaultTrace {
    locations: Vec<Location>,
    /// 每个点的累积沿迹线距离 (km)
    cumulative: Vec<f64>,
}

impl FaultTrace {
    /// 创建迹线，少于两个点或总长为零时报错
    pub fn new(locations: Vec<Location>) -> QsResult<Self> {
        ensure!(
            locations.len() >= 2,
            QsError::invalid_input(format!("断层迹线至少需要 2 个点, 实际 {}", locations.len()))
        );
        let mut cumulative = Vec::with_capacity(locations.len());
        cumulative.push(0.0);
        let mut total = 0.0;
        for pair in locations.windows(2) {
            total += pair[0].horizontal_distance_km(&pair[1]);
            cumulative.push(total);
        }
        ensure!(total > 0.0, QsError::invalid_input("断层迹线长度为零"));
        Ok(Self {
            locations,
            cumulative,
        })
    }

    /// 迹线点
    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// 点数
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// 总是非空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// 总长度 (km)
    #[must_use]
    pub fn length_km(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// 平均走向：首点到末点的方位角 (度)
    #[must_use]
    pub fn average_strike(&self) -> f64 {
        let first = &self.locations[0];
        let last = &self.locations[self.locations.len() - 1];
        first.azimuth_deg(last)
    }

    /// 包含给定沿迹线距离的段号
    fn segment_at(&self, das: f64) -> usize {
        let last_seg = self.locations.len() - 2;
        match self.cumulative[1..].iter().position(|&c| das <= c) {
            Some(i) => i.min(last_seg),
            None => last_seg,
        }
    }

    /// 沿迹线距离 `das` (km) 处的位置，超出两端时沿端段外推
    #[must_use]
    pub fn location_at(&self, das: f64) -> Location {
        let seg = self.segment_at(das);
        let start = &self.locations[seg];
        let end = &self.locations[seg + 1];
        let seg_len = self.cumulative[seg + 1] - self.cumulative[seg];
        let along = das - self.cumulative[seg];
        if seg_len <= 0.0 {
            return *start;
        }
        let mut loc = start.offset(start.azimuth_deg(end), along, 0.0);
        loc.depth = start.depth + (end.depth - start.depth) * (along / seg_len);
        loc
    }

    /// 沿迹线距离 `das` 处所在段的走向 (度)
    #[must_use]
    pub fn strike_at(&self, das: f64) -> f64 {
        let seg = self.segment_at(das);
        self.locations[seg].azimuth_deg(&self.locations[seg + 1])
    }

    /// 等距重采样为 `n_segments` 段（返回 `n_segments + 1` 个点）
    #[must_use]
    pub fn resample(&self, n_segments: usize) -> Vec<Location> {
        let n = n_segments.max(1);
        let step = self.length_km() / n as f64;
        let mut out: Vec<Location> = (0..n).map(|i| self.location_at(step * i as f64)).collect();
        out.push(self.locations[self.locations.len() - 1]);
        out
    }
}

impl TryFrom<Vec<Location>> for FaultTrace {
    type Error = QsError;

    fn try_from(value: Vec<Location>) -> QsResult<Self> {
        Self::new(value)
    }
}

impl From<FaultTrace> for Vec<Location> {
    fn from(trace: FaultTrace) -> Self {
        trace.locations
    }
}
