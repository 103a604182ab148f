// crates/qs_stiffness/tests/section_pipeline.rs

//! 子段级流水线测试
//! 覆盖子段对缓存、簇级查询、聚合引擎与缓存文件往返

use std::sync::Arc;

use qs_fault::{FaultSection, FaultSubsectionCluster, FaultTrace, SimpleFaultSection};
use qs_foundation::SectionId;
use qs_geo::Location;
use qs_stiffness::{
    AggregationConfig, AggregationEngine, AggregationMethod, PairwiseStiffnessCache,
    StiffnessCalculator, StiffnessError, StiffnessParams, StiffnessType,
};

/// 直立右旋走滑子段，自 `start` 向北 4 km，深 0-4 km
fn strike_slip(id: usize, parent: usize, start: Location) -> SimpleFaultSection {
    SimpleFaultSection {
        id,
        parent_id: Some(parent),
        name: format!("Sect {id}"),
        trace: FaultTrace::new(vec![start, start.offset(0.0, 4.0, 0.0)]).unwrap(),
        dip: 90.0,
        rake: 180.0,
        upper_depth: 0.0,
        lower_depth: 4.0,
    }
}

/// 母断层 0 含子段 0、1（首尾相接），母断层 1 含东侧 3 km 的子段 2
fn model() -> Vec<Arc<dyn FaultSection>> {
    let origin = Location::new(35.0, -118.0, 0.0);
    let sections = [
        strike_slip(0, 0, origin),
        strike_slip(1, 0, origin.offset(0.0, 4.0, 0.0)),
        strike_slip(2, 1, origin.offset(90.0, 3.0, 0.0)),
    ];
    sections
        .into_iter()
        .map(|s| Arc::new(s) as Arc<dyn FaultSection>)
        .collect()
}

fn calculator() -> Arc<StiffnessCalculator> {
    Arc::new(StiffnessCalculator::new(model(), StiffnessParams::default()).unwrap())
}

fn ids() -> [SectionId; 3] {
    [SectionId::new(0), SectionId::new(1), SectionId::new(2)]
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        0.5 * (values[n / 2 - 1] + values[n / 2])
    }
}

/// 同一对只计算一次，返回同一份结果
#[test]
fn test_pairwise_memo_identity() {
    let cache = PairwiseStiffnessCache::new(calculator());
    let [a, b, _] = ids();
    let first = cache.stiffness(a, b).unwrap();
    let second = cache.stiffness(a, b).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);

    for ty in StiffnessType::ALL {
        let r = &first[ty.index()];
        assert_eq!(r.stiffness_type, ty);
        assert_eq!((r.source_id, r.receiver_id), (Some(0), Some(1)));
        assert_eq!(r.count, 16);
        assert_eq!(r.fraction_singular, 0.0);
    }
}

/// 清空后重算结果逐位一致
#[test]
fn test_clear_then_recompute_is_bit_identical() {
    let cache = PairwiseStiffnessCache::new(calculator());
    let [a, _, c] = ids();
    let before = cache.stiffness(c, a).unwrap();
    cache.clear();
    assert!(cache.is_empty());
    let after = cache.stiffness(c, a).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    for (x, y) in before.iter().zip(after.iter()) {
        assert_eq!(x.mean.to_bits(), y.mean.to_bits());
        assert_eq!(x.median.to_bits(), y.median.to_bits());
        assert_eq!(x.min.to_bits(), y.min.to_bits());
        assert_eq!(x.max.to_bits(), y.max.to_bits());
    }
}

#[test]
fn test_pairwise_rejects_self() {
    let cache = PairwiseStiffnessCache::new(calculator());
    let err = cache.stiffness(SectionId::new(1), SectionId::new(1)).unwrap_err();
    assert!(matches!(err, StiffnessError::SelfInteraction { id: 1 }));
}

/// 簇级查询与母断层查询一致，破裂查询排除接收簇
#[test]
fn test_cluster_helpers() {
    let cache = PairwiseStiffnessCache::new(calculator());
    let [a, b, c] = ids();
    let west = FaultSubsectionCluster::new(0, vec![a, b]);
    let east = FaultSubsectionCluster::new(1, vec![c]);
    let ty = StiffnessType::Cff;

    let cluster = cache.calc_cluster_stiffness(ty, &west, &east).unwrap();
    assert_eq!(cluster.count, 32);
    assert_eq!((cluster.source_id, cluster.receiver_id), (Some(0), Some(1)));
    let ac = cache.stiffness(a, c).unwrap()[ty.index()];
    let bc = cache.stiffness(b, c).unwrap()[ty.index()];
    assert_eq!(cluster.mean, ac.mean + bc.mean);
    assert_eq!(cluster.min, ac.min.min(bc.min));

    let parent = cache.calc_parent_stiffness(ty, 0, 1).unwrap();
    assert_eq!(parent, cluster);

    let rupture = [west.clone(), east.clone()];
    let rup = cache.calc_agg_rup_to_cluster_stiffness(ty, &rupture, &east).unwrap();
    let clusters = cache
        .calc_agg_clusters_to_cluster_stiffness(ty, std::slice::from_ref(&west), &east)
        .unwrap();
    assert_eq!(rup, clusters);
    assert_eq!(rup.source_id, None);
    assert_eq!(rup.receiver_id, Some(1));

    let err = cache
        .calc_agg_clusters_to_cluster_stiffness(ty, &[], &east)
        .unwrap_err();
    assert!(matches!(err, StiffnessError::NoSources { receiver: 1 }));
}

/// 引擎的子段对与多源结果与手工归约一致
#[test]
fn test_engine_pipeline() {
    let calc = calculator();
    let config = AggregationConfig::builder(StiffnessType::Cff)
        .sect_to_sect_agg(AggregationMethod::Median)
        .sects_to_sect_agg(AggregationMethod::Sum)
        .build();
    let engine = AggregationEngine::new(Arc::clone(&calc), config);
    assert_eq!(engine.to_string(), "AggregationEngine[ΔCFF: Median -> Sum]");
    assert!(engine.has_units());
    let [a, b, c] = ids();

    let dist = calc.calc_stiffness_distribution(a, c).unwrap();
    let expected = median(dist.flatten(StiffnessType::Cff));
    assert_eq!(engine.calc(a, c).unwrap(), expected);
    assert!(calc
        .aggregation_cache(StiffnessType::Cff)
        .get(None, a, c)
        .is_some());

    // 接收子段出现在源中时被跳过
    let sum = engine.calc_sects_to_sect(&[b, a, c], c).unwrap();
    let direct = engine.calc(a, c).unwrap() + engine.calc(b, c).unwrap();
    assert!((sum - direct).abs() < 1e-9 * direct.abs().max(1.0));
    // 源的顺序不影响结果
    assert_eq!(engine.calc_sects_to_sect(&[a, b], c).unwrap(), sum);

    assert!(matches!(
        engine.calc(c, c),
        Err(StiffnessError::SelfInteraction { id: 2 })
    ));
    assert!(matches!(
        engine.calc_sects_to_sect(&[], c),
        Err(StiffnessError::NoSources { receiver: 2 })
    ));
    assert!(matches!(
        engine.calc_sects_to_sects(&[a], &[c]),
        Err(StiffnessError::MissingAggregation { .. })
    ));
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9 * expected.abs().max(1.0),
        "actual {actual}, expected {expected}"
    );
}

/// 源只含接收子段时没有可用的源
#[test]
fn test_self_only_sources_are_rejected() {
    let config = AggregationConfig::builder(StiffnessType::Cff)
        .sect_to_sect_agg(AggregationMethod::Median)
        .sects_to_sect_agg(AggregationMethod::Sum)
        .sects_to_sects_agg(AggregationMethod::Sum)
        .build();
    let engine = AggregationEngine::new(calculator(), config);
    let [a, _, c] = ids();
    assert!(matches!(
        engine.calc_sects_to_sect(&[c], c),
        Err(StiffnessError::NoSources { receiver: 2 })
    ));
    assert!(matches!(
        engine.calc_sects_to_sect(&[c, c], c),
        Err(StiffnessError::NoSources { receiver: 2 })
    ));
    // 任一接收没有源即整体失败
    assert!(matches!(
        engine.calc_sects_to_sects(&[c], &[a, c]),
        Err(StiffnessError::NoSources { receiver: 2 })
    ));

    let pooled = AggregationConfig::builder(StiffnessType::Cff)
        .sect_to_sect_agg(AggregationMethod::Median)
        .sects_to_sects_agg(AggregationMethod::Sum)
        .build();
    let engine = AggregationEngine::new(calculator(), pooled);
    assert!(matches!(
        engine.calc_sects_to_sects(&[c], &[c]),
        Err(StiffnessError::NoSources { receiver: 2 })
    ));
}

/// 重复的源按次数计入，且不与去重后的列表共用结果
#[test]
fn test_duplicate_sources_keep_multiplicity() {
    let config = AggregationConfig::builder(StiffnessType::Cff)
        .sect_to_sect_agg(AggregationMethod::Median)
        .sects_to_sect_agg(AggregationMethod::Sum)
        .build();
    let engine = AggregationEngine::new(calculator(), config);
    let [a, b, c] = ids();
    let ac = engine.calc(a, c).unwrap();
    let bc = engine.calc(b, c).unwrap();
    assert!(ac.abs() > 1e-9);

    let once = engine.calc_sects_to_sect(&[a, b], c).unwrap();
    let twice = engine.calc_sects_to_sect(&[a, a, b], c).unwrap();
    assert_close(once, ac + bc);
    assert_close(twice, 2.0 * ac + bc);
    // 先查重复列表再查去重列表，结果互不影响
    assert_close(engine.calc_sects_to_sect(&[b, a], c).unwrap(), ac + bc);
    assert_close(engine.calc_sects_to_sect(&[b, a, a], c).unwrap(), twice);

    let agg = engine.get_sects_to_sect_aggregation(&[a, a, b], c).unwrap();
    assert_eq!(agg.get(AggregationMethod::NumPositive) + agg.get(AggregationMethod::NumNegative), 3.0);
}

/// 先对每个接收归约，再跨接收取最大
#[test]
fn test_sects_to_sects_per_receiver() {
    let config = AggregationConfig::builder(StiffnessType::Cff)
        .sect_to_sect_agg(AggregationMethod::Mean)
        .sects_to_sect_agg(AggregationMethod::Sum)
        .sects_to_sects_agg(AggregationMethod::Max)
        .build();
    let engine = AggregationEngine::new(calculator(), config);
    let [a, b, c] = ids();
    let sources = [a, b, c];
    let receivers = [b, c];

    let per_receiver: Vec<f64> = receivers
        .iter()
        .map(|&r| {
            sources
                .iter()
                .filter(|&&s| s != r)
                .map(|&s| engine.calc(s, r).unwrap())
                .sum()
        })
        .collect();
    let expected = per_receiver.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_close(engine.calc_sects_to_sects(&sources, &receivers).unwrap(), expected);

    let agg = engine.get_sects_to_sects_aggregation(&sources, &receivers).unwrap();
    assert_close(agg.get(AggregationMethod::Sum), per_receiver.iter().sum());
    let lowest = per_receiver.iter().copied().fold(f64::INFINITY, f64::min);
    assert_close(agg.get(AggregationMethod::Min), lowest);
}

/// 未配置多源对单接收时汇集全部子段对标量
#[test]
fn test_sects_to_sects_pooled() {
    let config = AggregationConfig::builder(StiffnessType::Cff)
        .sect_to_sect_agg(AggregationMethod::Median)
        .sects_to_sects_agg(AggregationMethod::Sum)
        .build();
    let engine = AggregationEngine::new(calculator(), config);
    let [a, b, c] = ids();
    let sources = [a, b, c];
    let receivers = [a, c];

    let mut pairs = Vec::new();
    for &r in &receivers {
        for &s in &sources {
            if s != r {
                pairs.push(engine.calc(s, r).unwrap());
            }
        }
    }
    assert_eq!(pairs.len(), 4);
    let expected: f64 = pairs.iter().sum();
    assert_close(engine.calc_sects_to_sects(&sources, &receivers).unwrap(), expected);

    let agg = engine.get_sects_to_sects_aggregation(&sources, &receivers).unwrap();
    assert_close(agg.get(AggregationMethod::Median), median(pairs.clone()));
    assert_close(
        agg.get(AggregationMethod::Mean),
        expected / pairs.len() as f64,
    );
    // 多源对单接收退用多对多的方法
    assert_close(
        engine.calc_sects_to_sect(&sources, c).unwrap(),
        engine.calc(a, c).unwrap() + engine.calc(b, c).unwrap(),
    );
}

#[test]
fn test_missing_sect_to_sect_stage() {
    let config = AggregationConfig::builder(StiffnessType::Tau)
        .sects_to_sect_agg(AggregationMethod::Sum)
        .build();
    let engine = AggregationEngine::new(calculator(), config);
    let [a, b, _] = ids();
    assert!(matches!(
        engine.calc(a, b),
        Err(StiffnessError::MissingAggregation { .. })
    ));
    assert!(matches!(
        engine.calc_sects_to_sect(&[a], b),
        Err(StiffnessError::MissingAggregation { .. })
    ));
}

/// 允许自作用时排除面元对自身
#[test]
fn test_sect_to_self_excludes_diagonal() {
    let calc = calculator();
    let config = AggregationConfig::builder(StiffnessType::Cff)
        .receiver_patch_agg(AggregationMethod::Sum)
        .sect_to_sect_agg(AggregationMethod::Mean)
        .allow_sect_to_self(true)
        .build();
    let engine = AggregationEngine::new(Arc::clone(&calc), config);
    let a = SectionId::new(0);

    let per_patch = engine.calc_receiver_patch_values(a, a).unwrap();
    assert_eq!(per_patch.len(), 4);
    let full = calc.calc_stiffness_distribution(a, a).unwrap();
    for (r, value) in per_patch.iter().enumerate() {
        let row = full.row(StiffnessType::Cff, r);
        let expected: f64 = row.iter().enumerate().filter(|&(s, _)| s != r).map(|(_, v)| v).sum();
        assert!((value - expected).abs() < 1e-9 * expected.abs().max(1.0));
    }
    let mean = engine.calc(a, a).unwrap();
    let expected = per_patch.iter().sum::<f64>() / per_patch.len() as f64;
    assert!((mean - expected).abs() < 1e-9 * expected.abs().max(1.0));
}

/// 写出后由新的计算器载入，条目逐位一致
#[test]
fn test_cache_file_round_trip() {
    let calc = calculator();
    let config = AggregationConfig::builder(StiffnessType::Cff)
        .sect_to_sect_agg(AggregationMethod::GreaterSumMedian)
        .build();
    let engine = AggregationEngine::new(Arc::clone(&calc), config);
    let all = ids();
    for &s in &all {
        for &r in &all {
            if s != r {
                engine.get_sect_aggregation(s, r).unwrap();
            }
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(calc.cache_file_name(StiffnessType::Cff));
    let cache = calc.aggregation_cache(StiffnessType::Cff);
    assert_eq!(cache.write_cache_file(&path).unwrap(), 6);

    let fresh = calculator();
    let loaded = fresh.aggregation_cache(StiffnessType::Cff);
    assert_eq!(loaded.load_cache_file(&path).unwrap(), 6);
    for &s in &all {
        for &r in &all {
            if s != r {
                let x = cache.get(None, s, r).unwrap();
                let y = loaded.get(None, s, r).unwrap();
                assert!(x.bit_eq(&y));
            }
        }
    }
}

/// 零宽度子段无法生成面元
#[test]
fn test_zero_patch_section() {
    let mut sections = model();
    let start = Location::new(35.2, -118.0, 0.0);
    sections.push(Arc::new(SimpleFaultSection {
        id: 3,
        parent_id: Some(2),
        name: "Flat".into(),
        trace: FaultTrace::new(vec![start, start.offset(0.0, 4.0, 0.0)]).unwrap(),
        dip: 45.0,
        rake: 90.0,
        upper_depth: 2.0,
        lower_depth: 2.0,
    }));
    let calc = StiffnessCalculator::new(sections, StiffnessParams::default()).unwrap();
    let err = calc.patches(SectionId::new(3)).unwrap_err();
    assert!(matches!(err, StiffnessError::NoPatches { section: 3 }));
}
