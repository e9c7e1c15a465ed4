use ar_data_logger::accumulator::PointAccumulator;
use ar_data_logger::config::PointSchema;
use ar_data_logger::types::PointRecord;
use glam::Vec3;
use std::collections::{HashMap, HashSet};

#[test]
fn test_feature_count_equals_distinct_ids() {
    let mut acc = PointAccumulator::new();
    let ids = [5u32, 9, 5, 5, 120_000, 9, 0, 7, 0];
    for (i, id) in ids.iter().enumerate() {
        acc.append_or_update(*id, Vec3::splat(i as f32), None);
    }
    let distinct: HashSet<_> = ids.iter().collect();
    assert_eq!(acc.feature_count(), distinct.len());
    assert_eq!(acc.snapshot().len(), acc.feature_count());
}

#[test]
fn test_slot_is_stable_across_updates() {
    let mut acc = PointAccumulator::with_capacity(4);
    let mut first_slot = HashMap::new();
    for round in 0..5 {
        for id in [3u32, 1, 4, 1, 5, 9, 2, 6] {
            let slot = acc.append_or_update(id, Vec3::new(round as f32, 0.0, 0.0), None);
            assert_eq!(*first_slot.entry(id).or_insert(slot), slot);
            assert_eq!(acc.slot_of(id), Some(slot));
        }
    }
    assert_eq!(acc.slot_of(3), Some(0));
    assert_eq!(acc.slot_of(1), Some(1));
    assert_eq!(acc.slot_of(7), None);
}

#[test]
fn test_update_overwrites_in_place() {
    let mut acc = PointAccumulator::new();
    acc.append_or_update(5, Vec3::new(1.0, 2.0, 3.0), Some(Vec3::new(10.0, 20.0, 30.0)));
    acc.append_or_update(9, Vec3::new(4.0, 5.0, 6.0), Some(Vec3::ZERO));
    acc.append_or_update(5, Vec3::new(-1.0, -2.0, -3.0), Some(Vec3::new(1.0, 1.0, 1.0)));

    let p = acc.get(5).unwrap();
    assert_eq!(p.position, Vec3::new(-1.0, -2.0, -3.0));
    assert_eq!(p.color, Some(Vec3::new(1.0, 1.0, 1.0)));
    assert_eq!(acc.positions(), &[Vec3::new(-1.0, -2.0, -3.0), Vec3::new(4.0, 5.0, 6.0)]);
}

#[test]
fn test_snapshot_keeps_assignment_order() {
    let mut acc = PointAccumulator::new();
    for id in [42u32, 7, 99] {
        acc.append_or_update(id, Vec3::splat(id as f32), None);
    }
    acc.append_or_update(7, Vec3::ZERO, None);
    let ids: Vec<u32> = acc.snapshot().map(|p| p.id).collect();
    assert_eq!(ids, vec![42, 7, 99]);
}

#[test]
fn test_clear_forgets_everything() {
    let mut acc = PointAccumulator::new();
    acc.append_or_update(1, Vec3::ONE, None);
    acc.clear();
    assert!(acc.is_empty());
    assert_eq!(acc.feature_count(), 0);
    assert_eq!(acc.slot_of(1), None);
    assert_eq!(acc.append_or_update(2, Vec3::ONE, None), 0);
}

#[test]
fn test_to_record_per_schema() {
    let mut acc = PointAccumulator::new();
    acc.append_or_update(7, Vec3::new(1.5, -2.25, 0.125), Some(Vec3::new(255.0, 0.0, 12.0)));
    let p = acc.get(7).unwrap();
    assert_eq!(
        p.to_record(PointSchema::Compact),
        Some(PointRecord::Compact {
            id: 7,
            position: Vec3::new(1.5, -2.25, 0.125)
        })
    );
    assert_eq!(
        p.to_record(PointSchema::Colored),
        Some(PointRecord::Colored {
            position: Vec3::new(1.5, -2.25, 0.125),
            color: Vec3::new(255.0, 0.0, 12.0)
        })
    );
    assert_eq!(p.to_record(PointSchema::Disabled), None);
}
