use chrono::{Duration, TimeZone};

use super::*;
use crate::lifecycle::expires_at;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 8, 9, 0, 0).unwrap()
}

fn in_vase(id: i64, vase: i64, watered_at: DateTime<Utc>) -> Flower {
    Flower {
        id: FlowerId(id),
        flower_type: FlowerType::Lily,
        vase_id: Some(VaseId(vase)),
        status: FlowerStatus::Trimmed,
        trimmed_at: Some(watered_at),
        water_changed_at: Some(watered_at),
        created_at: watered_at,
        expires_at: expires_at(FlowerType::Lily, watered_at),
    }
}

#[test]
fn composes_three_slots_in_order() {
    let active = vec![in_vase(1, 2, t0()), in_vase(2, 2, t0() + Duration::hours(2))];
    let view = compose_garden(&active, &[], t0() + Duration::hours(25));

    let ids: Vec<VaseId> = view.vases.iter().map(|vase| vase.id).collect();
    assert_eq!(ids, VaseId::SLOTS.to_vec());

    assert!(!view.vases[0].has_flowers);
    assert!(!view.vases[0].needs_water);
    assert_eq!(view.vases[0].next_water_change, None);
    assert_eq!(view.vases[0].water_change_in, "no data");

    let second = &view.vases[1];
    assert!(second.has_flowers);
    assert_eq!(second.flowers.len(), 2);
    assert_eq!(second.next_water_change, Some(t0() + Duration::hours(24)));
    assert!(second.needs_water);
    assert_eq!(second.water_change_in, "expired");
}

#[test]
fn ignores_flowers_outside_the_fixed_slots() {
    let active = vec![in_vase(1, 9, t0())];
    let view = compose_garden(&active, &[], t0());
    assert!(view.vases.iter().all(|vase| !vase.has_flowers));
}

#[test]
fn flower_view_carries_display_name_and_countdown() {
    let lily = in_vase(1, 1, t0());
    let view = FlowerView::new(&lily, t0() + Duration::days(1));
    assert_eq!(view.display_name, "Lilies");
    assert_eq!(view.time_remaining, "7d 0h");
}

#[test]
fn untrimmed_flowers_are_listed_separately() {
    let fresh = Flower {
        vase_id: None,
        status: FlowerStatus::New,
        trimmed_at: None,
        water_changed_at: None,
        ..in_vase(5, 1, t0())
    };
    let view = compose_garden(&[fresh.clone()], &[fresh], t0());
    assert_eq!(view.untrimmed_flowers.len(), 1);
    assert_eq!(view.untrimmed_flowers[0].id, FlowerId(5));
    assert!(view.vases.iter().all(|vase| !vase.has_flowers));
}

#[test]
fn flowers_past_expiry_at_render_time_are_dropped() {
    let lily = in_vase(1, 1, t0());
    let stale_new = Flower {
        vase_id: None,
        status: FlowerStatus::New,
        trimmed_at: None,
        water_changed_at: None,
        ..in_vase(2, 1, t0())
    };
    let now = lily.expires_at;
    let view = compose_garden(&[lily], &[stale_new], now);
    assert!(view.vases.iter().all(|vase| !vase.has_flowers));
    assert!(view.untrimmed_flowers.is_empty());
}
