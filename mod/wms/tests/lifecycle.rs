//! End-to-end lifecycle against the public service API.

use chrono::Utc;

use sql::SqliteStore;
use wms::service::UndoneScan;
use wms::{WmsConfig, WmsService};

fn service() -> WmsService {
    let sql = SqliteStore::open_in_memory().expect("in-memory sqlite");
    let config = WmsConfig {
        guard_enabled: false,
        machine: "test-machine".into(),
        ..WmsConfig::default()
    };
    WmsService::new(Box::new(sql), config).expect("service")
}

#[test]
fn register_confirm_undo_scenario() {
    let s = service();

    let registration = s.register("ITEM-1", "20260101", 2).unwrap();
    assert_eq!(registration.pallet_id, "P-001");
    assert!(registration.created_new);

    assert!(s.confirm("PALLET:P-001", Utc::now()).unwrap().is_some());
    assert!(s.confirm("PALLET:P-001", Utc::now()).unwrap().is_some());

    let entry = &s.recent_entries(1).unwrap()[0];
    assert_eq!(entry.confirmed_quantity, 2);
    assert!(entry.confirmed_moved);

    // No pending entries left.
    assert!(s.confirm("PALLET:P-001", Utc::now()).unwrap().is_none());

    // Undo removes the founding registration and with it the pallet.
    assert_eq!(
        s.undo_last().unwrap(),
        Some(UndoneScan { pallet_id: "P-001".into(), quantity: 2 })
    );
    assert!(s.open_pallets().unwrap().is_empty());
    assert!(s.recent_entries(10).unwrap().is_empty());
}

#[test]
fn snapshot_survives_service_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wms.sqlite");

    let payload = {
        let sql = SqliteStore::open(&path).expect("sqlite");
        let s = WmsService::new(Box::new(sql), WmsConfig::default()).expect("service");
        s.register("ITEM-1", "20260101", 2).unwrap();
        s.register("ITEM-2", "20260101", 1).unwrap();
        s.backup().unwrap()
    };

    // A fresh service over a fresh database restores the snapshot.
    let s = service();
    s.restore(&payload).unwrap();

    let pallets = s.open_pallets().unwrap();
    assert_eq!(pallets.len(), 1);
    assert_eq!(pallets[0].pallet_id, "P-001");
    assert_eq!(pallets[0].total_quantity, 3);
    assert_eq!(s.pallet_contents("P-001").unwrap().len(), 2);
}
