//! Location cascade loaded from the gateway.

mod common;

use std::sync::Arc;

use common::{Call, FakeGateway};
use facility_client::{CascadeController, RemoteOptionLoader};
use facility_core::cascade::LevelStatus;
use facility_core::resources::{Resource, LOCATION_CASCADE};
use facility_core::types::EntityId;
use serde_json::json;

fn location_gateway() -> Arc<FakeGateway> {
    Arc::new(
        FakeGateway::new()
            .with_rows(
                Resource::Buildings,
                vec![json!({"id": 1, "name": "Tower A"}), json!({"id": 2, "name": "Tower B"})],
            )
            .with_rows(
                Resource::Wings,
                vec![
                    json!({"id": 10, "name": "East", "building_id": 1}),
                    json!({"id": 11, "name": "West", "building_id": 1}),
                    json!({"id": 20, "name": "North", "building_id": 2}),
                ],
            )
            .with_rows(
                Resource::Areas,
                vec![json!({"id": 100, "name": "Lobby", "wing_id": 10})],
            )
            .with_rows(
                Resource::Floors,
                vec![json!({"id": 1000, "name": "Ground", "area_id": 100})],
            )
            .with_rows(
                Resource::Rooms,
                vec![json!({"id": 5000, "name": "G-01", "floor_id": 1000})],
            ),
    )
}

async fn mounted(gateway: &Arc<FakeGateway>) -> CascadeController {
    let loader = RemoteOptionLoader::new(gateway.clone(), LOCATION_CASCADE);
    let mut ctl = CascadeController::new(
        &["building", "wing", "area", "floor", "room"],
        Arc::new(loader),
    )
    .unwrap();
    ctl.mount().await;
    ctl
}

fn option_ids(ctl: &CascadeController, level: usize) -> Vec<EntityId> {
    ctl.state().options(level).iter().map(|o| o.id).collect()
}

#[tokio::test]
async fn children_are_loaded_for_the_selected_parent() {
    let gateway = location_gateway();
    let mut ctl = mounted(&gateway).await;
    assert_eq!(option_ids(&ctl, 0), vec![1, 2]);

    ctl.select(0, Some(1)).await.unwrap();
    assert_eq!(option_ids(&ctl, 1), vec![10, 11]);
    assert_eq!(ctl.state().options(1)[0].parent_id, Some(1));

    ctl.select(0, Some(2)).await.unwrap();
    assert_eq!(option_ids(&ctl, 1), vec![20]);
    assert_eq!(
        gateway.calls().last(),
        Some(&Call::Fetch {
            resource: Resource::Wings,
            page: 1
        })
    );
}

#[tokio::test]
async fn clearing_a_level_clears_everything_below() {
    let gateway = location_gateway();
    let mut ctl = mounted(&gateway).await;
    ctl.select_path(&[1, 10, 100, 1000]).await.unwrap();
    assert_eq!(ctl.state().status(4), Some(LevelStatus::Ready));
    assert_eq!(option_ids(&ctl, 4), vec![5000]);

    ctl.select(1, None).await.unwrap();
    assert_eq!(
        ctl.state().selections(),
        vec![Some(1), None, None, None, None]
    );
    for level in 2..5 {
        assert_eq!(ctl.state().status(level), Some(LevelStatus::Disabled));
        assert!(ctl.state().options(level).is_empty());
    }
    assert!(ctl.state().is_consistent());
}

#[tokio::test]
async fn same_value_does_not_reload() {
    let gateway = location_gateway();
    let mut ctl = mounted(&gateway).await;
    ctl.select(0, Some(1)).await.unwrap();
    let before = gateway.fetch_count();

    assert_eq!(ctl.select(0, Some(1)).await.unwrap(), None);
    assert_eq!(gateway.fetch_count(), before);
}

#[tokio::test]
async fn unknown_value_is_rejected() {
    let gateway = location_gateway();
    let mut ctl = mounted(&gateway).await;
    assert!(ctl.select(0, Some(99)).await.is_err());
    assert!(ctl.select(1, Some(10)).await.is_err(), "wing level is not ready yet");
}

#[tokio::test]
async fn failed_load_disables_level_with_notice() {
    let gateway = location_gateway();
    let mut ctl = mounted(&gateway).await;
    gateway.fail_fetches(true);

    ctl.select(0, Some(1)).await.unwrap();
    assert_eq!(ctl.state().status(1), Some(LevelStatus::Disabled));
    assert_eq!(ctl.drain_notices().len(), 1);
}

#[tokio::test]
async fn reselecting_parent_retries_failed_load() {
    let gateway = location_gateway();
    let mut ctl = mounted(&gateway).await;
    gateway.fail_fetches(true);
    ctl.select(0, Some(1)).await.unwrap();
    assert_eq!(ctl.state().status(1), Some(LevelStatus::Disabled));

    gateway.fail_fetches(false);
    let before = gateway.fetch_count();
    assert!(ctl.select(0, Some(1)).await.unwrap().is_some());
    assert_eq!(gateway.fetch_count(), before + 1);
    assert_eq!(ctl.state().status(1), Some(LevelStatus::Ready));
    assert_eq!(option_ids(&ctl, 1), vec![10, 11]);
}
