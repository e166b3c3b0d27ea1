mod common;

use assert_matches::assert_matches;
use common::{dec, seed_location, seed_product, setup, tenant};
use retailpos_api::entities::inventory_movement::MovementType;
use retailpos_api::errors::ServiceError;
use retailpos_api::services::movements::RecordMovementInput;
use uuid::Uuid;

#[tokio::test]
async fn reserving_everything_leaves_nothing_available() {
    let ctx = setup().await;
    let t = tenant("acme");
    let product = seed_product(&ctx, &t, "SKU-RES", dec("10"), 0).await;
    let store = seed_location(&ctx, &t, "Store").await;

    ctx.movements
        .record_movement(
            &t,
            RecordMovementInput::new(
                product.id,
                store.id,
                MovementType::Purchase,
                5,
                Uuid::new_v4(),
            )
            .with_unit_cost(dec("10")),
        )
        .await
        .expect("receipt failed");

    let position = ctx
        .positions
        .reserve(&t, product.id, store.id, 5)
        .await
        .expect("reserve failed");
    assert_eq!(position.quantity_on_hand, 5);
    assert_eq!(position.quantity_reserved, 5);
    assert_eq!(position.quantity_available, 0);

    let err = ctx
        .positions
        .reserve(&t, product.id, store.id, 1)
        .await
        .expect_err("second hold should fail");
    assert_matches!(
        err,
        ServiceError::InsufficientStock {
            available: 0,
            requested: 1
        }
    );
    assert!(!ctx
        .positions
        .is_in_stock(&t, product.id, store.id, 1)
        .await
        .expect("is_in_stock failed"));
}

#[tokio::test]
async fn release_floors_at_zero() {
    let ctx = setup().await;
    let t = tenant("acme");
    let product = seed_product(&ctx, &t, "SKU-REL", dec("10"), 0).await;
    let store = seed_location(&ctx, &t, "Store").await;

    ctx.movements
        .record_movement(
            &t,
            RecordMovementInput::new(
                product.id,
                store.id,
                MovementType::Purchase,
                6,
                Uuid::new_v4(),
            )
            .with_unit_cost(dec("10")),
        )
        .await
        .expect("receipt failed");
    ctx.positions
        .reserve(&t, product.id, store.id, 4)
        .await
        .expect("reserve failed");

    // Releasing more than is held is not an error.
    let position = ctx
        .positions
        .release_reserved(&t, product.id, store.id, 10)
        .await
        .expect("release failed");
    assert_eq!(position.quantity_reserved, 0);
    assert_eq!(position.quantity_available, 6);
}

#[tokio::test]
async fn get_or_create_is_idempotent() {
    let ctx = setup().await;
    let t = tenant("acme");
    let product = seed_product(&ctx, &t, "SKU-GOC", dec("12"), 0).await;
    let store = seed_location(&ctx, &t, "Store").await;

    let first = ctx
        .positions
        .get_or_create(&t, product.id, store.id)
        .await
        .expect("first call failed");
    assert_eq!(first.quantity_on_hand, 0);
    assert_eq!(first.average_cost, dec("12"));

    let second = ctx
        .positions
        .get_or_create(&t, product.id, store.id)
        .await
        .expect("second call failed");
    assert_eq!(first.id, second.id);
    assert_eq!(first.quantity_on_hand, second.quantity_on_hand);
}

#[tokio::test]
async fn positions_require_known_product_and_location() {
    let ctx = setup().await;
    let t = tenant("acme");
    let store = seed_location(&ctx, &t, "Store").await;

    assert_matches!(
        ctx.positions.get_or_create(&t, Uuid::new_v4(), store.id).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        ctx.positions.reserve(&t, Uuid::new_v4(), store.id, 1).await,
        Err(ServiceError::NotFound(_))
    );
}
