mod common;

use assert_matches::assert_matches;
use common::{dec, seed_location, seed_product, setup, tenant};
use retailpos_api::entities::inventory_movement::MovementType;
use retailpos_api::entities::transfer_recommendation::RecommendationStatus;
use retailpos_api::errors::ServiceError;
use retailpos_api::services::movements::RecordMovementInput;
use uuid::Uuid;

#[tokio::test]
async fn low_stock_uses_effective_reorder_levels() {
    let ctx = setup().await;
    let t = tenant("acme");
    let widget = seed_product(&ctx, &t, "SKU-W", dec("10"), 10).await;
    let gadget = seed_product(&ctx, &t, "SKU-G", dec("10"), 2).await;
    let store = seed_location(&ctx, &t, "Store").await;
    let user = Uuid::new_v4();

    // widget: 4 available against a reorder level of 10 -> low.
    // gadget: 4 available against a reorder level of 2 -> fine.
    for product in [&widget, &gadget] {
        ctx.movements
            .record_movement(
                &t,
                RecordMovementInput::new(product.id, store.id, MovementType::Purchase, 4, user)
                    .with_unit_cost(dec("10")),
            )
            .await
            .expect("receipt failed");
    }

    let rows = ctx.reports.low_stock(&t).await.expect("report failed");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].product_id, widget.id);
    assert_eq!(rows[0].quantity_available, 4);
    assert_eq!(rows[0].effective_reorder_level, 10);
}

#[tokio::test]
async fn out_of_stock_lists_exhausted_positions() {
    let ctx = setup().await;
    let t = tenant("acme");
    let product = seed_product(&ctx, &t, "SKU-OOS", dec("10"), 5).await;
    let store = seed_location(&ctx, &t, "Store").await;
    let user = Uuid::new_v4();

    ctx.movements
        .record_movement(
            &t,
            RecordMovementInput::new(product.id, store.id, MovementType::Purchase, 3, user)
                .with_unit_cost(dec("10")),
        )
        .await
        .expect("receipt failed");
    ctx.movements
        .record_movement(
            &t,
            RecordMovementInput::new(product.id, store.id, MovementType::Sale, -3, user),
        )
        .await
        .expect("sale failed");

    let rows = ctx.reports.out_of_stock(&t).await.expect("report failed");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].product_id, product.id);
}

#[tokio::test]
async fn valuation_rolls_up_by_location_and_product() {
    let ctx = setup().await;
    let t = tenant("acme");
    let widget = seed_product(&ctx, &t, "SKU-VW", dec("10"), 0).await;
    let gadget = seed_product(&ctx, &t, "SKU-VG", dec("25"), 0).await;
    let store = seed_location(&ctx, &t, "Store").await;
    let warehouse = seed_location(&ctx, &t, "Warehouse").await;
    let user = Uuid::new_v4();

    // 10 widgets @ 10 in the store, 4 gadgets @ 25 in the warehouse.
    ctx.movements
        .record_movement(
            &t,
            RecordMovementInput::new(widget.id, store.id, MovementType::Purchase, 10, user)
                .with_unit_cost(dec("10")),
        )
        .await
        .expect("receipt failed");
    ctx.movements
        .record_movement(
            &t,
            RecordMovementInput::new(gadget.id, warehouse.id, MovementType::Purchase, 4, user)
                .with_unit_cost(dec("25")),
        )
        .await
        .expect("receipt failed");

    let report = ctx.reports.valuation(&t).await.expect("report failed");
    assert_eq!(report.total_value, dec("200"));
    assert_eq!(report.by_location.len(), 2);
    assert_eq!(report.by_product.len(), 2);

    let widgets = report
        .by_product
        .iter()
        .find(|p| p.product_id == widget.id)
        .expect("widget row missing");
    assert_eq!(widgets.quantity_on_hand, 10);
    assert_eq!(widgets.total_value, dec("100"));
}

#[tokio::test]
async fn recommendations_target_starved_locations_from_surpluses() {
    let ctx = setup().await;
    let t = tenant("acme");
    let product = seed_product(&ctx, &t, "SKU-REC", dec("10"), 10).await;
    let store = seed_location(&ctx, &t, "Store").await;
    let warehouse = seed_location(&ctx, &t, "Warehouse").await;
    let user = Uuid::new_v4();

    // Warehouse holds a surplus, the store sits below its reorder level.
    ctx.movements
        .record_movement(
            &t,
            RecordMovementInput::new(product.id, warehouse.id, MovementType::Purchase, 50, user)
                .with_unit_cost(dec("10")),
        )
        .await
        .expect("receipt failed");
    ctx.movements
        .record_movement(
            &t,
            RecordMovementInput::new(product.id, store.id, MovementType::Purchase, 5, user)
                .with_unit_cost(dec("10")),
        )
        .await
        .expect("receipt failed");

    let created = ctx
        .reports
        .generate_transfer_recommendations(&t)
        .await
        .expect("generate failed");
    assert_eq!(created.len(), 1);
    let rec = &created[0];
    assert_eq!(rec.from_location_id, warehouse.id);
    assert_eq!(rec.to_location_id, store.id);
    // Half the surplus over the source's reorder level: (50 - 10) / 2.
    assert_eq!(rec.recommended_quantity, 20);
    assert_eq!(rec.status, RecommendationStatus::Pending.as_ref());
    assert!(rec.expires_at.is_some());

    // A pending recommendation for the pair is not duplicated.
    let again = ctx
        .reports
        .generate_transfer_recommendations(&t)
        .await
        .expect("second generate failed");
    assert!(again.is_empty());
}

#[tokio::test]
async fn recommendation_lifecycle_links_the_executed_transfer() {
    let ctx = setup().await;
    let t = tenant("acme");
    let product = seed_product(&ctx, &t, "SKU-REC2", dec("10"), 10).await;
    let store = seed_location(&ctx, &t, "Store").await;
    let warehouse = seed_location(&ctx, &t, "Warehouse").await;
    let user = Uuid::new_v4();

    ctx.movements
        .record_movement(
            &t,
            RecordMovementInput::new(product.id, warehouse.id, MovementType::Purchase, 50, user)
                .with_unit_cost(dec("10")),
        )
        .await
        .expect("receipt failed");
    ctx.movements
        .record_movement(
            &t,
            RecordMovementInput::new(product.id, store.id, MovementType::Purchase, 2, user)
                .with_unit_cost(dec("10")),
        )
        .await
        .expect("receipt failed");

    let rec = ctx
        .reports
        .generate_transfer_recommendations(&t)
        .await
        .expect("generate failed")
        .remove(0);

    // Cannot process a recommendation that was never approved.
    assert_matches!(
        ctx.reports.mark_processed(&t, rec.id, Uuid::new_v4()).await,
        Err(ServiceError::InvalidState(_))
    );

    let approved = ctx
        .reports
        .approve_recommendation(&t, rec.id)
        .await
        .expect("approve failed");
    assert_eq!(approved.status, RecommendationStatus::Approved.as_ref());

    let transfer = ctx
        .transfers
        .transfer(
            &t,
            product.id,
            warehouse.id,
            store.id,
            rec.recommended_quantity,
            user,
            None,
        )
        .await
        .expect("transfer failed");
    let processed = ctx
        .reports
        .mark_processed(&t, rec.id, transfer.outbound.id)
        .await
        .expect("mark_processed failed");
    assert_eq!(processed.status, RecommendationStatus::Processed.as_ref());
    assert_eq!(processed.processed_movement_id, Some(transfer.outbound.id));
}

#[tokio::test]
async fn dismissed_recommendations_are_terminal() {
    let ctx = setup().await;
    let t = tenant("acme");
    let product = seed_product(&ctx, &t, "SKU-REC3", dec("10"), 10).await;
    let store = seed_location(&ctx, &t, "Store").await;
    let warehouse = seed_location(&ctx, &t, "Warehouse").await;
    let user = Uuid::new_v4();

    ctx.movements
        .record_movement(
            &t,
            RecordMovementInput::new(product.id, warehouse.id, MovementType::Purchase, 60, user)
                .with_unit_cost(dec("10")),
        )
        .await
        .expect("receipt failed");
    let rec = ctx
        .reports
        .generate_transfer_recommendations(&t)
        .await
        .expect("generate failed");
    // The store has no position yet, so there is no destination.
    assert!(rec.is_empty());

    ctx.movements
        .record_movement(
            &t,
            RecordMovementInput::new(product.id, store.id, MovementType::Purchase, 1, user)
                .with_unit_cost(dec("10")),
        )
        .await
        .expect("receipt failed");
    let rec = ctx
        .reports
        .generate_transfer_recommendations(&t)
        .await
        .expect("generate failed")
        .remove(0);

    let dismissed = ctx
        .reports
        .dismiss_recommendation(&t, rec.id)
        .await
        .expect("dismiss failed");
    assert_eq!(dismissed.status, RecommendationStatus::Dismissed.as_ref());
    assert_matches!(
        ctx.reports.approve_recommendation(&t, rec.id).await,
        Err(ServiceError::InvalidState(_))
    );
}

#[tokio::test]
async fn one_surplus_source_is_not_promised_to_every_destination() {
    let ctx = setup().await;
    let t = tenant("acme");
    let product = seed_product(&ctx, &t, "SKU-REC4", dec("10"), 10).await;
    let first = seed_location(&ctx, &t, "First Store").await;
    let second = seed_location(&ctx, &t, "Second Store").await;
    let warehouse = seed_location(&ctx, &t, "Warehouse").await;
    let user = Uuid::new_v4();

    ctx.movements
        .record_movement(
            &t,
            RecordMovementInput::new(product.id, warehouse.id, MovementType::Purchase, 50, user)
                .with_unit_cost(dec("10")),
        )
        .await
        .expect("receipt failed");
    for (location, quantity) in [(&first, 2), (&second, 5)] {
        ctx.movements
            .record_movement(
                &t,
                RecordMovementInput::new(
                    product.id,
                    location.id,
                    MovementType::Purchase,
                    quantity,
                    user,
                )
                .with_unit_cost(dec("10")),
            )
            .await
            .expect("receipt failed");
    }

    let created = ctx
        .reports
        .generate_transfer_recommendations(&t)
        .await
        .expect("generate failed");
    assert_eq!(created.len(), 2);

    // The emptier store draws from the full surplus, (50 - 10) / 2; the
    // second draws from what is left of it, (30 - 10) / 2. Together they
    // never exceed the surplus the warehouse actually holds.
    let quantity_for = |location_id| {
        created
            .iter()
            .find(|r| r.to_location_id == location_id)
            .expect("recommendation missing")
            .recommended_quantity
    };
    assert_eq!(quantity_for(first.id), 20);
    assert_eq!(quantity_for(second.id), 10);
    assert!(created.iter().map(|r| r.recommended_quantity).sum::<i32>() <= 40);
}
