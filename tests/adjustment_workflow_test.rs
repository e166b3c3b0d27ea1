mod common;

use assert_matches::assert_matches;
use common::{dec, seed_location, seed_product, setup, setup_with, tenant};
use retailpos_api::config::NegativeStockPolicy;
use retailpos_api::entities::inventory_movement::{MovementReference, MovementType};
use retailpos_api::entities::stock_adjustment::{
    AdjustmentReason, AdjustmentStatus, AdjustmentType,
};
use retailpos_api::errors::ServiceError;
use retailpos_api::services::adjustments::{NewAdjustment, NewAdjustmentItem};
use retailpos_api::services::movements::{MovementHistoryFilter, RecordMovementInput};
use uuid::Uuid;

fn recount(location_id: Uuid) -> NewAdjustment {
    NewAdjustment {
        location_id,
        adjustment_type: AdjustmentType::Recount,
        reason: AdjustmentReason::PhysicalCount,
        notes: None,
    }
}

#[tokio::test]
async fn draft_snapshots_system_quantities() {
    let ctx = setup().await;
    let t = tenant("acme");
    let product = seed_product(&ctx, &t, "SKU-ADJ", dec("10"), 0).await;
    let store = seed_location(&ctx, &t, "Store").await;
    let user = Uuid::new_v4();

    ctx.movements
        .record_movement(
            &t,
            RecordMovementInput::new(product.id, store.id, MovementType::Purchase, 10, user)
                .with_unit_cost(dec("10")),
        )
        .await
        .expect("receipt failed");

    let detail = ctx
        .adjustments
        .create(
            &t,
            recount(store.id),
            vec![NewAdjustmentItem {
                product_id: product.id,
                actual_quantity: 7,
                unit_cost: None,
            }],
            user,
        )
        .await
        .expect("create failed");

    assert_eq!(detail.adjustment.status, AdjustmentStatus::Draft.as_ref());
    assert!(detail.adjustment.adjustment_number.starts_with("ADJ-"));
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].system_quantity, 10);
    assert_eq!(detail.items[0].actual_quantity, 7);
    assert_eq!(detail.items[0].adjustment_quantity, -3);
    assert_eq!(detail.items[0].unit_cost, dec("10"));
}

#[tokio::test]
async fn approval_materializes_one_movement_per_counted_item() {
    let ctx = setup().await;
    let t = tenant("acme");
    let short = seed_product(&ctx, &t, "SKU-SHORT", dec("10"), 0).await;
    let exact = seed_product(&ctx, &t, "SKU-EXACT", dec("4"), 0).await;
    let store = seed_location(&ctx, &t, "Store").await;
    let counter = Uuid::new_v4();
    let approver = Uuid::new_v4();

    for (product, qty) in [(&short, 10), (&exact, 6)] {
        ctx.movements
            .record_movement(
                &t,
                RecordMovementInput::new(product.id, store.id, MovementType::Purchase, qty, counter)
                    .with_unit_cost(product.cost),
            )
            .await
            .expect("receipt failed");
    }

    let detail = ctx
        .adjustments
        .create(
            &t,
            recount(store.id),
            vec![
                NewAdjustmentItem {
                    product_id: short.id,
                    actual_quantity: 8,
                    unit_cost: None,
                },
                // Counted exactly right; must not produce a ledger entry.
                NewAdjustmentItem {
                    product_id: exact.id,
                    actual_quantity: 6,
                    unit_cost: None,
                },
            ],
            counter,
        )
        .await
        .expect("create failed");

    ctx.adjustments
        .submit_for_approval(&t, detail.adjustment.id)
        .await
        .expect("submit failed");
    let (adjustment, movements) = ctx
        .adjustments
        .approve(&t, detail.adjustment.id, approver)
        .await
        .expect("approve failed");

    assert_eq!(adjustment.status, AdjustmentStatus::Approved.as_ref());
    assert_eq!(adjustment.approved_by, Some(approver));
    assert!(adjustment.approved_at.is_some());

    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, MovementType::Adjustment.as_ref());
    assert_eq!(movements[0].quantity_change, -2);
    assert_eq!(movements[0].user_id, approver);
    assert_eq!(
        MovementReference::from_columns(
            movements[0].reference_type.as_deref(),
            movements[0].reference_id,
        ),
        MovementReference::StockAdjustment(adjustment.id)
    );

    let position = ctx
        .positions
        .get(&t, short.id, store.id)
        .await
        .expect("get failed")
        .expect("position missing");
    assert_eq!(position.quantity_on_hand, 8);
}

#[tokio::test]
async fn draft_lifecycle_guards_every_transition() {
    let ctx = setup().await;
    let t = tenant("acme");
    let product = seed_product(&ctx, &t, "SKU-GUARD", dec("10"), 0).await;
    let store = seed_location(&ctx, &t, "Store").await;
    let user = Uuid::new_v4();

    let detail = ctx
        .adjustments
        .create(
            &t,
            recount(store.id),
            vec![NewAdjustmentItem {
                product_id: product.id,
                actual_quantity: 3,
                unit_cost: None,
            }],
            user,
        )
        .await
        .expect("create failed");
    let id = detail.adjustment.id;

    // Cannot approve or reject a draft.
    assert_matches!(
        ctx.adjustments.approve(&t, id, user).await,
        Err(ServiceError::InvalidState(_))
    );
    assert_matches!(
        ctx.adjustments.reject(&t, id).await,
        Err(ServiceError::InvalidState(_))
    );

    ctx.adjustments
        .submit_for_approval(&t, id)
        .await
        .expect("submit failed");

    // Once submitted it is no longer editable or deletable.
    assert_matches!(
        ctx.adjustments.update_draft(&t, id, None, Some("late".into())).await,
        Err(ServiceError::InvalidState(_))
    );
    assert_matches!(
        ctx.adjustments.delete_draft(&t, id).await,
        Err(ServiceError::InvalidState(_))
    );
    assert_matches!(
        ctx.adjustments.submit_for_approval(&t, id).await,
        Err(ServiceError::InvalidState(_))
    );
}

#[tokio::test]
async fn rejected_adjustment_writes_no_movements() {
    let ctx = setup().await;
    let t = tenant("acme");
    let product = seed_product(&ctx, &t, "SKU-REJ", dec("10"), 0).await;
    let store = seed_location(&ctx, &t, "Store").await;
    let user = Uuid::new_v4();

    let detail = ctx
        .adjustments
        .create(
            &t,
            recount(store.id),
            vec![NewAdjustmentItem {
                product_id: product.id,
                actual_quantity: 5,
                unit_cost: Some(dec("10")),
            }],
            user,
        )
        .await
        .expect("create failed");
    ctx.adjustments
        .submit_for_approval(&t, detail.adjustment.id)
        .await
        .expect("submit failed");
    let rejected = ctx
        .adjustments
        .reject(&t, detail.adjustment.id)
        .await
        .expect("reject failed");
    assert_eq!(rejected.status, AdjustmentStatus::Rejected.as_ref());

    let (_, total) = ctx
        .movements
        .list_movements(&t, &MovementHistoryFilter::default(), 1, 20)
        .await
        .expect("list failed");
    assert_eq!(total, 0);

    // Terminal states stay terminal.
    assert_matches!(
        ctx.adjustments.approve(&t, detail.adjustment.id, user).await,
        Err(ServiceError::InvalidState(_))
    );
}

#[tokio::test]
async fn deleted_draft_leaves_nothing_behind() {
    let ctx = setup().await;
    let t = tenant("acme");
    let product = seed_product(&ctx, &t, "SKU-DEL", dec("10"), 0).await;
    let store = seed_location(&ctx, &t, "Store").await;
    let user = Uuid::new_v4();

    let detail = ctx
        .adjustments
        .create(
            &t,
            recount(store.id),
            vec![NewAdjustmentItem {
                product_id: product.id,
                actual_quantity: 2,
                unit_cost: None,
            }],
            user,
        )
        .await
        .expect("create failed");
    ctx.adjustments
        .delete_draft(&t, detail.adjustment.id)
        .await
        .expect("delete failed");

    assert_matches!(
        ctx.adjustments.get(&t, detail.adjustment.id).await,
        Err(ServiceError::NotFound(_))
    );
    let (_, total) = ctx
        .movements
        .list_movements(&t, &MovementHistoryFilter::default(), 1, 20)
        .await
        .expect("list failed");
    assert_eq!(total, 0);
}

#[tokio::test]
async fn self_approval_can_be_disallowed() {
    let ctx = setup_with(NegativeStockPolicy::ClampToZero, false).await;
    let t = tenant("acme");
    let product = seed_product(&ctx, &t, "SKU-SELF", dec("10"), 0).await;
    let store = seed_location(&ctx, &t, "Store").await;
    let counter = Uuid::new_v4();

    let detail = ctx
        .adjustments
        .create(
            &t,
            recount(store.id),
            vec![NewAdjustmentItem {
                product_id: product.id,
                actual_quantity: 1,
                unit_cost: None,
            }],
            counter,
        )
        .await
        .expect("create failed");
    ctx.adjustments
        .submit_for_approval(&t, detail.adjustment.id)
        .await
        .expect("submit failed");

    assert_matches!(
        ctx.adjustments.approve(&t, detail.adjustment.id, counter).await,
        Err(ServiceError::ValidationError(_))
    );

    // A different approver is still fine.
    let (adjustment, _) = ctx
        .adjustments
        .approve(&t, detail.adjustment.id, Uuid::new_v4())
        .await
        .expect("approve failed");
    assert_eq!(adjustment.status, AdjustmentStatus::Approved.as_ref());
}

#[tokio::test]
async fn update_draft_resnapshots_items() {
    let ctx = setup().await;
    let t = tenant("acme");
    let product = seed_product(&ctx, &t, "SKU-UPD", dec("10"), 0).await;
    let store = seed_location(&ctx, &t, "Store").await;
    let user = Uuid::new_v4();

    ctx.movements
        .record_movement(
            &t,
            RecordMovementInput::new(product.id, store.id, MovementType::Purchase, 4, user)
                .with_unit_cost(dec("10")),
        )
        .await
        .expect("receipt failed");

    let detail = ctx
        .adjustments
        .create(
            &t,
            recount(store.id),
            vec![NewAdjustmentItem {
                product_id: product.id,
                actual_quantity: 2,
                unit_cost: None,
            }],
            user,
        )
        .await
        .expect("create failed");

    let updated = ctx
        .adjustments
        .update_draft(
            &t,
            detail.adjustment.id,
            Some(vec![NewAdjustmentItem {
                product_id: product.id,
                actual_quantity: 9,
                unit_cost: None,
            }]),
            Some("recounted after restock".into()),
        )
        .await
        .expect("update failed");

    assert_eq!(updated.items.len(), 1);
    assert_eq!(updated.items[0].actual_quantity, 9);
    assert_eq!(updated.items[0].adjustment_quantity, 5);
    assert_eq!(updated.adjustment.notes.as_deref(), Some("recounted after restock"));
}

#[tokio::test]
async fn adjustments_require_items_and_a_real_location() {
    let ctx = setup().await;
    let t = tenant("acme");
    let product = seed_product(&ctx, &t, "SKU-VAL", dec("10"), 0).await;
    let store = seed_location(&ctx, &t, "Store").await;

    assert_matches!(
        ctx.adjustments
            .create(&t, recount(store.id), vec![], Uuid::new_v4())
            .await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        ctx.adjustments
            .create(
                &t,
                recount(Uuid::new_v4()),
                vec![NewAdjustmentItem {
                    product_id: product.id,
                    actual_quantity: 1,
                    unit_cost: None,
                }],
                Uuid::new_v4(),
            )
            .await,
        Err(ServiceError::NotFound(_))
    );
}
