mod common;

use assert_matches::assert_matches;
use common::{dec, seed_product, setup, tenant};
use retailpos_api::entities::inventory_location::LocationType;
use retailpos_api::entities::inventory_movement::MovementType;
use retailpos_api::errors::ServiceError;
use retailpos_api::services::locations::NewLocation;
use retailpos_api::services::movements::RecordMovementInput;
use uuid::Uuid;

fn store(name: &str, is_default: bool) -> NewLocation {
    NewLocation {
        name: name.to_string(),
        location_type: LocationType::Store,
        is_default,
    }
}

#[tokio::test]
async fn only_one_default_location_per_tenant() {
    let ctx = setup().await;
    let t = tenant("acme");

    let first = ctx
        .locations
        .create(&t, store("First", true))
        .await
        .expect("create failed");
    assert!(first.is_default);

    let second = ctx
        .locations
        .create(&t, store("Second", true))
        .await
        .expect("create failed");
    assert!(second.is_default);

    let first = ctx
        .locations
        .get(&t, first.id)
        .await
        .expect("get failed");
    assert!(!first.is_default);

    let def = ctx
        .locations
        .default_location(&t)
        .await
        .expect("default lookup failed");
    assert_eq!(def.map(|l| l.id), Some(second.id));

    // set_default flips it back.
    ctx.locations
        .set_default(&t, first.id)
        .await
        .expect("set_default failed");
    let def = ctx
        .locations
        .default_location(&t)
        .await
        .expect("default lookup failed");
    assert_eq!(def.map(|l| l.id), Some(first.id));
}

#[tokio::test]
async fn defaults_are_tenant_scoped() {
    let ctx = setup().await;
    let acme = tenant("acme");
    let globex = tenant("globex");

    ctx.locations
        .create(&acme, store("Acme Main", true))
        .await
        .expect("create failed");
    let globex_loc = ctx
        .locations
        .create(&globex, store("Globex Main", true))
        .await
        .expect("create failed");

    // Creating globex's default must not clear acme's.
    assert!(ctx
        .locations
        .default_location(&acme)
        .await
        .expect("default lookup failed")
        .is_some());
    assert!(globex_loc.is_default);
    assert_matches!(
        ctx.locations.get(&acme, globex_loc.id).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn deletion_is_guarded() {
    let ctx = setup().await;
    let t = tenant("acme");
    let product = seed_product(&ctx, &t, "SKU-LOC", dec("10"), 0).await;

    let main = ctx
        .locations
        .create(&t, store("Main", true))
        .await
        .expect("create failed");
    let spare = ctx
        .locations
        .create(&t, store("Spare", false))
        .await
        .expect("create failed");

    // The default location cannot be deleted.
    assert_matches!(
        ctx.locations.delete(&t, main.id).await,
        Err(ServiceError::ValidationError(_))
    );

    // A location with stock positions cannot be deleted either.
    ctx.movements
        .record_movement(
            &t,
            RecordMovementInput::new(
                product.id,
                spare.id,
                MovementType::Purchase,
                1,
                Uuid::new_v4(),
            )
            .with_unit_cost(dec("10")),
        )
        .await
        .expect("receipt failed");
    assert_matches!(
        ctx.locations.delete(&t, spare.id).await,
        Err(ServiceError::ValidationError(_))
    );

    let empty = ctx
        .locations
        .create(&t, store("Empty", false))
        .await
        .expect("create failed");
    ctx.locations
        .delete(&t, empty.id)
        .await
        .expect("delete failed");
    assert_matches!(
        ctx.locations.get(&t, empty.id).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn deactivated_locations_drop_out_of_the_default_list() {
    let ctx = setup().await;
    let t = tenant("acme");

    let main = ctx
        .locations
        .create(&t, store("Main", false))
        .await
        .expect("create failed");
    let closed = ctx
        .locations
        .create(&t, store("Closing Down", false))
        .await
        .expect("create failed");

    let closed = ctx
        .locations
        .deactivate(&t, closed.id)
        .await
        .expect("deactivate failed");
    assert!(!closed.is_active);

    let active = ctx
        .locations
        .list(&t, false)
        .await
        .expect("list failed");
    assert_eq!(active.iter().map(|l| l.id).collect::<Vec<_>>(), vec![main.id]);

    let all = ctx
        .locations
        .list(&t, true)
        .await
        .expect("list failed");
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn location_names_cannot_be_blank() {
    let ctx = setup().await;
    let t = tenant("acme");
    assert_matches!(
        ctx.locations.create(&t, store("  ", false)).await,
        Err(ServiceError::ValidationError(_))
    );
}
