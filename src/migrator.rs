use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_products_table::Migration),
            Box::new(m20240101_000002_create_inventory_locations_table::Migration),
            Box::new(m20240101_000003_create_product_inventory_table::Migration),
            Box::new(m20240101_000004_create_inventory_movements_table::Migration),
            Box::new(m20240101_000005_create_stock_adjustments_tables::Migration),
            Box::new(m20240101_000006_create_transfer_recommendations_table::Migration),
        ]
    }
}

mod m20240101_000001_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Domain).string().not_null())
                        .col(ColumnDef::new(Products::Sku).string().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Cost).decimal().not_null().default(0))
                        .col(
                            ColumnDef::new(Products::ReorderLevel)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::MaxStockLevel).integer().null())
                        .col(
                            ColumnDef::new(Products::TrackInventory)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Products::StockStatus).string().not_null())
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_products_domain_sku")
                        .table(Products::Table)
                        .col(Products::Domain)
                        .col(Products::Sku)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Domain,
        Sku,
        Name,
        Cost,
        ReorderLevel,
        MaxStockLevel,
        TrackInventory,
        StockStatus,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_inventory_locations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_inventory_locations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryLocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryLocations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryLocations::Domain).string().not_null())
                        .col(ColumnDef::new(InventoryLocations::Name).string().not_null())
                        .col(
                            ColumnDef::new(InventoryLocations::LocationType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryLocations::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(InventoryLocations::IsDefault)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(InventoryLocations::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryLocations::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_inventory_locations_domain")
                        .table(InventoryLocations::Table)
                        .col(InventoryLocations::Domain)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryLocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryLocations {
        Table,
        Id,
        Domain,
        Name,
        LocationType,
        IsActive,
        IsDefault,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_product_inventory_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_product_inventory_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductInventory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductInventory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductInventory::Domain).string().not_null())
                        .col(ColumnDef::new(ProductInventory::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ProductInventory::LocationId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductInventory::QuantityOnHand)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductInventory::QuantityReserved)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductInventory::QuantityAvailable)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductInventory::AverageCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductInventory::LastCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductInventory::TotalValue)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ProductInventory::ReorderLevel).integer().null())
                        .col(ColumnDef::new(ProductInventory::MaxStockLevel).integer().null())
                        .col(ColumnDef::new(ProductInventory::Markup).decimal().null())
                        .col(
                            ColumnDef::new(ProductInventory::LastMovementAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductInventory::LastRestockAt)
                                .timestamp()
                                .null(),
                        )
                        .col(ColumnDef::new(ProductInventory::LastSaleAt).timestamp().null())
                        .col(
                            ColumnDef::new(ProductInventory::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductInventory::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One position per (tenant, product, location).
            manager
                .create_index(
                    Index::create()
                        .name("idx_product_inventory_pair")
                        .table(ProductInventory::Table)
                        .col(ProductInventory::Domain)
                        .col(ProductInventory::ProductId)
                        .col(ProductInventory::LocationId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductInventory::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ProductInventory {
        Table,
        Id,
        Domain,
        ProductId,
        LocationId,
        QuantityOnHand,
        QuantityReserved,
        QuantityAvailable,
        AverageCost,
        LastCost,
        TotalValue,
        ReorderLevel,
        MaxStockLevel,
        Markup,
        LastMovementAt,
        LastRestockAt,
        LastSaleAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_inventory_movements_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_inventory_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryMovements::Domain).string().not_null())
                        .col(ColumnDef::new(InventoryMovements::ProductId).uuid().not_null())
                        .col(ColumnDef::new(InventoryMovements::LocationId).uuid().not_null())
                        .col(
                            ColumnDef::new(InventoryMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::QuantityBefore)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::QuantityChange)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::QuantityAfter)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryMovements::UnitCost).decimal().null())
                        .col(ColumnDef::new(InventoryMovements::TotalCost).decimal().null())
                        .col(
                            ColumnDef::new(InventoryMovements::ReferenceType)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryMovements::ReferenceId).uuid().null())
                        .col(
                            ColumnDef::new(InventoryMovements::BatchNumber)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryMovements::ExpiryDate).date().null())
                        .col(ColumnDef::new(InventoryMovements::UserId).uuid().not_null())
                        .col(ColumnDef::new(InventoryMovements::Notes).string().null())
                        .col(
                            ColumnDef::new(InventoryMovements::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_inventory_movements_pair_created")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::Domain)
                        .col(InventoryMovements::ProductId)
                        .col(InventoryMovements::LocationId)
                        .col(InventoryMovements::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryMovements {
        Table,
        Id,
        Domain,
        ProductId,
        LocationId,
        MovementType,
        QuantityBefore,
        QuantityChange,
        QuantityAfter,
        UnitCost,
        TotalCost,
        ReferenceType,
        ReferenceId,
        BatchNumber,
        ExpiryDate,
        UserId,
        Notes,
        CreatedAt,
    }
}

mod m20240101_000005_create_stock_adjustments_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_stock_adjustments_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockAdjustments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockAdjustments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAdjustments::Domain).string().not_null())
                        .col(
                            ColumnDef::new(StockAdjustments::AdjustmentNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(StockAdjustments::LocationId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockAdjustments::AdjustmentType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAdjustments::Reason).string().not_null())
                        .col(ColumnDef::new(StockAdjustments::Status).string().not_null())
                        .col(
                            ColumnDef::new(StockAdjustments::TotalValueChange)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(StockAdjustments::Notes).string().null())
                        .col(ColumnDef::new(StockAdjustments::CreatedBy).uuid().not_null())
                        .col(ColumnDef::new(StockAdjustments::ApprovedBy).uuid().null())
                        .col(
                            ColumnDef::new(StockAdjustments::ApprovedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustments::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustments::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockAdjustmentItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockAdjustmentItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustmentItems::AdjustmentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustmentItems::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustmentItems::SystemQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustmentItems::ActualQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustmentItems::AdjustmentQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustmentItems::UnitCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockAdjustmentItems::TotalCostChange)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_adjustment_items_adjustment")
                        .table(StockAdjustmentItems::Table)
                        .col(StockAdjustmentItems::AdjustmentId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockAdjustmentItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockAdjustments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockAdjustments {
        Table,
        Id,
        Domain,
        AdjustmentNumber,
        LocationId,
        AdjustmentType,
        Reason,
        Status,
        TotalValueChange,
        Notes,
        CreatedBy,
        ApprovedBy,
        ApprovedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum StockAdjustmentItems {
        Table,
        Id,
        AdjustmentId,
        ProductId,
        SystemQuantity,
        ActualQuantity,
        AdjustmentQuantity,
        UnitCost,
        TotalCostChange,
    }
}

mod m20240101_000006_create_transfer_recommendations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_transfer_recommendations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryTransferRecommendations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryTransferRecommendations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferRecommendations::Domain)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferRecommendations::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferRecommendations::FromLocationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferRecommendations::ToLocationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferRecommendations::Priority)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferRecommendations::Reason)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferRecommendations::RecommendedQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferRecommendations::Status)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferRecommendations::ExpiresAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferRecommendations::ProcessedMovementId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferRecommendations::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransferRecommendations::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(InventoryTransferRecommendations::Table)
                        .to_owned(),
                )
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryTransferRecommendations {
        Table,
        Id,
        Domain,
        ProductId,
        FromLocationId,
        ToLocationId,
        Priority,
        Reason,
        RecommendedQuantity,
        Status,
        ExpiresAt,
        ProcessedMovementId,
        CreatedAt,
        UpdatedAt,
    }
}
