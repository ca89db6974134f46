use planogram_engine::domain::ports::PlanogramStore;
use planogram_engine::{
    Category, CategoryId, EnginePolicy, FacingsPolicy, GridSize, InMemoryCategoryDirectory,
    InMemoryPlanogramStore, NewProduct, Planogram, PlanogramError, Position, ProductId,
    PlanogramService, ProductPatch, UserId,
};
use std::collections::HashSet;

type Service = PlanogramService<InMemoryPlanogramStore, InMemoryCategoryDirectory>;

fn positions(cells: &[(u32, u32)]) -> Vec<Position> {
    cells.iter().map(|(r, c)| Position::new(*r, *c)).collect()
}

fn product(name: &str, facings: u32, cells: &[(u32, u32)]) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        mrp: 50.0,
        gp: 20.0,
        facings,
        positions: positions(cells),
    }
}

async fn setup() -> (Service, UserId, Category) {
    let service = PlanogramService::new(
        InMemoryPlanogramStore::new(),
        InMemoryCategoryDirectory::new(),
    );
    let user = UserId::from("user-1");
    let category = service.register_category(&user, "Personal Care").await.unwrap();
    (service, user, category)
}

fn assert_consistent(planogram: &Planogram) {
    assert!(planogram.check_invariants().is_ok(), "{:?}", planogram.check_invariants());
    let mut cells = HashSet::new();
    for product in &planogram.products {
        assert!(product.positions.len() <= product.facings as usize);
        for pos in &product.positions {
            assert!(pos.row < planogram.grid_size.rows && pos.col < planogram.grid_size.cols);
            assert!(cells.insert(*pos), "cell {} held twice", pos);
        }
    }
}

#[tokio::test]
async fn test_end_to_end_soap_scenario() {
    let (service, user, category) = setup().await;

    let planogram = service.create(&user, &category.id, None).await.unwrap();
    assert_eq!(planogram.grid_size, GridSize { rows: 4, cols: 4 });
    assert_eq!(planogram.version, 1);

    let planogram = service
        .add_product(&user, &planogram.id, product("Soap", 2, &[(0, 0), (0, 1)]), None)
        .await
        .unwrap();
    assert_eq!(planogram.version, 2);
    assert_consistent(&planogram);

    let err = service
        .add_product(&user, &planogram.id, product("Shampoo", 1, &[(0, 1)]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PlanogramError::InvalidPositions(_)));

    // 第 1 欄已被佔用，只剩 1 欄會讓商品落在格子外
    let err = service
        .resize_grid(&user, &planogram.id, 2, 1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, PlanogramError::InvalidResize { .. }));

    // 列數 1 雖然大於最大佔用列 0，但低於最小格子尺寸
    let err = service
        .resize_grid(&user, &planogram.id, 1, 4, None)
        .await
        .unwrap_err();
    assert!(matches!(err, PlanogramError::InvalidResize { .. }));

    let stored = service.get(&user, &category.id).await.unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.products.len(), 1);
    assert_eq!(stored.grid_size, GridSize { rows: 4, cols: 4 });
}

#[tokio::test]
async fn test_resize_blocked_by_corner_product() {
    let (service, user, category) = setup().await;
    let planogram = service.create(&user, &category.id, None).await.unwrap();
    service
        .add_product(&user, &planogram.id, product("Corner", 1, &[(3, 3)]), None)
        .await
        .unwrap();

    let err = service
        .resize_grid(&user, &planogram.id, 3, 5, None)
        .await
        .unwrap_err();
    assert!(matches!(err, PlanogramError::InvalidResize { .. }));

    let resized = service
        .resize_grid(&user, &planogram.id, 4, 5, None)
        .await
        .unwrap();
    assert_eq!(resized.grid_size, GridSize { rows: 4, cols: 5 });
    assert_eq!(resized.version, 3);
    assert_consistent(&resized);
}

#[tokio::test]
async fn test_version_increments_per_operation() {
    let (service, user, category) = setup().await;
    let id = service.create(&user, &category.id, None).await.unwrap().id;

    let p = service
        .add_product(&user, &id, product("Soap", 3, &[(0, 0)]), None)
        .await
        .unwrap();
    assert_eq!(p.version, 2);
    let soap = p.products[0].id.clone();

    let p = service
        .update_product_positions(&user, &id, &soap, positions(&[(1, 1), (1, 2)]), None)
        .await
        .unwrap();
    assert_eq!(p.version, 3);

    let p = service.update_facings(&user, &id, &soap, 2, None).await.unwrap();
    assert_eq!(p.version, 4);

    let patch = ProductPatch {
        name: Some("Lux Soap".to_string()),
        ..Default::default()
    };
    let p = service.update_product(&user, &id, &soap, patch, None).await.unwrap();
    assert_eq!(p.version, 4);
    assert_eq!(p.products[0].name, "Lux Soap");

    let p = service.resize_grid(&user, &id, 5, 5, None).await.unwrap();
    assert_eq!(p.version, 5);

    let p = service.delete_product(&user, &id, &soap, None).await.unwrap();
    assert_eq!(p.version, 6);
    assert!(p.products.is_empty());
}

#[tokio::test]
async fn test_delete_missing_product_leaves_planogram_untouched() {
    let (service, user, category) = setup().await;
    let id = service.create(&user, &category.id, None).await.unwrap().id;
    let before = service
        .add_product(&user, &id, product("Soap", 1, &[(0, 0)]), None)
        .await
        .unwrap();

    let after = service
        .delete_product(&user, &id, &ProductId::from("does-not-exist"), None)
        .await
        .unwrap();
    assert_eq!(after, before);
    assert_eq!(service.store().load(&id).await.unwrap().unwrap(), before);
}

#[tokio::test]
async fn test_rejected_operations_do_not_persist() {
    let (service, user, category) = setup().await;
    let id = service.create(&user, &category.id, None).await.unwrap().id;
    let base = service
        .add_product(&user, &id, product("Soap", 2, &[(0, 0), (0, 1)]), None)
        .await
        .unwrap();
    let soap = base.products[0].id.clone();
    service
        .add_product(&user, &id, product("Gel", 1, &[(2, 2)]), None)
        .await
        .unwrap();
    let base = service.store().load(&id).await.unwrap().unwrap();

    let attempts = vec![
        service
            .update_product_positions(&user, &id, &soap, positions(&[(2, 2)]), None)
            .await,
        service
            .update_product_positions(&user, &id, &soap, positions(&[(0, 4)]), None)
            .await,
        service
            .update_product_positions(&user, &id, &soap, positions(&[(1, 0), (1, 0)]), None)
            .await,
        service.update_facings(&user, &id, &soap, 1, None).await,
        service
            .add_product(&user, &id, product("Big", 1, &[(3, 0), (3, 1)]), None)
            .await,
        service
            .update_product(&user, &id, &soap, ProductPatch { mrp: Some(-5.0), ..Default::default() }, None)
            .await,
        service
            .update_facings(&user, &id, &ProductId::from("ghost"), 4, None)
            .await,
    ];

    for attempt in attempts {
        assert!(attempt.is_err());
    }
    let after = service.store().load(&id).await.unwrap().unwrap();
    assert_eq!(after, base);
    assert_consistent(&after);
}

#[tokio::test]
async fn test_reposition_facings_policy() {
    let strict = {
        let (service, user, category) = setup().await;
        let id = service.create(&user, &category.id, None).await.unwrap().id;
        let p = service
            .add_product(&user, &id, product("Soap", 1, &[(0, 0)]), None)
            .await
            .unwrap();
        service
            .update_product_positions(&user, &id, &p.products[0].id, positions(&[(0, 0), (0, 1)]), None)
            .await
    };
    assert!(matches!(strict, Err(PlanogramError::InvalidFacings { .. })));

    let policy = EnginePolicy {
        facings_policy: FacingsPolicy::AddOnly,
        ..Default::default()
    };
    let service = PlanogramService::with_policy(
        InMemoryPlanogramStore::new(),
        InMemoryCategoryDirectory::new(),
        policy,
    );
    let user = UserId::from("user-1");
    let category = service.register_category(&user, "Snacks").await.unwrap();
    let id = service.create(&user, &category.id, None).await.unwrap().id;
    let p = service
        .add_product(&user, &id, product("Chips", 1, &[(0, 0)]), None)
        .await
        .unwrap();
    let p = service
        .update_product_positions(&user, &id, &p.products[0].id, positions(&[(0, 0), (0, 1)]), None)
        .await
        .unwrap();
    assert_eq!(p.products[0].positions.len(), 2);
    assert_eq!(p.products[0].facings, 1);
}

#[tokio::test]
async fn test_create_rules() {
    let (service, user, category) = setup().await;

    let custom = service
        .create(&user, &category.id, Some(GridSize { rows: 6, cols: 3 }))
        .await
        .unwrap();
    assert_eq!(custom.grid_size, GridSize { rows: 6, cols: 3 });

    let err = service.create(&user, &category.id, None).await.unwrap_err();
    assert!(matches!(err, PlanogramError::AlreadyExists { .. }));

    let err = service
        .create(&user, &CategoryId::from("missing"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PlanogramError::NotFound { .. }));

    let other = service.register_category(&user, "Beverages").await.unwrap();
    let err = service
        .create(&user, &other.id, Some(GridSize { rows: 1, cols: 5 }))
        .await
        .unwrap_err();
    assert!(matches!(err, PlanogramError::ValidationError { .. }));

    let err = service.get(&user, &other.id).await.unwrap_err();
    assert!(matches!(err, PlanogramError::NotFound { .. }));
}

#[tokio::test]
async fn test_default_grid_comes_from_policy() {
    let policy = EnginePolicy {
        default_grid: GridSize { rows: 3, cols: 7 },
        ..Default::default()
    };
    let service = PlanogramService::with_policy(
        InMemoryPlanogramStore::new(),
        InMemoryCategoryDirectory::new(),
        policy,
    );
    let user = UserId::from("user-1");
    let category = service.register_category(&user, "Dairy").await.unwrap();
    let planogram = service.create(&user, &category.id, None).await.unwrap();
    assert_eq!(planogram.grid_size, GridSize { rows: 3, cols: 7 });
}

#[tokio::test]
async fn test_ownership_is_checked() {
    let (service, owner, category) = setup().await;
    let id = service.create(&owner, &category.id, None).await.unwrap().id;
    let intruder = UserId::from("user-2");

    let err = service.get(&intruder, &category.id).await.unwrap_err();
    assert!(matches!(err, PlanogramError::NotFound { .. }));

    let err = service
        .add_product(&intruder, &id, product("Soap", 1, &[(0, 0)]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PlanogramError::Forbidden { .. }));
    assert_eq!(err.status_code(), 403);

    let err = service.delete_category(&intruder, &category.id).await.unwrap_err();
    assert!(matches!(err, PlanogramError::Forbidden { .. }));
}

#[tokio::test]
async fn test_category_names_are_unique_per_owner() {
    let (service, user, _category) = setup().await;
    let err = service
        .register_category(&user, "personal care")
        .await
        .unwrap_err();
    assert!(matches!(err, PlanogramError::ValidationError { .. }));

    // 不同使用者可以使用相同名稱
    let other = UserId::from("user-2");
    assert!(service.register_category(&other, "Personal Care").await.is_ok());
}

#[tokio::test]
async fn test_expected_version_detects_lost_update() {
    let (service, user, category) = setup().await;
    let id = service.create(&user, &category.id, None).await.unwrap().id;

    let seen = service.get_by_id(&user, &id).await.unwrap();
    service
        .add_product(&user, &id, product("Soap", 1, &[(0, 0)]), Some(seen.version))
        .await
        .unwrap();

    let err = service
        .add_product(&user, &id, product("Gel", 1, &[(1, 1)]), Some(seen.version))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PlanogramError::Conflict {
            expected: 1,
            actual: 2
        }
    ));

    // 不帶版本時最後寫入者獲勝
    let p = service
        .add_product(&user, &id, product("Gel", 1, &[(1, 1)]), None)
        .await
        .unwrap();
    assert_eq!(p.version, 3);
}

#[tokio::test]
async fn test_delete_category_cascades_to_planogram() {
    let (service, user, category) = setup().await;
    let id = service.create(&user, &category.id, None).await.unwrap().id;

    service.delete_category(&user, &category.id).await.unwrap();

    assert!(service.store().load(&id).await.unwrap().is_none());
    let err = service.get(&user, &category.id).await.unwrap_err();
    assert!(matches!(err, PlanogramError::NotFound { .. }));
    let err = service.get_by_id(&user, &id).await.unwrap_err();
    assert!(matches!(err, PlanogramError::NotFound { .. }));
}

#[tokio::test]
async fn test_concurrent_writers_keep_invariants() {
    let (service, user, category) = setup().await;
    let id = service.create(&user, &category.id, None).await.unwrap().id;
    let service = std::sync::Arc::new(service);

    let mut handles = Vec::new();
    for row in 0..4u32 {
        let service = service.clone();
        let user = user.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            service
                .add_product(&user, &id, product(&format!("Row {}", row), 1, &[(row, 0)]), None)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // 最後寫入者獲勝：可能遺失更新，但存下來的文件一定一致
    let stored = service.get_by_id(&user, &id).await.unwrap();
    assert!(!stored.products.is_empty());
    assert_consistent(&stored);
}
