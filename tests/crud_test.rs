//! CRUD、分页、聚合等需要真实数据库的测试

mod common;

use common::*;
use futures::future::FutureExt;
use rat_mgodb::bson::{doc, Bson};
use rat_mgodb::{AcquirePolicy, InsertBatch, MgoDbError, MgoEngine, UpsertOutcome};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test]
async fn insert_then_find_returns_equal_value() {
    let Some(engine) = live_engine().await else { return };

    let car = new_car("奔驰", 100);
    engine.insert(&car).await.unwrap();

    let found: Car = engine.find_one(doc! { "carId": car.car_id }).await.unwrap();
    assert_eq!(found, car);

    let mut into = new_car("", 0);
    engine.find_one_into(&mut into, doc! { "carId": car.car_id }).await.unwrap();
    assert_eq!(into, car);

    engine.drop_database().await.unwrap();
}

#[tokio::test]
async fn update_one_changes_only_the_set_fields() {
    let Some(engine) = live_engine().await else { return };

    let mut car = new_car("X", 100);
    car.car_id = 42;
    engine.insert(&car).await.unwrap();

    engine
        .update_one::<Car>(doc! { "carId": 42 }, doc! { "$set": { "name": "Y" } })
        .await
        .unwrap();

    let found: Car = engine.find_one(doc! { "carId": 42 }).await.unwrap();
    assert_eq!(found.car_id, 42);
    assert_eq!(found.name, "Y");
    assert_eq!(found.price, 100);

    let updated: Car = engine
        .find_one_and_update(doc! { "carId": 42 }, doc! { "$inc": { "price": 5 } })
        .await
        .unwrap();
    assert_eq!(updated.price, 105);
    assert_eq!(updated.name, "Y");

    let err = engine
        .update_one::<Car>(doc! { "carId": -1 }, doc! { "$set": { "name": "Z" } })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    let err = engine
        .find_one_and_update::<Car>(doc! { "carId": -1 }, doc! { "$set": { "name": "Z" } })
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    engine.drop_database().await.unwrap();
}

#[tokio::test]
async fn remove_then_find_is_not_found() {
    let Some(engine) = live_engine().await else { return };

    let car = new_car("BMW", 300);
    engine.insert(&car).await.unwrap();
    assert!(engine.exists::<Car>(doc! { "carId": car.car_id }).await.unwrap());

    engine.remove_one::<Car>(doc! { "carId": car.car_id }).await.unwrap();

    let err = engine.find_one::<Car>(doc! { "carId": car.car_id }).await.unwrap_err();
    assert!(matches!(err, MgoDbError::NotFound { ref collection } if collection == "car"));
    let err = engine.remove_one::<Car>(doc! { "carId": car.car_id }).await.unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(engine.count::<Car>(doc! { "carId": car.car_id }).await.unwrap(), 0);
    assert!(!engine.exists::<Car>(doc! { "carId": car.car_id }).await.unwrap());

    engine.drop_database().await.unwrap();
}

#[tokio::test]
async fn duplicate_identifier_is_reported() {
    let Some(engine) = live_engine().await else { return };

    let index = engine.create_index::<Car>(doc! { "carId": 1 }, true).await.unwrap();
    assert_eq!(index, "carId_1");

    let car = new_car("东风风行", 80_000);
    engine.insert(&car).await.unwrap();
    let err = engine.insert(&car).await.unwrap_err();
    assert!(err.is_duplicate_key(), "unexpected error: {:?}", err);

    engine.drop_database().await.unwrap();
}

#[tokio::test]
async fn nested_remark_is_queryable() {
    let Some(engine) = live_engine().await else { return };

    let mut car = new_car("东风风行", 80_000);
    car.remark = Some(Bson::Document(doc! { "remark1": car.car_id, "remark2": car.car_id }));
    engine.insert(&car).await.unwrap();

    let found: Car = engine.find_one(doc! { "remark.remark1": car.car_id }).await.unwrap();
    assert_eq!(found, car);

    engine.drop_database().await.unwrap();
}

#[tokio::test]
async fn upsert_inserts_then_replaces() {
    let Some(engine) = live_engine().await else { return };
    let name = "宝马X5";

    let mut outcomes = Vec::new();
    for price in [100, 150, 1250] {
        let car = new_car(name, price);
        outcomes.push(engine.upsert_one(&car, doc! { "name": name }).await.unwrap());
    }
    assert_eq!(
        outcomes,
        vec![UpsertOutcome::Inserted, UpsertOutcome::Updated, UpsertOutcome::Updated]
    );

    assert_eq!(engine.count::<Car>(doc! { "name": name }).await.unwrap(), 1);
    let survivor: Car = engine.find_one(doc! { "name": name }).await.unwrap();
    assert_eq!(survivor.price, 1250);

    engine.drop_database().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_upserts_converge_to_one_document() {
    let Some(engine) = live_engine().await else { return };
    let engine = Arc::new(engine);
    let car_id = random_id();

    let mut tasks = Vec::new();
    for price in 0..16 {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            let mut car = new_car("吉瑞QQ", price);
            car.car_id = car_id;
            engine.upsert_one(&car, doc! { "carId": car_id }).await
        }));
    }

    let mut inserted = 0;
    for task in tasks {
        if task.await.unwrap().unwrap() == UpsertOutcome::Inserted {
            inserted += 1;
        }
    }
    assert_eq!(inserted, 1);
    assert_eq!(engine.count::<Car>(doc! { "carId": car_id }).await.unwrap(), 1);
    assert_eq!(engine.pool_status().live_sessions, 0);

    engine.drop_database().await.unwrap();
}

#[tokio::test]
async fn upsert_by_name_leaves_other_inserts_alone() {
    let Some(engine) = live_engine().await else { return };
    let name = "宝马X5";

    let first = new_car(name, 100);
    assert_eq!(
        engine.upsert_one(&first, doc! { "name": name }).await.unwrap(),
        UpsertOutcome::Inserted
    );

    // 只有声明的自然键 carId 受唯一约束，同名的新车照常插入
    let second = new_car(name, 200);
    engine.insert(&second).await.unwrap();
    assert_eq!(engine.count::<Car>(doc! { "name": name }).await.unwrap(), 2);

    engine.drop_database().await.unwrap();
}

#[tokio::test]
async fn upsert_updates_first_match_when_filter_values_repeat() {
    let Some(engine) = live_engine().await else { return };
    let name = "重复车名";

    engine.insert(&new_car(name, 1)).await.unwrap();
    engine.insert(&new_car(name, 2)).await.unwrap();

    let replacement = new_car(name, 3);
    let outcome = engine.upsert_one(&replacement, doc! { "name": name }).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Updated);
    assert_eq!(engine.count::<Car>(doc! { "name": name }).await.unwrap(), 2);
    assert!(engine.exists::<Car>(doc! { "carId": replacement.car_id }).await.unwrap());

    engine.drop_database().await.unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Plate {
    plate: String,
    car_id: i64,
}
rat_mgodb::mgo_entity!(Plate; unique["plate"]);

#[tokio::test]
async fn natural_key_index_over_existing_duplicates_is_an_operation_error() {
    let Some(engine) = live_engine().await else { return };

    let plate = Plate { plate: "京A12345".to_string(), car_id: 1 };
    engine.insert(&plate).await.unwrap();
    engine.insert(&Plate { car_id: 2, ..plate.clone() }).await.unwrap();

    let err = engine
        .upsert_one(&plate, doc! { "plate": plate.plate.as_str() })
        .await
        .unwrap_err();
    assert!(matches!(err, MgoDbError::OperationError { .. }), "unexpected error: {:?}", err);
    assert!(!err.is_duplicate_key());
    assert_eq!(engine.pool_status().live_sessions, 0);

    engine.drop_database().await.unwrap();
}

#[tokio::test]
async fn operator_filters_cannot_be_upserted() {
    let Some(engine) = live_engine().await else { return };

    let car = new_car("c", 1);
    let err = engine
        .upsert_one(&car, doc! { "price": { "$gt": 0 } })
        .await
        .unwrap_err();
    assert!(matches!(err, MgoDbError::InvalidArgument { .. }));

    // 按 _id upsert
    let outcome = engine
        .upsert_one(&car, doc! { "_id": car.car_id })
        .await
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Inserted);

    engine.drop_database().await.unwrap();
}

#[tokio::test]
async fn pages_are_disjoint_and_ordered() {
    let Some(engine) = live_engine().await else { return };

    let base = rat_mgodb::bson::DateTime::now().timestamp_millis();
    let cars: Vec<Car> = (0..25)
        .map(|i| {
            let mut car = new_car(&format!("car-{}", i), i);
            car.created = rat_mgodb::bson::DateTime::from_millis(base + i64::from(i) * 1000);
            car
        })
        .collect();
    assert_eq!(engine.insert_many(&cars).await.unwrap(), 25);

    let sort = ["-created"];
    let first: Vec<Car> = engine.find(doc! {}, 1, 10, &sort).await.unwrap();
    let second: Vec<Car> = engine.find(doc! {}, 2, 10, &sort).await.unwrap();
    let mut third: Vec<Car> = Vec::new();
    engine.find_into(&mut third, doc! {}, 3, 10, &sort).await.unwrap();
    let fourth: Vec<Car> = engine.find(doc! {}, 4, 10, &sort).await.unwrap();

    assert_eq!(first.len(), 10);
    assert_eq!(second.len(), 10);
    assert_eq!(third.len(), 5);
    assert!(fourth.is_empty());

    let first_ids: HashSet<i64> = first.iter().map(|c| c.car_id).collect();
    let second_ids: HashSet<i64> = second.iter().map(|c| c.car_id).collect();
    assert!(first_ids.is_disjoint(&second_ids));

    let mut expected = cars.clone();
    expected.sort_by(|a, b| b.created.cmp(&a.created));
    let expected_ids: Vec<i64> = expected.iter().take(20).map(|c| c.car_id).collect();
    let actual_ids: Vec<i64> = first.iter().chain(second.iter()).map(|c| c.car_id).collect();
    assert_eq!(actual_ids, expected_ids);

    let none: Vec<Car> = engine
        .find(doc! { "name": "missing" }, 1, 10, &sort)
        .await
        .unwrap();
    assert!(none.is_empty());

    let err = engine.find::<Car, &str>(doc! {}, 0, 10, &sort).await.unwrap_err();
    assert!(matches!(err, MgoDbError::InvalidArgument { .. }));
    let err = engine.find::<Car, &str>(doc! {}, 1, 0, &sort).await.unwrap_err();
    assert!(matches!(err, MgoDbError::InvalidArgument { .. }));

    engine.drop_database().await.unwrap();
}

#[tokio::test]
async fn insert_many_and_heterogeneous_batches() {
    let Some(engine) = live_engine().await else { return };

    let cars = vec![
        Box::new(new_car("c1", 100_000)),
        Box::new(new_car("c2", 20_000)),
        Box::new(new_car("c3", 30_000)),
    ];
    assert_eq!(engine.insert_many(&cars).await.unwrap(), 3);
    let empty: Vec<Car> = Vec::new();
    assert_eq!(engine.insert_many(&empty).await.unwrap(), 0);

    let c3: Car = engine.find_one(doc! { "name": "c3" }).await.unwrap();
    assert_eq!(c3.car_id, cars[2].car_id);

    let owner = Owner { owner_id: random_id(), name: "Simi".to_string() };
    let batch = InsertBatch::new()
        .with(&new_car("c4", 1))
        .and_then(|b| b.with(&owner))
        .unwrap();
    assert_eq!(engine.insert_batch(batch).await.unwrap(), 2);
    assert_eq!(engine.count::<Car>(doc! {}).await.unwrap(), 4);
    assert_eq!(engine.count::<Owner>(doc! {}).await.unwrap(), 1);

    // 唯一索引冲突只影响冲突的那一条
    engine.create_index::<Owner>(doc! { "ownerId": 1 }, true).await.unwrap();
    let mut batch = InsertBatch::new();
    batch.push(&owner).unwrap();
    batch.push(&new_car("c5", 1)).unwrap();
    let err = engine.insert_batch(batch).await.unwrap_err();
    match err {
        MgoDbError::OperationError { message } => assert!(message.contains("#0")),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(engine.count::<Car>(doc! { "name": "c5" }).await.unwrap(), 1);

    engine.drop_database().await.unwrap();
}

#[tokio::test]
async fn aggregate_joins_two_child_collections() {
    let Some(engine) = live_engine().await else { return };

    let mut car = new_car("本田思域", 120_000);
    car.car_id = 6_330_682_874_475_319_296;
    engine.insert(&car).await.unwrap();

    let owner = Owner { owner_id: 6_330_682_222_932_135_936, name: "Simi".to_string() };
    engine.insert(&owner).await.unwrap();

    let link = CarOwner { owner_id: owner.owner_id, car_id: car.car_id, cars: vec![], owners: vec![] };
    engine.insert(&link).await.unwrap();
    assert_eq!(engine.collection_name::<CarOwner>().unwrap(), "car_owner");

    let pipeline = vec![
        doc! { "$match": { "ownerId": owner.owner_id } },
        doc! { "$lookup": {
            "from": engine.collection_name::<Car>().unwrap(),
            "localField": "carId",
            "foreignField": "carId",
            "as": "cars",
        } },
        doc! { "$lookup": {
            "from": engine.collection_name::<Owner>().unwrap(),
            "localField": "ownerId",
            "foreignField": "ownerId",
            "as": "owners",
        } },
    ];

    let rows: Vec<CarOwner> = engine.aggregate(pipeline.clone()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cars, vec![car.clone()]);
    assert_eq!(rows[0].owners, vec![owner.clone()]);

    let mut boxed: Vec<Box<CarOwner>> = Vec::new();
    engine.aggregate_into(&mut boxed, pipeline).await.unwrap();
    assert_eq!(boxed.len(), 1);
    assert_eq!(boxed[0].cars[0].name, "本田思域");
    assert_eq!(boxed[0].owners[0].name, "Simi");

    engine.drop_database().await.unwrap();
}

#[tokio::test]
async fn execute_borrows_and_releases_a_session() {
    let Some(engine) = live_engine().await else { return };

    engine.insert(&new_car("raw", 1)).await.unwrap();
    let collection = engine.collection_name::<Car>().unwrap();

    let count = engine
        .execute(|session| {
            async move {
                let (handle, client_session) = session.split(&collection);
                handle
                    .count_documents_with_session(doc! { "name": "raw" }, None, client_session)
                    .await
                    .map_err(|e| rat_mgodb::error::classify("car", e))
            }
            .boxed()
        })
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(engine.pool_status().live_sessions, 0);

    let err = engine
        .execute(|_session| async { Err::<(), _>(rat_mgodb::mgo_error!(operation, "boom")) }.boxed())
        .await
        .unwrap_err();
    assert!(matches!(err, MgoDbError::OperationError { .. }));
    assert_eq!(engine.pool_status().live_sessions, 0);

    engine.drop_database().await.unwrap();
}

#[tokio::test]
async fn fail_fast_pool_reports_exhaustion() {
    let Some(uri) = live_uri() else { return };
    let engine = MgoEngine::connect(live_config(uri, 1, AcquirePolicy::FailFast))
        .await
        .unwrap();

    let held = engine.pool().acquire().await.unwrap();
    assert_eq!(engine.pool_status().available, 0);

    let err = engine.insert(&new_car("blocked", 1)).await.unwrap_err();
    assert!(matches!(err, MgoDbError::PoolExhausted { max_pool_size: 1 }));

    drop(held);
    engine.insert(&new_car("free", 1)).await.unwrap();

    engine.drop_database().await.unwrap();
}

#[tokio::test]
async fn server_information_and_drop() {
    let Some(engine) = live_engine().await else { return };

    assert!(engine.health_check().await);
    assert!(!engine.server_version().await.unwrap().is_empty());

    engine.insert(&new_car("gone", 1)).await.unwrap();
    engine.drop_database().await.unwrap();
    assert_eq!(engine.count::<Car>(doc! {}).await.unwrap(), 0);
}
