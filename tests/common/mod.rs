//! 集成测试公共部分
//!
//! 需要可访问的MongoDB，地址从 `MONGODB` 读取；未设置时测试直接跳过

#![allow(dead_code)]

use rat_mgodb::bson::{Bson, DateTime};
use rat_mgodb::{AcquirePolicy, MgoConfig, MgoEngine, PoolConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub car_id: i64,
    pub name: String,
    pub price: i32,
    #[serde(default)]
    pub remark: Option<Bson>,
    pub updated: DateTime,
    pub created: DateTime,
}
rat_mgodb::mgo_entity!(Car; unique["carId"]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub owner_id: i64,
    pub name: String,
}
rat_mgodb::mgo_entity!(Owner);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarOwner {
    pub owner_id: i64,
    pub car_id: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cars: Vec<Car>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<Owner>,
}
rat_mgodb::mgo_entity!(CarOwner);

pub fn random_id() -> i64 {
    i64::from(rand::random::<u32>())
}

pub fn new_car(name: &str, price: i32) -> Car {
    let now = DateTime::now();
    Car {
        car_id: random_id(),
        name: name.to_string(),
        price,
        remark: None,
        updated: now,
        created: now,
    }
}

/// 测试地址，未设置时返回 `None`
pub fn live_uri() -> Option<String> {
    match std::env::var("MONGODB") {
        Ok(uri) if !uri.trim().is_empty() => Some(uri),
        _ => {
            eprintln!("MONGODB 未设置，跳过需要数据库的测试");
            None
        }
    }
}

/// 每个测试使用独立的随机数据库
pub fn live_config(uri: String, max_pool_size: u32, policy: AcquirePolicy) -> MgoConfig {
    let pool = PoolConfig::builder()
        .max_pool_size(max_pool_size)
        .socket_timeout(Duration::from_secs(30))
        .acquire_policy(policy)
        .build()
        .expect("pool config");

    MgoConfig::builder()
        .uri(uri)
        .database(format!("rat_mgodb_test_{}", rand::random::<u32>()))
        .pool(pool)
        .build()
        .expect("config")
}

pub async fn live_engine() -> Option<MgoEngine> {
    let uri = live_uri()?;
    rat_mgodb::init();
    let engine = MgoEngine::connect(live_config(uri, 16, AcquirePolicy::Block))
        .await
        .expect("无法连接测试数据库");
    Some(engine)
}
