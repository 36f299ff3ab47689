//! # 聚合与索引处理器

use mongodb::bson::Document;
use rat_logger::debug;

use super::read_handler::drain_cursor;
use crate::adapter::mongodb::schema;
use crate::error::{classify, MgoDbResult};
use crate::model::{Entity, Resolvable};
use crate::odm::manager_core::MgoEngine;

impl MgoEngine {
    /// 在元素类型对应的集合上执行聚合管道，结果保持管道输出顺序
    pub async fn aggregate<T: Entity + Resolvable>(&self, pipeline: Vec<Document>) -> MgoDbResult<Vec<T>> {
        let collection = self.resolver.resolve::<Vec<T>>()?;
        debug!("处理聚合请求: collection={}, stages={}", collection, pipeline.len());

        let mut session = self.pool.acquire().await?;
        let (handle, client_session) = session.split(&collection);
        self.pool
            .timed("aggregate", async {
                let cursor = handle
                    .aggregate_with_session(pipeline, None, &mut *client_session)
                    .await
                    .map_err(|e| classify(&collection, e))?;
                drain_cursor(&collection, cursor, client_session).await
            })
            .await
    }

    /// 执行聚合并写入调用者的列表，原有内容会被替换
    pub async fn aggregate_into<T: Entity + Resolvable>(&self, out: &mut Vec<T>, pipeline: Vec<Document>) -> MgoDbResult<()> {
        *out = self.aggregate(pipeline).await?;
        Ok(())
    }

    /// 在类型对应的集合上创建索引，返回索引名
    pub async fn create_index<V: Resolvable + ?Sized>(&self, keys: Document, unique: bool) -> MgoDbResult<String> {
        let collection = self.resolver.resolve::<V>()?;

        let mut session = self.pool.acquire().await?;
        let (handle, client_session) = session.split(&collection);
        self.pool
            .timed("create_index", schema::create_index(&handle, client_session, keys, None, unique))
            .await
    }
}
