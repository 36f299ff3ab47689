//! # 更新操作处理器

use mongodb::bson::Document;
use mongodb::options::{FindOneAndUpdateOptions, ReplaceOptions, ReturnDocument};
use rat_logger::{debug, info};
use serde::Serialize;

use crate::adapter::mongodb::schema::ensure_unique_index;
use crate::adapter::mongodb::utils::{equality_keys, from_document, to_document, unique_index_name};
use crate::error::{classify, MgoDbError, MgoDbResult};
use crate::model::{Entity, Resolvable};
use crate::odm::manager_core::MgoEngine;
use crate::pool::PooledSession;

/// 并发upsert撞上唯一索引后的最大尝试次数
const UPSERT_ATTEMPTS: usize = 3;

/// upsert的实际效果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpsertOutcome {
    /// 没有匹配，插入了新文档
    Inserted,
    /// 替换了已有文档
    Updated,
}

impl MgoEngine {
    /// 更新第一条匹配的文档，零匹配返回 `NotFound`
    ///
    /// 只写不读：需要更新后的值请使用 `find_one_and_update`
    pub async fn update_one<V: Resolvable + ?Sized>(&self, filter: Document, update: Document) -> MgoDbResult<()> {
        let collection = self.resolver.resolve::<V>()?;
        debug!("处理更新请求: collection={}, filter={}, update={}", collection, filter, update);

        let mut session = self.pool.acquire().await?;
        let (handle, client_session) = session.split(&collection);
        let result = self
            .pool
            .timed("update_one", async {
                handle
                    .update_one_with_session(filter, update, None, client_session)
                    .await
                    .map_err(|e| classify(&collection, e))
            })
            .await?;

        if result.matched_count == 0 {
            return Err(MgoDbError::NotFound { collection });
        }
        Ok(())
    }

    /// 更新第一条匹配的文档并返回更新后的值，零匹配返回 `NotFound`
    pub async fn find_one_and_update<T: Entity + Resolvable>(&self, filter: Document, update: Document) -> MgoDbResult<T> {
        let collection = self.resolver.resolve::<T>()?;
        debug!("处理更新并读取请求: collection={}, filter={}", collection, filter);

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let mut session = self.pool.acquire().await?;
        let (handle, client_session) = session.split(&collection);
        let updated = self
            .pool
            .timed("find_one_and_update", async {
                handle
                    .find_one_and_update_with_session(filter, update, options, client_session)
                    .await
                    .map_err(|e| classify(&collection, e))
            })
            .await?;

        match updated {
            Some(document) => from_document(document),
            None => Err(MgoDbError::NotFound { collection }),
        }
    }

    /// 以实体的完整字段替换第一条匹配的文档，没有匹配时插入
    ///
    /// 使用服务器端原子的 `replace_one(upsert)`。过滤条件必须是顶层等值条件。
    /// 实体声明了 `upsert_keys` 时，首次upsert会在这些字段上确保唯一索引，
    /// 并发upsert因此最终只留下一条文档：竞争失败的一方收到唯一键冲突后重新替换，
    /// 此时会匹配到胜出者写入的文档。未声明时不创建任何索引
    pub async fn upsert_one<T: Entity + Resolvable>(&self, entity: &T, filter: Document) -> MgoDbResult<UpsertOutcome> {
        let collection = self.resolver.resolve::<T>()?;
        equality_keys(&filter)?;
        let replacement = to_document(entity)?;
        debug!("处理upsert请求: collection={}, filter={}", collection, filter);

        let mut session = self.pool.acquire().await?;
        if self.ensure_upsert_index {
            self.ensure_upsert_guard::<T>(&collection, &mut session).await?;
        }

        let options = ReplaceOptions::builder().upsert(true).build();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let (handle, client_session) = session.split(&collection);
            let result = self
                .pool
                .timed("upsert_one", async {
                    handle
                        .replace_one_with_session(filter.clone(), &replacement, options.clone(), client_session)
                        .await
                        .map_err(|e| classify(&collection, e))
                })
                .await;

            match result {
                Ok(result) if result.upserted_id.is_some() => return Ok(UpsertOutcome::Inserted),
                Ok(_) => return Ok(UpsertOutcome::Updated),
                Err(e) if e.is_duplicate_key() && attempt < UPSERT_ATTEMPTS => {
                    debug!("upsert竞争失败，重新替换: collection={}, attempt={}", collection, attempt);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 确保实体声明的upsert自然键上有唯一索引，每个集合只检查一次
    async fn ensure_upsert_guard<T: Entity>(&self, collection: &str, session: &mut PooledSession) -> MgoDbResult<()> {
        let keys: Vec<String> = T::upsert_keys().iter().map(|key| key.to_string()).collect();
        if keys.is_empty() || keys.iter().any(|key| key == "_id") {
            return Ok(());
        }

        let cache_key = format!("{}/{}", collection, keys.join(","));
        let ensured = self.upsert_indexes.lock().contains(&cache_key);
        if ensured {
            return Ok(());
        }

        let (handle, client_session) = session.split(collection);
        self.pool
            .timed(
                "ensure_upsert_index",
                ensure_unique_index(&handle, client_session, &keys, unique_index_name(&keys)),
            )
            .await?;

        info!("upsert唯一索引已确保: collection={}, keys={:?}", collection, keys);
        self.upsert_indexes.lock().insert(cache_key);
        Ok(())
    }
}
