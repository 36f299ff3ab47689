//! # 创建操作处理器

use mongodb::options::InsertManyOptions;
use rat_logger::{debug, info, warn};
use std::collections::BTreeMap;

use crate::adapter::mongodb::utils::to_document;
use crate::error::{
    bulk_write_failures, classify, classify_batch, summarize_write_failures, MgoDbError, MgoDbResult,
    WriteFailureEntry,
};
use crate::model::{Entity, Resolvable};
use crate::odm::batch::InsertBatch;
use crate::odm::manager_core::MgoEngine;

fn unordered() -> InsertManyOptions {
    InsertManyOptions::builder().ordered(false).build()
}

/// 整组写入失败时，为组内每个文档生成一条失败记录
fn whole_group_failed(group_len: usize, err: &MgoDbError) -> Vec<WriteFailureEntry> {
    (0..group_len)
        .map(|index| WriteFailureEntry {
            index,
            code: 0,
            message: err.to_string(),
        })
        .collect()
}

/// 把组内下标映射回批次下标，返回失败的文档数和映射后的记录
///
/// 写关注错误没有对应文档，保留下标 `total` 且不计入失败文档数
fn remap_group_failures(
    collection: &str,
    positions: &[usize],
    total: usize,
    entries: Vec<WriteFailureEntry>,
) -> (usize, Vec<WriteFailureEntry>) {
    let failed = entries.iter().filter(|entry| entry.index < positions.len()).count();
    let remapped = entries
        .into_iter()
        .map(|mut entry| {
            entry.index = positions.get(entry.index).copied().unwrap_or(total);
            entry.message = format!("{}: {}", collection, entry.message);
            entry
        })
        .collect();
    (failed, remapped)
}

impl MgoEngine {
    /// 插入一个实体
    ///
    /// 主键由调用者提供，引擎不会生成；主键已存在时返回 `DuplicateKey`
    pub async fn insert<T: Entity + Resolvable>(&self, entity: &T) -> MgoDbResult<()> {
        let collection = self.resolver.resolve::<T>()?;
        let document = to_document(entity)?;
        debug!("处理插入请求: collection={}", collection);

        let mut session = self.pool.acquire().await?;
        let (handle, client_session) = session.split(&collection);
        self.pool
            .timed("insert", async {
                handle
                    .insert_one_with_session(document, None, client_session)
                    .await
                    .map(|_| ())
                    .map_err(|e| classify(&collection, e))
            })
            .await
    }

    /// 一次往返插入同一集合的多个实体，返回插入数量
    ///
    /// 无序写入：单条失败不影响其余文档，所有失败汇总为一个 `OperationError`
    pub async fn insert_many<T: Entity + Resolvable>(&self, entities: &[T]) -> MgoDbResult<usize> {
        let collection = self.resolver.resolve::<[T]>()?;
        if entities.is_empty() {
            return Ok(0);
        }

        let documents = entities
            .iter()
            .map(to_document)
            .collect::<MgoDbResult<Vec<_>>>()?;
        let total = documents.len();
        debug!("处理批量插入请求: collection={}, count={}", collection, total);

        let mut session = self.pool.acquire().await?;
        let (handle, client_session) = session.split(&collection);
        self.pool
            .timed("insert_many", async {
                handle
                    .insert_many_with_session(documents, unordered(), client_session)
                    .await
                    .map(|result| result.inserted_ids.len())
                    .map_err(|e| classify_batch(&collection, total, e))
            })
            .await
    }

    /// 插入异构批次，返回插入数量
    ///
    /// 按集合分组、每组一次往返；各组的失败按文档在批次中的下标汇总成一个 `OperationError`。
    /// 连接类错误立即返回，其余整组失败记为组内每个文档的失败
    pub async fn insert_batch(&self, batch: InsertBatch) -> MgoDbResult<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        let total = batch.len();
        let mut groups: BTreeMap<String, Vec<(usize, mongodb::bson::Document)>> = BTreeMap::new();
        for (index, entry) in batch.entries.into_iter().enumerate() {
            let collection = (entry.resolve)(&self.resolver)?;
            groups.entry(collection).or_default().push((index, entry.document));
        }

        let mut session = self.pool.acquire().await?;
        let mut inserted = 0;
        let mut failures: Vec<WriteFailureEntry> = Vec::new();

        for (collection, group) in groups {
            let (positions, documents): (Vec<usize>, Vec<_>) = group.into_iter().unzip();
            let group_len = documents.len();
            let (handle, client_session) = session.split(&collection);

            let result = self
                .pool
                .timed("insert_batch", async {
                    Ok(handle
                        .insert_many_with_session(documents, unordered(), client_session)
                        .await)
                })
                .await?;

            match result {
                Ok(result) => inserted += result.inserted_ids.len(),
                Err(e) => {
                    let entries = match bulk_write_failures(&e, group_len) {
                        Some(entries) => entries,
                        None => {
                            let classified = classify_batch(&collection, group_len, e);
                            if classified.is_connection_error() {
                                if !failures.is_empty() {
                                    warn!("批量插入中断，此前的失败: {}", summarize_write_failures("batch", total, &failures));
                                }
                                return Err(classified);
                            }
                            whole_group_failed(group_len, &classified)
                        }
                    };
                    let (failed, remapped) = remap_group_failures(&collection, &positions, total, entries);
                    inserted += group_len - failed;
                    failures.extend(remapped);
                }
            }
        }

        if failures.is_empty() {
            info!("批量插入完成: count={}", inserted);
            Ok(inserted)
        } else {
            Err(summarize_write_failures("batch", total, &failures))
        }
    }
}
