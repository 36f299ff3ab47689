//! # 查询操作处理器

use futures::stream::TryStreamExt;
use mongodb::bson::Document;
use mongodb::options::{CountOptions, FindOptions};
use mongodb::SessionCursor;
use mongodb::ClientSession;
use rat_logger::debug;

use crate::adapter::mongodb::utils::from_document;
use crate::error::{classify, MgoDbError, MgoDbResult};
use crate::model::{Entity, Resolvable};
use crate::odm::manager_core::MgoEngine;
use crate::types::{PaginationConfig, QueryOptions, parse_sort_fields};

/// 读取会话游标中的全部文档并逐个解码
pub(crate) async fn drain_cursor<T: Entity>(
    collection: &str,
    mut cursor: SessionCursor<Document>,
    session: &mut ClientSession,
) -> MgoDbResult<Vec<T>> {
    let documents: Vec<Document> = cursor
        .stream(session)
        .try_collect()
        .await
        .map_err(|e| classify(collection, e))?;

    crate::debug_log!("游标读取完成: collection={}, count={}", collection, documents.len());
    documents.into_iter().map(from_document).collect()
}

impl MgoEngine {
    /// 查找第一条匹配的文档，零匹配返回 `NotFound`
    pub async fn find_one<T: Entity + Resolvable>(&self, filter: Document) -> MgoDbResult<T> {
        let collection = self.resolver.resolve::<T>()?;
        debug!("处理单条查询请求: collection={}, filter={}", collection, filter);

        let mut session = self.pool.acquire().await?;
        let (handle, client_session) = session.split(&collection);
        let found = self
            .pool
            .timed("find_one", async {
                handle
                    .find_one_with_session(filter, None, client_session)
                    .await
                    .map_err(|e| classify(&collection, e))
            })
            .await?;

        match found {
            Some(document) => from_document(document),
            None => Err(MgoDbError::NotFound { collection }),
        }
    }

    /// 查找第一条匹配的文档并写入调用者的值
    pub async fn find_one_into<T: Entity + Resolvable>(&self, out: &mut T, filter: Document) -> MgoDbResult<()> {
        *out = self.find_one(filter).await?;
        Ok(())
    }

    /// 分页查询
    ///
    /// `page` 和 `page_size` 从1开始；`sort` 中以 `-` 开头的字段降序，其余升序，
    /// 为空时使用服务器默认顺序。零匹配返回空列表
    pub async fn find<T, S>(&self, filter: Document, page: u64, page_size: u64, sort: &[S]) -> MgoDbResult<Vec<T>>
    where
        T: Entity + Resolvable,
        S: AsRef<str>,
    {
        let options = QueryOptions::new()
            .with_sort(parse_sort_fields(sort)?)
            .with_pagination(PaginationConfig::from_page(page, page_size)?);
        self.find_with_options(filter, &options).await
    }

    /// 分页查询并写入调用者的列表，原有内容会被替换
    pub async fn find_into<T, S>(
        &self,
        out: &mut Vec<T>,
        filter: Document,
        page: u64,
        page_size: u64,
        sort: &[S],
    ) -> MgoDbResult<()>
    where
        T: Entity + Resolvable,
        S: AsRef<str>,
    {
        *out = self.find(filter, page, page_size, sort).await?;
        Ok(())
    }

    /// 按查询选项查询，不分页时返回全部匹配
    pub async fn find_with_options<T: Entity + Resolvable>(
        &self,
        filter: Document,
        options: &QueryOptions,
    ) -> MgoDbResult<Vec<T>> {
        let collection = self.resolver.resolve::<Vec<T>>()?;
        let find_options: FindOptions = options.to_find_options();
        debug!(
            "处理查询请求: collection={}, filter={}, sort={:?}, pagination={:?}",
            collection, filter, find_options.sort, options.pagination
        );

        let mut session = self.pool.acquire().await?;
        let (handle, client_session) = session.split(&collection);
        self.pool
            .timed("find", async {
                let cursor = handle
                    .find_with_session(filter, find_options, &mut *client_session)
                    .await
                    .map_err(|e| classify(&collection, e))?;
                drain_cursor(&collection, cursor, client_session).await
            })
            .await
    }

    /// 统计匹配的文档数，零匹配返回0
    pub async fn count<V: Resolvable + ?Sized>(&self, filter: Document) -> MgoDbResult<u64> {
        let collection = self.resolver.resolve::<V>()?;
        debug!("处理计数请求: collection={}, filter={}", collection, filter);

        let mut session = self.pool.acquire().await?;
        let (handle, client_session) = session.split(&collection);
        self.pool
            .timed("count", async {
                handle
                    .count_documents_with_session(filter, None, client_session)
                    .await
                    .map_err(|e| classify(&collection, e))
            })
            .await
    }

    /// 是否存在匹配的文档
    pub async fn exists<V: Resolvable + ?Sized>(&self, filter: Document) -> MgoDbResult<bool> {
        let collection = self.resolver.resolve::<V>()?;

        let mut session = self.pool.acquire().await?;
        let (handle, client_session) = session.split(&collection);
        let options = CountOptions::builder().limit(1).build();
        let count = self
            .pool
            .timed("exists", async {
                handle
                    .count_documents_with_session(filter, options, client_session)
                    .await
                    .map_err(|e| classify(&collection, e))
            })
            .await?;
        Ok(count > 0)
    }
}
