//! # 删除操作处理器

use mongodb::bson::Document;
use rat_logger::debug;

use crate::error::{classify, MgoDbError, MgoDbResult};
use crate::model::Resolvable;
use crate::odm::manager_core::MgoEngine;

impl MgoEngine {
    /// 删除第一条匹配的文档，零匹配返回 `NotFound`
    pub async fn remove_one<V: Resolvable + ?Sized>(&self, filter: Document) -> MgoDbResult<()> {
        let collection = self.resolver.resolve::<V>()?;
        debug!("处理删除请求: collection={}, filter={}", collection, filter);

        let mut session = self.pool.acquire().await?;
        let (handle, client_session) = session.split(&collection);
        let result = self
            .pool
            .timed("remove_one", async {
                handle
                    .delete_one_with_session(filter, None, client_session)
                    .await
                    .map_err(|e| classify(&collection, e))
            })
            .await?;

        if result.deleted_count == 0 {
            return Err(MgoDbError::NotFound { collection });
        }
        Ok(())
    }
}
