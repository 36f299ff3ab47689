//! # 异构批量插入

use mongodb::bson::Document;

use crate::adapter::mongodb::utils::to_document;
use crate::error::MgoDbResult;
use crate::model::{CollectionResolver, Entity, Resolvable};

type ResolveFn = fn(&CollectionResolver) -> MgoDbResult<String>;

pub(crate) struct BatchEntry {
    pub(crate) document: Document,
    pub(crate) resolve: ResolveFn,
    pub(crate) type_name: &'static str,
}

/// 可以混合多种实体类型的插入批次
///
/// 文档在加入时即完成序列化，插入时按解析出的集合分组，每个集合一次往返
#[derive(Default)]
pub struct InsertBatch {
    pub(crate) entries: Vec<BatchEntry>,
}

impl InsertBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入一个实体
    pub fn push<T: Entity + Resolvable>(&mut self, entity: &T) -> MgoDbResult<&mut Self> {
        self.entries.push(BatchEntry {
            document: to_document(entity)?,
            resolve: CollectionResolver::resolve::<T>,
            type_name: std::any::type_name::<T>(),
        });
        Ok(self)
    }

    /// 链式加入一个实体
    pub fn with<T: Entity + Resolvable>(mut self, entity: &T) -> MgoDbResult<Self> {
        self.push(entity)?;
        Ok(self)
    }

    /// 加入同一类型的一组实体
    pub fn extend<T: Entity + Resolvable>(&mut self, entities: &[T]) -> MgoDbResult<&mut Self> {
        for entity in entities {
            self.push(entity)?;
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for InsertBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types: Vec<&str> = self.entries.iter().map(|e| e.type_name).collect();
        f.debug_struct("InsertBatch").field("types", &types).finish()
    }
}
