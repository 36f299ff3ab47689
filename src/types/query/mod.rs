use crate::error::{MgoDbError, MgoDbResult};
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};

/// 排序配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortConfig {
    /// 字段名
    pub field: String,
    /// 排序方向
    pub direction: SortDirection,
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// 升序
    Asc,
    /// 降序
    Desc,
}

impl SortDirection {
    /// MongoDB排序值
    pub fn as_i32(&self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

impl SortConfig {
    /// 解析单个排序字段
    ///
    /// `-field` 表示降序，`+field` 或 `field` 表示升序
    pub fn parse(spec: &str) -> MgoDbResult<Self> {
        let trimmed = spec.trim();
        let (direction, field) = if let Some(rest) = trimmed.strip_prefix('-') {
            (SortDirection::Desc, rest)
        } else if let Some(rest) = trimmed.strip_prefix('+') {
            (SortDirection::Asc, rest)
        } else {
            (SortDirection::Asc, trimmed)
        };

        if field.is_empty() || field.starts_with('-') || field.starts_with('+') {
            return Err(MgoDbError::InvalidArgument {
                field: "sort".to_string(),
                message: crate::i18n::tf("error.invalid_sort", &[("spec", spec)]),
            });
        }

        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

/// 按顺序解析排序字段列表
pub fn parse_sort_fields<S: AsRef<str>>(fields: &[S]) -> MgoDbResult<Vec<SortConfig>> {
    fields.iter().map(|f| SortConfig::parse(f.as_ref())).collect()
}

/// 构建排序文档，空列表返回None（使用后端默认顺序）
pub fn build_sort_document(sorts: &[SortConfig]) -> Option<Document> {
    if sorts.is_empty() {
        return None;
    }
    let mut sort_doc = Document::new();
    for sort in sorts {
        sort_doc.insert(sort.field.clone(), sort.direction.as_i32());
    }
    Some(sort_doc)
}

/// 分页配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// 跳过的记录数
    pub skip: u64,
    /// 限制返回的记录数
    pub limit: u64,
}

impl PaginationConfig {
    /// 从页码计算分页，页码和每页大小都从1开始
    pub fn from_page(page: u64, page_size: u64) -> MgoDbResult<Self> {
        let invalid = || MgoDbError::InvalidArgument {
            field: "page".to_string(),
            message: crate::i18n::tf(
                "error.invalid_page",
                &[("page", &page.to_string()), ("page_size", &page_size.to_string())],
            ),
        };

        if page < 1 || page_size < 1 || page_size > i64::MAX as u64 {
            return Err(invalid());
        }

        // 驱动以i64发送skip
        let skip = (page - 1)
            .checked_mul(page_size)
            .filter(|skip| *skip <= i64::MAX as u64)
            .ok_or_else(invalid)?;
        Ok(Self {
            skip,
            limit: page_size,
        })
    }

    /// 驱动使用的limit类型
    pub fn limit_i64(&self) -> i64 {
        self.limit as i64
    }
}

/// 查询选项
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryOptions {
    /// 排序配置
    pub sort: Vec<SortConfig>,
    /// 分页配置
    pub pagination: Option<PaginationConfig>,
}

impl QueryOptions {
    /// 创建新的查询选项
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置排序
    pub fn with_sort(mut self, sort: Vec<SortConfig>) -> Self {
        self.sort = sort;
        self
    }

    /// 设置分页
    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// 转换为驱动的查询选项
    pub fn to_find_options(&self) -> mongodb::options::FindOptions {
        let mut find_options = mongodb::options::FindOptions::default();
        find_options.sort = build_sort_document(&self.sort);
        if let Some(pagination) = &self.pagination {
            find_options.skip = Some(pagination.skip);
            find_options.limit = Some(pagination.limit_i64());
        }
        find_options
    }
}
