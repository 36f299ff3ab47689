//! 多语言错误消息模块
//!
//! 使用rat_embed_lang框架提供统一的错误消息多语言支持

use std::collections::HashMap;
use std::sync::Once;
use rat_embed_lang::register_translations;

static REGISTER: Once = Once::new();

/// 错误消息翻译注册器
pub struct ErrorMessageI18n;

impl ErrorMessageI18n {
    fn entry(zh: &str, en: &str, ja: &str) -> HashMap<String, String> {
        let mut messages = HashMap::new();
        messages.insert("zh-CN".to_string(), zh.to_string());
        messages.insert("en-US".to_string(), en.to_string());
        messages.insert("ja-JP".to_string(), ja.to_string());
        messages
    }

    /// 注册所有错误消息翻译
    pub fn register_all_translations() {
        let mut translations = HashMap::new();

        translations.insert(
            "error.connection".to_string(),
            Self::entry(
                "数据库连接失败: {message}",
                "Database connection failed: {message}",
                "データベース接続に失敗しました: {message}",
            ),
        );
        translations.insert(
            "error.not_initialized".to_string(),
            Self::entry(
                "数据访问层尚未初始化，请先调用 init",
                "Data access layer is not initialized, call init first",
                "データアクセス層が初期化されていません。先に init を呼び出してください",
            ),
        );
        translations.insert(
            "error.timeout".to_string(),
            Self::entry(
                "{operation} 超时 ({millis}ms)",
                "{operation} timed out after {millis}ms",
                "{operation} がタイムアウトしました ({millis}ms)",
            ),
        );
        translations.insert(
            "error.pool_closed".to_string(),
            Self::entry(
                "连接池已关闭",
                "Connection pool is closed",
                "接続プールは閉じられています",
            ),
        );
        translations.insert(
            "error.operation".to_string(),
            Self::entry(
                "集合 {collection} 操作失败: {message}",
                "Operation on collection {collection} failed: {message}",
                "コレクション {collection} の操作が失敗しました: {message}",
            ),
        );
        translations.insert(
            "error.bulk_write".to_string(),
            Self::entry(
                "集合 {collection} 批量写入失败 {failed}/{total}: {details}",
                "Bulk write to {collection} failed for {failed} of {total}: {details}",
                "コレクション {collection} への一括書き込みが失敗しました {failed}/{total}: {details}",
            ),
        );
        translations.insert(
            "error.invalid_page".to_string(),
            Self::entry(
                "分页参数必须从1开始: page={page}, page_size={page_size}",
                "Pagination is 1-indexed: page={page}, page_size={page_size}",
                "ページ指定は1から始まります: page={page}, page_size={page_size}",
            ),
        );
        translations.insert(
            "error.invalid_sort".to_string(),
            Self::entry(
                "排序字段无效: '{spec}'",
                "Invalid sort field: '{spec}'",
                "無効なソートフィールド: '{spec}'",
            ),
        );
        translations.insert(
            "error.upsert_filter".to_string(),
            Self::entry(
                "upsert过滤条件必须是顶层等值条件: {reason}",
                "Upsert filter must consist of top-level equality keys: {reason}",
                "upsert のフィルタはトップレベルの等価条件である必要があります: {reason}",
            ),
        );
        translations.insert(
            "error.unique_index_conflict".to_string(),
            Self::entry(
                "集合 {collection} 中已有重复值，无法在 ({keys}) 上建立唯一索引: {message}",
                "Cannot build unique index on ({keys}) in {collection}, existing documents contain duplicates: {message}",
                "{collection} に重複値があるため ({keys}) に一意インデックスを作成できません: {message}",
            ),
        );
        translations.insert(
            "error.resolution".to_string(),
            Self::entry(
                "无法为类型推导集合名: {reason}",
                "Cannot derive a collection name for the type: {reason}",
                "型からコレクション名を導出できません: {reason}",
            ),
        );
        translations.insert(
            "error.config".to_string(),
            Self::entry(
                "配置错误: {message}",
                "Configuration error: {message}",
                "設定エラー: {message}",
            ),
        );

        register_translations(translations);
    }

    /// 初始化错误消息多语言支持
    pub fn init() {
        ensure_registered();

        // 从环境变量获取语言设置，默认为zh-CN
        let lang = std::env::var("RAT_LANG")
            .or_else(|_| std::env::var("LANG"))
            .unwrap_or_else(|_| "zh-CN".to_string());

        use rat_embed_lang::normalize_language_code;
        let normalized_lang = normalize_language_code(&lang);
        set_language(&normalized_lang);
    }
}

fn ensure_registered() {
    REGISTER.call_once(ErrorMessageI18n::register_all_translations);
}

/// 翻译消息
pub fn t(key: &str) -> String {
    ensure_registered();
    rat_embed_lang::t(key)
}

/// 带参数翻译消息
pub fn tf(key: &str, args: &[(&str, &str)]) -> String {
    ensure_registered();
    rat_embed_lang::tf(key, args)
}

pub use rat_embed_lang::{set_language, current_language};
