//! 实体相关的宏定义

/// 便捷宏：把类型声明为实体
///
/// ```ignore
/// mgo_entity!(Car);                       // 集合名由类型名推导: "car"
/// mgo_entity!(CarOwner => "car_owner");   // 显式集合名
/// mgo_entity!(Car; unique["carId"]);      // upsert自然键，首次upsert时确保唯一索引
/// mgo_entity!(CarView: embeds Car);       // 继承被嵌入类型的显式集合名
/// mgo_entity!(CarDraft: embeds Car => "car_draft");
/// ```
#[macro_export]
macro_rules! mgo_entity {
    ($ty:ty $(=> $name:expr)? $(; unique [$($key:literal),+ $(,)?])?) => {
        impl $crate::model::Entity for $ty {
            $(
                fn collection_name() -> Option<::std::borrow::Cow<'static, str>> {
                    Some(::std::borrow::Cow::from($name))
                }
            )?
            $(
                fn upsert_keys() -> &'static [&'static str] {
                    &[$($key),+]
                }
            )?
        }

        impl $crate::model::Resolvable for $ty {
            type Element = $ty;
        }
    };
    ($ty:ty : embeds $base:ty $(=> $name:expr)? $(; unique [$($key:literal),+ $(,)?])?) => {
        impl $crate::model::Entity for $ty {
            $(
                fn collection_name() -> Option<::std::borrow::Cow<'static, str>> {
                    Some(::std::borrow::Cow::from($name))
                }
            )?

            fn embedded_collection_name() -> Option<::std::borrow::Cow<'static, str>> {
                <$base as $crate::model::Entity>::collection_name()
                    .or_else(<$base as $crate::model::Entity>::embedded_collection_name)
            }

            $(
                fn upsert_keys() -> &'static [&'static str] {
                    &[$($key),+]
                }
            )?
        }

        impl $crate::model::Resolvable for $ty {
            type Element = $ty;
        }
    };
}
