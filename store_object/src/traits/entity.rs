use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// An entity that can be cached
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use store_object::CacheEntity;
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// pub struct Customer {
///     pub id: i64,
///     pub name: String,
/// }
///
/// impl CacheEntity for Customer {
///     fn collection_name() -> &'static str {
///         "customers"
///     }
/// }
/// ```
pub trait CacheEntity:
    Clone + Send + Sync + Debug + PartialEq + Serialize + DeserializeOwned + 'static
{
    /// Collection (table or document set) the entity lives in
    fn collection_name() -> &'static str;
}
