use crate::errors::FilterError;
use crate::query_builder::QueryFilter;
use serde::Serialize;

/// Predicate the cache evaluates against in-memory entities
///
/// Implemented for plain closures and for interpreted `QueryFilter`s.
pub trait EntityFilter<T>: Send + Sync {
    fn matches(&self, entity: &T) -> bool;

    /// Reject filters that cannot be evaluated
    fn validate(&self) -> Result<(), FilterError> {
        Ok(())
    }
}

impl<T, F> EntityFilter<T> for F
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn matches(&self, entity: &T) -> bool {
        self(entity)
    }
}

impl<T: Serialize> EntityFilter<T> for QueryFilter {
    fn matches(&self, entity: &T) -> bool {
        serde_json::to_value(entity)
            .map(|record| self.evaluate(&record))
            .unwrap_or(false)
    }

    fn validate(&self) -> Result<(), FilterError> {
        QueryFilter::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Serialize)]
    struct Item {
        name: String,
        price: i32,
    }

    fn item(name: &str, price: i32) -> Item {
        Item {
            name: name.to_string(),
            price,
        }
    }

    fn count_matches(filter: &dyn EntityFilter<Item>, items: &[Item]) -> usize {
        items.iter().filter(|i| filter.matches(i)).count()
    }

    #[test]
    fn test_closure_and_query_filter_agree() {
        let items = vec![item("pen", 2), item("book", 15), item("lamp", 40)];

        let closure = |i: &Item| i.price > 10;
        let interpreted = QueryFilter::gt("price", json!(10));

        assert_eq!(count_matches(&closure, &items), 2);
        assert_eq!(count_matches(&interpreted, &items), 2);
    }

    #[test]
    fn test_closure_is_always_valid() {
        let closure = |_: &Item| true;
        assert!(EntityFilter::<Item>::validate(&closure).is_ok());

        let broken = QueryFilter::eq("", json!(1));
        assert!(EntityFilter::<Item>::validate(&broken).is_err());
    }
}
