//! Dependency graph ordering.
//!
//! Output resources (and anything else exposing a key plus the keys it
//! depends on) are ordered with Kahn's algorithm. Nodes that become ready at
//! the same time are emitted in input order, so the same input always
//! produces the same deployment order.

use std::collections::{BTreeSet, HashMap};

use crate::error::GraphError;

/// An item that can be placed in a dependency graph.
pub trait DependencyItem {
    /// Unique key of the item within the graph.
    fn key(&self) -> &str;

    /// Keys of the items that must come before this one.
    fn dependencies(&self) -> Result<Vec<String>, GraphError>;
}

/// Order items so that every item comes after all of its dependencies.
///
/// # Errors
///
/// Returns an error when a key is empty or duplicated, when a dependency
/// points at a key outside the set, or when the dependencies form a cycle.
pub fn order<T>(items: &[T]) -> Result<Vec<T>, GraphError>
where
    T: DependencyItem + Clone,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let key = item.key();
        if key.is_empty() {
            return Err(GraphError::EmptyKey { position });
        }
        if index_of.insert(key, position).is_some() {
            return Err(GraphError::DuplicateKey(key.to_string()));
        }
    }

    let mut indegree = vec![0usize; items.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    let mut missing = Vec::new();

    for (position, item) in items.iter().enumerate() {
        let mut seen = BTreeSet::new();
        for dependency in item.dependencies()? {
            let Some(&target) = index_of.get(dependency.as_str()) else {
                missing.push(format!(
                    "{} depends on missing item {}",
                    item.key(),
                    dependency
                ));
                continue;
            };

            // Repeated edges count once.
            if !seen.insert(target) {
                continue;
            }

            dependents[target].push(position);
            indegree[position] += 1;
        }
    }

    if !missing.is_empty() {
        let details = missing.join("\n  - ");
        return Err(GraphError::MissingReference { details });
    }

    let mut ready: BTreeSet<usize> = indegree
        .iter()
        .enumerate()
        .filter_map(|(position, count)| (*count == 0).then_some(position))
        .collect();

    let mut ordered = Vec::with_capacity(items.len());
    while let Some(next) = ready.pop_first() {
        ordered.push(items[next].clone());

        for &dependent in &dependents[next] {
            let entry = &mut indegree[dependent];
            if *entry == 0 {
                continue;
            }
            *entry -= 1;
            if *entry == 0 {
                ready.insert(dependent);
            }
        }
    }

    if ordered.len() != items.len() {
        let members = indegree
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(position, _)| items[position].key().to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        return Err(GraphError::Cycle { members });
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Node {
        key: String,
        deps: Vec<String>,
    }

    impl Node {
        fn new(key: &str, deps: &[&str]) -> Self {
            Self {
                key: key.to_string(),
                deps: deps.iter().map(|d| d.to_string()).collect(),
            }
        }
    }

    impl DependencyItem for Node {
        fn key(&self) -> &str {
            &self.key
        }

        fn dependencies(&self) -> Result<Vec<String>, GraphError> {
            if self.deps.iter().any(|d| d.is_empty()) {
                return Err(GraphError::EmptyDependency {
                    key: self.key.clone(),
                });
            }
            Ok(self.deps.clone())
        }
    }

    fn keys(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.key.as_str()).collect()
    }

    #[test]
    fn test_orders_by_dependency_edges() {
        let items = vec![
            Node::new("c", &["b"]),
            Node::new("b", &["a"]),
            Node::new("a", &[]),
        ];
        let ordered = order(&items).unwrap();
        assert_eq!(keys(&ordered), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_independent_items_keep_input_order() {
        let items = vec![
            Node::new("z", &[]),
            Node::new("m", &[]),
            Node::new("a", &[]),
        ];
        let ordered = order(&items).unwrap();
        assert_eq!(keys(&ordered), vec!["z", "m", "a"]);
    }

    #[test]
    fn test_diamond() {
        let items = vec![
            Node::new("app", &["db", "cache"]),
            Node::new("cache", &["net"]),
            Node::new("db", &["net"]),
            Node::new("net", &[]),
        ];
        let ordered = order(&items).unwrap();
        assert_eq!(keys(&ordered), vec!["net", "cache", "db", "app"]);
    }

    #[test]
    fn test_repeated_dependency_counts_once() {
        let items = vec![Node::new("b", &["a", "a"]), Node::new("a", &[])];
        let ordered = order(&items).unwrap();
        assert_eq!(keys(&ordered), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<Node> = Vec::new();
        assert!(order(&items).unwrap().is_empty());
    }

    #[test]
    fn test_detects_cycle() {
        let items = vec![
            Node::new("a", &["b"]),
            Node::new("b", &["a"]),
            Node::new("c", &[]),
        ];
        let err = order(&items).unwrap_err();
        assert_eq!(
            err,
            GraphError::Cycle {
                members: "a -> b".to_string()
            }
        );
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let items = vec![Node::new("a", &["a"])];
        assert!(matches!(order(&items), Err(GraphError::Cycle { .. })));
    }

    #[test]
    fn test_missing_reference() {
        let items = vec![Node::new("a", &["ghost"])];
        let err = order(&items).unwrap_err();
        assert!(err.is_missing_reference());
        assert!(err.to_string().contains("a depends on missing item ghost"));
    }

    #[test]
    fn test_empty_dependency_key() {
        let items = vec![Node::new("a", &[""])];
        let err = order(&items).unwrap_err();
        assert!(err.is_missing_reference());
        assert!(matches!(err, GraphError::EmptyDependency { .. }));
    }

    #[test]
    fn test_empty_and_duplicate_keys() {
        let empty = vec![Node::new("a", &[]), Node::new("", &[])];
        assert_eq!(
            order(&empty).unwrap_err(),
            GraphError::EmptyKey { position: 1 }
        );

        let duplicate = vec![Node::new("a", &[]), Node::new("a", &[])];
        assert_eq!(
            order(&duplicate).unwrap_err(),
            GraphError::DuplicateKey("a".to_string())
        );
    }
}
