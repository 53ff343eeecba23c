// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Parameter Graph Interface
// ─────────────────────────────────────────────────────────────────────
//! Computation-graph substrate shared by every scorer in an ensemble.
//!
//! Parameters live in named partitions (namespaces). A model never sees
//! the raw graph: it receives a [`ParamScope`], which switches to the
//! scorer's namespace on entry and restores the previous one on drop.
//! That keeps "switch, then touch parameters" a property of the types
//! rather than a calling convention.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use ensemble_types::{EnsembleError, EnsembleResult, Expr};

/// Trait for computation substrates.
pub trait Graph {
    /// Redirect subsequent parameter reads and writes to `namespace`.
    fn switch_params(&mut self, namespace: &str);

    /// Namespace currently in effect.
    fn namespace(&self) -> &str;

    /// Materialise a fixed `rows × cols` tensor.
    fn constant(&mut self, rows: usize, cols: usize, values: Vec<f32>) -> EnsembleResult<Expr>;

    /// Look up a parameter in the active namespace.
    fn param(&self, name: &str) -> Option<Expr>;

    /// Store a parameter in the active namespace.
    fn set_param(&mut self, name: &str, value: Expr);

    /// Drop every parameter of the active namespace.
    fn clear_params(&mut self);
}

/// In-memory graph keeping one parameter map per namespace.
#[derive(Debug, Default)]
pub struct ExpressionGraph {
    namespace: String,
    params: HashMap<String, HashMap<String, Expr>>,
    constants: usize,
}

impl ExpressionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of parameters held under `namespace`.
    pub fn param_count(&self, namespace: &str) -> usize {
        self.params.get(namespace).map_or(0, HashMap::len)
    }

    /// Number of constants materialised so far.
    pub fn constant_count(&self) -> usize {
        self.constants
    }
}

impl Graph for ExpressionGraph {
    fn switch_params(&mut self, namespace: &str) {
        if self.namespace != namespace {
            self.namespace.clear();
            self.namespace.push_str(namespace);
        }
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn constant(&mut self, rows: usize, cols: usize, values: Vec<f32>) -> EnsembleResult<Expr> {
        let expr = Expr::new(rows, cols, values)?;
        self.constants += 1;
        Ok(expr)
    }

    fn param(&self, name: &str) -> Option<Expr> {
        self.params
            .get(&self.namespace)
            .and_then(|ns| ns.get(name))
            .cloned()
    }

    fn set_param(&mut self, name: &str, value: Expr) {
        self.params
            .entry(self.namespace.clone())
            .or_default()
            .insert(name.to_string(), value);
    }

    fn clear_params(&mut self) {
        self.params.remove(&self.namespace);
    }
}

/// Namespace held for the duration of one parameter-touching call.
pub struct ParamScope<'g> {
    graph: &'g mut dyn Graph,
    previous: String,
}

impl<'g> ParamScope<'g> {
    pub fn enter(graph: &'g mut dyn Graph, namespace: &str) -> Self {
        let previous = graph.namespace().to_string();
        graph.switch_params(namespace);
        Self { graph, previous }
    }

    /// Parameter lookup that reports which namespace came up empty.
    pub fn require_param(&self, name: &str) -> EnsembleResult<Expr> {
        self.graph
            .param(name)
            .ok_or_else(|| EnsembleError::MissingParam {
                namespace: self.graph.namespace().to_string(),
                name: name.to_string(),
            })
    }
}

impl<'g> Deref for ParamScope<'g> {
    type Target = dyn Graph + 'g;

    fn deref(&self) -> &Self::Target {
        &*self.graph
    }
}

impl<'g> DerefMut for ParamScope<'g> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.graph
    }
}

impl Drop for ParamScope<'_> {
    fn drop(&mut self) {
        self.graph.switch_params(&self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces_do_not_alias() {
        let mut graph = ExpressionGraph::new();
        graph.switch_params("F0");
        graph.set_param("W", Expr::row(vec![1.0]));
        graph.switch_params("F1");
        graph.set_param("W", Expr::row(vec![2.0]));

        graph.switch_params("F0");
        assert_eq!(graph.param("W").unwrap().get(0), 1.0);
        graph.switch_params("F1");
        assert_eq!(graph.param("W").unwrap().get(0), 2.0);
    }

    #[test]
    fn test_clear_only_touches_active_namespace() {
        let mut graph = ExpressionGraph::new();
        graph.switch_params("F0");
        graph.set_param("W", Expr::row(vec![1.0]));
        graph.switch_params("F1");
        graph.set_param("W", Expr::row(vec![2.0]));
        graph.clear_params();
        assert_eq!(graph.param_count("F1"), 0);
        assert_eq!(graph.param_count("F0"), 1);
    }

    #[test]
    fn test_scope_restores_previous_namespace() {
        let mut graph = ExpressionGraph::new();
        graph.switch_params("outer");
        {
            let mut scope = ParamScope::enter(&mut graph, "F3");
            assert_eq!(scope.namespace(), "F3");
            scope.set_param("b", Expr::row(vec![0.5]));
        }
        assert_eq!(graph.namespace(), "outer");
        assert_eq!(graph.param_count("F3"), 1);
        assert!(graph.param("b").is_none());
    }

    #[test]
    fn test_require_param_names_namespace() {
        let mut graph = ExpressionGraph::new();
        let scope = ParamScope::enter(&mut graph, "F7");
        match scope.require_param("bigram") {
            Err(EnsembleError::MissingParam { namespace, name }) => {
                assert_eq!(namespace, "F7");
                assert_eq!(name, "bigram");
            }
            other => panic!("expected MissingParam, got {other:?}"),
        }
    }

    #[test]
    fn test_constant_checks_shape() {
        let mut graph = ExpressionGraph::new();
        assert!(graph.constant(1, 4, vec![0.0; 3]).is_err());
        assert!(graph.constant(1, 3, vec![0.0; 3]).is_ok());
        assert_eq!(graph.constant_count(), 1);
    }
}
