//! The reporting graph resolver.
//!
//! Escalation follows exactly one edge type; when an employee has several
//! edges of that type, the earliest recorded one wins. The approval engine
//! resolves one supervisor at a time with [`Tx::supervisor_edge`]. This
//! in-memory graph backs the read-only chain view.

use std::collections::HashMap;

use crate::error::HrResult;
use crate::models::{ReportType, ReportingEdge};
use crate::store::Tx;

/// Reporting edges indexed by the reporting employee.
#[derive(Debug, Clone, Default)]
pub struct ReportingGraph {
    edges: Vec<ReportingEdge>,
    by_employee: HashMap<String, Vec<usize>>,
}

impl ReportingGraph {
    /// Builds a graph from edges in recording order.
    ///
    /// # Example
    ///
    /// ```
    /// use hr_backoffice::leave::ReportingGraph;
    /// use hr_backoffice::models::{ReportType, ReportingEdge};
    ///
    /// let graph = ReportingGraph::from_edges(vec![
    ///     ReportingEdge::primary("EMP001", "MGR001"),
    ///     ReportingEdge::primary("MGR001", "DIR001"),
    /// ]);
    /// assert_eq!(graph.supervisor_of("EMP001", ReportType::Primary), Some("MGR001"));
    /// assert_eq!(graph.supervisor_of("DIR001", ReportType::Primary), None);
    /// ```
    pub fn from_edges(edges: Vec<ReportingEdge>) -> Self {
        let mut by_employee: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, edge) in edges.iter().enumerate() {
            by_employee.entry(edge.emp_id.clone()).or_default().push(idx);
        }
        Self { edges, by_employee }
    }

    /// Loads every reporting edge visible to `tx`.
    pub fn load(tx: &Tx<'_>) -> HrResult<Self> {
        Ok(Self::from_edges(tx.reporting_edges()?))
    }

    /// The escalation supervisor of `emp_id` along `report_type` edges.
    ///
    /// `None` means the employee is at the top of that chain.
    pub fn supervisor_of(&self, emp_id: &str, report_type: ReportType) -> Option<&str> {
        self.by_employee
            .get(emp_id)?
            .iter()
            .map(|&idx| &self.edges[idx])
            .find(|edge| edge.report_type == report_type)
            .map(|edge| edge.reports_to.as_str())
    }

    /// The chain of supervisors above `emp_id`, nearest first.
    ///
    /// Stops at the top of the chain, after `max_depth` supervisors, or when
    /// an employee would repeat.
    pub fn chain_of(&self, emp_id: &str, report_type: ReportType, max_depth: usize) -> Vec<String> {
        let mut chain: Vec<String> = Vec::new();
        let mut current = emp_id;
        while chain.len() < max_depth {
            let Some(next) = self.supervisor_of(current, report_type) else {
                break;
            };
            if next == emp_id || chain.iter().any(|seen| seen == next) {
                break;
            }
            chain.push(next.to_string());
            current = next;
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn edge(emp_id: &str, reports_to: &str, report_type: ReportType) -> ReportingEdge {
        ReportingEdge {
            emp_id: emp_id.to_string(),
            reports_to: reports_to.to_string(),
            report_type,
        }
    }

    #[test]
    fn test_supervisor_of_follows_requested_type() {
        let graph = ReportingGraph::from_edges(vec![
            edge("EMP001", "LEAD001", ReportType::Dotted),
            edge("EMP001", "MGR001", ReportType::Primary),
            edge("EMP001", "MGR002", ReportType::Secondary),
        ]);

        assert_eq!(graph.supervisor_of("EMP001", ReportType::Primary), Some("MGR001"));
        assert_eq!(graph.supervisor_of("EMP001", ReportType::Secondary), Some("MGR002"));
        assert_eq!(graph.supervisor_of("EMP001", ReportType::Dotted), Some("LEAD001"));
    }

    #[test]
    fn test_first_recorded_edge_wins() {
        let graph = ReportingGraph::from_edges(vec![
            ReportingEdge::primary("EMP001", "MGR001"),
            ReportingEdge::primary("EMP001", "MGR002"),
        ]);
        assert_eq!(graph.supervisor_of("EMP001", ReportType::Primary), Some("MGR001"));
    }

    #[test]
    fn test_unknown_employee_has_no_supervisor() {
        let graph = ReportingGraph::default();
        assert_eq!(graph.supervisor_of("EMP001", ReportType::Primary), None);
    }

    #[test]
    fn test_non_primary_edges_do_not_escalate() {
        let graph = ReportingGraph::from_edges(vec![edge("EMP001", "LEAD001", ReportType::Dotted)]);
        assert_eq!(graph.supervisor_of("EMP001", ReportType::Primary), None);
    }

    #[test]
    fn test_chain_of_orders_nearest_first() {
        let graph = ReportingGraph::from_edges(vec![
            ReportingEdge::primary("MGR001", "DIR001"),
            ReportingEdge::primary("EMP001", "MGR001"),
            ReportingEdge::primary("DIR001", "CEO001"),
        ]);
        assert_eq!(
            graph.chain_of("EMP001", ReportType::Primary, 10),
            vec!["MGR001", "DIR001", "CEO001"]
        );
        assert_eq!(graph.chain_of("EMP001", ReportType::Primary, 2), vec!["MGR001", "DIR001"]);
    }

    #[test]
    fn test_chain_of_stops_on_cycle() {
        let graph = ReportingGraph::from_edges(vec![
            ReportingEdge::primary("A", "B"),
            ReportingEdge::primary("B", "C"),
            ReportingEdge::primary("C", "A"),
        ]);
        assert_eq!(graph.chain_of("A", ReportType::Primary, 10), vec!["B", "C"]);
    }

    #[test]
    fn test_load_reads_store_edges() {
        let store = Store::open_in_memory().unwrap();
        store
            .write(|tx| tx.insert_reporting_edge(&ReportingEdge::primary("EMP001", "MGR001")))
            .unwrap();

        let graph = store.read(|tx| ReportingGraph::load(tx)).unwrap();
        assert_eq!(graph.supervisor_of("EMP001", ReportType::Primary), Some("MGR001"));
    }
}
