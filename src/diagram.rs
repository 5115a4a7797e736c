//! SIPOC diagram graph and its Graphviz DOT form

use serde::Serialize;
use std::collections::HashMap;

use crate::record::AnswerRecord;

/// The five SIPOC categories, in diagram order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SipocCategory {
    Suppliers,
    Inputs,
    Process,
    Outputs,
    Customers,
}

impl SipocCategory {
    pub const ALL: [SipocCategory; 5] = [
        Self::Suppliers,
        Self::Inputs,
        Self::Process,
        Self::Outputs,
        Self::Customers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SipocCategory::Suppliers => "Suppliers",
            SipocCategory::Inputs => "Inputs",
            SipocCategory::Process => "Process",
            SipocCategory::Outputs => "Outputs",
            SipocCategory::Customers => "Customers",
        }
    }

    /// Case-insensitive lookup by name
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            SipocCategory::Suppliers => "List the Suppliers (comma-separated)",
            SipocCategory::Inputs => "List the Inputs (comma-separated)",
            SipocCategory::Process => "Describe the Process steps (comma-separated)",
            SipocCategory::Outputs => "List the Outputs (comma-separated)",
            SipocCategory::Customers => "List the Customers (comma-separated)",
        }
    }

    pub fn default_answer(&self) -> &'static str {
        match self {
            SipocCategory::Suppliers => "Baggage handlers, Conveyor belt manufacturers",
            SipocCategory::Inputs => "Baggage, Conveyor belts, Handling staff",
            SipocCategory::Process => "Check-in, Sorting, Loading, Unloading, Delivery to carousel",
            SipocCategory::Outputs => "Sorted and delivered baggage",
            SipocCategory::Customers => "Passengers, Airlines",
        }
    }

    fn next(&self) -> Option<Self> {
        match self {
            SipocCategory::Suppliers => Some(SipocCategory::Inputs),
            SipocCategory::Inputs => Some(SipocCategory::Process),
            SipocCategory::Process => Some(SipocCategory::Outputs),
            SipocCategory::Outputs => Some(SipocCategory::Customers),
            SipocCategory::Customers => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Category,
    Item,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagramNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagramEdge {
    pub from: String,
    pub to: String,
}

/// Directed SIPOC graph: items point at their category, categories chain in order.
///
/// Nodes are keyed by kind and label. An item whose text repeats another item
/// reuses that node; an item named like a category still gets its own node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SipocDiagram {
    nodes: Vec<DiagramNode>,
    edges: Vec<DiagramEdge>,
    #[serde(skip)]
    by_label: HashMap<(NodeKind, String), usize>,
}

impl SipocDiagram {
    /// Build the graph from a SIPOC record; missing categories get no items
    pub fn build(record: &AnswerRecord) -> Self {
        let mut diagram = Self::default();

        let category_ids: Vec<String> = SipocCategory::ALL
            .iter()
            .map(|c| diagram.upsert_node(c.as_str(), NodeKind::Category))
            .collect();

        for (category, category_id) in SipocCategory::ALL.iter().zip(&category_ids) {
            let Some(answer) = record.get(category.as_str()) else {
                continue;
            };
            for item in answer.items() {
                let item_id = diagram.upsert_node(item, NodeKind::Item);
                diagram.edges.push(DiagramEdge {
                    from: item_id,
                    to: category_id.clone(),
                });
            }
        }

        for category in SipocCategory::ALL {
            if let Some(next) = category.next() {
                let from = diagram.node_id(NodeKind::Category, category.as_str());
                let to = diagram.node_id(NodeKind::Category, next.as_str());
                if let (Some(from), Some(to)) = (from, to) {
                    diagram.edges.push(DiagramEdge { from, to });
                }
            }
        }

        diagram
    }

    pub fn nodes(&self) -> &[DiagramNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[DiagramEdge] {
        &self.edges
    }

    pub fn node_id(&self, kind: NodeKind, label: &str) -> Option<String> {
        self.by_label
            .get(&(kind, label.to_string()))
            .map(|&i| self.nodes[i].id.clone())
    }

    /// Labels of the items attached to `category`, in edge order
    pub fn items_of(&self, category: SipocCategory) -> Vec<&str> {
        let Some(category_id) = self.node_id(NodeKind::Category, category.as_str()) else {
            return Vec::new();
        };
        self.edges
            .iter()
            .filter(|e| e.to == category_id)
            .filter_map(|e| self.nodes.iter().find(|n| n.id == e.from))
            .filter(|n| n.kind == NodeKind::Item)
            .map(|n| n.label.as_str())
            .collect()
    }

    fn upsert_node(&mut self, label: &str, kind: NodeKind) -> String {
        let key = (kind, label.to_string());
        if let Some(&index) = self.by_label.get(&key) {
            return self.nodes[index].id.clone();
        }
        let id = format!("n{}", self.nodes.len());
        self.by_label.insert(key, self.nodes.len());
        self.nodes.push(DiagramNode {
            id: id.clone(),
            label: label.to_string(),
            kind,
        });
        id
    }

    /// Graphviz DOT source for the diagram
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph SIPOC {\n");
        output.push_str("  rankdir=LR;\n");

        for node in &self.nodes {
            let style = match node.kind {
                NodeKind::Category => "shape=box, style=filled, fillcolor=lightgrey",
                NodeKind::Item => "shape=ellipse",
            };
            output.push_str(&format!(
                "  {} [label=\"{}\", {}];\n",
                node.id,
                escape_dot_string(&node.label),
                style
            ));
        }

        for edge in &self.edges {
            output.push_str(&format!("  {} -> {};\n", edge.from, edge.to));
        }

        output.push_str("}\n");
        output
    }
}

/// Escape quotes, backslashes and line breaks for a quoted DOT label
fn escape_dot_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Answer;

    fn record(entries: &[(&str, &[&str])]) -> AnswerRecord {
        let mut record = AnswerRecord::new();
        for (key, items) in entries {
            record.push(
                key.to_string(),
                Answer::List(items.iter().map(|s| s.to_string()).collect()),
            );
        }
        record
    }

    #[test]
    fn test_counts_match_items() {
        let record = record(&[
            ("Suppliers", &["Baggage handlers", "Ground staff"]),
            ("Inputs", &["Passenger baggage"]),
            ("Process", &["Check-in", "Sorting", "Loading"]),
            ("Outputs", &["Delivered baggage"]),
            ("Customers", &["Passengers", "Airline staff"]),
        ]);
        let diagram = SipocDiagram::build(&record);
        assert_eq!(diagram.nodes().len(), 5 + 9);
        assert_eq!(diagram.edges().len(), 9 + 4);
    }

    #[test]
    fn test_empty_category_still_present() {
        let diagram = SipocDiagram::build(&record(&[("Suppliers", &["Vendor"])]));
        assert_eq!(diagram.nodes().len(), 6);
        assert_eq!(diagram.edges().len(), 5);
        assert!(diagram.node_id(NodeKind::Category, "Customers").is_some());
        assert!(diagram.items_of(SipocCategory::Customers).is_empty());
    }

    #[test]
    fn test_category_chain_in_order() {
        let diagram = SipocDiagram::build(&AnswerRecord::new());
        let labels: Vec<(String, String)> = diagram
            .edges()
            .iter()
            .map(|e| {
                let label = |id: &str| {
                    diagram
                        .nodes()
                        .iter()
                        .find(|n| n.id == id)
                        .map(|n| n.label.clone())
                        .unwrap()
                };
                (label(&e.from), label(&e.to))
            })
            .collect();
        assert_eq!(
            labels,
            [
                ("Suppliers".to_string(), "Inputs".to_string()),
                ("Inputs".to_string(), "Process".to_string()),
                ("Process".to_string(), "Outputs".to_string()),
                ("Outputs".to_string(), "Customers".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_item_reuses_node() {
        let diagram = SipocDiagram::build(&record(&[
            ("Suppliers", &["Airline staff"]),
            ("Customers", &["Airline staff"]),
        ]));
        assert_eq!(diagram.nodes().len(), 6);
        assert_eq!(diagram.edges().len(), 2 + 4);
        assert_eq!(diagram.items_of(SipocCategory::Customers), ["Airline staff"]);
    }

    #[test]
    fn test_item_named_like_category_gets_own_node() {
        let diagram = SipocDiagram::build(&record(&[
            ("Suppliers", &["Process"]),
            ("Inputs", &["Bags"]),
            ("Process", &["Sort"]),
            ("Outputs", &["Bags out"]),
            ("Customers", &["Pax"]),
        ]));
        assert_eq!(diagram.nodes().len(), 5 + 5);
        assert_eq!(diagram.edges().len(), 5 + 4);
        assert_eq!(diagram.items_of(SipocCategory::Suppliers), ["Process"]);

        let item = diagram.node_id(NodeKind::Item, "Process").unwrap();
        let category = diagram.node_id(NodeKind::Category, "Process").unwrap();
        assert_ne!(item, category);

        let dot = diagram.to_dot();
        assert!(dot.contains(&format!("{item} -> n0;")));
        assert!(!dot.contains("n2 -> n0;"));
    }

    #[test]
    fn test_build_is_idempotent() {
        let record = record(&[("Inputs", &["Baggage", "", "Belts"])]);
        assert_eq!(SipocDiagram::build(&record), SipocDiagram::build(&record));
    }

    #[test]
    fn test_dot_output() {
        let diagram = SipocDiagram::build(&record(&[("Outputs", &["Say \"hi\""])]));
        let dot = diagram.to_dot();
        assert!(dot.starts_with("digraph SIPOC {"));
        assert!(dot.contains("rankdir=LR"));
        assert!(dot.contains(r#"[label="Say \"hi\"", shape=ellipse]"#));
        assert!(dot.contains("n5 -> n3;"));
        assert!(dot.contains("n0 -> n1;"));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(SipocCategory::parse(" process "), Some(SipocCategory::Process));
        assert_eq!(SipocCategory::parse("Vendors"), None);
    }
}
