//! Cross-table checks on a set of definitions.
//!
//! Dependencies are resolved against the live schema at run time, so a
//! target missing from the configuration is only a warning: something else
//! may create it. A cycle, on the other hand, can never resolve, because
//! every member waits for another member that is itself waiting.

use crate::report::finding::Finding;
use model::definition::TableDefinition;
use std::collections::{BTreeMap, HashMap};

type Graph = BTreeMap<String, Vec<String>>;

pub fn check_dependencies(definitions: &[TableDefinition]) -> Vec<Finding> {
    let tables: HashMap<&str, &TableDefinition> =
        definitions.iter().map(|def| (def.name(), def)).collect();
    let mut findings = Vec::new();

    let mut table_graph = Graph::new();
    let mut column_graph = Graph::new();

    for definition in definitions {
        let table = definition.name();

        for dependency in definition.depends() {
            if dependency == table {
                findings.push(Finding::self_dependency(table));
                continue;
            }
            if !tables.contains_key(dependency.as_str()) {
                findings.push(Finding::unknown_dependency(table, dependency));
            }
            table_graph
                .entry(table.to_string())
                .or_default()
                .push(dependency.clone());
        }

        for column in definition.columns() {
            for target in column.references() {
                let defined = tables.get(target.table.as_str()).is_some_and(|def| {
                    def.columns().iter().any(|c| c.name() == target.column)
                });
                if !defined {
                    findings.push(Finding::unknown_reference(
                        table,
                        column.name(),
                        &target.to_string(),
                    ));
                }
                column_graph
                    .entry(format!("{table}.{}", column.name()))
                    .or_default()
                    .push(target.to_string());
            }
        }
    }

    findings.extend(find_cycles(&table_graph).iter().map(|c| Finding::dependency_cycle(c)));
    findings.extend(find_cycles(&column_graph).iter().map(|c| Finding::reference_cycle(c)));
    findings
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Returns every cycle closed by a back edge of a depth-first walk, each as
/// the path from its first node back to itself.
fn find_cycles(graph: &Graph) -> Vec<Vec<String>> {
    let mut marks = HashMap::new();
    let mut stack = Vec::new();
    let mut cycles = Vec::new();

    for node in graph.keys() {
        if !marks.contains_key(node.as_str()) {
            visit(node, graph, &mut marks, &mut stack, &mut cycles);
        }
    }
    cycles
}

fn visit<'a>(
    node: &'a str,
    graph: &'a Graph,
    marks: &mut HashMap<&'a str, Mark>,
    stack: &mut Vec<&'a str>,
    cycles: &mut Vec<Vec<String>>,
) {
    marks.insert(node, Mark::Visiting);
    stack.push(node);

    for next in graph.get(node).into_iter().flatten() {
        match marks.get(next.as_str()) {
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|n| *n == next.as_str()).unwrap_or(0);
                let mut cycle: Vec<String> = stack[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(next.clone());
                cycles.push(cycle);
            }
            Some(Mark::Done) => {}
            None => visit(next, graph, marks, stack, cycles),
        }
    }

    stack.pop();
    marks.insert(node, Mark::Done);
}
