use std::collections::{HashMap, HashSet};

use colored::{ColoredString, Colorize};
use thiserror::Error;

use crate::case::{Suite, TestCase};
use crate::errors::Advice;
use crate::logging;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("test case '{id}' is declared more than once")]
    DuplicateCase { id: String },
    #[error("'{dependent}' depends on unknown test case '{prerequisite}'")]
    UnknownPrerequisite {
        dependent: String,
        prerequisite: String,
    },
    #[error("dependency cycle between test cases: {}", cycle.join(" -> "))]
    Cycle { cycle: Vec<String> },
    #[error("selected test case '{id}' does not exist")]
    UnknownSelection { id: String },
}

impl Advice for SchedulingError {
    fn advice(&self) -> Option<ColoredString> {
        match self {
            SchedulingError::UnknownPrerequisite { prerequisite, .. } => Some(
                format!("Add '{}' to the suite or fix the declared id.", prerequisite).yellow(),
            ),
            SchedulingError::Cycle { .. } => {
                Some("A test case cannot depend, even indirectly, on itself.".yellow())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Marked(String),
    Ids(Vec<String>),
}

impl Selection {
    fn selects(&self, case: &TestCase) -> bool {
        match self {
            Selection::All => true,
            Selection::Marked(mark) => case.has_mark(mark),
            Selection::Ids(ids) => ids.iter().any(|id| id == case.id()),
        }
    }
}

/// Execution order of a suite: every prerequisite comes before its dependents,
/// otherwise cases keep their declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    ids: Vec<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    InProgress,
    Done,
}

impl Plan {
    pub fn build(
        suite: &Suite,
        selection: &Selection,
        resolve_prerequisites: bool,
    ) -> Result<Self, SchedulingError> {
        let cases = suite.cases();

        let mut index: HashMap<&str, usize> = HashMap::new();
        for (position, case) in cases.iter().enumerate() {
            if index.insert(case.id(), position).is_some() {
                return Err(SchedulingError::DuplicateCase {
                    id: case.id().to_string(),
                });
            }
        }

        let mut edges: Vec<Vec<usize>> = Vec::with_capacity(cases.len());
        for case in cases {
            let mut prerequisites = Vec::new();
            for dependence in case.dependencies() {
                let prerequisite = index.get(dependence.prerequisite.as_str()).ok_or_else(|| {
                    SchedulingError::UnknownPrerequisite {
                        dependent: case.id().to_string(),
                        prerequisite: dependence.prerequisite.clone(),
                    }
                })?;
                if !prerequisites.contains(prerequisite) {
                    prerequisites.push(*prerequisite);
                }
            }
            edges.push(prerequisites);
        }

        if let Selection::Ids(ids) = selection {
            if let Some(unknown) = ids.iter().find(|id| !index.contains_key(id.as_str())) {
                return Err(SchedulingError::UnknownSelection {
                    id: unknown.clone(),
                });
            }
        }

        let mut order = Vec::with_capacity(cases.len());
        let mut visits: HashMap<usize, Visit> = HashMap::new();
        let mut path = Vec::new();
        for position in 0..cases.len() {
            visit(position, &edges, &mut visits, &mut path, &mut order, suite)?;
        }

        let mut selected: HashSet<usize> = (0..cases.len())
            .filter(|position| selection.selects(&cases[*position]))
            .collect();
        if resolve_prerequisites {
            let mut pending: Vec<usize> = selected.iter().copied().collect();
            while let Some(position) = pending.pop() {
                for prerequisite in &edges[position] {
                    if selected.insert(*prerequisite) {
                        logging::debug!(
                            "'{}' added to the run as prerequisite of '{}'",
                            cases[*prerequisite].id(),
                            cases[position].id()
                        );
                        pending.push(*prerequisite);
                    }
                }
            }
        }

        let ids: Vec<String> = order
            .into_iter()
            .filter(|position| selected.contains(position))
            .map(|position| cases[position].id().to_string())
            .collect();
        logging::trace!("Execution plan: {}", ids.join(", "));
        Ok(Plan { ids })
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|planned| planned == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

fn visit(
    position: usize,
    edges: &[Vec<usize>],
    visits: &mut HashMap<usize, Visit>,
    path: &mut Vec<usize>,
    order: &mut Vec<usize>,
    suite: &Suite,
) -> Result<(), SchedulingError> {
    match visits.get(&position) {
        Some(Visit::Done) => return Ok(()),
        Some(Visit::InProgress) => {
            let start = path.iter().position(|p| *p == position).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..]
                .iter()
                .map(|p| suite.cases()[*p].id().to_string())
                .collect();
            cycle.push(suite.cases()[position].id().to_string());
            return Err(SchedulingError::Cycle { cycle });
        }
        None => {}
    }

    visits.insert(position, Visit::InProgress);
    path.push(position);
    for prerequisite in &edges[position] {
        visit(*prerequisite, edges, visits, path, order, suite)?;
    }
    path.pop();
    visits.insert(position, Visit::Done);
    order.push(position);
    Ok(())
}
