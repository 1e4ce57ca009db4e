//! Elementary cycle enumeration
//!
//! Johnson's algorithm: split the graph into strongly connected components,
//! enumerate the circuits through one start node of each component with the
//! blocked-set bookkeeping, then drop that node and repeat on what remains.
//! Running time is proportional to (nodes + edges) * (cycles + 1), which is
//! why the enumeration is capped by [`CycleLimits`].

use super::DependencyGraph;
use crate::reference::NodeId;
use ahash::{AHashMap, AHashSet};
use std::time::{Duration, Instant};

/// Bounds on cycle enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CycleLimits {
    /// Stop after this many cycles (0 = no limit)
    pub max_cycles: usize,
    /// Stop after this much wall-clock time in milliseconds (`None` = no limit)
    pub time_budget_ms: Option<u64>,
    /// How many cycles to keep as samples
    pub sample_limit: usize,
}

impl Default for CycleLimits {
    fn default() -> Self {
        Self {
            max_cycles: 100_000,
            time_budget_ms: Some(10_000),
            sample_limit: 5,
        }
    }
}

impl CycleLimits {
    /// No limits at all
    pub fn unbounded() -> Self {
        Self {
            max_cycles: 0,
            time_budget_ms: None,
            sample_limit: 5,
        }
    }
}

/// Result of cycle enumeration
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CycleReport {
    /// Elementary cycles found; a lower bound when `truncated` is set
    pub count: usize,
    /// Enumeration stopped at a limit
    pub truncated: bool,
    /// The first cycles found, each listed in dependency order
    pub samples: Vec<Vec<NodeId>>,
}

/// Count the elementary cycles of `graph`, self-loops included.
pub fn find_cycles(graph: &DependencyGraph, limits: &CycleLimits) -> CycleReport {
    let n = graph.node_count();
    let mut sink = CycleSink::new(graph, limits);

    // Self-loops are cycles of length one; the search below ignores them.
    for v in 0..n {
        if graph.successors_of(v).contains(&v) {
            sink.record(&[v]);
            if sink.should_stop() {
                return sink.finish();
            }
        }
    }

    let successors: Vec<Vec<usize>> = (0..n)
        .map(|v| {
            graph
                .successors_of(v)
                .iter()
                .copied()
                .filter(|&w| w != v)
                .collect()
        })
        .collect();

    let mut member = vec![true; n];
    let all: Vec<usize> = (0..n).collect();
    let mut pending: Vec<Vec<usize>> = strongly_connected(&successors, &all, &member)
        .into_iter()
        .filter(|c| c.len() > 1)
        .collect();
    member.iter_mut().for_each(|m| *m = false);

    while let Some(component) = pending.pop() {
        for &v in &component {
            member[v] = true;
        }

        let start = component[0];
        circuits_from(start, &successors, &member, &mut sink);
        if sink.should_stop() {
            break;
        }

        member[start] = false;
        let rest = &component[1..];
        pending.extend(
            strongly_connected(&successors, rest, &member)
                .into_iter()
                .filter(|c| c.len() > 1),
        );

        for &v in &component {
            member[v] = false;
        }
    }

    sink.finish()
}

struct CycleSink<'g> {
    graph: &'g DependencyGraph,
    limits: &'g CycleLimits,
    deadline: Option<Instant>,
    steps: u32,
    report: CycleReport,
}

impl<'g> CycleSink<'g> {
    fn new(graph: &'g DependencyGraph, limits: &'g CycleLimits) -> Self {
        Self {
            graph,
            limits,
            deadline: limits
                .time_budget_ms
                .map(|ms| Instant::now() + Duration::from_millis(ms)),
            steps: 0,
            report: CycleReport::default(),
        }
    }

    fn record(&mut self, path: &[usize]) {
        self.report.count += 1;
        if self.report.samples.len() < self.limits.sample_limit {
            self.report
                .samples
                .push(path.iter().map(|&v| self.graph.id_of(v).clone()).collect());
        }
    }

    fn should_stop(&mut self) -> bool {
        if self.report.truncated {
            return true;
        }
        if self.limits.max_cycles > 0 && self.report.count >= self.limits.max_cycles {
            self.report.truncated = true;
            return true;
        }
        self.steps = self.steps.wrapping_add(1);
        if let Some(deadline) = self.deadline {
            if self.steps % 1024 == 0 && Instant::now() >= deadline {
                self.report.truncated = true;
                return true;
            }
        }
        false
    }

    fn finish(self) -> CycleReport {
        if self.report.truncated {
            tracing::warn!(
                cycles = self.report.count,
                "cycle enumeration stopped at its limit; count is a lower bound"
            );
        }
        self.report
    }
}

/// Circuits through `start` inside the component marked in `member`
fn circuits_from(
    start: usize,
    successors: &[Vec<usize>],
    member: &[bool],
    sink: &mut CycleSink<'_>,
) {
    let mut path = vec![start];
    let mut blocked: AHashSet<usize> = AHashSet::default();
    let mut closed: AHashSet<usize> = AHashSet::default();
    let mut blocked_by: AHashMap<usize, AHashSet<usize>> = AHashMap::default();
    // (node, position of the next successor to try)
    let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
    blocked.insert(start);

    while let Some(frame) = stack.last_mut() {
        if sink.should_stop() {
            return;
        }

        let node = frame.0;
        let next = successors[node][frame.1..]
            .iter()
            .position(|&w| member[w])
            .map(|offset| frame.1 + offset);

        if let Some(pos) = next {
            frame.1 = pos + 1;
            let w = successors[node][pos];
            if w == start {
                sink.record(&path);
                closed.extend(path.iter().copied());
            } else if !blocked.contains(&w) {
                path.push(w);
                stack.push((w, 0));
                closed.remove(&w);
                blocked.insert(w);
            }
            continue;
        }

        // All successors of `node` explored
        if closed.contains(&node) {
            unblock(node, &mut blocked, &mut blocked_by);
        } else {
            for &w in successors[node].iter().filter(|&&w| member[w]) {
                blocked_by.entry(w).or_default().insert(node);
            }
        }
        stack.pop();
        path.pop();
    }
}

fn unblock(
    node: usize,
    blocked: &mut AHashSet<usize>,
    blocked_by: &mut AHashMap<usize, AHashSet<usize>>,
) {
    let mut stack = vec![node];
    while let Some(n) = stack.pop() {
        if blocked.remove(&n) {
            if let Some(waiting) = blocked_by.remove(&n) {
                stack.extend(waiting);
            }
        }
    }
}

/// Tarjan's strongly connected components over `nodes`, following only
/// edges into nodes marked in `member`. Iterative to survive long chains.
fn strongly_connected(
    successors: &[Vec<usize>],
    nodes: &[usize],
    member: &[bool],
) -> Vec<Vec<usize>> {
    let mut index_of: AHashMap<usize, usize> = AHashMap::default();
    let mut lowlink: AHashMap<usize, usize> = AHashMap::default();
    let mut on_stack: AHashSet<usize> = AHashSet::default();
    let mut stack: Vec<usize> = Vec::new();
    let mut components = Vec::new();
    let mut next_index = 0usize;

    for &root in nodes {
        if !member[root] || index_of.contains_key(&root) {
            continue;
        }

        index_of.insert(root, next_index);
        lowlink.insert(root, next_index);
        next_index += 1;
        stack.push(root);
        on_stack.insert(root);
        let mut call_stack: Vec<(usize, usize)> = vec![(root, 0)];

        while let Some(frame) = call_stack.last_mut() {
            let v = frame.0;
            if frame.1 < successors[v].len() {
                let w = successors[v][frame.1];
                frame.1 += 1;
                if !member[w] {
                    continue;
                }
                match index_of.get(&w).copied() {
                    None => {
                        index_of.insert(w, next_index);
                        lowlink.insert(w, next_index);
                        next_index += 1;
                        stack.push(w);
                        on_stack.insert(w);
                        call_stack.push((w, 0));
                    }
                    Some(w_index) if on_stack.contains(&w) => {
                        let low = lowlink.entry(v).or_insert(w_index);
                        *low = (*low).min(w_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            call_stack.pop();
            let v_low = lowlink.get(&v).copied().unwrap_or(usize::MAX);
            if let Some(&(parent, _)) = call_stack.last() {
                let low = lowlink.entry(parent).or_insert(v_low);
                *low = (*low).min(v_low);
            }

            if Some(&v_low) == index_of.get(&v) {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack.remove(&w);
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                component.reverse();
                components.push(component);
            }
        }
    }

    components
}
