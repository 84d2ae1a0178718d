use std::collections::{HashMap, HashSet};

use log::debug;

use crate::records::PedigreeRecord;

/// One placed individual: its id plus the resolved parent ids (0, 1 or 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelEntry {
    pub id: String,
    pub parents: Vec<String>,
}

/// Ordered generation levels, level 0 topmost. Every reachable individual
/// appears in exactly one level; the rest end up in `dropped`.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    pub levels: Vec<Vec<LevelEntry>>,
    pub dropped: Vec<String>,
}

impl Hierarchy {
    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(|level| level.is_empty())
    }

    pub fn individual_count(&self) -> usize {
        self.levels.iter().map(|level| level.len()).sum()
    }
}

/// Converts an unordered flat record list into generation levels.
///
/// A spine is grown breadth-first from the deepest founder, then stragglers
/// (spouses married in, in-law parents, children seen before their parents)
/// are attached by repeated repair scans until a full scan makes no progress.
pub fn build_hierarchy(records: &[PedigreeRecord]) -> Hierarchy {
    if records.is_empty() {
        return Hierarchy::default();
    }

    let index: HashMap<&str, usize> = records
        .iter()
        .enumerate()
        .map(|(idx, record)| (record.individual_id.as_str(), idx))
        .collect();

    // children[i] = records whose paternal or maternal id is records[i],
    // in input order. parents[i] = resolved parent indices, dangling skipped.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut parents: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    for (child_idx, record) in records.iter().enumerate() {
        for parent_id in record.parent_ids() {
            let Some(&parent_idx) = index.get(parent_id) else {
                continue;
            };
            if parent_idx == child_idx {
                continue;
            }
            children[parent_idx].push(child_idx);
            if !parents[child_idx].contains(&parent_idx) {
                parents[child_idx].push(parent_idx);
            }
        }
    }

    let mut placed: Vec<Option<usize>> = vec![None; records.len()];
    let mut levels: Vec<Vec<usize>> = Vec::new();

    if let Some(root) = choose_root(records, &children) {
        debug!(
            "pedigree root: {} (depth {})",
            records[root].individual_id,
            descendant_depth(root, &children)
        );
        build_spine(root, &children, &mut levels, &mut placed);
    }

    repair_stragglers(records, &children, &parents, &mut levels, &mut placed);

    let dropped: Vec<String> = records
        .iter()
        .enumerate()
        .filter(|(idx, _)| placed[*idx].is_none())
        .map(|(_, record)| record.individual_id.clone())
        .collect();
    if !dropped.is_empty() {
        debug!("unplaceable individuals dropped from layout: {dropped:?}");
    }

    let placed_set: HashSet<&str> = records
        .iter()
        .enumerate()
        .filter(|(idx, _)| placed[*idx].is_some())
        .map(|(_, record)| (record.individual_id.as_str()))
        .collect();

    let levels = levels
        .into_iter()
        .map(|level| {
            level
                .into_iter()
                .map(|idx| {
                    let record = &records[idx];
                    let parents = record
                        .parent_ids()
                        .filter(|id| *id != record.individual_id && placed_set.contains(id))
                        .map(str::to_string)
                        .collect();
                    LevelEntry {
                        id: record.individual_id.clone(),
                        parents,
                    }
                })
                .collect()
        })
        .collect();

    Hierarchy { levels, dropped }
}

/// Deepest founder wins; ties break toward the lexicographically smallest id
/// so multi-root pedigrees lay out the same way every time.
fn choose_root(records: &[PedigreeRecord], children: &[Vec<usize>]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (idx, record) in records.iter().enumerate() {
        if !record.is_founder() {
            continue;
        }
        let depth = descendant_depth(idx, children);
        let replace = match best {
            None => true,
            Some((best_idx, best_depth)) => {
                depth > best_depth
                    || (depth == best_depth
                        && records[idx].individual_id < records[best_idx].individual_id)
            }
        };
        if replace {
            best = Some((idx, depth));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Depth of the descendant tree under `root`: childless = 1. Memoized, and
/// nodes currently on the recursion stack count as 0 so cyclic ancestry
/// terminates instead of recursing forever.
fn descendant_depth(root: usize, children: &[Vec<usize>]) -> usize {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Unvisited,
        OnStack,
        Done,
    }

    fn walk(idx: usize, children: &[Vec<usize>], memo: &mut [usize], state: &mut [State]) -> usize {
        match state[idx] {
            State::Done => return memo[idx],
            State::OnStack => return 0,
            State::Unvisited => {}
        }
        state[idx] = State::OnStack;
        let mut deepest = 0;
        for &child in &children[idx] {
            deepest = deepest.max(walk(child, children, memo, state));
        }
        memo[idx] = deepest + 1;
        state[idx] = State::Done;
        memo[idx]
    }

    let mut memo = vec![0usize; children.len()];
    let mut state = vec![State::Unvisited; children.len()];
    walk(root, children, &mut memo, &mut state)
}

/// Breadth-first spine: level 0 is the root, level k+1 the unplaced children
/// of level k. Spouses and anyone unreachable from the root are left for the
/// repair pass.
fn build_spine(
    root: usize,
    children: &[Vec<usize>],
    levels: &mut Vec<Vec<usize>>,
    placed: &mut [Option<usize>],
) {
    let mut frontier = vec![root];
    placed[root] = Some(0);
    while !frontier.is_empty() {
        levels.push(frontier.clone());
        let mut next = Vec::new();
        for &idx in &frontier {
            for &child in &children[idx] {
                if placed[child].is_none() {
                    placed[child] = Some(levels.len());
                    next.push(child);
                }
            }
        }
        frontier = next;
    }
}

/// Repeatedly scans unplaced individuals and attaches each by the first rule
/// that applies: spouse (co-parent of a placed partner, inserted right after
/// them), parent (all children placed, one level above the shallowest), or
/// child (one level below the deepest placed parent). Stops at fixpoint.
fn repair_stragglers(
    records: &[PedigreeRecord],
    children: &[Vec<usize>],
    parents: &[Vec<usize>],
    levels: &mut Vec<Vec<usize>>,
    placed: &mut [Option<usize>],
) {
    loop {
        let mut progress = false;
        for idx in 0..records.len() {
            if placed[idx].is_some() {
                continue;
            }
            if attach_as_spouse(idx, children, parents, levels, placed)
                || attach_as_parent(idx, children, levels, placed)
                || attach_as_child(idx, parents, levels, placed)
            {
                progress = true;
            }
        }
        if !progress {
            break;
        }
    }
}

fn attach_as_spouse(
    idx: usize,
    children: &[Vec<usize>],
    parents: &[Vec<usize>],
    levels: &mut [Vec<usize>],
    placed: &mut [Option<usize>],
) -> bool {
    for &child in &children[idx] {
        for &partner in &parents[child] {
            if partner == idx {
                continue;
            }
            let Some(level) = placed[partner] else {
                continue;
            };
            let row = &mut levels[level];
            let position = row
                .iter()
                .position(|&node| node == partner)
                .map(|pos| pos + 1)
                .unwrap_or(row.len());
            row.insert(position, idx);
            placed[idx] = Some(level);
            return true;
        }
    }
    false
}

fn attach_as_parent(
    idx: usize,
    children: &[Vec<usize>],
    levels: &mut Vec<Vec<usize>>,
    placed: &mut [Option<usize>],
) -> bool {
    if children[idx].is_empty() {
        return false;
    }
    let mut shallowest: Option<usize> = None;
    for &child in &children[idx] {
        let Some(level) = placed[child] else {
            return false;
        };
        shallowest = Some(shallowest.map_or(level, |current| current.min(level)));
    }
    let child_level = shallowest.expect("children checked non-empty");
    let target = if child_level == 0 {
        // The spine root already owns level 0; in-law parents above it get a
        // fresh topmost generation.
        levels.insert(0, Vec::new());
        for slot in placed.iter_mut() {
            if let Some(level) = slot {
                *level += 1;
            }
        }
        0
    } else {
        child_level - 1
    };
    levels[target].push(idx);
    placed[idx] = Some(target);
    true
}

fn attach_as_child(
    idx: usize,
    parents: &[Vec<usize>],
    levels: &mut Vec<Vec<usize>>,
    placed: &mut [Option<usize>],
) -> bool {
    let deepest = parents[idx]
        .iter()
        .filter_map(|&parent| placed[parent])
        .max();
    let Some(parent_level) = deepest else {
        return false;
    };
    let target = parent_level + 1;
    if target == levels.len() {
        levels.push(Vec::new());
    }
    levels[target].push(idx);
    placed[idx] = Some(target);
    true
}
