use std::cmp::Ordering;

use crate::model::{Edge, Orientation, PageLayout, RawTable, TextFragment};

pub(crate) const DEFAULT_SNAP_TOLERANCE: f32 = 3.0;
const MIN_EDGE_LENGTH: f32 = 3.0;

/// Disjoint-set over indices; the root of a set is always its smallest index.
#[derive(Debug)]
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, index: usize) -> usize {
        let mut root = index;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = index;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, left: usize, right: usize) {
        let left = self.find(left);
        let right = self.find(right);
        match left.cmp(&right) {
            Ordering::Less => self.parent[right] = left,
            Ordering::Greater => self.parent[left] = right,
            Ordering::Equal => {}
        }
    }
}

fn intersects(horizontal: &Edge, vertical: &Edge, tolerance: f32) -> bool {
    vertical.position >= horizontal.start - tolerance
        && vertical.position <= horizontal.end + tolerance
        && horizontal.position >= vertical.start - tolerance
        && horizontal.position <= vertical.end + tolerance
}

/// Clusters sorted positions that lie within `tolerance` of their neighbour
/// and returns each cluster's mean, ascending.
fn cluster_positions(mut values: Vec<f32>, tolerance: f32) -> Vec<f32> {
    values.sort_by(|left, right| left.partial_cmp(right).unwrap_or(Ordering::Equal));

    let mut clusters: Vec<Vec<f32>> = Vec::new();
    for value in values {
        match clusters.last_mut() {
            Some(cluster) if cluster.last().is_some_and(|last| value - last <= tolerance) => {
                cluster.push(value);
            }
            _ => clusters.push(vec![value]),
        }
    }

    clusters
        .iter()
        .map(|cluster| {
            #[allow(clippy::cast_precision_loss)]
            let len = cluster.len() as f32;
            cluster.iter().sum::<f32>() / len
        })
        .collect()
}

/// Groups edges into connected components of crossing ruling lines.
fn edge_components(edges: &[Edge], tolerance: f32) -> Vec<Vec<Edge>> {
    let mut sets = DisjointSet::new(edges.len());
    let mut touched = vec![false; edges.len()];

    for (left_index, left) in edges.iter().enumerate() {
        if left.orientation != Orientation::Horizontal {
            continue;
        }
        for (right_index, right) in edges.iter().enumerate() {
            if right.orientation == Orientation::Vertical && intersects(left, right, tolerance) {
                sets.union(left_index, right_index);
                touched[left_index] = true;
                touched[right_index] = true;
            }
        }
    }

    let mut components: Vec<(usize, Vec<Edge>)> = Vec::new();
    for (index, edge) in edges.iter().enumerate() {
        if !touched[index] {
            continue;
        }
        let root = sets.find(index);
        match components.iter_mut().find(|(candidate, _)| *candidate == root) {
            Some((_, members)) => members.push(*edge),
            None => components.push((root, vec![*edge])),
        }
    }

    components.into_iter().map(|(_, members)| members).collect()
}

struct Lattice<'a> {
    edges: &'a [Edge],
    /// Column boundaries, left to right.
    xs: Vec<f32>,
    /// Row boundaries, top to bottom.
    ys: Vec<f32>,
    tolerance: f32,
}

impl Lattice<'_> {
    fn row_count(&self) -> usize {
        self.ys.len() - 1
    }

    fn column_count(&self) -> usize {
        self.xs.len() - 1
    }

    fn has_edge(&self, orientation: Orientation, position: f32, along: f32) -> bool {
        self.edges.iter().any(|edge| {
            edge.orientation == orientation
                && (edge.position - position).abs() <= self.tolerance
                && along >= edge.start - self.tolerance
                && along <= edge.end + self.tolerance
        })
    }

    fn top(&self) -> f32 {
        self.ys[0]
    }

    fn left(&self) -> f32 {
        self.xs[0]
    }

    /// Row and column of the sub-cell containing the point, if inside.
    fn locate(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        let column = self.xs.windows(2).position(|pair| x >= pair[0] && x < pair[1])?;
        let row = self.ys.windows(2).position(|pair| y <= pair[0] && y > pair[1])?;
        Some((row, column))
    }

    /// Merges sub-cells that are not separated by a ruling line.
    fn regions(&self) -> DisjointSet {
        let columns = self.column_count();
        let rows = self.row_count();
        let mut sets = DisjointSet::new(rows * columns);

        for row in 0..rows {
            let middle_y = (self.ys[row] + self.ys[row + 1]) / 2.0;
            for column in 0..columns {
                let middle_x = (self.xs[column] + self.xs[column + 1]) / 2.0;
                let index = row * columns + column;
                if column + 1 < columns
                    && !self.has_edge(Orientation::Vertical, self.xs[column + 1], middle_y)
                {
                    sets.union(index, index + 1);
                }
                if row + 1 < rows
                    && !self.has_edge(Orientation::Horizontal, self.ys[row + 1], middle_x)
                {
                    sets.union(index, index + columns);
                }
            }
        }

        sets
    }

    fn into_table(self, fragments: &[TextFragment]) -> RawTable {
        let columns = self.column_count();
        let rows = self.row_count();
        let mut regions = self.regions();

        let mut contents: Vec<Vec<&TextFragment>> = vec![Vec::new(); rows * columns];
        for fragment in fragments {
            let (x, y) = fragment.anchor();
            if let Some((row, column)) = self.locate(x, y) {
                let root = regions.find(row * columns + column);
                contents[root].push(fragment);
            }
        }

        let rows = (0..rows)
            .map(|row| {
                (0..columns)
                    .map(|column| {
                        let index = row * columns + column;
                        (regions.find(index) == index).then(|| join_fragments(&contents[index]))
                    })
                    .collect()
            })
            .collect();

        RawTable { rows }
    }
}

/// Joins a cell's fragments in reading order: spaces within a line, `\n`
/// between lines.
fn join_fragments(fragments: &[&TextFragment]) -> String {
    let mut ordered = fragments.to_vec();
    ordered.sort_by(|left, right| {
        right
            .y
            .partial_cmp(&left.y)
            .unwrap_or(Ordering::Equal)
            .then(left.x.partial_cmp(&right.x).unwrap_or(Ordering::Equal))
    });

    let mut lines: Vec<(f32, Vec<&str>)> = Vec::new();
    for fragment in ordered {
        let same_line = lines
            .last()
            .is_some_and(|(baseline, _)| (baseline - fragment.y).abs() <= fragment.size * 0.5);
        if same_line {
            if let Some((_, words)) = lines.last_mut() {
                words.push(fragment.text.trim());
            }
        } else {
            lines.push((fragment.y, vec![fragment.text.trim()]));
        }
    }

    lines
        .iter()
        .map(|(_, words)| words.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Detects ruled tables on one page, ordered top to bottom, then left to
/// right. Single-cell boxes (frames around titles or logos) are ignored.
pub(crate) fn detect_tables(layout: &PageLayout, tolerance: f32) -> Vec<RawTable> {
    let edges = layout
        .edges
        .iter()
        .filter(|edge| edge.length() >= MIN_EDGE_LENGTH)
        .copied()
        .collect::<Vec<_>>();

    let mut lattices = edge_components(&edges, tolerance)
        .into_iter()
        .filter_map(|component| {
            let positions = |orientation| {
                component
                    .iter()
                    .filter(|edge| edge.orientation == orientation)
                    .map(|edge| edge.position)
                    .collect::<Vec<_>>()
            };
            let xs = cluster_positions(positions(Orientation::Vertical), tolerance);
            let mut ys = cluster_positions(positions(Orientation::Horizontal), tolerance);
            ys.reverse();
            if xs.len() < 2 || ys.len() < 2 || (xs.len() == 2 && ys.len() == 2) {
                return None;
            }
            Some((component, xs, ys))
        })
        .collect::<Vec<_>>();

    lattices.sort_by(|(_, left_xs, left_ys), (_, right_xs, right_ys)| {
        right_ys[0]
            .partial_cmp(&left_ys[0])
            .unwrap_or(Ordering::Equal)
            .then(left_xs[0].partial_cmp(&right_xs[0]).unwrap_or(Ordering::Equal))
    });

    lattices
        .iter()
        .map(|(component, xs, ys)| {
            let lattice = Lattice {
                edges: component,
                xs: xs.clone(),
                ys: ys.clone(),
                tolerance,
            };
            tracing::trace!(
                page = layout.page_number,
                top = lattice.top(),
                left = lattice.left(),
                rows = lattice.row_count(),
                columns = lattice.column_count(),
                "lattice table detected"
            );
            lattice.into_table(&layout.fragments)
        })
        .collect()
}
