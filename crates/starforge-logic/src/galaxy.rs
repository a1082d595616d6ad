//! Procedural galaxy topology: system placement, wormhole graph, planets.
//!
//! Algorithm:
//! 1. Rejection-sample integer coordinates in `[-bound, bound]` with a
//!    minimum pairwise distance. Every 1000 consecutive rejections the
//!    minimum halves (never below [`MIN_DISTANCE_FLOOR`]).
//! 2. Prim's minimum spanning tree over Euclidean distance gives exactly
//!    `N-1` wormholes and full connectivity.
//! 3. Each system then draws a target degree and gains random extra edges
//!    until it reaches it (no self-loops, no duplicates, 100 attempts each).
//! 4. Each system receives 1-4 planets of random size and type.
//!
//! Output is index-based; persisting it is the caller's job.

use crate::geometry::Point;
use crate::grid::PlanetType;
use crate::names;
use rand::Rng;
use std::collections::{HashSet, VecDeque};

/// Relaxation never shrinks the minimum distance below this.
pub const MIN_DISTANCE_FLOOR: f64 = 10.0;

const FAILURES_BEFORE_RELAX: u32 = 1000;
const EXTRA_EDGE_ATTEMPTS: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct GalaxyParams {
    pub system_count: usize,
    pub coordinate_bound: i32,
    pub min_system_distance: f64,
    pub min_planets_per_system: u32,
    pub max_planets_per_system: u32,
    pub min_wormholes_per_system: u32,
    pub max_wormholes_per_system: u32,
    pub min_planet_size: u32,
    pub max_planet_size: u32,
}

impl Default for GalaxyParams {
    fn default() -> Self {
        Self {
            system_count: 10,
            coordinate_bound: 1000,
            min_system_distance: 50.0,
            min_planets_per_system: 1,
            max_planets_per_system: 4,
            min_wormholes_per_system: 1,
            max_wormholes_per_system: 4,
            min_planet_size: 3,
            max_planet_size: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanetSeed {
    pub name: String,
    pub size: u32,
    pub planet_type: PlanetType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemSeed {
    pub name: String,
    pub position: Point,
    pub planets: Vec<PlanetSeed>,
}

/// A generated galaxy. Wormholes reference systems by index.
#[derive(Debug, Clone, PartialEq)]
pub struct GalaxyLayout {
    pub systems: Vec<SystemSeed>,
    /// Undirected edges, each stored once with the lower index first.
    pub wormholes: Vec<(usize, usize)>,
    /// How many leading entries of `wormholes` form the spanning tree.
    pub spanning_edges: usize,
}

impl GalaxyLayout {
    pub fn extra_edges(&self) -> usize {
        self.wormholes.len() - self.spanning_edges
    }

    pub fn is_connected(&self) -> bool {
        is_connected(self.systems.len(), &self.wormholes)
    }
}

pub fn generate_galaxy(params: &GalaxyParams, rng: &mut impl Rng) -> GalaxyLayout {
    let positions = place_systems(params, rng);
    let mut wormholes = minimum_spanning_tree(&positions);
    let spanning_edges = wormholes.len();
    add_extra_edges(&mut wormholes, positions.len(), params, rng);

    let systems = positions
        .into_iter()
        .map(|position| {
            let name = names::system_name(rng);
            let planets = generate_planets(&name, params, rng);
            SystemSeed {
                name,
                position,
                planets,
            }
        })
        .collect();

    GalaxyLayout {
        systems,
        wormholes,
        spanning_edges,
    }
}

fn place_systems(params: &GalaxyParams, rng: &mut impl Rng) -> Vec<Point> {
    let bound = params.coordinate_bound.max(1);
    let mut min_distance = params.min_system_distance.max(MIN_DISTANCE_FLOOR);
    let mut placed: Vec<Point> = Vec::with_capacity(params.system_count);
    let mut failures = 0u32;

    while placed.len() < params.system_count {
        let candidate = Point::new(
            rng.gen_range(-bound..=bound) as f64,
            rng.gen_range(-bound..=bound) as f64,
        );
        if placed.iter().all(|p| p.distance_to(candidate) >= min_distance) {
            placed.push(candidate);
            failures = 0;
            continue;
        }
        failures += 1;
        if failures >= FAILURES_BEFORE_RELAX {
            min_distance = (min_distance / 2.0).max(MIN_DISTANCE_FLOOR);
            failures = 0;
        }
    }
    placed
}

/// Prim's algorithm over the complete Euclidean graph, O(n²).
pub fn minimum_spanning_tree(points: &[Point]) -> Vec<(usize, usize)> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut parent = vec![usize::MAX; n];
    let mut edges = Vec::with_capacity(n - 1);

    best[0] = 0.0;
    for _ in 0..n {
        let next = (0..n)
            .filter(|&i| !in_tree[i])
            .min_by(|&a, &b| best[a].total_cmp(&best[b]));
        let Some(u) = next else { break };
        in_tree[u] = true;
        if parent[u] != usize::MAX {
            edges.push(ordered(parent[u], u));
        }
        for v in 0..n {
            if in_tree[v] {
                continue;
            }
            let d = points[u].distance_to(points[v]);
            if d < best[v] {
                best[v] = d;
                parent[v] = u;
            }
        }
    }
    edges
}

fn add_extra_edges(
    edges: &mut Vec<(usize, usize)>,
    n: usize,
    params: &GalaxyParams,
    rng: &mut impl Rng,
) {
    if n < 2 {
        return;
    }
    let mut seen: HashSet<(usize, usize)> = edges.iter().copied().collect();
    let mut degree = vec![0u32; n];
    for &(a, b) in edges.iter() {
        degree[a] += 1;
        degree[b] += 1;
    }

    let lo = params.min_wormholes_per_system;
    let hi = params.max_wormholes_per_system.max(lo);
    for i in 0..n {
        let target = rng.gen_range(lo..=hi);
        let needed = target.saturating_sub(degree[i]);
        for _ in 0..needed {
            for _ in 0..EXTRA_EDGE_ATTEMPTS {
                let j = rng.gen_range(0..n);
                if j == i {
                    continue;
                }
                let edge = ordered(i, j);
                if seen.insert(edge) {
                    edges.push(edge);
                    degree[i] += 1;
                    degree[j] += 1;
                    break;
                }
            }
        }
    }
}

fn generate_planets(system_name: &str, params: &GalaxyParams, rng: &mut impl Rng) -> Vec<PlanetSeed> {
    let lo = params.min_planets_per_system.max(1);
    let hi = params.max_planets_per_system.max(lo);
    let count = rng.gen_range(lo..=hi) as usize;
    let size_hi = params.max_planet_size.max(params.min_planet_size);
    (0..count)
        .map(|i| PlanetSeed {
            name: names::planet_name(system_name, i),
            size: rng.gen_range(params.min_planet_size..=size_hi),
            planet_type: PlanetType::ALL[rng.gen_range(0..PlanetType::ALL.len())],
        })
        .collect()
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// BFS reachability from node 0 over undirected edges.
pub fn is_connected(node_count: usize, edges: &[(usize, usize)]) -> bool {
    if node_count <= 1 {
        return true;
    }
    let mut adjacency = vec![Vec::new(); node_count];
    for &(a, b) in edges {
        if a < node_count && b < node_count {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
    }
    let mut visited = vec![false; node_count];
    let mut queue = VecDeque::from([0usize]);
    visited[0] = true;
    let mut reached = 1;
    while let Some(u) = queue.pop_front() {
        for &v in &adjacency[u] {
            if !visited[v] {
                visited[v] = true;
                reached += 1;
                queue.push_back(v);
            }
        }
    }
    reached == node_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_mst_on_line() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(200.0, 0.0),
        ];
        let mst = minimum_spanning_tree(&pts);
        assert_eq!(mst.len(), 2);
        assert!(mst.contains(&(0, 1)));
        assert!(mst.contains(&(1, 2)));
    }

    #[test]
    fn test_single_system_has_no_wormholes() {
        let params = GalaxyParams {
            system_count: 1,
            ..Default::default()
        };
        let layout = generate_galaxy(&params, &mut StdRng::seed_from_u64(1));
        assert_eq!(layout.systems.len(), 1);
        assert!(layout.wormholes.is_empty());
    }

    #[test]
    fn test_same_seed_same_galaxy() {
        let params = GalaxyParams::default();
        let a = generate_galaxy(&params, &mut StdRng::seed_from_u64(42));
        let b = generate_galaxy(&params, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_relaxation_terminates_when_crowded() {
        // 200 systems with a 500-unit spacing cannot fit; relaxation must kick in.
        let params = GalaxyParams {
            system_count: 200,
            min_system_distance: 500.0,
            ..Default::default()
        };
        let layout = generate_galaxy(&params, &mut StdRng::seed_from_u64(9));
        assert_eq!(layout.systems.len(), 200);
        assert!(layout.is_connected());
    }

    #[test]
    fn test_is_connected_detects_split() {
        assert!(is_connected(3, &[(0, 1), (1, 2)]));
        assert!(!is_connected(4, &[(0, 1), (2, 3)]));
    }
}
