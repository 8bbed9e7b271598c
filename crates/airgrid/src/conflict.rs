//! The pairwise conflict detector (C5): same-timestep proximity between a
//! set of "existing" routes and a set of "new" routes, over a dense
//! trajectory tensor. `SPEC_FULL.md` §4.6.
//!
//! The kernel is embarrassingly parallel across `t` and is dispatched here
//! across `t`-tiles with `rayon`, each tile writing to a thread-local
//! buffer merged into the shared output through an atomic cursor, rather
//! than the GPU-style atomics the source kernel uses (§10 "Parallel
//! kernel").

use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;
use tracing::{debug, warn};

/// Default cap on the number of conflict triples retained by a single
/// `detect` call (§6 "Constants").
pub const DEFAULT_MAX_TRIPLES: usize = 10_000;

/// A single sampled point along a route, at an integer second offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    pub t: u32,
    pub lon: f64,
    pub lat: f64,
    pub alt: f64,
}

/// One input route: an id/name pair plus its sampled points. Points
/// missing a usable `t` or coordinate are the caller's concern to have
/// already filtered; `build_tensor` additionally enforces range and
/// at-most-one-point-per-second.
#[derive(Debug, Clone)]
pub struct Route {
    pub id: String,
    pub name: String,
    pub points: Vec<TrajectoryPoint>,
}

/// A detected same-timestep proximity between route `existing_index` (in
/// `[0, existing_count)`) and route `new_index` (relative to the start of
/// the new-routes slice) at second `t`.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub t: u32,
    pub existing_index: usize,
    pub new_index: usize,
}

/// The result of a `detect` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictReport {
    pub num_existing_routes: usize,
    pub num_new_routes: usize,
    pub max_time_steps: u32,
    pub conflict_count: usize,
    pub conflict_times: Vec<u32>,
    pub conflicts: Vec<Conflict>,
    pub truncated: bool,
}

/// Dense `P[N, T, 3]` position tensor with a companion `M[N, T]` validity
/// mask, built from a list of routes (§4.3 "Trajectory tensor"). Row `i`
/// of `positions`/`mask` is flattened as `i * max_time_steps + t`.
struct Tensor {
    max_time_steps: u32,
    positions: Vec<[f32; 3]>,
    mask: Vec<bool>,
}

impl Tensor {
    fn build(routes: &[Route], max_time_steps: u32) -> Tensor {
        let n = routes.len();
        let t = max_time_steps as usize;
        let mut positions = vec![[0.0f32; 3]; n * t];
        let mut mask = vec![false; n * t];

        for (i, route) in routes.iter().enumerate() {
            let mut filled = vec![false; t];
            for point in &route.points {
                if point.t >= max_time_steps {
                    warn!(route = %route.id, t = point.t, "conflict detector: time step out of range, skipping point");
                    continue;
                }
                let idx = i * t + point.t as usize;
                if filled[point.t as usize] {
                    warn!(route = %route.id, t = point.t, "conflict detector: duplicate time step, keeping first point");
                    continue;
                }
                filled[point.t as usize] = true;
                positions[idx] = [point.lon as f32, point.lat as f32, point.alt as f32];
                mask[idx] = true;
            }
        }

        Tensor { max_time_steps, positions, mask }
    }

    #[inline]
    fn at(&self, i: usize, t: u32) -> ([f32; 3], bool) {
        let idx = i * self.max_time_steps as usize + t as usize;
        (self.positions[idx], self.mask[idx])
    }
}

/// Detect same-timestep conflicts between `existing` and `new` routes:
/// for every `t`, every new-route index `i` and existing-route index `j`
/// with both valid at `t`, emit `(t, j, i)` when `‖p_i(t) − p_j(t)‖ < ε`.
///
/// Returns an empty, non-error result when either side is empty (§7
/// "Empty input"). `max_triples` caps the size of the returned
/// `conflicts` buffer; `conflict_count` always reflects the true total.
pub fn detect(
    existing: &[Route],
    new_routes: &[Route],
    epsilon: f64,
    max_time_steps: u32,
    max_triples: usize,
) -> ConflictReport {
    if existing.is_empty() || new_routes.is_empty() {
        debug!("conflict detector: empty input on one side, skipping detection");
        return ConflictReport {
            num_existing_routes: existing.len(),
            num_new_routes: new_routes.len(),
            max_time_steps,
            conflict_count: 0,
            conflict_times: Vec::new(),
            conflicts: Vec::new(),
            truncated: false,
        };
    }

    let existing_count = existing.len();
    let mut all_routes = Vec::with_capacity(existing.len() + new_routes.len());
    all_routes.extend_from_slice(existing);
    all_routes.extend_from_slice(new_routes);

    let tensor = Tensor::build(&all_routes, max_time_steps);
    let epsilon_sq = (epsilon * epsilon) as f32;

    let conflict_flags: Vec<AtomicU32> = (0..max_time_steps).map(|_| AtomicU32::new(0)).collect();
    let count = AtomicU32::new(0);

    const TILE: u32 = 256;
    let num_tiles = max_time_steps.div_ceil(TILE);

    let tile_results: Vec<Vec<Conflict>> = (0..num_tiles)
        .into_par_iter()
        .map(|tile| {
            let t_start = tile * TILE;
            let t_end = (t_start + TILE).min(max_time_steps);
            let mut local = Vec::new();
            for t in t_start..t_end {
                let mut any_conflict_at_t = false;
                for i in existing_count..all_routes.len() {
                    let (p_new, new_valid) = tensor.at(i, t);
                    if !new_valid {
                        continue;
                    }
                    for j in 0..existing_count {
                        let (p_existing, existing_valid) = tensor.at(j, t);
                        if !existing_valid {
                            continue;
                        }
                        let dx = p_new[0] - p_existing[0];
                        let dy = p_new[1] - p_existing[1];
                        let dz = p_new[2] - p_existing[2];
                        let dist_sq = dx * dx + dy * dy + dz * dz;
                        if dist_sq < epsilon_sq {
                            any_conflict_at_t = true;
                            let idx = count.fetch_add(1, Ordering::Relaxed) as usize;
                            if idx < max_triples {
                                local.push(Conflict { t, existing_index: j, new_index: i - existing_count });
                            }
                        }
                    }
                }
                if any_conflict_at_t {
                    conflict_flags[t as usize].store(1, Ordering::Relaxed);
                }
            }
            local
        })
        .collect();

    let mut conflicts: Vec<Conflict> = tile_results.into_iter().flatten().collect();
    let total_count = count.load(Ordering::Relaxed) as usize;
    let truncated = total_count > max_triples;
    if truncated {
        warn!(total_count, max_triples, "conflict detector: result capacity exceeded, truncating");
        conflicts.truncate(max_triples);
    }

    let conflict_times: Vec<u32> = conflict_flags
        .iter()
        .enumerate()
        .filter(|(_, flag)| flag.load(Ordering::Relaxed) == 1)
        .map(|(t, _)| t as u32)
        .collect();

    debug!(
        existing = existing_count,
        new = new_routes.len(),
        conflicts = total_count,
        "conflict detection complete"
    );

    ConflictReport {
        num_existing_routes: existing_count,
        num_new_routes: new_routes.len(),
        max_time_steps,
        conflict_count: total_count,
        conflict_times,
        conflicts,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(id: &str, points: &[(u32, f64, f64, f64)]) -> Route {
        Route {
            id: id.to_string(),
            name: id.to_string(),
            points: points.iter().map(|&(t, lon, lat, alt)| TrajectoryPoint { t, lon, lat, alt }).collect(),
        }
    }

    #[test]
    fn two_routes_close_at_t100_conflict_at_loose_threshold_only() {
        let existing = vec![route("E1", &[(100, 114.000, 22.500, 100.0)])];
        let new_routes = vec![route("N1", &[(100, 114.00005, 22.50005, 100.0)])];

        let loose = detect(&existing, &new_routes, 0.001, 200, DEFAULT_MAX_TRIPLES);
        assert_eq!(loose.conflict_count, 1);
        assert_eq!(loose.conflict_times, vec![100]);

        let tight = detect(&existing, &new_routes, 1e-10, 200, DEFAULT_MAX_TRIPLES);
        assert_eq!(tight.conflict_count, 0);
    }

    #[test]
    fn threshold_monotonicity() {
        let existing = vec![route("E1", &[(50, 0.0, 0.0, 0.0)])];
        let new_routes = vec![route("N1", &[(50, 0.0005, 0.0, 0.0)])];

        let small = detect(&existing, &new_routes, 0.0001, 100, DEFAULT_MAX_TRIPLES).conflict_count;
        let large = detect(&existing, &new_routes, 0.01, 100, DEFAULT_MAX_TRIPLES).conflict_count;
        assert!(small <= large);
    }

    #[test]
    fn empty_side_returns_empty_result_not_an_error() {
        let existing = vec![route("E1", &[(10, 0.0, 0.0, 0.0)])];
        let report = detect(&existing, &[], 0.001, 100, DEFAULT_MAX_TRIPLES);
        assert_eq!(report.conflict_count, 0);
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn renaming_existing_and_new_is_symmetric_in_count() {
        let a = route("A", &[(10, 0.0, 0.0, 0.0)]);
        let b = route("B", &[(10, 0.00001, 0.0, 0.0)]);

        let forward = detect(&[a.clone()], &[b.clone()], 0.001, 50, DEFAULT_MAX_TRIPLES);
        let backward = detect(&[b], &[a], 0.001, 50, DEFAULT_MAX_TRIPLES);
        assert_eq!(forward.conflict_count, backward.conflict_count);
    }

    #[test]
    fn out_of_range_time_step_is_skipped_not_fatal() {
        let existing = vec![route("E1", &[(999, 0.0, 0.0, 0.0)])];
        let new_routes = vec![route("N1", &[(5, 0.0, 0.0, 0.0)])];
        let report = detect(&existing, &new_routes, 0.001, 10, DEFAULT_MAX_TRIPLES);
        assert_eq!(report.conflict_count, 0);
    }

    #[test]
    fn capacity_exceeded_truncates_but_reports_true_total() {
        let existing_points: Vec<_> = (0..20).map(|t| (t, 0.0, 0.0, 0.0)).collect();
        let new_points: Vec<_> = (0..20).map(|t| (t, 0.00001, 0.0, 0.0)).collect();
        let existing = vec![route("E1", &existing_points)];
        let new_routes = vec![route("N1", &new_points)];

        let report = detect(&existing, &new_routes, 0.001, 30, 5);
        assert_eq!(report.conflict_count, 20);
        assert_eq!(report.conflicts.len(), 5);
        assert!(report.truncated);
    }
}
