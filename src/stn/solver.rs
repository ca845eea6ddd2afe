//! The solver boundary — trait plus an in-process reference implementation.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::types::{TemporalError, TemporalResult};

use super::network::Stn;

/// Default timeout for solver invocations.
pub const DEFAULT_SOLVER_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a solver run.
#[derive(Debug, Clone)]
pub struct SolverOutcome {
    /// Whether the network admits an assignment.
    pub consistent: bool,
    /// Offsets per time point, in unit × resolution ticks. Empty when the
    /// network is inconsistent.
    pub solved_times: BTreeMap<String, i64>,
}

/// A consistency checker and time assigner for STNs.
///
/// Implementations receive the full network read-only, must respect
/// `timeout` (returning [`TemporalError::SolverTimeout`] on expiry without
/// corrupting anything), and may run out of process.
pub trait StnSolver {
    fn solve(&self, stn: &Stn, timeout: Duration) -> TemporalResult<SolverOutcome>;
}

/// Reference solver: all-pairs shortest-path closure.
///
/// A negative self-cycle in the closure means the network is unsatisfiable.
/// Cubic in the point count, which the constant-work cap keeps small; the
/// deadline is checked between relaxation rounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloydWarshallSolver;

const INF: i64 = i64::MAX / 4;

impl StnSolver for FloydWarshallSolver {
    fn solve(&self, stn: &Stn, timeout: Duration) -> TemporalResult<SolverOutcome> {
        let deadline = std::time::Instant::now() + timeout;
        let points: Vec<&String> = stn.time_points().iter().collect();
        let n = points.len();
        let index: BTreeMap<&String, usize> =
            points.iter().enumerate().map(|(i, p)| (*p, i)).collect();

        let mut dist = vec![vec![INF; n]; n];
        for (i, row) in dist.iter_mut().enumerate() {
            row[i] = 0;
        }
        // lo ≤ t(to) − t(from) ≤ hi  becomes the edge pair
        // t(to) − t(from) ≤ hi  and  t(from) − t(to) ≤ −lo
        for ((from, to), bound) in stn.constraints() {
            let (Some(&f), Some(&t)) = (index.get(from), index.get(to)) else {
                return Err(TemporalError::UnknownTimePoint(from.clone()));
            };
            dist[f][t] = dist[f][t].min(bound.hi);
            dist[t][f] = dist[t][f].min(-bound.lo);
        }

        for k in 0..n {
            if std::time::Instant::now() > deadline {
                return Err(TemporalError::SolverTimeout(timeout));
            }
            for i in 0..n {
                if dist[i][k] == INF {
                    continue;
                }
                for j in 0..n {
                    let via = dist[i][k].saturating_add(dist[k][j]);
                    if via < dist[i][j] {
                        dist[i][j] = via;
                    }
                }
            }
        }

        for i in 0..n {
            if dist[i][i] < 0 {
                return Ok(SolverOutcome {
                    consistent: false,
                    solved_times: BTreeMap::new(),
                });
            }
        }

        // Earliest assignment: t(p) = −dist[p][anchor], with the first point
        // of each connected component as its anchor. Every constraint adds
        // both edge directions, so closure reachability is symmetric.
        let mut anchor_of: Vec<Option<usize>> = vec![None; n];
        for i in 0..n {
            if anchor_of[i].is_some() {
                continue;
            }
            anchor_of[i] = Some(i);
            for j in (i + 1)..n {
                if anchor_of[j].is_none() && dist[i][j] < INF {
                    anchor_of[j] = Some(i);
                }
            }
        }

        let mut solved = BTreeMap::new();
        let mut component_min: BTreeMap<usize, i64> = BTreeMap::new();
        let mut offsets = vec![0i64; n];
        for j in 0..n {
            let anchor = anchor_of[j].unwrap_or(j);
            let offset = if dist[j][anchor] < INF {
                -dist[j][anchor]
            } else {
                0
            };
            offsets[j] = offset;
            component_min
                .entry(anchor)
                .and_modify(|m| *m = (*m).min(offset))
                .or_insert(offset);
        }
        // Shift each component so its earliest point sits at zero
        for j in 0..n {
            let anchor = anchor_of[j].unwrap_or(j);
            let base = component_min.get(&anchor).copied().unwrap_or(0);
            solved.insert(points[j].clone(), offsets[j] - base);
        }

        Ok(SolverOutcome {
            consistent: true,
            solved_times: solved,
        })
    }
}
