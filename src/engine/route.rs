use serde::Serialize;

use crate::geo::{distance_between, eta_minutes, haversine_km};
use crate::models::location::GeoPoint;

/// Anything that can sit on a route.
pub trait Located {
    fn point(&self) -> Option<GeoPoint>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    Pickup,
    Delivery,
}

#[derive(Debug, Clone, Serialize)]
pub struct Stop {
    pub package_id: u64,
    pub tracking_number: String,
    pub kind: StopKind,
    pub address: String,
    pub point: Option<GeoPoint>,
    pub weight_kg: f64,
}

impl Located for Stop {
    fn point(&self) -> Option<GeoPoint> {
        self.point
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SequencedStop {
    /// 1-based position on the workboard.
    pub priority: usize,
    #[serde(flatten)]
    pub stop: Stop,
    pub leg_distance_km: Option<f64>,
    pub distance_from_start_km: Option<f64>,
    pub eta_minutes: Option<u32>,
}

impl Located for SequencedStop {
    fn point(&self) -> Option<GeoPoint> {
        self.stop.point
    }
}

/// Greedy nearest-neighbour ordering from `start`. Ties keep input order.
/// Stops without coordinates cannot be placed by distance and trail the
/// sequence in their original order.
pub fn optimize<T: Located>(stops: Vec<T>, start: GeoPoint) -> Vec<T> {
    let (mut remaining, unplaced): (Vec<T>, Vec<T>) =
        stops.into_iter().partition(|stop| stop.point().is_some());

    let mut ordered = Vec::with_capacity(remaining.len() + unplaced.len());
    let mut position = start;

    while !remaining.is_empty() {
        let mut nearest = 0;
        let mut nearest_km = f64::INFINITY;

        for (index, stop) in remaining.iter().enumerate() {
            if let Some(point) = stop.point() {
                let km = haversine_km(&position, &point);
                if km < nearest_km {
                    nearest_km = km;
                    nearest = index;
                }
            }
        }

        let next = remaining.remove(nearest);
        if let Some(point) = next.point() {
            position = point;
        }
        ordered.push(next);
    }

    ordered.extend(unplaced);
    ordered
}

/// Workboard order: every pickup before any delivery, each group sequenced by
/// nearest neighbour, the delivery leg continuing from where pickups end.
/// Without a start position the input order is kept within each group.
pub fn priority_order(stops: Vec<Stop>, start: Option<GeoPoint>) -> Vec<SequencedStop> {
    let (pickups, deliveries): (Vec<Stop>, Vec<Stop>) = stops
        .into_iter()
        .partition(|stop| stop.kind == StopKind::Pickup);

    let ordered: Vec<Stop> = match start {
        Some(origin) => {
            let pickups = optimize(pickups, origin);
            let resume = pickups
                .iter()
                .rev()
                .find_map(|stop| stop.point)
                .unwrap_or(origin);
            let deliveries = optimize(deliveries, resume);
            pickups.into_iter().chain(deliveries).collect()
        }
        None => pickups.into_iter().chain(deliveries).collect(),
    };

    let mut position = start;
    ordered
        .into_iter()
        .enumerate()
        .map(|(index, stop)| {
            let leg_distance_km = distance_between(position, stop.point);
            let distance_from_start_km = distance_between(start, stop.point);
            if stop.point.is_some() {
                position = stop.point;
            }
            SequencedStop {
                priority: index + 1,
                leg_distance_km,
                distance_from_start_km,
                eta_minutes: distance_from_start_km.map(eta_minutes),
                stop,
            }
        })
        .collect()
}

/// Length of the route through `stops` in order, including the leg from
/// `start` to the first stop. Stops with unknown coordinates are skipped.
pub fn total_distance<T: Located>(stops: &[T], start: GeoPoint) -> f64 {
    let mut position = start;
    let mut total = 0.0;

    for point in stops.iter().filter_map(|stop| stop.point()) {
        total += haversine_km(&position, &point);
        position = point;
    }

    total
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{optimize, priority_order, total_distance, Stop, StopKind};
    use crate::geo::haversine_km;
    use crate::models::location::GeoPoint;

    fn stop(id: u64, kind: StopKind, point: Option<(f64, f64)>) -> Stop {
        Stop {
            package_id: id,
            tracking_number: format!("RC{id:08}"),
            kind,
            address: format!("{id} Test St"),
            point: point.map(|(lat, lng)| GeoPoint::new(lat, lng)),
            weight_kg: 1.0,
        }
    }

    fn ids<'a>(stops: impl IntoIterator<Item = &'a Stop>) -> Vec<u64> {
        stops.into_iter().map(|stop| stop.package_id).collect()
    }

    #[test]
    fn empty_input_gives_empty_route() {
        let start = GeoPoint::new(0.0, 0.0);
        let route = optimize(Vec::<Stop>::new(), start);
        assert!(route.is_empty());
        assert_eq!(total_distance(&route, start), 0.0);
        assert!(priority_order(Vec::new(), Some(start)).is_empty());
    }

    #[test]
    fn follows_nearest_neighbour_along_a_line() {
        let start = GeoPoint::new(0.0, 0.0);
        let stops = vec![
            stop(3, StopKind::Delivery, Some((0.0, 0.3))),
            stop(1, StopKind::Delivery, Some((0.0, 0.1))),
            stop(2, StopKind::Delivery, Some((0.0, 0.2))),
        ];

        let route = optimize(stops, start);
        assert_eq!(ids(&route), vec![1, 2, 3]);

        let expected = haversine_km(&start, &GeoPoint::new(0.0, 0.3));
        assert!((total_distance(&route, start) - expected).abs() < 1e-6);
    }

    #[test]
    fn equal_distances_keep_input_order() {
        let start = GeoPoint::new(0.0, 0.0);
        let stops = vec![
            stop(7, StopKind::Delivery, Some((0.0, 0.1))),
            stop(4, StopKind::Delivery, Some((0.0, -0.1))),
        ];
        assert_eq!(ids(&optimize(stops, start)), vec![7, 4]);
    }

    #[test]
    fn visits_every_stop_exactly_once_whatever_the_input_order() {
        let start = GeoPoint::new(-26.2, 28.0);
        let base: Vec<Stop> = (1..=9)
            .map(|id| {
                let point = if id % 4 == 0 {
                    None
                } else {
                    Some((-26.2 + id as f64 * 0.013, 28.0 - id as f64 * 0.007))
                };
                stop(id, StopKind::Delivery, point)
            })
            .collect();

        for rotation in 0..base.len() {
            let mut input = base.clone();
            input.rotate_left(rotation);
            let route = optimize(input, start);

            assert_eq!(route.len(), base.len());
            let unique: HashSet<u64> = ids(&route).into_iter().collect();
            assert_eq!(unique.len(), base.len());
        }
    }

    #[test]
    fn unknown_coordinates_trail_and_add_no_distance() {
        let start = GeoPoint::new(0.0, 0.0);
        let stops = vec![
            stop(1, StopKind::Delivery, None),
            stop(2, StopKind::Delivery, Some((0.0, 0.1))),
        ];

        let route = optimize(stops, start);
        assert_eq!(ids(&route), vec![2, 1]);

        let only_known = haversine_km(&start, &GeoPoint::new(0.0, 0.1));
        assert!((total_distance(&route, start) - only_known).abs() < 1e-9);
    }

    #[test]
    fn pickups_rank_ahead_of_closer_deliveries() {
        let start = GeoPoint::new(0.0, 0.0);
        let stops = vec![
            stop(1, StopKind::Delivery, Some((0.0, 0.01))),
            stop(2, StopKind::Pickup, Some((0.0, 0.5))),
            stop(3, StopKind::Pickup, Some((0.0, 0.2))),
        ];

        let board = priority_order(stops, Some(start));
        assert_eq!(ids(board.iter().map(|s| &s.stop)), vec![3, 2, 1]);
        assert_eq!(
            board.iter().map(|s| s.priority).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(board[0].eta_minutes.is_some());

        let expected = haversine_km(&start, &GeoPoint::new(0.0, 0.5))
            + haversine_km(&GeoPoint::new(0.0, 0.5), &GeoPoint::new(0.0, 0.01));
        assert!((total_distance(&board, start) - expected).abs() < 1e-6);
    }

    #[test]
    fn without_a_start_position_distances_are_unknown() {
        let stops = vec![
            stop(1, StopKind::Delivery, Some((0.0, 0.1))),
            stop(2, StopKind::Pickup, Some((0.0, 0.2))),
        ];

        let board = priority_order(stops, None);
        assert_eq!(ids(board.iter().map(|s| &s.stop)), vec![2, 1]);
        assert!(board[0].distance_from_start_km.is_none());
        assert!(board[0].leg_distance_km.is_none());
        assert!(board[1].leg_distance_km.is_some());
    }
}
