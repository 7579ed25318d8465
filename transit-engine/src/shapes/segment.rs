//! Cut the stretch of a shape between two stops.

use crate::domain::LatLon;
use crate::spatial::haversine_meters;

/// Index of the point in `path` closest to `target`.
///
/// `None` for an empty path or a target that is not a valid coordinate.
/// Path points with no computable distance are ignored.
pub fn closest_index(path: &[LatLon], target: LatLon) -> Option<usize> {
    if !target.is_valid() {
        return None;
    }
    path.iter()
        .enumerate()
        .map(|(i, point)| (i, haversine_meters(*point, target)))
        .filter(|(_, d)| d.is_finite())
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// The part of `path` between the points nearest `from` and `to`,
/// inclusive at both ends, in path order.
///
/// Falls back to the whole path when either end cannot be located, and
/// returns nothing when both ends land on the same point.
pub fn extract_segment(path: &[LatLon], from: LatLon, to: LatLon) -> Vec<LatLon> {
    let (Some(a), Some(b)) = (closest_index(path, from), closest_index(path, to)) else {
        return path.to_vec();
    };
    let (start, end) = (a.min(b), a.max(b));
    if start == end {
        return Vec::new();
    }
    path[start..=end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> Vec<LatLon> {
        (0..n)
            .map(|i| LatLon::new(52.0 + i as f64 * 0.01, -1.9))
            .collect()
    }

    #[test]
    fn straight_path_middle() {
        let path = line(5);
        let segment = extract_segment(&path, path[1], path[3]);
        assert_eq!(segment, path[1..=3].to_vec());
    }

    #[test]
    fn reversed_ends_keep_path_order() {
        let path = line(5);
        let segment = extract_segment(&path, path[3], path[0]);
        assert_eq!(segment, path[0..=3].to_vec());
    }

    #[test]
    fn near_but_not_on_the_path() {
        let path = line(5);
        let from = LatLon::new(52.0101, -1.9005);
        let to = LatLon::new(52.0399, -1.8995);
        assert_eq!(extract_segment(&path, from, to), path[1..=4].to_vec());
    }

    #[test]
    fn same_point_gives_empty_segment() {
        let path = line(5);
        assert!(extract_segment(&path, path[2], LatLon::new(52.0201, -1.9)).is_empty());
    }

    #[test]
    fn empty_path() {
        assert!(extract_segment(&[], LatLon::new(0.0, 0.0), LatLon::new(1.0, 1.0)).is_empty());
    }

    #[test]
    fn unlocatable_end_returns_full_path() {
        let path = line(3);
        let nowhere = LatLon::new(f64::NAN, f64::NAN);
        assert_eq!(extract_segment(&path, nowhere, path[1]), path);
        assert_eq!(extract_segment(&path, path[0], nowhere), path);
    }

    #[test]
    fn invalid_target_has_no_closest_point() {
        let path = line(3);
        assert_eq!(closest_index(&path, LatLon::new(f64::NAN, -1.9)), None);
        assert_eq!(closest_index(&path, LatLon::new(f64::INFINITY, 0.0)), None);
        assert_eq!(closest_index(&path, LatLon::new(95.0, 0.0)), None);
    }

    #[test]
    fn unlocatable_path_points_are_skipped() {
        let mut path = line(3);
        path[0] = LatLon::new(f64::NAN, f64::NAN);
        assert_eq!(closest_index(&path, LatLon::new(52.0, -1.9)), Some(1));
    }
}
