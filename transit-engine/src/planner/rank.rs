//! De-duplication and ordering of suggestions.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::suggest::SuggestedRouteOption;

/// Keep one option per (route, origin stop, destination stop): the one that
/// departs earliest. On equal departures the first one seen stays.
///
/// Survivors keep the order in which their key first appeared.
pub fn keep_earliest(options: Vec<SuggestedRouteOption>) -> Vec<SuggestedRouteOption> {
    if options.len() <= 1 {
        return options;
    }

    let mut result: Vec<SuggestedRouteOption> = Vec::with_capacity(options.len());
    let mut seen: HashMap<_, usize> = HashMap::new();

    for option in options {
        let key = (
            option.route.id.clone(),
            option.origin_stop.id.clone(),
            option.destination_stop.id.clone(),
        );
        match seen.entry(key) {
            Entry::Occupied(slot) => {
                let existing = &mut result[*slot.get()];
                if option.departure < existing.departure {
                    *existing = option;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(result.len());
                result.push(option);
            }
        }
    }

    result
}

/// Sort options best-first.
///
/// Options are ranked by:
/// 1. Departure time (earlier is better)
/// 2. Arrival time (earlier is better, unknown last)
/// 3. Route id, so equal options always come out in the same order
pub fn rank_options(mut options: Vec<SuggestedRouteOption>) -> Vec<SuggestedRouteOption> {
    options.sort_by(|a, b| {
        a.departure
            .cmp(&b.departure)
            .then_with(|| compare_arrival(a, b))
            .then_with(|| a.route.id.as_str().cmp(b.route.id.as_str()))
    });
    options
}

fn compare_arrival(a: &SuggestedRouteOption, b: &SuggestedRouteOption) -> Ordering {
    match (a.arrival, b.arrival) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
