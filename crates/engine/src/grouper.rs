//! Ticket grouper: partitions tickets into delivery units.
//!
//! Cluster mode groups by the cluster tag embedded in each ticket. Route mode
//! takes the route registry as authoritative.

use std::collections::BTreeMap;

use courier_common::error::GroupingError;
use courier_common::types::{DeliveryUnit, Route, Ticket};

/// Result of a lenient cluster grouping.
#[derive(Debug, Default)]
pub struct ClusterPartition {
    /// Units ordered by cluster id, tickets in input order.
    pub units: Vec<DeliveryUnit>,
    /// Tickets that could not be placed in exactly one cluster.
    pub rejected: Vec<GroupingError>,
}

fn grouping_error(ticket: &Ticket, units: &[String]) -> GroupingError {
    GroupingError {
        record_id: ticket.record_id.clone(),
        ticket_id: ticket.ticket_id.clone(),
        units: units.to_vec(),
    }
}

/// Group tickets by cluster, setting aside tickets without exactly one cluster tag.
pub fn partition_by_cluster(tickets: Vec<Ticket>) -> ClusterPartition {
    let mut clusters: BTreeMap<String, DeliveryUnit> = BTreeMap::new();
    let mut rejected = Vec::new();

    for ticket in tickets {
        let cluster = match ticket.cluster_refs.as_slice() {
            [only] => only.clone(),
            refs => {
                rejected.push(grouping_error(&ticket, refs));
                continue;
            }
        };
        clusters
            .entry(cluster.clone())
            .or_insert_with(|| DeliveryUnit::cluster(cluster))
            .tickets
            .push(ticket);
    }

    ClusterPartition {
        units: clusters.into_values().collect(),
        rejected,
    }
}

/// Group tickets by cluster, failing on the first ticket without exactly one cluster tag.
pub fn group_by_cluster(tickets: Vec<Ticket>) -> Result<Vec<DeliveryUnit>, GroupingError> {
    let partition = partition_by_cluster(tickets);
    match partition.rejected.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(partition.units),
    }
}

/// Build the delivery unit for `route` from the tickets fetched for it.
///
/// The route registry decides membership. A ticket whose own route link
/// doesn't match is kept and logged.
pub fn route_unit(route: &Route, tickets: Vec<Ticket>) -> DeliveryUnit {
    let mut unit = DeliveryUnit::route(route);
    for ticket in tickets {
        let linked = matches!(ticket.route_refs.as_slice(), [only] if *only == route.id);
        if !linked {
            tracing::warn!(
                route = %route.name,
                ticket = %ticket.ticket_id,
                route_refs = ?ticket.route_refs,
                "Ticket route link doesn't match the route that lists it"
            );
        }
        unit.tickets.push(ticket);
    }
    unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ticket(record_id: &str, clusters: &[&str]) -> Ticket {
        Ticket {
            record_id: record_id.to_string(),
            ticket_id: format!("T-{record_id}"),
            requester_name: "Ada".to_string(),
            address: "1 Main St".to_string(),
            phone_number: "555-0100".to_string(),
            household_size: 1,
            vulnerabilities: vec![],
            grocery_list: vec![],
            custom_items: None,
            delivery_notes: None,
            cluster_refs: clusters.iter().map(|c| c.to_string()).collect(),
            route_refs: vec![],
            volunteer_refs: vec!["recV".to_string()],
        }
    }

    fn route(id: &str) -> Route {
        Route {
            id: id.to_string(),
            name: format!("Route {id}"),
            delivery_date: None,
            arrival_time: Some("10am".to_string()),
            volunteer_refs: vec!["recV".to_string()],
            ticket_refs: vec![],
        }
    }

    #[test]
    fn test_partition_is_complete_and_disjoint() {
        let tickets = vec![
            ticket("r1", &["c2"]),
            ticket("r2", &["c1"]),
            ticket("r3", &["c2"]),
            ticket("r4", &["c3"]),
            ticket("r5", &["c1"]),
        ];
        let units = group_by_cluster(tickets.clone()).unwrap();

        let mut seen = HashSet::new();
        let mut total = 0;
        for unit in &units {
            for t in &unit.tickets {
                assert!(seen.insert(t.record_id.clone()), "ticket in two units");
                assert_eq!(t.cluster_refs, vec![unit.id.clone()]);
                total += 1;
            }
        }
        assert_eq!(total, tickets.len());

        let ids: Vec<&str> = units.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_input_order_kept_within_cluster() {
        let units = group_by_cluster(vec![
            ticket("r3", &["c1"]),
            ticket("r1", &["c1"]),
            ticket("r2", &["c1"]),
        ])
        .unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].ticket_ids(), vec!["T-r3", "T-r1", "T-r2"]);
    }

    #[test]
    fn test_ticket_without_cluster_fails() {
        let err = group_by_cluster(vec![ticket("r1", &["c1"]), ticket("r2", &[])]).unwrap_err();
        assert_eq!(err.record_id, "r2");
        assert!(err.units.is_empty());
    }

    #[test]
    fn test_ticket_with_two_clusters_fails() {
        let err = group_by_cluster(vec![ticket("r1", &["c1", "c2"])]).unwrap_err();
        assert_eq!(err.ticket_id, "T-r1");
        assert_eq!(err.units, vec!["c1", "c2"]);
    }

    #[test]
    fn test_partition_sets_rejected_aside() {
        let partition = partition_by_cluster(vec![
            ticket("r1", &["c1"]),
            ticket("r2", &[]),
            ticket("r3", &["c1", "c2"]),
            ticket("r4", &["c2"]),
        ]);
        assert_eq!(partition.units.len(), 2);
        let rejected: Vec<&str> = partition
            .rejected
            .iter()
            .map(|e| e.record_id.as_str())
            .collect();
        assert_eq!(rejected, vec!["r2", "r3"]);
    }

    #[test]
    fn test_route_unit_keeps_store_order() {
        let mut a = ticket("r2", &[]);
        a.route_refs = vec!["recR".to_string()];
        let mut b = ticket("r1", &[]);
        b.route_refs = vec!["recR".to_string()];

        let unit = route_unit(&route("recR"), vec![a, b]);
        assert_eq!(unit.name, "Route recR");
        assert_eq!(unit.arrival_time.as_deref(), Some("10am"));
        assert_eq!(unit.ticket_ids(), vec!["T-r2", "T-r1"]);
    }

    #[test]
    fn test_route_unit_keeps_mismatched_links() {
        let mut extra = ticket("r1", &[]);
        extra.route_refs = vec!["recR".to_string(), "recOld".to_string()];
        let mut stray = ticket("r2", &[]);
        stray.route_refs = vec!["recOther".to_string()];
        let unlinked = ticket("r3", &[]);

        let unit = route_unit(&route("recR"), vec![extra, stray, unlinked]);
        assert_eq!(unit.ticket_ids(), vec!["T-r1", "T-r2", "T-r3"]);
    }
}
