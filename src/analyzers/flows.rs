//! Three-stage trip flows (time period → purpose → mode) for flow diagrams.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classify::ClassifiedTrip;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Period,
    Purpose,
    Mode,
}

/// A diagram node. Labels are unique within a stage, not across stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowNode {
    pub index: usize,
    pub stage: Stage,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowLink {
    pub source: usize,
    pub target: usize,
    pub source_label: String,
    pub target_label: String,
    pub value: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowDiagram {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

impl FlowDiagram {
    fn node_index(&mut self, stage: Stage, label: &str) -> usize {
        if let Some(n) = self
            .nodes
            .iter()
            .find(|n| n.stage == stage && n.label == label)
        {
            return n.index;
        }
        let index = self.nodes.len();
        self.nodes.push(FlowNode {
            index,
            stage,
            label: label.to_string(),
        });
        index
    }
}

/// Builds the diagram from the `max_flows` most frequent
/// (period, purpose, mode) combinations.
///
/// Trips outside every time period are ignored. Ties in frequency keep the
/// label order. Nodes are listed periods first, then purposes, then modes,
/// each in order of first appearance among the kept combinations; links are
/// the kept counts summed per period → purpose and purpose → mode pair.
pub fn build_flows(trips: &[ClassifiedTrip<'_>], max_flows: usize) -> FlowDiagram {
    let mut triples: BTreeMap<(&str, &str, &str), u64> = BTreeMap::new();
    for t in trips {
        if let Some(period) = t.period {
            *triples.entry((period, t.purpose, t.mode)).or_default() += 1;
        }
    }

    let mut ranked: Vec<((&str, &str, &str), u64)> = triples.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(max_flows);

    let mut diagram = FlowDiagram::default();
    for ((period, _, _), _) in &ranked {
        diagram.node_index(Stage::Period, period);
    }
    for ((_, purpose, _), _) in &ranked {
        diagram.node_index(Stage::Purpose, purpose);
    }
    for ((_, _, mode), _) in &ranked {
        diagram.node_index(Stage::Mode, mode);
    }

    let mut period_purpose: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    let mut purpose_mode: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for &((period, purpose, mode), n) in &ranked {
        *period_purpose.entry((period, purpose)).or_default() += n;
        *purpose_mode.entry((purpose, mode)).or_default() += n;
    }

    let stages = [
        (Stage::Period, Stage::Purpose, period_purpose),
        (Stage::Purpose, Stage::Mode, purpose_mode),
    ];
    for (from, to, links) in stages {
        for ((source_label, target_label), value) in links {
            let source = diagram.node_index(from, source_label);
            let target = diagram.node_index(to, target_label);
            diagram.links.push(FlowLink {
                source,
                target,
                source_label: source_label.to_string(),
                target_label: target_label.to_string(),
                value,
            });
        }
    }

    diagram
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Catalog;
    use crate::survey::TripRecord;

    fn trip(purpose: i64, mode: i64, time: i64) -> TripRecord {
        TripRecord {
            origin_zone: Some(1),
            dest_zone: Some(1),
            mode_primary: Some(mode),
            trip_purpose: Some(purpose),
            depart_time: Some(time),
        }
    }

    fn records() -> Vec<TripRecord> {
        let mut records = vec![trip(10, 1, 730); 5];
        records.extend(vec![trip(10, 3, 745); 3]);
        records.extend(vec![trip(80, 1, 1730); 4]);
        records.push(trip(40, 6, 1200));
        records.push(trip(40, 6, 300));
        records
    }

    #[test]
    fn test_nodes_and_links() {
        let catalog = Catalog::standard().unwrap();
        let trips = catalog.classify_all(&records());

        let diagram = build_flows(&trips, 50);

        let labels: Vec<(Stage, &str)> = diagram
            .nodes
            .iter()
            .map(|n| (n.stage, n.label.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![
                (Stage::Period, "Matin pointe"),
                (Stage::Period, "PM pointe"),
                (Stage::Period, "Jour"),
                (Stage::Purpose, "Travail"),
                (Stage::Purpose, "Retour"),
                (Stage::Purpose, "Achats"),
                (Stage::Mode, "Auto"),
                (Stage::Mode, "Transport en commun"),
                (Stage::Mode, "Modes actifs"),
            ]
        );

        let total_in: u64 = diagram
            .links
            .iter()
            .filter(|l| diagram.nodes[l.source].stage == Stage::Period)
            .map(|l| l.value)
            .sum();
        assert_eq!(total_in, 13);

        let travail_auto = diagram
            .links
            .iter()
            .find(|l| l.source_label == "Travail" && l.target_label == "Auto")
            .unwrap();
        assert_eq!(travail_auto.value, 5);
    }

    #[test]
    fn test_max_flows_keeps_most_frequent() {
        let catalog = Catalog::standard().unwrap();
        let trips = catalog.classify_all(&records());

        let diagram = build_flows(&trips, 1);

        assert_eq!(diagram.nodes.len(), 3);
        assert_eq!(diagram.links.len(), 2);
        assert!(diagram.links.iter().all(|l| l.value == 5));
    }
}
