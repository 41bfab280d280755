use std::sync::Arc;

use digivolve_graph::{Digimon, GraphBuilder, NodeId};
use digivolve_query::{EvolutionResponse, EvolutionService};
use proptest::prelude::*;

const MAX_NODES: usize = 12;
const MAX_EDGES: usize = 32;

fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,7}( [A-Z][a-z]{2,7})?"
}

fn service_strategy() -> impl Strategy<Value = (EvolutionService, Vec<String>)> {
    prop::collection::btree_set(name_strategy(), 1..=MAX_NODES).prop_flat_map(|names| {
        let names: Vec<String> = names.into_iter().collect();
        let n = names.len();
        (
            Just(names),
            prop::collection::vec((0..n, 0..n), 0..=MAX_EDGES),
            prop::collection::vec(prop::option::of("[A-Za-z]{3,8}"), n),
        )
            .prop_map(|(names, edges, attributes)| {
                let mut b = GraphBuilder::new();
                for (i, (name, attribute)) in names.iter().zip(attributes).enumerate() {
                    let mut record = Digimon::new(i as u32, name.clone(), "III");
                    if let Some(attribute) = attribute {
                        record = record.with_attribute(attribute);
                    }
                    b.insert(record);
                }
                for (from, to) in edges {
                    b.add_edge(NodeId::new(from as u32), NodeId::new(to as u32));
                }
                (EvolutionService::new(Arc::new(b.freeze())), names)
            })
    })
}

fn flip_case(name: &str, mask: &[bool]) -> String {
    name.chars()
        .zip(mask.iter().cycle())
        .map(|(c, &upper)| {
            if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn case_variants_give_identical_results(
        (service, names) in service_strategy(),
        pick in any::<prop::sample::Index>(),
        mask in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        let name = &names[pick.index(names.len())];
        let variant = flip_case(name, &mask);
        let a = service.get_evolution_line(name);
        let b = service.get_evolution_line(&variant);
        prop_assert!(a.success);
        prop_assert_eq!(a.results, b.results);
    }

    #[test]
    fn lineage_never_contains_start_or_duplicates(
        (service, names) in service_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let name = &names[pick.index(names.len())];
        let response = service.get_evolution_line(name);
        let line = &response.results[0];
        for list in [&line.previous_evolutions, &line.next_evolutions] {
            let mut seen = std::collections::HashSet::new();
            for d in list {
                prop_assert_ne!(&d.name, name);
                prop_assert!(seen.insert(d.name.clone()));
            }
        }
        prop_assert_eq!(line.evolution_summary.total_previous, line.previous_evolutions.len());
        prop_assert_eq!(line.evolution_summary.total_next, line.next_evolutions.len());
    }

    #[test]
    fn json_text_decodes_to_equal_value(
        (service, names) in service_strategy(),
        pick in any::<prop::sample::Index>(),
        unknown in "[a-z]{1,6}mon[0-9]",
    ) {
        let name = &names[pick.index(names.len())];
        for query in [name.as_str(), unknown.as_str()] {
            let response = service.get_evolution_line(query);
            let decoded = EvolutionResponse::from_json(&response.to_json()).unwrap();
            prop_assert_eq!(decoded, response);
        }
    }
}
