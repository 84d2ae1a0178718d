use std::path::Path;

use pedigree_layout::layout_dump::LayoutDump;
use pedigree_layout::{Layout, LayoutConfig, PedigreeRecord, compute_layout, parser};

fn load_fixture(name: &str) -> Vec<PedigreeRecord> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    parser::parse_pedigree(&input)
        .expect("fixture parse failed")
        .records
}

fn layout_fixture(name: &str) -> Layout {
    let records = load_fixture(name);
    compute_layout(&records, &LayoutConfig::default()).expect("layout failed")
}

/// Nodes on one level stay at least a full horizontal step apart and on
/// their level's row; the bounding box covers every marker.
fn assert_well_formed(layout: &Layout, fixture: &str) {
    let config = LayoutConfig::default();
    let h_spacing = config.h_spacing();
    let levels = layout.nodes.iter().map(|n| n.level).max().map_or(0, |l| l + 1);
    for level in 0..levels {
        let mut xs: Vec<f32> = layout
            .nodes
            .iter()
            .filter(|n| n.level == level)
            .map(|n| n.x)
            .collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for pair in xs.windows(2) {
            assert!(
                pair[1] - pair[0] >= h_spacing - 0.6,
                "{fixture}: level {level} nodes {:.1} and {:.1} closer than {h_spacing}",
                pair[0],
                pair[1]
            );
        }
    }
    for node in &layout.nodes {
        assert_eq!(node.y, node.level as f32 * config.v_spacing(), "{fixture}: {}", node.id);
        let bb = &layout.bounding_box;
        assert!(node.x >= bb.min_x && node.x <= bb.min_x + bb.width, "{fixture}: {}", node.id);
        assert!(node.y >= bb.min_y && node.y <= bb.min_y + bb.height, "{fixture}: {}", node.id);
    }
}

#[test]
fn all_fixtures_lay_out() {
    // Keep this list explicit so new fixtures must be added intentionally.
    let candidates = [
        "singleton.ped",
        "trio.ped",
        "siblings.ped",
        "remarriage.ped",
        "four_generations.ped",
        "cousin_marriage.ped",
    ];
    for fixture in candidates {
        let layout = layout_fixture(fixture);
        assert!(!layout.is_empty(), "{fixture}: produced no nodes");
        assert_well_formed(&layout, fixture);
    }
}

#[test]
fn singleton_is_one_level_at_origin() {
    let layout = layout_fixture("singleton.ped");
    assert_eq!(layout.nodes.len(), 1);
    let node = layout.node("only").expect("only");
    assert_eq!((node.x, node.y), (0.0, 0.0));
    assert_eq!(node.level, 0);
    assert!(layout.bundles.is_empty());
}

#[test]
fn trio_centers_the_child_between_its_parents() {
    let layout = layout_fixture("trio.ped");
    let levels = layout.nodes.iter().map(|n| n.level).max().unwrap() + 1;
    assert_eq!(levels, 2);

    let child = layout.node("c").expect("c");
    assert_eq!(child.parents.len(), 2);
    let mean = child
        .parents
        .iter()
        .map(|&p| layout.nodes[p].x)
        .sum::<f32>()
        / 2.0;
    assert!(
        (child.x - mean).abs() < 1.0,
        "child at {:.2}, parents mean {:.2}",
        child.x,
        mean
    );
}

#[test]
fn full_siblings_share_one_bundle_on_one_level() {
    let layout = layout_fixture("siblings.ped");
    let siblings = ["c1", "c2", "c3"];
    let nodes: Vec<_> = siblings
        .iter()
        .map(|id| layout.node(id).expect("sibling placed"))
        .collect();

    let level = nodes[0].level;
    assert!(nodes.iter().all(|n| n.level == level));
    assert!(nodes.iter().all(|n| n.bundle == nodes[0].bundle));
    assert_eq!(layout.bundles.len(), 1);

    let mut xs: Vec<f32> = nodes.iter().map(|n| n.x).collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let h_spacing = LayoutConfig::default().h_spacing();
    for pair in xs.windows(2) {
        assert!(pair[1] - pair[0] >= h_spacing - 0.6);
    }
}

#[test]
fn identical_input_gives_identical_output() {
    let records = load_fixture("remarriage.ped");
    let config = LayoutConfig::default();
    let first = compute_layout(&records, &config).expect("first run");
    let second = compute_layout(&records, &config).expect("second run");
    let first_json = LayoutDump::from_layout(&first).to_json_string().unwrap();
    let second_json = LayoutDump::from_layout(&second).to_json_string().unwrap();
    assert_eq!(first_json, second_json);
}

#[test]
fn remarriage_keeps_partners_beside_the_shared_parent() {
    let layout = layout_fixture("remarriage.ped");

    let shared = layout.node("p").expect("p");
    let s1 = layout.node("s1").expect("s1");
    let s2 = layout.node("s2").expect("s2");
    assert_eq!(shared.level, s1.level);
    assert_eq!(shared.level, s2.level);

    // the triple occupies consecutive slots on its level
    let mut row: Vec<(f32, &str)> = layout
        .nodes
        .iter()
        .filter(|n| n.level == shared.level)
        .map(|n| (n.x, n.id.as_str()))
        .collect();
    row.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    let slots: Vec<usize> = ["p", "s1", "s2"]
        .iter()
        .map(|id| row.iter().position(|(_, rid)| rid == id).expect("in row"))
        .collect();
    let (min, max) = (
        *slots.iter().min().unwrap(),
        *slots.iter().max().unwrap(),
    );
    assert_eq!(max - min, 2, "partners not adjacent to shared parent: {row:?}");

    // two marriages, two distinct bundles
    let c1 = layout.node("c1").expect("c1");
    let c2 = layout.node("c2").expect("c2");
    let c3 = layout.node("c3").expect("c3");
    assert_eq!(c1.bundle, c2.bundle);
    assert_ne!(c1.bundle, c3.bundle);
    assert_eq!(shared.bundles.len(), 2);
}

#[test]
fn first_cousin_marriage_closes_the_loop_and_converges() {
    let layout = layout_fixture("cousin_marriage.ped");
    assert!(layout.dropped.is_empty());

    // both cousins descend from the same grandparents, one row apart
    let c = layout.node("c").expect("c");
    let d = layout.node("d").expect("d");
    assert_eq!(c.level, d.level);
    let e = layout.node("e").expect("e");
    assert_eq!(e.level, c.level + 1);
    assert_eq!(e.parents.len(), 2);

    // the marriage loop still yields exactly one bundle per couple
    assert_eq!(layout.bundles.len(), 4);
    let mean = (c.x + d.x) / 2.0;
    assert!(
        (e.x - mean).abs() < 1.0,
        "child at {:.2}, cousin parents mean {:.2}",
        e.x,
        mean
    );
}

#[test]
fn dangling_parent_ids_degrade_instead_of_aborting() {
    let layout = layout_fixture("four_generations.ped");
    // cw's parents are absent from the record set entirely
    let cw = layout.node("cw").expect("cw placed as spouse");
    assert!(cw.parents.is_empty());
    assert!(layout.dropped.is_empty());
    let e = layout.node("e").expect("e");
    assert_eq!(e.parents.len(), 2);
}

#[test]
fn ancestry_cycle_is_excluded_not_hung() {
    let records = load_fixture("cycle.ped");
    let layout = compute_layout(&records, &LayoutConfig::default()).expect("no hang");
    assert!(layout.is_empty());
    assert_eq!(layout.dropped.len(), 2);
}

fn generated_pedigree(generations: usize) -> Vec<PedigreeRecord> {
    let mut records = vec![
        PedigreeRecord::new("GEN", "g0_f"),
        PedigreeRecord::new("GEN", "g0_m"),
    ];
    // each couple has three children; the first two marry founder spouses
    // and carry the line on
    let mut couples = vec![("g0_f".to_string(), "g0_m".to_string())];
    for generation in 1..generations {
        let mut next_couples = Vec::new();
        for (couple_no, (father, mother)) in couples.iter().enumerate() {
            for child_no in 0..3 {
                let id = format!("g{generation}_c{couple_no}_{child_no}");
                records.push(
                    PedigreeRecord::new("GEN", &id).with_parents(father, mother),
                );
                // the last generation stays unmarried; a spouse with no
                // children has nothing to attach to
                if child_no < 2 && generation + 1 < generations {
                    let spouse = format!("g{generation}_s{couple_no}_{child_no}");
                    records.push(PedigreeRecord::new("GEN", &spouse));
                    next_couples.push((id, spouse));
                }
            }
        }
        couples = next_couples;
    }
    records
}

#[test]
fn deep_wide_pedigree_converges_within_the_cap() {
    let records = generated_pedigree(6);
    assert!(records.len() <= 200, "generator too large: {}", records.len());

    let layout = compute_layout(&records, &LayoutConfig::default()).expect("must converge");
    assert_eq!(layout.nodes.len(), records.len());
    assert!(layout.dropped.is_empty());
    assert_well_formed(&layout, "generated");

    let levels = layout.nodes.iter().map(|n| n.level).max().unwrap() + 1;
    assert_eq!(levels, 6);
}
