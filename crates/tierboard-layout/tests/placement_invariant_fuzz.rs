//! Property/fuzz-style invariants for placement table operations.
//!
//! Random stage/move/remove streams run against the public `PlacementTable`
//! API; after every mutation the layout and placement invariants must hold,
//! positions must already be canonical, and a snapshot of the table must
//! rebuild to an identical table.

use std::collections::BTreeMap;

use proptest::prelude::*;
use tierboard_layout::{
    BoardClick, BoardSession, BoardSnapshot, ItemId, PlacementError, PlacementTable,
    PointerButton, QueueItemSource, SelectionConfig, TemplateCatalog,
};

#[derive(Debug, Clone)]
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        debug_assert!(min <= max);
        if min == max {
            return min;
        }
        let span = u64::from(max - min + 1);
        min + (self.next_u64() % span) as u32
    }

    fn choose_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }

    fn choose_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Stage(ItemId),
    Move {
        item: ItemId,
        from: usize,
        to: usize,
    },
    Remove {
        item: ItemId,
        from: usize,
    },
}

fn placed_items(table: &PlacementTable) -> Vec<(usize, ItemId)> {
    (0..table.tier_count())
        .flat_map(|tier| {
            table
                .items(tier)
                .unwrap_or_default()
                .iter()
                .map(move |placed| (tier, placed.id))
        })
        .collect()
}

fn random_operation(table: &PlacementTable, rng: &mut Lcg, next_id: &mut u64) -> Operation {
    let items = placed_items(table);
    let ranking = table.staging_tier();

    let mut candidates = Vec::new();
    if table.staged_item().is_none() {
        candidates.extend([0usize, 0]); // Stage, weighted
    }
    if !items.is_empty() {
        candidates.extend([1usize, 1, 1]); // Move, weighted
        candidates.push(2); // Remove
    }

    match candidates[rng.choose_index(candidates.len())] {
        0 => {
            let item = ItemId::new(*next_id).expect("ids start at 1");
            *next_id += 1;
            Operation::Stage(item)
        }
        1 => {
            let (from, item) = items[rng.choose_index(items.len())];
            let targets: Vec<usize> = (0..ranking).filter(|&tier| tier != from).collect();
            if targets.is_empty() {
                return Operation::Remove { item, from };
            }
            // Bias towards the top tiers so they cross row boundaries.
            let to = if rng.choose_bool() {
                targets[0]
            } else {
                targets[rng.choose_index(targets.len())]
            };
            Operation::Move { item, from, to }
        }
        _ => {
            let (from, item) = items[rng.choose_index(items.len())];
            Operation::Remove { item, from }
        }
    }
}

fn apply(table: &mut PlacementTable, operation: Operation) -> Result<(), PlacementError> {
    match operation {
        Operation::Stage(item) => table.add_to_staging(item).map(|_| ()),
        Operation::Move { item, from, to } => table.move_item(item, from, to).map(|_| ()),
        Operation::Remove { item, from } => table.remove(item, from),
    }
}

fn assert_table_invariants(table: &mut PlacementTable) {
    let report = table.invariant_report();
    assert!(report.is_clean(), "invariant report: {:?}", report.issues);

    let layout = table.layout();
    assert_eq!(layout.control_row(), layout.total_rows() - 1);
    let staging = table.staging_tier();
    assert!(table.item_count(staging).unwrap_or_default() <= 1);
    for tier in 0..table.tier_count() {
        let count = table.item_count(tier).expect("tier exists");
        let capacity = table.layout().capacity(tier).expect("tier exists");
        assert!(count <= capacity, "tier {tier}: {count} > {capacity}");
    }

    for tier in 0..table.tier_count() {
        assert!(
            !table.recompute_positions(tier),
            "tier {tier} positions were stale after a mutation"
        );
    }
}

fn run_sequence(seed: u64, steps: usize) -> (PlacementTable, Vec<Operation>) {
    let mut rng = Lcg::new(seed);
    let tier_count = rng.next_u32_range(2, 7) as usize;
    let columns = rng.next_u32_range(4, 8) as u16;
    let mut table = PlacementTable::new(tier_count, columns).expect("valid dimensions");
    let mut next_id = 1;
    let mut applied = Vec::with_capacity(steps);

    for step in 0..steps {
        let operation = random_operation(&table, &mut rng, &mut next_id);
        let outcome = apply(&mut table, operation);
        assert!(
            outcome.is_ok(),
            "operation failed at step {step}, seed={seed}, op={operation:?}, err={outcome:?}"
        );
        assert_table_invariants(&mut table);
        applied.push(operation);
    }

    (table, applied)
}

fn snapshot_of(table: &PlacementTable) -> BoardSnapshot {
    BoardSnapshot::capture("fuzz", table, &BTreeMap::new())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn placement_random_operation_sequences_preserve_invariants(
        seed in any::<u64>(),
        steps in 20usize..160,
    ) {
        let (mut table, _) = run_sequence(seed, steps);
        assert_table_invariants(&mut table);
    }

    #[test]
    fn placement_random_operation_sequences_replay_deterministically(
        seed in any::<u64>(),
        steps in 20usize..100,
    ) {
        let (final_table, operations) = run_sequence(seed, steps);
        let final_hash = snapshot_of(&final_table).state_hash();

        let layout = final_table.layout();
        let mut replay = PlacementTable::new(layout.tier_count(), layout.columns())
            .expect("valid dimensions");
        for operation in operations {
            apply(&mut replay, operation).expect("replay operation should succeed");
        }

        prop_assert_eq!(snapshot_of(&replay).state_hash(), final_hash);
        prop_assert_eq!(&replay, &final_table);
    }

    #[test]
    fn placement_snapshot_rebuilds_identical_table(
        seed in any::<u64>(),
        steps in 10usize..120,
    ) {
        let (table, _) = run_sequence(seed, steps);
        let snapshot = snapshot_of(&table);
        let json = snapshot.to_json_pretty().expect("serialize");
        let parsed = BoardSnapshot::from_json_str(&json).expect("parse");
        let rebuilt = parsed.to_table().expect("valid snapshot");
        prop_assert_eq!(rebuilt, table);
    }

    #[test]
    fn rejected_operations_leave_table_untouched(
        seed in any::<u64>(),
        steps in 10usize..80,
    ) {
        let (mut table, _) = run_sequence(seed, steps);
        let before = table.clone();
        let staging = table.staging_tier();

        for (tier, item) in placed_items(&table) {
            prop_assert!(table.move_item(item, tier, tier).is_err());
            prop_assert!(table.move_item(item, tier, staging).is_err());
            prop_assert!(table.move_item(item, tier, table.tier_count()).is_err());
        }
        let fresh = ItemId::new(u64::MAX).expect("non-zero");
        if table.staged_item().is_some() {
            prop_assert!(table.add_to_staging(fresh).is_err());
        }
        prop_assert!(table.remove(fresh, staging).is_err());
        prop_assert_eq!(table, before);
    }
}

fn random_click(session: &BoardSession, rng: &mut Lcg) -> BoardClick {
    let layout = session.table().layout();
    let cell = session.selection().cell_size();
    // Mostly on-board, occasionally a little outside it.
    let max_x = u32::from(layout.columns()) * cell + cell;
    let max_y = (layout.total_rows() + 1) * cell;
    let x = rng.next_u32_range(0, max_x);
    let y = rng.next_u32_range(0, max_y);
    let button = if rng.next_u32_range(0, 9) == 0 {
        PointerButton::Secondary
    } else {
        PointerButton::Primary
    };
    BoardClick { x, y, button }
}

fn run_session(seed: u64, steps: usize) -> BoardSession {
    let catalog = TemplateCatalog::default();
    let mut rng = Lcg::new(seed);
    let ids: Vec<&str> = catalog.ids().collect();
    let template = ids[rng.choose_index(ids.len())];
    let mut session = BoardSession::from_catalog(&catalog, template, SelectionConfig::default())
        .expect("built-in template");
    let mut source: QueueItemSource = (0..steps).map(|n| format!("Song {n}")).collect();

    for step in 0..steps {
        if rng.next_u32_range(0, 3) == 0 {
            session.draw_next(&mut source).expect("intake never errors");
        } else {
            let click = random_click(&session, &mut rng);
            let outcome = session.click(click);
            assert!(
                outcome.is_ok(),
                "click failed at step {step}, seed={seed}, click={click:?}, err={outcome:?}"
            );
        }
        let report = session.invariant_report();
        assert!(report.is_clean(), "seed={seed} step={step}: {}", report.summary());
    }
    session
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn random_clicks_preserve_session_invariants(
        seed in any::<u64>(),
        steps in 20usize..200,
    ) {
        let session = run_session(seed, steps);
        let snapshot = session.export_state();
        snapshot.validate().expect("exported state is valid");
    }
}

#[test]
fn placement_fuzz_seed_corpus_preserves_invariants() {
    let seeds = [
        0_u64,
        1,
        2,
        3,
        5,
        8,
        13,
        21,
        34,
        55,
        89,
        144,
        u32::MAX as u64,
        (u32::MAX as u64) + 1,
        u64::MAX - 1,
        u64::MAX,
    ];

    for seed in seeds {
        let (mut table, _) = run_sequence(seed, 240);
        assert_table_invariants(&mut table);
        run_session(seed, 240);
    }
}
