use automod::automation::{AutoParam, AutoParamState, AutomationNode, is_strictly_increasing};
use automod::params::ids::patched;
use automod::{ParamKind, ParamSet, ParamTable};
use proptest::prelude::*;

const LENGTH: u32 = 960;

#[derive(Clone, Debug)]
enum Edit {
    Insert { pos: u32, value: i32, ramp: bool },
    Delete { pos: u32 },
    SetRegion { value: i32, start: u32, length: u32 },
    Shift { amount: i32 },
    Nudge { pos: u32, offset: i32 },
    DeleteTime { pos: u32, length: u32 },
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0..LENGTH, any::<i32>(), any::<bool>()).prop_map(|(pos, value, ramp)| Edit::Insert { pos, value, ramp }),
        (0..LENGTH).prop_map(|pos| Edit::Delete { pos }),
        (any::<i32>(), 0..LENGTH, 0..LENGTH + 10).prop_map(|(value, start, length)| Edit::SetRegion {
            value,
            start,
            length,
        }),
        (-2000i32..2000).prop_map(|amount| Edit::Shift { amount }),
        (0..LENGTH, -100i32..100).prop_map(|(pos, offset)| Edit::Nudge { pos, offset }),
        (0..LENGTH, 0u32..200).prop_map(|(pos, length)| Edit::DeleteTime { pos, length }),
    ]
}

fn nodes_strategy(ramp: bool) -> impl Strategy<Value = Vec<AutomationNode>> {
    prop::collection::btree_map(0..LENGTH, any::<i32>(), 1..12).prop_map(move |map| {
        map.into_iter()
            .map(|(pos, value)| AutomationNode::new(pos, value, ramp))
            .collect()
    })
}

fn param_with(nodes: Vec<AutomationNode>, value: i32) -> AutoParam {
    let mut param = AutoParam::new(0);
    let _ = param.restore_state(AutoParamState::new(nodes, value));
    param
}

proptest! {
    #[test]
    fn edits_keep_nodes_strictly_increasing(edits in prop::collection::vec(edit_strategy(), 1..48)) {
        let mut set = ParamSet::new(ParamKind::Patched).unwrap();
        let id = patched::LPF_FREQ;

        for edit in edits {
            match edit {
                Edit::Insert { pos, value, ramp } => {
                    set.insert_node(id, AutomationNode::new(pos, value, ramp)).unwrap();
                }
                Edit::Delete { pos } => set.delete_node_at(id, pos).unwrap(),
                Edit::SetRegion { value, start, length } => {
                    set.set_value_for_region(id, value, start, length, LENGTH, None).unwrap();
                }
                Edit::Shift { amount } => set.shift_horizontally(amount, LENGTH),
                Edit::Nudge { pos, offset } => set.nudge_non_interpolating_nodes_at_pos(pos, offset, LENGTH),
                Edit::DeleteTime { pos, length } => set.delete_time(pos, length),
            }
            let param = set.param(id).unwrap();
            prop_assert!(is_strictly_increasing(param.nodes()));
            prop_assert_eq!(set.summary().automated.contains(id as usize), param.is_automated());
        }
    }

    #[test]
    fn swap_state_twice_restores_both_sides(
        before in nodes_strategy(true),
        value in any::<i32>(),
        region_value in any::<i32>(),
        start in 0..LENGTH,
    ) {
        let mut set = ParamSet::new(ParamKind::Patched).unwrap();
        let id = patched::PAN;
        set.restore_param_state(id, AutoParamState::new(before, value)).unwrap();
        let original = set.param_state(id).unwrap();

        let mut snapshot = set.capture_snapshot(id, false).unwrap();
        set.set_value_for_region(id, region_value, start, 96, LENGTH, None).unwrap();
        let edited = set.param_state(id).unwrap();

        set.swap_state(id, &mut snapshot).unwrap();
        prop_assert_eq!(&set.param_state(id).unwrap(), &original);
        set.swap_state(id, &mut snapshot).unwrap();
        prop_assert_eq!(&set.param_state(id).unwrap(), &edited);
        set.swap_state(id, &mut snapshot).unwrap();
        prop_assert_eq!(&set.param_state(id).unwrap(), &original);
        prop_assert_eq!(set.summary().automated.contains(id as usize), original.is_automated());
    }

    #[test]
    fn trim_leaves_nothing_at_or_beyond_length(nodes in nodes_strategy(false), new_length in 0..LENGTH + 50) {
        let mut param = param_with(nodes, 0);
        let _ = param.trim_to_length(new_length, LENGTH).unwrap();
        prop_assert!(param.nodes().iter().all(|n| n.pos < new_length));
        prop_assert!(is_strictly_increasing(param.nodes()));
    }

    #[test]
    fn pingpong_repeats_are_continuous(nodes in nodes_strategy(true), old_length in 1u32..=LENGTH / 2) {
        let nodes: Vec<_> = nodes.into_iter().filter(|n| n.pos < old_length).collect();
        prop_assume!(!nodes.is_empty());
        let mut param = param_with(nodes, 0);
        let new_length = old_length * 2;
        param.generate_repeats(old_length, new_length, true).unwrap();

        // The return leg mirrors the first, so both sides of each boundary meet.
        for d in 0..=old_length {
            prop_assert_eq!(
                param.value_at(old_length - d, new_length),
                param.value_at((old_length + d) % new_length, new_length)
            );
        }
    }
}

#[test]
fn pingpong_half_mirrors_ascending_half() {
    let param = param_with(vec![AutomationNode::ramp(0, 0), AutomationNode::ramp(480, i32::MAX)], 0);
    assert_eq!(param.value_at(720, 960), param.value_at(240, 960));
}

#[test]
fn stealing_snapshot_leaves_param_static() {
    let mut set = ParamSet::new(ParamKind::Patched).unwrap();
    let id = patched::VOLUME;
    set.insert_node(id, AutomationNode::step(10, 5)).unwrap();
    let mut snapshot = set.capture_snapshot(id, true).unwrap();
    assert!(!set.might_contain_automation());
    set.swap_state(id, &mut snapshot).unwrap();
    assert!(set.might_contain_automation());
    assert_eq!(set.param(id).unwrap().nodes(), &[AutomationNode::step(10, 5)]);
}
