use automod::params::ids::{expression, patched};
use automod::patch::laws;
use automod::{
    DestinationDescriptor, EngineConfig, Globality, ParamId, ParamManager, ParamTable, PatchSource, Patcher,
    Polarity, SourceValues,
};
use proptest::prelude::*;

fn patched_manager() -> ParamManager {
    let mut manager = ParamManager::new(EngineConfig::default());
    manager.setup_with_patching().unwrap();
    manager
}

fn nonzero_strength() -> impl Strategy<Value = i32> {
    any::<i32>().prop_filter("cables at zero are removed", |s| *s != 0)
}

fn patch(manager: &ParamManager, sources: &SourceValues, p: ParamId) -> i32 {
    let mut patcher = Patcher::new(Globality::Local).unwrap();
    patcher.patch_all(sources, manager);
    patcher.final_value(p)
}

proptest! {
    #[test]
    fn unpatched_params_follow_their_law(p in 0..patched::FIRST_GLOBAL, preset in any::<i32>()) {
        let mut manager = patched_manager();
        manager.patched_mut().unwrap().set_current_value(p, preset).unwrap();

        let expected = laws::final_value(p, laws::default_neutral_value(p), laws::preset_combination(p, preset));
        prop_assert_eq!(patch(&manager, &SourceValues::new(), p), expected);
    }

    #[test]
    fn two_cables_combine_in_either_order(
        p in prop::sample::select(vec![patched::VOLUME, patched::OSC_A_VOLUME, patched::LPF_RES, patched::ENV0_SUSTAIN]),
        value in any::<i32>(),
        a in nonzero_strength(),
        b in nonzero_strength(),
        preset in any::<i32>(),
    ) {
        let mut sources = SourceValues::new();
        sources.set(PatchSource::Velocity, value);
        sources.set(PatchSource::Note, value);
        let destination = DestinationDescriptor::Param(p);

        let mut forward = patched_manager();
        forward.patched_mut().unwrap().set_current_value(p, preset).unwrap();
        let cables = forward.cables_mut().unwrap();
        cables.add_cable(PatchSource::Velocity, destination, a).unwrap();
        cables.add_cable(PatchSource::Note, destination, b).unwrap();

        let mut swapped = patched_manager();
        swapped.patched_mut().unwrap().set_current_value(p, preset).unwrap();
        let cables = swapped.cables_mut().unwrap();
        cables.add_cable(PatchSource::Velocity, destination, b).unwrap();
        cables.add_cable(PatchSource::Note, destination, a).unwrap();

        prop_assert_eq!(patch(&forward, &sources, p), patch(&swapped, &sources, p));
    }

    #[test]
    fn unrelated_source_change_leaves_destination_untouched(
        envelope in any::<i32>(),
        lfo in any::<i32>(),
        strength in nonzero_strength(),
        later_preset in any::<i32>(),
    ) {
        let mut manager = patched_manager();
        let cables = manager.cables_mut().unwrap();
        cables.add_cable(PatchSource::Envelope0, DestinationDescriptor::Param(patched::LPF_FREQ), strength).unwrap();
        cables.add_cable(PatchSource::LfoLocal1, DestinationDescriptor::Param(patched::PAN), strength).unwrap();

        let mut sources = SourceValues::new();
        sources.set(PatchSource::LfoLocal1, lfo);
        let mut patcher = Patcher::new(Globality::Local).unwrap();
        patcher.patch_all(&sources, &manager);
        let pan = patcher.final_value(patched::PAN);

        // Pan's preset moves too, but nothing tells the patcher to revisit it.
        manager.patched_mut().unwrap().set_current_value(patched::PAN, later_preset).unwrap();
        let changed = sources.update(PatchSource::Envelope0, envelope);
        patcher.patch_changed(changed, &sources, &manager);
        prop_assert_eq!(patcher.final_value(patched::PAN), pan);
    }
}

#[test]
fn cloning_without_expression_keeps_held_pitch_bend() {
    let config = EngineConfig::default();
    let mut held = ParamManager::new(config);
    held.setup_with_patching().unwrap();
    held.ensure_expression_param_set_exists(false).unwrap();
    held.expression_mut()
        .unwrap()
        .params_mut()
        .set_current_value(expression::PITCH_BEND, 1 << 28)
        .unwrap();

    let mut source = ParamManager::new(config);
    source.setup_with_patching().unwrap();
    source.ensure_expression_param_set_exists(false).unwrap();
    source.patched_mut().unwrap().set_current_value(patched::LPF_FREQ, 77).unwrap();

    held.clone_from(&source, true, false, None).unwrap();
    assert_eq!(held.patched().unwrap().value(patched::LPF_FREQ), 77);
    assert_eq!(held.expression().unwrap().params().value(expression::PITCH_BEND), 1 << 28);
}

#[test]
fn removing_patching_to_param_takes_range_cables_too() {
    let mut manager = patched_manager();
    let cables = manager.cables_mut().unwrap();
    cables.add_cable(PatchSource::LfoLocal1, DestinationDescriptor::Param(patched::PAN), 1 << 30).unwrap();
    cables
        .add_cable(
            PatchSource::Aftertouch,
            DestinationDescriptor::CableRange { source: PatchSource::LfoLocal1, param: patched::PAN },
            1 << 30,
        )
        .unwrap();
    assert!(cables.destination_for_param(patched::PAN).is_some());

    cables.remove_all_patching_to_param(patched::PAN);
    assert_eq!(cables.num_cables(), 0);

    let mut sources = SourceValues::new();
    sources.set(PatchSource::LfoLocal1, 1 << 30);
    let unpatched = laws::final_value(
        patched::PAN,
        laws::default_neutral_value(patched::PAN),
        laws::preset_combination(patched::PAN, 0),
    );
    assert_eq!(patch(&manager, &sources, patched::PAN), unpatched);
}

#[test]
fn unipolar_cable_rests_at_source_minimum() {
    let destination = DestinationDescriptor::Param(patched::PAN);
    let mut sources = SourceValues::new();
    sources.set(PatchSource::LfoLocal1, i32::MIN);
    let unpatched = laws::final_value(
        patched::PAN,
        laws::default_neutral_value(patched::PAN),
        laws::preset_combination(patched::PAN, 0),
    );

    let mut manager = patched_manager();
    let cables = manager.cables_mut().unwrap();
    cables.add_cable(PatchSource::LfoLocal1, destination, 1 << 30).unwrap();
    assert_ne!(patch(&manager, &sources, patched::PAN), unpatched);

    let cables = manager.cables_mut().unwrap();
    cables.set_cable_polarity(PatchSource::LfoLocal1, destination, Polarity::Unipolar).unwrap();
    assert_eq!(patch(&manager, &sources, patched::PAN), unpatched);
}
