// src/main.rs
//
// Sanity run: one sound with a few cables and some filter automation,
// driven through a handful of audio blocks.

use automod::automation::{AutomationNode, PlayHead};
use automod::logging::init_logger;
use automod::params::ids::patched;
use automod::{
    DestinationDescriptor, EngineConfig, Globality, ParamManager, ParamTable, PatchSource, Patcher, SourceValues,
};
use log::{LevelFilter, info};

/// ===============================
/// Main
/// ===============================

fn main() -> automod::Result<()> {
    init_logger(LevelFilter::Debug);

    let config = EngineConfig::new().with_timing(192.0, 44_100.0).validated();
    let block_samples: u32 = 128;
    let clip_length: u32 = 192;

    // --------------------------------
    // Sound setup
    // --------------------------------

    let mut manager = ParamManager::new(config);
    manager.setup_with_patching()?;
    manager.ensure_expression_param_set_exists(false)?;

    if let Some(cables) = manager.cables_mut() {
        cables.add_cable(PatchSource::Envelope0, DestinationDescriptor::Param(patched::LPF_FREQ), 1 << 29)?;
        cables.add_cable(PatchSource::Velocity, DestinationDescriptor::Param(patched::VOLUME), 1 << 30)?;
        cables.add_cable(PatchSource::LfoGlobal1, DestinationDescriptor::Param(patched::MOD_FX_DEPTH), 1 << 28)?;
    }

    if let Some(presets) = manager.patched_mut() {
        presets.insert_node(patched::LPF_FREQ, AutomationNode::ramp(0, -(1 << 30)))?;
        presets.insert_node(patched::LPF_FREQ, AutomationNode::ramp(96, 1 << 30))?;
    }

    // --------------------------------
    // Patchers
    // --------------------------------

    let mut voice = Patcher::new(Globality::Local)?;
    let mut sound = Patcher::new(Globality::Global)?;

    let mut sources = SourceValues::new();
    sources.set(PatchSource::Velocity, 1 << 30);

    manager.set_play_pos(PlayHead::forward(0, clip_length));
    voice.patch_all(&sources, &manager);
    sound.patch_all(&sources, &manager);

    // --------------------------------
    // Run a few blocks
    // --------------------------------

    println!("Starting automation sanity test");

    let ticks_per_block = ((config.ticks_per_sample as u64 * block_samples as u64) >> 32).max(1) as u32;
    let mut pos = 0;
    for block in 0..8 {
        manager.process_current_pos(PlayHead::forward(pos, clip_length), ticks_per_block as i32, false, true);
        manager.tick_samples(block_samples);

        let changed_params = manager.take_patching_changes();
        voice.recalculate_params(&changed_params, &sources, &manager);
        sound.recalculate_params(&changed_params, &sources, &manager);

        let envelope = (block as i32 - 4).saturating_mul(1 << 28);
        let lfo = if block % 2 == 0 { 1 << 30 } else { -(1 << 30) };
        let changed_sources =
            sources.update(PatchSource::Envelope0, envelope) | sources.update(PatchSource::LfoGlobal1, lfo);
        voice.patch_changed(changed_sources, &sources, &manager);
        sound.patch_changed(changed_sources, &sources, &manager);

        println!(
            "Block {} @ tick {}: lpf {} volume {} mod fx depth {}",
            block,
            pos,
            voice.final_value(patched::LPF_FREQ),
            voice.final_value(patched::VOLUME),
            sound.final_value(patched::MOD_FX_DEPTH),
        );

        pos = (pos + ticks_per_block) % clip_length;
    }

    manager.expect_no_further_ticks();
    info!("Sanity test completed");
    println!("Sanity test completed.");
    Ok(())
}
