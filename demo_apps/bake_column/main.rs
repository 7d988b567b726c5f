use std::ops::ControlFlow;
use std::path::PathBuf;

use glam::{Affine3A, Vec3};
use vat::animation::ClipKind;
use vat::playback::{LoopMode, VatPlayback};
use vat::prelude::*;
use vat::primitives::{
    ColumnOptions, create_bend_clip, create_column_skeleton, create_skinned_column,
    create_slide_clip,
};

/// Usage: `bake_column [OUTPUT_DIR] [SETTINGS_JSON]`
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let output = PathBuf::from(args.next().unwrap_or_else(|| "vat_out".to_string()));
    let settings = match args.next() {
        Some(path) => BakeSettings::from_json_str(&std::fs::read_to_string(path)?)?,
        None => BakeSettings::default(),
    };
    log::info!("Baking into {} with {settings:?}", output.display());

    let options = ColumnOptions::default();
    let column = SkinnedRig::new(
        "column",
        create_column_skeleton(&options)?,
        vec![create_skinned_column("body", &options)?],
        vec![
            create_bend_clip("bend", &options, 1.0, std::f32::consts::FRAC_PI_2),
            create_slide_clip("slide", 0.5, Vec3::new(0.5, 0.0, 0.0)),
            // Layered on top of another clip at runtime; cannot be baked on its own
            create_bend_clip("lean", &options, 1.0, 0.3).with_kind(ClipKind::Additive),
        ],
    )?
    .with_root_transform(Affine3A::from_translation(Vec3::new(0.0, 0.0, -2.0)));

    let mut targets = vec![BakeTarget::new(column.clone()), BakeTarget::empty("prop")];

    let baker = Baker::new(settings);
    let mut sink = DirectorySink::new(&output);
    let report = baker.bake_batch(&mut targets, &mut sink, |progress| {
        println!(
            "[{:>3.0}%] {}/{}",
            progress.fraction() * 100.0,
            progress.asset,
            progress.clip
        );
        ControlFlow::Continue(())
    });

    println!(
        "{} baked, {} skipped, {} assets failed",
        report.succeeded,
        report.skipped_count(),
        report.failed_assets.len()
    );
    for skipped in &report.skipped {
        println!("  skipped {}/{}: {}", skipped.asset, skipped.clip, skipped.error);
    }
    for failed in &report.failed_assets {
        println!("  failed {}: {}", failed.asset, failed.error);
    }
    for manifest in sink.manifests() {
        println!("Wrote {}", manifest.display());
    }

    // Replay the bend clip the way a VAT shader would: elapsed time -> row
    let mut preview = column;
    let mut memory = MemorySink::new();
    baker.bake_asset(&mut preview, &mut memory);
    if let Some(map) = memory.asset("column").and_then(|a| a.map("bend")) {
        let mut playback = VatPlayback::for_map(map, LoopMode::PingPong);
        let top = map.vertex_count - 1;
        for _ in 0..8 {
            let time = playback.advance(0.3);
            let row = playback.row(map);
            if let Some(p) = map.position(top, row) {
                println!("t={time:.2}s row={row:>2} top=({:.3}, {:.3}, {:.3})", p.x, p.y, p.z);
            }
        }
    }

    Ok(())
}
