use crustload::{
    crust::{
        field::Component,
        load::LoadType,
        scenario::{region, EarthSettings, Scenario},
    },
    hazard::impact::assess,
    DeformResult,
};
use log::{error, info};
use pretty_env_logger;

fn glacier_demo() -> DeformResult<()> {
    let iceland = region("Iceland")?;
    let earth = EarthSettings {
        time_steps: 10,
        ..EarthSettings::default()
    };
    let scenario = Scenario::glacial_unloading(&iceland, 10.0, 500.0, 0.1, 100.0, &earth)?;
    let results = scenario.run()?;
    for warning in results.warnings.iter() {
        info!("caveat: {}", warning);
    }

    for (time, value) in results.time_series(iceland.lat, iceland.lon, Component::VerticalDisplacement)? {
        info!("t = {:6.1} years, vertical = {:+.4} m", time, value);
    }

    let last = results.steps() - 1;
    let summary = results.summary(last)?;
    info!(
        "max uplift {:.4} m, max subsidence {:.4} m, max strain {:.2} µε, volume {:.3e} m³",
        summary.max_uplift_m,
        summary.max_subsidence_m,
        summary.max_strain_micro,
        summary.volume_change_m3
    );

    let impact = assess(&results, iceland.lat, iceland.lon, last)?;
    info!(
        "risk index {:.2} ({}): {}",
        impact.risk_index,
        impact.risk_level,
        impact.risk_level.advice()
    );

    for load_type in LoadType::array() {
        let preset = Scenario::preset(load_type, &iceland, &earth)?;
        info!(
            "preset {}: {} × {} km at {} km",
            preset.name,
            preset.simulation.region_width_km,
            preset.simulation.region_height_km,
            preset.simulation.resolution_km
        );
    }
    Ok(())
}

fn main() {
    pretty_env_logger::init_timed();
    info!("initialising crustload");
    match glacier_demo() {
        Ok(()) => info!("simulation completed"),
        Err(failure) => error!("simulation failed: {}", failure),
    }
}
