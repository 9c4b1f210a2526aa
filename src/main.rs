//! Mod Utils demo entry point
//!
//! Registers itself as a mod, saves a few values through the JSON file store
//! and reads them back. Pass a config file path as the first argument to
//! override the save directory.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::path::PathBuf;

    use mod_utils::SaveLoadConfig;

    env_logger::init();
    log::info!("Mod Utils (native) starting...");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = SaveLoadConfig::load_or_default(config_path.as_deref());
    log::info!("Saving to {}", config.save_dir.display());

    if let Err(e) = run(&config) {
        log::error!("Save/load round trip failed: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Mods link the library; the demo is native only
}

#[cfg(not(target_arch = "wasm32"))]
fn run(config: &mod_utils::SaveLoadConfig) -> anyhow::Result<()> {
    use std::sync::Arc;

    use glam::Vec3;
    use mod_utils::{JsonFileStore, LoadedMods, ModRegistration, ModuleId, SaveLoad, TypeKey, Value};

    let mut mods = LoadedMods::new();
    mods.register(
        ModuleId::from_module_path(module_path!()),
        ModRegistration::new("ModUtilsDemo", "Mod Utils Demo", env!("CARGO_PKG_VERSION")),
    );
    let store = Arc::new(JsonFileStore::from_config(config));
    SaveLoad::from_config(config, Arc::new(mods), store).install()?;
    let save_load = SaveLoad::global()?;

    let _frame = mod_utils::call_frame!("run");
    let spawn = Vec3::new(-1452.5, -2.1, 1058.0);

    for result in save_load.write_values(&[
        ("radio_volume", Value::new(0.8_f32)),
        ("radio_station", Value::new("Radio Perkele".to_string())),
        ("spawn_point", Value::new(spawn)),
    ])? {
        result?;
    }

    let volume = save_load.read::<f32>("radio_volume")?;
    let station = save_load
        .read_value("radio_station", TypeKey::of::<String>())?
        .and_then(|v| v.downcast::<String>().ok());
    let saved_spawn = save_load.read::<Vec3>("spawn_point")?;
    let missing = save_load.read::<i32>("never_saved")?;

    println!("radio_volume  = {:?}", volume);
    println!("radio_station = {:?}", station);
    println!("spawn_point   = {:?}", saved_spawn);
    println!("never_saved   = {:?}", missing);

    if saved_spawn != Some(spawn) {
        anyhow::bail!("spawn point read back as {:?}, expected {:?}", saved_spawn, spawn);
    }
    println!("✓ Save/load round trip passed!");

    let stats = save_load.resolver().stats();
    log::info!(
        "Resolver: {} walks, {} cache hits, {} registry lookups",
        stats.walks,
        stats.cache_hits,
        stats.registry_lookups
    );
    Ok(())
}
