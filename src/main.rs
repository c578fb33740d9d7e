//! Appearance Forwarder - forward NPC appearance overrides and their assets into one plugin.
//!
//! # Execution Flow
//!
//! 1. Initialize logging -> logs/appearance-forwarder.<date>
//! 2. Load `Forwarder Settings.yaml` from the config directory, apply CLI overrides
//! 3. Validate the output directory and mods folder
//! 4. Load `Warnings To Suppress.json`
//! 5. Resolve the plugin -> source folder map
//! 6. Load the load order snapshot and forward every configured plugin
//! 7. Write the output plugin and log a summary
//!
//! # Configuration Files
//!
//! Expected in the config directory (default `Forwarder Data/`):
//! - `Forwarder Settings.yaml`: plugins to forward, output directory, mods folder, mode
//! - `Warnings To Suppress.json`: known missing files (required only when suppression is on)

use anyhow::{Context, Result};
use appearance_forwarder::logging::{LogOptions, setup_logging};
use appearance_forwarder::services::resolve_plugin_directories;
use appearance_forwarder::{
    APP_NAME, ConfigManager, ForwardingService, LoadOrder, PatchPlugin, VERSION,
};
use camino::Utf8PathBuf;
use clap::Parser;

#[derive(Parser)]
#[command(name = "appearance-forwarder")]
#[command(about = "Forward NPC appearance overrides and their assets into one plugin", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the settings file and the known missing files list
    #[arg(long, default_value = "Forwarder Data")]
    config_dir: Utf8PathBuf,

    /// Load order snapshot (YAML) to read records from
    #[arg(long)]
    load_order: Utf8PathBuf,

    /// Active data folder; overrides DataFolderPath from the settings file
    #[arg(long)]
    data_folder: Option<Utf8PathBuf>,

    /// Where to write the output plugin; defaults to <output plugin name>.yaml in the
    /// asset output directory
    #[arg(long)]
    output_plugin: Option<Utf8PathBuf>,

    /// Directory for log files
    #[arg(long, default_value = "logs")]
    log_dir: Utf8PathBuf,

    /// Log at debug level
    #[arg(long)]
    debug: bool,

    /// Only log to the log file
    #[arg(long)]
    no_console: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = setup_logging(&LogOptions {
        log_dir: &cli.log_dir,
        log_prefix: APP_NAME,
        debug_mode: cli.debug,
        console_output: !cli.no_console,
    })?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let config_manager = ConfigManager::new(&cli.config_dir)?;
    let mut settings = config_manager.load_settings()?;
    if let Some(data_folder) = cli.data_folder {
        settings.data_folder_path = data_folder;
    }

    ConfigManager::validate_runnability(&settings)?;

    let warnings_to_suppress =
        config_manager.load_warnings_to_suppress(settings.suppress_known_missing_file_warnings)?;

    let directories = resolve_plugin_directories(
        settings.plugins_to_forward.iter().map(|entry| &entry.plugin),
        settings.mode,
        &settings.mods_folder_path,
        &settings.data_folder_path,
    )?;

    let load_order = LoadOrder::from_yaml_file(&cli.load_order)?;
    let mut patch = PatchPlugin::new(settings.output_plugin_name.as_str());

    let service = ForwardingService::new(&settings, &warnings_to_suppress);
    let report = service
        .run(&load_order, &mut patch, &directories)
        .context("Forwarding failed")?;

    let output_plugin = cli.output_plugin.unwrap_or_else(|| {
        settings
            .asset_output_directory
            .join(format!("{}.yaml", settings.output_plugin_name))
    });
    patch.write_yaml(&output_plugin)?;

    tracing::info!(
        "Forwarded {} NPCs from {} plugins",
        report.npcs_forwarded(),
        report.plugins.len()
    );
    service.metrics().log_summary();

    Ok(())
}
