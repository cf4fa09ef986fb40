use std::path::PathBuf;
use std::process::ExitCode;
use vst3_adapter::prelude::*;

fn usage() -> ExitCode {
    eprintln!("Usage:");
    eprintln!("  vst3-adapter-info [--config <file>] list [root]");
    eprintln!("  vst3-adapter-info [--config <file>] info <name> [root]");
    ExitCode::FAILURE
}

fn build_adapter(config: Option<PathBuf>, root: Option<String>) -> Result<Vst3Adapter> {
    let mut config = match config {
        Some(path) => HostConfig::from_json_file(path)?,
        None => HostConfig::default(),
    };
    if let Some(root) = root {
        config.plugin_root = Some(PathBuf::from(root));
    }
    Vst3Adapter::builder().config(config).build()
}

fn list(adapter: &Vst3Adapter) {
    let plugins = adapter.list_available_plugins();
    if plugins.is_empty() {
        println!("No VST3 plugins found");
    }
    for path in plugins {
        println!("{}", path.display());
    }
}

fn info(adapter: &Vst3Adapter, name: &str) -> Result<()> {
    let mut plugin = adapter.open_plugin(name)?;
    plugin.display_info();

    let warnings: Vec<String> = plugin
        .handle()
        .warnings()
        .iter()
        .map(ToString::to_string)
        .collect();
    let report = serde_json::json!({
        "name": plugin.name(),
        "path": plugin.absolute_path(),
        "location": plugin.location(),
        "type": format!("{:?}", plugin.plugin_type()),
        "inputs": plugin.get_setting(PluginSetting::NumInputs),
        "outputs": plugin.get_setting(PluginSetting::NumOutputs),
        "latency_samples": plugin.get_setting(PluginSetting::InitialDelay),
        "tail_ms": plugin.get_setting(PluginSetting::TailTimeMs),
        "warnings": warnings,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    plugin.close();
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = None;
    if args.first().map(String::as_str) == Some("--config") {
        if args.len() < 2 {
            return usage();
        }
        config = Some(PathBuf::from(args.remove(1)));
        args.remove(0);
    }

    let mut args = args.into_iter();
    let command = args.next();
    let result = match command.as_deref() {
        Some("list") => build_adapter(config, args.next()).map(|adapter| list(&adapter)),
        Some("info") => {
            let Some(name) = args.next() else {
                return usage();
            };
            build_adapter(config, args.next()).and_then(|adapter| info(&adapter, &name))
        }
        _ => return usage(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
