mod common;

use common::*;
use std::path::PathBuf;
use vst3_adapter::prelude::*;

#[test]
fn test_default_adapter_config() {
    let adapter = Vst3Adapter::new().unwrap();
    let config = adapter.config();

    assert_eq!(config.audio.sample_rate, 44100.0);
    assert_eq!(config.audio.block_size, 512);
    assert!(config.plugin_root.is_none());
}

#[test]
fn test_config_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("host.json");
    std::fs::write(
        &path,
        r#"{
            "audio": { "sample_rate": 96000.0, "block_size": 64 },
            "plugin_root": "/srv/plugins",
            "scan_paths": ["/opt/vst3"]
        }"#,
    )
    .unwrap();

    let config = HostConfig::from_json_file(&path).unwrap();
    assert_eq!(config.audio.sample_rate, 96000.0);
    assert_eq!(config.audio.block_size, 64);
    assert_eq!(config.plugin_root, Some(PathBuf::from("/srv/plugins")));
    assert_eq!(config.scan_paths, vec![PathBuf::from("/opt/vst3")]);
}

#[test]
fn test_config_round_trip_through_builder() {
    let config = HostConfig::from_json_str(r#"{ "audio": { "sample_rate": 48000.0 } }"#).unwrap();
    let json = config.to_json_string().unwrap();
    assert_eq!(HostConfig::from_json_str(&json).unwrap(), config);

    let adapter = Vst3Adapter::builder().config(config).build().unwrap();
    assert_eq!(adapter.config().audio.sample_rate, 48000.0);
    assert_eq!(adapter.config().audio.block_size, 512);
}

#[test]
fn test_config_errors() {
    assert!(matches!(
        HostConfig::from_json_str("{ not json"),
        Err(Error::ConfigParse(_))
    ));
    assert!(matches!(
        HostConfig::from_json_str(r#"{ "audio": { "block_size": 0 } }"#),
        Err(Error::InvalidConfig(_))
    ));
    assert!(matches!(
        HostConfig::from_json_file("/definitely/not/here.json"),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_plugins_share_adapter_config() {
    let (adapter, _probe, _root) = mock_adapter_with(MockSpec::default(), 22050.0, 128);
    let first = adapter.new_plugin("Mock").unwrap();
    let second = adapter.new_plugin("Mock").unwrap();

    assert_eq!(first.config().sample_rate, 22050.0);
    assert_eq!(second.config().block_size, 128);
}

#[test]
fn test_display_info_does_not_panic() {
    init_logging();
    let (adapter, _probe, _root) = mock_adapter(MockSpec::default());
    let mut plugin = adapter.new_plugin("Mock").unwrap();
    plugin.display_info();
    plugin.open().unwrap();
    plugin.display_info();
}

#[test]
#[ignore = "Requires VST3 plugins to be installed"]
fn test_open_installed_plugin() {
    init_logging();
    let adapter = Vst3Adapter::new().unwrap();
    let plugins = adapter.list_available_plugins();
    let Some(first) = plugins.first() else {
        return;
    };

    let mut plugin = adapter
        .open_plugin(first.to_str().unwrap())
        .expect("plugin should open");
    assert!(plugin.is_active());

    let block = adapter.config().audio.block_size;
    let inputs_count = plugin.get_setting(PluginSetting::NumInputs) as usize;
    let outputs_count = plugin.get_setting(PluginSetting::NumOutputs) as usize;
    let mut inputs = SampleBuffer::new(inputs_count, block);
    let mut outputs = SampleBuffer::new(outputs_count, block);
    plugin.process(&mut inputs, &mut outputs);

    plugin.close();
    assert!(!plugin.is_active());
}
