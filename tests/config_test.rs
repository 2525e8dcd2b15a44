use anyhow::Result;
use mfc_control::config::{Config, ControllerConfig, DeviceDriver};
use tempfile::tempdir;

#[test]
fn test_config_load_and_save() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("mfc_config.yaml");

    let mut config = Config::default();
    config.acquisition.read_interval = 2.5;
    config.acquisition.error_backoff = 0.5;
    config.ui.title = "Test bench".to_string();
    config.controllers = vec![
        ControllerConfig::new("N2", "TDAC0", "AIN0", 2.0, 5.0, 1500.0),
        ControllerConfig::new("O2", "TDAC1", "AIN1", 0.5, -1.0, 0.0),
    ];

    config.save_to_file(&config_path)?;
    let loaded = Config::from_file(&config_path)?;

    assert_eq!(loaded.acquisition.read_interval, 2.5);
    assert_eq!(loaded.acquisition.error_backoff, 0.5);
    assert_eq!(loaded.ui.title, "Test bench");
    assert_eq!(loaded.controller_names(), vec!["N2", "O2"]);
    assert_eq!(loaded.controllers[0].scale, 2.0);
    assert_eq!(loaded.controllers[0].offset, 5.0);
    assert_eq!(loaded.controllers[0].setpoint, 1500.0);
    assert_eq!(loaded.controllers[1].offset, -1.0);

    Ok(())
}

#[test]
fn test_full_yaml_is_accepted() -> Result<()> {
    let yaml = r#"
acquisition:
  read_interval: 0.5
  error_backoff: 0.25
device:
  driver: labjack
  device_type: T7
  connection_type: USB
  identifier: ANY
  library_path: /usr/local/lib/libLabJackM.so
  simulation:
    min_raw: 1.0
    max_raw: 5.0
datalog:
  directory: /tmp/mfc
  file_prefix: RUN
ui:
  title: Gas bench
  layout_image: mfc_layout.png
  controllers_per_column: 2
  image_max_size: 300
  setpoint_min: 0.0
  setpoint_max: 500.0
  setpoint_step: 10.0
controllers:
  - name: N2
    flow_set: TDAC0
    flow_read: AIN0
    scale: 100.0
    offset: 0.0
    setpoint: 50.0
"#;
    let config = Config::from_yaml_str(yaml)?;
    assert_eq!(config.device.driver, DeviceDriver::Labjack);
    assert_eq!(config.device.device_type, "T7");
    assert_eq!(config.datalog.file_prefix, "RUN");
    assert_eq!(config.ui.controllers_per_column, 2);
    assert_eq!(config.ui.image_max_size, 300);
    assert_eq!(config.controllers[0].scale, 100.0);
    Ok(())
}

#[test]
fn test_config_validation() {
    let valid = r#"
controllers:
  - name: A
    flow_set: TDAC0
    flow_read: AIN0
"#;
    assert!(Config::from_yaml_str(valid).is_ok());

    // Schema: unknown field
    let unknown_field = r#"
controllers:
  - name: A
    flow_set: TDAC0
    flow_read: AIN0
    colour: red
"#;
    assert!(Config::from_yaml_str(unknown_field).is_err());

    // Schema: zero scale
    let zero_scale = r#"
controllers:
  - name: A
    flow_set: TDAC0
    flow_read: AIN0
    scale: 0
"#;
    assert!(Config::from_yaml_str(zero_scale).is_err());

    // Schema: empty list
    assert!(Config::from_yaml_str("controllers: []\n").is_err());

    // Semantic rule: duplicate names
    let duplicates = r#"
controllers:
  - name: A
    flow_set: TDAC0
    flow_read: AIN0
  - name: A
    flow_set: TDAC1
    flow_read: AIN1
"#;
    assert!(Config::from_yaml_str(duplicates).is_err());

    // Semantic rule: backoff longer than the interval
    let long_backoff = r#"
acquisition:
  read_interval: 1.0
  error_backoff: 2.0
controllers:
  - name: A
    flow_set: TDAC0
    flow_read: AIN0
"#;
    assert!(Config::from_yaml_str(long_backoff).is_err());
}

#[test]
fn test_interval_limits() {
    let yaml = |interval: &str, backoff: &str| {
        format!(
            "acquisition:\n  read_interval: {}\n  error_backoff: {}\ncontrollers:\n  - name: A\n    flow_set: TDAC0\n    flow_read: AIN0\n",
            interval, backoff
        )
    };

    // Rounds to a zero duration
    assert!(Config::from_yaml_str(&yaml("1e-10", "1e-10")).is_err());
    // Does not fit in a duration
    assert!(Config::from_yaml_str(&yaml("1e30", "1.0")).is_err());
    // Smallest accepted period
    let config = Config::from_yaml_str(&yaml("0.001", "0.001")).unwrap();
    assert_eq!(
        config.acquisition.read_interval_duration().unwrap(),
        std::time::Duration::from_millis(1)
    );
}
