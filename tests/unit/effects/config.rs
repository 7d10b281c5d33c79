use super::*;

#[test]
fn default_config_is_valid_and_inert() {
    let cfg = EffectConfig::default();
    cfg.validate(2).unwrap();
    assert!(!cfg.blurs(0));
    assert!(!cfg.fogs(1));
    assert_eq!(cfg.opacity(1), 1.0);
}

#[test]
fn effects_apply_only_to_selected_layers() {
    let cfg = EffectConfig {
        blur: 2.0,
        blur_layers: vec![1],
        fog: 40,
        fog_layers: vec![0],
        ..EffectConfig::default()
    };
    cfg.validate(2).unwrap();
    assert!(cfg.blurs(1));
    assert!(!cfg.blurs(0));
    assert!(cfg.fogs(0));
    assert!(!cfg.fogs(1));
}

#[test]
fn out_of_range_layers_and_values_are_rejected() {
    let bad_layer = EffectConfig {
        blur: 1.0,
        blur_layers: vec![2],
        ..EffectConfig::default()
    };
    assert!(bad_layer.validate(2).is_err());

    let bad_blur = EffectConfig {
        blur: -0.5,
        ..EffectConfig::default()
    };
    assert!(bad_blur.validate(2).is_err());

    let mut bad_opacity = EffectConfig::default();
    bad_opacity.layer_opacity.insert(0, 1.5);
    assert!(bad_opacity.validate(2).is_err());
}

#[test]
fn json_roundtrip_keeps_integer_layer_keys() {
    let mut cfg = EffectConfig {
        fog: 12,
        fog_layers: vec![1],
        ..EffectConfig::default()
    };
    cfg.layer_opacity.insert(1, 0.25);

    let s = serde_json::to_string(&cfg).unwrap();
    let back: EffectConfig = serde_json::from_str(&s).unwrap();
    assert_eq!(back, cfg);

    let partial: EffectConfig = serde_json::from_str(r#"{"blur": 1.5}"#).unwrap();
    assert_eq!(partial.blur, 1.5);
    assert_eq!(partial.fog_color, [255, 255, 255]);
}
