use std::fs;

use pastel::prelude::*;

#[test]
fn partial_json() {
    let settings = Settings::from_json(
        r#"{
            "render_api": "headless",
            "window": { "width": 640 },
            "dirty_dispatch": "first_match",
            "frame_timeout_ms": 250
        }"#,
    )
    .unwrap();

    assert_eq!(settings.render_api().unwrap(), RenderApi::Headless);
    assert_eq!(settings.window.width, 640);
    assert_eq!(settings.window.height, 768);
    assert_eq!(settings.dirty_dispatch, DirtyDispatch::FirstMatch);
    assert_eq!(settings.frame_timeout_ms, Some(250));
    assert_eq!(settings.channel_capacity, 16);
    assert!(settings.behaviour.resize_viewport);
}

#[test]
fn malformed_json() {
    assert!(Settings::from_json("{ render_api: }").is_err());
    assert!(Settings::from_json(r#"{ "dirty_dispatch": "sometimes" }"#).is_err());
}

#[test]
fn load() {
    let path = std::env::temp_dir().join(format!("pastel-settings-{}.json", std::process::id()));
    let json = serde_json::to_string(&Settings::headless()).unwrap();
    fs::write(&path, json).unwrap();

    let settings = Settings::load(&path).unwrap();
    fs::remove_file(&path).unwrap();
    assert_eq!(settings, Settings::headless());

    assert!(Settings::load(&path).is_err());
}

#[test]
fn render_apis() {
    let mut settings = Settings::default();
    for (name, api) in &[
        ("opengl", RenderApi::OpenGL),
        ("vulkan", RenderApi::Vulkan),
        ("headless", RenderApi::Headless),
    ] {
        settings.render_api = (*name).to_owned();
        assert_eq!(settings.render_api().unwrap(), *api);
    }

    for name in &["d3d12", "OpenGL", "Vulkan", " headless "] {
        settings.render_api = (*name).to_owned();
        assert!(settings.render_api().is_err());
    }
}
