use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const CAMERA_SHADER: &str = r"#type vertex
#version 450 core
layout(location = 0) in vec3 a_Position;

layout(std140, binding = 0) uniform Camera
{
    mat4 u_ViewProjection;
} u_Camera;

void main()
{
    gl_Position = u_Camera.u_ViewProjection * vec4(a_Position, 1.0);
}

#type pixel
#version 450 core
layout(location = 0) out vec4 o_Color;

layout(std140, binding = 1) uniform Material
{
    vec4 u_Color;
} u_Material;

void main()
{
    o_Color = u_Material.u_Color;
}
";

fn forgec(workdir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_forgec"))
        .current_dir(workdir)
        .env_remove("FORGEC_CONFIG")
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run forgec")
}

fn write_shader(root: &Path) {
    fs::write(root.join("Camera.glsl"), CAMERA_SHADER).unwrap();
}

#[test]
fn compile_warms_both_caches() {
    let root = TempDir::new().unwrap();
    write_shader(root.path());

    let output = forgec(
        root.path(),
        &["compile", "Camera.glsl", "--compiler", "naga", "--cache-dir", "cache"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let cache = root.path().join("cache");
    for extension in [
        ".cached_vulkan.vert",
        ".cached_vulkan.frag",
        ".cached_opengl.vert",
        ".cached_opengl.frag",
    ] {
        assert!(cache.join(format!("Camera.glsl{extension}")).exists(), "{extension}");
    }

    let listing = forgec(root.path(), &["cache", "list", "--cache-dir", "cache"]);
    assert!(listing.status.success());
    let stdout = String::from_utf8_lossy(&listing.stdout);
    assert_eq!(stdout.matches("Camera.glsl.cached_").count(), 4);

    let cleared = forgec(root.path(), &["cache", "clear", "--cache-dir", "cache"]);
    assert!(cleared.status.success());
    assert!(String::from_utf8_lossy(&cleared.stdout).contains("Removed 4 cache entries"));
    assert!(fs::read_dir(&cache).unwrap().next().is_none());
}

#[test]
fn config_file_selects_the_cache_dir() {
    let root = TempDir::new().unwrap();
    write_shader(root.path());
    fs::write(
        root.path().join("forge.toml"),
        "cache-dir = \"configured\"\ncompiler = \"naga\"\n",
    )
    .unwrap();

    let output = forgec(root.path(), &["compile", "Camera.glsl"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(root
        .path()
        .join("configured/Camera.glsl.cached_vulkan.vert")
        .exists());
}

#[test]
fn reflect_emits_json() {
    let root = TempDir::new().unwrap();
    write_shader(root.path());

    let output = forgec(
        root.path(),
        &["reflect", "Camera.glsl", "--json", "--compiler", "naga", "--cache-dir", "cache"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["stage"], "vertex");
    assert_eq!(reports[0]["uniform_buffers"][0]["size"], 64);
    assert_eq!(reports[1]["stage"], "fragment");
    assert_eq!(reports[1]["uniform_buffers"][0]["binding"], 1);
}

#[test]
fn split_lists_stages_and_rejects_unknown_ones() {
    let root = TempDir::new().unwrap();
    write_shader(root.path());

    let output = forgec(root.path(), &["split", "Camera.glsl"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("vertex"));
    assert!(stdout.contains("fragment"));

    fs::write(root.path().join("Bad.glsl"), "#type hull\nvoid main() {}\n").unwrap();
    let output = forgec(root.path(), &["split", "Bad.glsl"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid shader type 'hull'"));
}
