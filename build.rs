fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    #[cfg(target_os = "macos")]
    {
        compile_macos_vision();
    }
}

#[cfg(target_os = "macos")]
fn compile_macos_vision() {
    use std::env;
    use std::path::PathBuf;
    use std::process::Command;

    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR missing"));
    let plugin_dir = manifest_dir.join("plugins/macos-vision");

    let status = Command::new("swift")
        .args([
            "build",
            "-c",
            "release",
            "--package-path",
            plugin_dir.to_str().expect("plugin path invalid UTF-8"),
            "--product",
            "MacOSVision",
        ])
        .status()
        .expect("Failed to spawn swift build");

    if !status.success() {
        panic!("Swift vision plugin build failed");
    }

    let build_output = plugin_dir.join(".build").join("release");
    let build_output = build_output.to_str().expect("link path invalid UTF-8");
    println!("cargo:rustc-link-search=native={build_output}");
    println!("cargo:rustc-link-lib=dylib=MacOSVision");
    println!("cargo:rustc-link-arg=-Wl,-rpath,{build_output}");

    for watched in ["Sources/MacOSVision", "Package.swift"] {
        println!(
            "cargo:rerun-if-changed={}",
            plugin_dir.join(watched).display()
        );
    }
}
