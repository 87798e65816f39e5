fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Stamp the demo binary with its build time
    let stamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    println!("cargo:rustc-env=BUILD_DATE={}", stamp);
}
