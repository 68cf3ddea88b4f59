fn main() {
    // pkg-config knows the library path on most distros; without a .pc file
    // fall back to the default search path plus the usual local prefixes.
    if pkg_config::probe_library("opus").is_ok() {
        return;
    }
    println!("cargo:rustc-link-search=native=/opt/homebrew/lib");
    println!("cargo:rustc-link-search=native=/usr/local/lib");
    println!("cargo:rustc-link-lib=opus");
}
