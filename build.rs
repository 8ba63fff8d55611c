// build.rs

fn main() {
    // Linking information for libX11 comes from pkg-config where available;
    // otherwise fall back to the conventional linker flags so the crate still
    // builds on systems without .pc files installed.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("linux") {
        return;
    }

    match pkg_config::probe_library("x11") {
        Ok(_) => {
            eprintln!("pkg-config found libX11. Linking configured automatically.");
        }
        Err(_) => {
            eprintln!("pkg-config failed for 'x11'. Falling back to manual linking.");
            println!("cargo:rustc-link-lib=X11");
            println!("cargo:rustc-link-lib=Xext");
            println!("cargo:rustc-link-search=/usr/lib");
            eprintln!(
                "Manual linking flags applied. Ensure the X11 development libraries are installed."
            );
        }
    }
}
