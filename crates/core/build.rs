use std::env;

fn main() {
	let out_dir = env::var("OUT_DIR").unwrap();
	// Adopted from https://github.com/uutils/coreutils/blob/main/src/uu/stdbuf/build.rs
	let profile_name = out_dir
		.split(std::path::MAIN_SEPARATOR)
		.nth_back(3)
		.unwrap();
	let target = env::var("TARGET").unwrap();
	let git_revision = env::var("GIT_REVISION").unwrap_or_else(|_| "unknown".to_string());

	println!(
		"cargo:rustc-env=UPSTREAM_PLUGINS_BUILD_RUSTC_VERSION={}",
		rustc_version::version().unwrap()
	);
	println!("cargo:rustc-env=UPSTREAM_PLUGINS_BUILD_PROFILE_NAME={profile_name}");
	println!("cargo:rustc-env=UPSTREAM_PLUGINS_BUILD_TARGET={target}");
	println!("cargo:rustc-env=UPSTREAM_PLUGINS_BUILD_GIT_REVISION={git_revision}");
	println!("cargo:rerun-if-env-changed=GIT_REVISION");
}
