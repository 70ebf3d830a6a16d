#![forbid(unsafe_code)]

// Embed build information for the /version endpoint.  The crate may be
// built outside a git work tree, so every value falls back to "unknown"
// instead of failing the build.
fn main() {
    emit("GIT_BRANCH", build_data::get_git_branch().ok());
    emit("GIT_COMMIT_SHORT", build_data::get_git_commit_short().ok());
    emit("GIT_DIRTY", build_data::get_git_dirty().ok().map(|d| d.to_string()));
    emit("RUSTC_VERSION", build_data::get_rustc_version().ok());
}

fn emit(name: &str, value: Option<String>) {
    println!("cargo:rustc-env={}={}", name, value.unwrap_or_else(|| "unknown".to_string()));
}
