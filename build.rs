
use std::error::Error;
use vergen_gitcl::{Emitter, GitclBuilder};

/// Emits VERGEN_GIT_DESCRIBE for the version string.
/// # Errors
/// * if `git` is not installed
/// * if there is no .git folder, e.g. when building from a release tarball
fn emit_git() -> Result<(), Box<dyn Error>> {
    let gitcl = GitclBuilder::default()
        .describe(false, true, Some("NoTagShouldMatchThisPattern"))
        .build()?;

    Emitter::default()
        .fail_on_error()
        .add_instructions(&gitcl)?
        .emit()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    if emit_git().is_err() {
        // packagers can pass their own description, otherwise we report "unknown"
        let git_desc = option_env!("READRUNNER_GIT_DESCRIBE")
            .unwrap_or("unknown");
        println!("cargo:rustc-env=VERGEN_GIT_DESCRIBE={git_desc}");
    }

    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=src");
    Ok(())
}
