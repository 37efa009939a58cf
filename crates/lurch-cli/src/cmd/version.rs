/// Print the crate version and, when built by CI, the tag and commit.
pub fn run() -> anyhow::Result<()> {
    println!("lurch {}", env!("CARGO_PKG_VERSION"));
    if let (Some(tag), Some(commit)) = (option_env!("LURCH_VERSION"), option_env!("LURCH_COMMIT")) {
        println!("tag:    {tag}");
        println!("commit: {commit}");
    } else {
        println!("development build");
    }
    Ok(())
}
