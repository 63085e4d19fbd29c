use std::path::Path;

pub async fn builds(config: &Path, app: &str) -> anyhow::Result<()> {
    let settings = super::load_settings(config)?;
    let deployer = super::deployer(&settings)?;

    let builds = deployer.get_builds(app).await?;
    if builds.is_empty() {
        println!("No builds for {app}.");
        return Ok(());
    }

    println!("{:<38} {:<12} CREATED", "ID", "STATUS");
    for build in &builds {
        println!(
            "{:<38} {:<12} {}",
            build.id,
            build.status,
            build.created_at.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
