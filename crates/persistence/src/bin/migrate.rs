#![deny(warnings)]

use anyhow::Context;
use persistence::default_sqlite_url;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_sqlite_url().to_string());
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .filter(|p| !p.starts_with(":memory:"));
    if let Some(parent) = path.and_then(|p| std::path::Path::new(p).parent()) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let pool = persistence::init_db(&url).await?;
    let id = persistence::create_save(&pool, "default", Some("initialized")).await?;
    for save in persistence::list_saves(&pool).await? {
        println!(
            "save {} {:?} latest day {}",
            save.id,
            save.name,
            save.latest_day.map_or_else(|| "-".to_string(), |d| d.to_string())
        );
    }
    println!("DB migrated at {url} (default save {id})");
    Ok(())
}
