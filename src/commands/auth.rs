use std::path::Path;

use anyhow::Result;
use gamecal_provider_google::authenticate;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Authenticating with Google...");

    // Provider handles the full OAuth flow and stores the session
    let account = authenticate::run().await?;

    println!("Authenticated as: {}\n", account);
    println!(
        "Set this in {} to sync with this account:\n\n  google_account = \"{}\"",
        config_path.display(),
        account
    );

    Ok(())
}
