//! List your studies and the broadcast rounds you can push to.
//!
//! Create a personal token with `study:read` at
//! <https://lichess.org/account/oauth/token> and run:
//!   LICHESS_TOKEN=lip_xxx cargo run --example list_studies

use futures::StreamExt;
use lichess_auth::EnvTokenStore;
use lichess_client::ClientConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ClientConfig::from_env()?;
    let store = EnvTokenStore::new();
    let Some(session) = lichess_client::resume(&store, &config).await? else {
        eprintln!("set LICHESS_TOKEN to a valid personal access token");
        return Ok(());
    };
    println!("Signed in as {}", session.username);

    let lichess = session.client(&config);

    println!("\nStudies:");
    let studies = lichess.study_stream(&session.username).await?;
    let mut studies = std::pin::pin!(studies);
    while let Some(study) = studies.next().await {
        let study = study?;
        println!("  {}  {}", study.id, study.name);
    }

    println!("\nBroadcast rounds:");
    for round in lichess.my_broadcast_rounds().await? {
        println!("  {}  {}", round.id, round.name);
    }

    Ok(())
}
