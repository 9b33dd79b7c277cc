use tracing::info;

use crate::controllers::paste;
use crate::App;

pub async fn run(mut app: App) -> anyhow::Result<()> {
    let count = paste::purge_expired(&mut app).await?;
    info!("purge finished, {count} pastes removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::expiry::Expiry;
    use crate::store::PasteStore;

    #[tokio::test]
    async fn purges_through_shared_store() {
        let (mut app, clock) = crate::test_app();
        let paste = paste::create(&mut app, "gone soon".to_owned(), Expiry::TenMinutes, None)
            .await
            .unwrap();

        clock.advance(Duration::minutes(11));
        run(app.clone()).await.unwrap();

        assert!(app.store.get(&paste.id).await.is_err());
    }
}
