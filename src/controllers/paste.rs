use tracing::{info, warn};
use uuid::Uuid;

use crate::envelope::{self, AuthenticationFailure, Password};
use crate::expiry::Expiry;
use crate::models::Paste;
use crate::store::PasteStore;
use crate::App;

/// Outcome of an unlock attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum Unlock {
    Opened(Vec<u8>),
    /// Wrong or missing password, or a damaged ciphertext.
    Denied,
}

/// Store a new paste, sealing it first when a password is given.
pub async fn create(
    app: &mut App,
    content: String,
    expiry: Expiry,
    password: Option<Password>,
) -> crate::AppResult<Paste> {
    let id = Uuid::new_v4().to_string();
    let created_at = app.clock.now();
    let size = content.len();

    let (content, salt) = match password {
        Some(password) => {
            let sealed =
                derive_off_thread(app, move || envelope::encrypt(content.as_bytes(), &password))
                    .await??;
            (sealed.ciphertext, Some(sealed.salt.as_bytes().to_vec()))
        }
        None => (content.into_bytes(), None),
    };

    let paste = Paste {
        id,
        content,
        created_at,
        expire_at: expiry.expire_at(created_at),
        salt,
    };

    info!(
        "new paste: id='{id}', size={size}, protected={protected}, expiry={expiry}",
        id = paste.id,
        protected = paste.is_protected(),
    );

    app.store.create(&paste).await?;
    Ok(paste)
}

/// Load a live paste. An expired paste is deleted and reported as missing.
pub async fn open(app: &mut App, id: &str) -> crate::AppResult<Paste> {
    let paste = app.store.get(id).await?;

    if paste.is_expired(app.clock.now()) {
        info!("deleting expired paste: {id}");
        app.store.delete(id).await?;
        return Err(crate::AppError::NotFound);
    }

    Ok(paste)
}

/// Recover a paste's content with a candidate password.
///
/// Unprotected pastes open regardless of the password.
pub async fn unlock(
    app: &mut App,
    id: &str,
    password: Option<Password>,
) -> crate::AppResult<Unlock> {
    let paste = open(app, id).await?;

    let Some(salt) = paste.salt else {
        return Ok(Unlock::Opened(paste.content));
    };
    let Some(password) = password else {
        return Ok(Unlock::Denied);
    };

    let ciphertext = paste.content;
    let result =
        derive_off_thread(app, move || envelope::decrypt(&ciphertext, &salt, &password)).await?;

    match result {
        Ok(plaintext) => Ok(Unlock::Opened(plaintext)),
        Err(AuthenticationFailure) => {
            warn!("failed unlock attempt for paste {id}");
            Ok(Unlock::Denied)
        }
    }
}

/// Delete every expired paste.
pub async fn purge_expired(app: &mut App) -> crate::AppResult<u64> {
    let count = app.store.delete_expired(app.clock.now()).await?;

    if count > 0 {
        info!("deleted {count} expired pastes");
    }

    Ok(count)
}

/// Run password key derivation on the blocking pool, a few at a time.
///
/// The permit travels with the blocking task, so a dropped request still
/// counts against the limit until its derivation finishes.
async fn derive_off_thread<T, F>(app: &App, work: F) -> crate::AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let permit = app.kdf_limit.clone().acquire_owned().await?;
    Ok(tokio::task::spawn_blocking(move || {
        let _permit = permit;
        work()
    })
    .await?)
}
