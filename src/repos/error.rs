/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 * - unique violation (23505) は Conflict として区別する
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("conflict")]
    Conflict,
}

pub type RepoResult<T> = Result<T, RepoError>;

impl RepoError {
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(dbe) = &e
            && dbe.code().as_deref() == Some("23505")
        {
            return RepoError::Conflict;
        }
        RepoError::Db(e)
    }
}
