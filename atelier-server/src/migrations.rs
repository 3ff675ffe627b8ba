use rust_embed::RustEmbed;
use sqlx::{Pool, Sqlite};

use crate::error::{Error, ErrorType};

#[derive(RustEmbed)]
#[folder = "migrations/"]
pub(crate) struct Migrations;

pub(crate) async fn migrate(pool: &Pool<Sqlite>) -> Result<(), Error> {
    let mut filenames: Vec<_> = Migrations::iter().collect();
    filenames.sort();

    for filename in filenames {
        let file = Migrations::get(&filename).ok_or_else(|| {
            ErrorType::Internal(anyhow::Error::msg(format!(
                "embedded migration `{filename}` disappeared"
            )))
        })?;
        let script = String::from_utf8(file.data.into_owned()).map_err(|_| {
            ErrorType::Internal(anyhow::Error::msg(format!(
                "embedded migration `{filename}` is not valid utf-8"
            )))
        })?;
        sqlx::raw_sql(&script)
            .execute(pool)
            .await
            .map_err(|error| ErrorType::Migration {
                filename: filename.to_string(),
                error,
            })?;
    }
    Ok(())
}
