use crate::error::CliError;
use serde::Serialize;

pub async fn write_json<T: Serialize>(value: &T, path: &str) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
