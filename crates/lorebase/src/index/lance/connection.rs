//! Database connection management for LanceDB

use anyhow::{anyhow, Result};
use lancedb::{connect, Connection};
use std::path::Path;

/// Open a LanceDB connection.
///
/// `uri` is a local directory (created if missing), `memory://`, or a remote
/// `db://` database. The API key only applies to remote databases.
pub async fn create_connection(uri: &str, api_key: Option<&str>) -> Result<Connection> {
  if is_local_path(uri) {
    ensure_data_directory_exists(Path::new(uri))?;
  }

  #[allow(unused_mut)]
  let mut builder = connect(uri);

  if let Some(key) = api_key {
    #[cfg(feature = "remote-index")]
    {
      builder = builder.api_key(key);
    }
    #[cfg(not(feature = "remote-index"))]
    {
      let _ = key;
      scribe::warn!("Index API key ignored; remote LanceDB needs the remote-index feature");
    }
  }

  builder.execute().await.map_err(|e| anyhow!("Failed to connect to LanceDB at {}: {}", uri, e))
}

/// Anything without a URI scheme is treated as a directory
fn is_local_path(uri: &str) -> bool {
  !uri.contains("://")
}

/// Create data directory if it doesn't exist
fn ensure_data_directory_exists(data_dir: &Path) -> Result<()> {
  if !data_dir.exists() {
    std::fs::create_dir_all(data_dir)
      .map_err(|e| anyhow!("Failed to create data directory {}: {}", data_dir.display(), e))?;
  }
  Ok(())
}
