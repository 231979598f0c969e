//! Init command: write a starter `shiprail.toml`

use crate::core::config::ShipConfig;
use crate::core::error::{ShipError, ShipResult};
use std::path::Path;

/// Write the default configuration into `root`
///
/// Refuses to overwrite an existing config (in any search location) unless
/// `force` is set.
pub fn run_init(root: &Path, force: bool) -> ShipResult<()> {
  if let Some(existing) = ShipConfig::find_config_path(root)
    && !force
  {
    return Err(ShipError::with_help(
      format!("Configuration already exists at {}", existing.display()),
      "Use --force to overwrite it with the defaults",
    ));
  }

  let path = ShipConfig::init_template().save(root)?;
  println!("✅ Created {}", path.display());
  println!();
  println!("Next steps:");
  println!("  1. Adjust [commands] for your toolchain and [tools] for what must be on PATH");
  println!("  2. Preview the workflow:  shiprail plan");
  println!("  3. Rehearse a release:    shiprail --dry-run");
  Ok(())
}
