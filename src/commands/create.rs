//! Create a new migration script from the template

use anyhow::Result;
use std::path::Path;

use crate::services::scaffold;
use crate::ui;

pub async fn execute(name: String, directory: String) -> Result<()> {
    let path = scaffold::create_migration_script(&name, Path::new(&directory))?;
    ui::print_success(&format!("Created migration script: {}", path.display()));
    Ok(())
}
