//! Init command: machine identity plus IDE-row registration.

use anyhow::{Context, Result};

use ua_core::{IdeFamily, IdeInfo};
use ua_db::Database;

use crate::Config;
use crate::machine;

/// Runs the init command.
pub fn run(db: &mut Database, config: &Config, label: Option<&str>) -> Result<()> {
    let identity = machine::init_machine(label)?;
    let family: IdeFamily = config
        .family
        .parse()
        .with_context(|| format!("invalid family {:?} in configuration", config.family))?;
    let ide = IdeInfo::new(identity.machine_id.clone(), config.ide_id.clone(), family)
        .context("invalid installation identity")?;
    let ide_row = db.register_ide(&ide)?;

    println!("Machine ID: {}", identity.machine_id);
    println!("Label:      {}", identity.label);
    println!("IDE row:    {ide_row} ({} / {family})", config.ide_id);
    println!("Saved to:   {}", machine::machine_json_path()?.display());

    Ok(())
}
