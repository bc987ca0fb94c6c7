//! Retirement sweep
//!
//! Moves every directory under `current/` that no longer belongs to a
//! repository of the catalog into `abandoned/`. The move is one-way:
//! nothing ever comes back from `abandoned/` on its own.

use std::collections::HashSet;
use std::io;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::layout::MirrorLayout;

/// Move unexpected directories out of `current/`, returning their names
///
/// Each retired name is reported on stdout as `<dir> abandoned`.
pub fn retire(catalog: &Catalog, layout: &MirrorLayout) -> io::Result<Vec<String>> {
    let expected: HashSet<&str> = catalog.directory_names().into_iter().collect();
    let current = layout.current();

    let mut retired = Vec::new();
    for entry in layout.current_entries()? {
        if expected.contains(entry.as_str()) {
            continue;
        }

        let abandoned = layout.ensure_abandoned()?;
        std::fs::rename(current.join(&entry), abandoned.join(&entry))?;

        println!("{} abandoned", entry);
        retired.push(entry);
    }

    if retired.is_empty() {
        debug!("Nothing to retire under {}", current.display());
    } else {
        info!("Retired {} repositories", retired.len());
    }

    Ok(retired)
}
