pub mod parse;
#[cfg(target_os = "windows")]
pub mod windows;

use std::path::{Component, Path};

use crate::capacity::CapacityProbe;

/// Drive designator (`"C:"`) of `path`, if it carries one.
pub fn volume_designator(path: &Path) -> Option<String> {
    path.components().find_map(|component| match component {
        Component::Prefix(prefix) => match prefix.kind() {
            std::path::Prefix::Disk(letter) | std::path::Prefix::VerbatimDisk(letter) => {
                Some(format!("{}:", (letter as char).to_ascii_uppercase()))
            }
            _ => None,
        },
        _ => None,
    })
}

/// The capacity probe for the running platform.
pub fn default_probe() -> Box<dyn CapacityProbe> {
    #[cfg(target_os = "windows")]
    {
        Box::new(windows::WindowsProbe::default())
    }
    #[cfg(not(target_os = "windows"))]
    {
        Box::new(crate::capacity::NoCapacityProbe)
    }
}
