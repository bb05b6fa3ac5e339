//! Game system catalog.
//!
//! A games root contains one folder per emulated system, each carrying a
//! `system.yaml` descriptor plus `roms/` and `saves/` subfolders. The game
//! catalog is kept separate from the media catalog on purpose: the two are
//! different catalog types that merely share a wire representation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Name of the per-system descriptor file.
const SYSTEM_DESCRIPTOR: &str = "system.yaml";

/// Extension used by libretro-style save files.
const SAVE_EXTENSION: &str = "srm";

/// Per-system descriptor, loaded from `system.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemDescriptor {
    /// Short name; also the folder name by convention.
    pub name: String,
    pub long_name: String,
    /// Comma separated list of rom file extensions.
    pub extensions: String,
    pub launch_cmd: String,
    pub theme: String,
}

#[derive(Debug, Clone)]
pub struct Game {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Save {
    pub name: String,
}

/// One emulated system with its discovered games and saves.
#[derive(Debug, Clone)]
pub struct GameSystem {
    pub descriptor: SystemDescriptor,
    pub games: Vec<Game>,
    pub saves: Vec<Save>,
}

/// Flattened, indexable view over all discovered games, mirroring the media
/// catalog shape for serialization.
#[derive(Debug, Default)]
pub struct GameCatalog {
    entries: Vec<GameEntry>,
}

#[derive(Debug, Clone)]
pub struct GameEntry {
    pub id: u32,
    /// System short name; plays the role of the section.
    pub system: String,
    pub name: String,
    pub rel_path: String,
}

impl GameCatalog {
    pub fn from_systems(systems: &[GameSystem]) -> Self {
        let mut entries = Vec::new();
        for system in systems {
            for game in &system.games {
                entries.push(GameEntry {
                    id: entries.len() as u32,
                    system: system.descriptor.name.clone(),
                    name: game.name.clone(),
                    rel_path: "roms".to_string(),
                });
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEntry> {
        self.entries.iter()
    }
}

/// Scans a games root for systems. A missing or invalid root yields an empty
/// list, never an error.
pub fn scan_game_systems(root: &Path) -> Vec<GameSystem> {
    if !root.is_dir() {
        warn!(path = %root.display(), "games root is not a valid directory, skipping");
        return Vec::new();
    }

    let mut systems = Vec::new();
    let mut dirs: Vec<PathBuf> = match fs::read_dir(root) {
        Ok(read) => read
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .collect(),
        Err(err) => {
            warn!(path = %root.display(), error = %err, "cannot read games root");
            return Vec::new();
        }
    };
    dirs.sort();

    for dir in dirs {
        if let Some(system) = scan_system(&dir) {
            info!(
                system = system.descriptor.name.as_str(),
                games = system.games.len(),
                saves = system.saves.len(),
                "registered game system"
            );
            systems.push(system);
        }
    }

    systems
}

fn scan_system(dir: &Path) -> Option<GameSystem> {
    let descriptor_path = dir.join(SYSTEM_DESCRIPTOR);
    if !descriptor_path.is_file() {
        return None;
    }

    let raw = match fs::read_to_string(&descriptor_path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(path = %descriptor_path.display(), error = %err, "cannot read system descriptor");
            return None;
        }
    };

    let descriptor: SystemDescriptor = match serde_yaml::from_str(&raw) {
        Ok(d) => d,
        Err(err) => {
            warn!(path = %descriptor_path.display(), error = %err, "invalid system descriptor, skipping folder");
            return None;
        }
    };

    if descriptor.name.is_empty()
        || descriptor.long_name.is_empty()
        || descriptor.launch_cmd.is_empty()
        || descriptor.theme.is_empty()
    {
        warn!(path = %descriptor_path.display(), "missing value in system descriptor, skipping folder");
        return None;
    }

    let extensions: Vec<String> = descriptor
        .extensions
        .split(',')
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();
    if extensions.is_empty() {
        warn!(system = descriptor.name.as_str(), "zero rom extensions, skipping system");
        return None;
    }

    let games = collect_files(&dir.join("roms"), |ext| {
        extensions.iter().any(|e| e.as_str() == ext)
    })
    .into_iter()
    .map(|name| Game { name })
    .collect();

    let saves = collect_files(&dir.join("saves"), |ext| ext == SAVE_EXTENSION)
        .into_iter()
        .map(|name| Save { name })
        .collect();

    Some(GameSystem {
        descriptor,
        games,
        saves,
    })
}

/// Recursively collects file names under `dir` whose lowercase extension
/// passes the filter. Missing directories yield an empty list.
fn collect_files(dir: &Path, accept: impl Fn(&str) -> bool + Copy) -> Vec<String> {
    let mut names = Vec::new();
    let Ok(read) = fs::read_dir(dir) else {
        return names;
    };

    let mut paths: Vec<PathBuf> = read.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            names.extend(collect_files(&path, accept));
            continue;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !accept(&ext) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn write_descriptor(dir: &Path, body: &str) {
        fs::write(dir.join(SYSTEM_DESCRIPTOR), body).unwrap();
    }

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    const SNES: &str = "name: snes\nlong_name: Super Nintendo\nextensions: sfc, smc\nlaunch_cmd: retroarch -L snes9x\ntheme: snes\n";

    #[test]
    fn scans_a_system_with_roms_and_saves() {
        let root = tempfile::tempdir().unwrap();
        let sys = root.path().join("snes");
        fs::create_dir_all(sys.join("roms")).unwrap();
        fs::create_dir_all(sys.join("saves")).unwrap();
        write_descriptor(&sys, SNES);
        touch(&sys.join("roms/zelda.sfc"));
        touch(&sys.join("roms/readme.txt"));
        touch(&sys.join("roms/mario.smc"));
        touch(&sys.join("saves/zelda.srm"));

        let systems = scan_game_systems(root.path());
        assert_eq!(systems.len(), 1);

        let snes = &systems[0];
        assert_eq!(snes.descriptor.long_name, "Super Nintendo");
        let mut games: Vec<&str> = snes.games.iter().map(|g| g.name.as_str()).collect();
        games.sort();
        assert_eq!(games, vec!["mario.smc", "zelda.sfc"]);
        assert_eq!(snes.saves.len(), 1);
        assert_eq!(snes.saves[0].name, "zelda.srm");
    }

    #[test]
    fn descriptor_with_missing_fields_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        let sys = root.path().join("broken");
        fs::create_dir_all(&sys).unwrap();
        write_descriptor(&sys, "name: broken\nlong_name: ''\nextensions: bin\nlaunch_cmd: run\ntheme: t\n");

        assert!(scan_game_systems(root.path()).is_empty());
    }

    #[test]
    fn folder_without_descriptor_is_ignored() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("random")).unwrap();

        assert!(scan_game_systems(root.path()).is_empty());
    }

    #[test]
    fn missing_root_yields_empty_list() {
        assert!(scan_game_systems(Path::new("/nonexistent/cmcast-games")).is_empty());
    }

    #[test]
    fn game_catalog_flattens_systems_in_order() {
        let root = tempfile::tempdir().unwrap();
        let sys = root.path().join("snes");
        fs::create_dir_all(sys.join("roms")).unwrap();
        write_descriptor(&sys, SNES);
        touch(&sys.join("roms/a.sfc"));
        touch(&sys.join("roms/b.sfc"));

        let systems = scan_game_systems(root.path());
        let catalog = GameCatalog::from_systems(&systems);

        assert_eq!(catalog.len(), 2);
        for (i, entry) in catalog.iter().enumerate() {
            assert_eq!(entry.id as usize, i);
            assert_eq!(entry.system, "snes");
            assert_eq!(entry.rel_path, "roms");
        }
    }
}
