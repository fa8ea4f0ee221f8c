//! Parcours du répertoire musical configuré.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::Result;

/// Entrée d'un listing de répertoire.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct BrowseEntry {
    /// Chemin relatif à la racine musicale; se passe tel quel à `browse`
    /// (répertoires) ou à `set_songs` (fichiers).
    pub id: String,
    pub name: String,
    pub is_dir: bool,
    /// Vrai pour les fichiers dont l'extension audio est reconnue.
    pub is_music: bool,
}

/// Vue sur le répertoire musical.
///
/// Seuls les enfants immédiats d'un chemin validé sont listés; tout chemin
/// sortant de la racine produit un listing vide, sans erreur.
pub struct MusicLibrary {
    root: PathBuf,
    extensions: Vec<String>,
}

impl MusicLibrary {
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            extensions,
        }
    }

    /// Racine de la bibliothèque.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Liste les enfants immédiats de `rel_path` (relatif à la racine).
    ///
    /// Les répertoires sont triés avant les fichiers, puis par nom. Un
    /// chemin inexistant ou qui s'échappe de la racine retourne un listing
    /// vide.
    pub fn browse(&self, rel_path: &str) -> Result<Vec<BrowseEntry>> {
        let rel = rel_path.trim_matches('/');

        let Some(target) = self.contained(rel) else {
            warn!(path = rel, "Browse path escapes the music root, ignoring");
            return Ok(Vec::new());
        };

        if !target.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for dir_entry in std::fs::read_dir(&target)? {
            let dir_entry = dir_entry?;
            let name = dir_entry.file_name().to_string_lossy().to_string();
            let id = if rel.is_empty() {
                name.clone()
            } else {
                format!("{rel}/{name}")
            };
            let is_dir = dir_entry.file_type()?.is_dir();

            entries.push(BrowseEntry {
                is_music: !is_dir && self.is_audio(&name),
                id,
                name,
                is_dir,
            });
        }

        entries.sort_by(|a, b| {
            b.is_dir
                .cmp(&a.is_dir)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });

        Ok(entries)
    }

    /// Résout `rel` sous la racine et vérifie le confinement.
    ///
    /// Retourne `None` pour tout chemin qui sort de la racine (composants
    /// `..`, liens symboliques sortants). Un chemin inexistant reste
    /// accepté : `browse` le traitera comme vide.
    fn contained(&self, rel: &str) -> Option<PathBuf> {
        let target = self.root.join(rel);

        let canonical_root = self.root.canonicalize().ok()?;
        match target.canonicalize() {
            Ok(canonical) => canonical.starts_with(&canonical_root).then_some(canonical),
            // Cible inexistante : refuser au moindre composant suspect
            Err(_) => {
                let clean = rel
                    .split('/')
                    .all(|part| !part.is_empty() && part != "." && part != "..");
                (rel.is_empty() || clean).then_some(target)
            }
        }
    }

    fn is_audio(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(OsStr::to_str)
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}
