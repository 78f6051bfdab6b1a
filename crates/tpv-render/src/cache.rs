//! Content-addressed preview artifacts.
//!
//! Artifacts are named `<fingerprint>_<l|d>.svg`, where the fingerprint is the
//! SHA-224 of the light document. They live in `<docs_dir>/rendered` (the dump
//! directory, consulted for cache hits) and are mirrored into
//! `<site_dir>/rendered` for publishing. Nothing is ever deleted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha224};

use crate::compiler::{Compiler, compile_atomic, make_world_readable};
use crate::error::CompileError;

/// Subdirectory holding rendered artifacts, both on disk and in URLs.
pub const RENDERED_DIR: &str = "rendered";

/// Compute the fingerprint of a rendered light document.
///
/// Hex-encoded SHA-224 (56 characters).
#[must_use]
pub fn fingerprint(light_document: &str) -> String {
    let mut hasher = Sha224::new();
    hasher.update(light_document.as_bytes());
    hex::encode(hasher.finalize())
}

/// Light or dark rendering of a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Light,
    Dark,
}

impl Variant {
    /// Both variants, light first.
    pub const ALL: [Self; 2] = [Self::Light, Self::Dark];

    /// Whether this variant uses the dark color scheme.
    #[must_use]
    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }

    /// Artifact file name for a fingerprint.
    #[must_use]
    pub fn file_name(self, fingerprint: &str) -> String {
        let suffix = match self {
            Self::Light => 'l',
            Self::Dark => 'd',
        };
        format!("{fingerprint}_{suffix}.svg")
    }
}

/// Artifact directories for previews.
#[derive(Debug, Clone)]
pub struct RenderCache {
    dump_dir: PathBuf,
    site_dir: PathBuf,
}

impl RenderCache {
    /// Create a cache storing artifacts below `docs_dir` and publishing them below `site_dir`.
    #[must_use]
    pub fn new(docs_dir: &Path, site_dir: &Path) -> Self {
        Self {
            dump_dir: docs_dir.join(RENDERED_DIR),
            site_dir: site_dir.join(RENDERED_DIR),
        }
    }

    /// Path of an artifact in the dump directory.
    #[must_use]
    pub fn dump_path(&self, fingerprint: &str, variant: Variant) -> PathBuf {
        self.dump_dir.join(variant.file_name(fingerprint))
    }

    /// Path of an artifact in the site directory.
    #[must_use]
    pub fn site_path(&self, fingerprint: &str, variant: Variant) -> PathBuf {
        self.site_dir.join(variant.file_name(fingerprint))
    }

    /// Whether both variants of a fingerprint are present in the dump directory.
    #[must_use]
    pub fn is_cached(&self, fingerprint: &str) -> bool {
        Variant::ALL
            .iter()
            .all(|&variant| self.dump_path(fingerprint, variant).is_file())
    }

    /// Render both variants into the dump directory, light then dark.
    ///
    /// Documents are given in [`Variant::ALL`] order.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] on the first failing variant.
    pub fn store(
        &self,
        compiler: &dyn Compiler,
        fingerprint: &str,
        documents: [&str; 2],
    ) -> Result<(), CompileError> {
        fs::create_dir_all(&self.dump_dir)?;
        for (variant, document) in Variant::ALL.into_iter().zip(documents) {
            compile_atomic(compiler, document, &self.dump_path(fingerprint, variant))?;
        }
        Ok(())
    }

    /// Copy dump artifacts into the site directory where missing.
    ///
    /// Returns the number of copies made.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a dump artifact cannot be copied.
    pub fn publish(&self, fingerprint: &str) -> io::Result<usize> {
        fs::create_dir_all(&self.site_dir)?;
        let mut copied = 0;
        for variant in Variant::ALL {
            let target = self.site_path(fingerprint, variant);
            if target.is_file() {
                continue;
            }
            let temp = tempfile::Builder::new()
                .prefix(".")
                .suffix(".svg")
                .tempfile_in(&self.site_dir)?
                .into_temp_path();
            fs::copy(self.dump_path(fingerprint, variant), &temp)?;
            make_world_readable(&temp)?;
            temp.persist(&target).map_err(|e| e.error)?;
            copied += 1;
        }
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoCompiler;

    impl Compiler for EchoCompiler {
        fn compile(&self, document: &str, output: &Path) -> Result<(), CompileError> {
            fs::write(output, document)?;
            Ok(())
        }
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = fingerprint("#let _is-dark = false");
        assert_eq!(fp.len(), 56);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp, fingerprint("#let _is-dark = false"));
        assert_ne!(fp, fingerprint("#let _is-dark = true"));
    }

    #[test]
    fn test_fingerprint_known_value() {
        assert_eq!(
            fingerprint(""),
            "d14a028c2a3a2bc9476102bb288234c415a2b01f828ea62ac5b3e42f"
        );
    }

    #[test]
    fn test_variant_file_names() {
        assert_eq!(Variant::Light.file_name("abc"), "abc_l.svg");
        assert_eq!(Variant::Dark.file_name("abc"), "abc_d.svg");
        assert!(Variant::Dark.is_dark());
        assert!(!Variant::Light.is_dark());
    }

    #[test]
    fn test_paths() {
        let cache = RenderCache::new(Path::new("/docs"), Path::new("/site"));
        assert_eq!(
            cache.dump_path("abc", Variant::Light),
            PathBuf::from("/docs/rendered/abc_l.svg")
        );
        assert_eq!(
            cache.site_path("abc", Variant::Dark),
            PathBuf::from("/site/rendered/abc_d.svg")
        );
    }

    #[test]
    fn test_cache_requires_both_variants() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RenderCache::new(&dir.path().join("docs"), &dir.path().join("site"));

        assert!(!cache.is_cached("abc"));
        fs::create_dir_all(dir.path().join("docs/rendered")).unwrap();
        fs::write(cache.dump_path("abc", Variant::Light), "light").unwrap();
        assert!(!cache.is_cached("abc"));
        fs::write(cache.dump_path("abc", Variant::Dark), "dark").unwrap();
        assert!(cache.is_cached("abc"));
    }

    #[test]
    fn test_store_and_publish() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RenderCache::new(&dir.path().join("docs"), &dir.path().join("site"));

        cache.store(&EchoCompiler, "abc", ["light", "dark"]).unwrap();
        assert!(cache.is_cached("abc"));
        assert_eq!(cache.publish("abc").unwrap(), 2);
        assert_eq!(
            fs::read_to_string(cache.site_path("abc", Variant::Dark)).unwrap(),
            "dark"
        );

        // Already published.
        assert_eq!(cache.publish("abc").unwrap(), 0);

        // A missing site copy is restored.
        fs::remove_file(cache.site_path("abc", Variant::Light)).unwrap();
        assert_eq!(cache.publish("abc").unwrap(), 1);
        assert_eq!(
            fs::read_to_string(cache.site_path("abc", Variant::Light)).unwrap(),
            "light"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_published_copy_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let cache = RenderCache::new(&dir.path().join("docs"), &dir.path().join("site"));
        fs::create_dir_all(dir.path().join("docs/rendered")).unwrap();
        for variant in Variant::ALL {
            let dump = cache.dump_path("abc", variant);
            fs::write(&dump, "svg").unwrap();
            fs::set_permissions(&dump, fs::Permissions::from_mode(0o600)).unwrap();
        }

        assert_eq!(cache.publish("abc").unwrap(), 2);

        for variant in Variant::ALL {
            let mode = fs::metadata(cache.site_path("abc", variant))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o644);
        }
    }
}
