//! Auxiliary physical data
//!
//! [`DataContext`] locates the data directory and serves gravity fields
//! from it. Files are crawled recursively, parsed once, and kept for the
//! lifetime of the process. When the directory also carries satkit's own
//! files (IERS tables, EOP, space weather, JPL ephemerides) the toolkit is
//! pointed at it.

mod gravity_file;

pub use gravity_file::{parse_egm, parse_icgem, read_gravity_file, GravityFileFormat, EGM96_AE, EGM96_MU};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::error::DataError;
use crate::propagation::gravity::SphericalHarmonicsProvider;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "ORBIT_COMPARATOR_DATA";

/// Data directory name under the home directory
pub const DEFAULT_DATA_DIR: &str = "orekit-data";

/// IERS 2010 precession-nutation tables read by the ITRF rotations
pub const IERS_TABLES: [&str; 3] = ["tab5.2a.txt", "tab5.2b.txt", "tab5.2d.txt"];

/// Space weather indices read by NRLMSISE-00
pub const SPACE_WEATHER_FILE: &str = "SW-All.csv";

/// JPL DE440 ephemerides
pub const JPL_EPHEMERIS_FILE: &str = "linux_p1550p2650.440";

/// Subdirectory of the data directory that may hold the toolkit files
pub const TOOLKIT_SUBDIR: &str = "satkit-data";

/// Largest degree served by the built-in field
const BUILTIN_MAX_DEGREE: usize = 6;

type FieldCache = RwLock<HashMap<PathBuf, Arc<SphericalHarmonicsProvider>>>;

fn field_cache() -> &'static FieldCache {
    static CACHE: OnceLock<FieldCache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Parse a gravity file, or reuse an earlier parse of the same path
fn cached_field(path: &Path) -> Result<Arc<SphericalHarmonicsProvider>, DataError> {
    if let Some(field) = field_cache().read().get(path) {
        return Ok(Arc::clone(field));
    }
    let field = Arc::new(read_gravity_file(path)?);
    field_cache()
        .write()
        .insert(path.to_path_buf(), Arc::clone(&field));
    Ok(field)
}

/// Where auxiliary data comes from
///
/// Built once at start-up and passed to the builders.
#[derive(Debug, Clone)]
pub struct DataContext {
    root: PathBuf,
    gravity_file: Option<PathBuf>,
}

impl DataContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            gravity_file: None,
        }
    }

    /// Explicit directory, else `$ORBIT_COMPARATOR_DATA`, else `~/orekit-data`
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        let root = explicit
            .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
            .or_else(|| dirs::home_dir().map(|home| home.join(DEFAULT_DATA_DIR)))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        if !root.is_dir() {
            log::warn!("Data directory {:?} not found; only built-in data is available", root);
        }
        Self::new(root)
    }

    /// Use this coefficient file instead of crawling the directory
    pub fn with_gravity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.gravity_file = Some(path.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding satkit's files: the data directory or its `satkit-data` child
    pub fn toolkit_dir(&self) -> Option<PathBuf> {
        [self.root.clone(), self.root.join(TOOLKIT_SUBDIR)]
            .into_iter()
            .find(|dir| dir.join(IERS_TABLES[0]).is_file())
    }

    /// Point satkit at the data directory when it carries the toolkit files
    ///
    /// Without them satkit keeps its own search (`$SATKIT_DATA`,
    /// `~/.satkit-data`, ...).
    pub fn configure_toolkit(&self) -> Result<(), DataError> {
        match self.toolkit_dir() {
            Some(dir) => {
                satkit::utils::set_datadir(&dir).map_err(|e| DataError::ToolkitDirectory {
                    dir: dir.clone(),
                    reason: e.to_string(),
                })?;
                log::info!("Toolkit data read from {:?}", dir);
            }
            None => log::debug!("No toolkit data under {:?}, keeping satkit's own search", self.root),
        }
        Ok(())
    }

    /// Fail unless satkit's data directory holds every file of `files`
    ///
    /// satkit aborts when a table it needs is absent, so this runs before
    /// anything reads one.
    pub fn require_toolkit_files(&self, files: &[&'static str]) -> Result<(), DataError> {
        if files.is_empty() {
            return Ok(());
        }
        let dir = satkit::utils::datadir().map_err(|e| DataError::ToolkitDirectory {
            dir: self.root.clone(),
            reason: e.to_string(),
        })?;
        let missing = missing_files(&dir, files);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DataError::MissingToolkitData { dir, files: missing })
        }
    }

    /// Supported coefficient files under the data directory, sorted by path
    pub fn gravity_files(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        crawl(&self.root, &mut found);
        found.retain(|path| GravityFileFormat::detect(path).is_some());
        found.sort();
        found
    }

    /// Gravity field covering `degree`
    ///
    /// A forced file must cover the degree. Otherwise the first crawled file
    /// that does is used, with the built-in EIGEN-5C zonals as the last resort
    /// for degree ≤ 6.
    pub fn gravity_field(&self, degree: usize) -> Result<Arc<SphericalHarmonicsProvider>, DataError> {
        if let Some(path) = &self.gravity_file {
            let field = cached_field(path)?;
            if field.degree() < degree {
                return Err(DataError::TooLargeDegree {
                    requested: degree,
                    available: field.degree(),
                });
            }
            return Ok(field);
        }

        for path in self.gravity_files() {
            match cached_field(&path) {
                Ok(field) if field.degree() >= degree => return Ok(field),
                Ok(field) => log::debug!(
                    "Skipping {:?}: degree {} below the requested {}",
                    path,
                    field.degree(),
                    degree
                ),
                Err(e) => log::warn!("Skipping unreadable gravity file {:?}: {}", path, e),
            }
        }

        if degree <= BUILTIN_MAX_DEGREE {
            if degree > 0 {
                log::warn!("No gravity file in {:?}, using the built-in EIGEN-5C zonal field", self.root);
            }
            return Ok(Arc::new(SphericalHarmonicsProvider::builtin_eigen5c()));
        }
        Err(DataError::NoGravityField(self.root.clone()))
    }
}

/// Files of `files` absent from `dir`
pub fn missing_files(dir: &Path, files: &[&'static str]) -> Vec<&'static str> {
    files.iter().copied().filter(|file| !dir.join(file).is_file()).collect()
}

fn crawl(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            crawl(&path, found);
        } else {
            found.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("orbit-comparator-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    const SMALL_FIELD: &str = "\
begin_of_head
earth_gravity_constant 3.986004415E+14
radius 6378136.3
norm fully_normalized
tide_system zero_tide
end_of_head
gfc 0 0 1.0 0.0
gfc 2 0 -4.8416E-04 0.0
gfc 2 2 2.4393E-06 -1.4002E-06
gfc 3 0 9.5716E-07 0.0
";

    #[test]
    fn test_builtin_fallback() {
        let context = DataContext::new(scratch_dir("empty"));
        let field = context.gravity_field(4).unwrap();
        assert_eq!(field.degree(), 6);
        assert!(matches!(context.gravity_field(8), Err(DataError::NoGravityField(_))));
    }

    #[test]
    fn test_crawl_finds_nested_file() {
        let root = scratch_dir("crawl");
        let nested = root.join("potential").join("icgem-format");
        fs::create_dir_all(&nested).unwrap();
        let mut file = fs::File::create(nested.join("small.gfc")).unwrap();
        file.write_all(SMALL_FIELD.as_bytes()).unwrap();
        fs::write(root.join("tai-utc.dat"), "unrelated").unwrap();

        let context = DataContext::new(&root);
        assert_eq!(context.gravity_files(), vec![nested.join("small.gfc")]);

        let field = context.gravity_field(3).unwrap();
        assert_eq!(field.ae, 6_378_136.3);
        assert_eq!(field.order(), 2);

        // Too small for degree 5, so the built-in field takes over
        let fallback = context.gravity_field(5).unwrap();
        assert_eq!(fallback.ae, crate::propagation::gravity::EIGEN5C_AE);
    }

    #[test]
    fn test_forced_file_must_cover_degree() {
        let root = scratch_dir("forced");
        let path = root.join("forced.gfc");
        fs::write(&path, SMALL_FIELD).unwrap();
        let context = DataContext::new(scratch_dir("forced-root")).with_gravity_file(&path);
        assert_eq!(context.gravity_field(2).unwrap().degree(), 3);
        assert!(matches!(context.gravity_field(4), Err(DataError::TooLargeDegree { .. })));
    }

    #[test]
    fn test_toolkit_dir_detection() {
        let root = scratch_dir("toolkit");
        let context = DataContext::new(&root);
        assert_eq!(context.toolkit_dir(), None);

        let nested = root.join(TOOLKIT_SUBDIR);
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join(IERS_TABLES[0]), "").unwrap();
        assert_eq!(context.toolkit_dir(), Some(nested.clone()));

        fs::write(root.join(IERS_TABLES[0]), "").unwrap();
        assert_eq!(context.toolkit_dir(), Some(root));
    }

    #[test]
    fn test_missing_files() {
        let root = scratch_dir("missing");
        fs::write(root.join(IERS_TABLES[1]), "").unwrap();
        assert_eq!(missing_files(&root, &IERS_TABLES), vec![IERS_TABLES[0], IERS_TABLES[2]]);
        assert!(missing_files(&root, &[]).is_empty());
    }

    #[test]
    fn test_nothing_required() {
        let context = DataContext::new(scratch_dir("none-required"));
        assert!(context.require_toolkit_files(&[]).is_ok());
    }

    #[test]
    fn test_gzip_file() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let root = scratch_dir("gzip");
        let path = root.join("small.gfc.gz");
        let mut encoder = GzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
        encoder.write_all(SMALL_FIELD.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let field = read_gravity_file(&path).unwrap();
        assert_eq!(field.degree(), 3);
        assert!((field.coefficients.c(2, 2) - 2.4393e-6).abs() < 1e-18);
    }
}
