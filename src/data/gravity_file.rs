//! Gravity-field coefficient files
//!
//! Two table layouts are understood, plain or gzip-compressed:
//!
//! - **ICGEM** (`*.gfc`): a `begin_of_head` / `end_of_head` header carrying
//!   μ, the reference radius, the normalization and the tide system, then
//!   `gfc n m C S [σC σS]` lines
//! - **EGM** (`egmNN_to*`): bare `n m C S [σC σS]` lines, fully normalized,
//!   with the EGM96 constants
//!
//! Numbers may use Fortran `D` exponents.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::DataError;
use crate::propagation::gravity::{HarmonicCoefficients, Normalization, SphericalHarmonicsProvider, TideSystem};

/// EGM96 central attraction coefficient (m³/s²)
pub const EGM96_MU: f64 = 3.986_004_418e14;

/// EGM96 reference radius (m)
pub const EGM96_AE: f64 = 6_378_137.0;

/// Supported coefficient table layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GravityFileFormat {
    Icgem,
    Egm,
}

impl GravityFileFormat {
    /// Recognize a coefficient file from its name, ignoring a `.gz` suffix
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        if name.ends_with(".gfc") {
            return Some(Self::Icgem);
        }
        // egm96_to360.ascii, egm08_to2190...
        let digits = name.strip_prefix("egm")?;
        let bytes = digits.as_bytes();
        if bytes.len() > 5 && bytes[0].is_ascii_digit() && bytes[1].is_ascii_digit() && digits[2..].starts_with("_to") {
            Some(Self::Egm)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Icgem => "ICGEM",
            Self::Egm => "EGM",
        }
    }
}

/// Load a coefficient file, decompressing `.gz` files on the fly
pub fn read_gravity_file(path: &Path) -> Result<SphericalHarmonicsProvider, DataError> {
    let format = GravityFileFormat::detect(path).ok_or_else(|| DataError::Parse {
        path: path.to_path_buf(),
        line: 0,
        reason: "unrecognized gravity field file name".to_string(),
    })?;
    log::info!("Loading {} gravity field from {:?}", format.name(), path);

    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let compressed = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    let reader: Box<dyn BufRead> = if compressed {
        Box::new(BufReader::new(GzDecoder::new(BufReader::new(file))))
    } else {
        Box::new(BufReader::new(file))
    };

    let field = match format {
        GravityFileFormat::Icgem => parse_icgem(reader, path)?,
        GravityFileFormat::Egm => parse_egm(reader, path)?,
    };
    log::info!(
        "Gravity field {}x{} (mu = {:e} m³/s², ae = {} m, {})",
        field.degree(),
        field.order(),
        field.mu,
        field.ae,
        field.tide_system
    );
    Ok(field)
}

fn parse_number(token: &str, path: &Path, line: usize) -> Result<f64, DataError> {
    token
        .replace(['D', 'd'], "E")
        .parse::<f64>()
        .map_err(|e| DataError::Parse {
            path: path.to_path_buf(),
            line,
            reason: format!("'{}': {}", token, e),
        })
}

fn parse_index(token: &str, path: &Path, line: usize) -> Result<usize, DataError> {
    token.parse::<usize>().map_err(|e| DataError::Parse {
        path: path.to_path_buf(),
        line,
        reason: format!("'{}': {}", token, e),
    })
}

/// One (n, m, C, S) entry from the leading columns of `fields`
fn parse_entry(fields: &[&str], path: &Path, line: usize) -> Result<(usize, usize, f64, f64), DataError> {
    if fields.len() < 4 {
        return Err(DataError::Parse {
            path: path.to_path_buf(),
            line,
            reason: format!("expected n m C S, found {} fields", fields.len()),
        });
    }
    let n = parse_index(fields[0], path, line)?;
    let m = parse_index(fields[1], path, line)?;
    if m > n {
        return Err(DataError::Parse {
            path: path.to_path_buf(),
            line,
            reason: format!("order {} larger than degree {}", m, n),
        });
    }
    let c = parse_number(fields[2], path, line)?;
    let s = parse_number(fields[3], path, line)?;
    Ok((n, m, c, s))
}

fn build_table(entries: &[(usize, usize, f64, f64)], path: &Path) -> Result<HarmonicCoefficients, DataError> {
    let degree = entries
        .iter()
        .map(|e| e.0)
        .max()
        .ok_or_else(|| DataError::Parse {
            path: path.to_path_buf(),
            line: 0,
            reason: "no coefficients".to_string(),
        })?;
    let order = entries.iter().map(|e| e.1).max().unwrap_or(0);
    let mut table = HarmonicCoefficients::zeros(degree, order);
    for &(n, m, c, s) in entries {
        table.set(n, m, c, s);
    }
    Ok(table)
}

fn read_lines<'a, R: BufRead + 'a>(
    reader: R,
    path: &'a Path,
) -> impl Iterator<Item = Result<(usize, String), DataError>> + 'a {
    reader.lines().enumerate().map(move |(index, line)| {
        line.map(|text| (index + 1, text)).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })
    })
}

/// ICGEM `.gfc` table
pub fn parse_icgem<R: BufRead>(reader: R, path: &Path) -> Result<SphericalHarmonicsProvider, DataError> {
    let mut mu = None;
    let mut ae = None;
    let mut normalization = Normalization::Normalized;
    let mut tide_system = TideSystem::Unknown;
    let mut in_header = true;
    let mut entries = Vec::new();

    for item in read_lines(reader, path) {
        let (line, text) = item?;
        let fields: Vec<&str> = text.split_whitespace().collect();
        let Some(&key) = fields.first() else {
            continue;
        };

        if in_header {
            match (key, fields.get(1)) {
                ("end_of_head", _) => in_header = false,
                ("earth_gravity_constant", Some(value)) => mu = Some(parse_number(value, path, line)?),
                ("radius", Some(value)) => ae = Some(parse_number(value, path, line)?),
                ("norm", Some(value)) => {
                    normalization = if value.eq_ignore_ascii_case("unnormalized") {
                        Normalization::Unnormalized
                    } else {
                        Normalization::Normalized
                    }
                }
                ("tide_system", Some(value)) => tide_system = TideSystem::from_icgem(value),
                _ => {}
            }
            continue;
        }

        // gfct carries the static part of a time-variable coefficient
        if key == "gfc" || key == "gfct" {
            entries.push(parse_entry(&fields[1..], path, line)?);
        }
    }

    let missing = |name: &str| DataError::Parse {
        path: path.to_path_buf(),
        line: 0,
        reason: format!("missing header key {}", name),
    };
    Ok(SphericalHarmonicsProvider {
        mu: mu.ok_or_else(|| missing("earth_gravity_constant"))?,
        ae: ae.ok_or_else(|| missing("radius"))?,
        tide_system,
        normalization,
        coefficients: build_table(&entries, path)?,
    })
}

/// EGM-style table of fully normalized coefficients
pub fn parse_egm<R: BufRead>(reader: R, path: &Path) -> Result<SphericalHarmonicsProvider, DataError> {
    let mut entries = vec![(0, 0, 1.0, 0.0)];
    for item in read_lines(reader, path) {
        let (line, text) = item?;
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        entries.push(parse_entry(&fields, path, line)?);
    }

    Ok(SphericalHarmonicsProvider {
        mu: EGM96_MU,
        ae: EGM96_AE,
        tide_system: TideSystem::TideFree,
        normalization: Normalization::Normalized,
        coefficients: build_table(&entries, path)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    const ICGEM: &str = "\
generating_institute GFZ
begin_of_head ==============================================
product_type gravity_field
modelname EIGEN-TEST
earth_gravity_constant 0.3986004415E+15
radius 0.6378136460E+07
max_degree 3
errors formal
norm fully_normalized
tide_system tide_free
key   L    M         C                  S              sigma C      sigma S
end_of_head ================================================
gfc   0    0  1.000000000000E+00  0.000000000000E+00  0.0000E+00  0.0000E+00
gfc   2    0 -4.841651437908D-04  0.000000000000E+00  3.5610E-13  0.0000E+00
gfc   2    1 -2.066155090741E-10  1.384413891379E-09  1.2000E-13  1.2000E-13
gfc   2    2  2.439383573283E-06 -1.400273703859E-06  1.2000E-13  1.2000E-13
gfct  3    0  9.571612070934E-07  0.000000000000E+00  1.0000E-13  0.0000E+00 19500101
trnd  3    0  1.0E-11  0.0E+00  1.0E-13  0.0E+00
";

    #[test]
    fn test_detect_formats() {
        assert_eq!(GravityFileFormat::detect(Path::new("eigen-6s.gfc")), Some(GravityFileFormat::Icgem));
        assert_eq!(GravityFileFormat::detect(Path::new("EIGEN-6S.GFC.gz")), Some(GravityFileFormat::Icgem));
        assert_eq!(GravityFileFormat::detect(Path::new("egm96_to360.ascii")), Some(GravityFileFormat::Egm));
        assert_eq!(GravityFileFormat::detect(Path::new("egm96_to360.ascii.gz")), Some(GravityFileFormat::Egm));
        assert_eq!(GravityFileFormat::detect(Path::new("tai-utc.dat")), None);
        assert_eq!(GravityFileFormat::detect(Path::new("egm")), None);
    }

    #[test]
    fn test_parse_icgem() {
        let path = PathBuf::from("test.gfc");
        let field = parse_icgem(Cursor::new(ICGEM), &path).unwrap();
        assert_eq!(field.mu, 3.986_004_415e14);
        assert_eq!(field.ae, 6_378_136.46);
        assert_eq!(field.degree(), 3);
        assert_eq!(field.order(), 2);
        assert_eq!(field.tide_system, TideSystem::TideFree);
        assert_eq!(field.normalization, Normalization::Normalized);
        assert!((field.coefficients.c(2, 0) + 4.841_651_437_908e-4).abs() < 1e-18);
        assert!((field.coefficients.s(2, 2) + 1.400_273_703_859e-6).abs() < 1e-20);
        assert!((field.coefficients.c(3, 0) - 9.571_612_070_934e-7).abs() < 1e-20);
    }

    #[test]
    fn test_parse_egm() {
        let table = "\
    2    0  -0.484165371736D-03   0.000000000000D+00   0.35610635E-10   0.00000000E+00
    2    1  -0.186987635955D-09   0.119528012031D-08   0.10000000E-11   0.10000000E-11
    2    2   0.243914352398D-05  -0.140016683654D-05   0.53739154E-10   0.54353269E-10
";
        let path = PathBuf::from("egm96_to2.ascii");
        let field = parse_egm(Cursor::new(table), &path).unwrap();
        assert_eq!(field.mu, EGM96_MU);
        assert_eq!(field.degree(), 2);
        assert_eq!(field.order(), 2);
        assert_eq!(field.coefficients.c(0, 0), 1.0);
        assert!((field.coefficients.c(2, 2) - 2.439_143_523_98e-6).abs() < 1e-20);
    }

    #[test]
    fn test_malformed_line_is_reported() {
        let path = PathBuf::from("broken.gfc");
        let text = ICGEM.replace("gfc   2    1 -2.066155090741E-10", "gfc   2    1 -2.0661x5090741E-10");
        match parse_icgem(Cursor::new(text), &path) {
            Err(DataError::Parse { line, .. }) => assert_eq!(line, 15),
            other => panic!("unexpected {:?}", other.map(|f| f.degree())),
        }
    }

    #[test]
    fn test_missing_header_key() {
        let path = PathBuf::from("broken.gfc");
        let text = ICGEM.replace("radius 0.6378136460E+07\n", "");
        assert!(matches!(parse_icgem(Cursor::new(text), &path), Err(DataError::Parse { .. })));
    }
}
