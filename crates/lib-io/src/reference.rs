//! Reference solver results.
//!
//! Two sources are supported:
//!
//! - a JSON object with `s_cst`, `Wake_potential_cst`, `freq_cst`, `Z_cst`
//!   and optionally `charge_dist` / `distance`, all in SI units;
//! - a pair of ASCII exports: wake (s in mm, W in V/pC) and impedance
//!   (f in GHz, |Z| in Ohm).

use crate::error::{IoError, IoResult};
use crate::table::load_table;
use lib_types::units::Hertz;
use lib_types::ReferenceData;
use serde::Deserialize;
use std::path::Path;

const MM: f64 = 1e-3;
const GHZ: f64 = 1e9;

#[derive(Deserialize)]
struct RawReference {
    charge_dist: Option<Vec<f64>>,
    distance: Option<Vec<f64>>,
    #[serde(rename = "Wake_potential_cst")]
    wake: Option<Vec<f64>>,
    s_cst: Option<Vec<f64>>,
    #[serde(rename = "Z_cst")]
    impedance: Option<Vec<f64>>,
    freq_cst: Option<Vec<f64>>,
}

/// Parse a JSON reference dataset.
pub fn parse_reference(content: &str) -> IoResult<ReferenceData> {
    let raw: RawReference = serde_json::from_str(content)?;

    let s = raw.s_cst.ok_or_else(|| IoError::missing("s_cst"))?;
    let wake = raw.wake.ok_or_else(|| IoError::missing("Wake_potential_cst"))?;
    let freq = raw.freq_cst.ok_or_else(|| IoError::missing("freq_cst"))?;
    let impedance = raw.impedance.ok_or_else(|| IoError::missing("Z_cst"))?;

    check_pair("Wake_potential_cst", s.len(), wake.len())?;
    check_pair("Z_cst", freq.len(), impedance.len())?;
    if let (Some(lambda), Some(distance)) = (&raw.charge_dist, &raw.distance) {
        check_pair("charge_dist", distance.len(), lambda.len())?;
    }

    Ok(ReferenceData {
        s,
        wake,
        frequencies: freq.into_iter().map(Hertz).collect(),
        impedance,
        charge_dist: raw.charge_dist,
        distance: raw.distance,
    })
}

/// Load a JSON reference dataset.
pub fn load_reference(path: &Path) -> IoResult<ReferenceData> {
    let content = std::fs::read_to_string(path)?;
    let reference = parse_reference(&content)?;
    tracing::info!(
        "Loaded reference {} ({} wake samples, {} impedance bins)",
        path.display(),
        reference.s.len(),
        reference.frequencies.len()
    );
    Ok(reference)
}

/// Load reference curves from ASCII exports. Either file may be absent.
pub fn load_reference_tables(wake: Option<&Path>, impedance: Option<&Path>) -> IoResult<ReferenceData> {
    let mut reference = ReferenceData::default();

    if let Some(path) = wake {
        let (s, w) = load_table(path)?.scaled_columns(MM, 1.0);
        reference.s = s;
        reference.wake = w;
    }
    if let Some(path) = impedance {
        let (f, z) = load_table(path)?.scaled_columns(GHZ, 1.0);
        reference.frequencies = f.into_iter().map(Hertz).collect();
        reference.impedance = z;
    }

    tracing::info!(
        "Loaded reference tables ({} wake samples, {} impedance bins)",
        reference.s.len(),
        reference.frequencies.len()
    );
    Ok(reference)
}

fn check_pair(key: &str, expected: usize, actual: usize) -> IoResult<()> {
    if expected != actual {
        return Err(IoError::shape(
            key,
            format!("{} values for an axis of {} samples", actual, expected),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_json_reference() {
        let content = json!({
            "s_cst": [0.0, 0.001, 0.002],
            "Wake_potential_cst": [0.5, 1.0, 0.25],
            "freq_cst": [1e9, 2e9],
            "Z_cst": [10.0, 20.0],
            "charge_dist": [1.0, 2.0, 1.0],
            "distance": [-0.001, 0.0, 0.001]
        })
        .to_string();

        let reference = parse_reference(&content).unwrap();
        assert_eq!(reference.s.len(), 3);
        assert_eq!(reference.frequencies[1], Hertz(2e9));
        assert!(reference.has_wake());
        assert!(reference.has_impedance());
        assert_eq!(reference.charge_dist.as_deref(), Some(&[1.0, 2.0, 1.0][..]));
    }

    #[test]
    fn test_missing_key_is_named() {
        let content = json!({ "s_cst": [0.0], "Wake_potential_cst": [1.0], "Z_cst": [1.0] }).to_string();
        match parse_reference(&content) {
            Err(IoError::Missing { key }) => assert_eq!(key, "freq_cst"),
            other => panic!("expected missing freq_cst, got {:?}", other),
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let content = json!({
            "s_cst": [0.0, 1.0],
            "Wake_potential_cst": [1.0],
            "freq_cst": [1.0],
            "Z_cst": [1.0]
        })
        .to_string();
        assert!(matches!(parse_reference(&content), Err(IoError::Shape { .. })));
    }

    #[test]
    fn test_tables_are_converted_to_si() {
        let wake = write_temp("s / mm   W / V/pC\n---\n-2.0 0.0\n0.0 1.0\n4.0 -0.5\n");
        let impedance = write_temp("f / GHz  |Z| / Ohm\n0.5 12.0\n1.5 30.0\n");

        let reference = load_reference_tables(Some(wake.path()), Some(impedance.path())).unwrap();
        assert_eq!(reference.s, vec![-2.0 * MM, 0.0, 4.0 * MM]);
        assert_eq!(reference.wake, vec![0.0, 1.0, -0.5]);
        assert_eq!(reference.frequencies, vec![Hertz(0.5 * GHZ), Hertz(1.5 * GHZ)]);
        assert_eq!(reference.impedance, vec![12.0, 30.0]);
    }

    #[test]
    fn test_impedance_table_only() {
        let impedance = write_temp("0.5 12.0\n1.5 30.0\n");
        let reference = load_reference_tables(None, Some(impedance.path())).unwrap();
        assert!(!reference.has_wake());
        assert!(reference.has_impedance());
    }
}
