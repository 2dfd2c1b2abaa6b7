//! Field dataset reader.
//!
//! A dataset is a JSON object written by the field simulation. Field
//! components are stored time-major (`[time][space]`) and transposed into
//! [`FieldMap`]s on load. The z axis is rebuilt as `nz + 1` uniform points
//! spanning the raw `z` values.
//!
//! Required keys: `Ez`, `z`, `t`, `nt`, `nz`. Everything else is optional.

use crate::error::{IoError, IoResult};
use lib_types::axis::{self, linspace};
use lib_types::FieldMap;
use serde::Deserialize;
use std::path::Path;

/// Scalars recorded alongside the field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BeamScalars {
    /// RMS bunch length [m].
    pub sigmaz: Option<f64>,

    /// Time the bunch centre enters the structure [s].
    pub init_time: Option<f64>,

    /// Transverse position of the test charge [m].
    pub xtest: Option<f64>,
    pub ytest: Option<f64>,
}

/// Structure dimensions recorded with the run [m].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub w_cavity: Option<f64>,
    pub h_cavity: Option<f64>,
    pub l_cavity: Option<f64>,
    pub w_pipe: Option<f64>,
    pub h_pipe: Option<f64>,
    pub l_pipe: Option<f64>,
}

/// Loaded field dataset.
#[derive(Clone, Debug)]
pub struct FieldDataset {
    /// Longitudinal field on the native grid.
    pub ez: FieldMap,

    pub ex: Option<FieldMap>,
    pub ey: Option<FieldMap>,
    pub bx: Option<FieldMap>,
    pub by: Option<FieldMap>,

    /// Charge density.
    pub rho: Option<FieldMap>,

    /// Transverse grid axes.
    pub x: Option<Vec<f64>>,
    pub y: Option<Vec<f64>>,

    /// Number of time steps.
    pub nt: usize,

    /// Number of z cells (`nz + 1` grid points).
    pub nz: usize,

    pub beam: BeamScalars,
    pub geometry: Geometry,
}

impl FieldDataset {
    /// Names of the field components present.
    pub fn components(&self) -> Vec<&'static str> {
        let mut names = vec!["Ez"];
        for (name, present) in [
            ("Ex", self.ex.is_some()),
            ("Ey", self.ey.is_some()),
            ("Bx", self.bx.is_some()),
            ("By", self.by.is_some()),
            ("rho", self.rho.is_some()),
        ] {
            if present {
                names.push(name);
            }
        }
        names
    }
}

#[derive(Deserialize)]
struct RawDataset {
    #[serde(rename = "Ez")]
    ez: Option<Vec<Vec<f64>>>,
    #[serde(rename = "Ex")]
    ex: Option<Vec<Vec<f64>>>,
    #[serde(rename = "Ey")]
    ey: Option<Vec<Vec<f64>>>,
    #[serde(rename = "Bx")]
    bx: Option<Vec<Vec<f64>>>,
    #[serde(rename = "By")]
    by: Option<Vec<Vec<f64>>>,
    rho: Option<Vec<Vec<f64>>>,

    x: Option<Vec<f64>>,
    y: Option<Vec<f64>>,
    z: Option<Vec<f64>>,
    t: Option<Vec<f64>>,
    nt: Option<usize>,
    nz: Option<usize>,

    sigmaz: Option<f64>,
    init_time: Option<f64>,
    xtest: Option<f64>,
    ytest: Option<f64>,

    w_cavity: Option<f64>,
    h_cavity: Option<f64>,
    #[serde(rename = "L_cavity")]
    l_cavity: Option<f64>,
    w_pipe: Option<f64>,
    h_pipe: Option<f64>,
    #[serde(rename = "L_pipe")]
    l_pipe: Option<f64>,
}

/// Parse a dataset from JSON text.
pub fn parse_dataset(content: &str) -> IoResult<FieldDataset> {
    let raw: RawDataset = serde_json::from_str(content)?;

    let ez_rows = raw.ez.ok_or_else(|| IoError::missing("Ez"))?;
    let z_raw = raw.z.ok_or_else(|| IoError::missing("z"))?;
    let t = raw.t.ok_or_else(|| IoError::missing("t"))?;
    let nt = raw.nt.ok_or_else(|| IoError::missing("nt"))?;
    let nz = raw.nz.ok_or_else(|| IoError::missing("nz"))?;

    if t.len() != nt {
        return Err(IoError::shape("t", format!("{} samples but nt = {}", t.len(), nt)));
    }
    if t.is_empty() {
        return Err(IoError::shape("t", "no time samples"));
    }
    if !axis::is_strictly_increasing(&t) {
        return Err(IoError::shape("t", "sample times must be strictly increasing"));
    }

    let (zmin, zmax) = axis::bounds(&z_raw).ok_or_else(|| IoError::shape("z", "axis is empty"))?;
    if !(zmax > zmin) {
        return Err(IoError::shape("z", format!("degenerate extent [{}, {}]", zmin, zmax)));
    }
    let points = nz
        .checked_add(1)
        .ok_or_else(|| IoError::invalid_value("nz", format!("{} is out of range", nz)))?;
    if let Some((i, row)) = ez_rows.iter().enumerate().find(|(_, row)| row.len() != points) {
        return Err(IoError::shape(
            "Ez",
            format!("time row {} has {} values but nz = {}", i, row.len(), nz),
        ));
    }
    let z = linspace(zmin, zmax, points);

    let ez = to_field("Ez", &ez_rows, &z, &t)?;
    let optional = |key: &str, rows: Option<Vec<Vec<f64>>>| -> IoResult<Option<FieldMap>> {
        rows.map(|r| to_field(key, &r, &z, &t)).transpose()
    };
    let ex = optional("Ex", raw.ex)?;
    let ey = optional("Ey", raw.ey)?;
    let bx = optional("Bx", raw.bx)?;
    let by = optional("By", raw.by)?;
    let rho = optional("rho", raw.rho)?;

    tracing::debug!(
        "Dataset: nt = {}, nz = {}, z in [{:.4}, {:.4}] mm, t in [{:.4}, {:.4}] ns",
        nt,
        nz,
        zmin * 1e3,
        zmax * 1e3,
        t[0] * 1e9,
        t[nt - 1] * 1e9
    );

    Ok(FieldDataset {
        ez,
        ex,
        ey,
        bx,
        by,
        rho,
        x: raw.x,
        y: raw.y,
        nt,
        nz,
        beam: BeamScalars {
            sigmaz: raw.sigmaz,
            init_time: raw.init_time,
            xtest: raw.xtest,
            ytest: raw.ytest,
        },
        geometry: Geometry {
            w_cavity: raw.w_cavity,
            h_cavity: raw.h_cavity,
            l_cavity: raw.l_cavity,
            w_pipe: raw.w_pipe,
            h_pipe: raw.h_pipe,
            l_pipe: raw.l_pipe,
        },
    })
}

/// Load a dataset from a JSON file.
pub fn load_dataset(path: &Path) -> IoResult<FieldDataset> {
    let content = std::fs::read_to_string(path)?;
    let dataset = parse_dataset(&content)?;
    tracing::info!(
        "Loaded {} ({} time steps, {} z points, components: {})",
        path.display(),
        dataset.nt,
        dataset.nz + 1,
        dataset.components().join(", ")
    );
    Ok(dataset)
}

fn to_field(key: &str, rows: &[Vec<f64>], z: &[f64], t: &[f64]) -> IoResult<FieldMap> {
    if rows.len() != t.len() {
        return Err(IoError::shape(
            key,
            format!("{} time rows for {} time samples", rows.len(), t.len()),
        ));
    }
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != z.len()) {
        return Err(IoError::shape(
            key,
            format!("time row {} has {} values, expected nz + 1 = {}", i, row.len(), z.len()),
        ));
    }
    FieldMap::from_time_major(rows, z.to_vec(), t.to_vec())
        .ok_or_else(|| IoError::shape(key, "ragged field rows"))
}
