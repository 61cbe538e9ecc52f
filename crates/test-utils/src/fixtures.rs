//! Common test fixtures: watershed boundaries and dataset names.

use std::path::{Path, PathBuf};

/// Geographic extents as (min_lon, min_lat, max_lon, max_lat).
pub mod bbox {
    /// California Basin Characterization Model domain
    pub const CA_BCM: (f64, f64, f64, f64) = (-124.5, 32.5, -114.0, 42.0);

    /// Approximate Central Valley watershed extent
    pub const CENTRAL_VALLEY: (f64, f64, f64, f64) = (-122.6, 35.0, -119.0, 40.6);

    /// Mid-Atlantic box that intersects nothing in California
    pub const DISJOINT: (f64, f64, f64, f64) = (-40.0, 10.0, -39.0, 11.0);
}

/// Symbolic dataset names of the built-in catalog.
pub mod datasets {
    pub const GISS_26: &str = "GISS_26";
    pub const GISS_A1: &str = "GISS_A1";
    pub const MPI_26: &str = "MPI_26";
}

/// GeoJSON FeatureCollection with one rectangular polygon in EPSG:4326.
pub fn boundary_geojson(extent: (f64, f64, f64, f64)) -> String {
    let (x0, y0, x1, y1) = extent;
    format!(
        r#"{{"type":"FeatureCollection","features":[{{"type":"Feature","properties":{{"name":"watershed"}},"geometry":{{"type":"Polygon","coordinates":[[[{x0},{y0}],[{x1},{y0}],[{x1},{y1}],[{x0},{y1}],[{x0},{y0}]]]}}}}]}}"#
    )
}

/// Write a rectangular boundary to `dir/<name>.geojson` and return its path.
pub fn write_boundary(dir: &Path, name: &str, extent: (f64, f64, f64, f64)) -> PathBuf {
    let path = dir.join(format!("{}.geojson", name));
    std::fs::write(&path, boundary_geojson(extent)).expect("Failed to write boundary fixture");
    path
}
