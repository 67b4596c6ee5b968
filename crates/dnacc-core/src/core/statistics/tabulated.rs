use super::{PlateGeometry, StatisticsError, TetherStatistics};
use crate::core::models::tether::TetherType;
use std::path::Path;

/// A piecewise-linear function sampled on a strictly increasing grid, with constant fill
/// values outside the sampled range.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearTable {
    xs: Vec<f64>,
    ys: Vec<f64>,
    fill_below: f64,
    fill_above: f64,
}

impl LinearTable {
    /// Builds a table whose fill values default to the first and last samples.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, StatisticsError> {
        if xs.len() != ys.len() {
            return Err(StatisticsError::InvalidTable(format!(
                "x and y columns differ in length ({} vs {})",
                xs.len(),
                ys.len()
            )));
        }
        if xs.is_empty() {
            return Err(StatisticsError::InvalidTable("table is empty".to_string()));
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(StatisticsError::InvalidTable(
                "table contains non-finite values".to_string(),
            ));
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(StatisticsError::InvalidTable(
                "x column must be strictly increasing".to_string(),
            ));
        }
        let fill_below = ys[0];
        let fill_above = ys[ys.len() - 1];
        Ok(Self {
            xs,
            ys,
            fill_below,
            fill_above,
        })
    }

    /// Reads a two-column table (x, y) from a delimited text file. Lines starting with `#` are
    /// ignored and there is no header row.
    pub fn load(path: &Path, delimiter: u8) -> Result<Self, StatisticsError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| StatisticsError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;

        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for result in reader.deserialize::<(f64, f64)>() {
            let (x, y) = result.map_err(|e| StatisticsError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
            xs.push(x);
            ys.push(y);
        }
        Self::new(xs, ys)
    }

    pub fn with_fill(mut self, below: f64, above: f64) -> Self {
        self.fill_below = below;
        self.fill_above = above;
        self
    }

    pub fn scaled(mut self, x_scale: f64, y_scale: f64) -> Self {
        self.xs.iter_mut().for_each(|x| *x *= x_scale);
        self.ys.iter_mut().for_each(|y| *y *= y_scale);
        self.fill_below *= y_scale;
        self.fill_above *= y_scale;
        self
    }

    /// Applies `f` to every sampled value. Fill values are left untouched.
    pub fn map_values<F>(mut self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        self.ys.iter_mut().for_each(|y| *y = f(*y));
        self
    }

    pub fn eval(&self, x: f64) -> f64 {
        let last = self.xs.len() - 1;
        if x < self.xs[0] {
            return self.fill_below;
        }
        if x > self.xs[last] {
            return self.fill_above;
        }
        let upper = self.xs.partition_point(|&xi| xi < x);
        if upper == 0 {
            return self.ys[0];
        }
        let (x0, x1) = (self.xs[upper - 1], self.xs[upper]);
        let (y0, y1) = (self.ys[upper - 1], self.ys[upper]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

/// Statistics interpolated from empirical tables of separation-dependent weights.
///
/// Bound configurations carry the squared exclusion weight of the two participating tethers.
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedStatistics {
    pub bridge: LinearTable,
    pub loop_: LinearTable,
    pub exclusion: LinearTable,
}

impl TabulatedStatistics {
    pub fn new(bridge: LinearTable, loop_: LinearTable, exclusion: LinearTable) -> Self {
        Self {
            bridge,
            loop_,
            exclusion,
        }
    }

    /// Loads the three tables with the usual conventions for simulation data: separations in
    /// units of `length_scale`, weights in units of `length_scale²`, and the exclusion table
    /// given as a potential of mean force in kT (converted to `exp(-U)`).
    ///
    /// Outside the tables, bridges vanish, loops take their last tabulated value on both sides
    /// and exclusion is 1.
    pub fn load(
        bridge_path: &Path,
        loop_path: &Path,
        exclusion_path: &Path,
        length_scale: f64,
        exclusion_length_scale: f64,
        delimiter: u8,
    ) -> Result<Self, StatisticsError> {
        let area = length_scale * length_scale;
        let bridge = LinearTable::load(bridge_path, delimiter)?
            .scaled(length_scale, area)
            .with_fill(0.0, 0.0);
        let loop_ = LinearTable::load(loop_path, delimiter)?.scaled(length_scale, area);
        let loop_last = loop_.ys[loop_.ys.len() - 1];
        let loop_ = loop_.with_fill(loop_last, loop_last);
        let exclusion = LinearTable::load(exclusion_path, delimiter)?
            .scaled(exclusion_length_scale, 1.0)
            .map_values(|u| (-u).exp())
            .with_fill(1.0, 1.0);
        Ok(Self::new(bridge, loop_, exclusion))
    }

    fn excluded(&self, system: &PlateGeometry) -> f64 {
        self.exclusion.eval(system.separation)
    }
}

impl TetherStatistics for TabulatedStatistics {
    fn boltz_binding_bridge(&self, system: &PlateGeometry, _i: &TetherType, _j: &TetherType) -> f64 {
        self.bridge.eval(system.separation) * self.excluded(system).powi(2)
    }

    fn boltz_binding_loop(&self, system: &PlateGeometry, _i: &TetherType, _j: &TetherType) -> f64 {
        self.loop_.eval(system.separation) * self.excluded(system).powi(2)
    }

    fn boltz_exclusion(&self, system: &PlateGeometry, _i: &TetherType) -> f64 {
        self.excluded(system)
    }
}
