//! Reader for the University of Wyoming "TEXT:LIST" sounding format.
//!
//! The data section is a table of 7 character wide, right aligned columns:
//!
//! ```text
//! -----------------------------------------------------------------------------
//!    PRES   HGHT   TEMP   DWPT   RELH   MIXR   DRCT   SKNT   THTA   THTE   THTV
//!     hPa     m      C      C      %    g/kg    deg   knot     K      K      K
//! -----------------------------------------------------------------------------
//!  1000.0    117
//!   994.0    171   24.2   21.2     83  16.23    160      7  297.6  345.0  300.5
//! ```
//!
//! Blank cells are missing values. The station information section that follows the table is
//! searched for the station identifier and observation time.
use crate::error::{Result, RetrievalError};
use chrono::NaiveDateTime;
use metfor::{Celsius, Meters};
use optional::Optioned;

const COLUMN_WIDTH: usize = 7;

/// The parts of a University of Wyoming sounding used by the retrievals, as read from the file.
///
/// Levels are in file order and have not been normalized.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UwyoSounding {
    /// Station identifier, or the station number if there is no identifier.
    pub station: Option<String>,
    /// Observation time.
    pub valid_time: Option<NaiveDateTime>,
    /// Geopotential height of each level.
    pub height: Vec<Optioned<Meters>>,
    /// Temperature of each level.
    pub temperature: Vec<Optioned<Celsius>>,
}

/// Parse the text of a University of Wyoming sounding.
///
/// Fails with `SoundingUnavailable` if there is no table header naming the `HGHT` and `TEMP`
/// columns, or if the table has no rows.
pub fn parse_uwyo_text(text: &str) -> Result<UwyoSounding> {
    let mut lines = text.lines();

    // Find the header row and the columns we need.
    let (hght_col, temp_col) = lines
        .by_ref()
        .find_map(|line| {
            let names: Vec<&str> = columns(line).map(|c| c.unwrap_or("")).collect();
            let hght = names.iter().position(|&name| name == "HGHT")?;
            let temp = names.iter().position(|&name| name == "TEMP")?;
            Some((hght, temp))
        })
        .ok_or_else(|| unavailable("no table header with HGHT and TEMP columns"))?;

    // Skip the units row and the rule under it.
    let mut lines = lines.skip_while(|line| !line.trim_start().starts_with('-'));
    lines.next();

    let mut height: Vec<Optioned<Meters>> = vec![];
    let mut temperature: Vec<Optioned<Celsius>> = vec![];
    for line in lines.by_ref() {
        let cells: Vec<Option<&str>> = columns(line).collect();

        // The table ends at the first row without a pressure value.
        let is_data_row = cells
            .first()
            .and_then(|cell| *cell)
            .map(|cell| cell.parse::<f64>().is_ok())
            .unwrap_or(false);
        if !is_data_row {
            break;
        }

        height.push(parse_cell(&cells, hght_col).map(Meters).into());
        temperature.push(parse_cell(&cells, temp_col).map(Celsius).into());
    }

    if height.is_empty() {
        return Err(unavailable("no data rows in the table"));
    }

    // Station info section
    let mut station_id = None;
    let mut station_num = None;
    let mut valid_time = None;
    for line in text.lines().map(str::trim) {
        if let Some(val) = line.strip_prefix("Station identifier:") {
            station_id = Some(val.trim().to_owned());
        } else if let Some(val) = line.strip_prefix("Station number:") {
            station_num = Some(val.trim().to_owned());
        } else if let Some(val) = line.strip_prefix("Observation time:") {
            valid_time = NaiveDateTime::parse_from_str(val.trim(), "%y%m%d/%H%M").ok();
        }
    }

    Ok(UwyoSounding {
        station: station_id.or(station_num),
        valid_time,
        height,
        temperature,
    })
}

// Split a line into fixed width cells, `None` for blank cells.
fn columns(line: &str) -> impl Iterator<Item = Option<&str>> {
    let n_cols = (line.len() + COLUMN_WIDTH - 1) / COLUMN_WIDTH;
    (0..n_cols).map(move |i| {
        let start = i * COLUMN_WIDTH;
        let end = (start + COLUMN_WIDTH).min(line.len());
        line.get(start..end)
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
    })
}

fn parse_cell(cells: &[Option<&str>], col: usize) -> Option<f64> {
    cells
        .get(col)
        .and_then(|cell| *cell)
        .and_then(|cell| cell.parse::<f64>().ok())
}

fn unavailable(msg: &str) -> RetrievalError {
    RetrievalError::SoundingUnavailable(msg.to_owned())
}
