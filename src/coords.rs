//! The two-column coordinate text format: one `x y` pair per line,
//! whitespace separated, blank lines ignored.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::state::Point;

#[derive(Debug, Error)]
pub enum CoordsError {
    #[error("cannot read coordinate file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write coordinate file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected two integers, got '{content}'")]
    Parse { line: usize, content: String },
}

pub fn parse_coordinates(text: &str) -> Result<Vec<Point>, CoordsError> {
    let mut points = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let malformed = || CoordsError::Parse {
            line: index + 1,
            content: line.to_string(),
        };

        let mut fields = line.split_whitespace();
        let (Some(x), Some(y), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(malformed());
        };
        let x = x.parse::<i32>().map_err(|_| malformed())?;
        let y = y.parse::<i32>().map_err(|_| malformed())?;
        points.push(Point::new(x, y));
    }
    Ok(points)
}

pub fn load_coordinates(path: &Path) -> Result<Vec<Point>, CoordsError> {
    let text = std::fs::read_to_string(path).map_err(|source| CoordsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_coordinates(&text)
}

pub fn format_coordinates(points: &[Point]) -> String {
    points
        .iter()
        .map(|point| format!("{} {}\n", point.x, point.y))
        .collect()
}

pub fn write_coordinates(path: &Path, points: &[Point]) -> Result<(), CoordsError> {
    std::fs::write(path, format_coordinates(points)).map_err(|source| CoordsError::Write {
        path: path.to_path_buf(),
        source,
    })
}
