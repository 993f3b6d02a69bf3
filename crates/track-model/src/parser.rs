//! Tracker log parsing
//!
//! The upstream tracker writes one record per line, slash-separated:
//! `frame/id/x1/y1/x2/y2/conf/cls/track_cls[/start_vector/end_vector]`.
//! Trailing motion-vector fields are ignored here.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::record::{BoundingBox, DetectionRecord};
use crate::TrackError;

const MIN_FIELDS: usize = 9;

/// Parse all records from a reader. The tracker's emission order is
/// preserved; no sorting happens here.
pub fn parse_track_log<R: BufRead>(reader: R) -> Result<Vec<DetectionRecord>, TrackError> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        records.push(parse_line(line, idx + 1)?);
    }
    tracing::debug!(records = records.len(), "parsed track log");
    Ok(records)
}

/// Read and parse a track log file
pub fn load_track_log<P: AsRef<Path>>(path: P) -> Result<Vec<DetectionRecord>, TrackError> {
    let file = File::open(path)?;
    parse_track_log(BufReader::new(file))
}

fn parse_line(line: &str, line_no: usize) -> Result<DetectionRecord, TrackError> {
    let fields: Vec<&str> = line.split('/').collect();
    if fields.len() < MIN_FIELDS {
        return Err(TrackError::MalformedRecord {
            line: line_no,
            reason: format!("expected at least {MIN_FIELDS} fields, got {}", fields.len()),
        });
    }

    let field = |i: usize, name: &str| -> Result<f64, TrackError> {
        fields[i].parse::<f64>().map_err(|_| TrackError::MalformedRecord {
            line: line_no,
            reason: format!("{name} is not a number: {:?}", fields[i]),
        })
    };

    let frame = field(0, "frame")? as u64;
    let track_id = field(1, "id")? as u64;
    let bbox = BoundingBox::new(
        field(2, "x1")?,
        field(3, "y1")?,
        field(4, "x2")?,
        field(5, "y2")?,
    );
    if bbox.x1 >= bbox.x2 || bbox.y1 >= bbox.y2 {
        return Err(TrackError::MalformedRecord {
            line: line_no,
            reason: format!(
                "empty bounding box ({}, {}, {}, {})",
                bbox.x1, bbox.y1, bbox.x2, bbox.y2
            ),
        });
    }

    Ok(DetectionRecord {
        frame,
        track_id,
        bbox,
        confidence: field(6, "conf")? as f32,
        class_id: field(7, "cls")? as u32,
        track_class: field(8, "track_cls")? as u32,
    })
}
