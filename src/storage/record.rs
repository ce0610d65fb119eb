use std::fmt;
use std::fs;
use std::path::Path;

use crate::core::{SensorFrame, FRAME_FIELDS};
use crate::error::SinkError;

/// One durable log line: the flattened fields of an accepted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedRecord {
    /// Leading sequence column, only written when enabled for the session
    pub sequence: Option<u64>,
    pub fields: [i16; FRAME_FIELDS],
}

impl PersistedRecord {
    pub fn from_frame(frame: &SensorFrame, with_sequence: bool) -> Self {
        Self {
            sequence: with_sequence.then_some(frame.sequence),
            fields: frame.fields(),
        }
    }

    /// Rebuild the frame. Without a sequence column the counter is 0.
    pub fn to_frame(&self) -> SensorFrame {
        SensorFrame::from_fields(self.sequence.unwrap_or(0), &self.fields)
    }

    /// Parse one line; 14 columns is a plain record, 15 has a leading sequence
    pub fn parse(line: &str) -> Result<Self, String> {
        let columns: Vec<&str> = line.trim().split(',').map(str::trim).collect();
        let (sequence, values) = match columns.len() {
            n if n == FRAME_FIELDS => (None, &columns[..]),
            n if n == FRAME_FIELDS + 1 => {
                let seq = columns[0]
                    .parse::<u64>()
                    .map_err(|e| format!("sequence {:?}: {}", columns[0], e))?;
                (Some(seq), &columns[1..])
            }
            n => return Err(format!("expected {} or {} columns, got {}", FRAME_FIELDS, FRAME_FIELDS + 1, n)),
        };

        let mut fields = [0i16; FRAME_FIELDS];
        for (field, value) in fields.iter_mut().zip(values) {
            *field = value
                .parse::<i16>()
                .map_err(|e| format!("value {:?}: {}", value, e))?;
        }

        Ok(Self { sequence, fields })
    }
}

impl fmt::Display for PersistedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(seq) = self.sequence {
            write!(f, "{},", seq)?;
        }
        for (i, value) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}

/// Read back every record of a log file, skipping blank lines
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<PersistedRecord>, SinkError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| SinkError::Open {
        path: path.display().to_string(),
        source,
    })?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            PersistedRecord::parse(line).map_err(|detail| SinkError::Parse { line: i + 1, detail })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_without_sequence() {
        let frame = SensorFrame::new(9, [0, 0, 0, 0, 0, 0, 0, 100], [1, 2, 3], [4, 5, 6]);
        let record = PersistedRecord::from_frame(&frame, false);
        assert_eq!(record.to_string(), "0,0,0,0,0,0,0,100,1,2,3,4,5,6");
    }

    #[test]
    fn test_line_with_sequence() {
        let frame = SensorFrame::new(9, [-1; 8], [1, 2, 3], [4, 5, 6]);
        let record = PersistedRecord::from_frame(&frame, true);
        assert_eq!(record.to_string(), "9,-1,-1,-1,-1,-1,-1,-1,-1,1,2,3,4,5,6");
        assert_eq!(PersistedRecord::parse(&record.to_string()).unwrap().to_frame(), frame);
    }

    #[test]
    fn test_parse_rejects_short_line() {
        assert!(PersistedRecord::parse("1,2,3").is_err());
    }
}
