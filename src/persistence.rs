//! CSV storage for the variable table: one `name,i,j,k` record per line.

use std::path::Path;

use log::{info, warn};

use crate::{interpreter::environment::Environment, vector::Vector};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Could not open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("Could not write variables: {0}")]
    Write(#[from] csv::Error),
    #[error("Could not flush variables: {0}")]
    Flush(#[from] std::io::Error),
    #[error(transparent)]
    Environment(#[from] crate::interpreter::environment::EnvironmentError),
}

/// Writes every entry and returns how many were written.
pub fn save(environment: &Environment, path: impl AsRef<Path>) -> Result<usize, PersistenceError> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|source| PersistenceError::Open {
            path: path.display().to_string(),
            source,
        })?;

    let mut written = 0;
    for entry in environment.iter() {
        writer.write_record([
            entry.name.clone(),
            format!("{:.2}", entry.vector.i),
            format!("{:.2}", entry.vector.j),
            format!("{:.2}", entry.vector.k),
        ])?;
        written += 1;
    }
    writer.flush()?;

    info!("Saved {} vectors to {}", written, path.display());
    Ok(written)
}

/// Reads entries into `environment`, skipping malformed lines, and returns how
/// many were inserted.
pub fn load(environment: &mut Environment, path: impl AsRef<Path>) -> Result<usize, PersistenceError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| PersistenceError::Open {
            path: path.display().to_string(),
            source,
        })?;

    let mut loaded = 0;
    for (index, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Record {}: {}", index + 1, e);
                continue;
            }
        };
        let line = record
            .position()
            .map_or(index as u64 + 1, |position| position.line());

        if record.len() != 4 {
            warn!(
                "Line {}: expected 4 fields but found {}, skipping",
                line,
                record.len()
            );
            continue;
        }

        let components: Result<Vec<f32>, _> = record.iter().skip(1).map(str::parse::<f32>).collect();
        let Ok(components) = components else {
            warn!("Line {}: invalid vector component, skipping", line);
            continue;
        };

        let vector = Vector::new(components[0], components[1], components[2]);
        environment.insert(&record[0], vector)?;
        loaded += 1;
    }

    info!("Loaded {} vectors from {}", loaded, path.display());
    Ok(loaded)
}
