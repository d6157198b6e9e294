// Weekly cumulative count of reported Palestinian fatalities in Gaza, one
// row per OCHA snapshot.

use std::{
    error::Error,
    fs::{self, File},
    path::{Path, PathBuf},
};

use itertools::Itertools;
use jiff::civil::Date;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FatalityRecord {
    pub date: Date,
    pub fatalities: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Appended,
    AlreadyPresent,
}

pub struct OchaFatalitiesArchive {
    pub base_dir: PathBuf,
}

impl OchaFatalitiesArchive {
    pub fn filename(&self) -> PathBuf {
        self.base_dir.join("fatalities.csv")
    }

    /// All the rows in the file, as written.  A missing file has no rows.
    pub fn read(&self) -> Result<Vec<FatalityRecord>, Box<dyn Error>> {
        let path = self.filename();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut rdr = csv::Reader::from_reader(File::open(&path)?);
        let mut rows = Vec::new();
        for result in rdr.deserialize() {
            let record: FatalityRecord = result?;
            rows.push(record);
        }
        Ok(rows)
    }

    /// Add the record if there is no row for its date yet.  An existing row is
    /// never overwritten and the file is left untouched.
    pub fn upsert(&self, record: FatalityRecord) -> Result<UpsertOutcome, Box<dyn Error>> {
        let rows = self.read()?;
        if rows.iter().any(|r| r.date == record.date) {
            info!("Snapshot for {} is already in the archive", record.date);
            return Ok(UpsertOutcome::AlreadyPresent);
        }
        let rows = rows
            .into_iter()
            .chain(std::iter::once(record))
            .sorted_by_key(|r| r.date)
            .collect_vec();
        write_rows(&self.filename(), &rows)?;
        info!("Appended {} to {:?}", record.date, self.filename());
        Ok(UpsertOutcome::Appended)
    }
}

fn write_rows(path: &Path, rows: &[FatalityRecord]) -> Result<(), Box<dyn Error>> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut wtr = csv::Writer::from_writer(File::create(path)?);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;
    use std::error::Error;

    fn archive(dir: &tempfile::TempDir) -> OchaFatalitiesArchive {
        OchaFatalitiesArchive {
            base_dir: dir.path().join("data"),
        }
    }

    #[test]
    fn missing_file_is_empty() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        assert!(archive(&dir).read()?.is_empty());
        Ok(())
    }

    #[test]
    fn upsert_keeps_rows_sorted() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let archive = archive(&dir);
        let may7 = FatalityRecord {
            date: date(2025, 5, 7),
            fatalities: 52615,
        };
        let apr30 = FatalityRecord {
            date: date(2025, 4, 30),
            fatalities: 52365,
        };
        assert_eq!(archive.upsert(may7)?, UpsertOutcome::Appended);
        assert_eq!(archive.upsert(apr30)?, UpsertOutcome::Appended);
        assert_eq!(archive.read()?, vec![apr30, may7]);

        let content = fs::read_to_string(archive.filename())?;
        assert_eq!(
            content,
            "date,fatalities\n2025-04-30,52365\n2025-05-07,52615\n"
        );
        Ok(())
    }

    #[test]
    fn existing_date_is_not_overwritten() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let archive = archive(&dir);
        let record = FatalityRecord {
            date: date(2025, 5, 7),
            fatalities: 52615,
        };
        archive.upsert(record)?;
        let outcome = archive.upsert(FatalityRecord {
            fatalities: 99999,
            ..record
        })?;
        assert_eq!(outcome, UpsertOutcome::AlreadyPresent);
        assert_eq!(archive.read()?, vec![record]);
        Ok(())
    }

    #[test]
    fn reads_existing_file() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let archive = archive(&dir);
        fs::create_dir_all(&archive.base_dir)?;
        fs::write(
            archive.filename(),
            "date,fatalities\n2024-12-31,45541\n2025-01-08,45885\n",
        )?;
        let rows = archive.read()?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].date, date(2025, 1, 8));
        assert_eq!(rows[1].fatalities, 45885);
        Ok(())
    }
}
