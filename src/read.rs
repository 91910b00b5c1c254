use crate::data::{Error, RecordSet};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Which statements to read: either an explicit list of files, or a single
/// glob pattern such as `statements/*.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InputSpec {
    Paths(Vec<PathBuf>),
    Pattern(String),
}

impl InputSpec {
    /// Command-line arguments are a pattern only when there is exactly one of
    /// them and it contains a glob metacharacter; otherwise they are file names.
    pub fn from_args(args: Vec<String>) -> Self {
        match <[String; 1]>::try_from(args) {
            Ok([arg]) if arg.contains(['*', '?', '[']) => InputSpec::Pattern(arg),
            Ok([arg]) => InputSpec::Paths(vec![arg.into()]),
            Err(args) => InputSpec::Paths(args.into_iter().map(PathBuf::from).collect()),
        }
    }
}

impl From<&str> for InputSpec {
    fn from(pattern: &str) -> Self {
        InputSpec::Pattern(pattern.to_string())
    }
}

impl From<Vec<PathBuf>> for InputSpec {
    fn from(paths: Vec<PathBuf>) -> Self {
        InputSpec::Paths(paths)
    }
}

/// Expands an `InputSpec` to the files to read. A pattern matching nothing
/// (or an empty one) is not an error here, just an empty list.
pub(crate) fn resolve_inputs(spec: &InputSpec) -> Result<Vec<PathBuf>, Error> {
    match spec {
        InputSpec::Paths(paths) => Ok(paths.clone()),
        InputSpec::Pattern(pattern) if pattern.trim().is_empty() => Ok(Vec::new()),
        InputSpec::Pattern(pattern) => {
            let mut paths = Vec::new();
            for entry in glob::glob(pattern)? {
                match entry {
                    Ok(path) => paths.push(path),
                    Err(e) => warn!("Skipping {}: {}", e.path().display(), e.error()),
                }
            }
            if paths.is_empty() {
                warn!("Pattern {pattern:?} matched no file");
            }
            Ok(paths)
        }
    }
}

/// Simple CSV importer for one statement. `origin` is only used to tell the
/// user which file is broken.
///
/// Rows shorter than the header are fine, their trailing cells read as blank.
/// A row longer than the header has nowhere to put its extra cells, so it
/// fails the file.
pub(crate) fn read_records<R: std::io::Read>(reader: R, origin: &Path) -> Result<RecordSet, Error> {
    let ingestion = |source: csv::Error| Error::Ingestion {
        path: origin.to_path_buf(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers().map_err(ingestion)?.clone();
    if headers.is_empty() {
        return Err(Error::MissingHeader(origin.to_path_buf()));
    }
    let mut rows = Vec::new();
    for result in rdr.records() {
        let row = result.map_err(ingestion)?;
        if row.len() > headers.len() {
            let line = row.position().map_or(0, |pos| pos.line());
            let message = format!(
                "line {line} has {} fields, but the header has {}",
                row.len(),
                headers.len()
            );
            return Err(ingestion(
                std::io::Error::new(std::io::ErrorKind::InvalidData, message).into(),
            ));
        }
        rows.push(row);
    }
    Ok(RecordSet::from_file(headers, rows))
}

/// Reads every file in order and glues them together, file order then row
/// order. The first file that can't be read aborts the whole load.
pub(crate) fn load<P: AsRef<Path>>(paths: &[P]) -> Result<RecordSet, Error> {
    let mut records = RecordSet::new();
    for path in paths {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::Ingestion {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        let statement = read_records(std::io::BufReader::new(file), path)?;
        info!("Read {} rows from {}", statement.len(), path.display());
        records.append(statement);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::{load, read_records, resolve_inputs, InputSpec};
    use crate::{compute::aggregate_amount, data::Error};
    use rust_decimal_macros::dec;
    use std::path::{Path, PathBuf};

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_read_statement() {
        let statement_csv = b"\
date,       transaction, description,        amount,  balance
2024-09-03, DEP,         Deposit,            500.00,  1500.00
2024-09-04, SPEND,       Grocery store,      -42.17,  1457.83
";
        let records = read_records(&statement_csv[..], Path::new("inline.csv")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.records()[1].get("description"), Some("Grocery store"));
        assert_eq!(records.column("amount").unwrap(), ["500.00", "-42.17"]);
    }

    #[test]
    fn test_load_keeps_file_then_row_order() {
        let dir = tempfile::tempdir().unwrap();
        let f1 = write(dir.path(), "f1.csv", "date,amount,balance\n2024-09-01,1,1\n2024-09-02,2,3\n");
        let f2 = write(dir.path(), "f2.csv", "date,amount,balance\n2024-10-01,3,6\n2024-10-02,4,10\n");
        let records = load(&[f1, f2]).unwrap();
        let rows: Vec<_> = records
            .records()
            .iter()
            .map(|record| {
                ["date", "amount", "balance"]
                    .map(|column| record.get(column).unwrap())
                    .join(",")
            })
            .collect();
        assert_eq!(
            rows,
            [
                "2024-09-01,1,1",
                "2024-09-02,2,3",
                "2024-10-01,3,6",
                "2024-10-02,4,10",
            ]
        );
    }

    #[test]
    fn test_load_nothing() {
        let records = load::<PathBuf>(&[]).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        match load(&[&missing]) {
            Err(Error::Ingestion { path, .. }) => assert_eq!(path, missing),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_load_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let empty = write(dir.path(), "empty.csv", "");
        assert!(matches!(load(&[empty]), Err(Error::MissingHeader(_))));
    }

    #[test]
    fn test_load_long_row() {
        let dir = tempfile::tempdir().unwrap();
        let ragged = write(dir.path(), "ragged.csv", "date,amount\n2024-09-01,1,extra\n");
        match load(&[&ragged]) {
            Err(Error::Ingestion { path, source }) => {
                assert_eq!(path, ragged);
                assert!(source.to_string().contains("line 2 has 3 fields"));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_read_short_row() {
        let statement_csv = b"\
date,transaction,description,amount,balance
2024-09-01,DEP,Deposit,500.00,500.00
2024-09-02,SPEND,Coffee,-4.50
";
        let records = read_records(&statement_csv[..], Path::new("short.csv")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.column("amount").unwrap(), ["500.00", "-4.50"]);
        assert_eq!(records.column("balance").unwrap(), ["500.00", ""]);
        assert_eq!(aggregate_amount(&records).unwrap(), dec!(495.50));
    }

    #[test]
    fn test_resolve_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.csv", "amount\n1\n");
        let b = write(dir.path(), "b.csv", "amount\n2\n");
        write(dir.path(), "notes.txt", "not a statement");
        let pattern = format!("{}/*.csv", dir.path().display());
        let mut paths = resolve_inputs(&InputSpec::from(pattern.as_str())).unwrap();
        paths.sort();
        assert_eq!(paths, [a, b]);
    }

    #[test]
    fn test_resolve_pattern_without_match() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.csv", dir.path().display());
        let paths = resolve_inputs(&InputSpec::from(pattern.as_str())).unwrap();
        assert!(paths.is_empty());
        assert!(load(&paths).unwrap().is_empty());
        assert!(resolve_inputs(&InputSpec::from("")).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_bad_pattern() {
        assert!(matches!(
            resolve_inputs(&InputSpec::from("statements/[.csv")),
            Err(Error::Pattern(_))
        ));
    }

    #[test]
    fn test_resolve_paths_as_is() {
        let paths = vec![PathBuf::from("b.csv"), PathBuf::from("a.csv")];
        assert_eq!(resolve_inputs(&InputSpec::from(paths.clone())).unwrap(), paths);
    }

    #[test]
    fn test_spec_from_args() {
        assert_eq!(
            InputSpec::from_args(vec!["statements/*.csv".to_string()]),
            InputSpec::Pattern("statements/*.csv".to_string())
        );
        assert_eq!(
            InputSpec::from_args(vec!["sept.csv".to_string()]),
            InputSpec::Paths(vec![PathBuf::from("sept.csv")])
        );
        assert_eq!(
            InputSpec::from_args(vec!["sept.csv".to_string(), "oct.csv".to_string()]),
            InputSpec::Paths(vec![PathBuf::from("sept.csv"), PathBuf::from("oct.csv")])
        );
    }
}
