use arrow::{
  array::{Array, Int64Array},
  compute::sum,
  datatypes::DataType,
};
use blitzwing_frame::{CsvClient, Session};
use hdfs_rs::{
  error::Result,
  fs::{
    file_status::{FileStat, LinkInfo},
    file_system::{FileSystem, InputStreamRef},
    FileStatus,
  },
  local::LocalFileSystem,
};
use log::{Level, LevelFilter, Log, Metadata, Record};
use rand::Rng;
use std::{
  cell::RefCell,
  fs,
  path::Path,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
};
use tempfile::TempDir;

/// Local file system that counts every call reaching it.
#[derive(Default)]
struct CountingFileSystem {
  inner: LocalFileSystem,
  calls: AtomicUsize,
}

impl CountingFileSystem {
  fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  fn touch(&self) {
    self.calls.fetch_add(1, Ordering::SeqCst);
  }
}

impl FileSystem for CountingFileSystem {
  fn get_file_status(&self, path: &str) -> Result<FileStatus> {
    self.touch();
    self.inner.get_file_status(path)
  }

  fn list_status(&self, path: &str) -> Result<Vec<FileStatus>> {
    self.touch();
    self.inner.list_status(path)
  }

  fn open(&self, path: &str) -> Result<InputStreamRef> {
    self.touch();
    self.inner.open(path)
  }

  fn create(&self, path: &str, data: &[u8], overwrite: bool) -> Result<()> {
    self.touch();
    self.inner.create(path, data, overwrite)
  }

  fn mkdirs(&self, path: &str) -> Result<bool> {
    self.touch();
    self.inner.mkdirs(path)
  }

  fn delete(&self, path: &str, recursive: bool) -> Result<bool> {
    self.touch();
    self.inner.delete(path, recursive)
  }
}

/// Records emitted on the current thread, as (level, target, message).
type Captured = Vec<(Level, String, String)>;

thread_local! {
  static CAPTURED: RefCell<Captured> = RefCell::new(Vec::new());
}

struct CapturingLogger;

impl Log for CapturingLogger {
  fn enabled(&self, _metadata: &Metadata) -> bool {
    true
  }

  fn log(&self, record: &Record) {
    CAPTURED.with(|c| {
      c.borrow_mut().push((record.level(), record.target().to_string(), record.args().to_string()))
    });
  }

  fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger;

fn start_capture() {
  // Only the first call installs the logger; the rest just reset this thread's buffer.
  let _ = log::set_logger(&LOGGER);
  log::set_max_level(LevelFilter::Trace);
  CAPTURED.with(|c| c.borrow_mut().clear());
}

fn captured() -> Captured {
  CAPTURED.with(|c| c.borrow_mut().drain(..).collect())
}

fn client() -> CsvClient {
  CsvClient::with_session(Session::builder().master("local[2]").build().unwrap())
}

fn path_in(dir: &TempDir, name: &str) -> String {
  dir.path().join(name).to_str().unwrap().to_string()
}

fn write_file(path: &str, content: &str) {
  if let Some(parent) = Path::new(path).parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(path, content).unwrap();
}

fn part_files(dir: &str) -> Vec<String> {
  let mut names = fs::read_dir(dir)
    .unwrap()
    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
    .filter(|n| n.starts_with("part-"))
    .collect::<Vec<String>>();
  names.sort();
  names
}

#[test]
fn test_round_trip() {
  let dir = TempDir::new().unwrap();
  let input = path_in(&dir, "people.csv");
  write_file(&input, "id,name,score\n1,alice,3.5\n2,bob,4\n3,carol,\n");

  let client = client();
  let frame = client.read_csv(&input).unwrap();
  assert_eq!(3, frame.count());
  assert_eq!(vec!["id", "name", "score"], frame.columns());
  let types = frame.schema().fields().iter().map(|f| f.data_type().clone()).collect::<Vec<_>>();
  assert_eq!(vec![DataType::Int64, DataType::Utf8, DataType::Float64], types);

  let output = path_in(&dir, "out.csv");
  client.write_csv(&frame, &output);
  assert!(Path::new(&output).join("_SUCCESS").is_file());
  let parts = part_files(&output);
  assert_eq!(1, parts.len());
  assert!(parts[0].ends_with("-c000.csv"));

  let back = client.read_csv(&output).unwrap();
  assert_eq!(frame.schema(), back.schema());
  assert_eq!(frame.collect().unwrap(), back.collect().unwrap());
}

#[test]
fn test_missing_path_reads_none() {
  let dir = TempDir::new().unwrap();
  let client = client();
  assert!(client.read_csv(&path_in(&dir, "missing.csv")).is_none());
  assert!(client.read_data(&path_in(&dir, "missing.csv"), false, false).is_none());
}

#[test]
fn test_wrong_suffix_skips_engine() {
  let dir = TempDir::new().unwrap();
  let data = path_in(&dir, "data.txt");
  write_file(&data, "a,b\n1,2\n");
  let csv = path_in(&dir, "data.csv");
  write_file(&csv, "a,b\n1,2\n");

  let fs = Arc::new(CountingFileSystem::default());
  let session = Session::builder().file_system(fs.clone()).build().unwrap();
  let client = CsvClient::with_session(session);

  assert!(client.read_csv(&data).is_none());
  assert!(client.read_data(&path_in(&dir, "data.CSV"), true, true).is_none());
  assert_eq!(0, fs.calls());

  let frame = client.read_csv(&csv).unwrap();
  let calls = fs.calls();
  assert!(calls > 0);

  let out = path_in(&dir, "out.txt");
  client.write_csv(&frame, &out);
  assert_eq!(calls, fs.calls());
  assert!(!Path::new(&out).exists());
}

#[test]
fn test_directory_merge() {
  let dir = TempDir::new().unwrap();
  let input = path_in(&dir, "parts.csv");
  write_file(&path_in(&dir, "parts.csv/part-00000.csv"), "a,b\n1,x\n2,y\n");
  write_file(&path_in(&dir, "parts.csv/part-00001.csv"), "a,b\n2.5,z\n");
  write_file(&path_in(&dir, "parts.csv/part-00002.csv"), "");
  write_file(&path_in(&dir, "parts.csv/_SUCCESS"), "");
  write_file(&path_in(&dir, "parts.csv/.part-00000.csv.crc"), "garbage");
  fs::create_dir_all(path_in(&dir, "parts.csv/nested")).unwrap();

  let frame = client().read_csv(&input).unwrap();
  assert_eq!(3, frame.count());
  assert_eq!(vec!["a", "b"], frame.columns());
  assert_eq!(&DataType::Float64, frame.schema().field(0).data_type());
  assert_eq!(&DataType::Utf8, frame.schema().field(1).data_type());
}

#[test]
fn test_incompatible_or_empty_directories() {
  let dir = TempDir::new().unwrap();
  write_file(&path_in(&dir, "mixed.csv/a.csv"), "a,b\n1,2\n");
  write_file(&path_in(&dir, "mixed.csv/b.csv"), "a\n1\n");
  fs::create_dir_all(path_in(&dir, "empty.csv")).unwrap();
  write_file(&path_in(&dir, "only_marker.csv/_SUCCESS"), "");

  let client = client();
  assert!(client.read_csv(&path_in(&dir, "mixed.csv")).is_none());
  assert!(client.read_csv(&path_in(&dir, "empty.csv")).is_none());
  assert!(client.read_csv(&path_in(&dir, "only_marker.csv")).is_none());

  let session = client.session();
  let err = session.read().header(true).csv(&path_in(&dir, "mixed.csv")).unwrap_err();
  assert!(err.is_analysis_error());
}

#[test]
fn test_header_and_inference_flags() {
  let dir = TempDir::new().unwrap();
  let headless = path_in(&dir, "headless.csv");
  write_file(&headless, "1,x\n2,y\n");
  let client = client();

  let frame = client.read_data(&headless, true, false).unwrap();
  assert_eq!(vec!["_c0", "_c1"], frame.columns());
  assert_eq!(2, frame.count());
  assert_eq!(&DataType::Int64, frame.schema().field(0).data_type());

  let with_header = path_in(&dir, "typed.csv");
  write_file(&with_header, "id,flag\n1,true\n2,false\n");
  let frame = client.read_data(&with_header, false, true).unwrap();
  assert_eq!(vec!["id", "flag"], frame.columns());
  assert!(frame.schema().fields().iter().all(|f| f.data_type() == &DataType::Utf8));

  // Without a header the first line is data.
  let frame = client.read_data(&with_header, false, false).unwrap();
  assert_eq!(3, frame.count());
}

#[test]
fn test_save_modes() {
  let dir = TempDir::new().unwrap();
  let input = path_in(&dir, "input.csv");
  write_file(&input, "id\n1\n2\n");
  let output = path_in(&dir, "output.csv");

  let client = client();
  let frame = client.read_csv(&input).unwrap();

  client.write_data(&frame, &output, true, "errorifexists");
  let parts = part_files(&output);
  assert_eq!(1, parts.len());

  client.write_data(&frame, &output, true, "error");
  assert_eq!(parts, part_files(&output));

  client.write_data(&frame, &output, true, "ignore");
  assert_eq!(parts, part_files(&output));

  client.write_data(&frame, &output, true, "replace");
  assert_eq!(parts, part_files(&output));

  client.write_data(&frame, &output, true, "append");
  assert_eq!(2, part_files(&output).len());
  assert_eq!(4, client.read_csv(&output).unwrap().count());

  client.write_data(&frame, &output, true, "overwrite");
  assert_eq!(1, part_files(&output).len());
  assert_eq!(2, client.read_csv(&output).unwrap().count());
}

#[test]
fn test_headerless_write() {
  let dir = TempDir::new().unwrap();
  let input = path_in(&dir, "input.csv");
  write_file(&input, "id,name\n1,a\n");
  let output = path_in(&dir, "output.csv");

  let client = client();
  let frame = client.read_csv(&input).unwrap();
  client.write_data(&frame, &output, false, "overwrite");

  let part = Path::new(&output).join(&part_files(&output)[0]);
  assert_eq!("1,a\n", fs::read_to_string(part).unwrap());

  let back = client.read_data(&output, true, false).unwrap();
  assert_eq!(vec!["_c0", "_c1"], back.columns());
}

#[test]
fn test_closed_session_swallows_errors() {
  let dir = TempDir::new().unwrap();
  let input = path_in(&dir, "input.csv");
  write_file(&input, "id\n1\n");

  let client = client();
  let frame = client.read_csv(&input).unwrap();
  client.close();
  client.close();
  assert!(client.session().is_stopped());

  let output = path_in(&dir, "output.csv");
  client.write_csv(&frame, &output);
  assert!(!Path::new(&output).exists());
  assert!(client.read_csv(&input).is_none());
  // Data already loaded stays readable.
  assert_eq!(1, frame.count());
}

#[test]
fn test_parallel_read() {
  let dir = TempDir::new().unwrap();
  let mut rng = rand::thread_rng();
  let mut expected = 0i64;
  let mut rows = 0usize;
  for idx in 0..6 {
    let count = rng.gen_range(1..500);
    let mut content = String::from("v\n");
    for _ in 0..count {
      let v: i64 = rng.gen_range(0..1000);
      expected += v;
      content.push_str(&format!("{}\n", v));
    }
    rows += count;
    write_file(&path_in(&dir, &format!("numbers.csv/part-{:05}.csv", idx)), &content);
  }

  let session = Session::builder().master("local[4]").config("blitzwing.csv.batch.size", "64").build().unwrap();
  let frame = CsvClient::with_session(session).read_csv(&path_in(&dir, "numbers.csv")).unwrap();
  assert_eq!(rows, frame.count());

  let total: i64 = frame
    .batches()
    .iter()
    .map(|b| {
      let column = b.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
      assert!(column.len() <= 64);
      sum(column).unwrap_or(0)
    })
    .sum();
  assert_eq!(expected, total);
}

#[test]
fn test_rejected_suffix_is_logged() {
  let dir = TempDir::new().unwrap();
  let client = client();
  start_capture();

  assert!(client.read_csv(&path_in(&dir, "data.txt")).is_none());
  let records = captured();
  assert_eq!(1, records.len());
  assert_eq!(Level::Warn, records[0].0);
  assert!(records[0].2.starts_with("Incorrect file type"));
  assert!(records[0].2.contains("data.txt"));
}

#[test]
fn test_missing_path_logs_short_warning() {
  let dir = TempDir::new().unwrap();
  let missing = path_in(&dir, "missing.csv");
  let client = client();
  start_capture();

  assert!(client.read_csv(&missing).is_none());
  let records = captured();
  let warnings = records.iter().filter(|r| r.0 == Level::Warn).collect::<Vec<_>>();
  assert_eq!(1, warnings.len());
  assert!(warnings[0].2.contains("Path does not exist"));
  assert!(warnings[0].2.contains(&missing));
  assert!(!warnings[0].2.contains("Backtrace:"));
  assert!(!warnings[0].2.contains("Caused by:"));
  assert!(records.iter().all(|r| r.0 != Level::Error));
}

#[test]
fn test_session_log_level_spares_client_diagnostics() {
  let dir = TempDir::new().unwrap();
  let input = path_in(&dir, "input.csv");
  write_file(&input, "id\n1\n");

  let session = Session::builder().log_level("ERROR").build().unwrap();
  let client = CsvClient::with_session(session);
  start_capture();

  assert!(client.read_csv(&input).is_some());
  assert!(client.read_csv(&path_in(&dir, "input.txt")).is_none());
  client.close();

  let records = captured();
  assert!(records.iter().all(|r| !r.1.starts_with("blitzwing_frame::reader")));
  assert!(records.iter().any(|r| r.0 == Level::Warn && r.2.starts_with("Incorrect file type")));
  assert!(records.iter().any(|r| r.0 == Level::Info && r.2.starts_with("Closed csv client")));
  assert!(log::max_level() >= LevelFilter::Warn);
}

#[test]
fn test_engine_records_follow_session_level() {
  let dir = TempDir::new().unwrap();
  let input = path_in(&dir, "input.csv");
  write_file(&input, "id\n1\n");

  let client = client();
  start_capture();
  assert!(client.read_csv(&input).is_some());
  let records = captured();
  assert!(records.iter().any(|r| r.0 == Level::Info && r.1 == "blitzwing_frame::reader"));
}

#[test]
fn test_tab_separated_read() {
  let dir = TempDir::new().unwrap();
  let input = path_in(&dir, "people.csv");
  write_file(&input, "id\tname\n1\talice\n2\tbob, jr\n");

  let session = Session::builder().config("blitzwing.csv.delimiter", "\t").build().unwrap();
  let frame = CsvClient::with_session(session).read_csv(&input).unwrap();
  assert_eq!(vec!["id", "name"], frame.columns());
  assert_eq!(2, frame.count());
}

/// Reports every path as a link to the local path it names.
#[derive(Default)]
struct LinkFileSystem {
  inner: LocalFileSystem,
}

impl FileSystem for LinkFileSystem {
  fn get_file_status(&self, path: &str) -> Result<FileStatus> {
    Ok(FileStatus::Symlink(LinkInfo::new(path.to_string(), path.to_string(), FileStat::default())))
  }

  fn list_status(&self, path: &str) -> Result<Vec<FileStatus>> {
    self.inner.list_status(path)
  }

  fn open(&self, path: &str) -> Result<InputStreamRef> {
    self.inner.open(path)
  }

  fn create(&self, path: &str, data: &[u8], overwrite: bool) -> Result<()> {
    self.inner.create(path, data, overwrite)
  }

  fn mkdirs(&self, path: &str) -> Result<bool> {
    self.inner.mkdirs(path)
  }

  fn delete(&self, path: &str, recursive: bool) -> Result<bool> {
    self.inner.delete(path, recursive)
  }
}

#[test]
fn test_symlink_is_not_read() {
  let dir = TempDir::new().unwrap();
  let input = path_in(&dir, "latest.csv");
  write_file(&input, "id\n1\n");

  let session = Session::builder().file_system(Arc::new(LinkFileSystem::default())).build().unwrap();
  let client = CsvClient::with_session(session);
  start_capture();

  assert!(client.read_csv(&input).is_none());
  let records = captured();
  assert!(records.iter().any(|r| r.0 == Level::Warn && r.2.contains("Cannot read SYMLINK")));
}
