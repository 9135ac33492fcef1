extern crate blitzwing_frame;
extern crate hdfs_rs;
extern crate log4rs;
#[macro_use]
extern crate log;
#[macro_use]
extern crate failure;

use blitzwing_frame::{client::DEFAULT_LOG_LEVEL, session::DEFAULT_MASTER, CsvClient, Session};
use clap::{Args, Parser, Subcommand};
use failure::Fallible;
use hdfs_rs::{
  config::{ConfigRef, Configuration},
  fs::make_file_system,
  HdfsClient,
};
use log::LevelFilter;
use log4rs::{
  append::console::{ConsoleAppender, Target},
  config::{Appender, Config, Root},
  encode::pattern::PatternEncoder,
};
use std::{process, sync::Arc};

const ROOT_DIR: &'static str = "/";
const CONSOLE_PATTERN: &'static str = "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}";

/// Path queries against WebHDFS and csv conversion through a local engine session.
#[derive(Debug, Parser)]
#[command(name = "hdfs-tools", version)]
struct Cli {
  /// log4rs yaml file; logs go to stdout at info level when absent
  #[arg(long = "log-config", global = true)]
  log_config: Option<String>,

  /// Configuration entry as key=value, repeatable
  #[arg(long = "conf", global = true)]
  conf: Vec<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Args)]
struct HdfsArgs {
  /// Namenode url, e.g. http://namenode:9870
  #[arg(long)]
  url: String,

  /// Remote user, resolved from configuration or the OS when absent
  #[arg(long)]
  user: Option<String>,

  /// Working directory to start from
  #[arg(long, default_value = ROOT_DIR)]
  dir: String,
}

#[derive(Debug, Args)]
struct EngineArgs {
  #[arg(long, default_value = DEFAULT_MASTER)]
  master: String,

  #[arg(long = "log-level", default_value = DEFAULT_LOG_LEVEL)]
  log_level: String,

  /// Treat the first line as data
  #[arg(long = "no-header", default_value_t = false)]
  no_header: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Print existence and type of each path
  Status {
    #[command(flatten)]
    hdfs: HdfsArgs,
    paths: Vec<String>,
  },

  /// List the working directory, after descending into each given name in order
  Ls {
    #[command(flatten)]
    hdfs: HdfsArgs,
    #[arg(long = "descend")]
    descend: Vec<String>,
  },

  /// Print the full path of a file under the working directory
  Select {
    #[command(flatten)]
    hdfs: HdfsArgs,
    file: String,
  },

  /// Print the first rows of a csv file or directory
  ShowCsv {
    #[command(flatten)]
    engine: EngineArgs,
    /// Read every column as a string
    #[arg(long = "no-infer", default_value_t = false)]
    no_infer: bool,
    #[arg(long, default_value_t = 20)]
    rows: usize,
    path: String,
  },

  /// Read a csv file or directory and write it back out as part files
  CopyCsv {
    #[command(flatten)]
    engine: EngineArgs,
    #[arg(long, default_value = "overwrite")]
    mode: String,
    source: String,
    target: String,
  },
}

fn main() {
  let cli = Cli::parse();
  if let Err(e) = init_logging(cli.log_config.as_deref()) {
    eprintln!("{}", e);
    process::exit(2);
  }

  if let Err(e) = do_main(cli) {
    error!("error happened: {:?}, {:?}", e, e.backtrace());
    process::exit(1);
  }
}

fn init_logging(log_config: Option<&str>) -> Fallible<()> {
  if let Some(path) = log_config {
    return log4rs::init_file(path, Default::default())
      .map_err(|e| format_err!("Log4rs initialization from {} failed: {}", path, e));
  }

  let stdout = ConsoleAppender::builder()
    .target(Target::Stdout)
    .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
    .build();
  let config = Config::builder()
    .appender(Appender::builder().build("stdout", Box::new(stdout)))
    .build(Root::builder().appender("stdout").build(LevelFilter::Info))
    .map_err(|e| format_err!("Invalid log4rs config: {}", e))?;
  log4rs::init_config(config).map_err(|e| format_err!("Log4rs initialization failed: {}", e))?;
  Ok(())
}

fn parse_conf(pairs: &[String]) -> Fallible<Vec<(String, String)>> {
  Ok(pairs.iter().map(|p| Configuration::parse_pair(p)).collect::<hdfs_rs::error::Result<Vec<_>>>()?)
}

fn hdfs_config(conf: &[(String, String)]) -> ConfigRef {
  let mut config = Configuration::new();
  for (key, value) in conf {
    config.set(key.as_str(), value.as_str());
  }
  Arc::new(config)
}

fn do_main(cli: Cli) -> Fallible<()> {
  let conf = parse_conf(&cli.conf)?;
  match cli.command {
    Command::Status { hdfs, paths } => {
      let client = hdfs_client(&hdfs, hdfs_config(&conf))?;
      for path in &paths {
        println!("{}\t{}\t{}", path, client.exists(path), client.path_type(path));
      }
    }
    Command::Ls { hdfs, descend } => {
      let mut client = hdfs_client(&hdfs, hdfs_config(&conf))?;
      for name in &descend {
        client.descend(name);
      }
      println!("{}:", client.current_directory());
      for entry in client.list_current_directory()? {
        println!("  {}", entry);
      }
    }
    Command::Select { hdfs, file } => {
      let client = hdfs_client(&hdfs, hdfs_config(&conf))?;
      match client.select_file(&file) {
        Some(path) => println!("{}", path),
        None => process::exit(1),
      }
    }
    Command::ShowCsv { engine, no_infer, rows, path } => {
      let client = csv_client(&engine, &conf)?;
      if let Some(frame) = client.read_data(&path, !no_infer, !engine.no_header) {
        println!("{}", frame.show_string(rows)?);
      }
      client.close();
    }
    Command::CopyCsv { engine, mode, source, target } => {
      let client = csv_client(&engine, &conf)?;
      if let Some(frame) = client.read_data(&source, true, !engine.no_header) {
        client.write_data(&frame, &target, !engine.no_header, &mode);
      }
      client.close();
    }
  }
  Ok(())
}

fn hdfs_client(args: &HdfsArgs, config: ConfigRef) -> Fallible<HdfsClient> {
  let mut client = match &args.user {
    Some(user) => HdfsClient::with_config(&args.url, user, config)?,
    None => HdfsClient::with_file_system(make_file_system(&args.url, config)?, ROOT_DIR),
  };
  if args.dir != client.current_directory() {
    client.set_current_directory(&args.dir);
  }
  Ok(client)
}

fn csv_client(args: &EngineArgs, conf: &[(String, String)]) -> Fallible<CsvClient> {
  let mut builder = Session::builder().master(args.master.as_str()).log_level(args.log_level.as_str());
  for (key, value) in conf {
    builder = builder.config(key.as_str(), value.as_str());
  }
  Ok(CsvClient::with_session(builder.get_or_create()?))
}
