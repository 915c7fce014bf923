use std::collections::HashSet;
use std::fs;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};
use log::{debug, error, info, warn};

use snipe::prelude::*;
use snipe::process::{ProcessWorker, DEFAULT_PROGRAM};
use snipe::selection::collect_paths;

fn cli() -> Command {
    Command::new("snipe")
        .version(crate_version!())
        .about("Sketch sequence files with sourmash and bundle the signatures")
        .arg(
            Arg::new("inputs")
                .value_name("FILES_OR_DIRS")
                .help("Sequence files, or directories to search for them")
                .required(true)
                .num_args(1..)
                .value_parser(value_parser!(Utf8PathBuf)),
        )
        .arg(
            Arg::new("ksize")
                .short('k')
                .long("ksize")
                .help("K-mer size")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("scaled")
                .long("scaled")
                .help("Keep one in every SCALED hashes")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("num")
                .long("num")
                .help("Fixed number of hashes to keep, overrides --scaled when non-zero")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Hash seed")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("protein")
                .long("protein")
                .help("Sketch protein sequences")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dayhoff")
                .long("dayhoff")
                .help("Sketch protein sequences in the Dayhoff alphabet")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("hp")
                .long("hp")
                .help("Sketch protein sequences in the hydrophobic-polar alphabet")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-abundance")
                .long("no-abundance")
                .help("Do not track hash abundances")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("extensions")
                .long("extensions")
                .value_name("LIST")
                .help("Comma separated file suffixes to accept [default: .fa,.fasta,.fna,.gz,.fq,.fastq]"),
        )
        .arg(
            Arg::new("sourmash")
                .long("sourmash")
                .value_name("PROGRAM")
                .help("sourmash executable used to compute sketches")
                .default_value(DEFAULT_PROGRAM),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("ZIP")
                .help("Archive to write all signatures to [default: sketches.zip]")
                .value_parser(value_parser!(Utf8PathBuf))
                .conflicts_with("outdir"),
        )
        .arg(
            Arg::new("outdir")
                .long("outdir")
                .value_name("DIR")
                .help("Write one .sig file per input into DIR instead of an archive")
                .value_parser(value_parser!(Utf8PathBuf)),
        )
}

fn options_from(matches: &ArgMatches) -> SketchOptions {
    let defaults = SketchOptions::default();
    SketchOptions {
        num: matches.get_one("num").copied().unwrap_or(defaults.num),
        ksize: matches.get_one("ksize").copied().unwrap_or(defaults.ksize),
        is_protein: matches.get_flag("protein"),
        dayhoff: matches.get_flag("dayhoff"),
        hp: matches.get_flag("hp"),
        seed: matches.get_one("seed").copied().unwrap_or(defaults.seed),
        scaled: matches.get_one("scaled").copied().unwrap_or(defaults.scaled),
        track_abundance: !matches.get_flag("no-abundance"),
    }
}

fn config_from(matches: &ArgMatches) -> ComponentConfig {
    let mut config = ComponentConfig::default();
    if let Some(list) = matches.get_one::<String>("extensions") {
        config.extensions = ExtensionAllowlist::from_csv(list);
    }
    if let Some(output) = matches.get_one::<Utf8PathBuf>("output") {
        config.archive_name = output.to_string();
    }
    config
}

fn run(matches: &ArgMatches) -> Result<ExitCode> {
    let inputs: Vec<&Utf8PathBuf> = matches
        .get_many::<Utf8PathBuf>("inputs")
        .map(|v| v.collect())
        .unwrap_or_default();
    let program = matches
        .get_one::<String>("sourmash")
        .map(String::as_str)
        .unwrap_or(DEFAULT_PROGRAM);

    let worker = ProcessWorker::new(program)?;
    let mut session = Session::new(worker, config_from(matches), options_from(matches));

    session.select_files(collect_paths(inputs)?);
    info!(
        "{} files match {}",
        session.selected().len(),
        session.config().extensions
    );

    let mut seen = HashSet::new();
    for file in session.selected() {
        if !seen.insert(file.name()) {
            warn!("{} selected more than once, only one result is kept", file.name());
        }
    }

    session.start_sketching()?;

    while !session.is_settled() {
        let msg = session
            .worker()
            .messages()
            .recv()
            .map_err(|e| Error::WorkerUnavailable {
                message: e.to_string(),
            })?;
        match &msg {
            WorkerMessage::Progress { filename, progress } => {
                debug!("{}: {:.0}%", filename, progress)
            }
            WorkerMessage::Generated { filename, .. } => info!("{}: done", filename),
            WorkerMessage::Failed { filename, error } => error!("{}: {}", filename, error),
        }
        session.handle_message(msg);
    }

    if let Some(outdir) = matches.get_one::<Utf8PathBuf>("outdir") {
        fs::create_dir_all(outdir)?;
        for filename in session.signatures().keys() {
            let download = session.download_sketch(filename)?;
            let path = outdir.join(&download.filename);
            fs::write(&path, &download.content)?;
            info!("wrote {}", path);
        }
    } else if session.has_signatures() {
        let download = session.download_all()?;
        fs::write(&download.filename, &download.content)?;
        info!(
            "wrote {} signatures to {}",
            session.signatures().len(),
            download.filename
        );
    }

    let failed = session
        .statuses()
        .values()
        .filter(|st| st.error().is_some())
        .count();
    if failed > 0 {
        error!("{} files could not be sketched", failed);
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = cli().get_matches();
    match run(&matches) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verify_cli() {
        cli().debug_assert();
    }

    #[test]
    fn flags_map_to_options() {
        let matches = cli()
            .try_get_matches_from(["snipe", "-k", "21", "--num", "500", "--hp", "--no-abundance", "a.fa"])
            .unwrap();
        let opts = options_from(&matches);
        assert_eq!(opts.ksize, 21);
        assert_eq!(opts.num, 500);
        assert_eq!(opts.scaled, 10_000);
        assert!(opts.hp);
        assert!(!opts.track_abundance);
    }

    #[test]
    fn config_flags() {
        let matches = cli()
            .try_get_matches_from(["snipe", "--extensions", "fa,.fa.gz", "-o", "out.zip", "a.fa"])
            .unwrap();
        let config = config_from(&matches);
        assert_eq!(config.archive_name, "out.zip");
        assert!(config.extensions.accepts("x.fa.gz"));
        assert!(!config.extensions.accepts("x.fq"));
    }
}
