use std::path::PathBuf;
use std::process;

use celcat_parser::Config;
use getopts::Options;

pub struct Args {
    pub store: PathBuf,
    pub config: Config,
    pub dry_run: bool,
    pub snapshots: Vec<PathBuf>,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "s",
        "store",
        "JSON event store to reconcile into [Default: events.json]",
        "PATH",
    );
    opts.optopt(
        "y",
        "fallback-year",
        "Year for text-only day headers when the page title has none [Default: 2026]",
        "YEAR",
    );
    opts.optflag(
        "n",
        "dry-run",
        "Report changes without writing the store [Default: false]",
    );
    opts
}

fn usage(opts: &Options) -> String {
    let brief = format!("{} [options] SNAPSHOT.html...", env!("CARGO_PKG_NAME"));
    opts.usage(&brief)
}

pub fn parse(args: Vec<String>) -> Args {
    let opts = opts();

    let matches = match opts.parse(args) {
        Ok(matches) => matches,
        Err(fail) => {
            eprintln!("{fail}");
            process::exit(1);
        }
    };

    if matches.opt_present("help") {
        println!("{}", usage(&opts));
        process::exit(0);
    }

    let store = matches
        .opt_str("store")
        .map_or_else(|| PathBuf::from("events.json"), PathBuf::from);

    let fallback_year = match matches.opt_get_default("fallback-year", Config::default().fallback_year)
    {
        Ok(year) => year,
        Err(err) => {
            eprintln!("Provided value for option 'fallback-year' is invalid: {err}");
            process::exit(1);
        }
    };

    if matches.free.is_empty() {
        eprintln!("No snapshot files given\n\n{}", usage(&opts));
        process::exit(1);
    }

    Args {
        store,
        config: Config { fallback_year },
        dry_run: matches.opt_present("dry-run"),
        snapshots: matches.free.into_iter().map(PathBuf::from).collect(),
    }
}
