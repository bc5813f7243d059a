use super::{INPUT_CSV, OUTPUT_PNG, VERSION};
use clap::{App, Arg};
use std::ffi::OsString;
use std::path::PathBuf;

/// Takes the CLI arguments that control the plotting of the response times.
pub fn parse_cli() -> (PathBuf, PathBuf, bool, bool) {
    parse_cli_from(std::env::args_os())
}

/// Same as parse_cli, over an explicit argument list (first item is the binary name).
/// Returns input csv, output png, whether to open the viewer, and verbosity.
pub fn parse_cli_from<I, T>(args: I) -> (PathBuf, PathBuf, bool, bool)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let arg_csvin = Arg::with_name("input_csvfile")
        .help("name of the csv file with TestID and ResponseTime(ms) columns")
        .short("f")
        .long("csvfile")
        .takes_value(true)
        .default_value(INPUT_CSV);
    let arg_pngout = Arg::with_name("output_pngfile")
        .help("name of the output png file, overwritten if it exists")
        .short("o")
        .long("pngfile")
        .takes_value(true)
        .default_value(OUTPUT_PNG);
    let arg_no_show = Arg::with_name("no_show")
        .help("only save the chart, do not open it in an image viewer")
        .long("no-show")
        .takes_value(false);
    let arg_verbose = Arg::with_name("verbose")
        .help("print debug information")
        .short("v")
        .long("verbose")
        .takes_value(false);
    let cli_args = App::new("perf_plot")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to plot the load-test response times, PUT vs GET")
        .arg(arg_csvin)
        .arg(arg_pngout)
        .arg(arg_no_show)
        .arg(arg_verbose)
        .get_matches_from(args);
    let csvin = PathBuf::from(cli_args.value_of("input_csvfile").unwrap_or(INPUT_CSV));
    let pngout = PathBuf::from(cli_args.value_of("output_pngfile").unwrap_or(OUTPUT_PNG));
    let show = !cli_args.is_present("no_show");
    let verbose = cli_args.is_present("verbose");
    (csvin, pngout, show, verbose)
}
