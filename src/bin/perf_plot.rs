use log::info;
use perf_plot::plot::parse_cli;
use perf_plot::PerfError;

fn main() -> Result<(), PerfError> {
    let (csvin, pngout, show, verbose) = parse_cli();
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    info!(
        "read data from {} and plot to {}",
        csvin.display(),
        pngout.display()
    );
    perf_plot::run(&csvin, &pngout, show)
}
