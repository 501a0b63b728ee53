fn main() {
    if let Err(err) = kpi_trend::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
